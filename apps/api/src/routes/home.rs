use axum::response::Html;

const HOME_PAGE: &str = r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="UTF-8">
<title>MGA IA – Formulador de proyectos</title>
<meta name="viewport" content="width=device-width, initial-scale=1">
<link rel="stylesheet" href="/assets/style.css">
</head>
<body>
<main>
<h1>Formulador MGA</h1>
<form method="post" action="/generar">
<label for="descripcion">Descripción del proyecto</label>
<textarea id="descripcion" name="descripcion" rows="10" required></textarea>
<button type="submit">Generar proyecto MGA</button>
</form>
</main>
</body>
</html>
"#;

/// GET /
pub async fn home_handler() -> Html<&'static str> {
    Html(HOME_PAGE)
}
