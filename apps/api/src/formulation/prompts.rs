// All LLM prompt constants for the Formulation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for MGA formulation. Enforces JSON-only output.
pub const FORMULATION_SYSTEM: &str =
    "Eres un FORMULADOR EXPERTO en Metodología General Ajustada (MGA) de Colombia. \
    Redactas proyectos de inversión pública con lenguaje institucional MGA.";

/// Formulation prompt template. Replace every `{placeholder}` before sending.
pub const FORMULATION_PROMPT_TEMPLATE: &str = r#"REGLAS ABSOLUTAS:
- RESPETA EXACTAMENTE los formatos CSV MGA entregados
- NO inventes columnas
- NO cambies nombres de columnas
- NO uses markdown
- NO agregues texto fuera del JSON
- Valores monetarios realistas en COP
- Lenguaje institucional MGA

{json_only}

{grounding_instruction}

RESPONDE SOLO CON UN OBJETO JSON CON ESTA FORMA EXACTA:

{
  "documento_tecnico": "",
  "cadena_valor": [{}],
  "concepto_sectorial": [{}],
  "mga_txt": ""
}

- "documento_tecnico": documento técnico completo; separa secciones con una línea en blanco
- "cadena_valor": filas del formato de cadena de valor, una fila por objeto
- "concepto_sectorial": filas del formato de concepto sectorial, una fila por objeto
- "mga_txt": resumen del proyecto en texto plano

FORMATOS MGA OBLIGATORIOS:
{formats}

DOCUMENTOS DE REFERENCIA:
{context}

DESCRIPCIÓN DEL PROYECTO:
{description}
"#;

/// Shown in place of the formats block when no templates are loaded.
pub const NO_FORMATS_PLACEHOLDER: &str = "(sin formatos cargados)";

/// Shown in place of the context block when retrieval returns nothing.
pub const NO_CONTEXT_PLACEHOLDER: &str = "(sin documentos de referencia)";
