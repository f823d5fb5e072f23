pub mod health;
pub mod home;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::formulation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.config.assets_dir);

    Router::new()
        .route("/", get(home::home_handler))
        .route("/health", get(health::health_handler))
        .route("/generar", post(handlers::handle_generate_archive))
        .route("/api/v1/formulations", post(handlers::handle_formulate))
        .nest_service("/assets", assets)
        .with_state(state)
}
