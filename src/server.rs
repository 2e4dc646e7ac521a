use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info, warn};

use crate::config::{GeneratorConfig, ServerConfig};
use crate::data::{GenerationInput, GenerationOutput};
use crate::generator;

type HandlerError = (StatusCode, String);

async fn generate_handler(
    State(config): State<Arc<GeneratorConfig>>,
    Json(input): Json<GenerationInput>,
) -> Result<Json<GenerationOutput>, HandlerError> {
    // placement is CPU-bound; keep it off the async workers
    let result = tokio::task::spawn_blocking(move || generator::generate(&input, &config))
        .await
        .map_err(|e| {
            error!("Generation task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "generation task failed".to_string())
        })?;

    match result {
        Ok(output) => Ok(Json(output)),
        Err(e) => {
            warn!("Rejected generation request: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router(config: GeneratorConfig) -> Router {
    Router::new()
        .route("/v1/schedule/generate", post(generate_handler))
        .route("/v1/health", get(health_handler))
        .with_state(Arc::new(config))
}

pub async fn run_server(server: ServerConfig, generator: GeneratorConfig) -> std::io::Result<()> {
    let app = router(generator);
    let listener = tokio::net::TcpListener::bind(server.bind_addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
