//! REST surface over the coach agent.
//!
//! One agent instance serves all requests behind a mutex, mirroring the
//! single-conversation console experience. Uploaded images are staged to
//! `data/uploads/` and referenced from the message text so the model can
//! route them to the vision tools.

use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use fitcoach_agent::CoachAgent;

const UPLOAD_DIR: &str = "data/uploads";

/// Application state shared with all routes
#[derive(Clone)]
pub struct AppState {
    agent: Arc<Mutex<CoachAgent>>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    response: String,
    success: bool,
}

#[derive(Serialize)]
pub struct ResetResponse {
    success: bool,
    message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    agent_initialized: bool,
}

/// Start the HTTP server
pub async fn run_server(agent: CoachAgent, addr: SocketAddr) -> anyhow::Result<()> {
    info!("Starting HTTP server on {}", addr);

    let state = AppState {
        agent: Arc::new(Mutex::new(agent)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(handle_chat))
        .route("/api/reset", post(handle_reset))
        .layer(cors)
        .with_state(state);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start HTTP server: {}", e))
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        agent_initialized: true,
    })
}

/// Chat handler: multipart form with a `message` field and optional image
/// uploads. Images land on disk; their paths are appended to the message.
async fn handle_chat(State(state): State<AppState>, mut multipart: Multipart) -> Json<ChatResponse> {
    let mut message = String::new();
    let mut image_paths: Vec<String> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "Failed to read multipart field");
                return Json(ChatResponse {
                    response: format!("❌ Error: {}", e),
                    success: false,
                });
            }
        };

        match field.name() {
            Some("message") => {
                message = field.text().await.unwrap_or_default();
            }
            Some("images") => {
                let filename = field
                    .file_name()
                    .map(|f| f.to_string())
                    .unwrap_or_else(|| "upload".to_string());
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        error!(error = %e, "Failed to read uploaded image");
                        continue;
                    }
                };
                match stage_upload(image_paths.len(), &filename, &bytes).await {
                    Ok(path) => image_paths.push(path),
                    Err(e) => error!(error = %e, "Failed to stage uploaded image"),
                }
            }
            _ => {}
        }
    }

    if !image_paths.is_empty() {
        message = annotate_with_images(&message, &image_paths);
    }

    let mut agent = state.agent.lock().await;
    match agent.handle(&message).await {
        Ok(response) => Json(ChatResponse {
            response,
            success: true,
        }),
        Err(e) => {
            error!(error = %e, "Chat turn failed");
            Json(ChatResponse {
                response: format!("❌ Error: {}", e),
                success: false,
            })
        }
    }
}

async fn handle_reset(State(state): State<AppState>) -> Json<ResetResponse> {
    state.agent.lock().await.reset();
    Json(ResetResponse {
        success: true,
        message: "Chat reset".to_string(),
    })
}

async fn stage_upload(index: usize, filename: &str, bytes: &[u8]) -> anyhow::Result<String> {
    let dir = PathBuf::from(UPLOAD_DIR);
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(format!("{}_{}", index, filename));
    tokio::fs::write(&path, bytes).await?;
    Ok(path.to_string_lossy().into_owned())
}

fn annotate_with_images(message: &str, paths: &[String]) -> String {
    match paths {
        [single] => format!("{}\n\n[Image uploaded: {}]", message, single),
        [before, after] => format!(
            "{}\n\n[2 images uploaded for transformation comparison: before={}, after={}]",
            message, before, after
        ),
        many => format!(
            "{}\n\n[{} images uploaded: {}]",
            message,
            many.len(),
            many.join(", ")
        ),
    }
}
