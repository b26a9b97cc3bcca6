use crate::agent::Agent;
use crate::protocol::RequestObject;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub struct ServerConfig {
    pub listen: String,
}

/// Long-lived handles shared by every request.
pub struct ServerState {
    agent: Arc<Agent>,
}

impl ServerState {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self { agent }
    }
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("invalid request body: {0}")]
    Validation(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => {
                warn!(error = %err, "rejected chat request");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "detail": err.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

pub fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: ServerConfig, agent: Agent) -> anyhow::Result<()> {
    let state = Arc::new(ServerState::new(Arc::new(agent)));

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!(address = %listener.local_addr()?, "stockchat server listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Relays the agent's fragments as a raw, unframed text stream.
async fn chat(State(state): State<Arc<ServerState>>, body: Bytes) -> Result<Response, ApiError> {
    let request: RequestObject = serde_json::from_slice(&body)?;
    info!(
        thread_id = %request.thread_id,
        prompt_id = %request.prompt.id,
        "chat request"
    );

    let fragments = Arc::clone(&state.agent).stream(request.thread_id, request.prompt.content);
    let body = Body::from_stream(fragments.map(Ok::<_, Infallible>));

    Ok((
        [
            (CONTENT_TYPE, "text/event-stream"),
            (CACHE_CONTROL, "no-cache, no-transform"),
            (CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response())
}
