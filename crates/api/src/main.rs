use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use assistant_tools::{MediaConfig, SetReminder, ToolRegistry};
use chat_core::{detect_mode, Attachment, TurnRequest};
use gemini_brain::GeminiBrain;
use openai_brain::{AltBrain, AltProvider};
use orchestrator::{ChatEngine, EngineConfig, FinalResponse, ProviderRouter};

#[derive(Clone)]
struct AppState {
    api_token: Option<String>,
    engine: Arc<ChatEngine>,
}

/// One inbound chat request: the turn itself plus an optional user id
/// used to link the session to an account.
///
/// Clients may also attach media through the shorthand `image`, `video`,
/// and `document` fields, each accepting a single value or an array.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(flatten)]
    turn: TurnRequest,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    image: Option<OneOrMany<String>>,
    #[serde(default)]
    video: Option<OneOrMany<String>>,
    #[serde(default)]
    document: Option<OneOrMany<String>>,
}

/// A bare value or an array of values.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

/// Fold the shorthand media fields into the turn's attachment list.
///
/// The shorthand fields carry no mime type, so the common defaults are
/// assumed for each kind.
fn merge_shorthand_attachments(
    turn: &mut TurnRequest,
    image: Option<OneOrMany<String>>,
    video: Option<OneOrMany<String>>,
    document: Option<OneOrMany<String>>,
) {
    for data in image.into_iter().flat_map(OneOrMany::into_vec) {
        turn.attachments.push(Attachment::image("image/jpeg", data));
    }
    for data in video.into_iter().flat_map(OneOrMany::into_vec) {
        turn.attachments.push(Attachment::new("video/mp4", data, "video"));
    }
    for data in document.into_iter().flat_map(OneOrMany::into_vec) {
        turn.attachments
            .push(Attachment::new("application/pdf", data, "document.pdf"));
    }
}

#[derive(Debug, Serialize)]
struct Health {
    status: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let addr = env::var("SONA_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string());
    let api_token = env::var("SONA_API_TOKEN").ok();

    let default = match GeminiBrain::from_env() {
        Ok(brain) => Arc::new(brain),
        Err(err) => {
            eprintln!("Cannot start without the default provider: {err}");
            std::process::exit(1);
        }
    };

    let mut router = ProviderRouter::new(default);
    for provider in [
        AltProvider::Groq,
        AltProvider::OpenAi,
        AltProvider::Kimi,
        AltProvider::Claude,
    ] {
        match AltBrain::from_env(provider) {
            Ok(brain) => {
                info!(provider = provider.name(), "alternate provider configured");
                router = router.with_alternate(provider, Arc::new(brain));
            }
            Err(_) => {
                info!(provider = provider.name(), "alternate provider not configured, skipping");
            }
        }
    }

    let registry = build_registry();
    let engine = Arc::new(ChatEngine::new(
        Arc::new(router),
        Arc::new(registry),
        &EngineConfig::from_env(),
    ));

    let state = AppState { api_token, engine };

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .with_state(state);

    let addr: SocketAddr = addr.parse().expect("Invalid SONA_API_ADDR");
    info!(%addr, "Sona API listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

fn build_registry() -> ToolRegistry {
    match MediaConfig::from_env().and_then(assistant_tools::default_registry) {
        Ok(registry) => registry,
        Err(err) => {
            // Text chat still works without the capability services.
            warn!(error = %err, "capability tools not fully configured, running reduced registry");
            let mut registry = ToolRegistry::new();
            registry.register(SetReminder::new());
            registry
        }
    }
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let mut turn = payload.turn;
    merge_shorthand_attachments(&mut turn, payload.image, payload.video, payload.document);
    if turn.session_id.trim().is_empty() {
        turn.session_id = Uuid::new_v4().to_string();
    }
    let request_id = Uuid::new_v4();

    info!(%request_id, session = %turn.session_id, "chat request received");

    let response = match state.engine.process(&turn).await {
        Ok(response) => response,
        Err(err) => {
            warn!(%request_id, error = %err, "turn failed, returning envelope");
            // The envelope needs the mode the turn was aiming at.
            let mode = turn
                .mode
                .unwrap_or_else(|| detect_mode(&turn.content, &turn.attachments));
            FinalResponse::from_failure(mode, &err)
        }
    };

    if let Some(user_id) = payload.user_id.as_deref() {
        state.engine.sessions().link_owner(&turn.session_id, user_id).await;
    }

    Ok(Json(response).into_response())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(());
    };

    let Some(value) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Err(ApiError::Unauthorized);
    };

    let Ok(value) = value.to_str() else {
        return Err(ApiError::Unauthorized);
    };

    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token != expected {
        return Err(ApiError::Unauthorized);
    }

    Ok(())
}


#[derive(Debug)]
enum ApiError {
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                warn!("Unauthorized request");
                let body = serde_json::json!({
                    "error": {
                        "message": "Unauthorized",
                        "type": "auth_error"
                    }
                });
                (StatusCode::UNAUTHORIZED, Json(body)).into_response()
            }
        }
    }
}
