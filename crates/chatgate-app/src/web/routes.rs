use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue, StatusCode,
    },
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;
use uuid::Uuid;

use chatgate_llm_api::{normalize, CredentialResolver, EventContext, StreamOpener};
use chatgate_models::{ChatRequest, ModelRegistry};

use crate::web::{encoder, GatewayError};

/// Per-deployment knobs for chat streams
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewaySettings {
    /// Longest wait for the next provider chunk; `None` waits forever
    pub idle_timeout: Option<Duration>,
}

/// Application state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub credentials: Arc<CredentialResolver>,
    pub opener: Arc<dyn StreamOpener>,
    pub settings: GatewaySettings,
}

impl AppState {
    pub fn new(
        registry: ModelRegistry,
        credentials: CredentialResolver,
        opener: Arc<dyn StreamOpener>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            credentials: Arc::new(credentials),
            opener,
            settings,
        }
    }
}

/// Create router with all routes
pub fn create_router(state: AppState) -> Router {
    let chat_cors = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ));

    Router::new()
        .route(
            "/api/chat",
            post(chat).options(chat_preflight).layer(chat_cors),
        )
        .route("/api/models", get(list_models))
        .route("/api/health", get(health))
        .with_state(state)
}

/// POST /api/chat - Stream a chat completion as server-sent events
async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, GatewayError> {
    let request_id = Uuid::new_v4();
    let request = ChatRequest::from_slice(&body)?;

    let config = state.registry.resolve(request.model.as_deref())?;
    tracing::info!(
        %request_id,
        model = request.model.as_deref().unwrap_or(state.registry.default_model()),
        provider = %config.provider,
        messages = request.messages.len(),
        "chat request"
    );

    let credential = state.credentials.resolve(&config)?;
    let conversation_id = request.conversation_id.as_deref();

    let source = state
        .opener
        .open_stream(
            config.provider,
            &config.model_id,
            &credential,
            &request.messages,
            conversation_id,
        )
        .await?;

    let context = EventContext::new(conversation_id, config.model_id.clone());
    let events = normalize(source, context, state.settings.idle_timeout);

    Ok(encoder::sse_response(events, request_id))
}

/// OPTIONS /api/chat - CORS preflight
async fn chat_preflight() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ModelsResponse {
    default_model: String,
    models: Vec<String>,
    providers: Vec<ProviderModels>,
}

#[derive(Debug, Serialize)]
struct ProviderModels {
    id: &'static str,
    name: &'static str,
    models: Vec<ModelEntry>,
}

#[derive(Debug, Serialize)]
struct ModelEntry {
    id: String,
    name: String,
}

/// GET /api/models - Registered models, grouped by provider
async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let providers = state
        .registry
        .providers()
        .into_iter()
        .map(|(provider, models)| ProviderModels {
            id: provider.as_str(),
            name: provider.display_name(),
            models: models
                .into_iter()
                .map(|(id, name)| ModelEntry { id, name })
                .collect(),
        })
        .collect();

    Json(ModelsResponse {
        default_model: state.registry.default_model().to_string(),
        models: state.registry.available_models(),
        providers,
    })
}

/// GET /api/health
async fn health() -> &'static str {
    "OK"
}
