//! HTTP API gateway for CardSense.
//!
//! Exposes a liveness marker, a health check, and `POST /chat`, which
//! forwards one question to the assistant and returns its reply together
//! with the continuation token for the next turn.
//!
//! Built on Axum.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use cardsense_assistant::Assistant;
use cardsense_config::AppConfig;
use cardsense_core::context::ChatContext;
use cardsense_core::error::ProviderError;
use cardsense_core::exchange::ConversationToken;
use cardsense_core::knowledge::KnowledgeBaseService;
use cardsense_core::provider::CompletionService;
use cardsense_providers::OpenAiProvider;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub assistant: Arc<Assistant>,
}

type SharedState = Arc<GatewayState>;

/// Wire an assistant backed by the OpenAI provider.
pub fn assistant_from_config(config: &AppConfig) -> Result<Assistant, ProviderError> {
    let provider = Arc::new(OpenAiProvider::from_config(config)?);
    let completions: Arc<dyn CompletionService> = provider.clone();
    let knowledge: Arc<dyn KnowledgeBaseService> = provider;
    Ok(Assistant::from_config(config, completions, knowledge))
}

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// The knowledge base is resolved before the listener binds; a failure
/// there aborts startup.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let assistant = Arc::new(assistant_from_config(&config)?);
    let handle = assistant.provisioner().resolve().await?;
    info!(handle = %handle, deployment = %config.deployment, "Knowledge base ready");

    let app = build_router(Arc::new(GatewayState { assistant }));

    info!(addr = %addr, model = %config.model, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

async fn root_handler() -> Json<StatusResponse> {
    Json(StatusResponse { status: "ok" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub previous_response_id: Option<ConversationToken>,
    /// A JSON object for a structured profile, or a plain string.
    #[serde(default)]
    pub context: Option<ChatContext>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response_text: String,
    pub response_id: Option<ConversationToken>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.question.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "question must not be empty"));
    }

    info!(
        question_len = payload.question.len(),
        has_context = payload.context.is_some(),
        continued = payload.previous_response_id.is_some(),
        "Chat request received"
    );

    match state
        .assistant
        .ask(
            &payload.question,
            payload.context.as_ref(),
            payload.previous_response_id,
        )
        .await
    {
        Ok(reply) => Ok(Json(ChatResponse {
            response_text: reply.text,
            response_id: reply.token,
        })),
        Err(e) => {
            error!(error = %e, "Chat request failed");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use cardsense_assistant::{Instructions, ProvisionSettings, Provisioner};
    use cardsense_config::DeploymentMode;
    use cardsense_core::knowledge::{Document, FileBatch, KnowledgeBaseHandle};
    use cardsense_core::provider::{CompletionRequest, CompletionResponse};
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Echoes the assembled input back and issues `resp_<n>` tokens.
    #[derive(Default)]
    struct EchoCompletion {
        requests: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionService for EchoCompletion {
        fn name(&self) -> &str {
            "echo_mock"
        }

        async fn respond(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            Ok(CompletionResponse {
                id: ConversationToken::new(format!("resp_{}", requests.len())),
                output_text: request.input,
                model: request.model,
            })
        }
    }

    struct NoKnowledgeBase;

    #[async_trait]
    impl KnowledgeBaseService for NoKnowledgeBase {
        async fn create(&self, _name: &str) -> Result<KnowledgeBaseHandle, ProviderError> {
            panic!("knowledge base must not be created in gateway tests");
        }

        async fn upload_batch(
            &self,
            _handle: &KnowledgeBaseHandle,
            _documents: Vec<Document>,
        ) -> Result<FileBatch, ProviderError> {
            panic!("documents must not be uploaded in gateway tests");
        }
    }

    fn test_state(preset: Option<&str>) -> (SharedState, Arc<EchoCompletion>) {
        let completions = Arc::new(EchoCompletion::default());
        let settings = ProvisionSettings {
            mode: DeploymentMode::Managed,
            preset: preset.map(KnowledgeBaseHandle::new),
            name: "Bank Information".into(),
            documents_dir: "txt_docs".into(),
        };
        let provisioner = Arc::new(Provisioner::new(Arc::new(NoKnowledgeBase), settings));
        let assistant = Assistant::new(
            completions.clone(),
            provisioner,
            Instructions::new("/no/such/prompt.md"),
            "gpt-4o-mini",
        );
        (
            Arc::new(GatewayState {
                assistant: Arc::new(assistant),
            }),
            completions,
        )
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_endpoint() {
        let (state, _) = test_state(Some("vs_test"));
        let app = build_router(state);

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (state, _) = test_state(Some("vs_test"));
        let app = build_router(state);

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn chat_returns_text_and_token() {
        let (state, completions) = test_state(Some("vs_test"));
        let app = build_router(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "question": "Best card for fuel?",
                "previous_response_id": "resp_0"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["response_id"], "resp_1");
        assert!(
            body["response_text"]
                .as_str()
                .unwrap()
                .ends_with("Question: Best card for fuel?")
        );

        let requests = completions.requests.lock().unwrap();
        assert_eq!(
            requests[0].previous_response_id,
            Some(ConversationToken::new("resp_0"))
        );
    }

    #[tokio::test]
    async fn chat_accepts_structured_context() {
        let (state, _) = test_state(Some("vs_test"));
        let app = build_router(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "question": "Upgrade?",
                "context": {
                    "owned_cards": [{
                        "name": "Gold Card",
                        "is_primary": true,
                        "annual_fee": 500,
                        "benefits": {"airport_lounge": true, "cashback": false}
                    }]
                }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = json_body(response).await["response_text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(text.contains("Gold Card (Primary)"));
        assert!(text.contains("Key Benefits: Airport Lounge"));
    }

    #[tokio::test]
    async fn chat_tolerates_null_and_string_values_in_context() {
        let (state, _) = test_state(Some("vs_test"));
        let app = build_router(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "question": "Upgrade?",
                "context": {
                    "owned_cards": [{"name": "Gold Card", "is_primary": null, "annual_fee": "500"}],
                    "spending_patterns": [{"category": "dining", "amount": "5000", "percentage": 25}]
                }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = json_body(response).await["response_text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(text.contains("- Gold Card\n  Annual Fee: ₹500"));
        assert!(text.contains("- dining: 5000 (25%)"));
        assert!(text.ends_with("Upgrade?"));
    }

    #[tokio::test]
    async fn chat_accepts_legacy_context() {
        let (state, _) = test_state(Some("vs_test"));
        let app = build_router(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "question": "Upgrade?",
                "context": "I have an Amazon Pay ICICI card"
            })))
            .await
            .unwrap();

        let text = json_body(response).await["response_text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(text.starts_with("User Context:\nI have an Amazon Pay ICICI card"));
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let (state, completions) = test_state(Some("vs_test"));
        let app = build_router(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({"question": "   "})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(completions.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_handle_in_managed_mode_is_server_error() {
        let (state, _) = test_state(None);
        let app = build_router(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({"question": "Hi"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("VECTOR_STORE_ID"));
    }
}
