//! OpenAI provider implementation.
//!
//! Talks to the Responses API for answers and to the vector store, files,
//! and file batch endpoints for the knowledge base. Works with any endpoint
//! exposing the same routes under one base URL.

use async_trait::async_trait;
use cardsense_core::error::ProviderError;
use cardsense_core::knowledge::{
    BatchStatus, Document, FileBatch, KnowledgeBaseHandle, KnowledgeBaseService,
};
use cardsense_core::provider::{CompletionRequest, CompletionResponse, CompletionService};
use cardsense_core::ConversationToken;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A client for the hosted OpenAI API.
///
/// One value serves as both the completion service and the knowledge-base
/// service, sharing a single HTTP connection pool.
pub struct OpenAiProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    poll_interval: Duration,
}

impl OpenAiProvider {
    /// Create a new provider.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        // No request timeout: slow answers are left to the remote service.
        let client = reqwest::Client::new();

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    /// Build a provider from configuration. Requires an API key.
    pub fn from_config(config: &cardsense_config::AppConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            ProviderError::NotConfigured("no API key (set OPENAI_API_KEY)".into())
        })?;

        Ok(Self::new("openai", &config.api_url, api_key).with_poll_interval(
            Duration::from_millis(config.knowledge_base.poll_interval_ms),
        ))
    }

    /// Set how often an upload batch is polled.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Send a request and decode a successful JSON body.
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: status,
            message: format!("Failed to parse response: {e}"),
        })
    }

    /// Build the Responses API body.
    fn to_api_body(request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "instructions": request.instructions,
            "input": [{
                "type": "message",
                "role": "user",
                "content": [{ "type": "input_text", "text": request.input }],
            }],
            "store": request.store,
        });

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(request.tools);
        }

        if let Some(previous) = &request.previous_response_id {
            body["previous_response_id"] = serde_json::json!(previous);
        }

        body
    }

    async fn upload_file(&self, document: Document) -> Result<String, ProviderError> {
        let part = reqwest::multipart::Part::bytes(document.bytes)
            .file_name(document.file_name.clone())
            .mime_str("text/plain")
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part("file", part);

        let file: ApiFile = self.send_json(self.post("/files").multipart(form)).await?;
        debug!(file = %document.file_name, id = %file.id, "Uploaded document");
        Ok(file.id)
    }
}

#[async_trait]
impl CompletionService for OpenAiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn respond(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let body = Self::to_api_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            continued = request.previous_response_id.is_some(),
            "Sending response request"
        );

        let api_response: ApiResponse = self
            .send_json(self.post("/responses").json(&body))
            .await?;

        Ok(CompletionResponse {
            output_text: api_response.output_text(),
            id: ConversationToken::new(api_response.id),
            model: api_response.model,
        })
    }
}

#[async_trait]
impl KnowledgeBaseService for OpenAiProvider {
    async fn create(&self, name: &str) -> Result<KnowledgeBaseHandle, ProviderError> {
        let store: ApiVectorStore = self
            .send_json(
                self.post("/vector_stores")
                    .header("OpenAI-Beta", "assistants=v2")
                    .json(&serde_json::json!({ "name": name })),
            )
            .await?;

        info!(provider = %self.name, id = %store.id, name, "Created vector store");
        Ok(KnowledgeBaseHandle::new(store.id))
    }

    async fn upload_batch(
        &self,
        handle: &KnowledgeBaseHandle,
        documents: Vec<Document>,
    ) -> Result<FileBatch, ProviderError> {
        let mut file_ids = Vec::with_capacity(documents.len());
        for document in documents {
            file_ids.push(self.upload_file(document).await?);
        }

        let batches_path = format!("/vector_stores/{handle}/file_batches");
        let mut batch: ApiFileBatch = self
            .send_json(
                self.post(&batches_path)
                    .header("OpenAI-Beta", "assistants=v2")
                    .json(&serde_json::json!({ "file_ids": file_ids })),
            )
            .await?;

        while batch.status == BatchStatus::InProgress {
            tokio::time::sleep(self.poll_interval).await;
            batch = self
                .send_json(
                    self.get(&format!("{batches_path}/{}", batch.id))
                        .header("OpenAI-Beta", "assistants=v2"),
                )
                .await?;
            debug!(batch = %batch.id, status = %batch.status, "Polled file batch");
        }

        Ok(FileBatch {
            id: batch.id,
            status: batch.status,
            completed: batch.file_counts.completed,
            failed: batch.file_counts.failed,
        })
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    output: Vec<ApiOutputItem>,
}

impl ApiResponse {
    /// Concatenate every `output_text` part of every message item.
    fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                ApiOutputItem::Message { content } => Some(content),
                ApiOutputItem::Other => None,
            })
            .flatten()
            .filter_map(|part| match part {
                ApiContentPart::OutputText { text } => Some(text.as_str()),
                ApiContentPart::Other => None,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiOutputItem {
    Message {
        #[serde(default)]
        content: Vec<ApiContentPart>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentPart {
    OutputText { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiVectorStore {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiFileBatch {
    id: String,
    status: BatchStatus,
    #[serde(default)]
    file_counts: ApiFileCounts,
}

#[derive(Debug, Default, Deserialize)]
struct ApiFileCounts {
    #[serde(default)]
    completed: u32,
    #[serde(default)]
    failed: u32,
}
