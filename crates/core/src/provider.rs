//! Completion service trait: the abstraction over the hosted LLM.
//!
//! One request carries the instructions, a retrieval tool scoped to a
//! knowledge base, a single user message, and the previous continuation
//! token. The service keeps the conversation history on its side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::exchange::ConversationToken;
use crate::knowledge::KnowledgeBaseHandle;

/// A retrieval tool declaration sent with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetrievalTool {
    /// Search the given knowledge bases.
    FileSearch {
        vector_store_ids: Vec<KnowledgeBaseHandle>,
    },
}

impl RetrievalTool {
    pub fn file_search(handle: KnowledgeBaseHandle) -> Self {
        Self::FileSearch {
            vector_store_ids: vec![handle],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// System instructions
    pub instructions: String,

    /// Retrieval tools available to the model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<RetrievalTool>,

    /// The single user message for this turn
    pub input: String,

    /// Ask the service to keep the exchange so it can be continued
    #[serde(default)]
    pub store: bool,

    /// Token of the exchange this one continues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<ConversationToken>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Newly issued continuation token
    pub id: ConversationToken,

    /// Generated text; empty when the model produced none
    #[serde(default)]
    pub output_text: String,

    /// Which model actually responded
    #[serde(default)]
    pub model: String,
}

/// The hosted completion service.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// A human-readable name for this service (e.g., "openai").
    fn name(&self) -> &str;

    /// Send one request and wait for the complete response.
    async fn respond(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}
