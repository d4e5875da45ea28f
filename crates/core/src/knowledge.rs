//! Knowledge base trait: the abstraction over the hosted document store.
//!
//! A knowledge base is created once per deployment, filled with plain-text
//! documents, and then referenced by handle from every completion request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, StoreError};

/// Opaque identifier of a remote document collection (a vector store id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBaseHandle(pub String);

impl KnowledgeBaseHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KnowledgeBaseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A local document queued for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Processing state of an uploaded batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    InProgress,
    Completed,
    Cancelled,
    Failed,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Final report for a document batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBatch {
    pub id: String,
    pub status: BatchStatus,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub failed: u32,
}

/// The hosted knowledge-base service.
#[async_trait]
pub trait KnowledgeBaseService: Send + Sync {
    /// Create an empty knowledge base and return its handle.
    async fn create(&self, name: &str) -> Result<KnowledgeBaseHandle, ProviderError>;

    /// Upload documents into the knowledge base as one batch.
    ///
    /// Blocks until the service reports the batch as no longer in progress.
    async fn upload_batch(
        &self,
        handle: &KnowledgeBaseHandle,
        documents: Vec<Document>,
    ) -> Result<FileBatch, ProviderError>;
}

/// Durable storage for the provisioned handle.
///
/// Implementations are small key-value files; calls are synchronous.
pub trait HandleStore: Send + Sync {
    fn load(&self) -> Result<Option<KnowledgeBaseHandle>, StoreError>;

    fn save(&self, handle: &KnowledgeBaseHandle) -> Result<(), StoreError>;
}
