//! Shared test doubles for the assistant tests.

use async_trait::async_trait;
use cardsense_core::error::{ProviderError, StoreError};
use cardsense_core::exchange::ConversationToken;
use cardsense_core::knowledge::{
    BatchStatus, Document, FileBatch, HandleStore, KnowledgeBaseHandle, KnowledgeBaseService,
};
use cardsense_core::provider::{CompletionRequest, CompletionResponse, CompletionService};
use std::sync::Mutex;

/// A completion service that replays a script of results.
///
/// Each call to `respond` returns the next entry and records the request.
/// Panics if more calls are made than entries provided.
pub struct ScriptedCompletion {
    script: Mutex<Vec<Result<CompletionResponse, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<Result<CompletionResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A service that answers once with `text` under token `id`.
    pub fn answering(id: &str, text: &str) -> Self {
        Self::new(vec![Ok(answer(id, text))])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> CompletionRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn respond(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let script = self.script.lock().unwrap();
        let call = requests.len();
        if call >= script.len() {
            panic!(
                "ScriptedCompletion: no more responses (call #{call}, have {})",
                script.len()
            );
        }
        requests.push(request);
        script[call].clone()
    }
}

/// Build a successful completion response.
pub fn answer(id: &str, text: &str) -> CompletionResponse {
    CompletionResponse {
        id: ConversationToken::new(id),
        output_text: text.to_string(),
        model: "gpt-4o-mini".into(),
    }
}

#[derive(Default)]
struct KnowledgeBaseCalls {
    created: Vec<String>,
    uploads: Vec<Vec<String>>,
}

/// A knowledge-base service that counts calls and issues `vs_created_<n>`.
#[derive(Default)]
pub struct MockKnowledgeBase {
    calls: Mutex<KnowledgeBaseCalls>,
    fail_uploads: bool,
    fail_first_create: bool,
    batch_status: Option<BatchStatus>,
}

impl MockKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_uploads: true,
            ..Self::default()
        }
    }

    pub fn failing_first_create() -> Self {
        Self {
            fail_first_create: true,
            ..Self::default()
        }
    }

    /// Uploads succeed but the batch settles in `status`.
    pub fn settling_as(status: BatchStatus) -> Self {
        Self {
            batch_status: Some(status),
            ..Self::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.calls.lock().unwrap().created.len()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.calls.lock().unwrap().created.clone()
    }

    pub fn upload_count(&self) -> usize {
        self.calls.lock().unwrap().uploads.len()
    }

    /// File names of the most recent upload.
    pub fn uploaded_files(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .uploads
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl KnowledgeBaseService for MockKnowledgeBase {
    async fn create(&self, name: &str) -> Result<KnowledgeBaseHandle, ProviderError> {
        // Yield so concurrent resolvers actually interleave.
        tokio::task::yield_now().await;

        let mut calls = self.calls.lock().unwrap();
        calls.created.push(name.to_string());
        let n = calls.created.len();
        if self.fail_first_create && n == 1 {
            return Err(ProviderError::Network("connection reset".into()));
        }
        Ok(KnowledgeBaseHandle::new(format!("vs_created_{n}")))
    }

    async fn upload_batch(
        &self,
        _handle: &KnowledgeBaseHandle,
        documents: Vec<Document>,
    ) -> Result<FileBatch, ProviderError> {
        let mut calls = self.calls.lock().unwrap();
        calls
            .uploads
            .push(documents.iter().map(|d| d.file_name.clone()).collect());
        if self.fail_uploads {
            return Err(ProviderError::ApiError {
                status_code: 500,
                message: "upload rejected".into(),
            });
        }
        Ok(FileBatch {
            id: format!("vsfb_{}", calls.uploads.len()),
            status: self.batch_status.unwrap_or(BatchStatus::Completed),
            completed: documents.len() as u32,
            failed: 0,
        })
    }
}

/// An in-memory handle store.
#[derive(Default)]
pub struct MemoryHandleStore {
    value: Mutex<Option<KnowledgeBaseHandle>>,
    saved: Mutex<Option<KnowledgeBaseHandle>>,
    read_only: bool,
    unreadable: bool,
}

impl MemoryHandleStore {
    pub fn with(initial: Option<&str>) -> Self {
        Self {
            value: Mutex::new(initial.map(KnowledgeBaseHandle::new)),
            ..Self::default()
        }
    }

    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub fn unreadable() -> Self {
        Self {
            unreadable: true,
            ..Self::default()
        }
    }

    /// The last handle written through `save`.
    pub fn saved(&self) -> Option<KnowledgeBaseHandle> {
        self.saved.lock().unwrap().clone()
    }
}

impl HandleStore for MemoryHandleStore {
    fn load(&self) -> Result<Option<KnowledgeBaseHandle>, StoreError> {
        if self.unreadable {
            return Err(StoreError::Read {
                path: ".env".into(),
                reason: "Error parsing line: 'not a valid line'".into(),
            });
        }
        Ok(self.value.lock().unwrap().clone())
    }

    fn save(&self, handle: &KnowledgeBaseHandle) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly("memory store is read-only".into()));
        }
        *self.value.lock().unwrap() = Some(handle.clone());
        *self.saved.lock().unwrap() = Some(handle.clone());
        Ok(())
    }
}
