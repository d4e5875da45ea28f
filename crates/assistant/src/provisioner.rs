//! Knowledge base provisioning.
//!
//! Resolution order, first hit wins:
//!
//! 1. the handle preset in configuration (`VECTOR_STORE_ID`)
//! 2. the handle persisted in the local store (local mode only)
//! 3. a freshly created knowledge base, filled from the documents directory
//!    and persisted for the next start (local mode only)
//!
//! Managed deployments never create anything: without a preset handle
//! resolution fails with a configuration error. The resolved handle is
//! cached for the life of the process, and concurrent first calls share a
//! single creation.

use cardsense_config::{AppConfig, DeploymentMode};
use cardsense_core::error::{Error, Result};
use cardsense_core::knowledge::{
    BatchStatus, Document, HandleStore, KnowledgeBaseHandle, KnowledgeBaseService,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Inputs the provisioner needs, lifted out of [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    pub mode: DeploymentMode,
    pub preset: Option<KnowledgeBaseHandle>,
    pub name: String,
    pub documents_dir: PathBuf,
}

impl ProvisionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            mode: config.deployment,
            preset: config
                .knowledge_base
                .vector_store_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(KnowledgeBaseHandle::new),
            name: config.knowledge_base.name.clone(),
            documents_dir: config.knowledge_base.documents_dir.clone(),
        }
    }
}

/// Ensures exactly one knowledge base backs the assistant.
pub struct Provisioner {
    service: Arc<dyn KnowledgeBaseService>,
    store: Option<Arc<dyn HandleStore>>,
    settings: ProvisionSettings,
    handle: OnceCell<KnowledgeBaseHandle>,
}

impl Provisioner {
    pub fn new(service: Arc<dyn KnowledgeBaseService>, settings: ProvisionSettings) -> Self {
        Self {
            service,
            store: None,
            settings,
            handle: OnceCell::new(),
        }
    }

    /// Attach a durable store for the handle.
    pub fn with_store(mut self, store: Arc<dyn HandleStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// The cached handle, if resolution already succeeded.
    pub fn cached(&self) -> Option<&KnowledgeBaseHandle> {
        self.handle.get()
    }

    /// Return the handle of the knowledge base, creating it if needed.
    ///
    /// After the first success every call returns the same handle without
    /// touching the remote service. A failed attempt is not cached.
    pub async fn resolve(&self) -> Result<KnowledgeBaseHandle> {
        self.handle
            .get_or_try_init(|| self.lookup_or_create())
            .await
            .cloned()
    }

    async fn lookup_or_create(&self) -> Result<KnowledgeBaseHandle> {
        if let Some(handle) = &self.settings.preset {
            debug!(handle = %handle, "Using configured knowledge base");
            return Ok(handle.clone());
        }

        if !self.settings.mode.allows_provisioning() {
            return Err(Error::config(
                "VECTOR_STORE_ID must be set in managed deployments",
            ));
        }

        if let Some(store) = &self.store {
            match store.load() {
                Ok(Some(handle)) => {
                    debug!(handle = %handle, "Using persisted knowledge base");
                    return Ok(handle);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Cannot read persisted knowledge base handle, treating as absent");
                }
            }
        }

        info!(name = %self.settings.name, "Creating knowledge base");
        let handle = self.service.create(&self.settings.name).await?;
        info!(handle = %handle, "Knowledge base created");

        self.upload_documents(&handle).await;

        if let Some(store) = &self.store {
            if let Err(e) = store.save(&handle) {
                warn!(handle = %handle, error = %e, "Failed to persist knowledge base handle");
            }
        }

        Ok(handle)
    }

    /// Best-effort upload of the documents directory. Failures are logged.
    async fn upload_documents(&self, handle: &KnowledgeBaseHandle) {
        let dir = &self.settings.documents_dir;
        let documents = match collect_documents(dir).await {
            Ok(docs) => docs,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Cannot read documents directory, knowledge base left empty");
                return;
            }
        };

        if documents.is_empty() {
            warn!(dir = %dir.display(), "No .txt documents found, knowledge base left empty");
            return;
        }

        let count = documents.len();
        match self.service.upload_batch(handle, documents).await {
            Ok(batch) if batch.status == BatchStatus::Completed => {
                info!(
                    handle = %handle,
                    files = count,
                    completed = batch.completed,
                    failed = batch.failed,
                    "Documents uploaded"
                );
            }
            Ok(batch) => {
                warn!(handle = %handle, batch = %batch.id, status = %batch.status, "Document batch did not complete");
            }
            Err(e) => {
                warn!(handle = %handle, error = %e, "Document upload failed");
            }
        }
    }
}

/// Read every `*.txt` file directly inside `dir`, sorted by file name.
///
/// Unreadable files are skipped.
pub async fn collect_documents(dir: &Path) -> std::io::Result<Vec<Document>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_txt = path.extension().is_some_and(|ext| ext == "txt");
        if is_txt && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => documents.push(Document { file_name, bytes }),
            Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable document"),
        }
    }

    Ok(documents)
}
