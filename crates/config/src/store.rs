//! `.env`-backed handle store.
//!
//! Reads the handle with `dotenvy`, skipping malformed lines, and writes it
//! back by rewriting the one `KEY=value` line in place, leaving every other
//! line untouched. The file is created on first write.

use cardsense_core::{HandleStore, KnowledgeBaseHandle, StoreError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persists a knowledge-base handle under one key of a dotenv file.
#[derive(Debug, Clone)]
pub struct EnvFileStore {
    path: PathBuf,
    key: String,
}

impl EnvFileStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `line` assigns our key (`KEY=...` or `export KEY=...`).
    fn assigns_key(&self, line: &str) -> bool {
        let line = line.trim_start();
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        line.strip_prefix(self.key.as_str())
            .is_some_and(|rest| rest.trim_start().starts_with('='))
    }
}

impl HandleStore for EnvFileStore {
    fn load(&self) -> Result<Option<KnowledgeBaseHandle>, StoreError> {
        let iter = match dotenvy::from_path_iter(&self.path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        for item in iter {
            let (key, value) = match item {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Skipping malformed line");
                    continue;
                }
            };
            if key == self.key && !value.trim().is_empty() {
                return Ok(Some(KnowledgeBaseHandle::new(value.trim())));
            }
        }

        Ok(None)
    }

    fn save(&self, handle: &KnowledgeBaseHandle) -> Result<(), StoreError> {
        let existing = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let assignment = format!("{}='{}'", self.key, handle.as_str());
        let mut replaced = false;
        let mut lines: Vec<String> = existing
            .lines()
            .map(|line| {
                if !replaced && self.assigns_key(line) {
                    replaced = true;
                    assignment.clone()
                } else {
                    line.to_string()
                }
            })
            .collect();
        if !replaced {
            lines.push(assignment);
        }

        let mut content = lines.join("\n");
        content.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        std::fs::write(&self.path, content).map_err(|e| StoreError::Write {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!(path = %self.path.display(), key = %self.key, "Handle persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> EnvFileStore {
        EnvFileStore::new(dir.path().join(".env"), "VECTOR_STORE_ID")
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store_in(&dir).load().unwrap(), None);
    }

    #[test]
    fn save_creates_file_then_loads() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&KnowledgeBaseHandle::new("vs_new")).unwrap();
        assert_eq!(
            store.load().unwrap(),
            Some(KnowledgeBaseHandle::new("vs_new"))
        );
    }

    #[test]
    fn save_replaces_existing_line_and_keeps_others() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            "OPENAI_API_KEY=sk-test\nVECTOR_STORE_ID=\n# comment\n",
        )
        .unwrap();

        store.save(&KnowledgeBaseHandle::new("vs_1")).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("OPENAI_API_KEY=sk-test"));
        assert!(content.contains("# comment"));
        assert_eq!(content.matches("VECTOR_STORE_ID").count(), 1);
        assert_eq!(store.load().unwrap(), Some(KnowledgeBaseHandle::new("vs_1")));
    }

    #[test]
    fn empty_value_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "VECTOR_STORE_ID=\n").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn similar_key_is_not_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "VECTOR_STORE_ID_OLD=vs_old\n").unwrap();

        store.save(&KnowledgeBaseHandle::new("vs_2")).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("VECTOR_STORE_ID_OLD=vs_old"));
        assert_eq!(store.load().unwrap(), Some(KnowledgeBaseHandle::new("vs_2")));
    }

    #[test]
    fn malformed_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(
            store.path(),
            "not a valid line\nVECTOR_STORE_ID=vs_after_bad_line\n",
        )
        .unwrap();

        assert_eq!(
            store.load().unwrap(),
            Some(KnowledgeBaseHandle::new("vs_after_bad_line"))
        );
    }
}
