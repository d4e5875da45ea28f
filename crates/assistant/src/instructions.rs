//! System instructions for the completion service.
//!
//! Read from a markdown file on every request so edits take effect without
//! a restart. A missing or empty file falls back to built-in text.

use std::path::PathBuf;
use tracing::warn;

/// Built-in instructions used when the prompt file is unavailable.
pub const FALLBACK_INSTRUCTIONS: &str = "\
You are CardSense, an assistant that helps users in India choose and get the most out of credit cards.

Guidelines:
- Answer using the bank and card documents available through file search; say so when they do not cover the question.
- Quote fees, reward rates and eligibility exactly as the documents state them.
- When the user shares their cards or spending, tailor recommendations to that profile.
- Keep answers concise and structured, and never invent card features.";

/// Loader for the system instructions file.
#[derive(Debug, Clone)]
pub struct Instructions {
    path: PathBuf,
}

impl Instructions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current instructions text.
    pub async fn load(&self) -> String {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(path = %self.path.display(), "System prompt file is empty, using built-in instructions");
                FALLBACK_INSTRUCTIONS.to_string()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "System prompt file unreadable, using built-in instructions");
                FALLBACK_INSTRUCTIONS.to_string()
            }
        }
    }
}
