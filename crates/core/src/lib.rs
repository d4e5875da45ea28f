//! # CardSense Core
//!
//! Domain types, service traits, and error definitions for the CardSense
//! assistant. This crate has **no framework dependencies**: it defines the
//! model that the provider, assistant, and gateway crates implement against.
//!
//! ## Design Philosophy
//!
//! Every remote collaborator is a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping the hosted service without touching orchestration code
//! - Testing with scripted mock services
//! - A clean dependency graph (all crates depend inward on core)

pub mod context;
pub mod error;
pub mod exchange;
pub mod knowledge;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use context::{Amount, ChatContext, OwnedCard, SpendingPattern, UserContext, UserProfile};
pub use error::{Error, ProviderError, Result, StoreError};
pub use exchange::{ConversationToken, Reply, ReplyOutcome};
pub use knowledge::{
    BatchStatus, Document, FileBatch, HandleStore, KnowledgeBaseHandle, KnowledgeBaseService,
};
pub use provider::{CompletionRequest, CompletionResponse, CompletionService, RetrievalTool};
