//! Continuation tokens and the result of one chat exchange.

use serde::{Deserialize, Serialize};

/// Opaque identifier of a prior exchange, issued by the completion service.
///
/// Never inspected locally; only threaded from one response to the next request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationToken(pub String);

impl ConversationToken {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an exchange ended, when it did not end fatally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ReplyOutcome {
    /// The service produced an answer and a fresh token.
    Answered,
    /// The service succeeded but produced no text.
    Empty,
    /// The service call failed; the detail is already embedded in the reply text.
    ServiceError(String),
}

/// The user-visible result of one chat exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,

    /// The token to send with the next turn. For soft failures this is the
    /// caller's previous token, unchanged.
    pub token: Option<ConversationToken>,

    pub outcome: ReplyOutcome,
}

impl Reply {
    pub fn is_answered(&self) -> bool {
        self.outcome == ReplyOutcome::Answered
    }
}
