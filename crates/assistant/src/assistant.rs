//! The conversation gateway: one question in, one reply out.
//!
//! Each call resolves the knowledge base, assembles the question with any
//! user context, and makes exactly one request to the completion service.
//! Conversation history is kept remotely and threaded by token.

use crate::context::format_context;
use crate::instructions::Instructions;
use crate::provisioner::{ProvisionSettings, Provisioner};
use cardsense_config::AppConfig;
use cardsense_core::context::ChatContext;
use cardsense_core::error::Result;
use cardsense_core::exchange::{ConversationToken, Reply, ReplyOutcome};
use cardsense_core::knowledge::{HandleStore, KnowledgeBaseService};
use cardsense_core::provider::{CompletionRequest, CompletionService, RetrievalTool};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reply text when the service answers with no text.
pub const EMPTY_RESPONSE_FALLBACK: &str = "I couldn't process that request. Please try again.";

/// Prefix of the reply text when the service call fails.
pub const SERVICE_ERROR_PREFIX: &str = "An error occurred while processing your request: ";

/// Prepended to questions that arrive without any user context.
pub const ASK_FOR_CARDS_INSTRUCTION: &str = "\
The user has not shared any information about the credit cards they already hold. \
Before recommending a new card, first ask which credit cards they currently have, \
then tailor the recommendation to fill the gaps in their existing benefits.";

/// Answers user questions against the provisioned knowledge base.
pub struct Assistant {
    completions: Arc<dyn CompletionService>,
    provisioner: Arc<Provisioner>,
    instructions: Instructions,
    model: String,
}

impl Assistant {
    pub fn new(
        completions: Arc<dyn CompletionService>,
        provisioner: Arc<Provisioner>,
        instructions: Instructions,
        model: impl Into<String>,
    ) -> Self {
        Self {
            completions,
            provisioner,
            instructions,
            model: model.into(),
        }
    }

    /// Wire an assistant from configuration. The handle store is attached
    /// only in local deployments.
    pub fn from_config(
        config: &AppConfig,
        completions: Arc<dyn CompletionService>,
        knowledge: Arc<dyn KnowledgeBaseService>,
    ) -> Self {
        let mut provisioner = Provisioner::new(knowledge, ProvisionSettings::from_config(config));
        if let Some(store) = config.handle_store() {
            let store: Arc<dyn HandleStore> = Arc::new(store);
            provisioner = provisioner.with_store(store);
        }

        Self::new(
            completions,
            Arc::new(provisioner),
            Instructions::new(config.assistant.system_prompt_path.clone()),
            config.model.clone(),
        )
    }

    pub fn provisioner(&self) -> &Arc<Provisioner> {
        &self.provisioner
    }

    /// Ask one question, optionally with user context and the token of the
    /// previous exchange.
    ///
    /// Only provisioning failures are returned as `Err`. Service failures
    /// and empty answers come back as a [`Reply`] carrying fallback text and
    /// the caller's previous token.
    pub async fn ask(
        &self,
        question: &str,
        context: Option<&ChatContext>,
        previous: Option<ConversationToken>,
    ) -> Result<Reply> {
        let handle = self.provisioner.resolve().await?;
        let instructions = self.instructions.load().await;
        let input = build_question(question, context);

        let request = CompletionRequest {
            model: self.model.clone(),
            instructions,
            tools: vec![RetrievalTool::file_search(handle)],
            input,
            store: true,
            previous_response_id: previous.clone(),
        };

        debug!(
            service = self.completions.name(),
            model = %self.model,
            continued = previous.is_some(),
            "Sending question"
        );

        match self.completions.respond(request).await {
            Ok(response) if !response.output_text.trim().is_empty() => {
                info!(token = %response.id, "Question answered");
                Ok(Reply {
                    text: response.output_text,
                    token: Some(response.id),
                    outcome: ReplyOutcome::Answered,
                })
            }
            Ok(response) => {
                warn!(token = %response.id, "Service returned no text");
                Ok(Reply {
                    text: EMPTY_RESPONSE_FALLBACK.to_string(),
                    token: previous,
                    outcome: ReplyOutcome::Empty,
                })
            }
            Err(e) => {
                warn!(error = %e, "Completion request failed");
                let detail = e.to_string();
                Ok(Reply {
                    text: format!("{SERVICE_ERROR_PREFIX}{detail}"),
                    token: previous,
                    outcome: ReplyOutcome::ServiceError(detail),
                })
            }
        }
    }
}

/// Assemble the text sent as the user message.
pub fn build_question(question: &str, context: Option<&ChatContext>) -> String {
    match context {
        Some(ChatContext::Structured(ctx)) => {
            let formatted = format_context(Some(ctx));
            if !formatted.is_empty() {
                return format!(
                    "{formatted}\n\nBased on the context above, please answer the following question:\n{question}"
                );
            }
        }
        Some(ChatContext::Legacy(text)) if !text.trim().is_empty() => {
            return format!("User Context:\n{text}\n\nQuestion: {question}");
        }
        _ => {}
    }

    format!("{ASK_FOR_CARDS_INSTRUCTION}\n\nQuestion: {question}")
}
