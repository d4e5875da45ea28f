//! The CardSense assistant.
//!
//! Three pieces, leaf first:
//!
//! 1. **Provisioner**: makes sure a remote knowledge base exists, creating
//!    and filling it on first use, and remembers its handle
//! 2. **Context formatter**: renders a [`UserContext`](cardsense_core::UserContext)
//!    into a prompt fragment
//! 3. **Assistant**: resolves the handle, builds the question, calls the
//!    completion service, and unwraps the reply
//!
//! Every call to [`Assistant::ask`] is one request to the hosted service.
//! History lives on the service side and is continued by token.

pub mod assistant;
pub mod context;
pub mod instructions;
pub mod provisioner;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assistant::{
    ASK_FOR_CARDS_INSTRUCTION, Assistant, EMPTY_RESPONSE_FALLBACK, SERVICE_ERROR_PREFIX,
    build_question,
};
pub use context::format_context;
pub use instructions::{FALLBACK_INSTRUCTIONS, Instructions};
pub use provisioner::{ProvisionSettings, Provisioner, collect_documents};
