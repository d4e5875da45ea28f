//! Hosted service clients for CardSense.
//!
//! Implementations of the `cardsense_core` service traits. The OpenAI
//! provider serves both completions and the knowledge base.

pub mod openai;

pub use openai::OpenAiProvider;
