//! LLM completion and embedding provider abstraction.

pub mod error;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openai;
pub mod provider;

pub use error::LlmError;
pub use provider::{CompletionRequest, LlmProvider, ResponseFormat};
