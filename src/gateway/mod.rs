//! Provider gateway for OpenAI-compatible chat completions.

pub mod error;
pub mod openai;
pub mod types;

pub use error::{ErrorContext, ProviderError};
pub use openai::{ChatGateway, OpenAiCompatClient};
pub use types::{ChatRequest, ChatResponse, Message, Role};
