//! LLM provider abstraction for memo-rs
//!
//! Provider-agnostic types for text chat completions:
//!
//! - Message types for LLM communication
//! - Completion request/response types
//! - Provider trait for LLM implementations
//! - A concrete OpenAI-compatible provider
//!
//! The surface is deliberately text-only; the synthesis stage sends one
//! prompt and reads one narrative back, so tool calling and multi-modal
//! content are out of scope.

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LlmError, Result};
pub use messages::{Message, Role};
pub use provider::LlmProvider;
pub use providers::{OpenAiConfig, OpenAiProvider};
