//! # llm-gradientai
//!
//! DigitalOcean GradientAI chat models behind a generic LLM interface.
//!
//! [`GradientAi`] implements the blocking [`Llm`] and the non-blocking
//! [`AsyncLlm`] traits. Each call builds a fresh Gradient client that
//! identifies itself with [`PACKAGE_NAME`] and [`PACKAGE_VERSION`] in the
//! `User-Agent` header.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llm_gradientai::{AsyncLlm, ChatMessage, GradientAi, GradientAiConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let llm = GradientAi::new(GradientAiConfig::from_env("llama3.3-70b-instruct")?)?;
//!
//!     let response = llm
//!         .achat(&[
//!             ChatMessage::system("Answer in one sentence."),
//!             ChatMessage::user("Why is the sky blue?"),
//!         ])
//!         .await?;
//!
//!     println!("{}", response.message.content);
//!     Ok(())
//! }
//! ```
//!
//! The blocking methods must not be called from inside an async runtime.

pub mod core;
pub mod gradient;
pub mod provider;

pub use crate::core::{
    AsyncLlm, ChatDelta, ChatMessage, ChatResponse, ChatRole, CompletionDelta, CompletionResponse,
    Llm, LlmError, LlmMetadata, Tool, ToolCall, ToolChoice, ToolSelection,
};
pub use gradient::{ClientOptions, Connector, HttpConnector};
pub use provider::{GradientAi, GradientAiConfig, PACKAGE_NAME, PACKAGE_VERSION};
