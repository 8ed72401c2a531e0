//! `completion-client`: async driver for OpenAI-compatible chat-completion
//! endpoints.
//!
//! Callers hand over a single free-text instruction plus a [`ResponseShape`]
//! hint and get the generated text back. Everything about the remote model
//! (identity, latency, rate limits) is outside this crate's control, so the
//! surface is deliberately small:
//!
//! ```text
//! CompletionRequest ──▶ Completion::complete ──▶ CompletionResponse
//!                          │
//!                          ├─ OpenAiClient   (reqwest, bearer auth, timeout)
//!                          └─ test doubles   (anything implementing the trait)
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use completion_client::{ClientSettings, Completion, CompletionRequest, OpenAiClient};
//!
//! let client = OpenAiClient::new(ClientSettings {
//!     api_key: std::env::var("OPENAI_API_KEY").ok(),
//!     ..Default::default()
//! })?;
//! let reply = client.complete(CompletionRequest::text("Say hello")).await?;
//! println!("{}", reply.text());
//! ```

pub mod client;
pub mod error;
pub mod types;


pub use client::{ClientSettings, Completion, CompletionFuture, OpenAiClient};
pub use error::CompletionError;
pub use types::{CompletionRequest, CompletionResponse, ResponseShape, TokenUsage};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, CompletionError>;
