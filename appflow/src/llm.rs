//! Language-model client seam.

use crate::errors::LlmError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for text-completion backends.
///
/// Any model satisfying this synchronous text-completion contract is
/// interchangeable: the call blocks until a complete response is returned.
/// Incremental/streaming consumption is not part of the contract.
/// Implementations must be callable from multiple concurrent stages.
#[async_trait]
pub trait LanguageModel: Send + Sync + Debug {
    /// Completes a prompt at the given sampling temperature.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, LlmError>;
}
