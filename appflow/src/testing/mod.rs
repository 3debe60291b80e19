//! Deterministic model and backend doubles for tests.
//!
//! These are exported so downstream users can exercise pipelines without a
//! real model or search service.

use crate::errors::LlmError;
use crate::llm::LanguageModel;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// A model that returns its prompt unchanged.
///
/// Useful for proving what text actually reached the model.
#[derive(Debug, Default)]
pub struct EchoModel {
    calls: Mutex<usize>,
}

impl EchoModel {
    /// Creates an echo model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of completions served.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl LanguageModel for EchoModel {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, LlmError> {
        *self.calls.lock() += 1;
        Ok(prompt.to_string())
    }
}

/// A model that replays canned responses in order.
///
/// Running out of responses is a backend error, which keeps tests honest
/// about how many calls they expect.
#[derive(Debug)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    /// Creates a scripted model from a response sequence.
    #[must_use]
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            calls: Mutex::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns the number of completions served.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }

    /// Returns every prompt received, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, LlmError> {
        *self.calls.lock() += 1;
        self.prompts.lock().push(prompt.to_string());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| LlmError::backend("scripted model ran out of responses"))
    }
}

/// A model that counts calls, optionally sleeping before answering.
///
/// The per-prompt delay map lets concurrency tests slow down one stage
/// without touching the others.
#[derive(Debug, Default)]
pub struct CountingModel {
    calls: Mutex<usize>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
    delay_marker: Option<String>,
}

impl CountingModel {
    /// Creates a counting model with no delay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every completion by the given duration.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delays only completions whose prompt contains the marker.
    #[must_use]
    pub fn with_delay_for(mut self, marker: impl Into<String>, delay: Duration) -> Self {
        self.delay = Some(delay);
        self.delay_marker = Some(marker.into());
        self
    }

    /// Returns the number of completions served.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }

    /// Returns every prompt received, in completion order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LanguageModel for CountingModel {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, LlmError> {
        *self.calls.lock() += 1;
        if let Some(delay) = self.delay {
            let applies = self
                .delay_marker
                .as_ref()
                .map_or(true, |marker| prompt.contains(marker.as_str()));
            if applies {
                tokio::time::sleep(delay).await;
            }
        }
        self.prompts.lock().push(prompt.to_string());
        Ok(format!("response #{}", self.calls.lock()))
    }
}

/// A model that always fails with a configured error.
#[derive(Debug)]
pub struct FailingModel {
    error: LlmError,
    calls: Mutex<usize>,
}

impl FailingModel {
    /// Creates a failing model.
    #[must_use]
    pub fn new(error: LlmError) -> Self {
        Self {
            error,
            calls: Mutex::new(0),
        }
    }

    /// Returns the number of attempted completions.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String, LlmError> {
        *self.calls.lock() += 1;
        Err(self.error.clone())
    }
}
