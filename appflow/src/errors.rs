//! Error types for the appflow engine.
//!
//! Every failure that can leave a component has a dedicated type here. Local
//! stage failures (document parsing, retrieval, model calls, validator
//! rejections) are wrapped into [`StageExecutionError`] before they reach the
//! orchestrator, so pipeline execution only ever deals with one failure shape
//! per stage.

use thiserror::Error;

/// The umbrella error type for appflow operations.
#[derive(Debug, Error)]
pub enum AppflowError {
    /// A document could not be parsed or yielded no content.
    #[error("{0}")]
    DocumentParse(#[from] DocumentParseError),

    /// The search backend failed outside of stage execution.
    #[error("{0}")]
    Retrieval(#[from] RetrievalError),

    /// A stage failed during execution.
    #[error("{0}")]
    StageExecution(#[from] StageExecutionError),

    /// The pipeline definition failed validation.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// The pipeline graph contains a dependency cycle.
    #[error("{0}")]
    CycleDetected(#[from] CycleDetectedError),

    /// A pipeline run was aborted by a stage failure.
    #[error("{0}")]
    PipelineExecution(#[from] PipelineExecutionError),
}

/// Error raised when an uploaded document cannot be turned into chunks.
#[derive(Debug, Clone, Error)]
#[error("Document parse error: {message}")]
pub struct DocumentParseError {
    /// Description of what went wrong.
    pub message: String,
    /// The source label of the document, if known.
    pub source_name: Option<String>,
}

impl DocumentParseError {
    /// Creates a new document parse error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source_name: None,
        }
    }

    /// Attaches the document source label.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_name = Some(source.into());
        self
    }
}

/// Error raised when the search backend is unavailable or misbehaves.
///
/// An empty result set is not an error; this type covers backend failures
/// only.
#[derive(Debug, Clone, Error)]
#[error("Retrieval error: {message}")]
pub struct RetrievalError {
    /// Description of the backend failure.
    pub message: String,
}

impl RetrievalError {
    /// Creates a new retrieval error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors returned by a language model client.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// The model call did not return in time.
    #[error("Model call timed out after {seconds}s")]
    Timeout {
        /// Elapsed seconds before giving up.
        seconds: f64,
    },

    /// The backend rejected the call due to quota or rate limits.
    #[error("Model call rate limited: {message}")]
    RateLimited {
        /// Backend-supplied detail.
        message: String,
    },

    /// The model returned content in an unusable shape.
    #[error("Malformed model response: {message}")]
    Malformed {
        /// Why the response could not be used.
        message: String,
    },

    /// Any other backend failure.
    #[error("Model backend error: {message}")]
    Backend {
        /// Backend-supplied detail.
        message: String,
    },
}

impl LlmError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(seconds: f64) -> Self {
        Self::Timeout { seconds }
    }

    /// Creates a rate-limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    /// Creates a malformed-response error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a generic backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// The cause of a stage failure, as recorded on [`StageExecutionError`].
#[derive(Debug, Clone, Error)]
pub enum StageFailure {
    /// The model call failed.
    #[error("{0}")]
    Model(#[from] LlmError),

    /// A retrieval call made by the stage failed.
    #[error("{0}")]
    Retrieval(#[from] RetrievalError),

    /// A document operation made on behalf of the stage failed.
    #[error("{0}")]
    Document(#[from] DocumentParseError),

    /// The post-stage validator rejected the output.
    #[error("Output rejected by validator: {0}")]
    Rejected(String),

    /// The stage produced or consumed data in an unexpected shape.
    #[error("{0}")]
    Other(String),
}

/// Error raised when a single stage fails, tagged with the stage identifier.
#[derive(Debug, Clone, Error)]
#[error("Stage '{stage}' failed: {failure}")]
pub struct StageExecutionError {
    /// The identifier of the failed stage.
    pub stage: String,
    /// What went wrong.
    pub failure: StageFailure,
}

impl StageExecutionError {
    /// Creates a new stage execution error.
    #[must_use]
    pub fn new(stage: impl Into<String>, failure: impl Into<StageFailure>) -> Self {
        Self {
            stage: stage.into(),
            failure: failure.into(),
        }
    }

    /// Creates a stage execution error from a plain message.
    #[must_use]
    pub fn message(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            failure: StageFailure::Other(message.into()),
        }
    }
}

impl From<String> for StageFailure {
    fn from(message: String) -> Self {
        Self::Other(message)
    }
}

/// Error raised when pipeline validation fails at build time.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
        }
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }
}

/// Error raised when a cycle is detected in the pipeline graph.
///
/// This is a build-time error: it is raised before any stage executes.
#[derive(Debug, Clone, Error)]
#[error("Cycle detected in pipeline: {}", cycle_path.join(" -> "))]
pub struct CycleDetectedError {
    /// The path of stages forming the cycle.
    pub cycle_path: Vec<String>,
}

impl CycleDetectedError {
    /// Creates a new cycle detected error.
    #[must_use]
    pub fn new(cycle_path: Vec<String>) -> Self {
        Self { cycle_path }
    }
}

/// Error raised when a pipeline run is aborted by a stage failure.
///
/// Wraps the first failure with enough context to retry the whole run from
/// scratch: which stage failed, and which stage results already existed.
/// Partial resume is not supported.
#[derive(Debug, Clone, Error)]
#[error("Pipeline '{pipeline}' aborted: {cause} (completed stages: [{}])", completed.join(", "))]
pub struct PipelineExecutionError {
    /// The pipeline name.
    pub pipeline: String,
    /// The first stage failure.
    pub cause: StageExecutionError,
    /// Names of stages that had completed before the run was abandoned.
    pub completed: Vec<String>,
}

impl PipelineExecutionError {
    /// Creates a new pipeline execution error.
    #[must_use]
    pub fn new(
        pipeline: impl Into<String>,
        cause: StageExecutionError,
        completed: Vec<String>,
    ) -> Self {
        Self {
            pipeline: pipeline.into(),
            cause,
            completed,
        }
    }

    /// Returns the identifier of the stage that caused the abort.
    #[must_use]
    pub fn failed_stage(&self) -> &str {
        &self.cause.stage
    }
}
