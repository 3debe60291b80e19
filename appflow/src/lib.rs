//! # Appflow
//!
//! A pipeline engine for model-driven application generation.
//!
//! Appflow turns a user prompt (optionally grounded in uploaded requirement
//! documents) into generated application code by running a validated graph
//! of prompt-templated stages:
//!
//! - **Document ingestion**: recursive chunking of text and PDF uploads into
//!   tagged, searchable corpora
//! - **Retrieval**: stages declare which corpus they may consult; hits are
//!   appended to their prompts as reference context
//! - **Stage graphs**: dependency-validated DAGs executed with ready-set
//!   scheduling, so independent stages run concurrently
//! - **Typed gating**: conditional stages classify upstream output into a
//!   structured data-need decision instead of sniffing free text
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use appflow::prelude::*;
//! use std::sync::Arc;
//!
//! let engine = Engine::new(model, Arc::new(MemoryIndex::new()), EngineConfig::default());
//! let request = GenerationRequest::new("a quarterly revenue dashboard");
//! let result = engine.generate(&request).await?;
//! println!("{}", result.final_code().unwrap_or_default());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod retrieval;
pub mod stage;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::document::{DocumentIngestor, DocumentPayload, TextSplitter};
    pub use crate::engine::{Engine, GenerationRequest};
    pub use crate::errors::{
        AppflowError, CycleDetectedError, DocumentParseError, LlmError,
        PipelineExecutionError, PipelineValidationError, RetrievalError,
        StageExecutionError, StageFailure,
    };
    pub use crate::llm::LanguageModel;
    pub use crate::pipeline::{presets, PipelineBuilder, PipelineResult, StageGraph};
    pub use crate::retrieval::{
        format_context, DocType, MemoryIndex, RetrievalChunk, RetrievalQuery,
        SearchBackend,
    };
    pub use crate::stage::{
        DataNeed, GateSpec, RetrievalSpec, RunParams, StageExecutor, StageResult,
        StageSpec, StageStatus, StageValidator,
    };
}
