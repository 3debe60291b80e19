//! The top-level engine tying ingestion, retrieval, and pipelines together.

use crate::config::EngineConfig;
use crate::document::{DocumentIngestor, DocumentPayload, TextSplitter};
use crate::errors::AppflowError;
use crate::llm::LanguageModel;
use crate::pipeline::{presets, PipelineBuilder, PipelineResult};
use crate::retrieval::{DocType, SearchBackend};
use crate::stage::{RunParams, StageExecutor, StageSpec};
use std::sync::Arc;
use tracing::info;

/// One generation request: a prompt and an optional requirements document.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The user's description of the application to build.
    pub prompt: String,
    /// Optional requirements document to ground the run in.
    pub document: Option<DocumentPayload>,
}

impl GenerationRequest {
    /// Creates a request from a prompt alone.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            document: None,
        }
    }

    /// Attaches a requirements document.
    #[must_use]
    pub fn with_document(mut self, document: DocumentPayload) -> Self {
        self.document = Some(document);
        self
    }
}

/// The application-generation engine.
///
/// Holds the injected model client and search backend; all pipeline shapes
/// run through the same executor. Construct one per model/backend pair and
/// share it freely.
#[derive(Debug, Clone)]
pub struct Engine {
    llm: Arc<dyn LanguageModel>,
    backend: Arc<dyn SearchBackend>,
    config: EngineConfig,
}

impl Engine {
    /// Creates an engine over a model client and search backend.
    #[must_use]
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        backend: Arc<dyn SearchBackend>,
        config: EngineConfig,
    ) -> Self {
        Self {
            llm,
            backend,
            config,
        }
    }

    /// Returns an ingestor writing to this engine's backend, configured with
    /// the engine's chunking parameters.
    #[must_use]
    pub fn ingestor(&self) -> DocumentIngestor {
        DocumentIngestor::new(
            Arc::clone(&self.backend),
            TextSplitter::new(self.config.chunk_size, self.config.chunk_overlap),
        )
    }

    /// Runs an arbitrary stage list as a pipeline.
    ///
    /// If the request carries a document it is ingested under the
    /// requirements tag first, so retrieval-capable stages see it.
    pub async fn run(
        &self,
        pipeline_name: &str,
        stages: Vec<StageSpec>,
        request: &GenerationRequest,
    ) -> Result<PipelineResult, AppflowError> {
        if let Some(document) = &request.document {
            let stored = self.ingestor().ingest(document, DocType::Requirements).await?;
            info!(chunks = stored, "requirements document ingested for run");
        }

        let graph = PipelineBuilder::from_specs(pipeline_name, stages).build()?;
        let executor = StageExecutor::new(
            Arc::clone(&self.llm),
            Arc::clone(&self.backend),
            self.config.clone(),
        );
        let params = RunParams::new(request.prompt.clone(), request.document.is_some());

        graph.execute(&executor, &params).await
    }

    /// Runs the linear chain preset.
    pub async fn generate_standard(
        &self,
        request: &GenerationRequest,
    ) -> Result<PipelineResult, AppflowError> {
        self.run("standard", presets::standard_pipeline(), request).await
    }

    /// Runs the concurrent diamond preset. This is the default entry point.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<PipelineResult, AppflowError> {
        self.run("enhanced", presets::enhanced_pipeline(), request).await
    }
}
