//! The immutable result bundle returned by a successful run.

use super::presets;
use crate::stage::StageResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The aggregate of all stage outputs for one pipeline run.
///
/// Created once, whole, at the end of a successful run: every declared
/// stage's output is present, keyed by stage name. There is no mutation
/// after creation and no way to observe a partially complete bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    run_id: Uuid,
    pipeline: String,
    created_at: DateTime<Utc>,
    results: HashMap<String, StageResult>,
}

impl PipelineResult {
    /// Assembles the bundle. Called by the orchestrator only after every
    /// stage has produced a result.
    #[must_use]
    pub(crate) fn new(
        run_id: Uuid,
        pipeline: impl Into<String>,
        results: HashMap<String, StageResult>,
    ) -> Self {
        Self {
            run_id,
            pipeline: pipeline.into(),
            created_at: Utc::now(),
            results,
        }
    }

    /// Returns the run identifier.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    /// Returns when the bundle was assembled.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the result for a stage.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&StageResult> {
        self.results.get(stage)
    }

    /// Returns the output text for a stage.
    #[must_use]
    pub fn text(&self, stage: &str) -> Option<&str> {
        self.results.get(stage).map(|r| r.text.as_str())
    }

    /// Returns the number of stage results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if the bundle holds no results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterates over stage names.
    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    /// The requirements analysis, if the canonical stage ran.
    #[must_use]
    pub fn requirements(&self) -> Option<&str> {
        self.text(presets::REQUIREMENTS)
    }

    /// The data mapping analysis, if the canonical stage ran.
    #[must_use]
    pub fn data_analysis(&self) -> Option<&str> {
        self.text(presets::DATA_MAPPING)
    }

    /// The reference pattern research, if the canonical stage ran.
    #[must_use]
    pub fn reference_patterns(&self) -> Option<&str> {
        self.text(presets::PATTERN_RESEARCH)
    }

    /// The final generated application code, if the canonical stage ran.
    #[must_use]
    pub fn final_code(&self) -> Option<&str> {
        self.text(presets::CODE_GENERATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::StageResult;

    #[test]
    fn test_named_accessors() {
        let results = HashMap::from([
            (
                presets::REQUIREMENTS.to_string(),
                StageResult::completed("req text"),
            ),
            (
                presets::CODE_GENERATION.to_string(),
                StageResult::completed("fn main() {}"),
            ),
        ]);
        let bundle = PipelineResult::new(Uuid::new_v4(), "test", results);

        assert_eq!(bundle.requirements(), Some("req text"));
        assert_eq!(bundle.final_code(), Some("fn main() {}"));
        assert_eq!(bundle.data_analysis(), None);
        assert_eq!(bundle.len(), 2);
    }

    #[test]
    fn test_serialization_round_trip() {
        let results = HashMap::from([(
            "stage".to_string(),
            StageResult::completed("output"),
        )]);
        let bundle = PipelineResult::new(Uuid::new_v4(), "p", results);

        let json = serde_json::to_string(&bundle).unwrap();
        let back: PipelineResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pipeline(), "p");
        assert_eq!(back.text("stage"), Some("output"));
    }
}
