//! Declarative stage specifications and their execution.
//!
//! A stage pairs a description template with an expected-output note, an
//! optional retrieval capability, and the upstream stages it depends on.
//! Executing one means: render the template, optionally pull reference
//! context from the search backend, call the language model, and return the
//! text. Specs are immutable once the graph is built.

mod executor;
mod template;

pub use executor::StageExecutor;
pub use template::{placeholders, render};

use crate::retrieval::DocType;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Run-level parameters available to every stage template.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// The user's original prompt.
    pub prompt: String,
    /// Whether a requirements document was supplied for this run.
    pub docs_uploaded: bool,
}

impl RunParams {
    /// Creates run parameters.
    #[must_use]
    pub fn new(prompt: impl Into<String>, docs_uploaded: bool) -> Self {
        Self {
            prompt: prompt.into(),
            docs_uploaded,
        }
    }
}

/// Retrieval capability declared by a stage.
#[derive(Debug, Clone)]
pub struct RetrievalSpec {
    /// Corpus tag the stage may search.
    pub doc_type: DocType,
    /// Optional technology-stack tag narrowing results.
    pub tech_stack: Option<String>,
    /// Template for the search query; defaults to the run prompt.
    pub query_template: Option<String>,
}

impl RetrievalSpec {
    /// Creates a retrieval capability for a corpus tag.
    #[must_use]
    pub fn new(doc_type: DocType) -> Self {
        Self {
            doc_type,
            tech_stack: None,
            query_template: None,
        }
    }

    /// Narrows retrieval to sources matching a technology-stack tag.
    #[must_use]
    pub fn with_tech_stack(mut self, tech_stack: impl Into<String>) -> Self {
        self.tech_stack = Some(tech_stack.into());
        self
    }

    /// Sets the query template.
    #[must_use]
    pub fn with_query_template(mut self, template: impl Into<String>) -> Self {
        self.query_template = Some(template.into());
        self
    }
}

/// A typed data-access decision produced by a gated stage.
///
/// Replaces free-text sniffing ("response contains 'No data required'") with
/// a structured follow-up classification the stage must explicitly return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataNeed {
    /// The application needs no external data access.
    None,
    /// The application needs external data; carries the mapping summary.
    Mapping(String),
}

/// Gate declared by a stage: a data-need classification run against a named
/// upstream result before the stage's own model call.
#[derive(Debug, Clone)]
pub struct GateSpec {
    /// The upstream stage whose output is classified. Must be one of the
    /// stage's declared dependencies.
    pub upstream: String,
}

impl GateSpec {
    /// Creates a gate on an upstream stage.
    #[must_use]
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into(),
        }
    }
}

/// Optional post-stage output hook.
///
/// The engine never installs a validator by default: expected-output notes
/// are documentation for the model, not an enforced schema. Implementers who
/// want that discipline can add it here.
pub trait StageValidator: Send + Sync + Debug {
    /// Accepts or rejects a stage's raw output. A rejection message becomes
    /// a stage execution failure.
    fn validate(&self, stage: &str, output: &str) -> Result<(), String>;
}

/// Specification for a single stage. Immutable once the graph is built.
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// Unique stage identifier.
    pub name: String,
    /// Description template; may reference `{prompt}`, `{docs_uploaded}`,
    /// and `{<upstream id>}` placeholders.
    pub template: String,
    /// Free-text description of the expected output. Informational only:
    /// appended to the prompt, never machine-validated.
    pub expected_output: Option<String>,
    /// Upstream stage identifiers this stage depends on.
    pub dependencies: Vec<String>,
    /// Retrieval capability, if the stage may consult the search backend.
    pub retrieval: Option<RetrievalSpec>,
    /// Data-need gate, if the stage is conditional on an upstream decision.
    pub gate: Option<GateSpec>,
    /// Optional output validator hook.
    pub validator: Option<Arc<dyn StageValidator>>,
    /// Per-stage temperature override.
    pub temperature: Option<f32>,
}

impl StageSpec {
    /// Creates a stage with a name and description template.
    #[must_use]
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            expected_output: None,
            dependencies: Vec::new(),
            retrieval: None,
            gate: None,
            validator: None,
            temperature: None,
        }
    }

    /// Sets the expected-output note.
    #[must_use]
    pub fn with_expected_output(mut self, expected: impl Into<String>) -> Self {
        self.expected_output = Some(expected.into());
        self
    }

    /// Adds an upstream dependency.
    #[must_use]
    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        let dep = dep.into();
        if !self.dependencies.contains(&dep) {
            self.dependencies.push(dep);
        }
        self
    }

    /// Sets all upstream dependencies.
    #[must_use]
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependencies = Vec::new();
        for dep in deps {
            self = self.with_dependency(dep);
        }
        self
    }

    /// Declares a retrieval capability.
    #[must_use]
    pub fn with_retrieval(mut self, retrieval: RetrievalSpec) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    /// Declares a data-need gate.
    #[must_use]
    pub fn with_gate(mut self, gate: GateSpec) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Installs an output validator.
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn StageValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Overrides the sampling temperature for this stage.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// How a stage concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    /// The stage ran its model call and produced output.
    Completed,
    /// The stage was short-circuited by its gate; no model call was made.
    Skipped,
}

/// The output of one executed stage. Written at most once; stages never
/// re-run within a pipeline execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// Raw text output.
    pub text: String,
    /// How the stage concluded.
    pub status: StageStatus,
    /// Typed data-access decision, present only for gated stages.
    pub data_need: Option<DataNeed>,
}

impl StageResult {
    /// Creates a completed result.
    #[must_use]
    pub fn completed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: StageStatus::Completed,
            data_need: None,
        }
    }

    /// Creates a skipped result.
    #[must_use]
    pub fn skipped(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: StageStatus::Skipped,
            data_need: None,
        }
    }

    /// Attaches the data-need decision.
    #[must_use]
    pub fn with_data_need(mut self, need: DataNeed) -> Self {
        self.data_need = Some(need);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_spec_builder() {
        let spec = StageSpec::new("data_mapping", "Map data for: {requirements}")
            .with_expected_output("A table mapping")
            .with_dependency("requirements")
            .with_retrieval(RetrievalSpec::new(DocType::TechnicalDocs).with_tech_stack("frames"))
            .with_gate(GateSpec::new("requirements"))
            .with_temperature(0.1);

        assert_eq!(spec.name, "data_mapping");
        assert_eq!(spec.dependencies, vec!["requirements".to_string()]);
        assert!(spec.retrieval.is_some());
        assert!(spec.gate.is_some());
        assert_eq!(spec.temperature, Some(0.1));
    }

    #[test]
    fn test_dependencies_deduplicated() {
        let spec = StageSpec::new("s", "{a}")
            .with_dependency("a")
            .with_dependency("a");
        assert_eq!(spec.dependencies.len(), 1);
    }

    #[test]
    fn test_stage_result_constructors() {
        let done = StageResult::completed("output");
        assert_eq!(done.status, StageStatus::Completed);
        assert!(done.data_need.is_none());

        let skipped = StageResult::skipped("no data required").with_data_need(DataNeed::None);
        assert_eq!(skipped.status, StageStatus::Skipped);
        assert_eq!(skipped.data_need, Some(DataNeed::None));
    }
}
