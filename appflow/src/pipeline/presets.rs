//! Canonical stage lists for the two observed pipeline shapes.
//!
//! The graph shape is data, not control flow: one orchestrator runs both the
//! linear chain and the diamond variant, configured entirely by the stage
//! list handed to it.

use crate::retrieval::DocType;
use crate::stage::{GateSpec, RetrievalSpec, StageSpec};

/// Canonical requirements-extraction stage name.
pub const REQUIREMENTS: &str = "requirements";
/// Canonical data-source-mapping stage name.
pub const DATA_MAPPING: &str = "data_mapping";
/// Canonical pattern-research stage name.
pub const PATTERN_RESEARCH: &str = "pattern_research";
/// Canonical code-generation stage name.
pub const CODE_GENERATION: &str = "code_generation";

const REQUIREMENTS_TEMPLATE: &str = "\
Extract and analyze the technical requirements for a data application.

User request: {prompt}
Documents uploaded: {docs_uploaded}

If documents were uploaded, ground the analysis in the retrieved requirement
excerpts below. Focus only on implementable components: the data needed, the
processing and analysis steps, and the user interface elements required.";

const DATA_MAPPING_TEMPLATE: &str = "\
Evaluate and map the external data the application needs, based on these
requirements:

{requirements}

Identify the exact tables, fields, and access queries required, with
integration examples.";

const PATTERN_RESEARCH_LINEAR_TEMPLATE: &str = "\
Research proven integration and visualization patterns for the application,
grounded in the reference corpus, covering this data access plan:

{data_mapping}";

const PATTERN_RESEARCH_DIAMOND_TEMPLATE: &str = "\
Research proven integration and visualization patterns for the application,
grounded in the reference corpus, covering these requirements:

{requirements}";

const CODE_GENERATION_TEMPLATE: &str = "\
Generate a complete, runnable, single-page data application.

Requirements: {requirements}
Data access: {data_mapping}
Reference patterns: {pattern_research}

Handle data defensively: normalize case before comparisons, convert
datetimes to strings for display, and fill missing values before
aggregation. Output only code, no explanations. Assume credentials are
provided via the environment.";

fn requirements_stage() -> StageSpec {
    StageSpec::new(REQUIREMENTS, REQUIREMENTS_TEMPLATE)
        .with_expected_output(
            "Core technical requirements, the data needed, and implementation constraints.",
        )
        .with_retrieval(RetrievalSpec::new(DocType::Requirements))
}

fn data_mapping_stage() -> StageSpec {
    StageSpec::new(DATA_MAPPING, DATA_MAPPING_TEMPLATE)
        .with_expected_output(
            "A detailed data mapping with exact table and column names and access queries, \
             or a statement that no external data is required.",
        )
        .with_dependency(REQUIREMENTS)
        .with_gate(GateSpec::new(REQUIREMENTS))
}

fn code_generation_stage() -> StageSpec {
    StageSpec::new(CODE_GENERATION, CODE_GENERATION_TEMPLATE)
        .with_expected_output("Complete, runnable, production-ready application code.")
        .with_dependencies([REQUIREMENTS, DATA_MAPPING, PATTERN_RESEARCH])
}

/// The linear chain: requirements, data mapping, pattern research, and code
/// generation in strict sequence.
#[must_use]
pub fn standard_pipeline() -> Vec<StageSpec> {
    vec![
        requirements_stage(),
        data_mapping_stage(),
        StageSpec::new(PATTERN_RESEARCH, PATTERN_RESEARCH_LINEAR_TEMPLATE)
            .with_expected_output(
                "Integration patterns, example code, and best practices drawn from \
                 reference applications.",
            )
            .with_dependency(DATA_MAPPING)
            .with_retrieval(RetrievalSpec::new(DocType::ReferenceApps)),
        code_generation_stage(),
    ]
}

/// The diamond: data mapping and pattern research fan out from requirements
/// and run concurrently; code generation joins all three.
#[must_use]
pub fn enhanced_pipeline() -> Vec<StageSpec> {
    vec![
        requirements_stage(),
        data_mapping_stage(),
        StageSpec::new(PATTERN_RESEARCH, PATTERN_RESEARCH_DIAMOND_TEMPLATE)
            .with_expected_output(
                "Integration patterns, example code, and best practices drawn from \
                 reference applications.",
            )
            .with_dependency(REQUIREMENTS)
            .with_retrieval(RetrievalSpec::new(DocType::ReferenceApps)),
        code_generation_stage(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineBuilder;

    #[test]
    fn test_standard_pipeline_is_a_chain() {
        let stages = standard_pipeline();
        assert_eq!(stages.len(), 4);

        let research = stages.iter().find(|s| s.name == PATTERN_RESEARCH).unwrap();
        assert_eq!(research.dependencies, vec![DATA_MAPPING.to_string()]);
    }

    #[test]
    fn test_enhanced_pipeline_is_a_diamond() {
        let stages = enhanced_pipeline();

        let mapping = stages.iter().find(|s| s.name == DATA_MAPPING).unwrap();
        let research = stages.iter().find(|s| s.name == PATTERN_RESEARCH).unwrap();
        assert_eq!(mapping.dependencies, vec![REQUIREMENTS.to_string()]);
        assert_eq!(research.dependencies, vec![REQUIREMENTS.to_string()]);

        let codegen = stages.iter().find(|s| s.name == CODE_GENERATION).unwrap();
        assert_eq!(codegen.dependencies.len(), 3);
    }

    #[test]
    fn test_presets_build_cleanly() {
        PipelineBuilder::from_specs("standard", standard_pipeline())
            .build()
            .unwrap();
        PipelineBuilder::from_specs("enhanced", enhanced_pipeline())
            .build()
            .unwrap();
    }
}
