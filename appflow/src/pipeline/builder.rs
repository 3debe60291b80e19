//! Pipeline builder with build-time validation.

use super::StageGraph;
use crate::errors::{AppflowError, CycleDetectedError, PipelineValidationError};
use crate::stage::{placeholders, StageSpec};
use std::collections::{HashMap, HashSet};

/// Run-level parameter names every template may reference.
const RUN_PARAM_NAMES: [&str; 2] = ["prompt", "docs_uploaded"];

/// Collects stage specifications and validates them into a [`StageGraph`].
///
/// All validation happens in [`build`](Self::build), before any stage
/// executes: duplicate names, self-dependencies, unknown dependencies,
/// template placeholders that reference undeclared upstreams, gates on
/// non-dependencies, and dependency cycles are all rejected there.
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<StageSpec>,
}

impl PipelineBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Creates a builder pre-populated with a stage list.
    #[must_use]
    pub fn from_specs(name: impl Into<String>, specs: Vec<StageSpec>) -> Self {
        Self {
            name: name.into(),
            stages: specs,
        }
    }

    /// Adds a stage.
    #[must_use]
    pub fn stage(mut self, spec: StageSpec) -> Self {
        self.stages.push(spec);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages added so far.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Validates the stage set and builds the executable graph.
    pub fn build(self) -> Result<StageGraph, AppflowError> {
        if self.stages.is_empty() {
            return Err(PipelineValidationError::new("pipeline has no stages").into());
        }

        let mut seen = HashSet::new();
        for spec in &self.stages {
            if !seen.insert(spec.name.clone()) {
                return Err(PipelineValidationError::new(format!(
                    "duplicate stage name '{}'",
                    spec.name
                ))
                .with_stages(vec![spec.name.clone()])
                .into());
            }
        }

        let names: HashSet<&str> = self.stages.iter().map(|s| s.name.as_str()).collect();
        for spec in &self.stages {
            self.validate_stage(spec, &names)?;
        }

        if let Some(cycle) = self.find_cycle() {
            return Err(CycleDetectedError::new(cycle).into());
        }

        let order: Vec<String> = self.stages.iter().map(|s| s.name.clone()).collect();
        let stages: HashMap<String, StageSpec> = self
            .stages
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect();

        Ok(StageGraph::new(self.name, stages, order))
    }

    fn validate_stage(
        &self,
        spec: &StageSpec,
        names: &HashSet<&str>,
    ) -> Result<(), PipelineValidationError> {
        if spec.dependencies.iter().any(|d| d == &spec.name) {
            return Err(PipelineValidationError::new(format!(
                "stage '{}' cannot depend on itself",
                spec.name
            ))
            .with_stages(vec![spec.name.clone()]));
        }

        for dep in &spec.dependencies {
            if !names.contains(dep.as_str()) {
                return Err(PipelineValidationError::new(format!(
                    "stage '{}' depends on unknown stage '{dep}'",
                    spec.name
                ))
                .with_stages(vec![spec.name.clone(), dep.clone()]));
            }
        }

        let allowed: HashSet<&str> = spec
            .dependencies
            .iter()
            .map(String::as_str)
            .chain(RUN_PARAM_NAMES)
            .collect();
        for placeholder in placeholders(&spec.template) {
            if !allowed.contains(placeholder.as_str()) {
                return Err(PipelineValidationError::new(format!(
                    "stage '{}' template references '{placeholder}', which is neither a \
                     declared dependency nor a run parameter",
                    spec.name
                ))
                .with_stages(vec![spec.name.clone()]));
            }
        }

        if let Some(gate) = &spec.gate {
            if !spec.dependencies.contains(&gate.upstream) {
                return Err(PipelineValidationError::new(format!(
                    "stage '{}' gates on '{}', which is not a declared dependency",
                    spec.name, gate.upstream
                ))
                .with_stages(vec![spec.name.clone(), gate.upstream.clone()]));
            }
        }

        Ok(())
    }

    /// Depth-first cycle search; returns the cycle path if one exists.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let by_name: HashMap<&str, &StageSpec> =
            self.stages.iter().map(|s| (s.name.as_str(), s)).collect();
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for spec in &self.stages {
            if !visited.contains(spec.name.as_str()) {
                if let Some(cycle) = dfs_cycle(
                    spec.name.as_str(),
                    &by_name,
                    &mut visited,
                    &mut rec_stack,
                    &mut path,
                ) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

fn dfs_cycle<'a>(
    node: &'a str,
    stages: &HashMap<&'a str, &'a StageSpec>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(spec) = stages.get(node) {
        for dep in &spec.dependencies {
            let dep = dep.as_str();
            if !visited.contains(dep) {
                if let Some(cycle) = dfs_cycle(
                    stages.get(dep).map_or(dep, |s| s.name.as_str()),
                    stages,
                    visited,
                    rec_stack,
                    path,
                ) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(dep) {
                let start = path.iter().position(|n| *n == dep).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|s| (*s).to_string()).collect();
                cycle.push(dep.to_string());
                return Some(cycle);
            }
        }
    }

    path.pop();
    rec_stack.remove(node);
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> StageSpec {
        StageSpec::new(name, "do something with {prompt}")
    }

    #[test]
    fn test_build_simple_chain() {
        let graph = PipelineBuilder::new("test")
            .stage(spec("a"))
            .stage(spec("b").with_dependency("a"))
            .build()
            .unwrap();

        assert_eq!(graph.name(), "test");
        assert_eq!(graph.stage_count(), 2);
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        let err = PipelineBuilder::new("empty").build().unwrap_err();
        assert!(matches!(err, AppflowError::Validation(_)));
    }

    #[test]
    fn test_duplicate_stage_name_rejected() {
        let err = PipelineBuilder::new("dup")
            .stage(spec("a"))
            .stage(spec("a"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let err = PipelineBuilder::new("test")
            .stage(spec("a").with_dependency("ghost"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("unknown stage 'ghost'"));
    }

    #[test]
    fn test_self_dependency_rejected() {
        let err = PipelineBuilder::new("test")
            .stage(spec("a").with_dependency("a"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("depend on itself"));
    }

    #[test]
    fn test_cycle_rejected_at_build_time() {
        let err = PipelineBuilder::new("cyclic")
            .stage(spec("a").with_dependency("b"))
            .stage(spec("b").with_dependency("a"))
            .build()
            .unwrap_err();

        let AppflowError::CycleDetected(cycle) = err else {
            panic!("expected cycle error, got {err}");
        };
        assert!(cycle.cycle_path.len() >= 3);
    }

    #[test]
    fn test_undeclared_template_reference_rejected() {
        let err = PipelineBuilder::new("test")
            .stage(spec("a"))
            .stage(StageSpec::new("b", "use {a} and {mystery}").with_dependency("a"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn test_run_params_always_allowed_in_templates() {
        let graph = PipelineBuilder::new("test")
            .stage(StageSpec::new("a", "{prompt} uploaded={docs_uploaded}"))
            .build()
            .unwrap();
        assert_eq!(graph.stage_count(), 1);
    }

    #[test]
    fn test_gate_on_non_dependency_rejected() {
        let err = PipelineBuilder::new("test")
            .stage(spec("a"))
            .stage(
                StageSpec::new("b", "{a}")
                    .with_dependency("a")
                    .with_gate(crate::stage::GateSpec::new("c")),
            )
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("gates on"));
    }
}
