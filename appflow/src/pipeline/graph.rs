//! DAG execution engine with ready-set scheduling.
//!
//! A stage is launched the moment every one of its dependencies has a
//! result, so independent stages run concurrently. Results are written at
//! most once; a stage is never re-run within an execution.

use super::PipelineResult;
use crate::errors::{AppflowError, PipelineExecutionError, StageExecutionError};
use crate::stage::{RunParams, StageExecutor, StageResult, StageSpec};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A validated, immutable directed acyclic graph of stages.
///
/// Built by [`PipelineBuilder`](super::PipelineBuilder); acyclicity and
/// dependency existence are already guaranteed here.
#[derive(Debug)]
pub struct StageGraph {
    name: String,
    stages: HashMap<String, Arc<StageSpec>>,
    /// Insertion order; used to make scheduling deterministic.
    order: Vec<String>,
}

impl StageGraph {
    pub(crate) fn new(name: String, stages: HashMap<String, StageSpec>, order: Vec<String>) -> Self {
        Self {
            name,
            stages: stages.into_iter().map(|(k, v)| (k, Arc::new(v))).collect(),
            order,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns the stage names in insertion order.
    #[must_use]
    pub fn stage_names(&self) -> &[String] {
        &self.order
    }

    /// Executes the graph to completion.
    ///
    /// Every stage runs after all of its dependencies and never more than
    /// once. Stages in the same ready set run concurrently. On the first
    /// stage failure nothing new is scheduled, already-started stages are
    /// awaited, and the whole run fails with a [`PipelineExecutionError`];
    /// there is no partial result and no resume.
    pub async fn execute(
        &self,
        executor: &StageExecutor,
        params: &RunParams,
    ) -> Result<PipelineResult, AppflowError> {
        let run_id = Uuid::new_v4();
        let start = Instant::now();
        info!(pipeline = %self.name, %run_id, stages = self.stages.len(), "pipeline run started");

        let params = Arc::new(params.clone());
        let mut results: HashMap<String, StageResult> = HashMap::new();
        let mut remaining: HashMap<String, usize> = self
            .stages
            .iter()
            .map(|(name, spec)| (name.clone(), spec.dependencies.len()))
            .collect();

        let mut active: FuturesUnordered<BoxFuture<'_, (String, Result<StageResult, StageExecutionError>)>> =
            FuturesUnordered::new();

        for name in &self.order {
            if remaining[name] == 0 {
                active.push(self.launch(name, executor, &params, &results));
            }
        }

        while results.len() < self.stages.len() {
            let Some((stage_name, outcome)) = active.next().await else {
                // Unreachable for a validated graph; fail loudly instead of
                // spinning if an invariant is ever broken.
                return Err(PipelineExecutionError::new(
                    &self.name,
                    StageExecutionError::message(&self.name, "stage graph stalled"),
                    results.keys().cloned().collect(),
                )
                .into());
            };

            match outcome {
                Ok(result) => {
                    debug!(pipeline = %self.name, stage = %stage_name, status = ?result.status, "stage finished");
                    results.insert(stage_name.clone(), result);

                    for child in &self.order {
                        let spec = &self.stages[child];
                        if !spec.dependencies.contains(&stage_name) {
                            continue;
                        }
                        if let Some(count) = remaining.get_mut(child) {
                            *count = count.saturating_sub(1);
                            if *count == 0 && !results.contains_key(child) {
                                active.push(self.launch(child, executor, &params, &results));
                            }
                        }
                    }
                }
                Err(cause) => {
                    warn!(pipeline = %self.name, stage = %stage_name, error = %cause, "stage failed; abandoning run");
                    // Let in-flight stages finish or fail on their own; no
                    // new work is scheduled either way.
                    while let Some((name, outcome)) = active.next().await {
                        if let Ok(result) = outcome {
                            results.insert(name, result);
                        }
                    }
                    return Err(PipelineExecutionError::new(
                        &self.name,
                        cause,
                        results.keys().cloned().collect(),
                    )
                    .into());
                }
            }
        }

        info!(
            pipeline = %self.name,
            %run_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pipeline run completed"
        );
        Ok(PipelineResult::new(run_id, self.name.clone(), results))
    }

    /// Spawns one stage onto the runtime with a snapshot of the results its
    /// dependencies produced.
    fn launch(
        &self,
        name: &str,
        executor: &StageExecutor,
        params: &Arc<RunParams>,
        results: &HashMap<String, StageResult>,
    ) -> BoxFuture<'static, (String, Result<StageResult, StageExecutionError>)> {
        let spec = Arc::clone(&self.stages[name]);
        let name = name.to_string();
        let executor = executor.clone();
        let params = Arc::clone(params);
        // Dependencies are complete by construction, so a clone of the
        // current results is a stable snapshot for this stage.
        let upstream: HashMap<String, StageResult> = spec
            .dependencies
            .iter()
            .filter_map(|dep| results.get(dep).map(|r| (dep.clone(), r.clone())))
            .collect();

        debug!(stage = %name, "stage started");
        let handle = tokio::spawn(async move {
            executor.execute(&spec, &params, &upstream).await
        });

        Box::pin(async move {
            match handle.await {
                Ok(outcome) => (name, outcome),
                Err(e) => {
                    let err = StageExecutionError::message(&name, format!("stage task aborted: {e}"));
                    (name, Err(err))
                }
            }
        })
    }
}
