//! Prompt-templated stage execution.

use super::{render, DataNeed, RunParams, StageResult, StageSpec};
use crate::config::EngineConfig;
use crate::errors::{LlmError, StageExecutionError, StageFailure};
use crate::llm::LanguageModel;
use crate::retrieval::{format_context, RetrievalQuery, SearchBackend};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Marker text recorded for a stage its gate decided to skip.
const NO_DATA_REQUIRED: &str = "No external data access required.";

/// Structured follow-up prompt for the data-need gate. The reply contract is
/// strict: one line, `NONE` or `MAPPING: <summary>`.
const DATA_NEED_PROMPT: &str = "\
Decide whether the application described below requires access to external data sources.

Reply with exactly one line:
- NONE if no external data access is required
- MAPPING: <short summary of the tables, fields, and queries needed> otherwise

Description:
{upstream}";

/// Executes stages against an injected model client and search backend.
///
/// Both handles are shared across concurrently executing stages; the
/// executor itself holds no mutable state.
#[derive(Debug, Clone)]
pub struct StageExecutor {
    llm: Arc<dyn LanguageModel>,
    backend: Arc<dyn SearchBackend>,
    config: EngineConfig,
}

impl StageExecutor {
    /// Creates an executor.
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

    /// Executes one stage: render the template, optionally gate, optionally
    /// retrieve context, call the model once, and run the validator hook.
    ///
    /// Every local failure leaves this method as a [`StageExecutionError`]
    /// tagged with the stage identifier.
    pub async fn execute(
        &self,
        spec: &StageSpec,
        params: &RunParams,
        upstream: &HashMap<String, StageResult>,
    ) -> Result<StageResult, StageExecutionError> {
        let temperature = spec.temperature.unwrap_or(self.config.temperature);
        let values = template_values(params, upstream);

        let mut data_need = None;
        if let Some(gate) = &spec.gate {
            let need = self.classify_data_need(spec, gate.upstream.as_str(), upstream).await?;
            if need == DataNeed::None {
                info!(stage = %spec.name, "gate decided no data access; skipping stage");
                return Ok(StageResult::skipped(NO_DATA_REQUIRED).with_data_need(DataNeed::None));
            }
            data_need = Some(need);
        }

        let mut prompt = render(&spec.template, &values);

        if let Some(retrieval) = &spec.retrieval {
            let query_text = retrieval
                .query_template
                .as_ref()
                .map_or_else(|| params.prompt.clone(), |t| render(t, &values));
            let mut query = RetrievalQuery::new(query_text, retrieval.doc_type);
            if let Some(tech_stack) = &retrieval.tech_stack {
                query = query.with_tech_stack(tech_stack.clone());
            }

            let chunks = self
                .backend
                .search(&query, self.config.search_limit)
                .await
                .map_err(|e| StageExecutionError::new(&spec.name, e))?;
            debug!(stage = %spec.name, hits = chunks.len(), doc_type = %retrieval.doc_type, "retrieval done");

            // Most runs have no uploaded documents; no context is the
            // common case, not an error.
            if !chunks.is_empty() {
                prompt.push_str("\n\nReference context:\n");
                prompt.push_str(&format_context(&chunks));
            }
        }

        if let Some(expected) = &spec.expected_output {
            prompt.push_str("\n\nExpected output:\n");
            prompt.push_str(expected);
        }

        let response = self
            .llm
            .complete(&prompt, temperature)
            .await
            .map_err(|e| StageExecutionError::new(&spec.name, e))?;

        if let Some(validator) = &spec.validator {
            validator
                .validate(&spec.name, &response)
                .map_err(|reason| {
                    StageExecutionError::new(&spec.name, StageFailure::Rejected(reason))
                })?;
        }

        let mut result = StageResult::completed(response);
        if let Some(need) = data_need {
            result = result.with_data_need(need);
        }
        Ok(result)
    }

    /// Runs the structured data-need classification against an upstream
    /// result.
    async fn classify_data_need(
        &self,
        spec: &StageSpec,
        gate_upstream: &str,
        upstream: &HashMap<String, StageResult>,
    ) -> Result<DataNeed, StageExecutionError> {
        let source = upstream.get(gate_upstream).ok_or_else(|| {
            StageExecutionError::message(
                &spec.name,
                format!("gate upstream '{gate_upstream}' has no result"),
            )
        })?;

        let values = HashMap::from([("upstream".to_string(), source.text.clone())]);
        let prompt = render(DATA_NEED_PROMPT, &values);

        let response = self
            .llm
            .complete(&prompt, 0.0)
            .await
            .map_err(|e| StageExecutionError::new(&spec.name, e))?;

        parse_data_need(&response)
            .map_err(|msg| StageExecutionError::new(&spec.name, LlmError::malformed(msg)))
    }
}

fn template_values(
    params: &RunParams,
    upstream: &HashMap<String, StageResult>,
) -> HashMap<String, String> {
    let mut values: HashMap<String, String> = upstream
        .iter()
        .map(|(name, result)| (name.clone(), result.text.clone()))
        .collect();
    values.insert("prompt".to_string(), params.prompt.clone());
    values.insert("docs_uploaded".to_string(), params.docs_uploaded.to_string());
    values
}

/// Parses the strict one-line gate reply. Anything outside the contract is
/// a malformed model response.
fn parse_data_need(response: &str) -> Result<DataNeed, String> {
    let first_line = response.trim().lines().next().unwrap_or("").trim();

    if first_line.eq_ignore_ascii_case("none") {
        return Ok(DataNeed::None);
    }
    if let Some(rest) = strip_prefix_ignore_case(first_line, "mapping") {
        let summary = rest.trim_start_matches(':').trim();
        return Ok(DataNeed::Mapping(summary.to_string()));
    }

    Err(format!(
        "gate reply must start with NONE or MAPPING, got: {first_line:.80}"
    ))
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len() && s[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}
