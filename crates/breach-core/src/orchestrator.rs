//! Pipeline Orchestrator: decides per submit whether to extract, solve, or both
//!
//! ```text
//! upload ──► extract ─┐
//!                     ├──► solve ──► store(extract) + store(solve) ──► tokens
//! manual ──► parse ───┘
//! neither ─────────────────────────────────────────────────────────► no tokens
//! ```
use crate::backend::BackendClient;
use crate::context::SubmitRequest;
use crate::data_model::ExtractResult;
use crate::error::BreachError;
use crate::manual;
use crate::store::{ResultStore, Token};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tokens produced by one submit, for the render request to resolve
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineTokens {
    pub data_token: Option<Token>,
    pub solve_token: Option<Token>,
}

impl PipelineTokens {
    pub fn is_empty(&self) -> bool {
        self.data_token.is_none() && self.solve_token.is_none()
    }
}

/// Where the extraction for a submit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractSource {
    Upload,
    Manual,
}

pub struct PipelineOrchestrator {
    backend: Arc<dyn BackendClient>,
    store: Arc<ResultStore>,
}

impl PipelineOrchestrator {
    pub fn new(backend: Arc<dyn BackendClient>, store: Arc<ResultStore>) -> Self {
        Self { backend, store }
    }

    /// Runs the pipeline for one submit.
    ///
    /// A backend failure in either stage aborts the whole run and nothing is
    /// stored. Results are only written once both stages have succeeded.
    pub async fn run(&self, request: &SubmitRequest) -> Result<PipelineTokens, BreachError> {
        let Some((extract, source)) = self.extract_stage(request).await? else {
            info!(trace_id = %request.trace_id, "no upload and incomplete manual input, nothing to run");
            return Ok(PipelineTokens::default());
        };

        let solved = self.timed("solve", &request.trace_id, self.backend.solve(&extract)).await?;

        let data_token = self.store.store(extract);
        let solve_token = self.store.store(solved);
        info!(
            trace_id = %request.trace_id,
            ?source,
            data_token = %data_token,
            solve_token = %solve_token,
            "pipeline complete"
        );

        Ok(PipelineTokens {
            data_token: Some(data_token),
            solve_token: Some(solve_token),
        })
    }

    /// Produces the extraction to solve, or `None` when there is nothing to run.
    /// An upload always wins over manual fields in the same request.
    async fn extract_stage(
        &self,
        request: &SubmitRequest,
    ) -> Result<Option<(ExtractResult, ExtractSource)>, BreachError> {
        if let Some(image) = request.image.as_ref().filter(|image| !image.is_empty()) {
            if request.manual.is_complete() {
                debug!(trace_id = %request.trace_id, "upload present, manual fields ignored");
            }
            let extract = self
                .timed("extract", &request.trace_id, self.backend.extract(image))
                .await?;
            return Ok(Some((extract, ExtractSource::Upload)));
        }

        if !request.manual.is_complete() {
            return Ok(None);
        }

        let prior = request
            .prior_data_token
            .as_ref()
            .and_then(|token| self.store.fetch::<ExtractResult>(token.as_str(), false));

        Ok(manual::build_extract(&request.manual, prior.as_ref())
            .map(|extract| (extract, ExtractSource::Manual)))
    }

    async fn timed<T>(
        &self,
        stage: &'static str,
        trace_id: &str,
        call: impl std::future::Future<Output = Result<T, BreachError>>,
    ) -> Result<T, BreachError> {
        let start = Instant::now();
        let result = call.await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(trace_id, stage, latency_ms, "backend stage succeeded"),
            Err(e) => warn!(trace_id, stage, latency_ms, error = %e, "backend stage failed"),
        }
        result
    }
}
