//! Backend Contract: the two remote analysis calls the pipeline depends on
use crate::context::ImageUpload;
use crate::data_model::{ExtractResult, SolveResult};
use crate::error::BreachError;
use async_trait::async_trait;

/// Remote analysis service.
///
/// Each call is a single request/response with no retry; an `Err` aborts the
/// pipeline stage that made it.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Reads grid, targets and buffer size out of an uploaded image
    async fn extract(&self, image: &ImageUpload) -> Result<ExtractResult, BreachError>;

    /// Computes the best sequence for an extraction
    async fn solve(&self, extract: &ExtractResult) -> Result<SolveResult, BreachError>;
}
