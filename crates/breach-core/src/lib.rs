//! Breach Core: result cache, backend contract and pipeline orchestration
//!
//! A submit runs extraction (from an upload or from manual text) and then
//! solving; the results are parked in a [`ResultStore`] under opaque tokens
//! that the following render request consumes.

pub mod backend;
pub mod context;
pub mod data_model;
pub mod error;
pub mod manual;
pub mod orchestrator;
pub mod store;

pub use backend::BackendClient;
pub use context::{ImageUpload, ManualInput, SubmitRequest};
pub use data_model::{
    ExtractResult, GridBox, Position, ResultVariant, SolveResult, StoredResult, VariantKind,
};
pub use error::BreachError;
pub use orchestrator::{ExtractSource, PipelineOrchestrator, PipelineTokens};
pub use store::{CacheEntry, ResultStore, Token};
