//! View assembly: turns cached results into display-ready strings.
//!
//! Reads are consuming, so a page can show a given result only once. A
//! missing, already consumed or wrong-kind token renders as nothing.

use breach_core::{ExtractResult, GridBox, Position, ResultStore, SolveResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Display form of an extraction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractView {
    pub buffer_size: i32,
    /// One target per line, cells separated by single spaces
    pub targets_text: String,
    /// One grid row per line, cells separated by single spaces
    pub grid_text: String,
    pub matrix_image: Option<String>,
    /// Geometry serialized back to JSON so the manual form can return it
    pub grid_boxes_json: String,
    pub elapsed_secs: f64,
    pub errors: Option<String>,
}

/// Display form of a solution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveView {
    pub score: f64,
    pub sequence_text: String,
    /// 1-indexed `(row, col)` pairs separated by spaces
    pub positions: String,
    pub solution_image: Option<String>,
    pub elapsed_secs: f64,
    pub errors: Option<String>,
}

/// Everything the index page shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageModel {
    pub extract: Option<ExtractView>,
    pub solve: Option<SolveView>,
    /// Input validation message from a rejected submit
    pub notice: Option<String>,
}

impl PageModel {
    pub fn with_notice(notice: impl Into<String>) -> Self {
        Self {
            notice: Some(notice.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.extract.is_none() && self.solve.is_none()
    }
}

/// Joins each row's cells with a space, one row per line.
pub fn join_rows(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| row.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats positions 1-indexed, e.g. `(1, 2) (3, 2)`.
pub fn format_positions(sequence: &[Position]) -> String {
    sequence
        .iter()
        .map(|p| format!("({}, {})", p.row() + 1, p.col() + 1))
        .collect::<Vec<_>>()
        .join(" ")
}

fn grid_boxes_json(boxes: &[Vec<GridBox>]) -> String {
    serde_json::to_string(boxes).unwrap_or_default()
}

impl From<ExtractResult> for ExtractView {
    fn from(extract: ExtractResult) -> Self {
        Self {
            buffer_size: extract.buffer_size,
            targets_text: join_rows(&extract.targets),
            grid_text: join_rows(&extract.grid),
            grid_boxes_json: grid_boxes_json(&extract.grid_boxes),
            matrix_image: extract.matrix_image,
            elapsed_secs: extract.elapsed.as_secs_f64(),
            errors: extract.errors,
        }
    }
}

impl From<SolveResult> for SolveView {
    fn from(solve: SolveResult) -> Self {
        Self {
            score: solve.score,
            sequence_text: solve.sequence_text.join(" "),
            positions: format_positions(&solve.sequence),
            solution_image: solve.solution_image,
            elapsed_secs: solve.elapsed.as_secs_f64(),
            errors: solve.errors,
        }
    }
}

pub struct ViewAssembler {
    store: Arc<ResultStore>,
}

impl ViewAssembler {
    pub fn new(store: Arc<ResultStore>) -> Self {
        Self { store }
    }

    /// Consumes whichever tokens are given and builds the page model.
    pub fn assemble(&self, data_token: Option<&str>, solve_token: Option<&str>) -> PageModel {
        let extract = data_token
            .filter(|t| !t.is_empty())
            .and_then(|t| self.store.fetch::<ExtractResult>(t, true))
            .map(ExtractView::from);

        let solve = solve_token
            .filter(|t| !t.is_empty())
            .and_then(|t| self.store.fetch::<SolveResult>(t, true))
            .map(SolveView::from);

        debug!(
            extract = extract.is_some(),
            solve = solve.is_some(),
            "page assembled"
        );

        PageModel {
            extract,
            solve,
            notice: None,
        }
    }
}
