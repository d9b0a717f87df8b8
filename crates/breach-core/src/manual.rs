//! Manual Entry: turns hand-corrected form text into an ExtractResult
use crate::context::ManualInput;
use crate::data_model::{ExtractResult, GridBox};
use std::time::Duration;
use tracing::warn;

/// Splits multi-line text into rows of whitespace-separated cells.
///
/// Lines are split on CR/LF; lines without any cell are dropped rather than
/// kept as empty rows. Row lengths are not compared with each other.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    text.split(['\r', '\n'])
        .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect()
}

/// Parses geometry passed back through the form. Anything that is not a
/// JSON matrix of 4-int boxes is discarded.
pub fn parse_grid_boxes(json: &str) -> Option<Vec<Vec<GridBox>>> {
    if json.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(json) {
        Ok(boxes) => Some(boxes),
        Err(e) => {
            warn!(error = %e, "discarding malformed grid geometry");
            None
        }
    }
}

/// Builds an extraction from manual fields, or `None` when targets, grid or
/// buffer size is missing.
///
/// Grid, targets and buffer size always come from `manual`. The image and
/// geometry come from the form's side-channel fields when present, otherwise
/// from `prior`.
pub fn build_extract(manual: &ManualInput, prior: Option<&ExtractResult>) -> Option<ExtractResult> {
    if !manual.is_complete() {
        return None;
    }
    let targets = parse_rows(manual.targets.as_deref()?);
    let grid = parse_rows(manual.grid.as_deref()?);
    let buffer_size = manual.buffer_size?;

    let matrix_image = manual
        .extracted_image
        .clone()
        .filter(|s| !s.is_empty())
        .or_else(|| prior.and_then(|p| p.matrix_image.clone()));

    let grid_boxes = manual
        .grid_boxes
        .as_deref()
        .and_then(parse_grid_boxes)
        .or_else(|| prior.map(|p| p.grid_boxes.clone()))
        .unwrap_or_default();

    Some(ExtractResult {
        buffer_size,
        grid,
        targets,
        matrix_image,
        grid_boxes,
        elapsed: Duration::ZERO,
        errors: None,
    })
}
