//! Data Model: ExtractResult, SolveResult and the closed ResultVariant union
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Bounding box of one grid cell as reported by the extractor: `[x, y, w, h]`
pub type GridBox = [i32; 4];

/// Zero-indexed `(row, col)` position into the grid. Serialized as `[row, col]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position(pub usize, pub usize);

impl Position {
    pub fn row(&self) -> usize {
        self.0
    }

    pub fn col(&self) -> usize {
        self.1
    }
}

/// Output of the extract stage: grid, targets and buffer size read from an image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResult {
    /// Number of cells the solver may pick
    pub buffer_size: i32,
    /// Cell codes, row-major
    #[serde(default)]
    pub grid: Vec<Vec<String>>,
    /// Target sequences, lowest value first
    #[serde(default)]
    pub targets: Vec<Vec<String>>,
    /// Encoded crop of the grid (base64 jpeg from the extractor)
    #[serde(default)]
    pub matrix_image: Option<String>,
    /// Per-cell geometry, parallel to `grid`
    #[serde(default)]
    pub grid_boxes: Vec<Vec<GridBox>>,
    #[serde(default, with = "elapsed_secs")]
    pub elapsed: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

/// Output of the solve stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub score: f64,
    #[serde(default)]
    pub sequence: Vec<Position>,
    /// Cell codes visited by `sequence`, same length and order
    #[serde(default)]
    pub sequence_text: Vec<String>,
    #[serde(default, alias = "result_image")]
    pub solution_image: Option<String>,
    #[serde(default, with = "elapsed_secs")]
    pub elapsed: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<String>,
}

/// Tag distinguishing the cached variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Extract,
    Solve,
}

impl VariantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Solve => "solve",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of results that can live in the cache. The tag is fixed when
/// the value is built and checked on every retrieval.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultVariant {
    Extract(ExtractResult),
    Solve(SolveResult),
}

impl ResultVariant {
    pub fn kind(&self) -> VariantKind {
        match self {
            Self::Extract(_) => VariantKind::Extract,
            Self::Solve(_) => VariantKind::Solve,
        }
    }
}

impl From<ExtractResult> for ResultVariant {
    fn from(value: ExtractResult) -> Self {
        Self::Extract(value)
    }
}

impl From<SolveResult> for ResultVariant {
    fn from(value: SolveResult) -> Self {
        Self::Solve(value)
    }
}

/// A concrete variant payload that can be pulled back out of a [`ResultVariant`].
pub trait StoredResult: Sized + Into<ResultVariant> {
    const KIND: VariantKind;

    /// Unwraps the payload, or `None` when the tag is a different kind.
    fn from_variant(variant: ResultVariant) -> Option<Self>;
}

impl StoredResult for ExtractResult {
    const KIND: VariantKind = VariantKind::Extract;

    fn from_variant(variant: ResultVariant) -> Option<Self> {
        match variant {
            ResultVariant::Extract(v) => Some(v),
            _ => None,
        }
    }
}

impl StoredResult for SolveResult {
    const KIND: VariantKind = VariantKind::Solve;

    fn from_variant(variant: ResultVariant) -> Option<Self> {
        match variant {
            ResultVariant::Solve(v) => Some(v),
            _ => None,
        }
    }
}

/// `elapsed` travels as fractional seconds on the wire
mod elapsed_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_decodes_backend_shape() {
        let body = json!({
            "buffer_size": 6,
            "grid": [["1C", "55"], ["BD", "E9"]],
            "targets": [["1C", "55"]],
            "matrix_image": "aGVsbG8=",
            "grid_boxes": [[[0, 0, 10, 10], [10, 0, 10, 10]], [[0, 10, 10, 10], [10, 10, 10, 10]]],
            "elapsed": 1.5
        });

        let extract: ExtractResult = serde_json::from_value(body).unwrap();
        assert_eq!(extract.buffer_size, 6);
        assert_eq!(extract.grid[1][0], "BD");
        assert_eq!(extract.grid_boxes[1][1], [10, 10, 10, 10]);
        assert_eq!(extract.elapsed, Duration::from_millis(1500));
        assert!(extract.errors.is_none());
    }

    #[test]
    fn test_solve_accepts_result_image_alias() {
        let body = json!({
            "score": 3.0,
            "sequence": [[0, 1], [2, 1]],
            "sequence_text": ["55", "1C"],
            "result_image": "abc",
            "elapsed": 0.25,
            "errors": "partial"
        });

        let solve: SolveResult = serde_json::from_value(body).unwrap();
        assert_eq!(solve.sequence, vec![Position(0, 1), Position(2, 1)]);
        assert_eq!(solve.solution_image.as_deref(), Some("abc"));
        assert_eq!(solve.errors.as_deref(), Some("partial"));
    }

    #[test]
    fn test_negative_elapsed_is_rejected() {
        let body = json!({ "score": 0.0, "elapsed": -1.0 });
        assert!(serde_json::from_value::<SolveResult>(body).is_err());
    }

    #[test]
    fn test_variant_kind_tag() {
        let solve = SolveResult {
            score: 1.0,
            sequence: vec![],
            sequence_text: vec![],
            solution_image: None,
            elapsed: Duration::ZERO,
            errors: None,
        };
        let variant = ResultVariant::from(solve.clone());
        assert_eq!(variant.kind(), VariantKind::Solve);
        assert!(ExtractResult::from_variant(variant.clone()).is_none());
        assert_eq!(SolveResult::from_variant(variant), Some(solve));
    }
}
