//! Submit Context: everything one inbound submit carries into the pipeline
use crate::store::Token;

/// Raw image as uploaded by the user
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Manually corrected fields from the submit form. Values are the raw text
/// the user typed; parsing happens in the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct ManualInput {
    pub targets: Option<String>,
    pub grid: Option<String>,
    pub buffer_size: Option<i32>,
    /// Image reference from an earlier extraction, passed back untouched
    pub extracted_image: Option<String>,
    /// JSON-serialized grid geometry from an earlier extraction
    pub grid_boxes: Option<String>,
}

impl ManualInput {
    /// True when targets, grid and buffer size are all present and non-blank.
    pub fn is_complete(&self) -> bool {
        let filled = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.targets) && filled(&self.grid) && self.buffer_size.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct SubmitRequest {
    pub trace_id: String,
    pub image: Option<ImageUpload>,
    pub manual: ManualInput,
    /// Token of a previous extraction whose image/geometry may be carried forward
    pub prior_data_token: Option<Token>,
}

impl SubmitRequest {
    pub fn new() -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            image: None,
            manual: ManualInput::default(),
            prior_data_token: None,
        }
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_manual(mut self, manual: ManualInput) -> Self {
        self.manual = manual;
        self
    }

    pub fn with_prior_data_token(mut self, token: Token) -> Self {
        self.prior_data_token = Some(token);
        self
    }
}

impl Default for SubmitRequest {
    fn default() -> Self {
        Self::new()
    }
}
