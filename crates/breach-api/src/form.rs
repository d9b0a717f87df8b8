//! Submit form binding and validation.
use axum::extract::multipart::{Multipart, MultipartError};
use breach_core::{ImageUpload, ManualInput, SubmitRequest, Token};
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::debug;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const BUFFER_SIZE_RANGE: RangeInclusive<i32> = 2..=20;

/// Raw multipart fields of a submit, before validation
#[derive(Debug, Default)]
pub struct SubmitForm {
    pub file: Option<ImageUpload>,
    pub targets: Option<String>,
    pub grid: Option<String>,
    pub buffer_size: Option<String>,
    pub extracted_image: Option<String>,
    pub grid_boxes: Option<String>,
    /// Token of an earlier extraction to carry image and geometry from.
    /// The index page never sends it: its render has already consumed that
    /// token, so it round-trips `extractedImage`/`gridBoxes` instead. Clients
    /// that submit without rendering first can pass it.
    pub data_token: Option<String>,
}

impl SubmitForm {
    /// Reads every field of the body. An empty file part counts as no upload.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.file = Some(ImageUpload::new(file_name, bytes.to_vec()));
                    }
                }
                "targets" => form.targets = Some(field.text().await?),
                "grid" => form.grid = Some(field.text().await?),
                "bufferSize" => form.buffer_size = Some(field.text().await?),
                "extractedImage" => form.extracted_image = non_blank(field.text().await?),
                "gridBoxes" => form.grid_boxes = non_blank(field.text().await?),
                "dataToken" => form.data_token = non_blank(field.text().await?),
                _ => debug!(field = %name, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Validates the form into a pipeline request. The error is a notice for
    /// the user.
    ///
    /// Manual fields are only checked when no image was uploaded, since the
    /// upload takes precedence over them.
    pub fn into_request(self) -> Result<SubmitRequest, String> {
        let mut request = SubmitRequest::new();

        let buffer_size = match &self.file {
            Some(file) => {
                if !has_allowed_extension(&file.file_name) {
                    return Err(format!(
                        "Unsupported file '{}', upload a {} image",
                        file.file_name,
                        ALLOWED_EXTENSIONS.join("/")
                    ));
                }
                parse_buffer_size(self.buffer_size.as_deref()).unwrap_or(None)
            }
            None => parse_buffer_size(self.buffer_size.as_deref())?,
        };

        if let Some(file) = self.file {
            request = request.with_image(file);
        }
        if let Some(token) = self.data_token {
            request = request.with_prior_data_token(Token::from(token));
        }

        Ok(request.with_manual(ManualInput {
            targets: self.targets,
            grid: self.grid,
            buffer_size,
            extracted_image: self.extracted_image,
            grid_boxes: self.grid_boxes,
        }))
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Case-sensitive, the backend refuses `SHOT.PNG` as well.
pub fn has_allowed_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext))
}

/// Blank is "not given"; anything else must be a whole number in range.
pub fn parse_buffer_size(raw: Option<&str>) -> Result<Option<i32>, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let notice = || {
        format!(
            "Buffer size must be a whole number between {} and {}",
            BUFFER_SIZE_RANGE.start(),
            BUFFER_SIZE_RANGE.end()
        )
    };
    let value: i32 = raw.parse().map_err(|_| notice())?;
    if !BUFFER_SIZE_RANGE.contains(&value) {
        return Err(notice());
    }
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert!(has_allowed_extension("shot.png"));
        assert!(has_allowed_extension("a.b.jpeg"));
        assert!(!has_allowed_extension("shot.JPG"));
        assert!(!has_allowed_extension("SHOT.PNG"));
        assert!(!has_allowed_extension("shot.gif"));
        assert!(!has_allowed_extension("png"));
        assert!(!has_allowed_extension(""));
    }

    #[test]
    fn test_buffer_size() {
        assert_eq!(parse_buffer_size(None), Ok(None));
        assert_eq!(parse_buffer_size(Some("  ")), Ok(None));
        assert_eq!(parse_buffer_size(Some("2")), Ok(Some(2)));
        assert_eq!(parse_buffer_size(Some(" 20 ")), Ok(Some(20)));
        assert!(parse_buffer_size(Some("1")).is_err());
        assert!(parse_buffer_size(Some("21")).is_err());
        assert!(parse_buffer_size(Some("seven")).is_err());
    }

    #[test]
    fn test_manual_request() {
        let form = SubmitForm {
            targets: Some("1C 55".into()),
            grid: Some("1C 55\n55 1C".into()),
            buffer_size: Some("4".into()),
            data_token: Some("prior".into()),
            ..Default::default()
        };

        let request = form.into_request().unwrap();
        assert!(request.image.is_none());
        assert!(request.manual.is_complete());
        assert_eq!(request.manual.buffer_size, Some(4));
        assert_eq!(request.prior_data_token, Some(Token::from("prior")));
    }

    #[test]
    fn test_bad_buffer_size_rejected_without_upload() {
        let form = SubmitForm {
            buffer_size: Some("99".into()),
            ..Default::default()
        };
        assert!(form.into_request().unwrap_err().contains("between 2 and 20"));
    }

    #[test]
    fn test_upload_ignores_manual_validation() {
        let form = SubmitForm {
            file: Some(ImageUpload::new("shot.png", vec![1, 2, 3])),
            buffer_size: Some("99".into()),
            ..Default::default()
        };

        let request = form.into_request().unwrap();
        assert!(request.image.is_some());
        assert_eq!(request.manual.buffer_size, None);
    }

    #[test]
    fn test_unsupported_upload_rejected() {
        let form = SubmitForm {
            file: Some(ImageUpload::new("shot.gif", vec![1])),
            ..Default::default()
        };
        assert!(form.into_request().unwrap_err().contains("shot.gif"));
    }
}
