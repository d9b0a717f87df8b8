//! BREACH-OUT: Cached results to HTML
//!
//! [`ViewAssembler`] resolves the tokens of a render request into a
//! [`PageModel`]; [`PageRenderer`] turns that model into HTML using the
//! Handlebars templates of a YAML templates file.
//!
//! # Example
//!
//! ```ignore
//! use breach_out::{PageRenderer, ViewAssembler};
//!
//! let renderer = PageRenderer::load("templates/pages.yaml")?;
//! let page = ViewAssembler::new(store).assemble(Some(&data_token), Some(&solve_token));
//! let html = renderer.render_index(&page)?;
//! ```

pub mod renderer;
pub mod templates;
pub mod view;

pub use view::{format_positions, join_rows, ExtractView, PageModel, SolveView, ViewAssembler};

use renderer::TemplateRenderer;
use templates::TemplatesFile;
use thiserror::Error;

/// Template every page render goes through
pub const INDEX_TEMPLATE: &str = "index";

/// Errors that can occur during rendering
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("TEMPLATE/{0}")]
    Template(String),
    #[error("RENDER/{0}")]
    Render(String),
}

pub struct PageRenderer {
    renderer: TemplateRenderer,
}

impl PageRenderer {
    /// Builds a renderer, requiring an `index` template.
    pub fn new(templates: TemplatesFile) -> Result<Self, RenderError> {
        let renderer = TemplateRenderer::new(templates).map_err(RenderError::Template)?;
        if !renderer.has_template(INDEX_TEMPLATE) {
            return Err(RenderError::Template(format!(
                "missing required template '{}'",
                INDEX_TEMPLATE
            )));
        }
        Ok(Self { renderer })
    }

    pub fn load(path: &str) -> Result<Self, RenderError> {
        Self::new(TemplatesFile::load(path).map_err(RenderError::Template)?)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        Self::new(TemplatesFile::from_yaml(yaml).map_err(RenderError::Template)?)
    }

    pub fn render_index(&self, page: &PageModel) -> Result<String, RenderError> {
        self.renderer
            .render(INDEX_TEMPLATE, page)
            .map_err(RenderError::Render)
    }
}
