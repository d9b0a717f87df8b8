//! Template rendering for result pages.
//!
//! Uses Handlebars with two custom helpers:
//! - fixed: Format a number with a fixed count of decimals
//! - default: Fall back to a literal when a value is missing

use handlebars::{
    handlebars_helper, Context, Handlebars, Helper, HelperDef, HelperResult, Output,
    RenderContext,
};
use serde::Serialize;

use crate::templates::TemplatesFile;

handlebars_helper!(fixed: |value: f64, digits: u64| format!("{:.*}", digits as usize, value));

/// Compiled renderer with registered helpers
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Compile every template in `templates`. Fails on the first template
    /// with a syntax error.
    pub fn new(templates: TemplatesFile) -> Result<Self, String> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);

        handlebars.register_helper("fixed", Box::new(fixed));
        handlebars.register_helper("default", Box::new(DefaultHelper));

        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| format!("template {}: {}", name, e))?;
        }

        Ok(TemplateRenderer { handlebars })
    }

    /// Render a named template with data
    pub fn render<T: Serialize>(&self, template_name: &str, data: &T) -> Result<String, String> {
        self.handlebars
            .render(template_name, data)
            .map_err(|e| format!("render error: {}", e))
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.has_template(name)
    }
}

/// Writes the first param, or the second when the first is missing or null
struct DefaultHelper;

impl HelperDef for DefaultHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _r: &'reg Handlebars<'reg>,
        _ctx: &'rc Context,
        _rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let value = h.param(0).map(|v| v.value());
        let default = h.param(1).and_then(|v| v.value().as_str()).unwrap_or("");

        match value {
            Some(v) if !v.is_null() => match v.as_str() {
                Some(s) => out.write(s)?,
                None => out.write(&v.to_string())?,
            },
            _ => out.write(default)?,
        }

        Ok(())
    }
}
