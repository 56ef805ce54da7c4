//! Embedded Tera templates for scaffolded files and rendered reports

use rust_embed::Embed;
use tera::Tera;
use thiserror::Error;

#[derive(Embed)]
#[folder = "templates/"]
struct EmbeddedTemplates;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("template rendering error: {0}")]
    Render(String),
}

/// Tera instance preloaded with every embedded template
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();

        for file in EmbeddedTemplates::iter() {
            let filename = file.as_ref();
            if let Some(content) = EmbeddedTemplates::get(filename) {
                if let Ok(template) = std::str::from_utf8(&content.data) {
                    tera.add_raw_template(filename, template)
                        .map_err(|e| TemplateError::Render(e.to_string()))?;
                }
            }
        }

        Ok(Self { tera })
    }

    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String, TemplateError> {
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(TemplateError::NotFound(name.to_string()));
        }
        self.tera
            .render(name, context)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }
}
