//! Template substitution
//!
//! The engine is a seam: [`ManifestRenderer`](super::ManifestRenderer) only
//! needs something that turns template text plus settings into manifest
//! text. [`PlaceholderEngine`] handles `{{.Name}}` placeholders backed by
//! [`NodeConfig::template_vars`].

use std::io;
use std::path::PathBuf;

use regex_lite::Regex;

use crate::config::NodeConfig;

/// Errors from reading or substituting a template
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("error reading template [{}]: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unknown template variable '{name}' on line {line}")]
    UnknownVariable { name: String, line: usize },

    #[error("unsupported template directive on line {line}: {snippet}")]
    Unsupported { line: usize, snippet: String },

    #[error("invalid placeholder pattern: {0}")]
    Pattern(#[from] regex_lite::Error),
}

/// Renders template text against node settings
pub trait TemplateEngine {
    fn render(&self, template: &str, cfg: &NodeConfig) -> Result<String, TemplateError>;
}

/// `{{.Name}}` substitution from the settings' template variables
#[derive(Debug, Clone)]
pub struct PlaceholderEngine {
    placeholder: Regex,
}

impl PlaceholderEngine {
    pub fn new() -> Result<Self, TemplateError> {
        Ok(Self {
            placeholder: Regex::new(r"\{\{\s*\.([A-Za-z][A-Za-z0-9_]*)\s*\}\}")?,
        })
    }
}

impl TemplateEngine for PlaceholderEngine {
    fn render(&self, template: &str, cfg: &NodeConfig) -> Result<String, TemplateError> {
        let vars = cfg.template_vars();
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in self.placeholder.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            let literal = &template[last..whole.start()];
            check_literal(template, last, literal)?;
            out.push_str(literal);

            let name = &caps[1];
            let value = vars.get(name).ok_or_else(|| TemplateError::UnknownVariable {
                name: name.to_string(),
                line: line_of(template, whole.start()),
            })?;
            out.push_str(value);
            last = whole.end();
        }

        let rest = &template[last..];
        check_literal(template, last, rest)?;
        out.push_str(rest);
        Ok(out)
    }
}

/// Reject any `{{` left outside a recognized placeholder
fn check_literal(template: &str, offset: usize, literal: &str) -> Result<(), TemplateError> {
    match literal.find("{{") {
        Some(pos) => {
            let start = offset + pos;
            let snippet: String = template[start..].chars().take_while(|c| *c != '\n').take(40).collect();
            Err(TemplateError::Unsupported {
                line: line_of(template, start),
                snippet,
            })
        }
        None => Ok(()),
    }
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}
