//! Span derivation for two-pass rules.

use std::fmt;
use std::sync::Arc;

use regex::{Captures, Regex};

/// Derives the secondary pattern that measures a block, given the line
/// that opened it.
pub trait SpanStrategy: Send + Sync + fmt::Debug {
    /// Identifier used in rule files and logs.
    fn name(&self) -> &'static str;

    /// Build the secondary pattern for one candidate span.
    fn derive_secondary(
        &self,
        signature: &str,
        captures: &Captures<'_>,
    ) -> Result<Regex, regex::Error>;
}

/// Span strategy plus the length a span may reach before it violates.
#[derive(Debug, Clone)]
pub struct SpanSpec {
    pub strategy: Arc<dyn SpanStrategy>,
    pub max_lines: usize,
}

impl SpanSpec {
    pub fn new(strategy: Arc<dyn SpanStrategy>, max_lines: usize) -> Self {
        Self {
            strategy,
            max_lines,
        }
    }
}

/// Body lines are those indented deeper than the signature, starting with
/// the signature's exact leading whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndentedBlock;

impl SpanStrategy for IndentedBlock {
    fn name(&self) -> &'static str {
        "indented_block"
    }

    fn derive_secondary(
        &self,
        signature: &str,
        _captures: &Captures<'_>,
    ) -> Result<Regex, regex::Error> {
        let indent_len = signature.len() - signature.trim_start().len();
        let indent = &signature[..indent_len];
        Regex::new(&format!(r"^{}[ \t]+\S", regex::escape(indent)))
    }
}

/// Secondary pattern built from a template whose `$1`, `$name` or
/// `${name}` references are replaced by the escaped captures of the
/// primary match. `$$` is a literal dollar.
#[derive(Debug, Clone)]
pub struct CaptureTemplate {
    template: String,
    reference: Regex,
}

impl CaptureTemplate {
    /// Fails if the template cannot form a valid pattern.
    pub fn new(template: impl Into<String>) -> Result<Self, regex::Error> {
        let template = template.into();
        let reference = Regex::new(r"\$(?:(\$)|\{(\w+)\}|(\w+))")?;
        let probe = reference.replace_all(&template, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                r"\$".to_string()
            } else {
                "x".to_string()
            }
        });
        Regex::new(&probe)?;
        Ok(Self {
            template,
            reference,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    fn expand(&self, captures: &Captures<'_>) -> String {
        self.reference
            .replace_all(&self.template, |caps: &Captures<'_>| {
                if caps.get(1).is_some() {
                    return r"\$".to_string();
                }
                let Some(name) = caps.get(2).or_else(|| caps.get(3)) else {
                    return String::new();
                };
                let name = name.as_str();
                let value = match name.parse::<usize>() {
                    Ok(index) => captures.get(index),
                    Err(_) => captures.name(name),
                };
                value.map(|m| regex::escape(m.as_str())).unwrap_or_default()
            })
            .into_owned()
    }
}

impl SpanStrategy for CaptureTemplate {
    fn name(&self) -> &'static str {
        "capture_template"
    }

    fn derive_secondary(
        &self,
        _signature: &str,
        captures: &Captures<'_>,
    ) -> Result<Regex, regex::Error> {
        Regex::new(&self.expand(captures))
    }
}
