//! Declarative TOML rule definitions.
//!
//! ```toml
//! [[rules]]
//! name = "no_print"
//! pattern = '^[^#]*print\('
//! match_examples = ["print('x')"]
//! non_match_examples = ["# print('x')"]
//!
//! [[rules]]
//! name = "function_length"
//! kind = "two_pass"
//! pattern = '^\s*def\s+\w+\s*\('
//! [rules.span]
//! strategy = "indented_block"
//! max_lines = 50
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ratchet_core::errors::RuleError;

use super::span::{CaptureTemplate, IndentedBlock, SpanStrategy};
use super::types::{Rule, RuleSet};

/// One `[[rules]]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleDef {
    pub name: Option<String>,
    pub description: Option<String>,
    pub pattern: Option<String>,
    /// `line` (default), `whole_text` or `two_pass`.
    pub kind: Option<String>,
    #[serde(default)]
    pub match_examples: Vec<String>,
    #[serde(default)]
    pub non_match_examples: Vec<String>,
    pub include_paths: Option<String>,
    pub exclude_paths: Option<String>,
    #[serde(default)]
    pub exclude_test_files: bool,
    pub enabled: Option<bool>,
    pub span: Option<SpanDef>,
}

/// `[rules.span]` table of a two-pass rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanDef {
    /// `indented_block` (default) or `capture_template`.
    pub strategy: Option<String>,
    /// Secondary pattern template for `capture_template`.
    pub template: Option<String>,
    pub max_lines: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFile {
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

pub struct RuleLoader;

impl RuleLoader {
    /// Parse, compile and validate every enabled rule in `toml_str`.
    pub fn load_from_str(toml_str: &str) -> Result<RuleSet, RuleError> {
        Self::load_named(toml_str, "<string>")
    }

    pub fn load_from_file(path: &Path) -> Result<RuleSet, RuleError> {
        let content = std::fs::read_to_string(path).map_err(|e| RuleError::LoadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::load_named(&content, &path.display().to_string())
    }

    fn load_named(toml_str: &str, origin: &str) -> Result<RuleSet, RuleError> {
        let file: RuleFile = toml::from_str(toml_str).map_err(|e| RuleError::LoadFailed {
            path: origin.to_string(),
            message: e.to_string(),
        })?;

        let mut rules = Vec::with_capacity(file.rules.len());
        for def in file.rules {
            if def.enabled == Some(false) {
                tracing::debug!(rule = def.name.as_deref().unwrap_or("?"), "rule disabled");
                continue;
            }
            rules.push(Self::compile(def)?);
        }
        tracing::info!(origin, rules = rules.len(), "loaded rules");
        RuleSet::new(rules)
    }

    /// Compile a single definition into a validated rule.
    pub fn compile(def: RuleDef) -> Result<Rule, RuleError> {
        let name = def.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err(RuleError::MissingField {
                rule: "<unnamed>".to_string(),
                field: "name".to_string(),
            });
        }
        let Some(pattern) = def.pattern else {
            return Err(RuleError::MissingField {
                rule: name,
                field: "pattern".to_string(),
            });
        };

        let mut builder = Rule::builder(name.clone(), pattern)
            .examples(def.match_examples)
            .non_examples(def.non_match_examples)
            .exclude_test_files(def.exclude_test_files);
        if let Some(description) = def.description {
            builder = builder.description(description);
        }
        if let Some(include) = def.include_paths {
            builder = builder.include_paths(include);
        }
        if let Some(exclude) = def.exclude_paths {
            builder = builder.exclude_paths(exclude);
        }

        builder = match def.kind.as_deref().unwrap_or("line") {
            "line" => builder,
            "whole_text" => builder.whole_text(),
            "two_pass" => {
                let Some(span) = def.span else {
                    return Err(RuleError::MissingField {
                        rule: name,
                        field: "span".to_string(),
                    });
                };
                let strategy = Self::strategy(&name, &span)?;
                builder.two_pass(strategy, span.max_lines)
            }
            other => {
                return Err(RuleError::InvalidSpan {
                    rule: name,
                    message: format!("unknown rule kind '{other}'"),
                })
            }
        };

        builder.build()
    }

    fn strategy(rule: &str, span: &SpanDef) -> Result<Arc<dyn SpanStrategy>, RuleError> {
        match span.strategy.as_deref().unwrap_or("indented_block") {
            "indented_block" => Ok(Arc::new(IndentedBlock)),
            "capture_template" => {
                let template = span.template.as_deref().ok_or_else(|| RuleError::MissingField {
                    rule: rule.to_string(),
                    field: "span.template".to_string(),
                })?;
                let strategy =
                    CaptureTemplate::new(template).map_err(|e| RuleError::InvalidPattern {
                        rule: rule.to_string(),
                        pattern: template.to_string(),
                        message: e.to_string(),
                    })?;
                Ok(Arc::new(strategy))
            }
            other => Err(RuleError::InvalidSpan {
                rule: rule.to_string(),
                message: format!("unknown span strategy '{other}'"),
            }),
        }
    }
}
