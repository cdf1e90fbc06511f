//! Rule and RuleSet.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use ratchet_core::constants;
use ratchet_core::errors::RuleError;
use ratchet_core::types::collections::FxHashSet;

use super::span::{SpanSpec, SpanStrategy};
use super::validation;

/// How a rule's primary pattern is applied to a file.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Pattern applied to every line independently.
    Line,
    /// Pattern applied to the whole text; a match is reported at the line
    /// holding its first byte.
    WholeText,
    /// Primary pattern opens a span measured by a derived secondary pattern.
    TwoPass(SpanSpec),
}

impl RuleKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::WholeText => "whole_text",
            Self::TwoPass(_) => "two_pass",
        }
    }
}

/// A validated, immutable rule.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    description: Option<String>,
    kind: RuleKind,
    pattern: Regex,
    examples: Vec<String>,
    non_examples: Vec<String>,
    include_paths: Option<Regex>,
    exclude_paths: Option<Regex>,
    test_files: Option<Regex>,
}

impl Rule {
    /// Start building a line rule named `name` with primary `pattern`.
    pub fn builder(name: impl Into<String>, pattern: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            name: name.into(),
            pattern: pattern.into(),
            description: None,
            kind: BuilderKind::Line,
            examples: Vec::new(),
            non_examples: Vec::new(),
            include_paths: None,
            exclude_paths: None,
            exclude_test_files: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn non_examples(&self) -> &[String] {
        &self.non_examples
    }

    /// Whether this rule's file filters admit `path` (repository-relative).
    pub fn applies_to(&self, path: &Path) -> bool {
        let path = normalized(path);
        if let Some(include) = &self.include_paths {
            if !include.is_match(&path) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude_paths {
            if exclude.is_match(&path) {
                return false;
            }
        }
        if let Some(test_files) = &self.test_files {
            if test_files.is_match(&path) {
                return false;
            }
        }
        true
    }
}

/// Forward-slash form of a path so filters behave the same on every platform.
fn normalized(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[derive(Debug)]
enum BuilderKind {
    Line,
    WholeText,
    TwoPass(SpanSpec),
}

/// Collects a rule definition; [`RuleBuilder::build`] compiles and validates it.
#[derive(Debug)]
pub struct RuleBuilder {
    name: String,
    pattern: String,
    description: Option<String>,
    kind: BuilderKind,
    examples: Vec<String>,
    non_examples: Vec<String>,
    include_paths: Option<String>,
    exclude_paths: Option<String>,
    exclude_test_files: bool,
}

impl RuleBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn whole_text(mut self) -> Self {
        self.kind = BuilderKind::WholeText;
        self
    }

    pub fn two_pass(mut self, strategy: Arc<dyn SpanStrategy>, max_lines: usize) -> Self {
        self.kind = BuilderKind::TwoPass(SpanSpec::new(strategy, max_lines));
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }

    pub fn non_example(mut self, example: impl Into<String>) -> Self {
        self.non_examples.push(example.into());
        self
    }

    pub fn examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples.extend(examples.into_iter().map(Into::into));
        self
    }

    pub fn non_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.non_examples.extend(examples.into_iter().map(Into::into));
        self
    }

    /// Only paths matching this regex are scanned.
    pub fn include_paths(mut self, pattern: impl Into<String>) -> Self {
        self.include_paths = Some(pattern.into());
        self
    }

    /// Paths matching this regex are skipped.
    pub fn exclude_paths(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_paths = Some(pattern.into());
        self
    }

    /// Skip `test_*.py` and `*_test.py` files.
    pub fn exclude_test_files(mut self, exclude: bool) -> Self {
        self.exclude_test_files = exclude;
        self
    }

    /// Compile patterns and run the rule's examples.
    pub fn build(self) -> Result<Rule, RuleError> {
        if self.name.trim().is_empty() {
            return Err(RuleError::MissingField {
                rule: self.name,
                field: "name".to_string(),
            });
        }
        if self.pattern.is_empty() {
            return Err(RuleError::MissingField {
                rule: self.name,
                field: "pattern".to_string(),
            });
        }

        let pattern = compile(&self.name, &self.pattern)?;
        let include_paths = self
            .include_paths
            .as_deref()
            .map(|p| compile(&self.name, p))
            .transpose()?;
        let exclude_paths = self
            .exclude_paths
            .as_deref()
            .map(|p| compile(&self.name, p))
            .transpose()?;
        let test_files = if self.exclude_test_files {
            Some(compile(&self.name, constants::TEST_FILE_PATTERN)?)
        } else {
            None
        };

        let kind = match self.kind {
            BuilderKind::Line => RuleKind::Line,
            BuilderKind::WholeText => RuleKind::WholeText,
            BuilderKind::TwoPass(span) => RuleKind::TwoPass(span),
        };

        let rule = Rule {
            name: self.name,
            description: self.description,
            kind,
            pattern,
            examples: self.examples,
            non_examples: self.non_examples,
            include_paths,
            exclude_paths,
            test_files,
        };

        validation::validate_examples(&rule)?;
        Ok(rule)
    }
}

fn compile(rule: &str, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|e| RuleError::InvalidPattern {
        rule: rule.to_string(),
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Ordered collection of rules with unique names.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Fails on the first duplicated name.
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for rule in &rules {
            if !seen.insert(rule.name()) {
                return Err(RuleError::DuplicateName {
                    rule: rule.name().to_string(),
                });
            }
        }
        Ok(Self { rules })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(Rule::name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
