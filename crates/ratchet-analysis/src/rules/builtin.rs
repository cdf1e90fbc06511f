//! Ready-made rules.

use std::sync::Arc;

use ratchet_core::errors::RuleError;

use super::span::IndentedBlock;
use super::types::Rule;

/// Function signature, optionally `async`.
pub const FUNCTION_SIGNATURE: &str = r"^\s*(async\s+)?def\s+\w+\s*\(";

/// Functions whose body spans more than `max_lines` non-blank lines.
pub fn function_length(max_lines: usize) -> Result<Rule, RuleError> {
    Rule::builder("function_length", FUNCTION_SIGNATURE)
        .description(format!(
            "Functions should not exceed {max_lines} body lines"
        ))
        .two_pass(Arc::new(IndentedBlock), max_lines)
        .example(function_with_body(max_lines + 1))
        .non_example(function_with_body(max_lines))
        .exclude_test_files(true)
        .build()
}

fn function_with_body(lines: usize) -> String {
    let mut text = String::from("def example():\n");
    for i in 0..lines {
        text.push_str(&format!("    x{i} = {i}\n"));
    }
    text
}

pub fn no_print() -> Result<Rule, RuleError> {
    Rule::builder("no_print", r"^[^#]*print\(")
        .description("Detect print statements")
        .examples(["print('Hello')", "print(123)"])
        .non_examples(["# print('Hello')", "logging.info('Hello')"])
        .build()
}

pub fn no_bare_except() -> Result<Rule, RuleError> {
    Rule::builder("no_bare_except", r"except\s*:")
        .description("Detect bare except statements")
        .examples(["except:", "except :"])
        .non_examples(["except Exception:", "except ValueError:"])
        .build()
}

pub fn no_todo() -> Result<Rule, RuleError> {
    Rule::builder("no_todo", r"#\s*TODO\b")
        .description("Detect TODO comments")
        .examples(["# TODO implement", "#TODO: fix"])
        .non_examples(["# DONE: Fixed", "# Not a todo"])
        .build()
}

/// Lines longer than `max_columns` characters.
pub fn no_long_lines(max_columns: usize) -> Result<Rule, RuleError> {
    Rule::builder("no_long_lines", format!(r"^.{{{},}}$", max_columns + 1))
        .description(format!("Detect lines longer than {max_columns} characters"))
        .example("x".repeat(max_columns + 1))
        .non_example("x".repeat(max_columns))
        .build()
}

/// The general-purpose set: prints, bare excepts, TODOs, 80-column lines.
pub fn basic_rules() -> Result<Vec<Rule>, RuleError> {
    Ok(vec![no_print()?, no_bare_except()?, no_todo()?, no_long_lines(80)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_pass_their_own_examples() {
        assert_eq!(basic_rules().unwrap().len(), 4);
        for max in [0, 1, 2, 50] {
            assert!(function_length(max).is_ok(), "max_lines = {max}");
        }
    }

    #[test]
    fn function_length_skips_test_files() {
        let rule = function_length(10).unwrap();
        assert!(!rule.applies_to(std::path::Path::new("pkg/test_models.py")));
        assert!(rule.applies_to(std::path::Path::new("pkg/models.py")));
    }
}
