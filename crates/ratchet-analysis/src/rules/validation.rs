//! Example-driven self-validation, run once when a rule is built.

use std::path::Path;

use ratchet_core::errors::RuleError;

use super::types::Rule;
use crate::engine;

const EXAMPLE_PATH: &str = "<example>";

/// Every positive example must produce a match; no negative example may.
pub fn validate_examples(rule: &Rule) -> Result<(), RuleError> {
    let path = Path::new(EXAMPLE_PATH);

    for example in rule.examples() {
        if engine::evaluate(rule, path, example).is_empty() {
            return Err(RuleError::ExampleNotMatched {
                rule: rule.name().to_string(),
                example: example.clone(),
            });
        }
    }

    for example in rule.non_examples() {
        if let Some(found) = engine::evaluate(rule, path, example).first() {
            return Err(RuleError::NonExampleMatched {
                rule: rule.name().to_string(),
                example: example.clone(),
                line: found.line,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ratchet_core::errors::RatchetErrorCode;

    use super::super::types::Rule;
    use super::*;

    #[test]
    fn failing_positive_example_rejects_rule() {
        let err = Rule::builder("no_print", r"^[^#]*print\(")
            .example("logger.info('x')")
            .build()
            .unwrap_err();
        assert!(matches!(err, RuleError::ExampleNotMatched { .. }));
        assert_eq!(err.error_code(), "RULE_VALIDATION_FAILED");
    }

    #[test]
    fn matching_negative_example_rejects_rule() {
        let err = Rule::builder("no_print", r"print\(")
            .example("print('x')")
            .non_example("x = 1\n# print('commented')")
            .build()
            .unwrap_err();
        match err {
            RuleError::NonExampleMatched { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn consistent_examples_accepted() {
        let rule = Rule::builder("no_print", r"^[^#]*print\(")
            .examples(["print('Hello')", "print(123)"])
            .non_examples(["# print('Hello')", "logging.info('Hello')"])
            .build();
        assert!(rule.is_ok());
    }
}
