//! Rule loading tests: TOML definitions, self-validation, span strategies.

use std::path::Path;

use ratchet_analysis::engine::evaluate;
use ratchet_analysis::rules::{RuleKind, RuleLoader};
use ratchet_core::errors::{RatchetErrorCode, RuleError};

/// RUL-01: every kind loads from one file, in file order.
#[test]
fn rul_01_load_all_kinds() {
    let toml = r##"
[[rules]]
name = "no_print"
description = "Detect print statements"
pattern = '^[^#]*print\('
match_examples = ["print('x')"]
non_match_examples = ["# print('x')"]

[[rules]]
name = "no_star_import"
kind = "whole_text"
pattern = 'from\s+\S+\s+import\s+\*'
match_examples = ["from os import *"]

[[rules]]
name = "function_length"
kind = "two_pass"
pattern = '^\s*def\s+\w+\s*\('
exclude_test_files = true
match_examples = ["def f():\n    a = 1\n    b = 2\n    c = 3\n"]
non_match_examples = ["def f():\n    a = 1\n    b = 2\n"]

[rules.span]
strategy = "indented_block"
max_lines = 2
"##;
    let rules = RuleLoader::load_from_str(toml).unwrap();
    assert_eq!(
        rules.names().collect::<Vec<_>>(),
        vec!["no_print", "no_star_import", "function_length"]
    );
    assert!(matches!(rules.get("no_print").unwrap().kind(), RuleKind::Line));
    assert!(matches!(
        rules.get("no_star_import").unwrap().kind(),
        RuleKind::WholeText
    ));
    let span_rule = rules.get("function_length").unwrap();
    assert_eq!(span_rule.kind().label(), "two_pass");
    assert!(!span_rule.applies_to(Path::new("pkg/test_mod.py")));
}

/// RUL-02: a rule whose example fails to match is rejected at load time.
#[test]
fn rul_02_example_not_matched() {
    let toml = r##"
[[rules]]
name = "broken"
pattern = 'print\('
match_examples = ["log('x')"]
"##;
    let err = RuleLoader::load_from_str(toml).unwrap_err();
    assert!(matches!(&err, RuleError::ExampleNotMatched { rule, .. } if rule == "broken"));
    assert_eq!(err.error_code(), "RULE_VALIDATION_FAILED");
}

/// RUL-03: a non-example that matches is rejected with its line.
#[test]
fn rul_03_non_example_matched() {
    let toml = r##"
[[rules]]
name = "too_broad"
pattern = 'print'
non_match_examples = ["ok = 1\nprinter = 2"]
"##;
    let err = RuleLoader::load_from_str(toml).unwrap_err();
    assert!(matches!(err, RuleError::NonExampleMatched { line: 2, .. }));
}

/// RUL-04: disabled rules are skipped entirely, even when invalid.
#[test]
fn rul_04_disabled_rule_skipped() {
    let toml = r##"
[[rules]]
name = "off"
pattern = '('
enabled = false

[[rules]]
name = "on"
pattern = 'x'
"##;
    let rules = RuleLoader::load_from_str(toml).unwrap();
    assert_eq!(rules.len(), 1);
    assert!(rules.get("on").is_some());
}

/// RUL-05: structural errors name the rule and the problem.
#[test]
fn rul_05_structural_errors() {
    let missing_pattern = "[[rules]]\nname = \"a\"\n";
    assert!(matches!(
        RuleLoader::load_from_str(missing_pattern).unwrap_err(),
        RuleError::MissingField { field, .. } if field == "pattern"
    ));

    let missing_span = "[[rules]]\nname = \"a\"\nkind = \"two_pass\"\npattern = 'def'\n";
    assert!(matches!(
        RuleLoader::load_from_str(missing_span).unwrap_err(),
        RuleError::MissingField { field, .. } if field == "span"
    ));

    let bad_kind = "[[rules]]\nname = \"a\"\nkind = \"fuzzy\"\npattern = 'x'\n";
    assert!(matches!(
        RuleLoader::load_from_str(bad_kind).unwrap_err(),
        RuleError::InvalidSpan { .. }
    ));

    let duplicate = "[[rules]]\nname = \"a\"\npattern = 'x'\n[[rules]]\nname = \"a\"\npattern = 'y'\n";
    assert!(matches!(
        RuleLoader::load_from_str(duplicate).unwrap_err(),
        RuleError::DuplicateName { .. }
    ));

    assert!(matches!(
        RuleLoader::load_from_str("rules = 3").unwrap_err(),
        RuleError::LoadFailed { .. }
    ));
}

/// RUL-06: capture-template spans derive their body pattern per match.
#[test]
fn rul_06_capture_template_span() {
    let toml = r##"
[[rules]]
name = "long_lock"
kind = "two_pass"
pattern = '^with (\w+)\.lock\(\):'

[rules.span]
strategy = "capture_template"
template = '^\s+${1}\.'
max_lines = 1
"##;
    let rules = RuleLoader::load_from_str(toml).unwrap();
    let rule = rules.get("long_lock").unwrap();
    let text = "with db.lock():\n    db.read()\n    db.write()\nwith io.lock():\n    io.flush()\n";
    let matches = evaluate(rule, Path::new("m.py"), text);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].text, "with db.lock():");
}

/// RUL-07: an uncompilable template is a configuration error.
#[test]
fn rul_07_bad_template() {
    let toml = r##"
[[rules]]
name = "bad"
kind = "two_pass"
pattern = '^with (\w+)'

[rules.span]
strategy = "capture_template"
template = '(${1}'
max_lines = 1
"##;
    let err = RuleLoader::load_from_str(toml).unwrap_err();
    assert!(matches!(err, RuleError::InvalidPattern { .. }));
}

/// RUL-08: loading from a file reports the file path on failure.
#[test]
fn rul_08_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ratchet_rules.toml");
    std::fs::write(&path, "[[rules]]\nname = \"n\"\npattern = 'x'\n").unwrap();
    assert_eq!(RuleLoader::load_from_file(&path).unwrap().len(), 1);

    let missing = dir.path().join("absent.toml");
    let err = RuleLoader::load_from_file(&missing).unwrap_err();
    assert!(matches!(&err, RuleError::LoadFailed { path, .. } if path.contains("absent.toml")));
}
