//! Static validation of generated component source

pub mod extract;
pub mod rules;

use crate::catalog::CatalogIndex;
use crate::types::{Diagnostic, DiagnosticKind, Severity};
use extract::extract_structure;
use rules::{default_rules, Report, RuleContext, ValidationRule};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which rule groups run. Syntax checks always run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    pub check_imports: bool,
    /// Property values and library usage
    pub check_props: bool,
    pub check_accessibility: bool,
    pub check_performance: bool,
    /// Naming, file size and inline styles
    pub check_best_practices: bool,
    /// Module whose named imports are treated as library components
    pub library_module: String,
    pub max_tags: usize,
    pub max_inline_style_declarations: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            check_imports: true,
            check_props: true,
            check_accessibility: true,
            check_performance: true,
            check_best_practices: true,
            library_module: "antd".to_string(),
            max_tags: 10,
            max_inline_style_declarations: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Error-severity findings and warnings of an error kind
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub suggestions: Vec<String>,
    pub score: u32,
}

impl ValidationResult {
    fn from_report(report: Report) -> Self {
        let score = quality_score(&report.diagnostics);
        let is_valid = !report.diagnostics.iter().any(Diagnostic::is_error);

        let (errors, warnings): (Vec<Diagnostic>, Vec<Diagnostic>) = report
            .diagnostics
            .into_iter()
            .partition(|d| d.is_error() || d.kind.is_error_kind());

        Self {
            is_valid,
            errors,
            warnings,
            suggestions: report.suggestions,
            score,
        }
    }

    fn parse_failure(diagnostic: Diagnostic) -> Self {
        Self {
            is_valid: false,
            errors: vec![diagnostic],
            warnings: Vec::new(),
            suggestions: Vec::new(),
            score: 0,
        }
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics().filter(|d| d.kind == kind).count()
    }
}

/// 100, less 20 per error, 5 per warning of an error kind and 2 per other warning
pub fn quality_score(diagnostics: &[Diagnostic]) -> u32 {
    let penalty: u32 = diagnostics
        .iter()
        .map(|d| match d.severity {
            Severity::Error => 20,
            Severity::Warning if d.kind.is_error_kind() => 5,
            Severity::Warning => 2,
        })
        .sum();
    100u32.saturating_sub(penalty)
}

pub struct Validator {
    catalog: Arc<CatalogIndex>,
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(CatalogIndex::builtin()))
    }

    pub fn with_catalog(catalog: Arc<CatalogIndex>) -> Self {
        Self {
            catalog,
            rules: default_rules(),
        }
    }

    /// Append a rule after the built-in ones
    pub fn with_rule(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn validate(&self, source_text: &str, options: &ValidatorOptions) -> ValidationResult {
        let code = match extract_structure(source_text) {
            Ok(code) => code,
            Err(anomaly) => {
                log::debug!("Source could not be parsed: {}", anomaly);
                let mut diagnostic = Diagnostic::error(
                    DiagnosticKind::Syntax,
                    format!("Could not parse source: {}", anomaly),
                );
                diagnostic.line = anomaly.line();
                return ValidationResult::parse_failure(diagnostic);
            }
        };

        let context = RuleContext {
            catalog: &self.catalog,
            options,
        };
        let mut report = Report::default();
        for rule in self.rules.iter().filter(|r| r.enabled(options)) {
            let before = report.diagnostics.len();
            rule.check(&code, &context, &mut report);
            log::trace!("Rule '{}' reported {} findings", rule.name(), report.diagnostics.len() - before);
        }

        let result = ValidationResult::from_report(report);
        log::debug!(
            "Validation finished: {} errors, {} warnings, score {}",
            result.errors.len(),
            result.warnings.len(),
            result.score
        );
        result
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn validate(source_text: &str, options: &ValidatorOptions) -> ValidationResult {
    Validator::new().validate(source_text, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::extract::ParsedCode;

    const VALID: &str = r#"import React from 'react';
import { Button } from 'antd';

export const PrimaryButton: React.FC = () => {
  return (
    <Button size="middle">Submit</Button>
  );
};

export default PrimaryButton;
"#;

    #[test]
    fn test_clean_source_scores_100() {
        let result = validate(VALID, &ValidatorOptions::default());
        assert!(result.is_valid);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_form_item_outside_form() {
        let source = r#"import React from 'react';
import { Form, Input } from 'antd';

export const EmailField: React.FC = () => {
  return (
    <Form.Item label="Email">
      <Input placeholder="Email" />
    </Form.Item>
  );
};
"#;
        let result = validate(source, &ValidatorOptions::default());
        assert_eq!(result.count_of(DiagnosticKind::AntdUsage), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].is_error());
        assert!(!result.is_valid);
        assert_eq!(result.score, 80);
    }

    #[test]
    fn test_score_floor() {
        let errors: Vec<Diagnostic> = (0..6)
            .map(|i| Diagnostic::error(DiagnosticKind::Syntax, format!("e{}", i)))
            .collect();
        assert_eq!(quality_score(&errors), 0);
        assert_eq!(quality_score(&[]), 100);
        assert_eq!(
            quality_score(&[
                Diagnostic::warning(DiagnosticKind::Import, "a"),
                Diagnostic::warning(DiagnosticKind::Accessibility, "b"),
            ]),
            93
        );
    }

    #[test]
    fn test_placement_of_findings() {
        let source = "const A = () => <img src=\"x.png\" />;\n";
        let result = validate(source, &ValidatorOptions::default());
        // Missing React import: warning severity, error kind
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, DiagnosticKind::Import);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, DiagnosticKind::Accessibility);
        assert_eq!(result.score, 93);
    }

    #[test]
    fn test_options_disable_rules() {
        let source = "const A = () => <img src=\"x.png\" />;\n";
        let options = ValidatorOptions {
            check_imports: false,
            check_accessibility: false,
            ..Default::default()
        };
        let result = validate(source, &options);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_parse_anomaly_is_single_error() {
        let result = validate("", &ValidatorOptions::default());
        assert!(!result.is_valid);
        assert_eq!(result.score, 0);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, DiagnosticKind::Syntax);

        let result = validate("const A = () => <Button type=\"primary", &ValidatorOptions::default());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].line, Some(1));
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_regex_and_generics_validate_cleanly() {
        let source = r#"import React from 'react';
import { Typography } from 'antd';

const clean = (s: string) => s.replace(/"/g, '');
const first = <T,>(xs: T[]) => xs[0];

export const Caption: React.FC = () => {
  return <Typography.Text>{clean(first(['"a"']))}</Typography.Text>;
};
"#;
        let result = validate(source, &ValidatorOptions::default());
        assert!(result.is_valid, "{:?}", result.errors);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_deep_nesting_is_single_error() {
        let source = format!("const A = () => {}{};\n", "<div>".repeat(2000), "</div>".repeat(2000));
        let result = validate(&source, &ValidatorOptions::default());
        assert!(!result.is_valid);
        assert_eq!(result.score, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("nested deeper"));
    }

    struct NoDivs;

    impl ValidationRule for NoDivs {
        fn name(&self) -> &'static str {
            "no-divs"
        }

        fn enabled(&self, _options: &ValidatorOptions) -> bool {
            true
        }

        fn check(&self, code: &ParsedCode, _context: &RuleContext<'_>, report: &mut Report) {
            for element in code.elements.iter().filter(|e| e.tag == "div") {
                report.push(Diagnostic::warning(DiagnosticKind::BestPractice, "prefer Flex").at_line(element.line));
            }
        }
    }

    #[test]
    fn test_custom_rule() {
        let validator = Validator::new().with_rule(NoDivs);
        assert_eq!(validator.rule_names().last(), Some(&"no-divs"));

        let source = "import React from 'react';\nconst A = () => <div>x</div>;\n";
        let result = validator.validate(source, &ValidatorOptions::default());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.score, 98);
    }
}
