//! Independent check rules run over extracted structure

use super::extract::{AttrValue, JsxElement, ParsedCode};
use super::ValidatorOptions;
use crate::catalog::CatalogIndex;
use crate::types::{Diagnostic, DiagnosticKind};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

lazy_static! {
    static ref INLINE_FUNCTION: Regex =
        Regex::new(r"^\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*=>|[A-Za-z_$][\w$]*\s*=>)").unwrap();
    static ref NUMBER_LITERAL: Regex = Regex::new(r"^-?\d+(?:\.\d+)?$").unwrap();
}

/// Collected output of the rules
#[derive(Debug, Default)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
    pub suggestions: Vec<String>,
}

impl Report {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn suggest(&mut self, suggestion: impl Into<String>) {
        self.suggestions.push(suggestion.into());
    }
}

/// What every rule can consult besides the parsed code
pub struct RuleContext<'a> {
    pub catalog: &'a CatalogIndex,
    pub options: &'a ValidatorOptions,
}

pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn enabled(&self, options: &ValidatorOptions) -> bool;

    fn check(&self, code: &ParsedCode, context: &RuleContext<'_>, report: &mut Report);
}

/// Rules in the order they run
pub fn default_rules() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(SyntaxRule),
        Box::new(ImportRule),
        Box::new(LibraryUsageRule),
        Box::new(PropRule),
        Box::new(AccessibilityRule),
        Box::new(PerformanceRule),
        Box::new(BestPracticeRule),
        Box::new(StyleRule),
    ]
}

/// Catalog name for a tag, undoing import aliases (`Btn` -> `Button`)
fn catalog_name(code: &ParsedCode, element: &JsxElement, library: &str) -> String {
    resolve_tag(code, &element.tag, library)
}

fn resolve_tag(code: &ParsedCode, tag: &str, library: &str) -> String {
    let root = tag.split('.').next().unwrap_or(tag);
    let imported = code
        .imports_from(library)
        .flat_map(|i| i.named.iter())
        .find(|n| n.local == root)
        .map(|n| n.imported.as_str());

    match imported {
        Some(name) if name != root => format!("{}{}", name, &tag[root.len()..]),
        _ => tag.to_string(),
    }
}

pub struct SyntaxRule;

impl ValidationRule for SyntaxRule {
    fn name(&self) -> &'static str {
        "syntax"
    }

    fn enabled(&self, _options: &ValidatorOptions) -> bool {
        true
    }

    fn check(&self, code: &ParsedCode, _context: &RuleContext<'_>, report: &mut Report) {
        for (tag, line) in &code.unclosed {
            report.push(
                Diagnostic::error(DiagnosticKind::Syntax, format!("Unclosed tag <{}>", tag)).at_line(*line),
            );
        }
        for (tag, line) in &code.unexpected_closings {
            report.push(
                Diagnostic::error(
                    DiagnosticKind::Syntax,
                    format!("Unexpected closing tag </{}> with no matching open tag", tag),
                )
                .at_line(*line),
            );
        }
    }
}

pub struct ImportRule;

impl ValidationRule for ImportRule {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn enabled(&self, options: &ValidatorOptions) -> bool {
        options.check_imports
    }

    fn check(&self, code: &ParsedCode, context: &RuleContext<'_>, report: &mut Report) {
        if code.elements.is_empty() {
            return;
        }

        if code.imports_from("react").next().is_none() {
            report.push(Diagnostic::warning(
                DiagnosticKind::Import,
                "JSX is used but React is not imported",
            ));
        }

        let mut reported = HashSet::new();
        for element in code.elements.iter().filter(|e| e.is_component()) {
            let binding = element.root_binding();
            if !code.is_bound(binding) && reported.insert(binding) {
                report.push(
                    Diagnostic::error(
                        DiagnosticKind::Import,
                        format!("<{}> is used but '{}' is not imported or declared", element.tag, binding),
                    )
                    .at_line(element.line),
                );
            }
        }

        let used: HashSet<&str> = code.elements.iter().map(JsxElement::root_binding).collect();
        for import in code.imports_from(&context.options.library_module) {
            for named in &import.named {
                if !used.contains(named.local.as_str()) {
                    report.push(
                        Diagnostic::warning(
                            DiagnosticKind::Import,
                            format!(
                                "'{}' is imported from '{}' but never rendered",
                                named.local, import.module
                            ),
                        )
                        .at_line(import.line),
                    );
                }
            }
        }
    }
}

/// Structural requirements of specific library components
pub struct LibraryUsageRule;

const REQUIRED_ANCESTORS: &[(&str, &str)] = &[("Form.Item", "Form"), ("Col", "Row")];
const DEPRECATED: &[(&str, &str)] = &[("Tabs.TabPane", "use the `items` prop of <Tabs> instead")];

impl ValidationRule for LibraryUsageRule {
    fn name(&self) -> &'static str {
        "library-usage"
    }

    fn enabled(&self, options: &ValidatorOptions) -> bool {
        options.check_props
    }

    fn check(&self, code: &ParsedCode, context: &RuleContext<'_>, report: &mut Report) {
        let library = context.options.library_module.as_str();
        let names: Vec<String> = code
            .elements
            .iter()
            .map(|e| catalog_name(code, e, library))
            .collect();

        for (component, ancestor) in REQUIRED_ANCESTORS {
            let orphans: Vec<&JsxElement> = code
                .elements
                .iter()
                .zip(&names)
                .filter(|(e, name)| {
                    name == component
                        && !e.ancestors.iter().any(|a| resolve_tag(code, a, library) == *ancestor)
                })
                .map(|(e, _)| e)
                .collect();

            // One finding per component kind, pointing at the first offender
            if let Some(first) = orphans.first() {
                let occurrences = if orphans.len() > 1 {
                    format!(" ({} occurrences)", orphans.len())
                } else {
                    String::new()
                };
                report.push(
                    Diagnostic::error(
                        DiagnosticKind::AntdUsage,
                        format!("<{}> must be placed inside <{}>{}", component, ancestor, occurrences),
                    )
                    .at_line(first.line),
                );
            }
        }

        for (component, advice) in DEPRECATED {
            if let Some((element, _)) = code.elements.iter().zip(&names).find(|(_, name)| name == component) {
                report.push(
                    Diagnostic::warning(
                        DiagnosticKind::AntdUsage,
                        format!("<{}> is deprecated; {}", component, advice),
                    )
                    .at_line(element.line),
                );
            }
        }
    }
}

/// Enumerated property values checked against the catalog
pub struct PropRule;

impl PropRule {
    /// Literal text of a value, or None when it is computed at runtime
    fn literal(value: &AttrValue) -> Option<String> {
        match value {
            AttrValue::Str(s) => Some(s.clone()),
            AttrValue::Expr(expr) => {
                let expr = expr.trim();
                if NUMBER_LITERAL.is_match(expr) {
                    return Some(expr.to_string());
                }
                let quoted = expr.len() >= 2
                    && ((expr.starts_with('\'') && expr.ends_with('\''))
                        || (expr.starts_with('"') && expr.ends_with('"')));
                quoted.then(|| expr[1..expr.len() - 1].to_string())
            }
            AttrValue::Flag => None,
        }
    }
}

impl ValidationRule for PropRule {
    fn name(&self) -> &'static str {
        "props"
    }

    fn enabled(&self, options: &ValidatorOptions) -> bool {
        options.check_props
    }

    fn check(&self, code: &ParsedCode, context: &RuleContext<'_>, report: &mut Report) {
        let library = context.options.library_module.as_str();
        for element in code.elements.iter().filter(|e| e.is_component()) {
            let name = catalog_name(code, element, library);
            let Some(entry) = context.catalog.get(&name) else {
                continue;
            };

            for attribute in &element.attributes {
                let Some(prop) = entry.property(&attribute.name) else {
                    continue;
                };
                let allowed = prop.enum_values();
                if allowed.is_empty() {
                    continue;
                }
                let Some(value) = Self::literal(&attribute.value) else {
                    continue;
                };
                if !allowed.contains(&value) {
                    report.push(
                        Diagnostic::error(
                            DiagnosticKind::Prop,
                            format!(
                                "Invalid value '{}' for prop '{}' on <{}>; expected {}",
                                value, attribute.name, element.tag, prop.type_description
                            ),
                        )
                        .at_line(attribute.line),
                    );
                }
            }
        }
    }
}

pub struct AccessibilityRule;

const IMAGE_TAGS: &[&str] = &["img", "Image"];
const INTERACTIVE_TAGS: &[&str] = &["button", "a", "Button"];
const LABEL_ATTRIBUTES: &[&str] = &["aria-label", "aria-labelledby", "title"];

impl ValidationRule for AccessibilityRule {
    fn name(&self) -> &'static str {
        "accessibility"
    }

    fn enabled(&self, options: &ValidatorOptions) -> bool {
        options.check_accessibility
    }

    fn check(&self, code: &ParsedCode, _context: &RuleContext<'_>, report: &mut Report) {
        for element in &code.elements {
            if element.has_spread() {
                continue;
            }
            let tag = element.tag.as_str();

            // Avatars only carry an image when given `src`
            let image_like = IMAGE_TAGS.contains(&tag) || (tag == "Avatar" && element.has_attribute("src"));
            if image_like && !element.has_attribute("alt") {
                report.push(
                    Diagnostic::warning(
                        DiagnosticKind::Accessibility,
                        format!("<{}> has no alt text", tag),
                    )
                    .at_line(element.line),
                );
            }

            if INTERACTIVE_TAGS.contains(&tag)
                && !element.has_content()
                && !LABEL_ATTRIBUTES.iter().any(|a| element.has_attribute(a))
            {
                report.push(
                    Diagnostic::warning(
                        DiagnosticKind::Accessibility,
                        format!("<{}> has no text content or accessible label", tag),
                    )
                    .at_line(element.line),
                );
            }
        }
    }
}

pub struct PerformanceRule;

impl ValidationRule for PerformanceRule {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn enabled(&self, options: &ValidatorOptions) -> bool {
        options.check_performance
    }

    fn check(&self, code: &ParsedCode, _context: &RuleContext<'_>, report: &mut Report) {
        for element in &code.elements {
            for attribute in &element.attributes {
                let is_event = attribute.name.len() > 2
                    && attribute.name.starts_with("on")
                    && attribute.name[2..].starts_with(|c: char| c.is_ascii_uppercase());
                let AttrValue::Expr(expr) = &attribute.value else {
                    continue;
                };
                if is_event && INLINE_FUNCTION.is_match(expr) {
                    report.push(
                        Diagnostic::warning(
                            DiagnosticKind::Performance,
                            format!(
                                "Inline function in {} on <{}> is recreated on every render; consider useCallback",
                                attribute.name, element.tag
                            ),
                        )
                        .at_line(attribute.line),
                    );
                }
            }
        }
    }
}

pub struct BestPracticeRule;

impl ValidationRule for BestPracticeRule {
    fn name(&self) -> &'static str {
        "best-practices"
    }

    fn enabled(&self, options: &ValidatorOptions) -> bool {
        options.check_best_practices
    }

    fn check(&self, code: &ParsedCode, context: &RuleContext<'_>, report: &mut Report) {
        // A declaration is a component when JSX appears before the next declaration
        let starts: BTreeSet<usize> = code.components.iter().map(|c| c.line).collect();
        for decl in &code.components {
            let end = starts.range(decl.line + 1..).next().copied().unwrap_or(usize::MAX);
            let renders = code.elements.iter().any(|e| e.line >= decl.line && e.line < end);
            if renders && !decl.name.starts_with(|c: char| c.is_ascii_uppercase()) {
                report.push(
                    Diagnostic::warning(
                        DiagnosticKind::BestPractice,
                        format!("Component '{}' should start with an uppercase letter", decl.name),
                    )
                    .at_line(decl.line),
                );
            }
        }

        let tags = code.tag_count();
        if tags > context.options.max_tags {
            report.suggest(format!(
                "This file renders {} elements; consider splitting it into smaller components",
                tags
            ));
        }
    }
}

/// Oversized inline style objects
pub struct StyleRule;

impl ValidationRule for StyleRule {
    fn name(&self) -> &'static str {
        "style"
    }

    fn enabled(&self, options: &ValidatorOptions) -> bool {
        options.check_best_practices
    }

    fn check(&self, code: &ParsedCode, context: &RuleContext<'_>, report: &mut Report) {
        for element in &code.elements {
            let Some(style) = element.attribute("style") else {
                continue;
            };
            let Some(body) = style.object_literal() else {
                continue;
            };
            let declarations = body.split(',').filter(|d| d.contains(':')).count();
            if declarations > context.options.max_inline_style_declarations {
                report.push(
                    Diagnostic::warning(
                        DiagnosticKind::Style,
                        format!(
                            "Inline style on <{}> has {} declarations; move it to a stylesheet",
                            element.tag, declarations
                        ),
                    )
                    .at_line(style.line),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::extract::extract_structure;

    fn run(rule: &dyn ValidationRule, source: &str) -> Report {
        let catalog = CatalogIndex::builtin();
        let options = ValidatorOptions::default();
        let context = RuleContext {
            catalog: &catalog,
            options: &options,
        };
        let code = extract_structure(source).unwrap();
        let mut report = Report::default();
        rule.check(&code, &context, &mut report);
        report
    }

    #[test]
    fn test_syntax_rule() {
        let report = run(&SyntaxRule, "const A = () => (\n  <Card>\n    <Space>\n  </Card>\n);\n");
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].line, Some(3));
        assert!(report.diagnostics[0].is_error());
    }

    #[test]
    fn test_import_rule() {
        let source = "import { Button, Tag } from 'antd';\nconst A = () => <Button>Go</Button>;\nconst B = () => <Card />;\n";
        let report = run(&ImportRule, source);
        let messages: Vec<&str> = report.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(report.diagnostics.len(), 3, "{:?}", messages);

        // Missing React import is a warning of an error kind
        assert!(!report.diagnostics[0].is_error());
        assert!(report.diagnostics[0].kind.is_error_kind());
        assert!(report.diagnostics[1].is_error());
        assert!(report.diagnostics[1].message.contains("'Card'"));
        assert!(report.diagnostics[2].message.contains("'Tag'"));
    }

    #[test]
    fn test_import_rule_accepts_aliases_and_local_components() {
        let source = "import React from 'react';\nimport { Button as Btn } from 'antd';\nconst Row = () => <Btn>Go</Btn>;\nconst Page = () => <Row />;\n";
        assert!(run(&ImportRule, source).diagnostics.is_empty());
    }

    #[test]
    fn test_library_usage_rule() {
        let source = "const A = () => (\n  <div>\n    <Form.Item label=\"a\" />\n    <Form.Item label=\"b\" />\n  </div>\n);\n";
        let report = run(&LibraryUsageRule, source);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::AntdUsage);
        assert_eq!(report.diagnostics[0].line, Some(3));
        assert!(report.diagnostics[0].message.contains("2 occurrences"));

        let nested = "const A = () => (\n  <Form>\n    <Flex>\n      <Form.Item />\n    </Flex>\n  </Form>\n);\n";
        assert!(run(&LibraryUsageRule, nested).diagnostics.is_empty());

        let tabs = "const A = () => <Tabs><Tabs.TabPane tab=\"x\" /></Tabs>;\n";
        let report = run(&LibraryUsageRule, tabs);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(!report.diagnostics[0].is_error());
    }

    #[test]
    fn test_library_usage_rule_resolves_aliased_ancestors() {
        let source = "import { Form as AntForm } from 'antd';\nconst A = () => (\n  <AntForm>\n    <AntForm.Item label=\"a\" />\n  </AntForm>\n);\n";
        assert!(run(&LibraryUsageRule, source).diagnostics.is_empty());

        let orphan = "import { Form as AntForm } from 'antd';\nconst A = () => <div><AntForm.Item /></div>;\n";
        let report = run(&LibraryUsageRule, orphan);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("<Form.Item>"));
    }

    #[test]
    fn test_prop_rule() {
        let source = "import { Button, Typography } from 'antd';\nconst A = () => (\n  <>\n    <Button size=\"huge\" type=\"primary\">Go</Button>\n    <Typography.Title level={7}>T</Typography.Title>\n    <Typography.Title level={2}>T</Typography.Title>\n    <Button size={size}>Dyn</Button>\n  </>\n);\n";
        let report = run(&PropRule, source);
        assert_eq!(report.diagnostics.len(), 2);
        assert!(report.diagnostics[0].message.contains("'huge'"));
        assert_eq!(report.diagnostics[0].line, Some(4));
        assert!(report.diagnostics[1].message.contains("'7'"));
    }

    #[test]
    fn test_prop_rule_resolves_aliases() {
        let source = "import { Button as Btn } from 'antd';\nconst A = () => <Btn size=\"tiny\">Go</Btn>;\n";
        assert_eq!(run(&PropRule, source).diagnostics.len(), 1);
    }

    #[test]
    fn test_accessibility_rule() {
        let source = "const A = () => (\n  <div>\n    <img src=\"a.png\" />\n    <Image src=\"b.png\" alt=\"B\" />\n    <Button icon={<SearchOutlined />} />\n    <Button aria-label=\"Search\" icon={<SearchOutlined />} />\n    <Button><span>Go</span></Button>\n    <Avatar>AB</Avatar>\n  </div>\n);\n";
        let report = run(&AccessibilityRule, source);
        let lines: Vec<Option<usize>> = report.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![Some(3), Some(5)]);
    }

    #[test]
    fn test_performance_rule() {
        let source = "const A = () => (\n  <div>\n    <Button onClick={() => go()}>A</Button>\n    <Button onClick={function () { go(); }}>B</Button>\n    <Button onClick={handleClick}>C</Button>\n    <Input onChange={e => set(e)} />\n  </div>\n);\n";
        let report = run(&PerformanceRule, source);
        let lines: Vec<Option<usize>> = report.diagnostics.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![Some(3), Some(4), Some(6)]);
    }

    #[test]
    fn test_best_practice_rule() {
        let source = "const handler = () => 1;\nconst card = () => <div>x</div>;\nexport const Page = () => <div>y</div>;\n";
        let report = run(&BestPracticeRule, source);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("'card'"));
        assert!(report.suggestions.is_empty());

        let many: String = (0..11).map(|i| format!("<span>{}</span>", i)).collect();
        let source = format!("const Page = () => (<div>{}</div>);\n", many);
        let report = run(&BestPracticeRule, &source);
        assert_eq!(report.suggestions.len(), 1);
    }

    #[test]
    fn test_style_rule() {
        let source = "const A = () => (\n  <div style={{ a: 1, b: 2, c: 3, d: 4, e: 5, f: 6 }}>\n    <span style={{ color: 'red' }}>x</span>\n  </div>\n);\n";
        let report = run(&StyleRule, source);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].kind, DiagnosticKind::Style);
    }
}
