//! TSX source generation from a mapped component tree

use crate::types::*;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub const DEFAULT_COMPONENT_NAME: &str = "GeneratedComponent";

lazy_static! {
    static ref TAG_NAME: Regex = Regex::new(r"^[A-Z][A-Za-z0-9]*(\.[A-Z][A-Za-z0-9]*)*$").unwrap();
    static ref ATTRIBUTE_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").unwrap();
    static ref JS_IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    #[error("no catalog entry for component '{component}' (node {node_id})")]
    MissingEntry { component: String, node_id: String },

    #[error("'{tag}' is not a valid JSX tag name")]
    InvalidTag { tag: String },

    #[error("'{name}' is not a valid attribute name on {tag}")]
    InvalidAttribute { tag: String, name: String },

    #[error("component tree nested deeper than {max_depth} levels")]
    TooDeep { max_depth: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisOptions {
    pub indent_width: usize,
    pub max_depth: usize,
    /// Append `export default <Name>;`
    pub default_export: bool,
    /// Annotate the component as `React.FC`
    pub typed: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            max_depth: 64,
            default_export: true,
            typed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisOutput {
    pub component_name: String,
    pub source_text: String,
    /// Import lines in the order they appear in the source
    pub imports: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn synthesize(tree: &MappedTree, component_name: &str, options: &SynthesisOptions) -> SynthesisOutput {
    CodeSynthesizer::new(options.clone()).synthesize(tree, component_name)
}

pub struct CodeSynthesizer {
    options: SynthesisOptions,
    output: String,
    /// module -> bindings
    imports: BTreeMap<String, BTreeSet<String>>,
}

impl CodeSynthesizer {
    pub fn new(options: SynthesisOptions) -> Self {
        Self {
            options,
            output: String::new(),
            imports: BTreeMap::new(),
        }
    }

    /// Always produces source text; failures degrade to a visible error component.
    pub fn synthesize(&mut self, tree: &MappedTree, component_name: &str) -> SynthesisOutput {
        self.output.clear();
        self.imports.clear();

        let name = component_identifier(component_name);
        let mut diagnostics = Vec::new();

        let body = match &tree.root {
            None => {
                log::warn!("Mapped tree is empty, emitting a null component");
                diagnostics.push(Diagnostic::warning(
                    DiagnosticKind::Synthesis,
                    "No components found to render; the generated component returns null",
                ));
                None
            }
            Some(root) => match self.write_element(root, 0) {
                Ok(()) => Some(std::mem::take(&mut self.output)),
                Err(e) => {
                    log::error!("Code generation failed for {}: {}", name, e);
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticKind::Synthesis,
                        format!("Code generation failed: {}", e),
                    ));
                    self.imports.clear();
                    Some(self.fallback_element(&e))
                }
            },
        };

        let imports = self.import_lines();
        let source_text = self.assemble(&name, &imports, body.as_deref());

        log::debug!(
            "Synthesized {} ({} import lines, {} bytes)",
            name,
            imports.len(),
            source_text.len()
        );

        SynthesisOutput {
            component_name: name,
            source_text,
            imports,
            diagnostics,
        }
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(level * self.options.indent_width)
    }

    fn write_element(&mut self, node: &MappedComponentConfig, depth: usize) -> Result<(), SynthesisError> {
        if depth >= self.options.max_depth {
            return Err(SynthesisError::TooDeep {
                max_depth: self.options.max_depth,
            });
        }

        let entry = node.entry.as_ref().ok_or_else(|| SynthesisError::MissingEntry {
            component: node.component.clone(),
            node_id: node.node_id.clone(),
        })?;
        if !TAG_NAME.is_match(&entry.name) {
            return Err(SynthesisError::InvalidTag {
                tag: entry.name.clone(),
            });
        }

        self.imports
            .entry(entry.module.clone())
            .or_default()
            .insert(entry.import_name.clone());

        let tag = entry.name.as_str();
        let mut open = format!("<{}", tag);
        for (name, value) in &node.props {
            if !ATTRIBUTE_NAME.is_match(name) {
                return Err(SynthesisError::InvalidAttribute {
                    tag: tag.to_string(),
                    name: name.clone(),
                });
            }
            if let Some(attribute) = render_attribute(name, value) {
                open.push(' ');
                open.push_str(&attribute);
            }
        }
        if let Some(style) = node.style.as_ref().filter(|s| !s.is_empty()) {
            open.push_str(" style=");
            open.push_str(&render_style(style));
        }

        // Element body sits two levels in: component body, then `return (`
        let indent = self.indent(depth + 2);
        let text = node.text.as_deref().map(render_text);

        if node.children.is_empty() {
            match text {
                Some(text) => self.output.push_str(&format!("{}{}>{}</{}>\n", indent, open, text, tag)),
                None => self.output.push_str(&format!("{}{} />\n", indent, open)),
            }
            return Ok(());
        }

        self.output.push_str(&format!("{}{}>\n", indent, open));
        if let Some(text) = text {
            self.output.push_str(&format!("{}{}\n", self.indent(depth + 3), text));
        }
        for child in &node.children {
            self.write_element(child, depth + 1)?;
        }
        self.output.push_str(&format!("{}</{}>\n", indent, tag));
        Ok(())
    }

    fn fallback_element(&self, error: &SynthesisError) -> String {
        let message = Value::String(format!("Code generation failed: {}", error));
        format!(
            "{}<div style={{{{ color: 'red' }}}}>{{{}}}</div>\n",
            self.indent(2),
            message
        )
    }

    fn import_lines(&self) -> Vec<String> {
        let mut lines = vec!["import React from 'react';".to_string()];
        for (module, bindings) in &self.imports {
            let bindings: Vec<&str> = bindings.iter().map(String::as_str).collect();
            lines.push(format!("import {{ {} }} from '{}';", bindings.join(", "), module));
        }
        lines
    }

    fn assemble(&self, name: &str, imports: &[String], body: Option<&str>) -> String {
        let mut source = String::new();
        for line in imports {
            source.push_str(line);
            source.push('\n');
        }
        source.push('\n');
        if self.options.typed {
            source.push_str(&format!("export const {}: React.FC = () => {{\n", name));
        } else {
            source.push_str(&format!("export const {} = () => {{\n", name));
        }
        match body {
            Some(jsx) => {
                source.push_str(&format!("{}return (\n", self.indent(1)));
                source.push_str(jsx);
                source.push_str(&format!("{});\n", self.indent(1)));
            }
            None => source.push_str(&format!("{}return null;\n", self.indent(1))),
        }
        source.push_str("};\n");
        if self.options.default_export {
            source.push_str(&format!("\nexport default {};\n", name));
        }
        source
    }
}

/// PascalCase identifier for the generated component
pub fn component_identifier(raw: &str) -> String {
    let mut name: String = raw
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if name.is_empty() {
        return DEFAULT_COMPONENT_NAME.to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "Generated");
    }
    name
}

/// `name="v"`, bare `name` for true, `name={literal}` otherwise; null is omitted
fn render_attribute(name: &str, value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(true) => Some(name.to_string()),
        Value::String(s) if !s.contains(['"', '\\', '\n', '{', '}']) => Some(format!("{}=\"{}\"", name, s)),
        other => Some(format!("{}={{{}}}", name, other)),
    }
}

fn render_style(style: &PropMap) -> String {
    let fields: Vec<String> = style
        .iter()
        .map(|(key, value)| {
            let key = if JS_IDENTIFIER.is_match(key) {
                key.clone()
            } else {
                js_string(key)
            };
            format!("{}: {}", key, js_literal(value))
        })
        .collect();
    format!("{{{{ {} }}}}", fields.join(", "))
}

fn js_literal(value: &Value) -> String {
    match value {
        Value::String(s) => js_string(s),
        other => other.to_string(),
    }
}

fn js_string(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n");
    format!("'{}'", escaped)
}

/// JSX text; anything JSX would reinterpret goes through an expression container
fn render_text(text: &str) -> String {
    let needs_expression = text.is_empty()
        || text.contains(['{', '}', '<', '>', '\n'])
        || text.trim() != text;
    if needs_expression {
        format!("{{{}}}", Value::String(text.to_string()))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogIndex;
    use serde_json::json;

    fn mapped(catalog: &CatalogIndex, component: &str) -> MappedComponentConfig {
        MappedComponentConfig {
            node_id: format!("id-{}", component),
            node_name: component.to_string(),
            component: component.to_string(),
            entry: catalog.get(component),
            confidence: 80,
            props: PropMap::new(),
            style: None,
            text: None,
            children: Vec::new(),
        }
    }

    fn tree(root: MappedComponentConfig) -> MappedTree {
        MappedTree {
            root: Some(root),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn test_button_scenario() {
        let catalog = CatalogIndex::builtin();
        let mut button = mapped(&catalog, "Button");
        button.props.insert("size".to_string(), json!("middle"));
        button.text = Some("Submit".to_string());

        let output = synthesize(&tree(button), "Primary Button", &SynthesisOptions::default());
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.component_name, "PrimaryButton");
        assert_eq!(
            output.imports,
            vec![
                "import React from 'react';".to_string(),
                "import { Button } from 'antd';".to_string()
            ]
        );

        let expected = "\
import React from 'react';
import { Button } from 'antd';

export const PrimaryButton: React.FC = () => {
  return (
    <Button size=\"middle\">Submit</Button>
  );
};

export default PrimaryButton;
";
        assert_eq!(output.source_text, expected);
    }

    #[test]
    fn test_empty_tree_returns_null() {
        let output = synthesize(&MappedTree::default(), "Empty", &SynthesisOptions::default());
        assert!(output.source_text.contains("return null;"));
        assert_eq!(output.imports, vec!["import React from 'react';".to_string()]);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].kind, DiagnosticKind::Synthesis);
    }

    #[test]
    fn test_missing_entry_falls_back() {
        let catalog = CatalogIndex::builtin();
        let mut root = mapped(&catalog, "Flex");
        root.children.push(mapped(&catalog, "Carousel"));

        let output = synthesize(&tree(root), "Broken", &SynthesisOptions::default());
        assert!(output
            .source_text
            .contains("<div style={{ color: 'red' }}>{\"Code generation failed: no catalog entry"));
        assert!(!output.source_text.contains("<Flex"));
        assert_eq!(output.imports.len(), 1);
        assert_eq!(output.diagnostics.len(), 1);
        assert!(!output.diagnostics[0].is_error());
    }

    #[test]
    fn test_depth_limit_falls_back() {
        let catalog = CatalogIndex::builtin();
        let mut node = mapped(&catalog, "Flex");
        for _ in 0..5 {
            let mut parent = mapped(&catalog, "Flex");
            parent.children.push(node);
            node = parent;
        }
        let options = SynthesisOptions {
            max_depth: 3,
            ..Default::default()
        };
        let output = synthesize(&tree(node), "Deep", &options);
        assert!(output.source_text.contains("nested deeper than 3 levels"));
    }

    #[test]
    fn test_imports_are_merged_per_module() {
        let catalog = CatalogIndex::builtin();
        let mut root = mapped(&catalog, "Flex");
        root.props.insert("vertical".to_string(), json!(true));
        root.props.insert("gap".to_string(), json!(16));
        let mut title = mapped(&catalog, "Typography.Title");
        title.props.insert("level".to_string(), json!(3));
        title.text = Some("Welcome".to_string());
        let mut body = mapped(&catalog, "Typography.Text");
        body.text = Some("Hello".to_string());
        root.children = vec![title, body];

        let output = synthesize(&tree(root), "welcome card", &SynthesisOptions::default());
        assert_eq!(output.imports[1], "import { Flex, Typography } from 'antd';");
        assert!(output.source_text.contains("    <Flex gap={16} vertical>\n"));
        assert!(output
            .source_text
            .contains("      <Typography.Title level={3}>Welcome</Typography.Title>\n"));
        assert!(output.source_text.contains("    </Flex>\n"));
    }

    #[test]
    fn test_attribute_rendering() {
        assert_eq!(render_attribute("danger", &json!(true)), Some("danger".to_string()));
        assert_eq!(render_attribute("block", &json!(false)), Some("block={false}".to_string()));
        assert_eq!(render_attribute("gap", &json!(8)), Some("gap={8}".to_string()));
        assert_eq!(render_attribute("alt", &json!("say \"hi\"")), Some(r#"alt={"say \"hi\""}"#.to_string()));
        assert_eq!(render_attribute("src", &Value::Null), None);
    }

    #[test]
    fn test_style_rendering() {
        let mut style = PropMap::new();
        style.insert("backgroundColor".to_string(), json!("#ffffff"));
        style.insert("borderRadius".to_string(), json!(8));
        assert_eq!(render_style(&style), "{{ backgroundColor: '#ffffff', borderRadius: 8 }}");
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(render_text("Submit"), "Submit");
        assert_eq!(render_text("{count} items"), r#"{"{count} items"}"#);
        assert_eq!(render_text(" padded"), r#"{" padded"}"#);
    }

    #[test]
    fn test_component_identifier() {
        assert_eq!(component_identifier("primary button"), "PrimaryButton");
        assert_eq!(component_identifier("login-form_v2"), "LoginFormV2");
        assert_eq!(component_identifier("404 page"), "Generated404Page");
        assert_eq!(component_identifier("  --  "), DEFAULT_COMPONENT_NAME);
    }

    #[test]
    fn test_untyped_output() {
        let options = SynthesisOptions {
            typed: false,
            default_export: false,
            ..Default::default()
        };
        let output = synthesize(&MappedTree::default(), "Plain", &options);
        assert!(output.source_text.contains("export const Plain = () => {\n"));
        assert!(!output.source_text.contains("export default"));
    }

    #[test]
    fn test_self_closing_element() {
        let catalog = CatalogIndex::builtin();
        let mut input = mapped(&catalog, "Input");
        input.props.insert("placeholder".to_string(), json!("Email"));
        let output = synthesize(&tree(input), "EmailField", &SynthesisOptions::default());
        assert!(output.source_text.contains("    <Input placeholder=\"Email\" />\n"));
    }
}
