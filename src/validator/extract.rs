//! Lightweight structural extraction from TSX/JSX source text
//!
//! This is not a grammar. Imports and component declarations are matched with
//! regular expressions; tags are found by a character scanner that knows
//! enough about strings, comments and expression containers to pair open and
//! close tags and attribute values.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref IMPORT_FROM: Regex =
        Regex::new(r#"(?m)^[ \t]*(?P<kw>import)\s+(?:type\s+)?(?P<clause>[^;'"]*?)\s+from\s+['"](?P<module>[^'"]+)['"]"#)
            .unwrap();
    static ref IMPORT_BARE: Regex = Regex::new(r#"(?m)^[ \t]*(?P<kw>import)\s+['"](?P<module>[^'"]+)['"]"#).unwrap();
    static ref COMPONENT_DECL: Regex = Regex::new(
        r"(?m)^(?:export\s+)?(?:default\s+)?(?:(?:const|let)\s+(?P<var>[A-Za-z_$][\w$]*)\s*(?::\s*[\w.<>]+\s*)?=\s*(?:\([^)]*\)|[A-Za-z_$][\w$]*)\s*=>|function\s+(?P<func>[A-Za-z_$][\w$]*)\s*\()"
    )
    .unwrap();
}

/// Deepest tag nesting the scanner follows before giving up
pub const MAX_NESTING_DEPTH: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAnomaly {
    #[error("source text is empty")]
    Empty,

    #[error("unterminated tag <{tag}> starting on line {line}")]
    UnterminatedTag { tag: String, line: usize },

    #[error("unterminated value for attribute '{name}' on <{tag}> (line {line})")]
    UnterminatedAttribute { tag: String, name: String, line: usize },

    #[error("unexpected character '{found}' in tag <{tag}> on line {line}")]
    MalformedTag { tag: String, found: char, line: usize },

    #[error("unterminated string literal starting on line {line}")]
    UnterminatedString { line: usize },

    #[error("unterminated expression starting on line {line}")]
    UnterminatedExpression { line: usize },

    #[error("unterminated regular expression starting on line {line}")]
    UnterminatedRegex { line: usize },

    #[error("unbalanced closing brace on line {line}")]
    UnbalancedBrace { line: usize },

    #[error("tags nested deeper than {} levels on line {line}", MAX_NESTING_DEPTH)]
    TooDeep { line: usize },
}

impl ParseAnomaly {
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::UnterminatedTag { line, .. }
            | Self::UnterminatedAttribute { line, .. }
            | Self::MalformedTag { line, .. }
            | Self::UnterminatedString { line }
            | Self::UnterminatedExpression { line }
            | Self::UnterminatedRegex { line }
            | Self::UnbalancedBrace { line }
            | Self::TooDeep { line } => Some(*line),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImport {
    pub imported: String,
    pub local: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportDecl {
    pub module: String,
    pub default: Option<String>,
    pub namespace: Option<String>,
    pub named: Vec<NamedImport>,
    pub line: usize,
}

impl ImportDecl {
    /// Every local binding the statement introduces
    pub fn locals(&self) -> impl Iterator<Item = &str> {
        self.default
            .iter()
            .chain(self.namespace.iter())
            .map(String::as_str)
            .chain(self.named.iter().map(|n| n.local.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDecl {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Bare attribute, implicitly `true`
    Flag,
    Str(String),
    /// Raw text between the braces
    Expr(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsxAttribute {
    /// `...` for spread attributes
    pub name: String,
    pub value: AttrValue,
    pub line: usize,
}

impl JsxAttribute {
    pub fn is_spread(&self) -> bool {
        self.name == "..."
    }

    /// Contents of `{{ ... }}` when the value is an object literal
    pub fn object_literal(&self) -> Option<&str> {
        match &self.value {
            AttrValue::Expr(expr) => {
                let trimmed = expr.trim();
                trimmed.strip_prefix('{')?.strip_suffix('}')
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsxElement {
    /// Empty for fragments
    pub tag: String,
    pub attributes: Vec<JsxAttribute>,
    pub line: usize,
    /// Enclosing tags, outermost first
    pub ancestors: Vec<String>,
    /// Direct literal text, whitespace-collapsed
    pub text: String,
    /// Direct `{...}` children
    pub has_expression_child: bool,
    pub has_element_child: bool,
    pub self_closing: bool,
}

impl JsxElement {
    pub fn attribute(&self, name: &str) -> Option<&JsxAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn has_spread(&self) -> bool {
        self.attributes.iter().any(JsxAttribute::is_spread)
    }

    pub fn is_fragment(&self) -> bool {
        self.tag.is_empty()
    }

    /// Uppercase or member-expression tags refer to components, not DOM elements
    pub fn is_component(&self) -> bool {
        self.tag.starts_with(|c: char| c.is_ascii_uppercase()) || self.tag.contains('.')
    }

    /// `Typography` for `Typography.Title`
    pub fn root_binding(&self) -> &str {
        self.tag.split('.').next().unwrap_or(&self.tag)
    }

    pub fn has_text_content(&self) -> bool {
        !self.text.is_empty() || self.has_expression_child
    }

    /// Anything rendered between the tags
    pub fn has_content(&self) -> bool {
        self.has_text_content() || self.has_element_child
    }

    pub fn is_inside(&self, tag: &str) -> bool {
        self.ancestors.iter().any(|a| a == tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCode {
    pub imports: Vec<ImportDecl>,
    pub components: Vec<ComponentDecl>,
    /// In source order of their opening tags
    pub elements: Vec<JsxElement>,
    /// Closing tags with no matching open tag, as `(tag, line)`
    pub unexpected_closings: Vec<(String, usize)>,
    /// Open tags never closed, as `(tag, line)`
    pub unclosed: Vec<(String, usize)>,
    pub line_count: usize,
}

impl ParsedCode {
    pub fn imports_from<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a ImportDecl> {
        self.imports.iter().filter(move |i| i.module == module)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.imports.iter().any(|i| i.locals().any(|l| l == name))
            || self.components.iter().any(|c| c.name == name)
    }

    pub fn tag_count(&self) -> usize {
        self.elements.iter().filter(|e| !e.is_fragment()).count()
    }
}

/// Extract imports, component declarations and tag structure from source text
pub fn extract_structure(text: &str) -> Result<ParsedCode, ParseAnomaly> {
    if text.trim().is_empty() {
        return Err(ParseAnomaly::Empty);
    }

    let mut parsed = ParsedCode {
        imports: extract_imports(text),
        components: extract_components(text),
        line_count: text.lines().count(),
        ..Default::default()
    };

    let mut scanner = JsxScanner::new(text);
    scanner.scan_js(false)?;
    parsed.elements = scanner.elements;
    parsed.unexpected_closings = scanner.unexpected_closings;
    parsed.unclosed = scanner.unclosed;

    log::trace!(
        "Extracted {} imports, {} components, {} elements",
        parsed.imports.len(),
        parsed.components.len(),
        parsed.elements.len()
    );
    Ok(parsed)
}

fn line_at(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

fn extract_imports(text: &str) -> Vec<ImportDecl> {
    let mut imports = Vec::new();

    for caps in IMPORT_FROM.captures_iter(text) {
        let (Some(kw), Some(module)) = (caps.name("kw"), caps.name("module")) else {
            continue;
        };
        let clause = caps.name("clause").map_or("", |m| m.as_str());
        let mut decl = parse_import_clause(clause);
        decl.module = module.as_str().to_string();
        decl.line = line_at(text, kw.start());
        imports.push(decl);
    }

    for caps in IMPORT_BARE.captures_iter(text) {
        let (Some(kw), Some(module)) = (caps.name("kw"), caps.name("module")) else {
            continue;
        };
        imports.push(ImportDecl {
            module: module.as_str().to_string(),
            line: line_at(text, kw.start()),
            ..Default::default()
        });
    }

    imports.sort_by_key(|i| i.line);
    imports
}

/// `React, { Button, Input as TextInput }` or `* as Icons`
fn parse_import_clause(clause: &str) -> ImportDecl {
    let mut decl = ImportDecl::default();
    let (head, named) = match (clause.find('{'), clause.rfind('}')) {
        (Some(open), Some(close)) if open < close => (&clause[..open], Some(&clause[open + 1..close])),
        _ => (clause, None),
    };

    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if let Some(ns) = part.strip_prefix('*') {
            let ns = ns.trim().trim_start_matches("as").trim();
            decl.namespace = Some(ns.to_string());
        } else {
            decl.default = Some(part.to_string());
        }
    }

    if let Some(named) = named {
        for spec in named.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let spec = spec.strip_prefix("type ").unwrap_or(spec).trim();
            let mut words = spec.split_whitespace();
            let imported = words.next().unwrap_or_default().to_string();
            let local = match (words.next(), words.next()) {
                (Some("as"), Some(alias)) => alias.to_string(),
                _ => imported.clone(),
            };
            decl.named.push(NamedImport { imported, local });
        }
    }
    decl
}

fn extract_components(text: &str) -> Vec<ComponentDecl> {
    COMPONENT_DECL
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.name("var").or_else(|| caps.name("func"))?;
            Some(ComponentDecl {
                name: name.as_str().to_string(),
                line: line_at(text, name.start()),
            })
        })
        .collect()
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct JsxScanner {
    input: Vec<char>,
    position: usize,
    line: usize,
    depth: usize,
    stack: Vec<String>,
    elements: Vec<JsxElement>,
    unexpected_closings: Vec<(String, usize)>,
    unclosed: Vec<(String, usize)>,
}

impl JsxScanner {
    fn new(text: &str) -> Self {
        Self {
            input: text.chars().collect(),
            position: 0,
            line: 1,
            depth: 0,
            stack: Vec::new(),
            elements: Vec::new(),
            unexpected_closings: Vec::new(),
            unclosed: Vec::new(),
        }
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }

    /// Script context. With `nested`, stops after the `}` closing the
    /// expression container the caller already opened.
    fn scan_js(&mut self, nested: bool) -> Result<(), ParseAnomaly> {
        let start_line = self.line;
        let mut depth = 0usize;

        while let Some(ch) = self.peek() {
            match ch {
                '\'' | '"' | '`' => self.skip_string(ch)?,
                '/' if self.peek_next() == Some('/') => self.skip_line_comment(),
                '/' if self.peek_next() == Some('*') => self.skip_block_comment(),
                '/' if self.expression_may_start() => self.skip_regex()?,
                '{' => {
                    depth += 1;
                    self.advance();
                }
                '}' => {
                    self.advance();
                    if depth == 0 {
                        if nested {
                            return Ok(());
                        }
                        return Err(ParseAnomaly::UnbalancedBrace { line: self.line });
                    }
                    depth -= 1;
                }
                '<' if self.jsx_may_start() => {
                    if self.at_type_parameters() {
                        self.skip_type_parameters();
                    } else {
                        self.scan_element()?;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }

        if nested {
            return Err(ParseAnomaly::UnterminatedExpression { line: start_line });
        }
        Ok(())
    }

    fn skip_string(&mut self, quote: char) -> Result<(), ParseAnomaly> {
        let start_line = self.line;
        self.advance();
        while let Some(ch) = self.advance() {
            match ch {
                '\\' => {
                    self.advance();
                }
                '\n' if quote != '`' => return Err(ParseAnomaly::UnterminatedString { line: start_line }),
                c if c == quote => return Ok(()),
                _ => {}
            }
        }
        Err(ParseAnomaly::UnterminatedString { line: start_line })
    }

    /// Positioned on the opening `/`; consumes the pattern and its flags
    fn skip_regex(&mut self) -> Result<(), ParseAnomaly> {
        let start_line = self.line;
        self.advance();
        let mut in_class = false;
        while let Some(ch) = self.advance() {
            match ch {
                '\\' => {
                    self.advance();
                }
                '\n' => break,
                '[' => in_class = true,
                ']' => in_class = false,
                '/' if !in_class => {
                    while self.peek().map_or(false, is_ident_char) {
                        self.advance();
                    }
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(ParseAnomaly::UnterminatedRegex { line: start_line })
    }

    fn skip_line_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance();
        self.advance();
        while !self.is_at_end() {
            if self.peek() == Some('*') && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                return;
            }
            self.advance();
        }
    }

    /// A `<` opens a tag only where an expression may begin
    fn jsx_may_start(&self) -> bool {
        match self.peek_next() {
            Some(c) if c.is_alphabetic() || c == '>' => self.expression_may_start(),
            _ => false,
        }
    }

    /// Whether the preceding token leaves room for an operand, which
    /// separates `<tag` from less-than and `/re/` from division
    fn expression_may_start(&self) -> bool {
        let before = &self.input[..self.position];
        let mut index = before.len();
        while index > 0 && before[index - 1].is_whitespace() {
            index -= 1;
        }
        if index == 0 {
            return true;
        }

        match before[index - 1] {
            '(' | ',' | '=' | ':' | '?' | '&' | '|' | '{' | '[' | ';' | '!' => true,
            // arrow body
            '>' => index >= 2 && before[index - 2] == '=',
            c if is_ident_char(c) => {
                let end = index;
                while index > 0 && is_ident_char(before[index - 1]) {
                    index -= 1;
                }
                let word: String = before[index..end].iter().collect();
                matches!(word.as_str(), "return" | "yield" | "default")
            }
            _ => false,
        }
    }

    /// `<T,>` or `<T extends U>` ahead: a generic arrow function's type parameters
    fn at_type_parameters(&self) -> bool {
        let name_start = self.position + 1;
        let mut index = name_start;
        while self.input.get(index).map_or(false, |c| is_ident_char(*c)) {
            index += 1;
        }
        if index == name_start {
            return false;
        }
        while self.input.get(index).map_or(false, |c| c.is_whitespace()) {
            index += 1;
        }

        match self.input.get(index) {
            Some(',') => true,
            Some('e') => {
                let word: String = self.input[index..]
                    .iter()
                    .take_while(|c| is_ident_char(**c))
                    .collect();
                word == "extends"
            }
            _ => false,
        }
    }

    /// Positioned on `<`; consumes through the matching `>`
    fn skip_type_parameters(&mut self) {
        let mut depth = 0usize;
        let mut previous = '\0';
        while let Some(ch) = self.advance() {
            match ch {
                '<' => depth += 1,
                // `=>` inside a function type
                '>' if previous != '=' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
            previous = ch;
        }
    }

    fn read_tag_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if is_ident_char(ch) || ch == '.' || ch == '-' || ch == ':' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    /// Positioned on `<`; consumes through the matching close tag
    fn scan_element(&mut self) -> Result<(), ParseAnomaly> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseAnomaly::TooDeep { line: self.line });
        }
        self.depth += 1;
        let result = self.scan_element_body();
        self.depth -= 1;
        result
    }

    fn scan_element_body(&mut self) -> Result<(), ParseAnomaly> {
        let line = self.line;
        self.advance();
        let tag = self.read_tag_name();
        let attributes = self.scan_attributes(&tag, line)?;

        let self_closing = if self.peek() == Some('/') {
            self.advance();
            true
        } else {
            false
        };
        if self.advance() != Some('>') {
            return Err(ParseAnomaly::UnterminatedTag { tag, line });
        }

        let index = self.elements.len();
        self.elements.push(JsxElement {
            tag: tag.clone(),
            attributes,
            line,
            ancestors: self.stack.clone(),
            text: String::new(),
            has_expression_child: false,
            has_element_child: false,
            self_closing,
        });

        if !self_closing {
            self.stack.push(tag.clone());
            let closed = self.scan_children(index, &tag)?;
            self.stack.pop();
            if !closed {
                self.unclosed.push((tag, line));
            }
        }
        Ok(())
    }

    fn scan_attributes(&mut self, tag: &str, tag_line: usize) -> Result<Vec<JsxAttribute>, ParseAnomaly> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            let line = self.line;
            match self.peek() {
                None => {
                    return Err(ParseAnomaly::UnterminatedTag {
                        tag: tag.to_string(),
                        line: tag_line,
                    })
                }
                Some('>') | Some('/') => return Ok(attributes),
                Some('{') => {
                    self.advance();
                    let expr = self.capture_expression(tag, "...", line)?;
                    let expr = expr.trim().trim_start_matches("...").to_string();
                    attributes.push(JsxAttribute {
                        name: "...".to_string(),
                        value: AttrValue::Expr(expr),
                        line,
                    });
                }
                Some(c) if is_ident_char(c) => {
                    let name = self.read_tag_name();
                    self.skip_whitespace();
                    let value = if self.peek() == Some('=') {
                        self.advance();
                        self.skip_whitespace();
                        self.scan_attribute_value(tag, &name, line)?
                    } else {
                        AttrValue::Flag
                    };
                    attributes.push(JsxAttribute { name, value, line });
                }
                Some(found) => {
                    return Err(ParseAnomaly::MalformedTag {
                        tag: tag.to_string(),
                        found,
                        line,
                    })
                }
            }
        }
    }

    fn scan_attribute_value(&mut self, tag: &str, name: &str, line: usize) -> Result<AttrValue, ParseAnomaly> {
        let unterminated = || ParseAnomaly::UnterminatedAttribute {
            tag: tag.to_string(),
            name: name.to_string(),
            line,
        };

        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let mut value = String::new();
                loop {
                    match self.advance() {
                        Some(c) if c == quote => return Ok(AttrValue::Str(value)),
                        Some(c) => value.push(c),
                        None => return Err(unterminated()),
                    }
                }
            }
            Some('{') => {
                self.advance();
                Ok(AttrValue::Expr(self.capture_expression(tag, name, line)?))
            }
            _ => Err(unterminated()),
        }
    }

    /// Text of an expression container whose `{` was consumed; nested tags are recorded
    fn capture_expression(&mut self, tag: &str, name: &str, line: usize) -> Result<String, ParseAnomaly> {
        let start = self.position;
        self.scan_js(true).map_err(|e| match e {
            ParseAnomaly::UnterminatedExpression { .. } => ParseAnomaly::UnterminatedAttribute {
                tag: tag.to_string(),
                name: name.to_string(),
                line,
            },
            other => other,
        })?;
        // scan_js stops after the closing brace
        Ok(self.input[start..self.position - 1].iter().collect())
    }

    /// Children of an open element. Returns false if input ended before the
    /// close tag, or a different open tag was closed first.
    fn scan_children(&mut self, index: usize, tag: &str) -> Result<bool, ParseAnomaly> {
        let mut text = String::new();

        let closed = loop {
            match self.peek() {
                None => break false,
                Some('<') if self.peek_next() == Some('/') => {
                    let line = self.line;
                    let checkpoint = (self.position, self.line);
                    self.advance();
                    self.advance();
                    self.skip_whitespace();
                    let closing = self.read_tag_name();
                    self.skip_whitespace();
                    if self.advance() != Some('>') {
                        return Err(ParseAnomaly::UnterminatedTag { tag: closing, line });
                    }
                    if closing == tag {
                        break true;
                    }
                    if self.stack.iter().any(|open| *open == closing) {
                        // Closes an ancestor; leave it for the ancestor to consume
                        (self.position, self.line) = checkpoint;
                        break false;
                    }
                    self.unexpected_closings.push((closing, line));
                }
                Some('<') => {
                    self.elements[index].has_element_child = true;
                    self.scan_element()?;
                }
                Some('{') => {
                    let line = self.line;
                    self.advance();
                    let expr = self.capture_expression(tag, "children", line)?;
                    let expr = expr.trim();
                    let is_comment = expr.starts_with("/*") && expr.ends_with("*/");
                    if !expr.is_empty() && !is_comment {
                        self.elements[index].has_expression_child = true;
                    }
                }
                Some(_) => {
                    if let Some(ch) = self.advance() {
                        text.push(ch);
                    }
                }
            }
        };

        self.elements[index].text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Ok(closed)
    }
}
