//! Core types for the antforge pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Raw design document
// ---------------------------------------------------------------------------

/// Node kind tag as exported by the design tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Document,
    Canvas,
    Frame,
    Group,
    Section,
    Component,
    ComponentSet,
    Instance,
    Text,
    Rectangle,
    Ellipse,
    Line,
    Vector,
    Star,
    Polygon,
    BooleanOperation,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Color with normalized float channels in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "default_one")]
    pub a: f64,
}

impl RawColor {
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaintType {
    Solid,
    GradientLinear,
    GradientRadial,
    GradientAngular,
    GradientDiamond,
    Image,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paint {
    #[serde(rename = "type")]
    pub kind: PaintType,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_one")]
    pub opacity: f64,
    #[serde(default)]
    pub color: Option<RawColor>,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl Paint {
    pub fn solid(color: RawColor) -> Self {
        Self {
            kind: PaintType::Solid,
            visible: true,
            opacity: 1.0,
            color: Some(color),
            image_ref: None,
        }
    }

    pub fn image(image_ref: impl Into<String>) -> Self {
        Self {
            kind: PaintType::Image,
            visible: true,
            opacity: 1.0,
            color: None,
            image_ref: Some(image_ref.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EffectType {
    DropShadow,
    InnerShadow,
    LayerBlur,
    BackgroundBlur,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(rename = "type")]
    pub kind: EffectType,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub color: Option<RawColor>,
    #[serde(default)]
    pub offset: Option<Vector2>,
    #[serde(default)]
    pub radius: f64,
    #[serde(default)]
    pub spread: f64,
}

impl Effect {
    pub fn drop_shadow(color: RawColor, offset: Vector2, radius: f64) -> Self {
        Self {
            kind: EffectType::DropShadow,
            visible: true,
            color: Some(color),
            offset: Some(offset),
            radius,
            spread: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justified,
}

impl TextAlign {
    pub fn as_css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justified => "justify",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStyle {
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub font_weight: Option<f64>,
    #[serde(default)]
    pub text_align_horizontal: Option<TextAlign>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    Top,
    Bottom,
    Left,
    Right,
    Center,
    TopBottom,
    LeftRight,
    Scale,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    pub horizontal: ConstraintKind,
    pub vertical: ConstraintKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayoutMode {
    None,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SizingMode {
    Fixed,
    Auto,
}

/// A design-document node exactly as received from the document source.
///
/// Every field other than `id` is optional in the export, so missing data
/// deserializes to its empty form instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub absolute_bounding_box: Option<Rect>,
    #[serde(default)]
    pub fills: Vec<Paint>,
    #[serde(default)]
    pub strokes: Vec<Paint>,
    #[serde(default)]
    pub stroke_weight: Option<f64>,
    #[serde(default)]
    pub corner_radius: Option<f64>,
    #[serde(default)]
    pub opacity: Option<f64>,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default)]
    pub style: Option<TypeStyle>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub locked: Option<bool>,
    #[serde(default)]
    pub layout_mode: Option<LayoutMode>,
    #[serde(default)]
    pub primary_axis_sizing_mode: Option<SizingMode>,
    #[serde(default)]
    pub constraints: Option<Constraints>,
    #[serde(default)]
    pub item_spacing: Option<f64>,
    #[serde(default)]
    pub padding_left: Option<f64>,
    #[serde(default)]
    pub padding_right: Option<f64>,
    #[serde(default)]
    pub padding_top: Option<f64>,
    #[serde(default)]
    pub padding_bottom: Option<f64>,
    #[serde(default)]
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn text(id: impl Into<String>, name: impl Into<String>, characters: impl Into<String>) -> Self {
        Self {
            characters: Some(characters.into()),
            ..Self::new(id, name, NodeKind::Text)
        }
    }

    pub fn with_box(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.absolute_bounding_box = Some(Rect::new(x, y, width, height));
        self
    }

    pub fn with_fill(mut self, paint: Paint) -> Self {
        self.fills.push(paint);
        self
    }

    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<RawNode>) -> Self {
        self.children.extend(children);
        self
    }
}

// ---------------------------------------------------------------------------
// Semantic tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Layout {
    /// Absolute box; zero-sized when the raw node carried no geometry
    pub bounds: Rect,
    #[serde(skip)]
    pub has_geometry: bool,
    pub constraints: Option<Constraints>,
    pub axis: Option<Axis>,
    pub item_spacing: Option<f64>,
    /// top, right, bottom, left
    pub padding: Option<[f64; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shadow {
    pub inset: bool,
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
    pub spread: f64,
    pub color: String,
    pub alpha: f64,
}

impl Shadow {
    pub fn to_css(&self) -> String {
        let color = if self.alpha < 1.0 {
            format!("{}{:02x}", self.color, crate::semantic::channel_to_byte(self.alpha))
        } else {
            self.color.clone()
        };
        format!(
            "{}{}px {}px {}px {}px {}",
            if self.inset { "inset " } else { "" },
            self.offset_x,
            self.offset_y,
            self.blur,
            self.spread,
            color
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Fill {
    Solid { color: String, opacity: f64 },
    Gradient { kind: String },
    Image { image_ref: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Styling {
    pub background_color: Option<String>,
    pub border_color: Option<String>,
    pub border_width: Option<f64>,
    pub border_radius: Option<f64>,
    pub opacity: f64,
    pub shadows: Vec<Shadow>,
    pub fills: Vec<Fill>,
}

impl Default for Styling {
    fn default() -> Self {
        Self {
            background_color: None,
            border_color: None,
            border_width: None,
            border_radius: None,
            opacity: 1.0,
            shadows: Vec::new(),
            fills: Vec::new(),
        }
    }
}

impl Styling {
    pub fn has_image_fill(&self) -> bool {
        self.fills.iter().any(|f| matches!(f, Fill::Image { .. }))
    }

    pub fn has_border(&self) -> bool {
        self.border_color.is_some() && self.border_width.unwrap_or(0.0) > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub text: String,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<f64>,
    pub alignment: Option<TextAlign>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeProperties {
    pub visible: bool,
    pub locked: bool,
    pub sizing: Option<SizingMode>,
}

impl Default for NodeProperties {
    fn default() -> Self {
        Self {
            visible: true,
            locked: false,
            sizing: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SemanticNode {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    pub layout: Layout,
    pub styling: Styling,
    pub content: Option<Content>,
    pub properties: NodeProperties,
    pub children: Vec<SemanticNode>,
}

impl SemanticNode {
    /// First text found in a depth-first pre-order walk, including this node
    pub fn first_text(&self) -> Option<&Content> {
        if let Some(content) = &self.content {
            return Some(content);
        }
        self.children.iter().find_map(|child| child.first_text())
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    pub fn height(&self) -> f64 {
        self.layout.bounds.height
    }

    pub fn width(&self) -> f64 {
        self.layout.bounds.width
    }
}

// ---------------------------------------------------------------------------
// Component catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    General,
    Layout,
    Navigation,
    #[serde(rename = "Data Entry")]
    DataEntry,
    #[serde(rename = "Data Display")]
    DataDisplay,
    Feedback,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::General => "General",
            Self::Layout => "Layout",
            Self::Navigation => "Navigation",
            Self::DataEntry => "Data Entry",
            Self::DataDisplay => "Data Display",
            Self::Feedback => "Feedback",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<String>,
}

impl PropDef {
    pub fn new(name: &str, type_description: &str, default_value: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            type_description: type_description.to_string(),
            required: false,
            default_value: default_value.map(str::to_string),
        }
    }

    /// Literal members of a union type such as `'small' | 'large'` or `1 | 2 | 3`.
    ///
    /// Empty when any member is not a literal.
    pub fn enum_values(&self) -> Vec<String> {
        let mut values = Vec::new();
        for member in self.type_description.split('|').map(str::trim) {
            let quoted = member.len() >= 2
                && ((member.starts_with('\'') && member.ends_with('\''))
                    || (member.starts_with('"') && member.ends_with('"')));
            if quoted {
                values.push(member[1..member.len() - 1].to_string());
            } else if !member.is_empty() && member.parse::<f64>().is_ok() {
                values.push(member.to_string());
            } else {
                return Vec::new();
            }
        }
        values
    }
}

/// Component definition as supplied by a catalog source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub accepted_properties: Vec<PropDef>,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    /// Tag name as written in source, e.g. `Form.Item`
    pub name: String,
    pub display_name: String,
    pub category: Category,
    pub properties: Vec<PropDef>,
    pub module: String,
    /// Binding imported from `module`, e.g. `Form` for `Form.Item`
    pub import_name: String,
    pub import_statement: String,
    pub examples: Vec<String>,
}

impl CatalogEntry {
    pub fn property(&self, name: &str) -> Option<&PropDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn accepts(&self, name: &str) -> bool {
        self.property(name).is_some()
    }
}

// ---------------------------------------------------------------------------
// Mapped tree
// ---------------------------------------------------------------------------

pub type PropMap = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedComponentConfig {
    pub node_id: String,
    pub node_name: String,
    pub component: String,
    #[serde(skip)]
    pub entry: Option<Arc<CatalogEntry>>,
    pub confidence: u32,
    pub props: PropMap,
    pub style: Option<PropMap>,
    /// Inline text content rendered between the tags
    pub text: Option<String>,
    pub children: Vec<MappedComponentConfig>,
}

impl MappedComponentConfig {
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MappedTree {
    pub root: Option<MappedComponentConfig>,
    pub diagnostics: Vec<Diagnostic>,
}

impl MappedTree {
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn mapped_count(&self) -> usize {
        self.root.as_ref().map_or(0, |r| r.node_count())
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    Syntax,
    Import,
    Prop,
    Accessibility,
    AntdUsage,
    Performance,
    BestPractice,
    Style,
    Mapping,
    Synthesis,
}

impl DiagnosticKind {
    /// Kinds whose findings are reported under errors even at warning severity
    pub fn is_error_kind(self) -> bool {
        matches!(self, Self::Syntax | Self::Import | Self::Prop | Self::AntdUsage)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Syntax => "syntax",
            Self::Import => "import",
            Self::Prop => "prop",
            Self::Accessibility => "accessibility",
            Self::AntdUsage => "antd-usage",
            Self::Performance => "performance",
            Self::BestPractice => "best-practice",
            Self::Style => "style",
            Self::Mapping => "mapping",
            Self::Synthesis => "synthesis",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: Option<usize>,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            severity: Severity::Error,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            line: None,
            severity: Severity::Warning,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match self.line {
            Some(line) => write!(f, "{}[{}] line {}: {}", severity, self.kind, line, self.message),
            None => write!(f, "{}[{}]: {}", severity, self.kind, self.message),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_node_deserialization() {
        let json = r#"{
            "id": "1:2",
            "name": "Card",
            "type": "FRAME",
            "absoluteBoundingBox": { "x": 0, "y": 10, "width": 320, "height": 200 },
            "fills": [{ "type": "SOLID", "color": { "r": 1, "g": 1, "b": 1 } }],
            "cornerRadius": 8,
            "children": [{ "id": "1:3", "type": "TEXT", "characters": "Hello" }]
        }"#;
        let node: RawNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, NodeKind::Frame);
        assert_eq!(node.absolute_bounding_box.unwrap().height, 200.0);
        assert_eq!(node.fills[0].color.unwrap().a, 1.0);
        assert!(node.fills[0].visible);
        assert_eq!(node.children[0].kind, NodeKind::Text);
        assert_eq!(node.children[0].name, "");
    }

    #[test]
    fn test_unknown_kind_is_other() {
        let node: RawNode = serde_json::from_str(r#"{ "id": "9", "type": "STICKY" }"#).unwrap();
        assert_eq!(node.kind, NodeKind::Other);
    }

    #[test]
    fn test_prop_enum_values() {
        let prop = PropDef::new("size", "'small' | 'middle' | 'large'", Some("middle"));
        assert_eq!(prop.enum_values(), vec!["small", "middle", "large"]);

        let prop = PropDef::new("onClick", "(event) => void", None);
        assert!(prop.enum_values().is_empty());

        let prop = PropDef::new("level", "1 | 2 | 3 | 4 | 5", None);
        assert_eq!(prop.enum_values(), vec!["1", "2", "3", "4", "5"]);

        let prop = PropDef::new("size", "'small' | number", None);
        assert!(prop.enum_values().is_empty());
    }

    #[test]
    fn test_shadow_css() {
        let shadow = Shadow {
            inset: false,
            offset_x: 0.0,
            offset_y: 2.0,
            blur: 8.0,
            spread: 0.0,
            color: "#000000".to_string(),
            alpha: 0.5,
        };
        assert_eq!(shadow.to_css(), "0px 2px 8px 0px #00000080");
    }

    #[test]
    fn test_shadow_alpha_matches_color_channels() {
        for alpha in [0.0, 0.1, 0.25, 0.5, 0.75, 0.999] {
            let shadow = Shadow {
                inset: true,
                offset_x: 1.0,
                offset_y: 1.0,
                blur: 0.0,
                spread: 0.0,
                color: "#123456".to_string(),
                alpha,
            };
            let expected = format!("inset 1px 1px 0px 0px #123456{}", crate::semantic::channel_to_hex(alpha));
            assert_eq!(shadow.to_css(), expected);
        }
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::error(DiagnosticKind::AntdUsage, "Form.Item outside Form").at_line(4);
        assert_eq!(diag.to_string(), "error[antd-usage] line 4: Form.Item outside Form");
        assert!(DiagnosticKind::AntdUsage.is_error_kind());
        assert!(!DiagnosticKind::Accessibility.is_error_kind());
    }
}
