//! Heuristic mapping of semantic nodes onto catalog components

use crate::catalog::CatalogIndex;
use crate::types::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Tunable weights and thresholds for the mapping engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    /// Added when the node kind matches the rule
    pub type_weight: u32,
    /// Added when the node name contains one of the rule's patterns
    pub name_weight: u32,
    /// Candidates must score strictly above this
    pub min_confidence: u32,
    pub max_confidence: u32,
    /// Heights at or below this map to `size="small"`
    pub small_size_threshold: f64,
    /// Heights above this map to `size="large"`
    pub large_size_threshold: f64,
    /// Opacity below this maps to `disabled`
    pub disabled_opacity: f64,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            type_weight: 20,
            name_weight: 30,
            min_confidence: 20,
            max_confidence: 100,
            small_size_threshold: 24.0,
            large_size_threshold: 36.0,
            disabled_opacity: 0.5,
        }
    }
}

/// Conditions a rule can test against a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    /// The node itself carries text content
    HasText,
    /// The node or any descendant carries text content
    ContainsText,
    HasChildren,
    ChildCountAtLeast(usize),
    HasLayoutAxis,
    HeightAtMost(f64),
    HeightAtLeast(f64),
    WidthAtLeast(f64),
    /// One dimension at most 2px, the other non-zero
    ThinLine,
    RoughlySquare,
    /// Ellipse, or corner radius of at least half the shorter side
    Circular,
    HasBackground,
    HasBorder,
    HasCornerRadius,
    HasShadow,
    HasImageFill,
    FontSizeAtLeast(f64),
    /// The mapping context names this component among the ancestors
    InsideComponent(&'static str),
}

impl Predicate {
    pub fn evaluate(&self, node: &SemanticNode, context: Option<&str>) -> bool {
        let geometry = node.layout.has_geometry;
        match *self {
            Predicate::HasText => node.content.is_some(),
            Predicate::ContainsText => node.first_text().is_some(),
            Predicate::HasChildren => !node.children.is_empty(),
            Predicate::ChildCountAtLeast(count) => node.children.len() >= count,
            Predicate::HasLayoutAxis => node.layout.axis.is_some(),
            Predicate::HeightAtMost(max) => geometry && node.height() <= max,
            Predicate::HeightAtLeast(min) => geometry && node.height() >= min,
            Predicate::WidthAtLeast(min) => geometry && node.width() >= min,
            Predicate::ThinLine => {
                let thin = node.width().min(node.height());
                let long = node.width().max(node.height());
                geometry && thin <= 2.0 && long > 0.0
            }
            Predicate::RoughlySquare => {
                geometry && node.height() > 0.0 && (node.width() / node.height() - 1.0).abs() <= 0.1
            }
            Predicate::Circular => is_circular(node),
            Predicate::HasBackground => node.styling.background_color.is_some(),
            Predicate::HasBorder => node.styling.has_border(),
            Predicate::HasCornerRadius => node.styling.border_radius.unwrap_or(0.0) > 0.0,
            Predicate::HasShadow => !node.styling.shadows.is_empty(),
            Predicate::HasImageFill => node.styling.has_image_fill(),
            Predicate::FontSizeAtLeast(min) => node
                .content
                .as_ref()
                .and_then(|c| c.font_size)
                .map_or(false, |size| size >= min),
            Predicate::InsideComponent(name) => context
                .map_or(false, |ctx| ctx.split('/').any(|segment| segment == name)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPredicate {
    pub predicate: Predicate,
    pub weight: u32,
}

/// Where a node's text ends up on the target component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextRole {
    None,
    /// Rendered between the tags
    Children,
    /// `placeholder` prop
    Placeholder,
    /// `label` prop taken from the first direct text child
    Label,
}

/// Property derivations applied to a mapped node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropRule {
    SizeFromHeight,
    DangerFromName,
    DisabledFromOpacity,
    TitleLevel,
    StrongFromWeight,
    FlexDirection,
    GapFromSpacing,
    DividerOrientation,
    AvatarShape,
    ImageAttributes,
    TagColor,
    FormLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleProfile {
    /// Only visibility is carried into the style map
    None,
    /// Background, border, radius, padding, opacity, shadows
    Container,
    /// Text color, size and alignment
    Typography,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisProfile {
    pub text_role: TextRole,
    /// Atomic components absorb their descendants instead of mapping them
    pub atomic: bool,
    pub style: StyleProfile,
    pub props: Vec<PropRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    pub target: String,
    pub kinds: Vec<NodeKind>,
    pub name_patterns: Vec<String>,
    pub predicates: Vec<WeightedPredicate>,
    pub profile: SynthesisProfile,
}

impl RuleEntry {
    pub fn new(target: &str, kinds: &[NodeKind], name_patterns: &[&str]) -> Self {
        Self {
            target: target.to_string(),
            kinds: kinds.to_vec(),
            name_patterns: name_patterns.iter().map(|p| p.to_lowercase()).collect(),
            predicates: Vec::new(),
            profile: SynthesisProfile {
                text_role: TextRole::None,
                atomic: true,
                style: StyleProfile::None,
                props: Vec::new(),
            },
        }
    }

    pub fn when(mut self, predicate: Predicate, weight: u32) -> Self {
        self.predicates.push(WeightedPredicate { predicate, weight });
        self
    }

    pub fn text(mut self, role: TextRole) -> Self {
        self.profile.text_role = role;
        self
    }

    pub fn container(mut self) -> Self {
        self.profile.atomic = false;
        self.profile.style = StyleProfile::Container;
        self
    }

    pub fn style(mut self, style: StyleProfile) -> Self {
        self.profile.style = style;
        self
    }

    pub fn props(mut self, rules: &[PropRule]) -> Self {
        self.profile.props.extend_from_slice(rules);
        self
    }

    fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.name_patterns.iter().any(|pattern| name.contains(pattern.as_str()))
    }
}

/// Mapping rules in priority order; earlier entries win ties
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    entries: Vec<RuleEntry>,
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: RuleEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rules targeting the Ant Design catalog
    pub fn antd() -> Self {
        use NodeKind::*;
        use Predicate::*;
        use PropRule::*;

        let boxes = [Frame, Component, Instance, Rectangle, Group];
        let containers = [Frame, Group, Section, Component, ComponentSet, Instance];

        let mut registry = Self::empty();
        registry
            .register(
                RuleEntry::new("Button", &boxes, &["button", "btn"])
                    .when(ContainsText, 20)
                    .when(HeightAtMost(56.0), 10)
                    .when(HasCornerRadius, 5)
                    .text(TextRole::Children)
                    .props(&[SizeFromHeight, DangerFromName, DisabledFromOpacity]),
            )
            .register(
                RuleEntry::new("Input.TextArea", &boxes, &["textarea", "text area", "multiline"])
                    .when(HasBorder, 15)
                    .when(HeightAtLeast(64.0), 15)
                    .text(TextRole::Placeholder)
                    .props(&[DisabledFromOpacity]),
            )
            .register(
                RuleEntry::new("Input", &boxes, &["input", "text field", "textfield", "search"])
                    .when(HasBorder, 15)
                    .when(HeightAtMost(56.0), 10)
                    .text(TextRole::Placeholder)
                    .props(&[SizeFromHeight, DisabledFromOpacity]),
            )
            .register(
                RuleEntry::new("Select", &boxes, &["select", "dropdown", "picker", "combobox"])
                    .when(HasBorder, 15)
                    .when(HeightAtMost(56.0), 10)
                    .text(TextRole::Placeholder)
                    .props(&[SizeFromHeight, DisabledFromOpacity]),
            )
            .register(
                RuleEntry::new("Checkbox", &boxes, &["checkbox", "check box"])
                    .when(ContainsText, 10)
                    .when(HeightAtMost(32.0), 10)
                    .text(TextRole::Children)
                    .props(&[DisabledFromOpacity]),
            )
            .register(
                RuleEntry::new("Switch", &boxes, &["switch", "toggle"])
                    .when(HasCornerRadius, 10)
                    .when(HeightAtMost(32.0), 10)
                    .props(&[DisabledFromOpacity]),
            )
            .register(
                RuleEntry::new("Form.Item", &containers, &["form item", "form-item", "formitem", "form field"])
                    .when(InsideComponent("Form"), 30)
                    .when(HasChildren, 15)
                    .when(ContainsText, 10)
                    .text(TextRole::Label)
                    .container()
                    .style(StyleProfile::None),
            )
            .register(
                RuleEntry::new("Form", &containers, &["form"])
                    .when(ChildCountAtLeast(2), 15)
                    .when(HasLayoutAxis, 5)
                    .container()
                    .props(&[FormLayout]),
            )
            .register(
                RuleEntry::new("Card", &containers, &["card", "panel", "tile"])
                    .when(HasShadow, 15)
                    .when(HasCornerRadius, 10)
                    .when(HasChildren, 10)
                    .when(HasBackground, 5)
                    .container(),
            )
            .register(
                RuleEntry::new("Tag", &boxes, &["tag", "chip", "pill", "badge"])
                    .when(HeightAtMost(28.0), 15)
                    .when(ContainsText, 10)
                    .text(TextRole::Children)
                    .props(&[TagColor]),
            )
            .register(
                RuleEntry::new("Avatar", &[Ellipse, Frame, Component, Instance, Rectangle], &["avatar", "profile pic"])
                    .when(Circular, 15)
                    .when(HasImageFill, 15)
                    .when(RoughlySquare, 10)
                    .props(&[AvatarShape]),
            )
            .register(
                RuleEntry::new("Image", &[Rectangle, Frame, Ellipse], &["image", "img", "photo", "picture", "illustration"])
                    .when(HasImageFill, 30)
                    .props(&[ImageAttributes]),
            )
            .register(
                RuleEntry::new("Divider", &[Line, Rectangle, Vector], &["divider", "separator"])
                    .when(ThinLine, 30)
                    .props(&[DividerOrientation]),
            )
            .register(
                RuleEntry::new("Typography.Title", &[Text], &["title", "heading", "headline"])
                    .when(FontSizeAtLeast(20.0), 45)
                    .text(TextRole::Children)
                    .style(StyleProfile::Typography)
                    .props(&[TitleLevel]),
            )
            .register(
                RuleEntry::new("Typography.Text", &[Text], &[])
                    .when(HasText, 45)
                    .text(TextRole::Children)
                    .style(StyleProfile::Typography)
                    .props(&[StrongFromWeight]),
            )
            .register(
                RuleEntry::new(
                    "Flex",
                    &[Document, Canvas, Frame, Group, Section, Component, ComponentSet, Instance],
                    &["row", "column", "stack", "container", "flex", "wrapper", "layout"],
                )
                .when(HasLayoutAxis, 20)
                .when(HasChildren, 10)
                .container()
                .props(&[FlexDirection, GapFromSpacing]),
            );
        registry
    }
}

/// A scored rule whose target exists in the catalog
#[derive(Debug, Clone)]
pub struct Candidate {
    pub rule_index: usize,
    pub entry: Arc<CatalogEntry>,
    pub confidence: u32,
}

pub struct MappingEngine {
    catalog: Arc<CatalogIndex>,
    registry: RuleRegistry,
    config: MappingConfig,
}

impl MappingEngine {
    pub fn new(catalog: Arc<CatalogIndex>, config: MappingConfig) -> Self {
        Self::with_registry(catalog, RuleRegistry::antd(), config)
    }

    pub fn with_registry(catalog: Arc<CatalogIndex>, registry: RuleRegistry, config: MappingConfig) -> Self {
        Self {
            catalog,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &MappingConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Accumulated confidence of one rule for a node, capped at `max_confidence`
    pub fn score(&self, rule: &RuleEntry, node: &SemanticNode, context: Option<&str>) -> u32 {
        let mut total = 0u32;
        if rule.kinds.contains(&node.kind) {
            total = total.saturating_add(self.config.type_weight);
        }
        if rule.matches_name(&node.name) {
            total = total.saturating_add(self.config.name_weight);
        }
        for weighted in &rule.predicates {
            if weighted.predicate.evaluate(node, context) {
                total = total.saturating_add(weighted.weight);
            }
        }
        total.min(self.config.max_confidence)
    }

    /// Candidates above the threshold, best first; ties keep registration order
    pub fn candidates(&self, node: &SemanticNode, context: Option<&str>) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .registry
            .entries
            .iter()
            .enumerate()
            .filter_map(|(rule_index, rule)| {
                let confidence = self.score(rule, node, context);
                if confidence <= self.config.min_confidence {
                    return None;
                }
                match self.catalog.get(&rule.target) {
                    Some(entry) => Some(Candidate {
                        rule_index,
                        entry,
                        confidence,
                    }),
                    None => {
                        log::debug!("Skipping rule for uncatalogued component '{}'", rule.target);
                        None
                    }
                }
            })
            .collect();

        // Stable sort keeps registration order among equal scores
        candidates.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        candidates
    }

    pub fn propose_mappings(&self, node: &SemanticNode, context: Option<&str>) -> Vec<(Arc<CatalogEntry>, u32)> {
        self.candidates(node, context)
            .into_iter()
            .map(|c| (c.entry, c.confidence))
            .collect()
    }

    pub fn select_mapping(&self, node: &SemanticNode, context: Option<&str>) -> Option<(Arc<CatalogEntry>, u32)> {
        self.propose_mappings(node, context).into_iter().next()
    }

    /// Map a whole tree.
    ///
    /// An unmappable child is dropped with a warning while its siblings and
    /// parent are kept. An unmappable root yields an empty tree with no
    /// mapping diagnostics.
    pub fn map_tree(&self, root: &SemanticNode) -> MappedTree {
        let mut diagnostics = Vec::new();
        let mapped = self.map_node(root, None, &mut diagnostics);

        // Synthesis reports the empty result
        if mapped.is_none() {
            log::warn!("Root node '{}' ({}) could not be mapped", root.name, root.id);
        }

        MappedTree {
            root: mapped,
            diagnostics,
        }
    }

    fn map_node(
        &self,
        node: &SemanticNode,
        context: Option<&str>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<MappedComponentConfig> {
        let best = self.candidates(node, context).into_iter().next()?;
        let rule = &self.registry.entries[best.rule_index];
        let profile = &rule.profile;
        let entry = best.entry;

        log::trace!(
            "Mapped '{}' ({}) to {} with confidence {}",
            node.name,
            node.id,
            entry.name,
            best.confidence
        );

        let mut props = PropMap::new();
        for prop_rule in &profile.props {
            self.apply_prop_rule(*prop_rule, node, &mut props);
        }

        let mut text = None;
        let mut label_child = None;
        match profile.text_role {
            TextRole::None => {}
            TextRole::Children => text = node.first_text().map(|c| c.text.clone()),
            TextRole::Placeholder => {
                if let Some(content) = node.first_text() {
                    props.insert("placeholder".to_string(), json!(content.text));
                }
            }
            TextRole::Label => {
                if let Some((index, content)) = node
                    .children
                    .iter()
                    .enumerate()
                    .find_map(|(i, child)| child.content.as_ref().map(|c| (i, c)))
                {
                    props.insert("label".to_string(), json!(content.text));
                    label_child = Some(index);
                }
            }
        }

        props.retain(|name, _| {
            let accepted = entry.accepts(name);
            if !accepted {
                log::debug!("{} does not accept prop '{}', dropping it", entry.name, name);
            }
            accepted
        });

        let style = synthesize_style(node, profile.style);

        let mut children = Vec::new();
        if !profile.atomic {
            let child_context = match context {
                Some(ctx) => format!("{}/{}", ctx, entry.name),
                None => entry.name.clone(),
            };
            for (index, child) in node.children.iter().enumerate() {
                if Some(index) == label_child {
                    continue;
                }
                match self.map_node(child, Some(&child_context), diagnostics) {
                    Some(mapped) => children.push(mapped),
                    None => {
                        log::warn!("Dropping unmappable node '{}' ({})", child.name, child.id);
                        diagnostics.push(Diagnostic::warning(
                            DiagnosticKind::Mapping,
                            format!(
                                "Node '{}' ({}) matched no catalog component and was dropped",
                                child.name, child.id
                            ),
                        ));
                    }
                }
            }
        }

        Some(MappedComponentConfig {
            node_id: node.id.clone(),
            node_name: node.name.clone(),
            component: entry.name.clone(),
            entry: Some(entry),
            confidence: best.confidence,
            props,
            style,
            text,
            children,
        })
    }

    fn apply_prop_rule(&self, rule: PropRule, node: &SemanticNode, props: &mut PropMap) {
        let bounds = &node.layout.bounds;
        let geometry = node.layout.has_geometry;

        match rule {
            PropRule::SizeFromHeight => {
                if geometry {
                    props.insert("size".to_string(), json!(self.size_tier(bounds.height)));
                }
            }
            PropRule::DangerFromName => {
                let name = node.name.to_lowercase();
                if ["danger", "delete", "remove", "destructive"].iter().any(|w| name.contains(w)) {
                    props.insert("danger".to_string(), json!(true));
                }
            }
            PropRule::DisabledFromOpacity => {
                if node.styling.opacity < self.config.disabled_opacity {
                    props.insert("disabled".to_string(), json!(true));
                }
            }
            PropRule::TitleLevel => {
                let size = node.content.as_ref().and_then(|c| c.font_size).unwrap_or(0.0);
                props.insert("level".to_string(), json!(title_level(size)));
            }
            PropRule::StrongFromWeight => {
                if node.content.as_ref().and_then(|c| c.font_weight).unwrap_or(400.0) >= 600.0 {
                    props.insert("strong".to_string(), json!(true));
                }
            }
            PropRule::FlexDirection => {
                if node.layout.axis == Some(Axis::Column) {
                    props.insert("vertical".to_string(), json!(true));
                }
            }
            PropRule::GapFromSpacing => {
                if let Some(gap) = child_gap(node) {
                    props.insert("gap".to_string(), json!(gap));
                }
            }
            PropRule::DividerOrientation => {
                if geometry && bounds.height > bounds.width {
                    props.insert("type".to_string(), json!("vertical"));
                }
            }
            PropRule::AvatarShape => {
                if !is_circular(node) {
                    props.insert("shape".to_string(), json!("square"));
                }
                if geometry && bounds.width > 0.0 {
                    props.insert("size".to_string(), json!(bounds.width.round() as i64));
                }
                if let Some(src) = image_source(node) {
                    props.insert("src".to_string(), json!(src));
                }
                props.insert("alt".to_string(), json!(node.name));
            }
            PropRule::ImageAttributes => {
                if let Some(src) = image_source(node) {
                    props.insert("src".to_string(), json!(src));
                }
                props.insert("alt".to_string(), json!(node.name));
                if geometry {
                    props.insert("width".to_string(), json!(bounds.width.round() as i64));
                    props.insert("height".to_string(), json!(bounds.height.round() as i64));
                }
            }
            PropRule::TagColor => {
                if let Some(color) = &node.styling.background_color {
                    props.insert("color".to_string(), json!(color));
                }
            }
            PropRule::FormLayout => {
                let layout = match node.layout.axis {
                    Some(Axis::Row) => "inline",
                    _ => "vertical",
                };
                props.insert("layout".to_string(), json!(layout));
            }
        }
    }

    /// `small`, `middle` or `large` for a box height
    pub fn size_tier(&self, height: f64) -> &'static str {
        if height <= self.config.small_size_threshold {
            "small"
        } else if height > self.config.large_size_threshold {
            "large"
        } else {
            "middle"
        }
    }
}

/// Reference of the first image fill
fn image_source(node: &SemanticNode) -> Option<String> {
    node.styling.fills.iter().find_map(|fill| match fill {
        Fill::Image { image_ref } => image_ref.clone(),
        _ => None,
    })
}

fn is_circular(node: &SemanticNode) -> bool {
    if node.kind == NodeKind::Ellipse {
        return true;
    }
    let bounds = &node.layout.bounds;
    let shorter = bounds.width.min(bounds.height);
    node.layout.has_geometry
        && shorter > 0.0
        && node.styling.border_radius.unwrap_or(0.0) >= shorter / 2.0
}

fn title_level(font_size: f64) -> u8 {
    match font_size {
        s if s >= 38.0 => 1,
        s if s >= 30.0 => 2,
        s if s >= 24.0 => 3,
        s if s >= 20.0 => 4,
        _ => 5,
    }
}

/// Spacing between children: explicit item spacing, else the gap between
/// the first two children along the primary axis
fn child_gap(node: &SemanticNode) -> Option<i64> {
    if let Some(spacing) = node.layout.item_spacing {
        return (spacing > 0.0).then(|| spacing.round() as i64);
    }
    let axis = node.layout.axis?;
    let (first, second) = match node.children.as_slice() {
        [first, second, ..] if first.layout.has_geometry && second.layout.has_geometry => {
            (&first.layout.bounds, &second.layout.bounds)
        }
        _ => return None,
    };
    let gap = match axis {
        Axis::Row => second.x - (first.x + first.width),
        Axis::Column => second.y - (first.y + first.height),
    };
    (gap >= 1.0).then(|| gap.round() as i64)
}

fn synthesize_style(node: &SemanticNode, profile: StyleProfile) -> Option<PropMap> {
    let mut style = PropMap::new();
    let styling = &node.styling;

    match profile {
        StyleProfile::None => {}
        StyleProfile::Container => {
            if let Some(color) = &styling.background_color {
                style.insert("backgroundColor".to_string(), json!(color));
            }
            if let (Some(color), Some(width)) = (&styling.border_color, styling.border_width) {
                if width > 0.0 {
                    style.insert("border".to_string(), json!(format!("{}px solid {}", width, color)));
                }
            }
            if let Some(radius) = styling.border_radius.filter(|r| *r > 0.0) {
                style.insert("borderRadius".to_string(), number(radius));
            }
            if let Some([top, right, bottom, left]) = node.layout.padding {
                if top == right && right == bottom && bottom == left {
                    if top > 0.0 {
                        style.insert("padding".to_string(), number(top));
                    }
                } else {
                    style.insert(
                        "padding".to_string(),
                        json!(format!("{}px {}px {}px {}px", top, right, bottom, left)),
                    );
                }
            }
            if !styling.shadows.is_empty() {
                let shadows: Vec<String> = styling.shadows.iter().map(Shadow::to_css).collect();
                style.insert("boxShadow".to_string(), json!(shadows.join(", ")));
            }
            if styling.opacity < 1.0 {
                style.insert("opacity".to_string(), number(styling.opacity));
            }
        }
        StyleProfile::Typography => {
            if let Some(content) = &node.content {
                if let Some(color) = content.color.as_deref().filter(|c| *c != "#000000") {
                    style.insert("color".to_string(), json!(color));
                }
                if let Some(align) = content.alignment.filter(|a| *a != TextAlign::Left) {
                    style.insert("textAlign".to_string(), json!(align.as_css()));
                }
            }
        }
    }

    if !node.properties.visible {
        style.insert("display".to_string(), json!("none"));
    }

    if style.is_empty() {
        None
    } else {
        Some(style)
    }
}

/// Integral values become JSON integers so they print without a fraction
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!((value * 100.0).round() / 100.0)
    }
}
