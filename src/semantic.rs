//! Semantic tree construction from raw design documents

use crate::error::{PipelineError, Result};
use crate::types::*;

/// Builds normalized [`SemanticNode`] trees from raw design nodes.
///
/// The builder never mutates its input; every call produces a fresh tree.
pub struct SemanticTreeBuilder {
    nodes_built: usize,
    missing_geometry: usize,
}

impl SemanticTreeBuilder {
    pub fn new() -> Self {
        Self {
            nodes_built: 0,
            missing_geometry: 0,
        }
    }

    /// Build the semantic tree rooted at `subtree_id`, or at `root` when no id is given.
    pub fn ingest(&mut self, root: &RawNode, subtree_id: Option<&str>) -> Result<SemanticNode> {
        self.nodes_built = 0;
        self.missing_geometry = 0;

        let start = match subtree_id {
            Some(id) => find_subtree(root, id).ok_or_else(|| PipelineError::node_not_found(id))?,
            None => root,
        };

        log::debug!("Building semantic tree from node '{}' ({})", start.name, start.id);
        let tree = self.build_node(start);

        if self.missing_geometry > 0 {
            log::debug!(
                "{} of {} nodes had no geometry and received a zero-sized box",
                self.missing_geometry,
                self.nodes_built
            );
        }

        Ok(tree)
    }

    pub fn nodes_built(&self) -> usize {
        self.nodes_built
    }

    pub fn missing_geometry(&self) -> usize {
        self.missing_geometry
    }

    fn build_node(&mut self, raw: &RawNode) -> SemanticNode {
        self.nodes_built += 1;

        let layout = self.build_layout(raw);
        let styling = build_styling(raw);
        let content = build_content(raw);
        let properties = NodeProperties {
            visible: raw.visible.unwrap_or(true),
            locked: raw.locked.unwrap_or(false),
            sizing: raw.primary_axis_sizing_mode,
        };

        let children = raw.children.iter().map(|child| self.build_node(child)).collect();

        SemanticNode {
            id: raw.id.clone(),
            name: raw.name.clone(),
            kind: raw.kind,
            layout,
            styling,
            content,
            properties,
            children,
        }
    }

    fn build_layout(&mut self, raw: &RawNode) -> Layout {
        let (bounds, has_geometry) = match raw.absolute_bounding_box {
            Some(rect) => (sanitize_rect(rect), true),
            None => {
                self.missing_geometry += 1;
                (Rect::default(), false)
            }
        };

        let padding = if raw.padding_top.is_some()
            || raw.padding_right.is_some()
            || raw.padding_bottom.is_some()
            || raw.padding_left.is_some()
        {
            Some([
                non_negative(raw.padding_top.unwrap_or(0.0)),
                non_negative(raw.padding_right.unwrap_or(0.0)),
                non_negative(raw.padding_bottom.unwrap_or(0.0)),
                non_negative(raw.padding_left.unwrap_or(0.0)),
            ])
        } else {
            None
        };

        Layout {
            bounds,
            has_geometry,
            constraints: raw.constraints,
            axis: infer_axis(raw),
            item_spacing: raw.item_spacing.map(non_negative),
            padding,
        }
    }
}

impl Default for SemanticTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first pre-order search for the node with the given id
pub fn find_subtree<'a>(root: &'a RawNode, id: &str) -> Option<&'a RawNode> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|child| find_subtree(child, id))
}

/// Primary axis of a multi-child container.
///
/// An explicit auto-layout mode wins. Otherwise the first two children are
/// compared: `Row` when they are further apart horizontally than vertically.
pub fn infer_axis(raw: &RawNode) -> Option<Axis> {
    match raw.layout_mode {
        Some(LayoutMode::Horizontal) => return Some(Axis::Row),
        Some(LayoutMode::Vertical) => return Some(Axis::Column),
        _ => {}
    }

    if raw.children.len() < 2 {
        return None;
    }

    let first = raw.children[0].absolute_bounding_box?;
    let second = raw.children[1].absolute_bounding_box?;
    let dx = (second.x - first.x).abs();
    let dy = (second.y - first.y).abs();

    if dx > dy {
        Some(Axis::Row)
    } else {
        Some(Axis::Column)
    }
}

/// Scale a normalized channel to a byte, rounding half up
pub fn channel_to_byte(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0 + 0.5).floor() as u8
}

/// Two lowercase hex digits for a normalized channel
pub fn channel_to_hex(value: f64) -> String {
    hex::encode([channel_to_byte(value)])
}

/// `#rrggbb` for a normalized color; alpha is carried separately as opacity
pub fn normalize_color(color: &RawColor) -> String {
    let bytes = [
        channel_to_byte(color.r),
        channel_to_byte(color.g),
        channel_to_byte(color.b),
    ];
    format!("#{}", hex::encode(bytes))
}

fn build_styling(raw: &RawNode) -> Styling {
    let mut styling = Styling {
        opacity: raw.opacity.map_or(1.0, |o| o.clamp(0.0, 1.0)),
        border_radius: raw.corner_radius.map(non_negative),
        ..Default::default()
    };

    // Text fills color the glyphs, not a background
    if raw.kind != NodeKind::Text {
        styling.background_color = first_solid_color(&raw.fills);
        styling.fills = raw
            .fills
            .iter()
            .filter(|paint| paint.visible)
            .map(fill_descriptor)
            .collect();
    }

    if let Some(color) = first_solid_color(&raw.strokes) {
        styling.border_color = Some(color);
        styling.border_width = Some(non_negative(raw.stroke_weight.unwrap_or(1.0)));
    }

    styling.shadows = raw
        .effects
        .iter()
        .filter(|effect| effect.visible)
        .filter_map(shadow_descriptor)
        .collect();

    styling
}

fn build_content(raw: &RawNode) -> Option<Content> {
    if raw.kind != NodeKind::Text {
        return None;
    }
    let text = raw.characters.as_deref().filter(|t| !t.is_empty())?;
    let style = raw.style.clone().unwrap_or_default();

    Some(Content {
        text: text.to_string(),
        font_family: style.font_family,
        font_size: style.font_size,
        font_weight: style.font_weight,
        alignment: style.text_align_horizontal,
        color: first_solid_color(&raw.fills),
    })
}

fn first_solid_color(paints: &[Paint]) -> Option<String> {
    paints
        .iter()
        .filter(|paint| paint.visible && paint.kind == PaintType::Solid)
        .find_map(|paint| paint.color.as_ref())
        .map(normalize_color)
}

fn fill_descriptor(paint: &Paint) -> Fill {
    match paint.kind {
        PaintType::Solid => Fill::Solid {
            color: paint
                .color
                .as_ref()
                .map(normalize_color)
                .unwrap_or_else(|| "#000000".to_string()),
            opacity: paint.opacity.clamp(0.0, 1.0) * paint.color.map_or(1.0, |c| c.a.clamp(0.0, 1.0)),
        },
        PaintType::Image => Fill::Image {
            image_ref: paint.image_ref.clone(),
        },
        PaintType::GradientLinear => Fill::Gradient { kind: "linear".to_string() },
        PaintType::GradientRadial => Fill::Gradient { kind: "radial".to_string() },
        PaintType::GradientAngular => Fill::Gradient { kind: "angular".to_string() },
        PaintType::GradientDiamond => Fill::Gradient { kind: "diamond".to_string() },
        PaintType::Other => Fill::Gradient { kind: "unknown".to_string() },
    }
}

fn shadow_descriptor(effect: &Effect) -> Option<Shadow> {
    let inset = match effect.kind {
        EffectType::DropShadow => false,
        EffectType::InnerShadow => true,
        _ => return None,
    };
    let color = effect.color.unwrap_or(RawColor { r: 0.0, g: 0.0, b: 0.0, a: 0.25 });
    let offset = effect.offset.unwrap_or_default();

    Some(Shadow {
        inset,
        offset_x: offset.x,
        offset_y: offset.y,
        blur: non_negative(effect.radius),
        spread: effect.spread,
        color: normalize_color(&color),
        alpha: color.a.clamp(0.0, 1.0),
    })
}

fn sanitize_rect(rect: Rect) -> Rect {
    Rect {
        x: if rect.x.is_finite() { rect.x } else { 0.0 },
        y: if rect.y.is_finite() { rect.y } else { 0.0 },
        width: non_negative(rect.width),
        height: non_negative(rect.height),
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> RawNode {
        RawNode::new("0:0", "Document", NodeKind::Document).with_child(
            RawNode::new("1:1", "Page", NodeKind::Canvas).with_children(vec![
                RawNode::new("2:1", "Header", NodeKind::Frame)
                    .with_box(0.0, 0.0, 400.0, 64.0)
                    .with_children(vec![
                        RawNode::text("3:1", "Logo", "Acme").with_box(16.0, 16.0, 80.0, 32.0),
                        RawNode::text("3:2", "Nav", "Home").with_box(120.0, 20.0, 60.0, 24.0),
                    ]),
                RawNode::new("2:2", "Body", NodeKind::Frame).with_box(0.0, 64.0, 400.0, 600.0),
            ]),
        )
    }

    #[test]
    fn test_color_normalization() {
        assert_eq!(channel_to_hex(1.0), "ff");
        assert_eq!(channel_to_hex(0.0), "00");
        assert_eq!(channel_to_hex(0.5), "80");
        assert_eq!(channel_to_hex(1.7), "ff");
        assert_eq!(channel_to_hex(-0.2), "00");
        assert_eq!(normalize_color(&RawColor::rgb(1.0, 0.5, 0.0)), "#ff8000");
        // Same input, same output
        let color = RawColor::rgb(0.2, 0.4, 0.6);
        assert_eq!(normalize_color(&color), normalize_color(&color));
    }

    #[test]
    fn test_ingest_preserves_child_order() {
        let doc = sample_document();
        let mut builder = SemanticTreeBuilder::new();
        let tree = builder.ingest(&doc, None).unwrap();

        fn assert_order(raw: &RawNode, node: &SemanticNode) {
            assert_eq!(raw.children.len(), node.children.len());
            for (raw_child, child) in raw.children.iter().zip(&node.children) {
                assert_eq!(raw_child.id, child.id);
                assert_order(raw_child, child);
            }
        }
        assert_order(&doc, &tree);
        assert_eq!(builder.nodes_built(), 6);
    }

    #[test]
    fn test_ingest_subtree_by_id() {
        let doc = sample_document();
        let tree = SemanticTreeBuilder::new().ingest(&doc, Some("2:1")).unwrap();
        assert_eq!(tree.name, "Header");
        assert_eq!(tree.children.len(), 2);
    }

    #[test]
    fn test_missing_subtree_is_node_not_found() {
        let doc = sample_document();
        let err = SemanticTreeBuilder::new().ingest(&doc, Some("9:9")).unwrap_err();
        assert!(matches!(err, PipelineError::NodeNotFound { ref id } if id == "9:9"));
    }

    #[test]
    fn test_missing_geometry_gets_zero_box() {
        let doc = sample_document();
        let mut builder = SemanticTreeBuilder::new();
        let tree = builder.ingest(&doc, None).unwrap();
        assert_eq!(tree.layout.bounds, Rect::default());
        assert!(!tree.layout.has_geometry);
        assert_eq!(builder.missing_geometry(), 2);
    }

    #[test]
    fn test_negative_geometry_is_clamped() {
        let raw = RawNode::new("1", "Odd", NodeKind::Rectangle).with_box(-5.0, -5.0, -10.0, 20.0);
        let node = SemanticTreeBuilder::new().ingest(&raw, None).unwrap();
        assert_eq!(node.layout.bounds.width, 0.0);
        assert_eq!(node.layout.bounds.height, 20.0);
    }

    #[test]
    fn test_axis_inference() {
        let doc = sample_document();
        let tree = SemanticTreeBuilder::new().ingest(&doc, Some("2:1")).unwrap();
        assert_eq!(tree.layout.axis, Some(Axis::Row));

        let stacked = RawNode::new("1", "Stack", NodeKind::Frame).with_children(vec![
            RawNode::new("2", "A", NodeKind::Frame).with_box(0.0, 0.0, 100.0, 40.0),
            RawNode::new("3", "B", NodeKind::Frame).with_box(4.0, 48.0, 100.0, 40.0),
        ]);
        assert_eq!(infer_axis(&stacked), Some(Axis::Column));

        // One child without geometry: nothing to compare
        let partial = RawNode::new("1", "Partial", NodeKind::Frame).with_children(vec![
            RawNode::new("2", "A", NodeKind::Frame).with_box(0.0, 0.0, 10.0, 10.0),
            RawNode::new("3", "B", NodeKind::Frame),
        ]);
        assert_eq!(infer_axis(&partial), None);

        let mut explicit = partial.clone();
        explicit.layout_mode = Some(LayoutMode::Horizontal);
        assert_eq!(infer_axis(&explicit), Some(Axis::Row));
    }

    #[test]
    fn test_content_only_for_non_empty_text() {
        let text = RawNode::text("1", "Label", "Hello")
            .with_fill(Paint::solid(RawColor::rgb(0.0, 0.0, 0.0)));
        let node = SemanticTreeBuilder::new().ingest(&text, None).unwrap();
        let content = node.content.unwrap();
        assert_eq!(content.text, "Hello");
        assert_eq!(content.color.as_deref(), Some("#000000"));
        assert_eq!(node.styling.background_color, None);

        let empty = RawNode::text("2", "Empty", "");
        assert!(SemanticTreeBuilder::new().ingest(&empty, None).unwrap().content.is_none());

        let mut frame = RawNode::new("3", "Frame", NodeKind::Frame);
        frame.characters = Some("ignored".to_string());
        assert!(SemanticTreeBuilder::new().ingest(&frame, None).unwrap().content.is_none());
    }

    #[test]
    fn test_styling_extraction() {
        let mut raw = RawNode::new("1", "Card", NodeKind::Frame)
            .with_fill(Paint::solid(RawColor::rgb(1.0, 1.0, 1.0)))
            .with_fill(Paint::image("img-ref"));
        raw.strokes.push(Paint::solid(RawColor::rgb(0.0, 0.0, 0.0)));
        raw.stroke_weight = Some(2.0);
        raw.corner_radius = Some(8.0);
        raw.opacity = Some(0.8);
        raw.effects.push(Effect::drop_shadow(
            RawColor { r: 0.0, g: 0.0, b: 0.0, a: 0.5 },
            Vector2 { x: 0.0, y: 2.0 },
            8.0,
        ));
        raw.visible = Some(false);

        let node = SemanticTreeBuilder::new().ingest(&raw, None).unwrap();
        assert_eq!(node.styling.background_color.as_deref(), Some("#ffffff"));
        assert_eq!(node.styling.border_color.as_deref(), Some("#000000"));
        assert_eq!(node.styling.border_width, Some(2.0));
        assert_eq!(node.styling.border_radius, Some(8.0));
        assert_eq!(node.styling.opacity, 0.8);
        assert_eq!(node.styling.fills.len(), 2);
        assert!(node.styling.has_image_fill());
        assert_eq!(node.styling.shadows.len(), 1);
        assert!(!node.properties.visible);
    }
}
