//! Component catalog: sources of component definitions and the cached index

use crate::error::{PipelineError, Result};
use crate::types::{CatalogEntry, Category, ComponentDefinition, PropDef};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::sync::{Arc, PoisonError, RwLock};

pub const DEFAULT_LIBRARY_MODULE: &str = "antd";
pub const MAX_EXAMPLES: usize = 5;

lazy_static! {
    static ref COMPONENT_NAME: Regex = Regex::new(r"^[A-Z][A-Za-z0-9]*(\.[A-Z][A-Za-z0-9]*)*$").unwrap();
}

/// Supplies raw component definitions to a [`CatalogIndex`].
///
/// Unknown names return `None`; the index treats them as uncatalogued.
pub trait CatalogSource {
    fn list_components(&self) -> Vec<String>;
    fn read_component_definition(&self, name: &str) -> Option<ComponentDefinition>;
}

/// Read-through cache of catalog entries keyed by component name.
///
/// Concurrent misses on the same name may each build the entry; the first
/// insert wins and later callers receive the cached value.
pub struct CatalogIndex {
    source: Box<dyn CatalogSource + Send + Sync>,
    cache: RwLock<HashMap<String, Arc<CatalogEntry>>>,
}

impl CatalogIndex {
    pub fn new(source: impl CatalogSource + Send + Sync + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Index over the built-in Ant Design table
    pub fn builtin() -> Self {
        Self::new(BuiltinCatalog)
    }

    pub fn get(&self, name: &str) -> Option<Arc<CatalogEntry>> {
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cache.get(name) {
                return Some(Arc::clone(entry));
            }
        }

        let entry = match self.source.read_component_definition(name) {
            Some(definition) => build_entry(name, definition)?,
            None => {
                log::debug!("Component '{}' is not catalogued", name);
                return None;
            }
        };

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let cached = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(entry));
        Some(Arc::clone(cached))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn component_names(&self) -> Vec<String> {
        let mut names = self.source.list_components();
        names.sort();
        names.dedup();
        names
    }

    pub fn cached_count(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl std::fmt::Debug for CatalogIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogIndex")
            .field("cached", &self.cached_count())
            .finish()
    }
}

fn build_entry(name: &str, definition: ComponentDefinition) -> Option<CatalogEntry> {
    if !COMPONENT_NAME.is_match(name) {
        log::warn!("Ignoring catalog definition with invalid component name '{}'", name);
        return None;
    }

    let module = definition
        .module
        .unwrap_or_else(|| DEFAULT_LIBRARY_MODULE.to_string());
    let import_name = name.split('.').next().unwrap_or(name).to_string();
    let import_statement = format!("import {{ {} }} from '{}';", import_name, module);

    let properties = definition
        .accepted_properties
        .into_iter()
        .map(|mut prop| {
            if prop.default_value.is_none() && prop.type_description.trim() == "boolean" && !prop.required {
                prop.default_value = Some("false".to_string());
            }
            prop
        })
        .collect();

    let mut examples = definition.examples;
    examples.truncate(MAX_EXAMPLES);
    if examples.is_empty() {
        examples.push(format!("<{} />", name));
    }

    Some(CatalogEntry {
        name: name.to_string(),
        display_name: definition
            .display_name
            .unwrap_or_else(|| name.replace('.', " ")),
        category: definition.category.unwrap_or_else(|| infer_category(name)),
        properties,
        module,
        import_name,
        import_statement,
        examples,
    })
}

/// Category for a component name when the source does not provide one
pub fn infer_category(name: &str) -> Category {
    let root = name.split('.').next().unwrap_or(name);
    match root {
        "Button" | "Typography" | "FloatButton" => Category::General,
        "Flex" | "Space" | "Row" | "Col" | "Divider" | "Layout" | "Grid" => Category::Layout,
        "Tabs" | "Menu" | "Breadcrumb" | "Pagination" | "Steps" | "Dropdown" | "Anchor" => {
            Category::Navigation
        }
        "Input" | "InputNumber" | "Select" | "Checkbox" | "Radio" | "Switch" | "Form"
        | "DatePicker" | "TimePicker" | "Slider" | "Upload" | "Rate" => Category::DataEntry,
        "Card" | "Tag" | "Avatar" | "Image" | "List" | "Badge" | "Table" | "Tooltip"
        | "Descriptions" | "Collapse" | "Empty" | "Statistic" => Category::DataDisplay,
        "Alert" | "Spin" | "Progress" | "Result" | "Skeleton" | "Modal" | "Drawer"
        | "Popconfirm" => Category::Feedback,
        _ => Category::Other,
    }
}

// ---------------------------------------------------------------------------
// Built-in Ant Design table
// ---------------------------------------------------------------------------

const SIZE: &str = "'small' | 'middle' | 'large'";
const TEXT_TYPE: &str = "'secondary' | 'success' | 'warning' | 'danger'";

const BUILTIN_COMPONENTS: &[&str] = &[
    "Alert",
    "Avatar",
    "Badge",
    "Button",
    "Card",
    "Checkbox",
    "Col",
    "Divider",
    "Flex",
    "Form",
    "Form.Item",
    "Image",
    "Input",
    "Input.TextArea",
    "List",
    "List.Item",
    "Row",
    "Select",
    "Space",
    "Switch",
    "Tabs",
    "Tabs.TabPane",
    "Tag",
    "Typography.Paragraph",
    "Typography.Text",
    "Typography.Title",
];

/// Static description of the Ant Design v5 components the mapper targets
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl CatalogSource for BuiltinCatalog {
    fn list_components(&self) -> Vec<String> {
        BUILTIN_COMPONENTS.iter().map(|s| s.to_string()).collect()
    }

    fn read_component_definition(&self, name: &str) -> Option<ComponentDefinition> {
        let (props, examples): (Vec<PropDef>, Vec<&str>) = match name {
            "Button" => (
                vec![
                    PropDef::new("type", "'primary' | 'default' | 'dashed' | 'text' | 'link'", Some("default")),
                    PropDef::new("size", SIZE, Some("middle")),
                    PropDef::new("shape", "'default' | 'circle' | 'round'", Some("default")),
                    PropDef::new("htmlType", "'button' | 'submit' | 'reset'", Some("button")),
                    PropDef::new("danger", "boolean", None),
                    PropDef::new("disabled", "boolean", None),
                    PropDef::new("block", "boolean", None),
                    PropDef::new("loading", "boolean", None),
                    PropDef::new("icon", "ReactNode", None),
                    PropDef::new("onClick", "(event: MouseEvent) => void", None),
                ],
                vec![
                    r#"<Button type="primary">Submit</Button>"#,
                    r#"<Button danger size="small">Delete</Button>"#,
                ],
            ),
            "Input" => (
                vec![
                    PropDef::new("size", SIZE, Some("middle")),
                    PropDef::new("placeholder", "string", None),
                    PropDef::new("disabled", "boolean", None),
                    PropDef::new("allowClear", "boolean", None),
                    PropDef::new("variant", "'outlined' | 'borderless' | 'filled'", Some("outlined")),
                    PropDef::new("status", "'error' | 'warning'", None),
                    PropDef::new("prefix", "ReactNode", None),
                    PropDef::new("maxLength", "number", None),
                    PropDef::new("onChange", "(event: ChangeEvent) => void", None),
                ],
                vec![r#"<Input placeholder="Email" />"#],
            ),
            "Input.TextArea" => (
                vec![
                    PropDef::new("placeholder", "string", None),
                    PropDef::new("rows", "number", None),
                    PropDef::new("disabled", "boolean", None),
                    PropDef::new("showCount", "boolean", None),
                ],
                vec![r#"<Input.TextArea rows={4} placeholder="Message" />"#],
            ),
            "Select" => (
                vec![
                    PropDef::new("size", SIZE, Some("middle")),
                    PropDef::new("placeholder", "string", None),
                    PropDef::new("mode", "'multiple' | 'tags'", None),
                    PropDef::new("disabled", "boolean", None),
                    PropDef::new("allowClear", "boolean", None),
                    PropDef::new("options", "{ label: ReactNode; value: string }[]", None),
                    PropDef::new("onChange", "(value: string) => void", None),
                ],
                vec![r#"<Select placeholder="Country" options={[]} />"#],
            ),
            "Checkbox" => (
                vec![
                    PropDef::new("checked", "boolean", None),
                    PropDef::new("defaultChecked", "boolean", None),
                    PropDef::new("disabled", "boolean", None),
                    PropDef::new("onChange", "(event: CheckboxChangeEvent) => void", None),
                ],
                vec!["<Checkbox>Remember me</Checkbox>"],
            ),
            "Switch" => (
                vec![
                    PropDef::new("checked", "boolean", None),
                    PropDef::new("defaultChecked", "boolean", None),
                    PropDef::new("size", "'default' | 'small'", Some("default")),
                    PropDef::new("disabled", "boolean", None),
                    PropDef::new("onChange", "(checked: boolean) => void", None),
                ],
                vec!["<Switch defaultChecked />"],
            ),
            "Form" => (
                vec![
                    PropDef::new("layout", "'horizontal' | 'vertical' | 'inline'", Some("horizontal")),
                    PropDef::new("size", "'small' | 'middle' | 'large'", None),
                    PropDef::new("labelAlign", "'left' | 'right'", Some("right")),
                    PropDef::new("initialValues", "object", None),
                    PropDef::new("onFinish", "(values: object) => void", None),
                ],
                vec![r#"<Form layout="vertical"><Form.Item label="Name"><Input /></Form.Item></Form>"#],
            ),
            "Form.Item" => (
                vec![
                    PropDef::new("label", "ReactNode", None),
                    PropDef::new("name", "string | string[]", None),
                    PropDef::new("rules", "Rule[]", None),
                    PropDef::new("required", "boolean", None),
                    PropDef::new("tooltip", "ReactNode", None),
                    PropDef::new("valuePropName", "string", Some("value")),
                ],
                vec![r#"<Form.Item label="Email" name="email"><Input /></Form.Item>"#],
            ),
            "Card" => (
                vec![
                    PropDef::new("title", "ReactNode", None),
                    PropDef::new("extra", "ReactNode", None),
                    PropDef::new("bordered", "boolean", Some("true")),
                    PropDef::new("hoverable", "boolean", None),
                    PropDef::new("size", "'default' | 'small'", Some("default")),
                    PropDef::new("loading", "boolean", None),
                ],
                vec![r#"<Card title="Details">Content</Card>"#],
            ),
            "Tag" => (
                vec![
                    PropDef::new("color", "string", None),
                    PropDef::new("closable", "boolean", None),
                    PropDef::new("bordered", "boolean", Some("true")),
                    PropDef::new("icon", "ReactNode", None),
                ],
                vec![r#"<Tag color="blue">New</Tag>"#],
            ),
            "Avatar" => (
                vec![
                    PropDef::new("shape", "'circle' | 'square'", Some("circle")),
                    PropDef::new("size", "number | 'large' | 'small' | 'default'", Some("default")),
                    PropDef::new("src", "string", None),
                    PropDef::new("alt", "string", None),
                    PropDef::new("icon", "ReactNode", None),
                ],
                vec![r#"<Avatar size={40} src="/avatar.png" alt="Profile" />"#],
            ),
            "Image" => (
                vec![
                    PropDef {
                        required: true,
                        ..PropDef::new("src", "string", None)
                    },
                    PropDef::new("alt", "string", None),
                    PropDef::new("width", "string | number", None),
                    PropDef::new("height", "string | number", None),
                    PropDef::new("preview", "boolean", Some("true")),
                    PropDef::new("fallback", "string", None),
                ],
                vec![r#"<Image src="/hero.png" alt="Hero" width={320} />"#],
            ),
            "Divider" => (
                vec![
                    PropDef::new("type", "'horizontal' | 'vertical'", Some("horizontal")),
                    PropDef::new("orientation", "'left' | 'right' | 'center'", Some("center")),
                    PropDef::new("dashed", "boolean", None),
                    PropDef::new("plain", "boolean", None),
                ],
                vec!["<Divider />", r#"<Divider type="vertical" />"#],
            ),
            "Typography.Title" => (
                vec![
                    PropDef::new("level", "1 | 2 | 3 | 4 | 5", Some("1")),
                    PropDef::new("type", TEXT_TYPE, None),
                    PropDef::new("copyable", "boolean", None),
                    PropDef::new("ellipsis", "boolean", None),
                ],
                vec!["<Typography.Title level={2}>Settings</Typography.Title>"],
            ),
            "Typography.Text" => (
                vec![
                    PropDef::new("type", TEXT_TYPE, None),
                    PropDef::new("strong", "boolean", None),
                    PropDef::new("italic", "boolean", None),
                    PropDef::new("underline", "boolean", None),
                    PropDef::new("code", "boolean", None),
                    PropDef::new("disabled", "boolean", None),
                    PropDef::new("ellipsis", "boolean", None),
                ],
                vec!["<Typography.Text strong>Total</Typography.Text>"],
            ),
            "Typography.Paragraph" => (
                vec![
                    PropDef::new("type", TEXT_TYPE, None),
                    PropDef::new("strong", "boolean", None),
                    PropDef::new("ellipsis", "boolean", None),
                ],
                vec!["<Typography.Paragraph>Body copy</Typography.Paragraph>"],
            ),
            "Flex" => (
                vec![
                    PropDef::new("vertical", "boolean", None),
                    PropDef::new("wrap", "'nowrap' | 'wrap' | 'wrap-reverse'", Some("nowrap")),
                    PropDef::new("justify", "string", Some("normal")),
                    PropDef::new("align", "string", Some("normal")),
                    PropDef::new("gap", "'small' | 'middle' | 'large' | number", None),
                ],
                vec![r#"<Flex vertical gap={16}>...</Flex>"#],
            ),
            "Space" => (
                vec![
                    PropDef::new("direction", "'vertical' | 'horizontal'", Some("horizontal")),
                    PropDef::new("size", "'small' | 'middle' | 'large' | number", Some("small")),
                    PropDef::new("align", "'start' | 'end' | 'center' | 'baseline'", None),
                    PropDef::new("wrap", "boolean", None),
                ],
                vec![r#"<Space direction="vertical">...</Space>"#],
            ),
            "Row" => (
                vec![
                    PropDef::new("gutter", "number | [number, number]", Some("0")),
                    PropDef::new(
                        "justify",
                        "'start' | 'end' | 'center' | 'space-around' | 'space-between' | 'space-evenly'",
                        Some("start"),
                    ),
                    PropDef::new("align", "'top' | 'middle' | 'bottom' | 'stretch'", Some("top")),
                    PropDef::new("wrap", "boolean", Some("true")),
                ],
                vec!["<Row gutter={16}><Col span={12} /></Row>"],
            ),
            "Col" => (
                vec![
                    PropDef::new("span", "number", None),
                    PropDef::new("offset", "number", Some("0")),
                    PropDef::new("flex", "string | number", None),
                ],
                vec!["<Col span={8} />"],
            ),
            "Tabs" => (
                vec![
                    PropDef::new("items", "TabItem[]", None),
                    PropDef::new("activeKey", "string", None),
                    PropDef::new("type", "'line' | 'card' | 'editable-card'", Some("line")),
                    PropDef::new("size", "'large' | 'middle' | 'small'", Some("middle")),
                    PropDef::new("tabPosition", "'top' | 'right' | 'bottom' | 'left'", Some("top")),
                ],
                vec![r#"<Tabs items={[{ key: "1", label: "Tab 1" }]} />"#],
            ),
            "Tabs.TabPane" => (
                vec![
                    PropDef::new("tab", "ReactNode", None),
                    PropDef::new("key", "string", None),
                ],
                vec![],
            ),
            "List" => (
                vec![
                    PropDef::new("dataSource", "any[]", None),
                    PropDef::new("renderItem", "(item: any) => ReactNode", None),
                    PropDef::new("bordered", "boolean", None),
                    PropDef::new("size", "'default' | 'large' | 'small'", Some("default")),
                ],
                vec!["<List dataSource={data} renderItem={(item) => <List.Item>{item}</List.Item>} />"],
            ),
            "List.Item" => (
                vec![
                    PropDef::new("actions", "ReactNode[]", None),
                    PropDef::new("extra", "ReactNode", None),
                ],
                vec![],
            ),
            "Badge" => (
                vec![
                    PropDef::new("count", "ReactNode", None),
                    PropDef::new("dot", "boolean", None),
                    PropDef::new("status", "'success' | 'processing' | 'default' | 'error' | 'warning'", None),
                ],
                vec!["<Badge count={5}><Avatar /></Badge>"],
            ),
            "Alert" => (
                vec![
                    PropDef::new("type", "'success' | 'info' | 'warning' | 'error'", Some("info")),
                    PropDef {
                        required: true,
                        ..PropDef::new("message", "ReactNode", None)
                    },
                    PropDef::new("description", "ReactNode", None),
                    PropDef::new("showIcon", "boolean", None),
                    PropDef::new("closable", "boolean", None),
                ],
                vec![r#"<Alert type="warning" message="Unsaved changes" />"#],
            ),
            _ => return None,
        };

        Some(ComponentDefinition {
            display_name: None,
            category: Some(infer_category(name)),
            module: Some(DEFAULT_LIBRARY_MODULE.to_string()),
            accepted_properties: props,
            examples: examples.into_iter().map(str::to_string).collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// JSON file source
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(default)]
    module: Option<String>,
    #[serde(default)]
    extend_builtin: bool,
    components: BTreeMap<String, ComponentDefinition>,
}

/// Component definitions loaded from a JSON file.
///
/// ```json
/// { "module": "@acme/ui", "extendBuiltin": true,
///   "components": { "Button": { "acceptedProperties": [] } } }
/// ```
#[derive(Debug, Clone)]
pub struct JsonCatalogSource {
    components: BTreeMap<String, ComponentDefinition>,
    extend_builtin: bool,
}

impl JsonCatalogSource {
    pub fn from_json(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(content).map_err(|e| PipelineError::Catalog {
            message: format!("Invalid catalog JSON: {}", e),
        })?;

        let module = file.module;
        let components = file
            .components
            .into_iter()
            .map(|(name, mut definition)| {
                if definition.module.is_none() {
                    definition.module = module.clone();
                }
                (name, definition)
            })
            .collect();

        Ok(Self {
            components,
            extend_builtin: file.extend_builtin,
        })
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| PipelineError::FileNotFound {
            path: format!("{}: {}", path, e),
        })?;
        let source = Self::from_json(&content)?;
        log::info!("Loaded {} catalog definitions from {}", source.components.len(), path);
        Ok(source)
    }
}

impl CatalogSource for JsonCatalogSource {
    fn list_components(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.keys().cloned().collect();
        if self.extend_builtin {
            names.extend(BuiltinCatalog.list_components());
        }
        names
    }

    fn read_component_definition(&self, name: &str) -> Option<ComponentDefinition> {
        match self.components.get(name) {
            Some(definition) => Some(definition.clone()),
            None if self.extend_builtin => BuiltinCatalog.read_component_definition(name),
            None => None,
        }
    }
}
