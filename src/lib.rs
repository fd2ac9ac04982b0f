//! Antforge Design-to-Component Compiler
//!
//! Converts structured design documents into React components built from the
//! Ant Design (antd) component library, then statically validates the result.
//!
//! # Features
//!
//! - Normalized semantic trees from exported design documents
//! - Heuristic, weighted mapping of design nodes onto catalog components
//! - Deterministic TSX synthesis with merged, sorted imports
//! - Static validation with categorized diagnostics and a quality score
//! - Pluggable document sources and component catalogs
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use antforge::{convert_file, Result};
//!
//! fn main() -> Result<()> {
//!     convert_file("checkout.json", "Checkout.tsx")?;
//!     Ok(())
//! }
//! ```
//!
//! # Conversion Pipeline
//!
//! 1. **Ingestion**: Document source fetch and semantic tree construction
//! 2. **Mapping**: Rule scoring and catalog component selection
//! 3. **Synthesis**: TSX source generation
//! 4. **Validation**: Structural extraction and rule checks

pub mod types;
pub mod error;
pub mod semantic;
pub mod catalog;
pub mod mapping;
pub mod codegen;
pub mod validator;
pub mod source;
pub mod cli;

use serde::Serialize;
use std::fs;
use std::sync::Arc;

// Re-export commonly used types and functions
pub use error::{PipelineError, Result};
pub use types::*;
pub use semantic::SemanticTreeBuilder;
pub use catalog::{BuiltinCatalog, CatalogIndex, CatalogSource, JsonCatalogSource};
pub use mapping::{MappingConfig, MappingEngine, Predicate, RuleEntry, RuleRegistry};
pub use codegen::{synthesize, CodeSynthesizer, SynthesisError, SynthesisOptions, SynthesisOutput};
pub use validator::{validate, ValidationResult, Validator, ValidatorOptions};
pub use source::{DocumentRef, DocumentSource, JsonFileSource, MemorySource};
pub use cli::EnhancedCli;

/// Compiler version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

pub const BUILD_INFO: PipelineInfo = PipelineInfo {
    version: VERSION,
    name: NAME,
    description: DESCRIPTION,
    target_library: "antd",
    supported_features: &[
        "auto-layout",
        "typography",
        "forms",
        "shadows",
        "image-fills",
        "custom-catalogs",
        "validation",
    ],
};

#[derive(Debug, Clone)]
pub struct PipelineInfo {
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub target_library: &'static str,
    pub supported_features: &'static [&'static str],
}

/// Conversion options and settings
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Log every phase at info level
    pub debug_mode: bool,

    /// JSON catalog file used instead of the built-in antd table
    pub catalog_path: Option<String>,

    /// Component name; defaults to the name of the converted node
    pub component_name: Option<String>,

    pub mapping: MappingConfig,
    pub synthesis: SynthesisOptions,
    pub validator: ValidatorOptions,

    /// Run the validator over the synthesized source
    pub validate_output: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            debug_mode: false,
            catalog_path: None,
            component_name: None,
            mapping: MappingConfig::default(),
            synthesis: SynthesisOptions::default(),
            validator: ValidatorOptions::default(),
            validate_output: true,
        }
    }
}

/// Conversion statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub semantic_nodes: usize,
    pub missing_geometry: usize,
    pub mapped_components: usize,
    pub dropped_nodes: usize,
    pub import_count: usize,
    pub output_size: u64,
    pub mapping_time_ms: u64,
    pub total_time_ms: u64,
    pub score: Option<u32>,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, Serialize)]
pub struct Conversion {
    pub mapped: MappedTree,
    pub output: SynthesisOutput,
    pub validation: Option<ValidationResult>,
    pub stats: PipelineStats,
}

impl Conversion {
    pub fn source_text(&self) -> &str {
        &self.output.source_text
    }

    /// Mapping and synthesis diagnostics followed by validation findings
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        let mut all: Vec<&Diagnostic> = self.mapped.diagnostics.iter().collect();
        all.extend(self.output.diagnostics.iter());
        if let Some(validation) = &self.validation {
            all.extend(validation.diagnostics());
        }
        all
    }
}

/// Build the semantic tree rooted at `subtree_id`
pub fn ingest(raw: &RawNode, subtree_id: Option<&str>) -> Result<SemanticNode> {
    SemanticTreeBuilder::new().ingest(raw, subtree_id)
}

/// Map a semantic tree with the built-in antd catalog and default weights
pub fn map_tree(root: &SemanticNode) -> MappedTree {
    MappingEngine::new(Arc::new(CatalogIndex::builtin()), MappingConfig::default()).map_tree(root)
}

/// Runs every stage with one catalog and one set of options
pub struct Pipeline {
    catalog: Arc<CatalogIndex>,
    options: PipelineOptions,
}

impl Pipeline {
    /// Loads `options.catalog_path` when set
    pub fn new(options: PipelineOptions) -> Result<Self> {
        let catalog = match &options.catalog_path {
            Some(path) => CatalogIndex::new(JsonCatalogSource::load(path)?),
            None => CatalogIndex::builtin(),
        };
        Ok(Self::with_catalog(Arc::new(catalog), options))
    }

    pub fn with_catalog(catalog: Arc<CatalogIndex>, options: PipelineOptions) -> Self {
        Self { catalog, options }
    }

    pub fn catalog(&self) -> &Arc<CatalogIndex> {
        &self.catalog
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn engine(&self) -> MappingEngine {
        MappingEngine::new(Arc::clone(&self.catalog), self.options.mapping.clone())
    }

    /// Fetch a document and convert it
    pub async fn convert<S: DocumentSource>(&self, source: &S, document: &DocumentRef) -> Result<Conversion> {
        let node_id = document.node_id.as_deref();
        if self.options.debug_mode {
            log::info!("Fetching document {}", document);
        }

        let raw = source.fetch_subtree(document, node_id).await?;
        // The source already narrowed the tree to the requested node
        self.convert_document(&raw, None)
    }

    /// Convert an in-memory raw tree
    pub fn convert_document(&self, raw: &RawNode, subtree_id: Option<&str>) -> Result<Conversion> {
        let start_time = std::time::Instant::now();
        let mut stats = PipelineStats::default();

        // Ingestion
        let mut builder = SemanticTreeBuilder::new();
        let root = builder.ingest(raw, subtree_id)?;
        stats.semantic_nodes = builder.nodes_built();
        stats.missing_geometry = builder.missing_geometry();
        if self.options.debug_mode {
            log::info!(
                "Ingestion complete: {} nodes, {} without geometry",
                stats.semantic_nodes,
                stats.missing_geometry
            );
        }

        // Mapping
        let mapping_start = std::time::Instant::now();
        let mapped = self.engine().map_tree(&root);
        stats.mapping_time_ms = mapping_start.elapsed().as_millis() as u64;
        stats.mapped_components = mapped.mapped_count();
        stats.dropped_nodes = mapped
            .diagnostics
            .iter()
            .filter(|d| d.kind == DiagnosticKind::Mapping)
            .count();
        if self.options.debug_mode {
            log::info!(
                "Mapping complete: {} components, {} nodes dropped",
                stats.mapped_components,
                stats.dropped_nodes
            );
        }

        // Synthesis
        let name = self.options.component_name.as_deref().unwrap_or(root.name.as_str());
        let output = CodeSynthesizer::new(self.options.synthesis.clone()).synthesize(&mapped, name);
        stats.import_count = output.imports.len();
        stats.output_size = output.source_text.len() as u64;
        if self.options.debug_mode {
            log::info!("Synthesized {} ({} bytes)", output.component_name, stats.output_size);
        }

        // Validation
        let validation = if self.options.validate_output {
            let result = Validator::with_catalog(Arc::clone(&self.catalog))
                .validate(&output.source_text, &self.options.validator);
            stats.score = Some(result.score);
            Some(result)
        } else {
            None
        };

        let conversion_diagnostics = mapped.diagnostics.iter().chain(output.diagnostics.iter());
        for diagnostic in conversion_diagnostics.chain(validation.iter().flat_map(|v| v.diagnostics())) {
            if diagnostic.is_error() {
                stats.error_count += 1;
            } else {
                stats.warning_count += 1;
            }
        }

        stats.total_time_ms = start_time.elapsed().as_millis() as u64;
        log::debug!("Pipeline stats: {:?}", stats);

        Ok(Conversion {
            mapped,
            output,
            validation,
            stats,
        })
    }
}

/// Convert an in-memory raw tree with default options
pub fn convert_document(raw: &RawNode, subtree_id: Option<&str>) -> Result<Conversion> {
    Pipeline::new(PipelineOptions::default())?.convert_document(raw, subtree_id)
}

/// Fetch and convert a document with default options
pub async fn convert<S: DocumentSource>(source: &S, document: &DocumentRef) -> Result<Conversion> {
    Pipeline::new(PipelineOptions::default())?.convert(source, document).await
}

/// Convert an exported JSON document file to a `.tsx` file with default options
pub fn convert_file(input_path: &str, output_path: &str) -> Result<PipelineStats> {
    convert_file_with_options(input_path, output_path, None, PipelineOptions::default())
}

/// Convert an exported JSON document file to a `.tsx` file.
///
/// `node_id` selects a subtree of the document.
pub fn convert_file_with_options(
    input_path: &str,
    output_path: &str,
    node_id: Option<&str>,
    options: PipelineOptions,
) -> Result<PipelineStats> {
    if options.debug_mode {
        log::info!("Converting '{}' to '{}'...", input_path, output_path);
        log::debug!("Pipeline options: {:?}", options);
    }

    let conversion = convert_path(input_path, node_id, options)?;
    fs::write(output_path, &conversion.output.source_text)?;

    Ok(conversion.stats)
}

/// Run the full pipeline over an exported JSON document file
pub fn convert_path(input_path: &str, node_id: Option<&str>, options: PipelineOptions) -> Result<Conversion> {
    let (source, mut document) = JsonFileSource::for_file(std::path::Path::new(input_path))?;
    document.node_id = node_id.map(str::to_string);

    let pipeline = Pipeline::new(options)?;
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(pipeline.convert(&source, &document))
}

/// Check if a feature is supported by this build
pub fn supports_feature(feature: &str) -> bool {
    BUILD_INFO.supported_features.contains(&feature)
}

pub fn build_info() -> &'static PipelineInfo {
    &BUILD_INFO
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CHECKOUT: &str = r#"{
        "name": "Checkout",
        "document": {
            "id": "0:0",
            "name": "Document",
            "type": "DOCUMENT",
            "children": [
                {
                    "id": "1:1",
                    "name": "Primary Button",
                    "type": "FRAME",
                    "absoluteBoundingBox": { "x": 0, "y": 0, "width": 120, "height": 32 },
                    "children": [
                        {
                            "id": "1:2",
                            "name": "Label",
                            "type": "TEXT",
                            "characters": "Submit",
                            "absoluteBoundingBox": { "x": 16, "y": 8, "width": 60, "height": 16 }
                        }
                    ]
                }
            ]
        }
    }"#;

    const PRIMARY_BUTTON: &str = "\
import React from 'react';
import { Button } from 'antd';

export const PrimaryButton: React.FC = () => {
  return (
    <Button size=\"middle\">Submit</Button>
  );
};

export default PrimaryButton;
";

    fn primary_button() -> RawNode {
        RawNode::new("0:0", "Document", NodeKind::Document).with_child(
            RawNode::new("1:1", "Primary Button", NodeKind::Frame)
                .with_box(0.0, 0.0, 120.0, 32.0)
                .with_child(RawNode::text("1:2", "Label", "Submit").with_box(16.0, 8.0, 60.0, 16.0)),
        )
    }

    #[test]
    fn test_primary_button_end_to_end() {
        let conversion = convert_document(&primary_button(), Some("1:1")).unwrap();

        assert_eq!(conversion.source_text(), PRIMARY_BUTTON);
        let root = conversion.mapped.root.as_ref().unwrap();
        assert_eq!(root.component, "Button");
        assert!(root.confidence >= 50);

        let validation = conversion.validation.as_ref().unwrap();
        assert!(validation.is_valid);
        assert_eq!(validation.score, 100);
        assert!(conversion.diagnostics().is_empty());

        assert_eq!(conversion.stats.semantic_nodes, 2);
        assert_eq!(conversion.stats.mapped_components, 1);
        assert_eq!(conversion.stats.dropped_nodes, 0);
        assert_eq!(conversion.stats.score, Some(100));
    }

    #[test]
    fn test_stages_compose() {
        let semantic = ingest(&primary_button(), Some("1:1")).unwrap();
        let mapped = map_tree(&semantic);
        let output = synthesize(&mapped, &semantic.name, &SynthesisOptions::default());
        let result = validate(&output.source_text, &ValidatorOptions::default());

        assert_eq!(output.source_text, PRIMARY_BUTTON);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_empty_document() {
        let raw = RawNode::new("0:0", "Document", NodeKind::Document);
        let conversion = convert_document(&raw, None).unwrap();

        assert!(conversion.mapped.is_empty());
        assert!(conversion.mapped.diagnostics.is_empty());
        assert!(conversion.source_text().contains("export const Document: React.FC = () => {"));
        assert!(conversion.source_text().contains("return null;"));
        assert_eq!(conversion.output.diagnostics.len(), 1);
        assert_eq!(conversion.output.diagnostics[0].kind, DiagnosticKind::Synthesis);
        assert_eq!(conversion.stats.mapped_components, 0);
    }

    #[test]
    fn test_missing_node_is_fatal() {
        let result = convert_document(&primary_button(), Some("9:9"));
        assert!(matches!(result, Err(PipelineError::NodeNotFound { .. })));
    }

    #[test]
    fn test_component_name_override() {
        let options = PipelineOptions {
            component_name: Some("submit-action".to_string()),
            validate_output: false,
            ..Default::default()
        };
        let conversion = Pipeline::new(options)
            .unwrap()
            .convert_document(&primary_button(), Some("1:1"))
            .unwrap();

        assert_eq!(conversion.output.component_name, "SubmitAction");
        assert!(conversion.validation.is_none());
        assert_eq!(conversion.stats.score, None);
    }

    #[tokio::test]
    async fn test_convert_from_memory_source() {
        let mut source = MemorySource::new();
        source.insert("checkout", primary_button());

        let document = DocumentRef::parse("https://example.com/design/checkout/Checkout?node-id=1-1");
        let conversion = convert(&source, &document).await.unwrap();
        assert_eq!(conversion.source_text(), PRIMARY_BUTTON);

        let missing = convert(&source, &DocumentRef::new("other")).await;
        assert!(matches!(missing, Err(PipelineError::DocumentNotFound { .. })));
    }

    #[test]
    fn test_convert_file() {
        let temp_dir = TempDir::new().unwrap();
        let input_path = temp_dir.path().join("checkout.json");
        let output_path = temp_dir.path().join("PrimaryButton.tsx");
        fs::write(&input_path, CHECKOUT).unwrap();

        let stats = convert_file_with_options(
            input_path.to_str().unwrap(),
            output_path.to_str().unwrap(),
            Some("1:1"),
            PipelineOptions::default(),
        )
        .unwrap();

        let written = fs::read_to_string(&output_path).unwrap();
        assert_eq!(written, PRIMARY_BUTTON);
        assert_eq!(stats.output_size, PRIMARY_BUTTON.len() as u64);
        assert_eq!(stats.import_count, 2);
    }

    #[test]
    fn test_convert_file_with_custom_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let input_path = temp_dir.path().join("checkout.json");
        let catalog_path = temp_dir.path().join("catalog.json");
        fs::write(&input_path, CHECKOUT).unwrap();
        fs::write(&catalog_path, r#"{ "module": "antd", "components": {} }"#).unwrap();

        let options = PipelineOptions {
            catalog_path: Some(catalog_path.to_string_lossy().into_owned()),
            ..Default::default()
        };
        let conversion = convert_path(input_path.to_str().unwrap(), Some("1:1"), options).unwrap();

        // Nothing is catalogued, so nothing maps
        assert!(conversion.mapped.is_empty());
        assert!(conversion.source_text().contains("return null;"));
    }

    #[test]
    fn test_convert_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let input_path = temp_dir.path().join("absent.json");
        let result = convert_path(input_path.to_str().unwrap(), None, PipelineOptions::default());
        assert!(matches!(result, Err(PipelineError::DocumentNotFound { .. })));
    }

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert!(!info.version.is_empty());
        assert_eq!(info.name, "antforge");
        assert_eq!(info.target_library, "antd");
        assert!(supports_feature("auto-layout"));
        assert!(!supports_feature("nonexistent_feature"));
    }

    #[test]
    fn test_pipeline_options_default() {
        let options = PipelineOptions::default();
        assert!(!options.debug_mode);
        assert!(options.validate_output);
        assert!(options.catalog_path.is_none());
        assert_eq!(options.mapping, MappingConfig::default());
        assert_eq!(options.synthesis.indent_width, 2);
    }
}
