//! Design document sources

use crate::error::{PipelineError, Result};
use crate::semantic::find_subtree;
use crate::types::RawNode;
use serde_json::Value;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Identifies one design document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub key: String,
    /// Node selected in a share link, if any
    pub node_id: Option<String>,
}

impl DocumentRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            node_id: None,
        }
    }

    /// Accepts a bare key or a share link such as
    /// `https://host/design/<key>/Title?node-id=12-34`
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();
        let (path, query) = match reference.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (reference, None),
        };

        let segments: Vec<&str> = path.split('/').collect();
        let key = segments
            .iter()
            .position(|s| matches!(*s, "file" | "design" | "proto"))
            .and_then(|i| segments.get(i + 1))
            .copied()
            .unwrap_or(path)
            .to_string();

        let node_id = query.and_then(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(name, _)| *name == "node-id")
                .map(|(_, value)| value.replace("%3A", ":").replace('-', ":"))
        });

        Self { key, node_id }
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(node) => write!(f, "{}#{}", self.key, node),
            None => write!(f, "{}", self.key),
        }
    }
}

/// Supplies raw trees; awaited once per request
#[allow(async_fn_in_trait)]
pub trait DocumentSource {
    /// The document root, or the subtree rooted at `node_id`
    async fn fetch_subtree(&self, document: &DocumentRef, node_id: Option<&str>) -> Result<RawNode>;
}

/// Pull the root node out of an exported document.
///
/// Accepts a bare node, `{ "document": node }`, or a node-lookup response
/// `{ "nodes": { id: { "document": node } } }`.
pub fn parse_document(content: &str, node_id: Option<&str>) -> Result<RawNode> {
    let mut value: Value = serde_json::from_str(content)?;

    if let Some(id) = node_id {
        if let Some(node) = value.get_mut("nodes").and_then(|nodes| nodes.get_mut(id)) {
            let node = match node.get_mut("document") {
                Some(document) => document.take(),
                None => node.take(),
            };
            return Ok(serde_json::from_value(node)?);
        }
    }

    let root = match value.get_mut("document") {
        Some(document) => document.take(),
        None => value,
    };
    if !root.is_object() {
        return Err(PipelineError::invalid_format("document root is not an object"));
    }
    Ok(serde_json::from_value(root)?)
}

fn select(root: RawNode, node_id: Option<&str>) -> Result<RawNode> {
    match node_id {
        None => Ok(root),
        Some(id) if root.id == id => Ok(root),
        Some(id) => find_subtree(&root, id)
            .cloned()
            .ok_or_else(|| PipelineError::node_not_found(id)),
    }
}

/// Reads `<root>/<key>.json` exports
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    root: PathBuf,
}

impl JsonFileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Source and reference for a single exported file
    pub fn for_file(path: &Path) -> Result<(Self, DocumentRef)> {
        let key = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| PipelineError::invalid_format(format!("not a document path: {}", path.display())))?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok((Self::new(root), DocumentRef::new(key)))
    }

    pub fn path_for(&self, document: &DocumentRef) -> PathBuf {
        self.root.join(format!("{}.json", document.key))
    }
}

impl DocumentSource for JsonFileSource {
    async fn fetch_subtree(&self, document: &DocumentRef, node_id: Option<&str>) -> Result<RawNode> {
        let path = self.path_for(document);
        log::debug!("Reading document {} from {}", document, path.display());

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => PipelineError::document_not_found(document.key.clone()),
            ErrorKind::PermissionDenied => PipelineError::access_denied(document.key.clone(), e.to_string()),
            _ => PipelineError::unreachable(format!("{}: {}", path.display(), e)),
        })?;

        let root = parse_document(&content, node_id)?;
        select(root, node_id)
    }
}

/// Documents held in memory, keyed by document key
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, RawNode>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, root: RawNode) {
        self.documents.insert(key.into(), root);
    }
}

impl DocumentSource for MemorySource {
    async fn fetch_subtree(&self, document: &DocumentRef, node_id: Option<&str>) -> Result<RawNode> {
        let root = self
            .documents
            .get(&document.key)
            .cloned()
            .ok_or_else(|| PipelineError::document_not_found(document.key.clone()))?;
        select(root, node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeKind;
    use std::fs;
    use tempfile::TempDir;

    const EXPORT: &str = r#"{
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
                        { "id": "1:2", "name": "Label", "type": "TEXT", "characters": "Submit" }
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_reference() {
        let reference = DocumentRef::parse("https://example.com/design/AbC123/Checkout?node-id=1-1&t=x");
        assert_eq!(reference.key, "AbC123");
        assert_eq!(reference.node_id.as_deref(), Some("1:1"));
        assert_eq!(reference.to_string(), "AbC123#1:1");

        let reference = DocumentRef::parse("AbC123");
        assert_eq!(reference, DocumentRef::new("AbC123"));
    }

    #[test]
    fn test_parse_document_shapes() {
        let root = parse_document(EXPORT, None).unwrap();
        assert_eq!(root.kind, NodeKind::Document);

        let bare = r#"{ "id": "5:5", "name": "Card", "type": "FRAME" }"#;
        assert_eq!(parse_document(bare, None).unwrap().id, "5:5");

        let nodes = r#"{ "nodes": { "1:2": { "document": { "id": "1:2", "name": "Label", "type": "TEXT" } } } }"#;
        assert_eq!(parse_document(nodes, Some("1:2")).unwrap().kind, NodeKind::Text);

        assert!(matches!(
            parse_document("[1, 2]", None),
            Err(PipelineError::InvalidFormat { .. })
        ));
        assert!(matches!(parse_document("{", None), Err(PipelineError::Json(_))));
    }

    #[tokio::test]
    async fn test_json_file_source() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("checkout.json"), EXPORT).unwrap();
        let source = JsonFileSource::new(dir.path());
        let document = DocumentRef::new("checkout");

        let root = source.fetch_subtree(&document, None).await.unwrap();
        assert_eq!(root.children.len(), 1);

        let button = source.fetch_subtree(&document, Some("1:1")).await.unwrap();
        assert_eq!(button.name, "Primary Button");

        let missing = source.fetch_subtree(&document, Some("9:9")).await;
        assert!(matches!(missing, Err(PipelineError::NodeNotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_document() {
        let dir = TempDir::new().unwrap();
        let source = JsonFileSource::new(dir.path());
        let result = source.fetch_subtree(&DocumentRef::new("nope"), None).await;
        match result {
            Err(e @ PipelineError::DocumentNotFound { .. }) => assert!(e.is_ingestion_error()),
            other => panic!("expected DocumentNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_for_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkout.json");
        fs::write(&path, EXPORT).unwrap();

        let (source, document) = JsonFileSource::for_file(&path).unwrap();
        assert_eq!(document.key, "checkout");
        assert!(source.fetch_subtree(&document, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_memory_source() {
        let mut source = MemorySource::new();
        source.insert("doc", RawNode::new("0:0", "Document", NodeKind::Document));
        assert!(source.fetch_subtree(&DocumentRef::new("doc"), None).await.is_ok());
        assert!(matches!(
            source.fetch_subtree(&DocumentRef::new("other"), None).await,
            Err(PipelineError::DocumentNotFound { .. })
        ));
    }
}
