//! Error types for the antforge pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node not found: no node with id '{id}' exists in the document")]
    NodeNotFound { id: String },

    #[error("Document not found: {reference}")]
    DocumentNotFound { reference: String },

    #[error("Access denied to document {reference}: {message}")]
    AccessDenied { reference: String, message: String },

    #[error("Rate limited by document source{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Document source unreachable: {message}")]
    Unreachable { message: String },

    #[error("Catalog error: {message}")]
    Catalog { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Validation failed: {failed} of {total} files have errors")]
    ValidationFailed { failed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {}s)", secs),
        None => String::new(),
    }
}

impl PipelineError {
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    pub fn document_not_found(reference: impl Into<String>) -> Self {
        Self::DocumentNotFound {
            reference: reference.into(),
        }
    }

    pub fn access_denied(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AccessDenied {
            reference: reference.into(),
            message: message.into(),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }

    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Errors raised before any tree exists; the caller gets no artifact.
    pub fn is_ingestion_error(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound { .. }
                | Self::DocumentNotFound { .. }
                | Self::AccessDenied { .. }
                | Self::RateLimited { .. }
                | Self::Unreachable { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PipelineError::node_not_found("12:34");
        assert_eq!(
            err.to_string(),
            "Node not found: no node with id '12:34' exists in the document"
        );

        let err = PipelineError::RateLimited { retry_after_secs: Some(30) };
        assert_eq!(err.to_string(), "Rate limited by document source (retry after 30s)");

        let err = PipelineError::RateLimited { retry_after_secs: None };
        assert_eq!(err.to_string(), "Rate limited by document source");
    }

    #[test]
    fn test_ingestion_classification() {
        assert!(PipelineError::node_not_found("1:1").is_ingestion_error());
        assert!(PipelineError::unreachable("timeout").is_ingestion_error());
        assert!(!PipelineError::invalid_format("bad").is_ingestion_error());
    }
}
