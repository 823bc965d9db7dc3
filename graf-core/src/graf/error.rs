//! Errors raised while turning a record stream into a graph

use thiserror::Error;

/// Error that can occur during conversion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// A record is missing fields required by its kind, or arrived where the
    /// dispatch context cannot accept it
    #[error("Malformed {kind} record: {reason}")]
    MalformedRecord { kind: String, reason: String },

    /// A time slot referenced by an alignable annotation has no value
    #[error("Unresolved anchor: time slot '{slot}' referenced by annotation '{annotation_id}'")]
    UnresolvedAnchor { annotation_id: String, slot: String },

    /// A node with this id already exists in the graph
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    /// An edge names a node that is not in the graph
    #[error("Edge '{edge}' references missing node '{endpoint}'")]
    DanglingEdge { edge: String, endpoint: String },

    /// An annotation id is already registered in its annotation space
    #[error("Duplicate annotation '{id}' in annotation space '{space}'")]
    DuplicateAnnotation { space: String, id: String },

    /// The serialized record stream could not be decoded
    #[error("Invalid record stream: {0}")]
    InvalidStream(String),

    /// IO error when reading a record stream
    #[error("IO error: {0}")]
    Io(String),
}

impl GraphError {
    pub(crate) fn malformed(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        GraphError::MalformedRecord {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for GraphError {
    fn from(err: std::io::Error) -> Self {
        GraphError::Io(err.to_string())
    }
}
