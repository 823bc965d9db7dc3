//! Format trait definition
//!
//! Every output format renders the three products of a conversion: a tier
//! fragment, the metadata record and, if it can, the whole graph.

use crate::error::FormatError;
use graf_core::graf::fragments::TierFragment;
use graf_core::graf::metadata::MetadataRecord;
use graf_core::graf::model::Graph;

/// Trait for output formats
///
/// # Examples
///
/// ```ignore
/// struct MyFormat;
///
/// impl Format for MyFormat {
///     fn name(&self) -> &str {
///         "my-format"
///     }
///
///     fn file_extension(&self) -> &str {
///         "txt"
///     }
///
///     fn serialize_fragment(&self, fragment: &TierFragment) -> Result<String, FormatError> {
///         Ok(fragment.tier_id.clone())
///     }
///
///     fn serialize_metadata(&self, metadata: &MetadataRecord) -> Result<String, FormatError> {
///         Ok(metadata.hierarchy.to_string())
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "graf-xml", "json")
    fn name(&self) -> &str;

    /// Optional description of this format
    fn description(&self) -> &str {
        ""
    }

    /// Extension of the files written in this format, without the dot
    fn file_extension(&self) -> &str;

    /// Render one tier's fragment
    fn serialize_fragment(&self, fragment: &TierFragment) -> Result<String, FormatError>;

    /// Render the metafile
    fn serialize_metadata(&self, metadata: &MetadataRecord) -> Result<String, FormatError>;

    /// Whether this format can render the whole graph as one document
    fn supports_graph(&self) -> bool {
        false
    }

    /// Render the whole graph
    ///
    /// Default implementation returns NotSupported error.
    fn serialize_graph(&self, _graph: &Graph) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support whole-graph rendering",
            self.name()
        )))
    }
}
