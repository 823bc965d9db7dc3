//! GrAF XML output
//!
//! Per-tier fragments and the metafile follow the layouts documented in
//! [`serializer`]. Attribute order is fixed, so repeated conversions of the
//! same input produce byte-identical files.

pub mod serializer;

use crate::error::FormatError;
use crate::format::Format;
use graf_core::graf::fragments::TierFragment;
use graf_core::graf::metadata::MetadataRecord;
use graf_core::graf::model::Graph;

pub const DEFAULT_INDENT: &str = "  ";

/// Format implementation for GrAF XML
#[derive(Debug, Clone)]
pub struct GrafXmlFormat {
    indent: String,
}

impl GrafXmlFormat {
    pub fn with_indent(indent: impl Into<String>) -> Self {
        GrafXmlFormat {
            indent: indent.into(),
        }
    }

    pub fn indent(&self) -> &str {
        &self.indent
    }
}

impl Default for GrafXmlFormat {
    fn default() -> Self {
        Self::with_indent(DEFAULT_INDENT)
    }
}

impl Format for GrafXmlFormat {
    fn name(&self) -> &str {
        "graf-xml"
    }

    fn description(&self) -> &str {
        "GrAF standoff XML, one file per tier plus a metafile"
    }

    fn file_extension(&self) -> &str {
        "xml"
    }

    fn serialize_fragment(&self, fragment: &TierFragment) -> Result<String, FormatError> {
        Ok(serializer::serialize_fragment(fragment, &self.indent))
    }

    fn serialize_metadata(&self, metadata: &MetadataRecord) -> Result<String, FormatError> {
        Ok(serializer::serialize_metadata(metadata, &self.indent))
    }

    fn supports_graph(&self) -> bool {
        true
    }

    fn serialize_graph(&self, graph: &Graph) -> Result<String, FormatError> {
        Ok(serializer::serialize_graph(graph, &self.indent))
    }
}
