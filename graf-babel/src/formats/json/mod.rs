//! JSON output
//!
//! Pretty-printed serde_json rendering of the conversion products. Useful for
//! inspecting a conversion or feeding it to tools without a GrAF reader.

use crate::error::FormatError;
use crate::format::Format;
use graf_core::graf::fragments::TierFragment;
use graf_core::graf::metadata::MetadataRecord;
use graf_core::graf::model::Graph;

pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "Pretty-printed JSON of fragments, metadata and the graph"
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    fn serialize_fragment(&self, fragment: &TierFragment) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(fragment)?)
    }

    fn serialize_metadata(&self, metadata: &MetadataRecord) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(metadata)?)
    }

    fn supports_graph(&self) -> bool {
        true
    }

    fn serialize_graph(&self, graph: &Graph) -> Result<String, FormatError> {
        Ok(serde_json::to_string_pretty(graph)?)
    }
}
