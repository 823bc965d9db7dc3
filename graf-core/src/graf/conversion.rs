//! Conversion entry point
//!
//! Runs the record stream through the [`GraphBuilder`], resolves the tier
//! hierarchy from the tiers it met and assembles the metadata record.

use super::anchors::TimeSlotTable;
use super::builder::GraphBuilder;
use super::diagnostics::{Diagnostic, DiagnosticSeverity};
use super::error::GraphError;
use super::fragments::TierFragments;
use super::hierarchy::TierHierarchy;
use super::metadata::{MetadataAssembler, MetadataRecord, DEFAULT_DATA_TYPE};
use super::model::Graph;
use super::records::{LinguisticType, RawRecord};
use super::stream::RecordStream;
use serde::{Deserialize, Serialize};
use tracing::info;

pub use super::builder::AnchorPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    pub unresolved_anchor: AnchorPolicy,
    /// Written to the metafile's `file data_type`
    pub data_type: String,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        ConversionOptions {
            unresolved_anchor: AnchorPolicy::default(),
            data_type: DEFAULT_DATA_TYPE.to_string(),
        }
    }
}

/// Result of one conversion
#[derive(Debug)]
pub struct Conversion {
    pub graph: Graph,
    pub fragments: TierFragments,
    pub hierarchy: TierHierarchy,
    pub metadata: MetadataRecord,
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConversionOptions,
    linguistic_types: Vec<LinguisticType>,
    source_label: String,
}

impl Converter {
    pub fn new(options: ConversionOptions) -> Self {
        Converter {
            options,
            ..Default::default()
        }
    }

    pub fn with_linguistic_types(mut self, linguistic_types: Vec<LinguisticType>) -> Self {
        self.linguistic_types = linguistic_types;
        self
    }

    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = label.into();
        self
    }

    pub fn with_policy(mut self, policy: AnchorPolicy) -> Self {
        self.options.unresolved_anchor = policy;
        self
    }

    /// Convert an ordered record sequence
    ///
    /// Records are processed strictly in order; a fatal error stops the run
    /// and no partial graph is returned.
    pub fn convert<I>(&self, records: I, time_slots: &TimeSlotTable) -> Result<Conversion, GraphError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut builder = GraphBuilder::new(
            time_slots,
            &self.linguistic_types,
            self.options.unresolved_anchor,
        );
        for record in records {
            builder.feed(record)?;
        }
        let built = builder.finish();

        let pairs: Vec<(&str, Option<&str>)> = built
            .tiers
            .iter()
            .map(|tier| (tier.id.as_str(), tier.parent.as_deref()))
            .collect();
        let hierarchy = TierHierarchy::resolve(&pairs);

        let metadata = MetadataAssembler::new(self.source_label.as_str())
            .with_data_type(self.options.data_type.as_str())
            .assemble(hierarchy.clone(), built.tiers.clone(), &built.graph)?;

        info!(
            source = %self.source_label,
            nodes = built.graph.nodes().len(),
            edges = built.graph.edges().len(),
            tiers = built.fragments.len(),
            diagnostics = built.diagnostics.len(),
            "conversion finished"
        );

        Ok(Conversion {
            graph: built.graph,
            fragments: built.fragments,
            hierarchy,
            metadata,
            diagnostics: built.diagnostics,
        })
    }

    /// Convert a deserialized stream, using its time slots and linguistic types
    pub fn convert_stream(self, stream: &RecordStream) -> Result<Conversion, GraphError> {
        let time_slots = stream.time_slot_table();
        let converter = self.with_linguistic_types(stream.linguistic_types()?);
        converter.convert(stream.elements.iter().cloned(), &time_slots)
    }
}

/// Convert with default options and no linguistic type declarations
pub fn convert<I>(records: I, time_slots: &TimeSlotTable) -> Result<Conversion, GraphError>
where
    I: IntoIterator<Item = RawRecord>,
{
    Converter::default().convert(records, time_slots)
}
