//! The descriptive record written next to the per-tier fragments
//!
//! Besides the source label and the tier hierarchy, the record keeps every
//! non-annotation element of the source (media descriptors, properties,
//! vocabularies, ...) so the document can be rebuilt. Those elements arrive as
//! a flat list; [`nest_by_depends`] puts them back into a tree.

use super::error::GraphError;
use super::hierarchy::TierHierarchy;
use super::model::{Graph, Tier};
use super::records::{Attribute, RawRecord};
use serde::Serialize;

pub const DEFAULT_DATA_TYPE: &str = "Elan file";

/// One reconstructed non-annotation element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiscEntry {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MiscEntry>,
}

impl MiscEntry {
    fn from_record(record: &RawRecord) -> Result<Self, GraphError> {
        Ok(MiscEntry {
            tag: record.kind.clone(),
            attributes: record.parse_attributes()?.into_vec(),
            value: record.value.clone(),
            children: Vec::new(),
        })
    }
}

/// Nest records by the "has a depends field" heuristic
///
/// A record without a depends field starts a new top-level entry and becomes
/// the current parent. A record with one is attached to the current parent.
/// This is only correct when parents precede their children and siblings of
/// different parents are not interleaved; the records carry nothing better
/// to go on. A dependent record seen before any parent is kept at the top
/// level.
pub fn nest_by_depends(records: &[RawRecord]) -> Result<Vec<MiscEntry>, GraphError> {
    let mut entries: Vec<MiscEntry> = Vec::new();
    let mut parent: Option<usize> = None;

    for record in records {
        let entry = MiscEntry::from_record(record)?;
        match (&record.depends, parent) {
            (None, _) => {
                entries.push(entry);
                parent = Some(entries.len() - 1);
            }
            (Some(_), Some(index)) => entries[index].children.push(entry),
            (Some(_), None) => entries.push(entry),
        }
    }

    Ok(entries)
}

/// The metadata record of one conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataRecord {
    /// Label of the originating file
    pub source: String,
    pub data_type: String,
    pub hierarchy: TierHierarchy,
    pub tiers: Vec<Tier>,
    /// Dependency labels declared by alignable annotations
    pub dependencies: Vec<String>,
    pub miscellaneous: Vec<MiscEntry>,
}

/// Folds the hierarchy and the graph's side channel into a [`MetadataRecord`]
#[derive(Debug, Clone)]
pub struct MetadataAssembler {
    source: String,
    data_type: String,
}

impl MetadataAssembler {
    pub fn new(source: impl Into<String>) -> Self {
        MetadataAssembler {
            source: source.into(),
            data_type: DEFAULT_DATA_TYPE.to_string(),
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    pub fn assemble(
        &self,
        hierarchy: TierHierarchy,
        tiers: Vec<Tier>,
        graph: &Graph,
    ) -> Result<MetadataRecord, GraphError> {
        Ok(MetadataRecord {
            source: self.source.clone(),
            data_type: self.data_type.clone(),
            hierarchy,
            tiers,
            dependencies: graph.header().depends_on.clone(),
            miscellaneous: nest_by_depends(graph.additional_information())?,
        })
    }
}
