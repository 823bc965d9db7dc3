//! Per-tier GrAF fragments
//!
//! Each tier gets its own fragment: a header naming the tier it depends on and
//! the annotation space it declares, followed by the node, edge, region and
//! annotation entries built from that tier's annotations. Fragments are opened
//! on the first TIER record for a tier id, appended to while the stream is
//! dispatched, and frozen by [`FragmentRegistry::finalize`]. Finalizing only
//! moves already-resolved content; nothing is looked up at that point.

use super::anchors::AnchorPair;
use super::error::GraphError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One structural entry of a fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FragmentEntry {
    Node {
        id: String,
        /// Region the node links to
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
    Edge {
        id: String,
        from: String,
        to: String,
    },
    Region {
        id: String,
        anchors: AnchorPair,
    },
    Annotation {
        /// Annotation space active when the entry was appended
        space: String,
        label: String,
        /// Node id for alignable annotations, referenced annotation id for
        /// referential ones
        reference: String,
        id: String,
        features: BTreeMap<String, String>,
    },
}

/// The finished fragment for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierFragment {
    pub tier_id: String,
    pub depends_on: Option<String>,
    pub annotation_space: String,
    pub entries: Vec<FragmentEntry>,
}

impl TierFragment {
    fn new(tier_id: &str, depends_on: Option<&str>, annotation_space: &str) -> Self {
        TierFragment {
            tier_id: tier_id.to_string(),
            depends_on: depends_on.map(str::to_string),
            annotation_space: annotation_space.to_string(),
            entries: Vec::new(),
        }
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            FragmentEntry::Node { id, .. } => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn annotation_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            FragmentEntry::Annotation { id, .. } => Some(id.as_str()),
            _ => None,
        })
    }
}

/// Open fragments, keyed by tier id
#[derive(Debug, Default)]
pub struct FragmentRegistry {
    order: Vec<String>,
    open: HashMap<String, TierFragment>,
}

impl FragmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fragment for `tier_id`; returns false if one is already open
    pub fn open(&mut self, tier_id: &str, depends_on: Option<&str>, annotation_space: &str) -> bool {
        if self.open.contains_key(tier_id) {
            return false;
        }
        self.order.push(tier_id.to_string());
        self.open.insert(
            tier_id.to_string(),
            TierFragment::new(tier_id, depends_on, annotation_space),
        );
        true
    }

    pub fn is_open(&self, tier_id: &str) -> bool {
        self.open.contains_key(tier_id)
    }

    pub fn append(&mut self, tier_id: &str, entry: FragmentEntry) -> Result<(), GraphError> {
        let fragment = self.open.get_mut(tier_id).ok_or_else(|| {
            GraphError::malformed("fragment", format!("no fragment open for tier '{}'", tier_id))
        })?;
        fragment.entries.push(entry);
        Ok(())
    }

    /// Freeze every fragment, in the order the tiers were first seen
    pub fn finalize(mut self) -> TierFragments {
        let fragments = self
            .order
            .iter()
            .filter_map(|tier_id| self.open.remove(tier_id))
            .collect();
        TierFragments { fragments }
    }
}

/// Finished fragments, in first-seen tier order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TierFragments {
    fragments: Vec<TierFragment>,
}

impl TierFragments {
    pub fn get(&self, tier_id: &str) -> Option<&TierFragment> {
        self.fragments.iter().find(|f| f.tier_id == tier_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TierFragment> {
        self.fragments.iter()
    }

    pub fn tier_ids(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(|f| f.tier_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl<'a> IntoIterator for &'a TierFragments {
    type Item = &'a TierFragment;
    type IntoIter = std::slice::Iter<'a, TierFragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.fragments.iter()
    }
}
