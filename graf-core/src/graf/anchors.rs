//! Time-slot table and anchor resolution
//!
//! Alignable annotations reference two time slots. Before a region enters the
//! graph both are replaced by their offsets from the document's time-slot
//! table; a region never carries raw slot ids.

use super::error::GraphError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Time slot id → offset (milliseconds in ELAN files)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSlotTable {
    slots: BTreeMap<String, u64>,
}

impl TimeSlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the parser's raw string values
    ///
    /// Slots without a numeric value (unaligned slots) are left out, so any
    /// annotation referencing them fails to resolve.
    pub fn from_raw<I, K, V>(raw: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut table = Self::new();
        for (id, value) in raw {
            let id = id.into();
            match value.as_ref().trim().parse::<u64>() {
                Ok(offset) => table.insert(id, offset),
                Err(_) => debug!("time slot {} has no numeric value, skipping", id),
            }
        }
        table
    }

    pub fn insert(&mut self, id: impl Into<String>, offset: u64) {
        self.slots.insert(id.into(), offset);
    }

    pub fn get(&self, id: &str) -> Option<u64> {
        self.slots.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for TimeSlotTable {
    fn from_iter<T: IntoIterator<Item = (K, u64)>>(iter: T) -> Self {
        TimeSlotTable {
            slots: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A resolved (start, end) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPair {
    pub start: u64,
    pub end: u64,
}

/// Resolves slot references against one table
#[derive(Debug, Clone, Copy)]
pub struct AnchorResolver<'a> {
    table: &'a TimeSlotTable,
}

impl<'a> AnchorResolver<'a> {
    pub fn new(table: &'a TimeSlotTable) -> Self {
        AnchorResolver { table }
    }

    /// Resolve `start_slot` and `end_slot`, in that order
    pub fn resolve(
        &self,
        annotation_id: &str,
        start_slot: &str,
        end_slot: &str,
    ) -> Result<AnchorPair, GraphError> {
        Ok(AnchorPair {
            start: self.lookup(annotation_id, start_slot)?,
            end: self.lookup(annotation_id, end_slot)?,
        })
    }

    fn lookup(&self, annotation_id: &str, slot: &str) -> Result<u64, GraphError> {
        self.table
            .get(slot)
            .ok_or_else(|| GraphError::UnresolvedAnchor {
                annotation_id: annotation_id.to_string(),
                slot: slot.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TimeSlotTable {
        [("ts1", 10), ("ts2", 20)].into_iter().collect()
    }

    #[test]
    fn test_resolve_keeps_start_end_order() {
        let table = table();
        let resolver = AnchorResolver::new(&table);
        assert_eq!(
            resolver.resolve("a1", "ts1", "ts2").unwrap(),
            AnchorPair { start: 10, end: 20 }
        );
    }

    #[test]
    fn test_missing_slot_is_unresolved() {
        let table = table();
        let resolver = AnchorResolver::new(&table);
        let err = resolver.resolve("a1", "ts1", "ts7").unwrap_err();
        assert_eq!(
            err,
            GraphError::UnresolvedAnchor {
                annotation_id: "a1".to_string(),
                slot: "ts7".to_string(),
            }
        );
    }

    #[test]
    fn test_from_raw_drops_unaligned_slots() {
        let table = TimeSlotTable::from_raw(vec![("ts1", "1230"), ("ts2", ""), ("ts3", " 40 ")]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("ts1"), Some(1230));
        assert_eq!(table.get("ts2"), None);
        assert_eq!(table.get("ts3"), Some(40));
    }
}
