//! Tier dependency hierarchy
//!
//! ELAN declares tiers as a flat list where each tier may name a parent. The
//! metafile needs the nested form: every root tier once at the top level, and
//! every tier with dependents as `[tier, [children...]]`, recursively.
//!
//! # The Algorithm
//!
//! 1. Keep the first (tier, parent) pair seen for each tier id.
//! 2. Collect the children of each tier, in first-seen order.
//! 3. Walk the pairs in order. A tier whose parent is a known tier is left for
//!    its parent to emit. Every other tier is a root: emit it, then its
//!    children beneath it, marking each emitted tier gray so it is never
//!    emitted twice.
//!
//! A tier naming an unknown parent is treated as a root. Cycles are not
//! detected: tiers on a cycle are never reachable from a root and are simply
//! absent from the output.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// One entry of the nested hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TierEntry {
    /// A tier without dependents
    Leaf(String),
    /// A tier and the tiers that depend on it
    Branch(String, Vec<TierEntry>),
}

impl TierEntry {
    pub fn tier_id(&self) -> &str {
        match self {
            TierEntry::Leaf(id) | TierEntry::Branch(id, _) => id,
        }
    }

    pub fn children(&self) -> &[TierEntry] {
        match self {
            TierEntry::Leaf(_) => &[],
            TierEntry::Branch(_, children) => children,
        }
    }

    fn collect<'a>(&'a self, parent: Option<&'a str>, out: &mut Vec<(&'a str, Option<&'a str>)>) {
        out.push((self.tier_id(), parent));
        for child in self.children() {
            child.collect(Some(self.tier_id()), out);
        }
    }
}

impl fmt::Display for TierEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierEntry::Leaf(id) => write_quoted(f, id),
            TierEntry::Branch(id, children) => {
                write!(f, "[")?;
                write_quoted(f, id)?;
                write!(f, ", ")?;
                write_list(f, children)?;
                write!(f, "]")
            }
        }
    }
}

/// Quotes a tier id the way a Python string literal is printed: single
/// quotes unless the id holds a `'` and no `"`, with backslashes, the chosen
/// quote and control characters escaped.
fn write_quoted(f: &mut fmt::Formatter<'_>, id: &str) -> fmt::Result {
    let quote = if id.contains('\'') && !id.contains('"') { '"' } else { '\'' };
    write!(f, "{}", quote)?;
    for c in id.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c if c.is_ascii_control() => write!(f, "\\x{:02x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "{}", quote)
}

fn write_list(f: &mut fmt::Formatter<'_>, entries: &[TierEntry]) -> fmt::Result {
    write!(f, "[")?;
    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", entry)?;
    }
    write!(f, "]")
}

/// The nested tier hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TierHierarchy {
    entries: Vec<TierEntry>,
}

impl TierHierarchy {
    /// Resolve flat (tier, parent) pairs, given in first-seen order
    pub fn resolve<S: AsRef<str>>(pairs: &[(S, Option<S>)]) -> Self {
        let mut order: Vec<&str> = Vec::new();
        let mut parents: HashMap<&str, Option<&str>> = HashMap::new();
        for (tier, parent) in pairs {
            let tier = tier.as_ref();
            if !parents.contains_key(tier) {
                parents.insert(tier, parent.as_ref().map(|p| p.as_ref()));
                order.push(tier);
            }
        }

        let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
        for &tier in &order {
            if let Some(Some(parent)) = parents.get(tier) {
                if parents.contains_key(parent) {
                    children.entry(*parent).or_default().push(tier);
                }
            }
        }

        let mut gray: HashSet<&str> = HashSet::new();
        let mut entries = Vec::new();
        for &tier in &order {
            let has_known_parent = matches!(parents.get(tier), Some(Some(p)) if parents.contains_key(p));
            if has_known_parent || gray.contains(tier) {
                continue;
            }
            entries.push(build_entry(tier, &children, &mut gray));
        }

        TierHierarchy { entries }
    }

    pub fn entries(&self) -> &[TierEntry] {
        &self.entries
    }

    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(TierEntry::tier_id)
    }

    /// Every tier in preorder, paired with the tier it is nested under
    pub fn walk(&self) -> Vec<(&str, Option<&str>)> {
        let mut out = Vec::new();
        for entry in &self.entries {
            entry.collect(None, &mut out);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn build_entry<'a>(
    tier: &'a str,
    children: &HashMap<&'a str, Vec<&'a str>>,
    gray: &mut HashSet<&'a str>,
) -> TierEntry {
    gray.insert(tier);
    let nested: Vec<TierEntry> = children
        .get(tier)
        .map(|kids| {
            kids.iter()
                .filter(|kid| !gray.contains(*kid))
                .copied()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
        .into_iter()
        .map(|kid| build_entry(kid, children, gray))
        .collect();

    if nested.is_empty() {
        TierEntry::Leaf(tier.to_string())
    } else {
        TierEntry::Branch(tier.to_string(), nested)
    }
}

impl fmt::Display for TierHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.entries)
    }
}
