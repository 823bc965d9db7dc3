//! Records handed over by the document parser, and their typed form
//!
//! The document parser flattens an ELAN file into an ordered list of records.
//! Each record carries its element kind, its attributes as `"NAME - value"`
//! strings, and two optional positional fields: the element it depends on and
//! its text value.
//!
//! Nothing downstream of this module scans attribute strings. [`Element::from_record`]
//! reads every field a record kind needs once, by name, and fails with
//! [`GraphError::MalformedRecord`] when a required field is missing. Reading
//! anchors by name is what keeps the source format's end-before-start
//! attribute order out of the resulting regions.

use super::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TIER: &str = "TIER";
pub const ALIGNABLE_ANNOTATION: &str = "ALIGNABLE_ANNOTATION";
pub const REF_ANNOTATION: &str = "REF_ANNOTATION";

pub const TIER_ID: &str = "TIER_ID";
pub const LINGUISTIC_TYPE_REF: &str = "LINGUISTIC_TYPE_REF";
pub const PARENT_REF: &str = "PARENT_REF";
pub const ANNOTATION_ID: &str = "ANNOTATION_ID";
pub const ANNOTATION_REF: &str = "ANNOTATION_REF";
pub const TIME_SLOT_REF1: &str = "TIME_SLOT_REF1";
pub const TIME_SLOT_REF2: &str = "TIME_SLOT_REF2";
pub const LINGUISTIC_TYPE_ID: &str = "LINGUISTIC_TYPE_ID";
pub const CONSTRAINTS: &str = "CONSTRAINTS";

const SEPARATOR: &str = " - ";

/// A record as produced by the document parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl RawRecord {
    pub fn new(kind: impl Into<String>) -> Self {
        RawRecord {
            kind: kind.into(),
            attributes: Vec::new(),
            depends: None,
            value: None,
        }
    }

    /// Append an attribute in the parser's `"NAME - value"` form
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push(format!("{}{}{}", name, SEPARATOR, value));
        self
    }

    pub fn with_depends(mut self, depends: impl Into<String>) -> Self {
        self.depends = Some(depends.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Split every attribute string into a name/value pair, keeping order
    pub fn parse_attributes(&self) -> Result<Attributes, GraphError> {
        self.attributes
            .iter()
            .map(|raw| Attribute::parse(raw, &self.kind))
            .collect::<Result<Vec<_>, _>>()
            .map(Attributes)
    }
}

/// One `NAME - value` attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse `"NAME - value"`; only the first separator splits, so values may
    /// themselves contain `" - "`.
    pub fn parse(raw: &str, kind: &str) -> Result<Self, GraphError> {
        raw.split_once(SEPARATOR)
            .map(|(name, value)| Attribute::new(name, value))
            .ok_or_else(|| {
                GraphError::malformed(kind, format!("attribute '{}' is not NAME - value", raw))
            })
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, SEPARATOR, self.value)
    }
}

/// Ordered attribute list with lookup by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    fn require(&self, name: &str, kind: &str) -> Result<String, GraphError> {
        self.get(name)
            .map(str::to_string)
            .ok_or_else(|| GraphError::malformed(kind, format!("missing {}", name)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Attribute> {
        self.0
    }
}

/// A TIER record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierElement {
    pub tier_id: String,
    pub linguistic_type_ref: String,
    /// None for a root tier
    pub parent_ref: Option<String>,
    /// Every attribute of the record, in source order
    pub attributes: Vec<Attribute>,
}

/// An ALIGNABLE_ANNOTATION record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignableElement {
    pub annotation_id: String,
    pub start_slot: String,
    pub end_slot: String,
    pub depends: Option<String>,
    pub value: String,
}

/// A REF_ANNOTATION record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceElement {
    pub annotation_id: String,
    /// Id of the annotation this one points to
    pub annotation_ref: String,
    pub value: String,
}

/// A record with its fields read according to its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Tier(TierElement),
    Alignable(AlignableElement),
    Reference(ReferenceElement),
    /// Anything else; kept verbatim for the metafile
    Other(RawRecord),
}

impl Element {
    pub fn from_record(record: RawRecord) -> Result<Self, GraphError> {
        let attributes = record.parse_attributes()?;
        let kind = record.kind.clone();
        let kind = kind.as_str();

        match kind {
            TIER => Ok(Element::Tier(TierElement {
                tier_id: attributes.require(TIER_ID, kind)?,
                linguistic_type_ref: attributes.require(LINGUISTIC_TYPE_REF, kind)?,
                parent_ref: attributes.get(PARENT_REF).map(str::to_string),
                attributes: attributes.into_vec(),
            })),
            ALIGNABLE_ANNOTATION => Ok(Element::Alignable(AlignableElement {
                annotation_id: attributes.require(ANNOTATION_ID, kind)?,
                start_slot: attributes.require(TIME_SLOT_REF1, kind)?,
                end_slot: attributes.require(TIME_SLOT_REF2, kind)?,
                value: require_value(&record)?,
                depends: record.depends,
            })),
            REF_ANNOTATION => Ok(Element::Reference(ReferenceElement {
                annotation_id: attributes.require(ANNOTATION_ID, kind)?,
                annotation_ref: attributes.require(ANNOTATION_REF, kind)?,
                value: require_value(&record)?,
            })),
            _ => Ok(Element::Other(record)),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Element::Tier(_) => TIER,
            Element::Alignable(_) => ALIGNABLE_ANNOTATION,
            Element::Reference(_) => REF_ANNOTATION,
            Element::Other(record) => &record.kind,
        }
    }
}

fn require_value(record: &RawRecord) -> Result<String, GraphError> {
    record
        .value
        .clone()
        .ok_or_else(|| GraphError::malformed(&record.kind, "missing value field"))
}

/// A linguistic type declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinguisticType {
    pub id: String,
    pub constraint: Option<String>,
    pub attributes: Vec<Attribute>,
}

impl LinguisticType {
    /// Build from the parser's `"NAME - value"` attribute list
    pub fn from_attributes(raw: &[String]) -> Result<Self, GraphError> {
        const KIND: &str = "LINGUISTIC_TYPE";
        let attributes = raw
            .iter()
            .map(|attr| Attribute::parse(attr, KIND))
            .collect::<Result<Vec<_>, _>>()
            .map(Attributes)?;

        Ok(LinguisticType {
            id: attributes.require(LINGUISTIC_TYPE_ID, KIND)?,
            constraint: attributes.get(CONSTRAINTS).map(str::to_string),
            attributes: attributes.into_vec(),
        })
    }
}
