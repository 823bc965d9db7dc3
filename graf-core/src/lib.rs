//! # graf-core
//!
//! Converts the record stream of a time-aligned, multi-tier ELAN annotation
//! document into a GrAF standoff annotation graph.
//!
//! Layout
//!
//! The conversion is split the same way the data flows through it:
//! src/graf
//!   ├── records      Raw records from the document parser and their typed form
//!   ├── anchors      Time-slot table and anchor resolution
//!   ├── model        Graph, nodes, edges, regions, annotations
//!   ├── hierarchy    Flat (tier, parent) pairs to a nested tier tree
//!   ├── builder      The dispatcher: one step per record, explicit context
//!   ├── fragments    Per-tier GrAF fragments
//!   ├── metadata     The descriptive record for the metafile
//!   └── conversion   Entry point tying the above together
//!
//! The document parser itself lives outside this crate; it hands over a
//! [`graf::stream::RecordStream`], which [`graf::loader::StreamLoader`] can
//! read from JSON or YAML.

pub mod graf;

pub use graf::conversion::{convert, Conversion, ConversionOptions, Converter};
pub use graf::error::GraphError;
