//! ELAN to GrAF conversion

pub mod anchors;
pub mod builder;
pub mod conversion;
pub mod diagnostics;
pub mod error;
pub mod fragments;
pub mod hierarchy;
pub mod loader;
pub mod metadata;
pub mod model;
pub mod records;
pub mod stream;
