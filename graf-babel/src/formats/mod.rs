//! Format implementations

pub mod json;
pub mod xml;

pub use json::JsonFormat;
pub use xml::GrafXmlFormat;
