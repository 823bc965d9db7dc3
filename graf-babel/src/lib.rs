//! Output formats for GrAF conversions
//!
//!     This crate turns the result of a graf-core conversion into files: one GrAF fragment per
//!     tier, a metafile describing the source document, and optionally the whole graph. It is a
//!     pure lib; writing to disk is limited to [`output::write_outputs`] and everything shell
//!     related lives in graf-cli.
//!
//! Architecture
//!
//!     - Format trait: uniform interface for all output formats
//!     - FormatRegistry: discovery and selection of formats by name
//!     - Format implementations: GrAF XML and JSON
//!     - Output planning: which file gets which rendering
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── output.rs               # File naming and writing
//!     ├── formats
//!     │   ├── xml                 # GrAF XML fragments and metafile
//!     │   └── json                # serde_json rendering
//!     └── lib.rs

pub mod error;
pub mod format;
pub mod formats;
pub mod output;
pub mod registry;

pub use error::FormatError;
pub use format::Format;
pub use output::{plan_outputs, write_outputs, PlannedOutput};
pub use registry::FormatRegistry;
