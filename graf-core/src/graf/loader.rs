//! Record stream loading
//!
//! `StreamLoader` reads a serialized [`RecordStream`] from a file or a string
//! and runs the conversion on it. Used by the CLI and by tests.

use super::conversion::{Conversion, ConversionOptions, Converter};
use super::error::GraphError;
use super::stream::RecordStream;
use std::fs;
use std::path::Path;

/// Serialization syntax of a record stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSyntax {
    Json,
    Yaml,
}

impl StreamSyntax {
    /// Guess from the file extension; anything but `.yaml` / `.yml` is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => StreamSyntax::Yaml,
            _ => StreamSyntax::Json,
        }
    }
}

pub struct StreamLoader {
    source: String,
    syntax: StreamSyntax,
    /// File name used as the metadata source label
    label: Option<String>,
}

impl StreamLoader {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        Ok(StreamLoader {
            source,
            syntax: StreamSyntax::from_path(path),
            label: path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string),
        })
    }

    pub fn from_string<S: Into<String>>(source: S, syntax: StreamSyntax) -> Self {
        StreamLoader {
            source: source.into(),
            syntax,
            label: None,
        }
    }

    pub fn load(&self) -> Result<RecordStream, GraphError> {
        match self.syntax {
            StreamSyntax::Json => RecordStream::from_json(&self.source),
            StreamSyntax::Yaml => RecordStream::from_yaml(&self.source),
        }
    }

    /// Load and convert
    ///
    /// The metadata source label is the stream's own `source` field, falling
    /// back to the file stem the loader was created from.
    pub fn convert(&self, options: ConversionOptions) -> Result<Conversion, GraphError> {
        let stream = self.load()?;
        let label = stream
            .source
            .clone()
            .or_else(|| self.label.clone())
            .unwrap_or_default();
        Converter::new(options)
            .with_source_label(label)
            .convert_stream(&stream)
    }
}
