//! Format registry for format discovery and selection
//!
//! Formats are registered and retrieved by name.

use crate::error::FormatError;
use crate::format::Format;
use crate::formats::json::JsonFormat;
use crate::formats::xml::GrafXmlFormat;
use std::collections::HashMap;

/// Registry of output formats
///
/// # Examples
///
/// ```ignore
/// let mut registry = FormatRegistry::new();
/// registry.register(GrafXmlFormat::with_indent("    "));
///
/// let format = registry.get("graf-xml")?;
/// let xml = format.serialize_metadata(&conversion.metadata)?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format
    ///
    /// If a format with the same name already exists, it will be replaced.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    /// Get a format by name
    pub fn get(&self, name: &str) -> Result<&dyn Format, FormatError> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::FormatNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// (name, description) pairs, sorted by name
    pub fn describe(&self) -> Vec<(String, String)> {
        self.list_formats()
            .into_iter()
            .map(|name| {
                let description = self.formats[&name].description().to_string();
                (name, description)
            })
            .collect()
    }

    /// Create a registry with default formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(GrafXmlFormat::default());
        registry.register(JsonFormat);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graf_core::graf::fragments::TierFragment;
    use graf_core::graf::metadata::MetadataRecord;

    struct TestFormat;
    impl Format for TestFormat {
        fn name(&self) -> &str {
            "test"
        }
        fn description(&self) -> &str {
            "Test format"
        }
        fn file_extension(&self) -> &str {
            "txt"
        }
        fn serialize_fragment(&self, fragment: &TierFragment) -> Result<String, FormatError> {
            Ok(fragment.tier_id.clone())
        }
        fn serialize_metadata(&self, _metadata: &MetadataRecord) -> Result<String, FormatError> {
            Ok("test output".to_string())
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.formats.len(), 0);
    }

    #[test]
    fn test_registry_register() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);

        assert!(registry.has("test"));
        assert_eq!(registry.list_formats(), vec!["test"]);
    }

    #[test]
    fn test_registry_get() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);

        let format = registry.get("test").unwrap();
        assert_eq!(format.name(), "test");
        assert!(!format.supports_graph());
    }

    #[test]
    fn test_registry_get_nonexistent() {
        let registry = FormatRegistry::new();
        match registry.get("nonexistent") {
            Err(FormatError::FormatNotFound(name)) => assert_eq!(name, "nonexistent"),
            _ => panic!("Expected FormatNotFound error"),
        }
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = FormatRegistry::with_defaults();
        assert_eq!(registry.list_formats(), vec!["graf-xml", "json"]);
    }

    #[test]
    fn test_registry_describe() {
        let mut registry = FormatRegistry::new();
        registry.register(TestFormat);
        assert_eq!(
            registry.describe(),
            vec![("test".to_string(), "Test format".to_string())]
        );
    }

    #[test]
    fn test_registry_replace_format() {
        let mut registry = FormatRegistry::with_defaults();
        registry.register(GrafXmlFormat::with_indent("\t"));

        assert_eq!(registry.list_formats().len(), 2);
    }
}
