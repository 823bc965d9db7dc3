//! Output planning and writing
//!
//! A conversion becomes `<base>-<tier>.<ext>` for every tier fragment, in
//! first-seen tier order, then `<base>-metafile.<ext>`, then
//! `<base>-graph.<ext>` when the format renders whole graphs.
//!
//! Tier ids come from the source document. An id containing a path
//! separator, or one that is empty, `.` or `..`, is rejected, and so is any
//! plan in which two outputs share a path (a tier named `metafile`, say).

use crate::error::FormatError;
use crate::format::Format;
use graf_core::Conversion;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A rendered file that has not been written yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedOutput {
    pub path: PathBuf,
    pub contents: String,
}

fn sibling(base: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = base
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!("{}-{}.{}", stem, suffix, extension))
}

fn check_tier_id(tier_id: &str) -> Result<(), FormatError> {
    let unsafe_id = matches!(tier_id, "" | "." | "..")
        || tier_id.contains(['/', '\\', '\0'])
        || tier_id.contains(std::path::MAIN_SEPARATOR);
    if unsafe_id {
        return Err(FormatError::UnsafeTierId(tier_id.to_string()));
    }
    Ok(())
}

pub fn plan_outputs(
    conversion: &Conversion,
    base: &Path,
    format: &dyn Format,
) -> Result<Vec<PlannedOutput>, FormatError> {
    let extension = format.file_extension();
    let mut outputs = Vec::with_capacity(conversion.fragments.len() + 2);

    for fragment in &conversion.fragments {
        check_tier_id(&fragment.tier_id)?;
        outputs.push(PlannedOutput {
            path: sibling(base, &fragment.tier_id, extension),
            contents: format.serialize_fragment(fragment)?,
        });
    }

    outputs.push(PlannedOutput {
        path: sibling(base, "metafile", extension),
        contents: format.serialize_metadata(&conversion.metadata)?,
    });

    if format.supports_graph() {
        outputs.push(PlannedOutput {
            path: sibling(base, "graph", extension),
            contents: format.serialize_graph(&conversion.graph)?,
        });
    }

    {
        let mut seen = HashSet::new();
        for output in &outputs {
            if !seen.insert(output.path.as_path()) {
                return Err(FormatError::DuplicateOutput(
                    output.path.display().to_string(),
                ));
            }
        }
    }

    Ok(outputs)
}

/// Write every planned file, creating parent directories as needed
pub fn write_outputs(outputs: &[PlannedOutput]) -> Result<(), FormatError> {
    for output in outputs {
        if let Some(parent) = output.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&output.path, &output.contents)?;
        debug!(path = %output.path.display(), bytes = output.contents.len(), "wrote output");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{GrafXmlFormat, JsonFormat};
    use graf_core::graf::anchors::TimeSlotTable;
    use graf_core::graf::records::RawRecord;
    use rstest::rstest;

    fn conversion() -> Conversion {
        let records = vec![
            RawRecord::new("TIER")
                .with_attribute("LINGUISTIC_TYPE_REF", "utterance")
                .with_attribute("TIER_ID", "ref"),
            RawRecord::new("TIER")
                .with_attribute("LINGUISTIC_TYPE_REF", "words")
                .with_attribute("TIER_ID", "tx")
                .with_attribute("PARENT_REF", "ref"),
        ];
        graf_core::convert(records, &TimeSlotTable::new()).unwrap()
    }

    #[rstest]
    #[case::xml(&GrafXmlFormat::default(), "xml")]
    #[case::json(&JsonFormat, "json")]
    fn test_plan_names(#[case] format: &dyn Format, #[case] ext: &str) {
        let outputs = plan_outputs(&conversion(), Path::new("out/session1"), format).unwrap();
        let paths: Vec<PathBuf> = outputs.into_iter().map(|o| o.path).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from(format!("out/session1-ref.{}", ext)),
                PathBuf::from(format!("out/session1-tx.{}", ext)),
                PathBuf::from(format!("out/session1-metafile.{}", ext)),
                PathBuf::from(format!("out/session1-graph.{}", ext)),
            ]
        );
    }

    fn conversion_with_tiers(tier_ids: &[&str]) -> Conversion {
        let records = tier_ids.iter().map(|id| {
            RawRecord::new("TIER")
                .with_attribute("LINGUISTIC_TYPE_REF", "words")
                .with_attribute("TIER_ID", id)
        });
        graf_core::convert(records, &TimeSlotTable::new()).unwrap()
    }

    #[rstest]
    #[case::metafile(&["metafile"], "out/session1-metafile.xml")]
    #[case::graph(&["graph"], "out/session1-graph.xml")]
    #[case::both(&["graph", "metafile"], "out/session1-metafile.xml")]
    fn test_plan_rejects_colliding_tier(#[case] tier_ids: &[&str], #[case] path: &str) {
        let result = plan_outputs(
            &conversion_with_tiers(tier_ids),
            Path::new("out/session1"),
            &GrafXmlFormat::default(),
        );
        match result {
            Err(FormatError::DuplicateOutput(duplicate)) => {
                assert_eq!(PathBuf::from(duplicate), PathBuf::from(path))
            }
            other => panic!("Expected DuplicateOutput, got {:?}", other),
        }
    }

    #[rstest]
    #[case::parent_escape("../../escape")]
    #[case::nested("a/b")]
    #[case::backslash("a\\b")]
    #[case::dot(".")]
    #[case::dot_dot("..")]
    fn test_plan_rejects_unsafe_tier_id(#[case] tier_id: &str) {
        let result = plan_outputs(
            &conversion_with_tiers(&[tier_id]),
            Path::new("out/session1"),
            &GrafXmlFormat::default(),
        );
        match result {
            Err(FormatError::UnsafeTierId(id)) => assert_eq!(id, tier_id),
            other => panic!("Expected UnsafeTierId, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_keeps_dotted_tier_ids() {
        let outputs = plan_outputs(
            &conversion_with_tiers(&["tx.v2", "gloss..old"]),
            Path::new("out/session1"),
            &JsonFormat,
        )
        .unwrap();
        assert_eq!(outputs[0].path, PathBuf::from("out/session1-tx.v2.json"));
        assert_eq!(outputs[1].path.parent(), Some(Path::new("out")));
    }

    #[test]
    fn test_write_outputs_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("session1");
        let outputs = plan_outputs(&conversion(), &base, &GrafXmlFormat::default()).unwrap();

        write_outputs(&outputs).unwrap();

        let metafile = fs::read_to_string(dir.path().join("nested/session1-metafile.xml")).unwrap();
        assert!(metafile.contains("<data_structure_hierarchy>[['ref', ['tx']]]</data_structure_hierarchy>"));
    }
}
