//! GrAF XML rendering of a small two-tier conversion

use graf_babel::formats::GrafXmlFormat;
use graf_babel::{Format, FormatRegistry};
use graf_core::graf::anchors::TimeSlotTable;
use graf_core::graf::records::RawRecord;
use graf_core::{Conversion, Converter};

fn conversion() -> Conversion {
    let records = vec![
        RawRecord::new("HEADER").with_attribute("TIME_UNITS", "milliseconds"),
        RawRecord::new("MEDIA_DESCRIPTOR")
            .with_attribute("MEDIA_URL", "file:///a.wav")
            .with_depends("HEADER"),
        RawRecord::new("TIER")
            .with_attribute("LINGUISTIC_TYPE_REF", "utterance")
            .with_attribute("TIER_ID", "ref"),
        RawRecord::new("ALIGNABLE_ANNOTATION")
            .with_attribute("TIME_SLOT_REF1", "ts1")
            .with_attribute("TIME_SLOT_REF2", "ts2")
            .with_attribute("ANNOTATION_ID", "a1")
            .with_value("hello & goodbye"),
        RawRecord::new("TIER")
            .with_attribute("LINGUISTIC_TYPE_REF", "words")
            .with_attribute("TIER_ID", "tx")
            .with_attribute("PARENT_REF", "ref"),
        RawRecord::new("REF_ANNOTATION")
            .with_attribute("ANNOTATION_ID", "a2")
            .with_attribute("ANNOTATION_REF", "a1")
            .with_value("hi"),
    ];
    let slots: TimeSlotTable = [("ts1", 10u64), ("ts2", 20)].into_iter().collect();
    Converter::default()
        .with_source_label("session1")
        .convert(records, &slots)
        .unwrap()
}

#[test]
fn test_alignable_tier_fragment() {
    let conversion = conversion();
    let xml = GrafXmlFormat::default()
        .serialize_fragment(conversion.fragments.get("ref").unwrap())
        .unwrap();

    insta::assert_snapshot!(xml.trim_end(), @r###"
    <?xml version="1.0" encoding="utf-8"?>
    <graph xmlns="http://www.xces.org/ns/GrAF/1.0/">
      <graphHeader>
        <labelsDecl/>
        <dependencies/>
        <annotationSpaces>
          <annotationSpace as.id="utterance"/>
        </annotationSpaces>
      </graphHeader>
      <node xml:id="ref-n1">
        <link targets="ref-r1"/>
      </node>
      <edge from="tier-n0" to="ref-n1" xml:id="ref-e1"/>
      <region anchors="10 20" xml:id="ref-r1"/>
      <a as="utterance" label="utterance" ref="ref-n1" xml:id="a1">
        <fs>
          <f name="annotation_value">hello &amp; goodbye</f>
        </fs>
      </a>
    </graph>
    "###);
}

#[test]
fn test_referential_tier_fragment() {
    let conversion = conversion();
    let xml = GrafXmlFormat::default()
        .serialize_fragment(conversion.fragments.get("tx").unwrap())
        .unwrap();

    assert!(xml.contains("    <dependencies>\n      <dependsOn f.id=\"ref\"/>\n    </dependencies>\n"));
    assert!(xml.contains("<a as=\"words\" label=\"words\" ref=\"a1\" xml:id=\"a2\">"));
    assert!(!xml.contains("<node"));
    assert!(!xml.contains("<region"));
}

#[test]
fn test_metafile() {
    let conversion = conversion();
    let xml = GrafXmlFormat::default()
        .serialize_metadata(&conversion.metadata)
        .unwrap();

    insta::assert_snapshot!(xml.trim_end(), @r###"
    <?xml version="1.0" encoding="utf-8"?>
    <metadata>
      <header_file>session1</header_file>
      <data_structure_hierarchy>[['ref', ['tx']]]</data_structure_hierarchy>
      <file data_type="Elan file">
        <miscellaneous>
          <HEADER TIME_UNITS="milliseconds">
            <MEDIA_DESCRIPTOR MEDIA_URL="file:///a.wav"/>
          </HEADER>
        </miscellaneous>
      </file>
    </metadata>
    "###);
}

#[test]
fn test_whole_graph() {
    let conversion = conversion();
    let registry = FormatRegistry::with_defaults();
    let xml = registry
        .get("graf-xml")
        .unwrap()
        .serialize_graph(&conversion.graph)
        .unwrap();

    assert!(xml.contains("<annotationSpace as.id=\"tier\"/>"));
    assert!(xml.contains("<annotationSpace as.id=\"utterance\"/>"));
    assert!(xml.contains("<annotationSpace as.id=\"words\"/>"));
    assert_eq!(xml.matches("<node ").count(), 4);
    assert_eq!(xml.matches("<edge ").count(), 1);
    assert!(xml.contains("<node xml:id=\"tx-n2\"/>"));
    assert!(xml.contains("<a as=\"words\" label=\"words\" ref=\"tx-n2\" xml:id=\"a2\">"));
}

#[test]
fn test_custom_indent() {
    let conversion = conversion();
    let xml = GrafXmlFormat::with_indent("\t")
        .serialize_metadata(&conversion.metadata)
        .unwrap();
    assert!(xml.contains("\n\t<header_file>session1</header_file>\n"));
}
