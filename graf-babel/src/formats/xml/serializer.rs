//! Indented XML writer and the GrAF document layouts
//!
//! ## Tier fragment
//!
//! ```text
//! <graph xmlns="http://www.xces.org/ns/GrAF/1.0/">
//!   <graphHeader>
//!     <labelsDecl/>
//!     <dependencies>
//!       <dependsOn f.id="ref"/>
//!     </dependencies>
//!     <annotationSpaces>
//!       <annotationSpace as.id="words"/>
//!     </annotationSpaces>
//!   </graphHeader>
//!   <node xml:id="tx-n1">
//!     <link targets="tx-r1"/>
//!   </node>
//!   <edge from="tier-n0" to="tx-n1" xml:id="tx-e1"/>
//!   <region anchors="10 20" xml:id="tx-r1"/>
//!   <a as="words" label="words" ref="tx-n1" xml:id="a1">
//!     <fs>
//!       <f name="annotation_value">hello</f>
//!     </fs>
//!   </a>
//! </graph>
//! ```
//!
//! ## Metafile
//!
//! ```text
//! <metadata>
//!   <header_file>session1</header_file>
//!   <data_structure_hierarchy>[['ref', ['tx']]]</data_structure_hierarchy>
//!   <file data_type="Elan file">
//!     <miscellaneous>
//!       <HEADER TIME_UNITS="milliseconds">
//!         <MEDIA_DESCRIPTOR MEDIA_URL="file:///a.wav"/>
//!       </HEADER>
//!     </miscellaneous>
//!   </file>
//! </metadata>
//! ```

use graf_core::graf::anchors::AnchorPair;
use graf_core::graf::fragments::{FragmentEntry, TierFragment};
use graf_core::graf::metadata::{MetadataRecord, MiscEntry};
use graf_core::graf::model::Graph;
use std::collections::BTreeMap;

pub const GRAF_NAMESPACE: &str = "http://www.xces.org/ns/GrAF/1.0/";
const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

struct XmlWriter<'a> {
    output: String,
    indent: &'a str,
    level: usize,
}

impl<'a> XmlWriter<'a> {
    fn new(indent: &'a str) -> Self {
        XmlWriter {
            output: XML_DECLARATION.to_string(),
            indent,
            level: 0,
        }
    }

    fn push_open_tag(&mut self, tag: &str, attributes: &[(&str, &str)]) {
        for _ in 0..self.level {
            self.output.push_str(self.indent);
        }
        self.output.push('<');
        self.output.push_str(tag);
        for (name, value) in attributes {
            self.output
                .push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
    }

    /// `<tag ...>` followed by nested content
    fn start(&mut self, tag: &str, attributes: &[(&str, &str)]) {
        self.start_text(tag, attributes, None);
    }

    /// `<tag ...>text` followed by nested content
    fn start_text(&mut self, tag: &str, attributes: &[(&str, &str)], text: Option<&str>) {
        self.push_open_tag(tag, attributes);
        self.output.push('>');
        if let Some(text) = text {
            self.output.push_str(&escape_text(text));
        }
        self.output.push('\n');
        self.level += 1;
    }

    fn end(&mut self, tag: &str) {
        self.level -= 1;
        for _ in 0..self.level {
            self.output.push_str(self.indent);
        }
        self.output.push_str(&format!("</{}>\n", tag));
    }

    fn empty(&mut self, tag: &str, attributes: &[(&str, &str)]) {
        self.push_open_tag(tag, attributes);
        self.output.push_str("/>\n");
    }

    fn text(&mut self, tag: &str, attributes: &[(&str, &str)], text: &str) {
        self.push_open_tag(tag, attributes);
        self.output
            .push_str(&format!(">{}</{}>\n", escape_text(text), tag));
    }

    fn finish(self) -> String {
        self.output
    }
}

/// Escape character data
fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape a double-quoted attribute value
fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('\"', "&quot;")
}

fn anchors_text(anchors: &AnchorPair) -> String {
    format!("{} {}", anchors.start, anchors.end)
}

fn write_header<'s>(
    writer: &mut XmlWriter<'_>,
    depends_on: impl IntoIterator<Item = &'s str>,
    annotation_spaces: impl IntoIterator<Item = &'s str>,
) {
    writer.start("graphHeader", &[]);
    writer.empty("labelsDecl", &[]);

    let depends_on: Vec<&str> = depends_on.into_iter().collect();
    if depends_on.is_empty() {
        writer.empty("dependencies", &[]);
    } else {
        writer.start("dependencies", &[]);
        for id in depends_on {
            writer.empty("dependsOn", &[("f.id", id)]);
        }
        writer.end("dependencies");
    }

    writer.start("annotationSpaces", &[]);
    for space in annotation_spaces {
        writer.empty("annotationSpace", &[("as.id", space)]);
    }
    writer.end("annotationSpaces");

    writer.end("graphHeader");
}

fn write_node(writer: &mut XmlWriter<'_>, id: &str, link: Option<&str>) {
    match link {
        Some(region) => {
            writer.start("node", &[("xml:id", id)]);
            writer.empty("link", &[("targets", region)]);
            writer.end("node");
        }
        None => writer.empty("node", &[("xml:id", id)]),
    }
}

fn write_annotation(
    writer: &mut XmlWriter<'_>,
    space: &str,
    label: &str,
    reference: &str,
    id: &str,
    features: &BTreeMap<String, String>,
) {
    writer.start(
        "a",
        &[("as", space), ("label", label), ("ref", reference), ("xml:id", id)],
    );
    writer.start("fs", &[]);
    for (name, value) in features {
        writer.text("f", &[("name", name.as_str())], value);
    }
    writer.end("fs");
    writer.end("a");
}

pub fn serialize_fragment(fragment: &TierFragment, indent: &str) -> String {
    let mut writer = XmlWriter::new(indent);
    writer.start("graph", &[("xmlns", GRAF_NAMESPACE)]);
    write_header(
        &mut writer,
        fragment.depends_on.as_deref(),
        [fragment.annotation_space.as_str()],
    );

    for entry in &fragment.entries {
        match entry {
            FragmentEntry::Node { id, link } => write_node(&mut writer, id, link.as_deref()),
            FragmentEntry::Edge { id, from, to } => {
                writer.empty(
                    "edge",
                    &[("from", from.as_str()), ("to", to.as_str()), ("xml:id", id.as_str())],
                );
            }
            FragmentEntry::Region { id, anchors } => {
                writer.empty(
                    "region",
                    &[("anchors", anchors_text(anchors).as_str()), ("xml:id", id.as_str())],
                );
            }
            FragmentEntry::Annotation {
                space,
                label,
                reference,
                id,
                features,
            } => write_annotation(&mut writer, space, label, reference, id, features),
        }
    }

    writer.end("graph");
    writer.finish()
}

fn write_misc(writer: &mut XmlWriter<'_>, entry: &MiscEntry) {
    let attributes: Vec<(&str, &str)> = entry
        .attributes
        .iter()
        .map(|a| (a.name.as_str(), a.value.as_str()))
        .collect();

    if entry.children.is_empty() {
        match &entry.value {
            Some(value) => writer.text(&entry.tag, &attributes, value),
            None => writer.empty(&entry.tag, &attributes),
        }
        return;
    }

    writer.start_text(&entry.tag, &attributes, entry.value.as_deref());
    for child in &entry.children {
        write_misc(writer, child);
    }
    writer.end(&entry.tag);
}

pub fn serialize_metadata(metadata: &MetadataRecord, indent: &str) -> String {
    let mut writer = XmlWriter::new(indent);
    writer.start("metadata", &[]);
    writer.text("header_file", &[], &metadata.source);
    writer.text(
        "data_structure_hierarchy",
        &[],
        &metadata.hierarchy.to_string(),
    );

    writer.start("file", &[("data_type", metadata.data_type.as_str())]);
    if metadata.miscellaneous.is_empty() {
        writer.empty("miscellaneous", &[]);
    } else {
        writer.start("miscellaneous", &[]);
        for entry in &metadata.miscellaneous {
            write_misc(&mut writer, entry);
        }
        writer.end("miscellaneous");
    }
    writer.end("file");

    writer.end("metadata");
    writer.finish()
}

/// The whole graph as one GrAF document: regions, nodes, edges, then annotations
pub fn serialize_graph(graph: &Graph, indent: &str) -> String {
    let mut writer = XmlWriter::new(indent);
    writer.start("graph", &[("xmlns", GRAF_NAMESPACE)]);
    write_header(
        &mut writer,
        graph.header().depends_on.iter().map(String::as_str),
        graph.annotation_spaces().map(|space| space.name.as_str()),
    );

    for region in graph.regions() {
        writer.empty(
            "region",
            &[
                ("anchors", anchors_text(&region.anchors).as_str()),
                ("xml:id", region.id.as_str()),
            ],
        );
    }
    for node in graph.nodes() {
        write_node(&mut writer, &node.id, node.region.as_deref());
    }
    for edge in graph.edges() {
        writer.empty(
            "edge",
            &[
                ("from", edge.from.as_str()),
                ("to", edge.to.as_str()),
                ("xml:id", edge.id.as_str()),
            ],
        );
    }
    for node in graph.nodes() {
        for annotation in &node.annotations {
            write_annotation(
                &mut writer,
                &annotation.label,
                &annotation.label,
                &node.id,
                &annotation.id,
                &annotation.features,
            );
        }
    }

    writer.end("graph");
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escaping() {
        assert_eq!(escape_text(r#"<a & "b" 'c'>"#), r#"&lt;a &amp; "b" 'c'&gt;"#);
        assert_eq!(
            escape_attribute(r#"<a & "b" 'c'>"#),
            "&lt;a &amp; &quot;b&quot; 'c'&gt;"
        );
    }

    #[test]
    fn test_writer_nesting_and_indent() {
        let mut writer = XmlWriter::new("\t");
        writer.start("outer", &[("k", "v")]);
        writer.empty("inner", &[]);
        writer.text("leaf", &[], "x < y");
        writer.end("outer");

        assert_eq!(
            writer.finish(),
            format!(
                "{}<outer k=\"v\">\n\t<inner/>\n\t<leaf>x &lt; y</leaf>\n</outer>\n",
                XML_DECLARATION
            )
        );
    }
}
