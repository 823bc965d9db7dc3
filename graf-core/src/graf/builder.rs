//! The record dispatcher
//!
//! Records are not self-contained: an annotation belongs to whichever tier
//! the last TIER record opened, and hangs from that tier's node. That state is
//! the [`DispatchContext`]. [`dispatch`] is a pure step
//! `(context, element) -> (context', deltas)`; [`GraphBuilder`] threads the
//! context through the stream and applies each step's deltas to the graph,
//! the fragment registry and the hierarchy input.
//!
//! # Ids
//!
//! Ids are derived, never counted across tiers, so two runs over the same
//! input produce the same ids:
//!
//! - tier node / annotation: `tier-n{k}` / `tier-{k}`, `k` = TIER records seen so far
//! - annotation node, region, edge: `{tier}-n{i}`, `{tier}-r{i}`, `{tier}-e{i}`,
//!   `i` = the digits of the record's own annotation id

use super::anchors::AnchorResolver;
use super::anchors::TimeSlotTable;
use super::diagnostics::{Diagnostic, DiagnosticSeverity};
use super::error::GraphError;
use super::fragments::{FragmentEntry, FragmentRegistry, TierFragments};
use super::model::{Annotation, Edge, Graph, Node, Region, Tier};
use super::records::{
    AlignableElement, Element, LinguisticType, RawRecord, ReferenceElement, TierElement,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Label of the annotation every tier node carries
pub const TIER_LABEL: &str = "tier";
/// Feature holding an annotation's text
pub const ANNOTATION_VALUE: &str = "annotation_value";

static NON_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid regex"));

/// What to do with an annotation whose time slots cannot be resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnchorPolicy {
    /// Leave the annotation out and report a diagnostic
    #[default]
    Skip,
    /// Fail the whole conversion
    Abort,
}

/// The tier annotations are currently attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierCursor {
    pub tier_id: String,
    pub linguistic_type: String,
    /// Node that new annotation nodes hang from
    pub from_node: String,
}

/// State carried from one record to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchContext {
    pub current_tier: Option<TierCursor>,
    pub tier_counter: usize,
}

/// One change produced by a dispatch step, applied in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphDelta {
    Region(Region),
    Node(Node),
    Edge(Edge),
    /// Register an annotation id in the annotation space `space`
    Index { space: String, annotation_id: String },
    Dependency(String),
    Tier(Tier),
    OpenFragment {
        tier_id: String,
        depends_on: Option<String>,
        annotation_space: String,
    },
    Fragment { tier_id: String, entry: FragmentEntry },
    Additional(RawRecord),
}

/// Read-only inputs of a dispatch step
#[derive(Debug, Clone, Copy)]
pub struct DispatchEnv<'a> {
    pub time_slots: &'a TimeSlotTable,
    pub linguistic_types: &'a [LinguisticType],
}

/// Dispatch one element against the current context
pub fn dispatch(
    context: &DispatchContext,
    element: Element,
    env: &DispatchEnv<'_>,
) -> Result<(DispatchContext, Vec<GraphDelta>), GraphError> {
    match element {
        Element::Tier(tier) => Ok(dispatch_tier(context, tier, env)),
        Element::Alignable(annotation) => {
            let cursor = require_tier(context, &annotation.annotation_id, "ALIGNABLE_ANNOTATION")?;
            let deltas = dispatch_alignable(cursor, annotation, env)?;
            Ok((context.clone(), deltas))
        }
        Element::Reference(annotation) => {
            let cursor = require_tier(context, &annotation.annotation_id, "REF_ANNOTATION")?;
            Ok((context.clone(), dispatch_reference(cursor, annotation)))
        }
        Element::Other(record) => Ok((context.clone(), vec![GraphDelta::Additional(record)])),
    }
}

fn require_tier<'c>(
    context: &'c DispatchContext,
    annotation_id: &str,
    kind: &str,
) -> Result<&'c TierCursor, GraphError> {
    context.current_tier.as_ref().ok_or_else(|| {
        GraphError::malformed(
            kind,
            format!("annotation '{}' precedes every TIER record", annotation_id),
        )
    })
}

fn dispatch_tier(
    context: &DispatchContext,
    tier: TierElement,
    env: &DispatchEnv<'_>,
) -> (DispatchContext, Vec<GraphDelta>) {
    let counter = context.tier_counter;
    let node_id = format!("tier-n{}", counter);
    let annotation_id = format!("tier-{}", counter);

    let mut annotation = Annotation::new(TIER_LABEL, annotation_id.clone());
    for attribute in &tier.attributes {
        annotation
            .features
            .insert(attribute.name.clone(), attribute.value.clone());
    }

    let constraint = env
        .linguistic_types
        .iter()
        .find(|t| t.id == tier.linguistic_type_ref)
        .and_then(|t| t.constraint.clone());

    let deltas = vec![
        GraphDelta::Node(Node::new(node_id.clone()).with_annotation(annotation)),
        GraphDelta::Index {
            space: TIER_LABEL.to_string(),
            annotation_id,
        },
        GraphDelta::Tier(Tier {
            id: tier.tier_id.clone(),
            parent: tier.parent_ref.clone(),
            linguistic_type_ref: tier.linguistic_type_ref.clone(),
            constraint,
        }),
        GraphDelta::OpenFragment {
            tier_id: tier.tier_id.clone(),
            depends_on: tier.parent_ref,
            annotation_space: tier.linguistic_type_ref.clone(),
        },
    ];

    let next = DispatchContext {
        current_tier: Some(TierCursor {
            tier_id: tier.tier_id,
            linguistic_type: tier.linguistic_type_ref,
            from_node: node_id,
        }),
        tier_counter: counter + 1,
    };
    (next, deltas)
}

fn dispatch_alignable(
    cursor: &TierCursor,
    annotation: AlignableElement,
    env: &DispatchEnv<'_>,
) -> Result<Vec<GraphDelta>, GraphError> {
    let anchors = AnchorResolver::new(env.time_slots).resolve(
        &annotation.annotation_id,
        &annotation.start_slot,
        &annotation.end_slot,
    )?;

    let index = annotation_index(&annotation.annotation_id);
    let node_id = format!("{}-n{}", cursor.tier_id, index);
    let region_id = format!("{}-r{}", cursor.tier_id, index);
    let edge_id = format!("{}-e{}", cursor.tier_id, index);
    let label = cursor.linguistic_type.clone();

    let graph_annotation = Annotation::new(label.clone(), annotation.annotation_id.clone())
        .with_feature(ANNOTATION_VALUE, annotation.value);

    let mut deltas = vec![
        GraphDelta::Region(Region::new(region_id.clone(), anchors)),
        GraphDelta::Node(
            Node::new(node_id.clone())
                .with_annotation(graph_annotation.clone())
                .with_region(region_id.clone()),
        ),
        GraphDelta::Edge(Edge::new(
            edge_id.clone(),
            cursor.from_node.clone(),
            node_id.clone(),
        )),
        GraphDelta::Index {
            space: label.clone(),
            annotation_id: annotation.annotation_id,
        },
    ];
    if let Some(depends) = annotation.depends {
        deltas.push(GraphDelta::Dependency(depends));
    }

    let tier_id = &cursor.tier_id;
    let fragment = |entry: FragmentEntry| GraphDelta::Fragment {
        tier_id: tier_id.clone(),
        entry,
    };
    deltas.push(fragment(FragmentEntry::Node {
        id: node_id.clone(),
        link: Some(region_id.clone()),
    }));
    deltas.push(fragment(FragmentEntry::Edge {
        id: edge_id,
        from: cursor.from_node.clone(),
        to: node_id.clone(),
    }));
    deltas.push(fragment(FragmentEntry::Region {
        id: region_id,
        anchors,
    }));
    deltas.push(fragment(FragmentEntry::Annotation {
        space: label.clone(),
        label,
        reference: node_id,
        id: graph_annotation.id,
        features: graph_annotation.features,
    }));

    Ok(deltas)
}

fn dispatch_reference(cursor: &TierCursor, annotation: ReferenceElement) -> Vec<GraphDelta> {
    let index = annotation_index(&annotation.annotation_id);
    let node_id = format!("{}-n{}", cursor.tier_id, index);
    let label = cursor.linguistic_type.clone();

    let graph_annotation = Annotation::new(label.clone(), annotation.annotation_id.clone())
        .with_feature(ANNOTATION_VALUE, annotation.value);

    vec![
        GraphDelta::Node(Node::new(node_id).with_annotation(graph_annotation.clone())),
        GraphDelta::Index {
            space: label.clone(),
            annotation_id: annotation.annotation_id,
        },
        GraphDelta::Fragment {
            tier_id: cursor.tier_id.clone(),
            entry: FragmentEntry::Annotation {
                space: label.clone(),
                label,
                reference: annotation.annotation_ref,
                id: graph_annotation.id,
                features: graph_annotation.features,
            },
        },
    ]
}

/// The digits of an annotation id (`a12` → `12`); ids without digits are
/// used whole
pub fn annotation_index(annotation_id: &str) -> String {
    let digits = NON_DIGIT.replace_all(annotation_id, "");
    if digits.is_empty() {
        annotation_id.to_string()
    } else {
        digits.into_owned()
    }
}

/// Everything the builder produced, before hierarchy and metadata assembly
#[derive(Debug)]
pub struct BuiltGraph {
    pub graph: Graph,
    pub fragments: TierFragments,
    /// Distinct tiers in first-seen order
    pub tiers: Vec<Tier>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Threads the dispatch context through a record stream
#[derive(Debug)]
pub struct GraphBuilder<'a> {
    env: DispatchEnv<'a>,
    policy: AnchorPolicy,
    context: DispatchContext,
    graph: Graph,
    fragments: FragmentRegistry,
    tiers: Vec<Tier>,
    /// Annotation id → node id, for checking referential annotations
    annotation_nodes: HashMap<String, String>,
    diagnostics: Vec<Diagnostic>,
    position: usize,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        time_slots: &'a TimeSlotTable,
        linguistic_types: &'a [LinguisticType],
        policy: AnchorPolicy,
    ) -> Self {
        GraphBuilder {
            env: DispatchEnv {
                time_slots,
                linguistic_types,
            },
            policy,
            context: DispatchContext::default(),
            graph: Graph::new(),
            fragments: FragmentRegistry::new(),
            tiers: Vec::new(),
            annotation_nodes: HashMap::new(),
            diagnostics: Vec::new(),
            position: 0,
        }
    }

    pub fn context(&self) -> &DispatchContext {
        &self.context
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Type a raw record and dispatch it
    pub fn feed(&mut self, record: RawRecord) -> Result<(), GraphError> {
        let element = Element::from_record(record)?;
        self.feed_element(element)
    }

    pub fn feed_element(&mut self, element: Element) -> Result<(), GraphError> {
        let position = self.position;
        self.position += 1;
        debug!(record = position, kind = element.kind(), "dispatching record");

        let reference = match &element {
            Element::Reference(r) => Some((r.annotation_id.clone(), r.annotation_ref.clone())),
            _ => None,
        };

        match dispatch(&self.context, element, &self.env) {
            Ok((context, deltas)) => {
                for delta in deltas {
                    self.apply(delta)?;
                }
                self.context = context;
                if let Some((annotation_id, target)) = reference {
                    self.check_reference(position, &annotation_id, &target);
                }
                Ok(())
            }
            Err(GraphError::UnresolvedAnchor {
                annotation_id,
                slot,
            }) if self.policy == AnchorPolicy::Skip => {
                warn!(
                    record = position,
                    annotation = %annotation_id,
                    slot = %slot,
                    "skipping annotation with unresolved anchor"
                );
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Error,
                        position,
                        format!(
                            "annotation '{}' skipped: time slot '{}' has no value",
                            annotation_id, slot
                        ),
                    )
                    .with_code("unresolved-anchor"),
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn check_reference(&mut self, position: usize, annotation_id: &str, target: &str) {
        if !self.annotation_nodes.contains_key(target) {
            warn!(
                record = position,
                annotation = %annotation_id,
                target = %target,
                "referential annotation points to an unknown annotation"
            );
            self.diagnostics.push(
                Diagnostic::new(
                    DiagnosticSeverity::Warning,
                    position,
                    format!(
                        "annotation '{}' refers to unknown annotation '{}'",
                        annotation_id, target
                    ),
                )
                .with_code("unknown-reference"),
            );
        }
    }

    fn apply(&mut self, delta: GraphDelta) -> Result<(), GraphError> {
        match delta {
            GraphDelta::Region(region) => self.graph.add_region(region),
            GraphDelta::Node(node) => {
                for annotation in &node.annotations {
                    self.annotation_nodes
                        .insert(annotation.id.clone(), node.id.clone());
                }
                self.graph.add_node(node)?;
            }
            GraphDelta::Edge(edge) => self.graph.add_edge(edge)?,
            GraphDelta::Index {
                space,
                annotation_id,
            } => self.graph.index_annotation(&space, &annotation_id)?,
            GraphDelta::Dependency(label) => {
                self.graph.add_dependency(&label);
            }
            GraphDelta::Tier(tier) => {
                if !self.tiers.iter().any(|t| t.id == tier.id) {
                    self.tiers.push(tier);
                }
            }
            GraphDelta::OpenFragment {
                tier_id,
                depends_on,
                annotation_space,
            } => {
                self.fragments
                    .open(&tier_id, depends_on.as_deref(), &annotation_space);
            }
            GraphDelta::Fragment { tier_id, entry } => self.fragments.append(&tier_id, entry)?,
            GraphDelta::Additional(record) => self.graph.push_additional(record),
        }
        Ok(())
    }

    pub fn finish(self) -> BuiltGraph {
        BuiltGraph {
            graph: self.graph,
            fragments: self.fragments.finalize(),
            tiers: self.tiers,
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graf::records::{
        ALIGNABLE_ANNOTATION, ANNOTATION_ID, ANNOTATION_REF, LINGUISTIC_TYPE_REF, PARENT_REF,
        REF_ANNOTATION, TIER, TIER_ID, TIME_SLOT_REF1, TIME_SLOT_REF2,
    };
    use rstest::rstest;

    fn tier(id: &str, ling_type: &str, parent: Option<&str>) -> Element {
        let mut record = RawRecord::new(TIER)
            .with_attribute(LINGUISTIC_TYPE_REF, ling_type)
            .with_attribute(TIER_ID, id);
        if let Some(parent) = parent {
            record = record.with_attribute(PARENT_REF, parent);
        }
        Element::from_record(record).unwrap()
    }

    fn alignable(id: &str, start: &str, end: &str, value: &str) -> Element {
        Element::from_record(
            RawRecord::new(ALIGNABLE_ANNOTATION)
                .with_attribute(TIME_SLOT_REF2, end)
                .with_attribute(TIME_SLOT_REF1, start)
                .with_attribute(ANNOTATION_ID, id)
                .with_depends("ANNOTATION")
                .with_value(value),
        )
        .unwrap()
    }

    fn reference(id: &str, target: &str, value: &str) -> Element {
        Element::from_record(
            RawRecord::new(REF_ANNOTATION)
                .with_attribute(ANNOTATION_REF, target)
                .with_attribute(ANNOTATION_ID, id)
                .with_value(value),
        )
        .unwrap()
    }

    fn slots() -> TimeSlotTable {
        [("ts1", 10), ("ts2", 20)].into_iter().collect()
    }

    #[rstest]
    #[case("a1", "1")]
    #[case("a120", "120")]
    #[case("ann_3b4", "34")]
    #[case("first", "first")]
    fn test_annotation_index(#[case] id: &str, #[case] expected: &str) {
        assert_eq!(annotation_index(id), expected);
    }

    #[test]
    fn test_tier_step_advances_context() {
        let table = slots();
        let env = DispatchEnv {
            time_slots: &table,
            linguistic_types: &[],
        };
        let (context, deltas) =
            dispatch(&DispatchContext::default(), tier("tx", "words", Some("ref")), &env).unwrap();

        assert_eq!(context.tier_counter, 1);
        assert_eq!(
            context.current_tier,
            Some(TierCursor {
                tier_id: "tx".to_string(),
                linguistic_type: "words".to_string(),
                from_node: "tier-n0".to_string(),
            })
        );
        match &deltas[0] {
            GraphDelta::Node(node) => {
                assert_eq!(node.id, "tier-n0");
                let annotation = &node.annotations[0];
                assert_eq!(annotation.label, "tier");
                assert_eq!(annotation.id, "tier-0");
                assert_eq!(annotation.feature("TIER_ID"), Some("tx"));
                assert_eq!(annotation.feature("PARENT_REF"), Some("ref"));
            }
            other => panic!("Expected node delta, got {:?}", other),
        }
        assert!(deltas.contains(&GraphDelta::OpenFragment {
            tier_id: "tx".to_string(),
            depends_on: Some("ref".to_string()),
            annotation_space: "words".to_string(),
        }));
    }

    #[test]
    fn test_tier_constraint_from_linguistic_type() {
        let table = slots();
        let types = vec![LinguisticType::from_attributes(&[
            "LINGUISTIC_TYPE_ID - words".to_string(),
            "CONSTRAINTS - Symbolic_Subdivision".to_string(),
        ])
        .unwrap()];
        let env = DispatchEnv {
            time_slots: &table,
            linguistic_types: &types,
        };

        let (_, deltas) = dispatch(&DispatchContext::default(), tier("tx", "words", None), &env).unwrap();
        let (_, other) = dispatch(&DispatchContext::default(), tier("ft", "free", None), &env).unwrap();

        let constraint_of = |deltas: &[GraphDelta]| {
            deltas.iter().find_map(|d| match d {
                GraphDelta::Tier(t) => Some(t.constraint.clone()),
                _ => None,
            })
        };
        assert_eq!(
            constraint_of(&deltas),
            Some(Some("Symbolic_Subdivision".to_string()))
        );
        assert_eq!(constraint_of(&other), Some(None));
    }

    #[test]
    fn test_annotation_before_tier_is_malformed() {
        let table = slots();
        let env = DispatchEnv {
            time_slots: &table,
            linguistic_types: &[],
        };
        let err = dispatch(
            &DispatchContext::default(),
            alignable("a1", "ts1", "ts2", "hello"),
            &env,
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::MalformedRecord { .. }));
    }

    #[test]
    fn test_single_alignable_annotation() {
        let table = slots();
        let mut builder = GraphBuilder::new(&table, &[], AnchorPolicy::Skip);
        builder.feed_element(tier("tx", "words", None)).unwrap();
        builder
            .feed_element(alignable("a1", "ts1", "ts2", "hello"))
            .unwrap();
        let built = builder.finish();
        let graph = &built.graph;

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.edges(), &[Edge::new("tx-e1", "tier-n0", "tx-n1")]);
        assert_eq!(graph.regions().len(), 1);
        assert_eq!(graph.regions()[0].anchors.start, 10);
        assert_eq!(graph.regions()[0].anchors.end, 20);

        let node = graph.node("tx-n1").unwrap();
        assert_eq!(node.region.as_deref(), Some("tx-r1"));
        let annotation = &node.annotations[0];
        assert_eq!(annotation.label, "words");
        assert_eq!(annotation.feature(ANNOTATION_VALUE), Some("hello"));
        assert_eq!(graph.header().depends_on, vec!["ANNOTATION".to_string()]);

        let children: Vec<_> = graph.children("tier-n0").map(|n| n.id.as_str()).collect();
        assert_eq!(children, vec!["tx-n1"]);
    }

    #[test]
    fn test_reference_annotation_adds_no_region_or_edge() {
        let table = slots();
        let mut builder = GraphBuilder::new(&table, &[], AnchorPolicy::Skip);
        builder.feed_element(tier("tx", "words", None)).unwrap();
        builder
            .feed_element(alignable("a1", "ts1", "ts2", "hello"))
            .unwrap();
        builder
            .feed_element(tier("gl", "gloss", Some("tx")))
            .unwrap();
        builder.feed_element(reference("a2", "a1", "HELLO")).unwrap();
        let built = builder.finish();

        assert_eq!(built.graph.edges().len(), 1);
        assert_eq!(built.graph.regions().len(), 1);
        let node = built.graph.node("gl-n2").unwrap();
        assert_eq!(node.region, None);
        assert_eq!(node.annotations[0].label, "gloss");
        assert!(built.diagnostics.is_empty());

        let fragment = built.fragments.get("gl").unwrap();
        assert_eq!(fragment.node_ids().count(), 0);
        match &fragment.entries[0] {
            FragmentEntry::Annotation { reference, id, .. } => {
                assert_eq!(reference, "a1");
                assert_eq!(id, "a2");
            }
            other => panic!("Expected annotation entry, got {:?}", other),
        }
    }

    #[test]
    fn test_reference_to_unknown_annotation_is_reported() {
        let table = slots();
        let mut builder = GraphBuilder::new(&table, &[], AnchorPolicy::Skip);
        builder.feed_element(tier("gl", "gloss", None)).unwrap();
        builder.feed_element(reference("a2", "a99", "x")).unwrap();
        let built = builder.finish();

        assert_eq!(built.diagnostics.len(), 1);
        assert_eq!(built.diagnostics[0].severity, DiagnosticSeverity::Warning);
        assert!(built.graph.contains_node("gl-n2"));
    }

    #[rstest]
    #[case(AnchorPolicy::Skip, true)]
    #[case(AnchorPolicy::Abort, false)]
    fn test_unresolved_anchor_policy(#[case] policy: AnchorPolicy, #[case] succeeds: bool) {
        let table = slots();
        let mut builder = GraphBuilder::new(&table, &[], policy);
        builder.feed_element(tier("tx", "words", None)).unwrap();
        let result = builder.feed_element(alignable("a1", "ts1", "ts9", "lost"));

        assert_eq!(result.is_ok(), succeeds);
        if succeeds {
            let built = builder.finish();
            assert_eq!(built.graph.nodes().len(), 1);
            assert_eq!(built.diagnostics[0].code.as_deref(), Some("unresolved-anchor"));
        } else {
            assert!(matches!(result, Err(GraphError::UnresolvedAnchor { .. })));
        }
    }

    #[test]
    fn test_other_records_go_to_additional_information() {
        let table = slots();
        let mut builder = GraphBuilder::new(&table, &[], AnchorPolicy::Skip);
        let record = RawRecord::new("HEADER").with_attribute("MEDIA_FILE", "");
        builder.feed(record.clone()).unwrap();
        builder.feed_element(tier("tx", "words", None)).unwrap();
        let built = builder.finish();

        assert_eq!(built.graph.additional_information(), &[record]);
        assert_eq!(built.tiers.len(), 1);
    }

    #[test]
    fn test_repeated_tier_opens_one_fragment() {
        let table = slots();
        let mut builder = GraphBuilder::new(&table, &[], AnchorPolicy::Skip);
        builder.feed_element(tier("tx", "words", None)).unwrap();
        builder.feed_element(tier("tx", "words", None)).unwrap();
        assert_eq!(builder.context().tier_counter, 2);
        let built = builder.finish();

        assert_eq!(built.fragments.len(), 1);
        assert_eq!(built.tiers.len(), 1);
        assert!(built.graph.contains_node("tier-n0"));
        assert!(built.graph.contains_node("tier-n1"));
    }
}
