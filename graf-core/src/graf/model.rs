//! The annotation graph
//!
//! A [`Graph`] holds nodes, the edges between them, the regions they cover
//! and an index of annotation spaces. Nodes own their annotations and link to
//! at most one region. The graph refuses duplicate node ids and edges whose
//! endpoints are not already present, so a finished graph never has dangling
//! references.

use super::anchors::AnchorPair;
use super::error::GraphError;
use super::records::RawRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// A tier as declared by the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub id: String,
    /// None for a root tier
    pub parent: Option<String>,
    pub linguistic_type_ref: String,
    /// Constraint of the tier's linguistic type, if it declares one
    pub constraint: Option<String>,
}

/// A labelled feature structure attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    /// Linguistic type label (or `tier` for tier annotations)
    pub label: String,
    pub id: String,
    pub features: BTreeMap<String, String>,
}

impl Annotation {
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Annotation {
            label: label.into(),
            id: id.into(),
            features: BTreeMap::new(),
        }
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.features.insert(name.into(), value.into());
        self
    }

    pub fn feature(&self, name: &str) -> Option<&str> {
        self.features.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: String,
    pub annotations: Vec<Annotation>,
    /// Id of the region this node covers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            annotations: Vec::new(),
            region: None,
        }
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_region(mut self, region_id: impl Into<String>) -> Self {
        self.region = Some(region_id.into());
        self
    }
}

/// Directed link between two nodes; owns neither
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Edge {
            id: id.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

/// A resolved temporal span
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub id: String,
    pub anchors: AnchorPair,
}

impl Region {
    pub fn new(id: impl Into<String>, anchors: AnchorPair) -> Self {
        Region {
            id: id.into(),
            anchors,
        }
    }
}

/// Secondary index of annotation ids sharing a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotationSpace {
    pub name: String,
    annotation_ids: Vec<String>,
}

impl AnnotationSpace {
    pub fn new(name: impl Into<String>) -> Self {
        AnnotationSpace {
            name: name.into(),
            annotation_ids: Vec::new(),
        }
    }

    /// Returns false if the id is already in this space
    pub fn add(&mut self, annotation_id: impl Into<String>) -> bool {
        let annotation_id = annotation_id.into();
        if self.contains(&annotation_id) {
            return false;
        }
        self.annotation_ids.push(annotation_id);
        true
    }

    pub fn contains(&self, annotation_id: &str) -> bool {
        self.annotation_ids.iter().any(|id| id == annotation_id)
    }

    pub fn annotation_ids(&self) -> &[String] {
        &self.annotation_ids
    }

    pub fn len(&self) -> usize {
        self.annotation_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotation_ids.is_empty()
    }
}

/// Dependency labels declared by alignable annotations, first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphHeader {
    pub depends_on: Vec<String>,
}

impl GraphHeader {
    pub fn add_dependency(&mut self, label: &str) -> bool {
        if self.depends_on.iter().any(|d| d == label) {
            return false;
        }
        self.depends_on.push(label.to_string());
        true
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    nodes: Vec<Node>,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    regions: Vec<Region>,
    annotation_spaces: BTreeMap<String, AnnotationSpace>,
    header: GraphHeader,
    /// Non-annotation records, kept for reconstructing the source document
    additional_information: Vec<RawRecord>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.node_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Both endpoints must already be nodes of this graph
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        for endpoint in [&edge.from, &edge.to] {
            if !self.contains_node(endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge: edge.id.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn add_region(&mut self, region: Region) {
        self.regions.push(region);
    }

    /// Register an annotation id under its label's space, creating the space
    /// on first use
    pub fn index_annotation(&mut self, space: &str, annotation_id: &str) -> Result<(), GraphError> {
        let added = self
            .annotation_spaces
            .entry(space.to_string())
            .or_insert_with(|| AnnotationSpace::new(space))
            .add(annotation_id);
        if !added {
            return Err(GraphError::DuplicateAnnotation {
                space: space.to_string(),
                id: annotation_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn add_dependency(&mut self, label: &str) -> bool {
        self.header.add_dependency(label)
    }

    pub fn push_additional(&mut self, record: RawRecord) {
        self.additional_information.push(record);
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Nodes reached by an edge leaving `id`
    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.from == id)
            .filter_map(move |edge| self.node(&edge.to))
    }

    pub fn annotation_space(&self, name: &str) -> Option<&AnnotationSpace> {
        self.annotation_spaces.get(name)
    }

    pub fn annotation_spaces(&self) -> impl Iterator<Item = &AnnotationSpace> {
        self.annotation_spaces.values()
    }

    pub fn header(&self) -> &GraphHeader {
        &self.header
    }

    pub fn additional_information(&self) -> &[RawRecord] {
        &self.additional_information
    }

    /// Every annotation in the graph, in node order
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.nodes.iter().flat_map(|node| node.annotations.iter())
    }
}
