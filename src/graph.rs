// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Renderable graph types shared by the line and global builders

use crate::types::{LineId, RelationId, Strength};
use anyhow::{Context, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Separator between the parts of a serialized shadow identifier
pub const SHADOW_SEPARATOR: &str = "@@";

// =========================================================================
// Node Identity
// =========================================================================

/// Which side of the subject product a shadow node sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Source of a directed relation into the subject
    Upstream,
    /// Target of a directed relation out of the subject
    Downstream,
}

impl Role {
    /// Short tag used in serialized identifiers
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Upstream => "UP",
            Self::Downstream => "DN",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "UP" => Some(Self::Upstream),
            "DN" => Some(Self::Downstream),
            _ => None,
        }
    }
}

/// One product in one relational context: (code, role, origin line, strength)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShadowKey {
    /// Product the shadow stands in for
    pub code: String,
    /// Upstream or downstream of the subject
    pub role: Role,
    /// Line the underlying relation belongs to
    pub line_id: LineId,
    /// Strength of the underlying relation
    pub strength: Strength,
}

/// Identifier of a rendered node
///
/// Kept structured internally; only turned into a string at the render
/// boundary, so product codes containing the separator cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// A product under its bare code
    Product(String),
    /// A product within one relational context
    Shadow(ShadowKey),
}

impl NodeId {
    /// Node for a product under its bare code
    pub fn product(code: impl Into<String>) -> Self {
        Self::Product(code.into())
    }

    /// Shadow node for a product in one context
    pub fn shadow(
        code: impl Into<String>,
        role: Role,
        line_id: LineId,
        strength: Strength,
    ) -> Self {
        Self::Shadow(ShadowKey {
            code: code.into(),
            role,
            line_id,
            strength,
        })
    }

    /// Product code this node stands for
    #[must_use]
    pub fn base_code(&self) -> &str {
        match self {
            Self::Product(code) => code,
            Self::Shadow(key) => &key.code,
        }
    }

    /// Recover an identifier from its rendered form.
    ///
    /// The base code is everything before the first separator. Anything that
    /// does not look like a full shadow identifier is read as a bare code.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(SHADOW_SEPARATOR);
        let code = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        if let [role, line, strength] = rest.as_slice() {
            let role = Role::from_tag(role);
            let line = line.strip_prefix('L').and_then(|l| l.parse::<LineId>().ok());
            let strength = Strength::parse(strength);
            if let (Some(role), Some(line_id), Some(strength)) = (role, line, strength) {
                return Self::shadow(code, role, line_id, strength);
            }
        }
        if rest.is_empty() {
            Self::product(raw)
        } else {
            Self::product(code)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(code) => f.write_str(code),
            Self::Shadow(key) => write!(
                f,
                "{code}{sep}{role}{sep}L{line}{sep}{strength}",
                code = key.code,
                sep = SHADOW_SEPARATOR,
                role = key.role.tag(),
                line = key.line_id,
                strength = key.strength,
            ),
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =========================================================================
// Nodes and Edges
// =========================================================================

/// Node shape understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeShape {
    /// Round thumbnail
    #[serde(rename = "circularImage")]
    CircularImage,
    /// Plain labelled box
    #[serde(rename = "box")]
    Box,
}

/// A renderable node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    /// Node identifier
    pub id: NodeId,
    /// Multi-line label
    pub label: String,
    /// Hover text
    pub title: String,
    /// Shape
    pub shape: NodeShape,
    /// Rendered size
    pub size: u32,
    /// `data:` URI of the thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Label colour
    pub font_color: String,
    /// Fixed horizontal coordinate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Fixed vertical coordinate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Pinned at (x, y); the renderer must not move it
    pub fixed: bool,
    /// Hierarchical tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl GraphNode {
    /// Whether an image payload was attached
    #[must_use]
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }
}

/// Identity of an edge for de-duplication.
///
/// Directed edges keep (source, target) order; undirected edges store the
/// sorted pair so both traversal directions map to one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    a: NodeId,
    b: NodeId,
    directed: bool,
    strength: Strength,
    relation_id: RelationId,
}

/// A renderable edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    /// Underlying relation, serialised as the renderer's edge `id`
    #[serde(rename = "id")]
    pub relation_id: RelationId,
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Drawn with an arrow head
    pub directed: bool,
    /// Drawn dashed
    pub dashes: bool,
    /// Text on the edge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Hover text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip)]
    strength: Strength,
}

impl GraphEdge {
    /// Build an edge; weak relations are dashed, blank labels are dropped
    #[must_use]
    pub fn new(
        relation_id: RelationId,
        source: NodeId,
        target: NodeId,
        directed: bool,
        strength: Strength,
        label: Option<&str>,
    ) -> Self {
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from);
        Self {
            relation_id,
            source,
            target,
            directed,
            dashes: strength == Strength::Weak,
            title: label.clone(),
            label,
            strength,
        }
    }

    /// Strength of the underlying relation
    #[must_use]
    pub fn strength(&self) -> Strength {
        self.strength
    }

    /// De-duplication key
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        let (a, b) = if self.directed || self.source <= self.target {
            (self.source.clone(), self.target.clone())
        } else {
            (self.target.clone(), self.source.clone())
        };
        EdgeKey {
            a,
            b,
            directed: self.directed,
            strength: self.strength,
            relation_id: self.relation_id,
        }
    }
}

// =========================================================================
// Graph View
// =========================================================================

/// A built node/edge set ready for rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphView {
    /// Nodes, in build order
    pub nodes: Vec<GraphNode>,
    /// Edges, in build order
    pub edges: Vec<GraphEdge>,
}

impl GraphView {
    /// Look up a node by identifier
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Check if the graph has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Project onto a petgraph graph; edges with unknown endpoints are skipped
    #[must_use]
    pub fn to_petgraph(&self) -> DiGraph<&GraphNode, &GraphEdge> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut indices: HashMap<&NodeId, NodeIndex> = HashMap::new();

        for node in &self.nodes {
            let idx = graph.add_node(node);
            indices.insert(&node.id, idx);
        }

        for edge in &self.edges {
            if let (Some(&from_idx), Some(&to_idx)) =
                (indices.get(&edge.source), indices.get(&edge.target))
            {
                graph.add_edge(from_idx, to_idx, edge);
            }
        }

        graph
    }

    /// Nodes that no edge touches
    #[must_use]
    pub fn isolated_nodes(&self) -> Vec<&GraphNode> {
        let graph = self.to_petgraph();
        graph
            .node_indices()
            .filter(|&idx| graph.neighbors_undirected(idx).next().is_none())
            .map(|idx| graph[idx])
            .collect()
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize graph to JSON")
    }

    /// SHA-256 over the canonical JSON form; equal views hash equal
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self).context("Failed to serialize graph")?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self, name: &str) -> String {
        let mut dot = format!("digraph \"{}\" {{\n", escape(name));
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        let mut levels: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for node in &self.nodes {
            let id = escape(&node.id.to_string());
            let mut attrs = format!("label=\"{}\"", escape(&node.label));
            if let (Some(x), Some(y)) = (node.x, node.y) {
                let pin = if node.fixed { "!" } else { "" };
                // Graphviz y grows upward, the renderer's grows downward
                let y = if y == 0.0 { 0.0 } else { -y };
                attrs.push_str(&format!(", pos=\"{x},{y}{pin}\""));
            }
            dot.push_str(&format!("  \"{id}\" [{attrs}];\n"));
            if let Some(level) = node.level {
                levels.entry(level).or_default().push(id);
            }
        }

        if !levels.is_empty() {
            dot.push('\n');
        }
        for ids in levels.values() {
            let members: Vec<String> = ids.iter().map(|id| format!("\"{id}\";")).collect();
            dot.push_str(&format!("  {{ rank=same; {} }}\n", members.join(" ")));
        }

        dot.push('\n');

        for edge in &self.edges {
            let mut attrs = Vec::new();
            if let Some(label) = &edge.label {
                attrs.push(format!("label=\"{}\"", escape(label)));
            }
            if edge.dashes {
                attrs.push("style=dashed".to_string());
            }
            if !edge.directed {
                attrs.push("dir=none".to_string());
            }
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [{}];\n",
                escape(&edge.source.to_string()),
                escape(&edge.target.to_string()),
                attrs.join(", ")
            ));
        }

        dot.push_str("}\n");
        dot
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(code: &str) -> GraphNode {
        GraphNode {
            id: NodeId::product(code),
            label: format!("{code}\nname"),
            title: code.into(),
            shape: NodeShape::Box,
            size: 28,
            image: None,
            font_color: "#FFFFFF".into(),
            x: Some(0.0),
            y: Some(-150.0),
            fixed: true,
            level: None,
        }
    }

    fn edge(
        from: &str,
        to: &str,
        directed: bool,
        strength: Strength,
        label: Option<&str>,
    ) -> GraphEdge {
        GraphEdge::new(1, NodeId::product(from), NodeId::product(to), directed, strength, label)
    }

    #[test]
    fn test_shadow_id_format() {
        let id = NodeId::shadow("A01", Role::Upstream, 3, Strength::Weak);
        assert_eq!(id.to_string(), "A01@@UP@@L3@@weak");
        assert_eq!(id.base_code(), "A01");
    }

    #[test]
    fn test_parse_recovers_shadow() {
        let id = NodeId::shadow("A01", Role::Downstream, 12, Strength::Strong);
        assert_eq!(NodeId::parse(&id.to_string()), id);
        assert_eq!(NodeId::parse("B7"), NodeId::product("B7"));
    }

    #[test]
    fn test_parse_partial_suffix_keeps_base_code() {
        assert_eq!(NodeId::parse("A01@@junk").base_code(), "A01");
    }

    #[test]
    fn test_undirected_key_ignores_direction() {
        let ab = edge("A", "B", false, Strength::Weak, None);
        let ba = edge("B", "A", false, Strength::Weak, None);
        assert_eq!(ab.key(), ba.key());

        let ab = edge("A", "B", true, Strength::Weak, None);
        let ba = edge("B", "A", true, Strength::Weak, None);
        assert_ne!(ab.key(), ba.key());
    }

    #[test]
    fn test_blank_label_is_absent() {
        let blank = edge("A", "B", true, Strength::Strong, Some("  "));
        assert_eq!(blank.label, None);
        assert_eq!(blank.title, None);
        assert!(!blank.dashes);
    }

    #[test]
    fn test_isolated_nodes() {
        let view = GraphView {
            nodes: vec![make_node("A"), make_node("B"), make_node("C")],
            edges: vec![edge("A", "B", true, Strength::Strong, None)],
        };

        let isolated: Vec<_> = view.isolated_nodes().iter().map(|n| n.id.to_string()).collect();
        assert_eq!(isolated, vec!["C"]);
    }

    #[test]
    fn test_to_dot() {
        let view = GraphView {
            nodes: vec![make_node("A"), make_node("B")],
            edges: vec![edge("A", "B", false, Strength::Weak, Some("24V"))],
        };

        let dot = view.to_dot("line");
        assert!(dot.contains("digraph \"line\""));
        assert!(dot.contains("pos=\"0,150!\""));
        assert!(dot.contains("\"A\" -> \"B\" [label=\"24V\", style=dashed, dir=none]"));
        assert!(!dot.contains("rank"));
    }

    #[test]
    fn test_dot_levels_become_rank_groups() {
        let mut nodes = vec![make_node("A"), make_node("B"), make_node("C")];
        nodes[0].level = Some(1);
        nodes[1].level = Some(0);
        nodes[2].level = Some(1);
        let view = GraphView {
            nodes,
            edges: vec![],
        };

        let dot = view.to_dot("P");
        assert!(dot.contains("  { rank=same; \"B\"; }\n"));
        assert!(dot.contains("  { rank=same; \"A\"; \"C\"; }\n"));
        assert!(dot.find("\"B\";").unwrap() < dot.find("\"A\"; \"C\";").unwrap());
        assert!(!dot.contains("rank=\""));
    }

    #[test]
    fn test_edge_json_carries_relation_id_as_id() {
        let mut ab = edge("A", "B", true, Strength::Strong, None);
        ab.relation_id = 42;

        let json = serde_json::to_value(&ab).unwrap();
        assert_eq!(json["id"], 42);
        assert!(json.get("relation_id").is_none());
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let view = GraphView {
            nodes: vec![make_node("A")],
            edges: vec![],
        };
        assert_eq!(view.fingerprint().unwrap(), view.clone().fingerprint().unwrap());
        assert_eq!(view.fingerprint().unwrap().len(), 64);
    }
}
