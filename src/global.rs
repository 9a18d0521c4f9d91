// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Cross-line product graphs: upstream, subject and downstream tiers

use crate::graph::{EdgeKey, GraphEdge, GraphNode, GraphView, NodeId, Role};
use crate::node::{NodeBuilder, NodeOptions};
use crate::store::{ProductStore, RelationStore};
use crate::types::{ContextRelation, Product};
use anyhow::Result;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Tier of upstream shadow nodes
pub const UPSTREAM_LEVEL: u32 = 0;
/// Tier of the subject product and its undirected neighbours
pub const SUBJECT_LEVEL: u32 = 1;
/// Tier of downstream shadow nodes
pub const DOWNSTREAM_LEVEL: u32 = 2;

/// Nodes keyed by identifier, in first-insertion order
#[derive(Debug, Default)]
pub struct NodeSet {
    nodes: Vec<GraphNode>,
    /// Map from node ID to its index in `nodes`
    indices: HashMap<NodeId, usize>,
}

impl NodeSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node built by `build` unless `id` is present.
    ///
    /// A repeated insertion only ever moves an existing node to a smaller
    /// (more central) level. Returns whether a node was added.
    pub fn insert_with<F>(&mut self, id: NodeId, level: u32, build: F) -> bool
    where
        F: FnOnce(NodeId) -> GraphNode,
    {
        if let Some(&idx) = self.indices.get(&id) {
            let node = &mut self.nodes[idx];
            if node.level.map_or(true, |old| level < old) {
                node.level = Some(level);
            }
            return false;
        }

        self.indices.insert(id.clone(), self.nodes.len());
        self.nodes.push(build(id));
        true
    }

    /// Look up a node
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&GraphNode> {
        self.indices.get(id).map(|&i| &self.nodes[i])
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Consume into the node list
    #[must_use]
    pub fn into_nodes(self) -> Vec<GraphNode> {
        self.nodes
    }
}

/// Edges de-duplicated by [`EdgeKey`], in first-insertion order
#[derive(Debug, Default)]
pub struct EdgeSet {
    edges: Vec<GraphEdge>,
    seen: HashSet<EdgeKey>,
}

impl EdgeSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an edge; a repeated key is ignored. Returns whether it was added.
    pub fn insert(&mut self, edge: GraphEdge) -> bool {
        if !self.seen.insert(edge.key()) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    /// Number of edges
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Consume into the edge list
    #[must_use]
    pub fn into_edges(self) -> Vec<GraphEdge> {
        self.edges
    }
}

/// A product's relationships across every line it takes part in
#[derive(Debug, Clone)]
pub struct GlobalGraph {
    /// The subject product
    pub product: Product,
    /// Nodes and edges
    pub view: GraphView,
}

fn shadow_of(code: &str, role: Role, rel: &ContextRelation) -> NodeId {
    NodeId::shadow(code, role, rel.relation.line_id, rel.relation.strength)
}

/// Build the tiered graph around `code`.
///
/// Every upstream or downstream counterpart becomes a shadow node per
/// (product, role, line, strength), so relations from different lines or of
/// different strength never merge into one node. Returns `None` when the
/// product does not exist.
pub fn build_global_graph<S>(
    store: &S,
    nodes: &NodeBuilder,
    code: &str,
) -> Result<Option<GlobalGraph>>
where
    S: ProductStore + RelationStore + ?Sized,
{
    let Some(product) = store.product(code)? else {
        debug!("No such product: {}", code);
        return Ok(None);
    };

    let mut upstream = store.global_upstream(code)?;
    let mut downstream = store.global_downstream(code)?;
    let mut undirected = store.global_undirected(code)?;
    for rels in [&mut upstream, &mut downstream, &mut undirected] {
        rels.sort_by_key(|r| r.relation.id);
    }

    let subject = NodeId::product(&product.code);
    let mut node_set = NodeSet::new();

    node_set.insert_with(subject.clone(), SUBJECT_LEVEL, |id| {
        nodes.build(
            id,
            &product.name,
            product.image.as_deref(),
            NodeOptions::at_level(SUBJECT_LEVEL),
        )
    });

    for r in &upstream {
        let id = shadow_of(&r.from.code, Role::Upstream, r);
        node_set.insert_with(id, UPSTREAM_LEVEL, |id| {
            nodes.build(
                id,
                &r.from.name,
                r.from.image.as_deref(),
                NodeOptions::at_level(UPSTREAM_LEVEL).with_hover(&r.line_name),
            )
        });
    }

    for r in &downstream {
        let id = shadow_of(&r.to.code, Role::Downstream, r);
        node_set.insert_with(id, DOWNSTREAM_LEVEL, |id| {
            nodes.build(
                id,
                &r.to.name,
                r.to.image.as_deref(),
                NodeOptions::at_level(DOWNSTREAM_LEVEL).with_hover(&r.line_name),
            )
        });
    }

    for r in &undirected {
        for end in [&r.from, &r.to] {
            node_set.insert_with(NodeId::product(&end.code), SUBJECT_LEVEL, |id| {
                nodes.build(
                    id,
                    &end.name,
                    end.image.as_deref(),
                    NodeOptions::at_level(SUBJECT_LEVEL).with_hover(&r.line_name),
                )
            });
        }
    }

    let mut edge_set = EdgeSet::new();

    for r in &upstream {
        edge_set.insert(GraphEdge::new(
            r.relation.id,
            shadow_of(&r.from.code, Role::Upstream, r),
            subject.clone(),
            true,
            r.relation.strength,
            r.relation.label(),
        ));
    }

    for r in &downstream {
        edge_set.insert(GraphEdge::new(
            r.relation.id,
            subject.clone(),
            shadow_of(&r.to.code, Role::Downstream, r),
            true,
            r.relation.strength,
            r.relation.label(),
        ));
    }

    for r in &undirected {
        edge_set.insert(GraphEdge::new(
            r.relation.id,
            NodeId::product(&r.from.code),
            NodeId::product(&r.to.code),
            false,
            r.relation.strength,
            r.relation.label(),
        ));
    }

    let view = GraphView {
        nodes: node_set.into_nodes(),
        edges: edge_set.into_edges(),
    };
    debug!(
        "Built global graph for {}: {} nodes, {} edges",
        product.code,
        view.nodes.len(),
        view.edges.len()
    );

    Ok(Some(GlobalGraph { product, view }))
}
