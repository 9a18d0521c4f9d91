// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Line graphs: manual lane placement with collision offsetting for main rows

use crate::config::LayoutSettings;
use crate::graph::{GraphEdge, GraphView, NodeId};
use crate::node::{NodeBuilder, NodeOptions};
use crate::store::{LineStore, RelationStore};
use crate::types::{LineId, MemberRow};
use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Unit offsets for one ring, in opposite pairs: E/W, N/S, NE/SW, NW/SE.
///
/// Diagonals sit at half length so every ring traces a diamond.
const RING: [(f64, f64); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, -1.0),
    (0.0, 1.0),
    (0.5, -0.5),
    (-0.5, 0.5),
    (-0.5, -0.5),
    (0.5, 0.5),
];

/// A rendered line: its members in store order plus the node/edge set
#[derive(Debug, Clone)]
pub struct LineGraph {
    /// Line the graph was built for
    pub line_id: LineId,
    /// Members joined with products
    pub members: Vec<MemberRow>,
    /// Nodes and edges
    pub view: GraphView,
}

/// Base position of a member: `x = rank * x_gap`, `y = -tier * y_gap`.
///
/// A coordinate that overflows to a non-finite value falls back to 0, the
/// same as a malformed lane.
#[must_use]
pub fn base_position(row: &MemberRow, layout: &LayoutSettings) -> (f64, f64) {
    let x = row.member.rank_or_default() * layout.x_gap;
    let y = -row.member.tier_or_default() * layout.y_gap;
    (coordinate(x), coordinate(y))
}

/// Offsets for `count` nodes sharing one base point.
///
/// The first stays on the base point; the rest fill rings of eight compass
/// points, each ring one step further out.
#[must_use]
pub fn collision_offsets(count: usize, layout: &LayoutSettings) -> Vec<(f64, f64)> {
    let step_x = layout.x_gap * layout.collision_x_ratio;
    let step_y = layout.y_gap * layout.collision_y_ratio;

    (0..count)
        .map(|i| {
            if i == 0 {
                return (0.0, 0.0);
            }
            #[allow(clippy::cast_precision_loss)]
            let ring = ((i - 1) / RING.len() + 1) as f64;
            let (dx, dy) = RING[(i - 1) % RING.len()];
            (coordinate(dx * step_x * ring), coordinate(dy * step_y * ring))
        })
        .collect()
}

/// Final positions for every member, index-aligned with `members`.
///
/// Each group of co-located main members is offset on its own. With
/// fractional ranks an offset can land on another group's base point, for
/// example a second main member at rank 0 and a main member at rank 0.25
/// both end up at x = 65.
#[must_use]
pub fn place_members(members: &[MemberRow], layout: &LayoutSettings) -> Vec<(f64, f64)> {
    let mut positions: Vec<(f64, f64)> = members.iter().map(|m| base_position(m, layout)).collect();

    let mut groups: HashMap<(u64, u64), Vec<usize>> = HashMap::new();
    for (i, row) in members.iter().enumerate() {
        if row.member.is_main {
            let (x, y) = positions[i];
            groups.entry((x.to_bits(), y.to_bits())).or_default().push(i);
        }
    }

    for mut group in groups.into_values().filter(|g| g.len() > 1) {
        group.sort_by(|&a, &b| members[a].product.code.cmp(&members[b].product.code));
        trace!(
            "Offsetting {} main members at {:?}",
            group.len(),
            positions[group[0]]
        );

        let offsets = collision_offsets(group.len(), layout);
        for (&i, (dx, dy)) in group.iter().zip(offsets) {
            let (x, y) = positions[i];
            positions[i] = (coordinate(x + dx), coordinate(y + dy));
        }
    }

    positions
}

/// Build the graph of one line.
///
/// Relations only take part when both endpoints are members of the line.
/// An unknown line yields an empty graph.
pub fn build_line_graph<S>(
    store: &S,
    nodes: &NodeBuilder,
    layout: &LayoutSettings,
    line_id: LineId,
) -> Result<LineGraph>
where
    S: LineStore + RelationStore + ?Sized,
{
    let members = store.line_members(line_id)?;
    let codes: Vec<String> = members.iter().map(|m| m.product.code.clone()).collect();

    let mut relations = store.relations_filtered(line_id, &codes)?;
    relations.retain(|r| r.line_id == line_id && codes.contains(&r.from) && codes.contains(&r.to));
    relations.sort_by_key(|r| r.id);

    let positions = place_members(&members, layout);
    let graph_nodes = members
        .iter()
        .zip(positions)
        .map(|(row, (x, y))| {
            nodes.build(
                NodeId::product(&row.product.code),
                &row.product.name,
                row.product.image.as_deref(),
                NodeOptions::pinned(x, y),
            )
        })
        .collect();

    let edges = relations
        .iter()
        .map(|r| {
            GraphEdge::new(
                r.id,
                NodeId::product(&r.from),
                NodeId::product(&r.to),
                r.directed,
                r.strength,
                r.label(),
            )
        })
        .collect();

    let view = GraphView {
        nodes: graph_nodes,
        edges,
    };
    debug!(
        "Built line {}: {} nodes, {} edges",
        line_id,
        view.nodes.len(),
        view.edges.len()
    );

    Ok(LineGraph {
        line_id,
        members,
        view,
    })
}

/// Collapse `-0.0` so equal positions are bit-identical; non-finite becomes 0
fn coordinate(v: f64) -> f64 {
    if v == 0.0 || !v.is_finite() {
        0.0
    } else {
        v
    }
}
