// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Line command - render one product line's graph

use super::export::{parse_format, render, write_output};
use super::Session;
use crate::line::build_line_graph;
use crate::store::LineStore;
use crate::types::LineId;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Run the line command
pub fn run(session: &Session, line_id: LineId, format: &str, output: Option<&Path>) -> Result<()> {
    let format = parse_format(format)?;

    let line = session
        .catalog
        .line(line_id)?
        .ok_or_else(|| anyhow::anyhow!("No such line: {}", line_id))?;
    info!("Rendering line {} ({})", line.name, line.id);

    let layout = &session.settings.layout;
    let graph = build_line_graph(&session.catalog, &session.nodes, layout, line_id)?;

    if graph.members.is_empty() {
        eprintln!("Warning: line '{}' has no members.", line.name);
    }
    for node in graph.view.isolated_nodes() {
        eprintln!("Note: {} has no relations in this line", node.id.base_code());
    }

    let content = render(&graph.view, format, &line.name)?;
    write_output(&content, output)
}
