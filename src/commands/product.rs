// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Product command - render a product's relationships across all lines

use super::export::{parse_format, render, write_output};
use super::Session;
use crate::global::build_global_graph;
use crate::store::LineStore;
use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Run the product command
pub fn run(session: &Session, code: &str, format: &str, output: Option<&Path>) -> Result<()> {
    let format = parse_format(format)?;

    let Some(graph) = build_global_graph(&session.catalog, &session.nodes, code)? else {
        anyhow::bail!("No such product: {}", code);
    };
    info!("Rendering {} ({})", graph.product.code, graph.product.name);

    let lines = session.catalog.lines_sorted()?;
    let memberships: Vec<String> = session
        .catalog
        .lines_for_product(code)?
        .iter()
        .filter_map(|l| {
            lines
                .iter()
                .position(|x| x.id == l.id)
                .map(|pos| format!("#{} {}", pos + 1, l.name))
        })
        .collect();
    if memberships.is_empty() {
        eprintln!("{} is not in any line", code);
    } else {
        eprintln!("{} is in: {}", code, memberships.join(", "));
    }

    let content = render(&graph.view, format, &graph.product.code)?;
    write_output(&content, output)
}
