// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Lines command - list product lines in display order

use super::Session;
use crate::store::LineStore;
use anyhow::Result;
use owo_colors::OwoColorize;

/// Run the lines command
pub fn run(session: &Session) -> Result<()> {
    let lines = session.catalog.lines_sorted()?;
    if lines.is_empty() {
        println!("No product lines defined.");
        return Ok(());
    }

    println!("Lines ({}):", lines.len());
    for (i, line) in lines.iter().enumerate() {
        let rank = format!("#{}", i + 1);
        let members = session.catalog.member_count(line.id);
        if session.color {
            let id = format!("[id {}]", line.id);
            println!(
                "  {} {} {} ({} members)",
                rank.bold(),
                line.name.cyan(),
                id.dimmed(),
                members
            );
        } else {
            println!("  {} {} [id {}] ({} members)", rank, line.name, line.id, members);
        }
        if let Some(desc) = line.description.as_deref().filter(|d| !d.trim().is_empty()) {
            println!("      {}", desc);
        }
    }

    Ok(())
}
