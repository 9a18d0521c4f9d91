// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::Session;
use anyhow::Result;
use owo_colors::OwoColorize;

/// Run the products command
pub fn run(session: &Session) -> Result<()> {
    let products = session.catalog.products();
    if products.is_empty() {
        println!("No products defined.");
        return Ok(());
    }

    println!("Products ({}):", products.len());
    for p in products {
        let category = p.category.as_deref().unwrap_or("-");
        if session.color {
            println!("  {} {} {}", p.code.bold(), p.name, category.dimmed());
        } else {
            println!("  {} {} {}", p.code, p.name, category);
        }
    }

    Ok(())
}
