// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod completions;
pub mod config;
pub mod export;
pub mod line;
pub mod lines;
pub mod product;
pub mod products;

use crate::config::Settings;
use crate::node::NodeBuilder;
use crate::store::Catalog;
use anyhow::{Context, Result};

/// Everything one command invocation works with, passed explicitly
#[derive(Debug)]
pub struct Session {
    /// Effective settings
    pub settings: Settings,
    /// Loaded catalog
    pub catalog: Catalog,
    /// Node builder for this invocation
    pub nodes: NodeBuilder,
    /// Colour terminal output
    pub color: bool,
}

impl Session {
    /// Load the catalog from the configured data directory
    pub fn open(settings: Settings, color: bool) -> Result<Self> {
        let catalog = Catalog::load(&settings.data_dir).with_context(|| {
            format!("Failed to load catalog from {}", settings.data_dir.display())
        })?;
        let nodes = NodeBuilder::new(&settings);

        Ok(Self {
            settings,
            catalog,
            nodes,
            color,
        })
    }
}
