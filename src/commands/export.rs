// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Rendering a built graph to JSON or DOT and writing it out

use crate::graph::GraphView;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Graphviz DOT format
    Dot,
    /// JSON node/edge lists for a browser renderer
    Json,
}

impl OutputFormat {
    /// Parse format from string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dot" | "graphviz" => Some(Self::Dot),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Get file extension for format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Dot => "dot",
            Self::Json => "json",
        }
    }
}

/// Parse a `--format` value or fail with the supported list
pub fn parse_format(format: &str) -> Result<OutputFormat> {
    OutputFormat::parse(format)
        .ok_or_else(|| anyhow::anyhow!("Unknown output format: {}. Supported: dot, json", format))
}

/// Render `view` in `format`; `name` titles DOT output
pub fn render(view: &GraphView, format: OutputFormat, name: &str) -> Result<String> {
    match format {
        OutputFormat::Dot => Ok(view.to_dot(name)),
        OutputFormat::Json => view.to_json(),
    }
}

/// Write to `output`, or stdout when absent
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }

    Ok(())
}
