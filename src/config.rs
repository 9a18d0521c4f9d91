// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "PRODLINE_DATA_DIR";

/// Prefix for layered environment overrides (`PRODLINE__LAYOUT__X_GAP=300`)
const ENV_PREFIX: &str = "PRODLINE";

/// Grid spacing and collision offsetting for line graphs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Horizontal distance between adjacent ranks
    pub x_gap: f64,
    /// Vertical distance between adjacent tiers
    pub y_gap: f64,
    /// Horizontal collision offset per ring, as a fraction of `x_gap`
    pub collision_x_ratio: f64,
    /// Vertical collision offset per ring, as a fraction of `y_gap`
    pub collision_y_ratio: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            x_gap: 260.0,
            y_gap: 150.0,
            collision_x_ratio: 0.25,
            collision_y_ratio: 0.3,
        }
    }
}

/// Node rendering constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Thumbnail bounding box, in pixels
    pub thumb: u32,
    /// Size of image nodes
    pub image_size: u32,
    /// Size of box nodes
    pub box_size: u32,
    /// Characters of the product name kept in labels
    pub label_chars: usize,
    /// Label font colour
    pub font_color: String,
    /// Appended to labels of nodes without an image
    pub no_image_marker: String,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            thumb: 96,
            image_size: 32,
            box_size: 28,
            label_chars: 10,
            font_color: "#FFFFFF".into(),
            no_image_marker: "(no image)".into(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `catalog.json`
    pub data_dir: PathBuf,
    /// Directory image references are resolved against (defaults to `data_dir`)
    pub asset_dir: Option<PathBuf>,
    /// Line graph layout
    pub layout: LayoutSettings,
    /// Node rendering
    pub nodes: NodeSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            asset_dir: None,
            layout: LayoutSettings::default(),
            nodes: NodeSettings::default(),
        }
    }
}

impl Settings {
    /// Directory image references are resolved against
    #[must_use]
    pub fn asset_dir(&self) -> &Path {
        self.asset_dir.as_deref().unwrap_or(&self.data_dir)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "hyperpolymath", "prodline")
}

/// Default data directory: `PRODLINE_DATA_DIR`, else the platform data dir
#[must_use]
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".prodline")
        })
}

/// Default config file location
#[must_use]
pub fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration: defaults, then the TOML file, then `PRODLINE__*`.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let mut builder = config::Config::builder();

    match path {
        Some(p) => {
            builder = builder.add_source(config::File::from(p).required(true));
        }
        None => {
            if let Some(p) = default_config_file() {
                builder = builder.add_source(config::File::from(p).required(false));
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__"),
    );

    let settings: Settings = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_grid() {
        let settings = Settings::default();
        assert_eq!(settings.layout.x_gap, 260.0);
        assert_eq!(settings.layout.y_gap, 150.0);
        assert_eq!(settings.nodes.thumb, 96);
        assert_eq!(settings.asset_dir(), settings.data_dir.as_path());
    }

    #[test]
    fn test_file_overrides_partial_section() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "asset_dir = \"/srv/img\"\n[layout]\nx_gap = 300.0\n",
        )
        .unwrap();

        let settings = load(Some(&path)).unwrap();
        assert_eq!(settings.layout.x_gap, 300.0);
        assert_eq!(settings.layout.y_gap, 150.0);
        assert_eq!(settings.asset_dir(), Path::new("/srv/img"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
