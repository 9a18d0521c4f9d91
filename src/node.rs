// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Node construction: labels, image thumbnails and pinned placement

use crate::config::{NodeSettings, Settings};
use crate::graph::{GraphNode, NodeId, NodeShape};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Marker appended to shortened names
const ELLIPSIS: char = '…';

/// Rendered thumbnail of a product image
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    /// `data:image/png;base64,...`
    pub data_uri: String,
    /// Mean Rec.709 luma of the thumbnail, 0..=255
    pub luma: f64,
}

/// Thumbnail a file into a PNG data URI plus its mean luma.
///
/// Pure in the file contents: the same file always yields the same payload.
/// Returns `None` when the file cannot be read or decoded.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn render_thumbnail(path: &Path, thumb: u32) -> Option<ImagePayload> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!("Cannot read image {}: {}", path.display(), e);
            return None;
        }
    };

    let img = match image::load_from_memory(&raw) {
        Ok(img) => img,
        Err(e) => {
            warn!("Cannot decode image {}: {}", path.display(), e);
            return None;
        }
    };

    let img = if img.width() > thumb || img.height() > thumb {
        img.thumbnail(thumb, thumb)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let pixels = u64::from(rgb.width()) * u64::from(rgb.height());
    let luma = if pixels == 0 {
        255.0
    } else {
        let total: f64 = rgb
            .pixels()
            .map(|p| {
                let [r, g, b] = p.0;
                0.2126 * f64::from(r) + 0.7152 * f64::from(g) + 0.0722 * f64::from(b)
            })
            .sum();
        total / pixels as f64
    };

    let mut png = Vec::new();
    let rgba = image::DynamicImage::ImageRgba8(img.to_rgba8());
    if let Err(e) = rgba.write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png) {
        warn!("Cannot encode thumbnail for {}: {}", path.display(), e);
        return None;
    }

    Some(ImagePayload {
        data_uri: format!("data:image/png;base64,{}", BASE64_STANDARD.encode(&png)),
        luma,
    })
}

/// Thumbnail cache keyed by resolved file path and thumbnail size.
///
/// Failures are cached too, so a broken file is decoded once per cache.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: Mutex<HashMap<(PathBuf, u32), Option<Arc<ImagePayload>>>>,
}

impl ImageCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached payload for `path`, rendering it on first use
    pub fn get_or_render(&self, path: &Path, thumb: u32) -> Option<Arc<ImagePayload>> {
        let key = (path.to_path_buf(), thumb);
        if let Some(hit) = self.entries.lock().get(&key) {
            return hit.clone();
        }

        // Rendered without the lock held; a racing render produces the same payload.
        let payload = render_thumbnail(path, thumb).map(Arc::new);
        self.entries.lock().entry(key).or_insert(payload).clone()
    }

    /// Number of cached paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing has been cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every cached payload
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// Placement and context hints for one node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeOptions {
    /// Hierarchical tier
    pub level: Option<u32>,
    /// Horizontal coordinate
    pub x: Option<f64>,
    /// Vertical coordinate
    pub y: Option<f64>,
    /// Pin the node at (x, y)
    pub fixed: bool,
    /// Extra hover line, e.g. the originating line name
    pub hover_extra: Option<String>,
}

impl NodeOptions {
    /// Pinned at (x, y)
    #[must_use]
    pub fn pinned(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            fixed: true,
            ..Self::default()
        }
    }

    /// Placed on a hierarchical tier
    #[must_use]
    pub fn at_level(level: u32) -> Self {
        Self {
            level: Some(level),
            ..Self::default()
        }
    }

    /// Add an extra hover line
    #[must_use]
    pub fn with_hover(mut self, extra: impl Into<String>) -> Self {
        self.hover_extra = Some(extra.into());
        self
    }
}

/// Builds renderable nodes for products, sharing one thumbnail cache
#[derive(Debug)]
pub struct NodeBuilder {
    settings: NodeSettings,
    asset_dir: PathBuf,
    images: Arc<ImageCache>,
}

impl NodeBuilder {
    /// Builder with its own cache
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self::with_cache(settings, Arc::new(ImageCache::new()))
    }

    /// Builder reusing an existing cache across renders
    #[must_use]
    pub fn with_cache(settings: &Settings, images: Arc<ImageCache>) -> Self {
        Self {
            settings: settings.nodes.clone(),
            asset_dir: settings.asset_dir().to_path_buf(),
            images,
        }
    }

    /// The thumbnail cache
    #[must_use]
    pub fn cache(&self) -> &ImageCache {
        &self.images
    }

    /// Resolve an image reference to an existing file
    #[must_use]
    pub fn resolve_image(&self, image_ref: Option<&str>) -> Option<PathBuf> {
        let image_ref = image_ref.map(str::trim).filter(|r| !r.is_empty())?;
        let path = self.asset_dir.join(image_ref);
        path.is_file().then_some(path)
    }

    /// Build a node for `id`.
    ///
    /// Labels and hover text always use the base product code, never the
    /// full shadow identifier.
    #[must_use]
    pub fn build(
        &self,
        id: NodeId,
        name: &str,
        image_ref: Option<&str>,
        opts: NodeOptions,
    ) -> GraphNode {
        let base = id.base_code();
        let mut label = format!("{base}\n{}", shorten(name, self.settings.label_chars));

        let mut title = format!("{base} | {name}");
        if let Some(extra) = opts.hover_extra.as_deref() {
            title.push('\n');
            title.push_str(extra);
        }

        let payload = self
            .resolve_image(image_ref)
            .and_then(|path| self.images.get_or_render(&path, self.settings.thumb));

        let (shape, size, image) = match payload {
            Some(payload) => (
                NodeShape::CircularImage,
                self.settings.image_size,
                Some(payload.data_uri.clone()),
            ),
            None => {
                label.push('\n');
                label.push_str(&self.settings.no_image_marker);
                (NodeShape::Box, self.settings.box_size, None)
            }
        };

        GraphNode {
            id,
            label,
            title,
            shape,
            size,
            image,
            font_color: self.settings.font_color.clone(),
            x: opts.x,
            y: opts.y,
            fixed: opts.fixed,
            level: opts.level,
        }
    }
}

/// Trim and cut to `max` characters, marking the cut with an ellipsis
#[must_use]
pub fn shorten(s: &str, max: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut short: String = s.chars().take(max).collect();
    short.push(ELLIPSIS);
    short
}
