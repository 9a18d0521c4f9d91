// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Prodline library - product lines and their relationship graphs
//!
//! This crate groups catalog products into curated product lines and turns
//! line membership plus line-scoped relations into renderable node/edge sets:
//! a manually laid out graph per line, and a tiered cross-line graph per
//! product.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod commands;
pub mod config;
pub mod global;
pub mod graph;
pub mod line;
pub mod node;
pub mod store;

/// Typed records exchanged at the store boundary
pub mod types {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    /// Product line identifier
    pub type LineId = i64;

    /// Relation identifier
    pub type RelationId = i64;

    // =========================================================================
    // Products
    // =========================================================================

    /// A catalog product, keyed by its code
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Product {
        /// Unique, stable product code
        pub code: String,
        /// Display name
        pub name: String,
        /// Free-form category
        #[serde(default)]
        pub category: Option<String>,
        /// Image reference, relative to the asset directory
        #[serde(default)]
        pub image: Option<String>,
    }

    impl Product {
        /// The display fields other records join against
        #[must_use]
        pub fn summary(&self) -> ProductSummary {
            ProductSummary {
                code: self.code.clone(),
                name: self.name.clone(),
                image: self.image.clone(),
            }
        }
    }

    /// Display fields of a product joined onto another record
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProductSummary {
        /// Product code
        pub code: String,
        /// Display name
        pub name: String,
        /// Image reference
        pub image: Option<String>,
    }

    // =========================================================================
    // Product Lines
    // =========================================================================

    /// A named grouping of products with curated layout and relations
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProductLine {
        /// Line identifier
        pub id: LineId,
        /// Unique display name
        pub name: String,
        /// Description
        #[serde(default)]
        pub description: Option<String>,
        /// Position in line listings (lower first, absent last)
        #[serde(default)]
        pub display_order: Option<i64>,
    }

    /// A manually assigned lane coordinate as read from the store.
    ///
    /// Historical rows may hold nothing, a number, a numeric string or junk.
    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub enum LaneHint {
        /// No value stored
        #[default]
        Missing,
        /// A finite coordinate
        Value(f64),
        /// Something that is not a finite number
        Malformed,
    }

    impl LaneHint {
        /// The stored value, if it is usable
        #[must_use]
        pub fn value(self) -> Option<f64> {
            match self {
                Self::Value(v) => Some(v),
                Self::Missing | Self::Malformed => None,
            }
        }

        fn from_f64(v: f64) -> Self {
            if v.is_finite() {
                Self::Value(v)
            } else {
                Self::Malformed
            }
        }
    }

    impl From<f64> for LaneHint {
        fn from(v: f64) -> Self {
            Self::from_f64(v)
        }
    }

    impl Serialize for LaneHint {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self {
                Self::Value(v) => serializer.serialize_f64(*v),
                Self::Missing | Self::Malformed => serializer.serialize_none(),
            }
        }
    }

    impl<'de> Deserialize<'de> for LaneHint {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            #[derive(Deserialize)]
            #[serde(untagged)]
            enum Raw {
                Number(f64),
                Text(String),
                Other(serde::de::IgnoredAny),
            }

            Ok(match Option::<Raw>::deserialize(deserializer)? {
                None => Self::Missing,
                Some(Raw::Number(v)) => Self::from_f64(v),
                Some(Raw::Text(s)) => s
                    .trim()
                    .parse::<f64>()
                    .map_or(Self::Malformed, Self::from_f64),
                Some(Raw::Other(_)) => Self::Malformed,
            })
        }
    }

    /// A product's placement within one line
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct LineMember {
        /// Owning line
        pub line_id: LineId,
        /// Member product code
        pub product_code: String,
        /// Horizontal lane (fractional positions allowed)
        #[serde(default)]
        pub rank: LaneHint,
        /// Vertical lane: 0 is the main row, positive renders above
        #[serde(default)]
        pub tier: LaneHint,
        /// Member of the primary row, subject to collision offsetting
        #[serde(default)]
        pub is_main: bool,
    }

    impl LineMember {
        /// Horizontal lane, falling back to 0
        #[must_use]
        pub fn rank_or_default(&self) -> f64 {
            self.rank.value().unwrap_or(0.0)
        }

        /// Vertical lane. A missing tier puts main members on the main row and
        /// everything else one lane up; a malformed tier falls back to 0.
        #[must_use]
        pub fn tier_or_default(&self) -> f64 {
            match self.tier {
                LaneHint::Value(v) => v,
                LaneHint::Malformed => 0.0,
                LaneHint::Missing if self.is_main => 0.0,
                LaneHint::Missing => 1.0,
            }
        }
    }

    /// A line member joined with its product
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct MemberRow {
        /// The product
        pub product: Product,
        /// Its placement in the line
        pub member: LineMember,
    }

    // =========================================================================
    // Relations
    // =========================================================================

    /// Relation strength
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Strength {
        /// Rendered solid
        Strong,
        /// Rendered dashed
        Weak,
    }

    impl Strength {
        /// Lowercase tag used in identifiers and on the wire
        #[must_use]
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Strong => "strong",
                Self::Weak => "weak",
            }
        }

        /// Parse the lowercase tag
        #[must_use]
        pub fn parse(s: &str) -> Option<Self> {
            match s {
                "strong" => Some(Self::Strong),
                "weak" => Some(Self::Weak),
                _ => None,
            }
        }
    }

    impl fmt::Display for Strength {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    fn default_directed() -> bool {
        true
    }

    fn default_relation_type() -> String {
        "compatible".into()
    }

    /// A relation between two products, scoped to one line
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Relation {
        /// Relation identifier
        pub id: RelationId,
        /// Owning line
        pub line_id: LineId,
        /// Source product code
        pub from: String,
        /// Target product code
        pub to: String,
        /// Strong or weak
        pub strength: Strength,
        /// Whether the relation has a direction
        #[serde(default = "default_directed")]
        pub directed: bool,
        /// Free-form relation tag
        #[serde(default = "default_relation_type")]
        pub relation_type: String,
        /// Text shown on the rendered edge (e.g. "RS485", "24V")
        #[serde(default)]
        pub edge_label: Option<String>,
    }

    impl Relation {
        /// Trimmed edge label; blank labels count as absent
        #[must_use]
        pub fn label(&self) -> Option<&str> {
            self.edge_label
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
        }
    }

    /// A relation joined with its line name and both endpoint products
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct ContextRelation {
        /// The relation
        pub relation: Relation,
        /// Name of the owning line
        pub line_name: String,
        /// Source product
        pub from: ProductSummary,
        /// Target product
        pub to: ProductSummary,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
