// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Read accessors the graph builders consume, and a file-backed catalog

use crate::types::{
    ContextRelation, LaneHint, LineId, LineMember, MemberRow, Product, ProductLine, Relation,
    RelationId, Strength,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name of the persisted catalog inside the data directory
pub const CATALOG_FILE: &str = "catalog.json";

// =========================================================================
// Store Traits
// =========================================================================

/// Product lookup
pub trait ProductStore {
    /// Product by code
    fn product(&self, code: &str) -> Result<Option<Product>>;
}

/// Line and line membership lookup
pub trait LineStore {
    /// Line by id
    fn line(&self, id: LineId) -> Result<Option<ProductLine>>;

    /// All lines by display order (absent order last), then id
    fn lines_sorted(&self) -> Result<Vec<ProductLine>>;

    /// Members of a line joined with their products, sorted by rank, then
    /// main members first, then code
    fn line_members(&self, line_id: LineId) -> Result<Vec<MemberRow>>;

    /// Lines containing a product, in display order
    fn lines_for_product(&self, code: &str) -> Result<Vec<ProductLine>>;
}

/// Relation lookup
pub trait RelationStore {
    /// Relations of a line whose endpoints are both in `codes`
    fn relations_filtered(&self, line_id: LineId, codes: &[String]) -> Result<Vec<Relation>>;

    /// Directed relations, across all lines, pointing at `code`
    fn global_upstream(&self, code: &str) -> Result<Vec<ContextRelation>>;

    /// Directed relations, across all lines, leaving `code`
    fn global_downstream(&self, code: &str) -> Result<Vec<ContextRelation>>;

    /// Undirected relations, across all lines, touching `code`
    fn global_undirected(&self, code: &str) -> Result<Vec<ContextRelation>>;
}

// =========================================================================
// Catalog
// =========================================================================

/// Violations of the catalog's data-model invariants
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Product code already taken
    #[error("product already exists: {0}")]
    DuplicateProduct(String),
    /// Line name already taken
    #[error("line name already exists: {0}")]
    DuplicateLineName(String),
    /// No product with this code
    #[error("product not found: {0}")]
    UnknownProduct(String),
    /// No line with this id
    #[error("line not found: {0}")]
    UnknownLine(LineId),
    /// Product already placed in the line
    #[error("product {code} is already a member of line {line_id}")]
    DuplicateMember {
        /// Line
        line_id: LineId,
        /// Product
        code: String,
    },
    /// Product not placed in the line
    #[error("product {code} is not a member of line {line_id}")]
    NotAMember {
        /// Line
        line_id: LineId,
        /// Product
        code: String,
    },
    /// Relation from a product to itself
    #[error("relation endpoints must differ: {0}")]
    SelfRelation(String),
}

/// Persisted contents of the catalog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogData {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    lines: Vec<ProductLine>,
    #[serde(default)]
    members: Vec<LineMember>,
    #[serde(default)]
    relations: Vec<Relation>,
}

/// In-memory catalog of products, lines, members and relations.
///
/// Persisted as `catalog.json`; implements every store trait.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    data: CatalogData,
    /// Map from product code to its index in `data.products`
    product_index: HashMap<String, usize>,
}

impl Catalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a data directory; a missing file yields an empty catalog
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CATALOG_FILE);

        let data: CatalogData = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            CatalogData::default()
        };

        let mut catalog = Self {
            data,
            product_index: HashMap::new(),
        };
        catalog.rebuild_index();

        Ok(catalog)
    }

    /// Save to a data directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;

        let path = dir.join(CATALOG_FILE);
        let json = serde_json::to_string_pretty(&self.data).context("Failed to serialize catalog")?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.product_index = self
            .data
            .products
            .iter()
            .enumerate()
            .map(|(i, p)| (p.code.clone(), i))
            .collect();
    }

    fn get_product(&self, code: &str) -> Option<&Product> {
        self.product_index.get(code).map(|&i| &self.data.products[i])
    }

    fn get_line(&self, id: LineId) -> Option<&ProductLine> {
        self.data.lines.iter().find(|l| l.id == id)
    }

    fn is_member(&self, line_id: LineId, code: &str) -> bool {
        self.data
            .members
            .iter()
            .any(|m| m.line_id == line_id && m.product_code == code)
    }

    /// All products, by code
    #[must_use]
    pub fn products(&self) -> Vec<&Product> {
        let mut products: Vec<_> = self.data.products.iter().collect();
        products.sort_by(|a, b| a.code.cmp(&b.code));
        products
    }

    /// All relations of a line, newest first
    #[must_use]
    pub fn relations_in_line(&self, line_id: LineId) -> Vec<&Relation> {
        let mut relations: Vec<_> = self
            .data
            .relations
            .iter()
            .filter(|r| r.line_id == line_id)
            .collect();
        relations.sort_by(|a, b| b.id.cmp(&a.id));
        relations
    }

    /// Number of members in a line
    #[must_use]
    pub fn member_count(&self, line_id: LineId) -> usize {
        self.data.members.iter().filter(|m| m.line_id == line_id).count()
    }

    /// Add a product
    pub fn add_product(&mut self, product: Product) -> Result<(), CatalogError> {
        if self.product_index.contains_key(&product.code) {
            return Err(CatalogError::DuplicateProduct(product.code));
        }
        self.product_index
            .insert(product.code.clone(), self.data.products.len());
        self.data.products.push(product);
        Ok(())
    }

    /// Add a line, appended after the current last display position
    pub fn add_line(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> Result<LineId, CatalogError> {
        if self.data.lines.iter().any(|l| l.name == name) {
            return Err(CatalogError::DuplicateLineName(name.to_string()));
        }
        let id = self.data.lines.iter().map(|l| l.id).max().unwrap_or(0) + 1;
        let display_order = self
            .data
            .lines
            .iter()
            .filter_map(|l| l.display_order)
            .max()
            .unwrap_or(0)
            + 1;

        self.data.lines.push(ProductLine {
            id,
            name: name.to_string(),
            description: description.map(String::from),
            display_order: Some(display_order),
        });
        Ok(id)
    }

    /// Place a product in a line
    pub fn add_member(
        &mut self,
        line_id: LineId,
        code: &str,
        rank: f64,
        tier: Option<f64>,
        is_main: bool,
    ) -> Result<(), CatalogError> {
        self.get_line(line_id).ok_or(CatalogError::UnknownLine(line_id))?;
        self.get_product(code)
            .ok_or_else(|| CatalogError::UnknownProduct(code.to_string()))?;
        if self.is_member(line_id, code) {
            return Err(CatalogError::DuplicateMember {
                line_id,
                code: code.to_string(),
            });
        }

        self.data.members.push(LineMember {
            line_id,
            product_code: code.to_string(),
            rank: LaneHint::from(rank),
            tier: tier.map_or(LaneHint::Missing, LaneHint::from),
            is_main,
        });
        Ok(())
    }

    /// Change a member's placement
    pub fn update_member(
        &mut self,
        line_id: LineId,
        code: &str,
        rank: f64,
        tier: Option<f64>,
        is_main: bool,
    ) -> Result<(), CatalogError> {
        let member = self
            .data
            .members
            .iter_mut()
            .find(|m| m.line_id == line_id && m.product_code == code)
            .ok_or_else(|| CatalogError::NotAMember {
                line_id,
                code: code.to_string(),
            })?;

        member.rank = LaneHint::from(rank);
        member.tier = tier.map_or(LaneHint::Missing, LaneHint::from);
        member.is_main = is_main;
        Ok(())
    }

    /// Remove a product from a line, along with that line's relations touching it
    pub fn remove_member(&mut self, line_id: LineId, code: &str) -> Result<(), CatalogError> {
        if !self.is_member(line_id, code) {
            return Err(CatalogError::NotAMember {
                line_id,
                code: code.to_string(),
            });
        }

        self.data
            .relations
            .retain(|r| !(r.line_id == line_id && (r.from == code || r.to == code)));
        self.data
            .members
            .retain(|m| !(m.line_id == line_id && m.product_code == code));
        Ok(())
    }

    /// Add a relation within a line and return its id
    #[allow(clippy::too_many_arguments)]
    pub fn add_relation(
        &mut self,
        line_id: LineId,
        from: &str,
        to: &str,
        strength: Strength,
        directed: bool,
        relation_type: &str,
        edge_label: Option<&str>,
    ) -> Result<RelationId, CatalogError> {
        self.get_line(line_id).ok_or(CatalogError::UnknownLine(line_id))?;
        for code in [from, to] {
            self.get_product(code)
                .ok_or_else(|| CatalogError::UnknownProduct(code.to_string()))?;
        }
        if from == to {
            return Err(CatalogError::SelfRelation(from.to_string()));
        }

        let id = self.data.relations.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        self.data.relations.push(Relation {
            id,
            line_id,
            from: from.to_string(),
            to: to.to_string(),
            strength,
            directed,
            relation_type: relation_type.to_string(),
            edge_label: edge_label.map(String::from),
        });
        Ok(id)
    }

    /// Move a line to a 1-based display rank and renumber all lines 1..n
    pub fn move_line(&mut self, line_id: LineId, rank: usize) -> Result<(), CatalogError> {
        let mut order: Vec<LineId> = sorted_lines(&self.data.lines).iter().map(|l| l.id).collect();
        let pos = order
            .iter()
            .position(|&id| id == line_id)
            .ok_or(CatalogError::UnknownLine(line_id))?;

        order.remove(pos);
        let rank = rank.clamp(1, order.len() + 1);
        order.insert(rank - 1, line_id);

        for (i, id) in order.iter().enumerate() {
            if let Some(line) = self.data.lines.iter_mut().find(|l| l.id == *id) {
                line.display_order = i64::try_from(i + 1).ok();
            }
        }
        Ok(())
    }

    fn context(&self, relation: &Relation) -> Option<ContextRelation> {
        let line = self.get_line(relation.line_id)?;
        let from = self.get_product(&relation.from)?;
        let to = self.get_product(&relation.to)?;
        Some(ContextRelation {
            relation: relation.clone(),
            line_name: line.name.clone(),
            from: from.summary(),
            to: to.summary(),
        })
    }

    fn contexts<F>(&self, pred: F) -> Vec<ContextRelation>
    where
        F: Fn(&Relation) -> bool,
    {
        self.data
            .relations
            .iter()
            .filter(|&r| pred(r))
            .filter_map(|r| self.context(r))
            .collect()
    }
}

fn sorted_lines(lines: &[ProductLine]) -> Vec<&ProductLine> {
    let mut sorted: Vec<_> = lines.iter().collect();
    sorted.sort_by_key(|l| (l.display_order.unwrap_or(i64::MAX), l.id));
    sorted
}

fn member_order(a: &MemberRow, b: &MemberRow) -> Ordering {
    a.member
        .rank_or_default()
        .total_cmp(&b.member.rank_or_default())
        .then_with(|| b.member.is_main.cmp(&a.member.is_main))
        .then_with(|| a.product.code.cmp(&b.product.code))
}

impl ProductStore for Catalog {
    fn product(&self, code: &str) -> Result<Option<Product>> {
        Ok(self.get_product(code).cloned())
    }
}

impl LineStore for Catalog {
    fn line(&self, id: LineId) -> Result<Option<ProductLine>> {
        Ok(self.get_line(id).cloned())
    }

    fn lines_sorted(&self) -> Result<Vec<ProductLine>> {
        Ok(sorted_lines(&self.data.lines).into_iter().cloned().collect())
    }

    fn line_members(&self, line_id: LineId) -> Result<Vec<MemberRow>> {
        let mut rows: Vec<MemberRow> = self
            .data
            .members
            .iter()
            .filter(|m| m.line_id == line_id)
            .filter_map(|m| {
                self.get_product(&m.product_code).map(|p| MemberRow {
                    product: p.clone(),
                    member: m.clone(),
                })
            })
            .collect();
        rows.sort_by(member_order);
        Ok(rows)
    }

    fn lines_for_product(&self, code: &str) -> Result<Vec<ProductLine>> {
        Ok(sorted_lines(&self.data.lines)
            .into_iter()
            .filter(|l| self.is_member(l.id, code))
            .cloned()
            .collect())
    }
}

impl RelationStore for Catalog {
    fn relations_filtered(&self, line_id: LineId, codes: &[String]) -> Result<Vec<Relation>> {
        let codes: HashSet<&str> = codes.iter().map(String::as_str).collect();
        Ok(self
            .data
            .relations
            .iter()
            .filter(|r| {
                r.line_id == line_id
                    && codes.contains(r.from.as_str())
                    && codes.contains(r.to.as_str())
            })
            .cloned()
            .collect())
    }

    fn global_upstream(&self, code: &str) -> Result<Vec<ContextRelation>> {
        Ok(self.contexts(|r| r.directed && r.to == code))
    }

    fn global_downstream(&self, code: &str) -> Result<Vec<ContextRelation>> {
        Ok(self.contexts(|r| r.directed && r.from == code))
    }

    fn global_undirected(&self, code: &str) -> Result<Vec<ContextRelation>> {
        Ok(self.contexts(|r| !r.directed && (r.from == code || r.to == code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_product(code: &str) -> Product {
        Product {
            code: code.into(),
            name: format!("Product {code}"),
            category: None,
            image: None,
        }
    }

    fn seeded() -> (Catalog, LineId) {
        let mut catalog = Catalog::new();
        for code in ["A", "B", "C"] {
            catalog.add_product(make_product(code)).unwrap();
        }
        let line = catalog.add_line("Pumps", None).unwrap();
        (catalog, line)
    }

    #[test]
    fn test_member_uniqueness() {
        let (mut catalog, line) = seeded();
        catalog.add_member(line, "A", 0.0, Some(0.0), true).unwrap();

        let err = catalog.add_member(line, "A", 1.0, None, false).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateMember {
                line_id: line,
                code: "A".into()
            }
        );
    }

    #[test]
    fn test_self_relation_rejected() {
        let (mut catalog, line) = seeded();
        let err = catalog
            .add_relation(line, "A", "A", Strength::Strong, true, "compatible", None)
            .unwrap_err();
        assert_eq!(err, CatalogError::SelfRelation("A".into()));
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let (mut catalog, line) = seeded();
        let err = catalog
            .add_relation(line, "A", "Z", Strength::Strong, true, "compatible", None)
            .unwrap_err();
        assert_eq!(err, CatalogError::UnknownProduct("Z".into()));
    }

    #[test]
    fn test_member_sort_order() {
        let (mut catalog, line) = seeded();
        catalog.add_member(line, "C", 1.0, None, false).unwrap();
        catalog.add_member(line, "B", 1.0, Some(0.0), true).unwrap();
        catalog.add_member(line, "A", 2.0, Some(0.0), true).unwrap();

        let codes: Vec<_> = catalog
            .line_members(line)
            .unwrap()
            .into_iter()
            .map(|r| r.product.code)
            .collect();
        assert_eq!(codes, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_remove_member_drops_its_relations() {
        let (mut catalog, line) = seeded();
        catalog.add_member(line, "A", 0.0, None, true).unwrap();
        catalog.add_member(line, "B", 1.0, None, true).unwrap();
        catalog
            .add_relation(line, "A", "B", Strength::Strong, true, "compatible", None)
            .unwrap();

        catalog.remove_member(line, "B").unwrap();

        assert!(catalog.relations_in_line(line).is_empty());
        assert_eq!(catalog.member_count(line), 1);
    }

    #[test]
    fn test_move_line_renumbers() {
        let mut catalog = Catalog::new();
        let a = catalog.add_line("a", None).unwrap();
        let b = catalog.add_line("b", None).unwrap();
        let c = catalog.add_line("c", None).unwrap();

        catalog.move_line(c, 1).unwrap();
        catalog.move_line(a, 99).unwrap();

        let order: Vec<_> = catalog
            .lines_sorted()
            .unwrap()
            .into_iter()
            .map(|l| (l.id, l.display_order))
            .collect();
        assert_eq!(order, vec![(c, Some(1)), (b, Some(2)), (a, Some(3))]);
    }

    #[test]
    fn test_global_queries_join_line_name() {
        let (mut catalog, line) = seeded();
        catalog
            .add_relation(line, "A", "B", Strength::Weak, true, "compatible", Some("24V"))
            .unwrap();
        catalog
            .add_relation(line, "C", "B", Strength::Strong, false, "compatible", None)
            .unwrap();

        let up = catalog.global_upstream("B").unwrap();
        assert_eq!(up.len(), 1);
        assert_eq!(up[0].line_name, "Pumps");
        assert_eq!(up[0].from.code, "A");

        assert!(catalog.global_downstream("B").unwrap().is_empty());
        assert_eq!(catalog.global_undirected("B").unwrap().len(), 1);
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let (mut catalog, line) = seeded();
        catalog.add_member(line, "A", 0.5, None, false).unwrap();
        catalog.save(dir.path()).unwrap();

        let loaded = Catalog::load(dir.path()).unwrap();
        let rows = loaded.line_members(line).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].member.rank, LaneHint::Value(0.5));
        assert_eq!(rows[0].member.tier, LaneHint::Missing);
        assert!(loaded.product("C").unwrap().is_some());
    }

    #[test]
    fn test_lenient_lane_values() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CATALOG_FILE),
            r#"{
                "products": [{"code": "A", "name": "a"}],
                "lines": [{"id": 1, "name": "L"}],
                "members": [
                    {"line_id": 1, "product_code": "A", "rank": "1.5", "tier": "up",
                     "is_main": true}
                ]
            }"#,
        )
        .unwrap();

        let catalog = Catalog::load(dir.path()).unwrap();
        let member = &catalog.line_members(1).unwrap()[0].member;
        assert_eq!(member.rank, LaneHint::Value(1.5));
        assert_eq!(member.tier, LaneHint::Malformed);
        assert_eq!(member.tier_or_default(), 0.0);
    }
}
