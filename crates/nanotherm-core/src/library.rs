use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellId, Transform};
use crate::geometry::{BBox, Polygon};
use crate::layer::LayerStack;
use crate::LayerId;

/// References nested deeper than this are treated as a cycle.
const MAX_DEPTH: usize = 64;

/// A cell library: every cell of the mask plus the layer stack.
///
/// Cells are kept in insertion order, which is also the order they are
/// written out, so a library built twice from the same inputs serialises to
/// the same bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    /// Library name (GDS LIBNAME).
    pub name: String,
    /// Mask layers.
    pub layer_stack: LayerStack,
    /// All cells indexed by name.
    cells: IndexMap<String, Cell>,
    /// Top-level cell (entry point for hierarchy).
    pub top_cell: Option<String>,
}

impl Library {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            layer_stack: LayerStack::nanotherm(),
            cells: IndexMap::new(),
            top_cell: None,
        }
    }

    // ── Cell management ──────────────────────────────────────────────

    /// Insert a cell. If a cell with the same name already exists the
    /// existing one is kept; names encode the parameters that produced a
    /// cell, so equal names mean equal geometry.
    pub fn add_cell(&mut self, cell: Cell) -> CellId {
        let id = cell.id;
        if self.cells.contains_key(&cell.name) {
            log::trace!("cell '{}' already present, reusing", cell.name);
        } else {
            self.cells.insert(cell.name.clone(), cell);
        }
        id
    }

    /// Insert (or replace) the top cell.
    pub fn set_top_cell(&mut self, cell: Cell) {
        let name = cell.name.clone();
        self.cells.shift_remove(&name);
        self.cells.insert(name.clone(), cell);
        self.top_cell = Some(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }

    pub fn get_cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    pub fn get_cell_by_id(&self, id: &CellId) -> Option<&Cell> {
        self.cells.values().find(|c| c.id == *id)
    }

    pub fn top(&self) -> Option<&Cell> {
        self.top_cell.as_deref().and_then(|name| self.cells.get(name))
    }

    pub fn cell_names(&self) -> Vec<&str> {
        self.cells.keys().map(String::as_str).collect()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn all_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    // ── Hierarchy queries ────────────────────────────────────────────

    /// Collapse the hierarchy under `name` into leaf polygons in the
    /// coordinates of that cell. Dangling references are skipped.
    pub fn flatten(&self, name: &str) -> Vec<Polygon> {
        let mut out = Vec::new();
        if let Some(cell) = self.cells.get(name) {
            self.flatten_into(cell, &Transform::default(), 0, &mut out);
        }
        out
    }

    /// Flatten and keep only the polygons on `layer`.
    pub fn flatten_layer(&self, name: &str, layer: LayerId) -> Vec<Polygon> {
        self.flatten(name)
            .into_iter()
            .filter(|p| p.layer_id == layer)
            .collect()
    }

    fn flatten_into(&self, cell: &Cell, transform: &Transform, depth: usize, out: &mut Vec<Polygon>) {
        if depth > MAX_DEPTH {
            log::warn!("reference depth exceeded under '{}', skipping", cell.name);
            return;
        }
        out.extend(
            cell.geometries
                .iter()
                .map(|g| g.to_polygon().transformed(transform)),
        );
        for inst in &cell.instances {
            match self.cells.get(&inst.cell_name) {
                Some(child) => {
                    let composed = inst.transform.then(transform);
                    self.flatten_into(child, &composed, depth + 1, out);
                }
                None => log::warn!(
                    "'{}' references undefined cell '{}'",
                    cell.name,
                    inst.cell_name
                ),
            }
        }
    }

    /// Bounding box of everything under `name`, hierarchy included.
    pub fn cell_bbox(&self, name: &str) -> Option<BBox> {
        BBox::merge_all(self.flatten(name).iter().filter_map(|p| p.bbox()))
    }

    /// Instances in `name` whose referenced cell is missing from the library.
    pub fn unresolved_references(&self, name: &str) -> Vec<String> {
        self.cells
            .get(name)
            .map(|cell| {
                cell.instances
                    .iter()
                    .filter(|inst| !self.cells.contains_key(&inst.cell_name))
                    .map(|inst| inst.cell_name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// How many direct instances of `child` the cell `parent` holds.
    pub fn count_instances_of(&self, parent: &str, child: &str) -> usize {
        self.cells
            .get(parent)
            .map(|cell| {
                cell.instances
                    .iter()
                    .filter(|inst| inst.cell_name == child)
                    .count()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellInstance;
    use crate::geometry::{GeomPrimitive, Rect};
    use crate::layer::{GOLD, NITRIDE};

    fn pad_cell() -> Cell {
        let mut cell = Cell::new("pad");
        cell.add_geometry(GeomPrimitive::Rect(Rect::new(GOLD, 0.0, 0.0, 10.0, 10.0)));
        cell.add_geometry(GeomPrimitive::Rect(Rect::new(NITRIDE, 2.0, 2.0, 4.0, 4.0)));
        cell
    }

    #[test]
    fn test_library_create() {
        let lib = Library::new("test_project");
        assert_eq!(lib.name, "test_project");
        assert_eq!(lib.cell_count(), 0);
        assert!(lib.top().is_none());
    }

    #[test]
    fn test_add_reuses_same_name() {
        let mut lib = Library::new("test");
        let a = lib.add_cell(pad_cell());
        let b = lib.add_cell(Cell::new("pad"));
        assert_eq!(a, b);
        assert_eq!(lib.cell_count(), 1);
        assert_eq!(lib.get_cell("pad").unwrap().geometry_count(), 2);
        assert!(lib.get_cell_by_id(&a).is_some());
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut lib = Library::new("test");
        for name in ["c", "a", "b"] {
            lib.add_cell(Cell::new(name));
        }
        lib.set_top_cell(Cell::new("top"));
        assert_eq!(lib.cell_names(), vec!["c", "a", "b", "top"]);
        assert_eq!(lib.top().unwrap().name, "top");
    }

    #[test]
    fn test_flatten_applies_transforms() {
        let mut lib = Library::new("test");
        lib.add_cell(pad_cell());
        let mut row = Cell::new("row");
        row.add_instance(CellInstance::new("pad", Transform::translate(100.0, 0.0)));
        lib.add_cell(row);
        let top = Cell::new("top").with_instance(CellInstance::new("row", Transform::translate(0.0, 50.0)));
        lib.set_top_cell(top);

        let flat = lib.flatten("top");
        assert_eq!(flat.len(), 2);
        let gold = lib.flatten_layer("top", GOLD);
        assert_eq!(gold.len(), 1);
        let bb = gold[0].bbox().unwrap();
        assert!((bb.min.x - 100.0).abs() < 1e-9 && (bb.min.y - 50.0).abs() < 1e-9);

        let all = lib.cell_bbox("top").unwrap();
        assert!((all.max.x - 110.0).abs() < 1e-9 && (all.max.y - 60.0).abs() < 1e-9);
        assert_eq!(lib.count_instances_of("top", "row"), 1);
    }

    #[test]
    fn test_unresolved_references() {
        let mut lib = Library::new("test");
        let top = Cell::new("top").with_instance(CellInstance::new("ghost", Transform::default()));
        lib.set_top_cell(top);
        assert_eq!(lib.unresolved_references("top"), vec!["ghost".to_string()]);
        assert!(lib.flatten("top").is_empty());
    }
}
