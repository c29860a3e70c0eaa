use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{BBox, GeomPrimitive, Point, Polygon};

pub type CellId = Uuid;

/// Derive the identifier of a cell from its name.
///
/// Ids are name-based (UUID v5) so that two runs over the same parameters
/// produce the same hierarchy.
pub fn cell_id_for(name: &str) -> CellId {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// Placement of a child cell: reflect in x, magnify, rotate, then offset,
/// in that order. This is the order an SREF's STRANS, MAG, ANGLE and XY
/// apply in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub offset: Point,
    /// Degrees, counter-clockwise.
    pub rotation: f64,
    /// Reflect y before rotating.
    pub mirror_x: bool,
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::translate(0.0, 0.0)
    }
}

impl Transform {
    /// Pure offset.
    pub fn translate(x: f64, y: f64) -> Self {
        Self {
            offset: Point::new(x, y),
            rotation: 0.0,
            mirror_x: false,
            scale: 1.0,
        }
    }

    pub fn apply(&self, point: &Point) -> Point {
        let flip = if self.mirror_x { -1.0 } else { 1.0 };
        let (x, y) = (point.x * self.scale, point.y * self.scale * flip);
        let (sin, cos) = self.rotation.to_radians().sin_cos();
        self.offset.translate(x * cos - y * sin, x * sin + y * cos)
    }

    /// Compose: `self` is applied first, then `parent`.
    pub fn then(&self, parent: &Transform) -> Transform {
        // A parent mirror flips the sense of the child's rotation.
        let child_rotation = if parent.mirror_x {
            -self.rotation
        } else {
            self.rotation
        };
        Transform {
            offset: parent.apply(&self.offset),
            rotation: (parent.rotation + child_rotation).rem_euclid(360.0),
            mirror_x: parent.mirror_x ^ self.mirror_x,
            scale: parent.scale * self.scale,
        }
    }
}

/// One placement of a named cell inside another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellInstance {
    pub cell_id: CellId,
    pub cell_name: String,
    pub transform: Transform,
}

impl CellInstance {
    pub fn new(cell_name: &str, transform: Transform) -> Self {
        Self {
            cell_id: cell_id_for(cell_name),
            cell_name: cell_name.to_string(),
            transform,
        }
    }
}

/// A named structure: its own shapes plus placements of other cells.
///
/// Cells only grow: geometry and instances are appended, never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub name: String,
    pub geometries: Vec<GeomPrimitive>,
    pub instances: Vec<CellInstance>,
}

impl Cell {
    pub fn new(name: &str) -> Self {
        Self {
            id: cell_id_for(name),
            name: name.to_string(),
            geometries: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// Build a leaf cell from already tagged polygons.
    pub fn from_polygons(name: &str, polygons: Vec<Polygon>) -> Self {
        let mut cell = Self::new(name);
        cell.geometries = polygons.into_iter().map(GeomPrimitive::Polygon).collect();
        cell
    }

    pub fn add_geometry(&mut self, geom: GeomPrimitive) {
        self.geometries.push(geom);
    }

    pub fn add_instance(&mut self, instance: CellInstance) {
        self.instances.push(instance);
    }

    /// Builder-style insertion, used when folding placements into a parent.
    pub fn with_instance(mut self, instance: CellInstance) -> Self {
        self.instances.push(instance);
        self
    }

    /// Extent of this cell's own shapes; placements are not followed.
    pub fn local_bbox(&self) -> Option<BBox> {
        BBox::merge_all(self.geometries.iter().filter_map(|g| g.bbox()))
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}
