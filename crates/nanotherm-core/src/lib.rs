//! # NanoTherm Core
//!
//! Geometry kernel for the NanoTherm mask generator: untagged construction
//! regions with polygon booleans, path smoothing and extrusion, outlined
//! text in the block font or an installed face, a hierarchical cell library,
//! the mask layer stack, and an R-tree over placed footprints.

pub mod align;
pub mod cell;
pub mod error;
pub mod font;
pub mod geometry;
pub mod layer;
pub mod library;
pub mod path;
pub mod region;
pub mod spatial;
pub mod text;

pub use cell::{Cell, CellInstance, Transform};
pub use error::GeometryError;
pub use geometry::{BBox, GeomPrimitive, Point, Polygon, Rect};
pub use layer::{Layer, LayerId, LayerStack};
pub use library::Library;
pub use region::Region;
