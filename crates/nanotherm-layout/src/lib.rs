//! # NanoTherm Layout
//!
//! The parametric part of the mask: primitive builders, the cantilever and
//! heater composers, the per-device composer on the gold and nitride layers,
//! the sweep tiler, and the wafer assembler that gathers everything under a
//! single top cell.

pub mod array;
pub mod cantilever;
pub mod config;
pub mod device;
pub mod error;
pub mod heater;
pub mod primitives;
pub mod wafer;

pub use cantilever::{DeviceParams, TipStyle};
pub use config::MaskConfig;
pub use error::LayoutError;
pub use wafer::build_wafer;
