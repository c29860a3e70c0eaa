//! # NanoTherm Renderer
//!
//! Quick-look preview of a mask library. The top cell is flattened into
//! per-layer render data, a viewport is fitted to its extent, and the frame
//! is emitted as an SVG document or as JSON.

pub mod render_data;
pub mod viewport;

pub use render_data::{RenderFrame, RenderLayer, RenderPolygon};
pub use viewport::Viewport;
