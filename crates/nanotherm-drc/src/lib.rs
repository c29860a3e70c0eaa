//! # NanoTherm DRC
//!
//! Mask rule checks run on a finished library before it is streamed out:
//! every exported polygon on a fabricated layer, no degenerate polygons,
//! every reference resolved, and no two top-level instances crowding each
//! other on the same layer.

pub mod check;
pub mod violation;

pub use check::{check_library, DrcReport};
pub use violation::{DrcViolation, Severity, ViolationType};
