//! # NanoTherm I/O
//!
//! GDS-II stream output for mask libraries, plus a reader for the same
//! subset so written files can be checked back.

pub mod export;
pub mod gds;

pub use export::{read_gds_file, write_gds, write_gds_file, ExportOptions};
pub use gds::{GdsError, GdsReader, GdsWriter};
