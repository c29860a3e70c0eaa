use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use nanotherm_core::Library;

use crate::gds::{GdsError, GdsReader, GdsWriter, DEFAULT_TIMESTAMP};

/// Stream settings for a GDS export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Database unit in micrometres.
    pub db_unit_in_um: f64,
    /// Year, month, day, hour, minute, second written to BGNLIB and BGNSTR.
    pub timestamp: [i16; 6],
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            db_unit_in_um: 0.001, // 1nm grid
            timestamp: DEFAULT_TIMESTAMP,
        }
    }
}

/// Stream `lib` into any writer.
pub fn write_gds<W: Write>(writer: W, lib: &Library, options: &ExportOptions) -> Result<(), GdsError> {
    GdsWriter::new(writer)
        .with_db_unit(options.db_unit_in_um)
        .with_timestamp(options.timestamp)
        .write(lib)
}

/// Write `lib` to `path`, replacing any existing file.
pub fn write_gds_file(path: &Path, lib: &Library, options: &ExportOptions) -> Result<(), GdsError> {
    let mut out = BufWriter::new(File::create(path)?);
    write_gds(&mut out, lib, options)?;
    out.flush()?;
    log::info!(
        "Wrote {} ({} cells, top '{}')",
        path.display(),
        lib.cell_count(),
        lib.top_cell.as_deref().unwrap_or("-")
    );
    Ok(())
}

pub fn read_gds_file(path: &Path) -> Result<Library, GdsError> {
    let lib = GdsReader::new(BufReader::new(File::open(path)?)).read()?;
    log::info!("Read {} ({} cells)", path.display(), lib.cell_count());
    Ok(lib)
}
