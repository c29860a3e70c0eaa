//! CLI logic for the NanoTherm mask generator: load the layout constants,
//! build the wafer, run the mask checks, stream the GDS-II file and
//! optionally a preview.

mod args;

pub use args::Args;

use std::fs;
use std::path::Path;

use log::{info, warn};
use thiserror::Error;

use nanotherm_core::text::BLOCK_FONT;
use nanotherm_core::{font, Library};
use nanotherm_drc::{check_library, DrcReport, Severity};
use nanotherm_io::{write_gds_file, ExportOptions, GdsError};
use nanotherm_layout::{build_wafer, LayoutError, MaskConfig};
use nanotherm_renderer::RenderFrame;

/// Preview canvas size in pixels.
const PREVIEW_SIZE: (f64, f64) = (1600.0, 1600.0);

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("GDS export failed: {0}")]
    Gds(#[from] GdsError),

    #[error("mask checks failed with {errors} error(s); first: {first}")]
    Drc { errors: usize, first: String },

    #[error("preview: {0}")]
    Preview(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub cells: usize,
    pub instances: usize,
    pub warnings: usize,
}

pub fn load_config(path: Option<&Path>) -> Result<MaskConfig, CliError> {
    match path {
        Some(path) => Ok(MaskConfig::from_json_file(path)?),
        None => Ok(MaskConfig::default()),
    }
}

/// Stop the export when the report holds errors, unless told to carry on.
pub fn gate(report: &DrcReport, no_drc: bool) -> Result<(), CliError> {
    let errors = report.count(Severity::Error);
    if errors == 0 {
        return Ok(());
    }
    let first = report
        .violations
        .iter()
        .find(|v| v.severity == Severity::Error)
        .map(|v| format!("[{}] {}", v.rule_name, v.message))
        .unwrap_or_default();
    if no_drc {
        warn!("Exporting despite {errors} mask check error(s); first: {first}");
        return Ok(());
    }
    Err(CliError::Drc { errors, first })
}

/// Write an SVG preview, or the raw render frame when the path ends in
/// `.json`.
pub fn write_preview(path: &Path, lib: &Library) -> Result<(), CliError> {
    let frame = RenderFrame::from_library(lib, PREVIEW_SIZE.0, PREVIEW_SIZE.1);
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let body = if is_json { frame.to_json()? } else { frame.to_svg() };
    fs::write(path, body)?;
    info!("Preview written to {} ({} polygons)", path.display(), frame.polygon_count());
    Ok(())
}

/// Font faces a configuration may name: the block font, then every
/// installed family.
pub fn font_names() -> Vec<String> {
    std::iter::once(BLOCK_FONT.to_string())
        .chain(font::families())
        .collect()
}

/// Run the generator end to end.
pub fn run(args: &Args) -> Result<RunSummary, CliError> {
    let nothing_built = RunSummary {
        cells: 0,
        instances: 0,
        warnings: 0,
    };

    if args.list_fonts {
        for name in font_names() {
            println!("{name}");
        }
        return Ok(nothing_built);
    }

    let config = load_config(args.config.as_deref())?;

    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(nothing_built);
    }

    info!(
        "Building {} devices into '{}'",
        config.sweep.device_count(),
        args.output.display()
    );
    let library = build_wafer(&config)?;

    let report = check_library(&library);
    gate(&report, args.no_drc)?;

    write_gds_file(&args.output, &library, &ExportOptions::default())?;

    if let Some(preview) = &args.preview {
        write_preview(preview, &library)?;
    }

    Ok(RunSummary {
        cells: library.cell_count(),
        instances: library.top().map_or(0, |c| c.instance_count()),
        warnings: report.count(Severity::Warning),
    })
}
