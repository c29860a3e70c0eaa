//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Generate the cantilever thermometer photomask as a GDS-II file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path of the GDS-II file to write (overwritten if present)
    #[arg(default_value = "nanothermometer.gds")]
    pub output: PathBuf,

    /// JSON file overriding any subset of the layout constants
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Also write a quick-look preview (.svg, or .json for raw render data)
    #[arg(short, long)]
    pub preview: Option<PathBuf>,

    /// Export even if the mask checks report errors
    #[arg(long)]
    pub no_drc: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,

    /// List the font faces usable as the label font and exit
    #[arg(long)]
    pub list_fonts: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
