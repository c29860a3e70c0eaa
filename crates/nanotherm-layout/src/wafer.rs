//! Wafer assembler: tiled devices, global alignment crosses and the
//! optional outline ring, gathered under one top cell.

use nanotherm_core::cell::{Cell, CellInstance, Transform};
use nanotherm_core::text::{self, Justify};
use nanotherm_core::{GeomPrimitive, Library, Region};

use crate::array::{sweep, tile};
use crate::config::{MaskConfig, OutlineConfig};
use crate::error::Result;
use crate::primitives::{cross, framed};

pub const CROSS_CELL: &str = "alignment_cross";

/// Build the complete mask library from `cfg`.
pub fn build_wafer(cfg: &MaskConfig) -> Result<Library> {
    cfg.validate()?;

    let placements = sweep(cfg);
    let mut tiling = tile(&placements, cfg, Library::new(&cfg.library_name))?;

    let mark = cross(cfg.cross.length, cfg.cross.width)?;
    tiling
        .library
        .add_cell(Cell::from_polygons(CROSS_CELL, mark.tag(cfg.cross.layer)));

    let mut wafer = Cell::new(&cfg.top_cell);
    for inst in tiling.instances {
        wafer.add_instance(inst);
    }
    for at in &cfg.alignment_marks {
        wafer.add_instance(CellInstance::new(CROSS_CELL, Transform::translate(at.x, at.y)));
    }

    if let Some(outline) = &cfg.outline {
        for poly in outline_region(outline, &cfg.font)?.tag(outline.layer) {
            wafer.add_geometry(GeomPrimitive::Polygon(poly));
        }
        log::info!("Drew wafer outline (radius {})", outline.radius);
    }

    log::info!(
        "Assembled '{}': {} instances, {} alignment marks",
        wafer.name,
        wafer.instance_count(),
        cfg.alignment_marks.len()
    );
    let mut library = tiling.library;
    library.set_top_cell(wafer);
    Ok(library)
}

/// Ring around the wafer, a centred title, and a framed author line.
pub fn outline_region(cfg: &OutlineConfig, font: &str) -> Result<Region> {
    let (cx, cy) = (cfg.center.x, cfg.center.y);
    let ring = Region::ring(cfg.radius, cfg.width, cfg.angle_resolution)?.translate(cx, cy);
    let title = text::render(&cfg.title, cfg.title_size, font, Justify::Center)?
        .translate(cx + cfg.title_origin.x, cy + cfg.title_origin.y);
    let author = text::render(&cfg.author, cfg.author_size, font, Justify::Center)?
        .translate(cx + cfg.author_origin.x, cy + cfg.author_origin.y);
    let author = framed(author, cfg.frame_line, cfg.frame_space)?;
    Ok(Region::merge([ring, title, author]))
}
