//! Array tiler: expands the parameter sweep into placements and folds them
//! into a library plus the instance list of the wafer.

use nanotherm_core::cell::{CellInstance, Transform};
use nanotherm_core::{Library, Point};

use crate::cantilever::DeviceParams;
use crate::config::MaskConfig;
use crate::device::{build_device, gold_cell_name, nitride_cell_name};
use crate::error::Result;

/// One device position on the wafer.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub params: DeviceParams,
    pub origin: Point,
    /// Block index across all width groups.
    pub block: usize,
}

/// Expand the sweep in wafer order: width group, block, gap size, beam
/// length. Device `(i, j)` of a block sits at
/// `(x_offset + x_spacing·i, y_offset + y_spacing·j)`.
pub fn sweep(cfg: &MaskConfig) -> Vec<Placement> {
    let s = &cfg.sweep;
    let mut placements = Vec::with_capacity(s.device_count());
    for (g, group) in s.width_groups.iter().enumerate() {
        for (b, block) in s.blocks.iter().enumerate() {
            for (i, &gap_size) in s.gap_sizes.iter().enumerate() {
                for (j, &beam_length) in s.beam_lengths.iter().enumerate() {
                    placements.push(Placement {
                        params: DeviceParams {
                            pit_width: cfg.device.pit_width,
                            gap_size,
                            beam_width: group.beam_width,
                            beam_length,
                            tip: block.tip,
                        },
                        origin: Point::new(
                            group.x_offset + s.x_spacing * i as f64,
                            block.y_offset + s.y_spacing * j as f64,
                        ),
                        block: g * s.blocks.len() + b,
                    });
                }
            }
        }
    }
    placements
}

/// Accumulator for the tiling fold.
#[derive(Debug, Clone)]
pub struct Tiling {
    pub library: Library,
    /// Wafer-level instances in placement order.
    pub instances: Vec<CellInstance>,
}

impl Tiling {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            instances: Vec::new(),
        }
    }

    /// Add one device: build its composites unless an identical device was
    /// already built, then reference both at the placement origin.
    pub fn place(mut self, placement: &Placement, cfg: &MaskConfig) -> Result<Self> {
        let gold = gold_cell_name(&placement.params);
        let nitride = nitride_cell_name(&placement.params);
        if !(self.library.contains(&gold) && self.library.contains(&nitride)) {
            let cells = build_device(&placement.params, cfg)?;
            self.library.add_cell(cells.gold);
            self.library.add_cell(cells.nitride);
        }

        let at = Transform::translate(placement.origin.x, placement.origin.y);
        self.instances.push(CellInstance::new(&gold, at));
        self.instances.push(CellInstance::new(&nitride, at));
        Ok(self)
    }
}

/// Fold every placement into `library`. Order is preserved, so the result
/// is reproducible.
pub fn tile(placements: &[Placement], cfg: &MaskConfig, library: Library) -> Result<Tiling> {
    let mut last_block = None;
    let tiling = placements.iter().try_fold(Tiling::new(library), |acc, placement| {
        if last_block != Some(placement.block) {
            log::info!(
                "Block {}: beam width {}, {} tip",
                placement.block,
                placement.params.beam_width,
                placement.params.tip.as_str()
            );
            last_block = Some(placement.block);
        }
        acc.place(placement, cfg)
    })?;
    log::info!(
        "Tiled {} devices ({} instances, {} cells)",
        placements.len(),
        tiling.instances.len(),
        tiling.library.cell_count()
    );
    Ok(tiling)
}
