//! Device composer: one thermometer on both mask layers.

use nanotherm_core::cell::Cell;
use nanotherm_core::layer::{GOLD, NITRIDE};
use nanotherm_core::Region;

use crate::cantilever::{cantilever, DeviceParams};
use crate::config::MaskConfig;
use crate::error::Result;
use crate::heater::heater;
use crate::primitives::{contact_pad, device_label, label, litho_ruler};

/// The two composites of one device, ready to be added to a library.
#[derive(Debug, Clone)]
pub struct DeviceCells {
    pub gold: Cell,
    pub nitride: Cell,
}

pub fn gold_cell_name(params: &DeviceParams) -> String {
    format!("gold_{}", params.tag())
}

pub fn nitride_cell_name(params: &DeviceParams) -> String {
    format!("nitride_{}", params.tag())
}

/// Conductor layer: gold mask with the cantilever cut out, pads, busbars,
/// label, heater and the two rulers, all merged.
pub fn gold_region(params: &DeviceParams, trench: &Region, cfg: &MaskConfig) -> Result<Region> {
    let d = &cfg.device;

    let mask = Region::rect(d.gold_mask_width, d.pit_width)?
        .translate(d.gold_mask_x, -d.pit_width / 2.0)
        .difference(trench);

    let mut parts = vec![mask];
    for pad in &d.pads {
        parts.push(contact_pad()?.translate(pad.x, pad.y));
    }
    for bar in &d.busbars {
        parts.push(Region::rect(d.busbar_width, d.busbar_height)?.translate(bar.x, bar.y));
    }

    let text = device_label(params.beam_width, params.beam_length, params.gap_size);
    parts.push(label(&text, &cfg.font, d.label_size)?.translate(d.label_origin.x, d.label_origin.y));
    parts.push(heater(&cfg.heater)?.translate(d.heater_origin.x, d.heater_origin.y));

    let ruler = litho_ruler(&cfg.ruler)?;
    parts.push(
        ruler
            .clone()
            .translate(d.bottom_ruler_origin.x, d.bottom_ruler_origin.y),
    );
    parts.push(
        ruler
            .rotate_deg(90.0)
            .translate(d.side_ruler_origin.x, d.side_ruler_origin.y),
    );

    Ok(Region::merge(parts))
}

/// Build both composites. Each is tagged to its mask layer here and nowhere
/// else.
pub fn build_device(params: &DeviceParams, cfg: &MaskConfig) -> Result<DeviceCells> {
    let trench = cantilever(params)?;
    let gold = gold_region(params, &trench, cfg)?;

    let gold = Cell::from_polygons(&gold_cell_name(params), gold.tag(GOLD));
    let nitride = Cell::from_polygons(&nitride_cell_name(params), trench.tag(NITRIDE));
    log::debug!(
        "device {}: {} gold / {} nitride polygons",
        params.tag(),
        gold.geometry_count(),
        nitride.geometry_count()
    );
    Ok(DeviceCells { gold, nitride })
}
