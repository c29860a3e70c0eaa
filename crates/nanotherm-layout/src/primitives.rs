//! Parameterized building blocks shared by the device and wafer composers.
//!
//! Every builder returns an untagged [`Region`]; the composite that consumes
//! it decides the mask layer.

use nanotherm_core::align;
use nanotherm_core::text::{self, Justify};
use nanotherm_core::Region;

use crate::config::RulerConfig;
use crate::error::{LayoutError, Result};

/// Side length of a contact pad.
pub const PAD_SIZE: f64 = 250.0;

/// Square contact pad, lower-left corner at the origin.
pub fn contact_pad() -> Result<Region> {
    Ok(Region::rect(PAD_SIZE, PAD_SIZE)?)
}

/// Left-justified text with its reference origin on the baseline.
pub fn label(text: &str, font: &str, size: f64) -> Result<Region> {
    Ok(text::render(text, size, font, Justify::Left)?)
}

/// Label text for one device: `beam_width/beam_length/gap_size`.
pub fn device_label(beam_width: f64, beam_length: f64, gap_size: f64) -> String {
    format!("{beam_width}/{beam_length}/{gap_size}")
}

/// The individual ruler bars, left to right, bottom aligned.
pub fn ruler_marks(cfg: &RulerConfig) -> Result<Vec<Region>> {
    if cfg.scale.is_empty() {
        return Err(LayoutError::invalid("ruler.scale", 0.0, "pattern is empty"));
    }
    let bars = (0..cfg.num_marks)
        .map(|i| {
            let scale = cfg.scale[i % cfg.scale.len()];
            Region::rect(cfg.width, scale * cfg.height)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(align::align_min_y(align::distribute_x(bars, cfg.spacing)))
}

/// Litho ruler as one flat region.
pub fn litho_ruler(cfg: &RulerConfig) -> Result<Region> {
    Ok(Region::merge(ruler_marks(cfg)?))
}

/// "+" alignment mark centred on the origin.
pub fn cross(length: f64, width: f64) -> Result<Region> {
    let arm = Region::rect(length, width)?.centered();
    let upright = arm.clone().rotate_deg(90.0);
    Ok(arm.union(&upright))
}

/// `region` surrounded by a rectangular frame of stroke `line`, kept
/// `space` clear of the region's bounding box.
pub fn framed(region: Region, line: f64, space: f64) -> Result<Region> {
    let Some(bb) = region.bbox() else {
        return Ok(region);
    };
    if line <= 0.0 {
        return Ok(region);
    }
    let inner = bb.expand(space);
    let outer = inner.expand(line);
    let hole = Region::rect(inner.width(), inner.height())?.with_min_at(inner.min.x, inner.min.y);
    let frame = Region::rect(outer.width(), outer.height())?
        .with_min_at(outer.min.x, outer.min.y)
        .difference(&hole);
    Ok(region.union(&frame))
}
