//! Alignment and distribution of sibling regions.

use crate::region::Region;

/// Lay regions out left to right with `spacing` between successive
/// bounding-box edges. The first region stays where it is; empty regions
/// are passed through untouched.
pub fn distribute_x(regions: Vec<Region>, spacing: f64) -> Vec<Region> {
    let mut next_min_x: Option<f64> = None;
    regions
        .into_iter()
        .map(|region| {
            let Some(bb) = region.bbox() else {
                return region;
            };
            let placed = match next_min_x {
                Some(x) => region.translate(x - bb.min.x, 0.0),
                None => region,
            };
            if let Some(placed_bb) = placed.bbox() {
                next_min_x = Some(placed_bb.max.x + spacing);
            }
            placed
        })
        .collect()
}

/// Move every region vertically so all share the lowest `min.y` among them.
pub fn align_min_y(regions: Vec<Region>) -> Vec<Region> {
    let floor = regions
        .iter()
        .filter_map(|r| r.bbox())
        .map(|bb| bb.min.y)
        .fold(f64::INFINITY, f64::min);
    if !floor.is_finite() {
        return regions;
    }
    regions
        .into_iter()
        .map(|region| match region.bbox() {
            Some(bb) => region.translate(0.0, floor - bb.min.y),
            None => region,
        })
        .collect()
}
