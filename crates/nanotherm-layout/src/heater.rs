//! Meandering heater coil with straight leads and contact pads.

use nanotherm_core::path::{self, CrossSection};
use nanotherm_core::{Point, Region};

use crate::config::HeaterConfig;
use crate::error::{LayoutError, Result};
use crate::primitives::{contact_pad, PAD_SIZE};

/// Meander point counts must be even and leave at least one full leg
/// after the trim.
pub fn check_squiggles(squiggles: usize) -> Result<()> {
    if squiggles < 4 || squiggles % 2 != 0 {
        return Err(LayoutError::invalid(
            "heater.squiggles",
            squiggles as f64,
            "must be even and at least 4",
        ));
    }
    Ok(())
}

/// Boustrophedon centreline starting at the origin: horizontal runs of
/// `length` stacked `pitch` apart, `squiggles` points in all, with the final
/// point dropped.
pub fn centerline(length: f64, pitch: f64, squiggles: usize) -> Result<Vec<Point>> {
    check_squiggles(squiggles)?;
    let mut points = Vec::with_capacity(squiggles);
    for run in 0..squiggles / 2 {
        let y = run as f64 * pitch;
        let (a, b) = if run % 2 == 0 { (0.0, length) } else { (length, 0.0) };
        points.push(Point::new(a, y));
        points.push(Point::new(b, y));
    }
    points.pop();
    Ok(points)
}

/// The full heater: coil, two leads, two pads, merged.
///
/// Both leads leave the coil towards `pad_x`. When the trimmed path ends on
/// the far side of the meander, that lead is mirrored to exit outward there.
pub fn heater(cfg: &HeaterConfig) -> Result<Region> {
    let points = centerline(cfg.length, cfg.pitch, cfg.squiggles)?;
    let smoothed = path::smooth(&points, cfg.radius)?;
    let coil = path::extrude(&smoothed, &CrossSection::new(cfg.width))?;

    let start = points[0];
    let end = points[points.len() - 1];
    let end_on_far_side = end.x > cfg.length / 2.0;

    let parts = vec![
        coil,
        lead(cfg, start, false, false)?,
        lead(cfg, end, end_on_far_side, true)?,
    ];
    let shape = Region::merge(parts);
    log::debug!(
        "heater: {} legs, {} vertices on the centreline",
        cfg.squiggles / 2,
        smoothed.len()
    );
    Ok(shape)
}

/// Bar plus pad attached at a coil end. The pad hangs below the bar for the
/// start lead and above it for the end lead so the two never touch.
fn lead(cfg: &HeaterConfig, at: Point, mirrored: bool, hang_up: bool) -> Result<Region> {
    let half = cfg.width / 2.0;
    let (bar_x, pad_x) = if mirrored {
        (at.x, at.x - cfg.pad_x - PAD_SIZE)
    } else {
        (at.x - cfg.lead_length, at.x + cfg.pad_x)
    };
    let pad_y = if hang_up { at.y - half } else { at.y + half - PAD_SIZE };

    let bar = Region::rect(cfg.lead_length, cfg.width)?.translate(bar_x, at.y - half);
    let pad = contact_pad()?.translate(pad_x, pad_y);
    Ok(bar.union(&pad))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> HeaterConfig {
        HeaterConfig {
            width: 15.0,
            radius: 20.0,
            length: 300.0,
            pitch: 60.0,
            squiggles: 10,
            ..HeaterConfig::default()
        }
    }

    #[test]
    fn test_centerline_trim() {
        let points = centerline(300.0, 60.0, 10).unwrap();
        assert_eq!(points.len(), 9);
        assert_eq!(points[0], Point::new(0.0, 0.0));
        assert_eq!(points[8], Point::new(0.0, 240.0));

        // Four complete runs, each spanning the full length.
        let full_runs = points
            .windows(2)
            .filter(|w| w[0].y == w[1].y && (w[0].x - w[1].x).abs() == 300.0)
            .count();
        assert_eq!(full_runs, 4);

        let max_y = points.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert_eq!(max_y, 240.0);
    }

    #[test]
    fn test_scenario_heater() {
        let shape = heater(&scenario()).unwrap();
        assert_eq!(shape.piece_count(), 1);

        let bb = shape.bbox().unwrap();
        assert!((bb.min.x + 400.0).abs() < 1e-6);
        assert!((bb.max.x - 307.5).abs() < 1e-6);
        // Start pad hangs down from y = 0, end pad rises from y = 240.
        assert!((bb.min.y - (7.5 - 250.0)).abs() < 1e-6);
        assert!((bb.max.y - (240.0 - 7.5 + 250.0)).abs() < 1e-6);

        let start_pad = contact_pad().unwrap().translate(-400.0, 7.5 - 250.0);
        let end_pad = contact_pad().unwrap().translate(-400.0, 232.5);
        assert!(shape.contains(&start_pad));
        assert!(shape.contains(&end_pad));
        let start_bar = Region::rect(250.0, 15.0).unwrap().translate(-250.0, -7.5);
        assert!(shape.contains(&start_bar));
    }

    #[test]
    fn test_coil_stays_within_the_meander() {
        let cfg = scenario();
        let points = centerline(cfg.length, cfg.pitch, cfg.squiggles).unwrap();
        let coil = path::extrude(
            &path::smooth(&points, cfg.radius).unwrap(),
            &CrossSection::new(cfg.width),
        )
        .unwrap();
        let bb = coil.bbox().unwrap();
        assert!((bb.min.y + 7.5).abs() < 1e-6);
        assert!((bb.max.y - 240.0).abs() < 1e-6);
        assert!(bb.min.x >= -7.5 - 1e-6 && bb.max.x <= 307.5 + 1e-6);
    }

    #[test]
    fn test_far_side_end_is_mirrored() {
        let cfg = HeaterConfig {
            squiggles: 8,
            ..scenario()
        };
        let points = centerline(cfg.length, cfg.pitch, cfg.squiggles).unwrap();
        assert_eq!(points.last(), Some(&Point::new(300.0, 180.0)));

        let shape = heater(&cfg).unwrap();
        let bb = shape.bbox().unwrap();
        assert!((bb.max.x - 700.0).abs() < 1e-6);
        assert_eq!(shape.piece_count(), 1);
    }

    #[test]
    fn test_rejects_odd_or_tiny_counts() {
        for bad in [0, 2, 3, 7, 11] {
            assert!(centerline(300.0, 60.0, bad).is_err(), "{bad}");
        }
        assert!(centerline(300.0, 60.0, 4).is_ok());
    }

    #[test]
    fn test_radius_too_large_for_pitch() {
        let cfg = HeaterConfig {
            radius: 40.0,
            ..scenario()
        };
        assert!(matches!(heater(&cfg), Err(LayoutError::Geometry(_))));
    }
}
