//! Cantilever composer: an etch pit with the beam outline cut out of it.
//!
//! The beam is anchored at x = 0 and extends along +x, centred on y = 0.
//! A pointed beam faces a second, mirrored tip anchored at the far wall of
//! the pit, leaving `gap_size` between the two points.

use std::f64::consts::PI;

use nanotherm_core::Region;
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipStyle {
    Pointed,
    Blunt,
}

impl TipStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            TipStyle::Pointed => "pointed",
            TipStyle::Blunt => "blunt",
        }
    }
}

/// Everything that determines one device's geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceParams {
    pub pit_width: f64,
    pub gap_size: f64,
    pub beam_width: f64,
    pub beam_length: f64,
    pub tip: TipStyle,
}

impl DeviceParams {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("pit_width", self.pit_width, self.pit_width > 0.0, "must be positive"),
            ("beam_width", self.beam_width, self.beam_width > 0.0, "must be positive"),
            ("beam_length", self.beam_length, self.beam_length > 0.0, "must be positive"),
            ("gap_size", self.gap_size, self.gap_size >= 0.0, "must not be negative"),
        ];
        for (name, value, ok, reason) in checks {
            if !value.is_finite() || !ok {
                return Err(LayoutError::invalid(name, value, reason));
            }
        }
        if self.beam_width > self.pit_width {
            return Err(LayoutError::invalid(
                "beam_width",
                self.beam_width,
                "wider than the etch pit",
            ));
        }
        Ok(())
    }

    /// Height of the equilateral point, zero for a blunt beam.
    pub fn tip_length(&self) -> f64 {
        match self.tip {
            TipStyle::Pointed => self.beam_width * (PI / 6.0).cos(),
            TipStyle::Blunt => 0.0,
        }
    }

    pub fn pit_length(&self) -> f64 {
        self.beam_length + self.tip_length() + self.gap_size
    }

    /// Stable identifier used in cell names, e.g. `w100_l50_g1p5_pointed`.
    pub fn tag(&self) -> String {
        format!(
            "w{}_l{}_g{}_{}",
            number(self.beam_width),
            number(self.beam_length),
            number(self.gap_size),
            self.tip.as_str()
        )
    }
}

/// GDS structure names allow no '.', so decimals use 'p'.
fn number(value: f64) -> String {
    format!("{value}").replace('.', "p").replace('-', "m")
}

/// The boolean operands of the cantilever, before subtraction.
///
/// `outline` is the beam as drawn; `beam` is that outline clipped to the
/// pit, which only differs when the point is longer than the beam.
#[derive(Debug, Clone)]
pub struct CantileverParts {
    pub pit: Region,
    pub outline: Region,
    pub beam: Region,
}

pub fn cantilever_parts(params: &DeviceParams) -> Result<CantileverParts> {
    params.validate()?;
    let w = params.beam_width;
    let pit_length = params.pit_length();

    let pit = Region::rect(pit_length, params.pit_width)?.translate(0.0, -params.pit_width / 2.0);

    let outline = match params.tip {
        TipStyle::Blunt => Region::rect(params.beam_length, w)?.translate(0.0, -w / 2.0),
        TipStyle::Pointed => {
            let tip_length = params.tip_length();
            let tip_start = params.beam_length - tip_length;
            let point = Region::taper(tip_length, w, 0.0)?;
            let mut parts = vec![
                point.clone().translate(tip_start, 0.0),
                point.rotate_deg(180.0).translate(pit_length, 0.0),
            ];
            if tip_start > 0.0 {
                parts.push(Region::rect(tip_start, w)?.translate(0.0, -w / 2.0));
            }
            Region::merge(parts)
        }
    };

    let beam = outline.intersection(&pit);
    if beam.area() + 1e-6 < outline.area() {
        log::debug!("{}: point reaches behind the anchor, clipped to the pit", params.tag());
    }
    Ok(CantileverParts { pit, outline, beam })
}

/// Etch pit minus beam: the released cantilever profile.
pub fn cantilever(params: &DeviceParams) -> Result<Region> {
    let parts = cantilever_parts(params)?;
    Ok(parts.pit.difference(&parts.beam))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MaskConfig;

    fn params(gap: f64, width: f64, length: f64, tip: TipStyle) -> DeviceParams {
        DeviceParams {
            pit_width: 600.0,
            gap_size: gap,
            beam_width: width,
            beam_length: length,
            tip,
        }
    }

    #[test]
    fn test_pointed_scenario() {
        let p = params(1.0, 100.0, 50.0, TipStyle::Pointed);
        assert!((p.tip_length() - 86.60254).abs() < 1e-4);
        assert!((p.pit_length() - 137.60254).abs() < 1e-4);

        let shape = cantilever(&p).unwrap();
        let bb = shape.bbox().unwrap();
        assert!((bb.width() - 137.60254).abs() < 1e-4);
        assert!((bb.height() - 600.0).abs() < 1e-6);
        assert!((bb.min.y + 300.0).abs() < 1e-6 && (bb.max.y - 300.0).abs() < 1e-6);
        assert!(bb.min.x.abs() < 1e-6);
    }

    #[test]
    fn test_pointed_tips_face_each_other() {
        let p = params(2.0, 50.0, 300.0, TipStyle::Pointed);
        let CantileverParts { pit, beam, .. } = cantilever_parts(&p).unwrap();
        // Beam plus the opposing point.
        assert_eq!(beam.piece_count(), 2);
        let tip_length = p.tip_length();
        let beam_area = (300.0 - tip_length) * 50.0 + 2.0 * (0.5 * 50.0 * tip_length);
        assert!((beam.area() - beam_area).abs() < 1e-3);
        assert!(pit.contains(&beam));

        let trench = cantilever(&p).unwrap();
        assert!((trench.area() - (pit.area() - beam_area)).abs() < 1e-3);
    }

    #[test]
    fn test_blunt_beam() {
        let p = params(1.5, 100.0, 200.0, TipStyle::Blunt);
        assert_eq!(p.tip_length(), 0.0);
        assert_eq!(p.pit_length(), 201.5);

        let CantileverParts { pit, beam, .. } = cantilever_parts(&p).unwrap();
        let bb = beam.bbox().unwrap();
        assert_eq!((bb.min.x, bb.max.x), (0.0, 200.0));
        assert_eq!((bb.min.y, bb.max.y), (-50.0, 50.0));
        let trench = cantilever(&p).unwrap();
        // The beam is anchored on the pit wall, so the trench is one U.
        assert_eq!(trench.piece_count(), 1);
        assert!((trench.area() - (201.5 * 600.0 - 200.0 * 100.0)).abs() < 1e-3);
        assert!(pit.contains(&beam));
    }

    #[test]
    fn test_short_pointed_beam_is_clipped_to_the_pit() {
        // The point (86.6) is longer than the beam (50).
        let p = params(1.0, 100.0, 50.0, TipStyle::Pointed);
        let CantileverParts { pit, outline, beam } = cantilever_parts(&p).unwrap();
        assert!(!pit.contains(&outline));
        assert!((outline.bbox().unwrap().min.x + 36.60254).abs() < 1e-4);
        assert!(beam.area() < outline.area() - 1.0);
        assert!(pit.contains(&beam));
        assert!(beam.bbox().unwrap().min.x >= -1e-6);
    }

    #[test]
    fn test_every_swept_device_draws_beam_inside_pit() {
        let config = MaskConfig::default();
        for group in &config.sweep.width_groups {
            for tip in [TipStyle::Pointed, TipStyle::Blunt] {
                for &gap in &config.sweep.gap_sizes {
                    for &length in &config.sweep.beam_lengths {
                        let p = DeviceParams {
                            pit_width: config.device.pit_width,
                            gap_size: gap,
                            beam_width: group.beam_width,
                            beam_length: length,
                            tip,
                        };
                        let CantileverParts { pit, outline, beam } = cantilever_parts(&p).unwrap();
                        assert!(pit.contains(&beam), "{}", p.tag());
                        if p.tip_length() <= length {
                            // Nothing to clip: the drawn beam already fits.
                            assert!(pit.contains(&outline), "{}", p.tag());
                            assert!((outline.area() - beam.area()).abs() < 1e-3, "{}", p.tag());
                        }
                        let expected = match tip {
                            TipStyle::Blunt => length + gap,
                            TipStyle::Pointed => length + group.beam_width * (PI / 6.0).cos() + gap,
                        };
                        let width = cantilever(&p).unwrap().bbox().unwrap().width();
                        assert!((width - expected).abs() < 1e-5, "{}", p.tag());
                    }
                }
            }
        }
    }

    #[test]
    fn test_validation() {
        assert!(params(-0.5, 100.0, 50.0, TipStyle::Blunt).validate().is_err());
        assert!(params(1.0, 100.0, 0.0, TipStyle::Blunt).validate().is_err());
        assert!(params(1.0, 700.0, 50.0, TipStyle::Blunt).validate().is_err());
        assert!(params(f64::NAN, 100.0, 50.0, TipStyle::Blunt).validate().is_err());
        assert!(params(0.0, 100.0, 50.0, TipStyle::Blunt).validate().is_ok());
        assert!(matches!(
            cantilever(&params(1.0, 100.0, -5.0, TipStyle::Pointed)),
            Err(LayoutError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_tag() {
        assert_eq!(params(1.5, 100.0, 50.0, TipStyle::Pointed).tag(), "w100_l50_g1p5_pointed");
        assert_eq!(params(1.0, 50.0, 500.0, TipStyle::Blunt).tag(), "w50_l500_g1_blunt");
    }
}
