//! Layout constants for the mask, held as serde records.
//!
//! `MaskConfig::default()` is the production mask. A JSON file may override
//! any subset of fields; everything left out keeps its default.

use std::path::Path;

use nanotherm_core::layer::{LayerId, GOLD, NITRIDE};
use nanotherm_core::text::{self, BLOCK_FONT};
use nanotherm_core::Point;
use serde::{Deserialize, Serialize};

use crate::cantilever::TipStyle;
use crate::error::{LayoutError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskConfig {
    /// GDS library name.
    pub library_name: String,
    /// Name of the root cell holding every placement.
    pub top_cell: String,
    /// Font face for device labels and the outline text.
    pub font: String,
    pub device: DeviceLayout,
    pub heater: HeaterConfig,
    pub ruler: RulerConfig,
    pub cross: CrossConfig,
    pub sweep: SweepConfig,
    /// Positions of the global alignment crosses.
    pub alignment_marks: Vec<Point>,
    /// Wafer outline and label ring. Not drawn unless set.
    pub outline: Option<OutlineConfig>,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            library_name: "NANOTHERM".to_string(),
            top_cell: "Wafer".to_string(),
            font: BLOCK_FONT.to_string(),
            device: DeviceLayout::default(),
            heater: HeaterConfig::default(),
            ruler: RulerConfig::default(),
            cross: CrossConfig::default(),
            sweep: SweepConfig::default(),
            alignment_marks: vec![
                Point::new(-1200.0, 9600.0),
                Point::new(33000.0, 9600.0),
                Point::new(-1200.0, -32000.0),
                Point::new(33000.0, -32000.0),
            ],
            outline: None,
        }
    }
}

/// Device-local placement constants, relative to the cantilever anchor at
/// the origin. Independent of the sweep parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceLayout {
    /// Etch pit extent across the beam.
    pub pit_width: f64,
    /// Length of the gold mask the cantilever footprint is cut from.
    pub gold_mask_width: f64,
    /// Left edge of the gold mask.
    pub gold_mask_x: f64,
    /// Lower-left corners of the two electrode pads.
    pub pads: [Point; 2],
    /// Lower-left corners of the two busbars.
    pub busbars: [Point; 2],
    pub busbar_width: f64,
    pub busbar_height: f64,
    pub label_origin: Point,
    pub label_size: f64,
    pub heater_origin: Point,
    pub bottom_ruler_origin: Point,
    /// The side ruler is rotated 90° before being moved here.
    pub side_ruler_origin: Point,
}

impl Default for DeviceLayout {
    fn default() -> Self {
        Self {
            pit_width: 600.0,
            gold_mask_width: 700.0,
            gold_mask_x: -50.0,
            pads: [Point::new(-250.0, 300.0 + 125.0), Point::new(600.0, 300.0 + 125.0)],
            busbars: [Point::new(-50.0, -100.0), Point::new(600.0, -100.0)],
            busbar_width: 50.0,
            busbar_height: 600.0,
            label_origin: Point::new(60.0, 525.0),
            label_size: 50.0,
            heater_origin: Point::new(-240.0, -150.0),
            bottom_ruler_origin: Point::new(-50.0, -450.0),
            side_ruler_origin: Point::new(1105.0, -450.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaterConfig {
    /// Trace width.
    pub width: f64,
    /// Corner rounding radius of the centreline.
    pub radius: f64,
    /// Horizontal run per leg.
    pub length: f64,
    /// Vertical spacing between legs.
    pub pitch: f64,
    /// Number of meander points before the trim. Even, at least 4.
    pub squiggles: usize,
    /// Length of the straight bar joining each coil end to its pad.
    pub lead_length: f64,
    /// Pad left edge relative to the coil end it serves.
    pub pad_x: f64,
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            width: 15.0,
            radius: 20.0,
            length: 150.0,
            pitch: 60.0,
            squiggles: 10,
            lead_length: 250.0,
            pad_x: -400.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulerConfig {
    /// Unit height the scale pattern multiplies.
    pub height: f64,
    /// Bar width.
    pub width: f64,
    /// Gap between successive bar edges.
    pub spacing: f64,
    /// Repeating height pattern.
    pub scale: Vec<f64>,
    pub num_marks: usize,
}

impl Default for RulerConfig {
    fn default() -> Self {
        Self {
            height: 2.0,
            width: 15.0,
            spacing: 30.0,
            scale: vec![30.0, 10.0, 10.0, 10.0, 10.0, 20.0, 10.0, 10.0, 10.0, 10.0],
            num_marks: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossConfig {
    pub length: f64,
    pub width: f64,
    pub layer: LayerId,
}

impl Default for CrossConfig {
    fn default() -> Self {
        Self {
            length: 1000.0,
            width: 100.0,
            layer: NITRIDE,
        }
    }
}

/// One beam width and the horizontal offset of its column of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidthGroup {
    pub beam_width: f64,
    pub x_offset: f64,
}

/// One block of the sweep: a full gap × length grid at a vertical offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockConfig {
    pub y_offset: f64,
    pub tip: TipStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Gap sizes along the grid x axis.
    pub gap_sizes: Vec<f64>,
    /// Beam lengths along the grid y axis.
    pub beam_lengths: Vec<f64>,
    pub x_spacing: f64,
    pub y_spacing: f64,
    pub width_groups: Vec<WidthGroup>,
    pub blocks: Vec<BlockConfig>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            gap_sizes: (0..9).map(|k| 1.0 + 0.5 * k as f64).collect(),
            beam_lengths: vec![50.0, 75.0, 100.0, 150.0, 200.0, 300.0, 400.0, 500.0],
            x_spacing: 1800.0,
            y_spacing: 1220.0,
            width_groups: vec![
                WidthGroup {
                    beam_width: 100.0,
                    x_offset: 0.0,
                },
                WidthGroup {
                    beam_width: 50.0,
                    x_offset: 16500.0,
                },
            ],
            blocks: vec![
                BlockConfig {
                    y_offset: 0.0,
                    tip: TipStyle::Pointed,
                },
                BlockConfig {
                    y_offset: -10600.0,
                    tip: TipStyle::Blunt,
                },
                BlockConfig {
                    y_offset: -21200.0,
                    tip: TipStyle::Pointed,
                },
                BlockConfig {
                    y_offset: -31800.0,
                    tip: TipStyle::Blunt,
                },
            ],
        }
    }
}

impl SweepConfig {
    /// Device placements the sweep produces.
    pub fn device_count(&self) -> usize {
        self.width_groups.len() * self.blocks.len() * self.gap_sizes.len() * self.beam_lengths.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineConfig {
    pub center: Point,
    /// Centreline radius of the ring.
    pub radius: f64,
    pub width: f64,
    pub angle_resolution: f64,
    pub title: String,
    pub title_size: f64,
    /// Title position relative to `center`.
    pub title_origin: Point,
    pub author: String,
    pub author_size: f64,
    pub author_origin: Point,
    /// Frame stroke width around the author text.
    pub frame_line: f64,
    /// Clearance between the author text and its frame.
    pub frame_space: f64,
    pub layer: LayerId,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            center: Point::new(0.0, 0.0),
            radius: 51000.0,
            width: 500.0,
            angle_resolution: 2.5,
            title: "6.152J Lab 3 - Spring 2022".to_string(),
            title_size: 4000.0,
            title_origin: Point::new(0.0, 36000.0),
            author: "Fischer Moseley".to_string(),
            author_size: 3000.0,
            author_origin: Point::new(0.0, -30000.0),
            frame_line: 10.0,
            frame_space: 10.0,
            layer: NITRIDE,
        }
    }
}

impl MaskConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded mask config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject configurations that cannot produce a valid mask. Runs before
    /// any geometry is built.
    pub fn validate(&self) -> Result<()> {
        if !text::is_known_font(&self.font) {
            return Err(LayoutError::invalid(format!("font '{}'", self.font), 0.0, "unknown font face"));
        }

        let d = &self.device;
        positive("device.pit_width", d.pit_width)?;
        positive("device.gold_mask_width", d.gold_mask_width)?;
        positive("device.busbar_width", d.busbar_width)?;
        positive("device.busbar_height", d.busbar_height)?;
        positive("device.label_size", d.label_size)?;

        let h = &self.heater;
        positive("heater.width", h.width)?;
        positive("heater.radius", h.radius)?;
        positive("heater.length", h.length)?;
        positive("heater.pitch", h.pitch)?;
        positive("heater.lead_length", h.lead_length)?;
        crate::heater::check_squiggles(h.squiggles)?;

        let r = &self.ruler;
        positive("ruler.height", r.height)?;
        positive("ruler.width", r.width)?;
        non_negative("ruler.spacing", r.spacing)?;
        if r.num_marks == 0 {
            return Err(LayoutError::invalid("ruler.num_marks", 0.0, "must be at least 1"));
        }
        if r.scale.is_empty() {
            return Err(LayoutError::invalid("ruler.scale", 0.0, "pattern is empty"));
        }
        for (i, s) in r.scale.iter().enumerate() {
            positive(&format!("ruler.scale[{i}]"), *s)?;
        }

        positive("cross.length", self.cross.length)?;
        positive("cross.width", self.cross.width)?;
        mask_layer("cross.layer", self.cross.layer)?;

        let s = &self.sweep;
        positive("sweep.x_spacing", s.x_spacing)?;
        positive("sweep.y_spacing", s.y_spacing)?;
        if s.device_count() == 0 {
            return Err(LayoutError::invalid("sweep", 0.0, "produces no devices"));
        }
        for (i, g) in s.gap_sizes.iter().enumerate() {
            non_negative(&format!("sweep.gap_sizes[{i}]"), *g)?;
        }
        for (i, l) in s.beam_lengths.iter().enumerate() {
            positive(&format!("sweep.beam_lengths[{i}]"), *l)?;
        }
        for (i, g) in s.width_groups.iter().enumerate() {
            let name = format!("sweep.width_groups[{i}].beam_width");
            positive(&name, g.beam_width)?;
            if g.beam_width > d.pit_width {
                return Err(LayoutError::invalid(name, g.beam_width, "wider than the etch pit"));
            }
        }

        if let Some(o) = &self.outline {
            positive("outline.radius", o.radius)?;
            positive("outline.width", o.width)?;
            positive("outline.angle_resolution", o.angle_resolution)?;
            positive("outline.title_size", o.title_size)?;
            positive("outline.author_size", o.author_size)?;
            non_negative("outline.frame_line", o.frame_line)?;
            non_negative("outline.frame_space", o.frame_space)?;
            mask_layer("outline.layer", o.layer)?;
        }
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::invalid(name, value, "must be positive"))
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(LayoutError::invalid(name, value, "must not be negative"))
    }
}

fn mask_layer(name: &str, layer: LayerId) -> Result<()> {
    if layer == GOLD || layer == NITRIDE {
        Ok(())
    } else {
        Err(LayoutError::invalid(name, layer as f64, "not a fabrication layer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MaskConfig::default();
        config.validate().unwrap();
        assert_eq!(config.sweep.gap_sizes.len(), 9);
        assert_eq!(config.sweep.gap_sizes[8], 5.0);
        assert_eq!(config.sweep.device_count(), 576);
        assert_eq!(config.alignment_marks.len(), 4);
        assert!(config.outline.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "heater": { "length": 120.0 }, "sweep": { "beam_lengths": [60.0] } }"#;
        let config = MaskConfig::from_json_str(json).unwrap();
        assert_eq!(config.heater.length, 120.0);
        assert_eq!(config.heater.width, 15.0);
        assert_eq!(config.sweep.beam_lengths, vec![60.0]);
        assert_eq!(config.sweep.x_spacing, 1800.0);
        assert_eq!(config.device, DeviceLayout::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = MaskConfig::default();
        config.outline = Some(OutlineConfig::default());
        let json = config.to_json().unwrap();
        assert!(json.contains("\"pointed\""));
        assert_eq!(MaskConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MaskConfig::default();
        config.sweep.gap_sizes.push(-0.5);
        assert!(matches!(
            config.validate(),
            Err(LayoutError::InvalidParameter { ref name, .. }) if name == "sweep.gap_sizes[9]"
        ));

        let mut config = MaskConfig::default();
        config.heater.squiggles = 7;
        assert!(config.validate().is_err());

        let mut config = MaskConfig::default();
        config.font = "Not A Face 91c2".to_string();
        assert!(config.validate().is_err());

        let mut config = MaskConfig::default();
        config.sweep.width_groups[0].beam_width = 700.0;
        assert!(config.validate().is_err());

        let mut config = MaskConfig::default();
        config.cross.layer = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        assert!(matches!(
            MaskConfig::from_json_str("{ \"heater\": 3 }"),
            Err(LayoutError::Config(_))
        ));
    }
}
