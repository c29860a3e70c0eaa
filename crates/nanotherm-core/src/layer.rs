//! The mask layer stack.

use serde::{Deserialize, Serialize};

/// Layer number used inside the library; matches the GDS layer number.
pub type LayerId = u32;

/// Final conductor layer (gold).
pub const GOLD: LayerId = 0;
/// Final structural layer (nitride).
pub const NITRIDE: LayerId = 1;
/// Scratch layer for boolean operands. Never fabricated.
pub const CONSTRUCTION: LayerId = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub gds_layer: u16,
    pub gds_datatype: u16,
    /// Preview fill.
    pub color: LayerColor,
    pub opacity: f32,
    /// Drawn in previews.
    pub visible: bool,
    /// Written to a mask.
    pub fabricated: bool,
}

impl Layer {
    /// A fabricated, visible layer whose GDS number equals its id, datatype 0.
    pub fn mask(id: LayerId, name: &str, color: LayerColor) -> Self {
        Self {
            id,
            name: name.to_string(),
            gds_layer: id as u16,
            gds_datatype: 0,
            color,
            opacity: 0.7,
            visible: true,
            fabricated: true,
        }
    }

    /// Kept out of both the mask and the preview.
    pub fn construction_only(self) -> Self {
        Self {
            fabricated: false,
            visible: false,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LayerColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#rrggbb` form, as used by SVG fills.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// The layers of one process, in drawing order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// The two-mask gold-on-nitride process plus the construction layer.
    pub fn nanotherm() -> Self {
        Self {
            layers: vec![
                Layer::mask(GOLD, "gold", LayerColor::rgb(212, 175, 55)),
                Layer::mask(NITRIDE, "nitride", LayerColor::rgb(70, 130, 180)),
                Layer::mask(CONSTRUCTION, "construction", LayerColor::rgb(200, 200, 200))
                    .construction_only(),
            ],
        }
    }

    pub fn get_layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Reverse lookup from a stream's layer/datatype pair.
    pub fn get_layer_by_gds(&self, gds_layer: u16, gds_datatype: u16) -> Option<&Layer> {
        self.layers
            .iter()
            .find(|l| (l.gds_layer, l.gds_datatype) == (gds_layer, gds_datatype))
    }

    pub fn is_fabricated(&self, id: LayerId) -> bool {
        self.get_layer(id).is_some_and(|l| l.fabricated)
    }

    pub fn visible_layers(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter().filter(|l| l.visible)
    }
}

impl Default for LayerStack {
    fn default() -> Self {
        Self::nanotherm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nanotherm_stack() {
        let stack = LayerStack::nanotherm();
        let visible: Vec<&str> = stack.visible_layers().map(|l| l.name.as_str()).collect();
        assert_eq!(visible, ["gold", "nitride"]);
        assert!(stack.is_fabricated(GOLD));
        assert!(stack.is_fabricated(NITRIDE));
        assert!(!stack.is_fabricated(CONSTRUCTION));
        assert!(!stack.is_fabricated(42));
        assert_eq!(stack.get_layer_by_gds(1, 0).unwrap().name, "nitride");
        assert!(stack.get_layer_by_gds(1, 5).is_none());
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(LayerColor::rgb(255, 0, 16).to_hex(), "#ff0010");
    }
}
