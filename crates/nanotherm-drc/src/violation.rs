use nanotherm_core::{BBox, LayerId};
use serde::{Deserialize, Serialize};

/// Which mask rule fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViolationType {
    /// The library names no top cell, so nothing would be exported.
    MissingTopCell,
    /// A construction-only layer reached the exported hierarchy.
    ConstructionLayer,
    /// A polygon sits on a layer the stack does not define.
    UnknownLayer,
    /// Fewer than three vertices, or no area.
    DegeneratePolygon,
    UnresolvedReference,
    /// Two instances occupy overlapping space on the same layer.
    InstanceOverlap,
}

impl ViolationType {
    pub fn severity(&self) -> Severity {
        match self {
            ViolationType::InstanceOverlap => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn rule_name(&self) -> &'static str {
        match self {
            ViolationType::MissingTopCell => "top.defined",
            ViolationType::ConstructionLayer => "layer.fabricated",
            ViolationType::UnknownLayer => "layer.known",
            ViolationType::DegeneratePolygon => "polygon.nondegenerate",
            ViolationType::UnresolvedReference => "reference.resolved",
            ViolationType::InstanceOverlap => "instance.spacing",
        }
    }
}

/// Errors block export; warnings are reported only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// One finding, located by bounding box and the cell path it was found in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrcViolation {
    /// `V0001`, `V0002`, ... in report order.
    pub id: String,
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub rule_name: String,
    pub message: String,
    pub layer_id: Option<LayerId>,
    /// `[min_x, min_y, max_x, max_y]` in top-cell coordinates.
    pub bbox: [f64; 4],
    /// Cells involved, outermost first.
    pub cells: Vec<String>,
}

impl DrcViolation {
    pub fn new(violation_type: ViolationType, message: String) -> Self {
        Self {
            id: String::new(),
            severity: violation_type.severity(),
            rule_name: violation_type.rule_name().to_string(),
            violation_type,
            message,
            layer_id: None,
            bbox: [0.0; 4],
            cells: Vec::new(),
        }
    }

    pub fn on_layer(mut self, layer_id: LayerId) -> Self {
        self.layer_id = Some(layer_id);
        self
    }

    pub fn at(mut self, bbox: &BBox) -> Self {
        self.bbox = [bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y];
        self
    }

    pub fn in_cells(mut self, cells: Vec<String>) -> Self {
        self.cells = cells;
        self
    }
}
