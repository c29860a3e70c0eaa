use std::collections::{BTreeMap, HashMap};

use nanotherm_core::spatial::{Footprint, SpatialIndex};
use nanotherm_core::{BBox, Cell, LayerId, Library, Point};

use crate::violation::{DrcViolation, Severity, ViolationType};

/// Polygons smaller than this (µm²) are reported as degenerate.
pub const MIN_POLYGON_AREA: f64 = 1e-6;

/// Footprints must overlap by more than this (µm) to count.
pub const OVERLAP_TOLERANCE: f64 = 1e-3;

/// Outcome of a check run.
#[derive(Debug, Clone, Default)]
pub struct DrcReport {
    pub violations: Vec<DrcViolation>,
}

impl DrcReport {
    fn push(&mut self, mut violation: DrcViolation) {
        violation.id = format!("V{:04}", self.violations.len() + 1);
        self.violations.push(violation);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn of_type(&self, kind: &ViolationType) -> impl Iterator<Item = &DrcViolation> {
        let kind = kind.clone();
        self.violations
            .iter()
            .filter(move |v| v.violation_type == kind)
    }
}

/// Run every check over the library's top cell hierarchy.
pub fn check_library(lib: &Library) -> DrcReport {
    let mut report = DrcReport::default();

    let Some(top) = lib.top() else {
        report.push(DrcViolation::new(
            ViolationType::MissingTopCell,
            format!("library '{}' has no top cell", lib.name),
        ));
        return report;
    };

    check_references(lib, &mut report);
    check_polygons(lib, top, &mut report);
    check_instance_spacing(lib, top, &mut report);

    log::info!(
        "Mask checks on '{}': {} errors, {} warnings",
        top.name,
        report.count(Severity::Error),
        report.count(Severity::Warning)
    );
    report
}

fn check_references(lib: &Library, report: &mut DrcReport) {
    for cell in lib.all_cells() {
        for missing in lib.unresolved_references(&cell.name) {
            report.push(
                DrcViolation::new(
                    ViolationType::UnresolvedReference,
                    format!("'{}' references undefined cell '{}'", cell.name, missing),
                )
                .in_cells(vec![cell.name.clone(), missing]),
            );
        }
    }
}

fn check_polygons(lib: &Library, top: &Cell, report: &mut DrcReport) {
    let stack = &lib.layer_stack;
    for poly in lib.flatten(&top.name) {
        let bbox = poly.bbox();
        let located = |v: DrcViolation| match &bbox {
            Some(b) => v.at(b),
            None => v,
        };

        match stack.get_layer(poly.layer_id) {
            None => report.push(located(
                DrcViolation::new(
                    ViolationType::UnknownLayer,
                    format!("polygon on undefined layer {}", poly.layer_id),
                )
                .on_layer(poly.layer_id),
            )),
            Some(layer) if !stack.is_fabricated(layer.id) => report.push(located(
                DrcViolation::new(
                    ViolationType::ConstructionLayer,
                    format!("polygon on construction layer '{}'", layer.name),
                )
                .on_layer(poly.layer_id),
            )),
            Some(_) => {}
        }

        if poly.vertex_count() < 3 || poly.area() < MIN_POLYGON_AREA {
            report.push(located(
                DrcViolation::new(
                    ViolationType::DegeneratePolygon,
                    format!(
                        "polygon with {} vertices and area {:.3e}",
                        poly.vertex_count(),
                        poly.area()
                    ),
                )
                .on_layer(poly.layer_id),
            ));
        }
    }
}

/// Per-layer extent of a cell's flattened contents, in cell coordinates.
fn layer_extents(lib: &Library, name: &str) -> BTreeMap<LayerId, BBox> {
    let mut extents: BTreeMap<LayerId, BBox> = BTreeMap::new();
    for poly in lib.flatten(name) {
        if let Some(b) = poly.bbox() {
            extents
                .entry(poly.layer_id)
                .and_modify(|e| *e = e.union(&b))
                .or_insert(b);
        }
    }
    extents
}

fn check_instance_spacing(lib: &Library, top: &Cell, report: &mut DrcReport) {
    let mut extents: HashMap<&str, BTreeMap<LayerId, BBox>> = HashMap::new();
    let mut per_layer: BTreeMap<LayerId, Vec<Footprint>> = BTreeMap::new();

    for (index, inst) in top.instances.iter().enumerate() {
        let cell_extents = extents
            .entry(inst.cell_name.as_str())
            .or_insert_with(|| layer_extents(lib, &inst.cell_name));
        for (&layer, local) in cell_extents.iter() {
            let corners = [
                local.min,
                Point::new(local.max.x, local.min.y),
                local.max,
                Point::new(local.min.x, local.max.y),
            ]
            .map(|p| inst.transform.apply(&p));
            if let Some(bbox) = BBox::from_points(&corners) {
                per_layer
                    .entry(layer)
                    .or_default()
                    .push(Footprint { index, bbox });
            }
        }
    }

    for (layer, footprints) in per_layer {
        let boxes: HashMap<usize, BBox> = footprints.iter().map(|f| (f.index, f.bbox)).collect();
        let index = SpatialIndex::build(footprints);
        for (a, b) in index.overlapping_pairs(OVERLAP_TOLERANCE) {
            let (ia, ib) = (&top.instances[a], &top.instances[b]);
            let mut v = DrcViolation::new(
                ViolationType::InstanceOverlap,
                format!(
                    "instances #{a} '{}' and #{b} '{}' overlap on layer {layer}",
                    ia.cell_name, ib.cell_name
                ),
            )
            .on_layer(layer)
            .in_cells(vec![ia.cell_name.clone(), ib.cell_name.clone()]);
            if let (Some(ba), Some(bb)) = (boxes.get(&a), boxes.get(&b)) {
                v = v.at(&ba.union(bb));
            }
            report.push(v);
        }
    }
}
