use nanotherm_core::{LayerId, Library, Point};
use serde::{Deserialize, Serialize};
use svg::node::element::path::Data;
use svg::node::element::{Group, Path, Rectangle};
use svg::Document;

use crate::viewport::Viewport;

/// Render data for a single layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderLayer {
    pub layer_id: LayerId,
    pub name: String,
    /// `#rrggbb`
    pub color: String,
    pub opacity: f32,
    pub polygons: Vec<RenderPolygon>,
}

/// A polygon as a vertex list in layout coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderPolygon {
    /// Flat array of vertices: [x0, y0, x1, y1, ...]
    pub vertices: Vec<f64>,
}

/// One complete preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderFrame {
    pub title: String,
    pub layers: Vec<RenderLayer>,
    pub viewport: Viewport,
    pub background: String,
}

impl RenderFrame {
    pub fn empty(viewport: Viewport) -> Self {
        Self {
            title: String::new(),
            layers: Vec::new(),
            viewport,
            background: "#ffffff".to_string(),
        }
    }

    /// Flatten the library's top cell onto its visible layers, in stack
    /// order, and fit the viewport to the result. A library without a top
    /// cell gives an empty frame.
    pub fn from_library(lib: &Library, canvas_width: f64, canvas_height: f64) -> Self {
        let mut frame = Self::empty(Viewport::new(canvas_width, canvas_height));
        let Some(top) = lib.top() else {
            log::warn!("library '{}' has no top cell; preview is empty", lib.name);
            return frame;
        };
        frame.title = top.name.clone();

        let polygons = lib.flatten(&top.name);
        for layer in lib.layer_stack.visible_layers() {
            let shapes: Vec<RenderPolygon> = polygons
                .iter()
                .filter(|p| p.layer_id == layer.id)
                .map(|p| RenderPolygon {
                    vertices: p.vertices.iter().flat_map(|v| [v.x, v.y]).collect(),
                })
                .collect();
            if shapes.is_empty() {
                continue;
            }
            frame.layers.push(RenderLayer {
                layer_id: layer.id,
                name: layer.name.clone(),
                color: layer.color.to_hex(),
                opacity: layer.opacity,
                polygons: shapes,
            });
        }

        if let Some(bbox) = lib.cell_bbox(&top.name) {
            frame.viewport.fit_bbox(&bbox);
        }
        log::debug!(
            "preview of '{}': {} polygons on {} layers",
            frame.title,
            frame.polygon_count(),
            frame.layers.len()
        );
        frame
    }

    pub fn polygon_count(&self) -> usize {
        self.layers.iter().map(|l| l.polygons.len()).sum()
    }

    /// SVG document with one group per layer and one path per polygon.
    pub fn to_document(&self) -> Document {
        let vp = &self.viewport;
        let mut content = Group::new().set("id", self.title.as_str());
        for layer in &self.layers {
            let mut group = Group::new()
                .set("id", layer.name.as_str())
                .set("fill", layer.color.as_str())
                .set("fill-opacity", layer.opacity)
                .set("stroke", "none");
            for poly in &layer.polygons {
                let mut points = poly
                    .vertices
                    .chunks_exact(2)
                    .map(|xy| vp.layout_to_screen(&Point::new(xy[0], xy[1])));
                let Some((x0, y0)) = points.next() else {
                    continue;
                };
                let data = points
                    .fold(Data::new().move_to((x0 as f32, y0 as f32)), |d, (x, y)| {
                        d.line_to((x as f32, y as f32))
                    })
                    .close();
                group = group.add(Path::new().set("d", data));
            }
            content = content.add(group);
        }

        Document::new()
            .set("viewBox", format!("0 0 {} {}", vp.width, vp.height))
            .set("width", vp.width)
            .set("height", vp.height)
            .add(
                Rectangle::new()
                    .set("width", "100%")
                    .set("height", "100%")
                    .set("fill", self.background.as_str()),
            )
            .add(content)
    }

    pub fn to_svg(&self) -> String {
        self.to_document().to_string()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nanotherm_core::cell::{CellInstance, Transform};
    use nanotherm_core::layer::{CONSTRUCTION, GOLD, NITRIDE};
    use nanotherm_core::{Cell, GeomPrimitive, Rect};

    fn sample() -> Library {
        let mut lib = Library::new("preview");
        let mut pad = Cell::new("pad");
        pad.add_geometry(GeomPrimitive::Rect(Rect::new(GOLD, 0.0, 0.0, 250.0, 250.0)));
        pad.add_geometry(GeomPrimitive::Rect(Rect::new(NITRIDE, 50.0, 50.0, 100.0, 100.0)));
        lib.add_cell(pad);
        lib.set_top_cell(
            Cell::new("Wafer")
                .with_instance(CellInstance::new("pad", Transform::default()))
                .with_instance(CellInstance::new("pad", Transform::translate(500.0, 0.0))),
        );
        lib
    }

    #[test]
    fn test_frame_groups_by_layer() {
        let frame = RenderFrame::from_library(&sample(), 800.0, 600.0);
        assert_eq!(frame.title, "Wafer");
        assert_eq!(frame.layers.len(), 2);
        assert_eq!(frame.layers[0].layer_id, GOLD);
        assert_eq!(frame.layers[0].polygons.len(), 2);
        assert_eq!(frame.layers[0].color, "#d4af37");
        assert_eq!(frame.polygon_count(), 4);
        assert!((frame.viewport.center.x - 375.0).abs() < 1e-9);
    }

    #[test]
    fn test_construction_layer_is_hidden() {
        let mut lib = sample();
        let mut scratch = Cell::new("scratch");
        scratch.add_geometry(GeomPrimitive::Rect(Rect::new(CONSTRUCTION, 0.0, 0.0, 1.0, 1.0)));
        lib.set_top_cell(scratch);
        let frame = RenderFrame::from_library(&lib, 100.0, 100.0);
        assert!(frame.layers.is_empty());
    }

    #[test]
    fn test_svg_document() {
        let svg = RenderFrame::from_library(&sample(), 800.0, 600.0).to_svg();
        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<path").count(), 4);
        assert!(svg.contains(r#"id="gold""#));
        assert!(svg.contains(r##"fill="#d4af37""##));
        assert!(svg.contains(r#"id="Wafer""#));
    }

    #[test]
    fn test_json_frame() {
        let json = RenderFrame::from_library(&sample(), 800.0, 600.0).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["layers"][1]["name"], "nitride");
        assert_eq!(value["layers"][0]["polygons"][0]["vertices"].as_array().unwrap().len(), 8);
    }

    #[test]
    fn test_no_top_cell() {
        let frame = RenderFrame::from_library(&Library::new("x"), 10.0, 10.0);
        assert_eq!(frame.polygon_count(), 0);
        assert!(frame.to_svg().contains("</svg>"));
    }
}
