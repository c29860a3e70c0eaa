//! GDS-II stream writer and reader.
//!
//! The writer emits one structure per library cell, in library order, with
//! a BOUNDARY per polygon and an SREF per instance. The reader accepts the
//! same subset (plus BOX) and rebuilds a [`Library`].
//!
//! Every record is a big-endian `u16` total length, a `u16` record id (record
//! type in the high byte, payload data type in the low byte), then the
//! payload.

use std::collections::HashSet;
use std::io::{self, Read, Write};

use log::{debug, info, warn};
use thiserror::Error;

use nanotherm_core::cell::{Cell, CellInstance, Transform};
use nanotherm_core::geometry::{BBox, GeomPrimitive, Point, Polygon, Rect};
use nanotherm_core::{LayerId, LayerStack, Library};

/// Record ids used by the supported subset.
mod rec {
    pub const HEADER: u16 = 0x0002;
    pub const BGNLIB: u16 = 0x0102;
    pub const LIBNAME: u16 = 0x0206;
    pub const UNITS: u16 = 0x0305;
    pub const ENDLIB: u16 = 0x0400;
    pub const BGNSTR: u16 = 0x0502;
    pub const STRNAME: u16 = 0x0606;
    pub const ENDSTR: u16 = 0x0700;
    pub const BOUNDARY: u16 = 0x0800;
    pub const PATH: u16 = 0x0900;
    pub const SREF: u16 = 0x0A00;
    pub const AREF: u16 = 0x0B00;
    pub const TEXT: u16 = 0x0C00;
    pub const LAYER: u16 = 0x0D02;
    pub const DATATYPE: u16 = 0x0E02;
    pub const XY: u16 = 0x1003;
    pub const ENDEL: u16 = 0x1100;
    pub const SNAME: u16 = 0x1206;
    pub const NODE: u16 = 0x1500;
    pub const STRANS: u16 = 0x1A01;
    pub const MAG: u16 = 0x1B05;
    pub const ANGLE: u16 = 0x1C05;
    pub const BOX: u16 = 0x2D00;
}

/// Stream format version written to HEADER.
const VERSION: i16 = 600;

/// STRANS bit for reflection about the x axis.
const STRANS_REFLECT: u16 = 0x8000;

/// Largest BOUNDARY the writer emits, closing point excluded. Keeps the XY
/// record under the 16-bit record length.
pub const MAX_POLYGON_VERTICES: usize = 8190;

/// Fixed BGNLIB/BGNSTR stamp so identical libraries give identical bytes.
pub const DEFAULT_TIMESTAMP: [i16; 6] = [2022, 2, 18, 0, 0, 0];

#[derive(Error, Debug)]
pub enum GdsError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("malformed stream at byte {offset}: {reason}")]
    Malformed { offset: u64, reason: String },

    #[error("not a GDS-II stream: first record is 0x{found:04X}, not HEADER")]
    NotGds { found: u16 },

    #[error("structure '{0}' is referenced but never defined")]
    UndefinedCell(String),

    #[error("coordinate {0} does not fit the database grid")]
    CoordinateOverflow(f64),

    #[error("polygon in cell '{cell}' has {vertices} vertices (limit {MAX_POLYGON_VERTICES})")]
    PolygonTooLarge { cell: String, vertices: usize },
}

/// One record with its payload still encoded.
#[derive(Debug)]
struct Record {
    id: u16,
    body: Vec<u8>,
}

impl Record {
    fn int2(&self) -> impl Iterator<Item = i16> + '_ {
        self.body.chunks_exact(2).map(|b| i16::from_be_bytes([b[0], b[1]]))
    }

    fn int4(&self) -> impl Iterator<Item = i32> + '_ {
        self.body
            .chunks_exact(4)
            .map(|b| i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn real8(&self) -> impl Iterator<Item = f64> + '_ {
        self.body.chunks_exact(8).map(|b| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(b);
            real8_decode(raw)
        })
    }

    /// ASCII payload without the NUL padding.
    fn ascii(&self) -> String {
        let end = self.body.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.body[..end]).into_owned()
    }
}

/// Decode an excess-64, base-16 real: sign bit, 7-bit exponent, 56-bit
/// fraction.
fn real8_decode(raw: [u8; 8]) -> f64 {
    let fraction = u64::from_be_bytes([0, raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7]]);
    if fraction == 0 {
        return 0.0;
    }
    let exponent = i32::from(raw[0] & 0x7F) - 64;
    // fraction / 2^56 * 16^exponent, with 2^56 = 16^14
    let magnitude = fraction as f64 * 16f64.powi(exponent - 14);
    if raw[0] & 0x80 == 0 {
        magnitude
    } else {
        -magnitude
    }
}

fn real8_encode(value: f64) -> [u8; 8] {
    if value == 0.0 || !value.is_finite() {
        return [0; 8];
    }
    let mut biased = 64i32;
    let mut m = value.abs();
    while m >= 1.0 {
        m /= 16.0;
        biased += 1;
    }
    while m < 1.0 / 16.0 {
        m *= 16.0;
        biased -= 1;
    }
    let mut fraction = (m * 2f64.powi(56)).round() as u64;
    if fraction >> 56 != 0 {
        fraction >>= 4;
        biased += 1;
    }
    let mut out = fraction.to_be_bytes();
    out[0] = biased.clamp(0, 0x7F) as u8 | if value < 0.0 { 0x80 } else { 0 };
    out
}

/// Attributes gathered between an element record and its ENDEL.
#[derive(Debug, Default)]
struct Element {
    layer: i16,
    datatype: i16,
    xy: Vec<Point>,
    sname: Option<String>,
    strans: u16,
    mag: Option<f64>,
    angle: Option<f64>,
}

pub struct GdsReader<R: Read> {
    reader: R,
    offset: u64,
    db_unit_in_um: f64,
    layer_stack: LayerStack,
}

impl<R: Read> GdsReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            db_unit_in_um: 0.001,
            layer_stack: LayerStack::nanotherm(),
        }
    }

    /// Read the entire GDS-II stream into a Library. Every SREF must name
    /// a structure defined in the stream.
    pub fn read(&mut self) -> Result<Library, GdsError> {
        let first = self.next_record()?.ok_or_else(|| self.malformed("empty stream"))?;
        if first.id != rec::HEADER {
            return Err(GdsError::NotGds { found: first.id });
        }
        debug!("GDS-II version {}", first.int2().next().unwrap_or(0));

        let mut lib = Library::new("imported");
        while let Some(record) = self.next_record()? {
            match record.id {
                rec::LIBNAME => lib.name = record.ascii(),
                rec::UNITS => {
                    // User unit per database unit, then metres per database unit.
                    if let Some(metres) = record.real8().nth(1) {
                        self.db_unit_in_um = metres * 1e6;
                        debug!("database unit {} µm", self.db_unit_in_um);
                    }
                }
                rec::BGNSTR => {
                    let cell = self.read_structure()?;
                    lib.add_cell(cell);
                }
                rec::ENDLIB => break,
                _ => {}
            }
        }
        info!("Read {} structures from '{}'", lib.cell_count(), lib.name);

        resolve_top_cell(&mut lib)?;
        Ok(lib)
    }

    /// Next record, or `None` at a clean end of stream.
    fn next_record(&mut self) -> Result<Option<Record>, GdsError> {
        let mut head = [0u8; 4];
        match self.reader.read_exact(&mut head[..2]) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        let length = usize::from(u16::from_be_bytes([head[0], head[1]]));
        if length < 4 {
            return Err(self.malformed(format!("record length {length} is shorter than its header")));
        }
        self.reader.read_exact(&mut head[2..])?;
        let mut body = vec![0u8; length - 4];
        self.reader.read_exact(&mut body)?;
        self.offset += length as u64;
        Ok(Some(Record {
            id: u16::from_be_bytes([head[2], head[3]]),
            body,
        }))
    }

    fn malformed(&self, reason: impl Into<String>) -> GdsError {
        GdsError::Malformed {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    fn read_structure(&mut self) -> Result<Cell, GdsError> {
        let mut cell = Cell::new("unnamed");
        while let Some(record) = self.next_record()? {
            match record.id {
                rec::STRNAME => {
                    cell = Cell::new(&record.ascii());
                    debug!("structure '{}'", cell.name);
                }
                rec::BOUNDARY => {
                    let element = self.read_element()?;
                    if let Some(shape) = self.boundary(element) {
                        cell.add_geometry(shape);
                    }
                }
                rec::BOX => {
                    let element = self.read_element()?;
                    let layer = self.layer_of(&element);
                    if let Some(bbox) = BBox::from_points(&element.xy) {
                        cell.add_geometry(rect_from_bbox(layer, &bbox));
                    }
                }
                rec::SREF => {
                    let element = self.read_element()?;
                    if let Some(instance) = reference(element) {
                        cell.add_instance(instance);
                    }
                }
                rec::PATH | rec::TEXT | rec::NODE | rec::AREF => {
                    warn!("Skipping unsupported element 0x{:04X} in '{}'", record.id, cell.name);
                    self.read_element()?;
                }
                rec::ENDSTR => break,
                _ => {}
            }
        }
        Ok(cell)
    }

    /// Collect an element's attributes up to its ENDEL.
    fn read_element(&mut self) -> Result<Element, GdsError> {
        let mut element = Element::default();
        while let Some(record) = self.next_record()? {
            match record.id {
                rec::LAYER => element.layer = record.int2().next().unwrap_or(0),
                rec::DATATYPE => element.datatype = record.int2().next().unwrap_or(0),
                rec::XY => {
                    if record.body.len() % 8 != 0 {
                        return Err(self.malformed("XY payload is not whole coordinate pairs"));
                    }
                    let unit = self.db_unit_in_um;
                    let coords: Vec<i32> = record.int4().collect();
                    element.xy = coords
                        .chunks_exact(2)
                        .map(|c| Point::new(f64::from(c[0]) * unit, f64::from(c[1]) * unit))
                        .collect();
                }
                rec::SNAME => element.sname = Some(record.ascii()),
                rec::STRANS => element.strans = record.int2().next().unwrap_or(0) as u16,
                rec::MAG => element.mag = record.real8().next(),
                rec::ANGLE => element.angle = record.real8().next(),
                rec::ENDEL => break,
                _ => {}
            }
        }
        Ok(element)
    }

    fn layer_of(&self, element: &Element) -> LayerId {
        self.layer_stack
            .get_layer_by_gds(element.layer as u16, element.datatype as u16)
            .map_or(element.layer as LayerId, |l| l.id)
    }

    /// A BOUNDARY as a polygon, or a rect when it is an axis-aligned box.
    fn boundary(&self, element: Element) -> Option<GeomPrimitive> {
        let layer = self.layer_of(&element);
        let mut points = element.xy;
        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        if points.len() < 3 {
            return None;
        }
        if is_axis_aligned_rect(&points) {
            if let Some(bbox) = BBox::from_points(&points) {
                return Some(rect_from_bbox(layer, &bbox));
            }
        }
        Some(GeomPrimitive::Polygon(Polygon::new(layer, points)))
    }
}

/// An SREF as a placement. Ids derive from names, so the reference resolves
/// once the target structure is read.
fn reference(element: Element) -> Option<CellInstance> {
    let name = element.sname.filter(|n| !n.is_empty())?;
    let transform = Transform {
        offset: element.xy.first().copied().unwrap_or(Point::new(0.0, 0.0)),
        rotation: element.angle.unwrap_or(0.0),
        mirror_x: element.strans & STRANS_REFLECT != 0,
        scale: element.mag.unwrap_or(1.0),
    };
    Some(CellInstance::new(&name, transform))
}

/// Check every reference and pick the top cell: the last structure no other
/// structure references.
fn resolve_top_cell(lib: &mut Library) -> Result<(), GdsError> {
    let mut referenced = HashSet::new();
    for cell in lib.all_cells() {
        for placement in &cell.instances {
            if !lib.contains(&placement.cell_name) {
                return Err(GdsError::UndefinedCell(placement.cell_name.clone()));
            }
            referenced.insert(placement.cell_name.clone());
        }
    }
    lib.top_cell = lib
        .all_cells()
        .filter(|c| !referenced.contains(&c.name))
        .last()
        .map(|c| c.name.clone());
    Ok(())
}

fn rect_from_bbox(layer: LayerId, bbox: &BBox) -> GeomPrimitive {
    GeomPrimitive::Rect(Rect::new(layer, bbox.min.x, bbox.min.y, bbox.max.x, bbox.max.y))
}

/// Four corners on exactly two x and two y values.
fn is_axis_aligned_rect(points: &[Point]) -> bool {
    let xs: HashSet<u64> = points.iter().map(|p| p.x.to_bits()).collect();
    let ys: HashSet<u64> = points.iter().map(|p| p.y.to_bits()).collect();
    points.len() == 4 && xs.len() == 2 && ys.len() == 2
}

pub struct GdsWriter<W: Write> {
    writer: W,
    db_unit_in_um: f64,
    timestamp: [i16; 6],
}

impl<W: Write> GdsWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            db_unit_in_um: 0.001,
            timestamp: DEFAULT_TIMESTAMP,
        }
    }

    pub fn with_db_unit(mut self, db_unit_in_um: f64) -> Self {
        self.db_unit_in_um = db_unit_in_um;
        self
    }

    pub fn with_timestamp(mut self, timestamp: [i16; 6]) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Write a Library as a GDS-II stream.
    pub fn write(&mut self, lib: &Library) -> Result<(), GdsError> {
        self.int2(rec::HEADER, &[VERSION])?;
        self.int2(rec::BGNLIB, &self.stamp())?;
        self.ascii(rec::LIBNAME, &lib.name)?;
        // User unit per database unit (1 µm user unit), then metres.
        self.real8(rec::UNITS, &[self.db_unit_in_um, self.db_unit_in_um * 1e-6])?;

        for cell in lib.all_cells() {
            self.write_cell(cell, &lib.layer_stack)?;
        }
        self.record(rec::ENDLIB, &[])
    }

    /// Modification and access time, both the configured stamp.
    fn stamp(&self) -> [i16; 12] {
        let mut out = [0i16; 12];
        out[..6].copy_from_slice(&self.timestamp);
        out[6..].copy_from_slice(&self.timestamp);
        out
    }

    fn record(&mut self, id: u16, body: &[u8]) -> Result<(), GdsError> {
        let length = u16::try_from(body.len() + 4).map_err(|_| GdsError::Malformed {
            offset: 0,
            reason: format!("record 0x{id:04X} payload of {} bytes", body.len()),
        })?;
        self.writer.write_all(&length.to_be_bytes())?;
        self.writer.write_all(&id.to_be_bytes())?;
        self.writer.write_all(body)?;
        Ok(())
    }

    fn int2(&mut self, id: u16, values: &[i16]) -> Result<(), GdsError> {
        let body: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.record(id, &body)
    }

    fn int4(&mut self, id: u16, values: &[i32]) -> Result<(), GdsError> {
        let body: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.record(id, &body)
    }

    fn real8(&mut self, id: u16, values: &[f64]) -> Result<(), GdsError> {
        let body: Vec<u8> = values.iter().flat_map(|&v| real8_encode(v)).collect();
        self.record(id, &body)
    }

    /// NUL-padded to an even length.
    fn ascii(&mut self, id: u16, text: &str) -> Result<(), GdsError> {
        let mut body = text.as_bytes().to_vec();
        if body.len() % 2 == 1 {
            body.push(0);
        }
        self.record(id, &body)
    }

    fn to_db(&self, value: f64) -> Result<i32, GdsError> {
        let scaled = (value / self.db_unit_in_um).round();
        if scaled.is_finite() && scaled >= f64::from(i32::MIN) && scaled <= f64::from(i32::MAX) {
            Ok(scaled as i32)
        } else {
            Err(GdsError::CoordinateOverflow(value))
        }
    }

    fn write_cell(&mut self, cell: &Cell, layers: &LayerStack) -> Result<(), GdsError> {
        self.int2(rec::BGNSTR, &self.stamp())?;
        self.ascii(rec::STRNAME, &cell.name)?;

        for shape in &cell.geometries {
            let poly = shape.to_polygon();
            if poly.vertex_count() > MAX_POLYGON_VERTICES {
                return Err(GdsError::PolygonTooLarge {
                    cell: cell.name.clone(),
                    vertices: poly.vertex_count(),
                });
            }
            self.write_boundary(&poly, layers)?;
        }
        for placement in &cell.instances {
            self.write_sref(placement)?;
        }
        self.record(rec::ENDSTR, &[])
    }

    fn write_boundary(&mut self, poly: &Polygon, layers: &LayerStack) -> Result<(), GdsError> {
        let (layer, datatype) = layers
            .get_layer(poly.layer_id)
            .map_or((poly.layer_id as i16, 0), |l| (l.gds_layer as i16, l.gds_datatype as i16));

        // The ring is written closed.
        let coords = poly
            .vertices
            .iter()
            .chain(poly.vertices.first())
            .flat_map(|p| [p.x, p.y])
            .map(|v| self.to_db(v))
            .collect::<Result<Vec<i32>, _>>()?;

        self.record(rec::BOUNDARY, &[])?;
        self.int2(rec::LAYER, &[layer])?;
        self.int2(rec::DATATYPE, &[datatype])?;
        self.int4(rec::XY, &coords)?;
        self.record(rec::ENDEL, &[])
    }

    fn write_sref(&mut self, placement: &CellInstance) -> Result<(), GdsError> {
        let t = &placement.transform;
        self.record(rec::SREF, &[])?;
        self.ascii(rec::SNAME, &placement.cell_name)?;

        if t.mirror_x || t.rotation != 0.0 || t.scale != 1.0 {
            let flags = if t.mirror_x { STRANS_REFLECT } else { 0 };
            self.int2(rec::STRANS, &[flags as i16])?;
        }
        if t.scale != 1.0 {
            self.real8(rec::MAG, &[t.scale])?;
        }
        if t.rotation != 0.0 {
            self.real8(rec::ANGLE, &[t.rotation])?;
        }

        let at = [self.to_db(t.offset.x)?, self.to_db(t.offset.y)?];
        self.int4(rec::XY, &at)?;
        self.record(rec::ENDEL, &[])
    }
}
