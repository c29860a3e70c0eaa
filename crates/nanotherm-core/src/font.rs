//! Outlined text from installed font faces.
//!
//! Text is shaped with cosmic-text at a fixed em size, each glyph's outline
//! is flattened into closed contours, and the contours are filled even-odd
//! so that counters become holes. The result is scaled so that one em equals
//! the requested size, with the reference origin on the first baseline.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use cosmic_text::{Attrs, Buffer, CacheKey, Command, Family, FontSystem, Metrics, Shaping, SwashCache};
use log::info;

use crate::error::GeometryError;
use crate::geometry::Point;
use crate::region::Region;

/// Em size glyphs are shaped at before scaling. Glyph positions are rounded
/// to whole units at this size.
const SHAPING_EM: f32 = 1000.0;

/// Segments per quadratic or cubic curve piece.
const CURVE_STEPS: usize = 8;

/// Holds the process-wide font database.
struct FontManager {
    font_system: Mutex<FontSystem>,
}

impl FontManager {
    fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Mutex::new(FontSystem::new()),
        }
    }

    /// A panic while shaping leaves the database itself intact.
    fn lock(&self) -> MutexGuard<'_, FontSystem> {
        self.font_system.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

static FONT_MANAGER: OnceLock<FontManager> = OnceLock::new();

fn manager() -> &'static FontManager {
    FONT_MANAGER.get_or_init(FontManager::new)
}

/// Family names of every installed face, sorted and deduplicated.
pub fn families() -> Vec<String> {
    let font_system = manager().lock();
    let mut names: Vec<String> = font_system
        .db()
        .faces()
        .flat_map(|face| face.families.iter().map(|(name, _)| name.clone()))
        .collect();
    names.sort();
    names.dedup();
    names
}

/// Whether an installed face carries `family` (case-insensitive).
pub fn has_family(family: &str) -> bool {
    has_face(&manager().lock(), family)
}

fn has_face(font_system: &FontSystem, family: &str) -> bool {
    font_system
        .db()
        .faces()
        .any(|face| face.families.iter().any(|(name, _)| name.eq_ignore_ascii_case(family)))
}

/// Filled outline of `text` in `family` at em size `size`, plus the advance
/// width of the longest line.
pub(crate) fn outline(text: &str, family: &str, size: f64) -> Result<(Region, f64), GeometryError> {
    let mut guard = manager().lock();
    let font_system: &mut FontSystem = &mut guard;
    if !has_face(font_system, family) {
        return Err(GeometryError::UnknownFont(family.to_string()));
    }

    let metrics = Metrics::new(SHAPING_EM, SHAPING_EM * 1.2);
    let mut buffer = Buffer::new(font_system, metrics);
    let mut advance: f32 = 0.0;
    let placed: Vec<(CacheKey, f32, f32)> = {
        let mut buffer = buffer.borrow_with(font_system);
        buffer.set_size(None, None);
        let attrs = Attrs::new().family(Family::Name(family));
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut placed = Vec::new();
        let mut first_baseline = None;
        for run in buffer.layout_runs() {
            let baseline = *first_baseline.get_or_insert(run.line_y);
            for glyph in run.glyphs {
                let physical = glyph.physical((0.0, 0.0), 1.0);
                // Later lines sit below the first; screen y grows downwards.
                let dy = baseline - run.line_y - physical.y as f32;
                placed.push((physical.cache_key, physical.x as f32, dy));
            }
            if let Some(last) = run.glyphs.last() {
                advance = advance.max(last.x + last.w);
            }
        }
        placed
    };

    let scale = size / f64::from(SHAPING_EM);
    let mut swash = SwashCache::new();
    let mut region = Region::empty();
    for (cache_key, dx, dy) in placed {
        let Some(commands) = swash.get_outline_commands(font_system, cache_key) else {
            continue;
        };
        for contour in contours(&commands) {
            if contour.len() < 3 {
                continue;
            }
            let ring: Vec<Point> = contour
                .iter()
                .map(|&(x, y)| Point::new(f64::from(x + dx) * scale, f64::from(y + dy) * scale))
                .collect();
            region = region.xor(&Region::from_ring(&ring));
        }
    }
    Ok((region, f64::from(advance) * scale))
}

/// Flatten outline commands into closed contours, y up.
fn contours(commands: &[Command]) -> Vec<Vec<(f32, f32)>> {
    let mut out = Vec::new();
    let mut current: Vec<(f32, f32)> = Vec::new();
    let mut pen = (0.0f32, 0.0f32);
    for command in commands {
        match *command {
            Command::MoveTo(p) => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                pen = (p.x, p.y);
                current.push(pen);
            }
            Command::LineTo(p) => {
                pen = (p.x, p.y);
                current.push(pen);
            }
            Command::QuadTo(c, p) => {
                let (c, p) = ((c.x, c.y), (p.x, p.y));
                for step in 1..=CURVE_STEPS {
                    let t = step as f32 / CURVE_STEPS as f32;
                    let u = 1.0 - t;
                    current.push((
                        u * u * pen.0 + 2.0 * u * t * c.0 + t * t * p.0,
                        u * u * pen.1 + 2.0 * u * t * c.1 + t * t * p.1,
                    ));
                }
                pen = p;
            }
            Command::CurveTo(c1, c2, p) => {
                let (c1, c2, p) = ((c1.x, c1.y), (c2.x, c2.y), (p.x, p.y));
                for step in 1..=CURVE_STEPS {
                    let t = step as f32 / CURVE_STEPS as f32;
                    let u = 1.0 - t;
                    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
                    current.push((
                        a * pen.0 + b * c1.0 + c * c2.0 + d * p.0,
                        a * pen.1 + b * c1.1 + c * c2.1 + d * p.1,
                    ));
                }
                pen = p;
            }
            Command::Close => {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moveto(x: f32, y: f32) -> Command {
        Command::MoveTo((x, y).into())
    }

    fn lineto(x: f32, y: f32) -> Command {
        Command::LineTo((x, y).into())
    }

    #[test]
    fn test_contours_split_on_move_and_close() {
        let commands = [
            moveto(0.0, 0.0),
            lineto(10.0, 0.0),
            lineto(10.0, 10.0),
            Command::Close,
            moveto(2.0, 2.0),
            lineto(4.0, 2.0),
            lineto(4.0, 4.0),
        ];
        let rings = contours(&commands);
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[0], vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        assert_eq!(rings[1].len(), 3);
    }

    #[test]
    fn test_curves_are_flattened_to_their_end_point() {
        let commands = [
            moveto(0.0, 0.0),
            Command::QuadTo((5.0, 10.0).into(), (10.0, 0.0).into()),
            Command::CurveTo((10.0, -5.0).into(), (0.0, -5.0).into(), (0.0, 0.0).into()),
            Command::Close,
        ];
        let rings = contours(&commands);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 1 + 2 * CURVE_STEPS);
        assert_eq!(rings[0][CURVE_STEPS], (10.0, 0.0));
        // The quadratic peaks at half its control height.
        let top = rings[0].iter().map(|p| p.1).fold(f32::MIN, f32::max);
        assert!((top - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_unknown_family() {
        assert!(!has_family("No Such Face 7f3a"));
        assert_eq!(
            outline("x", "No Such Face 7f3a", 10.0).err(),
            Some(GeometryError::UnknownFont("No Such Face 7f3a".into()))
        );
    }

    #[test]
    fn test_installed_face_outlines() {
        // Hosts without any installed fonts have nothing to shape.
        let Some(family) = families().into_iter().next() else {
            return;
        };
        assert!(has_family(&family.to_uppercase()));

        let (glyphs, advance) = outline("HO", &family, 100.0).unwrap();
        if glyphs.is_empty() {
            // Bitmap-only or symbol faces carry no outline for these letters.
            return;
        }
        let bb = glyphs.bbox().unwrap();
        assert!(advance > 0.0);
        assert!(bb.max.y > 10.0 && bb.max.y <= 150.0, "{bb:?}");
        assert!(glyphs.area() > 0.0);
    }
}
