//! Outlined text.
//!
//! The built-in 5×7 block font is the default face. Its glyphs are rows of
//! pixels, top row first, bit 4 the leftmost column; each lit run of pixels
//! becomes a rectangle and the glyph is merged into one region, with a cap
//! height equal to the requested size. Any other face name is looked up among
//! the installed fonts and rendered by [`crate::font`] with `size` as the em.
//! The reference origin is the left edge on the baseline.

use crate::error::{positive, GeometryError};
use crate::font as system_font;
use crate::region::Region;

/// Name of the font face shipped with the kernel.
pub const BLOCK_FONT: &str = "Block5x7";

const ROWS: usize = 7;
const COLS: usize = 5;
/// Horizontal advance per character, in pixels.
const ADVANCE: usize = COLS + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Left,
    Center,
    Right,
}

/// Render `text` at size `size` in font face `font`.
pub fn render(text: &str, size: f64, font: &str, justify: Justify) -> Result<Region, GeometryError> {
    let size = positive("font size", size)?;
    let (glyphs, width) = if font == BLOCK_FONT {
        block(text, size)?
    } else {
        system_font::outline(text, font, size)?
    };

    let shift = match justify {
        Justify::Left => 0.0,
        Justify::Center => -width / 2.0,
        Justify::Right => -width,
    };
    Ok(glyphs.translate(shift, 0.0))
}

/// Whether `font` names a face this module can render.
pub fn is_known_font(font: &str) -> bool {
    font == BLOCK_FONT || system_font::has_family(font)
}

/// Block-font glyphs and the width from the first to the last column.
fn block(text: &str, size: f64) -> Result<(Region, f64), GeometryError> {
    let px = size / ROWS as f64;
    let mut pieces = Vec::new();
    let mut columns = 0usize;
    for (index, ch) in text.chars().enumerate() {
        let rows = glyph(ch).ok_or(GeometryError::UnknownGlyph(ch))?;
        let x0 = (index * ADVANCE) as f64 * px;
        for (r, bits) in rows.iter().enumerate() {
            let y0 = (ROWS - 1 - r) as f64 * px;
            for (start, len) in runs(*bits) {
                let run = Region::rect(len as f64 * px, px)?.translate(x0 + start as f64 * px, y0);
                pieces.push(run);
            }
        }
        columns = index * ADVANCE + COLS;
    }
    Ok((Region::merge(pieces), columns as f64 * px))
}

/// Horizontal pixel runs in a glyph row as (first column, length).
fn runs(bits: u8) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut col = 0;
    while col < COLS {
        if bits & (1 << (COLS - 1 - col)) != 0 {
            let start = col;
            while col < COLS && bits & (1 << (COLS - 1 - col)) != 0 {
                col += 1;
            }
            out.push((start, col - start));
        } else {
            col += 1;
        }
    }
    out
}

fn glyph(ch: char) -> Option<&'static [u8; ROWS]> {
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        Some(&FONT[(code - 0x20) as usize])
    } else {
        None
    }
}

#[rustfmt::skip]
static FONT: [[u8; ROWS]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04], // '!'
    [0x0A, 0x0A, 0x0A, 0x00, 0x00, 0x00, 0x00], // '"'
    [0x0A, 0x0A, 0x1F, 0x0A, 0x1F, 0x0A, 0x0A], // '#'
    [0x04, 0x0F, 0x14, 0x0E, 0x05, 0x1E, 0x04], // '$'
    [0x18, 0x19, 0x02, 0x04, 0x08, 0x13, 0x03], // '%'
    [0x0C, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0D], // '&'
    [0x0C, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00], // '\''
    [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02], // '('
    [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08], // ')'
    [0x00, 0x04, 0x15, 0x0E, 0x15, 0x04, 0x00], // '*'
    [0x00, 0x04, 0x04, 0x1F, 0x04, 0x04, 0x00], // '+'
    [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08], // ','
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00], // '-'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C], // '.'
    [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00], // '/'
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // '0'
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // '1'
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // '2'
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // '3'
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // '4'
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // '5'
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // '6'
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // '7'
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // '8'
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // '9'
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00], // ':'
    [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x04, 0x08], // ';'
    [0x02, 0x04, 0x08, 0x10, 0x08, 0x04, 0x02], // '<'
    [0x00, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00], // '='
    [0x08, 0x04, 0x02, 0x01, 0x02, 0x04, 0x08], // '>'
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04], // '?'
    [0x0E, 0x11, 0x01, 0x0D, 0x15, 0x15, 0x0E], // '@'
    [0x0E, 0x11, 0x11, 0x11, 0x1F, 0x11, 0x11], // 'A'
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // 'B'
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // 'C'
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C], // 'D'
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // 'E'
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // 'F'
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // 'G'
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // 'H'
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // 'I'
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // 'J'
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // 'K'
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // 'L'
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // 'M'
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // 'N'
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // 'O'
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // 'P'
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // 'Q'
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // 'R'
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // 'S'
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // 'T'
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // 'U'
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // 'V'
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // 'W'
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // 'X'
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // 'Y'
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // 'Z'
    [0x0E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x0E], // '['
    [0x00, 0x10, 0x08, 0x04, 0x02, 0x01, 0x00], // '\\'
    [0x0E, 0x02, 0x02, 0x02, 0x02, 0x02, 0x0E], // ']'
    [0x04, 0x0A, 0x11, 0x00, 0x00, 0x00, 0x00], // '^'
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F], // '_'
    [0x08, 0x04, 0x02, 0x00, 0x00, 0x00, 0x00], // '`'
    [0x00, 0x00, 0x0E, 0x01, 0x0F, 0x11, 0x0F], // 'a'
    [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x1E], // 'b'
    [0x00, 0x00, 0x0E, 0x10, 0x10, 0x11, 0x0E], // 'c'
    [0x01, 0x01, 0x0D, 0x13, 0x11, 0x11, 0x0F], // 'd'
    [0x00, 0x00, 0x0E, 0x11, 0x1F, 0x10, 0x0E], // 'e'
    [0x06, 0x09, 0x08, 0x1C, 0x08, 0x08, 0x08], // 'f'
    [0x00, 0x0F, 0x11, 0x11, 0x0F, 0x01, 0x0E], // 'g'
    [0x10, 0x10, 0x16, 0x19, 0x11, 0x11, 0x11], // 'h'
    [0x04, 0x00, 0x0C, 0x04, 0x04, 0x04, 0x0E], // 'i'
    [0x02, 0x00, 0x06, 0x02, 0x02, 0x12, 0x0C], // 'j'
    [0x10, 0x10, 0x12, 0x14, 0x18, 0x14, 0x12], // 'k'
    [0x0C, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // 'l'
    [0x00, 0x00, 0x1A, 0x15, 0x15, 0x11, 0x11], // 'm'
    [0x00, 0x00, 0x16, 0x19, 0x11, 0x11, 0x11], // 'n'
    [0x00, 0x00, 0x0E, 0x11, 0x11, 0x11, 0x0E], // 'o'
    [0x00, 0x00, 0x1E, 0x11, 0x1E, 0x10, 0x10], // 'p'
    [0x00, 0x00, 0x0D, 0x13, 0x0F, 0x01, 0x01], // 'q'
    [0x00, 0x00, 0x16, 0x19, 0x10, 0x10, 0x10], // 'r'
    [0x00, 0x00, 0x0E, 0x10, 0x0E, 0x01, 0x1E], // 's'
    [0x08, 0x08, 0x1C, 0x08, 0x08, 0x09, 0x06], // 't'
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x13, 0x0D], // 'u'
    [0x00, 0x00, 0x11, 0x11, 0x11, 0x0A, 0x04], // 'v'
    [0x00, 0x00, 0x11, 0x11, 0x15, 0x15, 0x0A], // 'w'
    [0x00, 0x00, 0x11, 0x0A, 0x04, 0x0A, 0x11], // 'x'
    [0x00, 0x00, 0x11, 0x11, 0x0F, 0x01, 0x0E], // 'y'
    [0x00, 0x00, 0x1F, 0x02, 0x04, 0x08, 0x1F], // 'z'
    [0x02, 0x04, 0x04, 0x08, 0x04, 0x04, 0x02], // '{'
    [0x04, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // '|'
    [0x08, 0x04, 0x04, 0x02, 0x04, 0x04, 0x08], // '}'
    [0x00, 0x00, 0x08, 0x15, 0x02, 0x00, 0x00], // '~'
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs() {
        assert_eq!(runs(0x1F), vec![(0, 5)]);
        assert_eq!(runs(0x11), vec![(0, 1), (4, 1)]);
        assert_eq!(runs(0x0D), vec![(1, 2), (4, 1)]);
        assert!(runs(0).is_empty());
    }

    #[test]
    fn test_left_justified_label_anchor() {
        let label = render("100/50/1.5", 70.0, BLOCK_FONT, Justify::Left).unwrap();
        let bb = label.bbox().unwrap();
        // 10 px per pixel; '1' starts in column 1, '5' ends in the last column
        assert!((bb.min.x - 10.0).abs() < 1e-6);
        assert!((bb.max.x - (9.0 * 60.0 + 50.0)).abs() < 1e-6);
        assert!(bb.min.y.abs() < 1e-6);
        assert!((bb.max.y - 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_center_justify() {
        let label = render("HH", 7.0, BLOCK_FONT, Justify::Center).unwrap();
        let bb = label.bbox().unwrap();
        assert!((bb.min.x + 5.5).abs() < 1e-6);
        assert!((bb.max.x - 5.5).abs() < 1e-6);
    }

    #[test]
    fn test_enclosed_counter_is_a_hole() {
        let hash = render("#", 7.0, BLOCK_FONT, Justify::Left).unwrap();
        assert_eq!(hash.piece_count(), 1);
        assert_eq!(hash.hole_count(), 1);
    }

    #[test]
    fn test_unknown_font_and_glyph() {
        assert_eq!(
            render("x", 10.0, "Not A Face 91c2", Justify::Left),
            Err(GeometryError::UnknownFont("Not A Face 91c2".into()))
        );
        assert!(is_known_font(BLOCK_FONT));
        assert!(!is_known_font("Not A Face 91c2"));
        assert_eq!(
            render("µ", 10.0, BLOCK_FONT, Justify::Left),
            Err(GeometryError::UnknownGlyph('µ'))
        );
        assert!(render("1", 0.0, BLOCK_FONT, Justify::Left).is_err());
    }

    #[test]
    fn test_space_renders_nothing() {
        assert!(render("   ", 10.0, BLOCK_FONT, Justify::Left).unwrap().is_empty());
    }

    #[test]
    fn test_installed_face_is_right_justified() {
        let Some(family) = system_font::families().into_iter().next() else {
            return;
        };
        assert!(is_known_font(&family));
        let left = render("12", 50.0, &family, Justify::Left).unwrap();
        let right = render("12", 50.0, &family, Justify::Right).unwrap();
        let (Some(l), Some(r)) = (left.bbox(), right.bbox()) else {
            return;
        };
        assert!(r.max.x < l.max.x);
        assert!((l.width() - r.width()).abs() < 1e-6);
    }
}
