use thiserror::Error;

/// Failures raised by the geometry kernel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("invalid {what}: {value} (must be positive and finite)")]
    InvalidDimension { what: &'static str, value: f64 },

    #[error("corner {index}: radius {radius} does not fit between neighbouring corners")]
    RadiusTooLarge { index: usize, radius: f64 },

    #[error("path needs at least 2 distinct points, got {0}")]
    DegeneratePath(usize),

    #[error("unknown font face '{0}'")]
    UnknownFont(String),

    #[error("font has no glyph for {0:?}")]
    UnknownGlyph(char),
}

/// Reject zero, negative, and non-finite dimensions.
pub(crate) fn positive(what: &'static str, value: f64) -> Result<f64, GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GeometryError::InvalidDimension { what, value })
    }
}
