use nanotherm_core::GeometryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: f64,
        reason: &'static str,
    },

    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayoutError {
    pub(crate) fn invalid(name: impl Into<String>, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            value,
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
