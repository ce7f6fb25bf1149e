use crate::impl_err;

#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    InvalidCoordinate(String),
}

impl std::fmt::Display for GeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoError::InvalidCoordinate(reason) => {
                write!(f, "invalid coordinate: {reason}")
            }
        }
    }
}

impl std::error::Error for GeoError {}

impl_err!(GeoError, Geo);
