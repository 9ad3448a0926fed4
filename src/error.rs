#![warn(missing_docs)]
//! Optilens specific error structures
use std::{error::Error, fmt::Display};

/// Optilens specific Result type
pub type OlResult<T> = std::result::Result<T, OptiLensError>;

/// Errors that can be returned by the various engine functions.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum OptiLensError {
    /// invalid parameters during construction of a [`Lens`](crate::lens::Lens). The message names the offending field.
    LensParameters(String),
    /// a material name could not be resolved in the given catalog
    UnknownMaterial(String),
    /// a wavelength outside the supported range (or non-finite / non-positive) was given
    InvalidWavelength(String),
    /// a dispersion model returned a physically meaningless result (n < 1, non-finite) or the
    /// Abbe number denominator degenerated
    DegenerateDispersion(String),
    /// non-finite ray start conditions or directions at a trace boundary
    RayGeometry(String),
    /// an aggregate analysis (focal point search, aberration statistics) got too few usable rays
    InsufficientRays(String),
    /// errors not falling in one of the categories above
    Other(String),
}

impl Display for OptiLensError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LensParameters(m) => write!(f, "LensParameters:{m}"),
            Self::UnknownMaterial(m) => write!(f, "UnknownMaterial:{m}"),
            Self::InvalidWavelength(m) => write!(f, "InvalidWavelength:{m}"),
            Self::DegenerateDispersion(m) => write!(f, "DegenerateDispersion:{m}"),
            Self::RayGeometry(m) => write!(f, "RayGeometry:{m}"),
            Self::InsufficientRays(m) => write!(f, "InsufficientRays:{m}"),
            Self::Other(m) => write!(f, "Optilens Error:Other:{m}"),
        }
    }
}
impl Error for OptiLensError {}

impl std::convert::From<String> for OptiLensError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}
#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn from() {
        let error = OptiLensError::from("test".to_string());
        assert_eq!(error, OptiLensError::Other("test".to_string()));
    }
    #[test]
    fn display() {
        assert_eq!(
            format!("{}", OptiLensError::LensParameters("test".to_string())),
            "LensParameters:test"
        );
        assert_eq!(
            format!("{}", OptiLensError::UnknownMaterial("test".to_string())),
            "UnknownMaterial:test"
        );
        assert_eq!(
            format!("{}", OptiLensError::InvalidWavelength("test".to_string())),
            "InvalidWavelength:test"
        );
        assert_eq!(
            format!("{}", OptiLensError::DegenerateDispersion("test".to_string())),
            "DegenerateDispersion:test"
        );
        assert_eq!(
            format!("{}", OptiLensError::RayGeometry("test".to_string())),
            "RayGeometry:test"
        );
        assert_eq!(
            format!("{}", OptiLensError::InsufficientRays("test".to_string())),
            "InsufficientRays:test"
        );
        assert_eq!(
            format!("{}", OptiLensError::Other("test".to_string())),
            "Optilens Error:Other:test"
        );
    }
    #[test]
    fn debug() {
        assert_eq!(
            format!("{:?}", OptiLensError::LensParameters("test".to_string())),
            "LensParameters(\"test\")"
        );
    }
}
