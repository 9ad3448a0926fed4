//! This is the documentation for the **OptiLens** optical computation engine.
//!
//! **OptiLens** models simple spherical lenses with physically accurate material
//! dispersion, traces light rays through them in the meridional plane, and quantifies
//! the resulting image quality:
//!
//! - [`material`]: Sellmeier dispersion model and a catalog of common optical glasses
//! - [`lens`]: spherical singlet geometry, thick-lens focal length, serializable snapshots
//! - [`ray`] / [`raytrace`]: sequential ray tracing with Snell refraction, total internal
//!   reflection and aperture clipping, plus least-squares focus finding
//! - [`aberrations`]: spherical, coma, astigmatism, field curvature, distortion and
//!   chromatic analysis condensed into a single quality score
//!
//! All physical quantities on the public API carry their units via the [`uom`] crate;
//! the [`millimeter!`](crate::millimeter), [`nanometer!`](crate::nanometer) and
//! [`degree!`](crate::degree) macros (see [`utils`]) keep construction terse.
#![allow(clippy::module_name_repetitions)]

pub mod aberrations;
pub mod error;
pub mod lens;
pub mod material;
pub mod ray;
pub mod raytrace;
mod surface;
pub mod utils;

pub use aberrations::{AberrationAnalyzer, AberrationReport};
pub use error::{OlResult, OptiLensError};
pub use lens::Lens;
pub use material::MaterialCatalog;
pub use ray::Ray;
pub use raytrace::RayTracer;
