#![warn(missing_docs)]
//! Module for handling the geometric lens model
//!
//! A [`Lens`] is a value object describing a (possibly asymmetric) two-surface lens:
//! two signed radii of curvature, a center thickness, a clear aperture diameter and a
//! [`Material`]. Radii of ±∞ describe flat surfaces; a radius of zero is invalid.
//!
//! # Curvature convention
//! Light travels from left to right along the positive x axis, the front vertex sits at
//! x = 0. A center of curvature to the *right* of its surface is positive:
//! - positive front radius: convex (focusing) front surface
//! - negative rear radius: convex (focusing) rear surface
use std::fmt::Display;
use std::sync::OnceLock;

use log::warn;
use nalgebra::Point2;
use num::Zero;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;
use uom::si::length::millimeter;

use crate::error::{OlResult, OptiLensError};
use crate::material::{wavelength_d_line, Material, MaterialCatalog};
use crate::meter;

/// number of sample points per surface used by [`Lens::outline`]
const OUTLINE_SAMPLES: usize = 32;

/// A two-surface spherical (or flat) lens.
///
/// The lens is immutable after construction; "changing" a parameter means constructing a
/// new value. The derived focal length is computed on demand and cached per lens value.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Lens {
    name: String,
    radius_of_curvature_1: Length,
    radius_of_curvature_2: Length,
    thickness: Length,
    diameter: Length,
    material: Material,
    #[serde(skip)]
    focal_length_cache: OnceLock<Option<Length>>,
}
impl Lens {
    /// Creates a new [`Lens`].
    ///
    /// The radii of curvature must not be zero or NaN (±∞ is a flat surface), the center
    /// thickness must be ≥ 0 and finite (0 models an idealized thin element) and the clear
    /// aperture diameter must be positive and finite.
    ///
    /// # Errors
    ///
    /// This function returns an error naming the offending field if any parameter is
    /// invalid. It never constructs a half-valid lens.
    pub fn new(
        name: &str,
        radius_of_curvature_1: Length,
        radius_of_curvature_2: Length,
        thickness: Length,
        diameter: Length,
        material: Material,
    ) -> OlResult<Self> {
        if radius_of_curvature_1.is_zero() || radius_of_curvature_1.is_nan() {
            return Err(OptiLensError::LensParameters(
                "radius_of_curvature_1: must not be zero or NaN".into(),
            ));
        }
        if radius_of_curvature_2.is_zero() || radius_of_curvature_2.is_nan() {
            return Err(OptiLensError::LensParameters(
                "radius_of_curvature_2: must not be zero or NaN".into(),
            ));
        }
        if thickness.is_sign_negative() || !thickness.is_finite() {
            return Err(OptiLensError::LensParameters(
                "thickness: must be >= 0.0 and finite".into(),
            ));
        }
        if diameter <= Length::zero() || !diameter.is_finite() {
            return Err(OptiLensError::LensParameters(
                "diameter: must be > 0.0 and finite".into(),
            ));
        }
        let semi_aperture = 0.5 * diameter;
        for radius in [radius_of_curvature_1, radius_of_curvature_2] {
            if radius.is_finite() && radius.abs() < semi_aperture {
                warn!(
                    "lens '{name}': clear semi-aperture exceeds surface sphere radius, rays beyond the cap will be blocked"
                );
            }
        }
        Ok(Self {
            name: name.to_string(),
            radius_of_curvature_1,
            radius_of_curvature_2,
            thickness,
            diameter,
            material,
            focal_length_cache: OnceLock::new(),
        })
    }
    /// Creates a new [`Lens`], resolving the material by name from the given catalog.
    ///
    /// # Errors
    ///
    /// This function returns an error if the material name cannot be resolved or any
    /// geometry parameter is invalid (see [`new`](Self::new)).
    pub fn new_from_catalog(
        name: &str,
        radius_of_curvature_1: Length,
        radius_of_curvature_2: Length,
        thickness: Length,
        diameter: Length,
        material_name: &str,
        catalog: &MaterialCatalog,
    ) -> OlResult<Self> {
        let material = catalog.get(material_name)?.clone();
        Self::new(
            name,
            radius_of_curvature_1,
            radius_of_curvature_2,
            thickness,
            diameter,
            material,
        )
    }
    /// Returns the name label of this [`Lens`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the signed radius of curvature of the front surface.
    #[must_use]
    pub const fn radius_of_curvature_1(&self) -> Length {
        self.radius_of_curvature_1
    }
    /// Returns the signed radius of curvature of the rear surface.
    #[must_use]
    pub const fn radius_of_curvature_2(&self) -> Length {
        self.radius_of_curvature_2
    }
    /// Returns the center thickness of this [`Lens`].
    #[must_use]
    pub const fn thickness(&self) -> Length {
        self.thickness
    }
    /// Returns the clear aperture diameter of this [`Lens`].
    #[must_use]
    pub const fn diameter(&self) -> Length {
        self.diameter
    }
    /// Returns the [`Material`] of this [`Lens`].
    #[must_use]
    pub const fn material(&self) -> &Material {
        &self.material
    }
    /// Get the focal length from the thick-lens lensmaker equation at the d-line
    /// reference wavelength (587.6 nm).
    ///
    /// The result is cached on first use; concurrent first calls resolve to the same
    /// value idempotently. A flat/flat plate has no optical power and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// This function returns an error if the refractive index calculation fails.
    pub fn focal_length(&self) -> OlResult<Option<Length>> {
        if let Some(focal_length) = self.focal_length_cache.get() {
            return Ok(*focal_length);
        }
        let focal_length = self.focal_length_at(wavelength_d_line())?;
        Ok(*self.focal_length_cache.get_or_init(|| focal_length))
    }
    /// Get the (uncached) focal length at an arbitrary wavelength.
    ///
    /// Uses 1/f = (n−1)·[1/R1 − 1/R2 + (n−1)·t/(n·R1·R2)] with flat surfaces dropping
    /// their 1/R term. A flat/flat plate yields `Ok(None)` ("no power").
    ///
    /// # Errors
    ///
    /// This function returns an error if the refractive index calculation fails.
    pub fn focal_length_at(&self, wavelength: Length) -> OlResult<Option<Length>> {
        if self.radius_of_curvature_1.is_infinite() && self.radius_of_curvature_2.is_infinite() {
            return Ok(None);
        }
        let n = self.material.refractive_index(wavelength)?;
        let curvature_1 = if self.radius_of_curvature_1.is_infinite() {
            0.0
        } else {
            1.0 / self.radius_of_curvature_1.value
        };
        let curvature_2 = if self.radius_of_curvature_2.is_infinite() {
            0.0
        } else {
            1.0 / self.radius_of_curvature_2.value
        };
        let optical_power = (n - 1.0)
            * ((n - 1.0) * self.thickness.value * curvature_1 * curvature_2 / n + curvature_1
                - curvature_2);
        Ok(Some(meter!(1.0 / optical_power)))
    }
    /// Returns a complete, order-independent field snapshot of this [`Lens`].
    ///
    /// The snapshot references the material by name and is sufficient for exact
    /// reconstruction via [`from_snapshot`](Self::from_snapshot). Persistence itself is
    /// the responsibility of an external layer.
    #[must_use]
    pub fn snapshot(&self) -> LensSnapshot {
        LensSnapshot {
            name: self.name.clone(),
            radius_of_curvature_1: self.radius_of_curvature_1,
            radius_of_curvature_2: self.radius_of_curvature_2,
            thickness: self.thickness,
            diameter: self.diameter,
            material: self.material.name().to_string(),
        }
    }
    /// Reconstruct a [`Lens`] from a snapshot, resolving the material through the given
    /// catalog.
    ///
    /// # Errors
    ///
    /// This function re-runs the full construction validation, so a snapshot carrying
    /// invalid fields (or an unresolvable material name) is rejected exactly like a
    /// direct construction attempt.
    pub fn from_snapshot(snapshot: &LensSnapshot, catalog: &MaterialCatalog) -> OlResult<Self> {
        Self::new_from_catalog(
            &snapshot.name,
            snapshot.radius_of_curvature_1,
            snapshot.radius_of_curvature_2,
            snapshot.thickness,
            snapshot.diameter,
            &snapshot.material,
            catalog,
        )
    }
    /// Returns the closed 2-D profile polyline of this [`Lens`] (front surface, bottom
    /// edge, rear surface, top edge) for external rendering. No physics happens here.
    #[must_use]
    pub fn outline(&self) -> Vec<Point2<Length>> {
        let semi_aperture = 0.5 * self.diameter.value;
        let thickness = self.thickness.value;
        let sag = |y: f64, radius: Length| -> f64 {
            if radius.is_infinite() {
                return 0.0;
            }
            let r = radius.value;
            let y = y.clamp(-r.abs(), r.abs());
            r * (1.0 - (1.0 - (y / r) * (y / r)).max(0.0).sqrt())
        };
        let mut points = Vec::with_capacity(2 * (OUTLINE_SAMPLES + 1) + 1);
        // front surface, top to bottom
        for i in 0..=OUTLINE_SAMPLES {
            let y = semi_aperture * (1.0 - 2.0 * (i as f64) / (OUTLINE_SAMPLES as f64));
            points.push(meter!(sag(y, self.radius_of_curvature_1), y));
        }
        // rear surface, bottom to top
        for i in 0..=OUTLINE_SAMPLES {
            let y = semi_aperture * (2.0 * (i as f64) / (OUTLINE_SAMPLES as f64) - 1.0);
            points.push(meter!(thickness + sag(y, self.radius_of_curvature_2), y));
        }
        // close the contour along the top edge
        points.push(points[0]);
        points
    }
}
impl PartialEq for Lens {
    fn eq(&self, other: &Self) -> bool {
        // the focal length cache is derived state and does not take part in equality
        self.name == other.name
            && self.radius_of_curvature_1 == other.radius_of_curvature_1
            && self.radius_of_curvature_2 == other.radius_of_curvature_2
            && self.thickness == other.thickness
            && self.diameter == other.diameter
            && self.material == other.material
    }
}
impl Display for Lens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mm = Length::format_args(millimeter, uom::fmt::DisplayStyle::Abbreviation);
        write!(
            f,
            "'{}': R1: {:.2}, R2: {:.2}, thickness: {:.2}, diameter: {:.2}, material: {}",
            self.name,
            mm.with(self.radius_of_curvature_1),
            mm.with(self.radius_of_curvature_2),
            mm.with(self.thickness),
            mm.with(self.diameter),
            self.material.name()
        )
    }
}

/// A complete, order-independent key/value snapshot of a [`Lens`].
///
/// All fields are public; the material is referenced by catalog name. See
/// [`Lens::snapshot`] and [`Lens::from_snapshot`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LensSnapshot {
    /// name label of the lens
    pub name: String,
    /// signed radius of curvature of the front surface
    pub radius_of_curvature_1: Length,
    /// signed radius of curvature of the rear surface
    pub radius_of_curvature_2: Length,
    /// center thickness
    pub thickness: Length,
    /// clear aperture diameter
    pub diameter: Length,
    /// material catalog name
    pub material: String,
}
