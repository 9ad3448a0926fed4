#![warn(missing_docs)]
//! Module for handling optical rays
use std::fmt::Display;

use nalgebra::{Point2, Vector2};
use num::Zero;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;
use uom::si::length::{millimeter, nanometer};

use crate::error::{OlResult, OptiLensError};
use crate::material::check_wavelength;
use crate::meter;

/// Terminal (and in-flight) state of a [`Ray`].
///
/// Blocked and totally internally reflected rays are expected members of a bundle and are
/// *not* errors; callers filter by status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
pub enum RayStatus {
    /// the ray is still being traced
    Propagating,
    /// the ray passed all surfaces
    Transmitted,
    /// the ray missed a clear aperture; its path ends at the last valid vertex
    Blocked,
    /// the ray hit a surface beyond the critical angle and was reflected instead
    TotalInternalReflection,
}

/// Struct that contains all information about an optical ray in the meridional plane.
///
/// The x axis is the optical axis (light travels towards positive x), y is the
/// transverse coordinate.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ray {
    /// current position of the ray
    pos: Point2<Length>,
    /// position history of the ray (one vertex per crossed surface)
    pos_hist: Vec<Point2<Length>>,
    /// current propagation direction (direction cosine)
    dir: Vector2<f64>,
    /// wavelength of the ray
    wvl: Length,
    /// optical path length of the ray
    path_length: Length,
    /// refractive index of the medium this ray is currently propagating in
    refractive_index: f64,
    /// trace status of the ray
    status: RayStatus,
}
impl Ray {
    /// Creates a new [`Ray`].
    ///
    /// The direction vector is normalized and stored as direction cosine.
    ///
    /// # Errors
    ///
    /// This function returns an error if
    ///  - the given wavelength is invalid (see [`check_wavelength`])
    ///  - a position component is not finite
    ///  - the direction vector has (near) zero length or non-finite components
    pub fn new(position: Point2<Length>, direction: Vector2<f64>, wavelength: Length) -> OlResult<Self> {
        check_wavelength(wavelength)?;
        if !position.x.is_finite() || !position.y.is_finite() {
            return Err(OptiLensError::RayGeometry(
                "ray start position must be finite".into(),
            ));
        }
        if !direction.x.is_finite() || !direction.y.is_finite() || direction.norm().is_zero() {
            return Err(OptiLensError::RayGeometry(
                "ray direction must be finite with length >0".into(),
            ));
        }
        Ok(Self {
            pos: position,
            pos_hist: Vec::with_capacity(8),
            dir: direction.normalize(),
            wvl: wavelength,
            path_length: Length::zero(),
            refractive_index: 1.0,
            status: RayStatus::Propagating,
        })
    }
    /// Create a new collimated ray propagating along the positive x axis (optical axis).
    ///
    /// # Errors
    ///
    /// Same error conditions as [`new`](Self::new).
    pub fn new_collimated(position: Point2<Length>, wavelength: Length) -> OlResult<Self> {
        Self::new(position, Vector2::x(), wavelength)
    }
    /// Returns the current position of this [`Ray`].
    #[must_use]
    pub fn position(&self) -> Point2<Length> {
        self.pos
    }
    /// Returns the direction of this [`Ray`] as normalized direction cosine.
    #[must_use]
    pub const fn direction(&self) -> Vector2<f64> {
        self.dir
    }
    /// Returns the wavelength of this [`Ray`].
    #[must_use]
    pub fn wavelength(&self) -> Length {
        self.wvl
    }
    /// Returns the status of this [`Ray`].
    #[must_use]
    pub const fn status(&self) -> RayStatus {
        self.status
    }
    /// Returns the optical path length accumulated by this [`Ray`].
    #[must_use]
    pub fn path_length(&self) -> Length {
        self.path_length
    }
    /// Returns the refractive index of the medium this [`Ray`] currently propagates in.
    #[must_use]
    pub const fn refractive_index(&self) -> f64 {
        self.refractive_index
    }
    /// Returns the full vertex path of this [`Ray`] (history plus current position).
    #[must_use]
    pub fn path(&self) -> Vec<Point2<Length>> {
        let mut path = self.pos_hist.clone();
        path.push(self.pos);
        path
    }
    /// Propagate the ray freely along its direction by the given geometric length.
    ///
    /// The optical path length respects the refractive index stored in the ray.
    ///
    /// # Errors
    ///
    /// This function returns an error if the propagation length is not finite.
    pub fn propagate(&mut self, length: Length) -> OlResult<()> {
        if !length.is_finite() {
            return Err(OptiLensError::RayGeometry(
                "propagation length must be finite".into(),
            ));
        }
        self.pos_hist.push(self.pos);
        self.pos = Point2::new(
            self.pos.x + length * self.dir.x,
            self.pos.y + length * self.dir.y,
        );
        self.path_length += length * self.refractive_index;
        Ok(())
    }
    /// Refract the ray at an intersection point with the given (normalized, oriented
    /// against the ray) surface normal into a medium of refractive index `n2`.
    ///
    /// Applies Snell's law in vector form. If the evanescent condition is hit
    /// (sin θ₂ would exceed 1) the ray is marked [`RayStatus::TotalInternalReflection`]
    /// and the reflection law is applied instead.
    ///
    /// # Errors
    ///
    /// This function returns an error if `n2` is < 1.0 or not finite.
    pub(crate) fn refract_at(
        &mut self,
        intersection: Point2<Length>,
        normal: Vector2<f64>,
        n2: f64,
    ) -> OlResult<()> {
        if n2 < 1.0 || !n2.is_finite() {
            return Err(OptiLensError::Other(
                "the refractive index must be >=1.0 and finite".into(),
            ));
        }
        let mu = self.refractive_index / n2;
        let s1 = self.dir.normalize();
        let n = normal.normalize();
        // clamp the cosine into its valid domain before any further trigonometry
        let cos_theta1 = (-n.dot(&s1)).clamp(-1.0, 1.0);
        let discriminant = (mu * mu).mul_add(cos_theta1.mul_add(cos_theta1, -1.0), 1.0);
        let travel = meter!(
            (self.pos.map(|c| c.value) - intersection.map(|c| c.value)).norm()
        );
        self.path_length += self.refractive_index * travel;
        self.pos_hist.push(self.pos);
        self.pos = intersection;
        if discriminant.is_sign_positive() {
            self.dir = mu * s1 + (mu.mul_add(cos_theta1, -discriminant.sqrt())) * n;
            self.refractive_index = n2;
        } else {
            // evanescent: total internal reflection, apply the reflection law
            self.dir = s1 - 2.0 * s1.dot(&n) * n;
            self.status = RayStatus::TotalInternalReflection;
        }
        Ok(())
    }
    /// Mark this ray as blocked (missed a clear aperture).
    pub(crate) fn set_blocked(&mut self) {
        self.status = RayStatus::Blocked;
    }
    /// Mark this ray as fully transmitted.
    pub(crate) fn set_transmitted(&mut self) {
        self.status = RayStatus::Transmitted;
    }
}
impl Display for Ray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mm = Length::format_args(millimeter, uom::fmt::DisplayStyle::Abbreviation);
        let nm = Length::format_args(nanometer, uom::fmt::DisplayStyle::Abbreviation);
        write!(
            f,
            "pos: ({:.3}, {:.3}), dir: ({:.6}, {:.6}), wavelength: {:.1}, status: {}",
            mm.with(self.pos.x),
            mm.with(self.pos.y),
            self.dir.x,
            self.dir.y,
            nm.with(self.wvl),
            self.status
        )
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::{millimeter, nanometer};
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;
    #[test]
    fn new() {
        let pos = millimeter!(1.0, 2.0);
        let dir = Vector2::new(0.0, 2.0);
        let wvl = nanometer!(587.6);
        let ray = Ray::new(pos, dir, wvl).unwrap();
        assert_eq!(ray.position(), pos);
        assert_eq!(ray.direction(), Vector2::y());
        assert_eq!(ray.wavelength(), wvl);
        assert_eq!(ray.path_length(), Length::zero());
        assert_eq!(ray.refractive_index(), 1.0);
        assert_eq!(ray.status(), RayStatus::Propagating);
        assert_eq!(ray.path(), vec![pos]);

        assert_matches!(
            Ray::new(pos, dir, nanometer!(0.0)),
            Err(OptiLensError::InvalidWavelength(_))
        );
        assert_matches!(
            Ray::new(pos, dir, nanometer!(-10.0)),
            Err(OptiLensError::InvalidWavelength(_))
        );
        assert_matches!(
            Ray::new(pos, dir, nanometer!(f64::NAN)),
            Err(OptiLensError::InvalidWavelength(_))
        );
        assert_matches!(
            Ray::new(millimeter!(f64::NAN, 0.0), dir, wvl),
            Err(OptiLensError::RayGeometry(_))
        );
        assert_matches!(
            Ray::new(millimeter!(0.0, f64::INFINITY), dir, wvl),
            Err(OptiLensError::RayGeometry(_))
        );
        assert_matches!(
            Ray::new(pos, Vector2::zeros(), wvl),
            Err(OptiLensError::RayGeometry(_))
        );
        assert_matches!(
            Ray::new(pos, Vector2::new(f64::NAN, 1.0), wvl),
            Err(OptiLensError::RayGeometry(_))
        );
    }
    #[test]
    fn new_collimated() {
        let ray = Ray::new_collimated(millimeter!(0.0, 5.0), nanometer!(587.6)).unwrap();
        assert_eq!(ray.direction(), Vector2::x());
    }
    #[test]
    fn propagate() {
        let mut ray = Ray::new_collimated(millimeter!(0.0, 0.0), nanometer!(587.6)).unwrap();
        ray.propagate(millimeter!(10.0)).unwrap();
        assert_eq!(ray.position(), millimeter!(10.0, 0.0));
        assert_eq!(ray.path_length(), millimeter!(10.0));
        assert_eq!(ray.path().len(), 2);
        assert!(ray.propagate(millimeter!(f64::INFINITY)).is_err());
    }
    #[test]
    fn refract_normal_incidence() {
        let mut ray = Ray::new_collimated(millimeter!(-10.0, 0.0), nanometer!(587.6)).unwrap();
        ray.refract_at(millimeter!(0.0, 0.0), Vector2::new(-1.0, 0.0), 1.5)
            .unwrap();
        // normal incidence: direction unchanged, medium index updated
        assert_relative_eq!(ray.direction().x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(ray.direction().y, 0.0, epsilon = 1e-12);
        assert_eq!(ray.refractive_index(), 1.5);
        assert_eq!(ray.status(), RayStatus::Propagating);
        assert_eq!(ray.path_length(), millimeter!(10.0));
    }
    #[test]
    fn refract_snell_conservation() {
        let theta1: f64 = 30.0_f64.to_radians();
        let mut ray = Ray::new(
            millimeter!(-10.0, 0.0),
            Vector2::new(theta1.cos(), theta1.sin()),
            nanometer!(587.6),
        )
        .unwrap();
        ray.refract_at(millimeter!(0.0, 5.7735), Vector2::new(-1.0, 0.0), 1.5)
            .unwrap();
        let sin_theta2 = ray.direction().y.abs();
        assert_relative_eq!(1.0 * theta1.sin(), 1.5 * sin_theta2, epsilon = 1e-12);
        assert_eq!(ray.status(), RayStatus::Propagating);
    }
    #[test]
    fn refract_invalid_index() {
        let mut ray = Ray::new_collimated(millimeter!(-10.0, 0.0), nanometer!(587.6)).unwrap();
        assert!(ray
            .refract_at(millimeter!(0.0, 0.0), Vector2::new(-1.0, 0.0), 0.9)
            .is_err());
        assert!(ray
            .refract_at(millimeter!(0.0, 0.0), Vector2::new(-1.0, 0.0), f64::NAN)
            .is_err());
    }
    #[test]
    fn total_internal_reflection() {
        // glass->air transition at 50° incidence, above the critical angle of ~41.8°
        let theta1: f64 = 50.0_f64.to_radians();
        let mut ray = Ray::new(
            millimeter!(-10.0, 0.0),
            Vector2::new(theta1.cos(), theta1.sin()),
            nanometer!(587.6),
        )
        .unwrap();
        ray.refractive_index = 1.5;
        ray.refract_at(millimeter!(0.0, 11.9175), Vector2::new(-1.0, 0.0), 1.0)
            .unwrap();
        assert_eq!(ray.status(), RayStatus::TotalInternalReflection);
        // reflection law: incidence angle equals exit angle, x component flips
        assert_relative_eq!(ray.direction().x, -theta1.cos(), epsilon = 1e-12);
        assert_relative_eq!(ray.direction().y, theta1.sin(), epsilon = 1e-12);
        // the ray stays in its medium
        assert_eq!(ray.refractive_index(), 1.5);
    }
    #[test]
    fn display() {
        let ray = Ray::new_collimated(millimeter!(0.0, 1.0), nanometer!(587.6)).unwrap();
        assert_eq!(
            format!("{ray}"),
            "pos: (0.000 mm, 1.000 mm), dir: (1.000000, 0.000000), wavelength: 587.6 nm, status: Propagating"
        );
    }
}
