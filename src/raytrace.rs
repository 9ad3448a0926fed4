#![warn(missing_docs)]
//! Module for sequential ray tracing through a [`Lens`]
//!
//! The [`RayTracer`] borrows a lens for the duration of a trace and produces owned
//! [`Ray`] values. Tracing is a pure function of its inputs: no shared mutable state
//! exists between independent traces, so distinct lens instances can be traced from
//! parallel call sites without coordination.
use std::fmt::Display;

use kahan::{KahanSum, KahanSummator};
use nalgebra::{Point2, Vector2};
use num::Zero;
use serde::{Deserialize, Serialize};
use uom::si::f64::{Angle, Length};
use uom::si::length::{micrometer, millimeter};

use crate::error::{OlResult, OptiLensError};
use crate::lens::Lens;
use crate::ray::{Ray, RayStatus};
use crate::surface::SurfaceGeometry;
use crate::{meter, millimeter};

/// stand-off of bundle start positions in front of the front vertex
fn start_distance() -> Length {
    millimeter!(10.0)
}
/// fraction of the clear semi-aperture filled by a parallel bundle
const APERTURE_FILL: f64 = 0.95;
/// transmitted rays are extended to this multiple of the focal distance for visualization
const EXTENSION_FOCAL_FACTOR: f64 = 1.2;
/// extension length used when the lens has no usable focal length
fn fallback_extension() -> Length {
    millimeter!(50.0)
}
/// minimum forward direction cosine for a ray to count towards the focus estimate
const DIR_EPS: f64 = 1e-9;
/// minimum |dy/dx| slope for a ray to constrain the axial focus position
const SLOPE_EPS: f64 = 1e-9;

/// compensated sum of a slice of addends
fn kahan_total(values: &[f64]) -> f64 {
    let total: KahanSum<f64> = values.iter().kahan_sum();
    total.sum()
}

/// Estimated focal point of a traced ray bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FocalPoint {
    position: Point2<Length>,
    rms_radius: Length,
    rays_used: usize,
}
impl FocalPoint {
    /// Returns the estimated focal position (on the optical axis for an axial bundle).
    #[must_use]
    pub fn position(&self) -> Point2<Length> {
        self.position
    }
    /// Returns the RMS transverse spot radius of the bundle at the focal position.
    #[must_use]
    pub fn rms_radius(&self) -> Length {
        self.rms_radius
    }
    /// Returns the number of rays that entered the estimate (blocked and totally
    /// internally reflected rays are excluded).
    #[must_use]
    pub const fn rays_used(&self) -> usize {
        self.rays_used
    }
}
impl Display for FocalPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mm = Length::format_args(millimeter, uom::fmt::DisplayStyle::Abbreviation);
        let um = Length::format_args(micrometer, uom::fmt::DisplayStyle::Abbreviation);
        write!(
            f,
            "focal point at ({:.4}, {:.4}), rms radius {:.2}, {} rays used",
            mm.with(self.position.x),
            mm.with(self.position.y),
            um.with(self.rms_radius),
            self.rays_used
        )
    }
}

/// Sequential two-surface ray tracer.
pub struct RayTracer<'a> {
    lens: &'a Lens,
}
impl<'a> RayTracer<'a> {
    /// Creates a new [`RayTracer`] borrowing the given [`Lens`].
    #[must_use]
    pub const fn new(lens: &'a Lens) -> Self {
        Self { lens }
    }
    fn front_surface(&self) -> SurfaceGeometry {
        SurfaceGeometry::new(
            0.0,
            self.lens.radius_of_curvature_1().value,
            0.5 * self.lens.diameter().value,
        )
    }
    fn rear_surface(&self) -> SurfaceGeometry {
        SurfaceGeometry::new(
            self.lens.thickness().value,
            self.lens.radius_of_curvature_2().value,
            0.5 * self.lens.diameter().value,
        )
    }
    /// Trace a single ray sequentially through both lens surfaces.
    ///
    /// The returned ray carries its terminal [`RayStatus`]: `Transmitted` rays include
    /// the exit vertex plus an extension segment towards the image side; `Blocked` rays
    /// end at their last valid vertex; totally internally reflected rays carry the
    /// reflected direction.
    ///
    /// # Errors
    ///
    /// This function returns an error if the refractive index calculation fails for the
    /// ray's wavelength.
    pub fn trace_ray(&self, mut ray: Ray) -> OlResult<Ray> {
        let n_glass = self.lens.material().refractive_index(ray.wavelength())?;
        for (surface, n_behind) in [(self.front_surface(), n_glass), (self.rear_surface(), 1.0)] {
            let pos = ray.position().map(|c| c.value);
            let dir = ray.direction();
            let Some((hit, normal)) = surface.intersect_and_normal(&pos, &dir) else {
                ray.set_blocked();
                return Ok(ray);
            };
            ray.refract_at(meter!(hit.x, hit.y), normal, n_behind)?;
            if ray.status() == RayStatus::TotalInternalReflection {
                return Ok(ray);
            }
        }
        ray.set_transmitted();
        self.extend_transmitted(&mut ray)?;
        Ok(ray)
    }
    /// Append the visualization/focus-search extension segment to a transmitted ray.
    fn extend_transmitted(&self, ray: &mut Ray) -> OlResult<()> {
        let focal_length = self.lens.focal_length()?;
        let extension = match focal_length {
            Some(f) if f.is_finite() && f > Length::zero() && ray.direction().x > DIR_EPS => {
                let target_x = self.lens.thickness() + EXTENSION_FOCAL_FACTOR * f;
                let length = (target_x - ray.position().x) / ray.direction().x;
                if length > Length::zero() {
                    length
                } else {
                    fallback_extension()
                }
            }
            _ => fallback_extension(),
        };
        ray.propagate(extension)
    }
    /// Trace a bundle of axis-parallel rays evenly spanning the clear aperture.
    ///
    /// # Errors
    ///
    /// This function returns an error if `num_rays` is zero, the wavelength is invalid
    /// or the index calculation fails.
    pub fn trace_parallel_rays(&self, num_rays: usize, wavelength: Length) -> OlResult<Vec<Ray>> {
        self.trace_collimated_bundle(num_rays, wavelength, Angle::zero())
    }
    /// Trace a collimated bundle tilted by the given field angle.
    ///
    /// The bundle spans the clear aperture and is aimed such that each ray crosses the
    /// front vertex plane at its nominal height.
    ///
    /// # Errors
    ///
    /// This function returns an error if `num_rays` is zero, the field angle is not
    /// within ±90° (exclusive), the wavelength is invalid or the index calculation fails.
    pub fn trace_collimated_bundle(
        &self,
        num_rays: usize,
        wavelength: Length,
        field_angle: Angle,
    ) -> OlResult<Vec<Ray>> {
        if num_rays == 0 {
            return Err(OptiLensError::RayGeometry(
                "number of rays must be > 0".into(),
            ));
        }
        let fractions: Vec<f64> = (0..num_rays)
            .map(|i| {
                if num_rays == 1 {
                    0.0
                } else {
                    APERTURE_FILL * (2.0 * (i as f64) / ((num_rays - 1) as f64) - 1.0)
                }
            })
            .collect();
        self.trace_parallel_at_heights(&fractions, wavelength, field_angle)
    }
    /// Trace parallel rays at the given aperture-height fractions (-1.0..=1.0 spans the
    /// clear semi-aperture), tilted by the field angle.
    pub(crate) fn trace_parallel_at_heights(
        &self,
        height_fractions: &[f64],
        wavelength: Length,
        field_angle: Angle,
    ) -> OlResult<Vec<Ray>> {
        let theta = field_angle.value;
        if !theta.is_finite() || theta.abs() >= std::f64::consts::FRAC_PI_2 {
            return Err(OptiLensError::RayGeometry(
                "field angle must be finite and within ±90°".into(),
            ));
        }
        let direction = Vector2::new(theta.cos(), theta.sin());
        let start_x = -start_distance().value;
        let semi_aperture = 0.5 * self.lens.diameter().value;
        let mut rays = Vec::with_capacity(height_fractions.len());
        for fraction in height_fractions {
            // aim the ray to cross the front vertex plane at its nominal height
            let start_y = fraction.mul_add(semi_aperture, start_x * theta.tan());
            let ray = Ray::new(meter!(start_x, start_y), direction, wavelength)?;
            rays.push(self.trace_ray(ray)?);
        }
        Ok(rays)
    }
    /// Trace a fan of rays from a point source towards the lens.
    ///
    /// `num_rays` directions are evenly spread over ±`max_angle` around the optical
    /// axis.
    ///
    /// # Errors
    ///
    /// This function returns an error if `num_rays` is zero, the source does not lie in
    /// front of the lens, the source position or fan angle is invalid or the index
    /// calculation fails.
    pub fn trace_point_source_rays(
        &self,
        source: Point2<Length>,
        num_rays: usize,
        max_angle: Angle,
        wavelength: Length,
    ) -> OlResult<Vec<Ray>> {
        if num_rays == 0 {
            return Err(OptiLensError::RayGeometry(
                "number of rays must be > 0".into(),
            ));
        }
        if !source.x.is_finite() || !source.y.is_finite() {
            return Err(OptiLensError::RayGeometry(
                "point source position must be finite".into(),
            ));
        }
        if source.x >= Length::zero() {
            return Err(OptiLensError::RayGeometry(
                "point source must lie in front of the lens (x < 0)".into(),
            ));
        }
        let max = max_angle.value;
        if !max.is_finite() || max <= 0.0 || max >= std::f64::consts::FRAC_PI_2 {
            return Err(OptiLensError::RayGeometry(
                "fan half-angle must be finite and within (0°, 90°)".into(),
            ));
        }
        let mut rays = Vec::with_capacity(num_rays);
        for i in 0..num_rays {
            let angle = if num_rays == 1 {
                0.0
            } else {
                max * (2.0 * (i as f64) / ((num_rays - 1) as f64) - 1.0)
            };
            let ray = Ray::new(source, Vector2::new(angle.cos(), angle.sin()), wavelength)?;
            rays.push(self.trace_ray(ray)?);
        }
        Ok(rays)
    }
    /// Back focal distance: axial distance from the rear vertex to the focus of a traced
    /// marginal ray pair at the clear-aperture edge.
    ///
    /// # Errors
    ///
    /// This function returns an error if the wavelength is invalid, the index calculation
    /// fails or the marginal rays reach no focus (flat plate, blocked or totally
    /// internally reflected marginals).
    pub fn back_focal_distance(&self, wavelength: Length) -> OlResult<Length> {
        let rays = self.trace_parallel_at_heights(
            &[-APERTURE_FILL, APERTURE_FILL],
            wavelength,
            Angle::zero(),
        )?;
        let focal_point = Self::find_focal_point(&rays)?;
        Ok(focal_point.position().x - self.lens.thickness())
    }
    /// Estimate the focal point of a traced bundle.
    ///
    /// Among transmitted rays, the axial position minimizing the bundle's transverse
    /// spread about its own centroid is found in closed form (least squares over the
    /// exit-ray lines, centered on the mean exit line so that tilted bundles focus where
    /// their spread is smallest, not where they cross the axis). Rays that were blocked,
    /// totally internally reflected, travel backwards or run parallel to the axis do not
    /// constrain the estimate and are excluded.
    ///
    /// # Errors
    ///
    /// This function returns an error if fewer than two usable rays remain or all usable
    /// rays share the same slope (a parallel bundle has no focus). It never fabricates a
    /// focal point.
    pub fn find_focal_point(rays: &[Ray]) -> OlResult<FocalPoint> {
        // exit-ray lines y(x) = a·x + b in f64 meters
        let lines: Vec<(f64, f64)> = rays
            .iter()
            .filter(|ray| ray.status() == RayStatus::Transmitted && ray.direction().x > DIR_EPS)
            .map(|ray| {
                let slope = ray.direction().y / ray.direction().x;
                let pos = ray.position().map(|c| c.value);
                (slope, slope.mul_add(-pos.x, pos.y))
            })
            .filter(|(slope, _)| slope.abs() > SLOPE_EPS)
            .collect();
        if lines.len() < 2 {
            return Err(OptiLensError::InsufficientRays(format!(
                "focal point estimation requires at least 2 usable rays ({} available)",
                lines.len()
            )));
        }
        let count = lines.len() as f64;
        let slopes: Vec<f64> = lines.iter().map(|(a, _)| *a).collect();
        let offsets: Vec<f64> = lines.iter().map(|(_, b)| *b).collect();
        let mean_slope = kahan_total(&slopes) / count;
        let mean_offset = kahan_total(&offsets) / count;
        // spread about the centroid line is Σ((aᵢ−ā)x + (bᵢ−b̄))², minimized in x
        let slope_deviation_squares: Vec<f64> = slopes
            .iter()
            .map(|a| (a - mean_slope) * (a - mean_slope))
            .collect();
        let cross_terms: Vec<f64> = lines
            .iter()
            .map(|(a, b)| (a - mean_slope) * (b - mean_offset))
            .collect();
        let denominator = kahan_total(&slope_deviation_squares);
        if denominator < SLOPE_EPS * SLOPE_EPS {
            return Err(OptiLensError::InsufficientRays(
                "ray bundle does not converge (no slope spread)".into(),
            ));
        }
        let focus_x = -kahan_total(&cross_terms) / denominator;
        let heights: Vec<f64> = lines.iter().map(|(a, b)| a.mul_add(focus_x, *b)).collect();
        let focus_y = kahan_total(&heights) / count;
        let residuals: Vec<f64> = heights
            .iter()
            .map(|height| (height - focus_y) * (height - focus_y))
            .collect();
        let variance = kahan_total(&residuals) / count;
        Ok(FocalPoint {
            position: meter!(focus_x, focus_y),
            rms_radius: meter!(variance.sqrt()),
            rays_used: lines.len(),
        })
    }
}
