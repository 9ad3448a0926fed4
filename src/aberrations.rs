#![warn(missing_docs)]
//! Module for aberration analysis of a traced [`Lens`]
//!
//! The [`AberrationAnalyzer`] traces small on-axis and off-axis ray bundles through a
//! lens (reusing the [`RayTracer`](crate::raytrace::RayTracer)) and condenses them into
//! an [`AberrationReport`]: one scalar magnitude per aberration kind, the
//! diffraction-limited Airy radius as a reference scale, and a composite quality score
//! with fixed, documented weights.
use std::fmt::Display;

use num::Zero;
use serde::{Deserialize, Serialize};
use strum::{Display as EnumDisplay, EnumIter};
use uom::si::f64::{Angle, Length};
use uom::si::length::micrometer;

use crate::error::{OlResult, OptiLensError};
use crate::lens::Lens;
use crate::ray::{Ray, RayStatus};
use crate::raytrace::{FocalPoint, RayTracer};
use crate::meter;

/// weight of spherical aberration in the composite quality score
pub const WEIGHT_SPHERICAL: f64 = 0.30;
/// weight of coma in the composite quality score
pub const WEIGHT_COMA: f64 = 0.20;
/// weight of astigmatism in the composite quality score
pub const WEIGHT_ASTIGMATISM: f64 = 0.15;
/// weight of distortion in the composite quality score
pub const WEIGHT_DISTORTION: f64 = 0.15;
/// weight of field curvature in the composite quality score
pub const WEIGHT_FIELD_CURVATURE: f64 = 0.10;
/// weight of chromatic focal shift in the composite quality score
pub const WEIGHT_CHROMATIC: f64 = 0.10;

/// aperture-height fractions of the paraxial probe bundle
const PARAXIAL_FRACTIONS: [f64; 4] = [-0.08, -0.04, 0.04, 0.08];
/// aperture-height fractions of the marginal probe bundle
const MARGINAL_FRACTIONS: [f64; 4] = [-0.95, -0.85, 0.85, 0.95];

/// The closed set of aberration kinds evaluated by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay, EnumIter)]
pub enum AberrationKind {
    /// longitudinal focus shift between marginal and paraxial rays
    Spherical,
    /// asymmetry of the off-axis bundle at the paraxial image plane
    Coma,
    /// separation of tangential and sagittal foci
    Astigmatism,
    /// mean offset of the oblique foci from the paraxial image plane
    FieldCurvature,
    /// fractional chief-ray height error against the paraxial image height
    Distortion,
    /// focal length difference between the shortest and longest sampled wavelength
    Chromatic,
}

/// Composite quality score from normalized aberration magnitudes.
///
/// The score is `1 / (1 + Σ wᵢ·mᵢ)` with the fixed weights [`WEIGHT_SPHERICAL`],
/// [`WEIGHT_COMA`], [`WEIGHT_ASTIGMATISM`], [`WEIGHT_FIELD_CURVATURE`],
/// [`WEIGHT_DISTORTION`] and [`WEIGHT_CHROMATIC`]. Each magnitude enters as its absolute
/// value, so the score lies in `(0.0..=1.0]` and is strictly non-increasing when any
/// single magnitude grows while the others stay fixed. Length-valued aberrations are
/// expected pre-normalized by the focal length; distortion enters as a plain fraction.
#[must_use]
pub fn quality_score(
    spherical: f64,
    coma: f64,
    astigmatism: f64,
    field_curvature: f64,
    distortion: f64,
    chromatic: f64,
) -> f64 {
    let weighted = WEIGHT_SPHERICAL * spherical.abs()
        + WEIGHT_COMA * coma.abs()
        + WEIGHT_ASTIGMATISM * astigmatism.abs()
        + WEIGHT_FIELD_CURVATURE * field_curvature.abs()
        + WEIGHT_DISTORTION * distortion.abs()
        + WEIGHT_CHROMATIC * chromatic.abs();
    1.0 / (1.0 + weighted)
}

/// Aberration snapshot of one lens at one field angle and wavelength set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AberrationReport {
    lens_name: String,
    field_angle: Angle,
    wavelengths: Vec<Length>,
    spherical: Length,
    coma: Length,
    astigmatism: Length,
    field_curvature: Length,
    distortion: f64,
    chromatic_focal_shift: Length,
    airy_radius: Length,
    rays_traced: usize,
    rays_used: usize,
    quality: f64,
}
impl AberrationReport {
    /// Returns the name of the analyzed lens.
    #[must_use]
    pub fn lens_name(&self) -> &str {
        &self.lens_name
    }
    /// Returns the field angle of this snapshot.
    #[must_use]
    pub fn field_angle(&self) -> Angle {
        self.field_angle
    }
    /// Returns the sampled wavelengths (sorted ascending).
    #[must_use]
    pub fn wavelengths(&self) -> &[Length] {
        &self.wavelengths
    }
    /// Returns the longitudinal spherical aberration.
    #[must_use]
    pub fn spherical(&self) -> Length {
        self.spherical
    }
    /// Returns the coma magnitude at the paraxial image plane.
    #[must_use]
    pub fn coma(&self) -> Length {
        self.coma
    }
    /// Returns the astigmatism (tangential/sagittal focus separation).
    #[must_use]
    pub fn astigmatism(&self) -> Length {
        self.astigmatism
    }
    /// Returns the field curvature (mean oblique focus offset).
    #[must_use]
    pub fn field_curvature(&self) -> Length {
        self.field_curvature
    }
    /// Returns the signed fractional distortion.
    #[must_use]
    pub const fn distortion(&self) -> f64 {
        self.distortion
    }
    /// Returns the chromatic focal shift between the shortest and longest wavelength.
    #[must_use]
    pub fn chromatic_focal_shift(&self) -> Length {
        self.chromatic_focal_shift
    }
    /// Returns the diffraction-limited Airy disk radius (1.22·λ·f/D) as a reference
    /// scale for the geometric aberrations.
    #[must_use]
    pub fn airy_radius(&self) -> Length {
        self.airy_radius
    }
    /// Returns the total number of rays traced for this report.
    #[must_use]
    pub const fn rays_traced(&self) -> usize {
        self.rays_traced
    }
    /// Returns the number of rays that survived to enter the statistics. Blocked and
    /// totally internally reflected rays are excluded, never silently swallowed.
    #[must_use]
    pub const fn rays_used(&self) -> usize {
        self.rays_used
    }
    /// Returns the composite quality score in `(0.0..=1.0]` (see [`quality_score`]).
    #[must_use]
    pub const fn quality(&self) -> f64 {
        self.quality
    }
    /// Returns the raw SI-value magnitude of the given aberration kind (meters for the
    /// length-valued kinds, a plain fraction for distortion).
    #[must_use]
    pub fn magnitude(&self, kind: AberrationKind) -> f64 {
        match kind {
            AberrationKind::Spherical => self.spherical.value,
            AberrationKind::Coma => self.coma.value,
            AberrationKind::Astigmatism => self.astigmatism.value,
            AberrationKind::FieldCurvature => self.field_curvature.value,
            AberrationKind::Distortion => self.distortion,
            AberrationKind::Chromatic => self.chromatic_focal_shift.value,
        }
    }
}
impl Display for AberrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let um = Length::format_args(micrometer, uom::fmt::DisplayStyle::Abbreviation);
        writeln!(
            f,
            "aberration report for '{}' at field angle {:.2}°:",
            self.lens_name,
            self.field_angle.value.to_degrees()
        )?;
        writeln!(f, "  spherical:        {:.3}", um.with(self.spherical))?;
        writeln!(f, "  coma:             {:.3}", um.with(self.coma))?;
        writeln!(f, "  astigmatism:      {:.3}", um.with(self.astigmatism))?;
        writeln!(f, "  field curvature:  {:.3}", um.with(self.field_curvature))?;
        writeln!(f, "  distortion:       {:.4} %", self.distortion * 100.0)?;
        writeln!(
            f,
            "  chromatic shift:  {:.3}",
            um.with(self.chromatic_focal_shift)
        )?;
        writeln!(f, "  airy radius:      {:.3}", um.with(self.airy_radius))?;
        writeln!(f, "  rays used:        {}/{}", self.rays_used, self.rays_traced)?;
        write!(f, "  quality:          {:.4}", self.quality)
    }
}

/// Aberration analyzer tracing its own probe bundles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AberrationAnalyzer {
    rays_per_bundle: usize,
}
impl Default for AberrationAnalyzer {
    /// Create an analyzer with 16 rays per off-axis probe bundle.
    fn default() -> Self {
        Self { rays_per_bundle: 16 }
    }
}
impl AberrationAnalyzer {
    /// Creates a new [`AberrationAnalyzer`] with the given off-axis bundle size.
    ///
    /// # Errors
    ///
    /// This function returns an error if fewer than 4 rays per bundle are requested.
    pub fn new(rays_per_bundle: usize) -> OlResult<Self> {
        if rays_per_bundle < 4 {
            return Err(OptiLensError::InsufficientRays(
                "aberration analysis needs at least 4 rays per bundle".into(),
            ));
        }
        Ok(Self { rays_per_bundle })
    }
    /// Analyze a lens at the given field angle and wavelength set.
    ///
    /// On-axis aberrations that are analytically zero (coma, astigmatism, field
    /// curvature, distortion at zero field angle) are reported as exactly zero. With a
    /// single sampled wavelength the chromatic shift is likewise exactly zero.
    ///
    /// # Errors
    ///
    /// This function returns an error if
    ///  - the wavelength list is empty or contains an invalid wavelength
    ///  - the field angle is not within ±90° (exclusive)
    ///  - too few rays survive the probe traces to locate the required foci
    pub fn analyze(
        &self,
        lens: &Lens,
        field_angle: Angle,
        wavelengths: &[Length],
    ) -> OlResult<AberrationReport> {
        if wavelengths.is_empty() {
            return Err(OptiLensError::InvalidWavelength(
                "at least one wavelength is required".into(),
            ));
        }
        let mut wavelengths = wavelengths.to_vec();
        wavelengths.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let reference = wavelengths[wavelengths.len() / 2];
        let tracer = RayTracer::new(lens);
        let mut rays_traced = 0_usize;
        let mut rays_used = 0_usize;
        let mut count = |rays: &[Ray]| {
            rays_traced += rays.len();
            rays_used += rays
                .iter()
                .filter(|ray| ray.status() == RayStatus::Transmitted)
                .count();
        };

        // spherical aberration: marginal vs paraxial focus of an axial bundle
        let paraxial_rays =
            tracer.trace_parallel_at_heights(&PARAXIAL_FRACTIONS, reference, Angle::zero())?;
        count(&paraxial_rays);
        let paraxial_focus = RayTracer::find_focal_point(&paraxial_rays)?;
        let marginal_rays =
            tracer.trace_parallel_at_heights(&MARGINAL_FRACTIONS, reference, Angle::zero())?;
        count(&marginal_rays);
        let marginal_focus = RayTracer::find_focal_point(&marginal_rays)?;
        let spherical = (marginal_focus.position().x - paraxial_focus.position().x).abs();

        let Some(focal_length) = lens.focal_length_at(reference)? else {
            return Err(OptiLensError::InsufficientRays(
                "a flat plate has no focus to analyze".into(),
            ));
        };

        // off-axis aberrations, analytically zero on axis
        let (coma, astigmatism, field_curvature, distortion) = if field_angle.is_zero() {
            (Length::zero(), Length::zero(), Length::zero(), 0.0)
        } else {
            self.off_axis_aberrations(&tracer, field_angle, reference, focal_length, &paraxial_focus, &mut count)?
        };

        // chromatic focal shift between the extreme sampled wavelengths
        let chromatic_focal_shift = if wavelengths.len() < 2 {
            Length::zero()
        } else {
            let f_short = lens.focal_length_at(wavelengths[0])?;
            let f_long = lens.focal_length_at(wavelengths[wavelengths.len() - 1])?;
            match (f_short, f_long) {
                (Some(short), Some(long)) => (short - long).abs(),
                _ => Length::zero(),
            }
        };

        let airy_radius = 1.22 * reference * focal_length.abs() / lens.diameter();
        let f = focal_length.abs().value;
        let quality = quality_score(
            spherical.value / f,
            coma.value / f,
            astigmatism.value / f,
            field_curvature.value / f,
            distortion,
            chromatic_focal_shift.value / f,
        );
        Ok(AberrationReport {
            lens_name: lens.name().to_string(),
            field_angle,
            wavelengths,
            spherical,
            coma,
            astigmatism,
            field_curvature,
            distortion,
            chromatic_focal_shift,
            airy_radius,
            rays_traced,
            rays_used,
            quality,
        })
    }
    /// Coma, astigmatism, field curvature and distortion from a tilted probe bundle.
    ///
    /// The tangential focus is traced; the sagittal focus uses the paraxial obliquity
    /// estimate x_s = x_p·cos θ (skew rays cannot be traced in the meridional plane).
    fn off_axis_aberrations(
        &self,
        tracer: &RayTracer,
        field_angle: Angle,
        wavelength: Length,
        focal_length: Length,
        paraxial_focus: &FocalPoint,
        count: &mut impl FnMut(&[Ray]),
    ) -> OlResult<(Length, Length, Length, f64)> {
        let tilted = tracer.trace_collimated_bundle(self.rays_per_bundle, wavelength, field_angle)?;
        count(&tilted);
        let tangential_focus = RayTracer::find_focal_point(&tilted)?;
        let chief = tracer.trace_parallel_at_heights(&[0.0], wavelength, field_angle)?;
        count(&chief);
        if chief[0].status() != RayStatus::Transmitted {
            return Err(OptiLensError::InsufficientRays(
                "chief ray did not pass the lens".into(),
            ));
        }

        // ray heights at the paraxial image plane
        let image_x = paraxial_focus.position().x;
        let height_at_image = |ray: &Ray| -> Length {
            ray.position().y + (image_x - ray.position().x) * (ray.direction().y / ray.direction().x)
        };
        let transmitted: Vec<&Ray> = tilted
            .iter()
            .filter(|ray| ray.status() == RayStatus::Transmitted)
            .collect();
        if transmitted.len() < 2 {
            return Err(OptiLensError::InsufficientRays(format!(
                "off-axis bundle has too few transmitted rays ({})",
                transmitted.len()
            )));
        }
        let chief_height = height_at_image(&chief[0]);
        let lower_height = height_at_image(transmitted[0]);
        let upper_height = height_at_image(transmitted[transmitted.len() - 1]);
        let coma = (0.5 * (upper_height + lower_height) - chief_height).abs();

        let theta = field_angle.value;
        let sagittal_x = meter!(paraxial_focus.position().x.value * theta.cos());
        let astigmatism = (tangential_focus.position().x - sagittal_x).abs();
        let field_curvature =
            (0.5 * (tangential_focus.position().x + sagittal_x) - paraxial_focus.position().x).abs();

        let ideal_height = focal_length * theta.tan();
        let distortion = ((chief_height - ideal_height) / ideal_height).value;
        Ok((coma, astigmatism, field_curvature, distortion))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::material::{wavelength_c_line, wavelength_d_line, wavelength_f_line, MaterialCatalog};
    use crate::{degree, millimeter};
    use approx::assert_relative_eq;
    use assert_matches::assert_matches;

    fn biconvex() -> Lens {
        Lens::new_from_catalog(
            "biconvex",
            millimeter!(100.0),
            millimeter!(-100.0),
            millimeter!(10.0),
            millimeter!(50.0),
            "BK7",
            &MaterialCatalog::default(),
        )
        .unwrap()
    }
    fn d_f_c_lines() -> Vec<Length> {
        vec![wavelength_f_line(), wavelength_d_line(), wavelength_c_line()]
    }
    #[test]
    fn new() {
        assert_matches!(
            AberrationAnalyzer::new(3),
            Err(OptiLensError::InsufficientRays(_))
        );
        assert!(AberrationAnalyzer::new(4).is_ok());
    }
    #[test]
    fn analyze_rejects_empty_wavelengths() {
        let analyzer = AberrationAnalyzer::default();
        assert_matches!(
            analyzer.analyze(&biconvex(), Angle::zero(), &[]),
            Err(OptiLensError::InvalidWavelength(_))
        );
    }
    #[test]
    fn on_axis_aberrations_are_exactly_zero() {
        let analyzer = AberrationAnalyzer::default();
        let report = analyzer
            .analyze(&biconvex(), Angle::zero(), &d_f_c_lines())
            .unwrap();
        assert_eq!(report.coma(), Length::zero());
        assert_eq!(report.astigmatism(), Length::zero());
        assert_eq!(report.field_curvature(), Length::zero());
        assert_eq!(report.distortion(), 0.0);
        // a spherical singlet does show spherical aberration
        assert!(report.spherical() > Length::zero());
        assert!(report.quality() > 0.0 && report.quality() <= 1.0);
        assert_eq!(report.rays_used(), report.rays_traced());
    }
    #[test]
    fn off_axis_aberrations_appear() {
        let analyzer = AberrationAnalyzer::default();
        let report = analyzer
            .analyze(&biconvex(), degree!(5.0), &d_f_c_lines())
            .unwrap();
        assert!(report.astigmatism() > Length::zero());
        assert!(report.field_curvature() > Length::zero());
        assert!(report.distortion().abs() > 0.0);
        assert_eq!(report.field_angle(), degree!(5.0));
    }
    #[test]
    fn chromatic_shift_matches_lensmaker() {
        let lens = biconvex();
        let analyzer = AberrationAnalyzer::default();
        let report = analyzer
            .analyze(&lens, Angle::zero(), &d_f_c_lines())
            .unwrap();
        let f_blue = lens.focal_length_at(wavelength_f_line()).unwrap().unwrap();
        let f_red = lens.focal_length_at(wavelength_c_line()).unwrap().unwrap();
        assert_relative_eq!(
            report.chromatic_focal_shift().value,
            (f_red - f_blue).abs().value,
            epsilon = 1e-12
        );
        assert!(report.chromatic_focal_shift() > Length::zero());
    }
    #[test]
    fn single_wavelength_has_no_chromatic_shift() {
        let analyzer = AberrationAnalyzer::default();
        let report = analyzer
            .analyze(&biconvex(), Angle::zero(), &[wavelength_d_line()])
            .unwrap();
        assert_eq!(report.chromatic_focal_shift(), Length::zero());
    }
    #[test]
    fn airy_radius() {
        let lens = biconvex();
        let analyzer = AberrationAnalyzer::default();
        let report = analyzer
            .analyze(&lens, Angle::zero(), &[wavelength_d_line()])
            .unwrap();
        let f = lens.focal_length().unwrap().unwrap();
        let expected = 1.22 * wavelength_d_line() * f / lens.diameter();
        assert_relative_eq!(report.airy_radius().value, expected.value, epsilon = 1e-15);
        // a 50 mm f/2 singlet is far from diffraction limited
        assert!(report.spherical() > report.airy_radius());
    }
    #[test]
    fn flat_plate_cannot_be_analyzed() {
        let window = Lens::new_from_catalog(
            "window",
            millimeter!(f64::INFINITY),
            millimeter!(f64::NEG_INFINITY),
            millimeter!(3.0),
            millimeter!(25.0),
            "BK7",
            &MaterialCatalog::default(),
        )
        .unwrap();
        let analyzer = AberrationAnalyzer::default();
        assert_matches!(
            analyzer.analyze(&window, Angle::zero(), &[wavelength_d_line()]),
            Err(OptiLensError::InsufficientRays(_))
        );
    }
    #[test]
    fn quality_score_bounds_and_monotonicity() {
        assert_eq!(quality_score(0.0, 0.0, 0.0, 0.0, 0.0, 0.0), 1.0);
        let base = [0.01, 0.02, 0.005, 0.003, 0.01, 0.004];
        let score = |m: &[f64; 6]| quality_score(m[0], m[1], m[2], m[3], m[4], m[5]);
        let reference = score(&base);
        assert!(reference > 0.0 && reference < 1.0);
        for i in 0..6 {
            let mut increased = base;
            increased[i] += 0.1;
            assert!(
                score(&increased) < reference,
                "score must not increase with aberration {i}"
            );
        }
        // sign of a magnitude must not matter
        let mut negated = base;
        negated[4] = -negated[4];
        assert_eq!(score(&negated), reference);
    }
    #[test]
    fn magnitude_accessor() {
        let analyzer = AberrationAnalyzer::default();
        let report = analyzer
            .analyze(&biconvex(), degree!(3.0), &d_f_c_lines())
            .unwrap();
        assert_eq!(
            report.magnitude(AberrationKind::Spherical),
            report.spherical().value
        );
        assert_eq!(
            report.magnitude(AberrationKind::Distortion),
            report.distortion()
        );
    }
}
