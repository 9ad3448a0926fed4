//! Three-term Sellmeier dispersion model
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;
use uom::si::length::micrometer;

use crate::error::{OlResult, OptiLensError};

/// Three-term Sellmeier-1 dispersion model.
///
/// The refractive index is given as n² − 1 = Σᵢ kᵢλ²/(λ² − lᵢ) with the wavelength λ
/// in micrometers and the `lᵢ` coefficients in µm². This form is sufficient for all
/// standard optical glasses in the visible to near-IR band.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Sellmeier1 {
    k1: f64,
    k2: f64,
    k3: f64,
    l1: f64,
    l2: f64,
    l3: f64,
}
impl Sellmeier1 {
    /// Create a new three-term Sellmeier model from its fitted coefficients.
    ///
    /// # Errors
    ///
    /// This function will return an error if any of the given coefficients is not finite.
    pub fn new(k1: f64, k2: f64, k3: f64, l1: f64, l2: f64, l3: f64) -> OlResult<Self> {
        if !k1.is_finite()
            || !k2.is_finite()
            || !k3.is_finite()
            || !l1.is_finite()
            || !l2.is_finite()
            || !l3.is_finite()
        {
            return Err(OptiLensError::DegenerateDispersion(
                "all Sellmeier coefficients must be finite".into(),
            ));
        }
        Ok(Self {
            k1,
            k2,
            k3,
            l1,
            l2,
            l3,
        })
    }
    /// Evaluate the model at the given (positive, finite) wavelength.
    ///
    /// This function returns the raw model value. Validity checks (n ≥ 1.0, finiteness)
    /// are performed centrally by [`Material`](super::Material).
    #[must_use]
    pub fn evaluate(&self, wavelength: Length) -> f64 {
        let lambda = wavelength.get::<micrometer>();
        let l_sq = lambda * lambda;
        f64::sqrt(
            1.0 + self.k1 * l_sq / (l_sq - self.l1)
                + self.k2 * l_sq / (l_sq - self.l2)
                + self.k3 * l_sq / (l_sq - self.l3),
        )
    }
}
