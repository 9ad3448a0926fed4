#![warn(missing_docs)]
//! Module for handling optical materials and their dispersion.
//!
//! A [`Material`] is identified by its catalog name and carries a fitted
//! [`Sellmeier1`] dispersion model. The refractive index is always *derived* from the
//! model, never stored. Materials are normally obtained from a [`MaterialCatalog`] by name.
use num::Zero;
use serde::{Deserialize, Serialize};
use uom::si::f64::{Length, ThermodynamicTemperature};
use uom::si::thermodynamic_temperature::degree_celsius;

pub mod catalog;
pub mod sellmeier;

pub use catalog::MaterialCatalog;
pub use sellmeier::Sellmeier1;

use crate::error::{OlResult, OptiLensError};
use crate::{celsius, nanometer};

/// Wavelength of the helium d line. Used as the reference for focal lengths and the Abbe number.
pub fn wavelength_d_line() -> Length {
    nanometer!(587.6)
}
/// Wavelength of the hydrogen F line (blue).
pub fn wavelength_f_line() -> Length {
    nanometer!(486.1)
}
/// Wavelength of the hydrogen C line (red).
pub fn wavelength_c_line() -> Length {
    nanometer!(656.3)
}
/// Reference temperature at which the dispersion fits are valid.
pub fn reference_temperature() -> ThermodynamicTemperature {
    celsius!(20.0)
}

/// An optical glass with a Sellmeier dispersion fit.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Material {
    name: String,
    sellmeier: Sellmeier1,
    /// catalog reference Abbe number (if published)
    abbe: Option<f64>,
    /// linear thermo-optic coefficient dn/dT in 1/K, relative to 20 °C
    dn_dt: Option<f64>,
    /// coarse internal transmission table (wavelength, transmittance in 0.0..=1.0)
    transmission: Option<Vec<(Length, f64)>>,
}
impl Material {
    /// Creates a new [`Material`] with the given name and dispersion model.
    ///
    /// The optional catalog Abbe number, thermo-optic coefficient and internal
    /// transmission table can be attached with the corresponding `with_` functions.
    ///
    /// # Errors
    ///
    /// This function will return an error if the given name is empty.
    pub fn new(name: &str, sellmeier: Sellmeier1) -> OlResult<Self> {
        if name.trim().is_empty() {
            return Err(OptiLensError::Other("material name must not be empty".into()));
        }
        Ok(Self {
            name: name.to_string(),
            sellmeier,
            abbe: None,
            dn_dt: None,
            transmission: None,
        })
    }
    /// Attach the published catalog Abbe number.
    #[must_use]
    pub const fn with_abbe(mut self, abbe: f64) -> Self {
        self.abbe = Some(abbe);
        self
    }
    /// Attach a linear thermo-optic coefficient dn/dT (in 1/K, relative to 20 °C).
    #[must_use]
    pub const fn with_dn_dt(mut self, dn_dt: f64) -> Self {
        self.dn_dt = Some(dn_dt);
        self
    }
    /// Attach a coarse internal transmission table.
    ///
    /// The table must be sorted by wavelength; transmittance values outside `0.0..=1.0`
    /// are rejected.
    ///
    /// # Errors
    ///
    /// This function will return an error if the table is unsorted or contains a
    /// transmittance outside `0.0..=1.0`.
    pub fn with_transmission(mut self, table: Vec<(Length, f64)>) -> OlResult<Self> {
        if table.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(OptiLensError::Other(
                "transmission table must be sorted by strictly increasing wavelength".into(),
            ));
        }
        if table.iter().any(|(_, t)| !(0.0..=1.0).contains(t)) {
            return Err(OptiLensError::Other(
                "transmittance values must be within (0.0..=1.0)".into(),
            ));
        }
        self.transmission = Some(table);
        Ok(self)
    }
    /// Returns the catalog name of this [`Material`].
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Returns the dispersion model of this [`Material`].
    #[must_use]
    pub const fn sellmeier(&self) -> &Sellmeier1 {
        &self.sellmeier
    }
    /// Get the refractive index at the given wavelength and the reference temperature (20 °C).
    ///
    /// # Errors
    ///
    /// This function returns an error if
    ///   - the wavelength is non-positive, not finite or outside the supported band
    ///     (350 nm to 2.5 µm)
    ///   - the dispersion model yields an index below 1.0 or a non-finite value
    pub fn refractive_index(&self, wavelength: Length) -> OlResult<f64> {
        check_wavelength(wavelength)?;
        let refr_index = self.sellmeier.evaluate(wavelength);
        if refr_index < 1.0 || !refr_index.is_finite() {
            return Err(OptiLensError::DegenerateDispersion(format!(
                "refractive index of '{}' calculated by model is <1.0 or not finite",
                self.name
            )));
        }
        Ok(refr_index)
    }
    /// Get the refractive index at the given wavelength and temperature.
    ///
    /// The temperature dependence is a linear correction with the material's dn/dT
    /// coefficient about 20 °C. Without a coefficient this is identical to
    /// [`refractive_index`](Self::refractive_index).
    ///
    /// # Errors
    ///
    /// Same error conditions as [`refractive_index`](Self::refractive_index). In addition, the
    /// corrected index must still be ≥ 1.0 and finite.
    pub fn refractive_index_at(
        &self,
        wavelength: Length,
        temperature: ThermodynamicTemperature,
    ) -> OlResult<f64> {
        let n = self.refractive_index(wavelength)?;
        let Some(dn_dt) = self.dn_dt else {
            return Ok(n);
        };
        let delta_t = temperature.get::<degree_celsius>()
            - reference_temperature().get::<degree_celsius>();
        if !delta_t.is_finite() {
            return Err(OptiLensError::Other("temperature must be finite".into()));
        }
        let corrected = dn_dt.mul_add(delta_t, n);
        if corrected < 1.0 || !corrected.is_finite() {
            return Err(OptiLensError::DegenerateDispersion(format!(
                "thermally corrected refractive index of '{}' is <1.0 or not finite",
                self.name
            )));
        }
        Ok(corrected)
    }
    /// Get the Abbe number ν_d = (n_d − 1) / (n_F − n_C), derived from the dispersion model.
    ///
    /// # Errors
    ///
    /// This function returns an error if the index calculation fails at one of the three
    /// standard lines or if the dispersion denominator n_F − n_C degenerates to (near) zero.
    pub fn abbe_number(&self) -> OlResult<f64> {
        let n_d = self.refractive_index(wavelength_d_line())?;
        let n_f = self.refractive_index(wavelength_f_line())?;
        let n_c = self.refractive_index(wavelength_c_line())?;
        if approx::abs_diff_eq!(n_f, n_c, epsilon = 1e-9) {
            return Err(OptiLensError::DegenerateDispersion(format!(
                "'{}' has (near) zero principal dispersion n_F - n_C",
                self.name
            )));
        }
        Ok((n_d - 1.0) / (n_f - n_c))
    }
    /// Returns the published catalog Abbe number, if any.
    #[must_use]
    pub const fn catalog_abbe_number(&self) -> Option<f64> {
        self.abbe
    }
    /// Get the internal transmittance at the given wavelength, linearly interpolated
    /// from the attached table.
    ///
    /// This function returns `None` if no table is attached or the wavelength lies
    /// outside the tabulated range.
    #[must_use]
    pub fn transmission(&self, wavelength: Length) -> Option<f64> {
        let table = self.transmission.as_ref()?;
        let (first, last) = (table.first()?, table.last()?);
        if wavelength < first.0 || wavelength > last.0 {
            return None;
        }
        for pair in table.windows(2) {
            let (w0, t0) = pair[0];
            let (w1, t1) = pair[1];
            if wavelength <= w1 {
                let frac = ((wavelength - w0) / (w1 - w0)).value;
                return Some(t1.mul_add(frac, t0 * (1.0 - frac)));
            }
        }
        Some(last.1)
    }
}

/// Check a wavelength for validity (positive, finite, within the supported band).
///
/// # Errors
///
/// This function returns an error if the wavelength is non-positive, not finite or
/// outside 350 nm to 2.5 µm.
pub fn check_wavelength(wavelength: Length) -> OlResult<()> {
    if wavelength.is_zero() || wavelength.is_sign_negative() || !wavelength.is_finite() {
        return Err(OptiLensError::InvalidWavelength(
            "wavelength must be positive and finite".into(),
        ));
    }
    if wavelength < nanometer!(350.0) || wavelength > nanometer!(2500.0) {
        return Err(OptiLensError::InvalidWavelength(
            "wavelength outside supported band (350 nm ..= 2500 nm)".into(),
        ));
    }
    Ok(())
}
