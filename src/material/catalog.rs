//! Built-in glass catalog with lookup by name.
use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{Material, Sellmeier1};
use crate::error::{OlResult, OptiLensError};

/// A catalog of named [`Material`]s.
///
/// The [`Default`] catalog is seeded with a handful of standard optical glasses
/// (published Sellmeier fits): `BK7`, `FusedSilica`, `BAF10`, `F2` and `SF11`.
/// External catalog loaders can [`add`](Self::add) further materials; the engine itself
/// never reads the file system.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct MaterialCatalog {
    materials: HashMap<String, Material>,
}
impl MaterialCatalog {
    /// Creates a new, empty [`MaterialCatalog`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            materials: HashMap::new(),
        }
    }
    /// Look up a [`Material`] by its catalog name.
    ///
    /// # Errors
    ///
    /// This function returns an error if no material with the given name exists. It never
    /// silently substitutes a default glass.
    pub fn get(&self, name: &str) -> OlResult<&Material> {
        self.materials.get(name).ok_or_else(|| {
            OptiLensError::UnknownMaterial(format!("material '{name}' not found in catalog"))
        })
    }
    /// Add (or replace) a [`Material`] in this catalog, keyed by its name.
    pub fn add(&mut self, material: Material) {
        self.materials.insert(material.name().to_string(), material);
    }
    /// Returns the sorted list of material names in this catalog.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.materials.keys().cloned().sorted().collect()
    }
    /// Returns the number of materials in this catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materials.len()
    }
    /// Returns `true` if this catalog contains no materials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}
impl Default for MaterialCatalog {
    /// Create a catalog seeded with standard optical glasses.
    ///
    /// Sellmeier coefficients are the published Schott / Heraeus fits (λ in µm).
    fn default() -> Self {
        let mut catalog = Self::empty();
        // Schott N-BK7
        catalog.add(
            Material::new(
                "BK7",
                Sellmeier1::new(
                    1.039_612_12,
                    0.231_792_344,
                    1.010_469_45,
                    0.006_000_698_67,
                    0.020_017_914_4,
                    103.560_653,
                )
                .unwrap(),
            )
            .unwrap()
            .with_abbe(64.17)
            .with_dn_dt(1.1e-6),
        );
        // Heraeus fused silica
        catalog.add(
            Material::new(
                "FusedSilica",
                Sellmeier1::new(
                    0.696_166_3,
                    0.407_942_6,
                    0.897_479_4,
                    0.004_679_148_6,
                    0.013_512_063_1,
                    97.934_002_5,
                )
                .unwrap(),
            )
            .unwrap()
            .with_abbe(67.8)
            .with_dn_dt(1.02e-5),
        );
        // Schott N-BAF10
        catalog.add(
            Material::new(
                "BAF10",
                Sellmeier1::new(
                    1.585_149_5,
                    0.143_559_385,
                    1.085_212_69,
                    0.009_266_812_82,
                    0.042_448_980_5,
                    105.613_573,
                )
                .unwrap(),
            )
            .unwrap()
            .with_abbe(47.11)
            .with_dn_dt(4.2e-6),
        );
        // Schott F2
        catalog.add(
            Material::new(
                "F2",
                Sellmeier1::new(
                    1.345_333_59,
                    0.209_073_176,
                    0.937_357_162,
                    0.009_977_438_71,
                    0.047_045_076_7,
                    111.886_764,
                )
                .unwrap(),
            )
            .unwrap()
            .with_abbe(36.37)
            .with_dn_dt(4.4e-6),
        );
        // Schott N-SF11
        catalog.add(
            Material::new(
                "SF11",
                Sellmeier1::new(
                    1.737_596_95,
                    0.313_747_346,
                    1.898_781_01,
                    0.013_188_707,
                    0.062_306_814_2,
                    155.236_29,
                )
                .unwrap(),
            )
            .unwrap()
            .with_abbe(25.68)
            .with_dn_dt(1.2e-5),
        );
        catalog
    }
}
