//! Serializable configuration of mixed elasticity simulations.
use crate::materials::{ElasticityParameters, LameParameters, YoungPoisson};
use crate::newton::NewtonSettings;
use mixfem::Real;
use serde::{Deserialize, Serialize};

fn one<T: Real>() -> T {
    T::one()
}

/// Engineering material constants.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Real + Deserialize<'de>"))]
pub struct MaterialConfig<T> {
    pub young_modulus: T,
    pub poisson_ratio: T,
    #[serde(default = "one")]
    pub density: T,
    #[serde(default = "one")]
    pub time_factor: T,
}

impl<T: Real> MaterialConfig<T> {
    pub fn new(young_modulus: T, poisson_ratio: T) -> Self {
        Self {
            young_modulus,
            poisson_ratio,
            density: T::one(),
            time_factor: T::one(),
        }
    }

    pub fn lame_parameters(&self) -> LameParameters<T> {
        LameParameters::from(YoungPoisson {
            young: self.young_modulus,
            poisson: self.poisson_ratio,
        })
    }

    pub fn elasticity_parameters(&self) -> ElasticityParameters<T> {
        ElasticityParameters::from_lame(self.lame_parameters())
            .with_density(self.density)
            .with_time_factor(self.time_factor)
    }

    /// Checks the raw constants and the derived parameters.
    pub fn validate(&self) -> eyre::Result<()> {
        let half = T::from_f64(0.5).expect("Literal must fit in T");
        if !(self.poisson_ratio > T::zero() && self.poisson_ratio <= half) {
            return Err(eyre::eyre!(
                "Poisson's ratio must lie in (0, 0.5], got {:?}",
                self.poisson_ratio
            ));
        }
        self.elasticity_parameters().validate()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Real + Deserialize<'de>"))]
pub struct MixedElasticityConfig<T> {
    pub material: MaterialConfig<T>,
    #[serde(default)]
    pub newton: NewtonSettings<T>,
}

impl<T: Real> MixedElasticityConfig<T> {
    pub fn validate(&self) -> eyre::Result<()> {
        self.material.validate()?;
        self.newton.validate()
    }
}
