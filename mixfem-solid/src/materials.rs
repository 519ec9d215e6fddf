use eyre::eyre;
use mixfem::nalgebra::{DMatrix, RealField};
use mixfem::Real;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Lamé parameters.
///
/// A value of `lambda` equal to positive infinity describes a fully incompressible material.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LameParameters<T> {
    pub mu: T,
    pub lambda: T,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YoungPoisson<T> {
    pub young: T,
    pub poisson: T,
}

impl<T> From<YoungPoisson<T>> for LameParameters<T>
where
    T: RealField,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn from(params: YoungPoisson<T>) -> Self {
        let YoungPoisson { young, poisson } = params;
        let mu = 0.5 * young.clone() / (1.0 + poisson.clone());
        // The limit nu -> 1/2 is the incompressible material
        let lambda = if poisson == 0.5 {
            T::from_f64(f64::INFINITY).expect("Literal must fit in T")
        } else {
            2.0 * mu.clone() * poisson.clone() / (1.0 - 2.0 * poisson)
        };
        Self { mu, lambda }
    }
}

impl<T: Real> LameParameters<T> {
    /// The coefficient $\mu^2 / \lambda$ of the near-incompressibility term, or `None` for an
    /// incompressible material.
    pub fn penalty_factor(&self) -> Option<T> {
        if self.lambda.is_finite() {
            Some(self.mu * self.mu / self.lambda)
        } else {
            None
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if !(self.mu.is_finite() && self.mu > T::zero()) {
            return Err(eyre!("Shear modulus mu must be positive and finite, got {:?}", self.mu));
        }
        // The pressure penalty mu^2 / lambda requires lambda > 0. Also rejects NaN
        if !(self.lambda > T::zero()) {
            return Err(eyre!("Lamé parameter lambda must be positive, got {:?}", self.lambda));
        }
        Ok(())
    }
}

/// Material parameters for mixed elasticity.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElasticityParameters<T> {
    pub lame: LameParameters<T>,
    /// Mass density, scaling the body force.
    pub density: T,
    /// Scaling of the body force, e.g. for load stepping.
    pub time_factor: T,
}

impl<T: Real> ElasticityParameters<T> {
    /// Parameters with unit density and unit time factor.
    pub fn from_lame(lame: LameParameters<T>) -> Self {
        Self {
            lame,
            density: T::one(),
            time_factor: T::one(),
        }
    }

    pub fn with_density(self, density: T) -> Self {
        Self { density, ..self }
    }

    pub fn with_time_factor(self, time_factor: T) -> Self {
        Self { time_factor, ..self }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        self.lame.validate()?;
        if !(self.density >= T::zero()) {
            return Err(eyre!("Density must be non-negative, got {:?}", self.density));
        }
        if !self.time_factor.is_finite() {
            return Err(eyre!("Time factor must be finite, got {:?}", self.time_factor));
        }
        Ok(())
    }
}

/// The strain energy density of the mixed nearly incompressible Neo-Hookean formulation.
///
/// With the scaled pressure $p$ as an independent field, the density is
/// $$
/// \Psi(\vec F, p) = \frac{\mu}{2} (\operatorname{tr}(\vec F^T \vec F) - d) - \mu \log J
///     + \mu p \log J - \frac{\mu^2}{2 \lambda} p^2,
/// $$
/// where $J = \det \vec F$ and $d$ is the spatial dimension. The last term vanishes for an
/// incompressible material.
///
/// Returns `None` if $J \leq 0$.
#[allow(non_snake_case)]
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn mixed_energy_density<T: Real>(F: &DMatrix<T>, pressure: T, lame: &LameParameters<T>) -> Option<T> {
    let J = F.determinant();
    if !(J > 0.0) {
        return None;
    }
    let &LameParameters { mu, .. } = lame;
    let d = T::from_usize(F.nrows()).expect("Dimension must fit in T");
    let log_J = J.ln();
    let mut psi = 0.5 * mu * ((F.transpose() * F).trace() - d) - mu * log_J + mu * pressure * log_J;
    if let Some(penalty) = lame.penalty_factor() {
        psi -= 0.5 * penalty * pressure * pressure;
    }
    Some(psi)
}
