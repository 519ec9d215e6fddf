//! Finite deformation kinematics at a single point.
use mixfem::nalgebra::{DMatrix, DMatrixView};
use mixfem::Real;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// The deformation gradient has a non-positive or non-finite determinant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidDeformation<T> {
    pub determinant: T,
}

impl<T: Display> Display for InvalidDeformation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "Invalid deformation: det(F) = {} is not positive.", self.determinant)
    }
}

impl<T: fmt::Debug + Display> Error for InvalidDeformation<T> {}

/// Computes the displacement gradient $\vec H = (\pd{x}{\xi})^{-T} (\pd{u}{\xi})^T$.
///
/// Here `geometry_jacobian` is $\pd{x}{\xi}$ and `displacement_reference_jacobian` is
/// $\pd{u}{\xi}$, the Jacobian of the displacement with respect to reference coordinates.
/// Note that $\vec H$ is the *transpose* of $\nabla \vec u$.
///
/// Returns `None` if the geometry Jacobian is singular.
pub fn displacement_gradient<T: Real>(
    geometry_jacobian: &DMatrixView<T>,
    displacement_reference_jacobian: &DMatrix<T>,
) -> Option<DMatrix<T>> {
    let jacobian_inv_t = geometry_jacobian.clone_owned().try_inverse()?.transpose();
    Some(jacobian_inv_t * displacement_reference_jacobian.transpose())
}

/// The deformation gradient $\vec F = \vec I + \vec H^T$.
pub fn deformation_gradient<T: Real>(displacement_gradient: &DMatrix<T>) -> DMatrix<T> {
    let d = displacement_gradient.nrows();
    DMatrix::identity(d, d) + displacement_gradient.transpose()
}

/// The Jacobian $\pd{u}{\xi} = \sum_i \vec u_i \otimes \nabla_\xi \phi_i$ of a displacement field
/// with nodal `coefficients` (one column per node) and reference basis gradients (one column per
/// node).
pub fn displacement_reference_jacobian<T: Real>(
    coefficients: &DMatrixView<T>,
    reference_gradients: &DMatrixView<T>,
) -> DMatrix<T> {
    coefficients * reference_gradients.transpose()
}

/// Derived quantities of a deformation gradient with positive determinant.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq)]
pub struct Kinematics<T: Real> {
    pub F: DMatrix<T>,
    pub F_inv: DMatrix<T>,
    /// $\vec F^{-T}$.
    pub F_inv_t: DMatrix<T>,
    pub J: T,
    pub log_J: T,
}

#[allow(non_snake_case)]
impl<T: Real> Kinematics<T> {
    pub fn from_deformation_gradient(F: DMatrix<T>) -> Result<Self, InvalidDeformation<T>> {
        let J = F.determinant();
        if !(J.is_finite() && J > T::zero()) {
            return Err(InvalidDeformation { determinant: J });
        }
        let F_inv = F
            .clone()
            .try_inverse()
            .ok_or(InvalidDeformation { determinant: J })?;
        let F_inv_t = F_inv.transpose();
        Ok(Self {
            F,
            F_inv,
            F_inv_t,
            J,
            log_J: J.ln(),
        })
    }

    pub fn dim(&self) -> usize {
        self.F.nrows()
    }
}
