use super::check_point_dimensions;
use mixfem::assembly::{ElementCoefficients, ElementKernel, Elimination, LocalSystem, QuadraturePoint};
use mixfem::error::AssemblyError;
use mixfem::Real;

/// The consistent mass matrix of the displacement field.
///
/// Only the displacement block is populated:
/// $$
/// K_{(d,i),(e,j)} = w \rho \, \delta_{de} \, \phi_i \phi_j.
/// $$
/// The pressure carries no inertia, so `B`, `C` and both residuals stay zero. Prescribed
/// displacements do not change in time, hence eliminated degrees of freedom are skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassKernel<T> {
    pub density: T,
}

impl<T: Real> MassKernel<T> {
    pub fn new(density: T) -> Self {
        Self { density }
    }
}

impl<T: Real> ElementKernel<T> for MassKernel<T> {
    fn accumulate_quadrature_point(
        &self,
        point: &QuadraturePoint<T>,
        _coefficients: &ElementCoefficients<T>,
        local: &mut LocalSystem<T>,
    ) -> Result<(), AssemblyError> {
        check_point_dimensions(point, local);
        let n_u = local.num_displacement_nodes();
        let scale = point.weight * self.density;
        let phi = point.displacement_basis;
        for i in 0..n_u {
            for j in i..n_u {
                let m_ij = scale * phi[i] * phi[j];
                for d in 0..local.dim() {
                    local.k[(d * n_u + i, d * n_u + j)] += m_ij;
                }
            }
        }
        Ok(())
    }

    fn elimination(&self) -> Elimination {
        Elimination::Skip
    }
}
