//! Element kernels for Taylor-Hood mixed elasticity.
//!
//! The elasticity kernels produce the blocks of the saddle point system
//!
//! ```text
//! [ K  B^T ] [ u ]   [ r_u ]
//! [ B   C  ] [ p ] = [ r_p ]
//! ```
//!
//! where $p$ is the pressure scaled by $\mu$. The nonlinear kernel computes the residual and the
//! tangent of the mixed energy [`mixed_energy_density`](crate::materials::mixed_energy_density) at
//! the current configuration. The linear kernel is the same system linearized at the undeformed
//! configuration with zero pressure. [`MassKernel`] provides the displacement mass matrix for
//! time integration.
use mixfem::assembly::{LocalSystem, QuadraturePoint};
use mixfem::error::AssemblyError;
use mixfem::nalgebra::try_convert;
use mixfem::Real;

mod linear;
mod mass;
mod nonlinear;

pub use linear::*;
pub use mass::*;
pub use nonlinear::*;

fn check_point_dimensions<T: Real>(point: &QuadraturePoint<T>, local: &LocalSystem<T>) {
    let dim = local.dim();
    let n_u = local.num_displacement_nodes();
    let n_p = local.num_pressure_nodes();
    assert_eq!(point.displacement_basis.len(), n_u, "Displacement basis size mismatch");
    assert_eq!(point.displacement_gradients.shape(), (dim, n_u), "Gradient shape mismatch");
    assert_eq!(point.pressure_basis.len(), n_p, "Pressure basis size mismatch");
    assert_eq!(point.body_force.len(), dim, "Body force dimension mismatch");
}

fn invalid_configuration<T: Real>(point: &QuadraturePoint<T>, determinant: T) -> AssemblyError {
    AssemblyError::InvalidConfiguration {
        element: point.element,
        quadrature_point: point.index,
        determinant: try_convert(determinant).unwrap_or(f64::NAN),
    }
}

/// Adds $w \rho \, t \, f_d \phi_i$ to the displacement residual.
fn accumulate_body_force<T: Real>(point: &QuadraturePoint<T>, scale: T, local: &mut LocalSystem<T>) {
    let n_u = local.num_displacement_nodes();
    for d in 0..local.dim() {
        let f_d = scale * point.body_force[d];
        for (i, &phi_i) in point.displacement_basis.iter().enumerate() {
            local.r_u[d * n_u + i] += f_d * phi_i;
        }
    }
}

/// Adds the near-incompressibility block $-w \frac{\mu^2}{\lambda} \psi_i \psi_j$ to `C` for
/// `i <= j`.
fn accumulate_pressure_penalty<T: Real>(pressure_basis: &[T], scaled_penalty: T, local: &mut LocalSystem<T>) {
    for (i, &psi_i) in pressure_basis.iter().enumerate() {
        for (j, &psi_j) in pressure_basis.iter().enumerate().skip(i) {
            local.c[(i, j)] -= scaled_penalty * psi_i * psi_j;
        }
    }
}
