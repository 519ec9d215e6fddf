use super::{accumulate_body_force, accumulate_pressure_penalty, check_point_dimensions, invalid_configuration};
use crate::kinematics::{deformation_gradient, displacement_gradient, displacement_reference_jacobian, Kinematics};
use crate::materials::ElasticityParameters;
use mixfem::assembly::{ElementCoefficients, ElementKernel, Elimination, LocalSystem, QuadraturePoint};
use mixfem::error::AssemblyError;
use mixfem::Real;

/// Finite deformation, nearly incompressible mixed elasticity.
///
/// At every quadrature point the kernel computes $\vec F$, $J = \det \vec F$ and the scaled
/// pressure $p = \sum_k p_k \psi_k$, and accumulates the negative gradient and the Hessian of
/// [`mixed_energy_density`](crate::materials::mixed_energy_density). With
/// $\vec M = \vec F^{-T} \nabla \vec \phi$, the first Piola-Kirchhoff stress
/// $\vec P = \mu (\vec F - \vec F^{-T}) + \mu p \vec F^{-T}$ and $\tilde \mu = \mu - \mu p$:
/// $$
/// \begin{aligned}
/// r^u_{(d,i)} &= - w (\vec P \nabla \phi_i)_d + w \rho t f_d \phi_i, \\\\
/// r^p_i &= - w \mu \log J \, \psi_i + w \frac{\mu^2}{\lambda} p \, \psi_i, \\\\
/// K_{(d,i),(e,j)} &= w \left( \mu \delta_{de} \nabla \phi_i \cdot \nabla \phi_j + \tilde \mu M_{ei} M_{dj} \right), \\\\
/// B_{j,(d,i)} &= w \mu M_{di} \psi_j, \\\\
/// C_{ij} &= - w \frac{\mu^2}{\lambda} \psi_i \psi_j.
/// \end{aligned}
/// $$
///
/// Eliminated degrees of freedom are skipped during scatter: the configuration the kernel is
/// evaluated at already contains the prescribed values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonlinearMixedElasticityKernel<T> {
    pub parameters: ElasticityParameters<T>,
}

impl<T: Real> NonlinearMixedElasticityKernel<T> {
    pub fn new(parameters: ElasticityParameters<T>) -> Self {
        Self { parameters }
    }
}

#[allow(non_snake_case)]
impl<T: Real> ElementKernel<T> for NonlinearMixedElasticityKernel<T> {
    fn accumulate_quadrature_point(
        &self,
        point: &QuadraturePoint<T>,
        coefficients: &ElementCoefficients<T>,
        local: &mut LocalSystem<T>,
    ) -> Result<(), AssemblyError> {
        check_point_dimensions(point, local);
        let dim = local.dim();
        let n_u = local.num_displacement_nodes();
        let w = point.weight;
        let mu = self.parameters.lame.mu;

        let du_dxi = displacement_reference_jacobian(
            &coefficients.displacement,
            &point.displacement_reference_gradients,
        );
        let H = displacement_gradient(&point.geometry_jacobian, &du_dxi).ok_or(AssemblyError::DegenerateGeometry {
            element: point.element,
            quadrature_point: point.index,
        })?;
        let kinematics = Kinematics::from_deformation_gradient(deformation_gradient(&H))
            .map_err(|err| invalid_configuration(point, err.determinant))?;

        let pressure = coefficients
            .pressure
            .iter()
            .zip(point.pressure_basis)
            .fold(T::zero(), |acc, (&p_k, &psi_k)| acc + p_k * psi_k);
        let prex = mu * pressure;
        let muprex = mu - prex;

        let G = &point.displacement_gradients;
        let M = &kinematics.F_inv_t * G;
        let P = (&kinematics.F - &kinematics.F_inv_t) * mu + &kinematics.F_inv_t * prex;
        let PG = &P * G;

        for d in 0..dim {
            for i in 0..n_u {
                local.r_u[d * n_u + i] -= w * PG[(d, i)];
            }
        }

        for i in 0..n_u {
            for j in i..n_u {
                let g_ij = G.column(i).dot(&G.column(j));
                for d in 0..dim {
                    let first_component = if i == j { d } else { 0 };
                    for e in first_component..dim {
                        let mut value = muprex * M[(e, i)] * M[(d, j)];
                        if d == e {
                            value += mu * g_ij;
                        }
                        local.k[(d * n_u + i, e * n_u + j)] += w * value;
                    }
                }
            }
        }

        for (j, &psi_j) in point.pressure_basis.iter().enumerate() {
            for d in 0..dim {
                for i in 0..n_u {
                    local.b[(j, d * n_u + i)] += w * mu * M[(d, i)] * psi_j;
                }
            }
            local.r_p[j] -= w * mu * kinematics.log_J * psi_j;
        }

        if let Some(penalty) = self.parameters.lame.penalty_factor() {
            let scaled_penalty = w * penalty;
            for (j, &psi_j) in point.pressure_basis.iter().enumerate() {
                local.r_p[j] += scaled_penalty * pressure * psi_j;
            }
            accumulate_pressure_penalty(point.pressure_basis, scaled_penalty, local);
        }

        let body_force_scale = w * self.parameters.density * self.parameters.time_factor;
        accumulate_body_force(point, body_force_scale, local);
        Ok(())
    }

    fn elimination(&self) -> Elimination {
        Elimination::Skip
    }
}
