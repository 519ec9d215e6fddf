use super::{accumulate_body_force, accumulate_pressure_penalty, check_point_dimensions};
use crate::materials::ElasticityParameters;
use mixfem::assembly::{ElementCoefficients, ElementKernel, Elimination, LocalSystem, QuadraturePoint};
use mixfem::error::AssemblyError;
use mixfem::Real;

/// Linear mixed elasticity in the undeformed configuration.
///
/// The local blocks are
/// $$
/// K_{(d,i),(e,j)} = w \mu \left( \delta_{de} \nabla \phi_i \cdot \nabla \phi_j + \partial_e \phi_i \, \partial_d \phi_j \right), \quad
/// B_{j,(d,i)} = w \mu \, \partial_d \phi_i \, \psi_j, \quad
/// C_{ij} = -w \frac{\mu^2}{\lambda} \psi_i \psi_j,
/// $$
/// and the right-hand side only contains the body force. Eliminated degrees of freedom are
/// lifted to the right-hand side, so the assembled system can be solved directly for the
/// displacement and pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMixedElasticityKernel<T> {
    pub parameters: ElasticityParameters<T>,
}

impl<T: Real> LinearMixedElasticityKernel<T> {
    pub fn new(parameters: ElasticityParameters<T>) -> Self {
        Self { parameters }
    }
}

#[allow(non_snake_case)]
impl<T: Real> ElementKernel<T> for LinearMixedElasticityKernel<T> {
    fn accumulate_quadrature_point(
        &self,
        point: &QuadraturePoint<T>,
        _coefficients: &ElementCoefficients<T>,
        local: &mut LocalSystem<T>,
    ) -> Result<(), AssemblyError> {
        check_point_dimensions(point, local);
        let dim = local.dim();
        let n_u = local.num_displacement_nodes();
        let w = point.weight;
        let mu = self.parameters.lame.mu;
        let G = &point.displacement_gradients;

        for i in 0..n_u {
            for j in i..n_u {
                let g_ij = G.column(i).dot(&G.column(j));
                for d in 0..dim {
                    let first_component = if i == j { d } else { 0 };
                    for e in first_component..dim {
                        let mut value = G[(e, i)] * G[(d, j)];
                        if d == e {
                            value += g_ij;
                        }
                        local.k[(d * n_u + i, e * n_u + j)] += w * mu * value;
                    }
                }
            }
        }

        for (j, &psi_j) in point.pressure_basis.iter().enumerate() {
            for d in 0..dim {
                for i in 0..n_u {
                    local.b[(j, d * n_u + i)] += w * mu * G[(d, i)] * psi_j;
                }
            }
        }

        if let Some(penalty) = self.parameters.lame.penalty_factor() {
            accumulate_pressure_penalty(point.pressure_basis, w * penalty, local);
        }

        let body_force_scale = w * self.parameters.density * self.parameters.time_factor;
        accumulate_body_force(point, body_force_scale, local);
        Ok(())
    }

    fn elimination(&self) -> Elimination {
        Elimination::Lift
    }
}
