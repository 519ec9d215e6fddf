//! Newmark time integration of linear mixed elastodynamics.
//!
//! The semi-discrete system
//!
//! ```text
//! M a + A x = b
//! ```
//!
//! couples the displacement mass matrix `M` with the linear mixed system `A x = b` over all free
//! degrees of freedom. Pressure degrees of freedom carry no inertia, so their rows are algebraic
//! constraints that every step enforces exactly.
use crate::assembler::MixedElasticityAssembler;
use crate::newton::NewtonError;
use eyre::eyre;
use log::debug;
use mixfem::assembly::AssembledSystem;
use mixfem::dof::{DofMapper, Field};
use mixfem::error::SolveError;
use mixfem::field::MixedSolution;
use mixfem::linear_solver::{DenseLuSolver, LinearSolver};
use mixfem::nalgebra::DVector;
use mixfem::nalgebra_sparse::{CooMatrix, CsrMatrix};
use mixfem::Real;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

/// Parameters of the Newmark family of time integrators.
///
/// The default is the unconditionally stable, energy conserving average acceleration method with
/// $\beta = 1/4$ and $\gamma = 1/2$.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewmarkParameters<T> {
    pub beta: T,
    pub gamma: T,
}

impl<T: Real> Default for NewmarkParameters<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn default() -> Self {
        Self { beta: 0.25, gamma: 0.5 }
    }
}

impl<T: Real> NewmarkParameters<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn validate(&self) -> eyre::Result<()> {
        if !(self.beta > 0.0 && self.beta <= 0.5) {
            return Err(eyre!("Newmark parameter beta must lie in (0, 0.5], got {:?}", self.beta));
        }
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(eyre!("Newmark parameter gamma must lie in (0, 1], got {:?}", self.gamma));
        }
        Ok(())
    }
}

/// Coefficients of a single Newmark step of size `dt`.
#[derive(Debug, Copy, Clone)]
struct StepCoefficients<T> {
    alpha1: T,
    alpha2: T,
    alpha3: T,
    alpha4: T,
    alpha5: T,
    alpha6: T,
}

impl<T: Real> StepCoefficients<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn new(parameters: &NewmarkParameters<T>, dt: T) -> Self {
        let NewmarkParameters { beta, gamma } = *parameters;
        Self {
            alpha1: 1.0 / (beta * dt * dt),
            alpha2: 1.0 / (beta * dt),
            alpha3: (1.0 - 2.0 * beta) / (2.0 * beta),
            alpha4: gamma / (beta * dt),
            alpha5: 1.0 - gamma / beta,
            alpha6: (1.0 - gamma / (2.0 * beta)) * dt,
        }
    }
}

/// The free indices of all pressure degrees of freedom.
pub fn pressure_dofs<T: Real>(mapper: &DofMapper<T>) -> Vec<usize> {
    (0..mapper.num_nodes(Field::Pressure))
        .filter_map(|node| mapper.resolve(Field::Pressure, node).free())
        .collect()
}

/// Integrates `M a + A x = b` in time with the Newmark method.
///
/// The state consists of the free coefficients `x` of all fields together with their first and
/// second time derivatives. The effective matrix `alpha1 M + A` is only refactorized when the step
/// size changes.
///
/// Velocity and acceleration entries of massless degrees of freedom follow the same update
/// formulas as all other entries but never influence the solution.
#[derive(Debug)]
pub struct NewmarkIntegrator<T: Real, S = DenseLuSolver<T>> {
    mass: CsrMatrix<T>,
    system: AssembledSystem<T>,
    massless: Vec<usize>,
    parameters: NewmarkParameters<T>,
    linear_solver: S,
    factorized_step: Option<T>,
    solution: DVector<T>,
    velocity: DVector<T>,
    acceleration: DVector<T>,
    time: T,
    num_steps: usize,
}

impl<T: Real> NewmarkIntegrator<T, DenseLuSolver<T>> {
    /// Creates an integrator for linear mixed elastodynamics that starts at rest in the
    /// undeformed configuration.
    ///
    /// Loads are applied suddenly at time zero.
    pub fn new(assembler: &MixedElasticityAssembler<T>) -> Result<Self, NewtonError> {
        let mass = assembler.assemble_mass()?;
        let system = assembler.assemble_linear()?;
        let massless = pressure_dofs(assembler.dof_mapper());
        Ok(Self::from_systems(mass, system, massless, DenseLuSolver::new())?)
    }
}

impl<T, S> NewmarkIntegrator<T, S>
where
    T: Real,
    S: LinearSolver<T>,
{
    /// Creates an integrator from an assembled mass matrix and linear system, starting at rest at
    /// `x = 0`.
    ///
    /// `massless` lists the degrees of freedom without inertia. Their rows and columns of the mass
    /// matrix must only hold zeros.
    pub fn from_systems(
        mass: CsrMatrix<T>,
        system: AssembledSystem<T>,
        massless: Vec<usize>,
        linear_solver: S,
    ) -> Result<Self, SolveError> {
        let n = system.dim();
        for dimension in [mass.nrows(), mass.ncols(), system.matrix.nrows(), system.matrix.ncols()] {
            if dimension != n {
                return Err(SolveError::DimensionMismatch {
                    expected: n,
                    actual: dimension,
                });
            }
        }
        if let Some(&index) = massless.iter().find(|&&index| index >= n) {
            return Err(SolveError::DimensionMismatch {
                expected: n,
                actual: index + 1,
            });
        }

        let mut integrator = Self {
            mass,
            system,
            massless,
            parameters: NewmarkParameters::default(),
            linear_solver,
            factorized_step: None,
            solution: DVector::zeros(n),
            velocity: DVector::zeros(n),
            acceleration: DVector::zeros(n),
            time: T::zero(),
            num_steps: 0,
        };
        integrator.compute_initial_acceleration()?;
        Ok(integrator)
    }

    /// Fails if the parameters are invalid.
    pub fn with_parameters(mut self, parameters: NewmarkParameters<T>) -> eyre::Result<Self> {
        parameters.validate()?;
        self.parameters = parameters;
        self.factorized_step = None;
        Ok(self)
    }

    /// Replaces the initial solution and velocity and recomputes the initial acceleration.
    ///
    /// If the pressure of the initial state does not satisfy the constraint rows, the first step
    /// projects it onto the constraint.
    pub fn with_initial_state(mut self, solution: DVector<T>, velocity: DVector<T>) -> Result<Self, SolveError> {
        let n = self.system.dim();
        for len in [solution.len(), velocity.len()] {
            if len != n {
                return Err(SolveError::DimensionMismatch { expected: n, actual: len });
            }
        }
        self.solution = solution;
        self.velocity = velocity;
        self.compute_initial_acceleration()?;
        Ok(self)
    }

    /// Solves `M a = b - A x` for the acceleration of all degrees of freedom with inertia.
    fn compute_initial_acceleration(&mut self) -> Result<(), SolveError> {
        let n = self.system.dim();
        let mut coo = CooMatrix::new(n, n);
        for (i, j, &m_ij) in self.mass.triplet_iter() {
            coo.push(i, j, m_ij);
        }
        for &index in &self.massless {
            coo.push(index, index, T::one());
        }
        let matrix = CsrMatrix::from(&coo);

        let mut rhs = &self.system.rhs - &self.system.matrix * &self.solution;
        for &index in &self.massless {
            rhs[index] = T::zero();
        }

        self.factorized_step = None;
        self.linear_solver.analyze(&matrix)?;
        self.linear_solver.factorize(&matrix)?;
        self.acceleration = self.linear_solver.solve(&rhs)?;
        Ok(())
    }

    /// Advances the state by a single step of size `dt`.
    ///
    /// # Panics
    ///
    /// Panics if `dt` is not positive and finite.
    pub fn step(&mut self, dt: T) -> Result<(), SolveError> {
        assert!(dt > T::zero() && dt.is_finite(), "Time step must be positive and finite");
        let c = StepCoefficients::new(&self.parameters, dt);

        if self.factorized_step != Some(dt) {
            self.factorized_step = None;
            let matrix = &(&self.mass * c.alpha1) + &self.system.matrix;
            self.linear_solver.analyze(&matrix)?;
            self.linear_solver.factorize(&matrix)?;
            self.factorized_step = Some(dt);
            debug!("Factorized effective Newmark matrix for step size {}", dt);
        }

        let history = &self.solution * c.alpha1 + &self.velocity * c.alpha2 + &self.acceleration * c.alpha3;
        let rhs = &self.mass * &history + &self.system.rhs;
        let new_solution = self.linear_solver.solve(&rhs)?;

        let increment = &new_solution - &self.solution;
        let new_velocity = &increment * c.alpha4 + &self.velocity * c.alpha5 + &self.acceleration * c.alpha6;
        let new_acceleration = &increment * c.alpha1 - &self.velocity * c.alpha2 - &self.acceleration * c.alpha3;
        self.solution = new_solution;
        self.velocity = new_velocity;
        self.acceleration = new_acceleration;
        self.time += dt;
        self.num_steps += 1;
        debug!("Newmark step {} reached time {}", self.num_steps, self.time);
        Ok(())
    }

    /// The free coefficients of the current solution.
    pub fn solution_vector(&self) -> &DVector<T> {
        &self.solution
    }

    /// The current solution, with the prescribed values of `mapper` in its eliminated coefficients.
    pub fn solution(&self, mapper: &DofMapper<T>) -> MixedSolution<T> {
        MixedSolution::from_free_vector(mapper, &self.solution)
    }

    pub fn velocity(&self) -> &DVector<T> {
        &self.velocity
    }

    pub fn acceleration(&self) -> &DVector<T> {
        &self.acceleration
    }

    pub fn time(&self) -> T {
        self.time
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn parameters(&self) -> &NewmarkParameters<T> {
        &self.parameters
    }

    /// The kinetic energy $\frac{1}{2} v^T M v$.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn kinetic_energy(&self) -> T {
        0.5 * self.velocity.dot(&(&self.mass * &self.velocity))
    }

    /// The total energy $\frac{1}{2} v^T M v + \frac{1}{2} x^T A x - x^T b$.
    ///
    /// For constant loads the average acceleration method conserves this quantity once the
    /// pressure satisfies the constraint rows.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn total_energy(&self) -> T {
        let x = &self.solution;
        let stored = 0.5 * x.dot(&(&self.system.matrix * x));
        self.kinetic_energy() + stored - x.dot(&self.system.rhs)
    }
}
