//! Newton's method for mixed elasticity.
use crate::assembler::MixedSystemAssembler;
use eyre::eyre;
use log::{debug, info, warn};
use mixfem::error::{AssemblyError, SolveError};
use mixfem::field::MixedSolution;
use mixfem::linear_solver::{DenseLuSolver, LinearSolver};
use mixfem::nalgebra::{DMatrix, DVector};
use mixfem::Real;
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fmt::Display;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewtonSettings<T> {
    pub max_iterations: usize,
    /// Relative tolerance applied to both the residual norm and the update norm.
    pub tolerance: T,
}

impl<T: Real> Default for NewtonSettings<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1e-12,
        }
    }
}

impl<T: Real> NewtonSettings<T> {
    pub fn validate(&self) -> eyre::Result<()> {
        if self.max_iterations == 0 {
            return Err(eyre!("Maximum number of Newton iterations must be positive"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > T::zero()) {
            return Err(eyre!("Newton tolerance must be positive and finite, got {:?}", self.tolerance));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NewtonStatus {
    /// No iteration has been performed yet.
    Initialized,
    Iterating,
    Converged,
    /// The iteration budget was exhausted before either convergence criterion was satisfied.
    MaxIterationsExceeded,
    /// An iteration failed with a [`NewtonError`].
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewtonError {
    /// Assembly failed, typically because an element is inverted in the current configuration.
    InvalidConfiguration(AssemblyError),
    /// The linear system could not be solved.
    SingularSystem(SolveError),
}

impl Display for NewtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            &NewtonError::InvalidConfiguration(ref err) => {
                write!(f, "Failed to assemble Newton system. Error: {}", err)
            }
            &NewtonError::SingularSystem(ref err) => {
                write!(f, "Failed to solve Newton system. Error: {}", err)
            }
        }
    }
}

impl Error for NewtonError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NewtonError::InvalidConfiguration(err) => Some(err),
            NewtonError::SingularSystem(err) => Some(err),
        }
    }
}

impl From<AssemblyError> for NewtonError {
    fn from(err: AssemblyError) -> Self {
        NewtonError::InvalidConfiguration(err)
    }
}

impl From<SolveError> for NewtonError {
    fn from(err: SolveError) -> Self {
        NewtonError::SingularSystem(err)
    }
}

/// Norms recorded after a single Newton iteration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord<T> {
    /// One-based iteration number.
    pub iteration: usize,
    /// Norm of the residual the iteration solved for.
    pub residual_norm: T,
    pub update_norm: T,
}

/// Solves nonlinear mixed elasticity problems with full-step Newton iterations.
///
/// The first iteration assembles the system at the initial guess (with Dirichlet values
/// imposed), solves it and *replaces* the free coefficients by the solution of the linear system.
/// Subsequent iterations add the solution of the linear system to the free coefficients.
///
/// The iteration has converged once either the update norm or the residual norm, relative to
/// their values in the first iteration, drops below the tolerance. Exhausting the iteration
/// budget is not an error: [`converged`](Self::converged) returns `false` and the last computed
/// solution remains available.
pub struct MixedNewtonSolver<'a, T, A, S = DenseLuSolver<T>>
where
    T: Real,
    A: ?Sized,
{
    assembler: &'a A,
    linear_solver: S,
    settings: NewtonSettings<T>,
    solution: MixedSolution<T>,
    status: NewtonStatus,
    num_iterations: usize,
    residual_norm: T,
    update_norm: T,
    initial_residual_norm: T,
    initial_update_norm: T,
    history: Vec<IterationRecord<T>>,
}

impl<'a, T, A> MixedNewtonSolver<'a, T, A, DenseLuSolver<T>>
where
    T: Real,
    A: ?Sized + MixedSystemAssembler<T>,
{
    /// Creates a solver with default settings and a dense LU linear solver.
    ///
    /// Fails if the initial fields do not match the layout of the assembler's dof mapper.
    pub fn new(
        assembler: &'a A,
        initial_displacement: DMatrix<T>,
        initial_pressure: DMatrix<T>,
    ) -> eyre::Result<Self> {
        let solution = MixedSolution::from_fields(initial_displacement, initial_pressure)?;
        solution.check_layout(assembler.dof_mapper())?;
        Ok(Self {
            assembler,
            linear_solver: DenseLuSolver::new(),
            settings: NewtonSettings::default(),
            solution,
            status: NewtonStatus::Initialized,
            num_iterations: 0,
            residual_norm: T::zero(),
            update_norm: T::zero(),
            initial_residual_norm: T::zero(),
            initial_update_norm: T::zero(),
            history: Vec::new(),
        })
    }
}

impl<'a, T, A, S> MixedNewtonSolver<'a, T, A, S>
where
    T: Real,
    A: ?Sized + MixedSystemAssembler<T>,
    S: LinearSolver<T>,
{
    /// Replaces the linear solver.
    pub fn with_linear_solver<S2: LinearSolver<T>>(self, linear_solver: S2) -> MixedNewtonSolver<'a, T, A, S2> {
        MixedNewtonSolver {
            assembler: self.assembler,
            linear_solver,
            settings: self.settings,
            solution: self.solution,
            status: self.status,
            num_iterations: self.num_iterations,
            residual_norm: self.residual_norm,
            update_norm: self.update_norm,
            initial_residual_norm: self.initial_residual_norm,
            initial_update_norm: self.initial_update_norm,
            history: self.history,
        }
    }

    pub fn with_settings(mut self, settings: NewtonSettings<T>) -> Self {
        self.settings = settings;
        self
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.settings.max_iterations = max_iterations;
    }

    pub fn set_tolerance(&mut self, tolerance: T) {
        self.settings.tolerance = tolerance;
    }

    pub fn settings(&self) -> &NewtonSettings<T> {
        &self.settings
    }

    /// Runs Newton iterations until convergence or until the iteration budget is exhausted.
    ///
    /// Returns an error if assembly or a linear solve fails. Running out of iterations is not an
    /// error; query [`converged`](Self::converged) or [`status`](Self::status) afterwards.
    pub fn solve(&mut self) -> Result<(), NewtonError> {
        if self.status == NewtonStatus::Converged {
            return Ok(());
        }
        // Also restarts a solver whose first iteration failed, since no baseline exists yet
        if self.num_iterations == 0 {
            self.first_iteration()?;
        }
        while self.status != NewtonStatus::Converged && self.num_iterations < self.settings.max_iterations {
            self.next_iteration()?;
        }

        if self.converged() {
            info!(
                "Newton converged after {} iterations (residue {}, update norm {})",
                self.num_iterations, self.residual_norm, self.update_norm
            );
        } else {
            self.status = NewtonStatus::MaxIterationsExceeded;
            warn!(
                "Newton did not converge within {} iterations (residue {}, update norm {})",
                self.settings.max_iterations, self.residual_norm, self.update_norm
            );
        }
        Ok(())
    }

    /// Performs the first iteration and records the normalization baselines.
    pub fn first_iteration(&mut self) -> Result<(), NewtonError> {
        let result = self.try_first_iteration();
        self.fail_on_error(result)
    }

    /// Performs a subsequent iteration.
    ///
    /// Performs the first iteration instead if no iteration has completed yet.
    pub fn next_iteration(&mut self) -> Result<(), NewtonError> {
        if self.num_iterations == 0 {
            return self.first_iteration();
        }
        let result = self.try_next_iteration();
        self.fail_on_error(result)
    }

    fn fail_on_error(&mut self, result: Result<(), NewtonError>) -> Result<(), NewtonError> {
        if result.is_err() {
            self.status = NewtonStatus::Failed;
        }
        result
    }

    fn try_first_iteration(&mut self) -> Result<(), NewtonError> {
        let assembler = self.assembler;
        let mapper = assembler.dof_mapper();
        let configuration = self.solution.with_eliminated_values(mapper);
        let system = assembler.assemble(&configuration)?;
        self.linear_solver.analyze(&system.matrix)?;
        self.linear_solver.factorize(&system.matrix)?;
        let update = self.linear_solver.solve(&system.rhs)?;

        self.solution = MixedSolution::from_free_vector(mapper, &update);
        self.num_iterations = 1;
        self.record(system.rhs.norm(), update.norm());
        self.initial_residual_norm = self.residual_norm;
        self.initial_update_norm = self.update_norm;
        self.status = NewtonStatus::Iterating;
        self.check_convergence();
        Ok(())
    }

    fn try_next_iteration(&mut self) -> Result<(), NewtonError> {
        let assembler = self.assembler;
        let mapper = assembler.dof_mapper();
        let system = assembler.assemble(&self.solution)?;
        match self.linear_solver.factorize(&system.matrix) {
            Err(SolveError::PatternMismatch) => {
                debug!("Sparsity pattern changed, repeating symbolic analysis");
                self.linear_solver.analyze(&system.matrix)?;
                self.linear_solver.factorize(&system.matrix)?;
            }
            result => result?,
        }
        let update = self.linear_solver.solve(&system.rhs)?;

        self.solution = self.solution.with_update(mapper, &update);
        self.num_iterations += 1;
        self.record(system.rhs.norm(), update.norm());
        self.status = NewtonStatus::Iterating;
        self.check_convergence();
        Ok(())
    }

    fn record(&mut self, residual_norm: T, update_norm: T) {
        self.residual_norm = residual_norm;
        self.update_norm = update_norm;
        debug!(
            "Newton iteration {}: residue {}, update norm {}",
            self.num_iterations, residual_norm, update_norm
        );
        self.history.push(IterationRecord {
            iteration: self.num_iterations,
            residual_norm,
            update_norm,
        });
    }

    fn check_convergence(&mut self) {
        // A zero baseline means the initial guess already solves the system
        let relative = |norm: T, initial: T| {
            if initial == T::zero() {
                T::zero()
            } else {
                (norm / initial).abs()
            }
        };
        let tolerance = self.settings.tolerance;
        if relative(self.update_norm, self.initial_update_norm) < tolerance
            || relative(self.residual_norm, self.initial_residual_norm) < tolerance
        {
            self.status = NewtonStatus::Converged;
        }
    }

    pub fn converged(&self) -> bool {
        self.status == NewtonStatus::Converged
    }

    pub fn status(&self) -> NewtonStatus {
        self.status
    }

    /// The number of linear systems solved so far.
    pub fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    pub fn tolerance(&self) -> T {
        self.settings.tolerance
    }

    /// The norm of the residual assembled in the last iteration.
    pub fn residue(&self) -> T {
        self.residual_norm
    }

    /// The norm of the last update.
    pub fn update_norm(&self) -> T {
        self.update_norm
    }

    pub fn history(&self) -> &[IterationRecord<T>] {
        &self.history
    }

    /// Returns the coefficients of the field with the given index: `0` for displacement and `1`
    /// for pressure.
    ///
    /// # Panics
    ///
    /// Panics if `field_index > 1`.
    pub fn solution(&self, field_index: usize) -> &DMatrix<T> {
        self.solution.field(field_index)
    }

    pub fn current_solution(&self) -> &MixedSolution<T> {
        &self.solution
    }

    pub fn displacement(&self) -> &DMatrix<T> {
        self.solution.displacement()
    }

    pub fn pressure(&self) -> &DMatrix<T> {
        self.solution.pressure()
    }

    /// The free coefficients of the current solution.
    pub fn free_vector(&self) -> DVector<T> {
        self.solution.free_vector(self.assembler.dof_mapper())
    }

    pub fn into_solution(self) -> MixedSolution<T> {
        self.solution
    }
}
