//! Linear solvers for assembled global systems.
//!
//! Solvers expose the usual three phases of a direct solver: a symbolic analysis that only
//! depends on the sparsity pattern, a numeric factorization, and any number of solves with the
//! factorization. Drivers that repeatedly solve systems with the same pattern call
//! [`analyze`](LinearSolver::analyze) once and [`factorize`](LinearSolver::factorize) per system.
use crate::error::SolveError;
use crate::Real;
use log::debug;
use nalgebra::{DMatrix, DVector, Dyn, Scalar, LU};
use nalgebra_sparse::CsrMatrix;

pub trait LinearSolver<T: Scalar> {
    /// Performs the symbolic analysis of the matrix' sparsity pattern.
    fn analyze(&mut self, matrix: &CsrMatrix<T>) -> Result<(), SolveError>;

    /// Computes the numeric factorization of a matrix with the analyzed sparsity pattern.
    fn factorize(&mut self, matrix: &CsrMatrix<T>) -> Result<(), SolveError>;

    /// Solves the factorized system with the given right-hand side.
    fn solve(&self, rhs: &DVector<T>) -> Result<DVector<T>, SolveError>;
}

impl<T, S> LinearSolver<T> for Box<S>
where
    T: Scalar,
    S: ?Sized + LinearSolver<T>,
{
    fn analyze(&mut self, matrix: &CsrMatrix<T>) -> Result<(), SolveError> {
        (**self).analyze(matrix)
    }

    fn factorize(&mut self, matrix: &CsrMatrix<T>) -> Result<(), SolveError> {
        (**self).factorize(matrix)
    }

    fn solve(&self, rhs: &DVector<T>) -> Result<DVector<T>, SolveError> {
        (**self).solve(rhs)
    }
}

/// The sparsity pattern recorded during analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AnalyzedPattern {
    nrows: usize,
    ncols: usize,
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
}

impl AnalyzedPattern {
    fn of<T>(matrix: &CsrMatrix<T>) -> Self {
        Self {
            nrows: matrix.nrows(),
            ncols: matrix.ncols(),
            row_offsets: matrix.row_offsets().to_vec(),
            col_indices: matrix.col_indices().to_vec(),
        }
    }

    fn matches<T>(&self, matrix: &CsrMatrix<T>) -> bool {
        self.nrows == matrix.nrows()
            && self.ncols == matrix.ncols()
            && self.row_offsets == matrix.row_offsets()
            && self.col_indices == matrix.col_indices()
    }
}

/// A direct solver based on LU decomposition with partial pivoting of the densified matrix.
///
/// Suitable for the moderately sized systems of small meshes and tests. The solver detects
/// singular factorizations (a zero pivot) and non-finite solutions and reports them as
/// [`SolveError::SingularSystem`].
#[derive(Debug, Clone)]
pub struct DenseLuSolver<T: Real> {
    pattern: Option<AnalyzedPattern>,
    lu: Option<LU<T, Dyn, Dyn>>,
}

impl<T: Real> Default for DenseLuSolver<T> {
    fn default() -> Self {
        Self { pattern: None, lu: None }
    }
}

impl<T: Real> DenseLuSolver<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience method that analyzes, factorizes and solves in one go.
    pub fn solve_system(&mut self, matrix: &CsrMatrix<T>, rhs: &DVector<T>) -> Result<DVector<T>, SolveError> {
        self.analyze(matrix)?;
        self.factorize(matrix)?;
        self.solve(rhs)
    }
}

impl<T: Real> LinearSolver<T> for DenseLuSolver<T> {
    fn analyze(&mut self, matrix: &CsrMatrix<T>) -> Result<(), SolveError> {
        if matrix.nrows() != matrix.ncols() {
            return Err(SolveError::DimensionMismatch {
                expected: matrix.nrows(),
                actual: matrix.ncols(),
            });
        }
        debug!(
            "Analyzing sparsity pattern of {}x{} matrix with {} non-zeros",
            matrix.nrows(),
            matrix.ncols(),
            matrix.nnz()
        );
        self.pattern = Some(AnalyzedPattern::of(matrix));
        self.lu = None;
        Ok(())
    }

    fn factorize(&mut self, matrix: &CsrMatrix<T>) -> Result<(), SolveError> {
        let pattern = self.pattern.as_ref().ok_or(SolveError::NotReady)?;
        if !pattern.matches(matrix) {
            return Err(SolveError::PatternMismatch);
        }
        self.lu = None;
        let lu = DMatrix::from(matrix).lu();
        if !lu.is_invertible() {
            return Err(SolveError::SingularSystem {
                dimension: matrix.nrows(),
            });
        }
        self.lu = Some(lu);
        Ok(())
    }

    fn solve(&self, rhs: &DVector<T>) -> Result<DVector<T>, SolveError> {
        let lu = self.lu.as_ref().ok_or(SolveError::NotReady)?;
        let dimension = self.pattern.as_ref().map(|p| p.nrows).unwrap_or(0);
        if rhs.len() != dimension {
            return Err(SolveError::DimensionMismatch {
                expected: dimension,
                actual: rhs.len(),
            });
        }
        let solution = lu
            .solve(rhs)
            .ok_or(SolveError::SingularSystem { dimension })?;
        if solution.iter().all(|x| x.is_finite()) {
            Ok(solution)
        } else {
            Err(SolveError::SingularSystem { dimension })
        }
    }
}
