//! Error types for assembly and linear solves.
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Failures detected while computing element contributions.
///
/// Any of these aborts the assembly pass before the failing element is scattered, so a global
/// system is never returned in a partially corrupted state.
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyError {
    /// The deformation gradient has a non-positive (or non-finite) determinant, i.e. the element
    /// is inverted or degenerate in the current configuration.
    InvalidConfiguration {
        element: usize,
        quadrature_point: usize,
        determinant: f64,
    },
    /// The Jacobian of the geometry map is singular at a quadrature point.
    DegenerateGeometry { element: usize, quadrature_point: usize },
}

impl Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            &AssemblyError::InvalidConfiguration {
                element,
                quadrature_point,
                determinant,
            } => {
                write!(
                    f,
                    "Invalid configuration in element {} at quadrature point {}: det(F) = {}.",
                    element, quadrature_point, determinant
                )
            }
            &AssemblyError::DegenerateGeometry {
                element,
                quadrature_point,
            } => {
                write!(
                    f,
                    "Singular geometry Jacobian in element {} at quadrature point {}.",
                    element, quadrature_point
                )
            }
        }
    }
}

impl Error for AssemblyError {}

/// Failures reported by a [`LinearSolver`](crate::linear_solver::LinearSolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// The factorization broke down or the solve produced non-finite values.
    SingularSystem { dimension: usize },
    /// The matrix or right-hand side does not have the expected dimensions.
    DimensionMismatch { expected: usize, actual: usize },
    /// The matrix passed to `factorize` does not have the sparsity pattern passed to `analyze`.
    PatternMismatch,
    /// `factorize` or `solve` was called before the required preceding phase.
    NotReady,
}

impl Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            &SolveError::SingularSystem { dimension } => {
                write!(f, "Linear system of dimension {} is singular.", dimension)
            }
            &SolveError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}.", expected, actual)
            }
            &SolveError::PatternMismatch => {
                write!(f, "Sparsity pattern differs from the analyzed pattern.")
            }
            &SolveError::NotReady => {
                write!(f, "Solver phases called out of order.")
            }
        }
    }
}

impl Error for SolveError {}
