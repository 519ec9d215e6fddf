//! Finite element building blocks for mixed displacement-pressure discretizations.
//!
//! `mixfem` provides the pieces that element kernels for two-field (Taylor-Hood) formulations
//! consume: reference elements and quadrature, a quadrilateral Taylor-Hood mesh, a
//! degree-of-freedom mapper with Dirichlet elimination, solution fields, the element kernel
//! interface with its scratch buffers, symmetric scatter into a global sparse system and linear
//! solvers. The solid mechanics kernels and the Newton driver live in `mixfem-solid`.
use nalgebra::RealField;

pub mod assembly;
pub mod dof;
pub mod element;
pub mod error;
pub mod field;
pub mod linear_solver;
pub mod mesh;
pub mod quadrature;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Scalar types supported by `mixfem`.
///
/// Used as a trait alias for the traits frequently needed by generic `mixfem` routines.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
