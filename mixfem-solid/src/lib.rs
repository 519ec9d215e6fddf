//! Mixed displacement-pressure solid mechanics for `mixfem`.
//!
//! Provides element kernels for linear and finite-deformation nearly incompressible elasticity
//! discretized with Taylor-Hood elements, an assembler that drives them over a
//! [`TaylorHoodMesh2d`](mixfem::mesh::TaylorHoodMesh2d), a Newton solver for the resulting
//! nonlinear system and a Newmark integrator for linear elastodynamics.
pub mod assembler;
pub mod config;
pub mod kernels;
pub mod kinematics;
pub mod materials;
pub mod newmark;
pub mod newton;

pub use assembler::*;
pub use kernels::*;
pub use materials::*;
pub use newmark::*;
pub use newton::*;
