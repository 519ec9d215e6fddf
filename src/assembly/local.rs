use crate::error::AssemblyError;
use crate::Real;
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView, Scalar};
use serde::{Deserialize, Serialize};

/// Element-local blocks of a two-field saddle point system.
///
/// The local system represents the element contribution to
///
/// ```text
/// [ K  B^T ] [ u ]   [ r_u ]
/// [ B   C  ] [ p ] = [ r_p ]
/// ```
///
/// Local displacement degrees of freedom are numbered component-major, i.e. component `c` of
/// displacement node `i` has local index `c * n_u + i`.
///
/// Kernels only need to fill the entries of `K` and `C` that couple basis function `i` to basis
/// function `j` with `i <= j`, and within the node-diagonal blocks of `K` only the entries that
/// couple component `d` to component `e >= d`. The remaining entries are never read by the
/// scatter, which writes mirrored entries explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalSystem<T: Scalar> {
    dim: usize,
    num_displacement_nodes: usize,
    num_pressure_nodes: usize,
    /// Displacement-displacement block, `dim * n_u` square.
    pub k: DMatrix<T>,
    /// Pressure-displacement block, `n_p x dim * n_u`.
    pub b: DMatrix<T>,
    /// Pressure-pressure block, `n_p` square.
    pub c: DMatrix<T>,
    /// Displacement residual.
    pub r_u: DVector<T>,
    /// Pressure residual.
    pub r_p: DVector<T>,
}

impl<T: Real> Default for LocalSystem<T> {
    fn default() -> Self {
        Self::zeros(0, 0, 0)
    }
}

impl<T: Real> LocalSystem<T> {
    pub fn zeros(dim: usize, num_displacement_nodes: usize, num_pressure_nodes: usize) -> Self {
        let n_u = dim * num_displacement_nodes;
        let n_p = num_pressure_nodes;
        Self {
            dim,
            num_displacement_nodes,
            num_pressure_nodes,
            k: DMatrix::zeros(n_u, n_u),
            b: DMatrix::zeros(n_p, n_u),
            c: DMatrix::zeros(n_p, n_p),
            r_u: DVector::zeros(n_u),
            r_p: DVector::zeros(n_p),
        }
    }

    /// Resizes the system to the given sizes and overwrites every entry with zero.
    pub fn reset(&mut self, dim: usize, num_displacement_nodes: usize, num_pressure_nodes: usize) {
        let n_u = dim * num_displacement_nodes;
        let n_p = num_pressure_nodes;
        self.dim = dim;
        self.num_displacement_nodes = num_displacement_nodes;
        self.num_pressure_nodes = num_pressure_nodes;
        self.k.resize_mut(n_u, n_u, T::zero());
        self.b.resize_mut(n_p, n_u, T::zero());
        self.c.resize_mut(n_p, n_p, T::zero());
        self.r_u.resize_vertically_mut(n_u, T::zero());
        self.r_p.resize_vertically_mut(n_p, T::zero());
        self.k.fill(T::zero());
        self.b.fill(T::zero());
        self.c.fill(T::zero());
        self.r_u.fill(T::zero());
        self.r_p.fill(T::zero());
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_displacement_nodes(&self) -> usize {
        self.num_displacement_nodes
    }

    pub fn num_pressure_nodes(&self) -> usize {
        self.num_pressure_nodes
    }

    /// The local index of component `component` of displacement node `node`.
    pub fn displacement_index(&self, component: usize, node: usize) -> usize {
        component * self.num_displacement_nodes + node
    }
}

/// How eliminated (Dirichlet) degrees of freedom are treated when scattering a local system.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Elimination {
    /// Contributions that involve eliminated degrees of freedom are dropped.
    ///
    /// Appropriate for residual-based kernels evaluated at a configuration that already contains
    /// the prescribed values.
    Skip,
    /// Matrix entries that couple a free row to an eliminated column are moved to the right-hand
    /// side, multiplied by the prescribed value.
    Lift,
}

/// Data available to an element kernel at a single quadrature point.
#[derive(Debug, Clone)]
pub struct QuadraturePoint<'a, T: Scalar> {
    pub element: usize,
    /// Index of the quadrature point within the element.
    pub index: usize,
    /// Quadrature weight multiplied by the measure of the geometry map.
    pub weight: T,
    /// Displacement basis values.
    pub displacement_basis: &'a [T],
    /// Displacement basis gradients with respect to reference coordinates (`dim x n_u`).
    pub displacement_reference_gradients: DMatrixView<'a, T>,
    /// Displacement basis gradients with respect to physical coordinates (`dim x n_u`).
    pub displacement_gradients: DMatrixView<'a, T>,
    /// Pressure basis values.
    pub pressure_basis: &'a [T],
    /// Jacobian of the geometry map $\pd{x}{\xi}$.
    pub geometry_jacobian: DMatrixView<'a, T>,
    /// Body force per unit mass evaluated at the physical position of the point.
    pub body_force: DVectorView<'a, T>,
}

/// Element coefficients of the current solution.
#[derive(Debug, Clone)]
pub struct ElementCoefficients<'a, T: Scalar> {
    /// Displacement coefficients, one column per element displacement node.
    pub displacement: DMatrixView<'a, T>,
    pub pressure: DVectorView<'a, T>,
}

/// A kernel that computes the element-local system one quadrature point at a time.
///
/// Kernels are stateless with respect to elements: all element data is passed in explicitly and
/// all output goes into the provided local system.
pub trait ElementKernel<T: Scalar> {
    /// Adds the contribution of a single quadrature point to the local system.
    fn accumulate_quadrature_point(
        &self,
        point: &QuadraturePoint<T>,
        coefficients: &ElementCoefficients<T>,
        local: &mut LocalSystem<T>,
    ) -> Result<(), AssemblyError>;

    fn elimination(&self) -> Elimination;
}

impl<T, K> ElementKernel<T> for &K
where
    T: Scalar,
    K: ?Sized + ElementKernel<T>,
{
    fn accumulate_quadrature_point(
        &self,
        point: &QuadraturePoint<T>,
        coefficients: &ElementCoefficients<T>,
        local: &mut LocalSystem<T>,
    ) -> Result<(), AssemblyError> {
        (**self).accumulate_quadrature_point(point, coefficients, local)
    }

    fn elimination(&self) -> Elimination {
        (**self).elimination()
    }
}
