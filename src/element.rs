//! Reference elements for Taylor-Hood discretizations on quadrilaterals.
//!
//! All reference elements live on $[-1, 1]^d$. Quadrilateral nodes are ordered with the corners
//! first (counter-clockwise, starting at $(-1, -1)$), followed by the edge midpoints
//! (bottom, right, top, left) and finally the centre node.
use crate::Real;
use nalgebra::{DMatrix, DMatrixViewMut, Matrix2, Point2, Scalar, Vector2};
use numeric_literals::replace_float_literals;

/// A finite element basis defined on a reference domain.
pub trait ReferenceElement<T: Scalar> {
    fn num_nodes(&self) -> usize;

    fn reference_dim(&self) -> usize;

    /// Evaluates all basis functions at the given reference coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `basis_values` does not have length [`num_nodes`](Self::num_nodes) or if `xi`
    /// does not have length [`reference_dim`](Self::reference_dim).
    fn populate_basis(&self, basis_values: &mut [T], xi: &[T]);

    /// Evaluates the gradients of all basis functions with respect to reference coordinates.
    ///
    /// The gradient of basis function `i` is stored in column `i` of the output, which must have
    /// dimensions `reference_dim x num_nodes`.
    fn populate_basis_gradients(&self, gradients: DMatrixViewMut<T>, xi: &[T]);

    /// Convenience method that allocates and returns the basis gradients as a matrix.
    fn basis_gradients(&self, xi: &[T]) -> DMatrix<T>
    where
        T: Real,
    {
        let mut gradients = DMatrix::zeros(self.reference_dim(), self.num_nodes());
        self.populate_basis_gradients(DMatrixViewMut::from(&mut gradients), xi);
        gradients
    }
}

/// Bilinear Lagrange basis on the reference square.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Quad4Element;

/// Biquadratic Lagrange basis on the reference square.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Quad9Element;

/// Quadratic Lagrange basis on the reference segment, with nodes ordered `[-1, 1, 0]`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Segment3Element;

const QUAD4_NODES: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

const QUAD9_NODES: [(f64, f64); 9] = [
    (-1.0, -1.0),
    (1.0, -1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
    (0.0, -1.0),
    (1.0, 0.0),
    (0.0, 1.0),
    (-1.0, 0.0),
    (0.0, 0.0),
];

const SEGMENT3_NODES: [f64; 3] = [-1.0, 1.0, 0.0];

/// One-dimensional quadratic Lagrange polynomial that is one at `alpha` and zero at the two
/// other nodes of `{-1, 0, 1}`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quadratic_phi_1d<T: Real>(alpha: T, xi: T) -> T {
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    let c = 1.0 - alpha2;
    a * xi * xi + b * xi + c
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quadratic_phi_1d_derivative<T: Real>(alpha: T, xi: T) -> T {
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    2.0 * a * xi + b
}

fn convert_node<T: Real>(value: f64) -> T {
    T::from_f64(value).expect("Node coordinate must fit in T")
}

impl<T: Real> ReferenceElement<T> for Quad4Element {
    fn num_nodes(&self) -> usize {
        4
    }

    fn reference_dim(&self) -> usize {
        2
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn populate_basis(&self, basis_values: &mut [T], xi: &[T]) {
        assert_eq!(basis_values.len(), 4);
        assert_eq!(xi.len(), 2);
        for (phi, &(alpha, beta)) in basis_values.iter_mut().zip(&QUAD4_NODES) {
            let (alpha, beta): (T, T) = (convert_node(alpha), convert_node(beta));
            *phi = (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0;
        }
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn populate_basis_gradients(&self, mut gradients: DMatrixViewMut<T>, xi: &[T]) {
        assert_eq!(gradients.nrows(), 2);
        assert_eq!(gradients.ncols(), 4);
        assert_eq!(xi.len(), 2);
        for (i, &(alpha, beta)) in QUAD4_NODES.iter().enumerate() {
            let (alpha, beta): (T, T) = (convert_node(alpha), convert_node(beta));
            gradients[(0, i)] = alpha * (1.0 + beta * xi[1]) / 4.0;
            gradients[(1, i)] = beta * (1.0 + alpha * xi[0]) / 4.0;
        }
    }
}

impl<T: Real> ReferenceElement<T> for Quad9Element {
    fn num_nodes(&self) -> usize {
        9
    }

    fn reference_dim(&self) -> usize {
        2
    }

    fn populate_basis(&self, basis_values: &mut [T], xi: &[T]) {
        assert_eq!(basis_values.len(), 9);
        assert_eq!(xi.len(), 2);
        // The basis is separable: N_{alpha, beta}(x, y) = N_alpha(x) * N_beta(y)
        for (phi, &(alpha, beta)) in basis_values.iter_mut().zip(&QUAD9_NODES) {
            let (alpha, beta): (T, T) = (convert_node(alpha), convert_node(beta));
            *phi = quadratic_phi_1d(alpha, xi[0]) * quadratic_phi_1d(beta, xi[1]);
        }
    }

    fn populate_basis_gradients(&self, mut gradients: DMatrixViewMut<T>, xi: &[T]) {
        assert_eq!(gradients.nrows(), 2);
        assert_eq!(gradients.ncols(), 9);
        assert_eq!(xi.len(), 2);
        for (i, &(alpha, beta)) in QUAD9_NODES.iter().enumerate() {
            let (alpha, beta): (T, T) = (convert_node(alpha), convert_node(beta));
            let (x, y) = (xi[0], xi[1]);
            gradients[(0, i)] = quadratic_phi_1d_derivative(alpha, x) * quadratic_phi_1d(beta, y);
            gradients[(1, i)] = quadratic_phi_1d(alpha, x) * quadratic_phi_1d_derivative(beta, y);
        }
    }
}

impl<T: Real> ReferenceElement<T> for Segment3Element {
    fn num_nodes(&self) -> usize {
        3
    }

    fn reference_dim(&self) -> usize {
        1
    }

    fn populate_basis(&self, basis_values: &mut [T], xi: &[T]) {
        assert_eq!(basis_values.len(), 3);
        assert_eq!(xi.len(), 1);
        for (phi, &alpha) in basis_values.iter_mut().zip(&SEGMENT3_NODES) {
            *phi = quadratic_phi_1d(convert_node(alpha), xi[0]);
        }
    }

    fn populate_basis_gradients(&self, mut gradients: DMatrixViewMut<T>, xi: &[T]) {
        assert_eq!(gradients.nrows(), 1);
        assert_eq!(gradients.ncols(), 3);
        assert_eq!(xi.len(), 1);
        for (i, &alpha) in SEGMENT3_NODES.iter().enumerate() {
            gradients[(0, i)] = quadratic_phi_1d_derivative(convert_node(alpha), xi[0]);
        }
    }
}

/// Maps reference coordinates to physical coordinates with the bilinear map defined by the
/// four corners of a quadrilateral.
pub fn quad4_map_reference_coords<T: Real>(corners: &[Point2<T>; 4], xi: &Point2<T>) -> Point2<T> {
    let mut phi = [T::zero(); 4];
    Quad4Element.populate_basis(&mut phi, xi.coords.as_slice());
    let mut x = Vector2::zeros();
    for (phi_k, x_k) in phi.iter().zip(corners) {
        x += x_k.coords * *phi_k;
    }
    Point2::from(x)
}

/// Computes the Jacobian $\pd{x}{\xi}$ of the bilinear map defined by the four corners of a
/// quadrilateral.
#[allow(non_snake_case)]
pub fn quad4_reference_jacobian<T: Real>(corners: &[Point2<T>; 4], xi: &Point2<T>) -> Matrix2<T> {
    let G = Quad4Element.basis_gradients(xi.coords.as_slice());
    let mut J = Matrix2::zeros();
    for (k, x_k) in corners.iter().enumerate() {
        J.ger(T::one(), &x_k.coords, &Vector2::new(G[(0, k)], G[(1, k)]), T::one());
    }
    J
}
