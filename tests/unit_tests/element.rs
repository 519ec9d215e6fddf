use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use mixfem::element::{
    quad4_map_reference_coords, quad4_reference_jacobian, Quad4Element, Quad9Element, ReferenceElement, Segment3Element,
};
use mixfem::nalgebra::{DMatrix, Matrix2, Point2};
use proptest::prelude::*;

const QUAD9_NODES: [[f64; 2]; 9] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
    [0.0, -1.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [-1.0, 0.0],
    [0.0, 0.0],
];

fn basis_values(element: &impl ReferenceElement<f64>, xi: &[f64]) -> Vec<f64> {
    let mut values = vec![0.0; element.num_nodes()];
    element.populate_basis(&mut values, xi);
    values
}

/// Approximates the reference gradients of all basis functions with central differences.
fn finite_difference_gradients(element: &impl ReferenceElement<f64>, xi: &[f64]) -> DMatrix<f64> {
    let h = 1e-6;
    let mut gradients = DMatrix::zeros(element.reference_dim(), element.num_nodes());
    for d in 0..element.reference_dim() {
        let mut xi_plus = xi.to_vec();
        let mut xi_minus = xi.to_vec();
        xi_plus[d] += h;
        xi_minus[d] -= h;
        let plus = basis_values(element, &xi_plus);
        let minus = basis_values(element, &xi_minus);
        for i in 0..element.num_nodes() {
            gradients[(d, i)] = (plus[i] - minus[i]) / (2.0 * h);
        }
    }
    gradients
}

#[test]
fn quad9_basis_is_nodal() {
    for (i, node) in QUAD9_NODES.iter().enumerate() {
        let values = basis_values(&Quad9Element, node);
        for (j, value) in values.iter().enumerate() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_scalar_eq!(*value, expected, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn quad4_basis_is_nodal() {
    for (i, node) in QUAD9_NODES.iter().take(4).enumerate() {
        let values = basis_values(&Quad4Element, node);
        for (j, value) in values.iter().enumerate() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_scalar_eq!(*value, expected, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn segment3_basis_is_nodal() {
    let nodes = [-1.0, 1.0, 0.0];
    for (i, node) in nodes.iter().enumerate() {
        let values = basis_values(&Segment3Element, &[*node]);
        for (j, value) in values.iter().enumerate() {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_scalar_eq!(*value, expected, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn quad4_reference_jacobian_of_axis_aligned_rectangle() {
    let corners = [
        Point2::new(0.0, 0.0),
        Point2::new(2.0, 0.0),
        Point2::new(2.0, 1.0),
        Point2::new(0.0, 1.0),
    ];
    let xi = Point2::new(0.3, -0.7);
    let jacobian = quad4_reference_jacobian(&corners, &xi);
    assert_matrix_eq!(jacobian, Matrix2::new(1.0, 0.0, 0.0, 0.5), comp = abs, tol = 1e-14);

    let centre = quad4_map_reference_coords(&corners, &Point2::origin());
    assert_matrix_eq!(centre.coords, Point2::new(1.0, 0.5).coords, comp = abs, tol = 1e-14);

    for (corner, node) in corners.iter().zip(&QUAD9_NODES) {
        let x = quad4_map_reference_coords(&corners, &Point2::new(node[0], node[1]));
        assert_matrix_eq!(x.coords, corner.coords, comp = abs, tol = 1e-14);
    }
}

proptest! {
    #[test]
    fn quad9_partition_of_unity(x in -1.0..=1.0, y in -1.0..=1.0) {
        let xi = [x, y];
        let sum: f64 = basis_values(&Quad9Element, &xi).iter().sum();
        assert_scalar_eq!(sum, 1.0, comp = abs, tol = 1e-12);

        let gradients = Quad9Element.basis_gradients(&xi);
        for d in 0..2 {
            assert_scalar_eq!(gradients.row(d).sum(), 0.0, comp = abs, tol = 1e-12);
        }
    }

    #[test]
    fn quad9_gradients_match_finite_differences(x in -1.0..=1.0, y in -1.0..=1.0) {
        let xi = [x, y];
        let gradients = Quad9Element.basis_gradients(&xi);
        let approx = finite_difference_gradients(&Quad9Element, &xi);
        assert_matrix_eq!(gradients, approx, comp = abs, tol = 1e-7);
    }

    #[test]
    fn quad4_gradients_match_finite_differences(x in -1.0..=1.0, y in -1.0..=1.0) {
        let xi = [x, y];
        let gradients = Quad4Element.basis_gradients(&xi);
        let approx = finite_difference_gradients(&Quad4Element, &xi);
        assert_matrix_eq!(gradients, approx, comp = abs, tol = 1e-7);
    }

    #[test]
    fn segment3_gradients_match_finite_differences(s in -1.0..=1.0) {
        let gradients = Segment3Element.basis_gradients(&[s]);
        let approx = finite_difference_gradients(&Segment3Element, &[s]);
        assert_matrix_eq!(gradients, approx, comp = abs, tol = 1e-7);
    }
}
