use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use mixfem::nalgebra::{dmatrix, DMatrix, DMatrixView};
use mixfem_solid::kinematics::{
    deformation_gradient, displacement_gradient, displacement_reference_jacobian, InvalidDeformation, Kinematics,
};
use proptest::prelude::*;

#[test]
fn displacement_gradient_accounts_for_geometry_map() {
    // x = (2 xi, eta), u = (0.1 xi + 0.2 eta, 0.3 eta)
    let geometry_jacobian = dmatrix![2.0, 0.0; 0.0, 1.0];
    let du_dxi = dmatrix![0.1, 0.2; 0.0, 0.3];
    let h = displacement_gradient(&DMatrixView::from(&geometry_jacobian), &du_dxi).unwrap();
    // grad u = du_dxi * J^{-1} and H is its transpose
    let grad_u = dmatrix![0.05, 0.2; 0.0, 0.3];
    assert_matrix_eq!(h, grad_u.transpose(), comp = abs, tol = 1e-15);

    let f = deformation_gradient(&h);
    assert_matrix_eq!(f, dmatrix![1.05, 0.2; 0.0, 1.3], comp = abs, tol = 1e-15);

    let singular = DMatrix::<f64>::zeros(2, 2);
    assert!(displacement_gradient(&DMatrixView::from(&singular), &du_dxi).is_none());
}

#[test]
fn displacement_reference_jacobian_sums_nodal_contributions() {
    let coefficients = dmatrix![1.0, 2.0, 3.0;
                                4.0, 5.0, 6.0];
    let gradients = dmatrix![1.0, 0.0, -1.0;
                             0.5, 0.5, 0.0];
    let jacobian =
        displacement_reference_jacobian(&DMatrixView::from(&coefficients), &DMatrixView::from(&gradients));
    assert_matrix_eq!(jacobian, dmatrix![-2.0, 1.5; -2.0, 4.5], comp = abs, tol = 1e-15);
}

#[test]
fn kinematics_of_simple_shear() {
    let f = dmatrix![2.0, 1.0; 0.0, 1.0];
    let kinematics = Kinematics::from_deformation_gradient(f.clone()).unwrap();
    assert_eq!(kinematics.dim(), 2);
    assert_scalar_eq!(kinematics.J, 2.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(kinematics.log_J, 2.0_f64.ln(), comp = abs, tol = 1e-15);
    assert_matrix_eq!(kinematics.F_inv, dmatrix![0.5, -0.5; 0.0, 1.0], comp = abs, tol = 1e-15);
    assert_matrix_eq!(kinematics.F_inv_t, dmatrix![0.5, 0.0; -0.5, 1.0], comp = abs, tol = 1e-15);
    assert_matrix_eq!(&f * &kinematics.F_inv, DMatrix::<f64>::identity(2, 2), comp = abs, tol = 1e-15);
}

proptest! {
    #[test]
    fn non_positive_determinant_is_rejected(
        a in -2.0..2.0, b in -2.0..2.0, c in -2.0..2.0, d in -2.0..2.0
    ) {
        let f = dmatrix![a, b; c, d];
        let det: f64 = a * d - b * c;
        prop_assume!(det.abs() > 1e-8);
        let result = Kinematics::<f64>::from_deformation_gradient(f);
        if det > 0.0 {
            prop_assert!(result.is_ok());
        } else {
            match result {
                Err(InvalidDeformation { determinant }) => {
                    assert_scalar_eq!(determinant, det, comp = abs, tol = 1e-12);
                }
                Ok(_) => prop_assert!(false, "Inverted deformation was accepted"),
            }
        }
    }
}
