use matrixcompare::assert_matrix_eq;
use mixfem::error::SolveError;
use mixfem::linear_solver::{DenseLuSolver, LinearSolver};
use mixfem::nalgebra::{dmatrix, dvector, DMatrix};
use mixfem::nalgebra_sparse::CsrMatrix;

fn csr(matrix: DMatrix<f64>) -> CsrMatrix<f64> {
    CsrMatrix::from(&matrix)
}

#[test]
fn dense_lu_solves_spd_system() {
    let matrix = csr(dmatrix![4.0, 1.0, 0.0;
                              1.0, 3.0, 1.0;
                              0.0, 1.0, 2.0]);
    let rhs = dvector![6.0, 10.0, 8.0];

    let mut solver = DenseLuSolver::new();
    let x = solver.solve_system(&matrix, &rhs).unwrap();
    assert_matrix_eq!(x, dvector![1.0, 2.0, 3.0], comp = abs, tol = 1e-12);

    // Refactorizing with the same pattern requires no new analysis
    let scaled = csr(dmatrix![8.0, 2.0, 0.0;
                              2.0, 6.0, 2.0;
                              0.0, 2.0, 4.0]);
    solver.factorize(&scaled).unwrap();
    let x = solver.solve(&rhs).unwrap();
    assert_matrix_eq!(x, dvector![0.5, 1.0, 1.5], comp = abs, tol = 1e-12);
}

#[test]
fn dense_lu_reports_singular_system() {
    let matrix = csr(dmatrix![1.0, 2.0; 2.0, 4.0]);
    let mut solver = DenseLuSolver::new();
    solver.analyze(&matrix).unwrap();
    assert_eq!(
        solver.factorize(&matrix),
        Err(SolveError::SingularSystem { dimension: 2 })
    );
    // A failed factorization leaves nothing to solve with
    assert_eq!(solver.solve(&dvector![1.0, 1.0]), Err(SolveError::NotReady));
}

#[test]
fn dense_lu_enforces_phase_order() {
    let matrix = csr(dmatrix![2.0, 0.0; 0.0, 2.0]);
    let mut solver = DenseLuSolver::new();
    assert_eq!(solver.factorize(&matrix), Err(SolveError::NotReady));
    assert_eq!(solver.solve(&dvector![1.0, 1.0]), Err(SolveError::NotReady));

    solver.analyze(&matrix).unwrap();
    assert_eq!(solver.solve(&dvector![1.0, 1.0]), Err(SolveError::NotReady));
}

#[test]
fn dense_lu_rejects_different_pattern() {
    let diagonal = csr(dmatrix![2.0, 0.0; 0.0, 2.0]);
    let full = csr(dmatrix![2.0, 1.0; 1.0, 2.0]);
    let mut solver = DenseLuSolver::new();
    solver.analyze(&diagonal).unwrap();
    assert_eq!(solver.factorize(&full), Err(SolveError::PatternMismatch));

    solver.analyze(&full).unwrap();
    assert!(solver.factorize(&full).is_ok());
}

#[test]
fn dense_lu_rejects_mismatched_dimensions() {
    let mut solver = DenseLuSolver::new();
    let rectangular = csr(dmatrix![1.0, 2.0, 3.0; 4.0, 5.0, 6.0]);
    assert_eq!(
        solver.analyze(&rectangular),
        Err(SolveError::DimensionMismatch { expected: 2, actual: 3 })
    );

    let matrix = csr(dmatrix![2.0, 0.0; 0.0, 2.0]);
    solver.analyze(&matrix).unwrap();
    solver.factorize(&matrix).unwrap();
    assert_eq!(
        solver.solve(&dvector![1.0, 2.0, 3.0]),
        Err(SolveError::DimensionMismatch { expected: 2, actual: 3 })
    );
}

#[test]
fn boxed_solver_forwards_to_inner_solver() {
    let matrix = csr(dmatrix![2.0, 0.0; 0.0, 4.0]);
    let mut solver: Box<dyn LinearSolver<f64>> = Box::new(DenseLuSolver::new());
    solver.analyze(&matrix).unwrap();
    solver.factorize(&matrix).unwrap();
    let x = solver.solve(&dvector![2.0, 2.0]).unwrap();
    assert_matrix_eq!(x, dvector![1.0, 0.5], comp = abs, tol = 1e-14);
}
