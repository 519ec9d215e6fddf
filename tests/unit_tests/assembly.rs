use matrixcompare::assert_matrix_eq;
use mixfem::assembly::{
    scatter_local_to_global, CooSystem, ElementBuffers, ElementDofs, Elimination, GlobalSystem, LocalSystem,
};
use mixfem::dof::{DofIndex, DofMapper, DofMapperBuilder, Field};
use mixfem::field::MixedSolution;
use mixfem::nalgebra::{dmatrix, dvector, DMatrix, DVector};
use proptest::collection::vec;
use proptest::prelude::*;

/// A one-dimensional element with two displacement nodes and a single pressure node.
///
/// The lower triangle of `K` holds a value that must never reach the global system.
fn small_local_system() -> LocalSystem<f64> {
    let mut local = LocalSystem::zeros(1, 2, 1);
    local.k = dmatrix![1.0, 2.0;
                       99.0, 3.0];
    local.b = dmatrix![4.0, 5.0];
    local.c = dmatrix![6.0];
    local.r_u = dvector![7.0, 8.0];
    local.r_p = dvector![9.0];
    local
}

fn element_dofs(mapper: &DofMapper<f64>) -> (Vec<DofIndex>, Vec<DofIndex>) {
    let mut displacement = Vec::new();
    mapper.local_to_global(Field::Displacement(0), &[0, 1], &mut displacement);
    let mut pressure = Vec::new();
    mapper.local_to_global(Field::Pressure, &[0], &mut pressure);
    (displacement, pressure)
}

fn scatter_dense(local: &LocalSystem<f64>, mapper: &DofMapper<f64>, elimination: Elimination) -> (DMatrix<f64>, DVector<f64>) {
    let (displacement, pressure) = element_dofs(mapper);
    let dofs = ElementDofs {
        displacement: &displacement,
        pressure: &pressure,
    };
    let n = mapper.num_free();
    let mut system = (DMatrix::zeros(n, n), DVector::zeros(n));
    scatter_local_to_global(local, &dofs, mapper, elimination, &mut system);
    system
}

#[test]
fn scatter_without_elimination_mirrors_upper_triangle() {
    let mapper = DofMapper::unconstrained(1, 2, 1).unwrap();
    let local = small_local_system();

    for elimination in [Elimination::Skip, Elimination::Lift] {
        let (matrix, rhs) = scatter_dense(&local, &mapper, elimination);
        let expected_matrix = dmatrix![1.0, 2.0, 4.0;
                                       2.0, 3.0, 5.0;
                                       4.0, 5.0, 6.0];
        assert_eq!(matrix, expected_matrix);
        assert_eq!(rhs, dvector![7.0, 8.0, 9.0]);
    }
}

#[test]
fn scatter_mirrors_component_coupling_within_node() {
    // A single two-dimensional displacement node: the node-diagonal block of K couples its own
    // components, and only the entry above the diagonal may be read
    let mapper = DofMapper::unconstrained(2, 1, 1).unwrap();
    let mut local = LocalSystem::zeros(2, 1, 1);
    local.k = dmatrix![2.0, 1.0;
                       99.0, 3.0];

    let mut displacement = Vec::new();
    mapper.local_to_global(Field::Displacement(0), &[0], &mut displacement);
    mapper.local_to_global(Field::Displacement(1), &[0], &mut displacement);
    let mut pressure = Vec::new();
    mapper.local_to_global(Field::Pressure, &[0], &mut pressure);
    let dofs = ElementDofs {
        displacement: &displacement,
        pressure: &pressure,
    };

    let mut system = (DMatrix::zeros(3, 3), DVector::zeros(3));
    scatter_local_to_global(&local, &dofs, &mapper, Elimination::Skip, &mut system);
    let expected = dmatrix![2.0, 1.0, 0.0;
                            1.0, 3.0, 0.0;
                            0.0, 0.0, 0.0];
    assert_eq!(system.0, expected);
}

#[test]
fn scatter_skip_drops_eliminated_couplings() {
    let mapper = DofMapperBuilder::new(1, 2, 1)
        .eliminate(Field::Displacement(0), 1, 10.0)
        .build()
        .unwrap();
    let (matrix, rhs) = scatter_dense(&small_local_system(), &mapper, Elimination::Skip);
    assert_eq!(matrix, dmatrix![1.0, 4.0; 4.0, 6.0]);
    assert_eq!(rhs, dvector![7.0, 9.0]);
}

#[test]
fn scatter_lift_moves_eliminated_couplings_to_rhs() {
    let mapper = DofMapperBuilder::new(1, 2, 1)
        .eliminate(Field::Displacement(0), 1, 10.0)
        .build()
        .unwrap();
    let (matrix, rhs) = scatter_dense(&small_local_system(), &mapper, Elimination::Lift);
    assert_eq!(matrix, dmatrix![1.0, 4.0; 4.0, 6.0]);
    // 7 - 2 * 10 and 9 - 5 * 10
    assert_eq!(rhs, dvector![-13.0, -41.0]);
}

#[test]
fn coo_system_sums_duplicate_entries() {
    let mut system = CooSystem::new(2);
    system.add_matrix_entry(0, 1, 1.0);
    system.add_matrix_entry(0, 1, 1.0);
    system.add_matrix_entry(1, 0, 2.0);
    system.add_rhs_entry(1, 3.0);
    system.add_rhs_entry(1, -1.0);
    assert_eq!(system.dim(), 2);
    assert_eq!(system.matrix().nnz(), 3);

    let assembled = system.into_assembled();
    assert_eq!(assembled.dim(), 2);
    assert_matrix_eq!(DMatrix::from(&assembled.matrix), dmatrix![0.0, 2.0; 2.0, 0.0]);
    assert_eq!(assembled.rhs, dvector![0.0, 2.0]);
    assert_eq!(assembled.symmetry_defect(), 0.0);

    let mut system = CooSystem::new(2);
    system.add_matrix_entry(0, 1, 1.0);
    system.add_matrix_entry(1, 0, 3.0);
    assert_eq!(system.into_assembled().symmetry_defect(), 2.0);
}

#[test]
fn local_system_reset_zeroes_and_resizes() {
    let mut local = small_local_system();
    local.reset(2, 3, 2);
    assert_eq!(local.dim(), 2);
    assert_eq!(local.num_displacement_nodes(), 3);
    assert_eq!(local.num_pressure_nodes(), 2);
    assert_eq!(local.k, DMatrix::zeros(6, 6));
    assert_eq!(local.b, DMatrix::zeros(2, 6));
    assert_eq!(local.c, DMatrix::zeros(2, 2));
    assert_eq!(local.r_u, DVector::zeros(6));
    assert_eq!(local.r_p, DVector::zeros(2));
    assert_eq!(local.displacement_index(1, 2), 5);
}

#[test]
fn prepare_element_gathers_dofs_and_coefficients() {
    let mapper = DofMapperBuilder::new(2, 3, 2)
        .eliminate(Field::Displacement(0), 1, 5.0)
        .eliminate(Field::Pressure, 0, 2.0)
        .build()
        .unwrap();
    let solution = MixedSolution::from_free_vector(&mapper, &dvector![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);

    let mut buffers = ElementBuffers::default();
    // Make sure stale data does not survive preparation
    buffers.prepare_element(&mapper, &solution, &[0, 1, 2], &[0]);
    buffers.prepare_element(&mapper, &solution, &[2, 1], &[1, 0]);

    use DofIndex::{Eliminated, Free};
    let dofs = buffers.dofs();
    assert_eq!(dofs.displacement, &[Free(1), Eliminated(0), Free(4), Free(3)]);
    assert_eq!(dofs.pressure, &[Free(5), Eliminated(1)]);

    let coefficients = buffers.coefficients();
    assert_matrix_eq!(coefficients.displacement, dmatrix![11.0, 5.0; 14.0, 13.0]);
    assert_matrix_eq!(coefficients.pressure, dvector![15.0, 2.0]);

    let local = buffers.local_system();
    assert_eq!(local.k, DMatrix::zeros(4, 4));
    assert_eq!(local.b, DMatrix::zeros(2, 4));

    let contribution = buffers.to_contribution();
    assert_eq!(contribution.dofs().displacement, dofs.displacement);
    assert_eq!(&contribution.local, local);
}

proptest! {
    #[test]
    fn scattered_matrix_is_symmetric(
        k in vec(-10.0..10.0, 36),
        b in vec(-10.0..10.0, 12),
        c in vec(-10.0..10.0, 4),
        eliminated in vec(any::<bool>(), 8),
        lift in any::<bool>(),
    ) {
        // dim = 2, three displacement nodes and two pressure nodes. The full K and C blocks are
        // random, so their lower triangles are generally inconsistent with the upper ones.
        let mut local = LocalSystem::zeros(2, 3, 2);
        local.k = DMatrix::from_vec(6, 6, k);
        local.b = DMatrix::from_vec(2, 6, b);
        local.c = DMatrix::from_vec(2, 2, c);

        let mut builder = DofMapperBuilder::new(2, 3, 2);
        for (k, &is_eliminated) in eliminated.iter().enumerate() {
            if is_eliminated {
                let (field, node) = match k {
                    0..=2 => (Field::Displacement(0), k),
                    3..=5 => (Field::Displacement(1), k - 3),
                    _ => (Field::Pressure, k - 6),
                };
                builder = builder.eliminate(field, node, 1.0 + k as f64);
            }
        }
        let mapper = builder.build().unwrap();

        let mut displacement = Vec::new();
        mapper.local_to_global(Field::Displacement(0), &[0, 1, 2], &mut displacement);
        mapper.local_to_global(Field::Displacement(1), &[0, 1, 2], &mut displacement);
        let mut pressure = Vec::new();
        mapper.local_to_global(Field::Pressure, &[0, 1], &mut pressure);
        let dofs = ElementDofs { displacement: &displacement, pressure: &pressure };

        let elimination = if lift { Elimination::Lift } else { Elimination::Skip };
        let n = mapper.num_free();
        let mut system = (DMatrix::zeros(n, n), DVector::zeros(n));
        scatter_local_to_global(&local, &dofs, &mapper, elimination, &mut system);

        let (matrix, _) = system;
        prop_assert_eq!(matrix.transpose(), matrix);
    }
}
