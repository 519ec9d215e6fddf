use matrixcompare::assert_scalar_eq;
use mixfem::dof::{DofMapperBuilder, Field};
use mixfem::linear_solver::DenseLuSolver;
use mixfem::mesh::procedural::create_unit_square_taylor_hood_mesh_2d;
use mixfem::mesh::{Side, TaylorHoodMesh2d};
use mixfem::nalgebra::Vector2;
use mixfem_solid::materials::{ElasticityParameters, LameParameters};
use mixfem_solid::{solve_linear, MixedElasticityAssembler, NewmarkIntegrator, Traction};

fn clamped_assembler(mesh: &TaylorHoodMesh2d<f64>) -> MixedElasticityAssembler<f64> {
    let left = mesh.side_nodes(Side::Left);
    let mapper = DofMapperBuilder::new(2, mesh.num_displacement_nodes(), mesh.num_pressure_nodes())
        .eliminate_nodes(Field::Displacement(0), &left, 0.0)
        .eliminate_nodes(Field::Displacement(1), &left, 0.0)
        .build()
        .unwrap();
    let parameters = ElasticityParameters::from_lame(LameParameters { mu: 1.0, lambda: 100.0 });
    MixedElasticityAssembler::new(mesh, mapper, parameters)
        .unwrap()
        .with_traction(Traction::new(Side::Right, Vector2::new(1.0, 0.0)))
}

#[test]
fn suddenly_loaded_block_conserves_energy() {
    let mesh = create_unit_square_taylor_hood_mesh_2d(2);
    let assembler = clamped_assembler(&mesh);
    let mapper = assembler.dof_mapper();
    let mut integrator = NewmarkIntegrator::new(&assembler).unwrap();
    assert_eq!(integrator.total_energy(), 0.0);

    let static_solution = solve_linear(&assembler, &mut DenseLuSolver::new()).unwrap();
    let right = mesh.side_nodes(Side::Right);
    let tip = right[right.len() / 2];
    let static_tip = static_solution.displacement()[(0, tip)];
    assert!(static_tip > 0.0);

    let mut max_tip = f64::NEG_INFINITY;
    for _ in 0..200 {
        integrator.step(0.05).unwrap();
        // Starting at rest with zero pressure satisfies the constraint rows, so the total energy
        // stays at its initial value
        assert_scalar_eq!(integrator.total_energy(), 0.0, comp = abs, tol = 1e-9);
        let solution = integrator.solution(mapper);
        max_tip = max_tip.max(solution.displacement()[(0, tip)]);
        for &node in &mesh.side_nodes(Side::Left) {
            assert_eq!(solution.displacement()[(0, node)], 0.0);
            assert_eq!(solution.displacement()[(1, node)], 0.0);
        }
    }
    assert_scalar_eq!(integrator.time(), 10.0, comp = abs, tol = 1e-9);

    // A suddenly applied load overshoots the static response
    assert!(max_tip > static_tip);
    assert!(integrator.kinetic_energy() >= 0.0);
}
