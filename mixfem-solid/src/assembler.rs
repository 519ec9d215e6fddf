//! Assembly of mixed elasticity systems on Taylor-Hood meshes.
use crate::kernels::{LinearMixedElasticityKernel, MassKernel, NonlinearMixedElasticityKernel};
use crate::materials::ElasticityParameters;
use crate::newton::NewtonError;
use eyre::eyre;
use itertools::izip;
use log::debug;
use mixfem::assembly::{
    scatter_local_to_global, AssembledSystem, CooSystem, ElementBuffers, ElementContribution, ElementKernel,
    GlobalSystem, QuadraturePoint,
};
use mixfem::dof::{DofIndex, DofMapper, Field};
use mixfem::element::{
    quad4_map_reference_coords, quad4_reference_jacobian, Quad4Element, Quad9Element, ReferenceElement, Segment3Element,
};
use mixfem::error::AssemblyError;
use mixfem::field::MixedSolution;
use mixfem::linear_solver::LinearSolver;
use mixfem::mesh::{Side, TaylorHoodMesh2d};
use mixfem::nalgebra_sparse::CsrMatrix;
use mixfem::nalgebra::{DMatrix, DMatrixView, DMatrixViewMut, DVectorView, Point2, Scalar, Vector2};
use mixfem::quadrature::{gauss, quadrilateral_gauss, QuadraturePair1d, QuadraturePair2d, MAX_GAUSS_POINTS};
use mixfem::Real;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use thread_local::ThreadLocal;

/// A body force per unit mass.
pub struct BodyForce<'a, T: Scalar> {
    function: Box<dyn Fn(&Point2<T>) -> Vector2<T> + Send + Sync + 'a>,
}

impl<'a, T: Real> BodyForce<'a, T> {
    pub fn new(function: impl Fn(&Point2<T>) -> Vector2<T> + Send + Sync + 'a) -> Self {
        Self {
            function: Box::new(function),
        }
    }

    pub fn zero() -> Self {
        Self::constant(Vector2::zeros())
    }

    pub fn constant(force: Vector2<T>) -> Self {
        Self::new(move |_| force)
    }

    pub fn evaluate(&self, x: &Point2<T>) -> Vector2<T> {
        (self.function)(x)
    }
}

impl<'a, T: Scalar> fmt::Debug for BodyForce<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyForce").finish_non_exhaustive()
    }
}

/// A constant surface traction applied to every boundary edge on one side of the mesh.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traction<T: Scalar> {
    pub side: Side,
    pub vector: Vector2<T>,
}

impl<T: Real> Traction<T> {
    pub fn new(side: Side, vector: Vector2<T>) -> Self {
        Self { side, vector }
    }
}

/// Reference basis data at a single quadrature point.
#[derive(Debug, Clone)]
struct ReferenceBasisData<T: Scalar> {
    displacement_basis: Vec<T>,
    displacement_gradients: DMatrix<T>,
    pressure_basis: Vec<T>,
}

fn tabulate_reference_basis<T: Real>(points: &[Point2<T>]) -> Vec<ReferenceBasisData<T>> {
    points
        .iter()
        .map(|xi| {
            let xi = xi.coords.as_slice();
            let mut displacement_basis = vec![T::zero(); 9];
            Quad9Element.populate_basis(&mut displacement_basis, xi);
            let mut pressure_basis = vec![T::zero(); 4];
            Quad4Element.populate_basis(&mut pressure_basis, xi);
            ReferenceBasisData {
                displacement_basis,
                displacement_gradients: Quad9Element.basis_gradients(xi),
                pressure_basis,
            }
        })
        .collect()
}

/// Assembles mixed elasticity systems for Taylor-Hood discretizations of a two-dimensional mesh.
///
/// The reference basis data at the quadrature points is tabulated once on construction.
/// Element scratch buffers are kept per thread and reused across assembly passes.
pub struct MixedElasticityAssembler<'a, T: Real> {
    mesh: &'a TaylorHoodMesh2d<T>,
    dof_mapper: DofMapper<T>,
    parameters: ElasticityParameters<T>,
    body_force: BodyForce<'a, T>,
    tractions: Vec<Traction<T>>,
    quadrature: QuadraturePair2d<T>,
    boundary_quadrature: QuadraturePair1d<T>,
    reference_data: Vec<ReferenceBasisData<T>>,
    workspace: ThreadLocal<RefCell<ElementBuffers<T>>>,
}

impl<'a, T: Real> fmt::Debug for MixedElasticityAssembler<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixedElasticityAssembler")
            .field("num_elements", &self.mesh.num_elements())
            .field("num_free_dofs", &self.dof_mapper.num_free())
            .field("parameters", &self.parameters)
            .field("tractions", &self.tractions)
            .field("quadrature_size", &self.quadrature.0.len())
            .finish()
    }
}

impl<'a, T: Real> MixedElasticityAssembler<'a, T> {
    /// The default number of Gauss points per reference direction.
    pub const DEFAULT_QUADRATURE_POINTS: usize = 3;

    /// Creates an assembler with zero body force, no tractions and the default quadrature.
    ///
    /// Fails if the parameters are invalid or if the mapper does not match the mesh.
    pub fn new(
        mesh: &'a TaylorHoodMesh2d<T>,
        dof_mapper: DofMapper<T>,
        parameters: ElasticityParameters<T>,
    ) -> eyre::Result<Self> {
        parameters.validate()?;
        let expected = (2, mesh.num_displacement_nodes(), mesh.num_pressure_nodes());
        let actual = (
            dof_mapper.dim(),
            dof_mapper.num_nodes(Field::Displacement(0)),
            dof_mapper.num_nodes(Field::Pressure),
        );
        if expected != actual {
            return Err(eyre!(
                "Dof mapper layout (dim, n_u, n_p) = {:?} does not match mesh layout {:?}",
                actual,
                expected
            ));
        }

        let quadrature = quadrilateral_gauss(Self::DEFAULT_QUADRATURE_POINTS);
        let reference_data = tabulate_reference_basis(&quadrature.1);
        Ok(Self {
            mesh,
            dof_mapper,
            parameters,
            body_force: BodyForce::zero(),
            tractions: Vec::new(),
            quadrature,
            boundary_quadrature: gauss(Self::DEFAULT_QUADRATURE_POINTS),
            reference_data,
            workspace: ThreadLocal::new(),
        })
    }

    pub fn with_body_force(self, body_force: BodyForce<'a, T>) -> Self {
        Self { body_force, ..self }
    }

    pub fn with_traction(mut self, traction: Traction<T>) -> Self {
        self.tractions.push(traction);
        self
    }

    /// Uses a Gauss rule with the given number of points per direction.
    pub fn with_quadrature_points(self, points_per_dim: usize) -> eyre::Result<Self> {
        if points_per_dim == 0 || points_per_dim > MAX_GAUSS_POINTS {
            return Err(eyre!(
                "Number of quadrature points per direction must be in [1, {}], got {}",
                MAX_GAUSS_POINTS,
                points_per_dim
            ));
        }
        let quadrature = quadrilateral_gauss(points_per_dim);
        let reference_data = tabulate_reference_basis(&quadrature.1);
        Ok(Self {
            quadrature,
            boundary_quadrature: gauss(points_per_dim),
            reference_data,
            ..self
        })
    }

    pub fn mesh(&self) -> &TaylorHoodMesh2d<T> {
        self.mesh
    }

    pub fn dof_mapper(&self) -> &DofMapper<T> {
        &self.dof_mapper
    }

    pub fn parameters(&self) -> &ElasticityParameters<T> {
        &self.parameters
    }

    pub fn tractions(&self) -> &[Traction<T>] {
        &self.tractions
    }

    /// Computes the local system of a single element into `buffers`.
    ///
    /// On success, the local system and the element dofs are available through
    /// [`ElementBuffers::local_system`] and [`ElementBuffers::dofs`].
    #[allow(non_snake_case)]
    pub fn assemble_element(
        &self,
        kernel: &impl ElementKernel<T>,
        element: usize,
        solution: &MixedSolution<T>,
        buffers: &mut ElementBuffers<T>,
    ) -> Result<(), AssemblyError> {
        buffers.prepare_element(
            &self.dof_mapper,
            solution,
            self.mesh.displacement_nodes(element),
            self.mesh.pressure_nodes(element),
        );
        let corners = self.mesh.element_corners(element);
        let (coefficients, physical_gradients, geometry_jacobian, body_force, local) = buffers.split_mut();

        let (weights, points) = &self.quadrature;
        for (index, (&w, xi, data)) in izip!(weights, points, &self.reference_data).enumerate() {
            let J = quad4_reference_jacobian(&corners, xi);
            let det_J = J.determinant();
            let J_inv_t = J
                .try_inverse()
                .filter(|_| det_J != T::zero())
                .ok_or(AssemblyError::DegenerateGeometry {
                    element,
                    quadrature_point: index,
                })?
                .transpose();
            physical_gradients.copy_from(&(J_inv_t * &data.displacement_gradients));
            geometry_jacobian.copy_from(&J);
            let x = quad4_map_reference_coords(&corners, xi);
            body_force.copy_from(&self.body_force.evaluate(&x));

            let point = QuadraturePoint {
                element,
                index,
                weight: w * det_J.abs(),
                displacement_basis: &data.displacement_basis,
                displacement_reference_gradients: DMatrixView::from(&data.displacement_gradients),
                displacement_gradients: DMatrixView::from(&*physical_gradients),
                pressure_basis: &data.pressure_basis,
                geometry_jacobian: DMatrixView::from(&*geometry_jacobian),
                body_force: DVectorView::from(&*body_force),
            };
            kernel.accumulate_quadrature_point(&point, &coefficients, local)?;
        }
        Ok(())
    }

    /// Adds the consistent nodal loads of all tractions to the right-hand side.
    ///
    /// Loads are only added on free rows.
    pub fn scatter_tractions<S>(&self, sink: &mut S)
    where
        S: ?Sized + GlobalSystem<T>,
    {
        let (weights, points) = &self.boundary_quadrature;
        let mut phi = [T::zero(); 3];
        let mut phi_grad = DMatrix::zeros(1, 3);
        for traction in &self.tractions {
            for edge in self.mesh.boundary_edges_on(traction.side) {
                let vertices = edge.nodes.map(|node| self.mesh.vertices()[node]);
                for (&w, s) in weights.iter().zip(points) {
                    Segment3Element.populate_basis(&mut phi, s.coords.as_slice());
                    Segment3Element.populate_basis_gradients(DMatrixViewMut::from(&mut phi_grad), s.coords.as_slice());
                    let dx_ds = vertices
                        .iter()
                        .enumerate()
                        .fold(Vector2::zeros(), |acc, (k, x_k)| acc + x_k.coords * phi_grad[(0, k)]);
                    let scale = w * dx_ds.norm();
                    for (&node, &phi_k) in edge.nodes.iter().zip(&phi) {
                        for d in 0..2 {
                            if let DofIndex::Free(row) = self.dof_mapper.resolve(Field::Displacement(d), node) {
                                sink.add_rhs_entry(row, scale * traction.vector[d] * phi_k);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Assembles the global system for the given kernel, one element at a time.
    ///
    /// # Panics
    ///
    /// Panics if the layout of `solution` does not match the dof mapper.
    pub fn assemble_with(
        &self,
        kernel: impl ElementKernel<T>,
        solution: &MixedSolution<T>,
    ) -> Result<AssembledSystem<T>, AssemblyError> {
        let mut system = CooSystem::new(self.dof_mapper.num_free());
        let mut buffers = self.workspace.get_or_default().borrow_mut();
        for element in 0..self.mesh.num_elements() {
            self.assemble_element(&kernel, element, solution, &mut buffers)?;
            scatter_local_to_global(
                buffers.local_system(),
                &buffers.dofs(),
                &self.dof_mapper,
                kernel.elimination(),
                &mut system,
            );
        }
        self.scatter_tractions(&mut system);
        debug!(
            "Assembled {} elements into a system with {} free dofs and {} matrix entries",
            self.mesh.num_elements(),
            system.dim(),
            system.matrix().nnz()
        );
        Ok(system.into_assembled())
    }

    /// Assembles the global system for the given kernel, computing element contributions in
    /// parallel.
    ///
    /// Contributions are scattered serially in element order, so the result is identical to
    /// [`assemble_with`](Self::assemble_with). If any element fails, nothing is scattered.
    pub fn par_assemble_with<K>(
        &self,
        kernel: K,
        solution: &MixedSolution<T>,
    ) -> Result<AssembledSystem<T>, AssemblyError>
    where
        K: ElementKernel<T> + Sync,
    {
        let contributions: Vec<ElementContribution<T>> = (0..self.mesh.num_elements())
            .into_par_iter()
            .map(|element| {
                let mut buffers = self.workspace.get_or_default().borrow_mut();
                self.assemble_element(&kernel, element, solution, &mut buffers)?;
                Ok(buffers.to_contribution())
            })
            .collect::<Result<_, AssemblyError>>()?;

        let mut system = CooSystem::new(self.dof_mapper.num_free());
        for contribution in &contributions {
            scatter_local_to_global(
                &contribution.local,
                &contribution.dofs(),
                &self.dof_mapper,
                kernel.elimination(),
                &mut system,
            );
        }
        self.scatter_tractions(&mut system);
        debug!(
            "Assembled {} elements in parallel into a system with {} free dofs and {} matrix entries",
            contributions.len(),
            system.dim(),
            system.matrix().nnz()
        );
        Ok(system.into_assembled())
    }

    /// Assembles the linear mixed elasticity system, with Dirichlet values lifted to the
    /// right-hand side.
    pub fn assemble_linear(&self) -> Result<AssembledSystem<T>, AssemblyError> {
        let solution = MixedSolution::zeros_for(&self.dof_mapper);
        self.par_assemble_with(LinearMixedElasticityKernel::new(self.parameters), &solution)
    }

    /// Assembles the consistent mass matrix of the displacement field, scaled by the density.
    ///
    /// Rows and columns of pressure degrees of freedom only hold zeros.
    pub fn assemble_mass(&self) -> Result<CsrMatrix<T>, AssemblyError> {
        let solution = MixedSolution::zeros_for(&self.dof_mapper);
        let system = self.par_assemble_with(MassKernel::new(self.parameters.density), &solution)?;
        Ok(system.matrix)
    }

    /// Assembles the Newton system of nonlinear mixed elasticity at the given configuration.
    ///
    /// The configuration is expected to already contain the prescribed Dirichlet values.
    pub fn assemble_nonlinear(&self, solution: &MixedSolution<T>) -> Result<AssembledSystem<T>, AssemblyError> {
        self.par_assemble_with(NonlinearMixedElasticityKernel::new(self.parameters), solution)
    }
}

/// Assembles the linear systems consumed by [`MixedNewtonSolver`](crate::newton::MixedNewtonSolver).
pub trait MixedSystemAssembler<T: Scalar> {
    fn dof_mapper(&self) -> &DofMapper<T>;

    /// Assembles the tangent matrix and the residual at the given configuration.
    fn assemble(&self, solution: &MixedSolution<T>) -> Result<AssembledSystem<T>, AssemblyError>;
}

impl<'a, T: Real> MixedSystemAssembler<T> for MixedElasticityAssembler<'a, T> {
    fn dof_mapper(&self) -> &DofMapper<T> {
        &self.dof_mapper
    }

    fn assemble(&self, solution: &MixedSolution<T>) -> Result<AssembledSystem<T>, AssemblyError> {
        self.assemble_nonlinear(solution)
    }
}

/// Solves the linear mixed elasticity problem.
///
/// The returned solution contains the prescribed values in its eliminated coefficients.
pub fn solve_linear<T, S>(
    assembler: &MixedElasticityAssembler<T>,
    linear_solver: &mut S,
) -> Result<MixedSolution<T>, NewtonError>
where
    T: Real,
    S: ?Sized + LinearSolver<T>,
{
    let system = assembler.assemble_linear()?;
    linear_solver.analyze(&system.matrix)?;
    linear_solver.factorize(&system.matrix)?;
    let free_values = linear_solver.solve(&system.rhs)?;
    Ok(MixedSolution::from_free_vector(assembler.dof_mapper(), &free_values))
}
