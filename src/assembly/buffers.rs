use crate::assembly::local::{ElementCoefficients, LocalSystem};
use crate::dof::{DofIndex, DofMapper, Field};
use crate::field::MixedSolution;
use crate::Real;
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView, Scalar};

/// The global indices of all degrees of freedom of a single element.
#[derive(Debug, Clone, Copy)]
pub struct ElementDofs<'a> {
    /// Displacement dofs in local order, i.e. entry `c * n_u + i` belongs to component `c` of
    /// element node `i`.
    pub displacement: &'a [DofIndex],
    pub pressure: &'a [DofIndex],
}

/// Scratch storage for element assembly.
///
/// A single buffer is meant to be reused for every element of an assembly pass (one per thread
/// in parallel passes). Every `populate_*` method fully overwrites the data it is responsible
/// for, so no information leaks from one element to the next.
#[derive(Debug, Clone)]
pub struct ElementBuffers<T: Scalar> {
    local: LocalSystem<T>,
    displacement_dofs: Vec<DofIndex>,
    pressure_dofs: Vec<DofIndex>,
    displacement_coefficients: DMatrix<T>,
    pressure_coefficients: DVector<T>,
    physical_gradients: DMatrix<T>,
    geometry_jacobian: DMatrix<T>,
    body_force: DVector<T>,
}

impl<T: Real> Default for ElementBuffers<T> {
    fn default() -> Self {
        Self {
            local: LocalSystem::default(),
            displacement_dofs: Vec::new(),
            pressure_dofs: Vec::new(),
            displacement_coefficients: DMatrix::zeros(0, 0),
            pressure_coefficients: DVector::zeros(0),
            physical_gradients: DMatrix::zeros(0, 0),
            geometry_jacobian: DMatrix::zeros(0, 0),
            body_force: DVector::zeros(0),
        }
    }
}

impl<T: Real> ElementBuffers<T> {
    /// Prepares the buffers for a new element: resolves its degrees of freedom, gathers its
    /// coefficients from the solution and zeroes the local system.
    pub fn prepare_element(
        &mut self,
        mapper: &DofMapper<T>,
        solution: &MixedSolution<T>,
        displacement_nodes: &[usize],
        pressure_nodes: &[usize],
    ) {
        let dim = mapper.dim();
        self.displacement_dofs.clear();
        for component in 0..dim {
            mapper.local_to_global(Field::Displacement(component), displacement_nodes, &mut self.displacement_dofs);
        }
        self.pressure_dofs.clear();
        mapper.local_to_global(Field::Pressure, pressure_nodes, &mut self.pressure_dofs);

        solution.gather_displacement(displacement_nodes, &mut self.displacement_coefficients);
        solution.gather_pressure(pressure_nodes, &mut self.pressure_coefficients);

        self.local
            .reset(dim, displacement_nodes.len(), pressure_nodes.len());
        self.physical_gradients
            .resize_mut(dim, displacement_nodes.len(), T::zero());
        self.geometry_jacobian.resize_mut(dim, dim, T::zero());
        self.body_force.resize_vertically_mut(dim, T::zero());
    }

    pub fn local_system(&self) -> &LocalSystem<T> {
        &self.local
    }

    pub fn dofs(&self) -> ElementDofs {
        ElementDofs {
            displacement: &self.displacement_dofs,
            pressure: &self.pressure_dofs,
        }
    }

    pub fn coefficients(&self) -> ElementCoefficients<T> {
        ElementCoefficients {
            displacement: DMatrixView::from(&self.displacement_coefficients),
            pressure: DVectorView::from(&self.pressure_coefficients),
        }
    }

    /// Splits the buffers into the parts a kernel reads and the local system it writes.
    ///
    /// Returns `(coefficients, physical_gradients, geometry_jacobian, body_force, local)`.
    pub fn split_mut(
        &mut self,
    ) -> (
        ElementCoefficients<T>,
        &mut DMatrix<T>,
        &mut DMatrix<T>,
        &mut DVector<T>,
        &mut LocalSystem<T>,
    ) {
        let coefficients = ElementCoefficients {
            displacement: DMatrixView::from(&self.displacement_coefficients),
            pressure: DVectorView::from(&self.pressure_coefficients),
        };
        (
            coefficients,
            &mut self.physical_gradients,
            &mut self.geometry_jacobian,
            &mut self.body_force,
            &mut self.local,
        )
    }

    /// Clones the local system and element dofs out of the buffers.
    pub fn to_contribution(&self) -> ElementContribution<T> {
        ElementContribution {
            local: self.local.clone(),
            displacement_dofs: self.displacement_dofs.clone(),
            pressure_dofs: self.pressure_dofs.clone(),
        }
    }
}

/// An owned element contribution, ready to be scattered.
#[derive(Debug, Clone)]
pub struct ElementContribution<T: Scalar> {
    pub local: LocalSystem<T>,
    pub displacement_dofs: Vec<DofIndex>,
    pub pressure_dofs: Vec<DofIndex>,
}

impl<T: Scalar> ElementContribution<T> {
    pub fn dofs(&self) -> ElementDofs {
        ElementDofs {
            displacement: &self.displacement_dofs,
            pressure: &self.pressure_dofs,
        }
    }
}
