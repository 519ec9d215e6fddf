//! Coefficient storage for the displacement and pressure fields.
use crate::dof::{DofIndex, DofMapper, Field};
use crate::Real;
use eyre::eyre;
use nalgebra::{DMatrix, DVector, DVectorView, Scalar};

/// The coefficients of a two-field (displacement, pressure) solution.
///
/// Displacement coefficients are stored as a `dim x n_u` matrix whose column `i` is the
/// displacement of node `i`. Pressure coefficients are stored as a `1 x n_p` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedSolution<T: Scalar> {
    displacement: DMatrix<T>,
    pressure: DMatrix<T>,
}

impl<T: Real> MixedSolution<T> {
    pub fn zeros(dim: usize, num_displacement_nodes: usize, num_pressure_nodes: usize) -> Self {
        Self {
            displacement: DMatrix::zeros(dim, num_displacement_nodes),
            pressure: DMatrix::zeros(1, num_pressure_nodes),
        }
    }

    /// A zero solution with the layout expected by the given mapper.
    pub fn zeros_for(mapper: &DofMapper<T>) -> Self {
        Self::zeros(
            mapper.dim(),
            mapper.num_nodes(Field::Displacement(0)),
            mapper.num_nodes(Field::Pressure),
        )
    }

    pub fn from_fields(displacement: DMatrix<T>, pressure: DMatrix<T>) -> eyre::Result<Self> {
        if pressure.nrows() != 1 {
            return Err(eyre!("Pressure coefficients must have a single row, got {}", pressure.nrows()));
        }
        Ok(Self { displacement, pressure })
    }

    /// Checks that the coefficient layout matches the given mapper.
    pub fn check_layout(&self, mapper: &DofMapper<T>) -> eyre::Result<()> {
        let expected = (
            mapper.dim(),
            mapper.num_nodes(Field::Displacement(0)),
            mapper.num_nodes(Field::Pressure),
        );
        let actual = (self.displacement.nrows(), self.displacement.ncols(), self.pressure.ncols());
        if expected == actual {
            Ok(())
        } else {
            Err(eyre!(
                "Solution layout (dim, n_u, n_p) = {:?} does not match mapper layout {:?}",
                actual,
                expected
            ))
        }
    }

    pub fn dim(&self) -> usize {
        self.displacement.nrows()
    }

    pub fn displacement(&self) -> &DMatrix<T> {
        &self.displacement
    }

    pub fn pressure(&self) -> &DMatrix<T> {
        &self.pressure
    }

    /// Returns the coefficients of the field with the given index: `0` for displacement and `1`
    /// for pressure.
    ///
    /// # Panics
    ///
    /// Panics if `index > 1`.
    pub fn field(&self, index: usize) -> &DMatrix<T> {
        match index {
            0 => &self.displacement,
            1 => &self.pressure,
            _ => panic!("Field index {} out of bounds: a mixed solution has two fields", index),
        }
    }

    pub fn coefficient(&self, field: Field, node: usize) -> T {
        match field {
            Field::Displacement(c) => self.displacement[(c, node)],
            Field::Pressure => self.pressure[(0, node)],
        }
    }

    fn coefficient_mut(&mut self, field: Field, node: usize) -> &mut T {
        match field {
            Field::Displacement(c) => &mut self.displacement[(c, node)],
            Field::Pressure => &mut self.pressure[(0, node)],
        }
    }

    fn fields(&self) -> impl Iterator<Item = (Field, usize)> {
        let dim = self.dim();
        let n_u = self.displacement.ncols();
        let n_p = self.pressure.ncols();
        (0..dim)
            .flat_map(move |c| (0..n_u).map(move |node| (Field::Displacement(c), node)))
            .chain((0..n_p).map(|node| (Field::Pressure, node)))
    }

    /// Constructs a solution whose free coefficients are taken from `free_values` and whose
    /// eliminated coefficients are set to their prescribed values.
    ///
    /// # Panics
    ///
    /// Panics if the length of `free_values` is not the number of free degrees of freedom.
    pub fn from_free_vector<'a>(mapper: &DofMapper<T>, free_values: impl Into<DVectorView<'a, T>>) -> Self {
        let free_values = free_values.into();
        assert_eq!(free_values.len(), mapper.num_free(), "Free vector dimension mismatch");
        let mut solution = Self::zeros_for(mapper);
        let pairs: Vec<_> = solution.fields().collect();
        for (field, node) in pairs {
            *solution.coefficient_mut(field, node) = match mapper.resolve(field, node) {
                DofIndex::Free(index) => free_values[index],
                DofIndex::Eliminated(index) => mapper.eliminated_value(index),
            };
        }
        solution
    }

    /// Returns a new solution where `update` has been added to every free coefficient.
    ///
    /// Eliminated coefficients are copied unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the length of `update` is not the number of free degrees of freedom, or if the
    /// layout of `self` does not match the mapper.
    pub fn with_update<'a>(&self, mapper: &DofMapper<T>, update: impl Into<DVectorView<'a, T>>) -> Self {
        let update = update.into();
        assert_eq!(update.len(), mapper.num_free(), "Update vector dimension mismatch");
        let mut solution = self.clone();
        for (field, node) in self.fields() {
            if let DofIndex::Free(index) = mapper.resolve(field, node) {
                *solution.coefficient_mut(field, node) += update[index];
            }
        }
        solution
    }

    /// Returns a copy where every eliminated coefficient is set to its prescribed value.
    pub fn with_eliminated_values(&self, mapper: &DofMapper<T>) -> Self {
        let mut solution = self.clone();
        for (field, node) in self.fields() {
            if let DofIndex::Eliminated(index) = mapper.resolve(field, node) {
                *solution.coefficient_mut(field, node) = mapper.eliminated_value(index);
            }
        }
        solution
    }

    /// Extracts the free coefficients into a vector indexed by global degree of freedom.
    pub fn free_vector(&self, mapper: &DofMapper<T>) -> DVector<T> {
        let mut free_values = DVector::zeros(mapper.num_free());
        for (field, node) in self.fields() {
            if let DofIndex::Free(index) = mapper.resolve(field, node) {
                free_values[index] = self.coefficient(field, node);
            }
        }
        free_values
    }

    /// Gathers the displacement coefficients of the given nodes into a `dim x nodes.len()`
    /// matrix.
    pub fn gather_displacement(&self, nodes: &[usize], output: &mut DMatrix<T>) {
        output.resize_mut(self.dim(), nodes.len(), T::zero());
        for (mut column, &node) in output.column_iter_mut().zip(nodes) {
            column.copy_from(&self.displacement.column(node));
        }
    }

    /// Gathers the pressure coefficients of the given nodes.
    pub fn gather_pressure(&self, nodes: &[usize], output: &mut DVector<T>) {
        output.resize_vertically_mut(nodes.len(), T::zero());
        for (value, &node) in output.iter_mut().zip(nodes) {
            *value = self.pressure[(0, node)];
        }
    }
}
