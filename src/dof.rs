//! Mapping of field nodes to global degrees of freedom, with Dirichlet elimination.
//!
//! Every (field, node) pair is either *free*, in which case it owns a row and column of the
//! global system, or *eliminated*, in which case its value is prescribed and it never appears in
//! the global system. Free degrees of freedom are numbered contiguously: all free nodes of
//! displacement component 0, then component 1 and so on, followed by the free pressure nodes.
use crate::Real;
use eyre::eyre;
use nalgebra::Scalar;
use std::collections::BTreeMap;

/// A field of the two-field discretization.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// The given component of the displacement.
    Displacement(usize),
    Pressure,
}

/// The global index associated with a (field, node) pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DofIndex {
    /// Index into the global system.
    Free(usize),
    /// Index into the list of eliminated values.
    Eliminated(usize),
}

impl DofIndex {
    pub fn free(&self) -> Option<usize> {
        match self {
            &DofIndex::Free(index) => Some(index),
            &DofIndex::Eliminated(_) => None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, DofIndex::Free(_))
    }
}

#[derive(Debug, Clone)]
pub struct DofMapperBuilder<T> {
    dim: usize,
    num_displacement_nodes: usize,
    num_pressure_nodes: usize,
    eliminated: BTreeMap<(Field, usize), T>,
}

impl<T: Real> DofMapperBuilder<T> {
    pub fn new(dim: usize, num_displacement_nodes: usize, num_pressure_nodes: usize) -> Self {
        Self {
            dim,
            num_displacement_nodes,
            num_pressure_nodes,
            eliminated: BTreeMap::new(),
        }
    }

    /// Marks the given node of the given field as eliminated with prescribed value.
    ///
    /// Eliminating the same pair twice overwrites the previously prescribed value.
    pub fn eliminate(mut self, field: Field, node: usize, value: T) -> Self {
        self.eliminated.insert((field, node), value);
        self
    }

    /// Eliminates every given node of the given field with the same prescribed value.
    pub fn eliminate_nodes(mut self, field: Field, nodes: &[usize], value: T) -> Self {
        for &node in nodes {
            self.eliminated.insert((field, node), value);
        }
        self
    }

    pub fn build(self) -> eyre::Result<DofMapper<T>> {
        if self.dim == 0 {
            return Err(eyre!("Spatial dimension must be positive"));
        }

        let Self {
            dim,
            num_displacement_nodes,
            num_pressure_nodes,
            eliminated,
        } = self;

        let num_nodes = |field: Field| match field {
            Field::Displacement(_) => num_displacement_nodes,
            Field::Pressure => num_pressure_nodes,
        };

        for &(field, node) in eliminated.keys() {
            if let Field::Displacement(c) = field {
                if c >= dim {
                    return Err(eyre!("Displacement component {} out of bounds for dimension {}", c, dim));
                }
            }
            if node >= num_nodes(field) {
                return Err(eyre!("Node {} out of bounds for field {:?}", node, field));
            }
        }

        let fields: Vec<Field> = (0..dim)
            .map(Field::Displacement)
            .chain(Some(Field::Pressure))
            .collect();

        let mut indices = Vec::with_capacity(fields.len());
        let mut eliminated_values = Vec::with_capacity(eliminated.len());
        let mut num_free = 0;
        for &field in &fields {
            let field_indices: Vec<DofIndex> = (0..num_nodes(field))
                .map(|node| match eliminated.get(&(field, node)) {
                    Some(&value) => {
                        eliminated_values.push(value);
                        DofIndex::Eliminated(eliminated_values.len() - 1)
                    }
                    None => {
                        num_free += 1;
                        DofIndex::Free(num_free - 1)
                    }
                })
                .collect();
            indices.push(field_indices);
        }

        Ok(DofMapper {
            dim,
            indices,
            eliminated_values,
            num_free,
        })
    }
}

/// Resolves (field, node) pairs to global degrees of freedom.
///
/// The mapper is immutable once built, so resolution is a pure function of its inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct DofMapper<T: Scalar> {
    dim: usize,
    // One entry per field: displacement components first, pressure last
    indices: Vec<Vec<DofIndex>>,
    eliminated_values: Vec<T>,
    num_free: usize,
}

impl<T: Real> DofMapper<T> {
    /// A mapper in which no degrees of freedom are eliminated.
    pub fn unconstrained(dim: usize, num_displacement_nodes: usize, num_pressure_nodes: usize) -> eyre::Result<Self> {
        DofMapperBuilder::new(dim, num_displacement_nodes, num_pressure_nodes).build()
    }

    fn field_slot(&self, field: Field) -> usize {
        match field {
            Field::Displacement(c) => {
                assert!(c < self.dim, "Displacement component out of bounds");
                c
            }
            Field::Pressure => self.dim,
        }
    }

    /// The spatial dimension, i.e. the number of displacement components.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The number of free degrees of freedom, i.e. the dimension of the global system.
    pub fn num_free(&self) -> usize {
        self.num_free
    }

    pub fn num_eliminated(&self) -> usize {
        self.eliminated_values.len()
    }

    pub fn num_nodes(&self, field: Field) -> usize {
        self.indices[self.field_slot(field)].len()
    }

    /// Resolves the global index of a single node of a field.
    pub fn resolve(&self, field: Field, node: usize) -> DofIndex {
        self.indices[self.field_slot(field)][node]
    }

    /// Resolves the global indices of all given nodes of a field, appending them to `output`.
    pub fn local_to_global(&self, field: Field, nodes: &[usize], output: &mut Vec<DofIndex>) {
        let field_indices = &self.indices[self.field_slot(field)];
        output.extend(nodes.iter().map(|&node| field_indices[node]));
    }

    /// The prescribed value of an eliminated degree of freedom.
    pub fn eliminated_value(&self, eliminated_index: usize) -> T {
        self.eliminated_values[eliminated_index]
    }

    pub fn eliminated_values(&self) -> &[T] {
        &self.eliminated_values
    }
}
