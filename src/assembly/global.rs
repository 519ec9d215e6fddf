use crate::assembly::buffers::ElementDofs;
use crate::assembly::local::{Elimination, LocalSystem};
use crate::dof::{DofIndex, DofMapper};
use crate::Real;
use nalgebra::{DMatrix, DVector, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Accumulate-add access to a global linear system.
pub trait GlobalSystem<T: Scalar> {
    /// Adds `value` to the matrix entry `(row, col)`.
    fn add_matrix_entry(&mut self, row: usize, col: usize, value: T);

    /// Adds `value` to entry `row` of the right-hand side.
    fn add_rhs_entry(&mut self, row: usize, value: T);
}

/// A global system that collects matrix entries in coordinate format.
///
/// Duplicate entries are summed when the system is converted into an [`AssembledSystem`].
#[derive(Debug, Clone)]
pub struct CooSystem<T: Scalar> {
    matrix: CooMatrix<T>,
    rhs: DVector<T>,
}

impl<T: Real> CooSystem<T> {
    pub fn new(num_free_dofs: usize) -> Self {
        Self {
            matrix: CooMatrix::new(num_free_dofs, num_free_dofs),
            rhs: DVector::zeros(num_free_dofs),
        }
    }

    pub fn dim(&self) -> usize {
        self.rhs.len()
    }

    pub fn matrix(&self) -> &CooMatrix<T> {
        &self.matrix
    }

    pub fn rhs(&self) -> &DVector<T> {
        &self.rhs
    }

    pub fn into_assembled(self) -> AssembledSystem<T> {
        AssembledSystem {
            matrix: CsrMatrix::from(&self.matrix),
            rhs: self.rhs,
        }
    }
}

impl<T: Real> GlobalSystem<T> for CooSystem<T> {
    fn add_matrix_entry(&mut self, row: usize, col: usize, value: T) {
        self.matrix.push(row, col, value);
    }

    fn add_rhs_entry(&mut self, row: usize, value: T) {
        self.rhs[row] += value;
    }
}

/// A dense global system, mostly useful for testing.
impl<T: Real> GlobalSystem<T> for (DMatrix<T>, DVector<T>) {
    fn add_matrix_entry(&mut self, row: usize, col: usize, value: T) {
        self.0[(row, col)] += value;
    }

    fn add_rhs_entry(&mut self, row: usize, value: T) {
        self.1[row] += value;
    }
}

/// A fully assembled global system over the free degrees of freedom.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSystem<T: Scalar> {
    pub matrix: CsrMatrix<T>,
    pub rhs: DVector<T>,
}

impl<T: Real> AssembledSystem<T> {
    pub fn dim(&self) -> usize {
        self.rhs.len()
    }

    /// The largest absolute difference between mirrored matrix entries.
    pub fn symmetry_defect(&self) -> T {
        let mut defect = T::zero();
        for (i, j, &v_ij) in self.matrix.triplet_iter() {
            let v_ji = self
                .matrix
                .get_entry(j, i)
                .map(|entry| entry.into_value())
                .unwrap_or_else(T::zero);
            defect = defect.max((v_ij - v_ji).abs());
        }
        defect
    }
}

/// Accumulates a single (symmetric) matrix entry.
///
/// `value` is the entry at `(row, col)` and, when `mirror` is set, also the entry at `(col, row)`.
fn scatter_entry<T, S>(
    row: DofIndex,
    col: DofIndex,
    value: T,
    mirror: bool,
    mapper: &DofMapper<T>,
    elimination: Elimination,
    sink: &mut S,
) where
    T: Real,
    S: ?Sized + GlobalSystem<T>,
{
    match (row, col) {
        (DofIndex::Free(r), DofIndex::Free(c)) => {
            sink.add_matrix_entry(r, c, value);
            if mirror {
                sink.add_matrix_entry(c, r, value);
            }
        }
        (DofIndex::Free(r), DofIndex::Eliminated(e)) => {
            if elimination == Elimination::Lift {
                sink.add_rhs_entry(r, -value * mapper.eliminated_value(e));
            }
        }
        (DofIndex::Eliminated(e), DofIndex::Free(c)) => {
            if elimination == Elimination::Lift && mirror {
                sink.add_rhs_entry(c, -value * mapper.eliminated_value(e));
            }
        }
        (DofIndex::Eliminated(_), DofIndex::Eliminated(_)) => {}
    }
}

/// Scatters a local system into a global system.
///
/// Residual entries are added to the right-hand side on free rows only. For the symmetric blocks
/// `K` and `C`, only entries that couple basis function `i` to basis function `j` with `i <= j`
/// are read, and in the node-diagonal blocks of `K` (`i == j`) only the entries coupling
/// component `d` to component `e >= d`. The mirrored entry of every off-diagonal entry read is
/// written explicitly. The coupling block `B` is written both below and above the diagonal.
///
/// Entries that involve eliminated degrees of freedom are either dropped or moved to the
/// right-hand side depending on `elimination`.
///
/// # Panics
///
/// Panics if the sizes of `dofs` do not match the local system.
pub fn scatter_local_to_global<T, S>(
    local: &LocalSystem<T>,
    dofs: &ElementDofs,
    mapper: &DofMapper<T>,
    elimination: Elimination,
    sink: &mut S,
) where
    T: Real,
    S: ?Sized + GlobalSystem<T>,
{
    let dim = local.dim();
    let n_u = local.num_displacement_nodes();
    let n_p = local.num_pressure_nodes();
    assert_eq!(dofs.displacement.len(), dim * n_u, "Displacement dof count mismatch");
    assert_eq!(dofs.pressure.len(), n_p, "Pressure dof count mismatch");

    for (a, dof) in dofs.displacement.iter().enumerate() {
        if let DofIndex::Free(row) = *dof {
            sink.add_rhs_entry(row, local.r_u[a]);
        }
    }
    for (a, dof) in dofs.pressure.iter().enumerate() {
        if let DofIndex::Free(row) = *dof {
            sink.add_rhs_entry(row, local.r_p[a]);
        }
    }

    // Displacement-displacement block
    for i in 0..n_u {
        for j in i..n_u {
            for d in 0..dim {
                // Within a node-diagonal block only components dj >= d are read
                let first_component = if i == j { d } else { 0 };
                for dj in first_component..dim {
                    let a = local.displacement_index(d, i);
                    let b = local.displacement_index(dj, j);
                    let value = local.k[(a, b)];
                    scatter_entry(
                        dofs.displacement[a],
                        dofs.displacement[b],
                        value,
                        a != b,
                        mapper,
                        elimination,
                        sink,
                    );
                }
            }
        }
    }

    // Displacement-pressure coupling, stored once as the (p, u) block
    for (a, &u_dof) in dofs.displacement.iter().enumerate() {
        for (jp, &p_dof) in dofs.pressure.iter().enumerate() {
            let value = local.b[(jp, a)];
            scatter_entry(u_dof, p_dof, value, true, mapper, elimination, sink);
        }
    }

    // Pressure-pressure block
    for i in 0..n_p {
        for j in i..n_p {
            let value = local.c[(i, j)];
            scatter_entry(
                dofs.pressure[i],
                dofs.pressure[j],
                value,
                i != j,
                mapper,
                elimination,
                sink,
            );
        }
    }
}
