//! Two-field Taylor-Hood meshes of quadrilaterals.
//!
//! Displacement unknowns live on the nine nodes of a biquadratic quadrilateral, pressure unknowns
//! on its four corners. The two fields are numbered independently: displacement nodes coincide
//! with mesh vertices, while pressure nodes are numbered separately and map back to the vertex
//! they sit on.
use crate::Real;
use eyre::eyre;
use nalgebra::{Point2, Scalar};
use serde::{Deserialize, Serialize};

pub mod procedural;

/// A side of a rectangular domain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

/// A quadratic boundary edge with nodes ordered `[start, end, midpoint]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoundaryEdge {
    pub side: Side,
    pub nodes: [usize; 3],
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaylorHoodMesh2d<T: Scalar> {
    vertices: Vec<Point2<T>>,
    displacement_connectivity: Vec<[usize; 9]>,
    pressure_connectivity: Vec<[usize; 4]>,
    pressure_vertices: Vec<usize>,
    boundary_edges: Vec<BoundaryEdge>,
}

impl<T: Real> TaylorHoodMesh2d<T> {
    /// Constructs a mesh from its parts.
    ///
    /// `pressure_vertices[k]` is the vertex on which pressure node `k` sits. Fails if any
    /// connectivity refers to a node that does not exist, or if the two connectivities do not
    /// describe the same number of elements.
    pub fn from_parts(
        vertices: Vec<Point2<T>>,
        displacement_connectivity: Vec<[usize; 9]>,
        pressure_connectivity: Vec<[usize; 4]>,
        pressure_vertices: Vec<usize>,
        boundary_edges: Vec<BoundaryEdge>,
    ) -> eyre::Result<Self> {
        if displacement_connectivity.len() != pressure_connectivity.len() {
            return Err(eyre!(
                "Displacement connectivity has {} elements, but pressure connectivity has {}",
                displacement_connectivity.len(),
                pressure_connectivity.len()
            ));
        }

        let num_vertices = vertices.len();
        let num_pressure_nodes = pressure_vertices.len();
        let check = |index: usize, bound: usize, what: &str| {
            if index < bound {
                Ok(())
            } else {
                Err(eyre!("{} index {} out of bounds (must be less than {})", what, index, bound))
            }
        };

        for nodes in &displacement_connectivity {
            for &node in nodes {
                check(node, num_vertices, "Displacement node")?;
            }
        }
        for nodes in &pressure_connectivity {
            for &node in nodes {
                check(node, num_pressure_nodes, "Pressure node")?;
            }
        }
        for &vertex in &pressure_vertices {
            check(vertex, num_vertices, "Pressure vertex")?;
        }
        for edge in &boundary_edges {
            for &node in &edge.nodes {
                check(node, num_vertices, "Boundary node")?;
            }
        }

        Ok(Self {
            vertices,
            displacement_connectivity,
            pressure_connectivity,
            pressure_vertices,
            boundary_edges,
        })
    }

    pub fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    pub fn num_elements(&self) -> usize {
        self.displacement_connectivity.len()
    }

    pub fn num_displacement_nodes(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_pressure_nodes(&self) -> usize {
        self.pressure_vertices.len()
    }

    pub fn displacement_nodes(&self, element_index: usize) -> &[usize; 9] {
        &self.displacement_connectivity[element_index]
    }

    pub fn pressure_nodes(&self, element_index: usize) -> &[usize; 4] {
        &self.pressure_connectivity[element_index]
    }

    /// The vertex on which the given pressure node sits.
    pub fn pressure_vertex(&self, pressure_node: usize) -> usize {
        self.pressure_vertices[pressure_node]
    }

    /// The four corners of an element, which define its bilinear geometry map.
    pub fn element_corners(&self, element_index: usize) -> [Point2<T>; 4] {
        let nodes = self.displacement_nodes(element_index);
        [
            self.vertices[nodes[0]],
            self.vertices[nodes[1]],
            self.vertices[nodes[2]],
            self.vertices[nodes[3]],
        ]
    }

    pub fn boundary_edges(&self) -> &[BoundaryEdge] {
        &self.boundary_edges
    }

    pub fn boundary_edges_on(&self, side: Side) -> impl Iterator<Item = &BoundaryEdge> {
        self.boundary_edges
            .iter()
            .filter(move |edge| edge.side == side)
    }

    /// Returns the sorted, unique displacement nodes that lie on the given side.
    pub fn side_nodes(&self, side: Side) -> Vec<usize> {
        let mut nodes: Vec<usize> = self
            .boundary_edges_on(side)
            .flat_map(|edge| edge.nodes)
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }
}
