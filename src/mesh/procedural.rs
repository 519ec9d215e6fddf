//! Basic procedural mesh generation routines.
use crate::mesh::{BoundaryEdge, Side, TaylorHoodMesh2d};
use crate::Real;
use nalgebra::Point2;

pub fn create_unit_square_taylor_hood_mesh_2d<T: Real>(cells_per_dim: usize) -> TaylorHoodMesh2d<T> {
    create_rectangular_taylor_hood_mesh_2d(T::one(), T::one(), cells_per_dim, cells_per_dim)
}

/// Generates a uniform Taylor-Hood mesh of the axis-aligned rectangle $[0, w] \times [0, h]$
/// with `cells_x * cells_y` elements.
///
/// # Panics
///
/// Panics if either cell count is zero.
pub fn create_rectangular_taylor_hood_mesh_2d<T: Real>(
    width: T,
    height: T,
    cells_x: usize,
    cells_y: usize,
) -> TaylorHoodMesh2d<T> {
    assert!(cells_x > 0 && cells_y > 0, "Cell counts must be positive");

    // The displacement nodes form a grid with twice the resolution of the cells
    let nodes_x = 2 * cells_x + 1;
    let nodes_y = 2 * cells_y + 1;
    let vertex = |i: usize, j: usize| nodes_x * j + i;
    let pressure_node = |i: usize, j: usize| (cells_x + 1) * j + i;

    let to_t = |n: usize| T::from_usize(n).expect("Must be able to fit usize in T");
    let dx = width / to_t(nodes_x - 1);
    let dy = height / to_t(nodes_y - 1);

    let mut vertices = Vec::with_capacity(nodes_x * nodes_y);
    for j in 0..nodes_y {
        for i in 0..nodes_x {
            vertices.push(Point2::new(to_t(i) * dx, to_t(j) * dy));
        }
    }

    let mut displacement_connectivity = Vec::with_capacity(cells_x * cells_y);
    let mut pressure_connectivity = Vec::with_capacity(cells_x * cells_y);
    for j in 0..cells_y {
        for i in 0..cells_x {
            let (x0, y0) = (2 * i, 2 * j);
            displacement_connectivity.push([
                vertex(x0, y0),
                vertex(x0 + 2, y0),
                vertex(x0 + 2, y0 + 2),
                vertex(x0, y0 + 2),
                vertex(x0 + 1, y0),
                vertex(x0 + 2, y0 + 1),
                vertex(x0 + 1, y0 + 2),
                vertex(x0, y0 + 1),
                vertex(x0 + 1, y0 + 1),
            ]);
            pressure_connectivity.push([
                pressure_node(i, j),
                pressure_node(i + 1, j),
                pressure_node(i + 1, j + 1),
                pressure_node(i, j + 1),
            ]);
        }
    }

    let mut pressure_vertices = Vec::with_capacity((cells_x + 1) * (cells_y + 1));
    for j in 0..=cells_y {
        for i in 0..=cells_x {
            pressure_vertices.push(vertex(2 * i, 2 * j));
        }
    }

    let mut boundary_edges = Vec::with_capacity(2 * (cells_x + cells_y));
    for i in 0..cells_x {
        let x0 = 2 * i;
        boundary_edges.push(BoundaryEdge {
            side: Side::Bottom,
            nodes: [vertex(x0, 0), vertex(x0 + 2, 0), vertex(x0 + 1, 0)],
        });
        boundary_edges.push(BoundaryEdge {
            side: Side::Top,
            nodes: [
                vertex(x0, nodes_y - 1),
                vertex(x0 + 2, nodes_y - 1),
                vertex(x0 + 1, nodes_y - 1),
            ],
        });
    }
    for j in 0..cells_y {
        let y0 = 2 * j;
        boundary_edges.push(BoundaryEdge {
            side: Side::Left,
            nodes: [vertex(0, y0), vertex(0, y0 + 2), vertex(0, y0 + 1)],
        });
        boundary_edges.push(BoundaryEdge {
            side: Side::Right,
            nodes: [
                vertex(nodes_x - 1, y0),
                vertex(nodes_x - 1, y0 + 2),
                vertex(nodes_x - 1, y0 + 1),
            ],
        });
    }

    TaylorHoodMesh2d {
        vertices,
        displacement_connectivity,
        pressure_connectivity,
        pressure_vertices,
        boundary_edges,
    }
}
