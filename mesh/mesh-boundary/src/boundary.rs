//! Boundary vertex and edge extraction.

use mesh_types::IndexedMesh;
use tracing::debug;

use crate::edges::{Edge, EdgeOccurrences};

/// Indices of every vertex lying on an edge used by exactly one face.
///
/// The result is sorted ascending with no duplicates. A closed surface
/// returns an empty vector, as does a mesh with no faces. Vertices not
/// referenced by any face never appear.
///
/// # Example
///
/// ```
/// use mesh_boundary::extract_boundary;
/// use mesh_types::IndexedMesh;
///
/// let tet = IndexedMesh::from_positions(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 1.0, 0.0], [0.5, 0.5, 1.0]],
///     &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
/// );
/// assert!(extract_boundary(&tet).is_empty());
/// ```
#[must_use]
pub fn extract_boundary(mesh: &IndexedMesh) -> Vec<u32> {
    let edges = EdgeOccurrences::build(&mesh.faces);
    let boundary = edges.boundary_vertices();

    debug!(
        faces = mesh.faces.len(),
        edges = edges.edge_count(),
        boundary_edges = edges.boundary_edge_count(),
        boundary_vertices = boundary.len(),
        "Extracted open boundary"
    );
    if edges.non_manifold_edge_count() > 0 {
        debug!(
            non_manifold = edges.non_manifold_edge_count(),
            "Surface has edges shared by more than two faces"
        );
    }

    boundary
}

/// Every edge used by exactly one face, sorted by `(lo, hi)`.
#[must_use]
pub fn boundary_edges(mesh: &IndexedMesh) -> Vec<Edge> {
    let mut edges: Vec<Edge> = EdgeOccurrences::build(&mesh.faces).boundary_edges().collect();
    edges.sort_unstable();
    edges
}
