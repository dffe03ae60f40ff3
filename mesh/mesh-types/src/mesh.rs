//! Indexed triangle mesh.

use crate::{MeshTopology, Triangle, Vertex};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh.
///
/// Stores vertices and faces separately, with faces referencing vertices
/// by index.
///
/// # Invariants
///
/// - Every face index is a valid index into `vertices`
///   (checked by [`IndexedMesh::validate_indices`]).
/// - Position edits never touch `faces`; the face sequence is the mesh
///   topology and is preserved by every operation in this workspace that
///   only moves vertices.
///
/// # Example
///
/// ```
/// use mesh_types::{IndexedMesh, Vertex, MeshTopology};
///
/// let mut mesh = IndexedMesh::new();
/// mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
/// mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
/// mesh.faces.push([0, 1, 2]);
///
/// assert_eq!(mesh.vertex_count(), 3);
/// assert_eq!(mesh.face_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexedMesh {
    /// Vertex data.
    pub vertices: Vec<Vertex>,

    /// Triangle faces as indices into the vertex array.
    pub faces: Vec<[u32; 3]>,
}

/// A face that references a vertex outside the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidFace {
    /// Index of the offending face.
    pub face: usize,
    /// The out-of-range vertex index.
    pub vertex: u32,
    /// Number of vertices in the mesh.
    pub vertex_count: usize,
}

impl IndexedMesh {
    /// Create a new empty mesh.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create a mesh with pre-allocated capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
        }
    }

    /// Create a mesh from vertices and faces.
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, Vertex, MeshTopology};
    ///
    /// let vertices = vec![
    ///     Vertex::from_coords(0.0, 0.0, 0.0),
    ///     Vertex::from_coords(1.0, 0.0, 0.0),
    ///     Vertex::from_coords(0.0, 1.0, 0.0),
    /// ];
    /// let mesh = IndexedMesh::from_parts(vertices, vec![[0, 1, 2]]);
    /// assert_eq!(mesh.face_count(), 1);
    /// ```
    #[inline]
    #[must_use]
    pub const fn from_parts(vertices: Vec<Vertex>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Create a mesh from coordinate triples and faces.
    ///
    /// ```
    /// use mesh_types::{IndexedMesh, MeshTopology};
    ///
    /// let mesh = IndexedMesh::from_positions(
    ///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
    ///     &[[0, 1, 2]],
    /// );
    /// assert_eq!(mesh.vertex_count(), 3);
    /// ```
    #[must_use]
    pub fn from_positions(positions: &[[f64; 3]], faces: &[[u32; 3]]) -> Self {
        Self {
            vertices: positions.iter().copied().map(Vertex::from).collect(),
            faces: faces.to_vec(),
        }
    }

    /// Position of a vertex, if it exists.
    #[inline]
    #[must_use]
    pub fn position(&self, index: u32) -> Option<Point3<f64>> {
        self.vertices.get(index as usize).map(|v| v.position)
    }

    /// Positions of the given vertices, in the given order.
    ///
    /// Indices past the end of the vertex array are skipped; call
    /// [`IndexedMesh::validate_indices`] first when that matters.
    #[must_use]
    pub fn positions_of(&self, indices: &[u32]) -> Vec<Point3<f64>> {
        indices.iter().filter_map(|&i| self.position(i)).collect()
    }

    /// Move a vertex. Returns `false` if the index does not exist.
    ///
    /// Only the position changes; faces are untouched.
    pub fn set_position(&mut self, index: u32, position: Point3<f64>) -> bool {
        match self.vertices.get_mut(index as usize) {
            Some(vertex) => {
                vertex.position = position;
                true
            }
            None => false,
        }
    }

    /// Check that every face references an existing vertex.
    ///
    /// # Errors
    ///
    /// Returns the first face (in face order) with an out-of-range index.
    ///
    /// ```
    /// use mesh_types::IndexedMesh;
    ///
    /// let mesh = IndexedMesh::from_positions(&[[0.0, 0.0, 0.0]], &[[0, 1, 2]]);
    /// let bad = mesh.validate_indices().unwrap_err();
    /// assert_eq!(bad.face, 0);
    /// assert_eq!(bad.vertex, 1);
    /// ```
    pub fn validate_indices(&self) -> Result<(), InvalidFace> {
        let vertex_count = self.vertices.len();
        for (face_idx, face) in self.faces.iter().enumerate() {
            if let Some(&vertex) = face.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(InvalidFace {
                    face: face_idx,
                    vertex,
                    vertex_count,
                });
            }
        }
        Ok(())
    }
}

impl MeshTopology for IndexedMesh {
    #[inline]
    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn triangle(&self, face_index: usize) -> Option<Triangle> {
        let [i0, i1, i2] = *self.faces.get(face_index)?;
        Some(Triangle::new(
            self.position(i0)?,
            self.position(i1)?,
            self.position(i2)?,
        ))
    }
}
