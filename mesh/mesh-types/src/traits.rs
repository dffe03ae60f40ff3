//! Traits for mesh types.

use crate::Triangle;

/// Trait for types that provide mesh topology information.
///
/// This trait defines the minimal interface the STL writer needs, so it
/// can work with other mesh representations.
pub trait MeshTopology {
    /// Get the number of vertices.
    fn vertex_count(&self) -> usize;

    /// Get the number of faces (triangles).
    fn face_count(&self) -> usize;

    /// Check if the mesh is empty.
    fn is_empty(&self) -> bool {
        self.vertex_count() == 0 || self.face_count() == 0
    }

    /// Get a triangle by face index with resolved vertex positions.
    ///
    /// Returns `None` if the face index is out of bounds or the face
    /// references a missing vertex.
    fn triangle(&self, face_index: usize) -> Option<Triangle>;
}
