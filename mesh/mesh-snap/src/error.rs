//! Error types for boundary snapping.

use mesh_types::InvalidFace;
use thiserror::Error;

/// Errors that can occur while matching or snapping vertices.
#[derive(Debug, Error)]
pub enum SnapError {
    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A face references a vertex the mesh does not have.
    #[error(
        "{mesh} mesh: face {face} references vertex {vertex}, but the mesh has {vertex_count} vertices"
    )]
    InvalidIndex {
        /// Which input the face belongs to (`"primary"` or `"reference"`).
        mesh: &'static str,
        /// Index of the offending face.
        face: usize,
        /// The out-of-range vertex index.
        vertex: u32,
        /// Number of vertices in that mesh.
        vertex_count: usize,
    },

    /// A vertex index passed to the snapper is past the end of the mesh.
    #[error("vertex {vertex} out of bounds for mesh with {vertex_count} vertices")]
    VertexOutOfRange {
        /// The invalid vertex index.
        vertex: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
}

impl SnapError {
    pub(crate) fn invalid_index(mesh: &'static str, bad: InvalidFace) -> Self {
        Self::InvalidIndex {
            mesh,
            face: bad.face,
            vertex: bad.vertex,
            vertex_count: bad.vertex_count,
        }
    }
}

/// Result type for snapping operations.
pub type SnapResult<T> = Result<T, SnapError>;
