//! Core mesh types for STL preprocessing.
//!
//! This crate provides the foundational types shared by the codec, the
//! boundary extractor and the snapper:
//!
//! - [`Vertex`] - A point in 3D space
//! - [`IndexedMesh`] - A triangle mesh with indexed vertices
//! - [`Triangle`] - A concrete triangle with vertex positions
//!
//! # Units
//!
//! This library is **unit-agnostic**. All coordinates are `f64`. CFD exports
//! are usually in metres, CAD exports often in millimetres; tolerances passed
//! to downstream crates must use the same unit as the mesh.
//!
//! # Topology
//!
//! Faces store indices into the vertex array. Operations in this workspace
//! that move vertices (snapping) never touch the face array, so connectivity
//! and winding survive any number of position edits.
//!
//! # Example
//!
//! ```
//! use mesh_types::{Vertex, IndexedMesh, Point3, MeshTopology};
//!
//! let mut mesh = IndexedMesh::new();
//! mesh.vertices.push(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(1.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(0.5, 1.0, 0.0)));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod mesh;
mod traits;
mod triangle;
mod vertex;

pub use mesh::{IndexedMesh, InvalidFace};
pub use traits::MeshTopology;
pub use triangle::Triangle;
pub use vertex::Vertex;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
