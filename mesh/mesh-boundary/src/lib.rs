//! Open-boundary detection for triangle surface patches.
//!
//! A CAD export of one region of a CFD domain is an open surface. Its rim is
//! made of *boundary edges*, edges used by exactly one triangle. This crate
//! counts edge usage over the face list and reports the vertices on those
//! edges:
//!
//! - [`EdgeOccurrences`] is the undirected edge usage map.
//! - [`extract_boundary`] returns the sorted, de-duplicated rim vertex indices.
//! - [`boundary_edges`] returns the rim edges themselves.
//!
//! Connectivity is purely index based. Two facets only share an edge when
//! their corners were shared on load, which the STL reader in `mesh-io` does
//! for bit-identical coordinates.
//!
//! # Example
//!
//! ```
//! use mesh_boundary::extract_boundary;
//! use mesh_types::IndexedMesh;
//!
//! // Two triangles forming a unit square: every vertex is on the rim.
//! let mesh = IndexedMesh::from_positions(
//!     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
//!     &[[0, 1, 2], [0, 2, 3]],
//! );
//! assert_eq!(extract_boundary(&mesh), vec![0, 1, 2, 3]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod boundary;
mod edges;

pub use boundary::{boundary_edges, extract_boundary};
pub use edges::{Edge, EdgeOccurrences};
