//! Boundary snapping between adjacent surface patches.
//!
//! Two regions of a CFD domain exported separately from CAD share a curve,
//! but each side is triangulated on its own and the shared rim vertices
//! drift apart by tiny amounts. This crate closes those gaps:
//!
//! - [`PointMatcher`] / [`match_within_tolerance`]: fixed-radius neighbour
//!   search over a KD-tree, nearest first with a deterministic tie-break.
//! - [`snap_boundaries`]: moves the open-boundary vertices of one mesh onto
//!   the open-boundary vertices of another that lie within
//!   [`SnapParams::tolerance`].
//!
//! Only vertex positions change; face lists are never touched.
//!
//! # Example
//!
//! ```
//! use mesh_snap::{SnapParams, snap_boundaries};
//! use mesh_types::IndexedMesh;
//!
//! let bottom = IndexedMesh::from_positions(
//!     &[[0.0, -1.0, 0.0], [1.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
//!     &[[0, 1, 2], [0, 2, 3]],
//! );
//! let mut top = IndexedMesh::from_positions(
//!     &[[2e-5, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
//!     &[[0, 1, 2], [0, 2, 3]],
//! );
//!
//! let report = snap_boundaries(&mut top, &bottom, &SnapParams::default()).unwrap();
//! assert_eq!(report.snapped, 2);
//! assert_eq!(top.vertices[0].position.x, 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod matcher;
mod params;
mod snap;

pub use error::{SnapError, SnapResult};
pub use matcher::{Correspondence, Neighbour, PointMatcher, match_within_tolerance};
pub use params::{DEFAULT_TOLERANCE, SnapParams};
pub use snap::{SnapReport, snap_boundaries, snap_vertices};
