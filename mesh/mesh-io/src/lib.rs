//! STL codec for the preprocessing workspace.
//!
//! This crate turns STL files (ASCII or binary) into [`IndexedMesh`](mesh_types::IndexedMesh) values
//! and back:
//!
//! - [`load_stl`] / [`load_stl_from_bytes`] read either encoding, sharing
//!   bit-identical facet corners so edge connectivity is available to the
//!   boundary tools.
//! - [`save_stl`], [`write_stl_ascii`], [`write_stl_binary`] and
//!   [`to_ascii_string`] write meshes back out. ASCII output is the canonical
//!   text encoding consumed by the CFD meshing tools.
//! - [`detect_stl_encoding`] classifies raw bytes without decoding them.
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::{load_stl, save_stl};
//!
//! let mesh = load_stl("part.stl").unwrap();
//! save_stl(&mesh, "part_ascii.stl", false).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod stl;

pub use error::{IoError, IoResult};
pub use stl::{
    StlEncoding, detect_stl_encoding, load_stl, load_stl_from_bytes, save_stl, solid_marker,
    to_ascii_string, write_stl_ascii, write_stl_binary,
};
