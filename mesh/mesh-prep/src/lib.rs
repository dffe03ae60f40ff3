//! File-level STL preprocessing for CFD meshing.
//!
//! CAD tools export each region of a flow domain as its own STL file. Before
//! OpenFOAM's `snappyHexMesh` can use them, they need three things done,
//! each a method on [`Preprocessor`]:
//!
//! - [`Preprocessor::normalize_to_ascii`]: rewrite binary STL as ASCII.
//! - [`Preprocessor::snap_files`]: close hairline gaps between two
//!   neighbouring patches by snapping one patch's open boundary onto the
//!   other's.
//! - [`Preprocessor::merge_regions`]: combine named patches into one
//!   multi-`solid` file.
//!
//! Every written file is passed to a [`SurfaceValidator`] (by default
//! OpenFOAM's `surfaceCheck`). The verdict is logged and returned in the
//! report; it never fails the operation. [`preflight`] reports whether the
//! validator and the OpenFOAM environment are available.
//!
//! # Example
//!
//! ```no_run
//! use mesh_prep::{Preprocessor, Region};
//! use mesh_snap::SnapParams;
//!
//! let prep = Preprocessor::default();
//! prep.normalize_to_ascii("bottom.stl", None)?;
//! prep.snap_files("top.stl", "bottom.stl", "top.stl", &SnapParams::default())?;
//! prep.merge_region_list(
//!     &[Region::new("top", "top.stl"), Region::new("bottom", "bottom.stl")],
//!     "domain.stl",
//! )?;
//! # Ok::<(), mesh_prep::PrepError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod normalize;
mod preflight;
mod preprocessor;
mod regions;
mod snapping;
mod validate;

pub use error::{PrepError, PrepResult};
pub use normalize::NormalizeReport;
pub use preflight::{Diagnostic, OPENFOAM_ENV_VAR, PreflightConfig, Severity, preflight};
pub use preprocessor::{Preprocessor, PreprocessorOptions};
pub use regions::{MergeReport, Region};
pub use snapping::SnapFileReport;
pub use validate::{
    DEFAULT_VALIDATOR, ExternalValidator, NoValidation, SurfaceValidator, ValidationOutcome,
};
