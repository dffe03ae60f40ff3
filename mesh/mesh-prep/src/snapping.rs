//! File-level boundary snapping.

use std::fmt;
use std::path::{Path, PathBuf};

use mesh_snap::{SnapParams, SnapReport, snap_boundaries};
use tracing::info;

use crate::error::PrepResult;
use crate::preprocessor::{Preprocessor, encode_ascii, load_mesh, owned, write_output};
use crate::validate::ValidationOutcome;

/// Outcome of [`Preprocessor::snap_files`].
#[derive(Debug, Clone, PartialEq)]
pub struct SnapFileReport {
    /// The mesh whose boundary was moved.
    pub primary: PathBuf,
    /// The mesh it was moved onto.
    pub reference: PathBuf,
    /// Where the snapped mesh was written.
    pub output: PathBuf,
    /// Counts from the snapping pass.
    pub snap: SnapReport,
    /// Validator verdict on the written file.
    pub validation: ValidationOutcome,
}

impl fmt::Display for SnapFileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {}",
            self.primary.display(),
            self.output.display(),
            self.snap
        )
    }
}

impl Preprocessor {
    /// Snap the open boundary of `primary` onto that of `reference` and
    /// write the result to `output` as ASCII STL.
    ///
    /// `reference` is only read. `output` may be the same path as
    /// `primary`.
    ///
    /// # Errors
    ///
    /// - [`PrepError::Snap`](crate::PrepError::Snap) for an invalid
    ///   tolerance, before either file is read, or for a mesh with dangling
    ///   face indices.
    /// - [`PrepError::MeshLoad`](crate::PrepError::MeshLoad) if either input
    ///   cannot be read or decoded.
    /// - [`PrepError::Io`](crate::PrepError::Io) if the output cannot be
    ///   written.
    pub fn snap_files(
        &self,
        primary: impl AsRef<Path>,
        reference: impl AsRef<Path>,
        output: impl AsRef<Path>,
        params: &SnapParams,
    ) -> PrepResult<SnapFileReport> {
        let (primary, reference, output) = (primary.as_ref(), reference.as_ref(), output.as_ref());
        params.validate()?;

        let mut mesh = load_mesh(primary)?;
        let reference_mesh = load_mesh(reference)?;
        let snap = snap_boundaries(&mut mesh, &reference_mesh, params)?;

        let text = encode_ascii(&mesh, output)?;
        write_output(output, text.as_bytes())?;
        if !self.is_quiet() {
            info!(
                snapped = snap.snapped,
                primary = %primary.display(),
                reference = %reference.display(),
                output = %output.display(),
                "Saved snapped mesh"
            );
        }

        let validation = self.validate_output(output);
        Ok(SnapFileReport {
            primary: owned(primary),
            reference: owned(reference),
            output: owned(output),
            snap,
            validation,
        })
    }
}
