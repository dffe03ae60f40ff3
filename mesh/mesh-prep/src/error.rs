//! Error types for file-level preprocessing.

use std::path::PathBuf;

use mesh_io::IoError;
use mesh_snap::SnapError;
use thiserror::Error;

/// Result type for preprocessing operations.
pub type PrepResult<T> = Result<T, PrepError>;

/// Errors that can occur while normalizing, snapping or merging STL files.
///
/// Validator problems are not errors; they are reported as a
/// [`ValidationOutcome`](crate::ValidationOutcome) inside each report.
#[derive(Debug, Error)]
pub enum PrepError {
    /// An input file could not be read or decoded.
    #[error("cannot load mesh {}: {source}", path.display())]
    MeshLoad {
        /// The file that failed.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: IoError,
    },

    /// Bodies and region names were given in different numbers.
    #[error("{bodies} mesh bodies but {names} region names")]
    ParameterMismatch {
        /// Number of bodies.
        bodies: usize,
        /// Number of region names.
        names: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Snapping failed.
    #[error(transparent)]
    Snap(#[from] SnapError),

    /// A mesh could not be rendered as STL text.
    #[error("cannot encode {}: {source}", path.display())]
    Encode {
        /// The output the text was meant for.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: IoError,
    },

    /// Writing an output file failed.
    #[error("cannot write {}: {source}", path.display())]
    Io {
        /// The output file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl PrepError {
    pub(crate) fn mesh_load(path: impl Into<PathBuf>, source: IoError) -> Self {
        Self::MeshLoad {
            path: path.into(),
            source,
        }
    }
}
