//! The file-level entry point.

use std::fmt;
use std::path::{Path, PathBuf};

use mesh_io::{IoError, load_stl_from_bytes, to_ascii_string};
use mesh_types::IndexedMesh;
use tracing::{debug, info, warn};

use crate::error::{PrepError, PrepResult};
use crate::validate::{ExternalValidator, SurfaceValidator, ValidationOutcome};

/// Options shared by every [`Preprocessor`] operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessorOptions {
    /// Suppress routine progress and validator pass/skip messages.
    /// Validator failures are always reported.
    pub quiet: bool,
}

impl PreprocessorOptions {
    /// Creates new options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets quiet mode.
    #[must_use]
    pub const fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }
}

/// Runs the normalize, snap and merge operations on STL files and hands
/// every written file to a [`SurfaceValidator`].
///
/// # Example
///
/// ```no_run
/// use mesh_prep::{NoValidation, Preprocessor, PreprocessorOptions};
///
/// let prep = Preprocessor::new(NoValidation)
///     .with_options(PreprocessorOptions::new().with_quiet(true));
/// let report = prep.normalize_to_ascii("inlet.stl", None).unwrap();
/// println!("{report}");
/// ```
pub struct Preprocessor {
    validator: Box<dyn SurfaceValidator>,
    options: PreprocessorOptions,
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for Preprocessor {
    /// Validates with `surfaceCheck`, not quiet.
    fn default() -> Self {
        Self::new(ExternalValidator::default())
    }
}

impl Preprocessor {
    /// Preprocessor that validates output with `validator`.
    #[must_use]
    pub fn new(validator: impl SurfaceValidator + 'static) -> Self {
        Self {
            validator: Box::new(validator),
            options: PreprocessorOptions::default(),
        }
    }

    /// Sets the options.
    #[must_use]
    pub const fn with_options(mut self, options: PreprocessorOptions) -> Self {
        self.options = options;
        self
    }

    /// The current options.
    #[must_use]
    pub const fn options(&self) -> PreprocessorOptions {
        self.options
    }

    pub(crate) fn is_quiet(&self) -> bool {
        self.options.quiet
    }

    /// Run the validator on a freshly written file and log the verdict.
    pub(crate) fn validate_output(&self, path: &Path) -> ValidationOutcome {
        let outcome = self.validator.check(path);
        match &outcome {
            ValidationOutcome::Failed { exit_code, report } => {
                warn!(
                    path = %path.display(),
                    exit_code = ?exit_code,
                    "Surface check failed:\n{report}"
                );
            }
            ValidationOutcome::Unavailable { reason } => {
                if !self.is_quiet() {
                    warn!(path = %path.display(), "Skipping surface check: {reason}");
                }
            }
            ValidationOutcome::Passed { report } => {
                if !self.is_quiet() {
                    info!(path = %path.display(), "Surface check passed");
                }
                debug!("{report}");
            }
        }
        outcome
    }
}

/// Read a whole input file, mapping failures to [`PrepError::MeshLoad`].
pub(crate) fn read_input(path: &Path) -> PrepResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        let source = if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IoError::Io(e)
        };
        PrepError::mesh_load(path, source)
    })
}

/// Decode an STL file of either encoding.
pub(crate) fn load_mesh(path: &Path) -> PrepResult<IndexedMesh> {
    let bytes = read_input(path)?;
    decode(path, &bytes)
}

pub(crate) fn decode(path: &Path, bytes: &[u8]) -> PrepResult<IndexedMesh> {
    load_stl_from_bytes(bytes).map_err(|source| PrepError::mesh_load(path, source))
}

/// Render `mesh` as one anonymous ASCII solid destined for `output`.
pub(crate) fn encode_ascii(mesh: &IndexedMesh, output: &Path) -> PrepResult<String> {
    to_ascii_string(mesh, "").map_err(|source| PrepError::Encode {
        path: output.to_path_buf(),
        source,
    })
}

pub(crate) fn write_output(path: &Path, contents: &[u8]) -> PrepResult<()> {
    std::fs::write(path, contents).map_err(|source| PrepError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn owned(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref().to_path_buf()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording(Arc<Mutex<Vec<PathBuf>>>);

    impl SurfaceValidator for Recording {
        fn check(&self, path: &Path) -> ValidationOutcome {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(path.to_path_buf());
            }
            ValidationOutcome::Passed {
                report: String::new(),
            }
        }
    }

    #[test]
    fn validator_sees_the_written_path() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let prep = Preprocessor::new(Recording(Arc::clone(&seen)));
        let outcome = prep.validate_output(Path::new("out.stl"));

        assert!(outcome.is_passed());
        assert_eq!(*seen.lock().unwrap(), vec![PathBuf::from("out.stl")]);
    }

    #[test]
    fn options_builder() {
        let prep =
            Preprocessor::default().with_options(PreprocessorOptions::new().with_quiet(true));
        assert!(prep.options().quiet);
        assert!(prep.is_quiet());
    }

    #[test]
    fn missing_input_is_a_load_error() {
        let err = read_input(Path::new("/nonexistent/dir/part.stl")).unwrap_err();
        assert!(matches!(
            err,
            PrepError::MeshLoad {
                source: IoError::FileNotFound { .. },
                ..
            }
        ));
    }
}
