//! Advisory surface validation of written files.
//!
//! After an output file is written it is handed to a [`SurfaceValidator`].
//! The usual implementation is [`ExternalValidator`], which runs OpenFOAM's
//! `surfaceCheck` on the file. Whatever the validator says is reported and
//! returned to the caller, but it never turns a successful write into an
//! error.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Program run by [`ExternalValidator::default`].
pub const DEFAULT_VALIDATOR: &str = "surfaceCheck";

/// What a validator concluded about one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The validator accepted the file.
    Passed {
        /// Captured validator output.
        report: String,
    },
    /// The validator ran and rejected the file.
    Failed {
        /// Exit code, or `None` if the process was killed by a signal.
        exit_code: Option<i32>,
        /// Captured validator output.
        report: String,
    },
    /// No verdict: the validator is missing, could not start, or is disabled.
    Unavailable {
        /// Why validation did not happen.
        reason: String,
    },
}

impl ValidationOutcome {
    /// Whether the validator accepted the file.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed { .. })
    }

    /// Whether the validator rejected the file.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed { .. } => write!(f, "validation passed"),
            Self::Failed {
                exit_code: Some(code),
                ..
            } => write!(f, "validation failed (exit code {code})"),
            Self::Failed { exit_code: None, .. } => write!(f, "validation failed (terminated)"),
            Self::Unavailable { reason } => write!(f, "validation skipped: {reason}"),
        }
    }
}

/// Something that can check a written surface file.
pub trait SurfaceValidator: Send + Sync {
    /// Check the file at `path`. Must not panic on any input.
    fn check(&self, path: &Path) -> ValidationOutcome;
}

/// Runs an external program with the file path as its only argument.
///
/// Exit status 0 is a pass; any other status is a failure carrying the
/// captured stdout and stderr. A program that cannot be found or started
/// gives [`ValidationOutcome::Unavailable`].
///
/// # Example
///
/// ```
/// use mesh_prep::{ExternalValidator, SurfaceValidator};
/// use std::path::Path;
///
/// let validator = ExternalValidator::new("no-such-validator-on-this-machine");
/// let outcome = validator.check(Path::new("part.stl"));
/// assert!(!outcome.is_passed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalValidator {
    program: PathBuf,
}

impl ExternalValidator {
    /// Validator that runs `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The program this validator runs.
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for ExternalValidator {
    fn default() -> Self {
        Self::new(DEFAULT_VALIDATOR)
    }
}

impl SurfaceValidator for ExternalValidator {
    fn check(&self, path: &Path) -> ValidationOutcome {
        debug!(program = %self.program.display(), path = %path.display(), "Running validator");

        let output = match Command::new(&self.program).arg(path).output() {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return ValidationOutcome::Unavailable {
                    reason: format!("{} not found", self.program.display()),
                };
            }
            Err(e) => {
                return ValidationOutcome::Unavailable {
                    reason: format!("cannot run {}: {e}", self.program.display()),
                };
            }
        };

        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !report.is_empty() && !report.ends_with('\n') {
                report.push('\n');
            }
            report.push_str(&stderr);
        }

        if output.status.success() {
            ValidationOutcome::Passed { report }
        } else {
            ValidationOutcome::Failed {
                exit_code: output.status.code(),
                report,
            }
        }
    }
}

/// Validator that never runs anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoValidation;

impl SurfaceValidator for NoValidation {
    fn check(&self, _path: &Path) -> ValidationOutcome {
        ValidationOutcome::Unavailable {
            reason: "validation disabled".to_string(),
        }
    }
}
