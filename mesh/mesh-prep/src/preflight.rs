//! Environment checks before a preprocessing run.

use std::ffi::OsString;
use std::fmt;

use crate::validate::DEFAULT_VALIDATOR;

/// Environment variable set by sourcing OpenFOAM's `etc/bashrc`.
pub const OPENFOAM_ENV_VAR: &str = "WM_PROJECT_DIR";

/// How much a [`Diagnostic`] matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Everything is in place.
    Info,
    /// Runs will work, but something downstream will be skipped or fail.
    Warning,
}

/// One finding of [`preflight`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How much it matters.
    pub severity: Severity,
    /// What was found.
    pub message: String,
}

impl Diagnostic {
    fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// Whether this is a warning.
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// What [`preflight`] should look at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightConfig {
    /// Validator program to look up, or `None` when validation is disabled.
    pub validator_program: Option<String>,
    /// Check that the OpenFOAM environment has been sourced.
    pub check_openfoam_env: bool,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            validator_program: Some(DEFAULT_VALIDATOR.to_string()),
            check_openfoam_env: true,
        }
    }
}

/// Report on the tools and environment the preprocessing steps rely on.
///
/// Never fails: problems come back as [`Severity::Warning`] diagnostics.
///
/// # Example
///
/// ```
/// use mesh_prep::{PreflightConfig, preflight};
///
/// let config = PreflightConfig {
///     validator_program: None,
///     check_openfoam_env: false,
/// };
/// let diagnostics = preflight(&config);
/// assert!(diagnostics.iter().all(|d| !d.is_warning()));
/// ```
#[must_use]
pub fn preflight(config: &PreflightConfig) -> Vec<Diagnostic> {
    let mut diagnostics = vec![validator_diagnostic(config.validator_program.as_deref())];
    if config.check_openfoam_env {
        diagnostics.push(openfoam_diagnostic(std::env::var_os(OPENFOAM_ENV_VAR)));
    }
    diagnostics
}

fn validator_diagnostic(program: Option<&str>) -> Diagnostic {
    let Some(program) = program else {
        return Diagnostic::info("surface validation disabled");
    };
    match which::which(program) {
        Ok(path) => Diagnostic::info(format!("validator {program} found at {}", path.display())),
        Err(_) => Diagnostic::warning(format!(
            "validator {program} not found on PATH; written files will not be checked"
        )),
    }
}

fn openfoam_diagnostic(project_dir: Option<OsString>) -> Diagnostic {
    match project_dir {
        Some(dir) if !dir.is_empty() => Diagnostic::info(format!(
            "OpenFOAM environment sourced ({OPENFOAM_ENV_VAR}={})",
            dir.to_string_lossy()
        )),
        _ => Diagnostic::warning(format!(
            "{OPENFOAM_ENV_VAR} is not set; source OpenFOAM's etc/bashrc before meshing"
        )),
    }
}
