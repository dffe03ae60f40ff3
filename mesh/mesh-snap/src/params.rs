//! Snapping parameters.

use crate::error::{SnapError, SnapResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default match radius, in mesh units.
///
/// CAD exports for CFD are usually in metres, where half a millimetre is well
/// below any feature size but above the drift left by independent
/// triangulation of a shared curve.
pub const DEFAULT_TOLERANCE: f64 = 5e-4;

/// Parameters for [`snap_boundaries`](crate::snap_boundaries).
///
/// # Example
///
/// ```
/// use mesh_snap::SnapParams;
///
/// let params = SnapParams::default();
/// assert_eq!(params.tolerance, 5e-4);
///
/// let mm = SnapParams::millimetres();
/// assert_eq!(mm.tolerance, 0.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SnapParams {
    /// Maximum distance between a primary boundary vertex and the reference
    /// boundary vertex it is moved onto (default: 5e-4). The ball is closed:
    /// a point exactly `tolerance` away matches.
    pub tolerance: f64,
}

impl Default for SnapParams {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl SnapParams {
    /// Creates new parameters with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the match tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Half a millimetre for geometry exported in millimetres.
    #[must_use]
    pub const fn millimetres() -> Self {
        Self { tolerance: 0.5 }
    }

    /// Half a millimetre for geometry exported in metres (the default).
    #[must_use]
    pub const fn metres() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Check that the tolerance is finite and strictly positive.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidParameter`] otherwise.
    pub fn validate(&self) -> SnapResult<()> {
        validate_tolerance(self.tolerance)
    }
}

pub(crate) fn validate_tolerance(tolerance: f64) -> SnapResult<()> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(SnapError::InvalidParameter(format!(
            "tolerance must be a finite positive distance, got {tolerance}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_metres() {
        assert_eq!(SnapParams::default(), SnapParams::metres());
        assert!(SnapParams::default().validate().is_ok());
    }

    #[test]
    fn builder_overrides_tolerance() {
        let params = SnapParams::new().with_tolerance(1e-3);
        assert!((params.tolerance - 1e-3).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_tolerances() {
        for bad in [0.0, -1e-3, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = SnapParams::new().with_tolerance(bad).validate();
            assert!(
                matches!(err, Err(SnapError::InvalidParameter(_))),
                "{bad} accepted"
            );
        }
    }
}
