//! Snapping one patch's open boundary onto its neighbour's.

use std::fmt;

use hashbrown::HashMap;
use mesh_boundary::extract_boundary;
use mesh_types::IndexedMesh;
use nalgebra::Point3;
use tracing::{debug, info, warn};

use crate::error::{SnapError, SnapResult};
use crate::matcher::PointMatcher;
use crate::params::SnapParams;

/// Outcome of a snapping pass.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapReport {
    /// Number of open-boundary vertices on the moved mesh.
    pub primary_boundary_vertices: usize,
    /// Number of open-boundary vertices on the reference mesh.
    pub reference_boundary_vertices: usize,
    /// Boundary vertices moved onto a reference vertex.
    pub snapped: usize,
    /// Boundary vertices with no reference vertex within tolerance.
    pub unmatched: usize,
    /// Largest distance any vertex was moved.
    pub max_displacement: f64,
    /// Reference vertices that more than one primary vertex was moved onto.
    pub shared_targets: usize,
    /// Tolerance the pass ran with.
    pub tolerance: f64,
}

impl SnapReport {
    /// Whether every primary boundary vertex found a partner.
    #[must_use]
    pub fn all_matched(&self) -> bool {
        self.unmatched == 0
    }
}

impl fmt::Display for SnapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "snapped {}/{} boundary vertices onto {} reference vertices (tolerance {:e}, max shift {:.3e})",
            self.snapped,
            self.primary_boundary_vertices,
            self.reference_boundary_vertices,
            self.tolerance,
            self.max_displacement,
        )?;
        if self.unmatched > 0 {
            write!(f, ", {} unmatched", self.unmatched)?;
        }
        if self.shared_targets > 0 {
            write!(f, ", {} shared targets", self.shared_targets)?;
        }
        Ok(())
    }
}

/// Move `primary`'s open-boundary vertices onto `reference`'s.
///
/// Each primary boundary vertex with a reference boundary vertex within
/// `params.tolerance` takes that vertex's exact coordinates; the nearest one
/// wins, lowest index on ties. Vertices with no partner are left where they
/// are. Only positions of primary boundary vertices change: the vertex count,
/// the face list and every interior vertex stay as they were, and `reference`
/// is never modified.
///
/// # Errors
///
/// - [`SnapError::InvalidParameter`] if the tolerance is not finite and
///   positive. Checked before either mesh is inspected.
/// - [`SnapError::InvalidIndex`] if a face of either mesh references a
///   missing vertex.
///
/// # Example
///
/// ```
/// use mesh_snap::{SnapParams, snap_boundaries};
/// use mesh_types::IndexedMesh;
///
/// let reference = IndexedMesh::from_positions(
///     &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]],
///     &[[0, 2, 1]],
/// );
/// let mut primary = IndexedMesh::from_positions(
///     &[[1e-5, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
///     &[[0, 1, 2]],
/// );
///
/// let report = snap_boundaries(&mut primary, &reference, &SnapParams::default()).unwrap();
/// assert_eq!(report.snapped, 2);
/// assert_eq!(primary.vertices[0], reference.vertices[0]);
/// ```
pub fn snap_boundaries(
    primary: &mut IndexedMesh,
    reference: &IndexedMesh,
    params: &SnapParams,
) -> SnapResult<SnapReport> {
    params.validate()?;
    primary
        .validate_indices()
        .map_err(|bad| SnapError::invalid_index("primary", bad))?;
    reference
        .validate_indices()
        .map_err(|bad| SnapError::invalid_index("reference", bad))?;

    let primary_boundary = extract_boundary(primary);
    let reference_boundary = extract_boundary(reference);
    let targets = reference.positions_of(&reference_boundary);

    debug!(
        primary = primary_boundary.len(),
        reference = reference_boundary.len(),
        tolerance = params.tolerance,
        "Matching boundary vertices"
    );

    let mut report = snap_vertices(primary, &primary_boundary, &targets, params)?;
    report.reference_boundary_vertices = reference_boundary.len();

    if report.shared_targets > 0 {
        warn!(
            shared = report.shared_targets,
            "Several boundary vertices snapped onto the same reference vertex; edges may have collapsed"
        );
    }
    info!(
        snapped = report.snapped,
        unmatched = report.unmatched,
        max_displacement = report.max_displacement,
        "Boundary snapping complete"
    );

    Ok(report)
}

/// Move each vertex in `indices` onto its nearest point of `targets` within
/// tolerance.
///
/// Lower-level form of [`snap_boundaries`] for callers that already know
/// which vertices to move and where they may go. Indices outside the mesh are
/// rejected before anything moves. `reference_boundary_vertices` in the
/// returned report is `targets.len()`.
///
/// # Errors
///
/// - [`SnapError::InvalidParameter`] for a bad tolerance.
/// - [`SnapError::VertexOutOfRange`] if an entry of `indices` is not a
///   vertex of `mesh`.
pub fn snap_vertices(
    mesh: &mut IndexedMesh,
    indices: &[u32],
    targets: &[Point3<f64>],
    params: &SnapParams,
) -> SnapResult<SnapReport> {
    params.validate()?;
    let vertex_count = mesh.vertices.len();
    if let Some(&vertex) = indices.iter().find(|&&v| v as usize >= vertex_count) {
        return Err(SnapError::VertexOutOfRange {
            vertex,
            vertex_count,
        });
    }

    let queries = mesh.positions_of(indices);
    let matcher = PointMatcher::new(targets);
    let correspondences = matcher.match_all(&queries, params.tolerance)?;

    let mut report = SnapReport {
        primary_boundary_vertices: indices.len(),
        reference_boundary_vertices: targets.len(),
        tolerance: params.tolerance,
        ..SnapReport::default()
    };
    let mut claims: HashMap<usize, u32> = HashMap::new();

    for correspondence in &correspondences {
        let Some(nearest) = correspondence.nearest() else {
            report.unmatched += 1;
            continue;
        };
        let vertex = indices[correspondence.query];
        mesh.set_position(vertex, targets[nearest.index]);

        report.snapped += 1;
        report.max_displacement = report.max_displacement.max(nearest.distance());
        *claims.entry(nearest.index).or_insert(0) += 1;
    }
    report.shared_targets = claims.values().filter(|&&n| n > 1).count();

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::params::DEFAULT_TOLERANCE;
    use approx::assert_relative_eq;

    /// Unit square in the z=0 plane split along its diagonal, offset in y.
    fn square(y0: f64) -> IndexedMesh {
        IndexedMesh::from_positions(
            &[
                [0.0, y0, 0.0],
                [1.0, y0, 0.0],
                [1.0, y0 + 1.0, 0.0],
                [0.0, y0 + 1.0, 0.0],
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn shared_edge_is_welded() {
        let reference = square(-1.0);
        let mut primary = square(0.0);
        primary.vertices[0].position.x += 1e-5;
        primary.vertices[1].position.y -= 2e-5;

        let report = snap_boundaries(&mut primary, &reference, &SnapParams::default()).unwrap();

        assert_eq!(report.primary_boundary_vertices, 4);
        assert_eq!(report.reference_boundary_vertices, 4);
        assert_eq!(report.snapped, 2);
        assert_eq!(report.unmatched, 2);
        assert_eq!(report.shared_targets, 0);
        assert_relative_eq!(report.max_displacement, 2e-5, epsilon = 1e-12);
        assert_eq!(primary.vertices[0], reference.vertices[3]);
        assert_eq!(primary.vertices[1], reference.vertices[2]);
    }

    #[test]
    fn topology_is_untouched() {
        let reference = square(-1.0);
        let mut primary = square(0.0);
        let before = primary.clone();

        snap_boundaries(&mut primary, &reference, &SnapParams::default()).unwrap();

        assert_eq!(primary.faces, before.faces);
        assert_eq!(primary.vertices.len(), before.vertices.len());
        assert_eq!(reference, square(-1.0));
    }

    #[test]
    fn rim_vertex_at_exact_tolerance_moves_and_one_just_past_does_not() {
        let tol = DEFAULT_TOLERANCE;
        let reference = square(-1.0);
        let mut primary = square(0.0);
        primary.vertices[0].position.y = tol;
        primary.vertices[1].position.y = tol * (1.0 + 1e-6);
        let outside = primary.vertices[1];

        let report = snap_boundaries(&mut primary, &reference, &SnapParams::default()).unwrap();

        assert_eq!(report.snapped, 1);
        assert_eq!(report.unmatched, 3);
        assert_relative_eq!(report.max_displacement, tol, max_relative = 1e-12);
        assert_eq!(primary.vertices[0], reference.vertices[3]);
        assert_eq!(primary.vertices[1], outside);
    }

    #[test]
    fn nothing_within_tolerance_is_a_noop() {
        let reference = square(-10.0);
        let mut primary = square(0.0);
        let before = primary.clone();

        let report = snap_boundaries(&mut primary, &reference, &SnapParams::default()).unwrap();
        assert_eq!(report.snapped, 0);
        assert_eq!(report.unmatched, 4);
        assert!(!report.all_matched());
        assert_eq!(primary, before);
    }

    #[test]
    fn closed_reference_offers_no_targets() {
        let reference = IndexedMesh::from_positions(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, 1.0, 0.0],
                [0.5, 0.5, 1.0],
            ],
            &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]],
        );
        let mut primary = square(0.0);
        let report = snap_boundaries(&mut primary, &reference, &SnapParams::default()).unwrap();
        assert_eq!(report.reference_boundary_vertices, 0);
        assert_eq!(report.snapped, 0);
    }

    #[test]
    fn bad_tolerance_checked_before_geometry() {
        // Both meshes are broken too; the tolerance error must win.
        let broken = IndexedMesh::from_positions(&[[0.0, 0.0, 0.0]], &[[0, 1, 2]]);
        let mut primary = broken.clone();
        let err = snap_boundaries(&mut primary, &broken, &SnapParams::new().with_tolerance(-1.0));
        assert!(matches!(err, Err(SnapError::InvalidParameter(_))));
    }

    #[test]
    fn dangling_face_is_reported() {
        let broken = IndexedMesh::from_positions(&[[0.0, 0.0, 0.0]], &[[0, 1, 2]]);
        let mut primary = square(0.0);
        let err = snap_boundaries(&mut primary, &broken, &SnapParams::default());
        assert!(matches!(
            err,
            Err(SnapError::InvalidIndex {
                mesh: "reference",
                vertex: 1,
                ..
            })
        ));
    }

    #[test]
    fn shared_targets_are_counted() {
        let mut mesh = IndexedMesh::from_positions(
            &[[0.0, 0.0, 0.0], [1e-4, 0.0, 0.0], [5.0, 5.0, 5.0]],
            &[[0, 1, 2]],
        );
        let targets = [Point3::new(5e-5, 0.0, 0.0)];
        let report = snap_vertices(&mut mesh, &[0, 1], &targets, &SnapParams::default()).unwrap();

        assert_eq!(report.snapped, 2);
        assert_eq!(report.shared_targets, 1);
        assert_eq!(mesh.vertices[0], mesh.vertices[1]);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut mesh = square(0.0);
        let err = snap_vertices(&mut mesh, &[7], &[], &SnapParams::default());
        assert!(matches!(err, Err(SnapError::VertexOutOfRange { vertex: 7, .. })));
    }

    #[test]
    fn report_display_mentions_counts() {
        let report = SnapReport {
            primary_boundary_vertices: 10,
            reference_boundary_vertices: 12,
            snapped: 8,
            unmatched: 2,
            max_displacement: 1e-5,
            shared_targets: 0,
            tolerance: 5e-4,
        };
        let text = report.to_string();
        assert!(text.starts_with("snapped 8/10 boundary vertices onto 12"));
        assert!(text.contains("2 unmatched"));
        assert!(!text.contains("shared"));
    }
}
