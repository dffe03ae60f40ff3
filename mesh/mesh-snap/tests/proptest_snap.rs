//! Property-based tests for matching and snapping.
//!
//! Run with: cargo test -p mesh-snap -- proptest

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use mesh_boundary::extract_boundary;
use mesh_snap::{PointMatcher, SnapParams, match_within_tolerance, snap_boundaries};
use mesh_types::IndexedMesh;
use nalgebra::Point3;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-1.0..1.0f64).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

/// Points on a coarse lattice, so exact coincidences and axis-aligned runs
/// are common.
fn arb_lattice_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-4i32..4).prop_map(|[x, y, z]| {
        Point3::new(f64::from(x) * 0.25, f64::from(y) * 0.25, f64::from(z) * 0.25)
    })
}

/// `n x n` grid patch in the plane z=0 over `[0,1] x [y0, y0 + 1]`, with
/// every position jittered by the given offsets.
fn patch(n: u32, y0: f64, jitter: &[[f64; 3]]) -> IndexedMesh {
    let mut positions = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            positions.push([
                f64::from(i) / f64::from(n),
                y0 + f64::from(j) / f64::from(n),
                0.0,
            ]);
        }
    }
    for (p, d) in positions.iter_mut().zip(jitter) {
        for k in 0..3 {
            p[k] += d[k];
        }
    }
    let row = n + 1;
    let mut faces = Vec::new();
    for j in 0..n {
        for i in 0..n {
            let a = j * row + i;
            faces.push([a, a + 1, a + row + 1]);
            faces.push([a, a + row + 1, a + row]);
        }
    }
    IndexedMesh::from_positions(&positions, &faces)
}

fn brute_force(query: &Point3<f64>, reference: &[Point3<f64>], tol: f64) -> Vec<usize> {
    let mut hits: Vec<(f64, usize)> = reference
        .iter()
        .enumerate()
        .map(|(i, p)| ((p - query).norm_squared(), i))
        .filter(|&(d, _)| d <= tol * tol)
        .collect();
    hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    hits.into_iter().map(|(_, i)| i).collect()
}

// =============================================================================
// Matcher
// =============================================================================

proptest! {
    /// The KD-tree agrees with an exhaustive scan, order included.
    #[test]
    fn matcher_agrees_with_brute_force(
        reference in prop::collection::vec(arb_point(), 0..80),
        queries in prop::collection::vec(arb_point(), 1..20),
        tol in 0.01..0.8f64,
    ) {
        let matcher = PointMatcher::new(&reference);
        for q in &queries {
            let got: Vec<usize> = matcher.within(q, tol).iter().map(|n| n.index).collect();
            prop_assert_eq!(got, brute_force(q, &reference, tol));
        }
    }

    /// Lattice points stress coincident and axis-aligned reference sets.
    #[test]
    fn matcher_handles_degenerate_layouts(
        reference in prop::collection::vec(arb_lattice_point(), 0..300),
        queries in prop::collection::vec(arb_lattice_point(), 1..10),
        tol in 0.1..0.6f64,
    ) {
        let matcher = PointMatcher::new(&reference);
        for q in &queries {
            let got: Vec<usize> = matcher.within(q, tol).iter().map(|n| n.index).collect();
            prop_assert_eq!(got, brute_force(q, &reference, tol));
        }
    }

    /// One correspondence per query, in query order.
    #[test]
    fn one_correspondence_per_query(
        reference in prop::collection::vec(arb_point(), 0..40),
        queries in prop::collection::vec(arb_point(), 0..40),
    ) {
        let matched = match_within_tolerance(&queries, &reference, 0.1).unwrap();
        prop_assert_eq!(matched.len(), queries.len());
        for (i, c) in matched.iter().enumerate() {
            prop_assert_eq!(c.query, i);
        }
    }
}

// =============================================================================
// Snapper
// =============================================================================

proptest! {
    /// Snapping moves only boundary vertices, and only onto reference
    /// boundary positions within tolerance.
    #[test]
    fn snap_preserves_topology_and_interior(
        n in 2u32..8,
        jitter in prop::collection::vec(prop::array::uniform3(-2e-4..2e-4f64), 81),
    ) {
        let reference = patch(n, -1.0, &[]);
        let mut primary = patch(n, 0.0, &jitter);
        let before = primary.clone();
        let params = SnapParams::default();

        let report = snap_boundaries(&mut primary, &reference, &params).unwrap();

        prop_assert_eq!(&primary.faces, &before.faces);
        prop_assert_eq!(primary.vertices.len(), before.vertices.len());

        let boundary = extract_boundary(&before);
        let targets = reference.positions_of(&extract_boundary(&reference));
        for (i, (after, orig)) in primary.vertices.iter().zip(&before.vertices).enumerate() {
            let i = u32::try_from(i).unwrap();
            if after.position == orig.position {
                continue;
            }
            prop_assert!(boundary.binary_search(&i).is_ok(), "interior vertex {} moved", i);
            prop_assert!(targets.contains(&after.position));
            prop_assert!((after.position - orig.position).norm() <= params.tolerance);
        }

        // Jitter is below the tolerance, so the whole shared row closes.
        prop_assert_eq!(report.snapped, (n + 1) as usize);
        prop_assert_eq!(report.unmatched, report.primary_boundary_vertices - report.snapped);
    }

    /// A second pass over an already snapped mesh moves nothing further.
    #[test]
    fn snap_is_idempotent(
        n in 2u32..6,
        jitter in prop::collection::vec(prop::array::uniform3(-2e-4..2e-4f64), 49),
    ) {
        let reference = patch(n, -1.0, &[]);
        let mut primary = patch(n, 0.0, &jitter);
        snap_boundaries(&mut primary, &reference, &SnapParams::default()).unwrap();
        let once = primary.clone();

        let report = snap_boundaries(&mut primary, &reference, &SnapParams::default()).unwrap();
        prop_assert_eq!(&primary, &once);
        prop_assert!(report.max_displacement == 0.0);
    }
}
