//! Fixed-radius neighbour search over a static reference point set.
//!
//! The reference points are indexed once in a `kiddo` KD-tree. CAD boundary
//! vertices tend to sit on axis-aligned lines and planes, and a KD-tree bucket
//! cannot be split when too many of its points share one coordinate, so the
//! tree stores the points in a fixed rotated frame. Rotation preserves
//! distances, and every candidate the tree returns is re-measured in the
//! original coordinates before it is accepted.

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::{Point3, Rotation3};
use std::fmt;

use crate::error::SnapResult;
use crate::params::validate_tolerance;

/// Euler angles of the indexing frame. Any rotation that keeps common axis
/// directions off the coordinate axes works.
const FRAME_ANGLES: (f64, f64, f64) = (0.377, 0.541, 0.823);

/// Relative widening of the tree query, covering rounding in the rotation.
const ROUNDING_SLACK: f64 = 1e-9;

/// One reference point within tolerance of a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    /// Index into the reference slice.
    pub index: usize,
    /// Squared Euclidean distance to the query point.
    pub distance_sq: f64,
}

impl Neighbour {
    /// Euclidean distance to the query point.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance_sq.sqrt()
    }
}

/// All reference points within tolerance of one query point.
///
/// `matches` is ordered nearest first; equal distances are ordered by
/// ascending reference index. It is empty when nothing is close enough.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correspondence {
    /// Index into the query slice.
    pub query: usize,
    /// Matching reference points, nearest first.
    pub matches: Vec<Neighbour>,
}

impl Correspondence {
    /// The nearest match, lowest reference index on ties.
    #[must_use]
    pub fn nearest(&self) -> Option<Neighbour> {
        self.matches.first().copied()
    }

    /// Whether at least one reference point matched.
    #[must_use]
    pub fn is_matched(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// Spatial index over a borrowed set of reference points.
///
/// Points with non-finite coordinates are never indexed and never match.
/// Bit-identical points share one tree entry and are all reported.
///
/// # Example
///
/// ```
/// use mesh_snap::PointMatcher;
/// use nalgebra::Point3;
///
/// let reference = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
/// let matcher = PointMatcher::new(&reference);
///
/// let hits = matcher.within(&Point3::new(0.9, 0.0, 0.0), 0.25);
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].index, 1);
/// ```
pub struct PointMatcher<'a> {
    reference: &'a [Point3<f64>],
    tree: KdTree<f64, 3>,
    /// Reference indices stored under each tree item, ascending.
    slots: Vec<Vec<usize>>,
    frame: Rotation3<f64>,
    /// Largest absolute coordinate among indexed points.
    magnitude: f64,
}

impl fmt::Debug for PointMatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointMatcher")
            .field("reference_points", &self.reference.len())
            .field("indexed_positions", &self.slots.len())
            .field("magnitude", &self.magnitude)
            .finish_non_exhaustive()
    }
}

impl<'a> PointMatcher<'a> {
    /// Build the index over `reference`.
    #[must_use]
    pub fn new(reference: &'a [Point3<f64>]) -> Self {
        let (roll, pitch, yaw) = FRAME_ANGLES;
        let frame = Rotation3::from_euler_angles(roll, pitch, yaw);

        let mut tree: KdTree<f64, 3> = KdTree::new();
        let mut lookup: HashMap<[u64; 3], usize> = HashMap::with_capacity(reference.len());
        let mut slots: Vec<Vec<usize>> = Vec::with_capacity(reference.len());
        let mut magnitude = 0.0_f64;

        for (index, point) in reference.iter().enumerate() {
            if !is_finite(point) {
                continue;
            }
            match lookup.entry(bit_key(point)) {
                Entry::Occupied(entry) => slots[*entry.get()].push(index),
                Entry::Vacant(entry) => {
                    let slot = slots.len();
                    entry.insert(slot);
                    slots.push(vec![index]);

                    let r = frame * point;
                    tree.add(&[r.x, r.y, r.z], slot as u64);
                    magnitude = magnitude.max(point.coords.amax());
                }
            }
        }

        Self {
            reference,
            tree,
            slots,
            frame,
            magnitude,
        }
    }

    /// Number of reference points, indexed or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reference.len()
    }

    /// Whether no reference point can ever match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Every reference point with `|p - query|² <= tolerance²`, nearest first.
    ///
    /// Returns an empty vector for an empty index, a non-finite query, or a
    /// tolerance that is not finite and positive.
    #[must_use]
    pub fn within(&self, query: &Point3<f64>, tolerance: f64) -> Vec<Neighbour> {
        if self.slots.is_empty() || !is_finite(query) || validate_tolerance(tolerance).is_err() {
            return Vec::new();
        }

        let scale = tolerance + self.magnitude + query.coords.amax();
        let radius = tolerance + ROUNDING_SLACK * scale;
        let tolerance_sq = tolerance * tolerance;
        let r = self.frame * query;

        let mut found: Vec<Neighbour> = self
            .tree
            .within::<SquaredEuclidean>(&[r.x, r.y, r.z], radius * radius)
            .into_iter()
            .flat_map(|candidate| self.slot(candidate.item).iter().copied())
            .filter_map(|index| {
                let distance_sq = (self.reference[index] - query).norm_squared();
                (distance_sq <= tolerance_sq).then_some(Neighbour { index, distance_sq })
            })
            .collect();

        found.sort_by(|a, b| {
            a.distance_sq
                .total_cmp(&b.distance_sq)
                .then(a.index.cmp(&b.index))
        });
        found
    }

    /// The nearest reference point within `tolerance`, if any.
    #[must_use]
    pub fn nearest_within(&self, query: &Point3<f64>, tolerance: f64) -> Option<Neighbour> {
        self.within(query, tolerance).first().copied()
    }

    /// Match every query point, one [`Correspondence`] per query in order.
    ///
    /// # Errors
    ///
    /// Returns [`SnapError::InvalidParameter`](crate::SnapError::InvalidParameter)
    /// if `tolerance` is not finite and positive.
    pub fn match_all(
        &self,
        queries: &[Point3<f64>],
        tolerance: f64,
    ) -> SnapResult<Vec<Correspondence>> {
        validate_tolerance(tolerance)?;
        Ok(queries
            .iter()
            .enumerate()
            .map(|(query, point)| Correspondence {
                query,
                matches: self.within(point, tolerance),
            })
            .collect())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn slot(&self, item: u64) -> &[usize] {
        self.slots.get(item as usize).map_or(&[], Vec::as_slice)
    }
}

/// For each query point, every reference point within `tolerance`.
///
/// Builds a [`PointMatcher`] over `reference` and runs
/// [`PointMatcher::match_all`]. The result has one entry per query point;
/// an empty reference set yields entries with no matches.
///
/// # Errors
///
/// Returns [`SnapError::InvalidParameter`](crate::SnapError::InvalidParameter)
/// if `tolerance` is not finite and positive.
///
/// # Example
///
/// ```
/// use mesh_snap::match_within_tolerance;
/// use nalgebra::Point3;
///
/// let query = [Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 0.0, 0.0)];
/// let reference = [Point3::new(0.0, 0.0, 1e-4)];
///
/// let matches = match_within_tolerance(&query, &reference, 5e-4).unwrap();
/// assert_eq!(matches[0].nearest().map(|n| n.index), Some(0));
/// assert!(!matches[1].is_matched());
/// ```
pub fn match_within_tolerance(
    query: &[Point3<f64>],
    reference: &[Point3<f64>],
    tolerance: f64,
) -> SnapResult<Vec<Correspondence>> {
    validate_tolerance(tolerance)?;
    PointMatcher::new(reference).match_all(query, tolerance)
}

fn is_finite(p: &Point3<f64>) -> bool {
    p.coords.iter().all(|c| c.is_finite())
}

/// Bit pattern of a point with `-0.0` folded into `0.0`.
fn bit_key(p: &Point3<f64>) -> [u64; 3] {
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::SnapError;

    fn indices(found: &[Neighbour]) -> Vec<usize> {
        found.iter().map(|n| n.index).collect()
    }

    #[test]
    fn tolerance_ball_is_closed() {
        let reference = [Point3::origin()];
        let matcher = PointMatcher::new(&reference);

        // 0.5² == 0.25 exactly
        assert_eq!(matcher.within(&Point3::new(0.5, 0.0, 0.0), 0.5).len(), 1);
        assert!(matcher.within(&Point3::new(0.500_001, 0.0, 0.0), 0.5).is_empty());
    }

    #[test]
    fn nearest_comes_first() {
        let reference = [
            Point3::new(0.3, 0.0, 0.0),
            Point3::new(0.1, 0.0, 0.0),
            Point3::new(0.2, 0.0, 0.0),
        ];
        let matcher = PointMatcher::new(&reference);
        let found = matcher.within(&Point3::origin(), 1.0);
        assert_eq!(indices(&found), vec![1, 2, 0]);
    }

    #[test]
    fn equidistant_matches_prefer_lowest_index() {
        let reference = [
            Point3::new(0.0, 0.0, 0.25),
            Point3::new(0.0, 0.25, 0.0),
            Point3::new(0.25, 0.0, 0.0),
        ];
        let matcher = PointMatcher::new(&reference);
        let nearest = matcher.nearest_within(&Point3::origin(), 0.5);
        assert_eq!(nearest.map(|n| n.index), Some(0));
    }

    #[test]
    fn coincident_references_are_all_reported() {
        let reference = vec![Point3::new(1.0, 2.0, 3.0); 100];
        let matcher = PointMatcher::new(&reference);
        let found = matcher.within(&Point3::new(1.0, 2.0, 3.0), 1e-6);
        assert_eq!(indices(&found), (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn axis_aligned_rim_is_indexable() {
        // Thousands of points sharing y and z, the shape of a straight CAD edge.
        let reference: Vec<Point3<f64>> = (0..5000)
            .map(|i| Point3::new(f64::from(i) * 1e-3, 0.0, 0.0))
            .collect();
        let matcher = PointMatcher::new(&reference);

        let found = matcher.within(&Point3::new(2.5, 1e-5, 0.0), 1e-4);
        assert_eq!(indices(&found), vec![2500]);
    }

    #[test]
    fn empty_reference_matches_nothing() {
        let matcher = PointMatcher::new(&[]);
        assert!(matcher.is_empty());
        assert!(matcher.within(&Point3::origin(), 1.0).is_empty());

        let matched = match_within_tolerance(&[Point3::origin()], &[], 1.0).unwrap();
        assert_eq!(matched.len(), 1);
        assert!(!matched[0].is_matched());
    }

    #[test]
    fn non_finite_points_never_match() {
        let reference = [Point3::new(f64::NAN, 0.0, 0.0), Point3::origin()];
        let matcher = PointMatcher::new(&reference);
        assert_eq!(indices(&matcher.within(&Point3::origin(), 1.0)), vec![1]);
        assert!(
            matcher
                .within(&Point3::new(f64::INFINITY, 0.0, 0.0), 1.0)
                .is_empty()
        );
    }

    #[test]
    fn negative_zero_shares_a_slot() {
        let reference = [Point3::new(-0.0, 0.0, 0.0), Point3::origin()];
        let matcher = PointMatcher::new(&reference);
        assert_eq!(matcher.slots.len(), 1);
        assert_eq!(indices(&matcher.within(&Point3::origin(), 1e-3)), vec![0, 1]);
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        let reference = [Point3::origin()];
        for bad in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                match_within_tolerance(&reference, &reference, bad),
                Err(SnapError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn far_from_origin_keeps_precision() {
        let base = Point3::new(1.0e4, -2.0e4, 3.0e4);
        let reference = [base, base + nalgebra::Vector3::new(1e-3, 0.0, 0.0)];
        let matcher = PointMatcher::new(&reference);
        let query = base + nalgebra::Vector3::new(2e-4, 0.0, 0.0);
        assert_eq!(indices(&matcher.within(&query, 5e-4)), vec![0]);
    }
}
