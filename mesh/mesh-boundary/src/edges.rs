//! Undirected edge usage counting.

use hashbrown::HashMap;

/// An undirected edge between two vertex indices, stored as `(min, max)`.
///
/// `Edge::new(a, b)` and `Edge::new(b, a)` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    lo: u32,
    hi: u32,
}

impl Edge {
    /// Create the canonical edge between `a` and `b`.
    #[inline]
    #[must_use]
    pub const fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    /// The smaller endpoint.
    #[inline]
    #[must_use]
    pub const fn lo(self) -> u32 {
        self.lo
    }

    /// The larger endpoint.
    #[inline]
    #[must_use]
    pub const fn hi(self) -> u32 {
        self.hi
    }

    /// Both endpoints as `(min, max)`.
    #[inline]
    #[must_use]
    pub const fn vertices(self) -> (u32, u32) {
        (self.lo, self.hi)
    }

    /// Pack the edge into one `u64`, smaller index in the high half.
    #[inline]
    #[must_use]
    pub const fn key(self) -> u64 {
        ((self.lo as u64) << 32) | self.hi as u64
    }

    /// Inverse of [`Edge::key`].
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_key(key: u64) -> Self {
        Self {
            lo: (key >> 32) as u32,
            hi: key as u32,
        }
    }
}

/// The three edges of a triangle, in winding order.
#[inline]
fn face_edges(face: &[u32; 3]) -> [Edge; 3] {
    [
        Edge::new(face[0], face[1]),
        Edge::new(face[1], face[2]),
        Edge::new(face[2], face[0]),
    ]
}

/// How many faces use each undirected edge of a mesh.
///
/// Built in one pass over the face list. A degenerate face contributes its
/// self-edge `(a, a)` like any other edge, so a collapsed corner that no
/// other face repeats stays on the boundary.
///
/// # Example
///
/// ```
/// use mesh_boundary::EdgeOccurrences;
///
/// let edges = EdgeOccurrences::build(&[[0, 1, 2], [1, 3, 2]]);
/// assert_eq!(edges.edge_count(), 5);
/// assert_eq!(edges.boundary_edge_count(), 4);
/// assert_eq!(edges.count(2, 1), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EdgeOccurrences {
    counts: HashMap<u64, u32>,
}

impl EdgeOccurrences {
    /// Count edge usage over `faces`.
    #[must_use]
    pub fn build(faces: &[[u32; 3]]) -> Self {
        let mut counts: HashMap<u64, u32> = HashMap::with_capacity(faces.len() * 3 / 2 + 1);

        for face in faces {
            for edge in face_edges(face) {
                *counts.entry(edge.key()).or_insert(0) += 1;
            }
        }

        Self { counts }
    }

    /// Number of faces using the edge between `a` and `b` (either order).
    #[must_use]
    pub fn count(&self, a: u32, b: u32) -> u32 {
        self.counts.get(&Edge::new(a, b).key()).copied().unwrap_or(0)
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.counts.len()
    }

    /// Iterate over edges used by exactly one face, in no particular order.
    pub fn boundary_edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.counts
            .iter()
            .filter(|&(_, &n)| n == 1)
            .map(|(&key, _)| Edge::from_key(key))
    }

    /// Number of edges used by exactly one face.
    #[must_use]
    pub fn boundary_edge_count(&self) -> usize {
        self.counts.values().filter(|&&n| n == 1).count()
    }

    /// Number of edges used by more than two faces.
    #[must_use]
    pub fn non_manifold_edge_count(&self) -> usize {
        self.counts.values().filter(|&&n| n > 2).count()
    }

    /// Check if the surface is closed (no edge is used only once).
    #[must_use]
    pub fn is_watertight(&self) -> bool {
        self.counts.values().all(|&n| n >= 2)
    }

    /// Sorted, de-duplicated endpoints of every boundary edge.
    #[must_use]
    pub fn boundary_vertices(&self) -> Vec<u32> {
        let mut vertices: Vec<u32> = self
            .boundary_edges()
            .flat_map(|edge| [edge.lo, edge.hi])
            .collect();
        vertices.sort_unstable();
        vertices.dedup();
        vertices
    }
}
