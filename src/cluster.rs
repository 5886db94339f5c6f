//! Index sets, degree-of-freedom clusters, and the bounding box cache
//! consumed by the admissibility predicates.
//!
//! The cluster tree itself is built by the surrounding H-matrix layer;
//! this module only defines the node data the compression core reads: a
//! contiguous index set, the coordinates behind it, and a set-once cache
//! for the axis-aligned bounding box.

use std::sync::OnceLock;

/// Identity of a block side: a contiguous range of the root numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexSet {
    pub offset: usize,
    pub size: usize,
}

impl IndexSet {
    pub fn new(offset: usize, size: usize) -> Self {
        IndexSet { offset, size }
    }

    /// Short form used in log lines and dump file names.
    pub fn description(&self) -> String {
        format!("{}_{}", self.offset, self.size)
    }
}

/// Degrees of freedom covered by one cluster: the index set plus the
/// global indices and 3-D coordinates of its points.
#[derive(Clone, Debug)]
pub struct ClusterData {
    offset: usize,
    indices: Vec<usize>,
    coordinates: Vec<[f64; 3]>,
}

impl ClusterData {
    pub fn new(offset: usize, indices: Vec<usize>, coordinates: Vec<[f64; 3]>) -> Self {
        assert_eq!(indices.len(), coordinates.len());
        ClusterData {
            offset,
            indices,
            coordinates,
        }
    }

    /// Cluster over `0..size` with unit-spaced points on the x axis.
    /// Convenient for blocks that are pure index ranges.
    pub fn contiguous(offset: usize, size: usize) -> Self {
        ClusterData {
            offset,
            indices: (offset..offset + size).collect(),
            coordinates: (offset..offset + size)
                .map(|i| [i as f64, 0.0, 0.0])
                .collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.indices.len()
    }

    /// Global DoF index of the local index `i`.
    pub fn global_index(&self, i: usize) -> usize {
        self.indices[i]
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn coordinates(&self) -> &[[f64; 3]] {
        &self.coordinates
    }

    pub fn index_set(&self) -> IndexSet {
        IndexSet::new(self.offset, self.size())
    }

    pub fn description(&self) -> String {
        self.index_set().description()
    }
}

/// Axis-aligned bounding box around a set of points.
#[derive(Clone, Debug, PartialEq)]
pub struct AxisAlignedBoundingBox {
    lower: [f64; 3],
    upper: [f64; 3],
}

impl AxisAlignedBoundingBox {
    pub fn new(points: &[[f64; 3]]) -> Self {
        let mut lower = [0.0; 3];
        let mut upper = [0.0; 3];
        if let Some(first) = points.first() {
            lower = *first;
            upper = *first;
            for p in &points[1..] {
                for axis in 0..3 {
                    lower[axis] = lower[axis].min(p[axis]);
                    upper[axis] = upper[axis].max(p[axis]);
                }
            }
        }
        AxisAlignedBoundingBox { lower, upper }
    }

    /// Length of the box diagonal.
    pub fn diameter(&self) -> f64 {
        let mut sum = 0.0;
        for axis in 0..3 {
            let extent = self.upper[axis] - self.lower[axis];
            sum += extent * extent;
        }
        sum.sqrt()
    }

    /// Euclidean distance between the two boxes, zero when they overlap.
    pub fn distance_to(&self, other: &AxisAlignedBoundingBox) -> f64 {
        let mut sum = 0.0;
        for axis in 0..3 {
            let gap = (self.lower[axis] - other.upper[axis])
                .max(other.lower[axis] - self.upper[axis])
                .max(0.0);
            sum += gap * gap;
        }
        sum.sqrt()
    }
}

/// The compression core's view of a cluster tree node.
///
/// The bounding box is computed by the first admissibility query that
/// needs it and cached in a set-once cell; `clean` drops the cache so a
/// rebuilt geometry starts fresh.
#[derive(Debug)]
pub struct ClusterTree {
    pub data: ClusterData,
    bounding_box: OnceLock<AxisAlignedBoundingBox>,
}

impl ClusterTree {
    pub fn new(data: ClusterData) -> Self {
        ClusterTree {
            data,
            bounding_box: OnceLock::new(),
        }
    }

    pub fn bounding_box(&self) -> &AxisAlignedBoundingBox {
        self.bounding_box
            .get_or_init(|| AxisAlignedBoundingBox::new(self.data.coordinates()))
    }

    /// Drop the cached bounding box.
    pub fn clean(&mut self) {
        self.bounding_box.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(from: f64, to: f64, points: usize) -> Vec<[f64; 3]> {
        (0..points)
            .map(|i| {
                let t = i as f64 / (points - 1) as f64;
                [from + t * (to - from), 0.0, 0.0]
            })
            .collect()
    }

    #[test]
    fn test_bounding_box_diameter() {
        let bbox = AxisAlignedBoundingBox::new(&[[0.0, 0.0, 0.0], [3.0, 4.0, 0.0]]);
        assert_eq!(bbox.diameter(), 5.0);
    }

    #[test]
    fn test_bounding_box_distance_is_symmetric() {
        let a = AxisAlignedBoundingBox::new(&segment(0.0, 1.0, 8));
        let b = AxisAlignedBoundingBox::new(&segment(1.4, 2.4, 8));
        assert!((a.distance_to(&b) - 0.4).abs() < 1e-14);
        assert_eq!(a.distance_to(&b), b.distance_to(&a));
    }

    #[test]
    fn test_overlapping_boxes_have_zero_distance() {
        let a = AxisAlignedBoundingBox::new(&segment(0.0, 2.0, 4));
        let b = AxisAlignedBoundingBox::new(&segment(1.0, 3.0, 4));
        assert_eq!(a.distance_to(&b), 0.0);
    }

    #[test]
    fn test_cluster_tree_caches_and_cleans_bounding_box() {
        let mut tree = ClusterTree::new(ClusterData::contiguous(0, 10));
        let diameter = tree.bounding_box().diameter();
        assert_eq!(diameter, 9.0);
        // Cached: same object on the second call.
        assert_eq!(tree.bounding_box().diameter(), diameter);
        tree.clean();
        assert_eq!(tree.bounding_box().diameter(), 9.0);
    }

    #[test]
    fn test_index_set_description() {
        assert_eq!(IndexSet::new(32, 16).description(), "32_16");
        assert_eq!(ClusterData::contiguous(4, 3).index_set(), IndexSet::new(4, 3));
    }
}
