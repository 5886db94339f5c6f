//! Block admissibility predicates.
//!
//! The H-matrix construction asks these predicates whether a pair of
//! clusters is well enough separated for its block to be worth
//! compressing. The standard condition is Hackbusch's
//! `min(diam(rows), diam(cols)) ≤ η · dist(rows, cols)`, guarded by
//! size limits for the methods that assemble the whole block.

use crate::cluster::ClusterTree;
use crate::CompressionMethod;

pub trait AdmissibilityCondition {
    /// True when the block `rows` × `cols` can be stored low-rank.
    fn is_admissible(
        &self,
        rows: &ClusterTree,
        cols: &ClusterTree,
        method: CompressionMethod,
    ) -> bool;

    /// Per-side admissibility: a side is admissible against the other
    /// when it is small enough relative to it. Lets highly rectangular
    /// blocks be handled sideways instead of being subdivided.
    fn is_rows_cols_admissible(&self, rows: &ClusterTree, cols: &ClusterTree) -> (bool, bool);

    /// True when the block should not be created at all.
    fn is_inert(&self, rows: &ClusterTree, cols: &ClusterTree) -> bool;

    /// Release per-node data cached by `is_admissible`.
    fn clean(&self, node: &mut ClusterTree) {
        node.clean();
    }

    fn description(&self) -> String;
}

fn ratio_admissible(rows: &ClusterTree, cols: &ClusterTree, ratio: f64) -> (bool, bool) {
    let row_size = rows.data.size() as f64;
    let col_size = cols.data.size() as f64;
    (row_size * ratio <= col_size, col_size * ratio <= row_size)
}

/// Pairwise size-ratio criterion on its own.
pub struct TallSkinnyAdmissibilityCondition {
    ratio: f64,
}

impl TallSkinnyAdmissibilityCondition {
    pub fn new(ratio: f64) -> Self {
        TallSkinnyAdmissibilityCondition { ratio }
    }
}

impl Default for TallSkinnyAdmissibilityCondition {
    fn default() -> Self {
        TallSkinnyAdmissibilityCondition::new(2.0)
    }
}

impl AdmissibilityCondition for TallSkinnyAdmissibilityCondition {
    fn is_admissible(
        &self,
        _rows: &ClusterTree,
        _cols: &ClusterTree,
        _method: CompressionMethod,
    ) -> bool {
        false
    }

    fn is_rows_cols_admissible(&self, rows: &ClusterTree, cols: &ClusterTree) -> (bool, bool) {
        ratio_admissible(rows, cols, self.ratio)
    }

    fn is_inert(&self, _rows: &ClusterTree, _cols: &ClusterTree) -> bool {
        false
    }

    fn description(&self) -> String {
        format!("size ratio, with ratio = {}", self.ratio)
    }
}

/// Hackbusch's geometric condition with size guards.
pub struct StandardAdmissibilityCondition {
    eta: f64,
    /// Element cap for the methods that assemble the whole block.
    max_elements_per_block: usize,
    /// Optional element cap for the partial methods (0 = off).
    max_elements_per_block_aca: usize,
    /// Accept every small enough block, ignoring `eta`.
    always: bool,
    ratio: f64,
}

impl StandardAdmissibilityCondition {
    pub fn new(eta: f64) -> Self {
        StandardAdmissibilityCondition {
            eta,
            max_elements_per_block: 5_000_000,
            max_elements_per_block_aca: 0,
            always: false,
            ratio: 2.0,
        }
    }

    pub fn with_max_elements(mut self, full: usize, aca: usize) -> Self {
        self.max_elements_per_block = full;
        self.max_elements_per_block_aca = aca;
        self
    }

    pub fn with_always(mut self, always: bool) -> Self {
        self.always = always;
        self
    }

    pub fn set_eta(&mut self, eta: f64) {
        self.eta = eta;
    }
}

impl Default for StandardAdmissibilityCondition {
    fn default() -> Self {
        StandardAdmissibilityCondition::new(2.0)
    }
}

impl AdmissibilityCondition for StandardAdmissibilityCondition {
    fn is_admissible(
        &self,
        rows: &ClusterTree,
        cols: &ClusterTree,
        method: CompressionMethod,
    ) -> bool {
        let elements = rows.data.size() * cols.data.size();
        let full_algorithm = !matches!(
            method,
            CompressionMethod::AcaPartial | CompressionMethod::AcaPlus
        );
        if full_algorithm {
            if elements > self.max_elements_per_block {
                return false;
            }
        } else if self.max_elements_per_block_aca > 0 && elements > self.max_elements_per_block_aca
        {
            return false;
        }
        if rows.data.size() < 2 || cols.data.size() < 2 {
            return false;
        }
        if self.always {
            return true;
        }

        let rows_bbox = rows.bounding_box();
        let cols_bbox = cols.bounding_box();
        rows_bbox.diameter().min(cols_bbox.diameter())
            <= self.eta * rows_bbox.distance_to(cols_bbox)
    }

    fn is_rows_cols_admissible(&self, rows: &ClusterTree, cols: &ClusterTree) -> (bool, bool) {
        ratio_admissible(rows, cols, self.ratio)
    }

    fn is_inert(&self, _rows: &ClusterTree, _cols: &ClusterTree) -> bool {
        false
    }

    fn description(&self) -> String {
        format!("Hackbusch formula, with eta = {}", self.eta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterData;

    fn segment_cluster(from: f64, to: f64, points: usize) -> ClusterTree {
        let coordinates: Vec<[f64; 3]> = (0..points)
            .map(|i| {
                let t = i as f64 / (points - 1) as f64;
                [from + t * (to - from), 0.0, 0.0]
            })
            .collect();
        ClusterTree::new(ClusterData::new(0, (0..points).collect(), coordinates))
    }

    #[test]
    fn test_hackbusch_threshold() {
        let condition = StandardAdmissibilityCondition::new(2.0);
        let rows = segment_cluster(0.0, 1.0, 16);

        // diameters 1 and 1 at distance 0.4: 1 > 2 * 0.4.
        let near = segment_cluster(1.4, 2.4, 16);
        assert!(!condition.is_admissible(&rows, &near, CompressionMethod::AcaPlus));

        // distance 0.6: 1 <= 2 * 0.6.
        let far = segment_cluster(1.6, 2.6, 16);
        assert!(condition.is_admissible(&rows, &far, CompressionMethod::AcaPlus));
    }

    #[test]
    fn test_admissibility_is_symmetric() {
        let condition = StandardAdmissibilityCondition::new(2.0);
        for distance in [0.1, 0.4, 0.5, 0.6, 2.0] {
            let a = segment_cluster(0.0, 1.0, 8);
            let b = segment_cluster(1.0 + distance, 2.0 + distance, 12);
            assert_eq!(
                condition.is_admissible(&a, &b, CompressionMethod::Svd),
                condition.is_admissible(&b, &a, CompressionMethod::Svd),
            );
        }
    }

    #[test]
    fn test_small_clusters_are_rejected() {
        let condition = StandardAdmissibilityCondition::new(2.0);
        let single = segment_cluster(0.0, 0.0, 1);
        let other = segment_cluster(10.0, 11.0, 8);
        assert!(!condition.is_admissible(&single, &other, CompressionMethod::AcaPlus));
        assert!(!condition.is_admissible(&other, &single, CompressionMethod::AcaPlus));
    }

    #[test]
    fn test_element_cap_only_guards_full_methods() {
        let condition = StandardAdmissibilityCondition::new(2.0).with_max_elements(100, 0);
        let rows = segment_cluster(0.0, 1.0, 16);
        let cols = segment_cluster(3.0, 4.0, 16);
        // 256 elements exceed the cap for the assembling methods.
        assert!(!condition.is_admissible(&rows, &cols, CompressionMethod::Svd));
        assert!(!condition.is_admissible(&rows, &cols, CompressionMethod::AcaFull));
        assert!(condition.is_admissible(&rows, &cols, CompressionMethod::AcaPartial));
        assert!(condition.is_admissible(&rows, &cols, CompressionMethod::AcaPlus));
    }

    #[test]
    fn test_aca_element_cap() {
        let condition = StandardAdmissibilityCondition::new(2.0).with_max_elements(100, 100);
        let rows = segment_cluster(0.0, 1.0, 16);
        let cols = segment_cluster(3.0, 4.0, 16);
        assert!(!condition.is_admissible(&rows, &cols, CompressionMethod::AcaPartial));
    }

    #[test]
    fn test_always_ignores_eta_but_not_size() {
        let condition = StandardAdmissibilityCondition::new(2.0).with_always(true);
        let rows = segment_cluster(0.0, 1.0, 8);
        let touching = segment_cluster(0.5, 1.5, 8);
        assert!(condition.is_admissible(&rows, &touching, CompressionMethod::AcaPlus));

        let single = segment_cluster(0.0, 0.0, 1);
        assert!(!condition.is_admissible(&single, &touching, CompressionMethod::AcaPlus));
    }

    #[test]
    fn test_tall_skinny_pair() {
        let condition = TallSkinnyAdmissibilityCondition::new(2.0);
        let rows = segment_cluster(0.0, 1.0, 100);
        let cols = segment_cluster(5.0, 6.0, 10);
        assert_eq!(condition.is_rows_cols_admissible(&rows, &cols), (false, true));
        assert_eq!(condition.is_rows_cols_admissible(&cols, &rows), (true, false));

        let balanced = segment_cluster(5.0, 6.0, 80);
        assert_eq!(
            condition.is_rows_cols_admissible(&rows, &balanced),
            (false, false)
        );
    }

    #[test]
    fn test_standard_condition_is_never_inert() {
        let condition = StandardAdmissibilityCondition::default();
        let a = segment_cluster(0.0, 1.0, 4);
        let b = segment_cluster(2.0, 3.0, 4);
        assert!(!condition.is_inert(&a, &b));
    }
}
