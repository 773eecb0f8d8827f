// crates/rg_grid/src/spatial_index.rs

//! 单元空间索引
//!
//! 基于 R-Tree 的三维包围盒索引，用于区域相交查询与点定位候选筛选。
//! 使用 rstar crate 实现。
//!
//! # 功能特性
//!
//! - 逐单元包围盒：每个有效单元一个叶子
//! - K 向聚合包围盒：超大网格中按柱聚合若干 K 层（含其中的 LGR 单元），
//!   限制叶子数量与树深度
//! - 点最近邻：[`PointLocator`] 用于距离类结果

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geometry::BoundingBox;

/// 单元包围盒（叶子）
///
/// 聚合模式下一个包围盒对应多个单元。
#[derive(Debug, Clone)]
pub struct CellEnvelope {
    /// 覆盖的全局单元索引
    pub cell_indices: Vec<usize>,
    /// 最小角
    pub min: [f64; 3],
    /// 最大角
    pub max: [f64; 3],
}

impl CellEnvelope {
    /// 由包围盒创建，包围盒无效时返回 `None`
    pub fn from_bounding_box(cell_indices: Vec<usize>, bb: &BoundingBox) -> Option<Self> {
        if !bb.is_valid() || cell_indices.is_empty() {
            return None;
        }
        Some(Self {
            cell_indices,
            min: bb.min.to_array(),
            max: bb.max.to_array(),
        })
    }
}

impl RTreeObject for CellEnvelope {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

/// 单元搜索树
pub struct CellSearchTree {
    tree: RTree<CellEnvelope>,
    aggregated: bool,
}

impl CellSearchTree {
    /// 由叶子批量构建
    pub fn from_envelopes(envelopes: Vec<CellEnvelope>, aggregated: bool) -> Self {
        Self {
            tree: RTree::bulk_load(envelopes),
            aggregated,
        }
    }

    /// 叶子数量
    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.tree.size()
    }

    /// 是否为聚合模式
    #[inline]
    pub fn is_aggregated(&self) -> bool {
        self.aggregated
    }

    /// 查找与包围盒相交的单元
    ///
    /// 聚合模式下返回的是候选集合，调用方需要时自行精确过滤。
    ///
    /// # 返回
    /// 升序、无重复的全局单元索引
    pub fn find_intersections(&self, bb: &BoundingBox) -> Vec<usize> {
        if !bb.is_valid() {
            return Vec::new();
        }
        let envelope = AABB::from_corners(bb.min.to_array(), bb.max.to_array());
        let mut cells: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .flat_map(|leaf| leaf.cell_indices.iter().copied())
            .collect();
        cells.sort_unstable();
        cells.dedup();
        cells
    }
}

// ============================================================
// 点最近邻
// ============================================================

/// 带标签的点
#[derive(Debug, Clone, Copy)]
struct LabeledPoint {
    position: [f64; 3],
}

impl RTreeObject for LabeledPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for LabeledPoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        let dz = self.position[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// 点集最近邻查询
pub struct PointLocator {
    tree: RTree<LabeledPoint>,
}

impl PointLocator {
    /// 由点集构建
    pub fn new(points: &[glam::DVec3]) -> Self {
        let labeled = points
            .iter()
            .map(|p| LabeledPoint {
                position: p.to_array(),
            })
            .collect();
        Self {
            tree: RTree::bulk_load(labeled),
        }
    }

    /// 点集是否为空
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// 到最近点的距离，点集为空时返回 `None`
    pub fn nearest_distance(&self, p: glam::DVec3) -> Option<f64> {
        let query = p.to_array();
        self.tree
            .nearest_neighbor(&query)
            .map(|n| n.distance_2(&query).sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn unit_box(origin: [f64; 3]) -> BoundingBox {
        let o = DVec3::from_array(origin);
        BoundingBox::from_corners(o, o + DVec3::ONE)
    }

    fn create_test_tree() -> CellSearchTree {
        // 2x2x1 排列的单位立方体
        let envelopes = (0..4)
            .filter_map(|i| {
                let origin = [(i % 2) as f64, (i / 2) as f64, 0.0];
                CellEnvelope::from_bounding_box(vec![i], &unit_box(origin))
            })
            .collect();
        CellSearchTree::from_envelopes(envelopes, false)
    }

    #[test]
    fn test_find_intersections() {
        let tree = create_test_tree();
        assert_eq!(tree.leaf_count(), 4);

        let all = BoundingBox::from_corners(DVec3::ZERO, DVec3::new(2.0, 2.0, 1.0));
        assert_eq!(tree.find_intersections(&all), vec![0, 1, 2, 3]);

        let corner = BoundingBox::from_corners(DVec3::splat(0.1), DVec3::splat(0.4));
        assert_eq!(tree.find_intersections(&corner), vec![0]);

        let outside = BoundingBox::from_corners(DVec3::splat(5.0), DVec3::splat(6.0));
        assert!(tree.find_intersections(&outside).is_empty());
        assert!(tree.find_intersections(&BoundingBox::empty()).is_empty());
    }

    #[test]
    fn test_aggregated_leaf_deduplicates() {
        let envelopes = vec![
            CellEnvelope::from_bounding_box(vec![0, 1], &unit_box([0.0, 0.0, 0.0])).unwrap(),
            CellEnvelope::from_bounding_box(vec![1, 2], &unit_box([0.5, 0.0, 0.0])).unwrap(),
        ];
        let tree = CellSearchTree::from_envelopes(envelopes, true);
        assert!(tree.is_aggregated());
        let hits = tree.find_intersections(&unit_box([0.6, 0.0, 0.0]));
        assert_eq!(hits, vec![0, 1, 2]);
    }

    #[test]
    fn test_invalid_envelope_rejected() {
        assert!(CellEnvelope::from_bounding_box(vec![0], &BoundingBox::empty()).is_none());
        assert!(CellEnvelope::from_bounding_box(vec![], &unit_box([0.0; 3])).is_none());
    }

    #[test]
    fn test_point_locator() {
        let locator = PointLocator::new(&[DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0)]);
        let d = locator.nearest_distance(DVec3::new(7.0, 0.0, 0.0)).unwrap();
        assert!((d - 3.0).abs() < 1e-12);

        let empty = PointLocator::new(&[]);
        assert!(empty.is_empty());
        assert_eq!(empty.nearest_distance(DVec3::ZERO), None);
    }
}
