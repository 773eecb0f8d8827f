// crates/rg_grid/src/cell.rs

//! 角点单元
//!
//! 单元本身只保存 8 个角点在全局节点表中的索引，
//! 所有几何量都以节点表为参数计算，单元不持有坐标。

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::face::CellFace;
use crate::geometry::{quad_center, BoundingBox};

/// 角点单元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// 8 个角点在全局节点表中的索引
    corner_indices: [usize; 8],
    /// 宿主网格序号（0 为主网格）
    host_grid_index: usize,
    /// 在宿主网格中的局部索引
    grid_local_cell_index: usize,
    /// 对应的主网格单元索引
    main_grid_cell_index: usize,
    /// 父单元（LGR 单元所在的粗网格单元）
    parent_cell_index: Option<usize>,
    /// 细化子网格序号
    sub_grid_index: Option<usize>,
    /// 粗化盒序号
    coarsening_box_index: Option<usize>,
    /// 无效标记
    invalid: bool,
}

impl Cell {
    /// 创建单元
    pub fn new(corner_indices: [usize; 8], host_grid_index: usize, grid_local_cell_index: usize) -> Self {
        Self {
            corner_indices,
            host_grid_index,
            grid_local_cell_index,
            main_grid_cell_index: grid_local_cell_index,
            parent_cell_index: None,
            sub_grid_index: None,
            coarsening_box_index: None,
            invalid: false,
        }
    }

    // ========================================================================
    // 拓扑属性
    // ========================================================================

    /// 角点索引
    #[inline]
    pub fn corner_indices(&self) -> &[usize; 8] {
        &self.corner_indices
    }

    /// 宿主网格序号
    #[inline]
    pub fn host_grid_index(&self) -> usize {
        self.host_grid_index
    }

    /// 宿主网格中的局部索引
    #[inline]
    pub fn grid_local_cell_index(&self) -> usize {
        self.grid_local_cell_index
    }

    /// 主网格单元索引
    #[inline]
    pub fn main_grid_cell_index(&self) -> usize {
        self.main_grid_cell_index
    }

    /// 设置主网格单元索引
    pub fn set_main_grid_cell_index(&mut self, index: usize) {
        self.main_grid_cell_index = index;
    }

    /// 父单元索引
    #[inline]
    pub fn parent_cell_index(&self) -> Option<usize> {
        self.parent_cell_index
    }

    /// 设置父单元索引
    pub fn set_parent_cell_index(&mut self, index: Option<usize>) {
        self.parent_cell_index = index;
    }

    /// 子网格序号
    #[inline]
    pub fn sub_grid_index(&self) -> Option<usize> {
        self.sub_grid_index
    }

    /// 设置子网格序号
    pub fn set_sub_grid_index(&mut self, index: Option<usize>) {
        self.sub_grid_index = index;
    }

    /// 粗化盒序号
    #[inline]
    pub fn coarsening_box_index(&self) -> Option<usize> {
        self.coarsening_box_index
    }

    /// 设置粗化盒序号
    pub fn set_coarsening_box_index(&mut self, index: Option<usize>) {
        self.coarsening_box_index = index;
    }

    /// 是否无效
    #[inline]
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// 设置无效标记
    pub fn set_invalid(&mut self, invalid: bool) {
        self.invalid = invalid;
    }

    // ========================================================================
    // 几何
    // ========================================================================

    /// 面的四个角点在全局节点表中的索引
    #[inline]
    pub fn face_indices(&self, face: CellFace) -> [usize; 4] {
        face.vertex_indices().map(|c| self.corner_indices[c])
    }

    /// 面的四个角点坐标
    #[inline]
    pub fn face_corners(&self, face: CellFace, nodes: &[DVec3]) -> [DVec3; 4] {
        self.face_indices(face).map(|n| nodes[n])
    }

    /// 8 个角点坐标
    #[inline]
    pub fn corners(&self, nodes: &[DVec3]) -> [DVec3; 8] {
        self.corner_indices.map(|n| nodes[n])
    }

    /// 单元中心（角点平均）
    pub fn center(&self, nodes: &[DVec3]) -> DVec3 {
        self.corners(nodes).iter().copied().sum::<DVec3>() / 8.0
    }

    /// 面中心
    pub fn face_center(&self, face: CellFace, nodes: &[DVec3]) -> DVec3 {
        quad_center(&self.face_corners(face, nodes))
    }

    /// 面法向（长度等于面积）
    ///
    /// 取两条对角线叉积的一半。方向由节点环绕顺序决定，
    /// 整个网格的朝向需通过 `MainGrid::is_face_normals_outwards` 判断。
    pub fn face_normal_with_area_length(&self, face: CellFace, nodes: &[DVec3]) -> DVec3 {
        let v = self.face_corners(face, nodes);
        0.5 * (v[2] - v[0]).cross(v[3] - v[1])
    }

    /// 单元体积
    ///
    /// 以对角线 0-6 为公共边分解为 6 个四面体求和。
    pub fn volume(&self, nodes: &[DVec3]) -> f64 {
        const RING: [usize; 6] = [1, 2, 3, 7, 4, 5];
        let c = self.corners(nodes);
        let diagonal = c[6] - c[0];

        let mut six_volume = 0.0;
        for i in 0..RING.len() {
            let a = c[RING[i]] - c[0];
            let b = c[RING[(i + 1) % RING.len()]] - c[0];
            six_volume += diagonal.dot(a.cross(b));
        }
        (six_volume / 6.0).abs()
    }

    /// 包围盒
    pub fn bounding_box(&self, nodes: &[DVec3]) -> BoundingBox {
        BoundingBox::from_points(self.corner_indices.iter().map(|&n| &nodes[n]))
    }

    /// 是否为长金字塔形退化单元
    ///
    /// 逐面检查：
    /// - 恰有一条边塌缩（三角形面）时，侧边长度超过剩余底边 `max_height_factor` 倍；
    /// - 无塌缩边时，对边长度比或两条对角线长度比超过 `max_height_factor`。
    ///
    /// 塌缩判定长度为 `node_near_tolerance_factor × 单元最长边`。
    pub fn is_long_pyramid_cell(
        &self,
        nodes: &[DVec3],
        max_height_factor: f64,
        node_near_tolerance_factor: f64,
    ) -> bool {
        let mut longest_edge: f64 = 0.0;
        for face in CellFace::ALL {
            let v = self.face_corners(face, nodes);
            for i in 0..4 {
                longest_edge = longest_edge.max((v[(i + 1) % 4] - v[i]).length());
            }
        }
        if longest_edge <= 0.0 {
            return false;
        }
        let near = node_near_tolerance_factor * longest_edge;

        for face in CellFace::ALL {
            let v = self.face_corners(face, nodes);
            let edges: [f64; 4] = std::array::from_fn(|i| (v[(i + 1) % 4] - v[i]).length());
            let collapsed: Vec<usize> = (0..4).filter(|&i| edges[i] < near).collect();

            match collapsed.len() {
                0 => {
                    for (a, b) in [(edges[0], edges[2]), (edges[1], edges[3])] {
                        if a.max(b) > max_height_factor * a.min(b) {
                            return true;
                        }
                    }
                    let d1 = (v[2] - v[0]).length();
                    let d2 = (v[3] - v[1]).length();
                    if d1.max(d2) > max_height_factor * d1.min(d2) {
                        return true;
                    }
                }
                1 => {
                    let c = collapsed[0];
                    let base = edges[(c + 2) % 4];
                    let side = edges[(c + 1) % 4].max(edges[(c + 3) % 4]);
                    if side > max_height_factor * base {
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// 是否为塌缩单元
    ///
    /// 上下对应角点（i 与 i+4）重合的对数达到 4 时判定为塌缩。
    pub fn is_collapsed_cell(&self, nodes: &[DVec3], tolerance: f64) -> bool {
        let c = self.corners(nodes);
        let coincident = (0..4)
            .filter(|&i| (c[i] - c[i + 4]).length() < tolerance)
            .count();
        coincident >= 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 以 `origin` 为起点、尺寸为 `size` 的长方体单元
    fn box_cell(origin: DVec3, size: DVec3) -> (Cell, Vec<DVec3>) {
        let offsets = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let nodes: Vec<DVec3> = offsets
            .iter()
            .map(|o| origin + DVec3::from_array(*o) * size)
            .collect();
        (Cell::new([0, 1, 2, 3, 4, 5, 6, 7], 0, 0), nodes)
    }

    #[test]
    fn test_center_and_volume() {
        let (cell, nodes) = box_cell(DVec3::ZERO, DVec3::new(2.0, 3.0, 4.0));
        assert!((cell.center(&nodes) - DVec3::new(1.0, 1.5, 2.0)).length() < 1e-12);
        assert!((cell.volume(&nodes) - 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_face_normals_point_outwards_for_k_up() {
        let (cell, nodes) = box_cell(DVec3::ZERO, DVec3::ONE);
        let center = cell.center(&nodes);
        for face in CellFace::ALL {
            let n = cell.face_normal_with_area_length(face, &nodes);
            let to_face = cell.face_center(face, &nodes) - center;
            assert!((n.length() - 1.0).abs() < 1e-12);
            assert!(n.dot(to_face) > 0.0, "{:?}", face);
        }
    }

    #[test]
    fn test_face_area_scales() {
        let (cell, nodes) = box_cell(DVec3::ZERO, DVec3::new(2.0, 3.0, 4.0));
        let n = cell.face_normal_with_area_length(CellFace::PosI, &nodes);
        assert!((n.x - 12.0).abs() < 1e-12);
        let n = cell.face_normal_with_area_length(CellFace::NegK, &nodes);
        assert!((n.z + 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_regular_cell_is_not_degenerate() {
        let (cell, nodes) = box_cell(DVec3::ZERO, DVec3::new(100.0, 100.0, 5.0));
        assert!(!cell.is_long_pyramid_cell(&nodes, 5.0, 1e-3));
        assert!(!cell.is_collapsed_cell(&nodes, 1e-6));
    }

    #[test]
    fn test_long_pyramid_cell() {
        // 顶面四点收拢到一个很高的尖点
        let (cell, mut nodes) = box_cell(DVec3::ZERO, DVec3::ONE);
        for n in nodes.iter_mut().skip(4) {
            *n = DVec3::new(0.5, 0.5, 50.0);
        }
        assert!(cell.is_long_pyramid_cell(&nodes, 5.0, 1e-3));
    }

    #[test]
    fn test_collapsed_cell() {
        let (cell, mut nodes) = box_cell(DVec3::ZERO, DVec3::ONE);
        for i in 4..8 {
            nodes[i] = nodes[i - 4];
        }
        assert!(cell.is_collapsed_cell(&nodes, 1e-6));
        assert!(cell.volume(&nodes) < 1e-12);
    }

    #[test]
    fn test_bounding_box() {
        let (cell, nodes) = box_cell(DVec3::new(1.0, 1.0, 1.0), DVec3::ONE);
        let bb = cell.bounding_box(&nodes);
        assert_eq!(bb.min, DVec3::ONE);
        assert_eq!(bb.max, DVec3::splat(2.0));
    }
}
