// crates/rg_grid/src/geometry.rs

//! 几何工具
//!
//! - [`BoundingBox`]: 三维轴对齐包围盒
//! - [`polygon_area_normal_3d`]: 多边形面积法向（长度等于面积）
//! - [`overlap_polygon_of_two_quads`]: 两个不完全对齐的四边形面的重叠多边形
//! - [`calculate_connection_geometry`]: 两单元相邻面的连接面积向量

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::face::CellFace;

// ============================================================================
// 包围盒
// ============================================================================

/// 轴对齐包围盒
///
/// 新建的包围盒为空（`is_valid() == false`），加入点后有效。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 最小角
    pub min: DVec3,
    /// 最大角
    pub max: DVec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    /// 空包围盒
    pub fn empty() -> Self {
        Self {
            min: DVec3::splat(f64::MAX),
            max: DVec3::splat(f64::MIN),
        }
    }

    /// 由两个角点构造
    pub fn from_corners(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// 由点集构造
    pub fn from_points<'a, I: IntoIterator<Item = &'a DVec3>>(points: I) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.add_point(*p);
        }
        bb
    }

    /// 是否包含至少一个点
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// 扩展以包含点
    #[inline]
    pub fn add_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// 扩展以包含另一个包围盒
    #[inline]
    pub fn add_box(&mut self, other: &BoundingBox) {
        if other.is_valid() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    /// 合并两个包围盒（并行归约）
    pub fn merged(mut self, other: BoundingBox) -> BoundingBox {
        self.add_box(&other);
        self
    }

    /// 是否包含点（闭区间）
    #[inline]
    pub fn contains(&self, p: DVec3) -> bool {
        self.is_valid()
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// 是否与另一个包围盒相交（闭区间）
    #[inline]
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// 尺寸
    #[inline]
    pub fn extent(&self) -> DVec3 {
        if self.is_valid() {
            self.max - self.min
        } else {
            DVec3::ZERO
        }
    }

    /// 中心
    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }
}

// ============================================================================
// 多边形
// ============================================================================

/// 四边形中心（四个角点平均）
#[inline]
pub fn quad_center(quad: &[DVec3; 4]) -> DVec3 {
    (quad[0] + quad[1] + quad[2] + quad[3]) * 0.25
}

/// 多边形面积法向
///
/// 返回方向为多边形法向、长度等于多边形面积的向量。
/// 各分量即多边形在三个坐标平面上的投影面积。
///
/// # 参数
/// - `polygon`: 按环绕顺序排列的顶点
///
/// # 返回
/// 少于 3 个顶点时返回零向量
pub fn polygon_area_normal_3d(polygon: &[DVec3]) -> DVec3 {
    match polygon.len() {
        0..=2 => DVec3::ZERO,
        3 => 0.5 * (polygon[1] - polygon[0]).cross(polygon[2] - polygon[0]),
        // 对角线叉积 = 2A
        4 => 0.5 * (polygon[2] - polygon[0]).cross(polygon[3] - polygon[1]),
        n => {
            let h = (n - 1) / 2;
            let k = if n % 2 == 1 { 0 } else { n - 1 };

            let mut area_normal = DVec3::ZERO;
            for i in 1..h {
                area_normal +=
                    (polygon[2 * i] - polygon[0]).cross(polygon[2 * i + 1] - polygon[2 * i - 1]);
            }
            area_normal += (polygon[2 * h] - polygon[0]).cross(polygon[k] - polygon[2 * h - 1]);

            area_normal * 0.5
        }
    }
}

/// 与 `n` 垂直的单位向量
fn orthonormal_to(n: DVec3) -> DVec3 {
    let axis = if n.x.abs() <= n.y.abs() && n.x.abs() <= n.z.abs() {
        DVec3::X
    } else if n.y.abs() <= n.z.abs() {
        DVec3::Y
    } else {
        DVec3::Z
    };
    axis.cross(n).normalize()
}

/// 二维有向面积的两倍
fn signed_area_2(points: &[[f64; 2]]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a[0] * b[1] - b[0] * a[1]
        })
        .sum()
}

/// 用一条有向边裁剪多边形（Sutherland-Hodgman 的一步）
fn clip_against_edge(subject: &[[f64; 2]], a: [f64; 2], b: [f64; 2], tolerance: f64) -> Vec<[f64; 2]> {
    let edge = [b[0] - a[0], b[1] - a[1]];
    let edge_len = (edge[0] * edge[0] + edge[1] * edge[1]).sqrt();
    let side = |p: [f64; 2]| -> f64 { edge[0] * (p[1] - a[1]) - edge[1] * (p[0] - a[0]) };
    let limit = -tolerance * edge_len;

    let mut output = Vec::with_capacity(subject.len() + 2);
    let n = subject.len();
    for i in 0..n {
        let current = subject[i];
        let next = subject[(i + 1) % n];
        let s_cur = side(current);
        let s_next = side(next);
        let cur_inside = s_cur >= limit;
        let next_inside = s_next >= limit;

        if cur_inside {
            output.push(current);
        }
        if cur_inside != next_inside {
            let t = s_cur / (s_cur - s_next);
            output.push([
                current[0] + t * (next[0] - current[0]),
                current[1] + t * (next[1] - current[1]),
            ]);
        }
    }
    output
}

/// 计算两个四边形的重叠多边形
///
/// 两个面投影到第一个面的平均平面上，在平面内裁剪后再映射回三维。
/// 结果多边形的环绕方向与 `face1` 一致，因此其面积法向与 `face1` 的面积法向同向。
///
/// # 参数
/// - `face1`: 本单元的面角点
/// - `face2`: 相邻单元相对面的角点
/// - `tolerance`: 距离容差
///
/// # 返回
/// 无重叠或退化时返回 `None`
pub fn overlap_polygon_of_two_quads(
    face1: &[DVec3; 4],
    face2: &[DVec3; 4],
    tolerance: f64,
) -> Option<Vec<DVec3>> {
    let mut normal = polygon_area_normal_3d(face1);
    if normal.length_squared() <= tolerance * tolerance * tolerance * tolerance {
        // 本面退化时借用相邻面的法向（取反以保持朝向一致）
        normal = -polygon_area_normal_3d(face2);
        if normal.length_squared() <= tolerance * tolerance * tolerance * tolerance {
            return None;
        }
    }

    let nz = normal.normalize();
    let u = orthonormal_to(nz);
    let v = nz.cross(u);
    let origin = quad_center(face1);

    let project = |p: &DVec3| -> [f64; 2] {
        let d = *p - origin;
        [d.dot(u), d.dot(v)]
    };

    let mut subject: Vec<[f64; 2]> = face1.iter().map(project).collect();
    let mut clip: Vec<[f64; 2]> = face2.iter().map(project).collect();

    let subject_area = signed_area_2(&subject);
    if subject_area < 0.0 {
        subject.reverse();
    }
    let clip_area = signed_area_2(&clip);
    if clip_area.abs() <= tolerance * tolerance {
        return None;
    }
    if clip_area < 0.0 {
        clip.reverse();
    }

    let mut polygon = subject;
    for i in 0..clip.len() {
        if polygon.len() < 3 {
            return None;
        }
        polygon = clip_against_edge(&polygon, clip[i], clip[(i + 1) % clip.len()], tolerance);
    }

    // 去掉重合点
    let mut cleaned: Vec<[f64; 2]> = Vec::with_capacity(polygon.len());
    for p in polygon {
        let duplicate = cleaned.last().map_or(false, |q: &[f64; 2]| {
            (p[0] - q[0]).hypot(p[1] - q[1]) <= tolerance
        });
        if !duplicate {
            cleaned.push(p);
        }
    }
    while cleaned.len() > 1 {
        let (first, last) = (cleaned[0], cleaned[cleaned.len() - 1]);
        if (first[0] - last[0]).hypot(first[1] - last[1]) <= tolerance {
            cleaned.pop();
        } else {
            break;
        }
    }

    if cleaned.len() < 3 || signed_area_2(&cleaned).abs() * 0.5 <= tolerance * tolerance {
        return None;
    }

    if subject_area < 0.0 {
        cleaned.reverse();
    }

    Some(
        cleaned
            .into_iter()
            .map(|p| origin + u * p[0] + v * p[1])
            .collect(),
    )
}

/// 计算两单元相邻面的连接面积向量
///
/// `c1` 的 `face` 面与 `c2` 的相对面求重叠多边形，返回其面积法向。
/// 无重叠时返回零向量。
pub fn calculate_connection_geometry(
    nodes: &[DVec3],
    c1: &Cell,
    c2: &Cell,
    face: CellFace,
    tolerance: f64,
) -> DVec3 {
    connection_polygon(nodes, c1, c2, face, tolerance)
        .map(|polygon| polygon_area_normal_3d(&polygon))
        .unwrap_or(DVec3::ZERO)
}

/// 两单元相邻面的重叠多边形
pub fn connection_polygon(
    nodes: &[DVec3],
    c1: &Cell,
    c2: &Cell,
    face: CellFace,
    tolerance: f64,
) -> Option<Vec<DVec3>> {
    let face1 = c1.face_corners(face, nodes);
    let face2 = c2.face_corners(face.opposite(), nodes);
    overlap_polygon_of_two_quads(&face1, &face2, tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_x(x: f64, y0: f64, z0: f64) -> [DVec3; 4] {
        // 法向 +X 的单位正方形
        [
            DVec3::new(x, y0, z0),
            DVec3::new(x, y0 + 1.0, z0),
            DVec3::new(x, y0 + 1.0, z0 + 1.0),
            DVec3::new(x, y0, z0 + 1.0),
        ]
    }

    #[test]
    fn test_bounding_box() {
        let mut bb = BoundingBox::empty();
        assert!(!bb.is_valid());
        bb.add_point(DVec3::new(1.0, 2.0, 3.0));
        bb.add_point(DVec3::new(-1.0, 0.0, 5.0));
        assert!(bb.is_valid());
        assert_eq!(bb.extent(), DVec3::new(2.0, 2.0, 2.0));
        assert!(bb.contains(DVec3::new(0.0, 1.0, 4.0)));

        let other = BoundingBox::from_corners(DVec3::new(0.5, 0.5, 4.5), DVec3::new(3.0, 3.0, 6.0));
        assert!(bb.intersects(&other));
        let far = BoundingBox::from_corners(DVec3::splat(10.0), DVec3::splat(11.0));
        assert!(!bb.intersects(&far));
    }

    #[test]
    fn test_polygon_area_normal() {
        let quad = unit_square_x(0.0, 0.0, 0.0);
        let n = polygon_area_normal_3d(&quad);
        assert!((n - DVec3::X).length() < 1e-12);

        // 五边形: 单位正方形加一个边中点
        let pentagon = vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(0.5, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        let n = polygon_area_normal_3d(&pentagon);
        assert!((n.z - 1.0).abs() < 1e-12);

        assert_eq!(polygon_area_normal_3d(&pentagon[..2]), DVec3::ZERO);
    }

    #[test]
    fn test_overlap_identical_quads() {
        let face1 = unit_square_x(1.0, 0.0, 0.0);
        let mut face2 = face1;
        face2.reverse();
        let polygon = overlap_polygon_of_two_quads(&face1, &face2, 1e-6).unwrap();
        let n = polygon_area_normal_3d(&polygon);
        assert!((n - DVec3::X).length() < 1e-9);
    }

    #[test]
    fn test_overlap_half_offset() {
        // 断距半格：重叠面积 0.5
        let face1 = unit_square_x(1.0, 0.0, 0.0);
        let face2 = unit_square_x(1.0, 0.0, 0.5);
        let polygon = overlap_polygon_of_two_quads(&face1, &face2, 1e-6).unwrap();
        let n = polygon_area_normal_3d(&polygon);
        assert!((n.x - 0.5).abs() < 1e-9);
        assert!(n.y.abs() < 1e-9 && n.z.abs() < 1e-9);
    }

    #[test]
    fn test_no_overlap() {
        let face1 = unit_square_x(1.0, 0.0, 0.0);
        let face2 = unit_square_x(1.0, 0.0, 2.0);
        assert!(overlap_polygon_of_two_quads(&face1, &face2, 1e-6).is_none());
    }
}
