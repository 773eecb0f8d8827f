// crates/rg_grid/src/builder.rs

//! 规则网格构建器
//!
//! 生成规则六面体组成的主网格，以及在主网格指定 IJK 范围内细分得到的
//! 局部加密网格定义。每个单元使用独立的 8 个节点，
//! 因此可以通过逐柱的 Z 偏移构造断层落差。

use glam::DVec3;
use rg_config::GeometryConfig;

use crate::error::{GridError, GridResult};
use crate::main_grid::{LocalGridDefinition, MainGrid};

/// 角点相对单元 (i, j, k) 的偏移
const CORNER_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

type ColumnOffsetFn = Box<dyn Fn(usize, usize) -> f64 + Send + Sync>;

/// 规则网格构建器
///
/// # 示例
///
/// ```
/// use glam::DVec3;
/// use rg_grid::builder::CartesianGridBuilder;
///
/// let grid = CartesianGridBuilder::new([4, 3, 2])
///     .with_spacing(DVec3::new(100.0, 100.0, 10.0))
///     .with_origin(DVec3::new(0.0, 0.0, -2000.0))
///     .build()
///     .unwrap();
/// assert_eq!(grid.reservoir_cell_count(), 24);
/// ```
pub struct CartesianGridBuilder {
    dims: [usize; 3],
    spacing: DVec3,
    origin: DVec3,
    k_downwards: bool,
    column_offset: Option<ColumnOffsetFn>,
    geometry: GeometryConfig,
}

impl std::fmt::Debug for CartesianGridBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartesianGridBuilder")
            .field("dims", &self.dims)
            .field("spacing", &self.spacing)
            .field("origin", &self.origin)
            .field("k_downwards", &self.k_downwards)
            .field("column_offset", &self.column_offset.is_some())
            .finish()
    }
}

impl CartesianGridBuilder {
    /// 创建构建器（单位间距、原点在零点、K 向上）
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            spacing: DVec3::ONE,
            origin: DVec3::ZERO,
            k_downwards: false,
            column_offset: None,
            geometry: GeometryConfig::default(),
        }
    }

    /// 单元尺寸
    pub fn with_spacing(mut self, spacing: DVec3) -> Self {
        self.spacing = spacing;
        self
    }

    /// 原点
    pub fn with_origin(mut self, origin: DVec3) -> Self {
        self.origin = origin;
        self
    }

    /// K 向下（深度方向）编号
    pub fn with_k_downwards(mut self, enable: bool) -> Self {
        self.k_downwards = enable;
        self
    }

    /// 逐柱的 Z 偏移，用于构造断层落差
    pub fn with_column_offset<F>(mut self, offset: F) -> Self
    where
        F: Fn(usize, usize) -> f64 + Send + Sync + 'static,
    {
        self.column_offset = Some(Box::new(offset));
        self
    }

    /// 几何参数
    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    /// 构建主网格
    ///
    /// # 错误
    /// 任一方向单元数为零或间距非正时返回 `InvalidTopology`
    pub fn build(self) -> GridResult<MainGrid> {
        let [ni, nj, nk] = self.dims;
        if ni == 0 || nj == 0 || nk == 0 {
            return Err(GridError::invalid_topology("CartesianGridBuilder::build", "单元数不能为零"));
        }
        if self.spacing.min_element() <= 0.0 {
            return Err(GridError::invalid_topology("CartesianGridBuilder::build", "单元间距必须为正"));
        }

        let cell_count = ni * nj * nk;
        let mut nodes = Vec::with_capacity(cell_count * 8);
        let mut corner_indices = Vec::with_capacity(cell_count);
        let k_sign = if self.k_downwards { -1.0 } else { 1.0 };

        for k in 0..nk {
            for j in 0..nj {
                for i in 0..ni {
                    let throw = self.column_offset.as_ref().map_or(0.0, |f| f(i, j));
                    let base = nodes.len();
                    for [di, dj, dk] in CORNER_OFFSETS {
                        nodes.push(DVec3::new(
                            self.origin.x + (i + di) as f64 * self.spacing.x,
                            self.origin.y + (j + dj) as f64 * self.spacing.y,
                            self.origin.z + k_sign * (k + dk) as f64 * self.spacing.z + throw,
                        ));
                    }
                    corner_indices.push(std::array::from_fn(|c| base + c));
                }
            }
        }

        MainGrid::new(self.dims, nodes, corner_indices, self.geometry)
    }
}

impl LocalGridDefinition {
    /// 在主网格 IJK 范围内均匀细分
    ///
    /// 子单元角点由父单元 8 个角点三线性插值得到。
    ///
    /// # 参数
    /// - `grid`: 主网格
    /// - `min_ijk`/`max_ijk`: 父单元范围（闭区间）
    /// - `refinement`: 每个父单元在 I/J/K 方向的细分数
    ///
    /// # 错误
    /// 范围越界、上下界颠倒或细分数为零时返回 `InvalidTopology`
    pub fn refine_box(
        grid: &MainGrid,
        name: impl Into<String>,
        grid_id: i32,
        min_ijk: [usize; 3],
        max_ijk: [usize; 3],
        refinement: [usize; 3],
    ) -> GridResult<Self> {
        let main = grid.main_grid();
        let dims_ok = (0..3).all(|a| min_ijk[a] <= max_ijk[a] && max_ijk[a] < main.dims()[a]);
        if !dims_ok || refinement.contains(&0) {
            return Err(GridError::invalid_topology(
                "refine_box",
                format!("范围 {:?}..={:?} 或细分 {:?} 无效", min_ijk, max_ijk, refinement),
            ));
        }

        let dims: [usize; 3] = std::array::from_fn(|a| (max_ijk[a] - min_ijk[a] + 1) * refinement[a]);
        let cell_count = dims[0] * dims[1] * dims[2];
        let mut nodes = Vec::with_capacity(cell_count * 8);
        let mut corner_indices = Vec::with_capacity(cell_count);
        let mut parent_cells = Vec::with_capacity(cell_count);

        for lk in 0..dims[2] {
            for lj in 0..dims[1] {
                for li in 0..dims[0] {
                    let local = [li, lj, lk];
                    let parent_ijk: [usize; 3] = std::array::from_fn(|a| min_ijk[a] + local[a] / refinement[a]);
                    let parent = main.reservoir_cell_index(main.cell_index_from_ijk(
                        parent_ijk[0],
                        parent_ijk[1],
                        parent_ijk[2],
                    ));
                    let corners = grid.cells()[parent].corners(grid.nodes());

                    let base = nodes.len();
                    for offset in CORNER_OFFSETS {
                        let uvw: [f64; 3] = std::array::from_fn(|a| {
                            ((local[a] % refinement[a]) + offset[a]) as f64 / refinement[a] as f64
                        });
                        nodes.push(trilinear(&corners, uvw));
                    }
                    corner_indices.push(std::array::from_fn(|c| base + c));
                    parent_cells.push(parent);
                }
            }
        }

        Ok(Self {
            name: name.into(),
            grid_id,
            dims,
            nodes,
            corner_indices,
            parent_cells,
        })
    }
}

/// 六面体角点的三线性插值
fn trilinear(c: &[DVec3; 8], [u, v, w]: [f64; 3]) -> DVec3 {
    let bilinear = |p0: DVec3, p1: DVec3, p2: DVec3, p3: DVec3| {
        (1.0 - u) * (1.0 - v) * p0 + u * (1.0 - v) * p1 + u * v * p2 + (1.0 - u) * v * p3
    };
    let bottom = bilinear(c[0], c[1], c[2], c[3]);
    let top = bilinear(c[4], c[5], c[6], c[7]);
    bottom.lerp(top, w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_unit_grid() {
        let grid = CartesianGridBuilder::new([2, 2, 2]).build().unwrap();
        assert_eq!(grid.nodes().len(), 64);
        for g in 0..8 {
            assert!((grid.cell_volume(g).unwrap() - 1.0).abs() < 1e-12);
        }
        let c = grid.cell_center(7).unwrap();
        assert!((c - DVec3::splat(1.5)).length() < 1e-12);
    }

    #[test]
    fn test_build_rejects_empty_dims() {
        assert!(CartesianGridBuilder::new([0, 2, 2]).build().is_err());
        assert!(CartesianGridBuilder::new([1, 1, 1])
            .with_spacing(DVec3::new(1.0, 0.0, 1.0))
            .build()
            .is_err());
    }

    #[test]
    fn test_column_offset_shifts_z() {
        let grid = CartesianGridBuilder::new([2, 1, 1])
            .with_column_offset(|i, _| if i == 1 { 0.5 } else { 0.0 })
            .build()
            .unwrap();
        let c0 = grid.cell_center(0).unwrap();
        let c1 = grid.cell_center(1).unwrap();
        assert!((c1.z - c0.z - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_refine_box() {
        let grid = CartesianGridBuilder::new([2, 2, 1]).build().unwrap();
        let lgr = LocalGridDefinition::refine_box(&grid, "LGR1", 1, [1, 1, 0], [1, 1, 0], [2, 2, 2]).unwrap();
        assert_eq!(lgr.dims, [2, 2, 2]);
        assert_eq!(lgr.corner_indices.len(), 8);
        assert!(lgr.parent_cells.iter().all(|&p| p == 3));

        // 子单元体积之和等于父单元体积
        let volume: f64 = lgr
            .corner_indices
            .iter()
            .map(|corners| {
                let cell = crate::cell::Cell::new(*corners, 1, 0);
                cell.volume(&lgr.nodes)
            })
            .sum();
        assert!((volume - 1.0).abs() < 1e-12);

        assert!(LocalGridDefinition::refine_box(&grid, "bad", 2, [0, 0, 0], [2, 0, 0], [1, 1, 1]).is_err());
        assert!(LocalGridDefinition::refine_box(&grid, "bad", 2, [0, 0, 0], [0, 0, 0], [0, 1, 1]).is_err());
    }
}
