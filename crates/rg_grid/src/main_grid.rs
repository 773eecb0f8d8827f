// crates/rg_grid/src/main_grid.rs

//! 主网格 - 网格拓扑的唯一所有者
//!
//! 持有全局节点表、全局单元数组、主网格与局部加密网格 (LGR) 描述、
//! 断层及其单元面查找表、NNC 数据和单元搜索树。
//!
//! # 不变量
//!
//! - 全局单元索引 = 网格偏移 + 局部索引，反向映射精确且完整
//! - 网格构建完成后只读（轴翻转与截断 I 方向单元除外）
//! - 面法向朝向与搜索树均为惰性计算、读多写少的缓存，
//!   修改几何的操作会使其失效
//!
//! # 示例
//!
//! ```
//! use rg_grid::builder::CartesianGridBuilder;
//!
//! let grid = CartesianGridBuilder::new([2, 2, 2]).build().unwrap();
//! assert_eq!(grid.reservoir_cell_count(), 8);
//! assert!(grid.is_face_normals_outwards());
//! ```

use glam::DVec3;
use parking_lot::RwLock;
use rayon::prelude::*;
use rg_config::GeometryConfig;
use std::sync::{Arc, OnceLock};

use crate::active_cell_info::ActiveCellInfo;
use crate::cell::Cell;
use crate::error::{GridError, GridResult};
use crate::face::{Axis, CellFace};
use crate::fault::{
    Fault, FaultFace, FaultsPerCellAccumulator, UNDEFINED_GRID_FAULT_NAME,
    UNDEFINED_GRID_FAULT_WITH_INACTIVE_NAME,
};
use crate::geometry::{connection_polygon, polygon_area_normal_3d, BoundingBox};
use crate::grid::GridBase;
use crate::nnc::NncData;
use crate::spatial_index::{CellEnvelope, CellSearchTree};

/// 主网格名称
pub const MAIN_GRID_NAME: &str = "Main Grid";

/// 估算特征尺寸时最多采样的单元数
const CHARACTERISTIC_SAMPLE_COUNT: usize = 1000;

/// 局部加密网格定义
///
/// 节点索引相对于 `nodes`，注册时整体平移到全局节点表末尾。
#[derive(Debug, Clone)]
pub struct LocalGridDefinition {
    /// 网格名称
    pub name: String,
    /// 文件中的网格编号
    pub grid_id: i32,
    /// I/J/K 方向单元数
    pub dims: [usize; 3],
    /// 本网格节点
    pub nodes: Vec<DVec3>,
    /// 每个单元的 8 个角点（相对 `nodes`），按局部索引排列
    pub corner_indices: Vec<[usize; 8]>,
    /// 每个单元的父单元全局索引
    pub parent_cells: Vec<usize>,
}

/// 主网格
pub struct MainGrid {
    /// 全局节点表
    nodes: Vec<DVec3>,
    /// 全局单元数组（主网格单元在前，LGR 依次追加）
    cells: Vec<Cell>,
    /// 网格描述，`grids[0]` 为主网格
    grids: Vec<GridBase>,
    /// 断层
    faults: Vec<Fault>,
    /// 单元面断层查找表
    fault_lookup: Option<FaultsPerCellAccumulator>,
    /// NNC 数据
    nnc_data: NncData,
    /// 双孔隙模型
    dual_porosity: bool,
    /// 当前轴翻转状态 (X, Y)
    flip_axis: (bool, bool),
    /// 面法向是否朝外（惰性计算）
    face_normals_outwards: OnceLock<bool>,
    /// 单元搜索树（惰性构建）
    cell_search_tree: RwLock<Option<Arc<CellSearchTree>>>,
    /// 几何参数
    geometry: GeometryConfig,
}

impl std::fmt::Debug for MainGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainGrid")
            .field("dims", &self.main_grid().dims())
            .field("grid_count", &self.grids.len())
            .field("cell_count", &self.cells.len())
            .field("node_count", &self.nodes.len())
            .field("fault_count", &self.faults.len())
            .finish()
    }
}

impl MainGrid {
    // ========================================================================
    // 构造
    // ========================================================================

    /// 由节点与单元角点创建主网格
    ///
    /// # 参数
    /// - `dims`: I/J/K 方向单元数
    /// - `nodes`: 全局节点表
    /// - `corner_indices`: 每个单元的 8 个角点，按 `i + j*ni + k*ni*nj` 排列
    /// - `geometry`: 几何参数
    ///
    /// # 错误
    /// - 单元数与 `dims` 不一致时返回 `SizeMismatch`
    /// - 角点索引越界时返回 `InvalidTopology`
    pub fn new(
        dims: [usize; 3],
        nodes: Vec<DVec3>,
        corner_indices: Vec<[usize; 8]>,
        geometry: GeometryConfig,
    ) -> GridResult<Self> {
        let expected = dims[0] * dims[1] * dims[2];
        if corner_indices.len() != expected {
            return Err(GridError::size_mismatch("main_grid_cells", expected, corner_indices.len()));
        }
        check_corner_indices(&corner_indices, nodes.len(), "MainGrid::new")?;

        let cells = corner_indices
            .into_iter()
            .enumerate()
            .map(|(local, corners)| Cell::new(corners, 0, local))
            .collect();

        Ok(Self {
            nodes,
            cells,
            grids: vec![GridBase::new(0, 0, MAIN_GRID_NAME, dims, 0)],
            faults: Vec::new(),
            fault_lookup: None,
            nnc_data: NncData::new(),
            dual_porosity: false,
            flip_axis: (false, false),
            face_normals_outwards: OnceLock::new(),
            cell_search_tree: RwLock::new(None),
            geometry,
        })
    }

    /// 注册局部加密网格
    ///
    /// 新单元追加到全局单元数组末尾，父单元记录子网格序号，
    /// 所有子单元的主网格单元索引随之更新。
    ///
    /// # 返回
    /// 新网格序号
    ///
    /// # 错误
    /// 单元数、父单元数与 `dims` 不一致，或父单元/角点索引越界时返回错误
    pub fn add_local_grid(&mut self, def: LocalGridDefinition) -> GridResult<usize> {
        let expected = def.dims[0] * def.dims[1] * def.dims[2];
        if def.corner_indices.len() != expected {
            return Err(GridError::size_mismatch("lgr_cells", expected, def.corner_indices.len()));
        }
        if def.parent_cells.len() != expected {
            return Err(GridError::size_mismatch("lgr_parent_cells", expected, def.parent_cells.len()));
        }
        check_corner_indices(&def.corner_indices, def.nodes.len(), "add_local_grid")?;
        if let Some(&bad) = def.parent_cells.iter().find(|&&p| p >= self.cells.len()) {
            return Err(GridError::invalid_topology(
                "add_local_grid",
                format!("父单元 {} 超出单元总数 {}", bad, self.cells.len()),
            ));
        }

        let grid_index = self.grids.len();
        let cell_offset = self.cells.len();
        let node_offset = self.nodes.len();

        let parent_grid = def
            .parent_cells
            .first()
            .map(|&p| self.cells[p].host_grid_index())
            .unwrap_or(0);
        let mut grid = GridBase::new(grid_index, def.grid_id, def.name, def.dims, cell_offset);
        grid.set_parent_grid_index(Some(parent_grid));

        self.nodes.extend(def.nodes);
        for (local, (corners, &parent)) in def.corner_indices.iter().zip(&def.parent_cells).enumerate() {
            let mut cell = Cell::new(corners.map(|n| n + node_offset), grid_index, local);
            cell.set_parent_cell_index(Some(parent));
            self.cells.push(cell);
            self.cells[parent].set_sub_grid_index(Some(grid_index));
        }
        self.grids.push(grid);

        self.init_all_sub_cells_main_grid_cell_index();
        self.reset_cell_search_tree();

        log::debug!(
            "注册 LGR #{}: {} 个单元, 父网格 {}",
            grid_index,
            expected,
            parent_grid
        );
        Ok(grid_index)
    }

    /// 沿父单元链为所有子单元设置主网格单元索引
    ///
    /// 父单元总在子单元之前，按顺序一遍即可。
    pub fn init_all_sub_cells_main_grid_cell_index(&mut self) {
        for g in 0..self.cells.len() {
            let main_index = match self.cells[g].parent_cell_index() {
                Some(parent) => self.cells[parent].main_grid_cell_index(),
                None => g,
            };
            self.cells[g].set_main_grid_cell_index(main_index);
        }
    }

    // ========================================================================
    // 网格与单元查询
    // ========================================================================

    /// 几何参数
    pub fn geometry_config(&self) -> &GeometryConfig {
        &self.geometry
    }

    /// 全局节点表
    #[inline]
    pub fn nodes(&self) -> &[DVec3] {
        &self.nodes
    }

    /// 全局单元数组
    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// 全局单元
    #[inline]
    pub fn cell(&self, reservoir_cell_index: usize) -> Option<&Cell> {
        self.cells.get(reservoir_cell_index)
    }

    /// 全局单元总数（含所有网格层级）
    #[inline]
    pub fn reservoir_cell_count(&self) -> usize {
        self.cells.len()
    }

    /// 网格数（主网格 + LGR）
    #[inline]
    pub fn grid_count(&self) -> usize {
        self.grids.len()
    }

    /// 主网格描述
    #[inline]
    pub fn main_grid(&self) -> &GridBase {
        &self.grids[0]
    }

    /// 按序号取网格
    pub fn grid_by_index(&self, grid_index: usize) -> Option<&GridBase> {
        self.grids.get(grid_index)
    }

    /// 按名称取网格
    pub fn grid_by_name(&self, name: &str) -> Option<&GridBase> {
        self.grids.iter().find(|g| g.name() == name)
    }

    /// 主网格 I 方向单元数
    pub fn cell_count_i(&self) -> usize {
        self.main_grid().cell_count_i()
    }

    /// 主网格 J 方向单元数
    pub fn cell_count_j(&self) -> usize {
        self.main_grid().cell_count_j()
    }

    /// 主网格 K 方向单元数
    pub fn cell_count_k(&self) -> usize {
        self.main_grid().cell_count_k()
    }

    /// 全局索引 → (网格序号, 网格局部索引)
    pub fn grid_and_grid_local_index_from_global_cell_index(
        &self,
        reservoir_cell_index: usize,
    ) -> Option<(usize, usize)> {
        self.cells
            .get(reservoir_cell_index)
            .map(|c| (c.host_grid_index(), c.grid_local_cell_index()))
    }

    /// (网格序号, 网格局部索引) → 单元
    pub fn cell_by_grid_and_grid_local_cell_index(&self, grid_index: usize, local: usize) -> Option<&Cell> {
        self.reservoir_cell_index_by_grid_and_grid_local_cell_index(grid_index, local)
            .and_then(|g| self.cells.get(g))
    }

    /// (网格序号, 网格局部索引) → 全局索引
    pub fn reservoir_cell_index_by_grid_and_grid_local_cell_index(
        &self,
        grid_index: usize,
        local: usize,
    ) -> Option<usize> {
        let grid = self.grids.get(grid_index)?;
        (local < grid.cell_count()).then(|| grid.reservoir_cell_index(local))
    }

    /// 全局索引 → (网格序号, 宿主网格中的 IJK)
    pub fn ijk_from_reservoir_cell_index(&self, reservoir_cell_index: usize) -> Option<(usize, [usize; 3])> {
        let cell = self.cells.get(reservoir_cell_index)?;
        let grid = self.grids.get(cell.host_grid_index())?;
        grid.ijk_from_cell_index(cell.grid_local_cell_index())
            .map(|ijk| (cell.host_grid_index(), ijk))
    }

    /// 宿主网格中指定面方向上的相邻单元（全局索引）
    pub fn neighbor_reservoir_cell_index(&self, reservoir_cell_index: usize, face: CellFace) -> Option<usize> {
        let (grid_index, [i, j, k]) = self.ijk_from_reservoir_cell_index(reservoir_cell_index)?;
        let grid = &self.grids[grid_index];
        grid.cell_ijk_neighbor(i, j, k, face)
            .map(|local| grid.reservoir_cell_index(local))
    }

    /// 双孔隙模型
    pub fn is_dual_porosity(&self) -> bool {
        self.dual_porosity
    }

    /// 设置双孔隙模型
    pub fn set_dual_porosity(&mut self, enable: bool) {
        self.dual_porosity = enable;
    }

    // ========================================================================
    // 单元几何
    // ========================================================================

    /// 单元中心
    pub fn cell_center(&self, reservoir_cell_index: usize) -> Option<DVec3> {
        self.cell(reservoir_cell_index).map(|c| c.center(&self.nodes))
    }

    /// 面中心
    pub fn cell_face_center(&self, reservoir_cell_index: usize, face: CellFace) -> Option<DVec3> {
        self.cell(reservoir_cell_index).map(|c| c.face_center(face, &self.nodes))
    }

    /// 面积法向（已按网格朝向校正为朝外）
    pub fn cell_face_normal(&self, reservoir_cell_index: usize, face: CellFace) -> Option<DVec3> {
        let cell = self.cell(reservoir_cell_index)?;
        let normal = cell.face_normal_with_area_length(face, &self.nodes);
        Some(if self.is_face_normals_outwards() { normal } else { -normal })
    }

    /// 单元体积
    pub fn cell_volume(&self, reservoir_cell_index: usize) -> Option<f64> {
        self.cell(reservoir_cell_index).map(|c| c.volume(&self.nodes))
    }

    /// 单元是否为长金字塔形退化单元
    pub fn is_long_pyramid_cell(&self, reservoir_cell_index: usize) -> bool {
        self.cell(reservoir_cell_index).map_or(false, |c| {
            c.is_long_pyramid_cell(
                &self.nodes,
                self.geometry.max_height_factor,
                self.geometry.node_near_tolerance_factor,
            )
        })
    }

    /// 单元是否塌缩
    pub fn is_collapsed_cell(&self, reservoir_cell_index: usize) -> bool {
        self.cell(reservoir_cell_index)
            .map_or(false, |c| c.is_collapsed_cell(&self.nodes, self.geometry.node_coincidence_tolerance))
    }

    /// 全部节点的包围盒（并行归约）
    pub fn bounding_box(&self) -> BoundingBox {
        self.nodes
            .par_iter()
            .fold(BoundingBox::empty, |mut bb, p| {
                bb.add_point(*p);
                bb
            })
            .reduce(BoundingBox::empty, BoundingBox::merged)
    }

    /// 主网格单元的特征尺寸 [I, J, K]
    ///
    /// 在有效主网格单元中等间隔采样，取相对面中心距离的平均值。
    /// 无有效单元时返回全零。
    pub fn characteristic_cell_sizes(&self) -> [f64; 3] {
        let main_count = self.main_grid().cell_count();
        let stride = (main_count / CHARACTERISTIC_SAMPLE_COUNT).max(1);

        let mut sums = [0.0; 3];
        let mut samples = 0usize;
        for cell in self.cells[..main_count].iter().step_by(stride) {
            if cell.is_invalid() {
                continue;
            }
            for axis in Axis::ALL {
                let pos = cell.face_center(axis.positive_face(), &self.nodes);
                let neg = cell.face_center(axis.negative_face(), &self.nodes);
                sums[axis.index()] += (pos - neg).length();
            }
            samples += 1;
        }

        if samples == 0 {
            log::debug!("没有可用于估算特征尺寸的有效单元");
            return [0.0; 3];
        }
        sums.map(|s| s / samples as f64)
    }

    /// I/J 平面内的特征尺寸
    pub fn characteristic_ij_cell_size(&self) -> f64 {
        let [i, j, _] = self.characteristic_cell_sizes();
        0.5 * (i + j)
    }

    // ========================================================================
    // 面法向朝向
    // ========================================================================

    /// 面法向是否朝外
    ///
    /// 首次调用时计算并缓存，之后只读。
    pub fn is_face_normals_outwards(&self) -> bool {
        *self
            .face_normals_outwards
            .get_or_init(|| self.compute_face_normals_direction())
    }

    /// 启发式判定面法向朝向
    ///
    /// 依次检查体积不小于特征体积一定比例的有效主网格单元，
    /// 对四个侧面计算 `(面中心 - 单元中心) · 法向` 的符号；
    /// 面中心偏离量和法向长度都足够大且四个面结论一致时采用该单元的结论。
    /// 找不到这样的单元时默认朝外。
    fn compute_face_normals_direction(&self) -> bool {
        let [i_size, j_size, k_size] = self.characteristic_cell_sizes();
        let ij_size = self.characteristic_ij_cell_size();
        let ratio = self.geometry.normal_size_ratio;
        let min_volume = self.geometry.normal_volume_ratio * i_size * j_size * k_size;
        let min_offset = ratio * ij_size;
        let min_area = ratio * ij_size * ratio * k_size;

        let main_count = self.main_grid().cell_count();
        for (g, cell) in self.cells[..main_count].iter().enumerate() {
            if cell.is_invalid() || cell.volume(&self.nodes) < min_volume {
                continue;
            }
            let center = cell.center(&self.nodes);

            let mut verdict = None;
            let mut consistent = true;
            for face in [CellFace::NegI, CellFace::PosI, CellFace::NegJ, CellFace::PosJ] {
                let offset = cell.face_center(face, &self.nodes) - center;
                let normal = cell.face_normal_with_area_length(face, &self.nodes);
                if offset.length() <= min_offset || normal.length() <= min_area {
                    consistent = false;
                    break;
                }
                let outwards = offset.dot(normal) >= 0.0;
                match verdict {
                    None => verdict = Some(outwards),
                    Some(v) if v != outwards => {
                        consistent = false;
                        break;
                    }
                    Some(_) => {}
                }
            }

            if let (true, Some(outwards)) = (consistent, verdict) {
                log::debug!("面法向朝向由单元 {} 判定: outwards = {}", g, outwards);
                return outwards;
            }
        }

        log::debug!("没有可判定面法向朝向的单元, 默认朝外");
        true
    }

    // ========================================================================
    // 几何修改
    // ========================================================================

    /// 当前轴翻转状态 (X, Y)
    pub fn flip_axis(&self) -> (bool, bool) {
        self.flip_axis
    }

    /// 设置轴翻转
    ///
    /// 节点关于包围盒中心镜像，与当前状态相同的轴不变。
    /// 面法向朝向与搜索树缓存随之失效。
    pub fn set_flip_axis(&mut self, flip_x: bool, flip_y: bool) {
        let change_x = flip_x != self.flip_axis.0;
        let change_y = flip_y != self.flip_axis.1;
        if !change_x && !change_y {
            return;
        }

        let center = self.bounding_box().center();
        self.nodes.par_iter_mut().for_each(|p| {
            if change_x {
                p.x = 2.0 * center.x - p.x;
            }
            if change_y {
                p.y = 2.0 * center.y - p.y;
            }
        });

        self.flip_axis = (flip_x, flip_y);
        self.face_normals_outwards = OnceLock::new();
        self.reset_cell_search_tree();
    }

    /// 把主网格中 I 大于 `i_limit` 的单元标记为无效
    pub fn invalidate_cells_above_i(&mut self, i_limit: usize) {
        let grid = self.grids[0].clone();
        let mut count = 0;
        for local in 0..grid.cell_count() {
            if let Some([i, _, _]) = grid.ijk_from_cell_index(local) {
                if i > i_limit {
                    self.cells[grid.reservoir_cell_index(local)].set_invalid(true);
                    count += 1;
                }
            }
        }
        self.reset_cell_search_tree();
        log::debug!("I > {} 的 {} 个单元已标记为无效", i_limit, count);
    }

    // ========================================================================
    // 断层
    // ========================================================================

    /// 替换全部断层，查找表需重新构建
    pub fn set_faults(&mut self, faults: Vec<Fault>) {
        self.faults = faults;
        self.fault_lookup = None;
    }

    /// 全部断层
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// 是否存在指定名称的断层
    pub fn has_fault_with_name(&self, name: &str) -> bool {
        self.faults.iter().any(|f| f.name() == name)
    }

    /// 由当前断层重建单元面查找表
    pub fn rebuild_fault_lookup(&mut self) {
        let mut lookup = FaultsPerCellAccumulator::new(self.cells.len());
        for (index, fault) in self.faults.iter().enumerate() {
            fault.accumulate_faults_per_cell(&mut lookup, index);
        }
        self.fault_lookup = Some(lookup);
    }

    /// 识别未命名的几何断层
    ///
    /// 对每个有效单元的 I/J 面（K 面不参与），若该面尚未登记断层，
    /// 比较其与宿主网格相邻单元相对面的四个角点；任一角点不重合即视为断层面。
    /// 两侧都活动的面归入 [`UNDEFINED_GRID_FAULT_NAME`]，否则归入
    /// [`UNDEFINED_GRID_FAULT_WITH_INACTIVE_NAME`]。
    ///
    /// 两个未命名断层都已存在时直接返回。完成后查找表包含全部断层。
    pub fn calculate_faults(&mut self, active_cell_info: &ActiveCellInfo) {
        if self.has_fault_with_name(UNDEFINED_GRID_FAULT_NAME)
            && self.has_fault_with_name(UNDEFINED_GRID_FAULT_WITH_INACTIVE_NAME)
        {
            return;
        }

        let mut lookup = FaultsPerCellAccumulator::new(self.cells.len());
        for (index, fault) in self.faults.iter().enumerate() {
            fault.accumulate_faults_per_cell(&mut lookup, index);
        }

        let unnamed_index = self.faults.len();
        let unnamed_inactive_index = unnamed_index + 1;
        let mut unnamed = Fault::new(UNDEFINED_GRID_FAULT_NAME);
        let mut unnamed_inactive = Fault::new(UNDEFINED_GRID_FAULT_WITH_INACTIVE_NAME);
        let tolerance = self.geometry.node_coincidence_tolerance;

        for (g, cell) in self.cells.iter().enumerate() {
            if cell.is_invalid() {
                continue;
            }
            let host = &self.grids[cell.host_grid_index()];
            let Some([i, j, k]) = host.ijk_from_cell_index(cell.grid_local_cell_index()) else {
                continue;
            };

            for face in CellFace::LATERAL {
                if lookup.fault_index(g, face).is_some() {
                    continue;
                }
                let Some(neighbor_local) = host.cell_ijk_neighbor(i, j, k, face) else {
                    continue;
                };
                let neighbor_g = host.reservoir_cell_index(neighbor_local);
                let neighbor = &self.cells[neighbor_g];
                if neighbor.is_invalid() {
                    continue;
                }

                let native = cell.face_corners(face, &self.nodes);
                let opposite = neighbor.face_corners(face.opposite(), &self.nodes);
                if faces_coincide(&native, &opposite, tolerance) {
                    continue;
                }

                let both_active = active_cell_info.is_active(g) && active_cell_info.is_active(neighbor_g);
                let (fault_index, fault) = if both_active {
                    (unnamed_index, &mut unnamed)
                } else {
                    (unnamed_inactive_index, &mut unnamed_inactive)
                };

                lookup.set_fault_index(g, face, fault_index);
                lookup.set_fault_index(neighbor_g, face.opposite(), fault_index);

                if g < neighbor_g {
                    fault.add_fault_face(FaultFace::new(g, face, neighbor_g));
                } else {
                    log::warn!(
                        "断层面 ({}, {:?}) 的对侧单元 {} 已先行处理, 跳过",
                        g,
                        face,
                        neighbor_g
                    );
                }
            }
        }

        log::debug!(
            "几何断层识别完成: {} 个活动断层面, {} 个含非活动单元的断层面",
            unnamed.fault_faces().len(),
            unnamed_inactive.fault_faces().len()
        );

        self.faults.push(unnamed);
        self.faults.push(unnamed_inactive);
        self.fault_lookup = Some(lookup);
    }

    /// 单元面所属断层序号
    #[inline]
    pub fn fault_index_from_cell_index_and_cell_face(&self, reservoir_cell_index: usize, face: CellFace) -> Option<usize> {
        self.fault_lookup.as_ref()?.fault_index(reservoir_cell_index, face)
    }

    /// 单元面所属断层
    ///
    /// 查找表尚未构建时返回 `None`。
    pub fn find_fault_from_cell_index_and_cell_face(&self, reservoir_cell_index: usize, face: CellFace) -> Option<&Fault> {
        self.fault_index_from_cell_index_and_cell_face(reservoir_cell_index, face)
            .and_then(|index| self.faults.get(index))
    }

    /// 把 NNC 连接序号分配到两侧面所在的断层
    pub fn distribute_nncs_to_faults(&mut self) {
        if self.fault_lookup.is_none() {
            log::warn!("断层查找表尚未构建, 无法分配 NNC");
            return;
        }

        let mut assignments = Vec::new();
        for (conn_index, conn) in self.nnc_data.connections().iter().enumerate() {
            let Some(face) = conn.face() else {
                continue;
            };
            let f1 = self.fault_index_from_cell_index_and_cell_face(conn.c1_reservoir_cell_index(), face);
            let f2 = self.fault_index_from_cell_index_and_cell_face(conn.c2_reservoir_cell_index(), face.opposite());
            if let Some(f) = f1 {
                assignments.push((f, conn_index));
            }
            if let Some(f) = f2.filter(|&f| Some(f) != f1) {
                assignments.push((f, conn_index));
            }
        }

        for fault in &mut self.faults {
            fault.connection_indices_mut().clear();
        }
        for (fault_index, conn_index) in assignments {
            if let Some(fault) = self.faults.get_mut(fault_index) {
                fault.connection_indices_mut().push(conn_index);
            }
        }
    }

    // ========================================================================
    // NNC
    // ========================================================================

    /// NNC 数据
    pub fn nnc_data(&self) -> &NncData {
        &self.nnc_data
    }

    /// 可变 NNC 数据
    pub fn nnc_data_mut(&mut self) -> &mut NncData {
        &mut self.nnc_data
    }

    /// 计算所有 NNC 的重叠多边形
    ///
    /// 未指定面的连接按面中心距离从近到远尝试，取第一个有重叠的面并记录下来。
    pub fn compute_nnc_geometry(&mut self) {
        let tolerance = self.geometry.overlap_tolerance;
        let nodes = &self.nodes;
        let cells = &self.cells;

        let results: Vec<Option<(CellFace, Vec<DVec3>)>> = self
            .nnc_data
            .connections()
            .par_iter()
            .map(|conn| {
                let c1 = cells.get(conn.c1_reservoir_cell_index())?;
                let c2 = cells.get(conn.c2_reservoir_cell_index())?;
                match conn.face() {
                    Some(face) => connection_polygon(nodes, c1, c2, face, tolerance).map(|p| (face, p)),
                    None => {
                        // 面中心距离最近的一对面优先
                        let mut faces = CellFace::ALL;
                        faces.sort_by(|&a, &b| {
                            let da = (c1.face_center(a, nodes) - c2.face_center(a.opposite(), nodes)).length();
                            let db = (c1.face_center(b, nodes) - c2.face_center(b.opposite(), nodes)).length();
                            da.total_cmp(&db)
                        });
                        faces.iter().find_map(|&face| {
                            connection_polygon(nodes, c1, c2, face, tolerance)
                                .filter(|p| polygon_area_normal_3d(p).length() > tolerance * tolerance)
                                .map(|p| (face, p))
                        })
                    }
                }
            })
            .collect();

        let mut missing = 0;
        for (conn, result) in self.nnc_data.connections_mut().iter_mut().zip(results) {
            match result {
                Some((face, polygon)) => {
                    conn.set_face(Some(face));
                    conn.set_polygon(polygon);
                }
                None => {
                    conn.set_polygon(Vec::new());
                    missing += 1;
                }
            }
        }
        if missing > 0 {
            log::debug!("{} 个 NNC 没有重叠面", missing);
        }
    }

    // ========================================================================
    // 空间查询
    // ========================================================================

    /// 构建单元搜索树
    ///
    /// 单元数超过配置阈值时按 K 方向聚合包围盒。
    pub fn build_cell_search_tree(&self) {
        let tree = if self.cells.len() > self.geometry.search_tree_aggregation_threshold {
            self.create_aggregated_search_tree(self.geometry.cells_per_bounding_box)
        } else {
            self.create_cell_search_tree()
        };
        *self.cell_search_tree.write() = Some(Arc::new(tree));
    }

    /// 按 K 方向聚合构建单元搜索树
    ///
    /// 每个 (i, j) 柱上连续 `cells_per_box` 个主网格单元及其中的 LGR 单元
    /// 合并为一个包围盒。
    pub fn build_cell_search_tree_optimized(&self, cells_per_box: usize) {
        let tree = self.create_aggregated_search_tree(cells_per_box);
        *self.cell_search_tree.write() = Some(Arc::new(tree));
    }

    fn create_cell_search_tree(&self) -> CellSearchTree {
        let envelopes: Vec<CellEnvelope> = self
            .cells
            .par_iter()
            .enumerate()
            .filter(|(_, cell)| !cell.is_invalid())
            .filter_map(|(g, cell)| CellEnvelope::from_bounding_box(vec![g], &cell.bounding_box(&self.nodes)))
            .collect();
        log::debug!("单元搜索树: {} 个叶子", envelopes.len());
        CellSearchTree::from_envelopes(envelopes, false)
    }

    fn create_aggregated_search_tree(&self, cells_per_box: usize) -> CellSearchTree {
        let cells_per_box = cells_per_box.max(1);
        let main = self.main_grid().clone();
        let [ni, nj, nk] = main.dims();
        let main_count = main.cell_count();

        // 主网格单元 → 其中的 LGR 单元
        let mut sub_cells: Vec<Vec<usize>> = vec![Vec::new(); main_count];
        for (g, cell) in self.cells.iter().enumerate().skip(main_count) {
            if !cell.is_invalid() {
                if let Some(list) = sub_cells.get_mut(cell.main_grid_cell_index()) {
                    list.push(g);
                }
            }
        }

        let envelopes: Vec<CellEnvelope> = (0..ni * nj)
            .into_par_iter()
            .flat_map_iter(|column| {
                let (i, j) = (column % ni, column / ni);
                let main = &main;
                let sub_cells = &sub_cells;
                (0..nk).step_by(cells_per_box).filter_map(move |k_start| {
                    let mut bb = BoundingBox::empty();
                    let mut members = Vec::new();
                    for k in k_start..(k_start + cells_per_box).min(nk) {
                        let g = main.reservoir_cell_index(main.cell_index_from_ijk(i, j, k));
                        let cell = &self.cells[g];
                        if !cell.is_invalid() {
                            bb.add_box(&cell.bounding_box(&self.nodes));
                            members.push(g);
                        }
                        for &sub in &sub_cells[g] {
                            bb.add_box(&self.cells[sub].bounding_box(&self.nodes));
                            members.push(sub);
                        }
                    }
                    CellEnvelope::from_bounding_box(members, &bb)
                })
            })
            .collect();

        log::debug!("聚合单元搜索树: {} 个叶子, 每柱 {} 层", envelopes.len(), cells_per_box);
        CellSearchTree::from_envelopes(envelopes, true)
    }

    fn reset_cell_search_tree(&mut self) {
        *self.cell_search_tree.get_mut() = None;
    }

    /// 单元搜索树，未构建时先构建
    pub fn cell_search_tree(&self) -> Arc<CellSearchTree> {
        if let Some(tree) = self.cell_search_tree.read().as_ref() {
            return Arc::clone(tree);
        }
        self.build_cell_search_tree();
        match self.cell_search_tree.read().as_ref() {
            Some(tree) => Arc::clone(tree),
            None => Arc::new(self.create_cell_search_tree()),
        }
    }

    /// 查找包围盒与给定包围盒相交的单元
    ///
    /// # 返回
    /// 升序的全局单元索引
    pub fn find_intersecting_cells(&self, bb: &BoundingBox) -> Vec<usize> {
        let tree = self.cell_search_tree();
        let candidates = tree.find_intersections(bb);
        if !tree.is_aggregated() {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|&g| self.cells[g].bounding_box(&self.nodes).intersects(bb))
            .collect()
    }

    /// 查找包含给定点的单元
    ///
    /// 优先返回最细层级的单元（不含子网格的单元）。
    pub fn find_reservoir_cell_index_from_point(&self, point: DVec3) -> Option<usize> {
        let probe = BoundingBox::from_corners(point, point);
        let sign = if self.is_face_normals_outwards() { 1.0 } else { -1.0 };
        let tolerance = self.geometry.node_coincidence_tolerance;

        let mut coarse_hit = None;
        for g in self.find_intersecting_cells(&probe) {
            let cell = &self.cells[g];
            if cell.is_invalid() {
                continue;
            }
            let inside = CellFace::ALL.iter().all(|&face| {
                let normal = sign * cell.face_normal_with_area_length(face, &self.nodes);
                let offset = point - cell.face_center(face, &self.nodes);
                normal.length_squared() == 0.0 || offset.dot(normal.normalize()) <= tolerance
            });
            if !inside {
                continue;
            }
            if cell.sub_grid_index().is_none() {
                return Some(g);
            }
            coarse_hit.get_or_insert(g);
        }
        coarse_hit
    }
}

// ============================================================================
// 辅助函数
// ============================================================================

fn check_corner_indices(corners: &[[usize; 8]], node_count: usize, operation: &'static str) -> GridResult<()> {
    if let Some((cell, bad)) = corners
        .iter()
        .enumerate()
        .find_map(|(c, idx)| idx.iter().find(|&&n| n >= node_count).map(|&n| (c, n)))
    {
        return Err(GridError::invalid_topology(
            operation,
            format!("单元 {} 的角点 {} 超出节点数 {}", cell, bad, node_count),
        ));
    }
    Ok(())
}

/// 相邻面角点是否重合
///
/// 本面角点 0/1/2/3 分别对应相对面角点 0/3/2/1。
fn faces_coincide(native: &[DVec3; 4], opposite: &[DVec3; 4], tolerance: f64) -> bool {
    const PAIRS: [(usize, usize); 4] = [(0, 0), (1, 3), (2, 2), (3, 1)];
    PAIRS
        .iter()
        .all(|&(a, b)| (native[a] - opposite[b]).length() <= tolerance)
}
