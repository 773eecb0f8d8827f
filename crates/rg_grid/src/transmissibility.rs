// crates/rg_grid/src/transmissibility.rs

//! 传导率公式
//!
//! 半单元传导率在面两侧分别计算，再以调和平均合并：
//!
//! ```text
//! T_half = k · ntg · (A·c) / (c·c)
//! T      = C_darcy · mult / (1/T1 + 1/T2)
//! ```
//!
//! 其中 `A` 为面积向量，`c` 为单元中心到面中心的向量。

use glam::DVec3;
use rg_foundation::HUGE_VAL;

/// 半单元传导率视为零的阈值
pub const HALF_TRANS_EPSILON: f64 = 1e-15;
/// riMULT 分母阈值
pub const RI_MULT_EPSILON: f64 = 1e-9;

/// 半单元传导率
///
/// # 参数
/// - `perm`: 渗透率
/// - `ntg`: 净毛比
/// - `center_to_face`: 单元中心指向面中心的向量
/// - `face_area_vec`: 面积向量（朝外）
#[inline]
pub fn half_cell_transmissibility(perm: f64, ntg: f64, center_to_face: DVec3, face_area_vec: DVec3) -> f64 {
    perm * ntg * face_area_vec.dot(center_to_face) / center_to_face.dot(center_to_face)
}

/// 两个半单元传导率的调和合并
///
/// 任一半单元传导率绝对值小于 [`HALF_TRANS_EPSILON`] 时返回 0。
///
/// ```
/// use rg_grid::transmissibility::newtran;
///
/// assert_eq!(newtran(1.0, 1.0, 0.0, 5.0), 0.0);
/// assert_eq!(newtran(1.0, 1.0, 2.0, 2.0), 1.0);
/// ```
#[inline]
pub fn newtran(cdarcy: f64, mult: f64, half_cell_trans: f64, neighbor_half_cell_trans: f64) -> f64 {
    newtran_with_epsilon(cdarcy, mult, half_cell_trans, neighbor_half_cell_trans, HALF_TRANS_EPSILON)
}

/// [`newtran`] 的可配置阈值版本
pub fn newtran_with_epsilon(cdarcy: f64, mult: f64, t1: f64, t2: f64, epsilon: f64) -> f64 {
    if t1.abs() < epsilon || t2.abs() < epsilon {
        return 0.0;
    }
    cdarcy * mult / (1.0 / t1 + 1.0 / t2)
}

/// 模拟器传导率与重新计算传导率之比
///
/// - 任一输入为 HUGE 时结果为 HUGE；
/// - 分母接近零时：分子也接近零则为 0，否则为 HUGE；
/// - 其余为普通比值。
///
/// ```
/// use rg_grid::transmissibility::ri_mult;
/// use rg_foundation::HUGE_VAL;
///
/// assert_eq!(ri_mult(4.0, 2.0), 2.0);
/// assert_eq!(ri_mult(0.0, 0.0), 0.0);
/// assert_eq!(ri_mult(0.0, 1e-15), 0.0);
/// assert_eq!(ri_mult(1.0, 1e-15), HUGE_VAL);
/// assert_eq!(ri_mult(HUGE_VAL, 3.0), HUGE_VAL);
/// ```
#[inline]
pub fn ri_mult(trans: f64, ri_trans: f64) -> f64 {
    ri_mult_with_epsilon(trans, ri_trans, RI_MULT_EPSILON)
}

/// [`ri_mult`] 的可配置阈值版本
pub fn ri_mult_with_epsilon(trans: f64, ri_trans: f64, epsilon: f64) -> f64 {
    if trans == HUGE_VAL || ri_trans == HUGE_VAL {
        return HUGE_VAL;
    }
    if ri_trans.abs() < epsilon {
        if trans.abs() < epsilon {
            0.0
        } else {
            HUGE_VAL
        }
    } else {
        trans / ri_trans
    }
}

/// 按面积归一化的传导率
///
/// 面积小于 `epsilon` 时返回 HUGE。
#[inline]
pub fn area_normalized_trans(trans: f64, area: f64, epsilon: f64) -> f64 {
    if trans == HUGE_VAL || area.abs() < epsilon {
        HUGE_VAL
    } else {
        trans / area
    }
}
