// crates/rg_grid/src/face.rs

//! 单元面与坐标轴
//!
//! 角点单元的 8 个角点编号约定：
//!
//! ```text
//!        7-------6          K
//!       /|      /|          |  J
//!      4-------5 |          | /
//!      | 3-----|-2          |/
//!      |/      |/           +----- I
//!      0-------1
//! ```
//!
//! 面顶点顺序使 `0.5 * (v2 - v0) × (v3 - v1)` 在 K 向上的右手网格中指向单元外侧。

use serde::{Deserialize, Serialize};

/// 单元面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellFace {
    /// I+ 面
    PosI = 0,
    /// I- 面
    NegI = 1,
    /// J+ 面
    PosJ = 2,
    /// J- 面
    NegJ = 3,
    /// K+ 面
    PosK = 4,
    /// K- 面
    NegK = 5,
}

/// 每个面的角点编号
const FACE_VERTEX_INDICES: [[usize; 4]; 6] = [
    [1, 2, 6, 5], // PosI
    [0, 4, 7, 3], // NegI
    [3, 7, 6, 2], // PosJ
    [0, 1, 5, 4], // NegJ
    [4, 5, 6, 7], // PosK
    [0, 3, 2, 1], // NegK
];

impl CellFace {
    /// 全部六个面，按序号排列
    pub const ALL: [CellFace; 6] = [
        CellFace::PosI,
        CellFace::NegI,
        CellFace::PosJ,
        CellFace::NegJ,
        CellFace::PosK,
        CellFace::NegK,
    ];

    /// I/J 方向的四个侧面
    pub const LATERAL: [CellFace; 4] = [
        CellFace::PosI,
        CellFace::NegI,
        CellFace::PosJ,
        CellFace::NegJ,
    ];

    /// 面序号 (0..6)
    #[inline]
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// 由序号构造
    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }

    /// 相对面
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            CellFace::PosI => CellFace::NegI,
            CellFace::NegI => CellFace::PosI,
            CellFace::PosJ => CellFace::NegJ,
            CellFace::NegJ => CellFace::PosJ,
            CellFace::PosK => CellFace::NegK,
            CellFace::NegK => CellFace::PosK,
        }
    }

    /// 面所在坐标轴
    #[inline]
    pub fn axis(self) -> Axis {
        match self {
            CellFace::PosI | CellFace::NegI => Axis::I,
            CellFace::PosJ | CellFace::NegJ => Axis::J,
            CellFace::PosK | CellFace::NegK => Axis::K,
        }
    }

    /// 是否为正方向面
    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, CellFace::PosI | CellFace::PosJ | CellFace::PosK)
    }

    /// 面的四个角点在单元角点数组中的位置
    #[inline]
    pub fn vertex_indices(self) -> [usize; 4] {
        FACE_VERTEX_INDICES[self.ordinal()]
    }

    /// 朝该面方向移动一格的 IJK 偏移
    #[inline]
    pub fn ijk_offset(self) -> [i64; 3] {
        match self {
            CellFace::PosI => [1, 0, 0],
            CellFace::NegI => [-1, 0, 0],
            CellFace::PosJ => [0, 1, 0],
            CellFace::NegJ => [0, -1, 0],
            CellFace::PosK => [0, 0, 1],
            CellFace::NegK => [0, 0, -1],
        }
    }

    /// 面名称，与结果名后缀一致
    pub fn label(self) -> &'static str {
        match self {
            CellFace::PosI => "I+",
            CellFace::NegI => "I-",
            CellFace::PosJ => "J+",
            CellFace::NegJ => "J-",
            CellFace::PosK => "K+",
            CellFace::NegK => "K-",
        }
    }
}

/// 网格坐标轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// I 方向
    I,
    /// J 方向
    J,
    /// K 方向
    K,
}

impl Axis {
    /// 全部坐标轴
    pub const ALL: [Axis; 3] = [Axis::I, Axis::J, Axis::K];

    /// 正方向面
    #[inline]
    pub fn positive_face(self) -> CellFace {
        match self {
            Axis::I => CellFace::PosI,
            Axis::J => CellFace::PosJ,
            Axis::K => CellFace::PosK,
        }
    }

    /// 负方向面
    #[inline]
    pub fn negative_face(self) -> CellFace {
        self.positive_face().opposite()
    }

    /// 轴序号
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::I => 0,
            Axis::J => 1,
            Axis::K => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_is_involution() {
        for face in CellFace::ALL {
            assert_eq!(face.opposite().opposite(), face);
            assert_eq!(face.opposite().axis(), face.axis());
            assert_ne!(face.opposite().is_positive(), face.is_positive());
        }
    }

    #[test]
    fn test_ordinal_round_trip() {
        for face in CellFace::ALL {
            assert_eq!(CellFace::from_ordinal(face.ordinal()), Some(face));
        }
        assert_eq!(CellFace::from_ordinal(6), None);
    }

    #[test]
    fn test_opposite_faces_share_no_vertices() {
        for face in CellFace::ALL {
            let a = face.vertex_indices();
            let b = face.opposite().vertex_indices();
            assert!(a.iter().all(|v| !b.contains(v)));
        }
    }

    #[test]
    fn test_axis_faces() {
        assert_eq!(Axis::K.positive_face(), CellFace::PosK);
        assert_eq!(Axis::J.negative_face(), CellFace::NegJ);
        assert_eq!(CellFace::PosI.label(), "I+");
    }
}
