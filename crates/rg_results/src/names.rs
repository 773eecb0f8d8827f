// crates/rg_results/src/names.rs

//! 结果名称约定
//!
//! 模拟器关键字、派生结果名与组合结果名集中定义在这里，
//! 解析器与统计计算器通过这些常量识别结果。

use rg_grid::Axis;

/// 表示 "无结果" 的名称
pub const UNDEFINED_RESULT_NAME: &str = "None";

// ============================================================
// 模拟器关键字
// ============================================================

/// 含水饱和度
pub const SWAT: &str = "SWAT";
/// 含气饱和度
pub const SGAS: &str = "SGAS";
/// 含油饱和度
pub const SOIL: &str = "SOIL";
/// 孔隙体积
pub const PORV: &str = "PORV";
/// 净毛比
pub const NTG: &str = "NTG";
/// 临界水饱和度
pub const SWCR: &str = "SWCR";
/// 溶剂饱和度
pub const SSOL: &str = "SSOL";
/// 孔隙体积乘数
pub const MULTPV: &str = "MULTPV";
/// 深度
pub const DEPTH: &str = "DEPTH";
/// I 方向尺寸
pub const DX: &str = "DX";
/// J 方向尺寸
pub const DY: &str = "DY";
/// K 方向尺寸
pub const DZ: &str = "DZ";
/// 顶面深度
pub const TOPS: &str = "TOPS";
/// 底面深度
pub const BOTTOM: &str = "BOTTOM";

/// 各轴渗透率
pub const PERM: [&str; 3] = ["PERMX", "PERMY", "PERMZ"];
/// 各轴模拟器传导率
pub const TRAN: [&str; 3] = ["TRANX", "TRANY", "TRANZ"];
/// 传导率乘数（正负方向）
pub const MULT: [&str; 6] = ["MULTX", "MULTX-", "MULTY", "MULTY-", "MULTZ", "MULTZ-"];

// ============================================================
// 派生结果
// ============================================================

/// 重新计算的各轴传导率
pub const RI_TRAN: [&str; 3] = ["riTRANX", "riTRANY", "riTRANZ"];
/// 模拟器传导率与重新计算传导率之比
pub const RI_MULT: [&str; 3] = ["riMULTX", "riMULTY", "riMULTZ"];
/// 按面积归一化的传导率
pub const RI_AREA_NORM_TRAN: [&str; 3] = ["riTRANXbyArea", "riTRANYbyArea", "riTRANZbyArea"];

/// 组合传导率
pub const COMBINED_TRAN: &str = "TRANXYZ";
/// 组合乘数
pub const COMBINED_MULT: &str = "MULTXYZ";
/// 组合 riTRAN
pub const COMBINED_RI_TRAN: &str = "riTRANXYZ";
/// 组合 riMULT
pub const COMBINED_RI_MULT: &str = "riMULTXYZ";
/// 组合面积归一化传导率
pub const COMBINED_RI_AREA_NORM_TRAN: &str = "riTRANXYZbyArea";

/// 组合水相通量
pub const COMBINED_WATER_FLUX: &str = "FLRWATIJK";
/// 组合油相通量
pub const COMBINED_OIL_FLUX: &str = "FLROILIJK";
/// 组合气相通量
pub const COMBINED_GAS_FLUX: &str = "FLRGASIJK";

/// 单元体积
pub const RI_CELL_VOLUME: &str = "riCELLVOLUME";
/// 含油体积
pub const RI_OIL_VOLUME: &str = "riOILVOLUME";
/// 可动孔隙体积
pub const MOBILE_PORE_VOLUME: &str = "MOBPORV";
/// 完井类型
pub const COMPLETION_TYPE: &str = "Completion Type";
/// 到最近断层的距离
pub const FAULT_DISTANCE: &str = "FAULTDIST";
/// 参与 NNC 的单元
pub const RI_NNC_CELLS: &str = "riNNCCELLS";
/// 单元 IJK 编号
pub const INDEX_IJK: [&str; 3] = ["INDEX_I", "INDEX_J", "INDEX_K"];

/// 当前地层名称
pub const ACTIVE_FORMATION_NAMES: &str = "Active Formation Names";
/// Allan 图：地层组合
pub const FORMATION_ALLAN: &str = "Formation Allan";
/// Allan 图：是否为不同地层
pub const FORMATION_BINARY_ALLAN: &str = "Binary Formation Allan";

/// 深度相关的几何结果
pub const DEPTH_RELATED: [&str; 6] = [DEPTH, DX, DY, DZ, TOPS, BOTTOM];

// ============================================================
// 名称解析
// ============================================================

/// 由结果名确定面所在的轴
///
/// 名称中包含 `I+` 或 `TRANX` 的属于 I 轴，`J+` / `TRANY` 属于 J 轴，
/// `K+` / `TRANZ` 属于 K 轴，按此顺序匹配。其余名称返回 `None`。
///
/// ```
/// use rg_grid::Axis;
/// use rg_results::names::axis_from_result_name;
///
/// assert_eq!(axis_from_result_name("FLRWATI+"), Some(Axis::I));
/// assert_eq!(axis_from_result_name("riTRANZ"), Some(Axis::K));
/// assert_eq!(axis_from_result_name("PORV"), None);
/// ```
pub fn axis_from_result_name(name: &str) -> Option<Axis> {
    if name.contains("I+") || name.contains("TRANX") {
        Some(Axis::I)
    } else if name.contains("J+") || name.contains("TRANY") {
        Some(Axis::J)
    } else if name.contains("K+") || name.contains("TRANZ") {
        Some(Axis::K)
    } else {
        None
    }
}

/// 组合结果的分量名称
///
/// 返回 `None` 表示不是组合结果。名称以 `IJK` 结尾的结果展开为
/// `<base>I`、`<base>J`、`<base>K`。
pub fn combined_components(name: &str) -> Option<Vec<String>> {
    let owned = |names: &[&str]| Some(names.iter().map(|s| s.to_string()).collect());
    match name {
        COMBINED_TRAN => owned(&TRAN),
        COMBINED_MULT => owned(&MULT),
        COMBINED_RI_TRAN => owned(&RI_TRAN),
        COMBINED_RI_MULT => owned(&RI_MULT),
        COMBINED_RI_AREA_NORM_TRAN => owned(&RI_AREA_NORM_TRAN),
        COMBINED_WATER_FLUX => owned(&["FLRWATI+", "FLRWATJ+", "FLRWATK+"]),
        COMBINED_OIL_FLUX => owned(&["FLROILI+", "FLROILJ+", "FLROILK+"]),
        COMBINED_GAS_FLUX => owned(&["FLRGASI+", "FLRGASJ+", "FLRGASK+"]),
        _ => name
            .strip_suffix("IJK")
            .filter(|base| !base.is_empty())
            .map(|base| ["I", "J", "K"].iter().map(|s| format!("{}{}", base, s)).collect()),
    }
}

/// 是否为 Allan 图结果
pub fn is_allan_result(name: &str) -> bool {
    name == FORMATION_ALLAN || name == FORMATION_BINARY_ALLAN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_from_exact_names() {
        let cases = [
            ("TRANX", Some(Axis::I)),
            ("TRANY", Some(Axis::J)),
            ("TRANZ", Some(Axis::K)),
            ("riTRANX", Some(Axis::I)),
            ("riTRANYbyArea", Some(Axis::J)),
            ("FLRWATI+", Some(Axis::I)),
            ("FLROILJ+", Some(Axis::J)),
            ("FLRGASK+", Some(Axis::K)),
            ("FLRWATI-", None),
            ("MULTX", None),
            ("PERMX", None),
            ("SOIL", None),
        ];
        for (name, expected) in cases {
            assert_eq!(axis_from_result_name(name), expected, "{}", name);
        }
    }

    #[test]
    fn test_axis_match_order() {
        // 同时包含多种标记时按 I、J、K 的顺序取第一个
        assert_eq!(axis_from_result_name("TRANZ_I+"), Some(Axis::I));
        assert_eq!(axis_from_result_name("K+TRANY"), Some(Axis::J));
    }

    #[test]
    fn test_combined_components() {
        assert_eq!(
            combined_components(COMBINED_TRAN),
            Some(vec!["TRANX".to_string(), "TRANY".to_string(), "TRANZ".to_string()])
        );
        assert_eq!(combined_components(COMBINED_MULT).map(|c| c.len()), Some(6));
        assert_eq!(
            combined_components("FLRWATIJK"),
            Some(vec!["FLRWATI+".to_string(), "FLRWATJ+".to_string(), "FLRWATK+".to_string()])
        );
        assert_eq!(
            combined_components("VELIJK"),
            Some(vec!["VELI".to_string(), "VELJ".to_string(), "VELK".to_string()])
        );
        assert_eq!(combined_components("IJK"), None);
        assert_eq!(combined_components("PORV"), None);
    }
}
