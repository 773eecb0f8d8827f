// crates/rg_results/src/dependencies.rs

//! 派生结果及其依赖声明
//!
//! 每种派生结果声明自己需要的其他结果。解析器先递归解析依赖，
//! 再调用对应的计算器。必需依赖解析失败时整个请求失败，
//! 可选依赖缺失时计算器按缺省值处理。

use rg_grid::nnc::{NNC_COMBINED_TRANS, NNC_RI_MULT, NNC_RI_TRAN, NNC_RI_TRAN_BY_AREA};
use rg_grid::Axis;

use crate::address::{ResultAddress, ResultCatType};
use crate::names::{self, combined_components, is_allan_result};

/// 一条依赖
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// 依赖的结果
    pub address: ResultAddress,
    /// 是否必需
    pub required: bool,
}

impl Dependency {
    fn required(category: ResultCatType, name: &str) -> Self {
        Self {
            address: ResultAddress::new(category, name),
            required: true,
        }
    }

    fn optional(category: ResultCatType, name: &str) -> Self {
        Self {
            address: ResultAddress::new(category, name),
            required: false,
        }
    }
}

/// 派生结果种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivedResult {
    /// 组合结果，只汇总各分量的统计量
    Combined(Vec<ResultAddress>),
    /// 重新计算的单轴传导率
    RiTran(Axis),
    /// 组合 riTRAN，同时计算 NNC 的 riTRAN
    CombinedRiTran,
    /// 单轴 riMULT
    RiMult(Axis),
    /// 组合 riMULT，同时计算 NNC 的 riMULT
    CombinedRiMult,
    /// 单轴面积归一化传导率
    RiTranByArea(Axis),
    /// 组合面积归一化传导率，同时计算 NNC 的对应结果
    CombinedRiTranByArea,
    /// 含油饱和度
    Soil,
    /// 仅有气水两相时由含水饱和度推出的含气饱和度
    Sgas,
    /// 完井类型
    CompletionType,
    /// 可动孔隙体积
    MobilePoreVolume,
    /// 单元体积
    CellVolume,
    /// 含油体积
    OilVolume,
    /// 单元 IJK 编号
    IndexIjk(Axis),
    /// 到最近断层的距离
    FaultDistance,
    /// 参与 NNC 的单元
    NncCells,
    /// Allan 图
    Allan,
    /// 深度与单元尺寸
    DepthRelated,
}

impl DerivedResult {
    /// 识别派生结果
    ///
    /// 带修饰的地址与用户生成的结果不属于派生结果。
    /// SOIL 与 SGAS 只有在标记为必须计算时才由引擎推出。
    pub fn classify(address: &ResultAddress, must_be_calculated: bool) -> Option<DerivedResult> {
        if address.has_modifiers() || address.category == ResultCatType::Generated {
            return None;
        }
        let name = address.name.as_str();
        if is_allan_result(name) {
            return Some(DerivedResult::Allan);
        }
        if let Some(axis) = axis_of(&names::RI_TRAN, name) {
            return Some(DerivedResult::RiTran(axis));
        }
        if let Some(axis) = axis_of(&names::RI_MULT, name) {
            return Some(DerivedResult::RiMult(axis));
        }
        if let Some(axis) = axis_of(&names::RI_AREA_NORM_TRAN, name) {
            return Some(DerivedResult::RiTranByArea(axis));
        }
        if let Some(axis) = axis_of(&names::INDEX_IJK, name) {
            return Some(DerivedResult::IndexIjk(axis));
        }
        if names::DEPTH_RELATED.contains(&name) {
            return Some(DerivedResult::DepthRelated);
        }
        let derived = match name {
            names::COMBINED_RI_TRAN => DerivedResult::CombinedRiTran,
            names::COMBINED_RI_MULT => DerivedResult::CombinedRiMult,
            names::COMBINED_RI_AREA_NORM_TRAN => DerivedResult::CombinedRiTranByArea,
            names::SOIL if must_be_calculated => DerivedResult::Soil,
            names::SGAS if must_be_calculated => DerivedResult::Sgas,
            names::COMPLETION_TYPE => DerivedResult::CompletionType,
            names::MOBILE_PORE_VOLUME => DerivedResult::MobilePoreVolume,
            names::RI_CELL_VOLUME => DerivedResult::CellVolume,
            names::RI_OIL_VOLUME => DerivedResult::OilVolume,
            names::FAULT_DISTANCE => DerivedResult::FaultDistance,
            names::RI_NNC_CELLS => DerivedResult::NncCells,
            _ => DerivedResult::Combined(combined_component_addresses(address)?),
        };
        Some(derived)
    }

    /// 依赖列表
    pub fn dependencies(&self) -> Vec<Dependency> {
        use ResultCatType::{DynamicNative, FormationNames, StaticNative};

        let optional_all = |list: &[&str]| -> Vec<Dependency> {
            list.iter().map(|n| Dependency::optional(StaticNative, n)).collect()
        };
        match self {
            DerivedResult::Combined(components) => components
                .iter()
                .map(|address| Dependency {
                    address: address.clone(),
                    required: false,
                })
                .collect(),
            DerivedResult::RiTran(axis) => vec![
                Dependency::required(StaticNative, names::PERM[axis.index()]),
                Dependency::optional(StaticNative, names::NTG),
            ],
            DerivedResult::CombinedRiTran => {
                let mut deps: Vec<Dependency> = optional_all(&names::RI_TRAN[..]);
                deps.extend(names::PERM.iter().map(|n| Dependency::optional(StaticNative, n)));
                deps.push(Dependency::optional(StaticNative, names::NTG));
                deps
            }
            DerivedResult::RiMult(axis) => vec![
                Dependency::required(StaticNative, names::TRAN[axis.index()]),
                Dependency::required(StaticNative, names::RI_TRAN[axis.index()]),
            ],
            DerivedResult::CombinedRiMult => {
                let mut deps: Vec<Dependency> = optional_all(&names::RI_MULT[..]);
                deps.push(Dependency::optional(StaticNative, names::COMBINED_RI_TRAN));
                deps
            }
            DerivedResult::RiTranByArea(axis) => {
                vec![Dependency::required(StaticNative, names::TRAN[axis.index()])]
            }
            DerivedResult::CombinedRiTranByArea => optional_all(&names::RI_AREA_NORM_TRAN[..]),
            DerivedResult::Soil => vec![
                Dependency::optional(DynamicNative, names::SGAS),
                Dependency::optional(DynamicNative, names::SWAT),
                Dependency::optional(DynamicNative, names::SSOL),
            ],
            DerivedResult::Sgas => vec![Dependency::required(DynamicNative, names::SWAT)],
            DerivedResult::MobilePoreVolume => vec![
                Dependency::required(StaticNative, names::PORV),
                Dependency::optional(StaticNative, names::SWCR),
                Dependency::optional(StaticNative, names::MULTPV),
            ],
            DerivedResult::OilVolume => vec![
                Dependency::required(StaticNative, names::RI_CELL_VOLUME),
                Dependency::required(DynamicNative, names::SOIL),
            ],
            DerivedResult::Allan => vec![Dependency::required(FormationNames, names::ACTIVE_FORMATION_NAMES)],
            DerivedResult::CompletionType
            | DerivedResult::CellVolume
            | DerivedResult::IndexIjk(_)
            | DerivedResult::FaultDistance
            | DerivedResult::NncCells
            | DerivedResult::DepthRelated => Vec::new(),
        }
    }

    /// 是否只提供统计量（不在结果存储中物化数组）
    pub fn is_statistics_only(&self) -> bool {
        matches!(
            self,
            DerivedResult::Combined(_)
                | DerivedResult::CombinedRiTran
                | DerivedResult::CombinedRiMult
                | DerivedResult::CombinedRiTranByArea
                | DerivedResult::Allan
        )
    }

    /// 是否优先从读取器载入，载入失败再计算
    pub fn is_reader_fallback(&self) -> bool {
        matches!(self, DerivedResult::CellVolume | DerivedResult::DepthRelated)
    }
}

fn axis_of(candidates: &[&str; 3], name: &str) -> Option<Axis> {
    candidates.iter().position(|c| *c == name).map(|i| Axis::ALL[i])
}

/// 组合结果的分量地址
///
/// 传导率、乘数与 ri 系列的分量为静态结果，各相通量的分量为动态结果，
/// 其余 `*IJK` 名称的分量沿用组合结果自身的类别。
pub fn combined_component_addresses(address: &ResultAddress) -> Option<Vec<ResultAddress>> {
    let component_names = combined_components(&address.name)?;
    let category = match address.name.as_str() {
        names::COMBINED_TRAN
        | names::COMBINED_MULT
        | names::COMBINED_RI_TRAN
        | names::COMBINED_RI_MULT
        | names::COMBINED_RI_AREA_NORM_TRAN => ResultCatType::StaticNative,
        names::COMBINED_WATER_FLUX | names::COMBINED_OIL_FLUX | names::COMBINED_GAS_FLUX => {
            ResultCatType::DynamicNative
        }
        _ => address.category,
    };
    Some(
        component_names
            .into_iter()
            .map(|name| ResultAddress::new(category, name))
            .collect(),
    )
}

/// 与组合结果一起参与统计的 NNC 静态结果名
pub fn combined_nnc_result_name(name: &str) -> Option<&'static str> {
    match name {
        names::COMBINED_TRAN => Some(NNC_COMBINED_TRANS),
        names::COMBINED_RI_TRAN => Some(NNC_RI_TRAN),
        names::COMBINED_RI_MULT => Some(NNC_RI_MULT),
        names::COMBINED_RI_AREA_NORM_TRAN => Some(NNC_RI_TRAN_BY_AREA),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(category: ResultCatType, name: &str) -> Option<DerivedResult> {
        DerivedResult::classify(&ResultAddress::new(category, name), false)
    }

    #[test]
    fn test_classify_transmissibility_family() {
        assert_eq!(classify(ResultCatType::StaticNative, "riTRANY"), Some(DerivedResult::RiTran(Axis::J)));
        assert_eq!(classify(ResultCatType::StaticNative, "riMULTZ"), Some(DerivedResult::RiMult(Axis::K)));
        assert_eq!(
            classify(ResultCatType::StaticNative, "riTRANXbyArea"),
            Some(DerivedResult::RiTranByArea(Axis::I))
        );
        assert_eq!(classify(ResultCatType::StaticNative, "riTRANXYZ"), Some(DerivedResult::CombinedRiTran));
        assert_eq!(classify(ResultCatType::StaticNative, "PERMX"), None);
    }

    #[test]
    fn test_saturations_need_calculation_flag() {
        let soil = ResultAddress::new(ResultCatType::DynamicNative, names::SOIL);
        assert_eq!(DerivedResult::classify(&soil, false), None);
        assert_eq!(DerivedResult::classify(&soil, true), Some(DerivedResult::Soil));
    }

    #[test]
    fn test_modified_and_generated_are_not_derived() {
        let by_area = ResultAddress::new(ResultCatType::StaticNative, "riTRANX").with_divide_by_cell_face_area();
        assert_eq!(DerivedResult::classify(&by_area, false), None);
        assert_eq!(classify(ResultCatType::Generated, "riTRANX"), None);
    }

    #[test]
    fn test_combined_dependencies_are_optional() {
        let derived = classify(ResultCatType::DynamicNative, "FLRWATIJK").unwrap();
        assert!(derived.is_statistics_only());
        let deps = derived.dependencies();
        assert_eq!(deps.len(), 3);
        assert!(deps.iter().all(|d| !d.required && d.address.category == ResultCatType::DynamicNative));
        assert_eq!(deps[0].address.name, "FLRWATI+");
    }

    #[test]
    fn test_ri_mult_requires_both_inputs() {
        let deps = DerivedResult::RiMult(Axis::I).dependencies();
        let required: Vec<&str> = deps.iter().filter(|d| d.required).map(|d| d.address.name.as_str()).collect();
        assert_eq!(required, vec!["TRANX", "riTRANX"]);
    }

    #[test]
    fn test_generic_ijk_keeps_category() {
        let address = ResultAddress::new(ResultCatType::Generated, "VELIJK");
        let components = combined_component_addresses(&address).unwrap();
        assert!(components.iter().all(|a| a.category == ResultCatType::Generated));
        assert_eq!(combined_nnc_result_name("TRANXYZ"), Some(NNC_COMBINED_TRANS));
        assert_eq!(combined_nnc_result_name("MULTXYZ"), None);
    }
}
