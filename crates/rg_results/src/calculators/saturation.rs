// crates/rg_results/src/calculators/saturation.rs

//! 饱和度与体积类派生结果
//!
//! - SOIL = 1 - SGAS - SWAT - SSOL（缺失的分量按 0 处理）
//! - SGAS = 1 - SWAT（仅气水两相）
//! - MOBPORV = MULTPV · PORV · (1 - SWCR)
//! - riOILVOLUME = max(0, SOIL · riCELLVOLUME)
//!
//! 动态结果逐时间步计算，已有数据的时间步保持不变。

use tracing::trace;

use rg_foundation::HUGE_VAL;

use super::{fill_active_cells, to_active_cells, ValuesView};
use crate::address::{ResultAddress, ResultCatType};
use crate::error::{ResultsError, ResultsResult};
use crate::names;
use crate::resolver::CellResultsData;

fn dynamic_address(name: &str) -> ResultAddress {
    ResultAddress::new(ResultCatType::DynamicNative, name)
}

fn static_address(name: &str) -> ResultAddress {
    ResultAddress::new(ResultCatType::StaticNative, name)
}

/// 动态结果的时间步数：时间步描述与已载入序列中较大者
fn time_step_count_of(data: &CellResultsData, address: &ResultAddress) -> usize {
    data.store.find_scalar_result_index(address).map_or(0, |index| {
        data.store
            .time_step_infos(index)
            .len()
            .max(data.store.time_step_count(index))
    })
}

/// 借用源序列的时间步描述
fn inherit_time_step_infos(data: &mut CellResultsData, index: usize, sources: &[ResultAddress]) {
    if !data.store.time_step_infos(index).is_empty() {
        return;
    }
    let infos = sources
        .iter()
        .filter_map(|address| data.store.find_scalar_result_index(address))
        .map(|source| data.store.time_step_infos(source).to_vec())
        .max_by_key(|infos| infos.len())
        .unwrap_or_default();
    data.store.set_time_step_infos(index, infos);
}

/// 逐时间步补齐 `index` 的序列
///
/// `compute` 返回 `None` 表示该时间步没有输入数据，保持为空。
fn fill_time_steps(
    data: &mut CellResultsData,
    index: usize,
    time_step_count: usize,
    compute: impl Fn(&CellResultsData, usize) -> Option<Vec<f64>>,
) {
    let mut series = data.store.take_series(index);
    series.resize_with(time_step_count.max(series.len()), Vec::new);
    for (ts, values) in series.iter_mut().enumerate() {
        if values.is_empty() {
            if let Some(computed) = compute(&*data, ts) {
                *values = computed;
            }
        }
    }
    data.store.set_series(index, series);
}

// ============================================================
// 饱和度
// ============================================================

/// SOIL
///
/// 数组长度取 SWAT 与 SGAS 中较长者，按位置相减。
pub(crate) fn compute_soil(data: &mut CellResultsData, index: usize) -> ResultsResult<()> {
    let swat = dynamic_address(names::SWAT);
    let sgas = dynamic_address(names::SGAS);
    let ssol = dynamic_address(names::SSOL);
    let soil = dynamic_address(names::SOIL);

    let time_step_count = time_step_count_of(data, &swat).max(time_step_count_of(data, &sgas));
    if time_step_count == 0 {
        return Err(ResultsError::unresolvable(&soil, "SWAT 与 SGAS 均无数据"));
    }

    fill_time_steps(data, index, time_step_count, |data, ts| {
        let views: Vec<Option<ValuesView<'_>>> = [&swat, &sgas, &ssol]
            .into_iter()
            .map(|address| data.values_view(address, ts))
            .collect();
        let value_count = views[..2]
            .iter()
            .flatten()
            .map(|view| view.values.len())
            .max()?;
        let component = |view: &Option<ValuesView<'_>>, i: usize| {
            view.as_ref().and_then(|v| v.values.get(i).copied()).unwrap_or(0.0)
        };
        Some(
            (0..value_count)
                .map(|i| 1.0 - component(&views[1], i) - component(&views[0], i) - component(&views[2], i))
                .collect(),
        )
    });
    inherit_time_step_infos(data, index, &[swat, sgas]);
    trace!("SOIL 已计算: {} 个时间步", time_step_count);
    Ok(())
}

/// 仅气水两相时的 SGAS
pub(crate) fn compute_sgas(data: &mut CellResultsData, index: usize) -> ResultsResult<()> {
    let swat = dynamic_address(names::SWAT);
    let time_step_count = time_step_count_of(data, &swat);

    fill_time_steps(data, index, time_step_count, |data, ts| {
        let view = data.values_view(&swat, ts)?;
        Some(view.values.iter().map(|s| 1.0 - s).collect())
    });
    inherit_time_step_infos(data, index, &[swat]);
    Ok(())
}

// ============================================================
// 体积
// ============================================================

/// 可动孔隙体积，按活动单元排列
///
/// 缺少 SWCR 或 MULTPV 时对应因子省略。
pub(crate) fn compute_mobile_pore_volume(data: &mut CellResultsData, index: usize) -> ResultsResult<()> {
    let porv_address = static_address(names::PORV);

    let values = {
        let aci = data.active_cell_info.as_ref();
        let porv = data
            .values_view(&porv_address, 0)
            .map(|view| to_active_cells(&view, aci))
            .ok_or_else(|| ResultsError::unresolvable(&porv_address, "无孔隙体积数据"))?;
        let swcr = data
            .values_view(&static_address(names::SWCR), 0)
            .map(|view| to_active_cells(&view, aci));
        let multpv = data
            .values_view(&static_address(names::MULTPV), 0)
            .map(|view| to_active_cells(&view, aci));

        porv.iter()
            .enumerate()
            .map(|(i, &pv)| {
                let mut value = pv;
                if let Some(&s) = swcr.as_ref().and_then(|v| v.get(i)) {
                    value *= 1.0 - s;
                }
                if let Some(&m) = multpv.as_ref().and_then(|v| v.get(i)) {
                    value *= m;
                }
                value
            })
            .collect::<Vec<f64>>()
    };

    data.store.set_series(index, vec![values]);
    Ok(())
}

/// 含油体积，按活动单元排列，缺省值 HUGE
pub(crate) fn compute_oil_volume(data: &mut CellResultsData, index: usize) -> ResultsResult<()> {
    let soil = dynamic_address(names::SOIL);
    let cell_volume = static_address(names::RI_CELL_VOLUME);
    let time_step_count = time_step_count_of(data, &soil);

    fill_time_steps(data, index, time_step_count, |data, ts| {
        let volumes = data.values_view(&cell_volume, 0)?;
        let saturations = data.values_view(&soil, ts)?;
        let aci = data.active_cell_info.as_ref();
        Some(fill_active_cells(aci, HUGE_VAL, |g| {
            let volume = volumes.value(aci, g).filter(|&v| v != HUGE_VAL)?;
            let saturation = saturations.value(aci, g)?;
            Some((saturation * volume).max(0.0))
        }))
    });
    inherit_time_step_infos(data, index, &[soil]);
    Ok(())
}
