// crates/rg_results/src/calculators/difference.rs

//! 差值结果
//!
//! - 与时间步求差：同一序列减去基准时间步
//! - 与案例求差：减去基准案例中同名结果的对应时间步
//!   （地址同时指定基准时间步时取该时间步）
//!
//! 两侧都有效的活动单元写入差值，其余为 HUGE。
//! 基准案例单元数不同时在写入任何数据前失败。

use rg_foundation::{is_valid_value, HUGE_VAL};
use rg_grid::ActiveCellInfo;

use super::ValuesView;
use crate::address::ResultAddress;
use crate::collaborators::BaseCaseSeries;
use crate::error::{ResultsError, ResultsResult};
use crate::resolver::CellResultsData;
use crate::store::ValueLayout;

/// 两个视图按单元求差，结果与 `source` 同布局
fn subtract(
    active_cell_info: &ActiveCellInfo,
    source: ValuesView<'_>,
    base: ValuesView<'_>,
    base_active_cell_info: &ActiveCellInfo,
) -> Vec<f64> {
    let mut values = vec![HUGE_VAL; source.values.len()];
    for g in 0..active_cell_info.reservoir_cell_count() {
        if !active_cell_info.is_active(g) {
            continue;
        }
        let Some(i) = source.layout.value_index(active_cell_info, g) else {
            continue;
        };
        let (Some(&s), Some(b)) = (source.values.get(i), base.value(base_active_cell_info, g)) else {
            continue;
        };
        if is_valid_value(s) && is_valid_value(b) {
            values[i] = s - b;
        }
    }
    values
}

/// 基准序列中与 `time_step` 对应的时间步；单时间步序列总是取第 0 步
fn base_time_step(step_count: usize, delta_time_step: Option<usize>, time_step: usize) -> usize {
    if step_count == 1 {
        0
    } else {
        delta_time_step.unwrap_or(time_step)
    }
}

pub(crate) fn compute_difference(data: &mut CellResultsData, address: &ResultAddress, index: usize) -> ResultsResult<()> {
    let mut source_address = address.clone();
    source_address.delta_case_id = None;
    source_address.delta_time_step = None;
    let source_index = data.try_find_or_load(&source_address)?;

    let base_case = match address.delta_case_id {
        Some(case_id) => {
            let provider = data
                .delta_cases
                .as_ref()
                .ok_or(ResultsError::MissingCollaborator("delta cases"))?;
            let base = provider
                .base_case_series(case_id, &address.without_modifiers(), data.porosity_model)
                .ok_or_else(|| ResultsError::unresolvable(address, format!("基准案例 {} 无对应结果", case_id)))?;
            if base.reservoir_cell_count != data.store.reservoir_cell_count() {
                return Err(ResultsError::DimensionMismatch {
                    source_count: data.store.reservoir_cell_count(),
                    base_count: base.reservoir_cell_count,
                });
            }
            Some(base)
        }
        None => None,
    };

    let series = {
        let aci = data.active_cell_info.as_ref();
        let reservoir_cell_count = data.store.reservoir_cell_count();
        let source_steps = data.store.series(source_index).unwrap_or(&[]);

        source_steps
            .iter()
            .enumerate()
            .map(|(ts, values)| {
                let source = ValuesView {
                    values,
                    layout: ValueLayout::from_value_count(values.len(), reservoir_cell_count),
                };
                match &base_case {
                    Some(BaseCaseSeries {
                        reservoir_cell_count: base_count,
                        active_cell_info: base_aci,
                        time_steps,
                    }) => {
                        let base_ts = base_time_step(time_steps.len(), address.delta_time_step, ts);
                        let base_values = time_steps.get(base_ts).map_or(&[][..], Vec::as_slice);
                        let base = ValuesView {
                            values: base_values,
                            layout: ValueLayout::from_value_count(base_values.len(), *base_count),
                        };
                        subtract(aci, source, base, base_aci)
                    }
                    None => {
                        let base_ts = base_time_step(source_steps.len(), address.delta_time_step, ts);
                        let base_values = source_steps.get(base_ts).map_or(&[][..], Vec::as_slice);
                        let base = ValuesView {
                            values: base_values,
                            layout: ValueLayout::from_value_count(base_values.len(), reservoir_cell_count),
                        };
                        subtract(aci, source, base, aci)
                    }
                }
            })
            .collect::<Vec<Vec<f64>>>()
    };

    if data.store.time_step_infos(index).is_empty() {
        let infos = data.store.time_step_infos(source_index).to_vec();
        data.store.set_time_step_infos(index, infos);
    }
    data.store.set_series(index, series);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtract_skips_invalid_and_inactive() {
        let aci = ActiveCellInfo::from_active_flags(&[true, true, false]);
        let source = [5.0, HUGE_VAL, 1.0];
        let base = [2.0, 1.0, 1.0];
        let values = subtract(
            &aci,
            ValuesView {
                values: &source,
                layout: ValueLayout::AllCells,
            },
            ValuesView {
                values: &base,
                layout: ValueLayout::AllCells,
            },
            &aci,
        );
        assert_eq!(values, vec![3.0, HUGE_VAL, HUGE_VAL]);
    }

    #[test]
    fn test_base_time_step() {
        assert_eq!(base_time_step(1, Some(3), 2), 0);
        assert_eq!(base_time_step(4, Some(3), 2), 3);
        assert_eq!(base_time_step(4, None, 2), 2);
    }
}
