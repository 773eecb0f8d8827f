// crates/rg_results/src/calculators/completion.rs

//! 完井类型结果
//!
//! 按全部单元排列，逐时间步计算。井眼轨迹穿过的单元标记为
//! [`CompletionType::WellPath`]，完井报告的单元按 [`CompletionType`] 的优先级取最大者。
//!
//! 完井传导率依赖渗透率，计算前先执行输出为 PERMX/PERMY/PERMZ 的用户计算。

use std::collections::HashMap;
use tracing::{debug, warn};

use rg_foundation::HUGE_VAL;

use crate::collaborators::CompletionType;
use crate::error::{ResultsError, ResultsResult};
use crate::names;
use crate::resolver::CellResultsData;

/// 执行会改写渗透率的用户计算
fn run_permeability_calculations(data: &CellResultsData) {
    let Some(engine) = data.user_calculations.as_ref() else {
        return;
    };
    for calculation in engine.calculations() {
        if !names::PERM.contains(&calculation.output_name.as_str()) || !calculation.targets_case(data.case_id) {
            continue;
        }
        debug!("执行用户计算 {} ({})", calculation.id, calculation.output_name);
        if !engine.calculate(calculation.id) {
            warn!("用户计算 {} 失败", calculation.id);
        }
    }
}

/// 一个时间步的完井类型数组
fn completion_values(cell_count: usize, well_path_cells: &[usize], completions: &[(usize, CompletionType)]) -> Vec<f64> {
    let mut values = vec![HUGE_VAL; cell_count];
    for &g in well_path_cells {
        if let Some(v) = values.get_mut(g) {
            *v = CompletionType::WellPath.value();
        }
    }

    let mut strongest: HashMap<usize, CompletionType> = HashMap::new();
    for &(g, completion) in completions {
        strongest
            .entry(g)
            .and_modify(|current| *current = (*current).max(completion))
            .or_insert(completion);
    }
    for (g, completion) in strongest {
        if let Some(v) = values.get_mut(g) {
            *v = completion.value();
        }
    }
    values
}

/// Completion Type
///
/// 已有数据的时间步保持不变。
pub(crate) fn compute_completion_type(data: &mut CellResultsData, index: usize) -> ResultsResult<()> {
    let provider = data
        .completions
        .clone()
        .ok_or(ResultsError::MissingCollaborator("completions"))?;
    run_permeability_calculations(data);

    let time_step_count = data
        .store
        .time_step_infos(index)
        .len()
        .max(data.store.max_time_step_count())
        .max(1);
    let cell_count = data.store.reservoir_cell_count();

    let mut series = data.store.take_series(index);
    series.resize_with(time_step_count.max(series.len()), Vec::new);
    for (ts, values) in series.iter_mut().enumerate() {
        if values.is_empty() {
            *values = completion_values(cell_count, &provider.well_path_cells(ts), &provider.completion_cells(ts));
        }
    }
    data.store.set_series(index, series);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_values_precedence() {
        let values = completion_values(
            4,
            &[0, 1, 2],
            &[
                (1, CompletionType::PerforationInterval),
                (2, CompletionType::Fracture),
                (2, CompletionType::Fishbones),
                (9, CompletionType::Fracture),
            ],
        );
        assert_eq!(values[0], CompletionType::WellPath.value());
        assert_eq!(values[1], CompletionType::PerforationInterval.value());
        assert_eq!(values[2], CompletionType::Fracture.value());
        assert_eq!(values[3], HUGE_VAL);
    }
}
