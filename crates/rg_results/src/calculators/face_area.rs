// crates/rg_results/src/calculators/face_area.rs

//! 按单元面面积归一化
//!
//! 结果名确定面的方向（见 [`axis_from_result_name`]），
//! 每个单元的值除以其正方向面的面积。

use rg_foundation::HUGE_VAL;
use rg_grid::transmissibility::area_normalized_trans;

use crate::address::ResultAddress;
use crate::error::{ResultsError, ResultsResult};
use crate::names::axis_from_result_name;
use crate::resolver::CellResultsData;
use crate::store::ValueLayout;

pub(crate) fn compute_divided_by_face_area(
    data: &mut CellResultsData,
    address: &ResultAddress,
    index: usize,
) -> ResultsResult<()> {
    let axis = axis_from_result_name(&address.name)
        .ok_or_else(|| ResultsError::unresolvable(address, "无法由名称确定面方向"))?;
    let mut source_address = address.clone();
    source_address.divide_by_cell_face_area = false;
    let source_index = data.try_find_or_load(&source_address)?;

    let mut series = data.store.take_series(index);
    {
        let source_steps = data.store.series(source_index).unwrap_or(&[]);
        series.resize_with(source_steps.len().max(series.len()), Vec::new);

        let grid = data.grid.read();
        let nodes = grid.nodes();
        let aci = data.active_cell_info.as_ref();
        let face = axis.positive_face();
        let epsilon = data.config.transmissibility.face_area_epsilon;
        let reservoir_cell_count = data.store.reservoir_cell_count();

        for (values, source) in series.iter_mut().zip(source_steps) {
            if !values.is_empty() {
                continue;
            }
            let layout = ValueLayout::from_value_count(source.len(), reservoir_cell_count);
            let mut divided = vec![HUGE_VAL; source.len()];
            for (g, cell) in grid.cells().iter().enumerate() {
                let Some(i) = layout.value_index(aci, g) else {
                    continue;
                };
                let Some(&v) = source.get(i) else {
                    continue;
                };
                let area = cell.face_normal_with_area_length(face, nodes).length();
                divided[i] = area_normalized_trans(v, area, epsilon);
            }
            *values = divided;
        }
    }

    if data.store.time_step_infos(index).is_empty() {
        let infos = data.store.time_step_infos(source_index).to_vec();
        data.store.set_time_step_infos(index, infos);
    }
    data.store.set_series(index, series);
    Ok(())
}
