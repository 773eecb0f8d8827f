// crates/rg_results/src/calculators/formation.rs

//! 地层结果与 Allan 图
//!
//! "Active Formation Names" 按全部单元排列，值为地层序号。
//! Allan 图结果写在 NNC 静态结果上：
//! - Binary Formation Allan: 连接两侧属于同一地层为 0，否则为 1
//! - Formation Allan: 同一地层时为地层序号，否则为
//!   `地层数 + 组合序号`，组合按首次出现的顺序编号

use tracing::debug;

use rg_foundation::{is_valid_value, HUGE_VAL};
use rg_grid::MainGrid;

use crate::address::{ResultAddress, ResultCatType};
use crate::collaborators::FormationNamesProvider;
use crate::error::{ResultsError, ResultsResult};
use crate::names;
use crate::resolver::CellResultsData;

/// 每个单元所在主网格单元的 K 层对应的地层序号，无地层时为 HUGE
pub(crate) fn active_formation_values(grid: &MainGrid, provider: &dyn FormationNamesProvider) -> Vec<f64> {
    let main_grid = grid.main_grid();
    grid.cells()
        .iter()
        .map(|cell| {
            main_grid
                .ijk_from_cell_index(cell.main_grid_cell_index())
                .and_then(|[_, _, k]| provider.formation_index_from_k_layer(k))
                .map_or(HUGE_VAL, |formation| formation as f64)
        })
        .collect()
}

/// 地层对在组合列表中的序号，首次出现时追加
fn combination_index(combinations: &mut Vec<(usize, usize)>, pair: (usize, usize)) -> usize {
    match combinations.iter().position(|&c| c == pair) {
        Some(i) => i,
        None => {
            combinations.push(pair);
            combinations.len() - 1
        }
    }
}

/// 计算两个 Allan 图结果
///
/// 两者都已存在时不重复计算。
pub(crate) fn compute_allan_results(data: &mut CellResultsData) -> ResultsResult<()> {
    {
        let grid = data.grid.read();
        let nnc = grid.nnc_data();
        if nnc.has_static_result(names::FORMATION_ALLAN) && nnc.has_static_result(names::FORMATION_BINARY_ALLAN) {
            return Ok(());
        }
    }

    let formation_count = data
        .formation_names
        .as_ref()
        .ok_or(ResultsError::MissingCollaborator("formation names"))?
        .formation_names()
        .len();
    let formations_address = ResultAddress::new(ResultCatType::FormationNames, names::ACTIVE_FORMATION_NAMES);

    let mut combinations = Vec::new();
    let (allan, binary) = {
        let formations = data
            .values_view(&formations_address, 0)
            .ok_or_else(|| ResultsError::unresolvable(&formations_address, "地层结果为空"))?;
        let aci = data.active_cell_info.as_ref();
        let formation_of = |g: usize| {
            formations
                .value(aci, g)
                .filter(|&f| is_valid_value(f))
                .map(|f| f as usize)
        };

        let grid = data.grid.read();
        let connections = grid.nnc_data().connections();
        let mut allan = Vec::with_capacity(connections.len());
        let mut binary = Vec::with_capacity(connections.len());
        for conn in connections {
            match (
                formation_of(conn.c1_reservoir_cell_index()),
                formation_of(conn.c2_reservoir_cell_index()),
            ) {
                (Some(f1), Some(f2)) if f1 == f2 => {
                    allan.push(f1 as f64);
                    binary.push(0.0);
                }
                (Some(f1), Some(f2)) => {
                    let pair = (f1.min(f2), f1.max(f2));
                    allan.push((formation_count + combination_index(&mut combinations, pair)) as f64);
                    binary.push(1.0);
                }
                _ => {
                    allan.push(HUGE_VAL);
                    binary.push(HUGE_VAL);
                }
            }
        }
        (allan, binary)
    };

    {
        let mut grid = data.grid.write();
        let nnc = grid.nnc_data_mut();
        nnc.set_static_connection_scalar_result(names::FORMATION_ALLAN, allan)?;
        nnc.set_static_connection_scalar_result(names::FORMATION_BINARY_ALLAN, binary)?;
    }
    debug!("Allan 图: {} 个地层组合", combinations.len());
    data.formation_combinations = combinations;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_index_first_encounter_order() {
        let mut combinations = Vec::new();
        assert_eq!(combination_index(&mut combinations, (0, 2)), 0);
        assert_eq!(combination_index(&mut combinations, (1, 2)), 1);
        assert_eq!(combination_index(&mut combinations, (0, 2)), 0);
        assert_eq!(combinations, vec![(0, 2), (1, 2)]);
    }
}
