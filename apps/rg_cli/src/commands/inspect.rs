// apps/rg_cli/src/commands/inspect.rs

//! 结果统计命令
//!
//! 构建规则网格（可带一条 I 方向中部的断层），从 JSON 文件或内置均质模型载入
//! 单元结果，解析请求的结果（含派生结果）并输出统计。
//!
//! 数据文件格式：
//!
//! ```json
//! {
//!   "static": { "PORO": [0.2, 0.25], "PERMX": [100.0, 120.0] },
//!   "time_steps": ["2020-01-01T00:00:00Z", "2020-02-01T00:00:00Z"],
//!   "dynamic": { "SWAT": [[0.2, 0.3], [0.4, 0.5]] }
//! }
//! ```

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use glam::DVec3;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use rg_config::EngineConfig;
use rg_grid::prelude::*;
use rg_results::names;
use rg_results::prelude::*;

/// 统计参数
#[derive(Args)]
pub struct InspectArgs {
    /// 网格单元数 NI NJ NK
    #[arg(long, num_args = 3, value_names = ["NI", "NJ", "NK"], default_values_t = vec![4usize, 4, 2])]
    pub dims: Vec<usize>,

    /// 单元尺寸 DX DY DZ
    #[arg(long, num_args = 3, value_names = ["DX", "DY", "DZ"], default_values_t = vec![100.0, 100.0, 10.0])]
    pub spacing: Vec<f64>,

    /// 顶面深度
    #[arg(long, default_value_t = 2000.0)]
    pub top_depth: f64,

    /// I 方向中部断层落差（后半部分下降）
    #[arg(long)]
    pub fault_throw: Option<f64>,

    /// 结果数据文件 (JSON)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// 引擎配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 要统计的结果名，可重复
    #[arg(short, long = "result")]
    pub results: Vec<String>,

    /// 动态结果的时间步
    #[arg(short, long, default_value_t = 0)]
    pub time_step: usize,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

const DEFAULT_RESULTS: [&str; 9] = [
    "PORO",
    "PERMX",
    "riTRANX",
    "riTRANY",
    "riTRANZ",
    names::DEPTH,
    names::FAULT_DISTANCE,
    names::RI_CELL_VOLUME,
    names::MOBILE_PORE_VOLUME,
];

/// 执行统计命令
pub fn execute(args: InspectArgs) -> Result<()> {
    info!("=== ResGrid 结果统计 ===");

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path).with_context(|| format!("无法载入配置: {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.validate()?;

    let grid = build_grid(&args, &config)?;
    let cell_count = grid.reservoir_cell_count();
    let aci = Arc::new(ActiveCellInfo::all_active(cell_count));
    info!(
        "网格 {}x{}x{}，{} 个单元，{} 条断层",
        grid.cell_count_i(),
        grid.cell_count_j(),
        grid.cell_count_k(),
        cell_count,
        grid.faults().len()
    );

    let reader = match &args.data {
        Some(path) => read_data_file(path, cell_count)?,
        None => homogeneous_reader(&grid),
    };

    let mut data = CellResultsData::new(Arc::new(RwLock::new(grid)), aci, PorosityModel::Matrix, config);
    data.set_reader(Box::new(reader));
    data.create_placeholder_result_entries();
    if !data.compute_depth_related_results() {
        warn!("部分深度相关结果不可用");
    }

    let requested: Vec<String> = if args.results.is_empty() {
        DEFAULT_RESULTS.iter().map(|s| s.to_string()).collect()
    } else {
        args.results.clone()
    };

    let rows: Vec<Value> = requested
        .iter()
        .map(|name| result_statistics(&mut data, name, args.time_step))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        print_table(&rows);
    }
    Ok(())
}

fn build_grid(args: &InspectArgs, config: &EngineConfig) -> Result<MainGrid> {
    let [ni, nj, nk] = <[usize; 3]>::try_from(args.dims.as_slice()).context("--dims 需要 3 个值")?;
    let [dx, dy, dz] = <[f64; 3]>::try_from(args.spacing.as_slice()).context("--spacing 需要 3 个值")?;

    let mut builder = CartesianGridBuilder::new([ni, nj, nk])
        .with_spacing(DVec3::new(dx, dy, dz))
        .with_origin(DVec3::new(0.0, 0.0, -args.top_depth))
        .with_k_downwards(true)
        .with_geometry(config.geometry.clone());
    if let Some(throw) = args.fault_throw {
        let split = ni / 2;
        builder = builder.with_column_offset(move |i, _| if i >= split { -throw } else { 0.0 });
    }

    let mut grid = builder.build()?;
    grid.calculate_faults(&ActiveCellInfo::all_active(grid.reservoir_cell_count()));
    Ok(grid)
}

/// 均质模型：PERM 100 mD，PORO 0.2，NTG 1
fn homogeneous_reader(grid: &MainGrid) -> MemoryReader {
    let cell_count = grid.reservoir_cell_count();
    let poro = 0.2;
    let porv = (0..cell_count)
        .map(|g| grid.cell_volume(g).unwrap_or(0.0) * poro)
        .collect();

    let reader = MemoryReader::new();
    for name in names::PERM {
        reader.insert_static(name, vec![100.0; cell_count]);
    }
    reader.insert_static("PORO", vec![poro; cell_count]);
    reader.insert_static(names::NTG, vec![1.0; cell_count]);
    reader.insert_static(names::PORV, porv);
    reader
}

fn read_data_file(path: &Path, cell_count: usize) -> Result<MemoryReader> {
    let content = std::fs::read_to_string(path).with_context(|| format!("无法读取数据文件: {}", path.display()))?;
    let json: Value = serde_json::from_str(&content).context("数据文件 JSON 解析失败")?;

    let dates = match json.get("time_steps") {
        Some(steps) => serde_json::from_value::<Vec<DateTime<Utc>>>(steps.clone()).context("time_steps 格式错误")?,
        None => Vec::new(),
    };
    let reader = MemoryReader::new().with_time_steps(TimeStepInfo::from_dates(&dates));

    if let Some(results) = json.get("static").and_then(Value::as_object) {
        for (name, values) in results {
            let values: Vec<f64> =
                serde_json::from_value(values.clone()).with_context(|| format!("静态结果 {} 格式错误", name))?;
            check_value_count(name, values.len(), cell_count)?;
            reader.insert_static(name.as_str(), values);
        }
    }

    if let Some(results) = json.get("dynamic").and_then(Value::as_object) {
        for (name, steps) in results {
            let steps: Vec<Vec<f64>> =
                serde_json::from_value(steps.clone()).with_context(|| format!("动态结果 {} 格式错误", name))?;
            if steps.len() != dates.len() {
                bail!("动态结果 {} 有 {} 个时间步，time_steps 有 {} 个", name, steps.len(), dates.len());
            }
            for values in &steps {
                check_value_count(name, values.len(), cell_count)?;
            }
            reader.insert_dynamic(name.as_str(), steps);
        }
    }

    Ok(reader)
}

fn check_value_count(name: &str, count: usize, cell_count: usize) -> Result<()> {
    if count != cell_count {
        bail!("结果 {} 有 {} 个值，网格有 {} 个单元", name, count, cell_count);
    }
    Ok(())
}

fn result_statistics(data: &mut CellResultsData, name: &str, time_step: usize) -> Value {
    let Some(index) = data.find_or_load_known_scalar_result(&ResultAddress::undefined_category(name)) else {
        return json!({ "name": name, "available": false });
    };
    let Some(address) = data.store().result_info(index).map(|info| info.address().clone()) else {
        return json!({ "name": name, "available": false });
    };

    let time_step = if address.category.is_dynamic() { time_step } else { 0 };
    let min_max = data.min_max(&address, Some(time_step));
    let p10_p90 = data.p10_p90(&address, Some(time_step));
    let mut row = json!({
        "name": name,
        "category": address.category.label(),
        "available": true,
        "time_step": time_step,
        "min": min_max.map(|(min, _)| min),
        "max": min_max.map(|(_, max)| max),
        "mean": data.mean(&address, Some(time_step)),
        "sum": data.sum(&address, Some(time_step)),
        "p10": p10_p90.map(|(p10, _)| p10),
        "p90": p10_p90.map(|(_, p90)| p90),
    });
    if address.category.is_dynamic() {
        row["weighted_mean"] = json!(data.mobile_volume_weighted_mean(&address, time_step));
    }
    row
}

fn print_table(rows: &[Value]) {
    println!(
        "{:<16} {:<14} {:>14} {:>14} {:>14} {:>14} {:>14}",
        "结果", "类别", "最小", "最大", "均值", "P10", "P90"
    );
    let cell = |row: &Value, key: &str| row[key].as_f64().map_or_else(|| "-".to_string(), |v| format!("{:.6e}", v));
    for row in rows {
        let name = row["name"].as_str().unwrap_or_default();
        if !row["available"].as_bool().unwrap_or(false) {
            println!("{:<16} 不可用", name);
            continue;
        }
        println!(
            "{:<16} {:<14} {:>14} {:>14} {:>14} {:>14} {:>14}",
            name,
            row["category"].as_str().unwrap_or_default(),
            cell(row, "min"),
            cell(row, "max"),
            cell(row, "mean"),
            cell(row, "p10"),
            cell(row, "p90"),
        );
    }
}
