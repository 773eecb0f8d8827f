// apps/rg_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 检查引擎配置文件能否解析、取值是否合法，并对可疑取值给出警告。

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use rg_config::{EngineConfig, UnitSystem};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输出默认配置
    #[arg(long)]
    pub defaults: bool,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

const KNOWN_SECTIONS: [&str; 4] = ["geometry", "transmissibility", "statistics", "units"];

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    fn is_ok_strict(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== ResGrid 配置验证 ===");

    if args.defaults {
        let json = serde_json::to_string_pretty(&EngineConfig::default())?;
        println!("{}", json);
        if args.config.is_none() {
            return Ok(());
        }
    }

    let Some(config_path) = &args.config else {
        println!("用法: rg_cli validate --config <配置文件> [--strict]");
        println!("      rg_cli validate --defaults");
        return Ok(());
    };

    let mut result = ValidationResult::default();
    validate_config(config_path, &mut result)?;
    print_validation_result(&result, args.strict)
}

fn validate_config(path: &Path, result: &mut ValidationResult) -> Result<()> {
    println!("\n检查配置文件: {}", path.display());

    if !path.exists() {
        result.add_error(format!("配置文件不存在: {}", path.display()));
        return Ok(());
    }

    let content = std::fs::read_to_string(path).context("无法读取配置文件")?;

    let json: serde_json::Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            result.add_error(format!("JSON 解析错误: {}", e));
            return Ok(());
        }
    };

    if let Some(object) = json.as_object() {
        for key in object.keys() {
            if !KNOWN_SECTIONS.contains(&key.as_str()) {
                result.add_warning(format!("未知配置项 '{}' 将被忽略", key));
            }
        }
    } else {
        result.add_error("配置文件顶层应为对象");
        return Ok(());
    }

    let config = match EngineConfig::from_json(&content) {
        Ok(config) => config,
        Err(e) => {
            result.add_error(e.to_string());
            return Ok(());
        }
    };

    if let Err(e) = config.validate() {
        result.add_error(e.to_string());
    }
    check_suspicious_values(&config, result);

    if result.is_ok() {
        println!("  ✓ 配置文件格式有效");
    }
    Ok(())
}

fn check_suspicious_values(config: &EngineConfig, result: &mut ValidationResult) {
    if config.units == UnitSystem::Unknown {
        result.add_warning("单位制未声明，Darcy 常数按公制取值");
    }

    let g = &config.geometry;
    if g.overlap_tolerance > 1e-2 {
        result.add_warning(format!("overlap_tolerance = {} 较大，断层面重叠可能被误判", g.overlap_tolerance));
    }

    let t = &config.transmissibility;
    if t.half_trans_epsilon > 1e-6 {
        result.add_warning(format!(
            "half_trans_epsilon = {} 较大，小传导率将被视为零",
            t.half_trans_epsilon
        ));
    }

    let s = &config.statistics;
    if s.histogram_bin_count > 10_000 {
        result.add_warning(format!("histogram_bin_count = {} 过大", s.histogram_bin_count));
    }
}

fn print_validation_result(result: &ValidationResult, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    if !result.errors.is_empty() {
        println!("\n错误 ({}):", result.errors.len());
        for err in &result.errors {
            error!("  ✗ {}", err);
            println!("  ✗ {}", err);
        }
    }

    if !result.warnings.is_empty() {
        println!("\n警告 ({}):", result.warnings.len());
        for warning in &result.warnings {
            warn!("  ⚠ {}", warning);
            println!("  ⚠ {}", warning);
        }
    }

    let success = if strict {
        result.is_ok_strict()
    } else {
        result.is_ok()
    };

    if success {
        println!("\n✓ 验证通过");
        Ok(())
    } else {
        println!("\n✗ 验证失败");
        bail!(
            "验证失败：发现 {} 个错误，{} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}
