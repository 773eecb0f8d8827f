// apps/rg_cli/src/main.rs

//! ResGrid 命令行界面
//!
//! 在规则网格上载入单元结果、计算派生结果并输出统计，以及检查引擎配置文件。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// ResGrid 单元结果工具
#[derive(Parser)]
#[command(name = "rg_cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "ResGrid cell result engine", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 计算结果统计
    Inspect(commands::inspect::InspectArgs),
    /// 验证配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Inspect(args) => commands::inspect::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
