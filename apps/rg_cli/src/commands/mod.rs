// apps/rg_cli/src/commands/mod.rs

//! 子命令

pub mod inspect;
pub mod validate;
