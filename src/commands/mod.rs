//! 子命令的執行入口

mod handlers;

pub use handlers::{
    run_bisect, run_config_init, run_manifest, run_monitor, run_render, run_script,
    run_starter_analyze, run_starter_durations, run_starter_fix,
};
