use anyhow::Result;
use clap::Parser;
use console::style;
use log::{info, warn};
use std::process;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use timelapse_assembler::cli::{Cli, Command, ConfigAction, StarterAction};
use timelapse_assembler::commands;
use timelapse_assembler::component::timelapse_assembler::{SourceSelection, exit_code_for};
use timelapse_assembler::config::{Config, TimelapseSettings};
use timelapse_assembler::init;
use timelapse_assembler::signal::setup_shutdown_signal;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = i32::from(e.use_stderr());
            let _ = e.print();
            process::exit(code);
        }
    };

    init::init(cli.verbose);

    if let Err(e) = run(cli) {
        warn!("Program error: {e:#}");
        eprintln!("{} {e:#}", style("錯誤:").red().bold());
        process::exit(exit_code_for(&e));
    }

    info!("Program exited normally");
}

fn run(cli: Cli) -> Result<()> {
    let shutdown_signal = setup_shutdown_signal()?;

    // 產生設定檔時不讀取既有內容，避免損毀的設定檔擋住重建
    if let Command::Config {
        action: ConfigAction::Init { force },
    } = cli.command
    {
        let config = Config {
            settings: TimelapseSettings::default(),
            settings_path: cli.config,
        };
        return commands::run_config_init(&config, force);
    }

    let config = Config::load(&cli.config)?;
    dispatch(cli.command, &config, &shutdown_signal)
}

fn dispatch(command: Command, config: &Config, shutdown_signal: &Arc<AtomicBool>) -> Result<()> {
    match command {
        Command::Render { preview_minutes } => {
            commands::run_render(config, shutdown_signal, SourceSelection::Glob, preview_minutes)
        }
        Command::Concat {
            manifest,
            preview_minutes,
        } => commands::run_render(
            config,
            shutdown_signal,
            SourceSelection::Manifest(manifest),
            preview_minutes,
        ),
        Command::Manifest {
            directory,
            output,
            sort_by,
        } => commands::run_manifest(config, &directory, output, sort_by),
        Command::Script { output, sort_by } => commands::run_script(config, output, sort_by),
        Command::Monitor {
            log,
            total_frames,
            interval,
            once,
        } => commands::run_monitor(config, shutdown_signal, log, total_frames, interval, once),
        Command::Bisect { directory } => commands::run_bisect(shutdown_signal, &directory),
        Command::Starter { action } => match action {
            StarterAction::Fix {
                manifest,
                directory,
            } => commands::run_starter_fix(&manifest, &directory),
            StarterAction::Durations { manifest } => commands::run_starter_durations(&manifest),
            StarterAction::Analyze {
                file,
                detailed,
                sort_by,
            } => commands::run_starter_analyze(&file, detailed, sort_by),
        },
        Command::Config {
            action: ConfigAction::Init { force },
        } => commands::run_config_init(config, force),
    }
}
