use crate::component::starter_log::AnalyzeSortKey;
use crate::component::timelapse_assembler::{FrameSource, RenderRequest, SourceSelection};
use crate::component::{
    FrameBisector, ManifestBuilder, ProcessRunner, ProgressMonitor, ScriptWriter, StarterLog,
    TimelapseAssembler,
};
use crate::config::{Config, TimelapseSettings, save_settings};
use crate::tools::SortKey;
use anyhow::{Context, Result};
use console::style;
use log::info;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

pub fn run_render(
    config: &Config,
    shutdown_signal: &Arc<AtomicBool>,
    source: SourceSelection,
    preview_minutes: Option<u32>,
) -> Result<()> {
    let assembler = TimelapseAssembler::new(
        config.settings.clone(),
        ProcessRunner::new(Arc::clone(shutdown_signal)),
    );

    let report = assembler.run(&RenderRequest {
        source,
        preview_minutes,
    })?;
    info!(
        "已使用 {} 張影格，進度記錄: {}",
        report.frames_used,
        report.progress_log.display()
    );
    Ok(())
}

pub fn run_manifest(
    config: &Config,
    directory: &Path,
    output: Option<PathBuf>,
    sort_by: SortKey,
) -> Result<()> {
    let settings = &config.settings;
    let output = output.unwrap_or_else(|| settings.workspace_directory.join(&settings.manifest_name));

    let builder = ManifestBuilder::new(settings.container.clone());
    builder.build(directory, &output, sort_by)?.print();
    Ok(())
}

pub fn run_script(config: &Config, output: Option<PathBuf>, sort_by: SortKey) -> Result<()> {
    let settings = &config.settings;
    let output = output.unwrap_or_else(|| PathBuf::from(&settings.script_name));

    let frames = ScriptWriter::read_frames(io::stdin().lock())?;
    let summary = ScriptWriter::new(settings).write(frames, &output, sort_by)?;

    println!(
        "{}",
        style(format!(
            "已產生 {}，共 {} 張影格（{} → {}）",
            summary.output.display(),
            summary.frame_count,
            summary.first,
            summary.last
        ))
        .green()
    );
    println!("執行方式: ./{}", summary.output.display());
    Ok(())
}

pub fn run_monitor(
    config: &Config,
    shutdown_signal: &Arc<AtomicBool>,
    log: Option<PathBuf>,
    total_frames: Option<u64>,
    interval: u64,
    once: bool,
) -> Result<()> {
    let settings = &config.settings;
    let log = log.unwrap_or_else(|| settings.progress_log_path());

    let total_frames = match total_frames {
        Some(total) => total,
        None => {
            let source = default_frame_source(settings);
            let count = source
                .frame_count()
                .context("無法計算總影格數，請以 --total-frames 指定")?;
            count as u64
        }
    };

    let monitor = ProgressMonitor::new(
        log,
        total_frames,
        Duration::from_secs(interval.max(1)),
        Arc::clone(shutdown_signal),
    );
    monitor.run(once)
}

/// 工作目錄中已有 concat 清單時以清單為準，否則使用影格目錄
fn default_frame_source(settings: &TimelapseSettings) -> FrameSource {
    let manifest = settings.workspace_directory.join(&settings.manifest_name);
    if manifest.is_file() {
        FrameSource::Manifest { path: manifest }
    } else {
        FrameSource::Glob {
            directory: settings.input_directory.clone(),
            pattern: settings.frame_pattern.clone(),
        }
    }
}

pub fn run_bisect(shutdown_signal: &Arc<AtomicBool>, directory: &Path) -> Result<()> {
    let mut bisector = FrameBisector::from_directory(directory, Arc::clone(shutdown_signal))?;
    bisector.run()
}

pub fn run_starter_fix(manifest: &Path, directory: &Path) -> Result<()> {
    let report = StarterLog::fix(manifest, directory)?;
    if report.is_clean() {
        println!("{}", style("紀錄與磁碟上的 mp4 一致").green());
    }
    Ok(())
}

pub fn run_starter_durations(manifest: &Path) -> Result<()> {
    StarterLog::update_durations(manifest)?;
    Ok(())
}

pub fn run_starter_analyze(file: &Path, detailed: bool, sort_by: AnalyzeSortKey) -> Result<()> {
    StarterLog::analyze(file, detailed, sort_by)
}

pub fn run_config_init(config: &Config, force: bool) -> Result<()> {
    save_settings(&TimelapseSettings::default(), &config.settings_path, force)?;
    println!(
        "{}",
        style(format!("已寫出預設設定: {}", config.settings_path.display())).green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_frame_source_prefers_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let settings = TimelapseSettings {
            workspace_directory: temp_dir.path().to_path_buf(),
            ..TimelapseSettings::default()
        };
        assert!(matches!(
            default_frame_source(&settings),
            FrameSource::Glob { .. }
        ));

        fs::write(temp_dir.path().join("ffmpeg_list.txt"), "file '/input/a.jpg'\n").unwrap();
        assert!(matches!(
            default_frame_source(&settings),
            FrameSource::Manifest { .. }
        ));
    }

    #[test]
    fn test_config_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            settings: TimelapseSettings::default(),
            settings_path: temp_dir.path().join("timelapse.json"),
        };

        run_config_init(&config, false).unwrap();
        assert!(run_config_init(&config, false).is_err());
        assert!(run_config_init(&config, true).is_ok());
    }
}
