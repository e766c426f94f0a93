//! 產生可獨立執行的 bash 腳本：以 heredoc 重建清單後執行編碼器

use super::main::ManifestBuilder;
use crate::component::timelapse_assembler::{
    FfmpegCommand, Mount, concat_input_args, container_args, encoder_args,
};
use crate::config::TimelapseSettings;
use crate::tools::{CameraFrame, SortKey, sort_frames};
use anyhow::{Context, Result, bail};
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSummary {
    pub output: PathBuf,
    pub frame_count: usize,
    pub first: String,
    pub last: String,
}

pub struct ScriptWriter<'a> {
    settings: &'a TimelapseSettings,
}

impl<'a> ScriptWriter<'a> {
    #[must_use]
    pub const fn new(settings: &'a TimelapseSettings) -> Self {
        Self { settings }
    }

    /// 讀取每行一個影格路徑，略過空行與不符合命名規則的檔案
    pub fn read_frames(reader: impl BufRead) -> Result<Vec<CameraFrame>> {
        let mut frames = Vec::new();
        for line in reader.lines() {
            let line = line.context("無法讀取標準輸入")?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(frame) = CameraFrame::from_path(Path::new(trimmed)) {
                frames.push(frame);
            }
        }
        Ok(frames)
    }

    pub fn render(&self, frames: &[CameraFrame]) -> Result<String> {
        let directories: BTreeSet<PathBuf> = frames
            .iter()
            .map(|frame| frame.path.parent().map(Path::to_path_buf).unwrap_or_default())
            .collect();
        if directories.len() > 1 {
            bail!(
                "影格分散在 {} 個目錄中，只能掛載單一影格目錄: {}",
                directories.len(),
                directories
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        let frame_directory = directories.into_iter().next().unwrap_or_default();

        let builder = ManifestBuilder::new(self.settings.container.clone());
        let manifest = builder.manifest_for(&frame_directory, frames);
        let command = self.encode_command(&frame_directory)?;

        let mut script = String::new();
        script.push_str("#!/bin/bash\n");
        script.push_str("# Generated ffmpeg script\n\n");
        script.push_str("# Create manifest file\n");
        let _ = writeln!(
            script,
            "cat > {} << 'EOF'",
            crate::tools::shell_quote::quote(&self.settings.manifest_name)
        );
        script.push_str(&manifest.to_concat_string());
        script.push_str("EOF\n\n");
        script.push_str("# Run ffmpeg\n");
        script.push_str(&command.to_shell_lines().join(" \\\n"));
        script.push('\n');

        Ok(script)
    }

    /// 以完整輸出樣板組成指令；容器模式下工作目錄以 `$(pwd)` 掛載
    fn encode_command(&self, frame_directory: &Path) -> Result<FfmpegCommand> {
        let encoding = &self.settings.encoding;
        let command = match &self.settings.container {
            Some(container) => {
                let workspace = &container.workspace_mount;
                // 相對路徑會被 docker 當成具名 volume
                let host_directory = host_mount_path(frame_directory)?;
                let mounts = [
                    Mount::new("$(pwd)", workspace.clone()),
                    Mount::new(
                        host_directory.display().to_string(),
                        container.input_mount.clone(),
                    ),
                ];
                let mut args = container_args(container, &mounts);
                args.extend(encoder_args(
                    encoding,
                    concat_input_args(&format!("{workspace}/{}", self.settings.manifest_name)),
                    None,
                    &format!("{workspace}/{}", self.settings.output_name),
                ));
                FfmpegCommand::from_parts(container.runtime.clone(), args)
            }
            None => FfmpegCommand::from_parts(
                self.settings.encoder_binary.clone(),
                encoder_args(
                    encoding,
                    concat_input_args(&self.settings.manifest_name),
                    None,
                    &self.settings.output_name,
                ),
            ),
        };
        Ok(command)
    }

    pub fn write(
        &self,
        mut frames: Vec<CameraFrame>,
        output: &Path,
        sort_by: SortKey,
    ) -> Result<ScriptSummary> {
        if frames.is_empty() {
            bail!("輸入中沒有符合命名規則的影格");
        }
        sort_frames(&mut frames, sort_by);

        let script = self.render(&frames)?;
        fs::write(output, script)
            .with_context(|| format!("無法寫入腳本: {}", output.display()))?;
        make_executable(output)?;

        Ok(ScriptSummary {
            output: output.to_path_buf(),
            frame_count: frames.len(),
            first: frames[0].file_name(),
            last: frames[frames.len() - 1].file_name(),
        })
    }
}

fn host_mount_path(directory: &Path) -> Result<PathBuf> {
    let directory = if directory.as_os_str().is_empty() {
        Path::new(".")
    } else {
        directory
    };
    std::path::absolute(directory)
        .with_context(|| format!("無法解析絕對路徑: {}", directory.display()))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("無法設定執行權限: {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
