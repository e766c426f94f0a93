use crate::component::timelapse_assembler::{Manifest, ManifestEntry};
use crate::config::ContainerSettings;
use crate::tools::{
    CameraFrame, SortKey, scan_camera_frames, sort_frames, validate_directory_exists,
};
use anyhow::{Context, Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSummary {
    pub output: PathBuf,
    pub frame_count: usize,
    pub first: String,
    pub last: String,
    pub sort_by: SortKey,
}

impl ManifestSummary {
    pub fn print(&self) {
        println!(
            "{}",
            style(format!(
                "已產生 {}，共 {} 張影格，依 {} 排序",
                self.output.display(),
                self.frame_count,
                self.sort_by
            ))
            .green()
        );
        println!(
            "{}",
            style(format!("影格範圍: {} → {}", self.first, self.last)).dim()
        );
    }
}

/// 依相機檔名排序影格並寫出 concat 清單
pub struct ManifestBuilder {
    container: Option<ContainerSettings>,
}

impl ManifestBuilder {
    #[must_use]
    pub const fn new(container: Option<ContainerSettings>) -> Self {
        Self { container }
    }

    /// 清單內的路徑前綴：容器模式為掛載點，否則為影格目錄本身
    #[must_use]
    pub fn path_prefix(&self, directory: &Path) -> String {
        match &self.container {
            Some(container) => container.input_mount.clone(),
            None => directory.display().to_string(),
        }
    }

    #[must_use]
    pub fn manifest_for(&self, directory: &Path, frames: &[CameraFrame]) -> Manifest {
        let prefix = self.path_prefix(directory);
        let prefix = prefix.trim_end_matches('/');
        Manifest::new(
            frames
                .iter()
                .map(|frame| ManifestEntry::new(format!("{prefix}/{}", frame.file_name())))
                .collect(),
        )
    }

    pub fn build(
        &self,
        directory: &Path,
        output: &Path,
        sort_by: SortKey,
    ) -> Result<ManifestSummary> {
        validate_directory_exists(directory)?;
        let directory = &std::path::absolute(directory)
            .with_context(|| format!("無法解析絕對路徑: {}", directory.display()))?;

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("掃描影格中: {}", directory.display()));

        let scanned = scan_camera_frames(directory);
        spinner.finish_and_clear();
        let mut frames = scanned?;

        if frames.is_empty() {
            bail!("{} 中找不到符合命名規則的影格", directory.display());
        }

        sort_frames(&mut frames, sort_by);
        let mut manifest = self.manifest_for(directory, &frames);
        if self.container.is_some() {
            // 組裝時據此掛載 `/input`
            manifest = manifest.with_frames_directory(directory.clone());
        }
        manifest.save(output)?;

        let summary = ManifestSummary {
            output: output.to_path_buf(),
            frame_count: frames.len(),
            first: frames[0].file_name(),
            last: frames[frames.len() - 1].file_name(),
            sort_by,
        };
        info!(
            "清單 {} 寫入 {} 筆影格",
            summary.output.display(),
            summary.frame_count
        );

        Ok(summary)
    }
}
