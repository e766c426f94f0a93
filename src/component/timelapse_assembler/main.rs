use super::error::AssemblyError;
use super::ffmpeg_command::{EncodeJob, EncoderInput, FfmpegCommand, relative_entry_root};
use super::frame_limit::{CaptureInterval, RenderMode};
use super::frame_source::{FrameSource, Manifest};
use super::run_lock::RunLock;
use super::runner::{EncoderExit, EncoderRunner};
use crate::config::TimelapseSettings;
use crate::tools::ensure_directory_exists;
use anyhow::Result;
use console::style;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

/// 影格來源的選擇
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    /// 設定中的影格目錄與 glob 樣式
    Glob,
    /// 指定的 concat 清單檔
    Manifest(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub source: SourceSelection,
    pub preview_minutes: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub mode: RenderMode,
    pub output_path: PathBuf,
    pub progress_log: PathBuf,
    /// 實際交給編碼器的影格數
    pub frames_used: usize,
}

/// 縮時影片組裝流程：驗證 → 計算上限 → 組指令 → 取得執行鎖 → 執行 → 回報
pub struct TimelapseAssembler<R: EncoderRunner> {
    settings: TimelapseSettings,
    runner: R,
}

impl<R: EncoderRunner> TimelapseAssembler<R> {
    pub const fn new(settings: TimelapseSettings, runner: R) -> Self {
        Self { settings, runner }
    }

    pub const fn runner(&self) -> &R {
        &self.runner
    }

    pub fn run(&self, request: &RenderRequest) -> Result<RenderReport> {
        let source = self.frame_source(&request.source);
        source.validate()?;

        let interval = CaptureInterval::from_seconds(self.settings.capture_interval_seconds)?;
        let mode = RenderMode::from_preview(request.preview_minutes, interval);

        let output_path = match mode {
            RenderMode::Full => self.settings.output_path(),
            RenderMode::Preview { .. } => self.settings.preview_output_path(),
        };
        if mode.is_preview() && output_path == self.settings.output_path() {
            return Err(AssemblyError::InvalidArgument(format!(
                "預覽輸出檔名不可與完整輸出相同: {}",
                self.settings.output_name
            ))
            .into());
        }

        ensure_directory_exists(&self.settings.workspace_directory)?;
        // 預覽清單也寫在工作目錄，因此在準備輸入之前就要持有鎖
        let _lock = RunLock::acquire(&output_path)?;

        let (input, frames_used) = self.prepare_input(&source, mode)?;
        let job = EncodeJob {
            input,
            frame_cap: mode.frame_cap(),
            output: output_path.clone(),
        };
        let command = FfmpegCommand::for_job(&self.settings, &job)?;

        match mode {
            RenderMode::Full => println!(
                "{}",
                style(format!("開始組裝完整縮時影片（{frames_used} 張影格）")).cyan()
            ),
            RenderMode::Preview { frame_cap } => println!(
                "{}",
                style(format!(
                    "開始組裝預覽（前 {} 分鐘，上限 {frame_cap} 張影格）",
                    request.preview_minutes.unwrap_or_default()
                ))
                .cyan()
            ),
        }
        info!("輸出: {}", output_path.display());

        let progress_log = self.settings.progress_log_path();
        let exit = self.runner.run(&command, &progress_log)?;

        match exit {
            EncoderExit::Success => {
                info!("編碼完成: {}", output_path.display());
                println!(
                    "{}",
                    style(format!("完成: {}", output_path.display())).green()
                );
                Ok(RenderReport {
                    mode,
                    output_path,
                    progress_log,
                    frames_used,
                })
            }
            EncoderExit::Failed { code } => {
                error!("編碼失敗，結束碼 {code:?}，記錄檔: {}", progress_log.display());
                Self::warn_partial_output(&output_path);
                Err(AssemblyError::EncoderFailed { code }.into())
            }
            EncoderExit::Interrupted => {
                Self::warn_partial_output(&output_path);
                Err(AssemblyError::Interrupted.into())
            }
        }
    }

    #[must_use]
    pub fn frame_source(&self, selection: &SourceSelection) -> FrameSource {
        match selection {
            SourceSelection::Glob => FrameSource::Glob {
                directory: self.settings.input_directory.clone(),
                pattern: self.settings.frame_pattern.clone(),
            },
            SourceSelection::Manifest(path) => FrameSource::Manifest { path: path.clone() },
        }
    }

    /// 決定編碼器輸入；清單來源在預覽時改用只含前 N 筆的清單
    fn prepare_input(
        &self,
        source: &FrameSource,
        mode: RenderMode,
    ) -> Result<(EncoderInput, usize)> {
        match source {
            FrameSource::Glob { directory, pattern } => {
                let available = source.frame_count()?;
                if available == 0 {
                    return Err(AssemblyError::MissingPrerequisite(format!(
                        "{} 中沒有符合 {pattern} 的影格",
                        directory.display()
                    ))
                    .into());
                }

                let frames_used = cap_count(available, mode);
                Ok((
                    EncoderInput::Glob {
                        directory: directory.clone(),
                        pattern: pattern.clone(),
                    },
                    frames_used,
                ))
            }
            FrameSource::Manifest { path } => {
                let manifest = Manifest::load(path)?;
                if manifest.is_empty() {
                    return Err(AssemblyError::MissingPrerequisite(format!(
                        "清單檔 {} 沒有任何影格",
                        path.display()
                    ))
                    .into());
                }

                let frames_directory = self.manifest_frames_directory(&manifest)?;
                let frames_used = cap_count(manifest.len(), mode);
                if frames_used < manifest.len() {
                    let preview_manifest = self.settings.preview_manifest_path();
                    let mut head = manifest.truncated(frames_used);
                    // 預覽清單寫在工作目錄，相對條目要改以原清單目錄為基準
                    let relative_root = if head.has_relative_entries() {
                        let (root, prefix) = relative_entry_root(&self.settings, path)?;
                        head = head.rebased(&prefix);
                        Some(root)
                    } else {
                        None
                    };
                    head.save(&preview_manifest)?;
                    info!(
                        "已寫入預覽清單 {}（{} / {} 筆）",
                        preview_manifest.display(),
                        frames_used,
                        manifest.len()
                    );
                    return Ok((
                        EncoderInput::Concat {
                            manifest: preview_manifest,
                            frames_directory,
                            relative_root,
                        },
                        frames_used,
                    ));
                }

                Ok((
                    EncoderInput::Concat {
                        manifest: path.clone(),
                        frames_directory,
                        relative_root: None,
                    },
                    frames_used,
                ))
            }
        }
    }

    /// 清單記錄的影格目錄優先，否則使用設定中的影格目錄；
    /// 容器模式下清單引用掛載點時該目錄必須存在
    fn manifest_frames_directory(&self, manifest: &Manifest) -> Result<PathBuf> {
        let directory = manifest
            .frames_directory()
            .map_or_else(|| self.settings.input_directory.clone(), Path::to_path_buf);

        if let Some(container) = &self.settings.container
            && manifest.references_mount(&container.input_mount)
            && !directory.is_dir()
        {
            return Err(AssemblyError::MissingPrerequisite(format!(
                "找不到清單影格所在的目錄 {}（掛載為 {}），請以 `timelapse manifest <DIR>` 重新產生清單",
                directory.display(),
                container.input_mount
            ))
            .into());
        }

        Ok(directory)
    }

    /// 中斷或失敗時保留不完整的輸出檔，只提示使用者
    fn warn_partial_output(output_path: &Path) {
        if output_path.exists() {
            warn!("輸出檔可能不完整: {}", output_path.display());
        }
    }
}

fn cap_count(available: usize, mode: RenderMode) -> usize {
    mode.frame_cap()
        .map_or(available, |cap| {
            usize::try_from(cap).map_or(available, |cap| cap.min(available))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_cap_count() {
        assert_eq!(cap_count(10, RenderMode::Full), 10);
        assert_eq!(cap_count(10, RenderMode::Preview { frame_cap: 4 }), 4);
        assert_eq!(cap_count(3, RenderMode::Preview { frame_cap: 4 }), 3);
    }

    struct FailingRunner {
        calls: RefCell<usize>,
    }

    impl EncoderRunner for FailingRunner {
        fn run(&self, _command: &FfmpegCommand, _progress_log: &Path) -> Result<EncoderExit> {
            *self.calls.borrow_mut() += 1;
            Ok(EncoderExit::Failed { code: Some(187) })
        }
    }

    #[test]
    fn test_encoder_failure_is_not_retried() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let images = temp_dir.path().join("images");
        std::fs::create_dir(&images).unwrap();
        std::fs::write(images.join("IMG_0001.jpg"), b"x").unwrap();

        let settings = TimelapseSettings {
            input_directory: images,
            workspace_directory: temp_dir.path().to_path_buf(),
            container: None,
            ..TimelapseSettings::default()
        };
        let assembler = TimelapseAssembler::new(
            settings,
            FailingRunner {
                calls: RefCell::new(0),
            },
        );

        let err = assembler
            .run(&RenderRequest {
                source: SourceSelection::Glob,
                preview_minutes: None,
            })
            .unwrap_err();

        assert_eq!(crate::component::timelapse_assembler::exit_code_for(&err), 187);
        assert_eq!(*assembler.runner.calls.borrow(), 1);
        // 失敗後執行鎖必須釋放
        assert!(!RunLock::lock_path_for(&temp_dir.path().join("timelapse.mp4")).exists());
    }
}
