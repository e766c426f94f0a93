use super::error::AssemblyError;
use crate::config::{ContainerSettings, EncodingSettings, TimelapseSettings};
use crate::tools::shell_quote;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// 編碼器的輸入選擇
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderInput {
    Glob { directory: PathBuf, pattern: String },
    Concat {
        manifest: PathBuf,
        /// 容器內 `/input` 對應的主機影格目錄
        frames_directory: PathBuf,
        /// 改寫過的清單中，相對條目原本所依據的主機目錄
        relative_root: Option<PathBuf>,
    },
}

/// 一次編碼所需的全部資訊
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    pub input: EncoderInput,
    pub frame_cap: Option<u64>,
    pub output: PathBuf,
}

/// 容器掛載：`host` 保留字串形式以便寫入 `$(pwd)` 之類的 shell 展開
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub host: String,
    pub target: String,
}

impl Mount {
    #[must_use]
    pub fn new(host: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            target: target.into(),
        }
    }
}

/// 固定的編碼參數樣板：輸入、影格上限、幀率、縮放、編碼器、品質、像素格式、輸出
#[must_use]
pub fn encoder_args(
    encoding: &EncodingSettings,
    input_args: Vec<String>,
    frame_cap: Option<u64>,
    output: &str,
) -> Vec<String> {
    let mut args = vec!["-y".to_string()];
    args.extend(input_args);

    if let Some(cap) = frame_cap {
        args.extend(["-frames:v".to_string(), cap.to_string()]);
    }

    args.extend([
        "-r".to_string(),
        encoding.frame_rate.to_string(),
        "-vf".to_string(),
        format!("scale={}", encoding.scale),
        "-c:v".to_string(),
        encoding.codec.clone(),
        "-preset".to_string(),
        encoding.preset.clone(),
        "-crf".to_string(),
        encoding.crf.to_string(),
        "-pix_fmt".to_string(),
        encoding.pixel_format.clone(),
        output.to_string(),
    ]);

    args
}

#[must_use]
pub fn glob_input_args(pattern: &str) -> Vec<String> {
    vec![
        "-pattern_type".to_string(),
        "glob".to_string(),
        "-i".to_string(),
        pattern.to_string(),
    ]
}

#[must_use]
pub fn concat_input_args(manifest: &str) -> Vec<String> {
    vec![
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        manifest.to_string(),
    ]
}

/// `docker run --rm ... <image>` 前綴，編碼參數直接接在映像檔名稱之後
#[must_use]
pub fn container_args(container: &ContainerSettings, mounts: &[Mount]) -> Vec<String> {
    let mut args = vec!["run".to_string(), "--rm".to_string()];

    if let Some(name) = &container.name {
        args.extend(["--name".to_string(), name.clone()]);
    }

    for mount in mounts {
        args.extend(["-v".to_string(), format!("{}:{}", mount.host, mount.target)]);
    }

    args.push(container.image.clone());
    args
}

/// 組好的編碼器呼叫
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    program: String,
    args: Vec<String>,
}

impl FfmpegCommand {
    #[must_use]
    pub const fn from_parts(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// 依設定決定直接執行 ffmpeg 或透過容器執行
    pub fn for_job(settings: &TimelapseSettings, job: &EncodeJob) -> Result<Self> {
        match &settings.container {
            Some(container) => Self::containerized(settings, container, job),
            None => Ok(Self::native(settings, job)),
        }
    }

    #[must_use]
    pub fn native(settings: &TimelapseSettings, job: &EncodeJob) -> Self {
        let input_args = match &job.input {
            EncoderInput::Glob { directory, pattern } => {
                glob_input_args(&directory.join(pattern).to_string_lossy())
            }
            EncoderInput::Concat { manifest, .. } => {
                concat_input_args(&manifest.to_string_lossy())
            }
        };

        Self {
            program: settings.encoder_binary.clone(),
            args: encoder_args(
                &settings.encoding,
                input_args,
                job.frame_cap,
                &job.output.to_string_lossy(),
            ),
        }
    }

    /// 容器內看不到主機路徑，因此工作目錄、影格目錄與清單所在目錄都要掛載並轉換路徑
    pub fn containerized(
        settings: &TimelapseSettings,
        container: &ContainerSettings,
        job: &EncodeJob,
    ) -> Result<Self> {
        let workspace = absolute(&settings.workspace_directory)?;
        let input_directory = match &job.input {
            EncoderInput::Glob { directory, .. } => directory.clone(),
            EncoderInput::Concat {
                frames_directory, ..
            } => frames_directory.clone(),
        };

        let mut mounts = vec![
            Mount::new(
                workspace.display().to_string(),
                container.workspace_mount.clone(),
            ),
            Mount::new(
                absolute(&input_directory)?.display().to_string(),
                container.input_mount.clone(),
            ),
        ];

        let input_args = match &job.input {
            EncoderInput::Glob { pattern, .. } => {
                glob_input_args(&format!("{}/{}", container.input_mount, pattern))
            }
            EncoderInput::Concat {
                manifest,
                relative_root,
                ..
            } => {
                let manifest = absolute(manifest)?;
                let file_name = file_name_of(&manifest)?;
                let manifest_dir = manifest.parent().unwrap_or(Path::new("/")).to_path_buf();

                // 工作目錄以外的清單目錄與相對條目目錄共用同一個掛載點
                let mut outside: Vec<PathBuf> = Vec::new();
                let target_dir = if manifest_dir == workspace {
                    container.workspace_mount.clone()
                } else {
                    outside.push(manifest_dir);
                    container.manifest_mount.clone()
                };
                if let Some(root) = relative_root {
                    let root = absolute(root)?;
                    if root != workspace && !outside.contains(&root) {
                        outside.push(root);
                    }
                }
                if outside.len() > 1 {
                    return Err(AssemblyError::InvalidArgument(format!(
                        "{} 只能掛載一個目錄: {}",
                        container.manifest_mount,
                        outside
                            .iter()
                            .map(|d| d.display().to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                    .into());
                }
                for directory in outside {
                    mounts.push(Mount::new(
                        directory.display().to_string(),
                        container.manifest_mount.clone(),
                    ));
                }
                concat_input_args(&format!("{target_dir}/{file_name}"))
            }
        };

        let output = format!(
            "{}/{}",
            container.workspace_mount,
            file_name_of(&job.output)?
        );

        let mut args = container_args(container, &mounts);
        args.extend(encoder_args(
            &settings.encoding,
            input_args,
            job.frame_cap,
            &output,
        ));

        Ok(Self {
            program: container.runtime.clone(),
            args,
        })
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// 可貼上 shell 執行的單行指令
    #[must_use]
    pub fn to_shell_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote::quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 每個選項與其值一行，以 ` \` 接續，供產生的腳本使用
    #[must_use]
    pub fn to_shell_lines(&self) -> Vec<String> {
        let mut lines = vec![shell_quote::quote(&self.program)];
        let mut iter = self.args.iter().peekable();

        while let Some(arg) = iter.next() {
            let mut line = shell_quote::quote(arg);
            let takes_value = arg.starts_with('-')
                && iter.peek().is_some_and(|next| !next.starts_with('-'))
                && arg != "-y"
                && arg != "--rm";
            if takes_value && let Some(value) = iter.next() {
                line.push(' ');
                line.push_str(&shell_quote::quote(value));
            }
            lines.push(line);
        }

        lines
    }
}

/// 清單相對條目的基準目錄，以及在編碼器眼中改寫用的前綴
///
/// 原生模式為主機絕對路徑；容器模式為該目錄的掛載點，與 `containerized` 的掛載一致
pub fn relative_entry_root(
    settings: &TimelapseSettings,
    manifest: &Path,
) -> Result<(PathBuf, String)> {
    let manifest = absolute(manifest)?;
    let directory = manifest.parent().unwrap_or(Path::new("/")).to_path_buf();

    let prefix = match &settings.container {
        None => directory.display().to_string(),
        Some(container) => {
            if directory == absolute(&settings.workspace_directory)? {
                container.workspace_mount.clone()
            } else {
                container.manifest_mount.clone()
            }
        }
    };
    Ok((directory, prefix))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("無法解析絕對路徑: {}", path.display()))
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("路徑缺少檔名: {}", path.display()))
}
