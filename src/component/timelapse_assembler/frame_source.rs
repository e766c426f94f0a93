//! 影格來源：目錄 glob 或 concat 清單

use super::error::AssemblyError;
use crate::tools::{list_glob_matches, shell_quote};
use anyhow::{Context, Result, bail};
use log::debug;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSource {
    /// 目錄內符合樣式的影像，依字典序排列
    Glob { directory: PathBuf, pattern: String },
    /// ffmpeg concat 格式的清單檔
    Manifest { path: PathBuf },
}

impl FrameSource {
    /// 執行前檢查來源是否存在，不存在時不得呼叫編碼器
    pub fn validate(&self) -> Result<(), AssemblyError> {
        match self {
            Self::Glob { directory, .. } => {
                if !directory.is_dir() {
                    return Err(AssemblyError::MissingPrerequisite(format!(
                        "找不到影格目錄 {}",
                        directory.display()
                    )));
                }
            }
            Self::Manifest { path } => {
                if !path.is_file() {
                    return Err(AssemblyError::MissingPrerequisite(format!(
                        "找不到清單檔 {}，請先執行 `timelapse manifest <DIR>` 產生",
                        path.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// 來源中的影格數量
    pub fn frame_count(&self) -> Result<usize> {
        match self {
            Self::Glob { directory, pattern } => Ok(list_glob_matches(directory, pattern)?.len()),
            Self::Manifest { path } => Ok(Manifest::load(path)?.len()),
        }
    }
}

/// 清單中的一筆影格
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub path: String,
    /// `duration` 指令宣告的顯示秒數
    pub duration: Option<f64>,
}

impl ManifestEntry {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            duration: None,
        }
    }
}

/// 記錄影格所在主機目錄的註解，例如 `# frames: /photos/day2`
const FRAMES_HEADER: &str = "frames:";

/// ffmpeg concat demuxer 清單
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    /// 容器模式下 `/input/...` 條目所對應的主機目錄
    frames_directory: Option<PathBuf>,
}

impl Manifest {
    #[must_use]
    pub const fn new(entries: Vec<ManifestEntry>) -> Self {
        Self {
            entries,
            frames_directory: None,
        }
    }

    #[must_use]
    pub fn with_frames_directory(mut self, directory: PathBuf) -> Self {
        self.frames_directory = Some(directory);
        self
    }

    #[must_use]
    pub fn frames_directory(&self) -> Option<&Path> {
        self.frames_directory.as_deref()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("無法讀取清單檔: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("無法解析清單檔: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut entries: Vec<ManifestEntry> = Vec::new();
        let mut frames_directory = None;

        for (index, raw_line) in content.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                if let Some(directory) = comment.trim().strip_prefix(FRAMES_HEADER) {
                    frames_directory = Some(PathBuf::from(directory.trim()));
                }
                continue;
            }

            let (directive, argument) = line
                .split_once(char::is_whitespace)
                .map_or((line, ""), |(d, a)| (d, a.trim()));

            match directive {
                "file" => {
                    if argument.is_empty() {
                        bail!("第 {line_number} 行: file 指令缺少路徑");
                    }
                    entries.push(ManifestEntry::new(unquote(argument)));
                }
                "duration" => {
                    let seconds: f64 = argument
                        .parse()
                        .with_context(|| format!("第 {line_number} 行: 無效的 duration"))?;
                    let Some(last) = entries.last_mut() else {
                        bail!("第 {line_number} 行: duration 必須接在 file 之後");
                    };
                    last.duration = Some(seconds);
                }
                "ffconcat" | "inpoint" | "outpoint" | "option" | "stream" | "exact_stream_id"
                | "file_packet_meta" | "file_packet_metadata" | "stream_meta" | "stream_codec"
                | "stream_extradata" | "chapter" => {
                    debug!("忽略清單指令 `{directive}`（第 {line_number} 行）");
                }
                other => bail!("第 {line_number} 行: 未知的指令 `{other}`"),
            }
        }

        Ok(Self {
            entries,
            frames_directory,
        })
    }

    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 依原順序保留前 `count` 筆
    #[must_use]
    pub fn truncated(&self, count: usize) -> Self {
        Self {
            entries: self.entries.iter().take(count).cloned().collect(),
            frames_directory: self.frames_directory.clone(),
        }
    }

    /// 相對條目改為以 `root` 為前綴
    ///
    /// concat demuxer 以清單檔所在目錄解析相對路徑，清單改寫到別處時必須先轉換
    #[must_use]
    pub fn rebased(&self, root: &str) -> Self {
        let root = root.trim_end_matches('/');
        Self {
            entries: self
                .entries
                .iter()
                .map(|entry| {
                    if Path::new(&entry.path).is_absolute() {
                        entry.clone()
                    } else {
                        ManifestEntry {
                            path: format!("{root}/{}", entry.path),
                            duration: entry.duration,
                        }
                    }
                })
                .collect(),
            frames_directory: self.frames_directory.clone(),
        }
    }

    /// 是否有條目是相對路徑
    #[must_use]
    pub fn has_relative_entries(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| !Path::new(&entry.path).is_absolute())
    }

    /// 是否有條目位於容器內的 `mount` 之下
    #[must_use]
    pub fn references_mount(&self, mount: &str) -> bool {
        let prefix = format!("{}/", mount.trim_end_matches('/'));
        self.entries.iter().any(|entry| entry.path.starts_with(&prefix))
    }

    #[must_use]
    pub fn to_concat_string(&self) -> String {
        let mut content = String::new();
        if let Some(directory) = &self.frames_directory {
            let _ = writeln!(content, "# {FRAMES_HEADER} {}", directory.display());
        }
        for entry in &self.entries {
            let _ = writeln!(content, "file {}", shell_quote::quote(&entry.path));
            if let Some(duration) = entry.duration {
                let _ = writeln!(content, "duration {duration}");
            }
        }
        content
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_concat_string())
            .with_context(|| format!("無法寫入清單檔: {}", path.display()))
    }
}

/// 去除單引號並還原 `'\''` 跳脫
fn unquote(argument: &str) -> String {
    let mut result = String::with_capacity(argument.len());
    let mut in_quotes = false;
    let mut chars = argument.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '\\' if !in_quotes => {
                if let Some(escaped) = chars.next() {
                    result.push(escaped);
                }
            }
            _ => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_entries_in_order() {
        let manifest = Manifest::parse(
            "ffconcat version 1.0\n# 註解\nfile /input/a.jpg\nduration 0.5\n\nfile '/input/my b.jpg'\n",
        )
        .unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.entries()[0].path, "/input/a.jpg");
        assert_eq!(manifest.entries()[0].duration, Some(0.5));
        assert_eq!(manifest.entries()[1].path, "/input/my b.jpg");
        assert_eq!(manifest.entries()[1].duration, None);
    }

    #[test]
    fn test_parse_escaped_quote() {
        let manifest = Manifest::parse(r"file '/input/it'\''s.jpg'").unwrap();
        assert_eq!(manifest.entries()[0].path, "/input/it's.jpg");
    }

    #[test]
    fn test_concat_string_parses_back() {
        let mut entry = ManifestEntry::new("/input/it's here.jpg");
        entry.duration = Some(2.0);
        let manifest = Manifest::new(vec![entry, ManifestEntry::new("/input/b.jpg")]);

        let reparsed = Manifest::parse(&manifest.to_concat_string()).unwrap();
        assert_eq!(reparsed, manifest);
    }

    #[test]
    fn test_parse_rejects_orphan_duration_and_unknown_directive() {
        assert!(Manifest::parse("duration 1\nfile a.jpg").is_err());
        assert!(Manifest::parse("file a.jpg\nduration soon").is_err());
        assert!(Manifest::parse("frame a.jpg").is_err());
        assert!(Manifest::parse("file").is_err());
    }

    #[test]
    fn test_truncated_keeps_first_entries() {
        let manifest = Manifest::new(
            (0..10)
                .map(|i| ManifestEntry::new(format!("/input/{i:02}.jpg")))
                .collect(),
        );

        let head = manifest.truncated(4);
        let paths: Vec<_> = head.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/input/00.jpg", "/input/01.jpg", "/input/02.jpg", "/input/03.jpg"]
        );
        assert_eq!(manifest.truncated(50).len(), 10);
    }

    #[test]
    fn test_frames_directory_header() {
        let manifest = Manifest::parse("# frames: /photos/day2\nfile /input/a.jpg\n# note\n").unwrap();
        assert_eq!(manifest.frames_directory(), Some(Path::new("/photos/day2")));
        assert_eq!(manifest.len(), 1);

        let written = manifest.truncated(1).to_concat_string();
        assert_eq!(written, "# frames: /photos/day2\nfile /input/a.jpg\n");
        assert_eq!(Manifest::parse(&written).unwrap(), manifest);
    }

    #[test]
    fn test_rebased_only_touches_relative_entries() {
        let manifest = Manifest::parse("file f0.jpg\nduration 0.5\nfile /abs/f1.jpg\nfile sub/f2.jpg\n")
            .unwrap();
        assert!(manifest.has_relative_entries());

        let rebased = manifest.rebased("/lists/");
        let paths: Vec<_> = rebased.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["/lists/f0.jpg", "/abs/f1.jpg", "/lists/sub/f2.jpg"]);
        assert_eq!(rebased.entries()[0].duration, Some(0.5));
        assert!(!rebased.has_relative_entries());
    }

    #[test]
    fn test_references_mount() {
        let manifest = Manifest::parse("file /input/a.jpg\n").unwrap();
        assert!(manifest.references_mount("/input"));
        assert!(manifest.references_mount("/input/"));
        assert!(!manifest.references_mount("/in"));
    }

    #[test]
    fn test_missing_manifest_is_missing_prerequisite() {
        let temp_dir = TempDir::new().unwrap();
        let source = FrameSource::Manifest {
            path: temp_dir.path().join("ffmpeg_list.txt"),
        };
        assert!(matches!(
            source.validate(),
            Err(AssemblyError::MissingPrerequisite(_))
        ));
    }

    #[test]
    fn test_glob_source_counts_matches() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["a.jpg", "b.jpg", "c.txt"] {
            fs::write(temp_dir.path().join(name), b"x").unwrap();
        }
        let source = FrameSource::Glob {
            directory: temp_dir.path().to_path_buf(),
            pattern: "*.jpg".to_string(),
        };
        assert!(source.validate().is_ok());
        assert_eq!(source.frame_count().unwrap(), 2);
    }
}
