use crate::tools::frame_name::{FrameName, SortKey};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub path: PathBuf,
    pub name: FrameName,
}

impl CameraFrame {
    /// 從任意路徑建立，檔名不符合相機格式時回傳 `None`
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        Some(Self {
            path: path.to_path_buf(),
            name: FrameName::parse(file_name)?,
        })
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// 掃描目錄（不遞迴）中符合相機命名規則的影格，尚未排序
pub fn scan_camera_frames(directory: &Path) -> Result<Vec<CameraFrame>> {
    let frames = WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| CameraFrame::from_path(entry.path()))
        .collect();

    Ok(frames)
}

/// 穩定排序，相同鍵值保留原順序
pub fn sort_frames(frames: &mut [CameraFrame], key: SortKey) {
    frames.sort_by(|a, b| a.name.compare(&b.name, key));
}

/// 以 glob 樣式列出目錄內的影格，依字典序排列
pub fn list_glob_matches(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    // 目錄部分可能含有 `[` 等字元，需跳脫後才能與樣式組合
    let escaped_directory = glob::Pattern::escape(&directory.to_string_lossy());
    let pattern_text = Path::new(&escaped_directory)
        .join(pattern)
        .to_string_lossy()
        .into_owned();

    let mut paths: Vec<PathBuf> = glob::glob_with(&pattern_text, glob::MatchOptions::new())
        .with_context(|| format!("無效的 glob 樣式: {pattern_text}"))?
        .filter_map(std::result::Result::ok)
        .filter(|path| path.is_file())
        .collect();

    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"jpeg").unwrap();
    }

    #[test]
    fn test_scan_ignores_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "IMG_20250728_115906_AATP1401.jpg");
        touch(temp_dir.path(), "IMG_20250728_115936_AATP1402.jpg");
        touch(temp_dir.path(), "notes.txt");
        touch(temp_dir.path(), "IMG_broken.jpg");
        fs::create_dir(temp_dir.path().join("IMG_20250728_120006_AATP1403.jpg")).unwrap();

        let frames = scan_camera_frames(temp_dir.path()).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_sort_frames_by_sequence() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "IMG_20250728_120006_AATP0010.jpg");
        touch(temp_dir.path(), "IMG_20250728_115906_AATP0002.jpg");
        touch(temp_dir.path(), "IMG_20250728_115936_AATP0003.jpg");

        let mut frames = scan_camera_frames(temp_dir.path()).unwrap();
        sort_frames(&mut frames, SortKey::Sequence);

        let sequences: Vec<u64> = frames.iter().map(|f| f.name.sequence).collect();
        assert_eq!(sequences, vec![2, 3, 10]);
    }

    #[test]
    fn test_glob_matches_are_lexicographic() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "b.jpg");
        touch(temp_dir.path(), "a.jpg");
        touch(temp_dir.path(), "c.png");

        let matches = list_glob_matches(temp_dir.path(), "*.jpg").unwrap();
        let names: Vec<_> = matches
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }
}
