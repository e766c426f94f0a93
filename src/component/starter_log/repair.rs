use super::document::StarterDocument;
use crate::tools::list_glob_matches;
use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;

const ACTIVE_TIME_KEYS: [&str; 2] = ["active_start_time", "active_end_time"];

/// 補上缺少的 `active_start_time`/`active_end_time`（空字串），回傳是否有修改
pub fn add_missing_active_times(document: &mut StarterDocument) -> bool {
    let mut modified = false;
    for video in document.videos_mut() {
        for key in ACTIVE_TIME_KEYS {
            if !video.contains_key(key) {
                video.insert(key.to_string(), Value::String(String::new()));
                modified = true;
            }
        }
    }
    modified
}

/// 紀錄與磁碟上 mp4 檔案的差異
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FileReport {
    pub missing_from_disk: Vec<String>,
    pub missing_from_log: Vec<String>,
}

impl FileReport {
    #[must_use]
    pub fn compare(document: &StarterDocument, on_disk: &BTreeSet<String>) -> Self {
        let logged: BTreeSet<String> = document
            .videos()
            .iter()
            .filter_map(|video| video.get("filename").and_then(Value::as_str))
            .map(str::to_string)
            .collect();

        Self {
            missing_from_disk: logged.difference(on_disk).cloned().collect(),
            missing_from_log: on_disk.difference(&logged).cloned().collect(),
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing_from_disk.is_empty() && self.missing_from_log.is_empty()
    }
}

/// 目錄中（不遞迴）所有 `.mp4` 檔名
pub fn mp4_file_names(directory: &Path) -> Result<BTreeSet<String>> {
    Ok(list_glob_matches(directory, "*.mp4")?
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_add_missing_active_times_keeps_existing_values() {
        let mut document = StarterDocument::from_value(json!({
            "videos": [
                {"filename": "a.mp4", "active_start_time": "2025-01-01T08:00:00"},
                {"filename": "b.mp4", "active_start_time": "", "active_end_time": ""}
            ]
        }));

        assert!(add_missing_active_times(&mut document));
        let videos = document.videos();
        assert_eq!(videos[0]["active_start_time"], json!("2025-01-01T08:00:00"));
        assert_eq!(videos[0]["active_end_time"], json!(""));

        assert!(!add_missing_active_times(&mut document));
    }

    #[test]
    fn test_file_report_lists_both_directions() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.mp4"), b"").unwrap();
        fs::write(temp_dir.path().join("c.mp4"), b"").unwrap();
        fs::write(temp_dir.path().join("c.txt"), b"").unwrap();

        let document = StarterDocument::from_value(json!({
            "videos": [{"filename": "a.mp4"}, {"filename": "b.mp4"}, {"notes": "no file"}]
        }));
        let on_disk = mp4_file_names(temp_dir.path()).unwrap();
        let report = FileReport::compare(&document, &on_disk);

        assert_eq!(report.missing_from_disk, vec!["b.mp4".to_string()]);
        assert_eq!(report.missing_from_log, vec!["c.mp4".to_string()]);
        assert!(!report.is_clean());
    }
}
