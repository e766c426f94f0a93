//! 發酵紀錄文件的讀寫
//!
//! 以 `serde_json::Value` 保存整份文件，未知欄位原樣保留；
//! 輸出時鍵值依字母排序、縮排兩個空白。

use crate::tools::validate_file_exists;
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

pub const DEFAULT_LOG_FILE: &str = "sourdough-starter-manifest.json";

#[derive(Debug, Clone, PartialEq)]
pub struct StarterDocument {
    root: Value,
}

impl StarterDocument {
    #[must_use]
    pub const fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// 讀取 JSON 紀錄檔
    pub fn load(path: &Path) -> Result<Self> {
        validate_file_exists(path)?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read starter log from {}", path.display()))?;
        let root = serde_json::from_str(&content)
            .with_context(|| format!("無法解析 JSON: {}", path.display()))?;
        Ok(Self { root })
    }

    /// 依副檔名讀取 JSON 或 YAML；副檔名不明時先試 JSON 再試 YAML
    pub fn load_any(path: &Path) -> Result<Self> {
        validate_file_exists(path)?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read starter log from {}", path.display()))?;

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let root = match extension.as_str() {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("無法解析 JSON: {}", path.display()))?,
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("無法解析 YAML: {}", path.display()))?,
            _ => Self::parse_unknown(&content)
                .with_context(|| format!("無法辨識檔案格式，請使用 .json 或 .yaml/.yml: {}", path.display()))?,
        };

        Ok(Self { root })
    }

    fn parse_unknown(content: &str) -> Result<Value> {
        if let Ok(value) = serde_json::from_str(content) {
            return Ok(value);
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&sorted_keys(&self.root))?;
        content.push('\n');
        fs::write(path, content)
            .with_context(|| format!("Failed to write starter log to {}", path.display()))?;
        Ok(())
    }

    /// `videos` 陣列；不存在或型別不符時為空
    #[must_use]
    pub fn videos(&self) -> &[Value] {
        self.root
            .get("videos")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn videos_mut(&mut self) -> impl Iterator<Item = &mut serde_json::Map<String, Value>> {
        self.root
            .get_mut("videos")
            .and_then(Value::as_array_mut)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object_mut)
    }
}

fn sorted_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.clone(), sorted_keys(value)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted_keys).collect()),
        other => other.clone(),
    }
}

/// 文字欄位；數字等其他型別轉成字串表示
#[must_use]
pub fn text_field(video: &Value, key: &str) -> Option<String> {
    match video.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
