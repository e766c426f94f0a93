use crate::config::types::{Config, TimelapseSettings};
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

impl Config {
    /// 從設定檔載入；檔案不存在時使用預設值
    pub fn load(path: &Path) -> Result<Self> {
        let settings = Self::load_settings(path)?;

        Ok(Self {
            settings,
            settings_path: path.to_path_buf(),
        })
    }

    fn load_settings(path: &Path) -> Result<TimelapseSettings> {
        if !path.exists() {
            debug!("設定檔不存在，使用預設值: {}", path.display());
            return Ok(TimelapseSettings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }
}
