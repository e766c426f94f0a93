use crate::config::types::TimelapseSettings;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// 寫出設定檔；已存在時需要 `force` 才會覆寫
pub fn save_settings(settings: &TimelapseSettings, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("設定檔已存在: {}（使用 --force 覆寫）", path.display());
    }

    let content = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

    fs::write(path, content)
        .with_context(|| format!("Failed to write settings to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timelapse.json");

        let mut settings = TimelapseSettings::default();
        settings.capture_interval_seconds = 15;
        settings.container = None;
        save_settings(&settings, &path, false).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.settings, settings);
    }

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("timelapse.json");
        fs::write(&path, "{}").unwrap();

        assert!(save_settings(&TimelapseSettings::default(), &path, false).is_err());
        assert!(save_settings(&TimelapseSettings::default(), &path, true).is_ok());
    }
}
