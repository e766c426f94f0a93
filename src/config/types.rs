use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 預設設定檔名稱（位於目前工作目錄）
pub const DEFAULT_SETTINGS_FILE: &str = "timelapse.json";

/// 容器執行環境設定
///
/// 存在時，編碼器會透過 `docker run` 之類的容器指令執行，
/// 並把工作目錄、影格目錄掛載到容器內的固定路徑。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    pub runtime: String,
    pub image: String,
    /// 容器名稱，`None` 時由執行環境自動命名
    pub name: Option<String>,
    pub workspace_mount: String,
    pub input_mount: String,
    pub manifest_mount: String,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            image: "jrottenberg/ffmpeg:latest".to_string(),
            name: None,
            workspace_mount: "/workspace".to_string(),
            input_mount: "/input".to_string(),
            manifest_mount: "/manifest".to_string(),
        }
    }
}

/// 編碼參數：全部由使用者設定決定，不做任何推算
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    pub frame_rate: u32,
    pub scale: String,
    pub codec: String,
    pub preset: String,
    pub crf: u32,
    pub pixel_format: String,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            frame_rate: 15,
            scale: "1280:720".to_string(),
            codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 28,
            pixel_format: "yuv420p".to_string(),
        }
    }
}

/// 縮時影片組裝設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelapseSettings {
    /// 兩張影格之間的拍攝間隔（秒）
    pub capture_interval_seconds: u32,
    pub encoder_binary: String,
    pub input_directory: PathBuf,
    pub frame_pattern: String,
    pub workspace_directory: PathBuf,
    pub output_name: String,
    pub preview_output_name: String,
    pub progress_log_name: String,
    pub manifest_name: String,
    pub preview_manifest_name: String,
    pub script_name: String,
    pub encoding: EncodingSettings,
    pub container: Option<ContainerSettings>,
}

impl Default for TimelapseSettings {
    fn default() -> Self {
        Self {
            capture_interval_seconds: 30,
            encoder_binary: "ffmpeg".to_string(),
            input_directory: PathBuf::from("images"),
            frame_pattern: "*.jpg".to_string(),
            workspace_directory: PathBuf::from("."),
            output_name: "timelapse.mp4".to_string(),
            preview_output_name: "preview.mp4".to_string(),
            progress_log_name: "ffmpeg_progress.log".to_string(),
            manifest_name: "ffmpeg_list.txt".to_string(),
            preview_manifest_name: "preview_list.txt".to_string(),
            script_name: "run_ffmpeg.sh".to_string(),
            encoding: EncodingSettings::default(),
            container: Some(ContainerSettings::default()),
        }
    }
}

impl TimelapseSettings {
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.workspace_directory.join(&self.output_name)
    }

    #[must_use]
    pub fn preview_output_path(&self) -> PathBuf {
        self.workspace_directory.join(&self.preview_output_name)
    }

    #[must_use]
    pub fn progress_log_path(&self) -> PathBuf {
        self.workspace_directory.join(&self.progress_log_name)
    }

    #[must_use]
    pub fn preview_manifest_path(&self) -> PathBuf {
        self.workspace_directory.join(&self.preview_manifest_name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: TimelapseSettings,
    pub settings_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_capture_setup() {
        let settings = TimelapseSettings::default();
        assert_eq!(settings.capture_interval_seconds, 30);
        assert_eq!(settings.encoding.frame_rate, 15);
        assert_eq!(settings.encoding.scale, "1280:720");
        assert_eq!(settings.encoding.crf, 28);
        assert_ne!(settings.output_name, settings.preview_output_name);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: TimelapseSettings =
            serde_json::from_str(r#"{"capture_interval_seconds": 10, "encoding": {"crf": 20}}"#)
                .unwrap();
        assert_eq!(settings.capture_interval_seconds, 10);
        assert_eq!(settings.encoding.crf, 20);
        assert_eq!(settings.encoding.codec, "libx264");
        assert_eq!(settings.output_name, "timelapse.mp4");
    }

    #[test]
    fn test_null_container_means_native_encoder() {
        let settings: TimelapseSettings =
            serde_json::from_str(r#"{"container": null, "input_directory": "/data/frames"}"#)
                .unwrap();
        assert!(settings.container.is_none());
        assert_eq!(settings.input_directory, PathBuf::from("/data/frames"));
    }
}
