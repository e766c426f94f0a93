//! 解析 ffmpeg 進度輸出

use regex::Regex;
use std::sync::LazyLock;

static REGEX_FRAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"frame=\s*(\d+)").expect("Invalid regex"));

static REGEX_FPS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fps=\s*([\d.]+)").expect("Invalid regex"));

static REGEX_SPEED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"speed=\s*([\d.]+)x").expect("Invalid regex"));

/// 最近一次進度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub frame: u64,
    pub fps: f64,
    pub speed: Option<f64>,
}

impl ProgressSnapshot {
    /// 取記錄中最後出現的 `frame=`、`fps=` 與 `speed=`；缺少 frame 或 fps 時回傳 `None`
    #[must_use]
    pub fn parse_latest(content: &str) -> Option<Self> {
        let frame = last_capture(&REGEX_FRAME, content)?.parse::<u64>().ok()?;
        let fps = last_capture(&REGEX_FPS, content)?.parse::<f64>().ok()?;
        let speed = last_capture(&REGEX_SPEED, content).and_then(|s| s.parse::<f64>().ok());

        Some(Self { frame, fps, speed })
    }

    #[must_use]
    pub fn percent_of(&self, total_frames: u64) -> f64 {
        if total_frames == 0 {
            return 0.0;
        }
        self.frame as f64 / total_frames as f64 * 100.0
    }

    /// 以目前處理速度估算剩餘秒數；fps 為 0 時無法估算
    #[must_use]
    pub fn remaining_seconds(&self, total_frames: u64) -> Option<f64> {
        if self.fps <= 0.0 {
            return None;
        }
        let remaining_frames = total_frames.saturating_sub(self.frame);
        Some(remaining_frames as f64 / self.fps)
    }
}

fn last_capture<'a>(regex: &Regex, content: &'a str) -> Option<&'a str> {
    regex
        .captures_iter(content)
        .last()
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// `42s`、`3m 5s`、`2h 10m`
#[must_use]
pub fn format_remaining(seconds: f64) -> String {
    // 先取整秒再拆分，避免 `1m 60s`
    let total = seconds.max(0.0).round() as u64;
    if total < 60 {
        format!("{total}s")
    } else if total < 3600 {
        format!("{}m {}s", total / 60, total % 60)
    } else {
        format!("{}h {}m", total / 3600, (total % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "frame=   10 fps=2.5 q=28.0 size=     256kB time=00:00:00.60 bitrate=3495.3kbits/s speed=0.15x\r\
frame=   42 fps=3.1 q=28.0 size=    1024kB time=00:00:02.73 bitrate=3072.0kbits/s speed=0.21x\r";

    #[test]
    fn test_parse_latest_values() {
        let snapshot = ProgressSnapshot::parse_latest(LOG).unwrap();
        assert_eq!(snapshot.frame, 42);
        assert!((snapshot.fps - 3.1).abs() < f64::EPSILON);
        assert_eq!(snapshot.speed, Some(0.21));
    }

    #[test]
    fn test_parse_without_progress() {
        assert!(ProgressSnapshot::parse_latest("Input #0, concat, from 'list.txt':").is_none());
        assert!(ProgressSnapshot::parse_latest("frame=3").is_none());
    }

    #[test]
    fn test_estimates() {
        let snapshot = ProgressSnapshot {
            frame: 500,
            fps: 5.0,
            speed: None,
        };
        assert!((snapshot.percent_of(2000) - 25.0).abs() < 1e-9);
        assert_eq!(snapshot.remaining_seconds(2000), Some(300.0));
        assert_eq!(snapshot.remaining_seconds(100), Some(0.0));

        let stalled = ProgressSnapshot { fps: 0.0, ..snapshot };
        assert_eq!(stalled.remaining_seconds(2000), None);
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(42.0), "42s");
        assert_eq!(format_remaining(185.0), "3m 5s");
        assert_eq!(format_remaining(7800.0), "2h 10m");
    }

    #[test]
    fn test_format_remaining_rounds_before_splitting() {
        assert_eq!(format_remaining(59.6), "1m 0s");
        assert_eq!(format_remaining(119.7), "2m 0s");
        assert_eq!(format_remaining(3599.6), "1h 0m");
        assert_eq!(format_remaining(-3.0), "0s");
    }
}
