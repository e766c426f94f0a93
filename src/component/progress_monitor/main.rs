use super::progress_parser::{ProgressSnapshot, format_remaining};
use anyhow::Result;
use chrono::{DateTime, Local, TimeDelta};
use console::{Term, style};
use log::{debug, info};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

const SLEEP_STEP: Duration = Duration::from_millis(100);

/// 定期讀取進度記錄檔並顯示完成比例與預估完成時間
pub struct ProgressMonitor {
    log_path: PathBuf,
    total_frames: u64,
    refresh_interval: Duration,
    shutdown_signal: Arc<AtomicBool>,
}

impl ProgressMonitor {
    #[must_use]
    pub const fn new(
        log_path: PathBuf,
        total_frames: u64,
        refresh_interval: Duration,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            log_path,
            total_frames,
            refresh_interval,
            shutdown_signal,
        }
    }

    /// 讀取目前進度；記錄檔尚未建立時回傳 `None`
    #[must_use]
    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        match fs::read(&self.log_path) {
            Ok(bytes) => ProgressSnapshot::parse_latest(&String::from_utf8_lossy(&bytes)),
            Err(e) => {
                debug!("無法讀取進度記錄檔 {}: {e}", self.log_path.display());
                None
            }
        }
    }

    pub fn run(&self, once: bool) -> Result<()> {
        let term = Term::stdout();

        if once {
            term.write_line(&status_line(self.snapshot(), self.total_frames, Local::now()))?;
            return Ok(());
        }

        println!("{}", style("FFmpeg 進度監控").cyan().bold());
        println!("總影格數: {}", self.total_frames);
        println!("{}", style("按 Ctrl+C 停止監控").dim());
        println!();
        info!("開始監控 {}", self.log_path.display());

        while !self.shutdown_signal.load(Ordering::SeqCst) {
            let line = status_line(self.snapshot(), self.total_frames, Local::now());
            term.clear_line()?;
            term.write_str(&line)?;
            self.wait_next_refresh();
        }

        term.write_line("")?;
        println!("{}", style("監控已停止").yellow());
        Ok(())
    }

    fn wait_next_refresh(&self) {
        let started = Instant::now();
        while started.elapsed() < self.refresh_interval {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                return;
            }
            thread::sleep(SLEEP_STEP);
        }
    }
}

/// 單行狀態文字
#[must_use]
pub fn status_line(
    snapshot: Option<ProgressSnapshot>,
    total_frames: u64,
    now: DateTime<Local>,
) -> String {
    let Some(progress) = snapshot else {
        return "等待進度資料中...".to_string();
    };

    let head = format!(
        "Frame: {:4}/{} ({:5.1}%)",
        progress.frame,
        total_frames,
        progress.percent_of(total_frames)
    );

    match progress.remaining_seconds(total_frames) {
        Some(remaining) => {
            let eta = TimeDelta::try_milliseconds((remaining * 1000.0) as i64)
                .and_then(|delta| now.checked_add_signed(delta))
                .map_or_else(|| "--:--:--".to_string(), |t| t.format("%H:%M:%S").to_string());
            let speed = progress
                .speed
                .map(|s| format!(" ({s:.2}x)"))
                .unwrap_or_default();
            format!(
                "{head} | Speed: {:4.1} fps{speed} | Remaining: {} | ETA: {eta}",
                progress.fps,
                format_remaining(remaining)
            )
        }
        None => format!("{head} | 計算中..."),
    }
}
