//! 發酵紀錄（縮時影片清單）元件
//!
//! - `fix`: 補齊欄位並比對磁碟上的 mp4
//! - `durations`: 由開始、結束時間計算長度
//! - `analyze`: 依比例統計發酵高峰時間

mod analyzer;
mod document;
mod durations;
mod main;
mod repair;

pub use analyzer::{AnalyzeSortKey, RatioStats, analyze, humanize_peak};
pub use document::{DEFAULT_LOG_FILE, StarterDocument};
pub use durations::{DurationUpdate, IsoTime, format_duration};
pub use main::StarterLog;
pub use repair::FileReport;
