//! 相機影格檔名解析
//!
//! 縮時相機輸出的檔名格式為 `IMG_YYYYMMDD_HHMMSS_AATPNNNN.jpg`

use clap::ValueEnum;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static REGEX_FRAME_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^IMG_(\d{8})_(\d{6})_AATP(\d+)(?i:\.jpg)$").expect("Invalid regex")
});

/// 影格排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SortKey {
    /// 依 AATP 序號
    #[default]
    Sequence,
    /// 依拍攝日期與時間
    Timestamp,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence number"),
            Self::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// 解析後的影格檔名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameName {
    /// `YYYYMMDD`
    pub date: String,
    /// `HHMMSS`
    pub time: String,
    /// AATP 序號（已去除前綴）
    pub sequence: u64,
}

impl FrameName {
    /// 解析檔名（不含目錄），格式不符時回傳 `None`
    #[must_use]
    pub fn parse(file_name: &str) -> Option<Self> {
        let captures = REGEX_FRAME_NAME.captures(file_name)?;
        let sequence = captures[3].parse::<u64>().ok()?;

        Some(Self {
            date: captures[1].to_string(),
            time: captures[2].to_string(),
            sequence,
        })
    }

    #[must_use]
    pub fn compare(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::Sequence => self.sequence.cmp(&other.sequence),
            SortKey::Timestamp => (&self.date, &self.time, self.sequence).cmp(&(
                &other.date,
                &other.time,
                other.sequence,
            )),
        }
    }
}
