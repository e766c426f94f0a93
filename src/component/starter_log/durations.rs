use super::document::StarterDocument;
use anyhow::{Result, bail};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use log::warn;
use serde_json::{Value, json};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// ISO 8601 時間；有時區與無時區的時間不能互相比較
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoTime {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl IsoTime {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if let Ok(time) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self::Zoned(time));
        }
        for format in NAIVE_FORMATS {
            if let Ok(time) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Self::Naive(time));
            }
        }
        bail!("無法解析時間: {text}");
    }

    /// 兩個時間的差距（秒，向零取整）
    pub fn seconds_until(self, end: Self) -> Result<i64> {
        let delta = match (self, end) {
            (Self::Zoned(start), Self::Zoned(end)) => end - start,
            (Self::Naive(start), Self::Naive(end)) => end - start,
            _ => bail!("無法比較有時區與無時區的時間"),
        };
        Ok(delta.num_seconds())
    }
}

/// `7h45m`、`7h`、`45m`、`30s`
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    match (hours, minutes) {
        (0, 0) => format!("{}s", seconds % 60),
        (0, m) => format!("{m}m"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{m}m"),
    }
}

/// 更新一筆紀錄的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationUpdate {
    pub filename: String,
    pub seconds: u64,
    pub formatted: String,
}

/// 對同時有 `start_time` 與 `end_time` 的紀錄寫入 `duration_seconds` 與 `duration`
///
/// 無法解析或結束早於開始的紀錄會略過並記錄警告。
pub fn update_durations(document: &mut StarterDocument) -> Vec<DurationUpdate> {
    let mut updates = Vec::new();

    for video in document.videos_mut() {
        let (Some(start), Some(end)) = (video.get("start_time"), video.get("end_time")) else {
            continue;
        };
        let filename = video
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let seconds = match duration_between(start, end) {
            Ok(seconds) => seconds,
            Err(e) => {
                warn!("略過 {filename}: {e}");
                continue;
            }
        };

        let formatted = format_duration(seconds);
        video.insert("duration_seconds".to_string(), json!(seconds));
        video.insert("duration".to_string(), json!(formatted));
        updates.push(DurationUpdate {
            filename,
            seconds,
            formatted,
        });
    }

    updates
}

fn duration_between(start: &Value, end: &Value) -> Result<u64> {
    let (Some(start), Some(end)) = (start.as_str(), end.as_str()) else {
        bail!("start_time/end_time 必須是字串");
    };
    let seconds = IsoTime::parse(start)?.seconds_until(IsoTime::parse(end)?)?;
    if seconds < 0 {
        bail!("結束時間早於開始時間");
    }
    Ok(seconds.unsigned_abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(7 * 3600 + 45 * 60), "7h45m");
        assert_eq!(format_duration(7 * 3600 + 20), "7h");
        assert_eq!(format_duration(45 * 60 + 59), "45m");
        assert_eq!(format_duration(30), "30s");
        assert_eq!(format_duration(0), "0s");
    }

    #[test]
    fn test_parse_iso_variants() {
        let naive = IsoTime::parse("2025-03-01T08:00:00").unwrap();
        let later = IsoTime::parse("2025-03-01 15:45:30.5").unwrap();
        assert_eq!(naive.seconds_until(later).unwrap(), 7 * 3600 + 45 * 60 + 30);

        let zoned = IsoTime::parse("2025-03-01T08:00:00+08:00").unwrap();
        let utc = IsoTime::parse("2025-03-01T01:00:00Z").unwrap();
        assert_eq!(zoned.seconds_until(utc).unwrap(), 3600);

        assert!(naive.seconds_until(zoned).is_err());
        assert!(IsoTime::parse("yesterday").is_err());
    }

    #[test]
    fn test_update_durations_fills_fields() {
        let mut document = StarterDocument::from_value(json!({
            "videos": [
                {"filename": "a.mp4", "start_time": "2025-03-01T08:00:00", "end_time": "2025-03-01T15:45:00"},
                {"filename": "b.mp4", "start_time": "2025-03-01T08:00:00"},
                {"filename": "c.mp4", "start_time": "2025-03-01T09:00:00", "end_time": "2025-03-01T08:00:00"},
                {"start_time": "2025-03-01T08:00:00", "end_time": "2025-03-01T08:00:30"}
            ]
        }));

        let updates = update_durations(&mut document);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].filename, "a.mp4");
        assert_eq!(updates[0].formatted, "7h45m");
        assert_eq!(updates[1].filename, "unknown");
        assert_eq!(updates[1].formatted, "30s");

        let videos = document.videos();
        assert_eq!(videos[0]["duration_seconds"], json!(27900));
        assert_eq!(videos[0]["duration"], json!("7h45m"));
        assert!(videos[1].get("duration").is_none());
        assert!(videos[2].get("duration").is_none());
    }
}
