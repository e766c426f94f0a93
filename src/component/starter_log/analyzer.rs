use super::document::text_field;
use clap::ValueEnum;
use console::{Alignment, pad_str, style};
use serde_json::Value;
use std::collections::BTreeMap;

const UNKNOWN_RATIO: &str = "unknown";
const NOTES_LIMIT: usize = 50;

/// 統計表的排序方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum AnalyzeSortKey {
    /// 依比例名稱，`unknown` 排最後
    #[default]
    Ratio,
    /// 依平均時間，由短到長
    Duration,
    /// 依紀錄筆數，由多到少
    Count,
}

/// 單一比例的時間統計
#[derive(Debug, Clone, PartialEq)]
pub struct RatioStats {
    pub ratio: String,
    pub count: usize,
    pub avg_seconds: f64,
    pub min_seconds: f64,
    pub max_seconds: f64,
    pub videos: Vec<Value>,
}

impl RatioStats {
    #[must_use]
    pub fn range_seconds(&self) -> f64 {
        self.max_seconds - self.min_seconds
    }
}

/// 依 `ratio` 分組並計算 `duration_seconds` 統計；沒有任何時間資料的分組會被略過
#[must_use]
pub fn analyze(videos: &[Value], sort_by: AnalyzeSortKey) -> Vec<RatioStats> {
    let mut groups: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for video in videos {
        let ratio = text_field(video, "ratio").unwrap_or_else(|| UNKNOWN_RATIO.to_string());
        groups.entry(ratio).or_default().push(video.clone());
    }

    let mut stats: Vec<RatioStats> = groups
        .into_iter()
        .filter_map(|(ratio, videos)| {
            let durations: Vec<f64> = videos
                .iter()
                .filter_map(|video| video.get("duration_seconds").and_then(Value::as_f64))
                .collect();
            if durations.is_empty() {
                return None;
            }

            let avg_seconds = durations.iter().sum::<f64>() / durations.len() as f64;
            let min_seconds = durations.iter().copied().fold(f64::INFINITY, f64::min);
            let max_seconds = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            Some(RatioStats {
                ratio,
                count: videos.len(),
                avg_seconds,
                min_seconds,
                max_seconds,
                videos,
            })
        })
        .collect();

    match sort_by {
        AnalyzeSortKey::Ratio => {
            stats.sort_by(|a, b| ratio_order(&a.ratio).cmp(&ratio_order(&b.ratio)));
        }
        AnalyzeSortKey::Duration => stats.sort_by(|a, b| a.avg_seconds.total_cmp(&b.avg_seconds)),
        AnalyzeSortKey::Count => stats.sort_by(|a, b| b.count.cmp(&a.count)),
    }

    stats
}

fn ratio_order(ratio: &str) -> (bool, &str) {
    (ratio == UNKNOWN_RATIO, ratio)
}

/// 發酵高峰時間的顯示格式，超過 30 秒時分鐘數進位
#[must_use]
pub fn humanize_peak(seconds: f64) -> String {
    let seconds = seconds.max(0.0) as u64;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let remaining = seconds % 60;

    if hours > 0 {
        if minutes > 0 {
            return format!("{hours}h{minutes}m");
        }
        return format!("{hours}h");
    }
    if minutes > 0 {
        if remaining > 30 {
            return if minutes < 59 {
                format!("{}m", minutes + 1)
            } else {
                "1h".to_string()
            };
        }
        return format!("{minutes}m");
    }
    format!("{remaining}s")
}

fn range_text(stats: &RatioStats) -> String {
    let range = stats.range_seconds();
    if range > 0.0 {
        humanize_peak(range)
    } else {
        "0m".to_string()
    }
}

/// 超過 50 個字元時截斷並加上 `...`
#[must_use]
pub fn truncate_notes(notes: &str) -> String {
    if notes.chars().count() > NOTES_LIMIT {
        let head: String = notes.chars().take(NOTES_LIMIT).collect();
        format!("{head}...")
    } else {
        notes.to_string()
    }
}

fn row(cells: &[(&str, usize)]) -> String {
    cells
        .iter()
        .map(|(text, width)| pad_str(text, *width, Alignment::Left, None).into_owned())
        .collect::<Vec<_>>()
        .join("  ")
}

/// 各比例統計表
#[must_use]
pub fn render_summary_table(stats: &[RatioStats]) -> String {
    let headers = ["Ratio", "Count", "Avg Peak Time", "Min Peak Time", "Max Peak Time", "Range"];
    let rows: Vec<[String; 6]> = stats
        .iter()
        .map(|s| {
            [
                s.ratio.clone(),
                s.count.to_string(),
                humanize_peak(s.avg_seconds),
                humanize_peak(s.min_seconds),
                humanize_peak(s.max_seconds),
                range_text(s),
            ]
        })
        .collect();

    render_table(&headers, &rows)
}

/// 單一比例的逐筆明細
#[must_use]
pub fn render_detail_table(stats: &RatioStats) -> String {
    let headers = ["Sequence", "Start Time", "Peak Time", "Duration", "Notes"];
    let rows: Vec<[String; 5]> = stats
        .videos
        .iter()
        .map(|video| {
            let duration = video
                .get("duration_seconds")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            [
                text_field(video, "sequence").unwrap_or_else(|| "N/A".to_string()),
                text_field(video, "start_time").unwrap_or_else(|| "N/A".to_string()),
                text_field(video, "end_time").unwrap_or_else(|| "N/A".to_string()),
                humanize_peak(duration),
                truncate_notes(&text_field(video, "notes").unwrap_or_default()),
            ]
        })
        .collect();

    render_table(&headers, &rows)
}

fn render_table<const N: usize>(headers: &[&str; N], rows: &[[String; N]]) -> String {
    let widths: Vec<usize> = (0..N)
        .map(|column| {
            rows.iter()
                .map(|cells| console::measure_text_width(&cells[column]))
                .chain(std::iter::once(console::measure_text_width(headers[column])))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header_cells: Vec<(&str, usize)> = headers.iter().copied().zip(widths.iter().copied()).collect();
    let mut lines = vec![style(row(&header_cells)).bold().to_string()];
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );

    for cells in rows {
        let cells: Vec<(&str, usize)> = cells
            .iter()
            .map(String::as_str)
            .zip(widths.iter().copied())
            .collect();
        lines.push(row(&cells).trim_end().to_string());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Vec<Value> {
        vec![
            json!({"ratio": "1:2:2", "duration_seconds": 7200, "sequence": 1}),
            json!({"ratio": "1:2:2", "duration_seconds": 10800, "sequence": 2}),
            json!({"ratio": "1:5:5", "duration_seconds": 36000}),
            json!({"ratio": "1:5:5"}),
            json!({"duration_seconds": 600}),
            json!({"ratio": "1:1:1"}),
        ]
    }

    #[test]
    fn test_groups_and_statistics() {
        let stats = analyze(&sample(), AnalyzeSortKey::Ratio);
        let ratios: Vec<&str> = stats.iter().map(|s| s.ratio.as_str()).collect();
        assert_eq!(ratios, vec!["1:2:2", "1:5:5", "unknown"]);

        assert_eq!(stats[0].count, 2);
        assert!((stats[0].avg_seconds - 9000.0).abs() < f64::EPSILON);
        assert!((stats[0].range_seconds() - 3600.0).abs() < f64::EPSILON);
        assert_eq!(stats[1].count, 2);
        assert!((stats[1].avg_seconds - 36000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_sort_orders() {
        let by_duration = analyze(&sample(), AnalyzeSortKey::Duration);
        assert_eq!(by_duration[0].ratio, "unknown");
        assert_eq!(by_duration[2].ratio, "1:5:5");

        let by_count = analyze(&sample(), AnalyzeSortKey::Count);
        assert_eq!(by_count[2].ratio, "unknown");
    }

    #[test]
    fn test_humanize_peak_rounds_minutes() {
        assert_eq!(humanize_peak(9000.0), "2h30m");
        assert_eq!(humanize_peak(7200.0), "2h");
        assert_eq!(humanize_peak(125.0), "2m");
        assert_eq!(humanize_peak(155.0), "3m");
        assert_eq!(humanize_peak(59.0 * 60.0 + 45.0), "1h");
        assert_eq!(humanize_peak(42.0), "42s");
    }

    #[test]
    fn test_truncate_notes() {
        assert_eq!(truncate_notes("short"), "short");
        let long = "x".repeat(60);
        assert_eq!(truncate_notes(&long), format!("{}...", "x".repeat(50)));
    }

    #[test]
    fn test_detail_table_contains_rows() {
        let stats = analyze(&sample(), AnalyzeSortKey::Ratio);
        let table = render_detail_table(&stats[0]);
        assert!(table.contains("Sequence"));
        assert!(table.lines().nth(2).unwrap().starts_with('1'));
        assert!(table.contains("N/A"));
        assert!(table.contains("3h"));
    }
}
