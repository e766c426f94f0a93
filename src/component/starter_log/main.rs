use super::analyzer::{AnalyzeSortKey, analyze, render_detail_table, render_summary_table};
use super::document::StarterDocument;
use super::durations::update_durations;
use super::repair::{FileReport, add_missing_active_times, mp4_file_names};
use crate::tools::validate_directory_exists;
use anyhow::Result;
use console::style;
use log::info;
use std::path::Path;

/// 發酵紀錄檔的維護工具
pub struct StarterLog;

impl StarterLog {
    /// 補上缺少的欄位、以排序後的鍵值重寫，並回報紀錄與磁碟上 mp4 的差異
    pub fn fix(manifest: &Path, directory: &Path) -> Result<FileReport> {
        validate_directory_exists(directory)?;
        let mut document = StarterDocument::load(manifest)?;
        let on_disk = mp4_file_names(directory)?;

        let modified = add_missing_active_times(&mut document);
        document.save(manifest)?;
        if modified {
            println!("{}", style("已補上缺少的 active 時間欄位").green());
            info!("已更新 {}", manifest.display());
        }

        let report = FileReport::compare(&document, &on_disk);
        if !report.missing_from_disk.is_empty() {
            println!("{}", style("紀錄中有、但磁碟上找不到的 mp4:").yellow());
            for name in &report.missing_from_disk {
                println!("  {name}");
            }
        }
        if !report.missing_from_log.is_empty() {
            println!("{}", style("磁碟上有、但紀錄中沒有的 mp4:").yellow());
            for name in &report.missing_from_log {
                println!("  {name}");
            }
        }

        Ok(report)
    }

    /// 由開始與結束時間計算長度並寫回紀錄檔，回傳更新筆數
    pub fn update_durations(manifest: &Path) -> Result<usize> {
        let mut document = StarterDocument::load(manifest)?;
        let updates = update_durations(&mut document);

        for update in &updates {
            println!(
                "已更新 {}: {} ({}s)",
                update.filename, update.formatted, update.seconds
            );
        }
        document.save(manifest)?;

        println!(
            "\n{}",
            style(format!("共更新 {} 筆紀錄: {}", updates.len(), manifest.display())).green()
        );
        Ok(updates.len())
    }

    pub fn analyze(file: &Path, detailed: bool, sort_by: AnalyzeSortKey) -> Result<()> {
        let document = StarterDocument::load_any(file)?;
        let videos = document.videos();

        if videos.is_empty() {
            println!("{}", style("紀錄檔中沒有任何影片").red());
            return Ok(());
        }

        let stats = analyze(videos, sort_by);
        if stats.is_empty() {
            println!("{}", style("沒有有效的時間資料").red());
            return Ok(());
        }

        println!(
            "{}\n",
            style(format!("分析 {} 筆紀錄: {}", videos.len(), file.display())).bold()
        );
        println!("{}", style("各比例的發酵高峰時間").cyan().bold());
        println!("{}", render_summary_table(&stats));

        if detailed {
            for group in &stats {
                println!("\n{}", style(format!("比例 {}:", group.ratio)).cyan().bold());
                println!("{}", render_detail_table(group));
            }
        }

        Ok(())
    }
}
