//! 命令列介面定義

use crate::component::starter_log::{AnalyzeSortKey, DEFAULT_LOG_FILE};
use crate::config::DEFAULT_SETTINGS_FILE;
use crate::tools::SortKey;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 縮時攝影影片組裝工具
#[derive(Debug, Parser)]
#[command(name = "timelapse", version, about)]
pub struct Cli {
    /// 設定檔路徑
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,

    /// 顯示除錯訊息
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// 以設定中的影格目錄組裝影片
    Render {
        /// 只組裝前 N 分鐘的預覽
        preview_minutes: Option<u32>,
    },

    /// 以 concat 清單檔組裝影片
    Concat {
        /// ffmpeg concat 清單檔
        manifest: PathBuf,

        /// 只組裝前 N 分鐘的預覽
        preview_minutes: Option<u32>,
    },

    /// 掃描相機影格並產生 concat 清單
    Manifest {
        /// 影格所在目錄
        directory: PathBuf,

        /// 輸出檔案（預設為設定中的清單檔名）
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t)]
        sort_by: SortKey,
    },

    /// 由標準輸入讀取影格路徑，產生可獨立執行的編碼腳本
    Script {
        /// 輸出檔案（預設為設定中的腳本檔名）
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t)]
        sort_by: SortKey,
    },

    /// 監控編碼進度並估算完成時間
    Monitor {
        /// 進度記錄檔（預設為設定中的記錄檔）
        #[arg(long)]
        log: Option<PathBuf>,

        /// 總影格數（預設由影格來源計算）
        #[arg(long)]
        total_frames: Option<u64>,

        /// 更新間隔（秒）
        #[arg(long, default_value_t = 2)]
        interval: u64,

        /// 只顯示一次目前進度
        #[arg(long)]
        once: bool,
    },

    /// 以二分搜尋逐步檢視影格
    Bisect {
        /// 影格所在目錄
        directory: PathBuf,
    },

    /// 發酵紀錄檔工具
    Starter {
        #[command(subcommand)]
        action: StarterAction,
    },

    /// 設定檔工具
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum StarterAction {
    /// 補齊欄位、排序鍵值並比對磁碟上的 mp4
    Fix {
        #[arg(long, default_value = DEFAULT_LOG_FILE)]
        manifest: PathBuf,

        /// 要比對 mp4 的目錄
        #[arg(long, default_value = ".")]
        directory: PathBuf,
    },

    /// 由開始、結束時間計算影片長度
    Durations {
        #[arg(default_value = DEFAULT_LOG_FILE)]
        manifest: PathBuf,
    },

    /// 依比例統計發酵高峰時間（JSON 或 YAML）
    Analyze {
        file: PathBuf,

        /// 列出每個比例的逐筆明細
        #[arg(short, long)]
        detailed: bool,

        #[arg(long, value_enum, default_value_t)]
        sort_by: AnalyzeSortKey,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// 寫出預設設定檔
    Init {
        /// 覆寫既有設定檔
        #[arg(long)]
        force: bool,
    },
}
