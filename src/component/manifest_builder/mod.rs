//! 影格清單產生元件
//!
//! 依相機檔名排序影格，輸出 ffmpeg concat 清單或可獨立執行的編碼腳本

mod main;
mod script_writer;

pub use main::{ManifestBuilder, ManifestSummary};
pub use script_writer::{ScriptSummary, ScriptWriter};
