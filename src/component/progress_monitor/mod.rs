//! 編碼進度監控元件

mod main;
mod progress_parser;

pub use main::{ProgressMonitor, status_line};
pub use progress_parser::{ProgressSnapshot, format_remaining};
