//! 影格二分搜尋元件
//!
//! 依拍攝時間排序影格後，以互動方式逐步縮小範圍並開啟目前影格

mod bisect_state;
mod main;

pub use bisect_state::{BisectCommand, BisectError, BisectSession};
pub use main::{BisectStep, FrameBisector};
