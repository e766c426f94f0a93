//! 功能元件模組
//!
//! 每個子模組實現一個獨立的功能，包含主要邏輯和專用工具

pub mod frame_bisector;
pub mod manifest_builder;
pub mod progress_monitor;
pub mod starter_log;
pub mod timelapse_assembler;

pub use frame_bisector::FrameBisector;
pub use manifest_builder::{ManifestBuilder, ScriptWriter};
pub use progress_monitor::ProgressMonitor;
pub use starter_log::StarterLog;
pub use timelapse_assembler::{ProcessRunner, TimelapseAssembler};
