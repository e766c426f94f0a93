//! 縮時影片組裝元件
//!
//! 將依序排列的影格交給外部編碼器（ffmpeg，可在容器內執行）組成 MP4，
//! 並可依預覽長度只取前 N 張影格

mod error;
mod ffmpeg_command;
mod frame_limit;
mod frame_source;
mod main;
mod run_lock;
mod runner;

pub use error::{AssemblyError, exit_code_for};
pub use ffmpeg_command::{
    EncodeJob, EncoderInput, FfmpegCommand, Mount, concat_input_args, container_args,
    encoder_args,
};
pub use frame_limit::{CaptureInterval, RenderMode};
pub use frame_source::{FrameSource, Manifest, ManifestEntry};
pub use main::{RenderReport, RenderRequest, SourceSelection, TimelapseAssembler};
pub use run_lock::{LockRecord, RunLock};
pub use runner::{EncoderExit, EncoderRunner, ProcessRunner};
