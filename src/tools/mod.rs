pub mod frame_name;
mod frame_scanner;
mod path_validator;
pub mod shell_quote;
mod tee_writer;

pub use frame_name::{FrameName, SortKey};
pub use frame_scanner::{CameraFrame, list_glob_matches, scan_camera_frames, sort_frames};
pub use path_validator::{ensure_directory_exists, validate_directory_exists, validate_file_exists};
pub use tee_writer::TeeWriter;
