//! 預覽長度與影格上限換算

use super::error::AssemblyError;

/// 拍攝間隔：把牆鐘時間換算成影格數
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureInterval {
    seconds: u32,
}

impl CaptureInterval {
    pub fn from_seconds(seconds: u32) -> Result<Self, AssemblyError> {
        if seconds == 0 {
            return Err(AssemblyError::InvalidArgument(
                "拍攝間隔必須大於 0 秒".to_string(),
            ));
        }
        Ok(Self { seconds })
    }

    #[must_use]
    pub const fn seconds(self) -> u32 {
        self.seconds
    }

    /// `minutes * 60 / interval`，至少 1 張
    #[must_use]
    pub fn frames_for_minutes(self, minutes: u32) -> u64 {
        (u64::from(minutes) * 60 / u64::from(self.seconds)).max(1)
    }
}

/// 本次輸出的模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Full,
    Preview { frame_cap: u64 },
}

impl RenderMode {
    /// 依預覽長度決定模式；未提供或為 0 時處理全部影格
    #[must_use]
    pub fn from_preview(preview_minutes: Option<u32>, interval: CaptureInterval) -> Self {
        match preview_minutes {
            None | Some(0) => Self::Full,
            Some(minutes) => Self::Preview {
                frame_cap: interval.frames_for_minutes(minutes),
            },
        }
    }

    #[must_use]
    pub const fn frame_cap(self) -> Option<u64> {
        match self {
            Self::Full => None,
            Self::Preview { frame_cap } => Some(frame_cap),
        }
    }

    #[must_use]
    pub const fn is_preview(self) -> bool {
        matches!(self, Self::Preview { .. })
    }
}
