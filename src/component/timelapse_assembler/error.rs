use std::path::PathBuf;
use thiserror::Error;

/// 需要對應到特定結束碼的組裝錯誤
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("缺少必要輸入: {0}")]
    MissingPrerequisite(String),

    #[error("參數錯誤: {0}")]
    InvalidArgument(String),

    #[error("輸出檔案正由另一個執行中的工作使用 (pid {pid}): {}", lock_path.display())]
    OutputLocked { lock_path: PathBuf, pid: u32 },

    #[error("編碼器執行失敗，結束碼 {}", code.map_or_else(|| "未知（被信號終止）".to_string(), |c| c.to_string()))]
    EncoderFailed { code: Option<i32> },

    #[error("編碼被使用者中斷")]
    Interrupted,
}

impl AssemblyError {
    /// 程式結束碼；編碼器的結束碼原樣傳遞
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingPrerequisite(_) | Self::InvalidArgument(_) | Self::OutputLocked { .. } => {
                1
            }
            Self::EncoderFailed { code } => code.filter(|c| *c != 0).unwrap_or(1),
            Self::Interrupted => 130,
        }
    }
}

/// 從任意錯誤推算結束碼，非組裝錯誤一律為 1
#[must_use]
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<AssemblyError>()
        .map_or(1, AssemblyError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_exit_code_propagates() {
        assert_eq!(AssemblyError::EncoderFailed { code: Some(69) }.exit_code(), 69);
        assert_eq!(AssemblyError::EncoderFailed { code: None }.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_through_anyhow_context() {
        let err = anyhow::Error::from(AssemblyError::MissingPrerequisite("x".into()))
            .context("組裝失敗");
        assert_eq!(exit_code_for(&err), 1);

        let err = anyhow::Error::from(AssemblyError::Interrupted);
        assert_eq!(exit_code_for(&err), 130);

        let err = anyhow::anyhow!("其他錯誤");
        assert_eq!(exit_code_for(&err), 1);
    }
}
