use super::ffmpeg_command::FfmpegCommand;
use crate::tools::TeeWriter;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 編碼器結束狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderExit {
    Success,
    Failed { code: Option<i32> },
    Interrupted,
}

/// 執行編碼器呼叫的介面，測試時以替身取代實際的外部程式
pub trait EncoderRunner {
    fn run(&self, command: &FfmpegCommand, progress_log: &Path) -> Result<EncoderExit>;
}

type SharedTee = Arc<Mutex<TeeWriter<File, io::Stderr>>>;

/// 以子行程執行編碼器，stdout 與 stderr 同時寫入進度記錄檔與終端機
pub struct ProcessRunner {
    shutdown_signal: Arc<AtomicBool>,
}

impl ProcessRunner {
    #[must_use]
    pub const fn new(shutdown_signal: Arc<AtomicBool>) -> Self {
        Self { shutdown_signal }
    }

    fn spawn_stream_copier<R>(mut reader: R, sink: SharedTee) -> JoinHandle<io::Result<()>>
    where
        R: Read + Send + 'static,
    {
        thread::spawn(move || {
            let mut buffer = [0_u8; 8192];
            loop {
                let bytes = reader.read(&mut buffer)?;
                if bytes == 0 {
                    break;
                }
                let mut guard = sink
                    .lock()
                    .map_err(|_| io::Error::other("進度輸出鎖已損毀"))?;
                guard.write_all(&buffer[..bytes])?;
                guard.flush()?;
            }
            Ok(())
        })
    }
}

impl EncoderRunner for ProcessRunner {
    fn run(&self, command: &FfmpegCommand, progress_log: &Path) -> Result<EncoderExit> {
        let log_file = File::create(progress_log)
            .with_context(|| format!("無法建立進度記錄檔: {}", progress_log.display()))?;
        let sink: SharedTee = Arc::new(Mutex::new(TeeWriter::new(log_file, io::stderr())));

        let mut process = command.build_command();
        process
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = process
            .spawn()
            .with_context(|| format!("無法啟動編碼器: {}", command.program()))?;
        info!("啟動編碼器 [{}]: {}", child.id(), command.to_shell_line());

        let mut copiers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            copiers.push(Self::spawn_stream_copier(stdout, Arc::clone(&sink)));
        }
        if let Some(stderr) = child.stderr.take() {
            copiers.push(Self::spawn_stream_copier(stderr, Arc::clone(&sink)));
        }

        let exit = loop {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷信號，終止編碼器 [{}]", child.id());
                let _ = child.kill();
                let _ = child.wait();
                break EncoderExit::Interrupted;
            }

            match child.try_wait().context("無法檢查編碼器狀態")? {
                Some(status) if status.success() => break EncoderExit::Success,
                Some(status) => {
                    break EncoderExit::Failed {
                        code: status.code(),
                    };
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        for copier in copiers {
            match copier.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("轉送編碼器輸出時發生錯誤: {e}"),
                Err(_) => warn!("轉送編碼器輸出的執行緒異常結束"),
            }
        }

        if let Ok(mut guard) = sink.lock() {
            guard.flush().context("無法寫入進度記錄檔")?;
        }

        Ok(exit)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn shell(script: &str) -> FfmpegCommand {
        FfmpegCommand::from_parts(
            "sh".to_string(),
            vec!["-c".to_string(), script.to_string()],
        )
    }

    #[test]
    fn test_both_streams_reach_the_log() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("progress.log");
        let runner = ProcessRunner::new(Arc::new(AtomicBool::new(false)));

        let exit = runner
            .run(&shell("echo out; echo 'frame=  12 fps=3.0' 1>&2"), &log)
            .unwrap();

        assert_eq!(exit, EncoderExit::Success);
        let content = fs::read_to_string(&log).unwrap();
        assert!(content.contains("out\n"));
        assert!(content.contains("frame=  12 fps=3.0\n"));
    }

    #[test]
    fn test_non_zero_exit_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("progress.log");
        let runner = ProcessRunner::new(Arc::new(AtomicBool::new(false)));

        let exit = runner.run(&shell("exit 3"), &log).unwrap();
        assert_eq!(exit, EncoderExit::Failed { code: Some(3) });
    }

    #[test]
    fn test_shutdown_signal_kills_encoder() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("progress.log");
        let runner = ProcessRunner::new(Arc::new(AtomicBool::new(true)));

        let exit = runner.run(&shell("exec sleep 30"), &log).unwrap();
        assert_eq!(exit, EncoderExit::Interrupted);
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("progress.log");
        let runner = ProcessRunner::new(Arc::new(AtomicBool::new(false)));
        let command =
            FfmpegCommand::from_parts("definitely-not-an-encoder-binary".to_string(), Vec::new());

        assert!(runner.run(&command, &log).is_err());
    }
}
