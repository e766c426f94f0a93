use super::bisect_state::{BisectCommand, BisectError, BisectSession};
use crate::tools::{CameraFrame, SortKey, scan_camera_frames, sort_frames, validate_directory_exists};
use anyhow::{Result, bail};
use console::style;
use dialoguer::Input;
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 一次指令處理的結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BisectStep {
    Moved,
    Undone(usize),
    Quit,
}

/// 互動式二分搜尋影格，用來找出某個變化最早出現的時間點
pub struct FrameBisector {
    frames: Vec<CameraFrame>,
    session: BisectSession,
    shutdown_signal: Arc<AtomicBool>,
}

impl FrameBisector {
    /// 影格依拍攝時間（再依序號）排序；沒有任何影格時回傳錯誤
    pub fn new(mut frames: Vec<CameraFrame>, shutdown_signal: Arc<AtomicBool>) -> Result<Self> {
        sort_frames(&mut frames, SortKey::Timestamp);
        let Some(session) = BisectSession::new(frames.len()) else {
            bail!("沒有符合相機命名格式的影格");
        };

        Ok(Self {
            frames,
            session,
            shutdown_signal,
        })
    }

    pub fn from_directory(directory: &Path, shutdown_signal: Arc<AtomicBool>) -> Result<Self> {
        validate_directory_exists(directory)?;
        Self::new(scan_camera_frames(directory)?, shutdown_signal)
    }

    #[must_use]
    pub fn current_frame(&self) -> &CameraFrame {
        &self.frames[self.session.current()]
    }

    #[must_use]
    pub const fn session(&self) -> &BisectSession {
        &self.session
    }

    pub fn apply(&mut self, command: BisectCommand) -> Result<BisectStep, BisectError> {
        match command {
            BisectCommand::Later => self.session.later().map(|()| BisectStep::Moved),
            BisectCommand::Earlier => self.session.earlier().map(|()| BisectStep::Moved),
            BisectCommand::Undo(count) => self.session.undo(count).map(|()| BisectStep::Undone(count)),
            BisectCommand::Quit => Ok(BisectStep::Quit),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", style("=== 影格二分搜尋 ===").cyan().bold());
        println!("已載入 {} 張影格", self.frames.len());
        println!(
            "{}",
            style("指令: n=往後（較晚），p=往前（較早），r [次數]=回復，q=離開").dim()
        );
        self.show_current();

        while !self.shutdown_signal.load(Ordering::SeqCst) {
            let input: String = Input::new()
                .with_prompt(">")
                .allow_empty(true)
                .interact_text()?;

            let command = match BisectCommand::parse(&input) {
                Ok(command) => command,
                Err(message) => {
                    eprintln!("{}", style(message).yellow());
                    continue;
                }
            };

            match self.apply(command) {
                Ok(BisectStep::Quit) => break,
                Ok(BisectStep::Moved) => self.show_current(),
                Ok(BisectStep::Undone(count)) => {
                    println!("已回復 {count} 步");
                    self.show_current();
                }
                Err(e) => eprintln!("{}", style(e).yellow()),
            }
        }

        let frame = self.current_frame();
        info!("二分搜尋結束於 {}", frame.path.display());
        Ok(())
    }

    fn show_current(&self) {
        let (left, right) = self.session.bounds();
        let index = self.session.current();
        let frame = self.current_frame();

        if let Err(e) = open::that(&frame.path) {
            warn!("無法開啟 {}: {e}", frame.path.display());
        }

        println!("範圍: [{left}, {right}]，目前: {index}");
        println!(
            "{}",
            style(format!(
                "[{}/{}] {}",
                index + 1,
                self.frames.len(),
                frame.path.display()
            ))
            .green()
        );
    }
}
