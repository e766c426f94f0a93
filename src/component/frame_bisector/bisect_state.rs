//! 二分搜尋狀態與指令解析

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BisectRange {
    left: usize,
    right: usize,
    current: usize,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BisectError {
    #[error("無法再繼續二分")]
    CannotBisectFurther,
    #[error("回復次數必須為正數")]
    NonPositiveUndo,
    #[error("無法回復 {requested} 步，歷史中只有 {available} 步")]
    NotEnoughHistory { requested: usize, available: usize },
}

/// 在排序好的影格中二分搜尋，支援回復先前的步驟
#[derive(Debug, Clone)]
pub struct BisectSession {
    len: usize,
    range: BisectRange,
    history: Vec<BisectRange>,
}

impl BisectSession {
    /// `len` 必須大於 0
    #[must_use]
    pub fn new(len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let right = len - 1;
        Some(Self {
            len,
            range: BisectRange {
                left: 0,
                right,
                current: right / 2,
            },
            history: Vec::new(),
        })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn current(&self) -> usize {
        self.range.current
    }

    #[must_use]
    pub const fn bounds(&self) -> (usize, usize) {
        (self.range.left, self.range.right)
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// 往較晚的一半搜尋
    pub fn later(&mut self) -> Result<(), BisectError> {
        let range = self.range;
        if range.left >= range.right {
            return Err(BisectError::CannotBisectFurther);
        }
        self.history.push(range);

        let left = range.current + 1;
        self.range = BisectRange {
            left,
            right: range.right,
            current: (left + range.right) / 2,
        };
        Ok(())
    }

    /// 往較早的一半搜尋；目前位置已在最左端時範圍收斂到該點
    pub fn earlier(&mut self) -> Result<(), BisectError> {
        let range = self.range;
        if range.left >= range.right {
            return Err(BisectError::CannotBisectFurther);
        }
        self.history.push(range);

        let right = range.current.saturating_sub(1).max(range.left);
        self.range = BisectRange {
            left: range.left,
            right,
            current: (range.left + right) / 2,
        };
        Ok(())
    }

    /// 回復最近 `count` 步
    pub fn undo(&mut self, count: usize) -> Result<(), BisectError> {
        if count == 0 {
            return Err(BisectError::NonPositiveUndo);
        }
        if count > self.history.len() {
            return Err(BisectError::NotEnoughHistory {
                requested: count,
                available: self.history.len(),
            });
        }

        let keep = self.history.len() - count;
        self.range = self.history[keep];
        self.history.truncate(keep);
        Ok(())
    }
}

/// 互動指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BisectCommand {
    Later,
    Earlier,
    Undo(usize),
    Quit,
}

impl BisectCommand {
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim().to_lowercase();
        let mut parts = input.split_whitespace();

        match (parts.next(), parts.next()) {
            (Some("q"), None) => Ok(Self::Quit),
            (Some("n"), None) => Ok(Self::Later),
            (Some("p"), None) => Ok(Self::Earlier),
            (Some("r"), None) => Ok(Self::Undo(1)),
            (Some("r"), Some(count)) => count
                .parse::<usize>()
                .map(Self::Undo)
                .map_err(|_| "無效的回復次數，請使用 `r` 或 `r <次數>`".to_string()),
            _ => Err(
                "未知的指令。n=往後（較晚），p=往前（較早），r [次數]=回復，q=離開".to_string(),
            ),
        }
    }
}
