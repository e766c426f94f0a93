use std::io::{self, Write};

/// 同時寫入兩個目的地（進度記錄檔與終端機）
///
/// 每次寫入都完整送進兩邊後才回傳，兩者收到的位元組完全相同
pub struct TeeWriter<L: Write, C: Write> {
    log: L,
    console: C,
}

impl<L: Write, C: Write> TeeWriter<L, C> {
    pub const fn new(log: L, console: C) -> Self {
        Self { log, console }
    }

    pub fn into_inner(self) -> (L, C) {
        (self.log, self.console)
    }
}

impl<L: Write, C: Write> Write for TeeWriter<L, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.log.write_all(buf)?;
        self.console.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.log.flush()?;
        self.console.flush()
    }
}
