//! 以輸出路徑為範圍的單一執行鎖
//!
//! 鎖檔為 `<輸出檔名>.lock`，內容記錄持有者的 pid。鎖檔先完整寫在暫存檔，
//! 再以 hard link 原子地放到鎖檔位置，因此可見的鎖檔一定有完整內容。
//! 持有者行程已不存在時視為殘留鎖，以 rename 移走後回收。

use super::error::AssemblyError;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use sysinfo::{Pid, ProcessesToUpdate, System};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub run_id: Uuid,
    pub pid: u32,
    pub output: PathBuf,
    pub started_at: DateTime<Local>,
}

#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    run_id: Uuid,
}

impl RunLock {
    #[must_use]
    pub fn lock_path_for(output: &Path) -> PathBuf {
        let file_name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        output.with_file_name(format!("{file_name}.lock"))
    }

    pub fn acquire(output: &Path) -> Result<Self> {
        let path = Self::lock_path_for(output);
        let record = LockRecord {
            run_id: Uuid::new_v4(),
            pid: std::process::id(),
            output: output.to_path_buf(),
            started_at: Local::now(),
        };

        // 第二次嘗試只會發生在回收殘留鎖之後
        for _ in 0..2 {
            match Self::publish(&path, &record) {
                Ok(()) => {
                    debug!("取得執行鎖 {} ({})", path.display(), record.run_id);
                    return Ok(Self {
                        path,
                        run_id: record.run_id,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let holder = Self::read_record(&path);
                    if let Some(holder) = holder.as_ref().filter(|h| is_process_alive(h.pid)) {
                        return Err(AssemblyError::OutputLocked {
                            lock_path: path,
                            pid: holder.pid,
                        }
                        .into());
                    }
                    warn!(
                        "回收殘留的執行鎖 {}（原持有者 pid {}）",
                        path.display(),
                        holder
                            .as_ref()
                            .map_or_else(|| "未知".to_string(), |h| h.pid.to_string())
                    );
                    Self::reclaim_stale(&path, holder.as_ref(), record.run_id)?;
                }
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("無法建立鎖檔: {}", path.display()));
                }
            }
        }

        Err(AssemblyError::OutputLocked {
            lock_path: path,
            pid: 0,
        }
        .into())
    }

    /// 寫入暫存檔後 hard link 到鎖檔位置；鎖檔已存在時回傳 `AlreadyExists`
    fn publish(path: &Path, record: &LockRecord) -> std::io::Result<()> {
        let staging = Self::sibling(path, &format!("{}.tmp", record.run_id));
        let content = serde_json::to_string_pretty(record).map_err(std::io::Error::other)?;
        fs::write(&staging, content)?;
        let linked = fs::hard_link(&staging, path);
        if let Err(e) = fs::remove_file(&staging) {
            debug!("無法移除暫存鎖檔 {}: {e}", staging.display());
        }
        linked
    }

    /// 以 rename 原子地移走殘留鎖，移走的必須正是剛才判定為殘留的那一份。
    /// 若不是，表示另一個執行已搶先回收並取得新鎖，將它歸還後回報鎖定中。
    fn reclaim_stale(path: &Path, stale: Option<&LockRecord>, run_id: Uuid) -> Result<()> {
        let tombstone = Self::sibling(path, &format!("{run_id}.stale"));
        match fs::rename(path, &tombstone) {
            Ok(()) => {}
            // 已被其他執行回收
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("無法移除殘留的鎖檔: {}", path.display()));
            }
        }

        let moved = Self::read_record(&tombstone);
        let same_lock = match (stale, moved.as_ref()) {
            (Some(stale), Some(moved)) => stale.run_id == moved.run_id,
            (None, None) => true,
            _ => false,
        };

        if !same_lock {
            let restored = fs::hard_link(&tombstone, path);
            if let Err(e) = fs::remove_file(&tombstone) {
                debug!("無法移除 {}: {e}", tombstone.display());
            }
            if let Err(e) = restored {
                warn!("無法歸還執行鎖 {}: {e}", path.display());
            }
            return Err(AssemblyError::OutputLocked {
                lock_path: path.to_path_buf(),
                pid: moved.map_or(0, |record| record.pid),
            }
            .into());
        }

        fs::remove_file(&tombstone)
            .with_context(|| format!("無法移除殘留的鎖檔: {}", tombstone.display()))
    }

    fn sibling(path: &Path, suffix: &str) -> PathBuf {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!("{file_name}.{suffix}"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_record(path: &Path) -> Option<LockRecord> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // 只移除自己持有的鎖
        let still_ours = Self::read_record(&self.path).is_some_and(|r| r.run_id == self.run_id);
        if still_ours && let Err(e) = fs::remove_file(&self.path) {
            warn!("無法移除執行鎖 {}: {e}", self.path.display());
        }
    }
}

fn is_process_alive(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_sits_next_to_output() {
        assert_eq!(
            RunLock::lock_path_for(Path::new("/work/preview.mp4")),
            PathBuf::from("/work/preview.mp4.lock")
        );
    }

    #[test]
    fn test_second_run_on_same_output_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("timelapse.mp4");

        let lock = RunLock::acquire(&output).unwrap();
        assert!(lock.path().exists());

        let err = RunLock::acquire(&output).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AssemblyError>(),
            Some(AssemblyError::OutputLocked { .. })
        ));

        drop(lock);
        assert!(!RunLock::lock_path_for(&output).exists());
        assert!(RunLock::acquire(&output).is_ok());
    }

    #[test]
    fn test_different_outputs_do_not_conflict() {
        let temp_dir = TempDir::new().unwrap();
        let _full = RunLock::acquire(&temp_dir.path().join("timelapse.mp4")).unwrap();
        let _preview = RunLock::acquire(&temp_dir.path().join("preview.mp4")).unwrap();
    }

    #[test]
    fn test_stale_lock_is_reclaimed() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("timelapse.mp4");
        let stale = LockRecord {
            run_id: Uuid::new_v4(),
            pid: u32::MAX,
            output: output.clone(),
            started_at: Local::now(),
        };
        fs::write(
            RunLock::lock_path_for(&output),
            serde_json::to_string(&stale).unwrap(),
        )
        .unwrap();

        assert!(RunLock::acquire(&output).is_ok());
    }

    #[test]
    fn test_unreadable_lock_is_reclaimed() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("timelapse.mp4");
        fs::write(RunLock::lock_path_for(&output), "garbage").unwrap();

        assert!(RunLock::acquire(&output).is_ok());
    }

    #[test]
    fn test_lock_file_is_complete_and_staging_is_cleaned() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("timelapse.mp4");

        let lock = RunLock::acquire(&output).unwrap();
        let record = RunLock::read_record(lock.path()).unwrap();
        assert_eq!(record.pid, std::process::id());
        assert_eq!(record.output, output);

        let names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["timelapse.mp4.lock".to_string()]);
    }

    #[test]
    fn test_reclaim_gives_back_a_lock_taken_in_between() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("timelapse.mp4");
        let lock_path = RunLock::lock_path_for(&output);

        // 判定為殘留的是舊紀錄，但鎖檔已被另一個執行換成新紀錄
        let stale = LockRecord {
            run_id: Uuid::new_v4(),
            pid: u32::MAX,
            output: output.clone(),
            started_at: Local::now(),
        };
        let fresh = LockRecord {
            run_id: Uuid::new_v4(),
            pid: std::process::id(),
            ..stale.clone()
        };
        fs::write(&lock_path, serde_json::to_string(&fresh).unwrap()).unwrap();

        let err = RunLock::reclaim_stale(&lock_path, Some(&stale), Uuid::new_v4()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AssemblyError>(),
            Some(AssemblyError::OutputLocked { .. })
        ));
        assert_eq!(RunLock::read_record(&lock_path), Some(fresh));
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_reclaim_removes_the_stale_lock() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("timelapse.mp4");
        let lock_path = RunLock::lock_path_for(&output);
        let stale = LockRecord {
            run_id: Uuid::new_v4(),
            pid: u32::MAX,
            output,
            started_at: Local::now(),
        };
        fs::write(&lock_path, serde_json::to_string(&stale).unwrap()).unwrap();

        RunLock::reclaim_stale(&lock_path, Some(&stale), Uuid::new_v4()).unwrap();
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
