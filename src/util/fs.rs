use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use tempfile::NamedTempFile;

use crate::error::{Result, SyncError};

pub const LEASE_TIMEOUT: Duration = Duration::from_secs(10);
const LEASE_POLL: Duration = Duration::from_millis(50);

/// Write `data` to `path` through a tempfile in the same directory, so a
/// reader never sees a half-written file.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    // Tempfiles are created 0600; keep whatever mode the target already had.
    if let Ok(meta) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append `line` plus a newline, creating the file and its parents.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

/// Exclusive hold on a file, represented by a `<file>.lock` sibling that
/// exists for as long as the lease is alive.
///
/// A lock left behind by a process that died, or one older than
/// [`LEASE_TIMEOUT`], is treated as stale and taken over. Acquiring blocks
/// the calling thread while it polls.
#[derive(Debug)]
pub struct FileLease {
    lock_path: PathBuf,
}

impl FileLease {
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let lock_path = lock_path_for(path);
        let started = Instant::now();
        loop {
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(mut f) => {
                    let _ = writeln!(f, "{}", std::process::id());
                    return Ok(Self { lock_path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if is_stale(&lock_path) && std::fs::remove_file(&lock_path).is_ok() {
                        tracing::warn!("Removed stale lock {}", lock_path.display());
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(SyncError::LockTimeout(path.to_path_buf()));
                    }
                    std::thread::sleep(LEASE_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for FileLease {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.lock_path);
    }
}

fn is_stale(lock_path: &Path) -> bool {
    let holder = std::fs::read_to_string(lock_path)
        .ok()
        .and_then(|s| s.trim().parse::<libc::pid_t>().ok())
        .filter(|pid| *pid > 0);
    if let Some(pid) = holder {
        if !is_process_alive(pid) {
            return true;
        }
    }
    // No readable pid yet may just mean the holder is still writing it.
    std::fs::metadata(lock_path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age >= LEASE_TIMEOUT)
}

fn is_process_alive(pid: libc::pid_t) -> bool {
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}
