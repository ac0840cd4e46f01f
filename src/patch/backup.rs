//! Timestamped backups next to the file being patched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;

/// Default directory (relative to the patched file) that holds backups.
pub const BACKUP_DIR_NAME: &str = ".repair_backups";

/// Copy `target` to `<dir>/<backup_dir_name>/backup_<timestamp>_<name>`.
pub fn create_backup(target: &Path, backup_dir_name: &str) -> io::Result<PathBuf> {
    let name = target
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "backup target has no file name"))?;
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent.join(backup_dir_name);
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
    let backup_path = backup_dir.join(format!("backup_{}_{}", timestamp, name.to_string_lossy()));
    fs::copy(target, &backup_path)?;
    log::info!("Created backup: {}", backup_path.display());
    Ok(backup_path)
}

/// Copy a backup back over `target`.
pub fn restore_backup(backup: &Path, target: &Path) -> io::Result<()> {
    fs::copy(backup, target)?;
    log::info!("Restored {} from backup", target.display());
    Ok(())
}
