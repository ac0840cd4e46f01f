use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use super::backup::{create_backup, restore_backup};
use super::resolve::PathResolver;
use super::{MatchPolicy, PatchError};
use crate::config::PatchConfig;
use crate::domain::{LineRange, PatchRecord};

/// Outcome of a successful apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// File that was rewritten.
    pub path: PathBuf,
    /// Backup taken before the write, if backups were enabled and succeeded.
    pub backup: Option<PathBuf>,
    /// 1-based inclusive range that was actually replaced.
    pub applied_range: LineRange,
    /// True when the declared range was stale and the old text was found elsewhere.
    pub relocated: bool,
}

/// Where the old text was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Located {
    Declared,
    Relocated(usize, usize),
    NotFound,
}

#[derive(Debug, Clone)]
pub struct PatchApplier {
    resolver: PathResolver,
    create_backups: bool,
    backup_dir_name: String,
    match_policy: MatchPolicy,
}

impl PatchApplier {
    pub fn new(config: PatchConfig) -> Self {
        Self {
            resolver: PathResolver::new(config.base_dirs),
            create_backups: config.create_backups,
            backup_dir_name: config.backup_dir_name,
            match_policy: config.match_policy,
        }
    }

    pub fn match_policy(&self) -> MatchPolicy {
        self.match_policy
    }

    pub fn resolve_path(&self, file_path: &str) -> PathBuf {
        self.resolver.resolve(file_path)
    }

    pub fn create_backup(&self, target: &Path) -> io::Result<PathBuf> {
        create_backup(target, &self.backup_dir_name)
    }

    /// Apply `patch` to the file it names.
    ///
    /// Every failure after the backup is taken restores the file from that
    /// backup before returning.
    pub fn apply(&self, patch: &PatchRecord) -> Result<ApplyReport, PatchError> {
        let target = self.resolve_path(patch.file_path());
        if !target.is_file() {
            error!("File not found: {}", target.display());
            return Err(PatchError::FileNotFound { path: target });
        }

        let backup = if self.create_backups {
            match self.create_backup(&target) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Failed to create backup for {}: {}", target.display(), e);
                    None
                }
            }
        } else {
            None
        };

        match self.rewrite(&target, patch) {
            Ok((start, end, relocated)) => {
                info!("Applied patch {} to {}", patch, target.display());
                Ok(ApplyReport {
                    applied_range: LineRange::new(start + 1, end).unwrap_or(patch.line_range()),
                    path: target,
                    backup,
                    relocated,
                })
            }
            Err(e) => {
                error!("Failed to apply patch {}: {}", patch, e);
                rollback(backup.as_deref(), &target);
                Err(e)
            }
        }
    }

    /// Read, splice, write and verify. Returns the zero-based slice replaced.
    ///
    /// A file with CRLF line endings is spliced as LF and written back as CRLF.
    fn rewrite(&self, target: &Path, patch: &PatchRecord) -> Result<(usize, usize, bool), PatchError> {
        let raw = fs::read_to_string(target)?;
        let crlf = raw.contains("\r\n");
        let content = if crlf { raw.replace("\r\n", "\n") } else { raw };
        let new_text = patch.new_text().replace("\r\n", "\n");
        let mut lines: Vec<&str> = content.split('\n').collect();

        let (start, end) = patch.line_range().to_slice();
        check_bounds(start, end, lines.len())?;

        let (start, end, relocated) = match locate(&content, &lines, patch, start, end) {
            Located::Declared => (start, end, false),
            Located::Relocated(s, e) => {
                info!(
                    "Old text for {} found at lines {}-{} instead of {}",
                    patch.file_path(),
                    s + 1,
                    e,
                    patch.line_range()
                );
                (s, e, true)
            }
            Located::NotFound => match self.match_policy {
                MatchPolicy::Permissive => {
                    warn!(
                        "Old text not found in {}; replacing declared lines {}",
                        target.display(),
                        patch.line_range()
                    );
                    (start, end, false)
                }
                MatchPolicy::Strict => {
                    return Err(PatchError::NoMatchFound {
                        path: target.to_path_buf(),
                    });
                }
            },
        };
        check_bounds(start, end, lines.len())?;

        lines.splice(start..end, new_text.split('\n'));
        let mut updated = lines.join("\n");
        if crlf {
            updated = updated.replace('\n', "\r\n");
        }
        atomic_write(target, &updated)?;

        if !verify(target, &new_text)? {
            warn!("New text not present in {} after write", target.display());
            return Err(PatchError::VerificationFailed {
                path: target.to_path_buf(),
            });
        }
        Ok((start, end, relocated))
    }
}

impl Default for PatchApplier {
    fn default() -> Self {
        Self::new(PatchConfig::default())
    }
}

/// Write `content` to a sibling temp file, then rename it over `target`.
pub fn atomic_write(target: &Path, content: &str) -> io::Result<()> {
    let name = target
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "write target has no file name"))?;
    let tmp = target.with_file_name(format!(".{}.repair.tmp", name.to_string_lossy()));

    fs::write(&tmp, content)?;
    let replaced = match fs::metadata(target) {
        Ok(meta) => fs::set_permissions(&tmp, meta.permissions()),
        Err(_) => Ok(()),
    }
    .and_then(|()| fs::rename(&tmp, target));
    if let Err(e) = replaced {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    debug!("Wrote {} bytes to {}", content.len(), target.display());
    Ok(())
}

/// True when `new_text`, exactly or trimmed, appears in the file. Line
/// endings are compared as LF on both sides.
pub fn verify(target: &Path, new_text: &str) -> io::Result<bool> {
    let content = fs::read_to_string(target)?.replace("\r\n", "\n");
    let new_text = new_text.replace("\r\n", "\n");
    Ok(content.contains(new_text.as_str()) || content.contains(new_text.trim()))
}

fn check_bounds(start: usize, end: usize, line_count: usize) -> Result<(), PatchError> {
    if start < end && end <= line_count {
        Ok(())
    } else {
        Err(PatchError::InvalidRange {
            start: start + 1,
            end,
            line_count,
        })
    }
}

fn rollback(backup: Option<&Path>, target: &Path) {
    let Some(backup) = backup.filter(|b| b.exists()) else {
        return;
    };
    if let Err(e) = restore_backup(backup, target) {
        error!("Rollback of {} failed: {}", target.display(), e);
    }
}

fn locate(content: &str, lines: &[&str], patch: &PatchRecord, start: usize, end: usize) -> Located {
    let old = patch.old_text();
    let declared = lines[start..end].join("\n");

    if old.contains('\n') {
        if declared == old || declared.trim() == old.trim() {
            return Located::Declared;
        }
        let span = old.trim_end_matches('\n').split('\n').count();
        if let Some(offset) = content.find(old) {
            let first = content[..offset].matches('\n').count();
            return Located::Relocated(first, first + span);
        }
        let first_line = old.split('\n').next().unwrap_or_default();
        if first_line.trim().is_empty() {
            return Located::NotFound;
        }
        return match lines.iter().position(|line| line.contains(first_line)) {
            Some(i) => Located::Relocated(i, i + span),
            None => Located::NotFound,
        };
    }

    let needle = old.trim();
    if declared.trim() == needle {
        return Located::Declared;
    }
    if needle.is_empty() {
        return Located::NotFound;
    }
    match lines.iter().position(|line| line.contains(needle)) {
        Some(i) => Located::Relocated(i, i + 1),
        None => Located::NotFound,
    }
}
