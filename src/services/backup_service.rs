use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{ApiError, ApiResult};

pub const BACKUP_EXTENSION: &str = ".psql";

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BackupFile {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BackupCheck {
    pub name: String,
    pub valid: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PruneFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct PruneReport {
    pub kept: Vec<String>,
    pub deleted: Vec<String>,
    pub failed: Vec<PruneFailure>,
}

fn is_backup_name(name: &str) -> bool {
    name.len() > BACKUP_EXTENSION.len() && name.ends_with(BACKUP_EXTENSION)
}

/// Path of an existing backup name inside `dir`. Names carrying path
/// components are refused.
pub fn backup_path(dir: &Path, name: &str) -> ApiResult<PathBuf> {
    let bare = Path::new(name).file_name().and_then(|n| n.to_str());
    if bare != Some(name) || !is_backup_name(name) {
        return Err(ApiError::bad_request(format!("Invalid backup name '{}'.", name)));
    }
    Ok(dir.join(name))
}

/// Backups in `dir`, newest name first. A missing directory has none.
pub async fn list_backups(dir: &Path) -> ApiResult<Vec<BackupFile>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut backups = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else { continue };
        if !is_backup_name(&name) {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        backups.push(BackupFile {
            name,
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        });
    }

    backups.sort_by(|a, b| b.name.cmp(&a.name));
    Ok(backups)
}

pub async fn read_backup(dir: &Path, name: &str) -> ApiResult<Vec<u8>> {
    let path = backup_path(dir, name)?;
    match fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ApiError::not_found(format!("Backup '{}'", name))),
        Err(e) => Err(e.into()),
    }
}

/// Checks that a backup looks like a PostgreSQL plain-text dump: present,
/// non-empty, first line a SQL comment.
pub async fn validate_backup(dir: &Path, name: &str) -> ApiResult<BackupCheck> {
    let path = backup_path(dir, name)?;
    let metadata = match fs::metadata(&path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::not_found(format!("Backup '{}'", name)))
        }
        Err(e) => return Err(e.into()),
    };

    let check = |valid: bool, message: String| BackupCheck {
        name: name.to_string(),
        valid,
        message,
    };

    if metadata.len() == 0 {
        return Ok(check(false, format!("Backup file {} is empty.", name)));
    }

    let mut first_line = String::new();
    let mut reader = BufReader::new(fs::File::open(&path).await?);
    match reader.read_line(&mut first_line).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::InvalidData => first_line.clear(),
        Err(e) => return Err(e.into()),
    }

    if first_line.trim().starts_with("--") {
        Ok(check(true, format!("Backup file {} is ready to restore.", name)))
    } else {
        Ok(check(
            false,
            format!("Backup file {} does not appear to be a valid PostgreSQL dump.", name),
        ))
    }
}

/// Deletes all but the `keep` most recently modified backups. Failures are
/// reported per file and do not stop the run.
pub async fn prune_backups(dir: &Path, keep: usize) -> ApiResult<PruneReport> {
    let mut backups = list_backups(dir).await?;
    backups.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| b.name.cmp(&a.name)));

    let mut report = PruneReport::default();
    for (index, backup) in backups.into_iter().enumerate() {
        if index < keep {
            report.kept.push(backup.name);
            continue;
        }
        match fs::remove_file(dir.join(&backup.name)).await {
            Ok(()) => {
                log::info!("Deleted old backup: {}", backup.name);
                report.deleted.push(backup.name);
            }
            Err(e) => {
                log::error!("Failed to delete {}: {}", backup.name, e);
                report.failed.push(PruneFailure {
                    name: backup.name,
                    error: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Writes `bytes` to a freshly created file. On failure the partial file is
/// removed so it can never be listed as a backup.
async fn write_or_discard<W>(mut file: W, path: &Path, bytes: &[u8]) -> ApiResult<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = fs::remove_file(path).await {
            log::warn!("Failed to remove partial upload {}: {}", path.display(), cleanup);
        }
        return Err(e.into());
    }
    Ok(())
}

/// Saves an uploaded backup under its bare file name. An existing file is
/// never overwritten; `_1`, `_2`, ... are appended to the stem instead.
/// Returns the name the file was stored under.
pub async fn store_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> ApiResult<String> {
    let bare = Path::new(file_name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    if !is_backup_name(&bare) {
        return Err(ApiError::invalid("backup_file", "Only .psql files are allowed."));
    }

    fs::create_dir_all(dir).await?;

    let stem = &bare[..bare.len() - BACKUP_EXTENSION.len()];
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            bare.clone()
        } else {
            format!("{}_{}{}", stem, attempt, BACKUP_EXTENSION)
        };

        let path = dir.join(&name);
        let opened = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        match opened {
            Ok(file) => {
                write_or_discard(file, &path, bytes).await?;
                log::info!("Stored uploaded backup {} ({} bytes)", name, bytes.len());
                return Ok(name);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
