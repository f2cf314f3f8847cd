//! Configuration Backup Manager
//!
//! Handles creation, restoration, and management of configuration backups.
//! Backups are stored as .tar.gz archives in a 'backups' directory next to the config file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tracing::{error, info};

use crate::config::profile::{Config, sibling_path};
use crate::constants::config::{FILENAME, RESTORE_SUFFIX, backup};

/// Represents a backup file
#[derive(Debug, Clone)]
pub struct BackupEntry {
    pub filename: String,
    pub path: PathBuf,
    pub timestamp: SystemTime,
    pub is_manual: bool,
}

pub struct BackupManager {
    config_path: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(config_path: &Path) -> Self {
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        Self {
            config_path: config_path.to_path_buf(),
            backup_dir: config_dir.join(backup::SUBDIR),
        }
    }

    /// Name the config file has on disk (and inside archives)
    fn config_filename(&self) -> String {
        self.config_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| FILENAME.to_string())
    }

    /// Create a new backup archive of the config file
    pub fn create_backup(&self, is_manual: bool) -> Result<PathBuf> {
        fs::create_dir_all(&self.backup_dir).context("Failed to create backup directory")?;

        // [auto|manual]_backup_YYYYMMDD_HHMMSS.tar.gz
        let timestamp_str = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let prefix = if is_manual {
            "manual_backup"
        } else {
            "auto_backup"
        };
        let mut backup_path = self
            .backup_dir
            .join(format!("{}_{}.tar.gz", prefix, timestamp_str));
        // Two backups within the same second get a counter suffix
        let mut counter = 1;
        while backup_path.exists() {
            backup_path = self
                .backup_dir
                .join(format!("{}_{}_{}.tar.gz", prefix, timestamp_str, counter));
            counter += 1;
        }

        let mut file = fs::File::open(&self.config_path).with_context(|| {
            format!(
                "Failed to open config file for backup: {:?}",
                self.config_path
            )
        })?;

        let tar_gz = fs::File::create(&backup_path).context("Failed to create backup file")?;
        let enc = GzEncoder::new(tar_gz, Compression::default());
        let mut tar = tar::Builder::new(enc);
        tar.append_file(self.config_filename(), &mut file)
            .context("Failed to add config file to archive")?;
        tar.into_inner()
            .context("Failed to finish backup archive")?
            .finish()
            .context("Failed to finish backup compression")?;

        info!(path = ?backup_path, "Created backup");
        Ok(backup_path)
    }

    /// List all available backups, sorted by date (newest first)
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("gz") {
                continue;
            }

            let timestamp = fs::metadata(&path)?
                .modified()
                .unwrap_or_else(|_| SystemTime::now());
            let filename = entry.file_name().to_string_lossy().to_string();
            let is_manual = filename.starts_with("manual");

            backups.push(BackupEntry {
                filename,
                path,
                timestamp,
                is_manual,
            });
        }

        // Newest first; the timestamped names break ties within the same mtime
        backups.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        Ok(backups)
    }

    /// Restore the config file from a specific backup
    ///
    /// The archived config is unpacked next to the live one and must load
    /// cleanly before it is renamed over it; otherwise the live file is untouched.
    pub fn restore_backup(&self, filename: &str) -> Result<()> {
        if filename.contains(['/', '\\']) {
            bail!("Invalid backup name: {}", filename);
        }
        let backup_path = self.backup_dir.join(filename);
        if !backup_path.exists() {
            bail!("Backup file not found: {}", filename);
        }

        let tar_gz = fs::File::open(&backup_path).context("Failed to open backup file")?;
        let mut archive = tar::Archive::new(GzDecoder::new(tar_gz));
        let config_name = self.config_filename();

        for entry in archive.entries().context("Failed to read backup archive")? {
            let mut entry = entry?;
            let entry_name = entry.path()?.to_string_lossy().into_owned();
            if entry_name == config_name {
                let staged = sibling_path(&self.config_path, RESTORE_SUFFIX);
                let result = entry
                    .unpack(&staged)
                    .context("Failed to unpack config from backup")
                    .and_then(|_| {
                        Config::load_from(&staged)
                            .with_context(|| format!("Backup {} holds an invalid config", filename))
                    })
                    .and_then(|_| {
                        fs::rename(&staged, &self.config_path)
                            .context("Failed to replace config with backup")
                    });
                if result.is_err() {
                    let _ = fs::remove_file(&staged);
                }
                result?;
                info!(backup = %filename, "Restored backup");
                return Ok(());
            }
        }

        bail!("Backup {} does not contain {}", filename, config_name)
    }

    /// Prune old backups based on retention count
    /// Only affects auto-backups (not manual ones)
    pub fn prune_backups(&self, retention_count: u32) -> Result<()> {
        let backups = self.list_backups()?;
        let auto_backups: Vec<&BackupEntry> = backups.iter().filter(|b| !b.is_manual).collect();

        if auto_backups.len() > retention_count as usize {
            for backup in &auto_backups[retention_count as usize..] {
                if let Err(e) = fs::remove_file(&backup.path) {
                    error!(path = ?backup.path, error = %e, "Failed to prune backup");
                } else {
                    info!(backup = %backup.filename, "Pruned old backup");
                }
            }
        }
        Ok(())
    }

    /// Check if an automatic backup should run
    pub fn should_run_auto_backup(&self, interval_days: u32) -> bool {
        if interval_days == 0 {
            return false;
        }

        let backups = match self.list_backups() {
            Ok(b) => b,
            Err(_) => return true,
        };

        match backups.iter().find(|b| !b.is_manual) {
            Some(backup) => match SystemTime::now().duration_since(backup.timestamp) {
                Ok(duration) => duration.as_secs() / 86400 >= interval_days as u64,
                Err(_) => true, // Clock moved backwards
            },
            None => true,
        }
    }
}
