//! Point-in-time archives of the whole data directory.
use std::{
    fmt,
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::{
    decode_group, write_atomically, GroupInfo, PimError, RestoreArchiveSummary, Result,
};

const ARCHIVE_PREFIX: &str = "archive_";
const ARCHIVE_STAMP: &str = "%Y%m%d_%H%M%S";

/// Names an archive by the moment it was taken, to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveId(DateTime<Utc>);

impl ArchiveId {
    pub fn now() -> Self {
        Self::from_timestamp(Utc::now())
    }

    /// Sub-second precision is dropped so the id survives its file name.
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        let seconds = timestamp.timestamp();
        let truncated = Utc.timestamp_opt(seconds, 0).single().unwrap_or(timestamp);
        ArchiveId(truncated)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}{}.zip", ARCHIVE_PREFIX, self.0.format(ARCHIVE_STAMP))
    }

    /// Parses a name produced by [`ArchiveId::file_name`].
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stamp = file_name
            .strip_prefix(ARCHIVE_PREFIX)?
            .strip_suffix(".zip")?;
        let naive = NaiveDateTime::parse_from_str(stamp, ARCHIVE_STAMP).ok()?;
        Some(ArchiveId(naive.and_utc()))
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

/// Creates, lists, restores and prunes archives.
#[derive(Debug, Clone)]
pub struct ArchiveManager {
    data_dir: PathBuf,
    archive_dir: PathBuf,
    /// 0 keeps every archive
    max_archives: u32,
}

impl ArchiveManager {
    pub fn new(data_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>, max_archives: u32) -> Self {
        Self {
            data_dir: data_dir.into(),
            archive_dir: archive_dir.into(),
            max_archives,
        }
    }

    pub fn path_of(&self, id: ArchiveId) -> PathBuf {
        self.archive_dir.join(id.file_name())
    }

    /// Zips every JSON document of the data directory into a new archive.
    pub fn create(&self) -> Result<ArchiveId> {
        if !self.archive_dir.exists() {
            fs::create_dir_all(&self.archive_dir).map_err(|e| PimError::ArchiveFailed {
                message: e.to_string(),
            })?;
        }

        let id = ArchiveId::now();
        let archive_path = self.path_of(id);
        if archive_path.exists() {
            return Err(PimError::ArchiveFailed {
                message: format!("an archive named {} already exists", id.file_name()),
            });
        }

        let temp_file = NamedTempFile::new_in(&self.archive_dir)?;
        let mut zip = ZipWriter::new(temp_file);

        let mut file_count = 0;
        for path in self.data_files() {
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            trace!("Adding {} to archive", name);
            let content = fs::read(&path).map_err(|e| {
                error!("Failed to read {} for archiving: {}", path.display(), e);
                PimError::Io(e)
            })?;

            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .unix_permissions(0o644);
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&content).map_err(|e| PimError::ArchiveFailed {
                message: format!("Failed to write {} to archive: {}", name, e),
            })?;
            file_count += 1;
        }

        let temp_file = zip.finish()?;
        temp_file.persist(&archive_path).map_err(|e| {
            error!(
                "Failed to persist archive {}: {}",
                archive_path.display(),
                e.error
            );
            PimError::Io(e.error)
        })?;

        self.prune()?;

        info!(
            "Archive created with {} files at {}",
            file_count,
            archive_path.display()
        );
        Ok(id)
    }

    /// Every archive in the archive directory, newest first.
    pub fn list(&self) -> Result<Vec<ArchiveId>> {
        if !self.archive_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<ArchiveId> = WalkDir::new(&self.archive_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| ArchiveId::from_file_name(&entry.file_name().to_string_lossy()))
            .collect();

        ids.sort_by(|a, b| b.cmp(a));
        Ok(ids)
    }

    /// Removes the oldest archives beyond `max_archives`. Returns how many went.
    pub fn prune(&self) -> Result<usize> {
        if self.max_archives == 0 {
            return Ok(0);
        }

        let mut removed = 0;
        for id in self.list()?.into_iter().skip(self.max_archives as usize) {
            let path = self.path_of(id);
            match fs::remove_file(&path) {
                Ok(_) => {
                    debug!("Removed old archive: {}", path.display());
                    removed += 1;
                }
                Err(e) => {
                    warn!("Failed to remove old archive {}: {}", path.display(), e);
                }
            }
        }

        if removed > 0 {
            debug!("Pruned {} old archives", removed);
        }
        Ok(removed)
    }

    /// Copies the files of an archive back into the data directory.
    ///
    /// Group files are decoded first and skipped when unreadable, so a damaged
    /// archive entry never replaces a good file.
    pub fn restore(&self, id: ArchiveId, overwrite_existing: bool) -> Result<RestoreArchiveSummary> {
        let archive_path = self.path_of(id);
        if !archive_path.is_file() {
            return Err(PimError::ArchiveFailed {
                message: format!("Archive not found: {}", archive_path.display()),
            });
        }

        let file = File::open(&archive_path).map_err(|e| PimError::ArchiveFailed {
            message: format!("Failed to open archive: {}", e),
        })?;
        let mut archive = ZipArchive::new(file)?;

        if !self.data_dir.exists() {
            fs::create_dir_all(&self.data_dir).map_err(|_| PimError::DirectoryError {
                path: self.data_dir.clone(),
            })?;
        }

        let mut summary = RestoreArchiveSummary {
            archive_file: archive_path.clone(),
            total_files: 0,
            files_restored: 0,
            files_skipped: 0,
            failed_files: Vec::new(),
        };

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            if !entry.is_file() {
                continue;
            }
            let Some(name) = entry
                .enclosed_name()
                .and_then(|path| path.file_name().map(|n| n.to_string_lossy().to_string()))
            else {
                warn!("Skipping archive entry with unsafe name: {}", entry.name());
                continue;
            };
            if !name.ends_with(".json") {
                continue;
            }
            summary.total_files += 1;

            let target = self.data_dir.join(&name);
            if !overwrite_existing && target.exists() {
                summary.files_skipped += 1;
                continue;
            }

            let mut content = String::new();
            if let Err(e) = entry.read_to_string(&mut content) {
                warn!("Failed to read {} from archive: {}", name, e);
                summary.failed_files.push((name, e.to_string()));
                continue;
            }

            match self.restore_file(&name, &content, &target) {
                Ok(()) => summary.files_restored += 1,
                Err(e) => {
                    warn!("Failed to restore {}: {}", name, e);
                    summary.failed_files.push((name, e.to_string()));
                }
            }
        }

        info!(
            "Archive restoration complete: restored {}, skipped {}, failed {} files from {}",
            summary.files_restored,
            summary.files_skipped,
            summary.failed_files.len(),
            archive_path.display()
        );
        Ok(summary)
    }

    fn restore_file(&self, name: &str, content: &str, target: &Path) -> Result<()> {
        let stem = name.trim_end_matches(".json");
        if let Some(info) = GroupInfo::from_storage_name(stem) {
            let group = decode_group(content)?;
            if group.info() != info {
                return Err(PimError::InvalidFormat {
                    message: format!("{} holds {}, expected {}", name, group.info(), info),
                });
            }
        }

        write_atomically(target, content.as_bytes())
    }

    fn data_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.data_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.into_path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
            .collect()
    }
}
