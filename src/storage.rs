use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{Group, GroupInfo, GroupProperties, GroupSettings, GroupType, Note, PimError, Result, Stamp};

/// Timestamp policy while a group is being read back from storage.
const BULK_LOAD: Stamp = Stamp::Preserve;

/// The seam between the core and whatever keeps groups between runs.
///
/// A group is always read and written as a whole: properties and notes
/// together, never one without the other.
pub trait GroupStore {
    /// Loads a group, or fails with [`PimError::GroupNotFound`].
    fn load_group(&self, info: &GroupInfo) -> Result<Group>;

    /// Persists a group. On failure the previously stored version is intact.
    fn save_group(&self, group: &Group) -> Result<()>;

    /// Display names of every stored group of one type, sorted.
    fn list_group_names(&self, group_type: GroupType) -> Result<Vec<String>>;

    fn delete_group(&self, info: &GroupInfo) -> Result<()>;

    fn exists(&self, info: &GroupInfo) -> Result<bool>;

    /// Where the group lives, for stores that have such a notion.
    fn location(&self, _info: &GroupInfo) -> Option<PathBuf> {
        None
    }

    /// Every stored group of every type.
    fn list_all(&self) -> Result<Vec<GroupInfo>> {
        let mut all = Vec::new();
        for group_type in GroupType::ALL {
            all.extend(
                self.list_group_names(group_type)?
                    .into_iter()
                    .map(|name| GroupInfo::new(name, group_type)),
            );
        }
        Ok(all)
    }

    /// Renames a group: saved under the new name first, then the old entry is
    /// deleted. A goal's log follows its goal.
    fn rename_group(&self, info: &GroupInfo, new_name: &str) -> Result<Group> {
        validate_group_name(new_name)?;
        let target = GroupInfo::new(new_name, info.group_type);
        if self.exists(&target)? {
            return Err(PimError::GroupAlreadyExists {
                name: target.to_string(),
            });
        }

        let mut group = self.load_group(info)?;
        group.properties.set_name(new_name, Stamp::Touch);

        let mut old_log = None;
        if let GroupSettings::Goal(goal) = &mut group.properties.settings {
            if let Some(log) = goal.log_properties.as_mut() {
                old_log = Some(log.info());
                log.name = new_name.to_string();
            }
        }

        // the log's new name must be free too, before anything is written
        if old_log.is_some() {
            let target_log = GroupInfo::new(new_name, GroupType::Log);
            if self.exists(&target_log)? {
                return Err(PimError::GroupAlreadyExists {
                    name: target_log.to_string(),
                });
            }
        }

        self.save_group(&group)?;
        self.delete_group(info)?;

        if let Some(old_log) = old_log {
            if self.exists(&old_log)? {
                debug!("Renaming log {} along with its goal", old_log);
                self.rename_group(&old_log, new_name)?;
            }
        }

        info!("Renamed group {} to {}", info, target);
        Ok(group)
    }
}

/// Rejects names that cannot be used as part of a file name.
pub fn validate_group_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('.')
        || name.contains(['/', '\\', '\0'])
    {
        return Err(PimError::InvalidFormat {
            message: format!("'{}' is not a valid group name", name),
        });
    }
    Ok(())
}

/// On-disk shape of a group file, as read.
#[derive(Deserialize)]
struct StoredGroup {
    properties: GroupProperties,
    #[serde(default)]
    notes: Vec<Value>,
}

/// On-disk shape of a group file, as written.
#[derive(Serialize)]
struct StoredGroupRef<'a> {
    properties: &'a GroupProperties,
    notes: Vec<Value>,
}

/// Serializes a group into its file representation.
pub fn encode_group(group: &Group) -> Result<String> {
    let group_type = group.group_type();
    let notes = group
        .notes
        .iter()
        .map(|note| {
            if note.group_type() == group_type {
                note.to_json()
            } else {
                warn!(
                    "Note {} in {} is a {} note; storing it as {}",
                    note.id(),
                    group.info(),
                    note.group_type(),
                    group_type
                );
                note.convert(group_type).to_json()
            }
        })
        .collect::<serde_json::Result<Vec<_>>>()?;

    let stored = StoredGroupRef {
        properties: &group.properties,
        notes,
    };
    Ok(serde_json::to_string_pretty(&stored)?)
}

/// Reads a group file. Everything that runs here leaves timestamps as stored.
pub fn decode_group(json: &str) -> Result<Group> {
    trace!("Deserializing group file");
    let stored: StoredGroup = serde_json::from_str(json)?;

    let mut properties = stored.properties;
    properties.normalize(BULK_LOAD);
    let group_type = properties.group_type();

    let mut notes = Vec::with_capacity(stored.notes.len());
    for value in stored.notes {
        let mut note = Note::from_json(group_type, value)?;
        note.normalize(BULK_LOAD);
        notes.push(note);
    }

    trace!("Decoded {} notes for {}", notes.len(), properties.info());
    Ok(Group::from_parts(properties, notes))
}

/// Stores each group as `<prefix>_<name>.json` inside one directory.
#[derive(Debug, Clone)]
pub struct FileGroupStore {
    data_dir: PathBuf,
}

impl FileGroupStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Creates the data directory if needed.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(data_dir);
        if !store.data_dir.exists() {
            debug!(
                "Data directory does not exist, creating: {}",
                store.data_dir.display()
            );
            fs::create_dir_all(&store.data_dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                PimError::DirectoryError {
                    path: store.data_dir.clone(),
                }
            })?;
        }
        Ok(store)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The file of a group. Names that would leave the data directory are refused.
    fn group_path(&self, info: &GroupInfo) -> Result<PathBuf> {
        validate_group_name(&info.name)?;
        Ok(self.data_dir.join(format!("{}.json", info.storage_name())))
    }
}

impl GroupStore for FileGroupStore {
    fn load_group(&self, info: &GroupInfo) -> Result<Group> {
        let path = self.group_path(info)?;
        debug!("Loading group {} from {}", info, path.display());

        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PimError::GroupNotFound {
                    name: info.to_string(),
                }
            } else {
                error!("Failed to read group file {}: {}", path.display(), e);
                PimError::Io(e)
            }
        })?;

        let group = decode_group(&content).map_err(|e| {
            error!("Failed to decode group file {}: {}", path.display(), e);
            e
        })?;

        if group.group_type() != info.group_type {
            let message = format!(
                "{} holds a {} group, expected {}",
                path.display(),
                group.group_type(),
                info.group_type
            );
            error!("{}", message);
            return Err(PimError::InvalidFormat { message });
        }

        info!("Loaded group {} ({} notes)", info, group.notes.len());
        Ok(group)
    }

    fn save_group(&self, group: &Group) -> Result<()> {
        let info = group.info();
        info!("Saving group: {}", info);

        let file_path = self.group_path(&info)?;
        debug!("File path for group: {}", file_path.display());

        if !self.data_dir.exists() {
            debug!("Creating data directory: {}", self.data_dir.display());
            fs::create_dir_all(&self.data_dir).map_err(|e| {
                error!(
                    "Failed to create directory {}: {}",
                    self.data_dir.display(),
                    e
                );
                PimError::Io(e)
            })?;
        }

        // Serialize before touching the disk so a bad group never replaces a good file
        trace!("Serializing group to JSON");
        let json = encode_group(group)?;

        let mut temp_file = NamedTempFile::new_in(&self.data_dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            PimError::Io(e)
        })?;

        trace!("Writing to temporary file");
        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            PimError::Io(e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            PimError::Io(e)
        })?;

        debug!("Performing atomic move of temporary file to final location");
        temp_file.persist(&file_path).map_err(|e| {
            error!(
                "Failed to persist file {}: {}",
                file_path.display(),
                e.error
            );
            PimError::Io(e.error)
        })?;

        info!("Group saved successfully: {}", info);
        Ok(())
    }

    fn list_group_names(&self, group_type: GroupType) -> Result<Vec<String>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = WalkDir::new(&self.data_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry.path().is_file() && entry.path().extension().is_some_and(|ext| ext == "json")
            })
            .filter_map(|entry| {
                let stem = entry.path().file_stem()?.to_string_lossy().to_string();
                GroupInfo::from_storage_name(&stem)
            })
            .filter(|info| info.group_type == group_type)
            .map(|info| info.name)
            .collect();

        names.sort();
        debug!("Found {} {} groups", names.len(), group_type);
        Ok(names)
    }

    fn delete_group(&self, info: &GroupInfo) -> Result<()> {
        let path = self.group_path(info)?;
        info!("Deleting group {} at {}", info, path.display());

        fs::remove_file(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                PimError::GroupNotFound {
                    name: info.to_string(),
                }
            } else {
                error!("Failed to delete group file {}: {}", path.display(), e);
                PimError::Io(e)
            }
        })
    }

    fn exists(&self, info: &GroupInfo) -> Result<bool> {
        Ok(self.group_path(info)?.is_file())
    }

    fn location(&self, info: &GroupInfo) -> Option<PathBuf> {
        self.group_path(info).ok()
    }
}

/// Keeps serialized groups in memory. Goes through the same encode/decode path
/// as [`FileGroupStore`].
#[derive(Debug, Default)]
pub struct MemoryGroupStore {
    groups: RefCell<HashMap<GroupInfo, String>>,
}

impl MemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw JSON under `info`, bypassing validation.
    pub fn insert_raw(&self, info: GroupInfo, json: impl Into<String>) {
        self.groups.borrow_mut().insert(info, json.into());
    }
}

impl GroupStore for MemoryGroupStore {
    fn load_group(&self, info: &GroupInfo) -> Result<Group> {
        let groups = self.groups.borrow();
        let json = groups.get(info).ok_or_else(|| PimError::GroupNotFound {
            name: info.to_string(),
        })?;
        decode_group(json)
    }

    fn save_group(&self, group: &Group) -> Result<()> {
        let info = group.info();
        validate_group_name(&info.name)?;
        let json = encode_group(group)?;
        self.groups.borrow_mut().insert(info, json);
        Ok(())
    }

    fn list_group_names(&self, group_type: GroupType) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .groups
            .borrow()
            .keys()
            .filter(|info| info.group_type == group_type)
            .map(|info| info.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn delete_group(&self, info: &GroupInfo) -> Result<()> {
        self.groups
            .borrow_mut()
            .remove(info)
            .map(|_| ())
            .ok_or_else(|| PimError::GroupNotFound {
                name: info.to_string(),
            })
    }

    fn exists(&self, info: &GroupInfo) -> Result<bool> {
        Ok(self.groups.borrow().contains_key(info))
    }
}
