//! Global per-note-type defaults, each kept in its own small JSON file next to
//! the group files.
use std::{fs, path::Path};

use log::{debug, info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    write_atomically, DayNote, DurationUnit, EventNote, Note, PimError, Result, TodoNote,
    DEFAULT_TODO_PRIORITY,
};

/// A defaults document stored under a fixed file name.
pub trait DefaultsFile: Default + Serialize + DeserializeOwned {
    const FILE_NAME: &'static str;

    /// Reads the file from `dir`. Any failure falls back to [`Default`].
    fn load(dir: &Path) -> Self {
        let path = dir.join(Self::FILE_NAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No defaults at {} ({}), using built-ins", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(defaults) => defaults,
            Err(e) => {
                warn!(
                    "Ignoring unreadable defaults file {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Rewrites the whole file.
    fn save(&self, dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|_| PimError::DirectoryError {
                path: dir.to_path_buf(),
            })?;
        }
        let path = dir.join(Self::FILE_NAME);
        let json = serde_json::to_string_pretty(self)?;
        write_atomically(&path, json.as_bytes())?;
        info!("Defaults written to {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DayDefaults {
    pub icon: Option<String>,
    pub twelve_hour_clock: bool,
}

impl DefaultsFile for DayDefaults {
    const FILE_NAME: &'static str = "defaults.day.json";
}

impl DayDefaults {
    pub fn apply(&self, note: &mut DayNote) {
        if note.icon.icon.is_none() {
            note.icon.icon = self.icon.clone();
        }
    }

    /// Format string for times shown in the day view.
    pub fn time_format(&self) -> &'static str {
        if self.twelve_hour_clock {
            "%I:%M %p"
        } else {
            "%H:%M"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDefaults {
    pub icon: Option<String>,
    pub duration_value: u32,
    pub duration_unit: DurationUnit,
}

impl Default for EventDefaults {
    fn default() -> Self {
        EventDefaults {
            icon: None,
            duration_value: 1,
            duration_unit: DurationUnit::Hours,
        }
    }
}

impl DefaultsFile for EventDefaults {
    const FILE_NAME: &'static str = "defaults.event.json";
}

impl EventDefaults {
    pub fn apply(&self, note: &mut EventNote) {
        if note.icon.icon.is_none() {
            note.icon.icon = self.icon.clone();
        }
        note.duration_value = self.duration_value;
        note.duration_unit = self.duration_unit;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoDefaults {
    pub icon: Option<String>,
    pub priority: i32,
}

impl Default for TodoDefaults {
    fn default() -> Self {
        TodoDefaults {
            icon: None,
            priority: DEFAULT_TODO_PRIORITY,
        }
    }
}

impl DefaultsFile for TodoDefaults {
    const FILE_NAME: &'static str = "defaults.todo.json";
}

impl TodoDefaults {
    pub fn apply(&self, note: &mut TodoNote) {
        if note.icon.icon.is_none() {
            note.icon.icon = self.icon.clone();
        }
        note.priority = self.priority;
    }
}

/// All defaults documents, loaded once at startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDefaults {
    pub day: DayDefaults,
    pub event: EventDefaults,
    pub todo: TodoDefaults,
}

impl NoteDefaults {
    pub fn load(dir: &Path) -> Self {
        NoteDefaults {
            day: DayDefaults::load(dir),
            event: EventDefaults::load(dir),
            todo: TodoDefaults::load(dir),
        }
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        self.day.save(dir)?;
        self.event.save(dir)?;
        self.todo.save(dir)
    }

    /// Fills in type defaults on a freshly created note.
    pub fn apply(&self, note: &mut Note) {
        match note {
            Note::Day(day) => self.day.apply(day),
            Note::Event(event) => self.event.apply(event),
            Note::Todo(todo) => self.todo.apply(todo),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::{GroupInfo, GroupType, NoteKind};

    #[test]
    fn missing_files_fall_back() {
        let dir = TempDir::new().unwrap();
        assert_eq!(NoteDefaults::load(dir.path()), NoteDefaults::default());
    }

    #[test]
    fn corrupt_file_falls_back() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(TodoDefaults::FILE_NAME), "{{{").unwrap();
        assert_eq!(TodoDefaults::load(dir.path()), TodoDefaults::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut defaults = NoteDefaults::default();
        defaults.day.twelve_hour_clock = true;
        defaults.todo.icon = Some("check.png".to_string());
        defaults.todo.priority = 1;
        defaults.save(dir.path()).unwrap();

        let loaded = NoteDefaults::load(dir.path());
        assert_eq!(loaded, defaults);
        assert_eq!(loaded.day.time_format(), "%I:%M %p");
    }

    #[test]
    fn resave_replaces_the_file_in_place() {
        let dir = TempDir::new().unwrap();
        let mut todo = TodoDefaults::default();
        todo.save(dir.path()).unwrap();
        todo.priority = 5;
        todo.save(dir.path()).unwrap();

        assert_eq!(TodoDefaults::load(dir.path()).priority, 5);
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(TodoDefaults::FILE_NAME)]);
    }

    #[test]
    fn file_names_never_look_like_groups() {
        for name in [
            DayDefaults::FILE_NAME,
            EventDefaults::FILE_NAME,
            TodoDefaults::FILE_NAME,
        ] {
            let stem = name.trim_end_matches(".json");
            assert_eq!(GroupInfo::from_storage_name(stem), None);
        }
    }

    #[test]
    fn apply_fills_new_todo() {
        let defaults = NoteDefaults {
            todo: TodoDefaults {
                icon: Some("check.png".to_string()),
                priority: 2,
            },
            ..NoteDefaults::default()
        };
        let mut note = TodoNote::new().into_note();
        defaults.apply(&mut note);
        let Note::Todo(todo) = note else {
            panic!("expected a todo note");
        };
        assert_eq!(todo.priority, 2);
        assert_eq!(todo.icon.icon.as_deref(), Some("check.png"));

        let mut plain = Note::new(GroupType::Plain);
        defaults.apply(&mut plain);
    }
}
