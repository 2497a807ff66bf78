//! Groups: a named, typed collection of notes plus the properties that
//! describe how the group is shown.
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LinkTarget, Note, PimError, Record, Result, Stamp};

/// Selects which note and property variant a group uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupType {
    Plain,
    Day,
    Event,
    Todo,
    Log,
    Goal,
    SearchResult,
}

impl GroupType {
    pub const ALL: [GroupType; 7] = [
        GroupType::Plain,
        GroupType::Day,
        GroupType::Event,
        GroupType::Todo,
        GroupType::Log,
        GroupType::Goal,
        GroupType::SearchResult,
    ];

    /// File-name prefix used by the group naming convention.
    pub fn prefix(self) -> &'static str {
        match self {
            GroupType::Plain => "note",
            GroupType::Day => "day",
            GroupType::Event => "event",
            GroupType::Todo => "todo",
            GroupType::Log => "log",
            GroupType::Goal => "goal",
            GroupType::SearchResult => "search",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<GroupType> {
        GroupType::ALL.into_iter().find(|t| t.prefix() == prefix)
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Name and type of a group; the key used by stores and the keeper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub name: String,
    pub group_type: GroupType,
}

impl GroupInfo {
    pub fn new(name: impl Into<String>, group_type: GroupType) -> Self {
        GroupInfo {
            name: name.into(),
            group_type,
        }
    }

    /// The name used on disk, e.g. `log_Retire` for the log named "Retire".
    pub fn storage_name(&self) -> String {
        format!("{}_{}", self.group_type.prefix(), self.name)
    }

    /// Inverse of [`GroupInfo::storage_name`].
    pub fn from_storage_name(storage_name: &str) -> Option<GroupInfo> {
        let (prefix, name) = storage_name.split_once('_')?;
        if name.is_empty() {
            return None;
        }
        let group_type = GroupType::from_prefix(prefix)?;
        Some(GroupInfo::new(name, group_type))
    }
}

impl fmt::Display for GroupInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.group_type)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GoalStatus {
    #[default]
    NotStarted,
    OnTrack,
    AtRisk,
    Behind,
    Done,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlainSettings {
    pub column_order: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DaySettings {
    pub show_icons: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventSettings {
    pub column_labels: Vec<String>,
    pub column_order: Vec<usize>,
    pub show_past_events: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TodoSettings {
    pub column_labels: Vec<String>,
    pub column_order: Vec<usize>,
    pub show_priority: bool,
    pub show_deadline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogSettings {
    pub newest_first: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalSettings {
    pub current_status: GoalStatus,
    pub overall_status: GoalStatus,
    /// Properties of the log that records progress on this goal
    pub log_properties: Option<Box<GroupProperties>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchSettings {
    /// Human readable description of the criteria that produced the group
    pub criteria: String,
}

/// Per-type layout and status fields. The tag doubles as the group type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "groupType", rename_all = "camelCase")]
pub enum GroupSettings {
    Plain(PlainSettings),
    Day(DaySettings),
    Event(EventSettings),
    Todo(TodoSettings),
    Log(LogSettings),
    Goal(GoalSettings),
    SearchResult(SearchSettings),
}

impl GroupSettings {
    pub fn default_for(group_type: GroupType) -> GroupSettings {
        match group_type {
            GroupType::Plain => GroupSettings::Plain(PlainSettings::default()),
            GroupType::Day => GroupSettings::Day(DaySettings { show_icons: true }),
            GroupType::Event => GroupSettings::Event(EventSettings {
                column_labels: vec!["Event".to_string(), "Start".to_string(), "End".to_string()],
                column_order: vec![0, 1, 2],
                show_past_events: false,
            }),
            GroupType::Todo => GroupSettings::Todo(TodoSettings {
                column_labels: vec![
                    "To Do".to_string(),
                    "Priority".to_string(),
                    "Deadline".to_string(),
                ],
                column_order: vec![0, 1, 2],
                show_priority: true,
                show_deadline: true,
            }),
            GroupType::Log => GroupSettings::Log(LogSettings { newest_first: true }),
            GroupType::Goal => GroupSettings::Goal(GoalSettings::default()),
            GroupType::SearchResult => GroupSettings::SearchResult(SearchSettings::default()),
        }
    }

    pub fn group_type(&self) -> GroupType {
        match self {
            GroupSettings::Plain(_) => GroupType::Plain,
            GroupSettings::Day(_) => GroupType::Day,
            GroupSettings::Event(_) => GroupType::Event,
            GroupSettings::Todo(_) => GroupType::Todo,
            GroupSettings::Log(_) => GroupType::Log,
            GroupSettings::Goal(_) => GroupType::Goal,
            GroupSettings::SearchResult(_) => GroupType::SearchResult,
        }
    }
}

/// Metadata of a group, stored next to its notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProperties {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default)]
    pub name: String,
    /// Group-level links, e.g. a goal pointing at its plan items
    #[serde(default)]
    pub link_targets: Vec<LinkTarget>,
    #[serde(flatten)]
    pub settings: GroupSettings,
}

impl GroupProperties {
    pub fn new(name: impl Into<String>, group_type: GroupType) -> Self {
        GroupProperties {
            record: Record::new(),
            name: name.into(),
            link_targets: Vec::new(),
            settings: GroupSettings::default_for(group_type),
        }
    }

    pub fn group_type(&self) -> GroupType {
        self.settings.group_type()
    }

    pub fn info(&self) -> GroupInfo {
        GroupInfo::new(self.name.clone(), self.group_type())
    }

    pub fn id(&self) -> Uuid {
        self.record.id
    }

    pub fn set_name(&mut self, name: impl Into<String>, stamp: Stamp) {
        self.name = name.into();
        self.record.touch(stamp);
    }

    /// Deep copy under a new name and a new id, for save-as.
    pub fn copy_as(&self, name: impl Into<String>) -> Self {
        let mut copy = self.clone();
        copy.record = Record::new();
        copy.name = name.into();
        copy
    }

    /// Tidy up values written by older versions. Nothing here moves the timestamp
    /// when called with [`Stamp::Preserve`].
    pub fn normalize(&mut self, stamp: Stamp) {
        if let GroupSettings::Goal(goal) = &mut self.settings {
            if let Some(log) = goal.log_properties.as_mut() {
                if log.group_type() != GroupType::Log {
                    goal.log_properties = None;
                    self.record.touch(stamp);
                }
            }
        }
    }
}

/// One group: its properties and its notes, always handled as a pair.
#[derive(Debug, Clone)]
pub struct Group {
    pub properties: GroupProperties,
    pub notes: Vec<Note>,
}

impl Group {
    /// An empty group. Goals get their log properties set up right away.
    pub fn new(name: impl Into<String>, group_type: GroupType) -> Self {
        let name = name.into();
        let mut properties = GroupProperties::new(name.clone(), group_type);
        if let GroupSettings::Goal(goal) = &mut properties.settings {
            goal.log_properties = Some(Box::new(GroupProperties::new(name, GroupType::Log)));
        }
        Group {
            properties,
            notes: Vec::new(),
        }
    }

    pub fn from_parts(properties: GroupProperties, notes: Vec<Note>) -> Self {
        Group { properties, notes }
    }

    pub fn info(&self) -> GroupInfo {
        self.properties.info()
    }

    pub fn name(&self) -> &str {
        &self.properties.name
    }

    pub fn group_type(&self) -> GroupType {
        self.properties.group_type()
    }

    /// True iff there are no notes and no group-level links.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.properties.link_targets.is_empty()
    }

    /// The log that belongs to a goal group, if this is one.
    pub fn goal_log_info(&self) -> Option<GroupInfo> {
        match &self.properties.settings {
            GroupSettings::Goal(goal) => {
                let name = goal
                    .log_properties
                    .as_ref()
                    .map(|log| log.name.clone())
                    .unwrap_or_else(|| self.properties.name.clone());
                Some(GroupInfo::new(name, GroupType::Log))
            }
            _ => None,
        }
    }

    pub fn find_note(&self, id: Uuid) -> Option<&Note> {
        self.notes.iter().find(|note| note.id() == id)
    }

    pub fn find_note_mut(&mut self, id: Uuid) -> Option<&mut Note> {
        self.notes.iter_mut().find(|note| note.id() == id)
    }

    /// Appends a note, converting it first when it belongs to another type.
    /// Returns the id of the stored note.
    pub fn add_note(&mut self, note: Note) -> Uuid {
        let note = if note.group_type() == self.group_type() {
            note
        } else {
            note.convert(self.group_type())
        };
        let id = note.id();
        self.notes.push(note);
        self.properties.record.touch(Stamp::Touch);
        id
    }

    /// Replaces the note with the same id.
    pub fn update_note(&mut self, mut note: Note) -> Result<()> {
        if note.group_type() != self.group_type() {
            note = note.convert(self.group_type());
        }
        let slot = self
            .notes
            .iter_mut()
            .find(|existing| existing.id() == note.id())
            .ok_or_else(|| PimError::NoteNotFound {
                id: note.id().to_string(),
            })?;
        note.base_mut().record.touch(Stamp::Touch);
        *slot = note;
        self.properties.record.touch(Stamp::Touch);
        Ok(())
    }

    pub fn remove_note(&mut self, id: Uuid) -> Option<Note> {
        let index = self.notes.iter().position(|note| note.id() == id)?;
        let removed = self.notes.remove(index);
        self.properties.record.touch(Stamp::Touch);
        Some(removed)
    }

    /// Moves a note to `new_index`, clamped to the end of the list.
    pub fn move_note(&mut self, id: Uuid, new_index: usize) -> Result<()> {
        let index = self
            .notes
            .iter()
            .position(|note| note.id() == id)
            .ok_or_else(|| PimError::NoteNotFound { id: id.to_string() })?;
        let note = self.notes.remove(index);
        let new_index = new_index.min(self.notes.len());
        self.notes.insert(new_index, note);
        self.properties.record.touch(Stamp::Touch);
        Ok(())
    }

    /// Deep copy under a new name, sharing nothing with `self`.
    pub fn copy_as(&self, name: impl Into<String>) -> Group {
        Group {
            properties: self.properties.copy_as(name),
            notes: self.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{add_group_link, LinkType};

    #[test]
    fn storage_name_round_trip() {
        let info = GroupInfo::new("Retire", GroupType::Log);
        assert_eq!(info.storage_name(), "log_Retire");
        assert_eq!(GroupInfo::from_storage_name("log_Retire"), Some(info));

        let spaced = GroupInfo::new("House_work 2", GroupType::Todo);
        assert_eq!(
            GroupInfo::from_storage_name(&spaced.storage_name()),
            Some(spaced)
        );

        assert_eq!(GroupInfo::from_storage_name("bogus_name"), None);
        assert_eq!(GroupInfo::from_storage_name("todo_"), None);
    }

    #[test]
    fn fresh_group_is_empty() {
        let group = Group::new("Chores", GroupType::Todo);
        assert!(group.is_empty());
    }

    #[test]
    fn adding_a_note_makes_group_non_empty() {
        let mut group = Group::new("Chores", GroupType::Todo);
        group.add_note(Note::new(GroupType::Todo));
        assert!(!group.is_empty());
    }

    #[test]
    fn adding_a_group_link_makes_group_non_empty() {
        let mut group = Group::new("Retire", GroupType::Goal);
        let target = Group::new("Savings", GroupType::Todo);
        add_group_link(
            &mut group.properties,
            Some(target.properties.id()),
            None,
            LinkType::Related,
        )
        .unwrap();
        assert!(!group.is_empty());
    }

    #[test]
    fn add_note_converts_foreign_variants() {
        let mut group = Group::new("Chores", GroupType::Todo);
        let plain = Note::with_text(GroupType::Plain, "sweep");
        let id = group.add_note(plain);

        let stored = group.find_note(id).unwrap();
        assert_eq!(stored.group_type(), GroupType::Todo);
        assert_eq!(stored.text(), "sweep");
    }

    #[test]
    fn update_and_remove_by_id() {
        let mut group = Group::new("Ideas", GroupType::Plain);
        let id = group.add_note(Note::with_text(GroupType::Plain, "first"));

        let mut edited = group.find_note(id).unwrap().clone();
        edited.set_text("second", Stamp::Touch);
        group.update_note(edited).unwrap();
        assert_eq!(group.find_note(id).unwrap().text(), "second");

        assert!(group.remove_note(id).is_some());
        assert!(group.remove_note(id).is_none());
        assert!(matches!(
            group.update_note(Note::new(GroupType::Plain)),
            Err(PimError::NoteNotFound { .. })
        ));
    }

    #[test]
    fn move_note_reorders() {
        let mut group = Group::new("Ideas", GroupType::Plain);
        let a = group.add_note(Note::with_text(GroupType::Plain, "a"));
        group.add_note(Note::with_text(GroupType::Plain, "b"));
        group.move_note(a, 10).unwrap();
        let texts: Vec<_> = group.notes.iter().map(|n| n.text()).collect();
        assert_eq!(texts, vec!["b", "a"]);
    }

    #[test]
    fn copy_as_does_not_share_state() {
        let mut group = Group::new("Chores", GroupType::Todo);
        group.add_note(Note::with_text(GroupType::Todo, "dishes"));

        let mut copy = group.copy_as("Chores 2");
        copy.notes[0].set_text("laundry", Stamp::Touch);

        assert_eq!(copy.name(), "Chores 2");
        assert_ne!(copy.properties.id(), group.properties.id());
        assert_eq!(group.notes[0].text(), "dishes");
        assert_eq!(copy.group_type(), GroupType::Todo);
    }

    #[test]
    fn goal_owns_a_log() {
        let goal = Group::new("Retire", GroupType::Goal);
        let log = goal.goal_log_info().unwrap();
        assert_eq!(log.storage_name(), "log_Retire");
        assert_eq!(Group::new("Chores", GroupType::Todo).goal_log_info(), None);
    }

    #[test]
    fn properties_round_trip_with_unknown_fields() {
        let properties = GroupProperties::new("Chores", GroupType::Todo);
        let mut value = serde_json::to_value(&properties).unwrap();
        assert_eq!(value["groupType"], json!("todo"));
        value["someFutureToggle"] = json!(true);

        let back: GroupProperties = serde_json::from_value(value).unwrap();
        assert_eq!(back, properties);
    }
}
