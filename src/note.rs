//! Note records.
//!
//! Every note shares a [`NoteBase`] (identity, text, subject, extended text and
//! outgoing links). Each group type layers its own fields on top; [`Note`] is the
//! tagged union over those variants and is what groups, links and the search
//! engine pass around.
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveTime};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{GroupInfo, GroupType, LinkTarget, Record, Stamp};

/// Priority assigned to a new todo.
pub const DEFAULT_TODO_PRIORITY: i32 = 3;
/// Status code of a todo that has not been started.
pub const TODO_STATUS_OPEN: i32 = 0;
/// Status code of a goal that has not been started.
pub const GOAL_STATUS_NOT_STARTED: i32 = 0;

/// Fields common to every note variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteBase {
    #[serde(flatten)]
    pub record: Record,
    /// Primary content
    #[serde(default)]
    pub text: String,
    /// `None` means "use the group default"
    #[serde(default)]
    pub subject: Option<String>,
    /// Long-form content
    #[serde(default)]
    pub extended_text: String,
    /// Outgoing links, in insertion order
    #[serde(default)]
    pub links: Vec<LinkTarget>,
}

impl NoteBase {
    pub fn new() -> Self {
        NoteBase {
            record: Record::new(),
            text: String::new(),
            subject: None,
            extended_text: String::new(),
            links: Vec::new(),
        }
    }
}

impl Default for NoteBase {
    fn default() -> Self {
        Self::new()
    }
}

/// Icon shown next to day, event and todo notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IconFields {
    pub icon: Option<String>,
    pub show_icon_on_month: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DurationUnit {
    Minutes,
    #[default]
    Hours,
    Days,
    Weeks,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainNote {
    #[serde(flatten)]
    pub base: NoteBase,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayNote {
    #[serde(flatten)]
    pub base: NoteBase,
    #[serde(flatten)]
    pub icon: IconFields,
    #[serde(default)]
    pub day: Option<NaiveDate>,
    #[serde(default)]
    pub time_of_day: Option<NaiveTime>,
    /// Preformatted timestamp shown in the day view
    #[serde(default)]
    pub display_stamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNote {
    #[serde(flatten)]
    pub base: NoteBase,
    #[serde(flatten)]
    pub icon: IconFields,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// Recurrence rule as entered by the user, empty for one-off events
    #[serde(default)]
    pub recurrence: String,
    /// Keep occurrences whose date has passed
    #[serde(default)]
    pub retain_past: bool,
    #[serde(default)]
    pub duration_value: u32,
    #[serde(default)]
    pub duration_unit: DurationUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoNote {
    #[serde(flatten)]
    pub base: NoteBase,
    #[serde(flatten)]
    pub icon: IconFields,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub status: i32,
}

fn default_priority() -> i32 {
    DEFAULT_TODO_PRIORITY
}

impl Default for TodoNote {
    fn default() -> Self {
        TodoNote {
            base: NoteBase::new(),
            icon: IconFields::default(),
            due_date: None,
            priority: DEFAULT_TODO_PRIORITY,
            status: TODO_STATUS_OPEN,
        }
    }
}

/// One log entry. Several entries may share a date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogNote {
    #[serde(flatten)]
    pub base: NoteBase,
    #[serde(default)]
    pub log_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalNote {
    #[serde(flatten)]
    pub base: NoteBase,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub plan_steps: Vec<String>,
    #[serde(default)]
    pub status: i32,
    /// Display name of the log that tracks this goal
    #[serde(default)]
    pub log_name: Option<String>,
}

/// A copy of a note found by a search.
///
/// `found_in` and `found_in_file` only exist while the result group is alive;
/// they are never written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultNote {
    #[serde(flatten)]
    pub base: NoteBase,
    #[serde(default)]
    pub note_date: Option<NaiveDate>,
    #[serde(default)]
    pub origin_type: Option<GroupType>,
    #[serde(skip)]
    pub found_in: Option<GroupInfo>,
    #[serde(skip)]
    pub found_in_file: Option<PathBuf>,
}

/// Behaviour shared by every concrete note variant.
pub trait NoteKind: Clone + Serialize + DeserializeOwned {
    const GROUP_TYPE: GroupType;

    /// Builds the variant around existing common fields, defaulting the rest.
    fn with_base(base: NoteBase) -> Self;

    fn base(&self) -> &NoteBase;

    fn base_mut(&mut self) -> &mut NoteBase;

    fn into_note(self) -> Note;

    /// Borrow the variant back out of a [`Note`] when the types match.
    fn from_note(note: &Note) -> Option<&Self>;

    /// A new record with a fresh id and the variant defaults.
    fn new() -> Self {
        Self::with_base(NoteBase::new())
    }

    /// Copy-construct from any note.
    ///
    /// The same variant is cloned whole. A different variant keeps only the
    /// common fields, and the variant fields start from their defaults.
    fn copy_from(note: &Note) -> Self {
        match Self::from_note(note) {
            Some(same) => same.clone(),
            None => Self::with_base(note.base().clone()),
        }
    }
}

macro_rules! impl_note_kind {
    ($ty:ident, $variant:ident, |$base:ident| $build:expr) => {
        impl NoteKind for $ty {
            const GROUP_TYPE: GroupType = GroupType::$variant;

            fn with_base($base: NoteBase) -> Self {
                $build
            }

            fn base(&self) -> &NoteBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut NoteBase {
                &mut self.base
            }

            fn into_note(self) -> Note {
                Note::$variant(self)
            }

            fn from_note(note: &Note) -> Option<&Self> {
                match note {
                    Note::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

impl_note_kind!(PlainNote, Plain, |base| PlainNote { base });

impl_note_kind!(DayNote, Day, |base| DayNote {
    base,
    icon: IconFields::default(),
    day: Some(Local::now().date_naive()),
    time_of_day: None,
    display_stamp: String::new(),
});

impl_note_kind!(EventNote, Event, |base| {
    let today = Local::now().date_naive();
    EventNote {
        base,
        icon: IconFields::default(),
        location: String::new(),
        start_date: Some(today),
        start_time: None,
        end_date: Some(today),
        end_time: None,
        recurrence: String::new(),
        retain_past: false,
        duration_value: 1,
        duration_unit: DurationUnit::Hours,
    }
});

impl_note_kind!(TodoNote, Todo, |base| TodoNote {
    base,
    icon: IconFields::default(),
    due_date: Some(Local::now().date_naive()),
    priority: DEFAULT_TODO_PRIORITY,
    status: TODO_STATUS_OPEN,
});

impl_note_kind!(LogNote, Log, |base| LogNote {
    base,
    log_date: Some(Local::now().date_naive()),
});

impl_note_kind!(GoalNote, Goal, |base| GoalNote {
    base,
    title: String::new(),
    plan_steps: Vec::new(),
    status: GOAL_STATUS_NOT_STARTED,
    log_name: None,
});

impl_note_kind!(SearchResultNote, SearchResult, |base| SearchResultNote {
    base,
    ..SearchResultNote::default()
});

impl TodoNote {
    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>, stamp: Stamp) {
        self.due_date = due_date;
        self.base.record.touch(stamp);
    }

    pub fn set_priority(&mut self, priority: i32, stamp: Stamp) {
        self.priority = priority;
        self.base.record.touch(stamp);
    }

    pub fn set_status(&mut self, status: i32, stamp: Stamp) {
        self.status = status;
        self.base.record.touch(stamp);
    }
}

impl EventNote {
    pub fn set_location(&mut self, location: impl Into<String>, stamp: Stamp) {
        self.location = location.into();
        self.base.record.touch(stamp);
    }

    pub fn set_start(&mut self, date: Option<NaiveDate>, time: Option<NaiveTime>, stamp: Stamp) {
        self.start_date = date;
        self.start_time = time;
        self.base.record.touch(stamp);
    }

    pub fn set_end(&mut self, date: Option<NaiveDate>, time: Option<NaiveTime>, stamp: Stamp) {
        self.end_date = date;
        self.end_time = time;
        self.base.record.touch(stamp);
    }

    pub fn set_recurrence(&mut self, rule: impl Into<String>, retain_past: bool, stamp: Stamp) {
        self.recurrence = rule.into();
        self.retain_past = retain_past;
        self.base.record.touch(stamp);
    }
}

impl DayNote {
    pub fn set_day(&mut self, day: Option<NaiveDate>, time_of_day: Option<NaiveTime>, stamp: Stamp) {
        self.day = day;
        self.time_of_day = time_of_day;
        self.base.record.touch(stamp);
    }
}

impl LogNote {
    pub fn set_log_date(&mut self, log_date: Option<NaiveDate>, stamp: Stamp) {
        self.log_date = log_date;
        self.base.record.touch(stamp);
    }
}

impl GoalNote {
    pub fn set_title(&mut self, title: impl Into<String>, stamp: Stamp) {
        self.title = title.into();
        self.base.record.touch(stamp);
    }

    pub fn add_plan_step(&mut self, step: impl Into<String>, stamp: Stamp) {
        self.plan_steps.push(step.into());
        self.base.record.touch(stamp);
    }

    pub fn set_status(&mut self, status: i32, stamp: Stamp) {
        self.status = status;
        self.base.record.touch(stamp);
    }
}

/// A note of any group type.
///
/// Two notes are equal when they have the same id, whatever their fields hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "groupType", content = "note", rename_all = "camelCase")]
pub enum Note {
    Plain(PlainNote),
    Day(DayNote),
    Event(EventNote),
    Todo(TodoNote),
    Log(LogNote),
    Goal(GoalNote),
    SearchResult(SearchResultNote),
}

macro_rules! each_variant {
    ($note:expr, $inner:ident => $body:expr) => {
        match $note {
            Note::Plain($inner) => $body,
            Note::Day($inner) => $body,
            Note::Event($inner) => $body,
            Note::Todo($inner) => $body,
            Note::Log($inner) => $body,
            Note::Goal($inner) => $body,
            Note::SearchResult($inner) => $body,
        }
    };
}

impl Note {
    /// A fresh note of the given type.
    pub fn new(group_type: GroupType) -> Note {
        match group_type {
            GroupType::Plain => PlainNote::new().into_note(),
            GroupType::Day => DayNote::new().into_note(),
            GroupType::Event => EventNote::new().into_note(),
            GroupType::Todo => TodoNote::new().into_note(),
            GroupType::Log => LogNote::new().into_note(),
            GroupType::Goal => GoalNote::new().into_note(),
            GroupType::SearchResult => SearchResultNote::new().into_note(),
        }
    }

    /// A fresh note of the given type carrying `text`.
    pub fn with_text(group_type: GroupType, text: impl Into<String>) -> Note {
        let mut note = Note::new(group_type);
        note.base_mut().text = text.into();
        note
    }

    /// Copy-construct this note as a `target` note (see [`NoteKind::copy_from`]).
    pub fn convert(&self, target: GroupType) -> Note {
        match target {
            GroupType::Plain => PlainNote::copy_from(self).into_note(),
            GroupType::Day => DayNote::copy_from(self).into_note(),
            GroupType::Event => EventNote::copy_from(self).into_note(),
            GroupType::Todo => TodoNote::copy_from(self).into_note(),
            GroupType::Log => LogNote::copy_from(self).into_note(),
            GroupType::Goal => GoalNote::copy_from(self).into_note(),
            GroupType::SearchResult => SearchResultNote::copy_from(self).into_note(),
        }
    }

    pub fn group_type(&self) -> GroupType {
        match self {
            Note::Plain(_) => GroupType::Plain,
            Note::Day(_) => GroupType::Day,
            Note::Event(_) => GroupType::Event,
            Note::Todo(_) => GroupType::Todo,
            Note::Log(_) => GroupType::Log,
            Note::Goal(_) => GroupType::Goal,
            Note::SearchResult(_) => GroupType::SearchResult,
        }
    }

    pub fn base(&self) -> &NoteBase {
        each_variant!(self, inner => &inner.base)
    }

    pub fn base_mut(&mut self) -> &mut NoteBase {
        each_variant!(self, inner => &mut inner.base)
    }

    pub fn id(&self) -> Uuid {
        self.base().record.id
    }

    pub fn text(&self) -> &str {
        &self.base().text
    }

    pub fn subject(&self) -> Option<&str> {
        self.base().subject.as_deref()
    }

    pub fn extended_text(&self) -> &str {
        &self.base().extended_text
    }

    pub fn links(&self) -> &[LinkTarget] {
        &self.base().links
    }

    pub fn set_text(&mut self, text: impl Into<String>, stamp: Stamp) {
        let base = self.base_mut();
        base.text = text.into();
        base.record.touch(stamp);
    }

    pub fn set_subject(&mut self, subject: Option<String>, stamp: Stamp) {
        let base = self.base_mut();
        base.subject = subject;
        base.record.touch(stamp);
    }

    pub fn set_extended_text(&mut self, extended_text: impl Into<String>, stamp: Stamp) {
        let base = self.base_mut();
        base.extended_text = extended_text.into();
        base.record.touch(stamp);
    }

    /// True iff the text or the extended text holds something besides whitespace.
    pub fn has_content(&self) -> bool {
        let base = self.base();
        !base.text.trim().is_empty() || !base.extended_text.trim().is_empty()
    }

    /// The date this note is "about", which depends on its type.
    ///
    /// Todos answer their due date, day notes their day, events their start
    /// date and log entries their log date. Plain notes and goals have none.
    pub fn note_date(&self) -> Option<NaiveDate> {
        match self {
            Note::Day(day) => day.day,
            Note::Event(event) => event.start_date,
            Note::Todo(todo) => todo.due_date,
            Note::Log(log) => log.log_date,
            Note::SearchResult(found) => found.note_date,
            Note::Plain(_) | Note::Goal(_) => None,
        }
    }

    /// Sets whichever field [`Note::note_date`] reads. Returns false for
    /// variants without one.
    pub fn set_note_date(&mut self, date: Option<NaiveDate>, stamp: Stamp) -> bool {
        match self {
            Note::Day(day) => {
                let time = day.time_of_day;
                day.set_day(date, time, stamp);
            }
            Note::Event(event) => {
                let time = event.start_time;
                event.set_start(date, time, stamp);
            }
            Note::Todo(todo) => todo.set_due_date(date, stamp),
            Note::Log(log) => log.set_log_date(date, stamp),
            Note::SearchResult(found) => {
                found.note_date = date;
                found.base.record.touch(stamp);
            }
            Note::Plain(_) | Note::Goal(_) => return false,
        }
        true
    }

    /// Tidy up values written by older versions.
    ///
    /// Called by the store on every freshly read note with [`Stamp::Preserve`].
    pub fn normalize(&mut self, stamp: Stamp) {
        if self
            .subject()
            .is_some_and(|subject| subject.trim().is_empty())
        {
            self.set_subject(None, stamp);
        }

        if let Note::Goal(goal) = self {
            if goal.plan_steps.iter().any(|step| step.trim().is_empty()) {
                goal.plan_steps.retain(|step| !step.trim().is_empty());
                goal.base.record.touch(stamp);
            }
        }
    }

    /// Serializes the variant payload alone, as it is stored in a group file.
    pub fn to_json(&self) -> serde_json::Result<Value> {
        each_variant!(self, inner => serde_json::to_value(inner))
    }

    /// Reads a variant payload, using the group's type to pick the shape.
    pub fn from_json(group_type: GroupType, value: Value) -> serde_json::Result<Note> {
        Ok(match group_type {
            GroupType::Plain => Note::Plain(serde_json::from_value(value)?),
            GroupType::Day => Note::Day(serde_json::from_value(value)?),
            GroupType::Event => Note::Event(serde_json::from_value(value)?),
            GroupType::Todo => Note::Todo(serde_json::from_value(value)?),
            GroupType::Log => Note::Log(serde_json::from_value(value)?),
            GroupType::Goal => Note::Goal(serde_json::from_value(value)?),
            GroupType::SearchResult => Note::SearchResult(serde_json::from_value(value)?),
        })
    }
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Note {}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use serde_json::json;

    use super::*;

    fn old_stamp() -> DateTime<Utc> {
        "2020-05-01T10:00:00Z".parse().unwrap()
    }

    #[test]
    fn new_note_defaults() {
        let note = Note::new(GroupType::Plain);
        assert_eq!(note.text(), "");
        assert_eq!(note.subject(), None);
        assert!(note.links().is_empty());
        assert!(!note.has_content());
    }

    #[test]
    fn has_content_ignores_whitespace() {
        let mut note = Note::with_text(GroupType::Plain, "   \n");
        assert!(!note.has_content());

        note.set_extended_text(" details ", Stamp::Touch);
        assert!(note.has_content());
    }

    #[test]
    fn setters_touch_unless_preserved() {
        let mut note = Note::new(GroupType::Todo);
        note.base_mut().record.last_modified = old_stamp();

        note.set_text("kept", Stamp::Preserve);
        assert_eq!(note.base().record.last_modified, old_stamp());

        note.set_text("changed", Stamp::Touch);
        assert!(note.base().record.last_modified > old_stamp());
    }

    #[test]
    fn plain_to_todo_keeps_common_fields() {
        let mut plain = Note::with_text(GroupType::Plain, "buy milk");
        plain.set_subject(Some("errands".to_string()), Stamp::Touch);
        plain.set_extended_text("two litres", Stamp::Touch);

        let todo = plain.convert(GroupType::Todo);
        let Note::Todo(inner) = &todo else {
            panic!("expected a todo note");
        };
        assert_eq!(todo.id(), plain.id());
        assert_eq!(todo.text(), "buy milk");
        assert_eq!(todo.subject(), Some("errands"));
        assert_eq!(todo.extended_text(), "two litres");
        assert_eq!(inner.priority, DEFAULT_TODO_PRIORITY);
        assert_eq!(inner.status, TODO_STATUS_OPEN);
        assert_eq!(inner.due_date, Some(Local::now().date_naive()));
    }

    #[test]
    fn todo_to_todo_is_full_clone() {
        let mut todo = TodoNote::new();
        todo.base.text = "file taxes".to_string();
        todo.set_priority(1, Stamp::Touch);
        todo.set_status(2, Stamp::Touch);
        todo.set_due_date(NaiveDate::from_ymd_opt(2024, 4, 15), Stamp::Touch);

        let copy = TodoNote::copy_from(&todo.clone().into_note());
        assert_eq!(copy, todo);
    }

    #[test]
    fn equality_is_by_id() {
        let note = Note::with_text(GroupType::Plain, "one");
        let mut edited = note.clone();
        edited.set_text("two", Stamp::Touch);
        assert_eq!(note, edited);
        assert_ne!(note, Note::with_text(GroupType::Plain, "one"));
    }

    #[test]
    fn event_round_trip_tolerates_unknown_fields() {
        let mut event = EventNote::new();
        event.base.text = "dentist".to_string();
        event.set_location("Main St", Stamp::Touch);
        event.set_recurrence("FREQ=YEARLY", true, Stamp::Touch);
        event.icon.icon = Some("tooth.png".to_string());

        let mut value = serde_json::to_value(&event).unwrap();
        value["addedInAFutureVersion"] = json!({"nested": [1, 2, 3]});

        let back: EventNote = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    /// Serializes, adds a field nobody knows about, and reads the value back.
    fn reread_with_unknown_field<T: Serialize + DeserializeOwned>(value: &T) -> T {
        let mut json = serde_json::to_value(value).unwrap();
        json["addedInAFutureVersion"] = json!({"nested": [1, 2, 3]});
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn every_variant_survives_unknown_fields() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 6);

        let mut plain = PlainNote::new();
        plain.base.text = "call the plumber".to_string();
        plain.base.subject = Some("house".to_string());
        plain.base.extended_text = "ask about the boiler".to_string();
        let target_group = crate::Group::new("Chores", GroupType::Todo);
        let target = Note::with_text(GroupType::Todo, "fix the tap");
        crate::link_to_note(&mut plain.base, &target_group, &target, crate::LinkType::Before)
            .unwrap();
        let back = reread_with_unknown_field(&plain);
        assert_eq!(back, plain);
        let snapshot = back.base.links[0].target_note.as_ref().unwrap();
        assert_eq!(snapshot.group_type(), GroupType::Todo);
        assert_eq!(snapshot.to_json().unwrap(), target.to_json().unwrap());
        assert_eq!(back.base.links[0].target_group, Some(target_group.info()));

        let mut day = DayNote::new();
        day.set_day(date, NaiveTime::from_hms_opt(8, 30, 0), Stamp::Touch);
        day.display_stamp = "Mon 6 May, 08:30".to_string();
        day.icon = IconFields {
            icon: Some("sun.png".to_string()),
            show_icon_on_month: true,
        };
        assert_eq!(reread_with_unknown_field(&day), day);

        let mut todo = TodoNote::new();
        todo.set_due_date(date, Stamp::Touch);
        todo.set_priority(1, Stamp::Touch);
        todo.set_status(2, Stamp::Touch);
        assert_eq!(reread_with_unknown_field(&todo), todo);

        let mut log = LogNote::new();
        log.base.text = "ran 5k".to_string();
        log.set_log_date(date, Stamp::Touch);
        assert_eq!(reread_with_unknown_field(&log), log);

        let mut goal = GoalNote::new();
        goal.set_title("Run a marathon", Stamp::Touch);
        goal.add_plan_step("buy shoes", Stamp::Touch);
        goal.add_plan_step("train", Stamp::Touch);
        goal.set_status(1, Stamp::Touch);
        goal.log_name = Some("Running".to_string());
        assert_eq!(reread_with_unknown_field(&goal), goal);

        let mut found = SearchResultNote::new();
        found.base.text = "fix the tap".to_string();
        found.note_date = date;
        found.origin_type = Some(GroupType::Todo);
        assert_eq!(reread_with_unknown_field(&found), found);
    }

    #[test]
    fn missing_fields_are_defaulted() {
        let note = Note::from_json(GroupType::Todo, json!({"text": "legacy"})).unwrap();
        let Note::Todo(todo) = note else {
            panic!("expected a todo note");
        };
        assert_eq!(todo.base.text, "legacy");
        assert_eq!(todo.priority, DEFAULT_TODO_PRIORITY);
        assert_eq!(todo.due_date, None);
    }

    #[test]
    fn note_date_depends_on_type() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10);

        let mut log = LogNote::new();
        log.set_log_date(date, Stamp::Touch);
        assert_eq!(log.into_note().note_date(), date);

        assert_eq!(Note::new(GroupType::Plain).note_date(), None);
        assert_eq!(Note::new(GroupType::Goal).note_date(), None);
    }

    #[test]
    fn set_note_date_targets_the_typed_field() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1);

        let mut event = Note::new(GroupType::Event);
        assert!(event.set_note_date(date, Stamp::Touch));
        assert_eq!(event.note_date(), date);

        let mut plain = Note::new(GroupType::Plain);
        plain.base_mut().record.last_modified = old_stamp();
        assert!(!plain.set_note_date(date, Stamp::Touch));
        assert_eq!(plain.base().record.last_modified, old_stamp());
    }

    #[test]
    fn normalize_preserves_timestamp() {
        let mut goal = GoalNote::new();
        goal.base.subject = Some("  ".to_string());
        goal.plan_steps = vec!["save".to_string(), "".to_string()];
        goal.base.record.last_modified = old_stamp();

        let mut note = goal.into_note();
        note.normalize(Stamp::Preserve);

        assert_eq!(note.subject(), None);
        assert_eq!(note.base().record.last_modified, old_stamp());
        let Note::Goal(goal) = note else {
            panic!("expected a goal note");
        };
        assert_eq!(goal.plan_steps, vec!["save".to_string()]);
    }

    #[test]
    fn search_result_origin_is_not_persisted() {
        let mut found = SearchResultNote::new();
        found.found_in = Some(GroupInfo::new("Chores", GroupType::Todo));
        found.found_in_file = Some(PathBuf::from("/tmp/todo_Chores.json"));

        let value = serde_json::to_value(&found).unwrap();
        let back: SearchResultNote = serde_json::from_value(value).unwrap();
        assert_eq!(back.found_in, None);
        assert_eq!(back.found_in_file, None);
        assert_eq!(back.base, found.base);
    }
}
