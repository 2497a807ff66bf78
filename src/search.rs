//! Searching across groups.
//!
//! Every note is first flattened into a [`FlattenedNote`] holding the union of
//! all variant fields, so the matcher never has to care which group type a
//! note came from. Matches are collected into a search-result [`Group`].
use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

use crate::{
    DurationUnit, Group, GroupInfo, GroupSettings, GroupStore, GroupType, Note, NoteBase, NoteKind,
    PimError, Result, SearchResultNote, SearchSettings,
};

/// Name given to result groups unless the caller picks another one.
pub const DEFAULT_RESULT_NAME: &str = "Search Results";

/// How two neighbouring terms are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Conjunction::And => left && right,
            Conjunction::Or => left || right,
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunction::And => f.write_str("AND"),
            Conjunction::Or => f.write_str("OR"),
        }
    }
}

/// One search term. A blank term takes no part in the expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchTerm {
    pub text: String,
    pub negate: bool,
}

impl SearchTerm {
    pub fn new(text: impl Into<String>, negate: bool) -> Self {
        SearchTerm {
            text: text.into(),
            negate,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// `None` for a blank term, otherwise whether the note satisfies it.
    fn evaluate(&self, note: &FlattenedNote) -> Option<bool> {
        if self.is_blank() {
            return None;
        }
        let needle = self.text.trim().to_lowercase();
        let base = &note.base;
        let found = base.text.to_lowercase().contains(&needle)
            || base.extended_text.to_lowercase().contains(&needle)
            || base
                .subject
                .as_ref()
                .is_some_and(|subject| subject.to_lowercase().contains(&needle));
        Some(found != self.negate)
    }
}

/// Inclusive date range; a missing bound is open on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        DateRange { from, to }
    }

    pub fn is_set(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |date: Option<NaiveDate>| date.map(|d| d.to_string()).unwrap_or_default();
        write!(f, "{}..{}", bound(self.from), bound(self.to))
    }
}

/// What to look for.
///
/// The shape is fixed: three terms, two conjunctions and at most one pair of
/// parentheses, around either the first two terms or the last two. Without
/// parentheses the expression is read left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchCriteria {
    pub terms: [SearchTerm; 3],
    pub conjunctions: [Conjunction; 2],
    /// `(term1 op term2) op term3`
    pub group_first_pair: bool,
    /// `term1 op (term2 op term3)`
    pub group_last_pair: bool,
    /// Applied to the type-specific date of each note
    pub note_date: DateRange,
    pub last_modified: DateRange,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria with `text` as the first term.
    pub fn term(text: impl Into<String>) -> Self {
        let mut criteria = Self::new();
        criteria.terms[0] = SearchTerm::new(text, false);
        criteria
    }

    pub fn not_term(text: impl Into<String>) -> Self {
        let mut criteria = Self::new();
        criteria.terms[0] = SearchTerm::new(text, true);
        criteria
    }

    pub fn and(self, text: impl Into<String>) -> Self {
        self.push(Conjunction::And, SearchTerm::new(text, false))
    }

    pub fn and_not(self, text: impl Into<String>) -> Self {
        self.push(Conjunction::And, SearchTerm::new(text, true))
    }

    pub fn or(self, text: impl Into<String>) -> Self {
        self.push(Conjunction::Or, SearchTerm::new(text, false))
    }

    pub fn or_not(self, text: impl Into<String>) -> Self {
        self.push(Conjunction::Or, SearchTerm::new(text, true))
    }

    pub fn group_first_pair(mut self) -> Self {
        self.group_first_pair = true;
        self
    }

    pub fn group_last_pair(mut self) -> Self {
        self.group_last_pair = true;
        self
    }

    pub fn note_date_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.note_date = DateRange::new(from, to);
        self
    }

    pub fn modified_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.last_modified = DateRange::new(from, to);
        self
    }

    /// Fills the second slot, then the third; a fourth term is ignored.
    fn push(mut self, conjunction: Conjunction, term: SearchTerm) -> Self {
        if self.terms[1].is_blank() {
            self.conjunctions[0] = conjunction;
            self.terms[1] = term;
        } else if self.terms[2].is_blank() {
            self.conjunctions[1] = conjunction;
            self.terms[2] = term;
        } else {
            warn!("Search criteria hold three terms already, ignoring '{}'", term.text);
        }
        self
    }

    pub fn has_terms(&self) -> bool {
        self.terms.iter().any(|term| !term.is_blank())
    }

    /// Rejects criteria that cannot be run.
    pub fn validate(&self) -> Result<()> {
        if !self.has_terms() && !self.note_date.is_set() && !self.last_modified.is_set() {
            return Err(PimError::EmptyCriteria);
        }
        if self.group_first_pair && self.group_last_pair {
            return Err(PimError::InvalidCriteria {
                message: "only one pair of terms can be grouped".to_string(),
            });
        }
        for (label, range) in [
            ("note date", self.note_date),
            ("last modified", self.last_modified),
        ] {
            if let (Some(from), Some(to)) = (range.from, range.to) {
                if from > to {
                    return Err(PimError::InvalidCriteria {
                        message: format!("{} range starts after it ends", label),
                    });
                }
            }
        }
        Ok(())
    }

    /// Whether a flattened note satisfies the terms and both date ranges.
    pub fn matches(&self, note: &FlattenedNote) -> bool {
        let [first, second, third] = [
            self.terms[0].evaluate(note),
            self.terms[1].evaluate(note),
            self.terms[2].evaluate(note),
        ];
        let [op1, op2] = self.conjunctions;

        let terms_hold = if self.group_last_pair && self.all_terms_live() {
            combine(first, op1, combine(second, op2, third))
        } else {
            combine(combine(first, op1, second), op2, third)
        }
        .unwrap_or(true);

        if !terms_hold {
            return false;
        }

        if self.note_date.is_set() {
            match note.note_date {
                Some(date) if self.note_date.contains(date) => {}
                _ => return false,
            }
        }

        if self.last_modified.is_set() {
            let modified = note.last_modified().with_timezone(&Local).date_naive();
            if !self.last_modified.contains(modified) {
                return false;
            }
        }

        true
    }

    /// Parentheses only take effect when none of the three terms is blank.
    /// A dropped term leaves the others joined by the operator in front of
    /// the later one.
    fn all_terms_live(&self) -> bool {
        self.terms.iter().all(|term| !term.is_blank())
    }

    /// One-line description stored on the result group.
    pub fn summary(&self) -> String {
        let quoted: Vec<String> = self
            .terms
            .iter()
            .map(|term| {
                let not = if term.negate { "NOT " } else { "" };
                format!("{}\"{}\"", not, term.text.trim())
            })
            .collect();
        let [op1, op2] = self.conjunctions;

        let mut summary = if self.all_terms_live() && self.group_first_pair {
            format!("({} {} {}) {} {}", quoted[0], op1, quoted[1], op2, quoted[2])
        } else if self.all_terms_live() && self.group_last_pair {
            format!("{} {} ({} {} {})", quoted[0], op1, quoted[1], op2, quoted[2])
        } else {
            let mut parts = Vec::new();
            for (index, term) in self.terms.iter().enumerate() {
                if term.is_blank() {
                    continue;
                }
                if parts.is_empty() {
                    parts.push(quoted[index].clone());
                } else {
                    parts.push(format!("{} {}", self.conjunctions[index - 1], quoted[index]));
                }
            }
            parts.join(" ")
        };
        if self.note_date.is_set() {
            summary.push_str(&format!("; note date {}", self.note_date));
        }
        if self.last_modified.is_set() {
            summary.push_str(&format!("; modified {}", self.last_modified));
        }
        summary.trim_start_matches("; ").to_string()
    }
}

/// Joins two optional results; a missing side drops out of the expression.
fn combine(left: Option<bool>, op: Conjunction, right: Option<bool>) -> Option<bool> {
    match (left, right) {
        (Some(l), Some(r)) => Some(op.apply(l, r)),
        (Some(l), None) => Some(l),
        (None, r) => r,
    }
}

/// Every field any note variant can carry, in one record.
///
/// Only built while a search runs.
#[derive(Debug, Clone, Default)]
pub struct FlattenedNote {
    pub source_type: Option<GroupType>,
    pub base: NoteBase,
    /// The type-specific date, see [`Note::note_date`]
    pub note_date: Option<NaiveDate>,

    pub icon: Option<String>,
    pub show_icon_on_month: bool,

    pub day: Option<NaiveDate>,
    pub time_of_day: Option<NaiveTime>,
    pub display_stamp: String,

    pub location: String,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub recurrence: String,
    pub retain_past: bool,
    pub duration_value: Option<u32>,
    pub duration_unit: Option<DurationUnit>,

    pub due_date: Option<NaiveDate>,
    pub priority: Option<i32>,
    pub status: Option<i32>,

    pub log_date: Option<NaiveDate>,

    pub title: String,
    pub plan_steps: Vec<String>,
    pub log_name: Option<String>,
}

impl FlattenedNote {
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.base.record.last_modified
    }
}

impl From<&Note> for FlattenedNote {
    fn from(note: &Note) -> Self {
        let mut flat = FlattenedNote {
            source_type: Some(note.group_type()),
            base: note.base().clone(),
            note_date: note.note_date(),
            ..FlattenedNote::default()
        };

        match note {
            Note::Plain(_) => {}
            Note::Day(day) => {
                flat.icon = day.icon.icon.clone();
                flat.show_icon_on_month = day.icon.show_icon_on_month;
                flat.day = day.day;
                flat.time_of_day = day.time_of_day;
                flat.display_stamp = day.display_stamp.clone();
            }
            Note::Event(event) => {
                flat.icon = event.icon.icon.clone();
                flat.show_icon_on_month = event.icon.show_icon_on_month;
                flat.location = event.location.clone();
                flat.start_date = event.start_date;
                flat.start_time = event.start_time;
                flat.end_date = event.end_date;
                flat.end_time = event.end_time;
                flat.recurrence = event.recurrence.clone();
                flat.retain_past = event.retain_past;
                flat.duration_value = Some(event.duration_value);
                flat.duration_unit = Some(event.duration_unit);
            }
            Note::Todo(todo) => {
                flat.icon = todo.icon.icon.clone();
                flat.show_icon_on_month = todo.icon.show_icon_on_month;
                flat.due_date = todo.due_date;
                flat.priority = Some(todo.priority);
                flat.status = Some(todo.status);
            }
            Note::Log(log) => {
                flat.log_date = log.log_date;
            }
            Note::Goal(goal) => {
                flat.title = goal.title.clone();
                flat.plan_steps = goal.plan_steps.clone();
                flat.status = Some(goal.status);
                flat.log_name = goal.log_name.clone();
            }
            Note::SearchResult(found) => {
                flat.source_type = found.origin_type.or(flat.source_type);
            }
        }

        flat
    }
}

/// Runs searches against the groups of a [`GroupStore`].
pub struct SearchEngine<'a, S: GroupStore + ?Sized> {
    store: &'a S,
    result_name: String,
}

impl<'a, S: GroupStore + ?Sized> SearchEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        SearchEngine {
            store,
            result_name: DEFAULT_RESULT_NAME.to_string(),
        }
    }

    /// Names the result group.
    pub fn with_result_name(mut self, name: impl Into<String>) -> Self {
        self.result_name = name.into();
        self
    }

    /// Scans `groups` in the given order and returns the matches as a new
    /// search-result group, in scan order.
    ///
    /// A group that cannot be loaded is skipped with a warning.
    pub fn search(&self, groups: &[GroupInfo], criteria: &SearchCriteria) -> Result<Group> {
        criteria.validate()?;
        info!(
            "Searching {} groups for: {}",
            groups.len(),
            criteria.summary()
        );

        let mut result = Group::new(self.result_name.clone(), GroupType::SearchResult);
        result.properties.settings = GroupSettings::SearchResult(SearchSettings {
            criteria: criteria.summary(),
        });

        for info in groups {
            let group = match self.store.load_group(info) {
                Ok(group) => group,
                Err(e) => {
                    warn!("Skipping {} during search: {}", info, e);
                    continue;
                }
            };

            let before = result.notes.len();
            for note in &group.notes {
                let flat = FlattenedNote::from(note);
                if !criteria.matches(&flat) {
                    continue;
                }
                trace!("Note {} in {} matched", note.id(), info);
                result.notes.push(self.wrap(info, flat).into_note());
            }
            debug!(
                "{} matches in {}",
                result.notes.len() - before,
                info
            );
        }

        info!("Search found {} matching notes", result.notes.len());
        Ok(result)
    }

    /// Searches every group in the store except earlier search results.
    pub fn search_all(&self, criteria: &SearchCriteria) -> Result<Group> {
        criteria.validate()?;
        let groups: Vec<GroupInfo> = self
            .store
            .list_all()?
            .into_iter()
            .filter(|info| info.group_type != GroupType::SearchResult)
            .collect();
        self.search(&groups, criteria)
    }

    fn wrap(&self, info: &GroupInfo, flat: FlattenedNote) -> SearchResultNote {
        SearchResultNote {
            base: flat.base,
            note_date: flat.note_date,
            origin_type: flat.source_type,
            found_in: Some(info.clone()),
            found_in_file: self.store.location(info),
        }
    }
}
