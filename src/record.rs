//! Identity and modification time shared by notes and group properties.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a setter should move `lastModified` forward.
///
/// Live edits pass [`Stamp::Touch`]. Anything that runs while a group is being
/// read back from storage passes [`Stamp::Preserve`] so the timestamps on disk
/// survive the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stamp {
    Touch,
    Preserve,
}

/// Common root of every persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    /// Assigned at creation, never changed afterwards
    pub id: Uuid,
    /// Time of the last mutating setter call
    pub last_modified: DateTime<Utc>,
}

impl Record {
    /// A fresh record: new id, modified now.
    pub fn new() -> Self {
        Record {
            id: Uuid::new_v4(),
            last_modified: Utc::now(),
        }
    }

    pub fn touch(&mut self, stamp: Stamp) {
        if stamp == Stamp::Touch {
            self.last_modified = Utc::now();
        }
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserve_leaves_timestamp_alone() {
        let mut record = Record::new();
        let before = record.last_modified - chrono::Duration::days(3);
        record.last_modified = before;

        record.touch(Stamp::Preserve);
        assert_eq!(record.last_modified, before);

        record.touch(Stamp::Touch);
        assert!(record.last_modified > before);
    }

    #[test]
    fn missing_fields_get_defaults() {
        let record: Record = serde_json::from_str("{}").unwrap();
        assert!(!record.id.is_nil());
    }
}
