use std::{io::Write, path::Path};

use chrono::NaiveDate;
use log::{error, trace};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::{PimError, Result};

/// Parses a `YYYY-MM-DD` date given on the command line.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        error!("Invalid date '{}': {}", value, e);
        PimError::InvalidFormat {
            message: format!("invalid date '{}', expected YYYY-MM-DD", value),
        }
    })
}

// Helper method for optional dates; an empty string means "no date"
pub fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date(value).map(Some),
    }
}

/// Parses a note or link id.
pub fn parse_id(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| PimError::InvalidFormat {
        message: format!("invalid id '{}'", value),
    })
}

/// First non-empty line of `content`, cut to `max_len` characters.
pub fn content_preview(content: &str, max_len: usize) -> String {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim();

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let cut: String = first_line.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

/// Replaces `path` with `contents` through a temporary file in the same
/// directory. If anything fails the old file is left as it was.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file in {}: {}", dir.display(), e);
        PimError::Io(e)
    })?;
    temp_file.write_all(contents)?;
    temp_file.flush()?;

    trace!("Moving temporary file over {}", path.display());
    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        PimError::Io(e.error)
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_parse_or_fail_cleanly() {
        assert_eq!(
            parse_date(" 2024-02-29 ").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(matches!(
            parse_date("2023-02-29"),
            Err(PimError::InvalidFormat { .. })
        ));
        assert_eq!(parse_optional_date(Some("")).unwrap(), None);
        assert_eq!(parse_optional_date(None).unwrap(), None);
    }

    #[test]
    fn ids_parse() {
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(parse_id("42").is_err());
    }

    #[test]
    fn atomic_write_replaces_whole_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("defaults.todo.json");
        std::fs::write(&path, "old content that is longer").unwrap();

        write_atomically(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn failed_atomic_write_keeps_the_old_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "kept").unwrap();

        // a directory cannot be replaced by a file
        let blocked = dir.path().join("blocked");
        std::fs::create_dir_all(blocked.join("inner")).unwrap();
        assert!(write_atomically(&blocked, b"new").is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept");
        assert!(blocked.is_dir());
    }

    #[test]
    fn preview_is_char_safe() {
        assert_eq!(content_preview("\n\n  first line\nsecond", 100), "first line");
        assert_eq!(content_preview("héllo wörld", 5), "héllo...");
        assert_eq!(content_preview("", 10), "");
    }
}
