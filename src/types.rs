//! Shared result type, summaries and the command-line command tree.
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::PimError;

/// A specialized Result type for pimgroups operations.
pub type Result<T> = std::result::Result<T, PimError>;

/// Summary of an archive restoration
#[derive(Debug, Clone)]
pub struct RestoreArchiveSummary {
    /// Path to the archive that was restored
    pub archive_file: PathBuf,
    /// Number of JSON documents found in the archive
    pub total_files: usize,
    pub files_restored: usize,
    /// Files left alone because they already existed
    pub files_skipped: usize,
    pub failed_files: Vec<(String, String)>, // (file name, error message)
}

/// Identifies a group on the command line
#[derive(Args, Debug, Clone)]
pub struct GroupArg {
    /// Group type: note, todo, event, day, log, goal or search
    #[clap(short = 'g', long = "type", value_parser = parse_group_type)]
    pub group_type: crate::GroupType,

    /// Display name of the group
    pub name: String,
}

impl GroupArg {
    pub fn info(&self) -> crate::GroupInfo {
        crate::GroupInfo::new(self.name.clone(), self.group_type)
    }
}

fn parse_group_type(value: &str) -> std::result::Result<crate::GroupType, String> {
    crate::GroupType::from_prefix(value).ok_or_else(|| {
        format!(
            "unknown group type '{}', expected one of: note, todo, event, day, log, goal, search",
            value
        )
    })
}

/// Available subcommands for the pim application
#[derive(Subcommand)]
pub enum Commands {
    /// Create, list, show, rename, copy or delete groups
    #[clap(subcommand)]
    Group(GroupCommand),

    /// Add, edit, remove or convert notes
    #[clap(subcommand)]
    Note(NoteCommand),

    /// Add, remove or list links
    #[clap(subcommand)]
    Link(LinkCommand),

    /// Search notes across groups
    Search(SearchOptions),

    /// Create, list or restore archives of the whole data directory
    #[clap(subcommand)]
    Archive(ArchiveCommand),

    /// Configuration management
    Config {
        /// Show current configuration
        #[clap(short = 'S', long)]
        show: bool,

        /// Update a configuration setting (key=value)
        #[clap(short, long)]
        set: Option<String>,

        /// Reset configuration to defaults
        #[clap(short, long)]
        reset: bool,
    },
}

#[derive(Subcommand)]
pub enum GroupCommand {
    /// Create an empty group
    New(GroupArg),

    /// List groups, optionally of one type
    List {
        #[clap(short = 'g', long = "type", value_parser = parse_group_type)]
        group_type: Option<crate::GroupType>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Show the notes of a group
    Show {
        #[clap(flatten)]
        group: GroupArg,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,

        /// Show extended text and links
        #[clap(short, long)]
        detailed: bool,
    },

    /// Rename a group
    Rename {
        #[clap(flatten)]
        group: GroupArg,

        /// New display name
        new_name: String,
    },

    /// Save a copy of a group under a new name
    Copy {
        #[clap(flatten)]
        group: GroupArg,

        /// Name of the copy
        new_name: String,
    },

    /// Delete a group
    Delete {
        #[clap(flatten)]
        group: GroupArg,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum NoteCommand {
    /// Add a note to a group
    Add {
        #[clap(flatten)]
        group: GroupArg,

        /// Note text
        #[clap(short, long)]
        text: String,

        /// Subject, if different from the group default
        #[clap(short, long)]
        subject: Option<String>,

        /// Long-form text
        #[clap(short = 'x', long)]
        extended: Option<String>,

        /// Type-specific date (due date, day, start date or log date), YYYY-MM-DD
        #[clap(short, long)]
        date: Option<String>,
    },

    /// Edit a note
    Edit(EditNoteOptions),

    /// Remove a note
    Remove {
        #[clap(flatten)]
        group: GroupArg,

        /// Id of the note
        id: String,
    },

    /// Move a note into a group of another type, converting it
    Convert {
        #[clap(flatten)]
        group: GroupArg,

        /// Id of the note
        id: String,

        /// Type of the target group
        #[clap(long = "to-type", value_parser = parse_group_type)]
        to_type: crate::GroupType,

        /// Name of the target group
        #[clap(long = "to")]
        to_name: String,
    },
}

#[derive(Args)]
pub struct EditNoteOptions {
    #[clap(flatten)]
    pub group: GroupArg,

    /// Id of the note
    pub id: String,

    /// New text
    #[clap(short, long)]
    pub text: Option<String>,

    /// New subject; an empty value resets it to the group default
    #[clap(short, long)]
    pub subject: Option<String>,

    /// New long-form text
    #[clap(short = 'x', long)]
    pub extended: Option<String>,

    /// New type-specific date, YYYY-MM-DD
    #[clap(short, long)]
    pub date: Option<String>,

    /// Edit the long-form text in the configured editor
    #[clap(short, long)]
    pub editor: bool,
}

#[derive(Subcommand)]
pub enum LinkCommand {
    /// Link a note (or with --group-link, the group itself) to another note or group
    Add {
        #[clap(flatten)]
        group: GroupArg,

        /// Id of the source note; omit with --group-link
        #[clap(long)]
        note: Option<String>,

        /// Attach the link to the group instead of a note
        #[clap(long)]
        group_link: bool,

        /// Type of the target group
        #[clap(long = "to-type", value_parser = parse_group_type)]
        to_type: crate::GroupType,

        /// Name of the target group
        #[clap(long = "to")]
        to_name: String,

        /// Id of the target note; omit to link the whole group
        #[clap(long = "to-note")]
        to_note: Option<String>,

        /// related, depending-on, depended-on-by, before, during or after
        #[clap(short, long, default_value = "related", value_parser = parse_link_type)]
        kind: crate::LinkType,
    },

    /// Remove a link by its own id
    Remove {
        #[clap(flatten)]
        group: GroupArg,

        /// Id of the note holding the link; omit for group-level links
        #[clap(long)]
        note: Option<String>,

        /// Id of the link
        link: String,
    },

    /// List the links of a note, and the links pointing at it
    List {
        #[clap(flatten)]
        group: GroupArg,

        /// Id of the note; omit for the group itself
        #[clap(long)]
        note: Option<String>,
    },
}

fn parse_link_type(value: &str) -> std::result::Result<crate::LinkType, String> {
    let normalized = value.trim().to_lowercase().replace(['-', '_', ' '], "");
    crate::LinkType::ALL
        .into_iter()
        .find(|t| format!("{:?}", t).to_lowercase() == normalized)
        .ok_or_else(|| format!("unknown link type '{}'", value))
}

#[derive(Args)]
pub struct SearchOptions {
    /// First term
    #[clap(default_value = "")]
    pub term1: String,

    /// Negate the first term
    #[clap(long)]
    pub not1: bool,

    /// Second term, joined with --and2 (default) or --or2
    #[clap(long)]
    pub term2: Option<String>,

    #[clap(long)]
    pub or2: bool,

    #[clap(long)]
    pub not2: bool,

    /// Third term, joined with --and3 (default) or --or3
    #[clap(long)]
    pub term3: Option<String>,

    #[clap(long)]
    pub or3: bool,

    #[clap(long)]
    pub not3: bool,

    /// Evaluate (term1 op term2) first
    #[clap(long, conflicts_with = "group_last")]
    pub group_first: bool,

    /// Evaluate (term2 op term3) first
    #[clap(long)]
    pub group_last: bool,

    /// Earliest note date, YYYY-MM-DD
    #[clap(long)]
    pub from: Option<String>,

    /// Latest note date, YYYY-MM-DD
    #[clap(long)]
    pub to: Option<String>,

    /// Earliest modification date, YYYY-MM-DD
    #[clap(long)]
    pub modified_from: Option<String>,

    /// Latest modification date, YYYY-MM-DD
    #[clap(long)]
    pub modified_to: Option<String>,

    /// Only search groups of this type
    #[clap(short = 'g', long = "type", value_parser = parse_group_type)]
    pub group_type: Option<crate::GroupType>,

    /// Keep the results as a search group with this name
    #[clap(long)]
    pub save_as: Option<String>,

    /// Format output as JSON
    #[clap(short, long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ArchiveCommand {
    /// Archive the whole data directory now
    Create,

    /// List archives, newest first
    List,

    /// Restore an archive by file name (archive_YYYYMMDD_HHMMSS.zip)
    Restore {
        archive: String,

        /// Overwrite files that already exist
        #[clap(short, long)]
        overwrite: bool,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}
