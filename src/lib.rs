//! Personal information manager core library
//!
//! Typed groups of notes (plain notes, day notes, events, todos, logs, goals
//! and saved search results), typed links between notes and groups, a
//! pluggable group store with a file-backed implementation, a three-term
//! search engine and point-in-time archives of the data directory.

mod archive;
mod cli;
mod config;
mod defaults;
mod errors;
mod group;
mod helper;
mod keeper;
mod link;
mod note;
mod record;
mod search;
mod storage;
mod types;

// Re-export key components
pub use archive::*;
pub use cli::*;
pub use config::*;
pub use defaults::*;
pub use errors::*;
pub use group::*;
pub use helper::*;
pub use keeper::*;
pub use link::*;
pub use note::*;
pub use record::*;
pub use search::*;
pub use storage::*;
pub use types::*;
