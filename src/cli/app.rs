//! CLI module for the pim application
//!
//! This module handles the command-line interface for interacting with the
//! group store, the link registry, the search engine and the archives.
use std::{
    fs::{read_to_string, OpenOptions},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
};

use log::{info, warn};
use shell_words::split;
use tempfile::Builder;
use uuid::Uuid;

use crate::{
    content_preview, encode_group, inbound_links, link_to_group, link_to_note,
    parse_date, parse_id, parse_optional_date, remove_link, resolve, validate_group_name,
    ArchiveCommand, ArchiveId, ArchiveManager, Commands, Config, Conjunction, EditNoteOptions,
    FileGroupStore, Group, GroupArg, GroupCommand, GroupInfo, GroupKeeper, GroupSettings,
    GroupStore, GroupType, LinkCommand, LinkTarget, LinkType, Linkable, Note, NoteCommand,
    NoteDefaults, PimError, Result, SearchCriteria, SearchEngine, SearchOptions, SearchTerm, Stamp,
};

/// CLI Application handler - processes CLI commands against a file-backed store
pub struct App {
    store: FileGroupStore,

    /// Groups touched by the current command
    keeper: GroupKeeper,

    defaults: NoteDefaults,

    /// Application configuration
    config: Config,

    /// Where `config` is read from and written back to
    config_path: PathBuf,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Opens the data directory named by `config`
    pub fn new(config: Config, config_path: PathBuf, verbose: bool) -> Result<Self> {
        let store = FileGroupStore::open(&config.data_dir)?;
        let defaults = NoteDefaults::load(store.data_dir());
        Ok(Self {
            store,
            keeper: GroupKeeper::new(),
            defaults,
            config,
            config_path,
            verbose,
        })
    }

    /// Run the CLI application with the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Group(command) => self.handle_group(command),
            Commands::Note(command) => self.handle_note(command),
            Commands::Link(command) => self.handle_link(command),
            Commands::Search(options) => self.handle_search(options),
            Commands::Archive(command) => self.handle_archive(command),
            Commands::Config { show, set, reset } => self.handle_config(show, set, reset),
        }
    }

    fn handle_group(&mut self, command: GroupCommand) -> Result<()> {
        match command {
            GroupCommand::New(group) => self.create_group(&group),
            GroupCommand::List { group_type, json } => self.list_groups(group_type, json),
            GroupCommand::Show {
                group,
                json,
                detailed,
            } => {
                let group = self.keeper.get_or_load(&self.store, &group.info())?.clone();
                if json {
                    println!("{}", encode_group(&group)?);
                } else {
                    self.display_group_text(&group, detailed);
                }
                Ok(())
            }
            GroupCommand::Rename { group, new_name } => {
                self.keeper.rename(&self.store, &group.info(), &new_name)?;
                println!("Renamed {} to '{}'", group.info(), new_name);
                Ok(())
            }
            GroupCommand::Copy { group, new_name } => {
                validate_group_name(&new_name)?;
                let copy = self.keeper.save_as(&self.store, &group.info(), &new_name)?;
                println!("Copied {} to {}", group.info(), copy.info());
                Ok(())
            }
            GroupCommand::Delete { group, force } => self.delete_group(&group, force),
        }
    }

    fn create_group(&mut self, group: &GroupArg) -> Result<()> {
        let info = group.info();
        validate_group_name(&info.name)?;
        if self.store.exists(&info)? {
            return Err(PimError::GroupAlreadyExists {
                name: info.to_string(),
            });
        }

        let new_group = Group::new(info.name.clone(), info.group_type);
        self.store.save_group(&new_group)?;

        // a goal comes with its log
        if let GroupSettings::Goal(goal) = &new_group.properties.settings {
            if let Some(log_properties) = &goal.log_properties {
                let log = Group::from_parts((**log_properties).clone(), Vec::new());
                if !self.store.exists(&log.info())? {
                    self.store.save_group(&log)?;
                    println!("Created {}", log.info());
                }
            }
        }

        println!("Created {}", info);
        Ok(())
    }

    fn list_groups(&self, group_type: Option<GroupType>, json: bool) -> Result<()> {
        let infos: Vec<GroupInfo> = match group_type {
            Some(group_type) => self
                .store
                .list_group_names(group_type)?
                .into_iter()
                .map(|name| GroupInfo::new(name, group_type))
                .collect(),
            None => self.store.list_all()?,
        };

        if json {
            let listed: Vec<serde_json::Value> = infos
                .iter()
                .map(|info| {
                    serde_json::json!({
                        "name": info.name,
                        "groupType": info.group_type,
                        "file": self.store.location(info),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listed)?);
            return Ok(());
        }

        if infos.is_empty() {
            println!("No groups found.");
            return Ok(());
        }

        let mut current_type = None;
        for info in &infos {
            if current_type != Some(info.group_type) {
                current_type = Some(info.group_type);
                println!("{}", console::style(info.group_type).cyan().bold());
            }
            if self.verbose {
                let location = self
                    .store
                    .location(info)
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                println!("  {}  {}", info.name, console::style(location).dim());
            } else {
                println!("  {}", info.name);
            }
        }
        println!(
            "\nFound {} group{}",
            infos.len(),
            if infos.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn delete_group(&mut self, group: &GroupArg, force: bool) -> Result<()> {
        let info = group.info();
        let loaded = self.keeper.get_or_load(&self.store, &info)?;
        let note_count = loaded.notes.len();

        if !force {
            println!("You are about to delete the following group:");
            println!("Name:   {}", info.name);
            println!("Type:   {}", info.group_type);
            println!("Notes:  {}", note_count);
            println!("\nThis action cannot be undone!");
            if !self.confirm("Are you sure you want to delete this group?")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.store.delete_group(&info)?;
        self.keeper.invalidate(&info.name);
        println!("Group {} has been permanently deleted.", info);
        Ok(())
    }

    fn handle_note(&mut self, command: NoteCommand) -> Result<()> {
        match command {
            NoteCommand::Add {
                group,
                text,
                subject,
                extended,
                date,
            } => {
                let info = group.info();
                let date = parse_optional_date(date.as_deref())?;

                let mut note = Note::new(info.group_type);
                self.defaults.apply(&mut note);
                note.set_text(text, Stamp::Touch);
                note.set_subject(subject.filter(|s| !s.trim().is_empty()), Stamp::Touch);
                if let Some(extended) = extended {
                    note.set_extended_text(extended, Stamp::Touch);
                }
                if date.is_some() && !note.set_note_date(date, Stamp::Touch) {
                    return Err(dateless(info.group_type));
                }

                let id = self.keeper.get_or_load(&self.store, &info)?.add_note(note);
                self.keeper.save(&self.store, &info.name)?;
                println!("Note created with ID: {}", id);
                Ok(())
            }
            NoteCommand::Edit(options) => self.edit_note(options),
            NoteCommand::Remove { group, id } => {
                let info = group.info();
                let id = parse_id(&id)?;
                let removed = self
                    .keeper
                    .get_or_load(&self.store, &info)?
                    .remove_note(id)
                    .ok_or_else(|| PimError::NoteNotFound { id: id.to_string() })?;
                self.keeper.save(&self.store, &info.name)?;
                println!(
                    "Removed note {} ({})",
                    removed.id(),
                    content_preview(removed.text(), 40)
                );
                Ok(())
            }
            NoteCommand::Convert {
                group,
                id,
                to_type,
                to_name,
            } => self.convert_note(&group.info(), &id, &GroupInfo::new(to_name, to_type)),
        }
    }

    fn edit_note(&mut self, options: EditNoteOptions) -> Result<()> {
        let info = options.group.info();
        let id = parse_id(&options.id)?;
        let date = match options.date.as_deref() {
            Some(value) => Some(parse_optional_date(Some(value))?),
            None => None,
        };

        let current = self
            .keeper
            .get_or_load(&self.store, &info)?
            .find_note(id)
            .cloned()
            .ok_or_else(|| PimError::NoteNotFound { id: id.to_string() })?;

        let extended = if options.editor {
            let title = content_preview(current.text(), 60);
            Some(self.open_editor_with_content(&title, current.extended_text())?)
        } else {
            options.extended
        };

        if options.text.is_none()
            && options.subject.is_none()
            && extended.is_none()
            && date.is_none()
        {
            return Err(PimError::ApplicationError {
                message: "Nothing to change: give --text, --subject, --extended, --date or --editor"
                    .to_string(),
            });
        }

        let group = self.keeper.get_or_load(&self.store, &info)?;
        let note = group
            .find_note_mut(id)
            .ok_or_else(|| PimError::NoteNotFound { id: id.to_string() })?;

        if let Some(date) = date {
            if !note.set_note_date(date, Stamp::Touch) {
                return Err(dateless(info.group_type));
            }
        }
        if let Some(text) = options.text {
            note.set_text(text, Stamp::Touch);
        }
        if let Some(subject) = options.subject {
            let subject = Some(subject).filter(|s| !s.trim().is_empty());
            note.set_subject(subject, Stamp::Touch);
        }
        if let Some(extended) = extended {
            note.set_extended_text(extended, Stamp::Touch);
        }
        group.properties.record.touch(Stamp::Touch);

        self.keeper.save(&self.store, &info.name)?;
        println!("Note {} updated successfully", id);
        Ok(())
    }

    /// Copies the note into the target group first, then removes it from the
    /// source, so a failure part way leaves a duplicate rather than a loss.
    fn convert_note(&mut self, source: &GroupInfo, id: &str, target: &GroupInfo) -> Result<()> {
        if source == target {
            return Err(PimError::ApplicationError {
                message: format!("Note is already in {}", target),
            });
        }
        let id = parse_id(id)?;

        let note = self
            .keeper
            .get_or_load(&self.store, source)?
            .find_note(id)
            .cloned()
            .ok_or_else(|| PimError::NoteNotFound { id: id.to_string() })?;

        self.keeper.get_or_load(&self.store, target)?.add_note(note);
        self.keeper.save(&self.store, &target.name)?;

        self.keeper.get_or_load(&self.store, source)?.remove_note(id);
        self.keeper.save(&self.store, &source.name)?;

        println!("Moved note {} from {} to {}", id, source, target);
        Ok(())
    }

    fn handle_link(&mut self, command: LinkCommand) -> Result<()> {
        match command {
            LinkCommand::Add {
                group,
                note,
                group_link,
                to_type,
                to_name,
                to_note,
                kind,
            } => {
                let source_note = match (note, group_link) {
                    (Some(_), true) => {
                        return Err(PimError::ApplicationError {
                            message: "Use either --note or --group-link, not both".to_string(),
                        })
                    }
                    (None, false) => {
                        return Err(PimError::ApplicationError {
                            message: "Name the source note with --note, or pass --group-link"
                                .to_string(),
                        })
                    }
                    (Some(id), false) => Some(parse_id(&id)?),
                    (None, true) => None,
                };
                let target_info = GroupInfo::new(to_name, to_type);
                let target_note = to_note.as_deref().map(parse_id).transpose()?;
                self.add_link(&group.info(), source_note, &target_info, target_note, kind)
            }
            LinkCommand::Remove { group, note, link } => {
                let info = group.info();
                let note = note.as_deref().map(parse_id).transpose()?;
                let link = parse_id(&link)?;

                let source = self.keeper.get_or_load(&self.store, &info)?;
                let removed = match note {
                    Some(note_id) => {
                        let note = source
                            .find_note_mut(note_id)
                            .ok_or_else(|| PimError::NoteNotFound {
                                id: note_id.to_string(),
                            })?;
                        let removed = remove_link(note, link);
                        if removed {
                            note.base_mut().record.touch(Stamp::Touch);
                        }
                        removed
                    }
                    None => remove_link(&mut source.properties, link),
                };
                if !removed {
                    return Err(PimError::ApplicationError {
                        message: format!("No link {} found", link),
                    });
                }
                source.properties.record.touch(Stamp::Touch);
                self.keeper.save(&self.store, &info.name)?;
                println!("Link {} removed", link);
                Ok(())
            }
            LinkCommand::List { group, note } => {
                let note = note.as_deref().map(parse_id).transpose()?;
                self.list_links(&group.info(), note)
            }
        }
    }

    fn add_link(
        &mut self,
        source_info: &GroupInfo,
        source_note: Option<Uuid>,
        target_info: &GroupInfo,
        target_note: Option<Uuid>,
        kind: LinkType,
    ) -> Result<()> {
        let target_group = self.keeper.get_or_load(&self.store, target_info)?.clone();
        let target_note = match target_note {
            Some(id) => Some(
                target_group
                    .find_note(id)
                    .cloned()
                    .ok_or_else(|| PimError::NoteNotFound { id: id.to_string() })?,
            ),
            None => None,
        };

        let source = self.keeper.get_or_load(&self.store, source_info)?;
        let link = match source_note {
            Some(id) => {
                let note = source
                    .find_note_mut(id)
                    .ok_or_else(|| PimError::NoteNotFound { id: id.to_string() })?;
                let link = attach(note, &target_group, target_note.as_ref(), kind)?;
                note.base_mut().record.touch(Stamp::Touch);
                link
            }
            None => attach(&mut source.properties, &target_group, target_note.as_ref(), kind)?,
        };
        source.properties.record.touch(Stamp::Touch);

        self.keeper.save(&self.store, &source_info.name)?;
        println!("Link created with ID: {}", link.id);
        Ok(())
    }

    fn list_links(&mut self, info: &GroupInfo, note: Option<Uuid>) -> Result<()> {
        let group = self.keeper.get_or_load(&self.store, info)?.clone();
        let outgoing: Vec<LinkTarget> = match note {
            Some(id) => group
                .find_note(id)
                .ok_or_else(|| PimError::NoteNotFound { id: id.to_string() })?
                .links()
                .to_vec(),
            None => group.properties.links().to_vec(),
        };

        println!("{}", console::style("Links from here").bold());
        if outgoing.is_empty() {
            println!("  (none)");
        }
        for link in &outgoing {
            match resolve(&self.store, link) {
                Ok(resolved) => {
                    let target = match &resolved.note {
                        Some(note) => format!(
                            "{} / {}",
                            resolved.group.info(),
                            content_preview(note.text(), 50)
                        ),
                        None => resolved.group.info().to_string(),
                    };
                    println!(
                        "  {} {} {}",
                        link.id,
                        console::style(link.link_type).cyan(),
                        target
                    );
                }
                Err(e) => {
                    let snapshot = link
                        .target_note
                        .as_ref()
                        .map(|note| content_preview(note.text(), 50))
                        .unwrap_or_default();
                    println!(
                        "  {} {} {} {}",
                        link.id,
                        console::style(link.link_type).cyan(),
                        snapshot,
                        console::style(format!("(broken: {})", e)).red()
                    );
                }
            }
        }

        let groups = self.load_all_groups()?;
        let inbound = inbound_links(&groups, group.properties.id(), note);
        println!("{}", console::style("Links to here").bold());
        if inbound.is_empty() {
            println!("  (none)");
        }
        for link in inbound {
            let source = match link.source_note {
                Some(note_id) => format!("{} / note {}", link.source_group, note_id),
                None => link.source_group.to_string(),
            };
            println!(
                "  {} {} {}",
                link.link_id,
                console::style(link.link_type).cyan(),
                source
            );
        }
        Ok(())
    }

    fn load_all_groups(&self) -> Result<Vec<Group>> {
        let mut groups = Vec::new();
        for info in self.store.list_all()? {
            match self.store.load_group(&info) {
                Ok(group) => groups.push(group),
                Err(e) => warn!("Skipping {}: {}", info, e),
            }
        }
        Ok(groups)
    }

    fn handle_search(&mut self, options: SearchOptions) -> Result<()> {
        let criteria = build_criteria(&options)?;
        let mut engine = SearchEngine::new(&self.store);
        if let Some(name) = &options.save_as {
            validate_group_name(name)?;
            engine = engine.with_result_name(name.clone());
        }

        let result = match options.group_type {
            Some(group_type) => {
                let infos: Vec<GroupInfo> = self
                    .store
                    .list_group_names(group_type)?
                    .into_iter()
                    .map(|name| GroupInfo::new(name, group_type))
                    .collect();
                engine.search(&infos, &criteria)?
            }
            None => engine.search_all(&criteria)?,
        };

        if options.json {
            self.display_results_json(&result)?;
        } else {
            self.display_results_text(&result, &criteria);
        }

        if options.save_as.is_some() {
            self.store.save_group(&result)?;
            self.keeper.invalidate(result.name());
            info!("Search results saved as {}", result.info());
            println!("Results saved as {}", result.info());
        }
        Ok(())
    }

    fn display_results_json(&self, result: &Group) -> Result<()> {
        let found: Vec<serde_json::Value> = result
            .notes
            .iter()
            .map(|note| {
                let (found_in, file, date) = match note {
                    Note::SearchResult(found) => {
                        (found.found_in.clone(), found.found_in_file.clone(), found.note_date)
                    }
                    _ => (None, None, None),
                };
                serde_json::json!({
                    "id": note.id(),
                    "text": note.text(),
                    "subject": note.subject(),
                    "noteDate": date,
                    "lastModified": note.base().record.last_modified.to_rfc3339(),
                    "foundIn": found_in,
                    "file": file,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&found)?);
        Ok(())
    }

    fn display_results_text(&self, result: &Group, criteria: &SearchCriteria) {
        if result.notes.is_empty() {
            println!("No notes found matching: {}", criteria.summary());
            return;
        }

        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for note in &result.notes {
            let origin = match note {
                Note::SearchResult(found) => found
                    .found_in
                    .as_ref()
                    .map(|info| info.to_string())
                    .unwrap_or_default(),
                _ => String::new(),
            };
            let date = note
                .note_date()
                .map(|date| format!(" {}", date))
                .unwrap_or_default();
            println!(
                "{}{} {}",
                console::style(origin).cyan(),
                date,
                content_preview(note.text(), term_width.saturating_sub(30).max(20))
            );
            if self.verbose {
                println!("    {}", console::style(note.id()).dim());
            }
        }
        println!(
            "\nFound {} note{}",
            result.notes.len(),
            if result.notes.len() == 1 { "" } else { "s" }
        );
    }

    /// Display a group in text format
    fn display_group_text(&self, group: &Group, detailed: bool) {
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        println!(
            "{} ({}) | Modified: {}",
            console::style(group.name()).bold(),
            group.group_type(),
            group.properties.record.last_modified.format("%Y-%m-%d %H:%M")
        );
        if group.notes.is_empty() {
            println!("No notes in this group.");
            return;
        }

        for (i, note) in group.notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            let date = note
                .note_date()
                .map(|date| format!(" | {}", date))
                .unwrap_or_default();
            println!("ID: {}{}", note.id(), date);
            if let Some(subject) = note.subject() {
                println!("Subject: {}", console::style(subject).cyan());
            }
            println!("{}", console::style(note.text()).bold());

            if detailed {
                if !note.extended_text().is_empty() {
                    println!("\n{}", note.extended_text());
                }
                for link in note.links() {
                    let target = link
                        .target_group
                        .as_ref()
                        .map(|info| info.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    println!("  -> {} {} ({})", link.link_type, target, link.id);
                }
            } else {
                let preview = content_preview(note.extended_text(), 100);
                if !preview.is_empty() {
                    println!("{}", preview);
                }
            }
        }

        println!(
            "\n{} note{}",
            group.notes.len(),
            if group.notes.len() == 1 { "" } else { "s" }
        );
    }

    fn handle_archive(&mut self, command: ArchiveCommand) -> Result<()> {
        let manager = ArchiveManager::new(
            &self.config.data_dir,
            &self.config.archive_dir,
            self.config.max_archives,
        );

        match command {
            ArchiveCommand::Create => {
                let id = manager.create()?;
                println!("Archive created: {}", manager.path_of(id).display());
            }
            ArchiveCommand::List => {
                let ids = manager.list()?;
                if ids.is_empty() {
                    println!("No archives found.");
                }
                for id in ids {
                    println!("{}  {}", id.file_name(), console::style(id).dim());
                }
            }
            ArchiveCommand::Restore {
                archive,
                overwrite,
                force,
            } => {
                let file_name = Path::new(&archive)
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default();
                let id = ArchiveId::from_file_name(&file_name).ok_or_else(|| {
                    PimError::ArchiveFailed {
                        message: format!("'{}' is not an archive name", archive),
                    }
                })?;

                if !force {
                    println!("Restoring the archive taken {}", id);
                    if overwrite {
                        println!("Existing groups with the same names will be replaced!");
                    }
                    if !self.confirm("Continue?")? {
                        println!("Restore cancelled.");
                        return Ok(());
                    }
                }

                let summary = manager.restore(id, overwrite)?;
                self.keeper = GroupKeeper::new();
                self.defaults = NoteDefaults::load(self.store.data_dir());

                println!(
                    "Restored {} of {} files from {} ({} skipped)",
                    summary.files_restored,
                    summary.total_files,
                    summary.archive_file.display(),
                    summary.files_skipped
                );
                for (file, error) in &summary.failed_files {
                    println!("  {} {}: {}", console::style("failed").red(), file, error);
                }
            }
        }
        Ok(())
    }

    fn handle_config(&mut self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        let show = show || (set.is_none() && !reset);
        if reset {
            self.config = Config::default();
            self.config.save(&self.config_path)?;
            println!("Configuration reset to defaults");
        }

        if let Some(assignment) = set {
            self.config.set(&assignment)?;
            self.config.save(&self.config_path)?;
            println!("Configuration updated");
        }

        if show {
            println!("Config file: {}", self.config_path.display());
            println!("{}", serde_json::to_string_pretty(&self.config)?);
            println!("Editor: {}", self.config.get_editor_command());
        }
        Ok(())
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        print!("{} [y/N]: ", question);
        stdout().flush().map_err(PimError::Io)?;

        let mut input = String::new();
        stdin().read_line(&mut input).map_err(PimError::Io)?;

        let input = input.trim().to_lowercase();
        Ok(input == "y" || input == "yes")
    }

    // Opens the configured editor on a temp file seeded with `existing_content`
    fn open_editor_with_content(&self, title: &str, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".txt").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        let mut file = OpenOptions::new().write(true).open(&temp_path)?;
        writeln!(file, "<!-- {} -->", title)?;
        writeln!(
            file,
            "<!-- Edit the long-form text below. Comment lines are ignored. -->"
        )?;
        write!(file, "{}", existing_content)?;
        drop(file);

        let editor_cmd = self.config.get_editor_command();
        info!("Opening editor. Save and exit when done...");
        self.launch_editor(&editor_cmd, &temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(process_editor_content(&content))
    }

    fn launch_editor(&self, editor_cmd: &str, file_path: &Path) -> Result<()> {
        let args = split(editor_cmd).map_err(|e| PimError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        let Some((program, rest)) = args.split_first() else {
            return Err(PimError::EditorError {
                message: "Empty editor command".to_string(),
            });
        };

        let status = Command::new(program)
            .args(rest)
            .arg(file_path)
            .status()
            .map_err(|e| PimError::EditorError {
                message: format!("Failed to run editor '{}': {}", program, e),
            })?;

        if !status.success() {
            return Err(PimError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }
        Ok(())
    }
}

fn attach<L: Linkable + ?Sized>(
    source: &mut L,
    target_group: &Group,
    target_note: Option<&Note>,
    kind: LinkType,
) -> Result<LinkTarget> {
    match target_note {
        Some(note) => link_to_note(source, target_group, note, kind),
        None => link_to_group(source, target_group, kind),
    }
}

fn dateless(group_type: GroupType) -> PimError {
    PimError::InvalidFormat {
        message: format!("notes in {} groups have no date", group_type),
    }
}

/// Drops the `<!-- -->` comment lines written into the editor template.
fn process_editor_content(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with("<!--") || !line.trim_end().ends_with("-->"))
        .collect::<Vec<&str>>()
        .join("\n")
        .trim_end()
        .to_string()
}

fn build_criteria(options: &SearchOptions) -> Result<SearchCriteria> {
    let conjunction = |or: bool| if or { Conjunction::Or } else { Conjunction::And };

    // each flag lands in its own slot, so --group-last keeps its meaning
    let mut criteria = SearchCriteria::new();
    criteria.terms[0] = SearchTerm::new(options.term1.clone(), options.not1);
    if let Some(text) = &options.term2 {
        criteria.terms[1] = SearchTerm::new(text.clone(), options.not2);
    }
    if let Some(text) = &options.term3 {
        criteria.terms[2] = SearchTerm::new(text.clone(), options.not3);
    }
    criteria.conjunctions = [conjunction(options.or2), conjunction(options.or3)];

    if options.group_first {
        criteria = criteria.group_first_pair();
    }
    if options.group_last {
        criteria = criteria.group_last_pair();
    }

    let from = options.from.as_deref().map(parse_date).transpose()?;
    let to = options.to.as_deref().map(parse_date).transpose()?;
    let modified_from = options.modified_from.as_deref().map(parse_date).transpose()?;
    let modified_to = options.modified_to.as_deref().map(parse_date).transpose()?;

    Ok(criteria
        .note_date_between(from, to)
        .modified_between(modified_from, modified_to))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(term1: &str) -> SearchOptions {
        SearchOptions {
            term1: term1.to_string(),
            not1: false,
            term2: None,
            or2: false,
            not2: false,
            term3: None,
            or3: false,
            not3: false,
            group_first: false,
            group_last: false,
            from: None,
            to: None,
            modified_from: None,
            modified_to: None,
            group_type: None,
            save_as: None,
            json: false,
        }
    }

    #[test]
    fn editor_comments_are_stripped() {
        let content = "<!-- Title -->\n<!-- help -->\nkeep this\n<!-- trailing -->\n";
        assert_eq!(process_editor_content(content), "keep this");
        assert_eq!(process_editor_content("a <!-- b --> c"), "a <!-- b --> c");
    }

    #[test]
    fn criteria_follow_flags() {
        let mut opts = options("milk");
        opts.term2 = Some("bread".to_string());
        opts.or2 = true;
        opts.term3 = Some("eggs".to_string());
        opts.not3 = true;
        opts.group_first = true;
        opts.from = Some("2024-01-01".to_string());

        let criteria = build_criteria(&opts).unwrap();
        assert_eq!(criteria.terms[1].text, "bread");
        assert_eq!(criteria.conjunctions, [Conjunction::Or, Conjunction::And]);
        assert!(criteria.terms[2].negate);
        assert!(criteria.group_first_pair);
        assert!(criteria.note_date.is_set());
    }

    #[test]
    fn terms_keep_their_positions() {
        let mut opts = options("a");
        opts.term2 = Some(String::new());
        opts.term3 = Some("c".to_string());
        opts.or3 = true;
        opts.group_last = true;

        let criteria = build_criteria(&opts).unwrap();
        assert!(criteria.terms[1].is_blank());
        assert_eq!(criteria.terms[2].text, "c");
        assert_eq!(criteria.conjunctions, [Conjunction::And, Conjunction::Or]);
        assert_eq!(criteria.summary(), "\"a\" OR \"c\"");
    }

    #[test]
    fn bad_dates_are_reported() {
        let mut opts = options("milk");
        opts.modified_to = Some("yesterday".to_string());
        assert!(matches!(
            build_criteria(&opts),
            Err(PimError::InvalidFormat { .. })
        ));
    }
}
