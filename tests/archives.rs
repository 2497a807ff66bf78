use std::{fs::File, io::Write};

use tempfile::TempDir;
use zip::{write::SimpleFileOptions, ZipWriter};

use pimgroups::{
    ArchiveId, ArchiveManager, DefaultsFile, FileGroupStore, Group, GroupStore, GroupType, Note,
    PimError, TodoDefaults,
};

fn seeded(dir: &TempDir) -> (FileGroupStore, ArchiveManager) {
    let data_dir = dir.path().join("groups");
    let store = FileGroupStore::open(&data_dir).unwrap();

    let mut chores = Group::new("Chores", GroupType::Todo);
    chores.add_note(Note::with_text(GroupType::Todo, "buy milk"));
    store.save_group(&chores).unwrap();
    store.save_group(&Group::new("Ideas", GroupType::Plain)).unwrap();
    TodoDefaults::default().save(&data_dir).unwrap();

    let manager = ArchiveManager::new(&data_dir, dir.path().join("archives"), 5);
    (store, manager)
}

#[test]
fn create_then_restore_after_loss() {
    let dir = TempDir::new().unwrap();
    let (store, manager) = seeded(&dir);

    let id = manager.create().unwrap();
    assert_eq!(manager.list().unwrap(), vec![id]);

    let chores = Group::new("Chores", GroupType::Todo).info();
    store.delete_group(&chores).unwrap();
    assert!(!store.exists(&chores).unwrap());

    let summary = manager.restore(id, false).unwrap();
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.files_restored, 1);
    assert_eq!(summary.files_skipped, 2);
    assert!(summary.failed_files.is_empty());

    let restored = store.load_group(&chores).unwrap();
    assert_eq!(restored.notes[0].text(), "buy milk");
}

#[test]
fn damaged_entries_never_replace_files() {
    let dir = TempDir::new().unwrap();
    let (store, manager) = seeded(&dir);

    // hand-made archive holding one broken and one mislabelled group file
    let id = ArchiveId::from_timestamp("2024-01-01T12:00:00Z".parse().unwrap());
    std::fs::create_dir_all(dir.path().join("archives")).unwrap();
    let mut zip = ZipWriter::new(File::create(manager.path_of(id)).unwrap());
    zip.start_file("todo_Chores.json", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"{ truncated").unwrap();
    let plain = pimgroups::encode_group(&Group::new("Ideas", GroupType::Plain)).unwrap();
    zip.start_file("todo_Errands.json", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(plain.as_bytes()).unwrap();
    zip.finish().unwrap();

    let summary = manager.restore(id, true).unwrap();
    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.files_restored, 0);
    assert_eq!(summary.failed_files.len(), 2);

    let chores = store
        .load_group(&Group::new("Chores", GroupType::Todo).info())
        .unwrap();
    assert_eq!(chores.notes.len(), 1);
    assert!(!dir.path().join("groups").join("todo_Errands.json").exists());
}

#[test]
fn restoring_an_unknown_archive_fails() {
    let dir = TempDir::new().unwrap();
    let (_store, manager) = seeded(&dir);
    let id = ArchiveId::from_timestamp("2000-01-01T00:00:00Z".parse().unwrap());
    assert!(matches!(
        manager.restore(id, false),
        Err(PimError::ArchiveFailed { .. })
    ));
}
