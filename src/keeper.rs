use std::collections::HashMap;

use log::{debug, trace};

use crate::{Group, GroupInfo, GroupStore, PimError, Result};

/// In-memory cache of loaded groups, keyed by display name.
///
/// Edits happen on the cached group in place. Renames and save-as drop the old
/// entry so the next access reads the store again.
#[derive(Debug, Default)]
pub struct GroupKeeper {
    groups: HashMap<String, Group>,
}

impl GroupKeeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.get_mut(name)
    }

    /// Caches `group` under its display name, replacing any previous entry.
    pub fn insert(&mut self, group: Group) {
        trace!("Caching group {}", group.info());
        self.groups.insert(group.name().to_string(), group);
    }

    /// Drops the cached copy of `name`, if any.
    pub fn invalidate(&mut self, name: &str) -> Option<Group> {
        debug!("Invalidating cached group {}", name);
        self.groups.remove(name)
    }

    /// The cached group, loading it from `store` on a miss.
    ///
    /// A cached group of a different type with the same name is replaced.
    pub fn get_or_load<S: GroupStore + ?Sized>(
        &mut self,
        store: &S,
        info: &GroupInfo,
    ) -> Result<&mut Group> {
        let stale = self
            .groups
            .get(&info.name)
            .is_some_and(|cached| cached.group_type() != info.group_type);
        if stale {
            self.invalidate(&info.name);
        }

        if !self.groups.contains_key(&info.name) {
            debug!("Cache miss for {}, loading from store", info);
            let group = store.load_group(info)?;
            self.groups.insert(info.name.clone(), group);
        }

        self.groups
            .get_mut(&info.name)
            .ok_or_else(|| PimError::GroupNotFound {
                name: info.to_string(),
            })
    }

    /// Writes the cached group back to `store`.
    pub fn save<S: GroupStore + ?Sized>(&self, store: &S, name: &str) -> Result<()> {
        let group = self.groups.get(name).ok_or_else(|| PimError::GroupNotFound {
            name: name.to_string(),
        })?;
        store.save_group(group)
    }

    /// Renames through the store and drops the stale cache entry.
    pub fn rename<S: GroupStore + ?Sized>(
        &mut self,
        store: &S,
        info: &GroupInfo,
        new_name: &str,
    ) -> Result<()> {
        if let Some(group) = self.groups.get(&info.name) {
            store.save_group(group)?;
        }
        store.rename_group(info, new_name)?;
        self.invalidate(&info.name);
        self.invalidate(new_name);
        Ok(())
    }

    /// Saves a deep copy of the group under `new_name`. Both names are
    /// invalidated so the next access reads what the store holds.
    pub fn save_as<S: GroupStore + ?Sized>(
        &mut self,
        store: &S,
        info: &GroupInfo,
        new_name: &str,
    ) -> Result<Group> {
        let target = GroupInfo::new(new_name, info.group_type);
        if store.exists(&target)? {
            return Err(PimError::GroupAlreadyExists {
                name: target.to_string(),
            });
        }

        let copy = self.get_or_load(store, info)?.copy_as(new_name);
        store.save_group(&copy)?;
        self.invalidate(&info.name);
        self.invalidate(new_name);
        Ok(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GroupType, MemoryGroupStore, Note, Stamp};

    fn seeded_store() -> (MemoryGroupStore, GroupInfo) {
        let store = MemoryGroupStore::new();
        let mut group = Group::new("Chores", GroupType::Todo);
        group.add_note(Note::with_text(GroupType::Todo, "dishes"));
        store.save_group(&group).unwrap();
        (store, group.info())
    }

    #[test]
    fn edits_are_served_from_cache() {
        let (store, info) = seeded_store();
        let mut keeper = GroupKeeper::new();

        keeper.get_or_load(&store, &info).unwrap().notes[0].set_text("laundry", Stamp::Touch);
        let cached = keeper.get_or_load(&store, &info).unwrap();
        assert_eq!(cached.notes[0].text(), "laundry");

        // the store has not seen the edit yet
        assert_eq!(store.load_group(&info).unwrap().notes[0].text(), "dishes");
        keeper.save(&store, "Chores").unwrap();
        assert_eq!(store.load_group(&info).unwrap().notes[0].text(), "laundry");
    }

    #[test]
    fn rename_invalidates() {
        let (store, info) = seeded_store();
        let mut keeper = GroupKeeper::new();
        keeper.get_or_load(&store, &info).unwrap();

        keeper.rename(&store, &info, "Housework").unwrap();
        assert!(!keeper.contains("Chores"));
        assert!(!keeper.contains("Housework"));

        let renamed = GroupInfo::new("Housework", GroupType::Todo);
        assert_eq!(keeper.get_or_load(&store, &renamed).unwrap().name(), "Housework");
    }

    #[test]
    fn save_as_keeps_original() {
        let (store, info) = seeded_store();
        let mut keeper = GroupKeeper::new();
        keeper.get_or_load(&store, &info).unwrap();

        let copy = keeper.save_as(&store, &info, "Chores backup").unwrap();
        assert_eq!(copy.notes.len(), 1);
        assert!(keeper.is_empty());
        assert!(store.exists(&info).unwrap());
        assert!(store.exists(&copy.info()).unwrap());

        assert!(matches!(
            keeper.save_as(&store, &info, "Chores backup"),
            Err(PimError::GroupAlreadyExists { .. })
        ));
    }

    #[test]
    fn missing_group_is_not_cached() {
        let store = MemoryGroupStore::new();
        let mut keeper = GroupKeeper::new();
        let result = keeper.get_or_load(&store, &GroupInfo::new("Nope", GroupType::Plain));
        assert!(matches!(result, Err(PimError::GroupNotFound { .. })));
        assert!(keeper.is_empty());
    }
}
