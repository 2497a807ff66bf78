//! Typed links between notes and groups.
//!
//! A [`LinkTarget`] only stores ids plus a snapshot of the target note for quick
//! display; the live target is always fetched again through a [`GroupStore`].
use std::fmt;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Group, GroupInfo, GroupProperties, GroupStore, Note, NoteBase, PimError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkType {
    #[default]
    Related,
    DependingOn,
    DependedOnBy,
    Before,
    During,
    After,
}

impl LinkType {
    pub const ALL: [LinkType; 6] = [
        LinkType::Related,
        LinkType::DependingOn,
        LinkType::DependedOnBy,
        LinkType::Before,
        LinkType::During,
        LinkType::After,
    ];

    /// The same relationship seen from the other end.
    pub fn invert(self) -> LinkType {
        match self {
            LinkType::Related => LinkType::Related,
            LinkType::DependingOn => LinkType::DependedOnBy,
            LinkType::DependedOnBy => LinkType::DependingOn,
            LinkType::Before => LinkType::After,
            LinkType::During => LinkType::During,
            LinkType::After => LinkType::Before,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LinkType::Related => "related to",
            LinkType::DependingOn => "depending on",
            LinkType::DependedOnBy => "depended on by",
            LinkType::Before => "before",
            LinkType::During => "during",
            LinkType::After => "after",
        };
        f.write_str(label)
    }
}

/// Free-function form of [`LinkType::invert`].
pub fn invert(link_type: LinkType) -> LinkType {
    link_type.invert()
}

/// A directed, typed reference to a note or a whole group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkTarget {
    /// Identity of the link itself, so two links to the same note stay distinct
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub target_group_id: Option<Uuid>,
    /// Where to find the target group; filled in whenever it is known
    #[serde(default)]
    pub target_group: Option<GroupInfo>,
    /// Snapshot of the target note. `None` means the link is to the whole group.
    #[serde(default)]
    pub target_note: Option<Box<Note>>,
    #[serde(default)]
    pub link_type: LinkType,
}

impl LinkTarget {
    pub fn is_group_link(&self) -> bool {
        self.target_note.is_none()
    }

    pub fn target_note_id(&self) -> Option<Uuid> {
        self.target_note.as_ref().map(|note| note.id())
    }

    /// True when this link points at `note_id` in `group_id`, or at the whole
    /// group when `note_id` is `None`.
    pub fn points_at(&self, group_id: Uuid, note_id: Option<Uuid>) -> bool {
        self.target_group_id == Some(group_id) && self.target_note_id() == note_id
    }
}

/// Anything that owns an ordered list of outgoing links.
pub trait Linkable {
    fn links(&self) -> &[LinkTarget];

    fn links_mut(&mut self) -> &mut Vec<LinkTarget>;
}

impl Linkable for NoteBase {
    fn links(&self) -> &[LinkTarget] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<LinkTarget> {
        &mut self.links
    }
}

impl Linkable for Note {
    fn links(&self) -> &[LinkTarget] {
        &self.base().links
    }

    fn links_mut(&mut self) -> &mut Vec<LinkTarget> {
        &mut self.base_mut().links
    }
}

impl Linkable for GroupProperties {
    fn links(&self) -> &[LinkTarget] {
        &self.link_targets
    }

    fn links_mut(&mut self) -> &mut Vec<LinkTarget> {
        &mut self.link_targets
    }
}

/// Appends a new link to `source` and returns a copy of it.
///
/// A target note needs a target group to live in, and a link needs at least a
/// group to point at. Violations are rejected before `source` is touched.
pub fn add_link<L: Linkable + ?Sized>(
    source: &mut L,
    target_group_id: Option<Uuid>,
    target_note: Option<&Note>,
    link_type: LinkType,
) -> Result<LinkTarget> {
    push_link(source, target_group_id, None, target_note, link_type)
}

/// Links to a note inside a group, recording where the group lives.
pub fn link_to_note<L: Linkable + ?Sized>(
    source: &mut L,
    target_group: &Group,
    target_note: &Note,
    link_type: LinkType,
) -> Result<LinkTarget> {
    push_link(
        source,
        Some(target_group.properties.id()),
        Some(target_group.info()),
        Some(target_note),
        link_type,
    )
}

/// Links to a whole group.
pub fn link_to_group<L: Linkable + ?Sized>(
    source: &mut L,
    target_group: &Group,
    link_type: LinkType,
) -> Result<LinkTarget> {
    push_link(
        source,
        Some(target_group.properties.id()),
        Some(target_group.info()),
        None,
        link_type,
    )
}

fn push_link<L: Linkable + ?Sized>(
    source: &mut L,
    target_group_id: Option<Uuid>,
    target_group: Option<GroupInfo>,
    target_note: Option<&Note>,
    link_type: LinkType,
) -> Result<LinkTarget> {
    if target_group_id.is_none() {
        let message = if target_note.is_some() {
            "a link to a note must name the group the note lives in"
        } else {
            "a link must point at a group or a note"
        };
        return Err(PimError::InvalidLink {
            message: message.to_string(),
        });
    }

    let link = LinkTarget {
        id: Uuid::new_v4(),
        target_group_id,
        target_group,
        target_note: target_note.map(|note| Box::new(snapshot(note))),
        link_type,
    };
    debug!(
        "Adding '{}' link {} to group {:?}",
        link.link_type, link.id, link.target_group_id
    );
    source.links_mut().push(link.clone());
    Ok(link)
}

/// Group-level form of [`add_link`].
pub fn add_group_link(
    properties: &mut GroupProperties,
    target_group_id: Option<Uuid>,
    target_note: Option<&Note>,
    link_type: LinkType,
) -> Result<LinkTarget> {
    add_link(properties, target_group_id, target_note, link_type)
}

/// Removes the link whose own id is `link_id`. Returns whether one was removed.
pub fn remove_link<L: Linkable + ?Sized>(source: &mut L, link_id: Uuid) -> bool {
    let links = source.links_mut();
    match links.iter().position(|link| link.id == link_id) {
        Some(index) => {
            links.remove(index);
            debug!("Removed link {}", link_id);
            true
        }
        None => {
            trace!("No link {} to remove", link_id);
            false
        }
    }
}

pub fn find_link<L: Linkable + ?Sized>(source: &L, link_id: Uuid) -> Option<&LinkTarget> {
    source.links().iter().find(|link| link.id == link_id)
}

/// Replaces the cached snapshot with the current state of the target note.
pub fn refresh_snapshot(link: &mut LinkTarget, live_note: &Note) {
    if link.target_note_id() == Some(live_note.id()) {
        link.target_note = Some(Box::new(snapshot(live_note)));
    }
}

/// A snapshot of a note for storage inside a link. Its own links are dropped so
/// snapshots never nest.
fn snapshot(note: &Note) -> Note {
    let mut copy = note.clone();
    copy.base_mut().links.clear();
    copy
}

/// The live target of a link.
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub group: Group,
    pub note: Option<Note>,
}

/// Loads the current target of `link` from `store`.
///
/// The recorded group location is tried first; if it no longer holds the
/// group with the recorded id, every group in the store is checked.
pub fn resolve<S: GroupStore + ?Sized>(store: &S, link: &LinkTarget) -> Result<ResolvedLink> {
    let group_id = link.target_group_id.ok_or_else(|| PimError::InvalidLink {
        message: format!("link {} has no target group", link.id),
    })?;

    let recorded = match &link.target_group {
        Some(info) => match store.load_group(info) {
            Ok(group) if group.properties.id() == group_id => Some(group),
            Ok(_) | Err(PimError::GroupNotFound { .. }) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    let group = match recorded {
        Some(group) => group,
        None => find_group_by_id(store, group_id)?,
    };

    let note = match link.target_note_id() {
        Some(note_id) => Some(group.find_note(note_id).cloned().ok_or_else(|| {
            PimError::NoteNotFound {
                id: note_id.to_string(),
            }
        })?),
        None => None,
    };

    Ok(ResolvedLink { group, note })
}

fn find_group_by_id<S: GroupStore + ?Sized>(store: &S, group_id: Uuid) -> Result<Group> {
    for group_type in crate::GroupType::ALL {
        for name in store.list_group_names(group_type)? {
            let info = GroupInfo::new(name, group_type);
            match store.load_group(&info) {
                Ok(group) if group.properties.id() == group_id => return Ok(group),
                Ok(_) => {}
                Err(e) => debug!("Skipping {} while resolving link: {}", info, e),
            }
        }
    }
    Err(PimError::GroupNotFound {
        name: group_id.to_string(),
    })
}

/// A link seen from its target's side.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundLink {
    pub source_group: GroupInfo,
    /// `None` when the link is a group-level link
    pub source_note: Option<Uuid>,
    pub link_id: Uuid,
    /// Already inverted, so it reads from the target's perspective
    pub link_type: LinkType,
}

/// Every link in `groups` that points at the given note (or whole group when
/// `target_note_id` is `None`).
pub fn inbound_links(
    groups: &[Group],
    target_group_id: Uuid,
    target_note_id: Option<Uuid>,
) -> Vec<InboundLink> {
    let mut found = Vec::new();
    for group in groups {
        for link in group.properties.links() {
            if link.points_at(target_group_id, target_note_id) {
                found.push(InboundLink {
                    source_group: group.info(),
                    source_note: None,
                    link_id: link.id,
                    link_type: link.link_type.invert(),
                });
            }
        }
        for note in &group.notes {
            for link in note.links() {
                if link.points_at(target_group_id, target_note_id) {
                    found.push(InboundLink {
                        source_group: group.info(),
                        source_note: Some(note.id()),
                        link_id: link.id,
                        link_type: link.link_type.invert(),
                    });
                }
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GroupType, MemoryGroupStore, Stamp};

    #[test]
    fn invert_is_an_involution() {
        for link_type in LinkType::ALL {
            assert_eq!(invert(invert(link_type)), link_type);
        }
        assert_eq!(invert(LinkType::Related), LinkType::Related);
        assert_eq!(invert(LinkType::During), LinkType::During);
        assert_eq!(invert(LinkType::Before), LinkType::After);
        assert_eq!(invert(LinkType::DependingOn), LinkType::DependedOnBy);
    }

    #[test]
    fn note_without_group_is_rejected() {
        let mut source = Note::new(GroupType::Plain);
        let target = Note::new(GroupType::Todo);

        let result = add_link(&mut source, None, Some(&target), LinkType::Related);
        assert!(matches!(result, Err(PimError::InvalidLink { .. })));
        assert!(source.links().is_empty());

        let result = add_link(&mut source, None, None, LinkType::Related);
        assert!(matches!(result, Err(PimError::InvalidLink { .. })));
    }

    #[test]
    fn remove_by_own_id_removes_exactly_one() {
        let mut source = Note::new(GroupType::Plain);
        let group_id = Uuid::new_v4();
        let target = Note::new(GroupType::Todo);

        let first = add_link(&mut source, Some(group_id), Some(&target), LinkType::Before).unwrap();
        let second =
            add_link(&mut source, Some(group_id), Some(&target), LinkType::Before).unwrap();
        assert_ne!(first.id, second.id);

        assert!(remove_link(&mut source, first.id));
        assert_eq!(source.links().len(), 1);
        assert_eq!(source.links()[0].id, second.id);

        assert!(!remove_link(&mut source, Uuid::new_v4()));
        assert_eq!(source.links().len(), 1);
    }

    #[test]
    fn group_link_has_no_note() {
        let mut properties = GroupProperties::new("Retire", GroupType::Goal);
        let link = add_group_link(&mut properties, Some(Uuid::new_v4()), None, LinkType::Related)
            .unwrap();
        assert!(link.is_group_link());
        assert_eq!(find_link(&properties, link.id), Some(&link));
    }

    #[test]
    fn snapshots_do_not_nest() {
        let mut inner = Note::new(GroupType::Plain);
        add_link(&mut inner, Some(Uuid::new_v4()), None, LinkType::Related).unwrap();

        let mut source = Note::new(GroupType::Plain);
        let link = add_link(&mut source, Some(Uuid::new_v4()), Some(&inner), LinkType::After).unwrap();
        assert!(link.target_note.unwrap().links().is_empty());
    }

    #[test]
    fn resolve_reads_live_target() {
        let store = MemoryGroupStore::new();
        let mut chores = Group::new("Chores", GroupType::Todo);
        let note_id = chores.add_note(Note::with_text(GroupType::Todo, "old text"));
        store.save_group(&chores).unwrap();

        let mut source = Note::new(GroupType::Plain);
        let target = chores.find_note(note_id).unwrap().clone();
        let link = link_to_note(&mut source, &chores, &target, LinkType::DependingOn).unwrap();

        chores
            .find_note_mut(note_id)
            .unwrap()
            .set_text("new text", Stamp::Touch);
        store.save_group(&chores).unwrap();

        let resolved = resolve(&store, &link).unwrap();
        assert_eq!(resolved.group.name(), "Chores");
        assert_eq!(resolved.note.as_ref().unwrap().text(), "new text");

        let mut stored = source.links()[0].clone();
        assert_eq!(stored.target_note.as_ref().unwrap().text(), "old text");
        refresh_snapshot(&mut stored, resolved.note.as_ref().unwrap());
        assert_eq!(stored.target_note.as_ref().unwrap().text(), "new text");
    }

    #[test]
    fn resolve_finds_renamed_group_by_id() {
        let store = MemoryGroupStore::new();
        let chores = Group::new("Chores", GroupType::Todo);
        store.save_group(&chores).unwrap();

        let mut source = Note::new(GroupType::Plain);
        let link = link_to_group(&mut source, &chores, LinkType::Related).unwrap();

        store
            .rename_group(&chores.info(), "Housework")
            .unwrap();

        let resolved = resolve(&store, &link).unwrap();
        assert_eq!(resolved.group.name(), "Housework");
        assert!(resolved.note.is_none());
    }

    #[test]
    fn inbound_links_are_inverted() {
        let mut target_group = Group::new("Chores", GroupType::Todo);
        let note_id = target_group.add_note(Note::with_text(GroupType::Todo, "paint"));
        let target = target_group.find_note(note_id).unwrap().clone();

        let mut plans = Group::new("Plans", GroupType::Plain);
        let mut source = Note::with_text(GroupType::Plain, "buy paint first");
        link_to_note(&mut source, &target_group, &target, LinkType::Before).unwrap();
        let source_id = plans.add_note(source);

        let inbound = inbound_links(
            &[plans.clone(), target_group.clone()],
            target_group.properties.id(),
            Some(note_id),
        );
        assert_eq!(inbound.len(), 1);
        assert_eq!(inbound[0].source_note, Some(source_id));
        assert_eq!(inbound[0].link_type, LinkType::After);
        assert_eq!(inbound[0].source_group, plans.info());
    }
}
