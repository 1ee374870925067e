use super::similarity::{ItemId, SimilarityGraph};
use crate::catalog::{EntryId, PlatformId};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupId(pub usize);

/// One file reference inside a duplicate group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupMember {
    pub item: ItemId,
    pub group: GroupId,
    pub entry_id: EntryId,
    pub entry_name: String,
    pub platform_ids: Vec<PlatformId>,
    pub release_year: Option<i32>,
    pub file_index: usize,
    pub declared_path: String,
    pub resolved_path: PathBuf,
    pub comparison_text: String,
    /// Independent member this one is a part of (another disc of the same release).
    pub parent: Option<ItemId>,
    pub delete: bool,
    /// Mean numeric similarity to the other members; `None` if it has only linked edges.
    pub similarity_average: Option<f32>,
}

impl GroupMember {
    pub(crate) fn from_graph(graph: &SimilarityGraph, item: ItemId, group: GroupId) -> Self {
        let comparable = graph.item(item);
        let entry = graph.entry_of(item);
        Self {
            item,
            group,
            entry_id: entry.id.clone(),
            entry_name: entry.name.clone(),
            platform_ids: entry.platform_ids.clone(),
            release_year: entry.release_year,
            file_index: comparable.file.index,
            declared_path: comparable.file.declared_path.clone(),
            resolved_path: comparable.file.resolved_path.clone(),
            comparison_text: comparable.comparison_text.clone(),
            parent: None,
            delete: false,
            similarity_average: None,
        }
    }

    pub fn is_independent(&self) -> bool {
        self.parent.is_none()
    }

    pub fn file_name(&self) -> String {
        self.resolved_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Whether a member is the only one of its group left un-deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeepState {
    Deleted,
    /// Kept, and every other independent member is marked for deletion.
    KeptExclusively,
    /// Kept alongside at least one other independent member.
    KeptWithOthers,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub id: GroupId,
    pub members: Vec<GroupMember>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, item: ItemId) -> Option<&GroupMember> {
        self.members.iter().find(|m| m.item == item)
    }

    pub fn independents(&self) -> impl Iterator<Item = &GroupMember> {
        self.members.iter().filter(|m| m.is_independent())
    }

    pub fn independent_count(&self) -> usize {
        self.independents().count()
    }

    pub fn parts_of(&self, item: ItemId) -> impl Iterator<Item = &GroupMember> {
        self.members.iter().filter(move |m| m.parent == Some(item))
    }

    /// Entry name of the first member, used to order groups.
    pub fn representative_name(&self) -> &str {
        self.members.first().map_or("", |m| m.entry_name.as_str())
    }

    pub fn delete_count(&self) -> usize {
        self.members.iter().filter(|m| m.delete).count()
    }

    /// Flag an independent member and its parts. Parts cannot be flagged on their own;
    /// returns false for them and for items outside the group.
    pub fn set_delete(&mut self, item: ItemId, delete: bool) -> bool {
        match self.member(item) {
            Some(member) if member.is_independent() => {}
            _ => return false,
        }

        for member in self.members.iter_mut() {
            if member.item == item || member.parent == Some(item) {
                member.delete = delete;
            }
        }
        true
    }

    /// Keep `item` and mark every other independent member (and its parts) for deletion.
    pub fn keep_exclusively(&mut self, item: ItemId) -> bool {
        match self.member(item) {
            Some(member) if member.is_independent() => {}
            _ => return false,
        }

        let independents: Vec<ItemId> = self.independents().map(|m| m.item).collect();
        for other in independents {
            self.set_delete(other, other != item);
        }
        true
    }

    pub fn exclusively_kept(&self, item: ItemId) -> Option<KeepState> {
        let member = self.member(item)?;
        let owner = member.parent.unwrap_or(member.item);
        let owner = self.member(owner)?;

        if owner.delete {
            return Some(KeepState::Deleted);
        }
        let others_kept = self
            .independents()
            .any(|m| m.item != owner.item && !m.delete);
        Some(if others_kept {
            KeepState::KeptWithOthers
        } else {
            KeepState::KeptExclusively
        })
    }

    /// Deepest directory containing every member's file.
    pub fn common_path(&self) -> PathBuf {
        let mut dirs = self
            .members
            .iter()
            .map(|m| m.resolved_path.parent().unwrap_or_else(|| Path::new("")));

        let first = match dirs.next() {
            Some(dir) => dir,
            None => return PathBuf::new(),
        };
        let mut common: Vec<Component> = first.components().collect();
        for dir in dirs {
            let shared = common
                .iter()
                .zip(dir.components())
                .take_while(|(a, b)| *a == b)
                .count();
            common.truncate(shared);
        }
        common.iter().collect()
    }

    /// Path of a member below [`common_path`](Self::common_path).
    pub fn relative_path(&self, member: &GroupMember) -> PathBuf {
        let common = self.common_path();
        member
            .resolved_path
            .strip_prefix(&common)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| member.resolved_path.clone())
    }
}
