use super::group::DuplicateGroup;
use crate::catalog::{CatalogSnapshot, EntryId};
use crate::error::Error;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What should happen to a catalog entry once its flagged files are gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "file_indices", rename_all = "snake_case")]
pub enum EntryAction {
    /// Every file of the entry is flagged: drop the entry itself.
    RemoveEntry,
    /// Drop only these file references (indices into the entry's file list).
    RemoveFiles(Vec<usize>),
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannedEntry {
    pub entry_id: EntryId,
    pub entry_name: String,
    pub action: EntryAction,
    /// Resolved paths of the files to delete from disk.
    pub paths: Vec<PathBuf>,
}

/// Catalog changes and file deletions derived from flagged group members.
/// Nothing is executed here; the catalog collaborator applies the plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeletionPlan {
    pub entries: Vec<PlannedEntry>,
}

impl DeletionPlan {
    /// Collect flagged members per entry, in order of first appearance.
    pub fn from_groups(groups: &[DuplicateGroup], snapshot: &CatalogSnapshot) -> Self {
        let mut entries: Vec<PlannedEntry> = Vec::new();
        let mut flagged: Vec<Vec<usize>> = Vec::new();
        let mut position: HashMap<&str, usize> = HashMap::new();

        for member in groups.iter().flat_map(|g| g.members.iter()).filter(|m| m.delete) {
            let index = *position.entry(member.entry_id.as_str()).or_insert_with(|| {
                entries.push(PlannedEntry {
                    entry_id: member.entry_id.clone(),
                    entry_name: member.entry_name.clone(),
                    action: EntryAction::RemoveEntry,
                    paths: Vec::new(),
                });
                flagged.push(Vec::new());
                entries.len() - 1
            });
            if !flagged[index].contains(&member.file_index) {
                flagged[index].push(member.file_index);
                entries[index].paths.push(member.resolved_path.clone());
            }
        }

        for (planned, mut indices) in entries.iter_mut().zip(flagged) {
            indices.sort_unstable();
            let total = match snapshot.entry(&planned.entry_id) {
                Some(entry) => entry.files.len(),
                None => {
                    warn!("Entry '{}' is no longer in the catalog", planned.entry_id);
                    indices.len()
                }
            };
            planned.action = if indices.len() >= total {
                EntryAction::RemoveEntry
            } else {
                EntryAction::RemoveFiles(indices)
            };
        }

        info!(
            "Deletion plan: {} files across {} entries ({} entries removed)",
            entries.iter().map(|e| e.paths.len()).sum::<usize>(),
            entries.len(),
            entries
                .iter()
                .filter(|e| e.action == EntryAction::RemoveEntry)
                .count()
        );
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn file_count(&self) -> usize {
        self.entries.iter().map(|e| e.paths.len()).sum()
    }

    pub fn removed_entries(&self) -> impl Iterator<Item = &PlannedEntry> {
        self.entries
            .iter()
            .filter(|e| e.action == EntryAction::RemoveEntry)
    }

    pub fn updated_entries(&self) -> impl Iterator<Item = &PlannedEntry> {
        self.entries
            .iter()
            .filter(|e| e.action != EntryAction::RemoveEntry)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        info!("Deletion plan written to '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::group::{GroupId, GroupMember};
    use crate::analysis::similarity::ItemId;
    use crate::catalog::{CatalogEntry, CatalogFile};

    fn catalog_entry(id: &str, files: usize) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: id.to_uppercase(),
            platform_ids: vec![],
            release_year: None,
            install_dir: None,
            files: (0..files)
                .map(|i| CatalogFile {
                    name: None,
                    path: format!("/roms/{}/{}.bin", id, i),
                })
                .collect(),
        }
    }

    fn member(item: u32, entry: &str, file_index: usize, delete: bool) -> GroupMember {
        GroupMember {
            item: ItemId(item),
            group: GroupId(0),
            entry_id: entry.to_string(),
            entry_name: entry.to_uppercase(),
            platform_ids: vec![],
            release_year: None,
            file_index,
            declared_path: format!("/roms/{}/{}.bin", entry, file_index),
            resolved_path: PathBuf::from(format!("/roms/{}/{}.bin", entry, file_index)),
            comparison_text: String::new(),
            parent: None,
            delete,
            similarity_average: None,
        }
    }

    #[test]
    fn test_plan_removes_fully_flagged_entries_and_trims_others() {
        let snapshot = CatalogSnapshot {
            entries: vec![catalog_entry("a", 1), catalog_entry("b", 2), catalog_entry("c", 3)],
            ..Default::default()
        };
        let groups = vec![
            DuplicateGroup {
                id: GroupId(0),
                members: vec![member(0, "c", 0, false), member(1, "b", 0, true), member(2, "a", 0, true)],
            },
            DuplicateGroup {
                id: GroupId(1),
                members: vec![member(3, "c", 2, true), member(4, "b", 1, true)],
            },
        ];

        let plan = DeletionPlan::from_groups(&groups, &snapshot);
        let ids: Vec<&str> = plan.entries.iter().map(|e| e.entry_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(plan.entries[0].action, EntryAction::RemoveEntry);
        assert_eq!(plan.entries[1].action, EntryAction::RemoveEntry);
        assert_eq!(plan.entries[2].action, EntryAction::RemoveFiles(vec![2]));
        assert_eq!(plan.file_count(), 4);
        assert_eq!(plan.removed_entries().count(), 2);
        assert_eq!(plan.updated_entries().count(), 1);
    }

    #[test]
    fn test_empty_plan_and_json_export() {
        let plan = DeletionPlan::from_groups(&[], &CatalogSnapshot::default());
        assert!(plan.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plans").join("plan.json");
        plan.write_json(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"entries\""));
    }

    #[test]
    fn test_action_serializes_with_tag() {
        let json = serde_json::to_string(&EntryAction::RemoveFiles(vec![1, 3])).unwrap();
        assert_eq!(json, r#"{"action":"remove_files","file_indices":[1,3]}"#);
        let json = serde_json::to_string(&EntryAction::RemoveEntry).unwrap();
        assert_eq!(json, r#"{"action":"remove_entry"}"#);
    }
}
