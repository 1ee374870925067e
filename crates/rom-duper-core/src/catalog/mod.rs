//! Snapshot of the catalog collaborator's data: entries, their file references,
//! platform names and the user's current filter/selection.

mod expand;

pub use expand::{PathExpander, VariableExpander};

use crate::config::EntrySource;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub type EntryId = String;
pub type PlatformId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformRecord {
    pub id: PlatformId,
    pub name: String,
}

/// A file path as declared by the catalog, before variable expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub name: Option<String>,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: EntryId,
    pub name: String,
    #[serde(default)]
    pub platform_ids: Vec<PlatformId>,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub install_dir: Option<String>,
    #[serde(default)]
    pub files: Vec<CatalogFile>,
}

/// One file of an entry whose declared path resolved to an absolute path.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReference {
    pub index: usize,
    pub declared_path: String,
    pub resolved_path: PathBuf,
}

impl CatalogEntry {
    /// Expand every declared path; files that cannot be resolved are skipped.
    pub fn resolve_files(&self, expander: &dyn PathExpander) -> (Vec<FileReference>, usize) {
        let mut resolved = Vec::with_capacity(self.files.len());
        let mut unresolved = 0;

        for (index, file) in self.files.iter().enumerate() {
            match expander.expand(self, &file.path) {
                Some(resolved_path) => resolved.push(FileReference {
                    index,
                    declared_path: file.path.clone(),
                    resolved_path,
                }),
                None => {
                    debug!(
                        "Excluding unresolvable path '{}' of entry '{}'",
                        file.path, self.name
                    );
                    unresolved += 1;
                }
            }
        }

        (resolved, unresolved)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub platforms: Vec<PlatformRecord>,
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
    /// Entries currently visible through the caller's filter.
    #[serde(default)]
    pub filtered: Vec<EntryId>,
    /// Entries currently selected by the caller.
    #[serde(default)]
    pub selected: Vec<EntryId>,
}

impl CatalogSnapshot {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = fs::read_to_string(path)?;
        let snapshot = Self::from_json_str(&json)?;
        debug!(
            "Loaded catalog '{}': {} entries, {} platforms",
            path.display(),
            snapshot.entries.len(),
            snapshot.platforms.len()
        );
        Ok(snapshot)
    }

    pub fn entry(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries drawn from `source`, in catalog order.
    pub fn entries_for(&self, source: EntrySource) -> Vec<&CatalogEntry> {
        let ids: HashSet<&str> = match source {
            EntrySource::AllEntries => return self.entries.iter().collect(),
            EntrySource::FilteredEntries => self.filtered.iter().map(String::as_str).collect(),
            EntrySource::SelectedEntries => self.selected.iter().map(String::as_str).collect(),
        };

        let entries: Vec<&CatalogEntry> = self
            .entries
            .iter()
            .filter(|e| ids.contains(e.id.as_str()))
            .collect();

        if entries.len() < ids.len() {
            warn!(
                "{} {:?} ids do not match any catalog entry",
                ids.len() - entries.len(),
                source
            );
        }
        entries
    }
}

/// Lexically resolve `.` and `..` components, like a full-path conversion
/// that does not touch the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component.as_os_str());
                }
            }
            other => result.push(other.as_os_str()),
        }
    }
    result
}
