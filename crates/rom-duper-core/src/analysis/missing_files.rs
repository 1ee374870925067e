use super::deletion_plan::EntryAction;
use crate::catalog::{CatalogEntry, EntryId, PathExpander};
use crate::progress::{CancelToken, Outcome};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// An entry with file references that no longer point at anything on disk.
#[derive(Debug, Clone, Serialize)]
pub struct MissingEntry {
    pub entry_id: EntryId,
    pub entry_name: String,
    pub action: EntryAction,
    /// Declared paths of the missing files.
    pub missing: Vec<String>,
}

/// Probe every file of `entries`; paths that cannot be resolved count as missing.
///
/// Entries whose files are all missing are proposed for removal, the others
/// for trimming. Entries without files are ignored.
pub fn find_missing_files<P>(
    entries: &[&CatalogEntry],
    expander: &dyn PathExpander,
    probe: P,
    cancel: &CancelToken,
) -> Outcome<Vec<MissingEntry>>
where
    P: Fn(&Path) -> bool + Send + Sync,
{
    info!("Checking {} entries for missing files...", entries.len());

    let results: Vec<Option<MissingEntry>> = entries
        .par_iter()
        .map(|entry| {
            if cancel.is_cancelled() || entry.files.is_empty() {
                return None;
            }

            let missing: Vec<usize> = entry
                .files
                .iter()
                .enumerate()
                .filter(|(_, file)| match expander.expand(entry, &file.path) {
                    Some(path) => !probe(&path),
                    None => true,
                })
                .map(|(index, _)| index)
                .collect();

            if missing.is_empty() {
                return None;
            }
            debug!("'{}': {} of {} files missing", entry.name, missing.len(), entry.files.len());

            let declared = missing.iter().map(|&i| entry.files[i].path.clone()).collect();
            let action = if missing.len() == entry.files.len() {
                EntryAction::RemoveEntry
            } else {
                EntryAction::RemoveFiles(missing)
            };
            Some(MissingEntry {
                entry_id: entry.id.clone(),
                entry_name: entry.name.clone(),
                action,
                missing: declared,
            })
        })
        .collect();

    if cancel.is_cancelled() {
        return Outcome::Cancelled;
    }

    let missing: Vec<MissingEntry> = results.into_iter().flatten().collect();
    info!("{} entries reference missing files", missing.len());
    Outcome::Completed(missing)
}

/// Filesystem probe used outside of tests.
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}
