mod table;

pub use table::{PlatformCategory, PlatformInfo, PlatformTable};

use crate::catalog::{CatalogSnapshot, PlatformId};
use std::collections::{BTreeSet, HashMap};

/// Resolves catalog platform ids to reference data.
///
/// Owned by the components that filter and rank by platform; built once per run
/// from the catalog's id → name map and the immutable [`PlatformTable`].
#[derive(Debug, Clone, Default)]
pub struct PlatformDirectory {
    names: HashMap<PlatformId, String>,
    table: PlatformTable,
}

impl PlatformDirectory {
    pub fn new(names: HashMap<PlatformId, String>, table: PlatformTable) -> Self {
        Self { names, table }
    }

    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        let names = snapshot
            .platforms
            .iter()
            .map(|p| (p.id.clone(), p.name.clone()))
            .collect();
        Self::new(names, PlatformTable::builtin())
    }

    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn info(&self, id: &str) -> Option<&PlatformInfo> {
        self.name_of(id).and_then(|name| self.table.lookup(name))
    }

    /// Best preference rank across an entry's platforms; -1 when none is known.
    pub fn rank_of(&self, ids: &[PlatformId]) -> i64 {
        ids.iter()
            .map(|id| self.info(id).map_or(-1, |info| info.rank))
            .max()
            .unwrap_or(-1)
    }

    pub fn categories_of(&self, ids: &[PlatformId]) -> BTreeSet<PlatformCategory> {
        ids.iter()
            .map(|id| {
                self.info(id)
                    .map_or(PlatformCategory::Console, |info| info.category)
            })
            .collect()
    }

    /// Display names of the given platforms, unknown ids shown as-is.
    pub fn display_names(&self, ids: &[PlatformId]) -> Vec<String> {
        ids.iter()
            .map(|id| self.name_of(id).unwrap_or(id.as_str()).to_string())
            .collect()
    }
}
