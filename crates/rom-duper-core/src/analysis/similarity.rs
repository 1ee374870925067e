use crate::catalog::{CatalogEntry, CatalogSnapshot, FileReference, PathExpander};
use crate::config::{ComparisonField, ComparisonSettings};
use crate::fingerprint::{normalize, ShingleProfile};
use crate::progress::{CancelToken, Outcome, ProgressReporter};
use dashmap::DashMap;
use rayon::prelude::*;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, trace};

lazy_static::lazy_static! {
    // "(Disc 2" style markers, or split files such as "Game 01-02.bs".
    static ref SAME_RELEASE_PART: Regex =
        Regex::new(r"(?i)\p{Ps}\s*dis[ck]|\b\d+\p{Pd}\d+\b.*\.bs$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(pub u32);

impl ItemId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stored relation between two file references.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Similarity {
    /// Cosine similarity of the two trigram profiles.
    Score(f32),
    /// Two parts of one multi-file release; always grouped, never a graded weight.
    StructurallyLinked,
}

impl Similarity {
    pub fn score(self) -> Option<f32> {
        match self {
            Similarity::Score(score) => Some(score),
            Similarity::StructurallyLinked => None,
        }
    }

    pub fn is_linked(self) -> bool {
        matches!(self, Similarity::StructurallyLinked)
    }

    pub fn meets(self, threshold: f32) -> bool {
        match self {
            Similarity::Score(score) => score >= threshold,
            Similarity::StructurallyLinked => true,
        }
    }
}

/// One file reference prepared for comparison.
#[derive(Debug)]
pub struct ComparableItem {
    pub id: ItemId,
    /// Index of the owning entry in [`SimilarityGraph::entries`].
    pub entry: usize,
    pub file: FileReference,
    pub comparison_text: String,
    profile: ShingleProfile,
    release_part: bool,
    similarities: DashMap<ItemId, Similarity>,
}

impl ComparableItem {
    fn new(
        id: ItemId,
        entry_index: usize,
        entry: &CatalogEntry,
        file: FileReference,
        field: ComparisonField,
    ) -> Self {
        let raw = match field {
            ComparisonField::FileNameNoExt => file
                .resolved_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ComparisonField::EntryName => entry.name.clone(),
            ComparisonField::FullPath => file.resolved_path.to_string_lossy().into_owned(),
        };
        let comparison_text = normalize(&raw);
        let profile = ShingleProfile::new(&comparison_text);
        let release_part = is_release_part(&file.declared_path);

        Self {
            id,
            entry: entry_index,
            file,
            comparison_text,
            profile,
            release_part,
            similarities: DashMap::new(),
        }
    }

    pub fn profile(&self) -> &ShingleProfile {
        &self.profile
    }

    /// Whether the declared path looks like one part of a multi-file release.
    pub fn is_release_part(&self) -> bool {
        self.release_part
    }

    pub fn similarity_to(&self, other: ItemId) -> Option<Similarity> {
        self.similarities.get(&other).map(|s| *s.value())
    }

    pub fn neighbor_count(&self) -> usize {
        self.similarities.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CompareStats {
    pub compared_items: usize,
    pub edges: usize,
}

/// All comparable items of a run plus the similarity edges between them.
///
/// Each item owns its neighbor map; edges are written once per unordered pair
/// and stored on both sides.
#[derive(Debug)]
pub struct SimilarityGraph {
    entries: Vec<CatalogEntry>,
    items: Vec<ComparableItem>,
    using: Vec<ItemId>,
    against: Vec<ItemId>,
    floor: f32,
    excluded_files: usize,
}

impl SimilarityGraph {
    /// Parse the `using` and `against` entries into comparable items, in catalog order.
    /// Entries without files and files whose path cannot be resolved are left out.
    pub fn build(
        snapshot: &CatalogSnapshot,
        settings: &ComparisonSettings,
        expander: &dyn PathExpander,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Outcome<SimilarityGraph> {
        let start = Instant::now();
        let using_ids: HashSet<&str> = snapshot
            .entries_for(settings.using_source)
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();
        let against_ids: HashSet<&str> = snapshot
            .entries_for(settings.against_source)
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();

        let entries: Vec<CatalogEntry> = snapshot
            .entries
            .iter()
            .filter(|e| using_ids.contains(e.id.as_str()) || against_ids.contains(e.id.as_str()))
            .cloned()
            .collect();
        reporter.on_parse_start(entries.len());

        let resolved: Vec<(Vec<FileReference>, usize)> = entries
            .par_iter()
            .map(|entry| {
                if cancel.is_cancelled() {
                    return (Vec::new(), 0);
                }
                entry.resolve_files(expander)
            })
            .collect();

        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        let mut excluded_files = 0;
        let mut pending = Vec::new();
        for (entry_index, (files, unresolved)) in resolved.into_iter().enumerate() {
            excluded_files += unresolved;
            for file in files {
                pending.push((entry_index, file));
            }
        }

        let items: Vec<ComparableItem> = pending
            .into_par_iter()
            .enumerate()
            .map(|(index, (entry_index, file))| {
                ComparableItem::new(
                    ItemId(index as u32),
                    entry_index,
                    &entries[entry_index],
                    file,
                    settings.comparison_field,
                )
            })
            .collect();

        if cancel.is_cancelled() {
            return Outcome::Cancelled;
        }

        let mut using = Vec::new();
        let mut against = Vec::new();
        for item in &items {
            let entry_id = entries[item.entry].id.as_str();
            if using_ids.contains(entry_id) {
                using.push(item.id);
            }
            if against_ids.contains(entry_id) {
                against.push(item.id);
            }
        }

        let duration = start.elapsed();
        debug!(
            "Parsed {} entries into {} items in {:.2}s ({} files excluded)",
            entries.len(),
            items.len(),
            duration.as_secs_f64(),
            excluded_files
        );
        reporter.on_parse_complete(items.len(), excluded_files, duration.as_secs_f64());

        Outcome::Completed(SimilarityGraph {
            entries,
            items,
            using,
            against,
            floor: settings.graph_threshold,
            excluded_files,
        })
    }

    /// Score one pair and store the edge on both items if it is worth keeping.
    ///
    /// No-op for self pairs and pairs that already have an edge.
    pub fn compare(&self, a: ItemId, b: ItemId) -> Option<Similarity> {
        if a == b {
            return None;
        }

        let item_a = &self.items[a.index()];
        let item_b = &self.items[b.index()];
        if item_a.similarities.contains_key(&b) || item_b.similarities.contains_key(&a) {
            return None;
        }

        let similarity = if item_a.entry == item_b.entry && item_a.release_part && item_b.release_part {
            Similarity::StructurallyLinked
        } else {
            Similarity::Score(item_a.profile.cosine(&item_b.profile))
        };

        if !similarity.meets(self.floor) {
            return None;
        }

        trace!(
            "{} <-> {}: {:?}",
            item_a.file.declared_path,
            item_b.file.declared_path,
            similarity
        );
        // First writer wins, so a pair scored from both sides keeps one value.
        let stored = *item_a.similarities.entry(b).or_insert(similarity);
        item_b.similarities.entry(a).or_insert(stored);
        Some(stored)
    }

    /// Compare every `using` item against every `against` item on the current rayon pool.
    pub fn compare_all(
        &self,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Outcome<CompareStats> {
        let start = Instant::now();
        let total = self.using.len();
        let compared = AtomicUsize::new(0);
        let report_every = (total / 100).max(1);

        info!(
            "Comparing {} files against {} files...",
            total,
            self.against.len()
        );
        reporter.on_compare_start(total);

        self.using.par_iter().for_each(|&a| {
            if cancel.is_cancelled() {
                return;
            }
            for &b in &self.against {
                self.compare(a, b);
            }
            let done = compared.fetch_add(1, Ordering::Relaxed) + 1;
            if done % report_every == 0 {
                reporter.on_compare_progress(done, total);
            }
        });

        if cancel.is_cancelled() {
            info!("Comparison cancelled");
            return Outcome::Cancelled;
        }

        let edges = self.edge_count();
        let duration = start.elapsed();
        debug!(
            "Comparison completed in {:.2}s: {} edges",
            duration.as_secs_f64(),
            edges
        );
        reporter.on_compare_complete(edges, duration.as_secs_f64());

        Outcome::Completed(CompareStats {
            compared_items: compared.into_inner(),
            edges,
        })
    }

    pub fn items(&self) -> &[ComparableItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> &ComparableItem {
        &self.items[id.index()]
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry_of(&self, id: ItemId) -> &CatalogEntry {
        &self.entries[self.item(id).entry]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    pub fn excluded_files(&self) -> usize {
        self.excluded_files
    }

    /// Stored edge between two items, looked up from either side.
    pub fn similarity(&self, a: ItemId, b: ItemId) -> Option<Similarity> {
        self.item(a)
            .similarity_to(b)
            .or_else(|| self.item(b).similarity_to(a))
    }

    /// Neighbors of an item ordered by id, so callers iterate deterministically.
    pub fn neighbors(&self, id: ItemId) -> Vec<(ItemId, Similarity)> {
        let mut neighbors: Vec<(ItemId, Similarity)> = self
            .item(id)
            .similarities
            .iter()
            .map(|edge| (*edge.key(), *edge.value()))
            .collect();
        neighbors.sort_by_key(|(other, _)| *other);
        neighbors
    }

    pub fn edge_count(&self) -> usize {
        self.items.iter().map(|i| i.similarities.len()).sum::<usize>() / 2
    }
}

/// Whether a declared path carries a multi-part marker.
pub fn is_release_part(path: &str) -> bool {
    SAME_RELEASE_PART.is_match(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogFile, VariableExpander};
    use crate::progress::SilentReporter;

    fn entry(id: &str, platform: &str, paths: &[&str]) -> CatalogEntry {
        CatalogEntry {
            id: id.to_string(),
            name: id.to_string(),
            platform_ids: vec![platform.to_string()],
            release_year: None,
            install_dir: None,
            files: paths
                .iter()
                .map(|p| CatalogFile {
                    name: None,
                    path: p.to_string(),
                })
                .collect(),
        }
    }

    fn graph(entries: Vec<CatalogEntry>) -> SimilarityGraph {
        let snapshot = CatalogSnapshot {
            entries,
            ..Default::default()
        };
        SimilarityGraph::build(
            &snapshot,
            &ComparisonSettings::default(),
            &VariableExpander::default(),
            &SilentReporter,
            &CancelToken::new(),
        )
        .completed()
        .unwrap()
    }

    #[test]
    fn test_release_part_markers() {
        assert!(is_release_part("/roms/Chrono Trigger (Disc 1).bin"));
        assert!(is_release_part("/roms/Game [disk 2].img"));
        assert!(is_release_part("/bs/BS Zelda 01-04 (J).bs"));
        assert!(!is_release_part("/roms/Super Mario Bros (USA).nes"));
        assert!(!is_release_part("/roms/Discworld (Europe).bin"));
    }

    #[test]
    fn test_build_skips_entries_without_files() {
        let g = graph(vec![
            entry("a", "p", &["/roms/Alpha.nes"]),
            entry("b", "p", &[]),
            entry("c", "p", &["/roms/Gamma.nes", "/roms/Gamma (Beta).nes"]),
        ]);
        assert_eq!(g.len(), 3);
        assert_eq!(g.items()[0].comparison_text, "ALPHA");
        assert_eq!(g.entry_of(ItemId(2)).id, "c");
        assert_eq!(g.items()[2].file.index, 1);
    }

    #[test]
    fn test_compare_is_symmetric_and_write_once() {
        let g = graph(vec![
            entry("a", "p", &["/roms/Pokemon Red (USA).gb"]),
            entry("b", "p", &["/roms/Pokemon Blue (USA).gb"]),
        ]);
        let first = g.compare(ItemId(0), ItemId(1)).unwrap();
        assert_eq!(g.compare(ItemId(1), ItemId(0)), None);
        assert_eq!(g.compare(ItemId(0), ItemId(0)), None);
        assert_eq!(g.similarity(ItemId(0), ItemId(1)), Some(first));
        assert_eq!(g.similarity(ItemId(1), ItemId(0)), Some(first));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_compare_drops_pairs_below_floor() {
        let g = graph(vec![
            entry("a", "p", &["/roms/Tetris.gb"]),
            entry("b", "p", &["/roms/Kirby Dream Land.gb"]),
        ]);
        assert_eq!(g.compare(ItemId(0), ItemId(1)), None);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn test_multi_disc_same_entry_is_linked() {
        let g = graph(vec![entry(
            "ff",
            "p",
            &["/roms/Chrono Trigger (Disc 1).bin", "/roms/Chrono Trigger (Disc 2).bin"],
        )]);
        assert_eq!(
            g.compare(ItemId(0), ItemId(1)),
            Some(Similarity::StructurallyLinked)
        );
        assert_eq!(
            g.similarity(ItemId(1), ItemId(0)),
            Some(Similarity::StructurallyLinked)
        );
    }

    #[test]
    fn test_multi_disc_across_entries_is_scored() {
        let g = graph(vec![
            entry("a", "p", &["/roms/Chrono Trigger (Disc 1).bin"]),
            entry("b", "p", &["/roms/Chrono Trigger (Disc 2).bin"]),
        ]);
        assert_eq!(g.compare(ItemId(0), ItemId(1)), Some(Similarity::Score(1.0)));
    }

    #[test]
    fn test_compare_all_reports_progress_and_edges() {
        let g = graph(vec![
            entry("a", "p", &["/roms/Super Mario Bros (USA).nes"]),
            entry("b", "p", &["/roms/Super Mario Bros (Europe).nes"]),
            entry("c", "p", &["/roms/Zelda.nes"]),
        ]);
        let stats = g
            .compare_all(&SilentReporter, &CancelToken::new())
            .completed()
            .unwrap();
        assert_eq!(stats.compared_items, 3);
        assert_eq!(stats.edges, 1);
        assert_eq!(g.neighbors(ItemId(0)), vec![(ItemId(1), Similarity::Score(1.0))]);
    }

    #[test]
    fn test_compare_all_observes_cancellation() {
        let g = graph(vec![
            entry("a", "p", &["/roms/A.nes"]),
            entry("b", "p", &["/roms/A (Europe).nes"]),
        ]);
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(g.compare_all(&SilentReporter, &cancel).is_cancelled());
    }
}
