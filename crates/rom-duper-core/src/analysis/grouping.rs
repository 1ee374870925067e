use super::group::{DuplicateGroup, GroupId, GroupMember};
use super::similarity::{ItemId, Similarity, SimilarityGraph};
use crate::config::{CategoryFilter, GroupingSettings};
use crate::platform::{PlatformCategory, PlatformDirectory};
use crate::progress::{CancelToken, Outcome, ProgressReporter};
use ahash::AHashSet;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, info};

struct GroupRecord {
    members: Vec<ItemId>,
    alive: bool,
}

/// Partitions a similarity graph into duplicate groups.
///
/// Groups are kept in an arena indexed by position; each item records the
/// index of its group, so merging moves members and retires the smaller record.
pub struct DuplicateGrouper<'a> {
    graph: &'a SimilarityGraph,
    settings: GroupingSettings,
    platform_sets: Vec<AHashSet<&'a str>>,
    category_sets: Vec<BTreeSet<PlatformCategory>>,
}

impl<'a> DuplicateGrouper<'a> {
    pub fn new(
        graph: &'a SimilarityGraph,
        platforms: &PlatformDirectory,
        settings: GroupingSettings,
    ) -> Self {
        let platform_sets = graph
            .entries()
            .iter()
            .map(|e| e.platform_ids.iter().map(String::as_str).collect())
            .collect();
        let category_sets = graph
            .entries()
            .iter()
            .map(|e| platforms.categories_of(&e.platform_ids))
            .collect();

        Self {
            graph,
            settings,
            platform_sets,
            category_sets,
        }
    }

    fn passes_filter(&self, a: ItemId, b: ItemId) -> bool {
        let entry_a = self.graph.item(a).entry;
        let entry_b = self.graph.item(b).entry;
        match self.settings.category_filter {
            CategoryFilter::AllPlatforms => true,
            CategoryFilter::SamePlatform => !self.platform_sets[entry_a]
                .is_disjoint(&self.platform_sets[entry_b]),
            CategoryFilter::SamePlatformCategory => !self.category_sets[entry_a]
                .is_disjoint(&self.category_sets[entry_b]),
        }
    }

    fn groupable(&self, a: ItemId, b: ItemId, similarity: Similarity) -> bool {
        self.passes_filter(a, b) && similarity.meets(self.settings.threshold)
    }

    /// Build the groups, discard those with fewer than two independent members,
    /// and order them by size (descending) then by first member's entry name.
    pub fn group(
        &self,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Outcome<Vec<DuplicateGroup>> {
        let start = Instant::now();
        let total = self.graph.len();
        let report_every = (total / 100).max(1);

        let mut arena: Vec<GroupRecord> = Vec::new();
        let mut assignment: Vec<Option<usize>> = vec![None; total];
        let mut parent: Vec<Option<ItemId>> = vec![None; total];
        let mut has_parts: Vec<bool> = vec![false; total];

        info!(
            "Grouping {} items (threshold={:.2}, filter={:?})...",
            total, self.settings.threshold, self.settings.category_filter
        );
        reporter.on_group_start(total);

        for item in self.graph.items() {
            if cancel.is_cancelled() {
                info!("Grouping cancelled");
                return Outcome::Cancelled;
            }
            let i = item.id.index();

            for (other, similarity) in self.graph.neighbors(item.id) {
                if !self.groupable(item.id, other, similarity) {
                    continue;
                }
                let j = other.index();

                let current = match assignment[i] {
                    Some(group) => group,
                    None => {
                        arena.push(GroupRecord {
                            members: vec![item.id],
                            alive: true,
                        });
                        assignment[i] = Some(arena.len() - 1);
                        arena.len() - 1
                    }
                };

                let assigned = assignment[j];
                match assigned {
                    Some(group) if group == current => {}
                    Some(group) => merge(&mut arena, &mut assignment, current, group),
                    None => {
                        arena[current].members.push(other);
                        assignment[j] = Some(current);
                    }
                }

                if similarity.is_linked()
                    && parent[i].is_none()
                    && parent[j].is_none()
                    && !has_parts[j]
                {
                    parent[j] = Some(item.id);
                    has_parts[i] = true;
                }
            }

            if (i + 1) % report_every == 0 {
                reporter.on_group_progress(i + 1, total);
            }
        }

        let mut groups: Vec<DuplicateGroup> = arena
            .into_iter()
            .filter(|record| record.alive)
            .map(|record| self.materialize(record.members, &parent))
            .filter(|group| group.independent_count() >= 2)
            .collect();

        groups.sort_by_cached_key(|g| {
            (
                std::cmp::Reverse(g.len()),
                g.representative_name().to_lowercase(),
            )
        });
        for (index, group) in groups.iter_mut().enumerate() {
            group.id = GroupId(index);
            for member in group.members.iter_mut() {
                member.group = GroupId(index);
            }
        }

        let duration = start.elapsed();
        debug!(
            "Grouping completed in {:.2}s: {} groups",
            duration.as_secs_f64(),
            groups.len()
        );
        reporter.on_group_complete(groups.len(), duration.as_secs_f64());
        Outcome::Completed(groups)
    }

    fn materialize(&self, items: Vec<ItemId>, parent: &[Option<ItemId>]) -> DuplicateGroup {
        let members = items
            .iter()
            .map(|&item| {
                let mut member = GroupMember::from_graph(self.graph, item, GroupId(0));
                member.parent = parent[item.index()];
                member.similarity_average = self.similarity_average(item, &items);
                member
            })
            .collect();

        DuplicateGroup {
            id: GroupId(0),
            members,
        }
    }

    fn similarity_average(&self, item: ItemId, group: &[ItemId]) -> Option<f32> {
        let scores: Vec<f32> = group
            .iter()
            .filter(|&&other| other != item)
            .filter_map(|&other| self.graph.similarity(item, other))
            .filter_map(Similarity::score)
            .collect();

        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f32>() / scores.len() as f32)
        }
    }
}

/// Fold the smaller of two groups into the larger; on a tie `a` survives.
fn merge(arena: &mut [GroupRecord], assignment: &mut [Option<usize>], a: usize, b: usize) {
    let (keep, retire) = if arena[a].members.len() >= arena[b].members.len() {
        (a, b)
    } else {
        (b, a)
    };

    let moved = std::mem::take(&mut arena[retire].members);
    for &item in &moved {
        assignment[item.index()] = Some(keep);
    }
    arena[keep].members.extend(moved);
    arena[retire].alive = false;
}
