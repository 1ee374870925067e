use crate::analysis::{CandidateRanker, DuplicateGroup, DuplicateGrouper, SimilarityGraph};
use crate::catalog::{CatalogSnapshot, PathExpander};
use crate::config::{ComparisonSettings, GroupingSettings};
use crate::error::Error;
use crate::platform::PlatformDirectory;
use crate::progress::{CancelToken, Outcome, ProgressReporter};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub struct DuplicateEngine {
    settings: ComparisonSettings,
    platforms: PlatformDirectory,
    worker_threads: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub entries_parsed: usize,
    pub items_parsed: usize,
    pub excluded_files: usize,
    pub items_compared: usize,
    pub edges_stored: usize,
    pub parse_duration: Duration,
    pub compare_duration: Duration,
    pub group_duration: Duration,
}

#[derive(Debug)]
pub struct DuplicateReport {
    pub graph: SimilarityGraph,
    pub groups: Vec<DuplicateGroup>,
    pub stats: RunStats,
}

impl DuplicateReport {
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.len()).sum()
    }

    pub fn proposed_deletions(&self) -> usize {
        self.groups.iter().map(|g| g.delete_count()).sum()
    }
}

impl DuplicateEngine {
    pub fn new(settings: ComparisonSettings, platforms: PlatformDirectory) -> Self {
        Self {
            settings,
            platforms,
            worker_threads: 0,
        }
    }

    /// Bound the comparison pool; 0 uses one worker per CPU.
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    pub fn platforms(&self) -> &PlatformDirectory {
        &self.platforms
    }

    fn thread_pool(&self) -> Result<ThreadPool, Error> {
        ThreadPoolBuilder::new()
            .num_threads(self.worker_threads)
            .thread_name(|i| format!("rom-duper-{}", i))
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))
    }

    /// Run the full pipeline:
    /// 1. Parse the selected entries into comparable items
    /// 2. Compare `using` against `against` in parallel, storing edges above the floor
    /// 3. Group, rank and propose deletions
    pub fn run(
        &self,
        snapshot: &CatalogSnapshot,
        expander: &dyn PathExpander,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Outcome<DuplicateReport>, Error> {
        self.settings.validate()?;
        let pool = self.thread_pool()?;
        info!(
            "Searching for duplicates ({} workers, field={:?}, floor={:.2})",
            pool.current_num_threads(),
            self.settings.comparison_field,
            self.settings.graph_threshold
        );

        // Phase 1: Parse
        info!("Parsing catalog entries...");
        let parse_start = Instant::now();
        let graph = match pool.install(|| {
            SimilarityGraph::build(snapshot, &self.settings, expander, reporter, cancel)
        }) {
            Outcome::Completed(graph) => graph,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };
        let parse_duration = parse_start.elapsed();
        debug!(
            "Parse completed in {:.2}s, {} items",
            parse_duration.as_secs_f64(),
            graph.len()
        );

        // Phase 2: Compare
        let compare_start = Instant::now();
        let compared = match pool.install(|| graph.compare_all(reporter, cancel)) {
            Outcome::Completed(stats) => stats,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };
        let compare_duration = compare_start.elapsed();

        // Phase 3: Group + rank
        let group_start = Instant::now();
        let groups = match self.group(&graph, self.settings.grouping(), reporter, cancel) {
            Outcome::Completed(groups) => groups,
            Outcome::Cancelled => return Ok(Outcome::Cancelled),
        };
        let group_duration = group_start.elapsed();

        let stats = RunStats {
            entries_parsed: graph.entries().len(),
            items_parsed: graph.len(),
            excluded_files: graph.excluded_files(),
            items_compared: compared.compared_items,
            edges_stored: compared.edges,
            parse_duration,
            compare_duration,
            group_duration,
        };
        info!(
            "Found {} duplicate groups ({} files, {} proposed for deletion)",
            groups.len(),
            groups.iter().map(|g| g.len()).sum::<usize>(),
            groups.iter().map(|g| g.delete_count()).sum::<usize>()
        );

        Ok(Outcome::Completed(DuplicateReport {
            graph,
            groups,
            stats,
        }))
    }

    /// Re-run grouping and ranking on an existing graph with new grouping settings.
    ///
    /// Edges below the graph's floor were never stored, so a threshold below it is refused.
    pub fn regroup(
        &self,
        graph: &SimilarityGraph,
        grouping: GroupingSettings,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Outcome<Vec<DuplicateGroup>>, Error> {
        if !(0.0..=1.0).contains(&grouping.threshold) {
            return Err(Error::InvalidSetting(format!(
                "grouping threshold must be between 0 and 1, got {}",
                grouping.threshold
            )));
        }
        if grouping.threshold < graph.floor() {
            return Err(Error::InvalidSetting(format!(
                "grouping threshold {:.2} is below the similarity floor {:.2}; rebuild the graph",
                grouping.threshold,
                graph.floor()
            )));
        }
        Ok(self.group(graph, grouping, reporter, cancel))
    }

    fn group(
        &self,
        graph: &SimilarityGraph,
        grouping: GroupingSettings,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Outcome<Vec<DuplicateGroup>> {
        let grouper = DuplicateGrouper::new(graph, &self.platforms, grouping);
        grouper.group(reporter, cancel).map(|mut groups| {
            CandidateRanker::new(&self.platforms).rank_and_propose(&mut groups);
            groups
        })
    }
}
