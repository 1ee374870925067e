use super::group::DuplicateGroup;
use crate::platform::PlatformDirectory;
use std::cmp::Reverse;
use std::path::Path;

/// Orders group members by keep preference and proposes which ones to delete.
pub struct CandidateRanker<'a> {
    platforms: &'a PlatformDirectory,
}

impl<'a> CandidateRanker<'a> {
    pub fn new(platforms: &'a PlatformDirectory) -> Self {
        Self { platforms }
    }

    /// Best platform first, then newest release, then preferred region,
    /// independent members before parts, and finally path (descending,
    /// case-insensitive).
    pub fn rank(&self, group: &mut DuplicateGroup) {
        group.members.sort_by_cached_key(|m| {
            (
                Reverse(self.platforms.rank_of(&m.platform_ids)),
                Reverse(m.release_year.unwrap_or(0)),
                Reverse(region_score(&m.resolved_path)),
                !m.is_independent(),
                Reverse(m.resolved_path.to_string_lossy().to_lowercase()),
            )
        });
    }

    /// Keep the top-ranked independent member; everything else is flagged,
    /// with parts following their parent.
    pub fn propose(&self, group: &mut DuplicateGroup) {
        let keep = group.independents().next().map(|m| m.item);
        if let Some(keep) = keep {
            group.keep_exclusively(keep);
        }
    }

    pub fn rank_and_propose(&self, groups: &mut [DuplicateGroup]) {
        for group in groups.iter_mut() {
            self.rank(group);
            self.propose(group);
        }
    }
}

/// Region preference from the file name: USA over Europe over World, plus a
/// bonus for English language tags.
pub fn region_score(path: &Path) -> i32 {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut score = if stem.contains("(usa)") {
        200
    } else if stem.contains("(europe)") {
        150
    } else if stem.contains("(world)") {
        100
    } else {
        0
    };
    if stem.contains("(en") {
        score += 25;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::group::{GroupId, GroupMember};
    use crate::analysis::similarity::ItemId;
    use crate::platform::PlatformTable;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn member(item: u32, platform: &str, year: Option<i32>, path: &str) -> GroupMember {
        GroupMember {
            item: ItemId(item),
            group: GroupId(0),
            entry_id: format!("e{}", item),
            entry_name: format!("Entry {}", item),
            platform_ids: vec![platform.to_string()],
            release_year: year,
            file_index: 0,
            declared_path: path.to_string(),
            resolved_path: PathBuf::from(path),
            comparison_text: String::new(),
            parent: None,
            delete: false,
            similarity_average: None,
        }
    }

    fn directory() -> PlatformDirectory {
        let names = HashMap::from([
            ("snes".to_string(), "Super Nintendo Entertainment System".to_string()),
            ("gba".to_string(), "Nintendo Game Boy Advance".to_string()),
        ]);
        PlatformDirectory::new(names, PlatformTable::builtin())
    }

    fn order(group: &DuplicateGroup) -> Vec<u32> {
        group.members.iter().map(|m| m.item.0).collect()
    }

    #[test]
    fn test_region_score() {
        assert_eq!(region_score(Path::new("/r/Game (USA).sfc")), 200);
        assert_eq!(region_score(Path::new("/r/Game (Europe) (En,Fr).sfc")), 175);
        assert_eq!(region_score(Path::new("/r/Game (World).sfc")), 100);
        assert_eq!(region_score(Path::new("/r/Game (Japan) (En).sfc")), 25);
        assert_eq!(region_score(Path::new("/r/Game (USA, Europe).sfc")), 0);
        assert_eq!(region_score(Path::new("/r/(usa)/Game.sfc")), 0);
    }

    #[test]
    fn test_platform_rank_wins_over_region() {
        let dir = directory();
        let ranker = CandidateRanker::new(&dir);
        let mut group = DuplicateGroup {
            id: GroupId(0),
            members: vec![
                member(0, "gba", None, "/r/Game (USA).gba"),
                member(1, "snes", None, "/r/Game (Japan).sfc"),
            ],
        };
        ranker.rank(&mut group);
        assert_eq!(order(&group), vec![1, 0]);
    }

    #[test]
    fn test_newer_release_then_region_then_path() {
        let dir = directory();
        let ranker = CandidateRanker::new(&dir);
        let mut group = DuplicateGroup {
            id: GroupId(0),
            members: vec![
                member(0, "snes", Some(1994), "/r/a/Game (Europe).sfc"),
                member(1, "snes", Some(1994), "/r/a/Game (USA).sfc"),
                member(2, "snes", Some(1995), "/r/a/Game (Japan).sfc"),
                member(3, "snes", Some(1994), "/r/b/Game (USA).sfc"),
            ],
        };
        ranker.rank(&mut group);
        assert_eq!(order(&group), vec![2, 3, 1, 0]);
    }

    #[test]
    fn test_propose_keeps_top_independent_and_flags_parts() {
        let dir = directory();
        let ranker = CandidateRanker::new(&dir);
        let mut part = member(3, "snes", None, "/r/Game (Europe) (Disc 2).bin");
        part.parent = Some(ItemId(2));
        let mut groups = vec![DuplicateGroup {
            id: GroupId(0),
            members: vec![
                member(1, "snes", None, "/r/Game (USA) (Disc 1).bin"),
                member(2, "snes", None, "/r/Game (Europe) (Disc 1).bin"),
                part,
            ],
        }];
        ranker.rank_and_propose(&mut groups);

        let group = &groups[0];
        assert_eq!(group.members[0].item, ItemId(1));
        assert!(!group.members[0].delete);
        assert!(group.member(ItemId(2)).unwrap().delete);
        assert!(group.member(ItemId(3)).unwrap().delete);
    }

    #[test]
    fn test_propose_marks_all_but_first_independent() {
        let dir = directory();
        let ranker = CandidateRanker::new(&dir);
        let mut group = DuplicateGroup {
            id: GroupId(0),
            members: vec![
                member(0, "snes", None, "/r/Game (USA).sfc"),
                member(1, "snes", None, "/r/Game (Europe).sfc"),
            ],
        };
        ranker.propose(&mut group);
        assert!(!group.members[0].delete);
        assert!(group.members[1].delete);
    }

    #[test]
    fn test_parts_sort_after_independents_on_ties() {
        let dir = directory();
        let ranker = CandidateRanker::new(&dir);
        let mut part = member(0, "snes", None, "/r/z.bin");
        part.parent = Some(ItemId(1));
        let mut group = DuplicateGroup {
            id: GroupId(0),
            members: vec![part, member(1, "snes", None, "/r/a.bin")],
        };
        ranker.rank(&mut group);
        assert_eq!(order(&group), vec![1, 0]);
    }
}
