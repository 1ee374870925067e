use ahash::AHashMap;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PlatformCategory {
    Console,
    LegacyHandheld,
    ModernHandheld,
}

/// One known hardware platform.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    pub names: &'static [&'static str],
    pub category: PlatformCategory,
    /// Position in the hand-picked preference list; higher ranks are preferred.
    pub rank: i64,
    released: (i32, u32, u32),
}

impl PlatformInfo {
    pub fn name(&self) -> &'static str {
        self.names[0]
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        let (year, month, day) = self.released;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

use PlatformCategory::{Console, LegacyHandheld, ModernHandheld};

type PlatformRow = (&'static [&'static str], (i32, u32, u32), PlatformCategory);

// Hand-picked order: roughly by release date, handhelds slotted next to the
// consoles they competed with. Position is the preference rank.
const BUILTIN_PLATFORMS: &[PlatformRow] = &[
    (&["Nintendo Game Boy", "Game Boy", "GB"], (1989, 1, 1), LegacyHandheld),
    (&["Sega Game Gear", "Game Gear"], (1991, 1, 1), LegacyHandheld),
    (&["Virtual Boy"], (1995, 7, 21), LegacyHandheld),
    (&["Nintendo Game Boy Color", "Game Boy Color", "GBC"], (1998, 1, 1), LegacyHandheld),
    (&["Atari 2600"], (1977, 9, 11), Console),
    (&["Atari 5200"], (1982, 11, 1), Console),
    (&["Sega SG-1000", "SG1000"], (1983, 7, 15), Console),
    (&["Nintendo Entertainment System", "NES", "Famicom", "Family Computer"], (1983, 7, 15), Console),
    (&["Master System", "Sega Mark III", "Sega Mark 3"], (1985, 10, 20), Console),
    (&["Nintendo Family Computer Disk System", "Family Computer Disk System", "FDS", "Famicom Disk System"], (1986, 2, 21), Console),
    (&["Atari 7800"], (1986, 5, 1), Console),
    (&["Sega Genesis", "Sega Mega Drive", "Sega Genesis/Megadrive"], (1988, 10, 29), Console),
    (&["Nintendo Game Boy Advance", "Game Boy Advance", "GBA"], (2001, 1, 1), LegacyHandheld),
    (&["Super Nintendo Entertainment System", "Super Famicom", "Nintendo SNES"], (1990, 11, 21), Console),
    (&["Sega CD", "Mega CD"], (1991, 12, 12), Console),
    (&["Sega Pico"], (1993, 6, 26), Console),
    (&["Satellaview", "Satella"], (1995, 4, 23), Console),
    (&["Atari Jaguar"], (1993, 11, 23), Console),
    (&["Sega 32X"], (1994, 11, 21), Console),
    (&["Sega Saturn"], (1994, 11, 22), Console),
    (&["Atari Jaguar CD"], (1995, 9, 21), Console),
    (&["Nintendo 64", "N64"], (1996, 6, 23), Console),
    (&["Sony PlayStation", "PSX"], (1994, 12, 3), Console),
    (&["Nintendo 64DD", "N64DD"], (1999, 12, 1), Console),
    (&["Nintendo DS", "DS", "NDS"], (2004, 1, 1), ModernHandheld),
    (&["Sony Playstation Portable", "PlayStation Portable", "Sony PSP", "PSP", "Sony PSP Mini", "Sony PSP Minis"], (2005, 1, 1), ModernHandheld),
    (&["Sega Dreamcast"], (1998, 11, 27), Console),
    (&["Nintendo 3DS", "3DS"], (2011, 2, 26), ModernHandheld),
    (&["Sony Playstation 2", "PlayStation 2", "PS2"], (2000, 3, 4), Console),
    (&["Nintendo Gamecube", "Gamecube", "GC"], (2001, 9, 14), Console),
    (&["Microsoft Xbox"], (2001, 11, 15), Console),
    (&["Sony PlayStation Vita", "PlayStation Vita", "PSV", "PS Vita"], (2012, 1, 1), ModernHandheld),
    (&["Nintendo Wii"], (2006, 11, 19), Console),
    (&["Microsoft Xbox 360", "Xbox 360", "X360"], (2005, 11, 22), Console),
    (&["Sony Playstation 3", "PlayStation 3", "PS3"], (2006, 11, 11), Console),
    (&["Nintendo Wii U", "Wii U"], (2012, 11, 18), Console),
    (&["Sony Playstation 4", "PlayStation 4", "PS4"], (2013, 11, 15), Console),
    (&["Microsoft Xbox One", "Xbox One", "Xbone", "Xbox One X"], (2013, 11, 22), Console),
    (&["Nintendo Switch"], (2017, 3, 3), Console),
    (&["Microsoft Xbox Series X", "Microsoft Xbox Series S", "Xbox Series X", "Xbox Series S", "Xbox Series"], (2020, 11, 10), Console),
    (&["Sony Playstation 5", "PlayStation 5", "PS5"], (2020, 11, 12), Console),
];

/// Immutable reference data about known hardware platforms, keyed case-insensitively
/// by every alias, every alias with its spaces removed, and every word of an alias.
///
/// Keys are assigned in list order, so a word shared by several platforms
/// ("Sega", "Nintendo") resolves to the last platform that uses it.
#[derive(Debug, Clone)]
pub struct PlatformTable {
    platforms: Vec<PlatformInfo>,
    by_key: AHashMap<String, usize>,
}

impl PlatformTable {
    pub fn builtin() -> Self {
        let platforms: Vec<PlatformInfo> = BUILTIN_PLATFORMS
            .iter()
            .enumerate()
            .map(|(rank, &(names, released, category))| PlatformInfo {
                names,
                category,
                rank: rank as i64,
                released,
            })
            .collect();

        let mut by_key = AHashMap::new();
        for (index, platform) in platforms.iter().enumerate() {
            for name in platform.names {
                by_key.insert(name.to_lowercase(), index);
                by_key.insert(name.replace(' ', "").to_lowercase(), index);
                for word in name.split_whitespace() {
                    let word = word.trim_matches(|c: char| !c.is_alphanumeric());
                    if !word.is_empty() {
                        by_key.insert(word.to_lowercase(), index);
                    }
                }
            }
        }

        Self { platforms, by_key }
    }

    pub fn lookup(&self, name: &str) -> Option<&PlatformInfo> {
        self.by_key
            .get(&name.trim().to_lowercase())
            .map(|&index| &self.platforms[index])
    }

    /// Preference rank, or -1 for platforms that are not in the table.
    pub fn rank(&self, name: &str) -> i64 {
        self.lookup(name).map_or(-1, |info| info.rank)
    }

    /// Category, defaulting to [`PlatformCategory::Console`] for unknown platforms.
    pub fn category(&self, name: &str) -> PlatformCategory {
        self.lookup(name).map_or(Console, |info| info.category)
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

impl Default for PlatformTable {
    fn default() -> Self {
        Self::builtin()
    }
}
