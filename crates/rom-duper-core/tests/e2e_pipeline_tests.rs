use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::tempdir;

use rom_duper_core::analysis::{file_exists, find_missing_files, DeletionPlan, EntryAction};
use rom_duper_core::catalog::{CatalogSnapshot, VariableExpander};
use rom_duper_core::config::{load_configuration, EntrySource};
use rom_duper_core::platform::PlatformDirectory;
use rom_duper_core::{CallbackReporter, CancelToken, DuplicateEngine, SilentReporter};

/// Layout:
///   roms/
///     nes/Super Mario Bros (USA).nes
///     nes/Super Mario Bros (Europe).nes
///     psx/Final Fantasy VII (USA) (Disc 1).bin
///     psx/Final Fantasy VII (USA) (Disc 2).bin
///     psx/Final Fantasy 7 (Europe) (Disc 1).bin
///   (Final Fantasy 7 (Europe) (Disc 2).bin is referenced but missing)
fn create_library(root: &Path) {
    fs::create_dir_all(root.join("nes")).unwrap();
    fs::create_dir_all(root.join("psx")).unwrap();
    for file in [
        "nes/Super Mario Bros (USA).nes",
        "nes/Super Mario Bros (Europe).nes",
        "psx/Final Fantasy VII (USA) (Disc 1).bin",
        "psx/Final Fantasy VII (USA) (Disc 2).bin",
        "psx/Final Fantasy 7 (Europe) (Disc 1).bin",
    ] {
        fs::write(root.join(file), b"rom").unwrap();
    }
}

const CATALOG: &str = r#"{
    "platforms": [
        { "id": "p-nes", "name": "Nintendo Entertainment System" },
        { "id": "p-psx", "name": "Sony PlayStation" }
    ],
    "entries": [
        { "id": "smb-eu", "name": "Super Mario Bros.", "platform_ids": ["p-nes"], "release_year": 1987,
          "files": [{ "path": "{RomDir}/nes/Super Mario Bros (Europe).nes" }] },
        { "id": "smb-us", "name": "Super Mario Bros.", "platform_ids": ["p-nes"], "release_year": 1985,
          "files": [{ "path": "{RomDir}/nes/Super Mario Bros (USA).nes" }] },
        { "id": "ff7-us", "name": "Final Fantasy VII", "platform_ids": ["p-psx"], "release_year": 1997,
          "files": [
            { "path": "{RomDir}/psx/Final Fantasy VII (USA) (Disc 1).bin" },
            { "path": "{RomDir}/psx/Final Fantasy VII (USA) (Disc 2).bin" }
          ] },
        { "id": "ff7-eu", "name": "Final Fantasy VII", "platform_ids": ["p-psx"], "release_year": 1997,
          "files": [
            { "path": "{RomDir}/psx/Final Fantasy 7 (Europe) (Disc 1).bin" },
            { "path": "{RomDir}/psx/Final Fantasy 7 (Europe) (Disc 2).bin" }
          ] },
        { "id": "tetris", "name": "Tetris", "platform_ids": ["p-nes"], "files": [{ "path": "" }] },
        { "id": "empty", "name": "No Files", "platform_ids": ["p-nes"] }
    ],
    "filtered": ["smb-us"],
    "selected": []
}"#;

fn load(root: &Path) -> (CatalogSnapshot, VariableExpander) {
    let catalog_path = root.join("catalog.json");
    fs::write(&catalog_path, CATALOG).unwrap();
    let snapshot = CatalogSnapshot::load(&catalog_path).unwrap();

    let variables = [("RomDir".to_string(), root.join("roms").to_string_lossy().into_owned())]
        .into_iter()
        .collect();
    (snapshot, VariableExpander::new(&variables))
}

#[test]
fn test_full_pipeline_from_catalog_file() {
    let tmp = tempdir().unwrap();
    create_library(&tmp.path().join("roms"));
    let (snapshot, expander) = load(tmp.path());

    let engine = DuplicateEngine::new(Default::default(), PlatformDirectory::from_snapshot(&snapshot))
        .with_worker_threads(2);
    let report = engine
        .run(&snapshot, &expander, &SilentReporter, &CancelToken::new())
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(report.stats.entries_parsed, 6);
    assert_eq!(report.stats.items_parsed, 6);
    assert_eq!(report.stats.excluded_files, 1);
    assert_eq!(report.groups.len(), 2);

    // Largest group first: the two FF7 releases with their second discs.
    let ff7 = &report.groups[0];
    assert_eq!(ff7.len(), 4);
    assert_eq!(ff7.independent_count(), 2);
    assert_eq!(ff7.members[0].entry_id, "ff7-us");
    assert!(!ff7.members[0].delete);
    assert_eq!(ff7.common_path(), tmp.path().join("roms").join("psx"));

    // Newer release year outranks the USA tag.
    let smb = &report.groups[1];
    assert_eq!(smb.members[0].entry_id, "smb-eu");
    assert!(smb.members[1].delete);

    let plan = DeletionPlan::from_groups(&report.groups, &snapshot);
    let actions: Vec<(&str, &EntryAction)> = plan
        .entries
        .iter()
        .map(|e| (e.entry_id.as_str(), &e.action))
        .collect();
    assert_eq!(
        actions,
        vec![
            ("ff7-eu", &EntryAction::RemoveEntry),
            ("smb-us", &EntryAction::RemoveEntry)
        ]
    );
    assert_eq!(plan.file_count(), 3);
}

#[test]
fn test_using_filtered_entries_against_all() {
    let tmp = tempdir().unwrap();
    create_library(&tmp.path().join("roms"));
    let (snapshot, expander) = load(tmp.path());

    let settings = rom_duper_core::ComparisonSettings {
        using_source: EntrySource::FilteredEntries,
        ..Default::default()
    };
    let engine = DuplicateEngine::new(settings, PlatformDirectory::from_snapshot(&snapshot));
    let report = engine
        .run(&snapshot, &expander, &SilentReporter, &CancelToken::new())
        .unwrap()
        .completed()
        .unwrap();

    assert_eq!(report.stats.items_compared, 1);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].len(), 2);
}

#[test]
fn test_progress_is_reported_through_callback() {
    let tmp = tempdir().unwrap();
    create_library(&tmp.path().join("roms"));
    let (snapshot, expander) = load(tmp.path());

    let messages: Mutex<Vec<String>> = Mutex::new(Vec::new());
    let reporter = CallbackReporter::new(|_, _, message: &str| {
        messages.lock().unwrap().push(message.to_string());
    });
    let engine = DuplicateEngine::new(Default::default(), PlatformDirectory::from_snapshot(&snapshot));
    engine
        .run(&snapshot, &expander, &reporter, &CancelToken::new())
        .unwrap();
    drop(reporter);

    let messages = messages.into_inner().unwrap();
    assert_eq!(messages.first().map(String::as_str), Some("Parsing entries..."));
    assert!(messages.iter().any(|m| m.starts_with("Comparing files... (")));
    assert_eq!(messages.last().map(String::as_str), Some("Grouping complete"));
}

#[test]
fn test_missing_files_report() {
    let tmp = tempdir().unwrap();
    create_library(&tmp.path().join("roms"));
    let (snapshot, expander) = load(tmp.path());

    let entries = snapshot.entries_for(EntrySource::AllEntries);
    let missing = find_missing_files(&entries, &expander, file_exists, &CancelToken::new())
        .completed()
        .unwrap();

    let summary: Vec<(&str, &EntryAction)> = missing
        .iter()
        .map(|m| (m.entry_id.as_str(), &m.action))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("ff7-eu", &EntryAction::RemoveFiles(vec![1])),
            ("tetris", &EntryAction::RemoveEntry)
        ]
    );
    assert_eq!(
        missing[0].missing,
        vec!["{RomDir}/psx/Final Fantasy 7 (Europe) (Disc 2).bin".to_string()]
    );
}

#[test]
fn test_configuration_drives_expansion() {
    let tmp = tempdir().unwrap();
    create_library(&tmp.path().join("roms"));
    fs::write(tmp.path().join("catalog.json"), CATALOG).unwrap();

    let config_path = tmp.path().join("rom-duper.toml");
    fs::write(
        &config_path,
        format!(
            "catalog_path = {:?}\n\n[comparison]\ncategory_filter = \"all_platforms\"\n\n[variables]\nromdir = {:?}\n",
            tmp.path().join("catalog.json").to_string_lossy(),
            tmp.path().join("roms").to_string_lossy()
        ),
    )
    .unwrap();

    let config = load_configuration(Some(&config_path)).unwrap();
    let snapshot = CatalogSnapshot::load(Path::new(&config.catalog_path)).unwrap();
    let expander = VariableExpander::new(&config.variables);
    let engine = DuplicateEngine::new(config.comparison.clone(), PlatformDirectory::from_snapshot(&snapshot));
    let report = engine
        .run(&snapshot, &expander, &SilentReporter, &CancelToken::new())
        .unwrap()
        .completed()
        .unwrap();
    assert_eq!(report.groups.len(), 2);
}
