use anyhow::{Context, Result};
use chrono::Local;
use colored::*;
use rom_duper_core::analysis::{DeletionPlan, DuplicateGroup, EntryAction, MissingEntry};
use rom_duper_core::platform::PlatformDirectory;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub fn print_groups(groups: &[DuplicateGroup], platforms: &PlatformDirectory) {
    for group in groups {
        let common = group.common_path();
        println!(
            "\n{} {} ({} files) in {}",
            format!("#{}", group.id.0 + 1).bold(),
            group.representative_name().bold(),
            group.len(),
            common.display().to_string().dimmed()
        );

        for member in &group.members {
            let marker = if member.delete {
                "delete".red()
            } else {
                "keep  ".green()
            };
            let indent = if member.is_independent() { "  " } else { "    ↳ " };
            let similarity = member
                .similarity_average
                .map(|s| format!("{:.0}%", s * 100.0))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{}{} {} [{}] {}",
                indent,
                marker,
                group.relative_path(member).display(),
                platforms.display_names(&member.platform_ids).join(", ").cyan(),
                similarity.dimmed()
            );
        }
    }
}

#[derive(Serialize)]
struct CsvRow<'a> {
    group: usize,
    entry_id: &'a str,
    entry_name: &'a str,
    platforms: String,
    release_year: Option<i32>,
    path: String,
    part_of: Option<u32>,
    similarity: Option<f32>,
    delete: bool,
}

pub fn write_csv(groups: &[DuplicateGroup], platforms: &PlatformDirectory, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create CSV report '{}'", path.display()))?;

    for group in groups {
        for member in &group.members {
            writer.serialize(CsvRow {
                group: group.id.0 + 1,
                entry_id: &member.entry_id,
                entry_name: &member.entry_name,
                platforms: platforms.display_names(&member.platform_ids).join("; "),
                release_year: member.release_year,
                path: member.resolved_path.to_string_lossy().into_owned(),
                part_of: member.parent.map(|p| p.0),
                similarity: member.similarity_average,
                delete: member.delete,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write the plan as `deletion-plan-<timestamp>.json` inside `dir`.
pub fn write_plan(plan: &DeletionPlan, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create plan directory '{}'", dir.display()))?;
    let file_name = format!("deletion-plan-{}.json", Local::now().format("%Y%m%d-%H%M%S"));
    let path = dir.join(file_name);
    plan.write_json(&path)?;
    Ok(path)
}

pub fn print_missing(missing: &[MissingEntry]) {
    for entry in missing {
        let action = match &entry.action {
            EntryAction::RemoveEntry => "remove entry".red(),
            EntryAction::RemoveFiles(indices) => format!("remove {} file(s)", indices.len()).yellow(),
        };
        println!("{} ({})", entry.entry_name.bold(), action);
        for path in &entry.missing {
            println!("    {}", path.dimmed());
        }
    }
}
