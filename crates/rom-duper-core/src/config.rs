use crate::error::Error;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default floor below which a similarity is not stored at all.
pub const DEFAULT_GRAPH_THRESHOLD: f32 = 0.5;
/// Default similarity needed for two files to be reported as duplicates.
pub const DEFAULT_GROUPING_THRESHOLD: f32 = 0.99;

/// Which slice of the catalog a side of the comparison is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    AllEntries,
    FilteredEntries,
    SelectedEntries,
}

/// Which text of a file reference is fingerprinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonField {
    FileNameNoExt,
    EntryName,
    FullPath,
}

/// Restricts which pairs may be grouped, based on the entries' platform tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    SamePlatform,
    SamePlatformCategory,
    AllPlatforms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonSettings {
    pub using_source: EntrySource,
    pub against_source: EntrySource,
    pub comparison_field: ComparisonField,
    pub graph_threshold: f32,
    pub grouping_threshold: f32,
    pub category_filter: CategoryFilter,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            using_source: EntrySource::AllEntries,
            against_source: EntrySource::AllEntries,
            comparison_field: ComparisonField::FileNameNoExt,
            graph_threshold: DEFAULT_GRAPH_THRESHOLD,
            grouping_threshold: DEFAULT_GROUPING_THRESHOLD,
            category_filter: CategoryFilter::SamePlatform,
        }
    }
}

impl ComparisonSettings {
    pub fn validate(&self) -> Result<(), Error> {
        check_unit_interval("graph_threshold", self.graph_threshold)?;
        check_unit_interval("grouping_threshold", self.grouping_threshold)?;
        Ok(())
    }

    pub fn grouping(&self) -> GroupingSettings {
        GroupingSettings {
            threshold: self.grouping_threshold,
            category_filter: self.category_filter,
        }
    }
}

/// The subset of settings that only affects grouping; changing these never
/// requires the similarity graph to be rebuilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupingSettings {
    pub threshold: f32,
    pub category_filter: CategoryFilter,
}

impl Default for GroupingSettings {
    fn default() -> Self {
        ComparisonSettings::default().grouping()
    }
}

fn check_unit_interval(name: &str, value: f32) -> Result<(), Error> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidSetting(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub catalog_path: String,
    pub comparison: ComparisonSettings,
    /// Size of the worker pool; 0 means one worker per CPU.
    pub worker_threads: usize,
    /// Values substituted for `{Name}` placeholders in declared file paths.
    pub variables: HashMap<String, String>,
}

/// Load `Config.toml` (or `path` when given) layered under `ROM_DUPER__*` environment variables.
pub fn load_configuration(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file_source = match path {
        Some(path) => ConfigFile::from(path).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };

    let builder = Config::builder()
        .add_source(file_source)
        .add_source(Environment::with_prefix("ROM_DUPER").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings_match_documented_defaults() {
        let settings = ComparisonSettings::default();
        assert_eq!(settings.graph_threshold, 0.5);
        assert_eq!(settings.grouping_threshold, 0.99);
        assert_eq!(settings.category_filter, CategoryFilter::SamePlatform);
        assert_eq!(settings.comparison_field, ComparisonField::FileNameNoExt);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_thresholds() {
        let settings = ComparisonSettings {
            grouping_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::InvalidSetting(_))));

        let settings = ComparisonSettings {
            graph_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_configuration_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rom-duper.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
catalog_path = "catalog.json"
worker_threads = 2

[comparison]
comparison_field = "entry_name"
grouping_threshold = 0.9
category_filter = "all_platforms"

[variables]
romdir = "/roms"
"#
        )
        .unwrap();

        let config = load_configuration(Some(&path)).unwrap();
        assert_eq!(config.catalog_path, "catalog.json");
        assert_eq!(config.worker_threads, 2);
        assert_eq!(config.comparison.comparison_field, ComparisonField::EntryName);
        assert_eq!(config.comparison.grouping_threshold, 0.9);
        assert_eq!(config.comparison.graph_threshold, 0.5);
        assert_eq!(config.comparison.category_filter, CategoryFilter::AllPlatforms);
        assert_eq!(config.variables.get("romdir").map(String::as_str), Some("/roms"));
    }
}
