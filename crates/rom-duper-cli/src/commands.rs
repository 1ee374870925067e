use clap::{Args, Parser, Subcommand, ValueEnum};
use rom_duper_core::config::{CategoryFilter, ComparisonField, ComparisonSettings, EntrySource};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rom-duper")]
#[command(about = "Find duplicate ROM files in a game catalog", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./Config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog snapshot to read instead of the configured one
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Find duplicate files and propose which copies to delete (default)
    Find(FindArgs),
    /// Report catalog entries whose files are missing on disk
    Missing {
        /// Which entries to check
        #[arg(long, value_enum, default_value_t = SourceArg::All)]
        source: SourceArg,
    },
    /// Print the comparison string for each name
    Normalize {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Default, Args)]
pub struct FindArgs {
    /// Write every group member to a CSV report
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Directory to write a timestamped JSON deletion plan into
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Similarity floor below which pairs are not recorded
    #[arg(long)]
    pub graph_threshold: Option<f32>,

    /// Similarity needed to group two files
    #[arg(long)]
    pub grouping_threshold: Option<f32>,

    #[arg(long, value_enum)]
    pub field: Option<FieldArg>,

    /// Entries whose files are compared
    #[arg(long, value_enum)]
    pub using: Option<SourceArg>,

    /// Entries they are compared against
    #[arg(long, value_enum)]
    pub against: Option<SourceArg>,

    #[arg(long, value_enum)]
    pub filter: Option<FilterArg>,
}

impl FindArgs {
    pub fn apply(&self, settings: &mut ComparisonSettings) {
        if let Some(value) = self.graph_threshold {
            settings.graph_threshold = value;
        }
        if let Some(value) = self.grouping_threshold {
            settings.grouping_threshold = value;
        }
        if let Some(field) = self.field {
            settings.comparison_field = field.into();
        }
        if let Some(source) = self.using {
            settings.using_source = source.into();
        }
        if let Some(source) = self.against {
            settings.against_source = source.into();
        }
        if let Some(filter) = self.filter {
            settings.category_filter = filter.into();
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SourceArg {
    All,
    Filtered,
    Selected,
}

impl From<SourceArg> for EntrySource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::All => EntrySource::AllEntries,
            SourceArg::Filtered => EntrySource::FilteredEntries,
            SourceArg::Selected => EntrySource::SelectedEntries,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FieldArg {
    FileName,
    EntryName,
    FullPath,
}

impl From<FieldArg> for ComparisonField {
    fn from(value: FieldArg) -> Self {
        match value {
            FieldArg::FileName => ComparisonField::FileNameNoExt,
            FieldArg::EntryName => ComparisonField::EntryName,
            FieldArg::FullPath => ComparisonField::FullPath,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FilterArg {
    SamePlatform,
    SameCategory,
    AllPlatforms,
}

impl From<FilterArg> for CategoryFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::SamePlatform => CategoryFilter::SamePlatform,
            FilterArg::SameCategory => CategoryFilter::SamePlatformCategory,
            FilterArg::AllPlatforms => CategoryFilter::AllPlatforms,
        }
    }
}
