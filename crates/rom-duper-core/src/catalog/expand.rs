use super::{normalize_lexically, CatalogEntry};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::PathBuf;

lazy_static::lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([^{}]+)\}").unwrap();
}

/// Turns a declared file path into an absolute one.
///
/// Returns `None` when the path cannot be resolved; such files are left out
/// of the comparison rather than treated as errors.
pub trait PathExpander: Send + Sync {
    fn expand(&self, entry: &CatalogEntry, declared_path: &str) -> Option<PathBuf>;
}

impl<F> PathExpander for F
where
    F: Fn(&CatalogEntry, &str) -> Option<PathBuf> + Send + Sync,
{
    fn expand(&self, entry: &CatalogEntry, declared_path: &str) -> Option<PathBuf> {
        self(entry, declared_path)
    }
}

/// Substitutes `{Name}` placeholders from a variable map (case-insensitive)
/// and `{InstallDir}` from the entry, then makes the path absolute against
/// `base_dir`. Braces that name no known variable are left in place, since
/// ROM file names carry `{...}` annotations of their own.
#[derive(Debug, Clone, Default)]
pub struct VariableExpander {
    variables: HashMap<String, String>,
    base_dir: Option<PathBuf>,
}

impl VariableExpander {
    pub fn new(variables: &HashMap<String, String>) -> Self {
        Self {
            variables: variables
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
            base_dir: None,
        }
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    fn lookup(&self, entry: &CatalogEntry, name: &str) -> Option<String> {
        let key = name.to_lowercase();
        if key == "installdir" {
            if let Some(dir) = &entry.install_dir {
                return Some(dir.clone());
            }
        }
        self.variables.get(&key).cloned()
    }
}

impl PathExpander for VariableExpander {
    fn expand(&self, entry: &CatalogEntry, declared_path: &str) -> Option<PathBuf> {
        if declared_path.trim().is_empty() {
            return None;
        }

        let expanded = PLACEHOLDER.replace_all(declared_path, |caps: &Captures| {
            self.lookup(entry, &caps[1])
                .unwrap_or_else(|| caps[0].to_string())
        });

        let path = PathBuf::from(expanded.as_ref());
        let absolute = if path.is_absolute() {
            path
        } else {
            match &self.base_dir {
                Some(base) => base.join(path),
                None => std::env::current_dir().ok()?.join(path),
            }
        };
        Some(normalize_lexically(&absolute))
    }
}
