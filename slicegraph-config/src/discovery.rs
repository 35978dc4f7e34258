//! Configuration file discovery
//!
//! Looks for `slicegraph.{toml,yaml,yml,json}` in the global `~/.slicegraph/`
//! directory and the project `./.slicegraph/` directory. Project files take
//! precedence over global ones.

use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

/// Name of the configuration directory, both global and per project.
pub const CONFIG_DIR: &str = ".slicegraph";

const FILE_NAMES: [&str; 4] = [
    "slicegraph.toml",
    "slicegraph.yaml",
    "slicegraph.yml",
    "slicegraph.json",
];

/// A discovered configuration file
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub format: ConfigFormat,
    pub scope: ConfigScope,
}

/// Configuration file format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Where a configuration file was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigScope {
    /// `~/.slicegraph/`
    Global,
    /// `./.slicegraph/`
    Project,
}

/// Finds configuration files in priority order
#[derive(Debug, Clone, Default)]
pub struct FileDiscovery {
    project_dir: Option<PathBuf>,
    global_dir: Option<PathBuf>,
}

impl FileDiscovery {
    /// Discovery rooted at the current directory and the home directory.
    /// Both are resolved when `discover_all` runs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discovery over explicit configuration directories.
    pub fn with_directories(project_dir: Option<PathBuf>, global_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            global_dir,
        }
    }

    /// All configuration files, lowest precedence first.
    pub fn discover_all(&self) -> Vec<ConfigFile> {
        let project_dir = self.project_dir.clone().or_else(resolve_project_dir);
        let global_dir = self.global_dir.clone().or_else(resolve_global_dir);

        let mut files = Vec::new();
        if let Some(dir) = &global_dir {
            files.extend(search_directory(dir, ConfigScope::Global));
        }
        if let Some(dir) = &project_dir {
            files.extend(search_directory(dir, ConfigScope::Project));
        }
        files.sort_by_key(|file| file.scope);

        debug!("Discovered {} configuration files", files.len());
        files
    }
}

fn search_directory(dir: &Path, scope: ConfigScope) -> Vec<ConfigFile> {
    if !dir.exists() {
        trace!("Directory does not exist: {}", dir.display());
        return Vec::new();
    }
    if !dir.is_dir() {
        warn!("Path exists but is not a directory: {}", dir.display());
        return Vec::new();
    }

    FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .filter(|candidate| candidate.is_file())
        .filter_map(|path| {
            let format = ConfigFormat::from_extension(path.extension()?.to_str()?)?;
            trace!("Found config: {} ({:?})", path.display(), format);
            Some(ConfigFile {
                path,
                format,
                scope,
            })
        })
        .collect()
}

fn resolve_project_dir() -> Option<PathBuf> {
    let dir = std::env::current_dir().ok()?.join(CONFIG_DIR);
    dir.is_dir().then_some(dir)
}

fn resolve_global_dir() -> Option<PathBuf> {
    let dir = dirs::home_dir()?.join(CONFIG_DIR);
    dir.is_dir().then_some(dir)
}
