use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "autodoc.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
    pub pages: Vec<PageConfig>,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    /// Root directory of the Python sources
    pub source: PathBuf,
    /// Where "view source" links point to
    pub url: Option<ProjectUrl>,
}

/// Base URL for source links: one for everything, or one per top-level package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectUrl {
    Single(String),
    PerPackage(BTreeMap<String, String>),
}

impl ProjectUrl {
    /// Base URL for objects living under `top_level_package`
    pub fn for_package(&self, top_level_package: &str) -> Result<&str> {
        match self {
            ProjectUrl::Single(url) => Ok(url),
            ProjectUrl::PerPackage(map) => map
                .get(top_level_package)
                .map(String::as_str)
                .ok_or_else(|| Error::MissingProjectUrl(top_level_package.to_string())),
        }
    }
}

/// Source discovery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Hand-written templates copied into `directory` before merging
    pub templates: Option<PathBuf>,
    /// Directory with `class.md.tera` / `function.md.tera` overriding the built-in blocks
    pub block_templates: Option<PathBuf>,
    /// Leave `{{autogenerated}}` in finished pages
    pub keep_markers: bool,
    /// Signatures longer than this are split one parameter per line
    pub max_line_length: usize,
}

/// One documentation page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Output path relative to the output directory
    pub page: String,
    /// Explicit placeholder replaced by this page's content
    pub tag: Option<String>,
    pub classes: Vec<ClassEntry>,
    pub functions: Vec<String>,
}

/// A class list entry: `"pkg.Class"` or `["pkg.Class", ["method", ...]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassEntry {
    Bare(String),
    WithMethods(String, Vec<String>),
}

impl ClassEntry {
    /// The entry in `(class, methods)` form
    pub fn as_pair(&self) -> (&str, &[String]) {
        match self {
            ClassEntry::Bare(name) => (name, &[]),
            ClassEntry::WithMethods(name, methods) => (name, methods),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Untitled Project".to_string(),
            source: PathBuf::from("."),
            url: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.py".to_string()],
            exclude: vec![
                "tests/**".to_string(),
                "test/**".to_string(),
                "venv/**".to_string(),
                ".venv/**".to_string(),
                "**/__pycache__/**".to_string(),
                "build/**".to_string(),
                "docs/**".to_string(),
            ],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("docs/sources"),
            templates: None,
            block_templates: None,
            keep_markers: false,
            max_line_length: 88,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file, or return defaults when the file does not exist.
    ///
    /// A file that exists but is invalid is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, output: Option<PathBuf>, source: Option<PathBuf>, keep_markers: bool) {
        if let Some(out) = output {
            self.output.directory = out;
        }

        if let Some(src) = source {
            self.project.source = src;
        }

        if keep_markers {
            self.output.keep_markers = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis.include.is_empty() {
            return Err(Error::config_validation("at least one include pattern required"));
        }

        if self.output.max_line_length == 0 {
            return Err(Error::config_validation("max_line_length must be at least 1"));
        }

        if let Some(ProjectUrl::PerPackage(map)) = &self.project.url {
            if map.is_empty() {
                return Err(Error::config_validation("project url table is empty"));
            }
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if page.page.trim().is_empty() {
                return Err(Error::config_validation("page with an empty name"));
            }
            if !seen.insert(page.page.as_str()) {
                return Err(Error::config_validation(format!("page '{}' listed twice", page.page)));
            }
            if page.classes.is_empty() && page.functions.is_empty() {
                return Err(Error::config_validation(format!(
                    "page '{}' has no classes or functions",
                    page.page
                )));
            }
            if page.tag.as_deref().is_some_and(|t| t.is_empty()) {
                return Err(Error::config_validation(format!("page '{}' has an empty tag", page.page)));
            }
        }

        Ok(())
    }
}
