// Analysis module: source discovery and the object index

pub mod graph;
pub mod resolve;

pub use graph::*;
pub use resolve::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::PythonParser;
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Result of indexing a source tree
#[derive(Debug)]
pub struct AnalysisResult {
    pub graph: CodeGraph,
    /// Number of files that were parsed
    pub files: usize,
    /// Files that failed to parse (path -> error message)
    pub parse_errors: BTreeMap<PathBuf, String>,
}

/// Walks a source tree and builds the [`CodeGraph`]
pub struct Analyzer {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
    parser: PythonParser,
    verbose: bool,
}

impl Analyzer {
    /// Create an analyzer using the include/exclude globs of `config`
    pub fn new(config: &Config) -> Result<Self> {
        let include = compile(&config.analysis.include)?;
        let exclude = compile(&config.analysis.exclude)?;

        Ok(Self {
            include,
            exclude,
            parser: PythonParser::new()?,
            verbose: false,
        })
    }

    /// Show a progress bar while parsing
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Index every matching file under `root`
    pub fn analyze(&mut self, root: &Path) -> Result<AnalysisResult> {
        let root = root
            .canonicalize()
            .map_err(|_| Error::PathNotFound(root.to_path_buf()))?;

        let files = self.discover_files(&root)?;
        if files.is_empty() {
            return Err(Error::analysis(format!("No Python files found in {}", root.display())));
        }

        let progress = self.progress_bar(files.len() as u64);
        let mut graph = CodeGraph::new();
        let mut parse_errors = BTreeMap::new();

        for path in &files {
            progress.set_message(path.file_name().unwrap_or_default().to_string_lossy().to_string());
            match self.parser.parse_file(&root, path) {
                Ok(parsed) => {
                    graph.add_file(&parsed);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping file");
                    parse_errors.insert(path.clone(), e.to_string());
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();

        graph.link_packages();

        let stats = graph.stats();
        tracing::info!(
            files = files.len(),
            modules = stats.modules,
            classes = stats.classes,
            functions = stats.functions,
            "indexed source tree"
        );

        Ok(AnalysisResult {
            graph,
            files: files.len() - parse_errors.len(),
            parse_errors,
        })
    }

    /// All files under `root` matching an include pattern and no exclude pattern
    fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if self.is_selected(relative) {
                files.push(path.to_path_buf());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Check a root-relative path against the include and exclude globs
    fn is_selected(&self, relative: &Path) -> bool {
        let normalized = relative.to_string_lossy().replace('\\', "/");
        self.include.iter().any(|p| p.matches(&normalized)) && !self.exclude.iter().any(|p| p.matches(&normalized))
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.verbose {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns.iter().map(|p| Pattern::new(p).map_err(Error::from)).collect()
}
