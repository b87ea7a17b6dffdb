// Documentation generation: template copy, page rendering, merging

use crate::analysis::CodeGraph;
use crate::config::{Config, PageConfig};
use crate::error::{Error, Result};
use crate::output::markdown::PageRenderer;
use crate::output::merge::{insert_in_file, strip_generic_marker, MergeOutcome};
use crate::output::templates::TemplateEngine;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a generation run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Files copied from the template directory
    pub templates_copied: usize,
    pub pages_written: usize,
    /// Pages written without a template
    pub created: usize,
    /// Pages whose explicit tag was replaced
    pub merged_by_tag: usize,
    /// Pages merged before the generic marker
    pub appended: usize,
    /// Pages the generic marker was removed from
    pub markers_stripped: usize,
}

impl GenerationReport {
    fn record(&mut self, outcome: MergeOutcome) {
        self.pages_written += 1;
        match outcome {
            MergeOutcome::Created => self.created += 1,
            MergeOutcome::ReplacedTag => self.merged_by_tag += 1,
            MergeOutcome::Appended => self.appended += 1,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} pages written ({} new, {} by tag, {} appended), {} template files copied",
            self.pages_written, self.created, self.merged_by_tag, self.appended, self.templates_copied
        )
    }
}

/// Documentation generator
pub struct Generator<'a> {
    graph: &'a CodeGraph,
    config: &'a Config,
    engine: TemplateEngine,
    show_progress: bool,
}

impl<'a> Generator<'a> {
    pub fn new(graph: &'a CodeGraph, config: &'a Config) -> Result<Self> {
        let engine = match &config.output.block_templates {
            Some(dir) => TemplateEngine::from_dir(dir)?,
            None => TemplateEngine::new()?,
        };

        Ok(Self {
            graph,
            config,
            engine,
            show_progress: false,
        })
    }

    /// Show a progress bar while pages are written
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Render a single page without writing it
    pub fn render_page(&self, page: &PageConfig) -> Result<String> {
        self.renderer().render_page(page)
    }

    /// Generate every configured page into the output directory
    pub fn generate(&self) -> Result<GenerationReport> {
        let output_dir = &self.config.output.directory;
        fs::create_dir_all(output_dir)?;

        let mut report = GenerationReport::default();
        if let Some(templates) = &self.config.output.templates {
            report.templates_copied = copy_templates(templates, output_dir)?;
        }

        let renderer = self.renderer();
        let progress = self.progress_bar(self.config.pages.len() as u64);
        let mut marker_pages = Vec::new();

        for page in &self.config.pages {
            progress.set_message(page.page.clone());
            let markdown = renderer.render_page(page)?;
            let path = output_dir.join(&page.page);
            let outcome = insert_in_file(&markdown, &path, page.tag.as_deref())?;
            if outcome.used_generic_marker() {
                marker_pages.push(path);
            }
            report.record(outcome);
            progress.inc(1);
        }
        progress.finish_and_clear();

        if !self.config.output.keep_markers {
            for path in &marker_pages {
                if strip_generic_marker(path)? {
                    report.markers_stripped += 1;
                }
            }
        }

        tracing::info!(
            pages = report.pages_written,
            stripped = report.markers_stripped,
            output = %output_dir.display(),
            "documentation generated"
        );
        Ok(report)
    }

    fn renderer(&self) -> PageRenderer<'_> {
        PageRenderer::new(
            self.graph,
            &self.engine,
            self.config.project.url.as_ref(),
            self.config.output.max_line_length,
        )
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
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

/// Copy the template tree into the output directory; returns the number of files copied
pub fn copy_templates(templates: &Path, output_dir: &Path) -> Result<usize> {
    if !templates.is_dir() {
        return Err(Error::PathNotFound(templates.to_path_buf()));
    }

    let mut copied = 0;
    for entry in WalkDir::new(templates) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative: PathBuf = entry
            .path()
            .strip_prefix(templates)
            .map_err(|e| Error::other(e.to_string()))?
            .to_path_buf();
        let dest = output_dir.join(&relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        copied += 1;
    }

    tracing::debug!(from = %templates.display(), files = copied, "copied templates");
    Ok(copied)
}
