// Merging generated Markdown into hand-written page templates

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Placeholder that receives generated content and stays in place
pub const GENERIC_MARKER: &str = "{{autogenerated}}";

/// How a page was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No template existed; the generated text is the whole page
    Created,
    /// The explicit tag was replaced
    ReplacedTag,
    /// Content was inserted before the generic marker
    Appended,
}

impl MergeOutcome {
    /// True when the generic marker is still in the page
    pub fn used_generic_marker(&self) -> bool {
        matches!(self, MergeOutcome::Appended)
    }
}

/// Compute the merged page.
///
/// `existing` is the current template, if any. Returns `None` when the
/// template has neither the tag nor the generic marker.
pub fn merge_content(existing: Option<&str>, generated: &str, tag: Option<&str>) -> Option<(String, MergeOutcome)> {
    let Some(template) = existing else {
        return Some((generated.to_string(), MergeOutcome::Created));
    };

    if let Some(tag) = tag.filter(|t| template.contains(t)) {
        return Some((template.replace(tag, generated), MergeOutcome::ReplacedTag));
    }

    if template.contains(GENERIC_MARKER) {
        let replacement = format!("{}{}", generated, GENERIC_MARKER);
        return Some((template.replace(GENERIC_MARKER, &replacement), MergeOutcome::Appended));
    }

    None
}

/// Write `markdown` to `path`, merging it into the template already there.
///
/// Parent directories are created. A template without either marker is a
/// configuration error and the file is left untouched.
pub fn insert_in_file(markdown: &str, path: &Path, tag: Option<&str>) -> Result<MergeOutcome> {
    let existing = if path.exists() {
        Some(fs::read_to_string(path)?)
    } else {
        None
    };

    let (content, outcome) = merge_content(existing.as_deref(), markdown, tag).ok_or_else(|| {
        Error::MissingMarkers {
            path: path.to_path_buf(),
            tag: tag.unwrap_or(GENERIC_MARKER).to_string(),
        }
    })?;

    let tag_name = tag.unwrap_or(GENERIC_MARKER);
    match outcome {
        MergeOutcome::Created => {
            tracing::info!(path = %path.display(), "creating new page with autogenerated content")
        }
        MergeOutcome::ReplacedTag => {
            tracing::info!(tag = tag_name, path = %path.display(), "inserting autogenerated content into template")
        }
        MergeOutcome::Appended => {
            tracing::info!(tag = tag_name, path = %path.display(), "appending autogenerated content to template")
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(outcome)
}

/// Remove every generic marker from a finished page; returns whether one was found
pub fn strip_generic_marker(path: &Path) -> Result<bool> {
    let content = fs::read_to_string(path)?;
    if !content.contains(GENERIC_MARKER) {
        return Ok(false);
    }
    fs::write(path, content.replace(GENERIC_MARKER, ""))?;
    Ok(true)
}
