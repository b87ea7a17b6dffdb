// Output generation: Markdown rendering and page merging

pub mod generator;
pub mod links;
pub mod markdown;
pub mod merge;
pub mod templates;
pub mod text;

pub use generator::{copy_templates, GenerationReport, Generator};
pub use links::{make_source_link, optional_source_link, SourceLocated};
pub use markdown::{PageRenderer, BLOCK_SEPARATOR};
pub use merge::{insert_in_file, merge_content, strip_generic_marker, MergeOutcome, GENERIC_MARKER};
pub use templates::{DocBlock, TemplateEngine};
pub use text::{count_leading_spaces, insert_in_string, remove_indentation};
