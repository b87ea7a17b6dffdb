//! pyautodoc - Markdown API documentation for Python projects
//!
//! Indexes a Python source tree without running it, resolves the dotted
//! names listed in a config file, and merges rendered class, method and
//! function documentation into hand-written Markdown templates.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;

// Re-export main types
pub use analysis::{get_class_from_method, get_type, import_object, Analyzer, CodeGraph, Entity, ObjectType};
pub use config::Config;
pub use error::{Error, Result};
pub use output::{count_leading_spaces, insert_in_file, insert_in_string, remove_indentation, Generator};
