// Parser module for extracting definitions from Python source files

pub mod ast;
mod python;

pub use ast::*;
pub use python::{module_name_for, PythonParser};
