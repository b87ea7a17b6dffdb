// Syntax-level view of a Python module
//
// These types mirror what the parser can see in a single source file.
// Name resolution across files happens later, in the analysis graph.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A parsed Python file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedFile {
    /// File path relative to the source root
    pub path: PathBuf,
    /// Dotted module name derived from path
    pub module_name: String,
    /// True for `__init__.py`
    pub is_package: bool,
    /// Module-level docstring
    pub docstring: Option<String>,
    /// All top-level imports in the file
    pub imports: Vec<Import>,
    /// Classes defined at module level
    pub classes: Vec<Class>,
    /// Functions defined at module level
    pub functions: Vec<Function>,
    /// Module-level assignments
    pub assignments: Vec<Assignment>,
}

impl ParsedFile {
    pub fn new(path: PathBuf, module_name: String) -> Self {
        Self {
            path,
            module_name,
            is_package: false,
            docstring: None,
            imports: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            assignments: Vec::new(),
        }
    }

    /// Check if file defines anything
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty() && self.assignments.is_empty()
    }
}

/// An import statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Import {
    /// The module being imported (without leading dots)
    pub module: String,
    /// Names bound by the statement
    pub names: Vec<ImportedName>,
    pub kind: ImportKind,
    pub line: usize,
}

impl Import {
    /// `import x`
    pub fn simple(module: &str, line: usize) -> Self {
        Self {
            module: module.to_string(),
            names: vec![ImportedName::new(module)],
            kind: ImportKind::Direct,
            line,
        }
    }

    /// `from x import y`
    pub fn from_import(module: &str, names: Vec<ImportedName>, line: usize) -> Self {
        Self {
            module: module.to_string(),
            names,
            kind: ImportKind::From,
            line,
        }
    }

    /// `from .x import y`
    pub fn relative(module: &str, names: Vec<ImportedName>, level: usize, line: usize) -> Self {
        Self {
            module: module.to_string(),
            names,
            kind: ImportKind::Relative { level },
            line,
        }
    }
}

/// A single imported name with optional alias
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
        }
    }

    pub fn with_alias(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: Some(alias.to_string()),
        }
    }

    /// Get the name as bound in the importing module
    pub fn used_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Kind of import statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ImportKind {
    /// `import x` or `import x as y`
    Direct,
    /// `from x import y`
    From,
    /// `from . import y` or `from ..x import y`
    Relative { level: usize },
}

impl ImportKind {
    pub fn is_relative(&self) -> bool {
        matches!(self, ImportKind::Relative { .. })
    }
}

/// A class definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Class {
    /// Name as written after `class`
    pub name: String,
    /// Raw docstring, if the body starts with a string literal
    pub docstring: Option<String>,
    /// Base classes as written, e.g. `layers.Layer`
    pub bases: Vec<String>,
    pub decorators: Vec<String>,
    /// Methods defined in the class body
    pub methods: Vec<Function>,
    /// Classes nested in the class body
    pub classes: Vec<Class>,
    /// Assignments in the class body
    pub attributes: Vec<Assignment>,
    /// First line of the definition, decorators included
    pub line_start: usize,
    /// Last line of the class body
    pub line_end: usize,
}

impl Class {
    pub fn new(name: &str, line_start: usize) -> Self {
        Self {
            name: name.to_string(),
            docstring: None,
            bases: Vec::new(),
            decorators: Vec::new(),
            methods: Vec::new(),
            classes: Vec::new(),
            attributes: Vec::new(),
            line_start,
            line_end: line_start,
        }
    }
}

/// A function or method definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Function {
    pub name: String,
    pub docstring: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub decorators: Vec<String>,
    pub is_async: bool,
    pub line_start: usize,
    pub line_end: usize,
}

impl Function {
    pub fn new(name: &str, line_start: usize) -> Self {
        Self {
            name: name.to_string(),
            docstring: None,
            parameters: Vec::new(),
            return_type: None,
            decorators: Vec::new(),
            is_async: false,
            line_start,
            line_end: line_start,
        }
    }
}

/// A function parameter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub type_hint: Option<String>,
    pub default: Option<String>,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            type_hint: None,
            default: None,
            kind: ParameterKind::Regular,
        }
    }

    pub fn with_type(name: &str, type_hint: &str) -> Self {
        Self {
            type_hint: Some(type_hint.to_string()),
            ..Self::new(name)
        }
    }

    pub fn with_default(name: &str, default: &str) -> Self {
        Self {
            default: Some(default.to_string()),
            ..Self::new(name)
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ParameterKind::Args => f.write_str("*")?,
            ParameterKind::Kwargs => f.write_str("**")?,
            _ => {}
        }

        f.write_str(&self.name)?;

        if let Some(ref t) = self.type_hint {
            write!(f, ": {}", t)?;
        }

        if let Some(ref d) = self.default {
            if self.type_hint.is_some() {
                write!(f, " = {}", d)?;
            } else {
                write!(f, "={}", d)?;
            }
        }

        Ok(())
    }
}

/// Kind of function parameter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParameterKind {
    /// Positional or keyword
    Regular,
    /// *args
    Args,
    /// **kwargs
    Kwargs,
    /// Before `/`
    PositionalOnly,
    /// After `*` or `*args`
    KeywordOnly,
}

/// A `name = value` or `name: type = value` binding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub type_hint: Option<String>,
    /// Right-hand side as source text
    pub value: Option<String>,
    pub line: usize,
}

impl Assignment {
    pub fn new(name: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            type_hint: None,
            value: None,
            line,
        }
    }

    /// ALL_CAPS naming
    pub fn is_constant(&self) -> bool {
        self.name.chars().all(|c| c.is_uppercase() || c == '_' || c.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_file_new() {
        let file = ParsedFile::new(PathBuf::from("test.py"), "test".to_string());
        assert_eq!(file.module_name, "test");
        assert!(!file.is_package);
        assert!(file.is_empty());
    }

    #[test]
    fn test_import_simple_binds_module_name() {
        let imp = Import::simple("os.path", 1);
        assert_eq!(imp.kind, ImportKind::Direct);
        assert_eq!(imp.names[0].used_name(), "os.path");
    }

    #[test]
    fn test_import_relative() {
        let imp = Import::relative("utils", vec![ImportedName::new("helper")], 2, 1);
        assert!(imp.kind.is_relative());
        assert_eq!(imp.kind, ImportKind::Relative { level: 2 });
    }

    #[test]
    fn test_imported_name_used_name() {
        assert_eq!(ImportedName::new("foo").used_name(), "foo");
        assert_eq!(ImportedName::with_alias("foo", "bar").used_name(), "bar");
    }

    #[test]
    fn test_parameter_display() {
        assert_eq!(Parameter::new("x").to_string(), "x");
        assert_eq!(Parameter::with_type("x", "int").to_string(), "x: int");
        assert_eq!(Parameter::with_default("x", "10").to_string(), "x=10");

        let mut full = Parameter::with_type("x", "int");
        full.default = Some("10".to_string());
        assert_eq!(full.to_string(), "x: int = 10");

        let mut args = Parameter::new("args");
        args.kind = ParameterKind::Args;
        assert_eq!(args.to_string(), "*args");

        let mut kwargs = Parameter::new("kwargs");
        kwargs.kind = ParameterKind::Kwargs;
        assert_eq!(kwargs.to_string(), "**kwargs");
    }

    #[test]
    fn test_assignment_is_constant() {
        assert!(Assignment::new("MAX_SIZE", 1).is_constant());
        assert!(!Assignment::new("max_size", 1).is_constant());
    }
}
