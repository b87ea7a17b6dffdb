// Python parser using tree-sitter

use crate::error::{Error, Result};
use crate::parser::ast::*;
use std::path::{Component, Path, PathBuf};
use tree_sitter::{Node, Parser};

/// Parser for Python source files
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    /// Create a new Python parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_python::language();
        parser.set_language(&language).map_err(|e| {
            Error::Parser(format!("Failed to set Python language: {}", e))
        })?;
        Ok(Self { parser })
    }

    /// Parse the file at `path`, naming the module after its location under `root`
    pub fn parse_file(&mut self, root: &Path, path: &Path) -> Result<ParsedFile> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
        })?;

        let relative = path.strip_prefix(root).unwrap_or(path);
        let (module_name, is_package) = module_name_for(relative)
            .ok_or_else(|| Error::parse(path, "cannot derive a module name from this path"))?;

        let mut file = self.parse_source(&source, relative.to_path_buf(), module_name)?;
        file.is_package = is_package;
        Ok(file)
    }

    /// Parse Python source code
    pub fn parse_source(
        &mut self,
        source: &str,
        path: PathBuf,
        module_name: String,
    ) -> Result<ParsedFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parser("Failed to parse source"))?;

        let root = tree.root_node();
        if root.has_error() {
            tracing::debug!(path = %path.display(), "syntax errors in source, indexing what parsed");
        }

        let src = source.as_bytes();
        let mut file = ParsedFile::new(path, module_name);
        file.docstring = leading_docstring(&root, src);

        for child in statements(&root) {
            match child.kind() {
                "import_statement" => file.imports.extend(parse_import(&child, src)),
                "import_from_statement" => {
                    if let Some(import) = parse_import_from(&child, src) {
                        file.imports.push(import);
                    }
                }
                "class_definition" | "function_definition" | "decorated_definition" => {
                    match parse_definition(&child, src) {
                        Some(Definition::Class(class)) => file.classes.push(class),
                        Some(Definition::Function(func)) => file.functions.push(func),
                        None => {}
                    }
                }
                "expression_statement" => {
                    if let Some(assignment) = parse_assignment(&child, src) {
                        file.assignments.push(assignment);
                    }
                }
                _ => {}
            }
        }

        Ok(file)
    }
}

/// Derive the dotted module name for a path relative to the source root.
///
/// `pkg/sub/mod.py` is `pkg.sub.mod`; `pkg/__init__.py` is the package `pkg`.
/// Returns `None` for paths that are not Python files or have no usable name.
pub fn module_name_for(relative: &Path) -> Option<(String, bool)> {
    if relative.extension().map_or(true, |e| e != "py") {
        return None;
    }

    let mut parts: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let stem = relative.file_stem()?.to_string_lossy().into_owned();
    let is_package = stem == "__init__";
    if !is_package {
        parts.push(stem);
    }

    if parts.is_empty() {
        return None;
    }
    Some((parts.join("."), is_package))
}

/// Parse `import a.b, c as d` into one import per bound module
fn parse_import(node: &Node, src: &[u8]) -> Vec<Import> {
    let line = node.start_position().row + 1;
    let mut imports = Vec::new();
    let mut cursor = node.walk();

    for child in node.children_by_field_name("name", &mut cursor) {
        match child.kind() {
            "dotted_name" => {
                if let Ok(module) = child.utf8_text(src) {
                    imports.push(Import::simple(module, line));
                }
            }
            "aliased_import" => {
                let module = child.child_by_field_name("name").and_then(|n| n.utf8_text(src).ok());
                let alias = child.child_by_field_name("alias").and_then(|n| n.utf8_text(src).ok());
                if let (Some(module), Some(alias)) = (module, alias) {
                    let mut import = Import::simple(module, line);
                    import.names = vec![ImportedName::with_alias(module, alias)];
                    imports.push(import);
                }
            }
            _ => {}
        }
    }

    imports
}

/// Parse `from x import y`, including relative forms
fn parse_import_from(node: &Node, src: &[u8]) -> Option<Import> {
    let line = node.start_position().row + 1;
    let source_module = node.child_by_field_name("module_name")?;

    let mut level = 0;
    let mut module = String::new();
    if source_module.kind() == "relative_import" {
        let mut cursor = source_module.walk();
        for inner in source_module.named_children(&mut cursor) {
            match inner.kind() {
                "import_prefix" => {
                    level = inner.utf8_text(src).ok()?.chars().filter(|c| *c == '.').count();
                }
                "dotted_name" => module = inner.utf8_text(src).ok()?.to_string(),
                _ => {}
            }
        }
    } else {
        module = source_module.utf8_text(src).ok()?.to_string();
    }

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children_by_field_name("name", &mut cursor) {
        match child.kind() {
            "dotted_name" => names.push(ImportedName::new(child.utf8_text(src).ok()?)),
            "aliased_import" => {
                let name = child.child_by_field_name("name")?.utf8_text(src).ok()?;
                let alias = child.child_by_field_name("alias")?.utf8_text(src).ok()?;
                names.push(ImportedName::with_alias(name, alias));
            }
            _ => {}
        }
    }

    let mut cursor = node.walk();
    if node.named_children(&mut cursor).any(|c| c.kind() == "wildcard_import") {
        names.push(ImportedName::new("*"));
    }

    Some(if level > 0 {
        Import::relative(&module, names, level, line)
    } else {
        Import::from_import(&module, names, line)
    })
}

/// Statements of a module or class body in source order.
///
/// Blocks of `if`/`elif`/`else`, `try`/`except`/`else`/`finally` and `with`
/// run in the same namespace, so their statements are included.
fn statements<'t>(body: &Node<'t>) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    collect_statements(body, &mut out);
    out
}

fn collect_statements<'t>(block: &Node<'t>, out: &mut Vec<Node<'t>>) {
    let mut cursor = block.walk();
    for child in block.named_children(&mut cursor) {
        match child.kind() {
            "if_statement" | "try_statement" | "with_statement" => collect_clauses(&child, out),
            _ => out.push(child),
        }
    }
}

fn collect_clauses<'t>(node: &Node<'t>, out: &mut Vec<Node<'t>>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "block" => collect_statements(&child, out),
            "elif_clause" | "else_clause" | "except_clause" | "except_group_clause" | "finally_clause" => {
                collect_clauses(&child, out)
            }
            _ => {}
        }
    }
}

enum Definition {
    Class(Class),
    Function(Function),
}

/// Parse a class, function, or decorated definition
fn parse_definition(node: &Node, src: &[u8]) -> Option<Definition> {
    let line_start = node.start_position().row + 1;
    let line_end = node.end_position().row + 1;

    let (decorators, inner) = if node.kind() == "decorated_definition" {
        (extract_decorators(node, src), node.child_by_field_name("definition")?)
    } else {
        (Vec::new(), *node)
    };

    match inner.kind() {
        "class_definition" => {
            let mut class = parse_class(&inner, src)?;
            class.decorators = decorators;
            class.line_start = line_start;
            class.line_end = line_end;
            Some(Definition::Class(class))
        }
        "function_definition" => {
            let mut func = parse_function(&inner, src)?;
            func.decorators = decorators;
            func.line_start = line_start;
            func.line_end = line_end;
            Some(Definition::Function(func))
        }
        _ => None,
    }
}

/// Parse a bare class_definition node
fn parse_class(node: &Node, src: &[u8]) -> Option<Class> {
    let name = node.child_by_field_name("name")?.utf8_text(src).ok()?;
    let mut class = Class::new(name, node.start_position().row + 1);

    if let Some(args) = node.child_by_field_name("superclasses") {
        class.bases = extract_bases(&args, src);
    }

    if let Some(body) = node.child_by_field_name("body") {
        class.docstring = leading_docstring(&body, src);

        for child in statements(&body) {
            match child.kind() {
                "class_definition" | "function_definition" | "decorated_definition" => {
                    match parse_definition(&child, src) {
                        Some(Definition::Class(nested)) => class.classes.push(nested),
                        Some(Definition::Function(method)) => class.methods.push(method),
                        None => {}
                    }
                }
                "expression_statement" => {
                    if let Some(attr) = parse_assignment(&child, src) {
                        class.attributes.push(attr);
                    }
                }
                _ => {}
            }
        }
    }

    Some(class)
}

/// Extract base classes from the superclass argument list, skipping keywords like `metaclass=`
fn extract_bases(node: &Node, src: &[u8]) -> Vec<String> {
    let mut bases = Vec::new();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" | "attribute" | "subscript" | "call" => {
                if let Ok(text) = child.utf8_text(src) {
                    bases.push(text.to_string());
                }
            }
            _ => {}
        }
    }

    bases
}

/// Parse a bare function_definition node
fn parse_function(node: &Node, src: &[u8]) -> Option<Function> {
    let name = node.child_by_field_name("name")?.utf8_text(src).ok()?;
    let mut func = Function::new(name, node.start_position().row + 1);

    let mut cursor = node.walk();
    func.is_async = node.children(&mut cursor).any(|c| c.kind() == "async");

    if let Some(params) = node.child_by_field_name("parameters") {
        func.parameters = parse_parameters(&params, src);
    }
    if let Some(ret) = node.child_by_field_name("return_type") {
        func.return_type = ret.utf8_text(src).ok().map(str::to_string);
    }
    if let Some(body) = node.child_by_field_name("body") {
        func.docstring = leading_docstring(&body, src);
    }

    Some(func)
}

/// Extract decorator names, without `@` and call arguments
fn extract_decorators(node: &Node, src: &[u8]) -> Vec<String> {
    let mut decorators = Vec::new();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Ok(text) = child.utf8_text(src) {
                let dec = text.trim_start_matches('@');
                let dec = dec.split('(').next().unwrap_or(dec);
                decorators.push(dec.trim().to_string());
            }
        }
    }

    decorators
}

/// Parse function parameters
fn parse_parameters(node: &Node, src: &[u8]) -> Vec<Parameter> {
    let mut params: Vec<Parameter> = Vec::new();
    let mut keyword_only = false;
    let mut cursor = node.walk();

    for child in node.children(&mut cursor) {
        let param = match child.kind() {
            "identifier" => child.utf8_text(src).ok().map(Parameter::new),
            "typed_parameter" => parse_typed_parameter(&child, src),
            "default_parameter" | "typed_default_parameter" => parse_default_parameter(&child, src),
            "list_splat_pattern" | "dictionary_splat_pattern" => splat_parameter(&child, src),
            "*" | "keyword_separator" => {
                keyword_only = true;
                None
            }
            "/" | "positional_separator" => {
                for p in params.iter_mut().filter(|p| p.kind == ParameterKind::Regular) {
                    p.kind = ParameterKind::PositionalOnly;
                }
                None
            }
            _ => None,
        };

        if let Some(mut param) = param {
            match param.kind {
                ParameterKind::Args => keyword_only = true,
                ParameterKind::Regular if keyword_only => param.kind = ParameterKind::KeywordOnly,
                _ => {}
            }
            params.push(param);
        }
    }

    params
}

/// `*args` / `**kwargs`, bare or inside a typed_parameter
fn splat_parameter(node: &Node, src: &[u8]) -> Option<Parameter> {
    let mut cursor = node.walk();
    let ident = node.named_children(&mut cursor).find(|c| c.kind() == "identifier")?;
    let mut param = Parameter::new(ident.utf8_text(src).ok()?);
    param.kind = if node.kind() == "list_splat_pattern" {
        ParameterKind::Args
    } else {
        ParameterKind::Kwargs
    };
    Some(param)
}

fn parse_typed_parameter(node: &Node, src: &[u8]) -> Option<Parameter> {
    let mut param = None;
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "identifier" if param.is_none() => {
                param = Some(Parameter::new(child.utf8_text(src).ok()?));
            }
            "list_splat_pattern" | "dictionary_splat_pattern" if param.is_none() => {
                param = splat_parameter(&child, src);
            }
            _ => {}
        }
    }

    let mut param = param?;
    param.type_hint = node
        .child_by_field_name("type")
        .and_then(|t| t.utf8_text(src).ok())
        .map(str::to_string);
    Some(param)
}

fn parse_default_parameter(node: &Node, src: &[u8]) -> Option<Parameter> {
    let name = node.child_by_field_name("name")?.utf8_text(src).ok()?;
    let mut param = Parameter::new(name);
    param.type_hint = node
        .child_by_field_name("type")
        .and_then(|t| t.utf8_text(src).ok())
        .map(str::to_string);
    param.default = node
        .child_by_field_name("value")
        .and_then(|v| v.utf8_text(src).ok())
        .map(str::to_string);
    Some(param)
}

/// Parse `name = value` / `name: T = value` held by an expression statement
fn parse_assignment(node: &Node, src: &[u8]) -> Option<Assignment> {
    let mut cursor = node.walk();
    let assignment = node.named_children(&mut cursor).find(|c| c.kind() == "assignment")?;

    let left = assignment.child_by_field_name("left")?;
    if left.kind() != "identifier" {
        return None;
    }

    let mut result = Assignment::new(left.utf8_text(src).ok()?, assignment.start_position().row + 1);
    result.type_hint = assignment
        .child_by_field_name("type")
        .and_then(|t| t.utf8_text(src).ok())
        .map(str::to_string);
    result.value = assignment
        .child_by_field_name("right")
        .and_then(|r| r.utf8_text(src).ok())
        .map(str::to_string);
    Some(result)
}

/// Docstring of a module or block: a string literal as the first statement
fn leading_docstring(node: &Node, src: &[u8]) -> Option<String> {
    let mut cursor = node.walk();
    let first = node
        .named_children(&mut cursor)
        .find(|c| c.kind() != "comment")?;

    if first.kind() != "expression_statement" {
        return None;
    }

    let string = first.named_child(0)?;
    if string.kind() != "string" {
        return None;
    }
    string_literal_content(string.utf8_text(src).ok()?)
}

/// Strip prefix and quotes from a string literal, keeping inner whitespace
fn string_literal_content(text: &str) -> Option<String> {
    let body = text.trim_start_matches(|c: char| c.is_ascii_alphabetic());

    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote) {
            return Some(body[quote.len()..body.len() - quote.len()].to_string());
        }
    }
    None
}
