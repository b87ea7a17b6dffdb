// "View source" links next to rendered objects

use crate::analysis::{ClassId, CodeGraph, Entity, FunctionId};
use crate::config::ProjectUrl;
use crate::error::Result;

/// Something with a defining module and a first source line
pub trait SourceLocated {
    fn module_name<'g>(&self, graph: &'g CodeGraph) -> &'g str;
    fn source_line(&self, graph: &CodeGraph) -> usize;
}

impl SourceLocated for ClassId {
    fn module_name<'g>(&self, graph: &'g CodeGraph) -> &'g str {
        graph.class_module_name(*self)
    }

    fn source_line(&self, graph: &CodeGraph) -> usize {
        graph.class(*self).line_start
    }
}

impl SourceLocated for FunctionId {
    fn module_name<'g>(&self, graph: &'g CodeGraph) -> &'g str {
        graph.function_module_name(*self)
    }

    fn source_line(&self, graph: &CodeGraph) -> usize {
        graph.function(*self).line_start
    }
}

impl SourceLocated for Entity {
    fn module_name<'g>(&self, graph: &'g CodeGraph) -> &'g str {
        match *self {
            Entity::Module(id) => &graph.module(id).name,
            Entity::Class(id) => id.module_name(graph),
            Entity::Function(id) | Entity::BoundMethod { function: id, .. } => id.module_name(graph),
            Entity::Value(id) => &graph.module(graph.value(id).module).name,
        }
    }

    fn source_line(&self, graph: &CodeGraph) -> usize {
        match *self {
            Entity::Module(_) => 1,
            Entity::Class(id) => id.source_line(graph),
            Entity::Function(id) | Entity::BoundMethod { function: id, .. } => id.source_line(graph),
            Entity::Value(id) => graph.value(id).line,
        }
    }
}

/// Build the right-floated `[[source]]` link for an object.
///
/// The path comes from the module name (`a.b` is `a/b.py`); with a
/// per-package URL table the entry for the object's top-level package is used.
pub fn make_source_link<T: SourceLocated>(item: &T, graph: &CodeGraph, project_url: &ProjectUrl) -> Result<String> {
    let module = item.module_name(graph);
    let top_level = module.split('.').next().unwrap_or(module);
    let base = project_url.for_package(top_level)?;
    let path = module.replace('.', "/");
    let line = item.source_line(graph);

    Ok(format!(
        "<span style=\"float:right;\">[[source]]({}/{}.py#L{})</span>",
        base.trim_end_matches('/'),
        path,
        line
    ))
}

/// Like [`make_source_link`], but an absent project URL yields no link
pub fn optional_source_link<T: SourceLocated>(
    item: &T,
    graph: &CodeGraph,
    project_url: Option<&ProjectUrl>,
) -> Result<Option<String>> {
    match project_url {
        Some(url) => make_source_link(item, graph, url).map(Some),
        None => Ok(None),
    }
}
