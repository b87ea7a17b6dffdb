// Markdown rendering of documented classes, methods and functions

use crate::analysis::{
    format_classes_list, get_attribute, get_class_from_method, get_type, import_object, ClassId, CodeGraph, Entity,
    FunctionId, ObjectType,
};
use crate::config::{PageConfig, ProjectUrl};
use crate::error::{Error, Result};
use crate::output::links::{optional_source_link, SourceLocated};
use crate::output::templates::{DocBlock, TemplateEngine};
use crate::output::text::{clean_docstring, format_signature};
use crate::parser::{Parameter, ParameterKind};

/// Separator between two documented objects on a page
pub const BLOCK_SEPARATOR: &str = "\n\n----\n\n";

/// Turns page definitions into Markdown
pub struct PageRenderer<'a> {
    graph: &'a CodeGraph,
    engine: &'a TemplateEngine,
    project_url: Option<&'a ProjectUrl>,
    max_line_length: usize,
}

impl<'a> PageRenderer<'a> {
    pub fn new(
        graph: &'a CodeGraph,
        engine: &'a TemplateEngine,
        project_url: Option<&'a ProjectUrl>,
        max_line_length: usize,
    ) -> Self {
        Self {
            graph,
            engine,
            project_url,
            max_line_length,
        }
    }

    /// Render every class, listed method and function of a page
    pub fn render_page(&self, page: &PageConfig) -> Result<String> {
        let classes = format_classes_list(self.graph, &page.classes, &page.page)?;
        let mut blocks = Vec::new();

        for (entry, (class, methods)) in page.classes.iter().zip(classes) {
            let (path, _) = entry.as_pair();
            blocks.push(self.class_block(class, path)?);
            for method in &methods {
                blocks.push(self.method_block(class, method)?);
            }
        }

        for dotted in &page.functions {
            blocks.push(self.object_block(dotted)?);
        }

        let rendered = blocks
            .iter()
            .map(|block| self.engine.render_block(block))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(page = %page.page, blocks = rendered.len(), "rendered page");
        Ok(format!("{}\n", rendered.join(BLOCK_SEPARATOR)))
    }

    /// Class block: constructor signature under the path the user wrote
    pub fn class_block(&self, class: ClassId, path: &str) -> Result<DocBlock> {
        let node = self.graph.class(class);

        let arguments = match get_attribute(self.graph, &Entity::Class(class), "__init__")? {
            Some(Entity::Function(init)) => signature_arguments(&self.graph.function(init).parameters, true),
            _ => Vec::new(),
        };

        Ok(DocBlock {
            name: node.name.clone(),
            kind: ObjectType::Class.to_string(),
            signature: format_signature(path, &arguments, self.max_line_length),
            docstring: shape_docstring(node.docstring.as_deref()),
            source_link: self.link(&class)?,
        })
    }

    /// Block for `method` looked up on `class`, inherited members included
    pub fn method_block(&self, class: ClassId, method: &str) -> Result<DocBlock> {
        let class_name = &self.graph.class(class).name;
        let path = format!("{}.{}", class_name, method);
        let entity = get_attribute(self.graph, &Entity::Class(class), method)?
            .ok_or_else(|| Error::not_found(path.clone(), method))?;

        match (get_type(self.graph, &entity)?, entity) {
            (ObjectType::Class, Entity::Class(nested)) => self.class_block(nested, &path),
            (kind, entity) => match function_of(&entity) {
                Some(function) => self.function_block(function, kind, &path),
                None => Err(Error::Unclassifiable(self.graph.describe(&entity))),
            },
        }
    }

    /// Block for a dotted name from a page's function list
    pub fn object_block(&self, dotted: &str) -> Result<DocBlock> {
        let entity = import_object(self.graph, dotted)?;
        let kind = get_type(self.graph, &entity)?;

        if let Entity::Class(class) = entity {
            return self.class_block(class, dotted);
        }

        let Some(function) = function_of(&entity) else {
            return Err(Error::Unclassifiable(self.graph.describe(&entity)));
        };

        let path = match (kind, get_class_from_method(self.graph, &entity)?) {
            (ObjectType::Method, Some(class)) => {
                format!("{}.{}", self.graph.class(class).name, self.graph.function(function).name)
            }
            _ => dotted.to_string(),
        };

        self.function_block(function, kind, &path)
    }

    fn function_block(&self, function: FunctionId, kind: ObjectType, path: &str) -> Result<DocBlock> {
        let node = self.graph.function(function);
        let drop_receiver = kind == ObjectType::Method && !node.is_staticmethod();
        let arguments = signature_arguments(&node.parameters, drop_receiver);

        Ok(DocBlock {
            name: node.name.clone(),
            kind: kind.to_string(),
            signature: format_signature(path, &arguments, self.max_line_length),
            docstring: shape_docstring(node.docstring.as_deref()),
            source_link: self.link(&function)?,
        })
    }

    fn link<T: SourceLocated>(&self, item: &T) -> Result<Option<String>> {
        optional_source_link(item, self.graph, self.project_url)
    }
}

fn function_of(entity: &Entity) -> Option<FunctionId> {
    match *entity {
        Entity::Function(id) | Entity::BoundMethod { function: id, .. } => Some(id),
        _ => None,
    }
}

fn shape_docstring(raw: Option<&str>) -> Option<String> {
    raw.map(clean_docstring).filter(|doc| !doc.is_empty())
}

/// Parameters as written in a signature, with `/` and `*` separators restored.
///
/// `drop_first` removes the receiver (`self` or `cls`).
pub fn signature_arguments(parameters: &[Parameter], drop_first: bool) -> Vec<String> {
    let params = if drop_first && !parameters.is_empty() {
        &parameters[1..]
    } else {
        parameters
    };

    let has_star_args = params.iter().any(|p| p.kind == ParameterKind::Args);
    let mut arguments = Vec::with_capacity(params.len() + 2);
    let mut keyword_marker_done = has_star_args;

    for (i, param) in params.iter().enumerate() {
        if param.kind == ParameterKind::KeywordOnly && !keyword_marker_done {
            arguments.push("*".to_string());
            keyword_marker_done = true;
        }

        arguments.push(param.to_string());

        let ends_positional = param.kind == ParameterKind::PositionalOnly
            && params.get(i + 1).map_or(true, |next| next.kind != ParameterKind::PositionalOnly);
        if ends_positional {
            arguments.push("/".to_string());
        }
    }

    arguments
}
