// Name resolution, inheritance and classification over the code graph

use crate::analysis::graph::{ClassId, CodeGraph, Entity, FunctionId, Member, ModuleId};
use crate::config::ClassEntry;
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Alias chains longer than this are treated as unresolvable (import cycles)
const MAX_ALIAS_DEPTH: usize = 32;

/// What a documented object is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Class,
    Method,
    Function,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Class => "class",
            ObjectType::Method => "method",
            ObjectType::Function => "function",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve a dotted name such as `pkg.layers.Dense.call`.
///
/// Each prefix is first tried as a module; when it is not one, the segment is
/// looked up as an attribute of whatever the previous prefix resolved to.
pub fn import_object(graph: &CodeGraph, dotted: &str) -> Result<Entity> {
    resolve_path(graph, dotted, 0, &mut Vec::new())?.ok_or_else(|| {
        let last = dotted.rsplit('.').next().unwrap_or(dotted);
        Error::not_found(dotted, last)
    })
}

/// Static counterpart of `instance.method`: resolve `class_path` and bind `method` to it
pub fn bind_method(graph: &CodeGraph, class_path: &str, method: &str) -> Result<Entity> {
    let receiver = match import_object(graph, class_path)? {
        Entity::Class(id) => id,
        other => return Err(Error::other(format!("{} is not a class", graph.describe(&other)))),
    };

    for class in mro(graph, receiver)? {
        if let Some(Member::Function(function)) = graph.class(class).members.get(method) {
            return Ok(Entity::BoundMethod {
                receiver,
                function: *function,
            });
        }
    }
    Err(Error::not_found(format!("{}.{}", class_path, method), method))
}

/// `active` holds the classes whose bases are being resolved; they are not
/// visible as lookup targets until their MRO is known.
fn resolve_path(graph: &CodeGraph, dotted: &str, depth: usize, active: &mut Vec<ClassId>) -> Result<Option<Entity>> {
    if depth > MAX_ALIAS_DEPTH {
        tracing::debug!(name = dotted, "alias chain too deep, giving up");
        return Ok(None);
    }

    let mut current: Option<Entity> = None;
    let mut seen = String::new();

    for segment in dotted.split('.') {
        if !seen.is_empty() {
            seen.push('.');
        }
        seen.push_str(segment);

        if let Some(id) = graph.module_id(&seen) {
            current = Some(Entity::Module(id));
            continue;
        }

        let owner = current.ok_or_else(|| Error::not_found(dotted, segment))?;
        current = Some(
            get_attr(graph, &owner, segment, depth, active)?
                .ok_or_else(|| Error::not_found(dotted, segment))?,
        );
    }

    Ok(current)
}

/// Attribute lookup on an entity; `Ok(None)` when the attribute does not exist
pub fn get_attribute(graph: &CodeGraph, owner: &Entity, name: &str) -> Result<Option<Entity>> {
    get_attr(graph, owner, name, 0, &mut Vec::new())
}

fn get_attr(
    graph: &CodeGraph,
    owner: &Entity,
    name: &str,
    depth: usize,
    active: &mut Vec<ClassId>,
) -> Result<Option<Entity>> {
    match *owner {
        Entity::Module(id) => module_attr(graph, id, name, depth, active),
        Entity::Class(id) if active.contains(&id) => {
            tracing::debug!(
                class = %graph.dotted_name(owner),
                attribute = name,
                "lookup on a class whose bases are still being resolved"
            );
            Ok(None)
        }
        Entity::Class(id) => {
            for class in linearize(graph, id, active)? {
                if let Some(member) = graph.class(class).members.get(name) {
                    return member_entity(graph, member, depth, active);
                }
            }
            Ok(None)
        }
        Entity::Function(_) | Entity::BoundMethod { .. } | Entity::Value(_) => Ok(None),
    }
}

fn module_attr(
    graph: &CodeGraph,
    id: ModuleId,
    name: &str,
    depth: usize,
    active: &mut Vec<ClassId>,
) -> Result<Option<Entity>> {
    let module = graph.module(id);
    if let Some(member) = module.members.get(name) {
        return member_entity(graph, member, depth, active);
    }

    if name.starts_with('_') {
        return Ok(None);
    }
    for target in &module.star_imports {
        if let Ok(Some(Entity::Module(source))) = resolve_path(graph, target, depth + 1, active) {
            if source != id {
                if let Some(found) = module_attr(graph, source, name, depth + 1, active)? {
                    return Ok(Some(found));
                }
            }
        }
    }
    Ok(None)
}

fn member_entity(
    graph: &CodeGraph,
    member: &Member,
    depth: usize,
    active: &mut Vec<ClassId>,
) -> Result<Option<Entity>> {
    match member {
        Member::Alias(target) => match resolve_path(graph, target, depth + 1, active) {
            Ok(found) => Ok(found),
            // Imports of code outside the index resolve to nothing
            Err(Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        },
        other => Ok(other.entity()),
    }
}

/// Method resolution order of a class (C3 linearization).
///
/// Bases that do not resolve to an indexed class are skipped.
pub fn mro(graph: &CodeGraph, class: ClassId) -> Result<Vec<ClassId>> {
    let mut stack = Vec::new();
    linearize(graph, class, &mut stack)
}

fn linearize(graph: &CodeGraph, class: ClassId, stack: &mut Vec<ClassId>) -> Result<Vec<ClassId>> {
    if stack.contains(&class) {
        return Err(Error::analysis(format!(
            "cyclic inheritance involving {}",
            graph.dotted_name(&Entity::Class(class))
        )));
    }
    stack.push(class);

    let bases = bases_in_scope(graph, class, stack)?;
    let mut sequences = Vec::with_capacity(bases.len() + 1);
    for &base in &bases {
        sequences.push(linearize(graph, base, stack)?);
    }
    sequences.push(bases);
    stack.pop();

    let mut result = vec![class];
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Ok(result);
        }

        let head = sequences
            .iter()
            .map(|s| s[0])
            .find(|candidate| !sequences.iter().any(|s| s[1..].contains(candidate)))
            .ok_or_else(|| {
                Error::analysis(format!(
                    "cannot create a consistent method resolution order for {}",
                    graph.dotted_name(&Entity::Class(class))
                ))
            })?;

        result.push(head);
        for seq in sequences.iter_mut() {
            if seq[0] == head {
                seq.remove(0);
            }
        }
    }
}

/// Resolve the written base expressions of a class to indexed classes
pub fn resolve_bases(graph: &CodeGraph, class: ClassId) -> Result<Vec<ClassId>> {
    bases_in_scope(graph, class, &mut vec![class])
}

fn bases_in_scope(graph: &CodeGraph, class: ClassId, active: &mut Vec<ClassId>) -> Result<Vec<ClassId>> {
    let node = graph.class(class);
    let mut bases = Vec::new();

    for written in &node.bases {
        // `Generic[T]` and `with_metaclass(Meta, Base)` style bases only keep the callee name
        let path = written
            .split(|c: char| c == '[' || c == '(')
            .next()
            .unwrap_or(written)
            .trim();

        match resolve_in_scope(graph, class, path, active)? {
            Some(Entity::Class(base)) => bases.push(base),
            _ => tracing::debug!(
                class = %graph.dotted_name(&Entity::Class(class)),
                base = %written,
                "base class is not in the index, skipping"
            ),
        }
    }

    Ok(bases)
}

/// Resolve a dotted base expression as seen from inside a class body.
///
/// A segment naming a class still in `active` ends the lookup: a class
/// (or one of the subclasses being resolved) cannot be its own base.
fn resolve_in_scope(
    graph: &CodeGraph,
    class: ClassId,
    path: &str,
    active: &mut Vec<ClassId>,
) -> Result<Option<Entity>> {
    let mut segments = path.split('.');
    let Some(first) = segments.next().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let node = graph.class(class);
    let mut current = match node.owner.and_then(|owner| graph.class(owner).members.get(first)) {
        Some(member) => member_entity(graph, member, 0, active)?,
        None => module_attr(graph, node.module, first, 0, active)?,
    };

    for segment in segments {
        current = match current {
            Some(owner) if !is_active(&owner, active) => get_attr(graph, &owner, segment, 0, active)?,
            _ => return Ok(None),
        };
    }

    Ok(current.filter(|e| !is_active(e, active)))
}

fn is_active(entity: &Entity, active: &[ClassId]) -> bool {
    matches!(entity, Entity::Class(id) if active.contains(id))
}

/// Qualified-name prefix naming the class that encloses a function.
///
/// Anything from `.<locals>` on is dropped, then the last segment. A
/// qualified name without dots is returned unchanged.
pub fn enclosing_class_path(qualname: &str) -> &str {
    let outer = qualname.split(".<locals>").next().unwrap_or(qualname);
    outer.rsplit_once('.').map(|(prefix, _)| prefix).unwrap_or(outer)
}

/// Find the class that declares a method.
///
/// A bound method is matched along its receiver's MRO by identity of the
/// function. A plain function is mapped back to its class through its
/// qualified name, else the class whose body defines it. Anything else has
/// no declaring class.
pub fn get_class_from_method(graph: &CodeGraph, entity: &Entity) -> Result<Option<ClassId>> {
    let function = match *entity {
        Entity::BoundMethod { receiver, function } => {
            let name = &graph.function(function).name;
            for class in mro(graph, receiver)? {
                if graph.class(class).members.get(name) == Some(&Member::Function(function)) {
                    return Ok(Some(class));
                }
            }
            function
        }
        Entity::Function(function) => function,
        _ => return Ok(None),
    };

    // Class bodies record their methods, so fall back to the defining class
    Ok(class_from_qualname(graph, function).or(graph.function(function).class))
}

fn class_from_qualname(graph: &CodeGraph, function: FunctionId) -> Option<ClassId> {
    let node = graph.function(function);
    let mut current = Entity::Module(node.module);

    for segment in enclosing_class_path(&node.qualname).split('.') {
        current = get_attr(graph, &current, segment, 0, &mut Vec::new()).ok().flatten()?;
    }

    match current {
        Entity::Class(id) => Some(id),
        _ => None,
    }
}

/// True when the entity has a declaring class
pub fn is_method(graph: &CodeGraph, entity: &Entity) -> Result<bool> {
    Ok(get_class_from_method(graph, entity)?.is_some())
}

/// Classify a resolved object as class, method or function
pub fn get_type(graph: &CodeGraph, entity: &Entity) -> Result<ObjectType> {
    match *entity {
        Entity::Class(_) => return Ok(ObjectType::Class),
        // Attribute access on a class yields the property object, not a function
        Entity::Function(id) | Entity::BoundMethod { function: id, .. } if graph.function(id).is_property() => {
            return Err(Error::Unclassifiable(graph.describe(entity)));
        }
        _ => {}
    }
    if is_method(graph, entity)? {
        return Ok(ObjectType::Method);
    }
    match entity {
        Entity::Function(_) | Entity::BoundMethod { .. } => Ok(ObjectType::Function),
        other => Err(Error::Unclassifiable(graph.describe(other))),
    }
}

/// `module.QualName` of a class
pub fn get_dotted_path(graph: &CodeGraph, class: ClassId) -> String {
    graph.dotted_name(&Entity::Class(class))
}

/// Normalize a page's class list into `(class, methods)` pairs.
///
/// Every entry must resolve to a class; anything else is a type error.
pub fn format_classes_list(
    graph: &CodeGraph,
    entries: &[ClassEntry],
    page_name: &str,
) -> Result<Vec<(ClassId, Vec<String>)>> {
    let mut classes = Vec::with_capacity(entries.len());

    for entry in entries {
        let (name, methods) = entry.as_pair();
        match import_object(graph, name)? {
            Entity::Class(id) => classes.push((id, methods.to_vec())),
            _ => {
                return Err(Error::NotAClass {
                    name: name.to_string(),
                    page: page_name.to_string(),
                })
            }
        }
    }

    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PythonParser;
    use std::path::PathBuf;

    fn graph(files: &[(&str, bool, &str)]) -> CodeGraph {
        let mut parser = PythonParser::new().unwrap();
        let mut graph = CodeGraph::new();
        for (name, is_package, source) in files {
            let mut parsed = parser
                .parse_source(source, PathBuf::from(format!("{}.py", name)), name.to_string())
                .unwrap();
            parsed.is_package = *is_package;
            graph.add_file(&parsed);
        }
        graph.link_packages();
        graph
    }

    fn fixture() -> CodeGraph {
        graph(&[
            ("pkg", true, "from .layers import Dense as DenseLayer\nfrom .base import *\nVERSION = '1.0'\n"),
            (
                "pkg.base",
                false,
                "class Layer:\n    def build(self):\n        pass\n    def call(self, x):\n        return x\n\n_hidden = 1\n",
            ),
            (
                "pkg.layers",
                false,
                "\
from pkg import base
from .base import Layer

def relu(x):
    return x

class Dense(base.Layer):
    units = 4

    def call(self, x):
        return x

    class Config:
        def validate(self):
            pass

class Dropout(Layer):
    pass
",
            ),
        ])
    }

    fn class_named(graph: &CodeGraph, name: &str) -> ClassId {
        graph.all_classes().find(|(_, c)| c.name == name).unwrap().0
    }

    #[test]
    fn test_import_module_then_attributes() {
        let graph = fixture();
        let entity = import_object(&graph, "pkg.layers.Dense.call").unwrap();
        let dense = class_named(&graph, "Dense");
        let direct = get_attribute(&graph, &Entity::Class(dense), "call").unwrap().unwrap();
        assert_eq!(entity, direct);
        assert_eq!(graph.dotted_name(&entity), "pkg.layers.Dense.call");
    }

    #[test]
    fn test_import_package_and_module() {
        let graph = fixture();
        let pkg = graph.module_id("pkg").unwrap();
        assert_eq!(import_object(&graph, "pkg").unwrap(), Entity::Module(pkg));
        assert!(matches!(import_object(&graph, "pkg.VERSION").unwrap(), Entity::Value(_)));
    }

    #[test]
    fn test_import_through_reexport_alias() {
        let graph = fixture();
        let dense = class_named(&graph, "Dense");
        assert_eq!(import_object(&graph, "pkg.DenseLayer").unwrap(), Entity::Class(dense));
    }

    #[test]
    fn test_import_through_star_import() {
        let graph = fixture();
        let layer = class_named(&graph, "Layer");
        assert_eq!(import_object(&graph, "pkg.Layer").unwrap(), Entity::Class(layer));
        assert!(import_object(&graph, "pkg._hidden").unwrap_err().is_lookup());
    }

    #[test]
    fn test_inherited_attribute_lookup() {
        let graph = fixture();
        let entity = import_object(&graph, "pkg.layers.Dense.build").unwrap();
        assert_eq!(graph.dotted_name(&entity), "pkg.base.Layer.build");
    }

    #[test]
    fn test_nested_class_lookup() {
        let graph = fixture();
        let entity = import_object(&graph, "pkg.layers.Dense.Config.validate").unwrap();
        assert_eq!(graph.dotted_name(&entity), "pkg.layers.Dense.Config.validate");
    }

    #[test]
    fn test_import_missing() {
        let graph = fixture();
        let err = import_object(&graph, "pkg.layers.Missing").unwrap_err();
        match err {
            Error::NotFound { name, segment } => {
                assert_eq!(name, "pkg.layers.Missing");
                assert_eq!(segment, "Missing");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(import_object(&graph, "nothere.x").unwrap_err().is_lookup());
        assert!(import_object(&graph, "").unwrap_err().is_lookup());
    }

    #[test]
    fn test_import_guarded_by_try_except() {
        let graph = graph(&[
            ("pkg", true, "try:\n    from .core import Dense\nexcept ImportError:\n    pass\n"),
            ("pkg.core", false, "class Dense:\n    pass\n"),
        ]);
        let defined = import_object(&graph, "pkg.core.Dense").unwrap();
        assert_eq!(import_object(&graph, "pkg.Dense").unwrap(), defined);
    }

    #[test]
    fn test_fallback_binding_in_except_wins() {
        let graph = graph(&[
            ("pkg", true, "try:\n    from .core import Dense\nexcept ImportError:\n    Dense = None\n"),
            ("pkg.core", false, "class Dense:\n    pass\n"),
        ]);
        assert!(matches!(import_object(&graph, "pkg.Dense").unwrap(), Entity::Value(_)));
    }

    #[test]
    fn test_alias_cycle_is_not_found() {
        let graph = graph(&[("a", false, "from b import x\n"), ("b", false, "from a import x\n")]);
        assert!(import_object(&graph, "a.x").unwrap_err().is_lookup());
    }

    #[test]
    fn test_mro_diamond() {
        let graph = graph(&[(
            "m",
            false,
            "class A: pass\nclass B(A): pass\nclass C(A): pass\nclass D(B, C, object): pass\n",
        )]);
        let names: Vec<&str> = mro(&graph, class_named(&graph, "D"))
            .unwrap()
            .into_iter()
            .map(|id| graph.class(id).name.as_str())
            .collect();
        assert_eq!(names, vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn test_mro_inconsistent() {
        let graph = graph(&[(
            "m",
            false,
            "class A: pass\nclass B(A): pass\nclass C(A, B): pass\n",
        )]);
        assert!(mro(&graph, class_named(&graph, "C")).is_err());
    }

    #[test]
    fn test_redefined_class_with_own_nested_base() {
        let graph = graph(&[(
            "m",
            false,
            "class A:\n    class B:\n        pass\n\n\nclass A(A.B):\n    def f(self):\n        pass\n",
        )]);
        let f = import_object(&graph, "m.A.f").unwrap();
        assert_eq!(get_type(&graph, &f).unwrap(), ObjectType::Method);

        let redefined = match import_object(&graph, "m.A").unwrap() {
            Entity::Class(id) => id,
            other => panic!("unexpected entity {other:?}"),
        };
        assert_eq!(mro(&graph, redefined).unwrap(), vec![redefined]);
        assert!(resolve_bases(&graph, redefined).unwrap().is_empty());
    }

    #[test]
    fn test_base_referring_back_to_subclass_is_skipped() {
        let graph = graph(&[(
            "m",
            false,
            "from m import A as Alias\n\nclass A: pass\nclass B(A): pass\nclass A(B, Alias):\n    def g(self):\n        pass\n",
        )]);
        let a = match import_object(&graph, "m.A").unwrap() {
            Entity::Class(id) => id,
            other => panic!("unexpected entity {other:?}"),
        };
        let names: Vec<&str> = mro(&graph, a)
            .unwrap()
            .into_iter()
            .map(|id| graph.class(id).name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
        assert!(import_object(&graph, "m.Alias.g").is_ok());
    }

    #[test]
    fn test_resolve_bases_through_module_attribute() {
        let graph = fixture();
        let layer = class_named(&graph, "Layer");
        assert_eq!(resolve_bases(&graph, class_named(&graph, "Dense")).unwrap(), vec![layer]);
        assert_eq!(resolve_bases(&graph, class_named(&graph, "Dropout")).unwrap(), vec![layer]);
    }

    #[test]
    fn test_enclosing_class_path() {
        assert_eq!(enclosing_class_path("Dense.call"), "Dense");
        assert_eq!(enclosing_class_path("Outer.Inner.method"), "Outer.Inner");
        assert_eq!(enclosing_class_path("factory.<locals>.Local.method"), "factory");
        assert_eq!(enclosing_class_path("relu"), "relu");
    }

    #[test]
    fn test_classify_function() {
        let graph = fixture();
        let relu = import_object(&graph, "pkg.layers.relu").unwrap();
        assert_eq!(get_type(&graph, &relu).unwrap(), ObjectType::Function);
        assert_eq!(get_class_from_method(&graph, &relu).unwrap(), None);
    }

    #[test]
    fn test_classify_class() {
        let graph = fixture();
        let dense = import_object(&graph, "pkg.layers.Dense").unwrap();
        assert_eq!(get_type(&graph, &dense).unwrap(), ObjectType::Class);
        assert_eq!(ObjectType::Class.to_string(), "class");
    }

    #[test]
    fn test_classify_unbound_method() {
        let graph = fixture();
        let call = import_object(&graph, "pkg.layers.Dense.call").unwrap();
        assert_eq!(get_type(&graph, &call).unwrap(), ObjectType::Method);
        assert_eq!(get_class_from_method(&graph, &call).unwrap(), Some(class_named(&graph, "Dense")));
    }

    #[test]
    fn test_bound_inherited_method_finds_declaring_ancestor() {
        let graph = fixture();
        let bound = bind_method(&graph, "pkg.layers.Dropout", "build").unwrap();
        assert!(matches!(bound, Entity::BoundMethod { .. }));
        assert_eq!(get_type(&graph, &bound).unwrap(), ObjectType::Method);
        assert_eq!(get_class_from_method(&graph, &bound).unwrap(), Some(class_named(&graph, "Layer")));
    }

    #[test]
    fn test_bound_overridden_method_finds_subclass() {
        let graph = fixture();
        let bound = bind_method(&graph, "pkg.layers.Dense", "call").unwrap();
        assert_eq!(get_class_from_method(&graph, &bound).unwrap(), Some(class_named(&graph, "Dense")));
    }

    #[test]
    fn test_classify_value_is_type_error() {
        let graph = fixture();
        let units = import_object(&graph, "pkg.layers.Dense.units").unwrap();
        let err = get_type(&graph, &units).unwrap_err();
        assert!(err.is_type_error());
        assert!(err.to_string().contains("pkg.layers.Dense.units = 4"));

        let module = import_object(&graph, "pkg.layers").unwrap();
        assert!(get_type(&graph, &module).unwrap_err().is_type_error());
    }

    #[test]
    fn test_classify_property_is_type_error() {
        let graph = graph(&[(
            "m",
            false,
            "class Dense:\n    @property\n    def units(self):\n        return 4\n\n    def call(self, x):\n        return x\n",
        )]);
        let units = import_object(&graph, "m.Dense.units").unwrap();
        assert!(get_type(&graph, &units).unwrap_err().is_type_error());

        let bound = bind_method(&graph, "m.Dense", "units").unwrap();
        assert!(get_type(&graph, &bound).unwrap_err().is_type_error());

        let call = import_object(&graph, "m.Dense.call").unwrap();
        assert_eq!(get_type(&graph, &call).unwrap(), ObjectType::Method);
    }

    #[test]
    fn test_get_dotted_path() {
        let graph = fixture();
        assert_eq!(get_dotted_path(&graph, class_named(&graph, "Config")), "pkg.layers.Dense.Config");
    }

    #[test]
    fn test_format_classes_list() {
        let graph = fixture();
        let entries = vec![
            ClassEntry::Bare("pkg.layers.Dense".to_string()),
            ClassEntry::WithMethods("pkg.layers.Dropout".to_string(), vec!["build".to_string()]),
        ];
        let classes = format_classes_list(&graph, &entries, "layers.md").unwrap();
        assert_eq!(
            classes,
            vec![
                (class_named(&graph, "Dense"), vec![]),
                (class_named(&graph, "Dropout"), vec!["build".to_string()]),
            ]
        );
    }

    #[test]
    fn test_format_classes_list_rejects_functions() {
        let graph = fixture();
        let entries = vec![ClassEntry::Bare("pkg.layers.relu".to_string())];
        let err = format_classes_list(&graph, &entries, "layers.md").unwrap_err();
        assert!(matches!(err, Error::NotAClass { ref name, .. } if name == "pkg.layers.relu"));
    }
}
