// Static object index for a Python code base
//
// Every module, class, function and module/class level value found by the
// parser gets a node here. Member tables record what a Python attribute
// lookup on a module or class body would find, with imports kept as aliases
// that are resolved lazily.

use crate::parser::{Assignment, Class, Function, ImportKind, Parameter, ParsedFile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Unique identifier for a module in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

/// Unique identifier for a class in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub usize);

/// Unique identifier for a function or method in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub usize);

/// Unique identifier for a module or class level value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub usize);

/// Anything a dotted name can resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Entity {
    Module(ModuleId),
    Class(ClassId),
    Function(FunctionId),
    /// A function reached through an instance of `receiver`
    BoundMethod { receiver: ClassId, function: FunctionId },
    Value(ValueId),
}

/// A binding in a module or class namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Member {
    Submodule(ModuleId),
    Class(ClassId),
    Function(FunctionId),
    Value(ValueId),
    /// An imported name, as the absolute dotted path it refers to
    Alias(String),
}

/// A module node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleNode {
    /// Dotted module name
    pub name: String,
    /// Source path relative to the root; `None` for implicit namespace packages
    pub path: Option<PathBuf>,
    pub is_package: bool,
    pub docstring: Option<String>,
    pub members: BTreeMap<String, Member>,
    /// Absolute targets of `from x import *`
    pub star_imports: Vec<String>,
}

impl ModuleNode {
    fn namespace(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            is_package: true,
            docstring: None,
            members: BTreeMap::new(),
            star_imports: Vec::new(),
        }
    }

    /// Top-level package this module belongs to
    pub fn top_level_package(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }
}

/// A class node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassNode {
    pub name: String,
    /// Qualified name inside the module, e.g. `Outer.Inner`
    pub qualname: String,
    pub module: ModuleId,
    /// Enclosing class for nested classes
    pub owner: Option<ClassId>,
    pub docstring: Option<String>,
    /// Base classes as written
    pub bases: Vec<String>,
    pub decorators: Vec<String>,
    /// Own namespace: methods, nested classes, attributes
    pub members: BTreeMap<String, Member>,
    /// Methods in definition order
    pub methods: Vec<FunctionId>,
    pub line_start: usize,
    pub line_end: usize,
}

/// A function or method node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionNode {
    pub name: String,
    /// Qualified name inside the module, e.g. `Dense.call`
    pub qualname: String,
    pub module: ModuleId,
    /// Class whose body defines this function
    pub class: Option<ClassId>,
    pub docstring: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub decorators: Vec<String>,
    pub is_async: bool,
    pub line_start: usize,
    pub line_end: usize,
}

impl FunctionNode {
    pub fn is_staticmethod(&self) -> bool {
        self.decorators.iter().any(|d| d == "staticmethod")
    }

    /// Decorated with `@property` or a `@x.getter`
    pub fn is_property(&self) -> bool {
        self.decorators.iter().any(|d| d == "property" || d.ends_with(".getter"))
    }
}

/// A module or class level assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueNode {
    pub name: String,
    pub qualname: String,
    pub module: ModuleId,
    pub owner: Option<ClassId>,
    pub type_hint: Option<String>,
    pub value: Option<String>,
    pub line: usize,
}

/// Summary counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub modules: usize,
    pub classes: usize,
    pub functions: usize,
    pub values: usize,
}

/// The object index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeGraph {
    modules: Vec<ModuleNode>,
    classes: Vec<ClassNode>,
    functions: Vec<FunctionNode>,
    values: Vec<ValueNode>,
    module_index: HashMap<String, ModuleId>,
}

impl CodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one parsed file as a module
    pub fn add_file(&mut self, file: &ParsedFile) -> ModuleId {
        let id = match self.module_index.get(&file.module_name) {
            Some(&id) => id,
            None => {
                let id = ModuleId(self.modules.len());
                self.modules.push(ModuleNode::namespace(&file.module_name));
                self.module_index.insert(file.module_name.clone(), id);
                id
            }
        };

        {
            let module = &mut self.modules[id.0];
            module.path = Some(file.path.clone());
            module.is_package = file.is_package;
            module.docstring = file.docstring.clone();
        }

        // (line, name, member) for every binding, replayed in source order
        let mut bindings = Vec::new();

        let package = package_of(&file.module_name, file.is_package);
        for import in &file.imports {
            let base = match import.kind {
                ImportKind::Relative { level } => {
                    match relative_base(&package, level, &import.module) {
                        Some(base) => base,
                        None => {
                            tracing::debug!(
                                module = %file.module_name,
                                line = import.line,
                                "relative import escapes the top-level package"
                            );
                            continue;
                        }
                    }
                }
                _ => import.module.clone(),
            };

            for name in &import.names {
                let (bound, target) = match import.kind {
                    ImportKind::Direct => match &name.alias {
                        Some(alias) => (alias.clone(), base.clone()),
                        // `import a.b` binds `a`
                        None => {
                            let top = base.split('.').next().unwrap_or(&base).to_string();
                            (top.clone(), top)
                        }
                    },
                    _ if name.name == "*" => {
                        self.modules[id.0].star_imports.push(base.clone());
                        continue;
                    }
                    _ => (name.used_name().to_string(), join_dotted(&base, &name.name)),
                };
                bindings.push((import.line, bound, Member::Alias(target)));
            }
        }

        for assignment in &file.assignments {
            let value = self.add_value(assignment, id, None, "");
            bindings.push((assignment.line, assignment.name.clone(), Member::Value(value)));
        }
        for function in &file.functions {
            let func = self.add_function(function, id, None, "");
            bindings.push((function.line_start, function.name.clone(), Member::Function(func)));
        }
        for class in &file.classes {
            let class_id = self.add_class(class, id, None, "");
            bindings.push((class.line_start, class.name.clone(), Member::Class(class_id)));
        }

        bindings.sort_by_key(|(line, _, _)| *line);
        let members = &mut self.modules[id.0].members;
        for (_, name, member) in bindings {
            members.insert(name, member);
        }

        id
    }

    fn add_class(&mut self, class: &Class, module: ModuleId, owner: Option<ClassId>, prefix: &str) -> ClassId {
        let id = ClassId(self.classes.len());
        let qualname = join_dotted(prefix, &class.name);
        self.classes.push(ClassNode {
            name: class.name.clone(),
            qualname: qualname.clone(),
            module,
            owner,
            docstring: class.docstring.clone(),
            bases: class.bases.clone(),
            decorators: class.decorators.clone(),
            members: BTreeMap::new(),
            methods: Vec::new(),
            line_start: class.line_start,
            line_end: class.line_end,
        });

        let mut bindings = Vec::new();
        let mut methods = Vec::new();
        for attribute in &class.attributes {
            let value = self.add_value(attribute, module, Some(id), &qualname);
            bindings.push((attribute.line, attribute.name.clone(), Member::Value(value)));
        }
        for method in &class.methods {
            let func = self.add_function(method, module, Some(id), &qualname);
            bindings.push((method.line_start, method.name.clone(), Member::Function(func)));
            methods.push(func);
        }
        for nested in &class.classes {
            let nested_id = self.add_class(nested, module, Some(id), &qualname);
            bindings.push((nested.line_start, nested.name.clone(), Member::Class(nested_id)));
        }

        bindings.sort_by_key(|(line, _, _)| *line);
        let node = &mut self.classes[id.0];
        node.members = bindings.into_iter().map(|(_, name, member)| (name, member)).collect();
        node.methods = methods;
        id
    }

    fn add_function(
        &mut self,
        function: &Function,
        module: ModuleId,
        class: Option<ClassId>,
        prefix: &str,
    ) -> FunctionId {
        let id = FunctionId(self.functions.len());
        self.functions.push(FunctionNode {
            name: function.name.clone(),
            qualname: join_dotted(prefix, &function.name),
            module,
            class,
            docstring: function.docstring.clone(),
            parameters: function.parameters.clone(),
            return_type: function.return_type.clone(),
            decorators: function.decorators.clone(),
            is_async: function.is_async,
            line_start: function.line_start,
            line_end: function.line_end,
        });
        id
    }

    fn add_value(
        &mut self,
        assignment: &Assignment,
        module: ModuleId,
        owner: Option<ClassId>,
        prefix: &str,
    ) -> ValueId {
        let id = ValueId(self.values.len());
        self.values.push(ValueNode {
            name: assignment.name.clone(),
            qualname: join_dotted(prefix, &assignment.name),
            module,
            owner,
            type_hint: assignment.type_hint.clone(),
            value: assignment.value.clone(),
            line: assignment.line,
        });
        id
    }

    /// Create implicit namespace packages and bind submodules on their parents.
    ///
    /// Call once after all files are added.
    pub fn link_packages(&mut self) {
        let names: Vec<String> = self.modules.iter().map(|m| m.name.clone()).collect();
        for name in &names {
            let mut prefix = String::new();
            for segment in name.split('.') {
                prefix = join_dotted(&prefix, segment);
                if !self.module_index.contains_key(&prefix) {
                    let id = ModuleId(self.modules.len());
                    self.modules.push(ModuleNode::namespace(&prefix));
                    self.module_index.insert(prefix.clone(), id);
                }
            }
        }

        for index in 0..self.modules.len() {
            let name = self.modules[index].name.clone();
            if let Some((parent, child)) = name.rsplit_once('.') {
                if let Some(&parent_id) = self.module_index.get(parent) {
                    self.modules[parent_id.0]
                        .members
                        .entry(child.to_string())
                        .or_insert(Member::Submodule(ModuleId(index)));
                }
            }
        }
    }

    pub fn module_id(&self, name: &str) -> Option<ModuleId> {
        self.module_index.get(name).copied()
    }

    pub fn module(&self, id: ModuleId) -> &ModuleNode {
        &self.modules[id.0]
    }

    pub fn class(&self, id: ClassId) -> &ClassNode {
        &self.classes[id.0]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionNode {
        &self.functions[id.0]
    }

    pub fn value(&self, id: ValueId) -> &ValueNode {
        &self.values[id.0]
    }

    pub fn all_classes(&self) -> impl Iterator<Item = (ClassId, &ClassNode)> {
        self.classes.iter().enumerate().map(|(i, c)| (ClassId(i), c))
    }

    pub fn all_functions(&self) -> impl Iterator<Item = (FunctionId, &FunctionNode)> {
        self.functions.iter().enumerate().map(|(i, f)| (FunctionId(i), f))
    }

    /// Module name of the module that defines a class
    pub fn class_module_name(&self, id: ClassId) -> &str {
        &self.module(self.class(id).module).name
    }

    /// Module name of the module that defines a function
    pub fn function_module_name(&self, id: FunctionId) -> &str {
        &self.module(self.function(id).module).name
    }

    /// Human-readable name of an entity for messages
    pub fn describe(&self, entity: &Entity) -> String {
        match *entity {
            Entity::Module(id) => format!("<module '{}'>", self.module(id).name),
            Entity::Class(id) => format!("<class '{}'>", self.dotted_name(entity)),
            Entity::Function(_) => format!("<function {}>", self.dotted_name(entity)),
            Entity::BoundMethod { receiver, .. } => format!(
                "<bound method {} of {} object>",
                self.dotted_name(entity),
                self.class(receiver).name
            ),
            Entity::Value(id) => {
                let value = self.value(id);
                match &value.value {
                    Some(text) => format!("{} = {}", self.dotted_name(entity), text),
                    None => self.dotted_name(entity),
                }
            }
        }
    }

    /// Fully qualified dotted name where the entity is defined
    pub fn dotted_name(&self, entity: &Entity) -> String {
        match *entity {
            Entity::Module(id) => self.module(id).name.clone(),
            Entity::Class(id) => {
                let class = self.class(id);
                join_dotted(&self.module(class.module).name, &class.qualname)
            }
            Entity::Function(id) | Entity::BoundMethod { function: id, .. } => {
                let func = self.function(id);
                join_dotted(&self.module(func.module).name, &func.qualname)
            }
            Entity::Value(id) => {
                let value = self.value(id);
                join_dotted(&self.module(value.module).name, &value.qualname)
            }
        }
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            modules: self.modules.len(),
            classes: self.classes.len(),
            functions: self.functions.len(),
            values: self.values.len(),
        }
    }
}

impl Member {
    /// The entity a non-alias member refers to
    pub fn entity(&self) -> Option<Entity> {
        match *self {
            Member::Submodule(id) => Some(Entity::Module(id)),
            Member::Class(id) => Some(Entity::Class(id)),
            Member::Function(id) => Some(Entity::Function(id)),
            Member::Value(id) => Some(Entity::Value(id)),
            Member::Alias(_) => None,
        }
    }
}

fn join_dotted(prefix: &str, name: &str) -> String {
    match (prefix.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{}.{}", prefix, name),
    }
}

/// Package a module's relative imports are anchored at
fn package_of(module_name: &str, is_package: bool) -> String {
    if is_package {
        module_name.to_string()
    } else {
        module_name.rsplit_once('.').map(|(p, _)| p.to_string()).unwrap_or_default()
    }
}

/// Absolute module for `from <level dots><module> import ...`
fn relative_base(package: &str, level: usize, module: &str) -> Option<String> {
    let mut base = package;
    for _ in 1..level {
        base = base.rsplit_once('.').map(|(p, _)| p)?;
    }
    if base.is_empty() {
        return None;
    }
    Some(join_dotted(base, module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Import, ImportedName};

    fn file(name: &str, is_package: bool) -> ParsedFile {
        let mut file = ParsedFile::new(PathBuf::from(format!("{}.py", name.replace('.', "/"))), name.to_string());
        file.is_package = is_package;
        file
    }

    #[test]
    fn test_add_file_members() {
        let mut parsed = file("pkg.layers", false);
        let mut dense = Class::new("Dense", 3);
        dense.methods.push(Function::new("call", 5));
        parsed.classes.push(dense);
        parsed.functions.push(Function::new("relu", 10));
        parsed.assignments.push(Assignment::new("UNITS", 1));

        let mut graph = CodeGraph::new();
        let id = graph.add_file(&parsed);
        let module = graph.module(id);

        assert!(matches!(module.members.get("Dense"), Some(Member::Class(_))));
        assert!(matches!(module.members.get("relu"), Some(Member::Function(_))));
        assert!(matches!(module.members.get("UNITS"), Some(Member::Value(_))));

        let (class_id, class) = graph.all_classes().next().unwrap();
        assert_eq!(class.qualname, "Dense");
        let Some(Member::Function(call)) = class.members.get("call") else {
            panic!("expected method");
        };
        assert_eq!(graph.function(*call).qualname, "Dense.call");
        assert_eq!(graph.function(*call).class, Some(class_id));
        assert_eq!(graph.dotted_name(&Entity::Function(*call)), "pkg.layers.Dense.call");
    }

    #[test]
    fn test_later_binding_wins() {
        // class Layer / Layer = Other / def f / f = wrap(f) / g = None / def g
        let mut parsed = file("pkg.layers", false);
        let mut layer = Class::new("Layer", 1);
        layer.methods.push(Function::new("build", 2));
        layer.attributes.push(Assignment::new("build", 4));
        parsed.classes.push(layer);
        parsed.assignments.push(Assignment::new("Layer", 6));
        parsed.functions.push(Function::new("f", 8));
        parsed.assignments.push(Assignment::new("f", 10));
        parsed.assignments.push(Assignment::new("g", 11));
        parsed.functions.push(Function::new("g", 13));
        parsed.imports.push(Import::from_import("pkg.base", vec![ImportedName::new("Base")], 15));
        parsed.classes.push(Class::new("Base", 17));

        let mut graph = CodeGraph::new();
        let id = graph.add_file(&parsed);
        let members = &graph.module(id).members;

        assert!(matches!(members.get("Layer"), Some(Member::Value(_))));
        assert!(matches!(members.get("f"), Some(Member::Value(_))));
        assert!(matches!(members.get("g"), Some(Member::Function(_))));
        assert!(matches!(members.get("Base"), Some(Member::Class(_))));

        let (_, layer) = graph.all_classes().next().unwrap();
        assert!(matches!(layer.members.get("build"), Some(Member::Value(_))));
    }

    #[test]
    fn test_nested_class_qualname() {
        let mut parsed = file("pkg", true);
        let mut outer = Class::new("Outer", 1);
        let mut inner = Class::new("Inner", 2);
        inner.methods.push(Function::new("deep", 3));
        outer.classes.push(inner);
        parsed.classes.push(outer);

        let mut graph = CodeGraph::new();
        graph.add_file(&parsed);
        let inner = graph.all_classes().find(|(_, c)| c.name == "Inner").unwrap().1;
        assert_eq!(inner.qualname, "Outer.Inner");
        assert_eq!(inner.owner, Some(ClassId(0)));
        assert_eq!(graph.all_functions().next().unwrap().1.qualname, "Outer.Inner.deep");
    }

    #[test]
    fn test_import_aliases() {
        let mut parsed = file("pkg.sub.mod", false);
        parsed.imports.push(Import::simple("numpy.linalg", 1));
        let mut aliased = Import::simple("numpy", 2);
        aliased.names = vec![ImportedName::with_alias("numpy", "np")];
        parsed.imports.push(aliased);
        parsed.imports.push(Import::relative("core", vec![ImportedName::with_alias("Dense", "D")], 1, 3));
        parsed.imports.push(Import::relative("", vec![ImportedName::new("utils")], 2, 4));
        parsed.imports.push(Import::from_import("pkg.base", vec![ImportedName::new("*")], 5));

        let mut graph = CodeGraph::new();
        let id = graph.add_file(&parsed);
        let members = &graph.module(id).members;

        assert_eq!(members.get("numpy"), Some(&Member::Alias("numpy".to_string())));
        assert_eq!(members.get("np"), Some(&Member::Alias("numpy".to_string())));
        assert_eq!(members.get("D"), Some(&Member::Alias("pkg.sub.core.Dense".to_string())));
        assert_eq!(members.get("utils"), Some(&Member::Alias("pkg.utils".to_string())));
        assert_eq!(graph.module(id).star_imports, vec!["pkg.base".to_string()]);
    }

    #[test]
    fn test_relative_import_from_package_init() {
        let mut parsed = file("pkg", true);
        parsed.imports.push(Import::relative("layers", vec![ImportedName::new("Dense")], 1, 1));

        let mut graph = CodeGraph::new();
        let id = graph.add_file(&parsed);
        assert_eq!(
            graph.module(id).members.get("Dense"),
            Some(&Member::Alias("pkg.layers.Dense".to_string()))
        );
    }

    #[test]
    fn test_relative_base() {
        assert_eq!(relative_base("pkg.sub", 1, "core"), Some("pkg.sub.core".to_string()));
        assert_eq!(relative_base("pkg.sub", 2, ""), Some("pkg".to_string()));
        assert_eq!(relative_base("pkg", 2, "x"), None);
        assert_eq!(relative_base("", 1, "x"), None);
    }

    #[test]
    fn test_link_packages_creates_namespaces() {
        let mut graph = CodeGraph::new();
        graph.add_file(&file("ns.pkg.mod", false));
        graph.link_packages();

        let ns = graph.module_id("ns").expect("namespace package");
        let pkg = graph.module_id("ns.pkg").expect("namespace package");
        let module = graph.module_id("ns.pkg.mod").unwrap();
        assert!(graph.module(ns).path.is_none());
        assert_eq!(graph.module(ns).members.get("pkg"), Some(&Member::Submodule(pkg)));
        assert_eq!(graph.module(pkg).members.get("mod"), Some(&Member::Submodule(module)));
        assert_eq!(graph.stats().modules, 3);
    }

    #[test]
    fn test_link_packages_keeps_explicit_bindings() {
        let mut init = file("pkg", true);
        init.assignments.push(Assignment::new("core", 1));
        let mut graph = CodeGraph::new();
        let pkg = graph.add_file(&init);
        graph.add_file(&file("pkg.core", false));
        graph.link_packages();

        assert!(matches!(graph.module(pkg).members.get("core"), Some(Member::Value(_))));
    }

    #[test]
    fn test_describe() {
        let mut parsed = file("pkg", true);
        let mut value = Assignment::new("RATE", 1);
        value.value = Some("0.5".to_string());
        parsed.assignments.push(value);
        let mut graph = CodeGraph::new();
        let id = graph.add_file(&parsed);

        assert_eq!(graph.describe(&Entity::Module(id)), "<module 'pkg'>");
        assert_eq!(graph.describe(&Entity::Value(ValueId(0))), "pkg.RATE = 0.5");
    }
}
