//! Cross-file name resolution.
//!
//! A reference is resolved in the file it occurs in: qualified names go
//! through the import table to the target module, unqualified names are
//! looked up locally and then through import exposing lists. The target
//! module's exposing table always decides what an import can see.

use std::borrow::Cow;
use std::fmt;

use elm_syntax::module;
use elm_syntax::nav::children_of_kinds;
use elm_syntax::{DefinitionKind, ExposingTable, FileId, ImportInfo, ModuleIndex, Node, SourceTree};

use crate::forest::Forest;

/// A resolved definition: a node inside one of the forest's trees.
#[derive(Clone, Copy)]
pub struct Definition<'f> {
    pub node: Node<'f>,
    pub source: &'f SourceTree,
    pub kind: DefinitionKind,
}

impl<'f> Definition<'f> {
    pub fn new(node: Node<'f>, source: &'f SourceTree, kind: DefinitionKind) -> Self {
        Self { node, source, kind }
    }

    pub fn file(&self) -> &'f FileId {
        self.source.file()
    }

    /// The declared name of the definition, when it has one.
    pub fn name(&self) -> Option<Cow<'f, str>> {
        let node = match self.kind {
            DefinitionKind::Function => {
                module::function_name_node(self.node).unwrap_or(self.node)
            }
            DefinitionKind::Operator => self.node.child_by_field_name("operator")?,
            DefinitionKind::Module => self.node.child_by_field_name("name").unwrap_or(self.node),
            DefinitionKind::TypeAlias
            | DefinitionKind::Type
            | DefinitionKind::UnionConstructor
            | DefinitionKind::FieldType
            | DefinitionKind::Port => self.node.child_by_field_name("name")?,
            DefinitionKind::FunctionParameter
            | DefinitionKind::CasePattern
            | DefinitionKind::AnonymousFunctionParameter
            | DefinitionKind::TypeVariable => self.node,
        };
        Some(self.source.text_of(node))
    }
}

impl PartialEq for Definition<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.kind == other.kind && self.file() == other.file()
    }
}

impl Eq for Definition<'_> {}

impl fmt::Debug for Definition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("kind", &self.kind)
            .field("file", self.file())
            .field("node", &self.node)
            .finish()
    }
}

/// Which declarations a name can refer to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Functions, ports and operators.
    Value,
    /// Types and type aliases.
    Type,
    /// Union constructors and record alias constructors.
    Constructor,
    /// Module names and import aliases.
    Module,
}

/// A name as written at a use site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    /// The module path or alias before the name, e.g. `Html.Attributes`.
    pub qualifier: Option<String>,
    pub name: String,
    pub namespace: Namespace,
}

impl Reference {
    pub fn unqualified(name: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
            namespace,
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
            namespace,
        }
    }

    /// Read the reference an identifier node stands for.
    ///
    /// A name is qualified when it is immediately preceded by a dot and an
    /// upper-case module path segment. Clicking a module segment yields a
    /// reference in the module namespace.
    pub fn at(source: &SourceTree, node: Node<'_>) -> Option<Self> {
        let ident = match node.kind() {
            "value_expr" => node.named_child(0).and_then(last_segment)?,
            "value_qid" | "upper_case_qid" => last_segment(node)?,
            _ => node,
        };
        match ident.kind() {
            "lower_case_identifier" | "upper_case_identifier" | "operator_identifier" => {}
            _ => return None,
        }

        let path = ident
            .parent()
            .filter(|parent| matches!(parent.kind(), "value_qid" | "upper_case_qid"));
        let Some(path) = path else {
            let in_as_clause = ident.parent().is_some_and(|parent| parent.kind() == "as_clause");
            let namespace = match ident.kind() {
                "upper_case_identifier" if in_as_clause => Namespace::Module,
                "upper_case_identifier" => Namespace::Type,
                _ => Namespace::Value,
            };
            return Some(Self::unqualified(source.text_of(ident), namespace));
        };

        let segments = children_of_kinds(&["upper_case_identifier", "lower_case_identifier"], path);
        let position = segments.iter().position(|segment| *segment == ident)?;
        let is_last = position + 1 == segments.len();
        let qualifier_segments = if is_last {
            &segments[..position]
        } else {
            &segments[..=position]
        };
        let qualifier = (!qualifier_segments.is_empty()).then(|| {
            qualifier_segments
                .iter()
                .map(|segment| source.text_of(*segment))
                .collect::<Vec<_>>()
                .join(".")
        });

        if !is_last {
            let qualifier = qualifier?;
            return Some(Self::unqualified(qualifier, Namespace::Module));
        }
        if qualifier.is_some() && !is_qualified(ident) {
            return None;
        }

        let namespace = if ident.kind() == "lower_case_identifier" {
            Namespace::Value
        } else {
            match path.parent().map(|parent| parent.kind()) {
                Some("type_ref") => Namespace::Type,
                Some("module_declaration") | Some("import_clause") => Namespace::Module,
                _ => Namespace::Constructor,
            }
        };
        if namespace == Namespace::Module {
            return Some(Self::unqualified(source.text_of(path), Namespace::Module));
        }

        Some(Self {
            qualifier,
            name: source.text_of(ident).into_owned(),
            namespace,
        })
    }
}

fn last_segment(path: Node<'_>) -> Option<Node<'_>> {
    children_of_kinds(&["upper_case_identifier", "lower_case_identifier"], path).pop()
}

/// The import clause whose module name contains `node`.
fn importing_clause(node: Node<'_>) -> Option<Node<'_>> {
    let path = match node.kind() {
        "upper_case_qid" => node,
        _ => node.parent().filter(|parent| parent.kind() == "upper_case_qid")?,
    };
    path.parent().filter(|parent| parent.kind() == "import_clause")
}

/// Whether `ident` is immediately preceded by a dot and an upper-case segment.
fn is_qualified(ident: Node<'_>) -> bool {
    ident
        .prev_sibling()
        .filter(|dot| dot.kind() == "dot" || dot.kind() == ".")
        .and_then(|dot| dot.prev_sibling())
        .is_some_and(|segment| segment.kind() == "upper_case_identifier")
}

/// Resolves references against the trees of a forest.
#[derive(Clone, Copy)]
pub struct Resolver<'f> {
    forest: &'f Forest,
}

impl<'f> Resolver<'f> {
    pub fn new(forest: &'f Forest) -> Self {
        Self { forest }
    }

    pub fn forest(&self) -> &'f Forest {
        self.forest
    }

    /// Resolve the reference written at `node` in `source`.
    pub fn resolve_node(&self, source: &'f SourceTree, node: Node<'f>) -> Option<Definition<'f>> {
        if let Some(clause) = importing_clause(node) {
            return self.resolve_import(source, clause);
        }
        let reference = Reference::at(source, node)?;
        self.resolve(source, &reference)
    }

    /// The module an import clause names, by its literal module name.
    pub fn resolve_import(&self, source: &'f SourceTree, clause: Node<'f>) -> Option<Definition<'f>> {
        let name = source.text_of(module::import_module_name(clause)?);
        if let Some(target) = self.forest.by_module_name(&name)
            && let Some(declaration) = module::module_declaration(target)
        {
            return Some(Definition::new(declaration, target, DefinitionKind::Module));
        }
        Some(Definition::new(clause, source, DefinitionKind::Module))
    }

    /// Resolve a reference occurring in `source`.
    pub fn resolve(&self, source: &'f SourceTree, reference: &Reference) -> Option<Definition<'f>> {
        let found = match (&reference.qualifier, reference.namespace) {
            (_, Namespace::Module) => self.resolve_module(source, &reference.name),
            (Some(qualifier), namespace) => {
                self.resolve_qualified(source, qualifier, &reference.name, namespace)
            }
            (None, namespace) => self.resolve_unqualified(source, &reference.name, namespace),
        };
        if found.is_none() {
            tracing::trace!(uri = %source.file(), ?reference, "Reference not resolved");
        }
        found
    }

    fn imports(&self, source: &SourceTree) -> Vec<ImportInfo> {
        let index = match self.forest.index(source.file()) {
            Some(index) => Cow::Borrowed(index),
            None => Cow::Owned(ModuleIndex::build(source)),
        };
        index.imports_with_implicit()
    }

    /// The module an import qualifier refers to.
    ///
    /// Resolves to the target's module declaration, or to the import clause
    /// when the target module is not in the forest. An aliased import is
    /// reachable through its alias only.
    pub fn resolve_module(&self, source: &'f SourceTree, qualifier: &str) -> Option<Definition<'f>> {
        if module::module_name(source).as_deref() == Some(qualifier) {
            let declaration = module::module_declaration(source)?;
            return Some(Definition::new(declaration, source, DefinitionKind::Module));
        }
        for import in self.imports(source) {
            if import.qualifier() != qualifier {
                continue;
            }
            if let Some(target) = self.forest.by_module_name(&import.module_name)
                && let Some(declaration) = module::module_declaration(target)
            {
                return Some(Definition::new(declaration, target, DefinitionKind::Module));
            }
            if let Some(clause) = module::import_clause_by_module_name(source, &import.module_name) {
                return Some(Definition::new(clause, source, DefinitionKind::Module));
            }
        }
        None
    }

    /// Resolve `qualifier.name`. Only imports visible under `qualifier` are
    /// searched: an aliased import is not reachable by its full module name.
    pub fn resolve_qualified(
        &self,
        source: &'f SourceTree,
        qualifier: &str,
        name: &str,
        namespace: Namespace,
    ) -> Option<Definition<'f>> {
        self.imports(source)
            .iter()
            .filter(|import| import.qualifier() == qualifier)
            .find_map(|import| {
                let target = self.forest.by_module_name(&import.module_name)?;
                self.exposed_definition(target, name, namespace)
            })
    }

    /// Resolve an unqualified name: the module's own declarations first, then
    /// whatever the imports expose unqualified.
    pub fn resolve_unqualified(
        &self,
        source: &'f SourceTree,
        name: &str,
        namespace: Namespace,
    ) -> Option<Definition<'f>> {
        if let Some(local) = self.local_definition(source, name, namespace) {
            return Some(local);
        }
        self.imports(source).iter().find_map(|import| {
            let exposing = &import.exposing;
            let may_expose = match namespace {
                Namespace::Value => exposing.is_exposed(name),
                Namespace::Type => exposing.is_exposed_type_or_alias(name),
                Namespace::Constructor => {
                    exposing.is_all()
                        || exposing.is_exposed_type_or_alias(name)
                        || exposing
                            .entries()
                            .iter()
                            .any(|entry| entry.constructors.as_ref().is_some_and(|c| c.contains(name)))
                }
                Namespace::Module => false,
            };
            if !may_expose {
                return None;
            }
            let target = self.forest.by_module_name(&import.module_name)?;
            let found = self.exposed_definition(target, name, namespace)?;
            let visible = match found.kind {
                DefinitionKind::UnionConstructor => {
                    let owner = found.node.parent()?;
                    let owner_name = module::declared_name(target, owner)?;
                    exposing.exposes_constructor(&owner_name, name)
                }
                _ => true,
            };
            visible.then_some(found)
        })
    }

    /// A top-level declaration of `source`, regardless of what it exposes.
    pub fn local_definition(
        &self,
        source: &'f SourceTree,
        name: &str,
        namespace: Namespace,
    ) -> Option<Definition<'f>> {
        let root = source.root();
        let def = |node, kind| Definition::new(node, source, kind);
        match namespace {
            Namespace::Value => module::find_function(source, root, name, true)
                .map(|node| def(node, DefinitionKind::Function))
                .or_else(|| module::find_port(source, name).map(|node| def(node, DefinitionKind::Port)))
                .or_else(|| {
                    module::infix_declarations(source)
                        .into_iter()
                        .find(|infix| {
                            infix
                                .child_by_field_name("operator")
                                .is_some_and(|op| source.text_of(op) == name)
                        })
                        .map(|node| def(node, DefinitionKind::Operator))
                }),
            Namespace::Type => module::find_type_alias_declaration(source, name)
                .map(|node| def(node, DefinitionKind::TypeAlias))
                .or_else(|| {
                    module::find_type_declaration(source, name).map(|node| def(node, DefinitionKind::Type))
                }),
            Namespace::Constructor => module::find_union_constructor(source, name)
                .map(|node| def(node, DefinitionKind::UnionConstructor))
                .or_else(|| {
                    module::find_type_alias_declaration(source, name)
                        .map(|node| def(node, DefinitionKind::TypeAlias))
                }),
            Namespace::Module => None,
        }
    }

    /// Look `name` up in what `target` exposes.
    pub fn exposed_definition(
        &self,
        target: &'f SourceTree,
        name: &str,
        namespace: Namespace,
    ) -> Option<Definition<'f>> {
        let table = ExposingTable::build(target);
        let found = match namespace {
            Namespace::Value => table.get(name).filter(|exposed| {
                matches!(
                    exposed.kind,
                    DefinitionKind::Function | DefinitionKind::Port | DefinitionKind::Operator
                )
            }),
            Namespace::Type => table.get(name).filter(|exposed| exposed.kind.is_type_level()),
            Namespace::Constructor => {
                if let Some((_, constructor)) = table.constructor(name) {
                    return Some(Definition::new(
                        constructor.node,
                        target,
                        DefinitionKind::UnionConstructor,
                    ));
                }
                table
                    .get(name)
                    .filter(|exposed| exposed.kind == DefinitionKind::TypeAlias)
            }
            Namespace::Module => None,
        };
        found.map(|exposed| Definition::new(exposed.node, target, exposed.kind))
    }
}
