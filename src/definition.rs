//! Go-to-definition.
//!
//! [`FindDefinition`] answers one hop: the declaration an identifier refers
//! to. [`StructuralDefinitions`] answers it from the trees alone, walking
//! local scopes before falling back to module-level resolution.

use elm_syntax::module::{find_function, function_parameters};
use elm_syntax::nav::{ancestor_of_kind, descendants_of_kind, named_children, node_at_lsp_position};
use elm_syntax::{DefinitionKind, FileId, Node, SourceTree};
use lsp_types::Position;

use crate::chains;
use crate::forest::Forest;
use crate::resolve::{Definition, Namespace, Reference, Resolver};
use crate::types::{Record, Type, find_field_reference};

/// Finds the definition a node refers to.
pub trait FindDefinition<'f> {
    fn find_definition(&self, node: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>>;
}

/// Definition lookup by scope walking and import resolution.
#[derive(Clone, Copy)]
pub struct StructuralDefinitions<'f> {
    resolver: Resolver<'f>,
}

impl<'f> StructuralDefinitions<'f> {
    pub fn new(forest: &'f Forest) -> Self {
        Self {
            resolver: Resolver::new(forest),
        }
    }

    pub fn resolver(&self) -> &Resolver<'f> {
        &self.resolver
    }

    /// A binding introduced by a scope enclosing `ident`.
    fn local_binding(&self, ident: Node<'f>, source: &'f SourceTree, name: &str) -> Option<Definition<'f>> {
        let def = |node, kind| Some(Definition::new(node, source, kind));
        let mut current = ident.parent();
        while let Some(scope) = current {
            match scope.kind() {
                "value_declaration" => {
                    let found = function_parameters(scope)
                        .into_iter()
                        .find_map(|param| binding_in_pattern(source, param, name));
                    if let Some(binding) = found {
                        return def(binding, DefinitionKind::FunctionParameter);
                    }
                }
                "anonymous_function_expr" => {
                    let body = scope.child_by_field_name("expr");
                    let found = named_children(scope)
                        .filter(|child| Some(*child) != body)
                        .find_map(|param| binding_in_pattern(source, param, name));
                    if let Some(binding) = found {
                        return def(binding, DefinitionKind::AnonymousFunctionParameter);
                    }
                }
                "case_of_branch" => {
                    let found = scope
                        .child_by_field_name("pattern")
                        .and_then(|pattern| binding_in_pattern(source, pattern, name));
                    if let Some(binding) = found {
                        return def(binding, DefinitionKind::CasePattern);
                    }
                }
                "let_in_expr" => {
                    if let Some(found) = find_function(source, scope, name, true) {
                        return def(found, DefinitionKind::Function);
                    }
                }
                _ => {}
            }
            current = scope.parent();
        }
        None
    }

    fn lower_case(&self, ident: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>> {
        let parent = ident.parent()?;
        match parent.kind() {
            "field_access_expr" if parent.child_by_field_name("target") != Some(ident) => {
                return chains::field_type_of_access(self, parent, source);
            }
            "field" if parent.named_child(0) == Some(ident) => {
                return self.record_field(parent, source, ident);
            }
            "field_type" => {
                return Some(Definition::new(parent, source, DefinitionKind::FieldType));
            }
            "type_variable" | "lower_type_name" => return self.type_variable(parent, source),
            "function_declaration_left" if parent.named_child(0) == Some(ident) => {
                let declaration = parent.parent()?;
                return Some(Definition::new(declaration, source, DefinitionKind::Function));
            }
            "type_annotation" | "port_annotation" => {
                let name = source.text_of(ident);
                return self.resolver.local_definition(source, &name, Namespace::Value);
            }
            _ => {}
        }

        let reference = match ident.kind() {
            "record_base_identifier" => Reference::unqualified(source.text_of(ident), Namespace::Value),
            _ => Reference::at(source, ident)?,
        };
        if reference.qualifier.is_none()
            && let Some(local) = self.local_binding(ident, source, &reference.name)
        {
            return Some(local);
        }
        self.resolver.resolve(source, &reference)
    }

    /// The field definition named by a record expression's `field = value`.
    fn record_field(&self, field: Node<'f>, source: &'f SourceTree, name: Node<'f>) -> Option<Definition<'f>> {
        let record = field.parent().filter(|p| p.kind() == "record_expr")?;
        let alias = chains::type_alias_of_record(self, record, source)?;
        let record = Record::from_type_alias(alias)?;
        find_field_reference(&Type::Record(record), &source.text_of(name))
    }

    fn type_variable(&self, ident: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>> {
        let name = source.text_of(ident);
        let owner = ancestor_of_kind("type_alias_declaration", ident, true)
            .or_else(|| ancestor_of_kind("type_declaration", ident, true))?;
        descendants_of_kind("lower_type_name", owner)
            .into_iter()
            .find(|declared| source.text_of(*declared) == name)
            .map(|declared| Definition::new(declared, source, DefinitionKind::TypeVariable))
    }
}

/// The `lower_pattern` binding `name` inside a pattern, if any.
fn binding_in_pattern<'t>(source: &'t SourceTree, pattern: Node<'t>, name: &str) -> Option<Node<'t>> {
    if pattern.kind() == "lower_pattern" {
        return (source.text_of(pattern) == name).then_some(pattern);
    }
    descendants_of_kind("lower_pattern", pattern)
        .into_iter()
        .find(|binding| source.text_of(*binding) == name)
}

/// Narrow an expression node down to the identifier it names.
fn identifier_of(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "value_expr" => node.named_child(0).and_then(identifier_of),
        "value_qid" | "upper_case_qid" | "operator" | "lower_pattern" => named_children(node)
            .filter(|c| {
                matches!(
                    c.kind(),
                    "lower_case_identifier" | "upper_case_identifier" | "operator_identifier"
                )
            })
            .last(),
        _ => Some(node),
    }
}

impl<'f> FindDefinition<'f> for StructuralDefinitions<'f> {
    fn find_definition(&self, node: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>> {
        let ident = identifier_of(node)?;
        let found = match ident.kind() {
            "lower_case_identifier" | "record_base_identifier" => self.lower_case(ident, source),
            "upper_case_identifier" => {
                if let Some(parent) = ident.parent()
                    && matches!(parent.kind(), "type_alias_declaration" | "type_declaration" | "union_variant")
                {
                    let kind = match parent.kind() {
                        "type_alias_declaration" => DefinitionKind::TypeAlias,
                        "type_declaration" => DefinitionKind::Type,
                        _ => DefinitionKind::UnionConstructor,
                    };
                    return Some(Definition::new(parent, source, kind));
                }
                self.resolver.resolve_node(source, ident)
            }
            "operator_identifier" => {
                let name = source.text_of(ident);
                self.resolver
                    .resolve(source, &Reference::unqualified(name, Namespace::Value))
            }
            "lower_type_name" | "type_variable" => self.type_variable(ident, source),
            _ => None,
        };
        if found.is_none() {
            tracing::trace!(uri = %source.file(), kind = ident.kind(), "No definition found");
        }
        found
    }
}

/// The definition of whatever is under an LSP position in `file`.
pub fn definition_at<'f>(forest: &'f Forest, file: &FileId, position: Position) -> Option<Definition<'f>> {
    let source = forest.get_tree(file)?;
    let node = node_at_lsp_position(source, position)?;
    tracing::debug!(
        uri = %file,
        line = position.line,
        character = position.character,
        kind = node.kind(),
        "Definition request"
    );
    StructuralDefinitions::new(forest).find_definition(node, source)
}
