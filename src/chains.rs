//! Type-inference chains.
//!
//! Small rules that walk from an expression to the type alias describing it:
//! parameter to annotation segment, function to return type, record to alias,
//! field access to field. Each rule asks a [`FindDefinition`] for one hop and
//! branches on the kind of what it found.

use elm_syntax::module::{function_parameters, type_annotation_of};
use elm_syntax::nav::{ancestor_of_kind, first_descendant_or_self_of_kind, is_comment, named_children};
use elm_syntax::{DefinitionKind, Node, SourceTree};

use crate::definition::FindDefinition;
use crate::resolve::Definition;
use crate::types::{Record, Type, find_field_reference};

/// The segments of a function type expression, arrows and comments removed.
fn type_segments(expression: Node<'_>) -> Vec<Node<'_>> {
    named_children(expression)
        .filter(|child| child.kind() != "arrow" && !is_comment(child.kind()))
        .collect()
}

fn annotation_segments(annotation: Node<'_>) -> Vec<Node<'_>> {
    annotation
        .child_by_field_name("typeExpression")
        .map(type_segments)
        .unwrap_or_default()
}

/// The annotated type of a function parameter.
///
/// `param` is one of the patterns directly on the declaration's left-hand
/// side. Returns `None` without an annotation, when the parameter count does
/// not fit the annotation, or when the ordinal would land on the return type.
pub fn function_parameter_type(param: Node<'_>) -> Option<Node<'_>> {
    let param = match param.kind() {
        "lower_case_identifier" => param.parent().filter(|p| p.kind() == "lower_pattern")?,
        _ => param,
    };
    let declaration = ancestor_of_kind("value_declaration", param, false)?;
    let annotation = type_annotation_of(declaration)?;
    let params = function_parameters(declaration);
    let position = params.iter().position(|p| *p == param)?;

    let segments = annotation_segments(annotation);
    if segments.len() <= params.len() || position + 1 >= segments.len() {
        return None;
    }
    segments.get(position).copied()
}

/// The last segment of a function's annotation, with one level of nesting unwrapped.
pub fn function_return_type(declaration: Node<'_>) -> Option<Node<'_>> {
    let annotation = type_annotation_of(declaration)?;
    last_segment_unwrapped(annotation)
}

fn last_segment_unwrapped(annotated: Node<'_>) -> Option<Node<'_>> {
    let last = annotation_segments(annotated).pop()?;
    if last.kind() == "type_expression" {
        type_segments(last).pop()
    } else {
        Some(last)
    }
}

/// Where the type of a definition is written down.
enum TypeSite<'f> {
    Alias(Definition<'f>),
    Expression(Node<'f>, &'f SourceTree),
}

fn type_site<'f>(definition: Definition<'f>) -> Option<TypeSite<'f>> {
    let expression = |node: Option<Node<'f>>| node.map(|n| TypeSite::Expression(n, definition.source));
    match definition.kind {
        DefinitionKind::TypeAlias => Some(TypeSite::Alias(definition)),
        DefinitionKind::FunctionParameter => expression(function_parameter_type(definition.node)),
        DefinitionKind::Function => expression(function_return_type(definition.node)),
        DefinitionKind::Port => expression(last_segment_unwrapped(definition.node)),
        DefinitionKind::FieldType => expression(definition.node.child_by_field_name("typeExpression")),
        DefinitionKind::Type
        | DefinitionKind::Operator
        | DefinitionKind::Module
        | DefinitionKind::CasePattern
        | DefinitionKind::AnonymousFunctionParameter
        | DefinitionKind::UnionConstructor
        | DefinitionKind::TypeVariable => None,
    }
}

/// The type alias named by the first type reference inside `expression`.
pub fn type_alias_of_type_expression<'f, C>(
    checker: &C,
    expression: Node<'f>,
    source: &'f SourceTree,
) -> Option<Definition<'f>>
where
    C: FindDefinition<'f> + ?Sized,
{
    let name = first_descendant_or_self_of_kind("upper_case_qid", expression)
        .and_then(|qid| {
            named_children(qid)
                .filter(|c| c.kind() == "upper_case_identifier")
                .last()
        })
        .or_else(|| first_descendant_or_self_of_kind("upper_case_identifier", expression))?;
    checker
        .find_definition(name, source)
        .filter(|definition| definition.kind == DefinitionKind::TypeAlias)
}

fn alias_of_site<'f, C>(checker: &C, site: TypeSite<'f>) -> Option<Definition<'f>>
where
    C: FindDefinition<'f> + ?Sized,
{
    match site {
        TypeSite::Alias(alias) => Some(alias),
        TypeSite::Expression(expression, source) => {
            type_alias_of_type_expression(checker, expression, source)
        }
    }
}

/// The type alias describing the value a definition binds.
pub fn type_alias_of_definition<'f, C>(checker: &C, definition: Definition<'f>) -> Option<Definition<'f>>
where
    C: FindDefinition<'f> + ?Sized,
{
    alias_of_site(checker, type_site(definition)?)
}

fn record_base_identifier<'t>(node: Node<'t>) -> Option<Node<'t>> {
    let has_base = |n: Node<'t>| named_children(n).find(|c| c.kind() == "record_base_identifier");
    if node.kind() == "record_base_identifier" {
        return Some(node);
    }
    has_base(node).or_else(|| node.parent().and_then(has_base))
}

/// The declaration whose body evaluates to `node`.
fn returned_by(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    loop {
        let parent = current.parent()?;
        match parent.kind() {
            "parenthesized_expr" => {}
            "let_in_expr" if parent.child_by_field_name("body") == Some(current) => {}
            "value_declaration" if parent.child_by_field_name("body") == Some(current) => {
                return Some(parent);
            }
            _ => return None,
        }
        current = parent;
    }
}

/// The type alias of a record expression, record base or field access target.
///
/// Uses the record base identifier on the node or its parent when there is
/// one, the enclosing function's return type when the node is a function
/// body, and the node's own definition otherwise.
pub fn type_alias_of_record<'f, C>(checker: &C, node: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>>
where
    C: FindDefinition<'f> + ?Sized,
{
    if let Some(base) = record_base_identifier(node) {
        let definition = checker.find_definition(base, source)?;
        return type_alias_of_definition(checker, definition);
    }
    if node.kind() == "field_access_expr" {
        let target = node.child_by_field_name("target")?;
        return type_alias_of_expression(checker, target, source);
    }
    if let Some(declaration) = returned_by(node) {
        let returns = function_return_type(declaration)?;
        return type_alias_of_type_expression(checker, returns, source);
    }
    let definition = checker.find_definition(node, source)?;
    type_alias_of_definition(checker, definition)
}

/// The type alias of the value an expression evaluates to.
pub fn type_alias_of_expression<'f, C>(checker: &C, expression: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>>
where
    C: FindDefinition<'f> + ?Sized,
{
    match expression.kind() {
        "parenthesized_expr" => {
            let inner = named_children(expression).find(|c| !is_comment(c.kind()))?;
            type_alias_of_expression(checker, inner, source)
        }
        "field_access_expr" => {
            let field = field_in_access(checker, expression, source)?;
            type_alias_of_definition(checker, field)
        }
        "record_expr" => type_alias_of_record(checker, expression, source),
        _ => {
            let definition = checker.find_definition(expression, source)?;
            type_alias_of_definition(checker, definition)
        }
    }
}

fn field_in_access<'f, C>(checker: &C, access: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>>
where
    C: FindDefinition<'f> + ?Sized,
{
    let field = access
        .child_by_field_name("field")
        .or_else(|| named_children(access).filter(|c| c.kind() == "lower_case_identifier").last())?;
    let alias = type_alias_of_record(checker, access, source)?;
    let record = Record::from_type_alias(alias)?;
    find_field_reference(&Type::Record(record), &source.text_of(field))
}

/// The `field_type` a field access refers to.
///
/// `node` may be the access itself or a node inside it such as the field
/// identifier. When resolution fails at one level it is retried on the
/// parent, up to the enclosing declaration.
pub fn field_type_of_access<'f, C>(checker: &C, node: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>>
where
    C: FindDefinition<'f> + ?Sized,
{
    let mut current = Some(node);
    while let Some(candidate) = current {
        if candidate.kind() == "field_access_expr"
            && let Some(found) = field_in_access(checker, candidate, source)
        {
            return Some(found);
        }
        if matches!(candidate.kind(), "value_declaration" | "file") {
            break;
        }
        current = candidate.parent();
    }
    None
}

/// The type alias of the field a field access reads.
pub fn type_alias_of_record_field<'f, C>(checker: &C, node: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>>
where
    C: FindDefinition<'f> + ?Sized,
{
    let field = field_type_of_access(checker, node, source)?;
    type_alias_of_definition(checker, field)
}

/// The type alias of a case expression's subject.
///
/// Accepts the `case_of_expr` or the subject expression itself.
pub fn type_alias_of_case<'f, C>(checker: &C, node: Node<'f>, source: &'f SourceTree) -> Option<Definition<'f>>
where
    C: FindDefinition<'f> + ?Sized,
{
    let subject = match node.kind() {
        "case_of_expr" => node.child_by_field_name("expr")?,
        _ => node,
    };
    type_alias_of_expression(checker, subject, source)
}

/// `(name, type text)` for each field of a record type alias, in source order.
///
/// `None` unless the alias is a non-empty record.
pub fn record_fields(alias: Definition<'_>) -> Option<Vec<(String, String)>> {
    if alias.kind != DefinitionKind::TypeAlias {
        return None;
    }
    let body = alias.node.child_by_field_name("typeExpression")?;
    let record = first_descendant_or_self_of_kind("record_type", body)?;
    let fields = named_children(record)
        .filter(|c| c.kind() == "field_type")
        .filter_map(|field| {
            let name = field.child_by_field_name("name")?;
            let ty = field.child_by_field_name("typeExpression")?;
            Some((
                alias.source.text_of(name).into_owned(),
                alias.source.text_of(ty).into_owned(),
            ))
        })
        .collect::<Vec<_>>();
    (!fields.is_empty()).then_some(fields)
}
