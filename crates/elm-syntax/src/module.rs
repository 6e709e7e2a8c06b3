//! Module structure queries.
//!
//! Extracts the module declaration, exposing list, imports and top-level
//! declarations of one file. Malformed trees simply produce no match.

use tree_sitter::Node;

use crate::exposing::Exposing;
use crate::nav::{
    children_of_kinds, descendants_of_kind, first_child_of_kind, is_comment, named_children,
};
use crate::source_file::SourceTree;

/// The single top-level `module` declaration.
pub fn module_declaration(source: &SourceTree) -> Option<Node<'_>> {
    first_child_of_kind("module_declaration", source.root())
}

/// The dotted module name, e.g. `Html.Attributes`.
pub fn module_name(source: &SourceTree) -> Option<String> {
    let name = module_declaration(source)?.child_by_field_name("name")?;
    Some(source.text_of(name).into_owned())
}

/// The module's `exposing (...)` list node.
pub fn exposing_list(source: &SourceTree) -> Option<Node<'_>> {
    let declaration = module_declaration(source)?;
    declaration
        .child_by_field_name("exposing")
        .or_else(|| first_child_of_kind("exposing_list", declaration))
}

/// Every exposed value, type and operator entry of the module declaration.
pub fn exposing_list_entries(source: &SourceTree) -> Vec<Node<'_>> {
    exposing_list(source)
        .map(|list| children_of_kinds(&["exposed_value", "exposed_type", "exposed_operator"], list))
        .unwrap_or_default()
}

/// The module's exposing semantics.
///
/// A file without a module declaration is treated as exposing everything.
pub fn exposing(source: &SourceTree) -> Exposing {
    match exposing_list(source) {
        Some(list) => Exposing::from_list(source, list),
        None => Exposing::All,
    }
}

/// Whether the module makes `name` visible to importers.
pub fn is_exposed(source: &SourceTree, name: &str) -> bool {
    exposing(source).is_exposed(name)
}

/// Whether the module makes the type or alias `name` visible to importers.
pub fn is_exposed_type_or_alias(source: &SourceTree, name: &str) -> bool {
    exposing(source).is_exposed_type_or_alias(name)
}

pub fn import_clauses(source: &SourceTree) -> Vec<Node<'_>> {
    children_of_kinds(&["import_clause"], source.root())
}

pub fn last_import_clause(source: &SourceTree) -> Option<Node<'_>> {
    import_clauses(source).pop()
}

/// The module name node of an import clause.
pub fn import_module_name(import: Node<'_>) -> Option<Node<'_>> {
    import
        .child_by_field_name("moduleName")
        .or_else(|| first_child_of_kind("upper_case_qid", import))
}

/// The `as` alias name node of an import clause.
pub fn import_alias(import: Node<'_>) -> Option<Node<'_>> {
    let clause = import
        .child_by_field_name("asClause")
        .or_else(|| first_child_of_kind("as_clause", import))?;
    clause
        .child_by_field_name("name")
        .or_else(|| first_child_of_kind("upper_case_identifier", clause))
}

/// The import clause whose literal module name is `name`.
pub fn import_clause_by_module_name<'t>(source: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    import_clauses(source).into_iter().find(|import| {
        import_module_name(*import).is_some_and(|module| source.text_of(module) == name)
    })
}

/// The name node of the import visible as `name`, matching either the
/// imported module name or its `as` alias.
pub fn import_name_node<'t>(source: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    import_clauses(source).into_iter().find_map(|import| {
        if let Some(module) = import_module_name(import)
            && source.text_of(module) == name
        {
            return Some(module);
        }
        import_alias(import).filter(|alias| source.text_of(*alias) == name)
    })
}

/// The name identifier of a value declaration (`foo` in `foo x = ...`).
pub fn function_name_node(declaration: Node<'_>) -> Option<Node<'_>> {
    let left = declaration.child_by_field_name("functionDeclarationLeft")?;
    first_child_of_kind("lower_case_identifier", left)
}

/// The parameter patterns of a value declaration, in order.
pub fn function_parameters(declaration: Node<'_>) -> Vec<Node<'_>> {
    let Some(left) = declaration.child_by_field_name("functionDeclarationLeft") else {
        return Vec::new();
    };
    named_children(left)
        .skip(1)
        .filter(|param| !is_comment(param.kind()))
        .collect()
}

/// The named sibling before `node`, ignoring comments.
pub fn previous_named_sibling(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node.prev_named_sibling();
    while let Some(sibling) = current {
        if !is_comment(sibling.kind()) {
            return Some(sibling);
        }
        current = sibling.prev_named_sibling();
    }
    None
}

/// The type annotation directly preceding a declaration.
pub fn type_annotation_of(declaration: Node<'_>) -> Option<Node<'_>> {
    previous_named_sibling(declaration).filter(|sibling| sibling.kind() == "type_annotation")
}

pub fn top_level_function_declarations(source: &SourceTree) -> Vec<Node<'_>> {
    children_of_kinds(&["value_declaration"], source.root())
}

/// Top-level declarations not preceded by a type annotation.
pub fn top_level_function_declarations_without_signature(source: &SourceTree) -> Vec<Node<'_>> {
    top_level_function_declarations(source)
        .into_iter()
        .filter(|declaration| type_annotation_of(*declaration).is_none())
        .collect()
}

pub fn type_declarations(source: &SourceTree) -> Vec<Node<'_>> {
    children_of_kinds(&["type_declaration"], source.root())
}

pub fn type_alias_declarations(source: &SourceTree) -> Vec<Node<'_>> {
    children_of_kinds(&["type_alias_declaration"], source.root())
}

pub fn port_annotations(source: &SourceTree) -> Vec<Node<'_>> {
    children_of_kinds(&["port_annotation"], source.root())
}

pub fn infix_declarations(source: &SourceTree) -> Vec<Node<'_>> {
    children_of_kinds(&["infix_declaration"], source.root())
}

/// Text of a node's `name` field.
pub fn declared_name<'t>(source: &'t SourceTree, node: Node<'t>) -> Option<std::borrow::Cow<'t, str>> {
    node.child_by_field_name("name").map(|name| source.text_of(name))
}

fn find_named<'t>(source: &'t SourceTree, nodes: Vec<Node<'t>>, name: &str) -> Option<Node<'t>> {
    nodes
        .into_iter()
        .find(|node| declared_name(source, *node).is_some_and(|n| n == name))
}

pub fn find_type_declaration<'t>(source: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    find_named(source, type_declarations(source), name)
}

pub fn find_type_alias_declaration<'t>(source: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    find_named(source, type_alias_declarations(source), name)
}

pub fn find_port<'t>(source: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    find_named(source, port_annotations(source), name)
}

/// Find a value declaration named `name` under `scope`.
///
/// Searches declaration left-hand sides first. Without a direct match, the
/// names bound by destructuring declarations (`( a, b ) = ...`) are searched
/// in declaration order. Returns the `value_declaration` for a direct match
/// and the binding `lower_pattern` for a destructured one.
pub fn find_function<'t>(
    source: &'t SourceTree,
    scope: Node<'t>,
    name: &str,
    top_level_only: bool,
) -> Option<Node<'t>> {
    let declarations = if top_level_only {
        children_of_kinds(&["value_declaration"], scope)
    } else {
        descendants_of_kind("value_declaration", scope)
    };

    declarations
        .iter()
        .copied()
        .find(|declaration| {
            function_name_node(*declaration).is_some_and(|n| source.text_of(n) == name)
        })
        .or_else(|| {
            declarations.iter().find_map(|declaration| {
                let pattern = declaration.child_by_field_name("pattern")?;
                descendants_of_kind("lower_pattern", pattern)
                    .into_iter()
                    .find(|binding| source.text_of(*binding) == name)
            })
        })
}

/// Resolve an infix operator to the value declaration implementing it.
pub fn find_operator<'t>(source: &'t SourceTree, symbol: &str) -> Option<Node<'t>> {
    let infix = infix_declarations(source).into_iter().find(|infix| {
        infix
            .child_by_field_name("operator")
            .is_some_and(|operator| source.text_of(operator) == symbol)
    })?;
    let function = first_child_of_kind("value_expr", infix)
        .or_else(|| infix.child_by_field_name("functionName"))
        .or_else(|| infix.named_child(infix.named_child_count().checked_sub(1)?))?;
    let function_name = source.text_of(function);
    find_function(source, source.root(), &function_name, true)
}

/// The variants of a union type declaration.
pub fn union_variants(declaration: Node<'_>) -> Vec<Node<'_>> {
    children_of_kinds(&["union_variant"], declaration)
}

/// The `union_variant` declaring constructor `name`.
pub fn find_union_constructor<'t>(source: &'t SourceTree, name: &str) -> Option<Node<'t>> {
    type_declarations(source)
        .into_iter()
        .flat_map(union_variants)
        .find(|variant| declared_name(source, *variant).is_some_and(|n| n == name))
}

/// Every use of constructor `name` in expressions and patterns.
///
/// A constructor name in a type reference, a module declaration or an import
/// names a type or module, not the constructor, so those are excluded.
pub fn find_union_constructor_usages<'t>(source: &'t SourceTree, name: &str) -> Vec<Node<'t>> {
    descendants_of_kind("upper_case_qid", source.root())
        .into_iter()
        .filter(|qid| {
            !qid.parent().is_some_and(|parent| {
                matches!(
                    parent.kind(),
                    "type_ref" | "module_declaration" | "import_clause"
                )
            })
        })
        .filter(|qid| {
            children_of_kinds(&["upper_case_identifier"], *qid)
                .last()
                .is_some_and(|last| source.text_of(*last) == name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_file::FileId;

    fn parse(text: &str) -> SourceTree {
        SourceTree::parse(FileId::new("file:///Test.elm"), text, true).expect("parse")
    }

    const SOURCE: &str = r#"module Shapes.Point exposing (Point, Shape(..), origin, (</>))

import Dict
import Html.Attributes as Attr exposing (class)
import Json.Decode as Decode

type alias Point =
    { x : Int, y : Int }

type Shape
    = Circle Point Float
    | Square Point Float

infix left 7 (</>) = add

origin : Point
origin =
    Point 0 0

add a b =
    a

pair =
    let
        ( first, second ) =
            ( 1, 2 )
    in
    first

unit : Shape
unit =
    Circle origin 1
"#;

    #[test]
    fn test_module_name_and_exposing_entries() {
        let source = parse(SOURCE);
        assert_eq!(module_name(&source).as_deref(), Some("Shapes.Point"));
        let entries: Vec<_> = exposing_list_entries(&source)
            .into_iter()
            .map(|n| source.text_of(n).into_owned())
            .collect();
        assert_eq!(entries, vec!["Point", "Shape(..)", "origin", "(</>)"]);
    }

    #[test]
    fn test_missing_module_declaration() {
        let source = parse("foo = 1\n");
        assert!(module_declaration(&source).is_none());
        assert_eq!(module_name(&source), None);
        assert!(exposing_list_entries(&source).is_empty());
        assert!(is_exposed(&source, "foo"));
    }

    #[test]
    fn test_imports() {
        let source = parse(SOURCE);
        assert_eq!(import_clauses(&source).len(), 3);
        let last = last_import_clause(&source).unwrap();
        assert_eq!(source.text_of(import_module_name(last).unwrap()), "Json.Decode");

        assert!(import_clause_by_module_name(&source, "Html.Attributes").is_some());
        assert!(import_clause_by_module_name(&source, "Attr").is_none());

        let by_alias = import_name_node(&source, "Attr").unwrap();
        assert_eq!(source.text_of(by_alias), "Attr");
        let by_name = import_name_node(&source, "Dict").unwrap();
        assert_eq!(source.text_of(by_name), "Dict");
        assert!(import_name_node(&source, "Html").is_none());
    }

    #[test]
    fn test_declarations_without_signature() {
        let source = parse(SOURCE);
        let names: Vec<_> = top_level_function_declarations_without_signature(&source)
            .into_iter()
            .filter_map(function_name_node)
            .map(|n| source.text_of(n).into_owned())
            .collect();
        assert_eq!(names, vec!["add", "pair"]);
        assert_eq!(top_level_function_declarations(&source).len(), 4);
    }

    #[test]
    fn test_find_types() {
        let source = parse(SOURCE);
        assert!(find_type_alias_declaration(&source, "Point").is_some());
        assert!(find_type_alias_declaration(&source, "Shape").is_none());
        assert!(find_type_declaration(&source, "Shape").is_some());
        let circle = find_union_constructor(&source, "Circle").unwrap();
        assert_eq!(circle.kind(), "union_variant");
        assert!(find_union_constructor(&source, "Triangle").is_none());
    }

    #[test]
    fn test_find_function_direct_and_destructured() {
        let source = parse(SOURCE);
        let origin = find_function(&source, source.root(), "origin", true).unwrap();
        assert_eq!(origin.kind(), "value_declaration");

        assert!(find_function(&source, source.root(), "second", true).is_none());
        let second = find_function(&source, source.root(), "second", false).unwrap();
        assert_eq!(second.kind(), "lower_pattern");
        assert_eq!(source.text_of(second), "second");

        assert!(find_function(&source, source.root(), "missing", true).is_none());
    }

    #[test]
    fn test_find_operator_redirects_to_function() {
        let source = parse(SOURCE);
        let add = find_operator(&source, "</>").unwrap();
        assert_eq!(source.text_of(function_name_node(add).unwrap()), "add");
        assert!(find_operator(&source, "<?>").is_none());
    }

    #[test]
    fn test_constructor_usages_exclude_type_positions() {
        let source = parse(SOURCE);
        assert_eq!(find_union_constructor_usages(&source, "Circle").len(), 1);
        // `Point` appears in type positions and once as a record constructor
        assert_eq!(find_union_constructor_usages(&source, "Point").len(), 1);
    }

    #[test]
    fn test_queries_are_idempotent() {
        let source = parse(SOURCE);
        assert_eq!(import_clauses(&source), import_clauses(&source));
        assert_eq!(
            find_function(&source, source.root(), "second", false),
            find_function(&source, source.root(), "second", false)
        );
    }
}
