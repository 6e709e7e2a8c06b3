//! Local scopes, record field resolution and type-alias chains.

mod common;

use common::{forest, node_at, tree};
use elm_analyzer::chains;
use elm_analyzer::{
    DefinitionKind, FileId, FindDefinition, Namespace, Resolver, StructuralDefinitions, definition_at,
};
use elm_syntax::module::function_parameters;
use lsp_types::Position;

const GEOMETRY: &str = r#"module Geometry exposing (Point, origin)

type alias Point =
    { x : Int, y : Int }

origin : Point
origin =
    { x = 0, y = 0 }
"#;

const MAIN: &str = r#"module Main exposing (..)

import Geometry exposing (Point, origin)

type alias Model =
    { count : Int, name : String }

start : Point
start =
    origin

area : Point -> Int
area point =
    point.x * point.y

missing =
    start.z

update : Model -> Model
update model =
    { model | count = model.count + 1 }

summary : Model -> Int
summary m =
    case m of
        { count } ->
            count

apply =
    \value -> value

total =
    let
        helper n =
            n
    in
    helper 3

originX =
    origin.x

type alias Wrapper =
    { inner : Model }

type alias Empty =
    {}

depth : Wrapper -> String
depth wrapper =
    wrapper.inner.name

extra : Int -> Int
extra a b =
    a
"#;

const MAIN_URI: &str = "file:///src/Main.elm";
const GEOMETRY_URI: &str = "file:///src/Geometry.elm";

fn project() -> elm_analyzer::Forest {
    forest(&[(GEOMETRY_URI, GEOMETRY), (MAIN_URI, MAIN)])
}

#[test]
fn test_field_access_on_annotated_parameter() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);
    let checker = StructuralDefinitions::new(&forest);

    let x = checker
        .find_definition(node_at(main, "point.x", "x"), main)
        .expect("point.x resolves");
    assert_eq!(x.kind, DefinitionKind::FieldType);
    assert_eq!(x.file().as_str(), GEOMETRY_URI);
    assert_eq!(x.name().as_deref(), Some("x"));
}

#[test]
fn test_field_access_on_imported_function() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);
    let checker = StructuralDefinitions::new(&forest);

    let x = checker
        .find_definition(node_at(main, "origin.x", "x"), main)
        .expect("origin.x resolves");
    assert_eq!(x.kind, DefinitionKind::FieldType);
    assert_eq!(x.file().as_str(), GEOMETRY_URI);
    assert_eq!(x.source.text_of(x.node), "x : Int");
}

#[test]
fn test_field_access_on_function_return_type() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);
    let checker = StructuralDefinitions::new(&forest);

    let access = node_at(main, "start.z", "start.z");
    assert_eq!(access.kind(), "field_access_expr");
    assert!(chains::field_type_of_access(&checker, access, main).is_none());
    assert!(checker.find_definition(node_at(main, "start.z", "z"), main).is_none());

    // The record alias is still found, only the field is missing
    let alias = chains::type_alias_of_record(&checker, access, main).expect("Point");
    assert_eq!(alias.name().as_deref(), Some("Point"));
}

#[test]
fn test_record_fields_of_alias() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);
    let checker = StructuralDefinitions::new(&forest);

    let record = node_at(main, "{ model |", "{ model | count = model.count + 1 }");
    assert_eq!(record.kind(), "record_expr");
    let alias = chains::type_alias_of_record(&checker, record, main).expect("Model");
    let fields = chains::record_fields(alias).expect("record alias");
    let summary = fields
        .iter()
        .map(|(name, ty)| format!("{name} : {ty}"))
        .collect::<Vec<_>>()
        .join(", ");
    insta::assert_snapshot!(summary, @"count : Int, name : String");
}

#[test]
fn test_empty_record_alias_has_no_fields() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);
    let resolver = Resolver::new(&forest);

    let empty = resolver
        .local_definition(main, "Empty", Namespace::Type)
        .expect("Empty");
    assert_eq!(empty.kind, DefinitionKind::TypeAlias);
    assert!(chains::record_fields(empty).is_none());
}

#[test]
fn test_chained_field_access() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);
    let checker = StructuralDefinitions::new(&forest);

    // Starting from the identifier, the lookup climbs to the enclosing access
    let name = chains::field_type_of_access(&checker, node_at(main, "wrapper.inner.name", "name"), main)
        .expect("wrapper.inner.name");
    assert_eq!(name.kind, DefinitionKind::FieldType);
    assert_eq!(main.text_of(name.node), "name : String");

    let inner = node_at(main, "wrapper.inner", "inner");
    let inner_access = inner.parent().expect("access");
    assert_eq!(inner_access.kind(), "field_access_expr");
    let model = chains::type_alias_of_record_field(&checker, inner_access, main).expect("Model");
    assert_eq!(model.name().as_deref(), Some("Model"));
}

#[test]
fn test_parameter_count_mismatch() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);

    let declaration = node_at(main, "extra a b", "extra a b =\n    a");
    assert_eq!(declaration.kind(), "value_declaration");
    let params = function_parameters(declaration);
    assert_eq!(params.len(), 2);
    // Two parameters against `Int -> Int`: neither ordinal has a type
    assert!(params.iter().all(|param| chains::function_parameter_type(*param).is_none()));
    assert_eq!(main.text_of(chains::function_return_type(declaration).unwrap()), "Int");
}

#[test]
fn test_record_update_field_and_base() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);
    let checker = StructuralDefinitions::new(&forest);

    let field = checker
        .find_definition(node_at(main, "{ model | count", "count"), main)
        .expect("updated field resolves");
    assert_eq!(field.kind, DefinitionKind::FieldType);
    assert_eq!(field.file().as_str(), MAIN_URI);

    let base = checker
        .find_definition(node_at(main, "{ model |", "model"), main)
        .expect("record base resolves");
    assert_eq!(base.kind, DefinitionKind::FunctionParameter);
    assert_eq!(base.node.kind(), "lower_pattern");

    let read = checker
        .find_definition(node_at(main, "model.count", "count"), main)
        .expect("model.count resolves");
    assert_eq!(read, field);
}

#[test]
fn test_record_expression_uses_return_type() {
    let forest = project();
    let geometry = tree(&forest, GEOMETRY_URI);
    let checker = StructuralDefinitions::new(&forest);

    let y = checker
        .find_definition(node_at(geometry, "{ x = 0, y", "y"), geometry)
        .expect("record field resolves through the return type");
    assert_eq!(y.kind, DefinitionKind::FieldType);
    assert_eq!(y.name().as_deref(), Some("y"));
}

#[test]
fn test_case_subject_and_pattern() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);
    let checker = StructuralDefinitions::new(&forest);

    let case = node_at(main, "case m of", "case m of");
    let case = std::iter::successors(Some(case), |n| n.parent())
        .find(|n| n.kind() == "case_of_expr")
        .expect("case expression");
    let alias = chains::type_alias_of_case(&checker, case, main).expect("Model");
    assert_eq!(alias.name().as_deref(), Some("Model"));

    let count = checker
        .find_definition(node_at(main, "->\n            count", "count"), main)
        .expect("pattern binding resolves");
    assert_eq!(count.kind, DefinitionKind::CasePattern);
}

#[test]
fn test_local_scopes() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);
    let checker = StructuralDefinitions::new(&forest);

    let value = checker
        .find_definition(node_at(main, "-> value", "value"), main)
        .expect("lambda parameter");
    assert_eq!(value.kind, DefinitionKind::AnonymousFunctionParameter);

    let helper = checker
        .find_definition(node_at(main, "helper 3", "helper"), main)
        .expect("let declaration");
    assert_eq!(helper.kind, DefinitionKind::Function);
    assert_eq!(helper.name().as_deref(), Some("helper"));

    let n = checker
        .find_definition(node_at(main, "=\n            n\n", "n"), main)
        .expect("let function parameter");
    assert_eq!(n.kind, DefinitionKind::FunctionParameter);
}

#[test]
fn test_parameter_and_return_types() {
    let forest = project();
    let main = tree(&forest, MAIN_URI);

    let param = node_at(main, "area point", "point");
    let param = param.parent().filter(|p| p.kind() == "lower_pattern").unwrap_or(param);
    let ty = chains::function_parameter_type(param).expect("annotated parameter");
    assert_eq!(main.text_of(ty), "Point");

    let declaration = node_at(main, "area point", "area point =\n    point.x * point.y");
    assert_eq!(declaration.kind(), "value_declaration");
    assert_eq!(main.text_of(chains::function_return_type(declaration).unwrap()), "Int");
}

#[test]
fn test_definition_at_lsp_position() {
    let forest = project();
    let file = FileId::new(MAIN_URI);
    // `point.x` on line 13: the `x` is at character 10
    let found = definition_at(&forest, &file, Position::new(13, 10)).expect("field");
    assert_eq!(found.kind, DefinitionKind::FieldType);
    assert_eq!(
        definition_at(&forest, &file, Position::new(13, 10)),
        Some(found)
    );
}
