//! Structural shapes of type expressions.

use std::collections::BTreeMap;

use elm_syntax::nav::{children_of_kinds, first_child_of_kind, first_descendant_or_self_of_kind};
use elm_syntax::{DefinitionKind, Node, SourceTree};

use crate::resolve::Definition;

/// A record shape: field name -> the definitions introducing it, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record<'f> {
    pub field_references: BTreeMap<String, Vec<Definition<'f>>>,
}

impl<'f> Record<'f> {
    /// Read a `record_type` node.
    pub fn from_record_type(source: &'f SourceTree, record: Node<'f>) -> Self {
        let mut field_references: BTreeMap<String, Vec<Definition<'f>>> = BTreeMap::new();
        for field in children_of_kinds(&["field_type"], record) {
            let Some(name) = field.child_by_field_name("name") else {
                continue;
            };
            field_references
                .entry(source.text_of(name).into_owned())
                .or_default()
                .push(Definition::new(field, source, DefinitionKind::FieldType));
        }
        Self { field_references }
    }

    /// The record a type alias stands for, if its body is a record.
    pub fn from_type_alias(alias: Definition<'f>) -> Option<Self> {
        if alias.kind != DefinitionKind::TypeAlias {
            return None;
        }
        let body = alias.node.child_by_field_name("typeExpression")?;
        let record = first_descendant_or_self_of_kind("record_type", body)?;
        Some(Self::from_record_type(alias.source, record))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_references.keys().map(String::as_str)
    }
}

/// The coarse shape of a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type<'f> {
    Record(Record<'f>),
    /// A named type such as `Int` or `Maybe a`, by its written name.
    Named(String),
    Unknown,
}

impl<'f> Type<'f> {
    /// Classify a type expression node.
    pub fn of_type_expression(source: &'f SourceTree, node: Node<'f>) -> Self {
        let mut node = node;
        while node.kind() == "type_expression" && node.named_child_count() == 1 {
            match node.named_child(0) {
                Some(inner) => node = inner,
                None => break,
            }
        }
        match node.kind() {
            "record_type" => Type::Record(Record::from_record_type(source, node)),
            "type_ref" => node
                .child_by_field_name("name")
                .or_else(|| first_child_of_kind("upper_case_qid", node))
                .map(|name| Type::Named(source.text_of(name).into_owned()))
                .unwrap_or(Type::Unknown),
            _ => Type::Unknown,
        }
    }
}

/// The first definition of `field` in a record type.
pub fn find_field_reference<'f>(ty: &Type<'f>, field: &str) -> Option<Definition<'f>> {
    match ty {
        Type::Record(record) => record.field_references.get(field)?.first().copied(),
        Type::Named(_) | Type::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elm_syntax::{FileId, module};

    fn parse(text: &str) -> SourceTree {
        SourceTree::parse(FileId::new("file:///Types.elm"), text, true).expect("parse")
    }

    #[test]
    fn test_record_from_type_alias() {
        let source = parse("module Types exposing (..)\n\ntype alias Point =\n    { x : Int, y : Int }\n");
        let node = module::find_type_alias_declaration(&source, "Point").unwrap();
        let alias = Definition::new(node, &source, DefinitionKind::TypeAlias);
        let record = Record::from_type_alias(alias).unwrap();
        assert_eq!(record.field_names().collect::<Vec<_>>(), vec!["x", "y"]);

        let ty = Type::Record(record);
        let x = find_field_reference(&ty, "x").unwrap();
        assert_eq!(x.kind, DefinitionKind::FieldType);
        assert_eq!(source.text_of(x.node), "x : Int");
        assert!(find_field_reference(&ty, "z").is_none());
    }

    #[test]
    fn test_non_record_alias_has_no_fields() {
        let source = parse("module Types exposing (..)\n\ntype alias Name =\n    String\n");
        let node = module::find_type_alias_declaration(&source, "Name").unwrap();
        let alias = Definition::new(node, &source, DefinitionKind::TypeAlias);
        assert!(Record::from_type_alias(alias).is_none());

        let body = node.child_by_field_name("typeExpression").unwrap();
        let ty = Type::of_type_expression(&source, body);
        assert_eq!(ty, Type::Named("String".to_owned()));
        assert!(find_field_reference(&ty, "x").is_none());
    }
}
