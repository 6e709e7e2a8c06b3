//! Exposing lists and per-module exposing tables.

use std::collections::BTreeMap;

use serde::Serialize;
use tree_sitter::Node;

use crate::kind::DefinitionKind;
use crate::module;
use crate::nav::{children_of_kinds, first_child_of_kind};
use crate::source_file::SourceTree;

/// The constructors exposed along with a union type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Constructors {
    /// `Type(..)`
    All,
    /// `Type(A, B)`
    Explicit(Vec<String>),
}

impl Constructors {
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Constructors::All => true,
            Constructors::Explicit(names) => names.iter().any(|n| n == name),
        }
    }
}

/// One entry of an explicit exposing list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExposedEntry {
    /// Value, type or operator name. Operators are stored without parentheses.
    pub name: String,
    /// Constructor sublist of a type entry.
    pub constructors: Option<Constructors>,
}

impl ExposedEntry {
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructors: None,
        }
    }

    pub fn type_with(name: impl Into<String>, constructors: Option<Constructors>) -> Self {
        Self {
            name: name.into(),
            constructors,
        }
    }

    fn is_type(&self) -> bool {
        self.name.starts_with(|c: char| c.is_ascii_uppercase())
    }
}

/// What a module declaration or an import exposes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Exposing {
    /// `exposing (..)`
    All,
    /// An explicit list; empty for an import without `exposing`.
    Explicit(Vec<ExposedEntry>),
}

impl Default for Exposing {
    fn default() -> Self {
        Exposing::Explicit(Vec::new())
    }
}

impl Exposing {
    /// Read an `exposing_list` node.
    pub fn from_list(source: &SourceTree, list: Node<'_>) -> Self {
        if first_child_of_kind("double_dot", list).is_some() {
            return Exposing::All;
        }
        let entries = children_of_kinds(&["exposed_value", "exposed_type", "exposed_operator"], list)
            .into_iter()
            .filter_map(|entry| exposed_entry(source, entry))
            .collect();
        Exposing::Explicit(entries)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Exposing::All)
    }

    pub fn entries(&self) -> &[ExposedEntry] {
        match self {
            Exposing::All => &[],
            Exposing::Explicit(entries) => entries,
        }
    }

    pub fn entry(&self, name: &str) -> Option<&ExposedEntry> {
        self.entries().iter().find(|entry| entry.name == name)
    }

    /// Whether `name` is visible. Always true under a wildcard.
    pub fn is_exposed(&self, name: &str) -> bool {
        self.is_all() || self.entry(name).is_some()
    }

    /// Whether the type or alias `name` is visible. Always true under a wildcard.
    pub fn is_exposed_type_or_alias(&self, name: &str) -> bool {
        self.is_all() || self.entry(name).is_some_and(ExposedEntry::is_type)
    }

    /// Whether constructor `constructor` of type `type_name` is visible.
    pub fn exposes_constructor(&self, type_name: &str, constructor: &str) -> bool {
        match self {
            Exposing::All => true,
            Exposing::Explicit(_) => self
                .entry(type_name)
                .and_then(|entry| entry.constructors.as_ref())
                .is_some_and(|constructors| constructors.contains(constructor)),
        }
    }
}

fn exposed_entry(source: &SourceTree, entry: Node<'_>) -> Option<ExposedEntry> {
    match entry.kind() {
        "exposed_value" => Some(ExposedEntry::value(source.text_of(entry))),
        "exposed_operator" => {
            let operator = first_child_of_kind("operator_identifier", entry)
                .map(|op| source.text_of(op).into_owned())
                .unwrap_or_else(|| {
                    source
                        .text_of(entry)
                        .trim_matches(|c| c == '(' || c == ')')
                        .to_owned()
                });
            Some(ExposedEntry::value(operator))
        }
        "exposed_type" => {
            let name = first_child_of_kind("upper_case_identifier", entry)?;
            let constructors = first_child_of_kind("exposed_union_constructors", entry).map(|list| {
                if first_child_of_kind("double_dot", list).is_some() {
                    Constructors::All
                } else {
                    Constructors::Explicit(
                        children_of_kinds(&["upper_case_identifier"], list)
                            .into_iter()
                            .map(|c| source.text_of(c).into_owned())
                            .collect(),
                    )
                }
            });
            Some(ExposedEntry::type_with(source.text_of(name), constructors))
        }
        _ => None,
    }
}

/// A union constructor made visible along with its type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExposedConstructor<'t> {
    pub name: String,
    /// The `union_variant` node.
    pub node: Node<'t>,
}

/// A definition visible to importers of a module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Exposed<'t> {
    pub name: String,
    pub node: Node<'t>,
    pub kind: DefinitionKind,
    /// Populated only when the type is exposed with its constructors.
    pub constructors: Vec<ExposedConstructor<'t>>,
}

/// Every definition a module exposes, keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExposingTable<'t> {
    entries: BTreeMap<String, Exposed<'t>>,
}

impl<'t> ExposingTable<'t> {
    /// Build the table from the module's top-level declarations.
    pub fn build(source: &'t SourceTree) -> Self {
        let exposing = module::exposing(source);
        let mut table = Self::default();

        for declaration in module::top_level_function_declarations(source) {
            if let Some(name) = module::function_name_node(declaration) {
                let name = source.text_of(name);
                if exposing.is_exposed(&name) {
                    table.insert(name.into_owned(), declaration, DefinitionKind::Function);
                }
            }
        }

        for port in module::port_annotations(source) {
            if let Some(name) = module::declared_name(source, port)
                && exposing.is_exposed(&name)
            {
                table.insert(name.into_owned(), port, DefinitionKind::Port);
            }
        }

        for infix in module::infix_declarations(source) {
            if let Some(operator) = infix.child_by_field_name("operator") {
                let operator = source.text_of(operator);
                if exposing.is_exposed(&operator) {
                    table.insert(operator.into_owned(), infix, DefinitionKind::Operator);
                }
            }
        }

        for alias in module::type_alias_declarations(source) {
            if let Some(name) = module::declared_name(source, alias)
                && exposing.is_exposed_type_or_alias(&name)
            {
                table.insert(name.into_owned(), alias, DefinitionKind::TypeAlias);
            }
        }

        for declaration in module::type_declarations(source) {
            let Some(name) = module::declared_name(source, declaration) else {
                continue;
            };
            if !exposing.is_exposed_type_or_alias(&name) {
                continue;
            }
            let constructors = module::union_variants(declaration)
                .into_iter()
                .filter_map(|variant| {
                    let constructor = module::declared_name(source, variant)?;
                    exposing
                        .exposes_constructor(&name, &constructor)
                        .then(|| ExposedConstructor {
                            name: constructor.into_owned(),
                            node: variant,
                        })
                })
                .collect();
            table.entries.insert(
                name.to_string(),
                Exposed {
                    name: name.into_owned(),
                    node: declaration,
                    kind: DefinitionKind::Type,
                    constructors,
                },
            );
        }

        table
    }

    fn insert(&mut self, name: String, node: Node<'t>, kind: DefinitionKind) {
        self.entries.entry(name.clone()).or_insert(Exposed {
            name,
            node,
            kind,
            constructors: Vec::new(),
        });
    }

    pub fn get(&self, name: &str) -> Option<&Exposed<'t>> {
        self.entries.get(name)
    }

    /// Find an exposed union constructor and the type that owns it.
    pub fn constructor(&self, name: &str) -> Option<(&Exposed<'t>, &ExposedConstructor<'t>)> {
        self.entries.values().find_map(|exposed| {
            exposed
                .constructors
                .iter()
                .find(|c| c.name == name)
                .map(|c| (exposed, c))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Exposed<'t>> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
