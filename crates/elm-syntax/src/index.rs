//! Owned per-module summaries.
//!
//! A `ModuleIndex` holds no tree references, so it can be cached next to a
//! tree and recomputed whenever the tree is replaced.

use serde::Serialize;

use crate::exposing::{Constructors, ExposedEntry, Exposing};
use crate::module;
use crate::source_file::SourceTree;

/// One `import` clause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportInfo {
    pub module_name: String,
    pub alias: Option<String>,
    pub exposing: Exposing,
}

impl ImportInfo {
    pub fn new(module_name: impl Into<String>, alias: Option<&str>, exposing: Exposing) -> Self {
        Self {
            module_name: module_name.into(),
            alias: alias.map(str::to_owned),
            exposing,
        }
    }

    /// The qualifier this import is visible under.
    ///
    /// An aliased import is only reachable through its alias.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.module_name)
    }
}

/// The imports every module receives without writing them.
pub fn implicit_imports() -> Vec<ImportInfo> {
    let types = |names: &[(&str, Option<Constructors>)]| {
        Exposing::Explicit(
            names
                .iter()
                .map(|(name, constructors)| ExposedEntry::type_with(*name, constructors.clone()))
                .collect(),
        )
    };
    vec![
        ImportInfo::new("Basics", None, Exposing::All),
        ImportInfo::new(
            "List",
            None,
            Exposing::Explicit(vec![
                ExposedEntry::type_with("List", None),
                ExposedEntry::value("::"),
            ]),
        ),
        ImportInfo::new("Maybe", None, types(&[("Maybe", Some(Constructors::All))])),
        ImportInfo::new("Result", None, types(&[("Result", Some(Constructors::All))])),
        ImportInfo::new("String", None, types(&[("String", None)])),
        ImportInfo::new("Char", None, types(&[("Char", None)])),
        ImportInfo::new("Tuple", None, Exposing::default()),
        ImportInfo::new("Debug", None, Exposing::default()),
        ImportInfo::new("Platform", None, types(&[("Program", None)])),
        ImportInfo::new("Platform.Cmd", Some("Cmd"), types(&[("Cmd", None)])),
        ImportInfo::new("Platform.Sub", Some("Sub"), types(&[("Sub", None)])),
    ]
}

/// Module name, exposing list and imports of one file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ModuleIndex {
    pub name: Option<String>,
    pub exposing: Exposing,
    pub imports: Vec<ImportInfo>,
}

impl ModuleIndex {
    pub fn build(source: &SourceTree) -> Self {
        let imports = module::import_clauses(source)
            .into_iter()
            .filter_map(|import| {
                let name = module::import_module_name(import)?;
                let alias = module::import_alias(import).map(|alias| source.text_of(alias));
                let exposing = import
                    .child_by_field_name("exposing")
                    .map(|list| Exposing::from_list(source, list))
                    .unwrap_or_default();
                Some(ImportInfo::new(source.text_of(name), alias.as_deref(), exposing))
            })
            .collect();

        Self {
            name: module::module_name(source),
            exposing: module::exposing(source),
            imports,
        }
    }

    /// Explicit imports followed by the implicit ones not shadowed by them.
    pub fn imports_with_implicit(&self) -> Vec<ImportInfo> {
        let mut imports = self.imports.clone();
        for implicit in implicit_imports() {
            if !self
                .imports
                .iter()
                .any(|import| import.module_name == implicit.module_name)
            {
                imports.push(implicit);
            }
        }
        imports
    }
}
