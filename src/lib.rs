//! Analysis core for Elm source trees.
//!
//! A [`Forest`] owns one parsed tree per file. [`ReparseHandler`] keeps it in
//! sync with editor notifications and the filesystem, and the query side
//! borrows it to resolve names:
//! - [`Resolver`]: module-level and cross-file resolution through imports
//! - [`StructuralDefinitions`]: go-to-definition with local scopes
//! - [`chains`]: type-alias inference for records and field accesses

pub mod chains;
pub mod definition;
pub mod error;
pub mod forest;
pub mod reparse;
pub mod resolve;
pub mod types;

pub use definition::{FindDefinition, StructuralDefinitions, definition_at};
pub use error::{AnalysisError, AnalysisResult};
pub use forest::{Forest, ForestEntry};
pub use reparse::ReparseHandler;
pub use resolve::{Definition, Namespace, Reference, Resolver};
pub use types::{Record, Type, find_field_reference};

pub use elm_syntax::{DefinitionKind, FileId, SourceTree};
