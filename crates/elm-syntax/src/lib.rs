//! Syntax layer for the Elm analyzer.
//!
//! This crate wraps Tree-sitter CSTs produced by the `tree-sitter-elm`
//! grammar and provides the read-only queries the analysis core is built on:
//! - Tree navigation: child/descendant/ancestor search, position mapping,
//!   predecessor and successor traversal
//! - Module structure: module declaration, exposing list, imports and
//!   top-level declarations
//! - Exposing tables and owned per-module indexes

pub mod exposing;
pub mod index;
pub mod kind;
pub mod line_index;
pub mod module;
pub mod nav;
pub mod source_file;

pub use exposing::{Constructors, Exposed, ExposedConstructor, ExposedEntry, Exposing, ExposingTable};
pub use index::{ImportInfo, ModuleIndex, implicit_imports};
pub use kind::DefinitionKind;
pub use line_index::{offset_from_position, point_from_position, position_from_offset};
pub use source_file::{FileId, SourceTree, new_parser, parse_with_rope, parse_with_thread_local};

pub use tree_sitter::{Node, Point, Tree};
