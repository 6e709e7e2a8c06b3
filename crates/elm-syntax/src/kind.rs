//! Definition kinds shared by the resolution layers.

use derive_more::Display;
use serde::Serialize;

/// The kind of definition a name resolves to.
///
/// This is a closed vocabulary: resolution chains match on it exhaustively.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DefinitionKind {
    /// A top-level or `let` value declaration.
    Function,
    /// A pattern bound by a function declaration's left-hand side.
    FunctionParameter,
    /// `type alias Name = ...`
    TypeAlias,
    /// `type Name = A | B`
    Type,
    /// An infix operator declaration.
    Operator,
    /// A module, through its declaration or an import clause.
    Module,
    /// A name bound by a `case` branch pattern.
    CasePattern,
    /// A parameter of `\x -> ...`.
    AnonymousFunctionParameter,
    /// A variant of a union type.
    UnionConstructor,
    /// A field of a record type.
    FieldType,
    /// A type variable of a type or alias declaration.
    TypeVariable,
    /// A port annotation.
    Port,
}

impl DefinitionKind {
    /// Whether definitions of this kind live in the type namespace.
    pub fn is_type_level(self) -> bool {
        matches!(
            self,
            DefinitionKind::TypeAlias | DefinitionKind::Type | DefinitionKind::TypeVariable
        )
    }
}
