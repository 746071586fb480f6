use thiserror::Error;

use crate::ecs::{self, entity::EntityRef, value::Type};

/// A PivotScript file failed to load.
///
/// Nothing from the file is registered when this is returned.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{file}:{line}:{column}: {kind}")]
pub struct Error {
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub kind: ErrorKind,
}

impl Error {
    pub fn new(file: impl Into<String>, line: usize, column: usize, kind: ErrorKind) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrorKind {
    #[error("indentation mixes tabs and spaces")]
    MixedIndent,

    #[error("dedent does not match any outer indentation level")]
    InconsistentIndent,

    #[error("unexpected indent")]
    UnexpectedIndent,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),

    #[error("numeric literal `{0}` is out of range")]
    LiteralOutOfRange(String),

    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("unknown type `{0}`")]
    UnknownType(String),

    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    #[error("a system named `{0}` is already registered")]
    DuplicateSystem(String),

    #[error("property `{0}` is declared twice")]
    DuplicateProperty(String),

    #[error("event `{0}` is already declared with a different signature")]
    ConflictingEvent(String),

    #[error("declaration is missing its {0}")]
    MissingNode(&'static str),

    #[error(transparent)]
    Registration(ecs::Error),

    #[error("cannot read script: {0}")]
    Io(String),
}

impl From<ecs::Error> for ErrorKind {
    fn from(error: ecs::Error) -> Self {
        match error {
            ecs::Error::UnknownComponent(name) => ErrorKind::UnknownComponent(name),
            ecs::Error::DuplicateSystem(name) => ErrorKind::DuplicateSystem(name),
            ecs::Error::ConflictingEvent(name) => ErrorKind::ConflictingEvent(name),
            other => ErrorKind::Registration(other),
        }
    }
}

/// A script system failed while running for one entity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("`{0}` cannot be assigned to")]
    NotAssignable(String),

    #[error("unknown builtin `{0}`")]
    UnknownBuiltin(String),

    #[error("`{builtin}` takes {expected} arguments, {found} given")]
    WrongArity {
        builtin: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {position} of `{builtin}` must be {expected}, found {found}")]
    WrongParameterType {
        builtin: String,
        position: usize,
        expected: Type,
        found: Type,
    },

    #[error("condition must be Boolean, found {0}")]
    ConditionNotBoolean(Type),

    #[error("malformed expression")]
    MalformedExpression,

    #[error("invalid argument to `{builtin}`: {reason}")]
    InvalidArgument { builtin: String, reason: String },

    #[error("entity {0} no longer exists")]
    StaleEntity(EntityRef),

    #[error(transparent)]
    Ecs(#[from] ecs::Error),

    #[error("line {line}, column {column}: {source}")]
    At {
        line: usize,
        column: usize,
        source: Box<RuntimeError>,
    },
}

impl RuntimeError {
    /// Attach a source location, unless a more precise one is already attached.
    pub fn at(self, line: usize, column: usize) -> Self {
        match self {
            located @ RuntimeError::At { .. } => located,
            other => RuntimeError::At {
                line,
                column,
                source: Box::new(other),
            },
        }
    }

    /// The error without its location.
    pub fn root(&self) -> &RuntimeError {
        match self {
            RuntimeError::At { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_name_their_location() {
        let error = Error::new("ship.pivotscript", 3, 7, ErrorKind::UnknownType("Vec9".into()));
        assert_eq!(error.to_string(), "ship.pivotscript:3:7: unknown type `Vec9`");
    }

    #[test]
    fn innermost_location_wins() {
        // Given
        let error = RuntimeError::UnknownVariable("speed".into()).at(4, 9);

        // When
        let relocated = error.clone().at(2, 5);

        // Then
        assert_eq!(relocated, error);
        assert_eq!(relocated.root(), &RuntimeError::UnknownVariable("speed".into()));
        assert_eq!(
            relocated.to_string(),
            "line 4, column 9: unknown variable `speed`"
        );
    }
}
