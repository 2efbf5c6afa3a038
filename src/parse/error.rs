// src/parse/error.rs

use thiserror::Error;

/// Everything that can abort a table parse.
///
/// There is no partial output: the first error ends the whole parse and is
/// handed back to the caller.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A header column has no field parser, even after merging overrides.
    #[error("no field parser bound for column `{column}`")]
    UnknownColumn { column: String },

    /// Cell text does not have the lexical form the parser expects.
    ///
    /// `column` is the header's `data-stat`; `field` the output name that was
    /// being produced. They differ for composite or renamed bindings.
    #[error("column `{column}` (field `{field}`): cannot parse {raw:?} as {expected}")]
    MalformedValue {
        column: String,
        field: String,
        raw: String,
        expected: &'static str,
    },

    /// A composite cell lacks one of the attributes it is read from.
    #[error("column `{column}` (field `{field}`): cell has no `{attr}` attribute")]
    MissingAttribute {
        column: String,
        field: String,
        attr: &'static str,
    },

    /// Header cell at `index` (ranking column included) carries no `data-stat`.
    #[error("header cell {index} has no `data-stat` attribute")]
    MissingColumnId { index: usize },

    #[error("table has no {0}")]
    MissingSection(&'static str),
}

impl ParseError {
    pub(crate) fn malformed(field: &str, raw: &str, expected: &'static str) -> Self {
        ParseError::MalformedValue {
            column: field.to_string(),
            field: field.to_string(),
            raw: raw.to_string(),
            expected,
        }
    }

    pub(crate) fn missing_attr(field: &str, attr: &'static str) -> Self {
        ParseError::MissingAttribute {
            column: field.to_string(),
            field: field.to_string(),
            attr,
        }
    }

    /// Attribute a cell-level error to the header column it came from.
    /// A parser on its own only knows its output field names.
    pub fn in_column(self, id: &str) -> Self {
        match self {
            ParseError::MalformedValue {
                field,
                raw,
                expected,
                ..
            } => ParseError::MalformedValue {
                column: id.to_string(),
                field,
                raw,
                expected,
            },
            ParseError::MissingAttribute { field, attr, .. } => ParseError::MissingAttribute {
                column: id.to_string(),
                field,
                attr,
            },
            other => other,
        }
    }
}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;
