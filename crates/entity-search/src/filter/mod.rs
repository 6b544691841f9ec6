//! Filter expressions understood by the bundled search backends.
//!
//! Callers hand filter expressions to the search service as opaque strings.
//! The bundled backends accept the OData-style subset described in
//! [`parser`], checked against the document schema by [`Filter::parse`]:
//! scalar fields (`id`, `index`, `created`, `hh`, `hm`) are compared
//! directly, and typed collections are reached through `any`/`all` lambdas
//! whose variable addresses the element fields (`name` and `value`, or `id`
//! for `rel`).

mod eval;
pub mod parser;

use thiserror::Error;

pub use parser::{CompareOp, FilterExpr, FilterParser, Literal, LogicalOp, MAX_DEPTH};

use crate::error::TransportError;
use crate::schema::{FieldKind, FieldType, ScalarField};

/// Filter parsing and validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// The expression is not well formed.
    #[error("filter syntax error at position {position}: {message}")]
    Syntax { message: String, position: usize },

    /// The expression references a field the document schema does not declare.
    #[error("unknown field in filter: {path}")]
    UnknownField { path: String },

    /// The expression uses a construct the backend cannot evaluate.
    #[error("unsupported filter: {message}")]
    Unsupported { message: String },
}

impl FilterError {
    /// Converts the error into the transport error a service reports for a malformed request.
    pub fn into_transport(self, service: &str) -> TransportError {
        TransportError::BadRequest {
            service: service.to_string(),
            message: self.to_string(),
        }
    }
}

/// A parsed filter checked against the document schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    expr: FilterExpr,
}

impl Filter {
    /// Parses and validates a filter expression.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let expr = FilterParser::parse(input)?;
        validate(&expr, None)?;
        Ok(Self { expr })
    }

    /// Returns the expression tree.
    pub fn expr(&self) -> &FilterExpr {
        &self.expr
    }

    /// Returns true if the filter matches every document.
    pub fn is_match_all(&self) -> bool {
        matches!(self.expr, FilterExpr::MatchAll)
    }

    /// Evaluates the filter against a serialized search document.
    pub fn matches(&self, document: &serde_json::Value) -> bool {
        eval::evaluate(&self.expr, document, None)
    }
}

/// A lambda variable bound to the elements of a collection.
type Scope<'a> = Option<(&'a str, FieldKind)>;

fn validate(expr: &FilterExpr, scope: Scope<'_>) -> Result<(), FilterError> {
    match expr {
        FilterExpr::MatchAll => Ok(()),
        FilterExpr::Comparison { path, .. } => validate_path(path, scope),
        FilterExpr::Logical { left, right, .. } => {
            validate(left, scope)?;
            validate(right, scope)
        }
        FilterExpr::Not(inner) => validate(inner, scope),
        FilterExpr::Any {
            collection,
            variable,
            predicate,
        } => {
            let kind = resolve_collection(collection, scope)?;
            match (variable, predicate) {
                (Some(variable), Some(predicate)) => {
                    validate(predicate, Some((variable.as_str(), kind)))
                }
                _ => Ok(()),
            }
        }
        FilterExpr::All {
            collection,
            variable,
            predicate,
        } => {
            let kind = resolve_collection(collection, scope)?;
            validate(predicate, Some((variable.as_str(), kind)))
        }
    }
}

fn resolve_collection(collection: &str, scope: Scope<'_>) -> Result<FieldKind, FilterError> {
    if scope.is_some() {
        return Err(FilterError::Unsupported {
            message: format!("nested lambda over '{}'", collection),
        });
    }
    FieldKind::from_field_name(collection).ok_or_else(|| FilterError::UnknownField {
        path: collection.to_string(),
    })
}

fn validate_path(path: &[String], scope: Scope<'_>) -> Result<(), FilterError> {
    let unknown = || FilterError::UnknownField {
        path: path.join("/"),
    };

    match (path, scope) {
        ([field], _) => ScalarField::from_field_name(field)
            .map(|_| ())
            .ok_or_else(unknown),
        ([variable, field], Some((bound, kind))) if variable == bound => {
            match kind.element_field_type(field) {
                Some(FieldType::GeoPoint) => Err(FilterError::Unsupported {
                    message: format!("comparison on geo-point field '{}'", path.join("/")),
                }),
                Some(_) => Ok(()),
                None => Err(unknown()),
            }
        }
        _ => Err(unknown()),
    }
}

/// Resolves the collection and element field a lambda comparison addresses.
///
/// Returns `None` for scalar paths.
pub(crate) fn element_field<'a>(path: &'a [String], scope: Scope<'_>) -> Option<(FieldKind, &'a str)> {
    match (path, scope) {
        ([variable, field], Some((bound, kind))) if variable == bound => {
            Some((kind, field.as_str()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_filters() {
        for input in [
            "*",
            "id eq 'a'",
            "index eq 'order' and created ge 2024-01-01T00:00:00Z",
            "str/any(s: s/name eq 'city' and s/value eq 'X')",
            "rel/any(r: r/name eq 'customer' and r/id eq 'c-1')",
            "num32/all(n: n/value gt 3)",
            "geo/any()",
            "str/any(s: s/name eq 'city' and index eq 'order')",
        ] {
            assert!(Filter::parse(input).is_ok(), "{} should be valid", input);
        }
    }

    #[test]
    fn test_unknown_fields() {
        for input in [
            "city eq 'X'",
            "str eq 'X'",
            "colors/any(c: c/name eq 'a')",
            "str/any(s: s/label eq 'a')",
            "rel/any(r: r/value eq 'a')",
            "str/any(s: t/name eq 'a')",
        ] {
            assert!(
                matches!(Filter::parse(input), Err(FilterError::UnknownField { .. })),
                "{} should reference an unknown field",
                input
            );
        }
    }

    #[test]
    fn test_unsupported_constructs() {
        assert!(matches!(
            Filter::parse("geo/any(g: g/value eq 1)"),
            Err(FilterError::Unsupported { .. })
        ));
        assert!(matches!(
            Filter::parse("str/any(s: num32/any(n: n/value eq 1))"),
            Err(FilterError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_into_transport() {
        let err = Filter::parse("id eq").unwrap_err().into_transport("memory");
        assert!(matches!(err, TransportError::BadRequest { .. }));
    }
}
