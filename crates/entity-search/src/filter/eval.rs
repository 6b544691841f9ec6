//! In-process evaluation of filter expressions against serialized documents.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::parser::{CompareOp, FilterExpr, Literal, LogicalOp};
use super::{Scope, element_field};
use crate::schema::FieldKind;

/// A lambda variable bound to one collection element.
type Binding<'a> = Option<(&'a str, FieldKind, &'a Value)>;

pub(super) fn evaluate(expr: &FilterExpr, document: &Value, binding: Binding<'_>) -> bool {
    match expr {
        FilterExpr::MatchAll => true,
        FilterExpr::Comparison { path, op, value } => {
            let scope: Scope<'_> = binding.map(|(variable, kind, _)| (variable, kind));
            let actual = match (element_field(path, scope), binding) {
                (Some((_, field)), Some((_, _, element))) => element.get(field),
                _ => path.first().and_then(|field| document.get(field.as_str())),
            };
            compare(actual.unwrap_or(&Value::Null), *op, value)
        }
        FilterExpr::Logical { left, op, right } => match op {
            LogicalOp::And => {
                evaluate(left, document, binding) && evaluate(right, document, binding)
            }
            LogicalOp::Or => {
                evaluate(left, document, binding) || evaluate(right, document, binding)
            }
        },
        FilterExpr::Not(inner) => !evaluate(inner, document, binding),
        FilterExpr::Any {
            collection,
            variable,
            predicate,
        } => {
            let elements = elements(document, collection);
            match (variable, predicate, FieldKind::from_field_name(collection)) {
                (Some(variable), Some(predicate), Some(kind)) => elements
                    .iter()
                    .any(|e| evaluate(predicate, document, Some((variable.as_str(), kind, e)))),
                _ => !elements.is_empty(),
            }
        }
        FilterExpr::All {
            collection,
            variable,
            predicate,
        } => match FieldKind::from_field_name(collection) {
            Some(kind) => elements(document, collection)
                .iter()
                .all(|e| evaluate(predicate, document, Some((variable.as_str(), kind, e)))),
            None => false,
        },
    }
}

fn elements<'a>(document: &'a Value, collection: &str) -> &'a [Value] {
    document
        .get(collection)
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn compare(actual: &Value, op: CompareOp, literal: &Literal) -> bool {
    if let Literal::Null = literal {
        return match op {
            CompareOp::Eq => actual.is_null(),
            CompareOp::Ne => !actual.is_null(),
            _ => false,
        };
    }

    let ordering = order(actual, literal);
    match op {
        CompareOp::Eq => ordering == Some(Ordering::Equal),
        CompareOp::Ne => ordering != Some(Ordering::Equal),
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        CompareOp::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::Lt => ordering == Some(Ordering::Less),
        CompareOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
    }
}

/// Orders a stored value against a literal; `None` when the types are incomparable.
fn order(actual: &Value, literal: &Literal) -> Option<Ordering> {
    match literal {
        Literal::String(expected) => actual.as_str().map(|a| a.cmp(expected.as_str())),
        Literal::Integer(expected) => match actual.as_i64() {
            Some(a) => Some(a.cmp(expected)),
            None => actual.as_f64()?.partial_cmp(&(*expected as f64)),
        },
        Literal::Double(expected) => actual.as_f64()?.partial_cmp(expected),
        Literal::Boolean(expected) => actual.as_bool().map(|a| a.cmp(expected)),
        Literal::DateTime(expected) => actual
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|a| a.with_timezone(&Utc).cmp(expected)),
        Literal::Null => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::filter::Filter;

    fn document() -> serde_json::Value {
        json!({
            "id": "a",
            "index": "order",
            "created": "2024-03-01T10:00:00Z",
            "hh": null,
            "str": [
                { "name": "city", "value": "X" },
                { "name": "status", "value": "open" }
            ],
            "num32": [
                { "name": "rows", "value": 12 },
                { "name": "cols", "value": 4 }
            ],
            "dbl": [ { "name": "area", "value": 2.5 } ],
            "bl": [ { "name": "paid", "value": true } ],
            "rel": [ { "name": "customer", "id": "c-1" } ],
            "geo": []
        })
    }

    fn matches(filter: &str) -> bool {
        Filter::parse(filter).unwrap().matches(&document())
    }

    #[test]
    fn test_scalar_comparisons() {
        assert!(matches("*"));
        assert!(matches("id eq 'a'"));
        assert!(!matches("id eq 'b'"));
        assert!(matches("id ne 'b'"));
        assert!(matches("index eq 'order' and id eq 'a'"));
        assert!(matches("index eq 'invoice' or id eq 'a'"));
        assert!(matches("not index eq 'invoice'"));
    }

    #[test]
    fn test_null_comparisons() {
        assert!(matches("hh eq null"));
        assert!(matches("hm eq null"));
        assert!(!matches("index eq null"));
        assert!(matches("index ne null"));
    }

    #[test]
    fn test_datetime_comparisons() {
        assert!(matches("created ge 2024-01-01T00:00:00Z"));
        assert!(matches("created lt 2024-03-01T10:00:01Z"));
        assert!(!matches("created gt 2024-03-01T10:00:00Z"));
    }

    #[test]
    fn test_any_requires_same_element() {
        assert!(matches("str/any(s: s/name eq 'city' and s/value eq 'X')"));
        assert!(!matches("str/any(s: s/name eq 'city' and s/value eq 'open')"));
        assert!(matches("rel/any(r: r/name eq 'customer' and r/id eq 'c-1')"));
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(matches("num32/any(n: n/name eq 'rows' and n/value gt 10)"));
        assert!(!matches("num32/any(n: n/name eq 'cols' and n/value gt 10)"));
        assert!(matches("dbl/any(d: d/value ge 2.5)"));
        assert!(matches("dbl/any(d: d/value lt 3)"));
        assert!(matches("bl/any(b: b/value eq true)"));
    }

    #[test]
    fn test_empty_any_and_all() {
        assert!(matches("str/any()"));
        assert!(!matches("geo/any()"));
        assert!(!matches("enm/any()"));
        assert!(matches("num32/all(n: n/value gt 3)"));
        assert!(!matches("num32/all(n: n/value gt 5)"));
        assert!(matches("geo/all(g: g/name eq 'x')"));
    }

    #[test]
    fn test_type_mismatch_is_not_equal() {
        assert!(!matches("num32/any(n: n/value eq 'rows')"));
        assert!(matches("num32/all(n: n/value ne 'rows')"));
    }

    #[test]
    fn test_scalar_inside_lambda() {
        assert!(matches("str/any(s: s/name eq 'city' and index eq 'order')"));
        assert!(!matches("str/any(s: s/name eq 'city' and index eq 'invoice')"));
    }
}
