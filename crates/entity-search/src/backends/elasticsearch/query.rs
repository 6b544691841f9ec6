//! Translation of filter expressions into Elasticsearch Query DSL.

use serde_json::{Value, json};

use crate::filter::{CompareOp, Filter, FilterError, FilterExpr, Literal, LogicalOp};
use crate::types::PageToken;

/// The field results are sorted on; doubles as the keyset for pagination.
const SORT_FIELD: &str = "id";

/// Builds a search body for one page of results.
///
/// Requests one document more than `page_size` so the caller can tell
/// whether another page follows.
pub fn build_search_body(filter: &Filter, page_size: usize, token: Option<&PageToken>) -> Result<Value, FilterError> {
    let mut body = json!({
        "query": build_query(filter.expr())?,
        "sort": [ { SORT_FIELD: "asc" } ],
        "size": page_size + 1,
        "track_total_hits": false,
    });

    if let Some(token) = token {
        body["search_after"] = json!(token.values());
    }

    Ok(body)
}

/// Translates a filter expression into a query clause.
pub fn build_query(expr: &FilterExpr) -> Result<Value, FilterError> {
    translate(expr, None)
}

/// A lambda in scope: its variable and the nested path it ranges over.
type Lambda<'a> = Option<(&'a str, &'a str)>;

fn translate(expr: &FilterExpr, lambda: Lambda<'_>) -> Result<Value, FilterError> {
    match expr {
        FilterExpr::MatchAll => Ok(json!({ "match_all": {} })),
        FilterExpr::Comparison { path, op, value } => {
            let field = field_path(path, lambda)?;
            Ok(comparison(&field, *op, value))
        }
        FilterExpr::Logical { left, op, right } => {
            let left = translate(left, lambda)?;
            let right = translate(right, lambda)?;
            Ok(match op {
                LogicalOp::And => json!({ "bool": { "must": [left, right] } }),
                LogicalOp::Or => json!({
                    "bool": { "should": [left, right], "minimum_should_match": 1 }
                }),
            })
        }
        FilterExpr::Not(inner) => Ok(must_not(translate(inner, lambda)?)),
        FilterExpr::Any {
            collection,
            variable,
            predicate,
        } => {
            let query = match (variable, predicate) {
                (Some(variable), Some(predicate)) => {
                    translate(predicate, Some((variable.as_str(), collection.as_str())))?
                }
                _ => json!({ "match_all": {} }),
            };
            Ok(nested(collection, query))
        }
        FilterExpr::All {
            collection,
            variable,
            predicate,
        } => {
            // all(p) holds when no element fails p
            let inner = translate(predicate, Some((variable.as_str(), collection.as_str())))?;
            Ok(must_not(nested(collection, must_not(inner))))
        }
    }
}

fn field_path(path: &[String], lambda: Lambda<'_>) -> Result<String, FilterError> {
    match (path, lambda) {
        ([variable, field], Some((bound, collection))) if variable == bound => {
            Ok(format!("{}.{}", collection, field))
        }
        ([field], None) => Ok(field.clone()),
        ([field], Some(_)) => Err(FilterError::Unsupported {
            message: format!("scalar field '{}' inside a lambda", field),
        }),
        _ => Err(FilterError::UnknownField {
            path: path.join("/"),
        }),
    }
}

fn comparison(field: &str, op: CompareOp, literal: &Literal) -> Value {
    if let Literal::Null = literal {
        let exists = json!({ "exists": { "field": field } });
        return match op {
            CompareOp::Ne => exists,
            _ => must_not(exists),
        };
    }

    let value = literal_value(literal);
    match op {
        CompareOp::Eq => json!({ "term": { field: value } }),
        CompareOp::Ne => must_not(json!({ "term": { field: value } })),
        CompareOp::Gt => json!({ "range": { field: { "gt": value } } }),
        CompareOp::Ge => json!({ "range": { field: { "gte": value } } }),
        CompareOp::Lt => json!({ "range": { field: { "lt": value } } }),
        CompareOp::Le => json!({ "range": { field: { "lte": value } } }),
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::String(s) => json!(s),
        Literal::Integer(i) => json!(i),
        Literal::Double(d) => json!(d),
        Literal::Boolean(b) => json!(b),
        Literal::DateTime(dt) => json!(dt.to_rfc3339()),
        Literal::Null => Value::Null,
    }
}

fn nested(path: &str, query: Value) -> Value {
    json!({ "nested": { "path": path, "query": query } })
}

fn must_not(query: Value) -> Value {
    json!({ "bool": { "must_not": [query] } })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(input: &str) -> Value {
        build_query(Filter::parse(input).unwrap().expr()).unwrap()
    }

    #[test]
    fn test_match_all() {
        assert_eq!(query("*"), json!({ "match_all": {} }));
    }

    #[test]
    fn test_scalar_term() {
        assert_eq!(query("id eq 'a'"), json!({ "term": { "id": "a" } }));
        assert_eq!(
            query("created ge 2024-01-01T00:00:00Z"),
            json!({ "range": { "created": { "gte": "2024-01-01T00:00:00+00:00" } } })
        );
    }

    #[test]
    fn test_null_comparison() {
        assert_eq!(
            query("hh eq null"),
            json!({ "bool": { "must_not": [ { "exists": { "field": "hh" } } ] } })
        );
        assert_eq!(query("hh ne null"), json!({ "exists": { "field": "hh" } }));
    }

    #[test]
    fn test_any_is_nested() {
        assert_eq!(
            query("str/any(s: s/name eq 'city' and s/value eq 'X')"),
            json!({
                "nested": {
                    "path": "str",
                    "query": {
                        "bool": {
                            "must": [
                                { "term": { "str.name": "city" } },
                                { "term": { "str.value": "X" } }
                            ]
                        }
                    }
                }
            })
        );
        assert_eq!(
            query("rel/any(r: r/id eq 'c-1')"),
            json!({ "nested": { "path": "rel", "query": { "term": { "rel.id": "c-1" } } } })
        );
    }

    #[test]
    fn test_empty_any() {
        assert_eq!(
            query("geo/any()"),
            json!({ "nested": { "path": "geo", "query": { "match_all": {} } } })
        );
    }

    #[test]
    fn test_all_is_double_negation() {
        let q = query("num32/all(n: n/value gt 3)");
        let nested = &q["bool"]["must_not"][0]["nested"];
        assert_eq!(nested["path"], "num32");
        assert_eq!(
            nested["query"]["bool"]["must_not"][0],
            json!({ "range": { "num32.value": { "gt": 3 } } })
        );
    }

    #[test]
    fn test_or_and_not() {
        let q = query("not (id eq 'a' or id eq 'b')");
        let inner = &q["bool"]["must_not"][0]["bool"];
        assert_eq!(inner["minimum_should_match"], 1);
        assert_eq!(inner["should"].as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_scalar_in_lambda_unsupported() {
        let filter = Filter::parse("str/any(s: s/name eq 'city' and index eq 'order')").unwrap();
        assert!(matches!(
            build_query(filter.expr()),
            Err(FilterError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_search_body() {
        let filter = Filter::parse("*").unwrap();
        let token = PageToken::after_id("m");
        let body = build_search_body(&filter, 10, Some(&token)).unwrap();
        assert_eq!(body["size"], 11);
        assert_eq!(body["sort"], json!([ { "id": "asc" } ]));
        assert_eq!(body["search_after"], json!(["m"]));
    }
}
