//! Filter expression parser.
//!
//! # Grammar
//!
//! ```text
//! filter     = "*" / orExpr
//! orExpr     = andExpr *("or" andExpr)
//! andExpr    = notExpr *("and" notExpr)
//! notExpr    = "not" notExpr / primary
//! primary    = "(" orExpr ")" / lambda / comparison
//! lambda     = field "/any(" [var ":" orExpr] ")" / field "/all(" var ":" orExpr ")"
//! comparison = path SP compareOp SP literal
//! path       = segment *("/" segment)
//! compareOp  = "eq" / "ne" / "gt" / "ge" / "lt" / "le"
//! literal    = "'" *char "'" / number / datetime / "true" / "false" / "null"
//! ```
//!
//! Inside a quoted literal a doubled quote (`''`) stands for one quote.
//!
//! # Example
//!
//! ```text
//! str/any(s: s/name eq 'city' and s/value eq 'X')
//! index eq 'order' and not (num32/any(n: n/name eq 'rows' and n/value gt 10))
//! created ge 2024-01-01T00:00:00Z
//! ```

use chrono::{DateTime, Utc};

use super::FilterError;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal
    Eq,
    /// Not equal
    Ne,
    /// Greater than
    Gt,
    /// Greater than or equal
    Ge,
    /// Less than
    Lt,
    /// Less than or equal
    Le,
}

impl CompareOp {
    /// Parses a comparison operator.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "eq" => Some(CompareOp::Eq),
            "ne" => Some(CompareOp::Ne),
            "gt" => Some(CompareOp::Gt),
            "ge" => Some(CompareOp::Ge),
            "lt" => Some(CompareOp::Lt),
            "le" => Some(CompareOp::Le),
            _ => None,
        }
    }
}

/// Logical operators for combining filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Null,
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Matches every document.
    MatchAll,
    /// `path op literal`
    Comparison {
        path: Vec<String>,
        op: CompareOp,
        value: Literal,
    },
    /// Logical combination of expressions.
    Logical {
        left: Box<FilterExpr>,
        op: LogicalOp,
        right: Box<FilterExpr>,
    },
    /// Negation of an expression.
    Not(Box<FilterExpr>),
    /// True if some element of the collection satisfies the predicate, or if
    /// the collection is non-empty when there is no predicate.
    Any {
        collection: String,
        variable: Option<String>,
        predicate: Option<Box<FilterExpr>>,
    },
    /// True if every element of the collection satisfies the predicate.
    All {
        collection: String,
        variable: String,
        predicate: Box<FilterExpr>,
    },
}

/// Deepest expression tree the parser accepts. Parentheses, `not`, lambdas
/// and every chained `and`/`or` each add one level.
pub const MAX_DEPTH: usize = 100;

/// Parser for filter expressions.
pub struct FilterParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> FilterParser<'a> {
    /// Creates a new filter parser.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    /// Parses the entire filter expression.
    pub fn parse(input: &str) -> Result<FilterExpr, FilterError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(FilterExpr::MatchAll);
        }

        let mut parser = FilterParser::new(input);
        let expr = parser.parse_or_expr()?;
        parser.skip_whitespace();
        if parser.pos < parser.input.len() {
            return Err(parser.error(format!(
                "unexpected characters after expression: '{}'",
                &parser.input[parser.pos..]
            )));
        }
        Ok(expr)
    }

    fn error(&self, message: impl Into<String>) -> FilterError {
        FilterError::Syntax {
            message: message.into(),
            position: self.pos,
        }
    }

    /// Enters one level of the expression tree.
    fn descend(&mut self) -> Result<(), FilterError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error(format!(
                "expression nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), FilterError> {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.consume();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", expected)))
        }
    }

    /// Checks if the input at the current position starts with a keyword
    /// (case-insensitive) followed by a word boundary.
    fn at_keyword(&self, keyword: &str) -> bool {
        let rest = &self.input[self.pos..];
        if rest.len() < keyword.len() || !rest.is_char_boundary(keyword.len()) {
            return false;
        }
        if !rest[..keyword.len()].eq_ignore_ascii_case(keyword) {
            return false;
        }
        match rest[keyword.len()..].chars().next() {
            Some(c) => !c.is_alphanumeric() && c != '_' && c != '/',
            None => true,
        }
    }

    fn parse_or_expr(&mut self) -> Result<FilterExpr, FilterError> {
        let mut left = self.parse_and_expr()?;
        let mut chained = 0;

        loop {
            self.skip_whitespace();
            if self.at_keyword("or") {
                self.pos += 2;
                self.descend()?;
                chained += 1;
                let right = self.parse_and_expr()?;
                left = FilterExpr::Logical {
                    left: Box::new(left),
                    op: LogicalOp::Or,
                    right: Box::new(right),
                };
            } else {
                break;
            }
        }

        self.depth -= chained;
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<FilterExpr, FilterError> {
        let mut left = self.parse_not_expr()?;
        let mut chained = 0;

        loop {
            self.skip_whitespace();
            if self.at_keyword("and") {
                self.pos += 3;
                self.descend()?;
                chained += 1;
                let right = self.parse_not_expr()?;
                left = FilterExpr::Logical {
                    left: Box::new(left),
                    op: LogicalOp::And,
                    right: Box::new(right),
                };
            } else {
                break;
            }
        }

        self.depth -= chained;
        Ok(left)
    }

    fn parse_not_expr(&mut self) -> Result<FilterExpr, FilterError> {
        self.skip_whitespace();
        self.descend()?;
        let expr = if self.at_keyword("not") {
            self.pos += 3;
            FilterExpr::Not(Box::new(self.parse_not_expr()?))
        } else {
            self.parse_primary()?
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<FilterExpr, FilterError> {
        self.skip_whitespace();

        if self.peek() == Some('(') {
            self.consume();
            let expr = self.parse_or_expr()?;
            self.expect(')')?;
            return Ok(expr);
        }

        let path = self.parse_path()?;

        if self.peek() == Some('(') {
            return self.parse_lambda(path);
        }

        self.skip_whitespace();
        let op = self.parse_operator()?;
        self.skip_whitespace();
        let value = self.parse_literal()?;

        Ok(FilterExpr::Comparison { path, op, value })
    }

    /// Parses `segment *("/" segment)`.
    fn parse_path(&mut self) -> Result<Vec<String>, FilterError> {
        let mut segments = vec![self.parse_identifier()?];
        while self.peek() == Some('/') {
            self.consume();
            segments.push(self.parse_identifier()?);
        }
        Ok(segments)
    }

    fn parse_identifier(&mut self) -> Result<String, FilterError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.consume();
            } else {
                break;
            }
        }
        if start == self.pos {
            return Err(self.error("expected field name"));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// Parses the parenthesised part of `collection/any(...)` or `collection/all(...)`.
    fn parse_lambda(&mut self, mut path: Vec<String>) -> Result<FilterExpr, FilterError> {
        let function = path.pop().unwrap_or_default();
        if path.len() != 1 {
            return Err(self.error(format!(
                "lambda must be applied to a top-level collection, found '{}'",
                path.join("/")
            )));
        }
        let collection = path.remove(0);
        let is_any = function.eq_ignore_ascii_case("any");
        if !is_any && !function.eq_ignore_ascii_case("all") {
            return Err(self.error(format!("unknown function '{}'", function)));
        }

        self.consume(); // '('
        self.skip_whitespace();

        if self.peek() == Some(')') {
            self.consume();
            if !is_any {
                return Err(self.error("all() requires a predicate"));
            }
            return Ok(FilterExpr::Any {
                collection,
                variable: None,
                predicate: None,
            });
        }

        let variable = self.parse_identifier()?;
        self.expect(':')?;
        let predicate = Box::new(self.parse_or_expr()?);
        self.expect(')')?;

        if is_any {
            Ok(FilterExpr::Any {
                collection,
                variable: Some(variable),
                predicate: Some(predicate),
            })
        } else {
            Ok(FilterExpr::All {
                collection,
                variable,
                predicate,
            })
        }
    }

    fn parse_operator(&mut self) -> Result<CompareOp, FilterError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphabetic() {
                self.consume();
            } else {
                break;
            }
        }
        let op_str = &self.input[start..self.pos];

        CompareOp::parse(op_str).ok_or_else(|| FilterError::Syntax {
            message: format!("unknown operator: '{}'", op_str),
            position: start,
        })
    }

    fn parse_literal(&mut self) -> Result<Literal, FilterError> {
        if self.peek() == Some('\'') {
            return self.parse_quoted_string().map(Literal::String);
        }
        for (keyword, literal) in [
            ("true", Literal::Boolean(true)),
            ("false", Literal::Boolean(false)),
            ("null", Literal::Null),
        ] {
            if self.at_keyword(keyword) {
                self.pos += keyword.len();
                return Ok(literal);
            }
        }
        self.parse_unquoted_literal()
    }

    /// Parses a single-quoted string; `''` is an escaped quote.
    fn parse_quoted_string(&mut self) -> Result<String, FilterError> {
        self.consume(); // opening quote
        let mut value = String::new();

        loop {
            match self.consume() {
                Some('\'') => {
                    if self.peek() == Some('\'') {
                        self.consume();
                        value.push('\'');
                    } else {
                        break;
                    }
                }
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated string")),
            }
        }

        Ok(value)
    }

    /// Parses a number or an ISO-8601 datetime.
    fn parse_unquoted_literal(&mut self) -> Result<Literal, FilterError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ')' || c == '(' {
                break;
            }
            self.consume();
        }

        let token = &self.input[start..self.pos];
        if token.is_empty() {
            return Err(self.error("expected value"));
        }
        if let Ok(n) = token.parse::<i64>() {
            return Ok(Literal::Integer(n));
        }
        if let Ok(d) = token.parse::<f64>() {
            if d.is_finite() {
                return Ok(Literal::Double(d));
            }
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
            return Ok(Literal::DateTime(dt.with_timezone(&Utc)));
        }

        Err(FilterError::Syntax {
            message: format!("invalid literal: '{}'", token),
            position: start,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn path(p: &str) -> Vec<String> {
        p.split('/').map(String::from).collect()
    }

    #[test]
    fn test_parse_match_all() {
        assert_eq!(FilterParser::parse("*").unwrap(), FilterExpr::MatchAll);
        assert_eq!(FilterParser::parse("  ").unwrap(), FilterExpr::MatchAll);
    }

    #[test]
    fn test_parse_simple_eq() {
        let expr = FilterParser::parse("id eq 'a'").unwrap();
        assert_eq!(
            expr,
            FilterExpr::Comparison {
                path: path("id"),
                op: CompareOp::Eq,
                value: Literal::String("a".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_escaped_quote() {
        let expr = FilterParser::parse("hh eq 'O''Brien'").unwrap();
        match expr {
            FilterExpr::Comparison { value, .. } => {
                assert_eq!(value, Literal::String("O'Brien".to_string()));
            }
            _ => panic!("Expected Comparison"),
        }
    }

    #[test]
    fn test_parse_any_lambda() {
        let expr =
            FilterParser::parse("str/any(s: s/name eq 'city' and s/value eq 'X')").unwrap();
        match expr {
            FilterExpr::Any {
                collection,
                variable,
                predicate,
            } => {
                assert_eq!(collection, "str");
                assert_eq!(variable.as_deref(), Some("s"));
                match predicate.as_deref() {
                    Some(FilterExpr::Logical { left, op, .. }) => {
                        assert_eq!(*op, LogicalOp::And);
                        match left.as_ref() {
                            FilterExpr::Comparison { path: p, .. } => {
                                assert_eq!(p, &path("s/name"))
                            }
                            _ => panic!("Expected Comparison on left"),
                        }
                    }
                    _ => panic!("Expected Logical predicate"),
                }
            }
            _ => panic!("Expected Any"),
        }
    }

    #[test]
    fn test_parse_empty_any_and_all() {
        assert_eq!(
            FilterParser::parse("rel/any()").unwrap(),
            FilterExpr::Any {
                collection: "rel".to_string(),
                variable: None,
                predicate: None,
            }
        );
        assert!(matches!(
            FilterParser::parse("num32/all(n: n/value gt 3)").unwrap(),
            FilterExpr::All { .. }
        ));
        assert!(FilterParser::parse("num32/all()").is_err());
    }

    #[test]
    fn test_parse_precedence() {
        let expr = FilterParser::parse("index eq 'a' or index eq 'b' and hh eq 'c'").unwrap();
        match expr {
            FilterExpr::Logical { op, right, .. } => {
                assert_eq!(op, LogicalOp::Or);
                assert!(matches!(
                    right.as_ref(),
                    FilterExpr::Logical {
                        op: LogicalOp::And,
                        ..
                    }
                ));
            }
            _ => panic!("Expected Logical"),
        }
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |levels: usize| {
            format!("{}id eq 'a'{}", "(".repeat(levels), ")".repeat(levels))
        };
        assert!(FilterParser::parse(&nested(MAX_DEPTH - 1)).is_ok());

        for input in [
            nested(200_000),
            format!("{}id eq 'a'", "not ".repeat(200_000)),
            vec!["id eq 'a'"; 200_000].join(" or "),
            vec!["id eq 'a'"; 200_000].join(" and "),
        ] {
            match FilterParser::parse(&input) {
                Err(FilterError::Syntax { message, .. }) => assert!(message.contains("nested")),
                other => panic!("Expected nesting error, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_depth_resets_between_siblings() {
        let group = format!("{}id eq 'a'{}", "(".repeat(50), ")".repeat(50));
        let input = format!("{} and {} and {}", group, group, group);
        assert!(FilterParser::parse(&input).is_ok());
    }

    #[test]
    fn test_parse_not_and_parentheses() {
        let expr = FilterParser::parse("not (index eq 'a' or index eq 'b')").unwrap();
        match expr {
            FilterExpr::Not(inner) => assert!(matches!(
                inner.as_ref(),
                FilterExpr::Logical {
                    op: LogicalOp::Or,
                    ..
                }
            )),
            _ => panic!("Expected Not"),
        }
    }

    #[test]
    fn test_parse_literals() {
        let cases = [
            ("n/value eq 42", Literal::Integer(42)),
            ("n/value eq -7", Literal::Integer(-7)),
            ("n/value eq 2.5", Literal::Double(2.5)),
            ("n/value eq true", Literal::Boolean(true)),
            ("n/value eq null", Literal::Null),
            (
                "n/value ge 2024-01-01T00:00:00Z",
                Literal::DateTime(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ),
        ];
        for (input, expected) in cases {
            match FilterParser::parse(input).unwrap() {
                FilterExpr::Comparison { value, .. } => assert_eq!(value, expected, "{}", input),
                other => panic!("Expected Comparison for {}, got {:?}", input, other),
            }
        }
    }

    #[test]
    fn test_keyword_prefix_is_not_operator() {
        // "notes" and "order" start with keywords but are field names
        let expr = FilterParser::parse("notes eq 'x' or orders eq 'y'").unwrap();
        assert!(matches!(
            expr,
            FilterExpr::Logical {
                op: LogicalOp::Or,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_errors() {
        for input in [
            "id eq",
            "id xx 'a'",
            "id eq 'open",
            "(id eq 'a'",
            "id eq 'a' garbage",
            "str/some(s: s/name eq 'a')",
            "id eq abc",
        ] {
            assert!(FilterParser::parse(input).is_err(), "{} should fail", input);
        }
    }
}
