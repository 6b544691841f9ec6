//! Page tokens and result pages returned by the search primitive.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;
use crate::schema::SearchDocument;

/// An opaque keyset position in a result set.
///
/// Tokens are base64-encoded JSON holding the sort key values of the last
/// document of the previous page. Results are always ordered by document
/// key, so resuming after those values neither skips nor repeats documents
/// that existed for the whole scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageToken {
    /// Token format version.
    version: u8,

    /// Sort values of the last returned document.
    after: Vec<Value>,
}

impl PageToken {
    /// Creates a token that resumes after the given sort values.
    pub fn after(values: Vec<Value>) -> Self {
        Self {
            version: 1,
            after: values,
        }
    }

    /// Creates a token that resumes after the given document key.
    pub fn after_id(id: &str) -> Self {
        Self::after(vec![Value::String(id.to_string())])
    }

    /// Returns the sort values to resume after.
    pub fn values(&self) -> &[Value] {
        &self.after
    }

    /// Returns the document key to resume after, if the token holds one.
    pub fn last_id(&self) -> Option<&str> {
        self.after.last().and_then(|v| v.as_str())
    }

    /// Encodes the token to an opaque string.
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(&json)
    }

    /// Decodes a token from an opaque string.
    pub fn decode(s: &str) -> Result<Self, TransportError> {
        let invalid = || TransportError::BadRequest {
            service: "page-token".to_string(),
            message: format!("invalid page token: {}", s),
        };

        let bytes = URL_SAFE_NO_PAD.decode(s).map_err(|_| invalid())?;
        serde_json::from_slice(&bytes).map_err(|_| invalid())
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    /// The documents on this page, in key order.
    pub documents: Vec<SearchDocument>,
    /// Token for the following page; `None` on the last page.
    pub next_token: Option<String>,
}

impl SearchPage {
    /// Creates a page.
    pub fn new(documents: Vec<SearchDocument>, next_token: Option<String>) -> Self {
        Self {
            documents,
            next_token,
        }
    }

    /// Creates the final, empty page.
    pub fn end() -> Self {
        Self::default()
    }

    /// Returns true if more pages follow.
    pub fn has_next(&self) -> bool {
        self.next_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let token = PageToken::after_id("entity-42");
        let decoded = PageToken::decode(&token.encode()).unwrap();
        assert_eq!(decoded, token);
        assert_eq!(decoded.last_id(), Some("entity-42"));
    }

    #[test]
    fn test_invalid_token() {
        let result = PageToken::decode("not a token!");
        assert!(matches!(result, Err(TransportError::BadRequest { .. })));
    }

    #[test]
    fn test_end_page() {
        let page = SearchPage::end();
        assert!(page.documents.is_empty());
        assert!(!page.has_next());
    }
}
