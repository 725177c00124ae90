//! Cache entry types.

use serde_json::Value;

/// Persisted state for one cache key.
///
/// `body` is always present when `validator` is: a validator is only stored
/// together with the body of the response that issued it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheEntry {
    /// Last server-issued validator (ETag value), verbatim
    pub validator: Option<String>,
    /// Last successfully decoded payload
    pub body: Option<Value>,
}

/// Conditional GET headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalHeaders {
    /// If-None-Match header value (ETag).
    pub if_none_match: Option<String>,
}

impl CacheEntry {
    /// Entry produced by a fresh 2xx response.
    pub fn fresh(body: Value, validator: Option<String>) -> Self {
        Self {
            validator: validator.filter(|v| !v.trim().is_empty()),
            body: Some(body),
        }
    }

    /// Headers to revalidate this entry with.
    ///
    /// Empty when no validator is stored, which turns the request into a plain GET.
    pub fn conditional_headers(&self) -> ConditionalHeaders {
        ConditionalHeaders {
            if_none_match: self.validator.clone(),
        }
    }
}

impl ConditionalHeaders {
    /// Header name/value pairs to attach to the request.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        self.if_none_match
            .iter()
            .map(|etag| ("if-none-match", etag.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.if_none_match.is_none()
    }
}
