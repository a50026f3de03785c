//! Search parameters and their canonical query-string encoding.
//!
//! Serialization is driven by [`FIELDS`], a fixed table of
//! (field, accessor, wire name, escaping rule). Table order decides pair order,
//! so identical parameters always produce byte-identical URLs.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Default `posts_full` endpoint. The builder appends `?` and the pairs.
pub const DEFAULT_ENDPOINT: &str = "https://twitter.trawlingweb.com/posts_full/";

/// Caller-supplied filters for one search. Empty fields are omitted from the URL.
///
/// Only `query` is percent-encoded. Every other value is inserted verbatim, so
/// callers must pass URL-safe values for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParameters {
    /// API token, sent as the `token` query parameter.
    pub token: String,
    /// Free-text search expression, sent as `q`.
    pub query: String,
    /// Lower bound on publication time (epoch milliseconds).
    pub ts: String,
    /// Lower bound on ingestion time (epoch milliseconds).
    pub tsi: String,
    pub sort: String,
    pub order: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaping {
    /// Percent-encode everything outside the unreserved set.
    Percent,
    Verbatim,
}

/// One row of the serialization table.
pub struct Field {
    pub name: &'static str,
    pub wire: &'static str,
    pub escaping: Escaping,
    pub get: fn(&SearchParameters) -> &str,
}

pub const FIELDS: &[Field] = &[
    Field {
        name: "token",
        wire: "token",
        escaping: Escaping::Verbatim,
        get: |p| p.token.as_str(),
    },
    Field {
        name: "query",
        wire: "q",
        escaping: Escaping::Percent,
        get: |p| p.query.as_str(),
    },
    Field {
        name: "ts",
        wire: "ts",
        escaping: Escaping::Verbatim,
        get: |p| p.ts.as_str(),
    },
    Field {
        name: "tsi",
        wire: "tsi",
        escaping: Escaping::Verbatim,
        get: |p| p.tsi.as_str(),
    },
    Field {
        name: "sort",
        wire: "sort",
        escaping: Escaping::Verbatim,
        get: |p| p.sort.as_str(),
    },
    Field {
        name: "order",
        wire: "order",
        escaping: Escaping::Verbatim,
        get: |p| p.order.as_str(),
    },
];

impl SearchParameters {
    /// Start a search for `query` with every other field empty.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_ts(mut self, ts: impl Into<String>) -> Self {
        self.ts = ts.into();
        self
    }

    pub fn with_tsi(mut self, tsi: impl Into<String>) -> Self {
        self.tsi = tsi.into();
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }

    /// Populated `(wire name, encoded value)` pairs in table order.
    pub fn pairs(&self) -> Vec<(&'static str, Cow<'_, str>)> {
        FIELDS
            .iter()
            .filter_map(|f| {
                let raw = (f.get)(self);
                if raw.is_empty() {
                    return None;
                }
                let value = match f.escaping {
                    Escaping::Percent => urlencoding::encode(raw),
                    Escaping::Verbatim => Cow::Borrowed(raw),
                };
                Some((f.wire, value))
            })
            .collect()
    }

    /// Query string without the leading `?`.
    ///
    /// ```
    /// use trawl_search::SearchParameters;
    ///
    /// let p = SearchParameters::new("climate change")
    ///     .with_sort("date")
    ///     .with_order("desc");
    /// assert_eq!(p.query_string(), "q=climate%20change&sort=date&order=desc");
    /// ```
    pub fn query_string(&self) -> String {
        let mut out = String::new();
        for (wire, value) in self.pairs() {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(wire);
            out.push('=');
            out.push_str(&value);
        }
        out
    }

    /// Full request URL against `endpoint`.
    pub fn to_url(&self, endpoint: &str) -> String {
        format!("{}?{}", endpoint, self.query_string())
    }
}
