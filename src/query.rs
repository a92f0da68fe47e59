use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::fmt::Display;

use crate::endpoint::Endpoint;
use crate::error::QueryError;

/// Characters escaped inside a query value. `@`, `,`, `:` and `/` are legal in a query
/// component and stay readable (`email=me@example.com`, `param=88101,44201`).
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'`');

/// A list element additionally escapes the comma so it can't split the list.
const LIST_ITEM: &AsciiSet = &QUERY_VALUE.add(b',');

pub(crate) fn encode_value(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

/// Ordered query parameters for a single endpoint call, excluding authentication.
#[derive(Debug, Clone)]
pub(crate) struct Query {
    endpoint: Endpoint,
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            pairs: Vec::new(),
        }
    }

    pub(crate) fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub(crate) fn param(mut self, name: &'static str, value: impl Display) -> Self {
        let value = value.to_string();
        self.pairs.push((name, encode_value(&value)));
        self
    }

    /// Adds a list-valued parameter as one comma-joined value. Order is kept as given and
    /// duplicates are not removed. An empty list is rejected.
    pub(crate) fn list<T: Display>(
        mut self,
        name: &'static str,
        values: &[T],
    ) -> Result<Self, QueryError> {
        if values.is_empty() {
            return Err(QueryError::MalformedQuery {
                endpoint: self.endpoint,
                reason: format!("`{}` needs at least one value", name),
            });
        }

        let joined = values
            .iter()
            .map(|v| utf8_percent_encode(&v.to_string(), LIST_ITEM).to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.pairs.push((name, joined));
        Ok(self)
    }

    /// The encoded `name=value&...` fragment, without authentication.
    pub(crate) fn fragment(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Full request URL: `base + path + "?" + auth [+ "&" + fragment]`.
    pub(crate) fn url(&self, base: &str, auth: &str) -> String {
        let mut out = format!(
            "{}{}?{}",
            base.trim_end_matches('/'),
            self.endpoint.path(),
            auth
        );
        if !self.pairs.is_empty() {
            out.push('&');
            out.push_str(&self.fragment());
        }
        out
    }
}
