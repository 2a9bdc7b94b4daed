//! Query-string state shared by every planning view.
//!
//! Parsing and encoding follow `URLSearchParams`: `+` decodes to a space,
//! keys may repeat, and [`QueryState::set`] replaces the first occurrence
//! and drops the rest. Parameters this crate does not know about survive a
//! decode/encode cycle in their original position.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryState {
    pairs: Vec<(String, String)>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient parse; accepts a leading `?` and skips empty segments.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = raw
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        QueryState { pairs }
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// `true` only for the literal string `"true"`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(index) => {
                self.pairs[index].1 = value;
                let mut seen = 0usize;
                self.pairs.retain(|(k, _)| {
                    if k != key {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn delete(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encoded form without the leading `?`.
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for QueryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for QueryState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(QueryState::parse(s))
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        // Invalid UTF-8 after decoding: keep the text as received
        Err(_) => spaced,
    }
}

fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw).replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_get() {
        let q = QueryState::parse("?planning=true&markers=a%2Cb&status=em+aberto&empty");
        assert_eq!(q.get("planning"), Some("true"));
        assert_eq!(q.get("markers"), Some("a,b"));
        assert_eq!(q.get("status"), Some("em aberto"));
        assert_eq!(q.get("empty"), Some(""));
        assert!(q.get("missing").is_none());
        assert!(q.flag("planning"));
        assert!(!q.flag("status"));
    }

    #[test]
    fn test_set_replaces_first_and_drops_duplicates() {
        let mut q = QueryState::parse("a=1&b=2&a=3");
        q.set("a", "x");
        assert_eq!(q.encode(), "a=x&b=2");
        q.set("c", "new");
        assert_eq!(q.encode(), "a=x&b=2&c=new");
    }

    #[test]
    fn test_delete_and_unknown_params_survive() {
        let mut q = QueryState::parse("utm_source=mail&markers=1&tab=2");
        q.delete("markers");
        assert_eq!(q.encode(), "utm_source=mail&tab=2");
        assert!(!q.has("markers"));
    }

    #[test]
    fn test_encode_escapes() {
        let mut q = QueryState::new();
        q.set("markers", "a,b");
        q.set("status", "não encontrado");
        let encoded = q.encode();
        assert_eq!(encoded, "markers=a%2Cb&status=n%C3%A3o+encontrado");
        assert_eq!(QueryState::parse(&encoded), q);
    }

    #[test]
    fn test_empty_query() {
        assert!(QueryState::parse("").is_empty());
        assert!(QueryState::parse("?").is_empty());
        assert_eq!(QueryState::new().encode(), "");
    }
}
