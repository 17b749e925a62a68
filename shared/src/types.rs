//! Core shared types: label sets and declared ports

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{SharedError, SharedResult};

/// Ordered set of external labels, e.g. `{cluster="eu-1", replica="0"}`.
///
/// Ordering is by label name so rendered configs and tool flags are stable
/// across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(BTreeMap<String, String>);

impl Labels {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a label set from name/value pairs, validating every name.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> SharedResult<Self> {
        let mut labels = Self::new();
        for (name, value) in pairs {
            labels.insert(name, value)?;
        }
        Ok(labels)
    }

    /// Insert a label. Names follow the Prometheus rule `[a-zA-Z_][a-zA-Z0-9_]*`.
    pub fn insert(&mut self, name: &str, value: &str) -> SharedResult<()> {
        if !is_valid_label_name(name) {
            return Err(SharedError::InvalidLabel {
                input: name.to_string(),
            });
        }
        self.0.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Render each label as a `name="value"` matcher, the form CLI tools expect.
    pub fn to_matchers(&self) -> Vec<String> {
        self.iter()
            .map(|(name, value)| format!("{name}=\"{value}\""))
            .collect()
    }
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.to_matchers().join(", "))
    }
}

/// Wire protocol spoken on a declared port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    Http,
    Grpc,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Grpc => write!(f, "grpc"),
        }
    }
}

/// A port a service declares. The name is what other services refer to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortSpec {
    pub name: String,
    pub number: u16,
    pub protocol: Protocol,
}

impl PortSpec {
    pub fn new<S: Into<String>>(name: S, number: u16, protocol: Protocol) -> Self {
        Self {
            name: name.into(),
            number,
            protocol,
        }
    }

    /// Port named `http`
    pub fn http(number: u16) -> Self {
        Self::new("http", number, Protocol::Http)
    }

    /// Port named `grpc`
    pub fn grpc(number: u16) -> Self {
        Self::new("grpc", number, Protocol::Grpc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_display_is_sorted() {
        let labels = Labels::from_pairs(&[("replica", "1"), ("cluster", "eu-1")]).unwrap();
        assert_eq!(labels.to_string(), "{cluster=\"eu-1\", replica=\"1\"}");
        assert_eq!(labels.to_matchers(), vec!["cluster=\"eu-1\"", "replica=\"1\""]);
    }

    #[test]
    fn test_labels_reject_invalid_names() {
        assert!(Labels::from_pairs(&[("1cluster", "x")]).is_err());
        assert!(Labels::from_pairs(&[("clu-ster", "x")]).is_err());
        assert!(Labels::from_pairs(&[("", "x")]).is_err());
        assert!(Labels::from_pairs(&[("_cluster", "x")]).is_ok());
    }

    #[test]
    fn test_labels_serialize_as_map() {
        let labels = Labels::from_pairs(&[("cluster", "us-1"), ("replica", "0")]).unwrap();
        let value = serde_json::to_value(&labels).unwrap();
        assert_eq!(value["cluster"], "us-1");
        assert_eq!(value["replica"], "0");
    }

    #[test]
    fn test_port_spec_helpers() {
        let http = PortSpec::http(8080);
        assert_eq!(http.name, "http");
        assert_eq!(http.protocol, Protocol::Http);
        assert_eq!(PortSpec::grpc(9091).protocol.to_string(), "grpc");
    }
}
