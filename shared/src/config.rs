//! Rendering of service configuration documents
//!
//! Prometheus and Thanos both read YAML. JSON is a subset of YAML, so
//! documents are rendered with `serde_json` and handed over verbatim.

use serde::Serialize;

use crate::errors::{SharedError, SharedResult};

/// Render a configuration value into the text document a service reads.
pub fn render_document<T: Serialize>(value: &T) -> SharedResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| SharedError::SerializationError {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_render_document_is_yaml_compatible_json() {
        let mut doc = BTreeMap::new();
        doc.insert("bucket", "bkt1");

        let rendered = render_document(&doc).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["bucket"], "bkt1");
    }
}
