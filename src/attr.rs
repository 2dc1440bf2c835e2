//! Attribute system for XML elements
//!
//! Attributes are kept as plain `(name, value)` pairs in document order.
//! Names are stored as written, including any namespace prefix.

/// Element attributes as simple key-value pairs
pub type Attrs = Vec<(String, String)>;

/// Extension trait for attribute operations on Attrs
pub trait AttrsExt {
    /// Get an attribute value by name
    fn get_attr(&self, name: &str) -> Option<&str>;

    /// Check if an attribute exists
    fn has_attr(&self, name: &str) -> bool;

    /// Set an attribute value (insert or update)
    fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>);

    /// Remove an attribute by name, returning the old value if present
    fn remove_attr(&mut self, name: &str) -> Option<String>;
}

impl AttrsExt for Attrs {
    fn get_attr(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k == name || local_name(k) == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(attr) = self.iter_mut().find(|(k, _)| k == &name) {
            attr.1 = value;
        } else {
            self.push((name, value));
        }
    }

    fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.iter()
            .position(|(k, _)| k == name)
            .map(|pos| self.remove(pos).1)
    }
}

/// Strip a namespace prefix: `ltx:para` → `para`.
///
/// `xmlns` declarations are returned unchanged so they never shadow a
/// regular attribute lookup.
pub fn local_name(qualified: &str) -> &str {
    if qualified.starts_with("xmlns") {
        return qualified;
    }
    match qualified.rsplit_once(':') {
        Some((_, local)) => local,
        None => qualified,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attrs_operations() {
        let mut attrs: Attrs = Vec::new();

        attrs.set_attr("name", "q1");
        attrs.set_attr("type", "single");
        assert_eq!(attrs.len(), 2);

        assert_eq!(attrs.get_attr("name"), Some("q1"));
        assert_eq!(attrs.get_attr("type"), Some("single"));
        assert_eq!(attrs.get_attr("options"), None);

        attrs.set_attr("type", "multiple");
        assert_eq!(attrs.get_attr("type"), Some("multiple"));
        assert_eq!(attrs.len(), 2);

        let removed = attrs.remove_attr("name");
        assert_eq!(removed.as_deref(), Some("q1"));
        assert!(!attrs.has_attr("name"));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_prefixed_lookup() {
        let attrs: Attrs = vec![
            ("xmlns:amc".to_string(), "urn:amc2moodle:quiz".to_string()),
            ("amc:name".to_string(), "geo".to_string()),
        ];
        assert_eq!(attrs.get_attr("name"), Some("geo"));
        assert_eq!(attrs.get_attr("amc"), None);
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("ltx:para"), "para");
        assert_eq!(local_name("question"), "question");
        assert_eq!(local_name("xmlns:ltx"), "xmlns:ltx");
    }
}
