//! MIME header handling.

/// Ordered collection of header fields.
///
/// Field names keep the spelling they were first stored with, so `cc` is
/// written as `cc` and `Cc` as `Cc`. Lookups compare names ASCII
/// case-insensitively, which keeps a field from being stored twice under
/// different casings. A field may carry several values (e.g. `References`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }

    /// Adds a header value, keeping any existing values.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.fields[idx].1.push(value),
            None => self.fields.push((name, vec![value])),
        }
    }

    /// Sets a header value, replacing any existing values.
    ///
    /// The field keeps its original position and spelling if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.fields[idx].1 = vec![value],
            None => self.fields.push((name, vec![value])),
        }
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|idx| self.fields[idx].1.first().map(String::as_str))
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.position(name)
            .map(|idx| self.fields[idx].1.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true if the header has a non-empty first value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_empty())
    }

    /// Removes all values for a header.
    pub fn remove(&mut self, name: &str) {
        self.fields
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    }

    /// Appends every value of `other`, field by field.
    pub fn extend_from(&mut self, other: &Self) {
        for (name, values) in other.iter() {
            for value in values {
                self.add(name, value.clone());
            }
        }
    }

    /// Returns an iterator over fields and their values, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of distinct fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
        assert_eq!(headers.len(), 0);
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_headers_keep_spelling() {
        let mut headers = Headers::new();
        headers.set("cc", "a@example.com");
        headers.add("CC", "b@example.com");

        let fields: Vec<_> = headers.iter().collect();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "cc");
        assert_eq!(fields[0].1, ["a@example.com", "b@example.com"]);
    }

    #[test]
    fn test_headers_set() {
        let mut headers = Headers::new();
        headers.add("To", "alice@example.com");
        headers.add("To", "bob@example.com");
        assert_eq!(headers.get_all("To").len(), 2);

        headers.set("To", "charlie@example.com");
        assert_eq!(headers.get_all("To"), ["charlie@example.com"]);
    }

    #[test]
    fn test_headers_set_keeps_position() {
        let mut headers = Headers::new();
        headers.set("From", "a@example.com");
        headers.set("Subject", "Hi");
        headers.set("from", "b@example.com");

        let names: Vec<_> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["From", "Subject"]);
        assert_eq!(headers.get("From"), Some("b@example.com"));
    }

    #[test]
    fn test_headers_remove() {
        let mut headers = Headers::new();
        headers.add("Subject", "Test");
        assert!(headers.contains("Subject"));

        headers.remove("subject");
        assert!(headers.get("Subject").is_none());
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_contains_ignores_empty() {
        let mut headers = Headers::new();
        headers.set("MIME-Version", "");
        assert!(!headers.contains("MIME-Version"));
    }

    #[test]
    fn test_headers_extend_from() {
        let mut base = Headers::new();
        base.add("References", "<a@x>");

        let mut other = Headers::new();
        other.add("References", "<b@x>");
        other.add("Subject", "Hi");

        base.extend_from(&other);
        assert_eq!(base.get_all("References"), ["<a@x>", "<b@x>"]);
        assert_eq!(base.get("Subject"), Some("Hi"));
    }
}
