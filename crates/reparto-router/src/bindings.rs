//! Token → path segment values captured by a single dispatch
use std::collections::HashMap;

/// Values bound to the `$N` tokens of a matched pattern
///
/// Created fresh for every match attempt and handed back to the caller inside
/// the match result. Iteration order is unspecified; use [`Bindings::get_index`]
/// when numeric order matters.
///
/// # Examples
///
/// ```
/// use reparto_router::match_path;
///
/// let bindings = match_path("/api/hospital/42/beds/3", "/api/hospital/$1/beds/$2").unwrap();
/// assert_eq!(bindings.get("$2"), Some("3"));
/// assert_eq!(bindings.get_index(1), Some("42"));
/// assert_eq!(bindings.get("$3"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<String, String>,
}

impl Bindings {
    /// Creates an empty binding set
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, token: String, value: String) {
        self.values.insert(token, value);
    }

    /// Value bound to a token, keyed by its literal text (`"$1"`)
    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    /// Value bound to `$index`
    pub fn get_index(&self, index: usize) -> Option<&str> {
        self.get(&format!("${index}"))
    }

    /// Number of bound tokens
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the pattern had no tokens
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(token, value)` pairs in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Consumes the set and returns the underlying map
    pub fn into_map(self) -> HashMap<String, String> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bindings() {
        let bindings = Bindings::new();
        assert!(bindings.is_empty());
        assert_eq!(bindings.len(), 0);
        assert_eq!(bindings.get("$1"), None);
    }

    #[test]
    fn test_get_index_formats_token() {
        let mut bindings = Bindings::new();
        bindings.insert("$3".to_string(), "c".to_string());
        assert_eq!(bindings.get_index(3), Some("c"));
        assert_eq!(bindings.get_index(1), None);
    }

    #[test]
    fn test_into_map() {
        let mut bindings = Bindings::new();
        bindings.insert("$1".to_string(), "42".to_string());
        let map = bindings.into_map();
        assert_eq!(map.get("$1"), Some(&"42".to_string()));
    }
}
