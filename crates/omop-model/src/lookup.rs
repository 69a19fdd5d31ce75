use std::collections::HashMap;

/// Case-insensitive name lookup that returns the first spelling seen.
#[derive(Debug, Clone, Default)]
pub struct CaseInsensitiveSet {
    map: HashMap<String, String>,
}

impl CaseInsensitiveSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for name in names {
            set.insert(name.as_ref());
        }
        set
    }

    /// Insert a name; returns false when an equal name (ignoring case) exists.
    pub fn insert(&mut self, name: &str) -> bool {
        let key = name.to_lowercase();
        if self.map.contains_key(&key) {
            return false;
        }
        self.map.insert(key, name.to_string());
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
