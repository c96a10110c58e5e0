//! Record module
//!
//! A [`Record`] is an ordered field-name -> string mapping: one CSV row or
//! the key/value pairs of one markdown front matter block.
//!
//! Field lookup from external data goes through [`RecordAccessor`], which
//! tries the exact key first and then falls back to a trimmed,
//! case-insensitive match.

/// Ordered string record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from pairs; a repeated key keeps its first position and its last value
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut record = Self::new();
        for (key, value) in pairs {
            record.set(key, value);
        }
        record
    }

    /// Exact-key lookup
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or update a field; new keys are appended
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Rename a field in place, keeping its position
    ///
    /// Returns `false` when `from` is missing or `to` already exists.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from == to || self.contains_key(to) {
            return false;
        }
        match self.fields.iter_mut().find(|(k, _)| k == from) {
            Some((key, _)) => {
                *key = to.to_string();
                true
            }
            None => false,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Read access to externally shaped records
pub trait RecordAccessor {
    /// Exact-key lookup
    fn get_exact(&self, key: &str) -> Option<&str>;

    /// All field names in order
    fn field_names(&self) -> Vec<&str>;

    /// Actual field name matching `key`: exact first, then trimmed case-insensitive
    fn resolve_key(&self, key: &str) -> Option<&str> {
        let names = self.field_names();
        if let Some(name) = names.iter().copied().find(|name| *name == key) {
            return Some(name);
        }
        let wanted = key.trim().to_lowercase();
        names
            .into_iter()
            .find(|name| name.trim().to_lowercase() == wanted)
    }

    /// Value of the field matching `key` (see [`RecordAccessor::resolve_key`])
    fn lookup(&self, key: &str) -> Option<&str> {
        let name = self.resolve_key(key)?;
        self.get_exact(name)
    }
}

impl RecordAccessor for Record {
    fn get_exact(&self, key: &str) -> Option<&str> {
        self.get(key)
    }

    fn field_names(&self) -> Vec<&str> {
        self.keys().collect()
    }
}

/// Strip one pair of matching surrounding quotes (`"` or `'`)
pub fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' || first == b'\'') && first == last {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Normalize a raw image reference value: trimmed and unquoted
pub fn normalize_reference(raw: &str) -> &str {
    strip_quotes(raw.trim()).trim()
}
