//! Closed display-name → category id table.

use corpusgen_shared::CategoriesConfig;

/// Ordered mapping from a category's display name to its stable id.
///
/// Lookup is exact and case-sensitive. Names not in the table resolve to
/// the default id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMap {
    entries: Vec<(String, String)>,
    default_id: String,
}

impl CategoryMap {
    /// An empty table: everything resolves to `default_id`.
    pub fn new(default_id: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            default_id: default_id.into(),
        }
    }

    /// Add a mapping, or replace the id of an existing name in place.
    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) {
        let name = name.into();
        let id = id.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = id,
            None => self.entries.push((name, id)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.insert(name, id);
        self
    }

    /// The mapped id for `name`, if the table has one.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| id.as_str())
    }

    /// The mapped id for `name`, or the default id.
    pub fn resolve(&self, name: &str) -> &str {
        self.lookup(name).unwrap_or(self.default_id.as_str())
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// `(name, id)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, id)| (n.as_str(), id.as_str()))
    }

    /// Mapped ids in insertion order, without the default.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, id)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&CategoriesConfig> for CategoryMap {
    fn from(config: &CategoriesConfig) -> Self {
        config
            .map
            .iter()
            .fold(Self::new(config.default_id.clone()), |map, m| {
                map.with(m.name.clone(), m.id.clone())
            })
    }
}

impl Default for CategoryMap {
    fn default() -> Self {
        Self::from(&CategoriesConfig::default())
    }
}
