//! Local list view: the last full listing plus a search filter.

use chrono::{DateTime, Utc};

use crate::item::InventoryItem;

#[derive(Debug, Clone, Default)]
pub struct ListView {
    items: Vec<InventoryItem>,
    search: String,
    refreshed_at: Option<DateTime<Utc>>,
}

impl ListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole listing with a fresh `list()` result.
    pub fn replace(&mut self, mut items: Vec<InventoryItem>) {
        items.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        self.items = items;
        self.refreshed_at = Some(Utc::now());
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Items whose name contains the search string, ignoring case. Restartable via `clone()`.
    pub fn visible_items(&self) -> VisibleItems<'_> {
        VisibleItems {
            inner: self.items.iter(),
            needle: self.search.to_lowercase(),
        }
    }

    /// Every item from the last refresh, sorted by name.
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn get(&self, name: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// When the listing was last replaced. `None` before the first refresh.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

#[derive(Debug, Clone)]
pub struct VisibleItems<'a> {
    inner: std::slice::Iter<'a, InventoryItem>,
    needle: String,
}

impl<'a> Iterator for VisibleItems<'a> {
    type Item = &'a InventoryItem;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = &self.needle;
        self.inner
            .by_ref()
            .find(|item| needle.is_empty() || item.name.to_lowercase().contains(needle.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}
