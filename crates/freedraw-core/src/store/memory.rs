//! In-memory page store.

use super::AnnotationStore;
use crate::annotation::{Annotation, AnnotationId, PageIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-memory annotation store for testing and headless hosts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    /// Annotations per page, back to front.
    pages: BTreeMap<PageIndex, Vec<Annotation>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages that currently hold at least one annotation.
    pub fn pages(&self) -> impl Iterator<Item = PageIndex> + '_ {
        self.pages
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(&page, _)| page)
    }

    /// Borrow the annotations on a page.
    pub fn page(&self, page: PageIndex) -> &[Annotation] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of annotations across all pages.
    pub fn len(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl AnnotationStore for MemoryStore {
    fn annotations(&self, page: PageIndex) -> Vec<Annotation> {
        self.page(page).to_vec()
    }

    fn add(&mut self, annotation: Annotation) {
        let list = self.pages.entry(annotation.page).or_default();
        list.retain(|a| a.id() != annotation.id());
        list.push(annotation);
    }

    fn remove(&mut self, page: PageIndex, id: AnnotationId) -> Option<Annotation> {
        let list = self.pages.get_mut(&page)?;
        let index = list.iter().position(|a| a.id() == id)?;
        Some(list.remove(index))
    }

    fn get(&self, page: PageIndex, id: AnnotationId) -> Option<Annotation> {
        self.page(page).iter().find(|a| a.id() == id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::InkStyle;
    use crate::path::InkPath;
    use kurbo::{Point, Rect};

    fn stroke(page: PageIndex) -> Annotation {
        let path = InkPath::from_points(&[Point::new(0.0, 0.0), Point::new(10.0, 10.0)]).unwrap();
        Annotation::ink(page, &path, InkStyle::default())
    }

    #[test]
    fn test_add_and_get() {
        let mut store = MemoryStore::new();
        let a = stroke(0);
        let id = a.id();
        store.add(a);

        assert_eq!(store.len(), 1);
        assert!(store.get(0, id).is_some());
        assert!(store.get(1, id).is_none());
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryStore::new();
        let a = stroke(2);
        let id = a.id();
        store.add(a);

        assert!(store.remove(2, id).is_some());
        assert!(store.remove(2, id).is_none());
        assert!(store.is_empty());
        assert_eq!(store.pages().count(), 0);
    }

    #[test]
    fn test_order_is_back_to_front() {
        let mut store = MemoryStore::new();
        let first = stroke(0);
        let second = Annotation::other(0, Rect::new(0.0, 0.0, 5.0, 5.0), "Square");
        let ids = [first.id(), second.id()];
        store.add(first);
        store.add(second);

        let listed: Vec<_> = store.annotations(0).iter().map(Annotation::id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_re_adding_same_id_replaces() {
        let mut store = MemoryStore::new();
        let a = stroke(0);
        store.add(a.clone());
        store.add(a);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut store = MemoryStore::new();
        store.add(stroke(0));
        store.add(stroke(3));

        let json = store.to_json().unwrap();
        let loaded = MemoryStore::from_json(&json).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.page(3), store.page(3));
    }

    #[test]
    fn test_from_json_rejects_path_without_segments() {
        let mut store = MemoryStore::new();
        store.add(stroke(0));
        let mut value: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        let record = &mut value["pages"]["0"][0];
        record["metadata"] = serde_json::Value::Null;
        record["path"]["segments"] = serde_json::json!([]);

        assert!(MemoryStore::from_json(&value.to_string()).is_err());
    }
}
