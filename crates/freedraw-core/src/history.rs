//! Per-page undo/redo history of annotation mutations.

use crate::annotation::{Annotation, PageIndex};
use crate::store::AnnotationStore;
use std::collections::{HashMap, VecDeque};

/// Default maximum number of undo entries kept per page.
pub const DEFAULT_MAX_UNDO_ENTRIES: usize = 10;

/// One committed mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoEntry {
    /// A newly drawn annotation.
    Added(Annotation),
    /// An annotation removed by the eraser, with whatever replaced it.
    Erased {
        original: Annotation,
        replacements: Vec<Annotation>,
    },
}

impl UndoEntry {
    /// Page the entry belongs to.
    pub fn page(&self) -> PageIndex {
        match self {
            UndoEntry::Added(annotation) => annotation.page,
            UndoEntry::Erased { original, .. } => original.page,
        }
    }

    /// Annotations referenced by the entry: the original first, then any
    /// replacements.
    pub fn annotations(&self) -> Vec<&Annotation> {
        match self {
            UndoEntry::Added(annotation) => vec![annotation],
            UndoEntry::Erased {
                original,
                replacements,
            } => std::iter::once(original).chain(replacements).collect(),
        }
    }

    /// Put the store back to how it was before the mutation.
    fn revert(&self, store: &mut dyn AnnotationStore) {
        match self {
            UndoEntry::Added(annotation) => {
                store.remove(annotation.page, annotation.id());
            }
            UndoEntry::Erased {
                original,
                replacements,
            } => {
                for replacement in replacements {
                    store.remove(replacement.page, replacement.id());
                }
                store.add(original.clone());
            }
        }
    }

    /// Perform the mutation again.
    fn apply(&self, store: &mut dyn AnnotationStore) {
        match self {
            UndoEntry::Added(annotation) => store.add(annotation.clone()),
            UndoEntry::Erased {
                original,
                replacements,
            } => {
                store.remove(original.page, original.id());
                for replacement in replacements {
                    store.add(replacement.clone());
                }
            }
        }
    }
}

/// Whether undo and redo are possible on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Availability {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Bounded undo and redo stacks, kept separately for every page.
#[derive(Debug, Clone)]
pub struct UndoHistory {
    /// Maximum undo entries per page; 0 means unbounded.
    max_entries: usize,
    undo_stacks: HashMap<PageIndex, VecDeque<UndoEntry>>,
    redo_stacks: HashMap<PageIndex, Vec<UndoEntry>>,
    /// Last availability handed to the host.
    reported: Availability,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_ENTRIES)
    }
}

impl UndoHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            undo_stacks: HashMap::new(),
            redo_stacks: HashMap::new(),
            reported: Availability::default(),
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Change the cap, evicting the oldest entries of any page over it.
    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries;
        let pages: Vec<PageIndex> = self.undo_stacks.keys().copied().collect();
        for page in pages {
            self.enforce_limit(page);
        }
    }

    /// Record a new user action. Clears the page's redo stack.
    pub fn push(&mut self, entry: UndoEntry) {
        let page = entry.page();
        self.undo_stacks.entry(page).or_default().push_back(entry);
        if let Some(redo) = self.redo_stacks.get_mut(&page) {
            redo.clear();
        }
        self.enforce_limit(page);
    }

    fn enforce_limit(&mut self, page: PageIndex) {
        if self.max_entries == 0 {
            return;
        }
        if let Some(stack) = self.undo_stacks.get_mut(&page) {
            while stack.len() > self.max_entries {
                stack.pop_front();
                log::debug!("Evicted oldest undo entry on page {}", page);
            }
        }
    }

    /// Undo the most recent entry on a page.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self, page: PageIndex, store: &mut dyn AnnotationStore) -> bool {
        let Some(entry) = self.undo_stacks.get_mut(&page).and_then(VecDeque::pop_back) else {
            return false;
        };
        entry.revert(store);
        self.redo_stacks.entry(page).or_default().push(entry);
        true
    }

    /// Redo the most recently undone entry on a page.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self, page: PageIndex, store: &mut dyn AnnotationStore) -> bool {
        let Some(entry) = self.redo_stacks.get_mut(&page).and_then(Vec::pop) else {
            return false;
        };
        entry.apply(store);
        self.undo_stacks.entry(page).or_default().push_back(entry);
        self.enforce_limit(page);
        true
    }

    pub fn can_undo(&self, page: PageIndex) -> bool {
        self.undo_stacks.get(&page).is_some_and(|s| !s.is_empty())
    }

    pub fn can_redo(&self, page: PageIndex) -> bool {
        self.redo_stacks.get(&page).is_some_and(|s| !s.is_empty())
    }

    pub fn undo_len(&self, page: PageIndex) -> usize {
        self.undo_stacks.get(&page).map_or(0, VecDeque::len)
    }

    pub fn redo_len(&self, page: PageIndex) -> usize {
        self.redo_stacks.get(&page).map_or(0, Vec::len)
    }

    /// Undo entries of a page, oldest first.
    pub fn undo_entries(&self, page: PageIndex) -> impl Iterator<Item = &UndoEntry> {
        self.undo_stacks.get(&page).into_iter().flatten()
    }

    pub fn availability(&self, page: PageIndex) -> Availability {
        Availability {
            can_undo: self.can_undo(page),
            can_redo: self.can_redo(page),
        }
    }

    /// Availability for `page` if it differs from what was last reported.
    pub fn availability_change(&mut self, page: PageIndex) -> Option<Availability> {
        let current = self.availability(page);
        if current == self.reported {
            return None;
        }
        self.reported = current;
        Some(current)
    }

    /// Drop every entry on every page.
    pub fn clear(&mut self) {
        self.undo_stacks.clear();
        self.redo_stacks.clear();
    }
}
