//! Session store: working list, cursor, filter, and the suggestion cache
//!
//! Everything here is owned by the single coordinating context. The store
//! is pure bookkeeping; decisions, undo, and background computation all go
//! through it but live in their own modules.

use crate::domain::{FileId, FileKind, FileRecord, SessionCounters, ThumbnailHandle};
use crate::suggest::Suggestion;
use std::collections::HashMap;

/// The in-memory ordered set of untriaged files plus the review cursor.
#[derive(Debug, Default)]
pub struct SessionStore {
    working: Vec<FileRecord>,
    cursor: usize,
    filter: Option<FileKind>,
    cache: HashMap<FileId, Vec<Suggestion>>,
    counters: SessionCounters,
    next_id: u64,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore {
            next_id: 1,
            ..SessionStore::default()
        }
    }

    /// Replaces the working list with a fresh load. Assigns session-unique
    /// ids, resets the cursor and filter, clears the suggestion cache, and
    /// zeroes the counters.
    pub fn load(&mut self, mut records: Vec<FileRecord>) {
        for record in &mut records {
            record.id = FileId(self.next_id.max(1));
            self.next_id = record.id.0 + 1;
            record.decision = None;
        }

        self.working = records;
        self.cursor = 0;
        self.filter = None;
        self.cache.clear();
        self.counters = SessionCounters::default();
    }

    /// Replaces the active type predicate and resets the cursor.
    pub fn set_filter(&mut self, filter: Option<FileKind>) {
        self.filter = filter;
        self.cursor = 0;
    }

    pub fn filter(&self) -> Option<FileKind> {
        self.filter
    }

    fn matches_filter(&self, record: &FileRecord) -> bool {
        self.filter.map_or(true, |kind| record.kind == kind)
    }

    /// The working list after the active filter, in insertion order.
    pub fn visible(&self) -> impl Iterator<Item = &FileRecord> {
        self.working.iter().filter(|r| self.matches_filter(r))
    }

    pub fn visible_len(&self) -> usize {
        self.visible().count()
    }

    /// The record at the cursor, or `None` once the session is finished.
    pub fn current(&self) -> Option<&FileRecord> {
        self.visible().nth(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub(crate) fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.visible_len());
    }

    /// Moves past the current file without deciding it.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1).min(self.visible_len());
    }

    /// Re-clamps the cursor after removals. Removing the record at the
    /// cursor already slides the next one into its slot, so this never
    /// increments.
    pub(crate) fn settle_cursor(&mut self) {
        self.cursor = self.cursor.min(self.visible_len());
    }

    /// Cursor at the end of the visible sequence means nothing is left to
    /// review.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.visible_len()
    }

    pub fn working_len(&self) -> usize {
        self.working.len()
    }

    pub fn get(&self, id: FileId) -> Option<&FileRecord> {
        self.working.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.get(id).is_some()
    }

    /// Index in the unfiltered working list, for undo fidelity.
    pub fn index_of(&self, id: FileId) -> Option<usize> {
        self.working.iter().position(|r| r.id == id)
    }

    /// Position in the current visible sequence.
    pub fn position_in_visible(&self, id: FileId) -> Option<usize> {
        self.visible().position(|r| r.id == id)
    }

    /// Removes a record regardless of the active filter, dropping its
    /// suggestion cache entry so no stale suggestion survives the file.
    /// Returns the record and its original working-list index.
    pub fn remove(&mut self, id: FileId) -> Option<(FileRecord, usize)> {
        let index = self.index_of(id)?;
        let record = self.working.remove(index);
        self.cache.remove(&id);
        Some((record, index))
    }

    /// Puts a previously removed record back, at the given index when still
    /// valid, else at the tail. The record comes back untriaged.
    pub fn reinsert(&mut self, mut record: FileRecord, at_index: Option<usize>) {
        record.decision = None;
        match at_index {
            Some(i) if i <= self.working.len() => self.working.insert(i, record),
            _ => self.working.push(record),
        }
    }

    /// First `n` files of the working list: the bounded comparison window
    /// for suggestion computation.
    pub fn window(&self, n: usize) -> Vec<FileRecord> {
        self.working.iter().take(n).cloned().collect()
    }

    pub fn suggestions(&self, id: FileId) -> Option<&[Suggestion]> {
        self.cache.get(&id).map(|v| v.as_slice())
    }

    /// Commits a computed suggestion list. Refused when the file has left
    /// the working list or another computation already filled the slot.
    pub fn store_suggestions(&mut self, id: FileId, suggestions: Vec<Suggestion>) -> bool {
        if !self.contains(id) || self.cache.contains_key(&id) {
            return false;
        }
        self.cache.insert(id, suggestions);
        true
    }

    /// True when no cache entry references a file outside the working list.
    pub fn cache_is_consistent(&self) -> bool {
        self.cache.keys().all(|id| self.contains(*id))
    }

    pub fn cached_ids(&self) -> Vec<FileId> {
        self.cache.keys().copied().collect()
    }

    pub(crate) fn set_thumbnail(&mut self, id: FileId, handle: ThumbnailHandle) {
        if let Some(record) = self.working.iter_mut().find(|r| r.id == id) {
            record.thumbnail = Some(handle);
        }
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub(crate) fn counters_mut(&mut self) -> &mut SessionCounters {
        &mut self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;

    fn record(name: &str, kind: FileKind) -> FileRecord {
        FileRecord::new(
            PathBuf::from(format!("/desk/{}", name)),
            10,
            Utc::now(),
            Utc::now(),
            kind,
            None,
        )
    }

    fn loaded(names: &[(&str, FileKind)]) -> SessionStore {
        let mut store = SessionStore::new();
        store.load(names.iter().map(|(n, k)| record(n, *k)).collect());
        store
    }

    mod load_tests {
        use super::*;

        #[test]
        fn test_load_assigns_unique_ids() {
            let store = loaded(&[("a.txt", FileKind::Document), ("b.txt", FileKind::Document)]);

            let ids: Vec<_> = store.visible().map(|r| r.id).collect();
            assert_eq!(ids.len(), 2);
            assert_ne!(ids[0], ids[1]);
        }

        #[test]
        fn test_reload_never_reuses_ids() {
            let mut store = loaded(&[("a.txt", FileKind::Document)]);
            let first_id = store.current().unwrap().id;

            store.load(vec![record("b.txt", FileKind::Document)]);
            let second_id = store.current().unwrap().id;

            assert_ne!(first_id, second_id);
        }

        #[test]
        fn test_load_resets_everything() {
            let mut store = loaded(&[
                ("a.png", FileKind::Image),
                ("b.txt", FileKind::Document),
            ]);
            store.set_filter(Some(FileKind::Image));
            store.advance();
            store.counters_mut().kept = 3;

            store.load(vec![record("c.txt", FileKind::Document)]);

            assert_eq!(store.cursor(), 0);
            assert!(store.filter().is_none());
            assert_eq!(store.counters(), SessionCounters::default());
            assert_eq!(store.working_len(), 1);
        }
    }

    mod cursor_tests {
        use super::*;

        #[test]
        fn test_current_and_advance_clamp() {
            let mut store = loaded(&[("a.txt", FileKind::Document), ("b.txt", FileKind::Document)]);

            assert_eq!(store.current().unwrap().name, "a.txt");
            store.advance();
            assert_eq!(store.current().unwrap().name, "b.txt");
            store.advance();
            assert!(store.current().is_none());
            assert!(store.is_finished());

            // Clamped at visible length.
            store.advance();
            assert_eq!(store.cursor(), 2);
        }

        #[test]
        fn test_empty_store_is_finished() {
            let store = SessionStore::new();
            assert!(store.is_finished());
            assert!(store.current().is_none());
        }

        #[test]
        fn test_settle_after_removal_points_at_next() {
            let mut store = loaded(&[("a.txt", FileKind::Document), ("b.txt", FileKind::Document)]);
            let first = store.current().unwrap().id;

            store.remove(first);
            store.settle_cursor();

            assert_eq!(store.current().unwrap().name, "b.txt");
            assert_eq!(store.cursor(), 0);
        }
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_filter_restricts_visible_and_resets_cursor() {
            let mut store = loaded(&[
                ("doc1.txt", FileKind::Document),
                ("pic1.png", FileKind::Image),
                ("doc2.txt", FileKind::Document),
                ("pic2.png", FileKind::Image),
                ("doc3.txt", FileKind::Document),
            ]);
            store.advance();
            store.advance();

            store.set_filter(Some(FileKind::Image));

            assert_eq!(store.cursor(), 0);
            assert_eq!(store.visible_len(), 2);
            assert_eq!(store.current().unwrap().name, "pic1.png");
        }

        #[test]
        fn test_clearing_filter_restores_full_sequence() {
            let mut store = loaded(&[
                ("doc.txt", FileKind::Document),
                ("pic.png", FileKind::Image),
            ]);
            store.set_filter(Some(FileKind::Image));
            store.set_filter(None);

            assert_eq!(store.visible_len(), 2);
            assert_eq!(store.current().unwrap().name, "doc.txt");
        }

        #[test]
        fn test_remove_ignores_filter() {
            let mut store = loaded(&[
                ("doc.txt", FileKind::Document),
                ("pic.png", FileKind::Image),
            ]);
            store.set_filter(Some(FileKind::Image));

            let doc_id = store.index_of_name("doc.txt");
            assert!(store.remove(doc_id).is_some());
            assert_eq!(store.working_len(), 1);
        }
    }

    mod reinsert_tests {
        use super::*;

        #[test]
        fn test_reinsert_at_original_index() {
            let mut store = loaded(&[
                ("a.txt", FileKind::Document),
                ("b.txt", FileKind::Document),
                ("c.txt", FileKind::Document),
            ]);
            let id = store.index_of_name("b.txt");

            let (record, index) = store.remove(id).unwrap();
            assert_eq!(index, 1);

            store.reinsert(record, Some(index));
            let names: Vec<_> = store.visible().map(|r| r.name.clone()).collect();
            assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
        }

        #[test]
        fn test_reinsert_with_stale_index_goes_to_tail() {
            let mut store = loaded(&[("a.txt", FileKind::Document)]);
            let id = store.index_of_name("a.txt");
            let (record, _) = store.remove(id).unwrap();

            store.reinsert(record, Some(10));
            assert_eq!(store.working_len(), 1);
        }

        #[test]
        fn test_reinsert_clears_decision_tag() {
            let mut store = loaded(&[("a.txt", FileKind::Document)]);
            let id = store.index_of_name("a.txt");
            let (mut record, _) = store.remove(id).unwrap();
            record.decision = Some(crate::domain::Decision::Bin);

            store.reinsert(record, None);
            assert!(store.current().unwrap().decision.is_none());
        }
    }

    mod cache_tests {
        use super::*;

        #[test]
        fn test_store_and_read_suggestions() {
            let mut store = loaded(&[("a.txt", FileKind::Document)]);
            let id = store.current().unwrap().id;

            assert!(store.store_suggestions(id, vec![]));
            assert!(store.suggestions(id).is_some());
        }

        #[test]
        fn test_store_refuses_filled_slot() {
            let mut store = loaded(&[("a.txt", FileKind::Document)]);
            let id = store.current().unwrap().id;

            assert!(store.store_suggestions(id, vec![]));
            assert!(!store.store_suggestions(id, vec![]));
        }

        #[test]
        fn test_store_refuses_absent_file() {
            let mut store = loaded(&[("a.txt", FileKind::Document)]);
            assert!(!store.store_suggestions(FileId(999), vec![]));
        }

        #[test]
        fn test_removal_invalidates_cache_entry() {
            let mut store = loaded(&[("a.txt", FileKind::Document)]);
            let id = store.current().unwrap().id;
            store.store_suggestions(id, vec![]);

            store.remove(id);

            assert!(store.suggestions(id).is_none());
            assert!(store.cache_is_consistent());
        }
    }

    impl SessionStore {
        fn index_of_name(&self, name: &str) -> FileId {
            self.working
                .iter()
                .find(|r| r.name == name)
                .map(|r| r.id)
                .unwrap()
        }
    }
}
