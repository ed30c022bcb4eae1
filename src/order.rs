//! Persisted shuffle permutation and cursor
use crate::error::StorageError;
use crate::hash;
use crate::storage::{KeyValueStore, ORDER_INDEX_KEY, ORDER_KEY};
use crate::verse::VerseCollection;

/// A permutation of verse references and the position of the next one
///
/// The permutation is generated once and reused until [`OrderStore::clear`].
/// It is not rebuilt when the collection changes, so entries can go stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffleOrder {
    pub order: Vec<String>,
    pub cursor: usize,
}

impl ShuffleOrder {
    pub fn new(order: Vec<String>) -> Self {
        ShuffleOrder { order, cursor: 0 }
    }

    /// Cursor clamped into range; anything past the end reads as 0
    pub fn position(&self) -> usize {
        if self.cursor >= self.order.len() {
            0
        } else {
            self.cursor
        }
    }

    /// Reference under the cursor
    pub fn current(&self) -> Option<&str> {
        self.order.get(self.position()).map(String::as_str)
    }

    /// Cursor value after one advance
    pub fn next_cursor(&self) -> usize {
        let next = self.position() + 1;
        if next >= self.order.len() {
            0
        } else {
            next
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Reads and writes the shuffle order under [`ORDER_KEY`] and [`ORDER_INDEX_KEY`]
pub struct OrderStore<S> {
    storage: S,
}

impl<S: KeyValueStore> OrderStore<S> {
    pub fn new(storage: S) -> Self {
        OrderStore { storage }
    }

    /// Read the persisted order, if there is a usable one
    ///
    /// A corrupt order record reads as absent. A missing or unparsable cursor
    /// reads as 0.
    pub fn load(&self) -> Option<ShuffleOrder> {
        let raw = self.storage.get(ORDER_KEY)?;
        let order: Vec<String> = match serde_json::from_str(&raw) {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(error = %e, "stored shuffle order is corrupt, discarding");
                return None;
            }
        };
        let cursor = self
            .storage
            .get(ORDER_INDEX_KEY)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .unwrap_or(0);
        Some(ShuffleOrder { order, cursor })
    }

    /// Return the persisted order, creating and persisting one if needed
    ///
    /// A new order is the collection's references shuffled with `seed`, with
    /// the cursor at 0. An existing order is returned as is, even if the
    /// collection has changed since it was built.
    pub fn get_or_create(
        &self,
        verses: &VerseCollection,
        seed: Option<&str>,
    ) -> Result<ShuffleOrder, StorageError> {
        if let Some(order) = self.load() {
            return Ok(order);
        }
        let order = ShuffleOrder::new(hash::shuffle(&verses.references(), seed));
        self.save(&order)?;
        tracing::debug!(len = order.len(), "created shuffle order");
        Ok(order)
    }

    /// Move the cursor forward one step, wrapping, and persist it
    pub fn advance(&self, order: &mut ShuffleOrder) -> Result<(), StorageError> {
        order.cursor = order.next_cursor();
        self.storage
            .set(ORDER_INDEX_KEY, &order.cursor.to_string())
    }

    pub fn save(&self, order: &ShuffleOrder) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&order.order)?;
        self.storage.set(ORDER_KEY, &raw)?;
        self.storage
            .set(ORDER_INDEX_KEY, &order.cursor.to_string())
    }

    /// Forget the persisted order so the next shuffle builds a fresh one
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(ORDER_KEY)?;
        self.storage.remove(ORDER_INDEX_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::verse::VerseRecord;
    use std::collections::HashSet;

    fn verses(refs: &[&str]) -> VerseCollection {
        VerseCollection::new(
            refs.iter()
                .map(|r| VerseRecord::new(format!("text {}", r), *r, "reflection"))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_get_or_create_persists_new_order() {
        let storage = MemoryStore::new();
        let store = OrderStore::new(storage.clone());
        let order = store
            .get_or_create(&verses(&["A", "B", "C", "D", "E"]), Some("seed"))
            .unwrap();

        assert_eq!(order.order, vec!["E", "A", "B", "C", "D"]);
        assert_eq!(order.cursor, 0);
        assert_eq!(
            storage.get(ORDER_KEY),
            Some(r#"["E","A","B","C","D"]"#.to_string())
        );
        assert_eq!(storage.get(ORDER_INDEX_KEY), Some("0".to_string()));
    }

    #[test]
    fn test_existing_order_is_not_regenerated() {
        let store = OrderStore::new(MemoryStore::new());
        let first = store
            .get_or_create(&verses(&["A", "B", "C"]), Some("one"))
            .unwrap();
        let second = store
            .get_or_create(&verses(&["X", "Y"]), Some("two"))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_advance_wraps() {
        let store = OrderStore::new(MemoryStore::new());
        let mut order = ShuffleOrder::new(vec!["A".into(), "B".into()]);
        store.advance(&mut order).unwrap();
        assert_eq!(order.cursor, 1);
        store.advance(&mut order).unwrap();
        assert_eq!(order.cursor, 0);
    }

    #[test]
    fn test_advance_persists_cursor() {
        let storage = MemoryStore::new();
        let store = OrderStore::new(storage.clone());
        let mut order = store
            .get_or_create(&verses(&["A", "B", "C"]), Some("seed"))
            .unwrap();
        store.advance(&mut order).unwrap();
        assert_eq!(storage.get(ORDER_INDEX_KEY), Some("1".to_string()));
        assert_eq!(store.load().unwrap().cursor, 1);
    }

    #[test]
    fn test_full_cycle_visits_every_reference_once() {
        let refs: Vec<String> = (0..12).map(|i| format!("R{}", i)).collect();
        let collection = verses(&refs.iter().map(String::as_str).collect::<Vec<_>>());
        let store = OrderStore::new(MemoryStore::new());
        let mut order = store.get_or_create(&collection, None).unwrap();

        let mut seen = HashSet::new();
        for _ in 0..order.len() {
            assert!(seen.insert(order.current().unwrap().to_string()));
            store.advance(&mut order).unwrap();
        }
        assert_eq!(seen.len(), refs.len());
        assert_eq!(order.cursor, 0);
    }

    #[test]
    fn test_out_of_range_cursor_reads_as_start() {
        let storage = MemoryStore::new();
        storage.set(ORDER_KEY, r#"["A","B"]"#).unwrap();
        storage.set(ORDER_INDEX_KEY, "7").unwrap();
        let order = OrderStore::new(storage).load().unwrap();
        assert_eq!(order.position(), 0);
        assert_eq!(order.current(), Some("A"));
        assert_eq!(order.next_cursor(), 1);
    }

    #[test]
    fn test_garbage_cursor_reads_as_zero() {
        let storage = MemoryStore::new();
        storage.set(ORDER_KEY, r#"["A","B"]"#).unwrap();
        storage.set(ORDER_INDEX_KEY, "abc").unwrap();
        assert_eq!(OrderStore::new(storage).load().unwrap().cursor, 0);
    }

    #[test]
    fn test_corrupt_order_is_regenerated() {
        let storage = MemoryStore::new();
        storage.set(ORDER_KEY, "{oops").unwrap();
        let store = OrderStore::new(storage);
        assert!(store.load().is_none());
        let order = store
            .get_or_create(&verses(&["A", "B"]), Some("seed"))
            .unwrap();
        assert_eq!(order.len(), 2);
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let storage = MemoryStore::new();
        let store = OrderStore::new(storage.clone());
        store
            .get_or_create(&verses(&["A", "B"]), Some("seed"))
            .unwrap();
        store.clear().unwrap();
        assert!(!storage.contains(ORDER_KEY));
        assert!(!storage.contains(ORDER_INDEX_KEY));
    }
}
