use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

use crate::error::DatabaseError;

/// Reference counts for rows of one table, shared between in-memory stores
/// so they enforce the same foreign keys the database does.
#[derive(Debug, Clone)]
pub struct ReferenceTracker {
    table: &'static str,
    counts: Arc<Mutex<HashMap<Uuid, usize>>>,
}

impl ReferenceTracker {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Makes `id` available as a reference target.
    pub fn register(&self, id: Uuid) {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert(0);
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Records a new reference to `id`, failing if the row does not exist.
    pub fn acquire(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        match counts.get_mut(&id) {
            Some(count) => {
                *count += 1;
                Ok(())
            }
            None => Err(DatabaseError::ForeignKeyViolation(format!(
                "Key (id)=({}) is not present in table \"{}\"",
                id, self.table
            ))),
        }
    }

    pub fn release(&self, id: Uuid) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(count) = counts.get_mut(&id) {
            *count = count.saturating_sub(1);
        }
    }

    /// Removes `id`; refused while anything still references it.
    pub fn unregister(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        match counts.get(&id) {
            Some(count) if *count > 0 => Err(DatabaseError::ForeignKeyViolation(format!(
                "Key (id)=({}) is still referenced from table \"{}\"",
                id, self.table
            ))),
            _ => {
                counts.remove(&id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn acquire_requires_registered_row() {
        let tracker = ReferenceTracker::new("physicians");
        let id = Uuid::new_v4();

        assert_matches!(tracker.acquire(id), Err(DatabaseError::ForeignKeyViolation(_)));

        tracker.register(id);
        assert!(tracker.acquire(id).is_ok());
    }

    #[test]
    fn referenced_rows_cannot_be_removed() {
        let tracker = ReferenceTracker::new("patients");
        let id = Uuid::new_v4();
        tracker.register(id);
        tracker.acquire(id).unwrap();

        assert_matches!(tracker.unregister(id), Err(DatabaseError::ForeignKeyViolation(_)));
        assert!(tracker.contains(id));

        tracker.release(id);
        assert!(tracker.unregister(id).is_ok());
        assert!(!tracker.contains(id));
    }

    #[test]
    fn clones_share_counts() {
        let tracker = ReferenceTracker::new("physicians");
        let other = tracker.clone();
        let id = Uuid::new_v4();

        tracker.register(id);
        other.acquire(id).unwrap();
        assert!(tracker.unregister(id).is_err());
    }
}
