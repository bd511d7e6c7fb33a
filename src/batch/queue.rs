//! Batch queue.

use super::operation::BatchOperation;
use std::sync::{Arc, Mutex, MutexGuard};

/// Ordered, append-only queue of pending operations for one orchestration context.
///
/// Insertion order defines output order. Cloning shares the underlying queue.
#[derive(Clone, Default)]
pub struct BatchQueue {
    items: Arc<Mutex<Vec<BatchOperation>>>,
}

impl BatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_operations(ops: Vec<BatchOperation>) -> Self {
        Self {
            items: Arc::new(Mutex::new(ops)),
        }
    }

    // A poisoned queue still holds valid operations; keep going with them.
    fn lock(&self) -> MutexGuard<'_, Vec<BatchOperation>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Appends an operation. Nothing is executed until the queue is drained.
    pub fn enqueue(&self, op: BatchOperation) {
        self.lock().push(op);
    }

    /// Takes every queued operation, leaving the queue empty.
    ///
    /// Operations enqueued after this call land in a fresh batch.
    pub fn drain(&self) -> Vec<BatchOperation> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl std::fmt::Debug for BatchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchQueue").field("len", &self.len()).finish()
    }
}
