//! Coalescing redraw queue
//!
//! Engine notifications arrive far faster than the display can usefully
//! redraw (meters alone update dozens of times per second). Producers mark
//! `(strip, field)` pairs dirty; the display tick drains the whole set once
//! and redraws only what changed.
//!
//! The pending set is shared behind a mutex. `drain()` swaps it out in one
//! step, so the captured batch belongs to the renderer alone and anything
//! enqueued afterwards lands in a fresh set for the next tick.

use crate::strip::StripSlot;
use mixdeck_core::ParamKind;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Part of a strip that can be redrawn on its own
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StripField {
    Level,
    Balance,
    Mute,
    Solo,
    Mono,
    Meter,
    Legend,
    Highlight,
    /// Whole strip; subsumes every other field
    All,
}

impl StripField {
    const FIELDS: [StripField; 8] = [
        StripField::Level,
        StripField::Balance,
        StripField::Mute,
        StripField::Solo,
        StripField::Mono,
        StripField::Meter,
        StripField::Legend,
        StripField::Highlight,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl From<ParamKind> for StripField {
    fn from(kind: ParamKind) -> Self {
        match kind {
            ParamKind::Level => StripField::Level,
            ParamKind::Balance => StripField::Balance,
            ParamKind::Mute => StripField::Mute,
            ParamKind::Solo => StripField::Solo,
            ParamKind::Mono => StripField::Mono,
        }
    }
}

/// Dirty fields of one strip
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct FieldMask(u16);

impl FieldMask {
    fn insert(&mut self, field: StripField) {
        if self.contains(StripField::All) {
            return;
        }
        if field == StripField::All {
            self.0 = StripField::All.bit();
        } else {
            self.0 |= field.bit();
        }
    }

    fn contains(self, field: StripField) -> bool {
        self.0 & field.bit() != 0
    }
}

/// One redraw request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RefreshEntry {
    pub slot: StripSlot,
    pub field: StripField,
}

/// Entries captured by one `drain()`
#[derive(Debug, Default)]
pub struct RefreshBatch {
    entries: Vec<RefreshEntry>,
}

impl RefreshBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, slot: StripSlot, field: StripField) -> bool {
        self.entries.contains(&RefreshEntry { slot, field })
    }

    pub fn entries(&self) -> &[RefreshEntry] {
        &self.entries
    }
}

impl IntoIterator for RefreshBatch {
    type Item = RefreshEntry;
    type IntoIter = std::vec::IntoIter<RefreshEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Shared, deduplicating set of pending redraws
///
/// Cloning yields another handle to the same set, so notification producers
/// on other threads can hold their own copy.
#[derive(Clone, Default)]
pub struct RefreshQueue {
    pending: Arc<Mutex<HashMap<StripSlot, FieldMask>>>,
}

impl RefreshQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // A producer that panicked mid-insert leaves the map consistent, so
    // poisoning is ignored rather than dropping redraws.
    fn lock(&self) -> MutexGuard<'_, HashMap<StripSlot, FieldMask>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Mark `field` of `slot` dirty. Repeats collapse.
    pub fn enqueue(&self, slot: StripSlot, field: StripField) {
        self.lock().entry(slot).or_default().insert(field);
    }

    /// Mark a whole strip dirty
    pub fn invalidate(&self, slot: StripSlot) {
        self.enqueue(slot, StripField::All);
    }

    /// Take every pending entry, leaving an empty set behind
    pub fn drain(&self) -> RefreshBatch {
        let pending = std::mem::take(&mut *self.lock());
        let mut entries = Vec::with_capacity(pending.len());
        for (slot, mask) in pending {
            if mask.contains(StripField::All) {
                entries.push(RefreshEntry { slot, field: StripField::All });
                continue;
            }
            entries.extend(
                StripField::FIELDS
                    .into_iter()
                    .filter(|field| mask.contains(*field))
                    .map(|field| RefreshEntry { slot, field }),
            );
        }
        RefreshBatch { entries }
    }

    /// Number of strips with pending work
    pub fn pending_strips(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: StripSlot = StripSlot::Visible(0);
    const B: StripSlot = StripSlot::Visible(1);

    #[test]
    fn test_repeated_enqueue_collapses() {
        let queue = RefreshQueue::new();
        for _ in 0..50 {
            queue.enqueue(A, StripField::Level);
        }
        let batch = queue.drain();
        assert_eq!(batch.len(), 1);
        assert!(batch.contains(A, StripField::Level));
    }

    #[test]
    fn test_all_dominates_earlier_field() {
        let queue = RefreshQueue::new();
        queue.enqueue(A, StripField::Level);
        queue.enqueue(A, StripField::All);
        let batch = queue.drain();
        assert_eq!(batch.entries(), &[RefreshEntry { slot: A, field: StripField::All }]);
    }

    #[test]
    fn test_all_dominates_later_field() {
        let queue = RefreshQueue::new();
        queue.invalidate(A);
        queue.enqueue(A, StripField::Mute);
        queue.invalidate(A);
        let batch = queue.drain();
        assert_eq!(batch.len(), 1);
        assert!(batch.contains(A, StripField::All));
    }

    #[test]
    fn test_mixed_batch_then_empty() {
        let queue = RefreshQueue::new();
        queue.enqueue(A, StripField::Level);
        queue.enqueue(A, StripField::Mute);
        queue.invalidate(B);

        let batch = queue.drain();
        assert_eq!(batch.len(), 3);
        assert!(batch.contains(A, StripField::Level));
        assert!(batch.contains(A, StripField::Mute));
        assert!(batch.contains(B, StripField::All));

        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_enqueue_after_drain_goes_to_next_batch() {
        let queue = RefreshQueue::new();
        queue.enqueue(A, StripField::Solo);
        let first = queue.drain();
        queue.enqueue(A, StripField::Solo);
        let second = queue.drain();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let queue = RefreshQueue::new();
        let producers: Vec<_> = (0..4)
            .map(|i| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        queue.enqueue(StripSlot::Visible(i), StripField::Meter);
                    }
                })
            })
            .collect();

        // Drain while producers run; every slot must show up in some batch
        let mut seen = std::collections::HashSet::new();
        let mut total = 0;
        for _ in 0..100 {
            for entry in queue.drain() {
                seen.insert(entry.slot);
                total += 1;
            }
        }
        for producer in producers {
            producer.join().unwrap();
        }
        for entry in queue.drain() {
            seen.insert(entry.slot);
            total += 1;
        }
        assert_eq!(seen.len(), 4);
        assert!(total >= 4);
        assert!(queue.is_empty());
    }
}
