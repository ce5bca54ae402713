//! Per-pool wait list for task instances refused admission.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::core::{TaskInstanceId, TaskState};

/// A parked task instance and the state it asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitEntry {
    /// Parked task instance.
    pub id: TaskInstanceId,
    /// Ordering weight, higher first.
    pub priority_weight: i32,
    /// State to enter once a slot is granted.
    pub target: TaskState,
    seq: u64,
}

impl PartialOrd for WaitEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WaitEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, then FIFO (reversed for max-heap).
        match self.priority_weight.cmp(&other.priority_weight) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            other => other,
        }
    }
}

/// Priority heap of parked task instances.
#[derive(Debug, Default)]
pub struct WaitQueue {
    entries: BinaryHeap<WaitEntry>,
    // Parked id -> arrival sequence.
    parked: HashMap<TaskInstanceId, u64>,
    next_seq: u64,
}

impl WaitQueue {
    /// Create an empty wait list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a task instance. A previous entry for the same id is replaced
    /// but keeps its place among equal priorities.
    pub fn push(&mut self, id: TaskInstanceId, priority_weight: i32, target: TaskState) {
        let seq = match self.remove(id) {
            Some(previous) => previous.seq,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };
        self.parked.insert(id, seq);
        self.entries.push(WaitEntry {
            id,
            priority_weight,
            target,
            seq,
        });
    }

    /// Next entry to be considered for admission.
    pub fn peek(&self) -> Option<&WaitEntry> {
        self.entries.peek()
    }

    /// Remove and return the next entry.
    pub fn pop(&mut self) -> Option<WaitEntry> {
        let entry = self.entries.pop()?;
        self.parked.remove(&entry.id);
        Some(entry)
    }

    /// Remove the entry for `id`, if parked.
    pub fn remove(&mut self, id: TaskInstanceId) -> Option<WaitEntry> {
        self.parked.remove(&id)?;
        let mut removed = None;
        let entries: Vec<_> = self.entries.drain().collect();
        self.entries = entries
            .into_iter()
            .filter_map(|entry| {
                if entry.id == id {
                    removed = Some(entry);
                    None
                } else {
                    Some(entry)
                }
            })
            .collect();
        removed
    }

    /// Whether `id` is parked.
    pub fn contains(&self, id: TaskInstanceId) -> bool {
        self.parked.contains_key(&id)
    }

    /// Remove every entry, in admission order.
    pub fn drain_ordered(&mut self) -> Vec<WaitEntry> {
        self.parked.clear();
        let mut entries = std::mem::take(&mut self.entries).into_sorted_vec();
        entries.reverse();
        entries
    }

    /// Number of parked instances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is parked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
