//! Resolved-overload memo.
//!
//! Each overload set remembers which candidate won for a given vector of
//! argument run-time classes. Entries are append-only and the memo stops
//! growing at twice the number of candidates, so call sites with wildly
//! varying argument types fall back to full resolution instead of scanning a
//! long list.

use parking_lot::RwLock;

use hostbridge_core::TypeHash;

/// One remembered resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOverload {
    /// Run-time class per argument position; `None` for null.
    pub arg_types: Box<[Option<TypeHash>]>,
    pub index: usize,
}

impl ResolvedOverload {
    fn matches(&self, arg_types: &[Option<TypeHash>]) -> bool {
        *self.arg_types == *arg_types
    }
}

/// Append-only memo of an overload set.
#[derive(Debug)]
pub struct OverloadMemo {
    entries: RwLock<Vec<ResolvedOverload>>,
    capacity: usize,
}

impl OverloadMemo {
    /// A memo for a set with `candidates` overloads.
    pub fn new(candidates: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            capacity: candidates * 2,
        }
    }

    /// The remembered candidate index for an exact argument class vector.
    pub fn lookup(&self, arg_types: &[Option<TypeHash>]) -> Option<usize> {
        self.entries
            .read()
            .iter()
            .find(|entry| entry.matches(arg_types))
            .map(|entry| entry.index)
    }

    /// Remember a resolution. Returns false when the memo is full or the
    /// vector is already present.
    pub fn record(&self, arg_types: &[Option<TypeHash>], index: usize) -> bool {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity || entries.iter().any(|entry| entry.matches(arg_types)) {
            return false;
        }
        entries.push(ResolvedOverload {
            arg_types: arg_types.into(),
            index,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
