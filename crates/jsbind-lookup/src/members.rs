//! Lazily sorted member arrays.
//!
//! A type's fields and methods start as an unsorted array straight from the
//! declaration, get sorted once so they can be binary searched, and become
//! complete once every member's signature has been resolved. A complete
//! table hands out the same `Arc<[T]>` forever.

use std::cmp::Ordering;
use std::sync::Arc;

/// Ordered lifecycle of a member array. States only advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberState {
    Unresolved,
    Sorted,
    Complete,
}

/// A member array together with its lifecycle state.
#[derive(Clone, Debug)]
pub struct MemberTable<T> {
    state: MemberState,
    items: Arc<[T]>,
}

impl<T: Copy> Default for MemberTable<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Copy> MemberTable<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            state: MemberState::Unresolved,
            items: items.into(),
        }
    }

    /// A table with nothing to resolve.
    pub fn complete_empty() -> Self {
        Self {
            state: MemberState::Complete,
            items: Arc::from(Vec::new()),
        }
    }

    #[inline]
    pub fn state(&self) -> MemberState {
        self.state
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.state == MemberState::Complete
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.state >= MemberState::Sorted
    }

    #[inline]
    pub fn items(&self) -> &Arc<[T]> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sort with `compare` unless already sorted.
    pub(crate) fn sort_by(&mut self, mut compare: impl FnMut(&T, &T) -> Ordering) {
        if self.is_sorted() {
            return;
        }
        let mut items = self.items.to_vec();
        items.sort_by(|a, b| compare(a, b));
        self.items = items.into();
        self.state = MemberState::Sorted;
    }

    /// Replace the contents of a table that is not yet complete. The new
    /// items must already be sorted if `sorted` is true.
    pub(crate) fn replace(&mut self, items: Vec<T>, sorted: bool) {
        if self.is_complete() {
            return;
        }
        self.items = items.into();
        self.state = if sorted {
            MemberState::Sorted
        } else {
            MemberState::Unresolved
        };
    }

    /// Append members to a table that is not yet complete. Sorted order is
    /// lost and will be re-established on the next sort.
    pub(crate) fn extend(&mut self, extra: &[T]) {
        if self.is_complete() || extra.is_empty() {
            return;
        }
        let mut items = self.items.to_vec();
        items.extend_from_slice(extra);
        self.items = items.into();
        self.state = MemberState::Unresolved;
    }

    /// Freeze the table. `keep` filters out members whose resolution failed.
    pub(crate) fn complete(&mut self, mut keep: impl FnMut(&T) -> bool) -> Arc<[T]> {
        if !self.is_complete() {
            let kept: Vec<bool> = self.items.iter().map(|item| keep(item)).collect();
            if kept.contains(&false) {
                let items: Vec<T> = self
                    .items
                    .iter()
                    .zip(kept)
                    .filter_map(|(item, keep)| keep.then_some(*item))
                    .collect();
                self.items = items.into();
            }
            self.state = MemberState::Complete;
        }
        Arc::clone(&self.items)
    }
}

// =============================================================================
// Binary Search
// =============================================================================

/// Index of the member named `name` in a name-sorted slice.
pub fn binary_search_by_name<T, K: Ord>(items: &[T], name: K, key: impl Fn(&T) -> K) -> Option<usize> {
    items.binary_search_by(|item| key(item).cmp(&name)).ok()
}

/// Inclusive `(low, high)` span of all members whose selector equals
/// `selector` in a selector-sorted slice.
pub fn find_method_range<T, K: Ord>(
    items: &[T],
    selector: K,
    key: impl Fn(&T) -> K,
) -> Option<(usize, usize)> {
    let low = items.partition_point(|item| key(item) < selector);
    let high = items.partition_point(|item| key(item) <= selector);
    if low < high {
        Some((low, high - 1))
    } else {
        None
    }
}

#[cfg(test)]
#[path = "../tests/members_tests.rs"]
mod tests;
