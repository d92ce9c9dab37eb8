//! Order-key arithmetic shared by both store backends.
//!
//! # Responsibility
//! - Compute order keys for create (`scope max + 1000`) and reorder
//!   (`(position + 1) * 1000`).
//! - Provide the snapshot sort and the drag-end index move.
//!
//! # Invariants
//! - Assigned order keys are always positive multiples of [`ORDER_STEP`].
//! - Snapshot sorting is stable: equal keys keep insertion order.

use crate::model::board::{Project, Task};

/// Gap between adjacent order keys.
pub const ORDER_STEP: i64 = 1000;

/// Anything carrying an order key and sortable into a snapshot.
pub trait Ordered {
    fn order_key(&self) -> i64;
}

impl Ordered for Project {
    fn order_key(&self) -> i64 {
        self.order
    }
}

impl Ordered for Task {
    fn order_key(&self) -> i64 {
        self.order
    }
}

/// Order key for a new entity appended to a scope.
///
/// The fold is seeded with zero, so the first entity in an empty scope gets
/// `ORDER_STEP` and negative stray keys never pull the result below it.
pub fn next_order<I>(existing: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    existing.into_iter().fold(0, i64::max) + ORDER_STEP
}

/// Order key for the entity at `position` after an explicit reorder.
pub fn position_order(position: usize) -> i64 {
    (position as i64 + 1) * ORDER_STEP
}

/// Sorts a snapshot ascending by order key (stable).
pub fn sort_by_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(Ordered::order_key);
}

/// Moves the element at `old_index` to `new_index`, shifting the rest.
///
/// Out-of-range indices leave the slice untouched; callers treat that as a
/// cancelled drag.
pub fn array_move<T>(items: &mut Vec<T>, old_index: usize, new_index: usize) {
    if old_index >= items.len() || new_index >= items.len() || old_index == new_index {
        return;
    }
    let moved = items.remove(old_index);
    items.insert(new_index, moved);
}
