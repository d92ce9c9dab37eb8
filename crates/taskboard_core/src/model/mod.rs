//! Domain model for the project/task board.
//!
//! # Responsibility
//! - Define the canonical records the store backends persist and emit.
//! - Keep order-key arithmetic in one place shared by both backends.
//!
//! # Invariants
//! - Every entity is identified by an opaque string id, unique per
//!   collection.
//! - Only the relative order of `order` keys matters; gaps are expected.

pub mod board;
pub mod ordering;
