//! Use-case services over the selected store backend.
//!
//! # Responsibility
//! - Orchestrate store calls into view-level operations.
//! - Keep the view layer decoupled from backend selection.

pub mod board_service;
