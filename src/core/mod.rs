//! Core engine: items, column layout and TTL-cached blocks.
//!
//! Nothing in this module depends on any TUI or rendering crate.

pub mod block;
pub mod item;
pub mod layout;
