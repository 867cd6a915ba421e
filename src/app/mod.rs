//! Application orchestration: the pager loop, its scroll state and key input.

pub mod dashboard;
pub mod event;
pub mod scroll;
