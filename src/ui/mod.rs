//! UI / rendering layer: everything that touches Ratatui.
//!
//! This layer takes laid-out items from the core and turns them into cells
//! on the terminal.  No data fetching happens here.

pub mod palette;
pub mod surface;
pub mod theme;
