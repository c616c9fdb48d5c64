//! FILENAME: core/tablix-engine/src/lib.rs
//! Tablix (table) rendering subsystem.
//!
//! This crate turns evaluated dataset rows into a typed render table that
//! presentation collaborators (HTML, spreadsheet, PDF writers) consume.
//! It depends on `engine` for execution and on `rdl` for the layout.
//!
//! Layers:
//! - `view`: Render-ready output (WHAT we display)
//! - `engine`: Projection of evaluated rows onto the layout (HOW we map)
//! - `format`: Display strings for cell values
//! - `render`: Execution plus projection in one call

pub mod engine;
pub mod format;
pub mod render;
pub mod view;

pub use crate::engine::{project, TablixProjector};
pub use format::{format_number, format_value};
pub use render::{render_report, render_tablix};
pub use view::*;
