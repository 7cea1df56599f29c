//! UI module - handles all TUI rendering
//!
//! Structure:
//! - `draw.rs` - Filter bar, grid and status bar
//! - `theme.rs` - Color themes and presets
//! - `layout.rs` - Column widths and horizontal scrolling

mod draw;
pub mod layout;
pub mod theme;

pub use draw::draw;
