//! Terminal User Interface module.
//!
//! Renders the projected sidebar and maps keys onto the controller:
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - View rendering dispatch
//! - `sidebar` - Sidebar widget
//! - `status` - Status line widget
//! - `help` - Key reference overlay
//! - `helpers` - Task spawning utilities

mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod sidebar;
mod status;

pub use loop_runner::{run, Exit};
