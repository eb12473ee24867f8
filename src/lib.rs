//! Client core for a SUPRSS server.
//!
//! Keeps the feed and collection lists consistent with the server while the
//! user deletes feeds behind a confirmation step, and recovers from expired
//! sessions by sending the user back through the server's login flow.
//!
//! - [`cache`]: stale-while-revalidate entity cache
//! - [`mutation`]: delete coordination with per-feed in-flight tracking
//! - [`session`]: 401 detection and the delayed login redirect
//! - [`confirm`]: the confirm-then-commit state machine
//! - [`projection`]: pure derivation of the sidebar view
//! - [`controller`]: the facade front ends talk to

pub mod api;
pub mod cache;
pub mod config;
pub mod confirm;
pub mod controller;
pub mod identity;
pub mod mutation;
pub mod navigation;
pub mod notify;
pub mod projection;
pub mod session;
pub mod util;

pub use controller::{ControllerOptions, FeedController};
