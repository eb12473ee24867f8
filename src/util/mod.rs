//! Small helpers shared by the core and the terminal front end.
//!
//! - **Text**: Unicode-aware width/truncation and control-character stripping
//!   for server-supplied titles
//! - **URLs**: validation of the server address and navigation targets

mod text;
mod server_url;

pub use self::text::{display_width, strip_control_chars, truncate_to_width};
pub use self::server_url::{parse_server_url, resolve_on_server, UrlValidationError};
