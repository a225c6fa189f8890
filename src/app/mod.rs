//! Application layer between the host runtime and the store.
//!
//! ```text
//! transport / UI → Event → handle_event → TorrentStore mutations → Action → host
//! ```
//!
//! - [`actions`]: side effects the host should perform
//! - [`handler`]: event routing and selection change tracking

pub mod actions;
pub mod handler;

pub use actions::Action;
pub use handler::{handle_event, Event};
