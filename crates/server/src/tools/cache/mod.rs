//! Cache partition MCP tools.
//!
//! These go through the controller's message channel, so they observe the
//! same ordering a page-side sender would.

pub mod clear;
pub mod status;
pub mod update;

pub use clear::clear_impl;
pub use status::status_impl;
pub use update::{CacheUpdateParams, update_impl};
