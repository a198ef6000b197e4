//! Gateway module - the conversation front door and its HTTP surface
//!
//! [`ChatHandler`] is usable on its own (the CLI drives it directly); the
//! axum server in [`server`] is compiled with the `server` feature.

mod handler;
#[cfg(feature = "server")]
pub mod server;

pub use handler::{ChatHandler, FRONT_DOOR_FAULT_REPLY};
