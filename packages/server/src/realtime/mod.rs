//! Live room chat: the connection registry and the per-connection event loop.

pub mod hub;
pub mod session;

pub use hub::{ChatHub, ConnectionId};
