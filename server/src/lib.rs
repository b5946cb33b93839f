// server/src/lib.rs
pub mod api;
pub mod auth;
pub mod channel;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod registry;
pub mod state;

#[cfg(test)]
mod testing;

pub use dispatcher::{Delivery, NotificationDispatcher};
pub use registry::{ChannelHandle, ChannelId, ConnectionRegistry};
pub use state::ServerState;
