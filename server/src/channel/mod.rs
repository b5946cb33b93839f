// server/src/channel/mod.rs
pub mod routing;
pub mod session;

pub use routing::routes;
pub use session::{ChannelSessionActor, PushNotification, SessionHandle};
