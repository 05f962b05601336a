//! Socket.IO chat relay: one connection per session, typed subscriptions
//! and unread bookkeeping.

pub mod events;
pub mod protocol;
mod relay;
mod subscription;
pub mod transport;
mod unread;

pub use relay::{ChatRelay, ConnectionState};
pub use subscription::{Registry, Subscription, SubscriptionId};
pub use transport::{FrameSink, FrameStream, Transport, WsTransport};
pub use unread::UnreadCounts;
