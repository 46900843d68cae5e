//! The two seams where this layer meets a real transport.
//!
//! - [`ClientChannel`] is the boundary-crossing primitive bound to the
//!   client process: it can invoke a host channel and listen for events.
//! - [`EventTarget`] is a host-side destination reference that event
//!   messages are sent to.

use futures_util::future::BoxFuture;
use serde_json::Value;
use tether_common::{BridgeError, ListenerId};

use crate::events::Listener;

/// Positional arguments of one invocation or event.
pub type Args = Vec<Value>;

/// Client-side primitive that crosses the process boundary.
///
/// Implementations hold no host state; they only forward.
pub trait ClientChannel: Send + Sync {
    /// Invoke a host channel. The result passes through unmodified.
    fn invoke(&self, channel: &str, args: Args) -> BoxFuture<'static, Result<Value, BridgeError>>;

    /// Add a listener for an event channel.
    fn on(&self, channel: &str, listener: Listener) -> ListenerId;

    /// Remove exactly one listener. Returns `false` if it was already gone.
    fn remove_listener(&self, channel: &str, id: ListenerId) -> bool;
}

/// Destination of host-to-client event messages.
pub trait EventTarget {
    fn send(&self, channel: &str, args: Args) -> Result<(), BridgeError>;
}
