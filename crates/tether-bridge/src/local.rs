//! In-process transport linking a client surface straight to a dispatcher.
//!
//! Useful for tests, demos, and hosts that embed the client in-process.
//! The same [`LocalChannel`] is the client's boundary primitive and the
//! host's [`EventTarget`] for that client.

use futures_util::future::BoxFuture;
use serde_json::Value;
use tether_common::{BridgeError, ListenerId};

use crate::channel::{Args, ClientChannel, EventTarget};
use crate::dispatcher::IpcDispatcher;
use crate::events::{Listener, ListenerMap};

#[derive(Clone)]
pub struct LocalChannel {
    dispatcher: IpcDispatcher,
    listeners: ListenerMap,
}

impl LocalChannel {
    pub fn new(dispatcher: IpcDispatcher) -> Self {
        Self {
            dispatcher,
            listeners: ListenerMap::new(),
        }
    }

    pub fn dispatcher(&self) -> &IpcDispatcher {
        &self.dispatcher
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.listeners.count(channel)
    }
}

impl ClientChannel for LocalChannel {
    fn invoke(&self, channel: &str, args: Args) -> BoxFuture<'static, Result<Value, BridgeError>> {
        self.dispatcher.dispatch(channel, args)
    }

    fn on(&self, channel: &str, listener: Listener) -> ListenerId {
        self.listeners.on(channel, listener)
    }

    fn remove_listener(&self, channel: &str, id: ListenerId) -> bool {
        self.listeners.remove(channel, id)
    }
}

impl EventTarget for LocalChannel {
    /// Fires the client's listeners synchronously, in subscription order.
    fn send(&self, channel: &str, args: Args) -> Result<(), BridgeError> {
        self.listeners.emit(channel, &args);
        Ok(())
    }
}
