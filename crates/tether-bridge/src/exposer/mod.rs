//! Bridge Exposer: the composite client-side surface.
//!
//! [`expose`] turns a schema plus a boundary-crossing primitive into an
//! [`ApiSurface`] holding one call wrapper per call callable and one
//! `on*` subscribe function per event. The surface only captures the
//! primitive and channel names, never host state.

mod scope;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use tether_common::{BridgeError, ConfigError};
use tracing::debug;

use crate::channel::{Args, ClientChannel};
use crate::events::{Listener, Subscription};
use crate::schema::Schema;

pub use scope::GlobalScope;

/// Forwards one call callable to its wire channel.
#[derive(Clone)]
pub struct CallWrapper {
    channel: String,
    primitive: Arc<dyn ClientChannel>,
}

impl CallWrapper {
    pub fn call(&self, args: Args) -> BoxFuture<'static, Result<Value, BridgeError>> {
        self.primitive.invoke(&self.channel, args)
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// Subscribes listeners to one event channel.
#[derive(Clone)]
pub struct SubscribeFn {
    channel: String,
    primitive: Arc<dyn ClientChannel>,
}

impl SubscribeFn {
    pub fn subscribe(&self, listener: Listener) -> Subscription {
        let id = self.primitive.on(&self.channel, listener);
        debug!(channel = %self.channel, "listener subscribed");
        Subscription::new(self.channel.clone(), id, Arc::clone(&self.primitive))
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

/// The object installed across the trust boundary.
///
/// Flat access (`surface.call("getUser", ..)`) and namespaced access
/// (`surface.invoke().call("getUser", ..)`) are two views of one table.
pub struct ApiSurface {
    bridge_key: String,
    calls: BTreeMap<String, CallWrapper>,
    subscribers: BTreeMap<String, SubscribeFn>,
}

impl ApiSurface {
    pub fn bridge_key(&self) -> &str {
        &self.bridge_key
    }

    /// Invoke a call callable; an undeclared name fails with `UnknownChannel`.
    pub fn call(
        &self,
        callable: &str,
        args: Args,
    ) -> BoxFuture<'static, Result<Value, BridgeError>> {
        call_in(&self.calls, callable, args)
    }

    pub fn get(&self, callable: &str) -> Option<&CallWrapper> {
        self.calls.get(callable)
    }

    /// Namespaced view over the same call wrappers.
    pub fn invoke(&self) -> InvokeNamespace<'_> {
        InvokeNamespace { calls: &self.calls }
    }

    /// Subscribe through an `on*` function, e.g. `"onUserUpdated"`.
    pub fn subscribe(&self, name: &str, listener: Listener) -> Result<Subscription, BridgeError> {
        let subscriber = self
            .subscribers
            .get(name)
            .ok_or_else(|| BridgeError::UnknownChannel(name.to_string()))?;
        Ok(subscriber.subscribe(listener))
    }

    pub fn subscriber(&self, name: &str) -> Option<&SubscribeFn> {
        self.subscribers.get(name)
    }

    pub fn call_names(&self) -> impl Iterator<Item = &str> {
        self.calls.keys().map(String::as_str)
    }

    pub fn subscribe_names(&self) -> impl Iterator<Item = &str> {
        self.subscribers.keys().map(String::as_str)
    }
}

impl fmt::Debug for ApiSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSurface")
            .field("bridge_key", &self.bridge_key)
            .field("calls", &self.calls.keys().collect::<Vec<_>>())
            .field("subscribers", &self.subscribers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Borrowed `invoke` namespace of an [`ApiSurface`].
#[derive(Clone, Copy)]
pub struct InvokeNamespace<'a> {
    calls: &'a BTreeMap<String, CallWrapper>,
}

impl<'a> InvokeNamespace<'a> {
    pub fn call(
        &self,
        callable: &str,
        args: Args,
    ) -> BoxFuture<'static, Result<Value, BridgeError>> {
        call_in(self.calls, callable, args)
    }

    pub fn get(&self, callable: &str) -> Option<&'a CallWrapper> {
        self.calls.get(callable)
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> {
        self.calls.keys().map(String::as_str)
    }
}

fn call_in(
    calls: &BTreeMap<String, CallWrapper>,
    callable: &str,
    args: Args,
) -> BoxFuture<'static, Result<Value, BridgeError>> {
    match calls.get(callable) {
        Some(wrapper) => wrapper.call(args),
        None => future::ready(Err(BridgeError::UnknownChannel(callable.to_string()))).boxed(),
    }
}

/// Build the client-facing surface over `primitive`.
///
/// Fails with [`ConfigError::NoChannels`] rather than returning an empty
/// surface.
pub fn expose(
    schema: &Schema,
    primitive: Arc<dyn ClientChannel>,
) -> Result<ApiSurface, BridgeError> {
    if schema.calls().is_empty() && schema.events().is_empty() {
        return Err(ConfigError::NoChannels.into());
    }

    let calls = schema
        .calls()
        .iter()
        .map(|spec| {
            let wrapper = CallWrapper {
                channel: spec.channel.clone(),
                primitive: Arc::clone(&primitive),
            };
            (spec.callable.clone(), wrapper)
        })
        .collect();

    let subscribers = schema
        .subscribe_names()
        .map(|(name, spec)| {
            let subscriber = SubscribeFn {
                channel: spec.channel.clone(),
                primitive: Arc::clone(&primitive),
            };
            (name, subscriber)
        })
        .collect();

    let surface = ApiSurface {
        bridge_key: schema.bridge_key().to_string(),
        calls,
        subscribers,
    };
    debug!(
        bridge_key = %surface.bridge_key,
        calls = surface.calls.len(),
        subscribers = surface.subscribers.len(),
        "api surface built"
    );
    Ok(surface)
}
