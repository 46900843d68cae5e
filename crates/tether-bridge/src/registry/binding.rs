use std::fmt;
use std::sync::Weak;

use tether_common::Generation;
use tracing::debug;

use crate::dispatcher::Handler;

use super::Shared;

/// The live implementation of one channel.
#[derive(Clone)]
pub struct HandlerBinding {
    channel: String,
    handler: Handler,
    generation: Generation,
}

impl HandlerBinding {
    pub(crate) fn new(channel: String, handler: Handler, generation: Generation) -> Self {
        Self {
            channel,
            handler,
            generation,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("channel", &self.channel)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Removes one registration, and only that one.
///
/// Holds a weak reference, so it never keeps a registry alive. Dropping it
/// leaves the handler registered.
#[derive(Clone)]
pub struct Unregister {
    shared: Weak<Shared>,
    channel: String,
    generation: Generation,
}

impl Unregister {
    pub(crate) fn new(
        shared: Weak<Shared>,
        channel: String,
        generation: Generation,
    ) -> Self {
        Self {
            shared,
            channel,
            generation,
        }
    }

    /// Remove the binding if this registration is still the active one.
    ///
    /// Returns `true` when a binding was removed. Calling it again, or
    /// after a newer registration superseded this one, is a no-op.
    pub fn unregister(&self) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };

        let _wiring = shared.wiring();
        let dispatcher = {
            let mut state = shared.state();
            let is_live = state
                .bindings
                .get(&self.channel)
                .is_some_and(|b| b.generation() == self.generation);
            if !is_live {
                debug!(
                    channel = %self.channel,
                    generation = %self.generation,
                    "stale unregister ignored"
                );
                return false;
            }
            state.bindings.remove(&self.channel);
            state.dispatcher.clone()
        };

        if let Some(dispatcher) = dispatcher {
            dispatcher.unbind(&self.channel);
        }
        debug!(channel = %self.channel, generation = %self.generation, "handler unregistered");
        true
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Debug for Unregister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unregister")
            .field("channel", &self.channel)
            .field("generation", &self.generation)
            .finish()
    }
}
