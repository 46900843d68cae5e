//! Handler Registry: channel to live implementation, independent of wiring.
//!
//! Per channel the registry moves through
//! `Unbound -> Registered -> Attached -> Unbound`:
//!
//! - [`HandlerRegistry::register_handler`] may run before or after a
//!   dispatcher exists; with one attached, the handler is bound in the
//!   same call.
//! - [`HandlerRegistry::attach_dispatcher`] detaches the previous
//!   dispatcher (if any) and binds every registered handler, oldest
//!   registration first.
//! - Each registration carries a [`Generation`]; its [`Unregister`] handle
//!   only removes the binding while that generation is still the live one.
//! - Dispatcher `bind`/`unbind` calls run without the table lock held, in
//!   the same order as the table changes that caused them.

mod binding;


use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tether_common::{BridgeError, Generation, GenerationCounter};
use tracing::{debug, info, warn};

use crate::dispatcher::{Dispatcher, Handler};
use crate::schema::Schema;

pub use binding::{HandlerBinding, Unregister};

/// Lifecycle state of one channel inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Declared (or unknown), no implementation.
    Unbound,
    /// Implementation present, no dispatcher attached.
    Registered,
    /// Implementation bound to the live dispatcher.
    Attached,
}

pub(crate) struct RegistryState {
    pub(crate) bindings: HashMap<String, HandlerBinding>,
    pub(crate) dispatcher: Option<Arc<dyn Dispatcher>>,
    generations: GenerationCounter,
}

/// Registry state plus the lock that orders dispatcher wiring.
///
/// Every mutation holds `wiring` from the state change until the matching
/// `bind`/`unbind` calls return; `state` itself is only held for the table
/// update, so a dispatcher may query the registry from inside `bind`.
pub(crate) struct Shared {
    state: Mutex<RegistryState>,
    wiring: Mutex<()>,
}

impl Shared {
    pub(crate) fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn wiring(&self) -> MutexGuard<'_, ()> {
        self.wiring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Host-side handler registry.
///
/// Cloning yields another handle to the same registry, so independent
/// modules can each register their own handlers.
#[derive(Clone)]
pub struct HandlerRegistry {
    schema: Arc<Schema>,
    shared: Arc<Shared>,
}

impl HandlerRegistry {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            shared: Arc::new(Shared {
                state: Mutex::new(RegistryState {
                    bindings: HashMap::new(),
                    dispatcher: None,
                    generations: GenerationCounter::new(),
                }),
                wiring: Mutex::new(()),
            }),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Make `handler` the active implementation of `channel`.
    ///
    /// Supersedes any earlier registration on the same channel. Dispatcher
    /// state never makes this fail; in strict mode an undeclared channel
    /// is rejected with [`BridgeError::UnknownChannel`].
    pub fn register_handler(
        &self,
        channel: impl Into<String>,
        handler: Handler,
    ) -> Result<Unregister, BridgeError> {
        let channel = channel.into();
        if !self.schema.is_declared_call(&channel) {
            if self.schema.is_strict() {
                return Err(BridgeError::UnknownChannel(channel));
            }
            warn!(channel = %channel, "registering handler on undeclared channel");
        }

        let _wiring = self.shared.wiring();
        let (generation, superseded, dispatcher) = {
            let mut state = self.shared.state();
            let generation = state.generations.next();
            let binding = HandlerBinding::new(channel.clone(), Arc::clone(&handler), generation);
            let superseded = state
                .bindings
                .insert(channel.clone(), binding)
                .map(|previous| previous.generation());
            (generation, superseded, state.dispatcher.clone())
        };

        if let Some(superseded) = superseded {
            debug!(
                channel = %channel,
                superseded = %superseded,
                generation = %generation,
                "handler superseded"
            );
            if let Some(dispatcher) = &dispatcher {
                dispatcher.unbind(&channel);
            }
        }

        match dispatcher {
            Some(dispatcher) => {
                dispatcher.bind(&channel, handler);
                debug!(
                    channel = %channel,
                    generation = %generation,
                    "handler registered and bound"
                );
            }
            None => {
                debug!(channel = %channel, generation = %generation, "handler registered");
            }
        }

        Ok(Unregister::new(Arc::downgrade(&self.shared), channel, generation))
    }

    /// Attach the host dispatcher and bind every registered handler to it.
    ///
    /// A previously attached dispatcher is detached first: all of its
    /// routes are unbound before the new dispatcher receives any. Fails
    /// with [`BridgeError::DispatcherAttachment`] if `dispatcher` is closed.
    pub fn attach_dispatcher(&self, dispatcher: Arc<dyn Dispatcher>) -> Result<(), BridgeError> {
        if !dispatcher.is_open() {
            return Err(BridgeError::DispatcherAttachment(
                "dispatcher is closed".into(),
            ));
        }

        let _wiring = self.shared.wiring();
        let (previous, ordered) = {
            let mut state = self.shared.state();
            let previous = state.dispatcher.replace(Arc::clone(&dispatcher));
            (previous, ordered_bindings(&state.bindings))
        };

        if let Some(previous) = previous {
            unbind_all(&ordered, previous.as_ref());
            info!(channels = ordered.len(), "detached previous dispatcher");
        }

        for (channel, handler) in &ordered {
            dispatcher.bind(channel, Arc::clone(handler));
        }

        info!(channels = ordered.len(), "dispatcher attached");
        Ok(())
    }

    /// Detach the current dispatcher, unbinding every channel from it.
    pub fn detach_dispatcher(&self) -> Option<Arc<dyn Dispatcher>> {
        let _wiring = self.shared.wiring();
        let (previous, ordered) = {
            let mut state = self.shared.state();
            let previous = state.dispatcher.take()?;
            (previous, ordered_bindings(&state.bindings))
        };
        unbind_all(&ordered, previous.as_ref());
        info!(channels = ordered.len(), "dispatcher detached");
        Some(previous)
    }

    pub fn is_attached(&self) -> bool {
        self.shared.state().dispatcher.is_some()
    }

    pub fn channel_state(&self, channel: &str) -> ChannelState {
        let state = self.shared.state();
        match (state.bindings.contains_key(channel), state.dispatcher.is_some()) {
            (false, _) => ChannelState::Unbound,
            (true, false) => ChannelState::Registered,
            (true, true) => ChannelState::Attached,
        }
    }

    /// Generation of the live binding on `channel`, if any.
    pub fn active_generation(&self, channel: &str) -> Option<Generation> {
        self.shared
            .state()
            .bindings
            .get(channel)
            .map(HandlerBinding::generation)
    }

    /// Channels with a live binding, oldest registration first.
    pub fn registered_channels(&self) -> Vec<String> {
        let state = self.shared.state();
        ordered_bindings(&state.bindings)
            .into_iter()
            .map(|(channel, _)| channel)
            .collect()
    }
}

/// Live bindings as `(channel, handler)`, oldest registration first.
fn ordered_bindings(bindings: &HashMap<String, HandlerBinding>) -> Vec<(String, Handler)> {
    let mut ordered: Vec<&HandlerBinding> = bindings.values().collect();
    ordered.sort_by_key(|b| b.generation());
    ordered
        .into_iter()
        .map(|b| (b.channel().to_string(), Arc::clone(b.handler())))
        .collect()
}

fn unbind_all(ordered: &[(String, Handler)], dispatcher: &dyn Dispatcher) {
    for (channel, _) in ordered {
        dispatcher.unbind(channel);
    }
}
