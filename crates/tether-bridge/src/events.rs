//! Event Bus Bridge: ordered fan-out on the client, typed sends on the host.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tether_common::{BridgeError, ListenerId};
use tracing::{debug, warn};

use crate::channel::{Args, ClientChannel, EventTarget};
use crate::schema::Schema;

/// Callback fired for each event message on one channel.
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&[Value]) + Send + Sync + 'static,
{
    Arc::new(f)
}

// =============================================================================
// LISTENER LISTS
// =============================================================================

/// Ordered subscribers of a single event channel.
///
/// Each subscription gets its own id, so the same callback added twice is
/// two independent entries.
#[derive(Clone, Default)]
pub struct ListenerList {
    entries: Arc<Mutex<Vec<(ListenerId, Listener)>>>,
}

impl ListenerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        self.lock().push((id, listener));
        id
    }

    /// Remove one entry. Returns `false` if it was not present.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.lock();
        match entries.iter().position(|(eid, _)| *eid == id) {
            Some(idx) => {
                entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Call every listener in subscription order and return how many ran.
    ///
    /// Listeners run on a snapshot taken before the first call, with no
    /// lock held; subscribing or unsubscribing from inside a listener
    /// takes effect on the next emit.
    pub fn emit(&self, args: &[Value]) -> usize {
        let snapshot: Vec<Listener> = self.lock().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in &snapshot {
            listener(args);
        }
        snapshot.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Listener lists keyed by event channel, as kept by a client transport.
#[derive(Clone, Default)]
pub struct ListenerMap {
    channels: Arc<Mutex<HashMap<String, ListenerList>>>,
}

impl ListenerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, channel: &str, listener: Listener) -> ListenerId {
        self.list(channel).add(listener)
    }

    pub fn remove(&self, channel: &str, id: ListenerId) -> bool {
        let list = self.lock().get(channel).cloned();
        list.is_some_and(|l| l.remove(id))
    }

    /// Fire the listeners of `channel` synchronously. Returns how many ran.
    pub fn emit(&self, channel: &str, args: &[Value]) -> usize {
        let list = self.lock().get(channel).cloned();
        match list {
            Some(list) => list.emit(args),
            None => 0,
        }
    }

    pub fn count(&self, channel: &str) -> usize {
        self.lock().get(channel).map_or(0, ListenerList::len)
    }

    fn list(&self, channel: &str) -> ListenerList {
        self.lock().entry(channel.to_string()).or_default().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ListenerList>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

/// Handle returned by a subscribe function.
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    channel: String,
    id: ListenerId,
    primitive: Arc<dyn ClientChannel>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(channel: String, id: ListenerId, primitive: Arc<dyn ClientChannel>) -> Self {
        Self {
            channel,
            id,
            primitive,
            active: AtomicBool::new(true),
        }
    }

    /// Remove this subscription's listener and no other. Idempotent.
    pub fn unsubscribe(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            self.primitive.remove_listener(&self.channel, self.id);
            debug!(channel = %self.channel, "listener unsubscribed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// HOST-SIDE SENDER
// =============================================================================

/// Sends one declared event to a destination.
pub type SendFn = Arc<dyn Fn(&dyn EventTarget, Args) -> Result<(), BridgeError> + Send + Sync>;

/// Host-side senders, one per declared event callable, built once.
#[derive(Clone)]
pub struct EventSender {
    schema: Arc<Schema>,
    senders: BTreeMap<String, SendFn>,
}

impl EventSender {
    pub fn new(schema: Arc<Schema>) -> Self {
        let senders = schema
            .events()
            .iter()
            .map(|spec| {
                let channel = spec.channel.clone();
                let send: SendFn = Arc::new(move |target: &dyn EventTarget, args: Args| {
                    debug!(channel = %channel, args = args.len(), "sending event");
                    target.send(&channel, args)
                });
                (spec.callable.clone(), send)
            })
            .collect();
        Self { schema, senders }
    }

    /// Send the event declared under `callable` to `target`.
    pub fn send(
        &self,
        callable: &str,
        target: &dyn EventTarget,
        args: Args,
    ) -> Result<(), BridgeError> {
        let send = self
            .senders
            .get(callable)
            .ok_or_else(|| BridgeError::UnknownChannel(callable.to_string()))?;
        send(target, args)
    }

    /// Send by wire-level channel name.
    ///
    /// In loose mode an undeclared channel is sent anyway with a warning.
    pub fn send_channel(
        &self,
        channel: &str,
        target: &dyn EventTarget,
        args: Args,
    ) -> Result<(), BridgeError> {
        if let Some(spec) = self.schema.events().by_channel(channel) {
            return self.send(&spec.callable, target, args);
        }
        if self.schema.is_strict() {
            return Err(BridgeError::UnknownChannel(channel.to_string()));
        }
        warn!(channel = %channel, "sending event on undeclared channel");
        target.send(channel, args)
    }

    pub fn get(&self, callable: &str) -> Option<&SendFn> {
        self.senders.get(callable)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.senders.keys().map(String::as_str)
    }
}
