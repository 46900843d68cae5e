//! Host-side dispatch: handler functions and the dispatcher they bind to.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{self, BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tether_common::{BridgeError, ImplementationError};
use tracing::{debug, warn};

use crate::channel::Args;

pub type HandlerFuture = BoxFuture<'static, Result<Value, ImplementationError>>;

/// A host implementation of one call channel.
pub type Handler = Arc<dyn Fn(Args) -> HandlerFuture + Send + Sync>;

/// Wrap an async function over raw arguments as a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ImplementationError>> + Send + 'static,
{
    Arc::new(move |args| f(args).boxed())
}

/// Wrap an async function over a typed argument tuple as a [`Handler`].
///
/// The positional arguments are deserialized as `A` (use a tuple such as
/// `(String,)` for a single argument) and the result is serialized back.
/// Argument mismatches fail the invocation with an [`ImplementationError`].
pub fn typed_handler<A, R, F, Fut>(f: F) -> Handler
where
    A: DeserializeOwned,
    R: Serialize,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, ImplementationError>> + Send + 'static,
{
    Arc::new(move |args: Args| {
        let no_args = args.is_empty();
        let parsed = match serde_json::from_value::<A>(Value::Array(args)) {
            Ok(parsed) => Ok(parsed),
            // `()` and `Option<_>` read "no arguments" as null.
            Err(_) if no_args => serde_json::from_value::<A>(Value::Null),
            Err(e) => Err(e),
        };
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                return future::ready(Err(ImplementationError::new(format!(
                    "invalid arguments: {e}"
                ))))
                .boxed();
            }
        };
        let fut = f(parsed);
        async move {
            let result = fut.await?;
            serde_json::to_value(result).map_err(|e| {
                ImplementationError::new(format!("failed to serialize result: {e}"))
            })
        }
        .boxed()
    })
}

/// The host process's attachment point for incoming invocations.
///
/// A registry calls `bind` and `unbind` without holding its table lock, so
/// an implementation may read registry state from inside them. It must not
/// register, unregister, attach, or detach on the same registry there.
pub trait Dispatcher: Send + Sync {
    /// Route `channel` to `handler`, replacing any previous route.
    fn bind(&self, channel: &str, handler: Handler);

    /// Stop routing `channel`. Unbinding an unbound channel is a no-op.
    fn unbind(&self, channel: &str);

    /// Whether the dispatcher can still accept bindings.
    fn is_open(&self) -> bool {
        true
    }
}

/// In-process dispatcher: a channel to handler table.
///
/// Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct IpcDispatcher {
    inner: Arc<DispatcherInner>,
}

#[derive(Default)]
struct DispatcherInner {
    routes: Mutex<HashMap<String, Handler>>,
    closed: AtomicBool,
}

impl IpcDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoke the handler bound to `channel`.
    ///
    /// The handler is looked up now and awaited without holding any lock,
    /// so concurrent invocations never wait on one another. A channel with
    /// no route fails with [`BridgeError::NotRegistered`].
    pub fn dispatch(
        &self,
        channel: &str,
        args: Args,
    ) -> BoxFuture<'static, Result<Value, BridgeError>> {
        let route = self.routes().get(channel).cloned();
        match route {
            Some(handler) => {
                debug!(channel = %channel, args = args.len(), "dispatching invocation");
                handler(args).map(|r| r.map_err(BridgeError::from)).boxed()
            }
            None => {
                warn!(channel = %channel, "invocation rejected: no handler registered");
                future::ready(Err(BridgeError::NotRegistered(channel.to_string()))).boxed()
            }
        }
    }

    pub fn has_route(&self, channel: &str) -> bool {
        self.routes().contains_key(channel)
    }

    /// Bound channel names, sorted.
    pub fn routes_snapshot(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routes().keys().cloned().collect();
        names.sort();
        names
    }

    /// Drop every route and refuse future attachment.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.routes().clear();
        debug!("dispatcher closed");
    }

    fn routes(&self) -> std::sync::MutexGuard<'_, HashMap<String, Handler>> {
        self.inner
            .routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Dispatcher for IpcDispatcher {
    fn bind(&self, channel: &str, handler: Handler) {
        self.routes().insert(channel.to_string(), handler);
    }

    fn unbind(&self, channel: &str) {
        self.routes().remove(channel);
    }

    fn is_open(&self) -> bool {
        !self.inner.closed.load(Ordering::SeqCst)
    }
}
