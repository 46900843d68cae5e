//! Typed request/response and event bridge between a host and a client.
//!
//! Provides:
//! - A fixed [`Schema`] of call and event channels with camelCase callable names
//! - A host [`HandlerRegistry`] that accepts handlers before or after a
//!   [`Dispatcher`] is attached
//! - A client [`ApiSurface`] and [`ClientInvoker`] with a stable call surface
//! - Ordered multi-subscriber events ([`EventSender`], [`Subscription`])
//! - In-process ([`LocalChannel`]) and message-based ([`MessageChannel`]) transports
//!
//! # Example
//!
//! ```ignore
//! let schema = Arc::new(Schema::builder("api").call("get-user", "(id) -> User").build()?);
//! let registry = HandlerRegistry::new(schema.clone());
//! registry.register_handler("get-user", handler(|args| async move { Ok(args[0].clone()) }))?;
//!
//! let dispatcher = IpcDispatcher::new();
//! registry.attach_dispatcher(Arc::new(dispatcher.clone()))?;
//!
//! let scope = GlobalScope::new();
//! scope.install(expose(&schema, Arc::new(LocalChannel::new(dispatcher)))?);
//! let user = ClientInvoker::new(&schema, scope).call("getUser", vec![json!("u1")]).await?;
//! ```

pub mod channel;
pub mod dispatcher;
pub mod events;
pub mod exposer;
pub mod invoker;
pub mod ipc;
pub mod local;
pub mod naming;
pub mod registry;
pub mod schema;
pub mod script;
#[cfg(feature = "webview")]
pub mod webview;

pub use channel::{Args, ClientChannel, EventTarget};
pub use dispatcher::{handler, typed_handler, Dispatcher, Handler, IpcDispatcher};
pub use events::{listener, EventSender, Listener, ListenerList, Subscription};
pub use exposer::{expose, ApiSurface, GlobalScope};
pub use invoker::{ClientInvoker, RemoteCall};
pub use ipc::{IpcMessage, MessageChannel, MessageTarget};
pub use local::LocalChannel;
pub use naming::{to_callable_name, to_subscribe_name};
pub use registry::{ChannelState, HandlerRegistry, Unregister};
pub use schema::{ChannelKind, ChannelSpec, Schema, SchemaBuilder};
pub use script::client_init_script;
