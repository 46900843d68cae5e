//! Wire envelope for bridges that cross a real string channel.
//!
//! Messages flow in both directions as JSON text:
//! - **client -> host**: `{"kind":"invoke","id":..,"channel":..,"args":[..]}`
//! - **host -> client**: `{"kind":"reply","id":..,"result":{"Ok":..}}` or
//!   `{"kind":"event","channel":..,"args":[..]}`
//!
//! Payloads are passed through as opaque JSON values.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tether_common::{new_correlation_id, BridgeError, ListenerId};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::channel::{Args, ClientChannel, EventTarget};
use crate::dispatcher::IpcDispatcher;
use crate::events::{Listener, ListenerMap};

/// One message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IpcMessage {
    Invoke {
        id: String,
        channel: String,
        args: Args,
    },
    Reply {
        id: String,
        result: Result<Value, BridgeError>,
    },
    Event {
        channel: String,
        args: Args,
    },
}

impl IpcMessage {
    /// Parse a message from raw JSON text.
    pub fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn to_json(&self) -> Result<String, BridgeError> {
        serde_json::to_string(self)
            .map_err(|e| BridgeError::Transport(format!("failed to encode message: {e}")))
    }
}

/// Delivers encoded messages to the other side.
pub type Sink = Arc<dyn Fn(String) -> Result<(), BridgeError> + Send + Sync>;

type Pending = HashMap<String, oneshot::Sender<Result<Value, BridgeError>>>;

// =============================================================================
// CLIENT SIDE
// =============================================================================

/// Client primitive over a string sink.
///
/// Outgoing invocations are correlated by id; feed every message from the
/// host into [`MessageChannel::receive`].
pub struct MessageChannel {
    sink: Sink,
    pending: Mutex<Pending>,
    listeners: ListenerMap,
}

impl MessageChannel {
    pub fn new(sink: Sink) -> Self {
        Self {
            sink,
            pending: Mutex::new(HashMap::new()),
            listeners: ListenerMap::new(),
        }
    }

    /// Handle one message from the host: settle a reply or fan out an event.
    pub fn receive(&self, raw: &str) {
        let Some(msg) = IpcMessage::from_json(raw) else {
            warn!(body_len = raw.len(), "IPC message rejected: failed to parse");
            return;
        };

        match msg {
            IpcMessage::Reply { id, result } => match self.pending().remove(&id) {
                Some(tx) => {
                    // The caller may have stopped waiting; nothing to do then.
                    let _ = tx.send(result);
                }
                None => warn!(id = %id, "reply for unknown invocation"),
            },
            IpcMessage::Event { channel, args } => {
                let fired = self.listeners.emit(&channel, &args);
                debug!(channel = %channel, listeners = fired, "event delivered");
            }
            IpcMessage::Invoke { channel, .. } => {
                warn!(
                    channel = %channel,
                    "IPC message rejected: client does not serve invocations"
                );
            }
        }
    }

    /// Invocations still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    fn pending(&self) -> std::sync::MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClientChannel for MessageChannel {
    fn invoke(&self, channel: &str, args: Args) -> BoxFuture<'static, Result<Value, BridgeError>> {
        let id = new_correlation_id();
        let encoded = IpcMessage::Invoke {
            id: id.clone(),
            channel: channel.to_string(),
            args,
        }
        .to_json();
        let encoded = match encoded {
            Ok(encoded) => encoded,
            Err(e) => return future::ready(Err(e)).boxed(),
        };

        let (tx, rx) = oneshot::channel();
        self.pending().insert(id.clone(), tx);

        // The sink may deliver the reply synchronously, so no lock is held here.
        if let Err(e) = (self.sink)(encoded) {
            self.pending().remove(&id);
            return future::ready(Err(e)).boxed();
        }

        async move {
            rx.await
                .unwrap_or_else(|_| Err(BridgeError::Transport("reply channel closed".into())))
        }
        .boxed()
    }

    fn on(&self, channel: &str, listener: Listener) -> ListenerId {
        self.listeners.on(channel, listener)
    }

    fn remove_listener(&self, channel: &str, id: ListenerId) -> bool {
        self.listeners.remove(channel, id)
    }
}

// =============================================================================
// HOST SIDE
// =============================================================================

/// Host-side destination that encodes events onto a sink.
#[derive(Clone)]
pub struct MessageTarget {
    sink: Sink,
}

impl MessageTarget {
    pub fn new(sink: Sink) -> Self {
        Self { sink }
    }
}

impl EventTarget for MessageTarget {
    fn send(&self, channel: &str, args: Args) -> Result<(), BridgeError> {
        let encoded = IpcMessage::Event {
            channel: channel.to_string(),
            args,
        }
        .to_json()?;
        (self.sink)(encoded)
    }
}

impl IpcDispatcher {
    /// Serve one raw message from a client.
    ///
    /// Returns `None` for anything that is not a well-formed invocation;
    /// otherwise a future yielding the encoded reply.
    pub fn handle_message(&self, raw: &str) -> Option<BoxFuture<'static, String>> {
        let msg = match IpcMessage::from_json(raw) {
            Some(msg) => msg,
            None => {
                warn!(body_len = raw.len(), "IPC message rejected: failed to parse");
                return None;
            }
        };

        let IpcMessage::Invoke { id, channel, args } = msg else {
            warn!("IPC message rejected: host only serves invocations");
            return None;
        };

        let reply = self.dispatch(&channel, args);
        Some(
            async move {
                let result = reply.await;
                let msg = IpcMessage::Reply { id, result };
                msg.to_json().unwrap_or_else(|e| {
                    warn!(error = %e, "failed to encode reply");
                    encode_failure(&msg, e)
                })
            }
            .boxed(),
        )
    }
}

fn encode_failure(msg: &IpcMessage, error: BridgeError) -> String {
    let id = match msg {
        IpcMessage::Reply { id, .. } => id.clone(),
        _ => String::new(),
    };
    serde_json::json!({
        "kind": "reply",
        "id": id,
        "result": { "Err": { "type": "Transport", "data": error.to_string() } },
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{handler, Dispatcher};
    use crate::events::listener;
    use serde_json::json;

    fn outbox() -> (Sink, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&sent);
        let sink: Sink = Arc::new(move |msg| {
            log.lock().unwrap().push(msg);
            Ok(())
        });
        (sink, sent)
    }

    #[test]
    fn envelope_shape() {
        let msg = IpcMessage::Invoke {
            id: "1".into(),
            channel: "get-user".into(),
            args: vec![json!("u1")],
        };
        let value: Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"kind": "invoke", "id": "1", "channel": "get-user", "args": ["u1"]})
        );

        let reply = IpcMessage::Reply {
            id: "1".into(),
            result: Ok(json!(5)),
        };
        let value: Value = serde_json::from_str(&reply.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"kind": "reply", "id": "1", "result": {"Ok": 5}}));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(IpcMessage::from_json("not json").is_none());
        assert!(IpcMessage::from_json(r#"{"kind":"nope"}"#).is_none());
    }

    #[tokio::test]
    async fn invoke_settles_on_reply() {
        let (sink, sent) = outbox();
        let client = MessageChannel::new(sink);

        let pending = client.invoke("ping", vec![]);
        assert_eq!(client.pending_count(), 1);

        let raw = sent.lock().unwrap()[0].clone();
        let Some(IpcMessage::Invoke { id, channel, .. }) = IpcMessage::from_json(&raw) else {
            panic!("expected invoke, got {raw}");
        };
        assert_eq!(channel, "ping");

        client.receive(
            &IpcMessage::Reply {
                id,
                result: Ok(json!("pong")),
            }
            .to_json()
            .unwrap(),
        );
        assert_eq!(pending.await.unwrap(), json!("pong"));
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn sink_failure_fails_the_call() {
        let sink: Sink = Arc::new(|_| Err(BridgeError::Transport("closed".into())));
        let client = MessageChannel::new(sink);

        let err = client.invoke("ping", vec![]).await.unwrap_err();
        assert_eq!(err, BridgeError::Transport("closed".into()));
        assert_eq!(client.pending_count(), 0);
    }

    #[tokio::test]
    async fn host_serves_invocations_end_to_end() {
        let dispatcher = IpcDispatcher::new();
        dispatcher.bind(
            "add",
            handler(|args| async move {
                let sum: i64 = args.iter().filter_map(Value::as_i64).sum();
                Ok(json!(sum))
            }),
        );

        let (sink, sent) = outbox();
        let client = MessageChannel::new(sink);
        let pending = client.invoke("add", vec![json!(2), json!(3)]);

        let request = sent.lock().unwrap()[0].clone();
        let reply = dispatcher.handle_message(&request).unwrap().await;
        client.receive(&reply);
        assert_eq!(pending.await.unwrap(), json!(5));
    }

    #[tokio::test]
    async fn unregistered_channel_reply_carries_error() {
        let dispatcher = IpcDispatcher::new();
        let (sink, sent) = outbox();
        let client = MessageChannel::new(sink);
        let pending = client.invoke("missing", vec![]);

        let request = sent.lock().unwrap()[0].clone();
        client.receive(&dispatcher.handle_message(&request).unwrap().await);
        assert_eq!(
            pending.await.unwrap_err(),
            BridgeError::NotRegistered("missing".into())
        );
    }

    #[test]
    fn host_ignores_non_invocations() {
        let dispatcher = IpcDispatcher::new();
        assert!(dispatcher.handle_message("garbage").is_none());
        let event = IpcMessage::Event {
            channel: "tick".into(),
            args: vec![],
        };
        assert!(dispatcher.handle_message(&event.to_json().unwrap()).is_none());
    }

    #[test]
    fn events_reach_client_listeners() {
        let (host_sink, host_out) = outbox();
        let target = MessageTarget::new(host_sink);
        let (client_sink, _) = outbox();
        let client = MessageChannel::new(client_sink);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        client.on(
            "tick",
            listener(move |args| log.lock().unwrap().push(args.to_vec())),
        );

        target.send("tick", vec![json!(1)]).unwrap();
        target.send("tick", vec![json!(2)]).unwrap();
        for raw in host_out.lock().unwrap().iter() {
            client.receive(raw);
        }
        assert_eq!(*seen.lock().unwrap(), vec![vec![json!(1)], vec![json!(2)]]);
    }

    #[test]
    fn stray_reply_is_ignored() {
        let (sink, _) = outbox();
        let client = MessageChannel::new(sink);
        client.receive(r#"{"kind":"reply","id":"nobody","result":{"Ok":null}}"#);
        assert_eq!(client.pending_count(), 0);
    }
}
