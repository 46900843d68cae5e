//! In-process demo: one host and one client wired through a `LocalChannel`.
//!
//! Exercises the registration protocol end to end: a handler registered
//! before the dispatcher exists, one registered after, an event fanned out
//! to two listeners, and an unregister followed by a rejected call.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tether_bridge::{
    expose, listener, typed_handler, ClientInvoker, EventSender, GlobalScope, HandlerRegistry,
    IpcDispatcher, LocalChannel, Schema,
};
use tether_common::{BridgeError, ImplementationError};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    id: String,
    name: String,
}

pub fn run() -> Result<(), BridgeError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BridgeError::Transport(format!("failed to start runtime: {e}")))?;

    for line in runtime.block_on(run_demo())? {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_demo() -> Result<Vec<String>, BridgeError> {
    let mut report = Vec::new();

    let schema = Arc::new(
        Schema::builder("api")
            .call("get-user", "(id: string) -> User")
            .call("user.get-data", "(id: string) -> number")
            .event("user.updated", "(user: User)")
            .build()?,
    );

    // Host: one handler before the dispatcher exists.
    let registry = HandlerRegistry::new(Arc::clone(&schema));
    let get_user = registry.register_handler(
        "get-user",
        typed_handler(|(id,): (String,)| async move {
            if id.is_empty() {
                return Err(ImplementationError::new("empty user id"));
            }
            Ok(User {
                id,
                name: "Ada".into(),
            })
        }),
    )?;

    let dispatcher = IpcDispatcher::new();
    registry.attach_dispatcher(Arc::new(dispatcher.clone()))?;

    // ...and one after.
    registry.register_handler(
        "user.get-data",
        typed_handler(|(id,): (String,)| async move { Ok(id.len() as u64 * 1024) }),
    )?;
    info!(channels = ?registry.registered_channels(), "host ready");

    // Client: surface installed under the bridge key.
    let local = Arc::new(LocalChannel::new(dispatcher));
    let scope = GlobalScope::new();
    let surface = scope.install(expose(&schema, local.clone())?);
    let invoker = ClientInvoker::new(&schema, scope);

    let user: User = invoker.call_typed("getUser", ("u1",)).await?;
    report.push(format!("getUser(u1) -> {} {}", user.id, user.name));

    let bytes: u64 = invoker.call_typed("userGetData", ("u1",)).await?;
    report.push(format!("userGetData(u1) -> {bytes}"));

    // Events: two listeners, then one leaves.
    let seen = Arc::new(Mutex::new(Vec::new()));
    let subscriptions = ["first", "second"].map(|tag| {
        let seen = Arc::clone(&seen);
        surface.subscribe(
            "onUserUpdated",
            listener(move |args| {
                let name = args
                    .first()
                    .map_or_else(|| "null".to_string(), |user| user["name"].to_string());
                if let Ok(mut seen) = seen.lock() {
                    seen.push(format!("{tag} saw {name}"));
                }
            }),
        )
    });
    let [first, second] = subscriptions;
    let (first, _second) = (first?, second?);

    let sender = EventSender::new(Arc::clone(&schema));
    sender.send("userUpdated", local.as_ref(), vec![json!(user)])?;
    first.unsubscribe();
    sender.send("userUpdated", local.as_ref(), vec![json!({"name": "Grace"})])?;
    sender.send("userUpdated", local.as_ref(), vec![])?;
    if let Ok(seen) = seen.lock() {
        report.extend(seen.iter().cloned());
    }

    // Unregister: the declared call now fails at the host.
    get_user.unregister();
    match invoker.call("getUser", vec![json!("u1")]).await {
        Ok(value) => report.push(format!("getUser(u1) unexpectedly -> {value}")),
        Err(e) => report.push(format!("getUser(u1) after unregister -> {e}")),
    }

    Ok(report)
}
