//! Tests for the exposed client surface.

use super::*;
use crate::channel::EventTarget;
use crate::dispatcher::{handler, IpcDispatcher};
use crate::events::{listener, EventSender};
use crate::local::LocalChannel;
use crate::registry::HandlerRegistry;
use serde_json::json;
use std::sync::Mutex;

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder("api")
            .call("get-user", "(id) -> User")
            .call("user.get-data", "() -> Data")
            .event("user.updated", "(User)")
            .event("download.progress", "(pct: number)")
            .build()
            .unwrap(),
    )
}

fn wired() -> (Arc<Schema>, HandlerRegistry, Arc<LocalChannel>, ApiSurface) {
    let schema = schema();
    let registry = HandlerRegistry::new(Arc::clone(&schema));
    let dispatcher = IpcDispatcher::new();
    registry.attach_dispatcher(Arc::new(dispatcher.clone())).unwrap();
    let local = Arc::new(LocalChannel::new(dispatcher));
    let surface = expose(&schema, local.clone()).unwrap();
    (schema, registry, local, surface)
}

#[test]
fn surface_lists_every_declared_name() {
    let (_, _, _, surface) = wired();
    assert_eq!(surface.bridge_key(), "api");
    assert_eq!(surface.call_names().collect::<Vec<_>>(), vec!["getUser", "userGetData"]);
    assert_eq!(
        surface.subscribe_names().collect::<Vec<_>>(),
        vec!["onDownloadProgress", "onUserUpdated"]
    );
    assert_eq!(surface.get("getUser").map(CallWrapper::channel), Some("get-user"));
    assert_eq!(
        surface.subscriber("onUserUpdated").map(SubscribeFn::channel),
        Some("user.updated")
    );
}

#[test]
fn invoke_namespace_is_a_view_of_the_same_table() {
    let (_, _, _, surface) = wired();
    let flat: Vec<_> = surface.call_names().collect();
    let nested: Vec<_> = surface.invoke().names().collect();
    assert_eq!(flat, nested);

    let a = surface.get("getUser").unwrap() as *const CallWrapper;
    let b = surface.invoke().get("getUser").unwrap() as *const CallWrapper;
    assert_eq!(a, b);
}

#[tokio::test]
async fn flat_and_namespaced_calls_reach_the_handler() {
    let (_, registry, _, surface) = wired();
    registry
        .register_handler(
            "user.get-data",
            handler(|_| async { Ok(json!({"bytes": 42})) }),
        )
        .unwrap();

    assert_eq!(surface.call("userGetData", vec![]).await.unwrap(), json!({"bytes": 42}));
    assert_eq!(
        surface.invoke().call("userGetData", vec![]).await.unwrap(),
        json!({"bytes": 42})
    );
}

#[tokio::test]
async fn round_trip_get_user() {
    let (_, registry, local, surface) = wired();
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&received);
    registry
        .register_handler(
            "get-user",
            handler(move |args| {
                log.lock().unwrap().push(args.clone());
                async move { Ok(json!({"id": args[0], "name": "Ada"})) }
            }),
        )
        .unwrap();

    let out = surface.call("getUser", vec![json!("u1")]).await.unwrap();
    assert_eq!(out, json!({"id": "u1", "name": "Ada"}));
    assert_eq!(*received.lock().unwrap(), vec![vec![json!("u1")]]);
    assert!(local.dispatcher().has_route("get-user"));
}

#[tokio::test]
async fn unknown_callable_is_rejected() {
    let (_, _, _, surface) = wired();
    let err = surface.call("dropTables", vec![]).await.unwrap_err();
    assert_eq!(err, BridgeError::UnknownChannel("dropTables".into()));
}

#[test]
fn subscriptions_fan_out_and_unsubscribe_independently() {
    let (schema, _, local, surface) = wired();
    let sender = EventSender::new(schema);
    let log = Arc::new(Mutex::new(Vec::new()));

    let subs: Vec<Subscription> = ["a", "b", "c"]
        .iter()
        .map(|tag| {
            let log = Arc::clone(&log);
            let tag = tag.to_string();
            surface
                .subscribe(
                    "onUserUpdated",
                    listener(move |args| log.lock().unwrap().push(format!("{tag}:{}", args[0]))),
                )
                .unwrap()
        })
        .collect();

    sender.send("userUpdated", local.as_ref(), vec![json!(1)]).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["a:1", "b:1", "c:1"]);

    subs[1].unsubscribe();
    subs[1].unsubscribe();
    assert!(!subs[1].is_active());
    log.lock().unwrap().clear();

    sender.send("userUpdated", local.as_ref(), vec![json!(2)]).unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["a:2", "c:2"]);
    assert_eq!(local.listener_count("user.updated"), 2);
}

#[test]
fn events_stay_on_their_channel() {
    let (_, _, local, surface) = wired();
    let hits = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&hits);
    let _sub = surface
        .subscribe(
            "onDownloadProgress",
            listener(move |_| *counter.lock().unwrap() += 1),
        )
        .unwrap();

    local.send("user.updated", vec![]).unwrap();
    assert_eq!(*hits.lock().unwrap(), 0);
    local.send("download.progress", vec![json!(50)]).unwrap();
    assert_eq!(*hits.lock().unwrap(), 1);
}

#[test]
fn unknown_subscribe_name_is_rejected() {
    let (_, _, _, surface) = wired();
    let err = surface
        .subscribe("userUpdated", listener(|_| {}))
        .unwrap_err();
    assert_eq!(err, BridgeError::UnknownChannel("userUpdated".into()));
}

#[test]
fn calls_only_schema_has_no_subscribers() {
    let schema = Schema::builder("api").call("ping", "").build().unwrap();
    let surface = expose(&schema, Arc::new(LocalChannel::new(IpcDispatcher::new()))).unwrap();
    assert_eq!(surface.subscribe_names().count(), 0);
    assert_eq!(surface.call_names().collect::<Vec<_>>(), vec!["ping"]);
}

#[test]
fn global_scope_install_and_lookup() {
    let (_, _, _, surface) = wired();
    let scope = GlobalScope::new();
    assert!(scope.lookup("api").is_none());

    let installed = scope.install(surface);
    let found = scope.lookup("api").unwrap();
    assert!(Arc::ptr_eq(&installed, &found));

    assert!(scope.remove("api").is_some());
    assert!(scope.lookup("api").is_none());
}
