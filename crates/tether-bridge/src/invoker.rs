//! Client Invoker: stable call surface resolved through the global scope.
//!
//! The invoker is built once from the full declared call set, whether or
//! not the host has registered anything. Each call looks up the surface
//! installed under the bridge key at call time, so it works no matter
//! when the surface is installed, and fails fast if it is not.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tether_common::{BridgeError, ConfigError};

use crate::channel::Args;
use crate::exposer::GlobalScope;
use crate::schema::Schema;

/// One declared call, bound to a bridge key rather than a transport.
#[derive(Clone)]
pub struct RemoteCall {
    callable: String,
    bridge_key: String,
    scope: GlobalScope,
}

impl RemoteCall {
    /// Forward to the same-named member of the installed surface.
    ///
    /// Fails with [`ConfigError::BridgeNotInstalled`] when nothing is
    /// installed under the bridge key; otherwise the surface's result is
    /// returned untouched.
    pub async fn call(&self, args: Args) -> Result<Value, BridgeError> {
        let surface = self
            .scope
            .lookup(&self.bridge_key)
            .ok_or_else(|| ConfigError::BridgeNotInstalled(self.bridge_key.clone()))?;
        surface.call(&self.callable, args).await
    }

    pub fn callable(&self) -> &str {
        &self.callable
    }
}

pub struct ClientInvoker {
    bridge_key: String,
    calls: BTreeMap<String, RemoteCall>,
}

impl ClientInvoker {
    pub fn new(schema: &Schema, scope: GlobalScope) -> Self {
        let bridge_key = schema.bridge_key().to_string();
        let calls = schema
            .calls()
            .iter()
            .map(|spec| {
                let call = RemoteCall {
                    callable: spec.callable.clone(),
                    bridge_key: bridge_key.clone(),
                    scope: scope.clone(),
                };
                (spec.callable.clone(), call)
            })
            .collect();
        Self { bridge_key, calls }
    }

    pub fn bridge_key(&self) -> &str {
        &self.bridge_key
    }

    pub fn get(&self, callable: &str) -> Option<&RemoteCall> {
        self.calls.get(callable)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.calls.keys().map(String::as_str)
    }

    pub async fn call(&self, callable: &str, args: Args) -> Result<Value, BridgeError> {
        let call = self
            .calls
            .get(callable)
            .ok_or_else(|| BridgeError::UnknownChannel(callable.to_string()))?;
        call.call(args).await
    }

    /// Typed call: `args` is serialized to positional arguments (a tuple
    /// becomes several arguments, `()` none, anything else one) and the
    /// result is deserialized as `R`.
    pub async fn call_typed<A, R>(&self, callable: &str, args: A) -> Result<R, BridgeError>
    where
        A: Serialize,
        R: DeserializeOwned,
    {
        let args = to_args(args)?;
        let value = self.call(callable, args).await?;
        serde_json::from_value(value)
            .map_err(|e| BridgeError::Transport(format!("unexpected result for '{callable}': {e}")))
    }
}

fn to_args<A: Serialize>(args: A) -> Result<Args, BridgeError> {
    let value = serde_json::to_value(args)
        .map_err(|e| BridgeError::Transport(format!("failed to serialize arguments: {e}")))?;
    Ok(match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    })
}
