//! Runtime schema: the fixed call and event name tables.
//!
//! A [`Schema`] is built once from a declaration and never changes. Both
//! namespaces (calls and events) are resolved through the name transform
//! eagerly, so every later lookup is a table hit.

use std::collections::HashMap;

use tether_common::ConfigError;
use tether_config::validation::is_valid_bridge_key;
use tether_config::SchemaConfig;
use tracing::debug;

use crate::naming::{to_callable_name, to_subscribe_name};

/// Which namespace a channel is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Call,
    Event,
}

impl ChannelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Call => "call",
            ChannelKind::Event => "event",
        }
    }
}

/// One declared channel with its transformed name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Wire-level name, as declared.
    pub channel: String,
    /// Call-site name produced by the name transform.
    pub callable: String,
    /// Opaque type descriptor from the declaration.
    pub descriptor: String,
}

/// Declared channels of one namespace, indexed both ways.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    specs: Vec<ChannelSpec>,
    by_channel: HashMap<String, usize>,
    by_callable: HashMap<String, usize>,
}

impl NameTable {
    fn build(kind: ChannelKind, declared: Vec<(String, String)>) -> Result<Self, ConfigError> {
        let mut table = NameTable::default();
        for (channel, descriptor) in declared {
            let callable = to_callable_name(&channel);
            if callable.is_empty() {
                return Err(ConfigError::EmptyCallableName(channel));
            }
            if let Some(&idx) = table.by_callable.get(&callable) {
                return Err(ConfigError::NameCollision {
                    namespace: kind.as_str().into(),
                    callable,
                    first: table.specs[idx].channel.clone(),
                    second: channel,
                });
            }
            let idx = table.specs.len();
            table.by_channel.insert(channel.clone(), idx);
            table.by_callable.insert(callable.clone(), idx);
            table.specs.push(ChannelSpec {
                channel,
                callable,
                descriptor,
            });
        }
        Ok(table)
    }

    pub fn by_channel(&self, channel: &str) -> Option<&ChannelSpec> {
        self.by_channel.get(channel).map(|&i| &self.specs[i])
    }

    pub fn by_callable(&self, callable: &str) -> Option<&ChannelSpec> {
        self.by_callable.get(callable).map(|&i| &self.specs[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChannelSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// The validated, immutable communication schema.
#[derive(Debug, Clone)]
pub struct Schema {
    bridge_key: String,
    strict: bool,
    calls: NameTable,
    events: NameTable,
}

impl Schema {
    pub fn builder(bridge_key: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            bridge_key: bridge_key.into(),
            strict: true,
            calls: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Build from a loaded declaration file.
    pub fn from_config(config: SchemaConfig) -> Result<Self, ConfigError> {
        tether_config::validate(&config)?;
        let mut builder = Schema::builder(config.bridge_key).strict(config.strict);
        for (channel, descriptor) in config.calls {
            builder = builder.call(channel, descriptor);
        }
        for (channel, descriptor) in config.events {
            builder = builder.event(channel, descriptor);
        }
        builder.build()
    }

    pub fn bridge_key(&self) -> &str {
        &self.bridge_key
    }

    /// Whether undeclared channel names are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn calls(&self) -> &NameTable {
        &self.calls
    }

    pub fn events(&self) -> &NameTable {
        &self.events
    }

    pub fn is_declared_call(&self, channel: &str) -> bool {
        self.calls.by_channel(channel).is_some()
    }

    /// Subscribe-function names (`onX`) paired with their event spec.
    pub fn subscribe_names(&self) -> impl Iterator<Item = (String, &ChannelSpec)> {
        self.events
            .iter()
            .map(|spec| (to_subscribe_name(&spec.callable), spec))
    }
}

/// Incremental schema declaration.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    bridge_key: String,
    strict: bool,
    calls: Vec<(String, String)>,
    events: Vec<(String, String)>,
}

impl SchemaBuilder {
    /// Declare a request/response channel. Redeclaring replaces the descriptor.
    pub fn call(mut self, channel: impl Into<String>, descriptor: impl Into<String>) -> Self {
        upsert(&mut self.calls, channel.into(), descriptor.into());
        self
    }

    /// Declare a host-to-client event channel. Redeclaring replaces the descriptor.
    pub fn event(mut self, channel: impl Into<String>, descriptor: impl Into<String>) -> Self {
        upsert(&mut self.events, channel.into(), descriptor.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn build(self) -> Result<Schema, ConfigError> {
        if self.calls.is_empty() && self.events.is_empty() {
            return Err(ConfigError::NoChannels);
        }
        if !is_valid_bridge_key(&self.bridge_key) {
            return Err(ConfigError::InvalidBridgeKey(self.bridge_key));
        }

        let calls = NameTable::build(ChannelKind::Call, self.calls)?;
        let events = NameTable::build(ChannelKind::Event, self.events)?;
        check_surface(&calls, &events)?;

        debug!(
            bridge_key = %self.bridge_key,
            calls = calls.len(),
            events = events.len(),
            strict = self.strict,
            "schema built"
        );

        Ok(Schema {
            bridge_key: self.bridge_key,
            strict: self.strict,
            calls,
            events,
        })
    }
}

/// Name of the call sub-namespace on the client surface.
pub const INVOKE_NAMESPACE: &str = "invoke";

/// Calls, subscribe functions and the `invoke` namespace share one client
/// object, so their names must be distinct across namespaces too.
fn check_surface(calls: &NameTable, events: &NameTable) -> Result<(), ConfigError> {
    for call in calls.iter() {
        if call.callable == INVOKE_NAMESPACE {
            return Err(ConfigError::NameCollision {
                namespace: "surface".into(),
                callable: call.callable.clone(),
                first: call.channel.clone(),
                second: format!("<{INVOKE_NAMESPACE} namespace>"),
            });
        }
        if let Some(event) = events
            .iter()
            .find(|event| to_subscribe_name(&event.callable) == call.callable)
        {
            return Err(ConfigError::NameCollision {
                namespace: "surface".into(),
                callable: call.callable.clone(),
                first: call.channel.clone(),
                second: event.channel.clone(),
            });
        }
    }
    Ok(())
}

fn upsert(entries: &mut Vec<(String, String)>, channel: String, descriptor: String) {
    match entries.iter_mut().find(|(c, _)| *c == channel) {
        Some(entry) => entry.1 = descriptor,
        None => entries.push((channel, descriptor)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::builder("api")
            .call("get-user", "(id: string) -> User")
            .call("user.get-data", "() -> Data")
            .event("user.updated", "(User)")
            .build()
            .unwrap()
    }

    #[test]
    fn empty_schema_is_config_error() {
        let err = Schema::builder("api").build().unwrap_err();
        assert_eq!(err, ConfigError::NoChannels);
    }

    #[test]
    fn empty_config_is_config_error() {
        let err = Schema::from_config(SchemaConfig::default()).unwrap_err();
        assert_eq!(err, ConfigError::NoChannels);
    }

    #[test]
    fn tables_are_indexed_both_ways() {
        let schema = sample();
        assert_eq!(schema.bridge_key(), "api");
        assert!(schema.is_strict());

        let spec = schema.calls().by_channel("user.get-data").unwrap();
        assert_eq!(spec.callable, "userGetData");
        assert_eq!(schema.calls().by_callable("getUser").unwrap().channel, "get-user");
        assert!(schema.is_declared_call("get-user"));
        assert!(!schema.is_declared_call("user.updated"));
        assert_eq!(schema.events().by_callable("userUpdated").unwrap().channel, "user.updated");
    }

    #[test]
    fn declaration_order_is_kept() {
        let schema = sample();
        let names: Vec<_> = schema.calls().iter().map(|s| s.callable.as_str()).collect();
        assert_eq!(names, vec!["getUser", "userGetData"]);
    }

    #[test]
    fn callable_collision_is_rejected() {
        let err = Schema::builder("api")
            .call("get-user", "")
            .call("get.user", "")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NameCollision {
                namespace: "call".into(),
                callable: "getUser".into(),
                first: "get-user".into(),
                second: "get.user".into(),
            }
        );
    }

    #[test]
    fn namespaces_are_independent() {
        let schema = Schema::builder("api")
            .call("user-updated", "")
            .event("user.updated", "")
            .build()
            .unwrap();
        assert_eq!(schema.calls().by_callable("userUpdated").unwrap().channel, "user-updated");
        assert_eq!(schema.events().by_callable("userUpdated").unwrap().channel, "user.updated");
    }

    #[test]
    fn call_shadowing_a_subscribe_function_is_rejected() {
        let err = Schema::builder("api")
            .call("on-tick", "")
            .event("tick", "")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::NameCollision {
                namespace: "surface".into(),
                callable: "onTick".into(),
                first: "on-tick".into(),
                second: "tick".into(),
            }
        );
    }

    #[test]
    fn call_named_invoke_is_rejected() {
        let err = Schema::builder("api").call("invoke", "").build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NameCollision { ref namespace, ref callable, .. }
                if namespace == "surface" && callable == "invoke"
        ));
    }

    #[test]
    fn punctuation_only_channel_is_rejected() {
        let err = Schema::builder("api").event("--", "").build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyCallableName("--".into()));
    }

    #[test]
    fn invalid_bridge_key_is_rejected() {
        let err = Schema::builder("my api").call("ping", "").build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidBridgeKey("my api".into()));
    }

    #[test]
    fn redeclaring_replaces_descriptor() {
        let schema = Schema::builder("api")
            .call("ping", "old")
            .call("ping", "() -> string")
            .build()
            .unwrap();
        assert_eq!(schema.calls().len(), 1);
        assert_eq!(schema.calls().by_channel("ping").unwrap().descriptor, "() -> string");
    }

    #[test]
    fn from_config_honours_strict_flag() {
        let mut config = SchemaConfig::new("api").with_call("ping", "");
        config.strict = false;
        let schema = Schema::from_config(config).unwrap();
        assert!(!schema.is_strict());
    }

    #[test]
    fn identical_declarations_build_identical_tables() {
        let a = sample();
        let b = sample();
        let a_names: Vec<_> = a.calls().iter().map(|s| s.callable.clone()).collect();
        let b_names: Vec<_> = b.calls().iter().map(|s| s.callable.clone()).collect();
        assert_eq!(a_names, b_names);
    }

    #[test]
    fn subscribe_names_are_prefixed() {
        let schema = sample();
        let names: Vec<_> = schema.subscribe_names().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["onUserUpdated"]);
    }
}
