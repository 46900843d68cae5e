//! Client bootstrap script for webview clients.
//!
//! The generated JavaScript installs the same surface an [`ApiSurface`]
//! offers Rust clients under `window[bridge_key]`: one function per call
//! callable, an `invoke` namespace, and one `on*` function per event.
//! It speaks the [`IpcMessage`] envelope over `window.ipc.postMessage`.
//!
//! [`ApiSurface`]: crate::exposer::ApiSurface
//! [`IpcMessage`]: crate::ipc::IpcMessage

use std::fmt::Write;

use crate::schema::Schema;

/// Shared transport installed once per page, whatever the bridge key.
const TRANSPORT_JS: &str = r#"
    var transport = window.__tether = window.__tether || {
        seq: 0,
        pending: {},
        listeners: {},
        invoke: function(channel, args) {
            var self = this;
            var id = 'js-' + (++self.seq);
            return new Promise(function(resolve, reject) {
                self.pending[id] = { resolve: resolve, reject: reject };
                window.ipc.postMessage(JSON.stringify({
                    kind: 'invoke', id: id, channel: channel, args: args
                }));
            });
        },
        on: function(channel, callback) {
            var list = this.listeners[channel] = this.listeners[channel] || [];
            var entry = { callback: callback };
            list.push(entry);
            return function() {
                var i = list.indexOf(entry);
                if (i >= 0) { list.splice(i, 1); }
            };
        },
        _receive: function(msg) {
            if (msg.kind === 'reply') {
                var p = this.pending[msg.id];
                if (!p) { return; }
                delete this.pending[msg.id];
                if ('Ok' in msg.result) { p.resolve(msg.result.Ok); } else { p.reject(msg.result.Err); }
            } else if (msg.kind === 'event') {
                var list = (this.listeners[msg.channel] || []).slice();
                for (var i = 0; i < list.length; i++) {
                    list[i].callback.apply(null, msg.args);
                }
            }
        }
    };
"#;

/// Generate the bootstrap script for `schema`.
pub fn client_init_script(schema: &Schema) -> String {
    let mut js = String::from("(function() {\n");
    js.push_str(TRANSPORT_JS);
    js.push_str("    var api = {};\n    var invoke = {};\n");

    for spec in schema.calls().iter() {
        let _ = writeln!(
            js,
            "    invoke[{name}] = api[{name}] = function() {{ return transport.invoke({channel}, Array.prototype.slice.call(arguments)); }};",
            name = js_string(&spec.callable),
            channel = js_string(&spec.channel),
        );
    }
    for (name, spec) in schema.subscribe_names() {
        let _ = writeln!(
            js,
            "    api[{name}] = function(callback) {{ return transport.on({channel}, callback); }};",
            name = js_string(&name),
            channel = js_string(&spec.channel),
        );
    }

    let _ = writeln!(
        js,
        "    api.invoke = Object.freeze(invoke);\n    window[{key}] = Object.freeze(api);",
        key = js_string(schema.bridge_key()),
    );
    js.push_str("})();\n");
    js
}

/// Script that hands one encoded host message to the page's transport.
pub fn js_receive_message(encoded: &str) -> String {
    format!("window.__tether && window.__tether._receive({encoded});")
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
