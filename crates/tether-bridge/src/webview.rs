//! Webview clients on `wry`.
//!
//! [`with_bridge`] injects the client bootstrap script and queues every IPC
//! body the page posts. The host drains the inbox on its event loop, feeds
//! each body to [`IpcDispatcher::handle_message`], and hands the finished
//! reply back with [`deliver`]. A [`wry::WebView`] is itself an
//! [`EventTarget`] for host events.
//!
//! [`IpcDispatcher::handle_message`]: crate::dispatcher::IpcDispatcher::handle_message

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tether_common::BridgeError;
use tracing::{debug, warn};
use wry::{WebView, WebViewBuilder};

use crate::channel::{Args, EventTarget};
use crate::ipc::IpcMessage;
use crate::schema::Schema;
use crate::script::{client_init_script, js_receive_message};

/// Raw IPC bodies posted by the page, oldest first.
pub type Inbox = Arc<Mutex<Vec<String>>>;

/// Install the bridge on a webview under construction.
pub fn with_bridge<'a>(
    builder: WebViewBuilder<'a>,
    schema: &Schema,
    inbox: Inbox,
) -> WebViewBuilder<'a> {
    let script = client_init_script(schema);
    builder
        .with_initialization_script(&script)
        .with_ipc_handler(move |request| {
            let body = request.body().to_string();

            if IpcMessage::from_json(&body).is_none() {
                warn!(body_len = body.len(), "IPC message rejected: not a bridge message");
                return;
            }

            debug!(body_len = body.len(), "IPC message from page");
            lock(&inbox).push(body);
        })
}

/// Take every queued IPC body.
pub fn drain(inbox: &Inbox) -> Vec<String> {
    std::mem::take(&mut *lock(inbox))
}

fn lock(inbox: &Inbox) -> MutexGuard<'_, Vec<String>> {
    inbox.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Hand an encoded host message (reply or event) to the page.
pub fn deliver(webview: &WebView, encoded: &str) -> Result<(), BridgeError> {
    webview
        .evaluate_script(&js_receive_message(encoded))
        .map_err(|e| BridgeError::Transport(e.to_string()))
}

impl EventTarget for WebView {
    fn send(&self, channel: &str, args: Args) -> Result<(), BridgeError> {
        let encoded = IpcMessage::Event {
            channel: channel.to_string(),
            args,
        }
        .to_json()?;
        deliver(self, &encoded)
    }
}
