use pronord_core::{Credentials, Error, Result};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::interceptor::{
    apply_cookie_change, apply_request_headers, seed_initial_csrf, CookieChange, RequestDetails,
};
use crate::store::CredentialStore;

const EVENT_BUFFER: usize = 64;

/// Everything that reaches the privileged context rides one queue:
/// interception events and broker requests are serialized in arrival
/// order. A token request can therefore race ahead of an in-flight
/// cookie or header update and see a stale-but-valid snapshot; the
/// caller retries, it does not get to wait for "the freshest" value.
pub enum CredentialEvent {
    Cookie(CookieChange),
    Request(Option<RequestDetails>),
    Message {
        body: Value,
        reply: oneshot::Sender<Value>,
    },
}

/// Task owning the `CredentialStore`; the Rust stand-in for the
/// extension's background context.
pub struct CredentialService {
    store: CredentialStore,
    session_cookie: String,
    rx: mpsc::Receiver<CredentialEvent>,
}

impl CredentialService {
    /// Build the service plus the handle other contexts talk through.
    /// `initial_cookie` is the eager startup read of the session
    /// cookie, applied before any event is processed.
    pub fn new(
        session_cookie: impl Into<String>,
        initial_cookie: Option<&str>,
    ) -> (Self, CredentialHandle) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let mut store = CredentialStore::new();
        seed_initial_csrf(&mut store, initial_cookie);
        (
            Self {
                store,
                session_cookie: session_cookie.into(),
                rx,
            },
            CredentialHandle { tx },
        )
    }

    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            self.dispatch(event);
        }
        debug!("credential service stopped: all handles dropped");
    }

    fn dispatch(&mut self, event: CredentialEvent) {
        match event {
            CredentialEvent::Cookie(change) => {
                apply_cookie_change(&mut self.store, &self.session_cookie, &change);
            }
            CredentialEvent::Request(details) => {
                apply_request_headers(&mut self.store, details.as_ref());
            }
            CredentialEvent::Message { body, reply } => {
                if is_truthy(body.get("tokens")) {
                    let snapshot = self.store.snapshot();
                    // Receiver may have given up waiting; that is fine.
                    let _ = reply.send(serde_json::json!({
                        "bearer": snapshot.bearer,
                        "csrf": snapshot.csrf,
                    }));
                } else {
                    // Not ours; decline by dropping the reply sender.
                    debug!("ignoring message without tokens field");
                }
            }
        }
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Cloneable sender half used by the unprivileged side. The only way
/// to reach the store.
#[derive(Clone)]
pub struct CredentialHandle {
    tx: mpsc::Sender<CredentialEvent>,
}

impl CredentialHandle {
    pub async fn cookie_changed(&self, change: CookieChange) {
        if self.tx.send(CredentialEvent::Cookie(change)).await.is_err() {
            warn!("credential service gone, cookie event dropped");
        }
    }

    pub async fn request_observed(&self, details: Option<RequestDetails>) {
        if self
            .tx
            .send(CredentialEvent::Request(details))
            .await
            .is_err()
        {
            warn!("credential service gone, request event dropped");
        }
    }

    /// Fire one message at the broker and wait for at most one reply.
    /// `None` means the broker declined (unrecognized shape) or the
    /// service is gone.
    pub async fn send_raw(&self, body: Value) -> Option<Value> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(CredentialEvent::Message {
                body,
                reply: reply_tx,
            })
            .await
            .ok()?;
        reply_rx.await.ok()
    }

    /// Typed `{ tokens: true }` request. The returned credentials may
    /// still be unready; callers check `is_ready` themselves.
    pub async fn tokens(&self) -> Result<Credentials> {
        let reply = self
            .send_raw(serde_json::json!({ "tokens": true }))
            .await
            .ok_or_else(|| Error::Credential("token broker unavailable".to_string()))?;
        let creds: Credentials = serde_json::from_value(reply)?;
        Ok(creds)
    }
}
