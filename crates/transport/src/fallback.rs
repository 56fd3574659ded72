//! Out-of-band fallback channel.
//!
//! When the primary path cannot reach the service at all, the request is
//! re-sent asking for a JavaScript wrapped response (`token(json)`). A
//! one-shot handler registered under the token receives the payload once a
//! [`ScriptLoader`] has fetched and dispatched the script.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::oneshot;
use uuid::Uuid;
use wfs_protocol::RequestDescriptor;

use crate::error::LoadError;
use crate::http::HttpExchange;

type Handlers = HashMap<String, oneshot::Sender<JsonValue>>;

/// Fresh correlation token for one fallback attempt.
pub fn new_token() -> String {
    format!("wfs_cb_{}", Uuid::new_v4().simple())
}

/// Token-keyed one-shot handlers awaiting a script payload.
#[derive(Debug, Clone, Default)]
pub struct CallbackRegistry {
    handlers: Arc<Mutex<Handlers>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Handlers> {
        // A panicked holder cannot leave the map half-updated
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a handler under `token`. The entry lives until the payload
    /// is delivered or the returned guard is dropped, whichever comes first.
    pub fn register(&self, token: &str) -> (CallbackGuard, oneshot::Receiver<JsonValue>) {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(token.to_string(), tx);
        let guard = CallbackGuard {
            registry: self.clone(),
            token: token.to_string(),
        };
        (guard, rx)
    }

    /// Deliver a payload to the handler for `token`, removing it.
    /// Returns false when no handler is registered.
    pub fn invoke(&self, token: &str, payload: JsonValue) -> bool {
        match self.lock().remove(token) {
            Some(tx) => {
                // A dropped receiver means the waiter already gave up
                let _ = tx.send(payload);
                true
            }
            None => false,
        }
    }

    /// Execute a loaded script: parse `token(json)` and invoke the handler.
    pub fn dispatch(&self, script: &str) -> Result<(), LoadError> {
        let (token, payload) = parse_callback(script)?;
        if self.invoke(token, payload) {
            Ok(())
        } else {
            Err(LoadError::UnknownToken(token.to_string()))
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.lock().contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Releases a registration when dropped.
#[derive(Debug)]
pub struct CallbackGuard {
    registry: CallbackRegistry,
    token: String,
}

impl CallbackGuard {
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Drop for CallbackGuard {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.token);
    }
}

/// Split a script body of the form `token(json)` or `token(json);`.
pub fn parse_callback(script: &str) -> Result<(&str, JsonValue), LoadError> {
    let body = script.trim();
    let body = body.strip_suffix(';').unwrap_or(body).trim_end();

    let open = body
        .find('(')
        .ok_or_else(|| LoadError::Malformed("missing '('".to_string()))?;
    let token = body[..open].trim();
    let inner = body[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| LoadError::Malformed("missing closing ')'".to_string()))?;

    let valid_token = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !valid_token {
        return Err(LoadError::Malformed(format!("invalid callback name {:?}", token)));
    }

    let payload = serde_json::from_str(inner)
        .map_err(|e| LoadError::Malformed(format!("callback argument is not JSON: {}", e)))?;
    Ok((token, payload))
}

/// Fetches a script-wrapped response and runs it against the registry.
///
/// Implementations return `Ok` once the script has been executed; the
/// payload itself travels through the registry.
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    async fn load(
        &self,
        request: &RequestDescriptor,
        registry: &CallbackRegistry,
    ) -> Result<(), LoadError>;
}

/// Loads the script over HTTP and dispatches its body.
pub struct HttpScriptLoader {
    http: Arc<dyn HttpExchange>,
}

impl HttpScriptLoader {
    pub fn new(http: Arc<dyn HttpExchange>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ScriptLoader for HttpScriptLoader {
    async fn load(
        &self,
        request: &RequestDescriptor,
        registry: &CallbackRegistry,
    ) -> Result<(), LoadError> {
        let response = self
            .http
            .exchange(request)
            .await
            .map_err(|e| LoadError::Request(e.to_string()))?;

        if !response.is_success() {
            return Err(LoadError::Status(response.status));
        }

        registry.dispatch(&response.body)
    }
}
