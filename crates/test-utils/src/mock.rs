//! Scripted stand-ins for the transport seams.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use transport::{CallbackRegistry, HttpExchange, LoadError, ScriptLoader, TransportError};
use wfs_protocol::{RawResponse, RequestDescriptor};

/// Outcome of one scripted exchange.
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(RawResponse),
    Fail(TransportError),
}

impl Scripted {
    /// Connection-level failure.
    pub fn unreachable() -> Self {
        Scripted::Fail(TransportError::Request("connection refused".to_string()))
    }
}

/// Plays back outcomes in order. The last outcome repeats once the script
/// runs out. Every request is recorded.
#[derive(Debug)]
pub struct ScriptedExchange {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RequestDescriptor>>,
}

impl ScriptedExchange {
    pub fn new(script: Vec<Scripted>) -> Self {
        assert!(!script.is_empty(), "script needs at least one outcome");
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always(outcome: Scripted) -> Self {
        Self::new(vec![outcome])
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpExchange for ScriptedExchange {
    async fn exchange(&self, request: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());

        let outcome = {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        };

        match outcome {
            Scripted::Respond(response) => Ok(response),
            Scripted::Fail(err) => Err(err),
        }
    }
}

/// How a [`MockScriptLoader`] reacts to a load.
#[derive(Debug, Clone)]
pub enum LoaderBehavior {
    /// Invoke the callback named in the request with this payload
    Invoke(JsonValue),
    /// Report a load failure
    Fail(LoadError),
    /// Load without ever invoking the callback
    Silent,
    /// Never finish loading
    Hang,
}

#[derive(Debug)]
pub struct MockScriptLoader {
    behavior: LoaderBehavior,
    calls: Mutex<Vec<RequestDescriptor>>,
}

impl MockScriptLoader {
    pub fn new(behavior: LoaderBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RequestDescriptor> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ScriptLoader for MockScriptLoader {
    async fn load(
        &self,
        request: &RequestDescriptor,
        registry: &CallbackRegistry,
    ) -> Result<(), LoadError> {
        self.calls.lock().unwrap().push(request.clone());

        match &self.behavior {
            LoaderBehavior::Invoke(payload) => {
                let token = request
                    .param("callback")
                    .ok_or_else(|| LoadError::Malformed("no callback parameter".to_string()))?;
                if registry.invoke(token, payload.clone()) {
                    Ok(())
                } else {
                    Err(LoadError::UnknownToken(token.to_string()))
                }
            }
            LoaderBehavior::Fail(err) => Err(err.clone()),
            LoaderBehavior::Silent => Ok(()),
            LoaderBehavior::Hang => std::future::pending().await,
        }
    }
}
