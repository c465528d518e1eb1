//! Scripted transport for exercising the chain without a network.

use crate::llm::client::{ChatRequest, CompletionTransport, HttpReply, TransportError};
use futures::future::BoxFuture;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Reply(u16, String),
    NetworkError,
    /// Never resolves; only a timeout gets past it
    Hang,
}

impl Scripted {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Scripted::Reply(200, body.into())
    }

    pub(crate) fn status(status: u16, body: impl Into<String>) -> Self {
        Scripted::Reply(status, body.into())
    }
}

/// Chat-completion body with a single choice
pub(crate) fn completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

/// Replies per model, consumed in order. Unscripted models get a 503.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, model: &str, reply: Scripted) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(model.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.model.clone())
            .collect()
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl CompletionTransport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<HttpReply, TransportError>> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.model)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Scripted::status(503, "unscripted model"));

        Box::pin(async move {
            match next {
                Scripted::Reply(status, body) => Ok(HttpReply { status, body }),
                Scripted::NetworkError => {
                    Err(TransportError::Network("could not connect".to_string()))
                }
                Scripted::Hang => futures::future::pending().await,
            }
        })
    }
}
