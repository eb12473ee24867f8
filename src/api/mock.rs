//! Scriptable in-memory transport.
//!
//! Answers requests from a route table instead of the network. Routes can be
//! held open so tests can observe state while a request is in flight, then
//! released one request at a time.

use parking_lot::Mutex;
use reqwest::Method;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::transport::{ApiError, ApiResponse, Transport, TransportFuture};

/// Canned answer for a mock route.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with the given JSON body
    Json(serde_json::Value),
    /// 204 with an empty body
    NoContent,
    /// Non-2xx status, optionally with a server message
    Status { status: u16, message: Option<String> },
}

struct Route {
    reply: MockReply,
    gate: Option<Arc<Semaphore>>,
}

#[derive(Default)]
struct Inner {
    routes: Mutex<HashMap<(Method, String), Route>>,
    calls: Mutex<Vec<(Method, String)>>,
}

/// Cloneable handle; all clones share routes and the call log.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the reply for `method path`. Keeps any existing hold.
    pub fn reply(&self, method: Method, path: &str, reply: MockReply) {
        let mut routes = self.inner.routes.lock();
        let key = (method, path.to_string());
        match routes.get_mut(&key) {
            Some(route) => route.reply = reply,
            None => {
                routes.insert(key, Route { reply, gate: None });
            }
        }
    }

    pub fn reply_json<T: Serialize>(&self, method: Method, path: &str, body: &T) {
        let value = serde_json::to_value(body).unwrap_or(serde_json::Value::Null);
        self.reply(method, path, MockReply::Json(value));
    }

    /// Make future requests on this route wait until [`release`](Self::release).
    pub fn hold(&self, method: Method, path: &str) {
        let mut routes = self.inner.routes.lock();
        let route = routes
            .entry((method, path.to_string()))
            .or_insert_with(|| Route {
                reply: MockReply::NoContent,
                gate: None,
            });
        route.gate = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let one held request on this route through.
    pub fn release(&self, method: Method, path: &str) {
        let routes = self.inner.routes.lock();
        if let Some(gate) = routes
            .get(&(method, path.to_string()))
            .and_then(|r| r.gate.as_ref())
        {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.inner.calls.lock().clone()
    }

    pub fn call_count(&self, method: &Method, path: &str) -> usize {
        self.inner
            .calls
            .lock()
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }
}

impl Transport for MockTransport {
    fn send<'a>(&'a self, method: Method, path: &'a str) -> TransportFuture<'a> {
        Box::pin(async move {
            self.inner.calls.lock().push((method.clone(), path.to_string()));

            let (reply, gate) = {
                let routes = self.inner.routes.lock();
                match routes.get(&(method.clone(), path.to_string())) {
                    Some(route) => (route.reply.clone(), route.gate.clone()),
                    None => {
                        return Err(ApiError::Status {
                            status: 404,
                            message: Some(format!("No mock route for {} {}", method, path)),
                        })
                    }
                }
            };

            if let Some(gate) = gate {
                if let Ok(permit) = gate.acquire().await {
                    permit.forget();
                }
            }

            match reply {
                MockReply::Json(value) => Ok(ApiResponse {
                    status: 200,
                    body: serde_json::to_vec(&value)?,
                }),
                MockReply::NoContent => Ok(ApiResponse {
                    status: 204,
                    body: Vec::new(),
                }),
                MockReply::Status { status, message } => Err(ApiError::Status { status, message }),
            }
        })
    }
}
