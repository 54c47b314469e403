use super::{Params, PcloudError, RpcMethod, Transport};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub server: String,
    pub method: RpcMethod,
    pub params: Params,
}

struct FixtureRoute {
    server: Option<String>,
    method: RpcMethod,
    response: Value,
}

/// Canned responses instead of network round trips. Used for offline demos
/// (`serve --fixture`) and throughout the test suite.
pub struct FixtureTransport {
    routes: Vec<FixtureRoute>,
    delays: Vec<(RpcMethod, Duration)>,
    calls: Mutex<Vec<RecordedCall>>,
    record: bool,
}

impl Default for FixtureTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureTransport {
    /// Records every call so tests can inspect them.
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            delays: Vec::new(),
            calls: Mutex::new(Vec::new()),
            record: true,
        }
    }

    /// Stops recording calls; for long-running servers.
    pub fn without_recording(mut self) -> Self {
        self.record = false;
        self
    }

    /// Holds every answer to `method` back by `delay`.
    pub fn delay(mut self, method: RpcMethod, delay: Duration) -> Self {
        self.delays.push((method, delay));
        self
    }

    /// Answer `method` the same way on every endpoint.
    pub fn respond(mut self, method: RpcMethod, response: Value) -> Self {
        self.routes.push(FixtureRoute {
            server: None,
            method,
            response,
        });
        self
    }

    /// Answer `method` on one endpoint only. Takes precedence over [`FixtureTransport::respond`].
    pub fn respond_on(mut self, server: &str, method: RpcMethod, response: Value) -> Self {
        self.routes.push(FixtureRoute {
            server: Some(server.to_string()),
            method,
            response,
        });
        self
    }

    pub fn fail_on(self, server: &str, method: RpcMethod, code: u32, message: &str) -> Self {
        self.respond_on(server, method, json!({ "result": code, "error": message }))
    }

    /// Loads a JSON object keyed by method name, e.g. `{"showpublink": {...}}`.
    pub fn from_file(path: &Path) -> Result<Self, PcloudError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PcloudError::MalformedResponse(format!("{}: {}", path.display(), e)))?;
        let table: HashMap<String, Value> = serde_json::from_str(&content)?;

        let mut transport = Self::new().without_recording();
        for (name, response) in table {
            let method: RpcMethod = name.parse()?;
            transport = transport.respond(method, response);
        }

        info!(
            "Loaded {} fixture responses from {:?}",
            transport.routes.len(),
            path
        );
        Ok(transport)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn call_count(&self, method: RpcMethod) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }

    fn lookup(&self, server: &str, method: RpcMethod) -> Option<&Value> {
        self.routes
            .iter()
            .find(|r| r.method == method && r.server.as_deref() == Some(server))
            .or_else(|| {
                self.routes
                    .iter()
                    .find(|r| r.method == method && r.server.is_none())
            })
            .map(|r| &r.response)
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn call(
        &self,
        server: &str,
        method: RpcMethod,
        params: &Params,
    ) -> Result<Value, PcloudError> {
        if self.record {
            self.calls
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(RecordedCall {
                    server: server.to_string(),
                    method,
                    params: params.clone(),
                });
        }

        if let Some((_, delay)) = self.delays.iter().find(|(m, _)| *m == method) {
            tokio::time::sleep(*delay).await;
        }

        self.lookup(server, method).cloned().ok_or_else(|| {
            PcloudError::MalformedResponse(format!("no fixture for {} on {}", method, server))
        })
    }

    fn name(&self) -> &str {
        "Fixture"
    }
}
