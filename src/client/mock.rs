//! Scripted in-memory client for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use futures::future::BoxFuture;
use serde_json::Value;

use super::{ServiceCall, ServiceClient, ServiceFault};

/// A request the mock received.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub service: String,
    pub operation: String,
    pub request: Value,
    pub region: Option<String>,
}

/// Answers calls from a queue; an empty queue answers `{}`.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    responses: Mutex<VecDeque<Result<Value, ServiceFault>>>,
    calls: Mutex<Vec<RecordedCall>>,
    region: Option<String>,
    /// When set, calls past the end of the queue wait for cancellation
    hang: bool,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Result<Value, ServiceFault>>) -> Self {
        ScriptedClient {
            responses: Mutex::new(responses.into()),
            ..Default::default()
        }
    }

    pub fn hanging() -> Self {
        ScriptedClient {
            hang: true,
            ..Default::default()
        }
    }

    /// Answer the queued responses, then hang.
    pub fn then_hang(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ServiceClient for ScriptedClient {
    fn call<'a>(&'a self, call: ServiceCall<'a>) -> BoxFuture<'a, Result<Value, ServiceFault>> {
        self.calls.lock().unwrap().push(RecordedCall {
            service: call.service.to_string(),
            operation: call.operation.to_string(),
            request: call.request.to_json(),
            region: call.overrides.region.clone(),
        });
        let next = self.responses.lock().unwrap().pop_front();
        let hang = self.hang;
        Box::pin(async move {
            match next {
                Some(result) => result,
                None if hang => {
                    call.cancel.cancelled().await;
                    Err(ServiceFault::Cancelled)
                }
                None => Ok(Value::Object(serde_json::Map::new())),
            }
        })
    }

    fn default_region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}
