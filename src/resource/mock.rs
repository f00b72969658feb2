//! Recording mock downstream for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{GatewayError, Result};
use crate::resource::{Query, ResourceLocator, ResourceService};

/// A programmed downstream outcome.
#[derive(Debug, Clone)]
pub(crate) enum MockOutcome {
    Ok(Value),
    NotFound,
    ClientError(u16, Value),
    ServerError(u16),
}

/// One downstream call as the mock saw it.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub verb: &'static str,
    pub target: String,
    pub query: Query,
    pub payload: Value,
}

/// [`ResourceService`] that replays programmed outcomes and records every
/// call. Outcomes are keyed by `"{verb} {locator}"` (for example
/// `"get generic.buyer"` or `"patch generic.transaction(12)"`) and are
/// consumed in FIFO order. An unprogrammed call panics so a test cannot
/// silently reach the downstream more often than it asserted.
#[derive(Debug, Default)]
pub(crate) struct MockService {
    responses: Mutex<HashMap<String, VecDeque<MockOutcome>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues `outcome` for the next call matching `key`.
    pub(crate) fn respond(&self, key: &str, outcome: MockOutcome) {
        self.responses
            .lock()
            .unwrap()
            .entry(key.to_owned())
            .or_default()
            .push_back(outcome);
    }

    /// Every call made so far, in order.
    pub(crate) fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// How many calls matched `verb` and `target`.
    pub(crate) fn call_count(&self, verb: &str, target: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.verb == verb && call.target == target)
            .count()
    }

    fn outcome(
        &self,
        verb: &'static str,
        locator: &ResourceLocator,
        query: &Query,
        payload: &Value,
    ) -> Result<Value> {
        let target = locator.to_string();
        self.calls.lock().unwrap().push(RecordedCall {
            verb,
            target: target.clone(),
            query: query.clone(),
            payload: payload.clone(),
        });

        let key = format!("{verb} {target}");
        let outcome = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| panic!("unexpected downstream call: {key}"));
        match outcome {
            MockOutcome::Ok(value) => Ok(value),
            MockOutcome::NotFound => Err(GatewayError::NotFound(target)),
            MockOutcome::ClientError(status, body) => {
                Err(GatewayError::ClientError { status, body })
            }
            MockOutcome::ServerError(status) => Err(GatewayError::ServerError { status }),
        }
    }
}

impl ResourceService for MockService {
    async fn get(&self, locator: &ResourceLocator, query: &Query) -> Result<Value> {
        self.outcome("get", locator, query, &Value::Null)
    }

    async fn post(&self, locator: &ResourceLocator, payload: &Value) -> Result<Value> {
        self.outcome("post", locator, &Query::new(), payload)
    }

    async fn patch(&self, locator: &ResourceLocator, payload: &Value) -> Result<Value> {
        self.outcome("patch", locator, &Query::new(), payload)
    }
}
