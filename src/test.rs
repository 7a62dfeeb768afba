//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{TestUpstream, Upstream};
use crate::client::{AbortSignal, Api, ProxyClient, RequestError, Submitted};
use crate::config::{
    ENDPOINT_DROPDOWN_EXPENSE, ENDPOINT_DROPDOWN_INCOME, ENDPOINT_DROPDOWN_TYPE, ENDPOINT_FILTER,
    ENDPOINT_MONTH, ENDPOINT_SUM, ENDPOINT_UPSERT, TOKEN,
};
use crate::model::{DropdownKind, DropdownOption, Event, EventType, FormDataRequest, Stats};
use crate::{server, ClientConfig, ProxyConfig};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use chrono::{Datelike, Local};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A request received by the `StubBackend`.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

/// An event id the `StubBackend` takes ten seconds to look up.
pub const SLOW_ID: &str = "slow";

/// Stands in for the ledger backend behind `HttpUpstream`. It records every request and answers
/// with a success envelope, except:
/// - `POST /filter` with `_id` "fail" answers 200 with an error envelope, "no such event"
/// - `POST /filter` with `_id` [`SLOW_ID`] answers after ten seconds
/// - `GET /dropdown/expense` answers 502 with a body that is not an envelope
pub struct StubBackend {
    base: Url,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().fallback(stub).with_state(seen.clone());
        let addr = spawn(app).await;
        Self {
            base: Url::parse(&format!("http://{addr}/")).unwrap(),
            seen,
        }
    }

    /// How many requests reached the backend.
    pub fn hits(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<SeenRequest> {
        self.seen.lock().unwrap().last().cloned()
    }

    /// A complete configuration pointing at this backend, with token "test-token".
    pub fn proxy_config(&self) -> ProxyConfig {
        let base = self.base.clone();
        ProxyConfig::from_lookup(move |name| {
            let path = match name {
                ENDPOINT_UPSERT => "upsert",
                ENDPOINT_FILTER => "filter",
                ENDPOINT_MONTH => "month",
                ENDPOINT_SUM => "sum",
                ENDPOINT_DROPDOWN_TYPE => "dropdown/type",
                ENDPOINT_DROPDOWN_INCOME => "dropdown/income",
                ENDPOINT_DROPDOWN_EXPENSE => "dropdown/expense",
                TOKEN => return Some("test-token".to_string()),
                _ => return None,
            };
            base.join(path).ok().map(|u| u.to_string())
        })
        .unwrap()
    }
}

async fn stub(
    State(seen): State<Arc<Mutex<Vec<SeenRequest>>>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header = |name| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let request = SeenRequest {
        path: uri.path().to_string(),
        query: uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default(),
        authorization: header(AUTHORIZATION),
        content_type: header(CONTENT_TYPE),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    seen.lock().unwrap().push(request.clone());

    if request.path == "/dropdown/expense" {
        return (StatusCode::BAD_GATEWAY, "bad gateway").into_response();
    }
    if request.path == "/filter" && request.body["_id"] == SLOW_ID {
        tokio::time::sleep(Duration::from_secs(10)).await;
    }
    if request.path == "/filter" && request.body["_id"] == "fail" {
        let envelope = json!({ "is_error": true, "message": "no such event", "data": null });
        return Json(envelope).into_response();
    }
    Json(json!({ "is_error": false, "message": "success", "data": [] })).into_response()
}

/// Runs the proxy on an ephemeral port, backed by an in-memory `TestUpstream`.
pub struct TestEnv {
    base: Url,
    event_limit: usize,
}

impl TestEnv {
    pub async fn start(events: Vec<Event>, event_limit: usize) -> Self {
        let upstream: Arc<dyn Upstream> = Arc::new(TestUpstream::with_events(events, event_limit));
        Self::with_upstream(upstream, event_limit).await
    }

    /// Runs the proxy in front of `upstream`.
    pub async fn with_upstream(upstream: Arc<dyn Upstream>, event_limit: usize) -> Self {
        let addr = spawn(server::router(upstream)).await;
        Self {
            base: Url::parse(&format!("http://{addr}/")).unwrap(),
            event_limit,
        }
    }

    pub fn client(&self) -> ProxyClient {
        ProxyClient::new(self.base.clone()).unwrap()
    }

    /// Client settings for this proxy: a five second timeout and a one year navigation range.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(
            self.base.clone(),
            Duration::from_secs(5),
            12,
            self.event_limit,
        )
    }
}

/// A test event with an empty description.
pub fn event(id: &str, date: &str, kind: EventType, category: &str, amount: &str) -> Event {
    Event {
        id: id.into(),
        description: String::new(),
        kind,
        category: category.into(),
        date: date.into(),
        amount: amount.into(),
    }
}

struct FakeState {
    dropdowns: HashMap<DropdownKind, Vec<DropdownOption>>,
    events: Vec<Event>,
    stats: Vec<Stats>,
    submit: Result<Submitted, RequestError>,
    failure: Option<RequestError>,
    month_delay: Duration,
    delay: Duration,
    calls: Vec<String>,
    submitted: Vec<FormDataRequest>,
}

/// An `Api` for view model tests. It answers from memory, records each call and honors the
/// abort signal. A delay on month fetches races navigation; a delay on the other lookups
/// keeps the form and statistics busy.
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self::new()
    }
}

fn options(values: &[&str]) -> Vec<DropdownOption> {
    values
        .iter()
        .enumerate()
        .map(|(ix, v)| DropdownOption::new(ix.to_string(), *v))
        .collect()
}

impl FakeApi {
    /// Types `income` and `expense`, two categories each, no events.
    pub fn new() -> Self {
        let dropdowns = HashMap::from([
            (DropdownKind::Type, options(&["income", "expense"])),
            (DropdownKind::Income, options(&["salary", "allowance"])),
            (DropdownKind::Expense, options(&["food", "transport"])),
        ]);
        Self {
            state: Mutex::new(FakeState {
                dropdowns,
                events: Vec::new(),
                stats: Vec::new(),
                submit: Ok(Submitted::Saved),
                failure: None,
                month_delay: Duration::ZERO,
                delay: Duration::ZERO,
                calls: Vec::new(),
                submitted: Vec::new(),
            }),
        }
    }

    pub fn with_dropdown(self, kind: DropdownKind, values: &[&str]) -> Self {
        self.state.lock().unwrap().dropdowns.insert(kind, options(values));
        self
    }

    pub fn with_events(self, events: Vec<Event>) -> Self {
        self.state.lock().unwrap().events = events;
        self
    }

    pub fn with_stats(self, stats: Vec<Stats>) -> Self {
        self.state.lock().unwrap().stats = stats;
        self
    }

    pub fn with_submit(self, outcome: Result<Submitted, RequestError>) -> Self {
        self.state.lock().unwrap().submit = outcome;
        self
    }

    /// Every call fails with `error`.
    pub fn failing(self, error: RequestError) -> Self {
        self.state.lock().unwrap().failure = Some(error);
        self
    }

    pub fn with_month_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().month_delay = delay;
        self
    }

    /// Dropdown, event and statistics lookups answer after `delay`.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().delay = delay;
        self
    }

    /// Calls from now on fail with `error`, or succeed again for `None`.
    pub fn set_failure(&self, error: Option<RequestError>) {
        self.state.lock().unwrap().failure = error;
    }

    pub fn set_events(&self, events: Vec<Event>) {
        self.state.lock().unwrap().events = events;
    }

    /// The calls made so far, e.g. `dropdown:type`, `event:1`, `month:2024-3`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn submitted(&self) -> Vec<FormDataRequest> {
        self.state.lock().unwrap().submitted.clone()
    }

    fn call(&self, name: String) -> Result<(), RequestError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(name);
        match &state.failure {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn delay(&self) -> Duration {
        self.state.lock().unwrap().delay
    }
}

#[async_trait::async_trait]
impl Api for FakeApi {
    async fn dropdown(
        &self,
        kind: DropdownKind,
        signal: &AbortSignal,
    ) -> Result<Vec<DropdownOption>, RequestError> {
        self.call(format!("dropdown:{kind}"))?;
        let options = self.state.lock().unwrap().dropdowns.get(&kind).cloned();
        let delay = self.delay();
        signal
            .run(async move {
                tokio::time::sleep(delay).await;
                Ok(options.unwrap_or_default())
            })
            .await
    }

    async fn event_by_id(
        &self,
        id: &str,
        signal: &AbortSignal,
    ) -> Result<Option<Event>, RequestError> {
        self.call(format!("event:{id}"))?;
        let found = self
            .state
            .lock()
            .unwrap()
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned();
        let delay = self.delay();
        signal
            .run(async move {
                tokio::time::sleep(delay).await;
                Ok(found)
            })
            .await
    }

    async fn submit(
        &self,
        request: &FormDataRequest,
        signal: &AbortSignal,
    ) -> Result<Submitted, RequestError> {
        self.call("submit".to_string())?;
        let outcome = {
            let mut state = self.state.lock().unwrap();
            state.submitted.push(request.clone());
            state.submit.clone()
        };
        signal.run(async { outcome }).await
    }

    async fn events_by_month(
        &self,
        year: i32,
        month: u32,
        signal: &AbortSignal,
    ) -> Result<Vec<Event>, RequestError> {
        self.call(format!("month:{year}-{month}"))?;
        let (events, delay) = {
            let state = self.state.lock().unwrap();
            let events: Vec<Event> = state
                .events
                .iter()
                .filter(|e| {
                    e.date_in(&Local)
                        .is_some_and(|d| d.year() == year && d.month() == month)
                })
                .cloned()
                .collect();
            (events, state.month_delay)
        };
        signal
            .run(async move {
                tokio::time::sleep(delay).await;
                Ok(events)
            })
            .await
    }

    async fn stats(
        &self,
        year: i32,
        month: u32,
        signal: &AbortSignal,
    ) -> Result<Vec<Stats>, RequestError> {
        self.call(format!("stats:{year}-{month}"))?;
        let stats = self.state.lock().unwrap().stats.clone();
        let delay = self.delay();
        signal
            .run(async move {
                tokio::time::sleep(delay).await;
                Ok(stats)
            })
            .await
    }
}
