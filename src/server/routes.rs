use crate::api::{Upstream, UpstreamError, MISSING_CONFIG_MESSAGE};
use crate::model::{DropdownKind, Envelope, FormDataRequest};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error};

type Backend = State<Arc<dyn Upstream>>;

const PARAMS_MESSAGE: &str = "unable to get url params";
const BODY_MESSAGE: &str = "invalid request body";
const METHOD_MESSAGE: &str = "Method Not Allowed";

#[derive(Debug, Deserialize)]
pub(super) struct DropdownQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MonthQuery {
    year: Option<String>,
    month: Option<String>,
    timezone: Option<String>,
}

impl MonthQuery {
    fn parse(&self) -> Option<(i32, u32)> {
        let year = self.year.as_deref()?.trim().parse::<i32>().ok()?;
        let month = self.month.as_deref()?.trim().parse::<u32>().ok()?;
        (1..=12).contains(&month).then_some((year, month))
    }

    /// The caller's zone. `Some(None)` when it was not sent, `None` when it is not a zone name.
    fn timezone(&self) -> Option<Option<&str>> {
        let Some(tz) = self.timezone.as_deref().map(str::trim) else {
            return Some(None);
        };
        let valid = !tz.is_empty()
            && tz
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '+'));
        valid.then_some(Some(tz))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct EventFilter {
    #[serde(rename = "_id")]
    id: String,
}

pub(super) async fn dropdown(
    State(upstream): Backend,
    query: Result<Query<DropdownQuery>, QueryRejection>,
) -> Response {
    let kind = query
        .ok()
        .and_then(|Query(q)| q.kind)
        .and_then(|k| DropdownKind::from_str(&k).ok());
    let Some(kind) = kind else {
        return failure(PARAMS_MESSAGE);
    };
    respond(upstream.dropdown(kind).await, false)
}

pub(super) async fn event(
    State(upstream): Backend,
    body: Result<Json<EventFilter>, JsonRejection>,
) -> Response {
    let Ok(Json(filter)) = body else {
        return failure(BODY_MESSAGE);
    };
    respond(upstream.filter(&filter.id).await, false)
}

pub(super) async fn form(
    State(upstream): Backend,
    body: Result<Json<FormDataRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request.normalized(),
        Err(e) => {
            debug!("Rejected form body: {e}");
            return failure(BODY_MESSAGE);
        }
    };
    respond(upstream.upsert(&request).await, true)
}

pub(super) async fn stat(
    State(upstream): Backend,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return failure(PARAMS_MESSAGE);
    };
    let (Some((year, month)), Some(timezone)) = (query.parse(), query.timezone()) else {
        return failure(PARAMS_MESSAGE);
    };
    respond(upstream.sum(year, month, timezone).await, false)
}

pub(super) async fn month(
    State(upstream): Backend,
    query: Result<Query<MonthQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return failure(PARAMS_MESSAGE);
    };
    let (Some((year, month)), Some(timezone)) = (query.parse(), query.timezone()) else {
        return failure(PARAMS_MESSAGE);
    };
    respond(upstream.month(year, month, timezone).await, false)
}

pub(super) async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(Envelope::<Value>::error(METHOD_MESSAGE)),
    )
        .into_response()
}

/// Passes the envelope through: 500 when it reports an error, 200 otherwise. The event limit
/// rejection counts as success when `tolerate_event_limit` is set.
fn respond(result: Result<Envelope, UpstreamError>, tolerate_event_limit: bool) -> Response {
    match result {
        Ok(envelope) => {
            let fatal = envelope.is_error && !(tolerate_event_limit && envelope.is_event_limit());
            let status = if fatal {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            (status, Json(envelope)).into_response()
        }
        Err(UpstreamError::MissingConfig(name)) => {
            error!("{name} is not configured");
            failure(MISSING_CONFIG_MESSAGE)
        }
        Err(e) => {
            error!("{e}");
            failure(&e.to_string())
        }
    }
}

fn failure(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Envelope::<Value>::error(message)),
    )
        .into_response()
}
