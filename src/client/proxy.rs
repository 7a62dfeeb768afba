//! Implements the `Api` trait against the proxy routes.

use crate::client::{AbortSignal, Api, RequestError, Submitted};
use crate::config::local_timezone;
use crate::model::{DropdownKind, DropdownOption, Envelope, Event, FormDataRequest, Stats};
use crate::Result;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::trace;
use url::Url;

/// Talks to the proxy server at `base`. Month queries carry `timezone` so that the backend
/// cuts months where the client does.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    base: Url,
    timezone: String,
}

impl ProxyClient {
    pub fn new(base: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self {
            client,
            base,
            timezone: local_timezone(),
        })
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    fn month_query(&self, year: i32, month: u32) -> [(&'static str, String); 3] {
        [
            ("year", year.to_string()),
            ("month", month.to_string()),
            ("timezone", self.timezone.clone()),
        ]
    }

    fn url(&self, path: &str) -> std::result::Result<Url, RequestError> {
        self.base
            .join(path)
            .map_err(|e| RequestError::Transport(format!("bad proxy URL: {e}")))
    }

    /// Sends the request and reads the envelope. An envelope is read whatever the status, since
    /// the proxy reports application errors with 500.
    async fn fetch(
        &self,
        request: reqwest::RequestBuilder,
        signal: &AbortSignal,
    ) -> std::result::Result<Envelope, RequestError> {
        signal
            .run(async {
                let response = request.send().await.map_err(transport)?;
                let status = response.status();
                let body = response.bytes().await.map_err(transport)?;
                trace!("Proxy answered {status}");
                serde_json::from_slice::<Envelope>(&body).map_err(|e| {
                    if status.is_success() {
                        RequestError::Decode(e.to_string())
                    } else {
                        RequestError::Transport(format!("the server responded with {status}"))
                    }
                })
            })
            .await
    }

    /// Like `fetch`, but application errors become `RequestError::Application` and the data is
    /// decoded as `T`.
    async fn fetch_data<T>(
        &self,
        request: reqwest::RequestBuilder,
        signal: &AbortSignal,
    ) -> std::result::Result<Option<T>, RequestError>
    where
        T: DeserializeOwned,
    {
        let envelope = self.fetch(request, signal).await?;
        if envelope.is_error {
            return Err(RequestError::Application(envelope.message));
        }
        decode(envelope)
    }
}

fn transport(e: reqwest::Error) -> RequestError {
    if e.is_timeout() {
        RequestError::TimedOut
    } else {
        RequestError::Transport(e.to_string())
    }
}

fn decode<T: DeserializeOwned>(envelope: Envelope) -> std::result::Result<Option<T>, RequestError> {
    envelope
        .decode::<T>()
        .map(|e| e.data)
        .map_err(|e| RequestError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl Api for ProxyClient {
    async fn dropdown(
        &self,
        kind: DropdownKind,
        signal: &AbortSignal,
    ) -> std::result::Result<Vec<DropdownOption>, RequestError> {
        let url = self.url("api/dropdown")?;
        let request = self.client.get(url).query(&[("type", kind.to_string())]);
        Ok(self.fetch_data(request, signal).await?.unwrap_or_default())
    }

    async fn event_by_id(
        &self,
        id: &str,
        signal: &AbortSignal,
    ) -> std::result::Result<Option<Event>, RequestError> {
        let url = self.url("api/event")?;
        let request = self.client.post(url).json(&json!({ "_id": id }));
        let events: Option<Vec<Event>> = self.fetch_data(request, signal).await?;
        Ok(events.and_then(|list| list.into_iter().next()))
    }

    async fn submit(
        &self,
        request: &FormDataRequest,
        signal: &AbortSignal,
    ) -> std::result::Result<Submitted, RequestError> {
        let url = self.url("api/form")?;
        let envelope = self
            .fetch(self.client.post(url).json(request), signal)
            .await?;
        if envelope.is_event_limit() {
            Ok(Submitted::EventLimit(envelope.message))
        } else if envelope.is_error {
            Err(RequestError::Application(envelope.message))
        } else {
            Ok(Submitted::Saved)
        }
    }

    async fn events_by_month(
        &self,
        year: i32,
        month: u32,
        signal: &AbortSignal,
    ) -> std::result::Result<Vec<Event>, RequestError> {
        let url = self.url("api/month")?;
        let request = self.client.get(url).query(&self.month_query(year, month));
        Ok(self.fetch_data(request, signal).await?.unwrap_or_default())
    }

    async fn stats(
        &self,
        year: i32,
        month: u32,
        signal: &AbortSignal,
    ) -> std::result::Result<Vec<Stats>, RequestError> {
        let url = self.url("api/stat")?;
        let request = self.client.get(url).query(&self.month_query(year, month));
        Ok(self.fetch_data(request, signal).await?.unwrap_or_default())
    }
}
