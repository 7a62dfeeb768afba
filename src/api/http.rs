//! Implements the `Upstream` trait by forwarding to the backend over HTTP.

use crate::api::{Upstream, UpstreamError};
use crate::model::{DropdownKind, Envelope, FormDataRequest};
use crate::{ProxyConfig, Result};
use anyhow::Context;
use reqwest::header::CONTENT_TYPE;
use reqwest::RequestBuilder;
use serde_json::json;
use tracing::trace;
use url::Url;

type Res<T> = std::result::Result<T, UpstreamError>;

/// Forwards each operation to the endpoint configured for it, authenticated with the bearer
/// token. Missing configuration is detected before any request is built.
pub(crate) struct HttpUpstream {
    client: reqwest::Client,
    config: ProxyConfig,
}

impl HttpUpstream {
    pub(crate) fn new(config: ProxyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout())
            .build()
            .context("Unable to create the HTTP client")?;
        Ok(Self { client, config })
    }

    fn token(&self) -> Res<&str> {
        self.config
            .token()
            .ok_or(UpstreamError::MissingConfig(crate::config::TOKEN))
    }

    fn get(&self, url: &Url, token: &str) -> RequestBuilder {
        self.client
            .get(url.clone())
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
    }

    fn post<B: serde::Serialize + ?Sized>(&self, url: &Url, token: &str, body: &B) -> RequestBuilder {
        // `json` sets the content type
        self.client.post(url.clone()).bearer_auth(token).json(body)
    }

    async fn send(&self, url: &Url, request: RequestBuilder) -> Res<Envelope> {
        trace!("Forwarding to {url}");
        let response = request
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                url: url.to_string(),
                source,
            })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| UpstreamError::Transport {
                url: url.to_string(),
                source,
            })?;
        match serde_json::from_slice::<Envelope>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(UpstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }),
            Err(source) => Err(UpstreamError::Decode {
                url: url.to_string(),
                source,
            }),
        }
    }

    fn month_query(
        &self,
        year: i32,
        month: u32,
        timezone: Option<&str>,
    ) -> [(&'static str, String); 3] {
        let timezone = timezone.unwrap_or(self.config.timezone());
        [
            ("year", year.to_string()),
            ("month", month.to_string()),
            ("timezone", timezone.to_string()),
        ]
    }
}

fn required<'a>(url: Option<&'a Url>, name: &'static str) -> Res<&'a Url> {
    url.ok_or(UpstreamError::MissingConfig(name))
}

#[async_trait::async_trait]
impl Upstream for HttpUpstream {
    async fn dropdown(&self, kind: DropdownKind) -> Res<Envelope> {
        let name = match kind {
            DropdownKind::Type => crate::config::ENDPOINT_DROPDOWN_TYPE,
            DropdownKind::Income => crate::config::ENDPOINT_DROPDOWN_INCOME,
            DropdownKind::Expense => crate::config::ENDPOINT_DROPDOWN_EXPENSE,
        };
        let url = required(self.config.dropdown(kind), name)?;
        let token = self.token()?;
        self.send(url, self.get(url, token)).await
    }

    async fn filter(&self, id: &str) -> Res<Envelope> {
        let url = required(self.config.filter(), crate::config::ENDPOINT_FILTER)?;
        let token = self.token()?;
        let body = json!({ "_id": id });
        self.send(url, self.post(url, token, &body)).await
    }

    async fn upsert(&self, request: &FormDataRequest) -> Res<Envelope> {
        let url = required(self.config.upsert(), crate::config::ENDPOINT_UPSERT)?;
        let token = self.token()?;
        self.send(url, self.post(url, token, request)).await
    }

    async fn month(&self, year: i32, month: u32, timezone: Option<&str>) -> Res<Envelope> {
        let url = required(self.config.month(), crate::config::ENDPOINT_MONTH)?;
        let token = self.token()?;
        let query = self.month_query(year, month, timezone);
        let request = self.get(url, token).query(&query);
        self.send(url, request).await
    }

    async fn sum(&self, year: i32, month: u32, timezone: Option<&str>) -> Res<Envelope> {
        let url = required(self.config.sum(), crate::config::ENDPOINT_SUM)?;
        let token = self.token()?;
        let query = self.month_query(year, month, timezone);
        let request = self.get(url, token).query(&query);
        self.send(url, request).await
    }
}
