//! Configuration for the proxy server and the calendar client.
//!
//! The proxy reads its upstream endpoints and bearer token from the process environment (which
//! `main` seeds from a `.env` file). Endpoints may be missing: a route whose configuration is
//! missing fails closed when it is called. A present but malformed URL is rejected at startup.
//!
//! The client reads its constants from the command line or environment through `clap`, see
//! `args::ClientArgs`.

use crate::calendar::MonthRange;
use crate::model::DropdownKind;
use crate::Result;
use anyhow::Context;
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const ENDPOINT_UPSERT: &str = "ENDPOINT_UPSERT";
pub const ENDPOINT_FILTER: &str = "ENDPOINT_FILTER";
pub const ENDPOINT_MONTH: &str = "ENDPOINT_MONTH";
pub const ENDPOINT_SUM: &str = "ENDPOINT_SUM";
pub const ENDPOINT_DROPDOWN_TYPE: &str = "ENDPOINT_DROPDOWN_TYPE";
pub const ENDPOINT_DROPDOWN_INCOME: &str = "ENDPOINT_DROPDOWN_INCOME";
pub const ENDPOINT_DROPDOWN_EXPENSE: &str = "ENDPOINT_DROPDOWN_EXPENSE";
pub const TOKEN: &str = "TOKEN";
pub const TIMEZONE: &str = "TIMEZONE";
pub const UPSTREAM_TIMEOUT: &str = "UPSTREAM_TIMEOUT";

const DEFAULT_TIMEZONE: &str = "UTC";
const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// The upstream endpoints and credentials used by the proxy routes.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    upsert: Option<Url>,
    filter: Option<Url>,
    month: Option<Url>,
    sum: Option<Url>,
    dropdown_type: Option<Url>,
    dropdown_income: Option<Url>,
    dropdown_expense: Option<Url>,
    token: Option<String>,
    timezone: String,
    upstream_timeout: Duration,
}

impl ProxyConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a variable by name.
    /// Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let url = |name: &str| -> Result<Option<Url>> {
            get(name)
                .map(|v| {
                    Url::parse(v.trim()).with_context(|| format!("{name} is not a valid URL: '{v}'"))
                })
                .transpose()
        };

        let upstream_timeout = match get(UPSTREAM_TIMEOUT) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .with_context(|| {
                    format!("{UPSTREAM_TIMEOUT} must be a positive number of milliseconds: '{v}'")
                })?,
            None => DEFAULT_UPSTREAM_TIMEOUT,
        };

        Ok(Self {
            upsert: url(ENDPOINT_UPSERT)?,
            filter: url(ENDPOINT_FILTER)?,
            month: url(ENDPOINT_MONTH)?,
            sum: url(ENDPOINT_SUM)?,
            dropdown_type: url(ENDPOINT_DROPDOWN_TYPE)?,
            dropdown_income: url(ENDPOINT_DROPDOWN_INCOME)?,
            dropdown_expense: url(ENDPOINT_DROPDOWN_EXPENSE)?,
            token: get(TOKEN),
            timezone: get(TIMEZONE).unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            upstream_timeout,
        })
    }

    pub fn upsert(&self) -> Option<&Url> {
        self.upsert.as_ref()
    }

    pub fn filter(&self) -> Option<&Url> {
        self.filter.as_ref()
    }

    pub fn month(&self) -> Option<&Url> {
        self.month.as_ref()
    }

    pub fn sum(&self) -> Option<&Url> {
        self.sum.as_ref()
    }

    pub fn dropdown(&self, kind: DropdownKind) -> Option<&Url> {
        match kind {
            DropdownKind::Type => self.dropdown_type.as_ref(),
            DropdownKind::Income => self.dropdown_income.as_ref(),
            DropdownKind::Expense => self.dropdown_expense.as_ref(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The IANA zone name forwarded to the month and sum endpoints when the caller sends none.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    /// How long a single backend request may take.
    pub fn upstream_timeout(&self) -> Duration {
        self.upstream_timeout
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Names of the variables that are not set, for a startup warning.
    pub fn missing(&self) -> Vec<&'static str> {
        let checks = [
            (ENDPOINT_UPSERT, self.upsert.is_some()),
            (ENDPOINT_FILTER, self.filter.is_some()),
            (ENDPOINT_MONTH, self.month.is_some()),
            (ENDPOINT_SUM, self.sum.is_some()),
            (ENDPOINT_DROPDOWN_TYPE, self.dropdown_type.is_some()),
            (ENDPOINT_DROPDOWN_INCOME, self.dropdown_income.is_some()),
            (ENDPOINT_DROPDOWN_EXPENSE, self.dropdown_expense.is_some()),
            (TOKEN, self.token.is_some()),
        ];
        checks
            .into_iter()
            .filter_map(|(name, present)| (!present).then_some(name))
            .collect()
    }
}

/// The constants the calendar client runs with.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    proxy_url: Url,
    request_timeout: Duration,
    month_range: MonthRange,
    event_limit: usize,
    timezone: String,
}

impl ClientConfig {
    pub fn new(
        proxy_url: Url,
        request_timeout: Duration,
        month_range_limit: u32,
        event_limit: usize,
    ) -> Self {
        Self {
            proxy_url,
            request_timeout,
            month_range: MonthRange::new(month_range_limit),
            event_limit,
            timezone: local_timezone(),
        }
    }

    /// Replaces the zone name sent with month queries. It must name the zone the process runs
    /// in, since dates are read with the local offset.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    /// The base URL of the proxy server.
    pub fn proxy_url(&self) -> &Url {
        &self.proxy_url
    }

    /// How long any single request may take.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn month_range(&self) -> MonthRange {
        self.month_range
    }

    /// The most events a single day may hold.
    pub fn event_limit(&self) -> usize {
        self.event_limit
    }

    /// The IANA zone name sent with month queries.
    pub fn timezone(&self) -> &str {
        &self.timezone
    }
}

/// The IANA name of the zone `chrono::Local` uses: `TZ` when it is set, the system zone
/// otherwise.
pub fn local_timezone() -> String {
    if let Some(tz) = std::env::var("TZ")
        .ok()
        .map(|v| v.trim_start_matches(':').trim().to_string())
        .filter(|v| !v.is_empty())
    {
        return tz;
    }
    match iana_time_zone::get_timezone() {
        Ok(tz) => tz,
        Err(e) => {
            warn!("Unable to read the system timezone, using {DEFAULT_TIMEZONE}: {e}");
            DEFAULT_TIMEZONE.to_string()
        }
    }
}
