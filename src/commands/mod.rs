//! Command handlers for the cashcal CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod calendar;
mod event;
mod serve;
mod theme;

use crate::client::{Api, ProxyClient};
use crate::ui::{FileSettings, Page, SessionLog, Settings, Telemetry};
use crate::{ClientConfig, Result};
use anyhow::anyhow;
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub use calendar::{calendar, stats};
pub use event::{add, edit};
pub use serve::serve;
pub use theme::theme;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data and a rendered view.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,

    /// Text drawn for the user, such as the calendar grid.
    #[serde(skip)]
    view: Option<String>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
            view: None,
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
            view: None,
        }
    }

    /// Attach a rendered view.
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    pub fn view(&self) -> Option<&str> {
        self.view.as_deref()
    }

    /// Print the view to stdout, the message to `info!` and the structured data (if it exists)
    /// as JSON to `debug!`.
    pub fn print(&self) {
        if let Some(view) = self.view() {
            println!("{view}");
        }
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// What a client command works with: the proxy, the persisted settings and a failure log that
/// is dumped at debug level when the session ends.
pub struct Session {
    api: Arc<dyn Api>,
    settings: Arc<dyn Settings>,
    telemetry: Arc<SessionLog>,
    config: ClientConfig,
    today: NaiveDate,
}

impl Session {
    /// Connects to the proxy named in `config`, with settings kept in `home`.
    pub fn connect(config: ClientConfig, home: &Path) -> Result<Self> {
        let api = Arc::new(
            ProxyClient::new(config.proxy_url().clone())?.with_timezone(config.timezone()),
        );
        let settings = Arc::new(FileSettings::new(home));
        Ok(Self::new(api, settings, config, Local::now().date_naive()))
    }

    pub fn new(
        api: Arc<dyn Api>,
        settings: Arc<dyn Settings>,
        config: ClientConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            api,
            settings,
            telemetry: Arc::new(SessionLog::new()),
            config,
            today,
        }
    }

    pub(crate) fn page(&self) -> Page {
        Page::new(
            self.api.clone(),
            self.settings.clone(),
            self.telemetry.clone(),
            self.config.clone(),
            self.today,
        )
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for entry in self.telemetry.entries() {
            debug!("Session log {}: {}", entry.timestamp.to_rfc3339(), entry.message);
        }
    }
}

/// Moves the page to `year`/`month` where given, keeping the displayed value otherwise.
fn navigate(page: &mut Page, year: Option<i32>, month: Option<u32>) -> Result<()> {
    if year.is_none() && month.is_none() {
        return Ok(());
    }
    let year = year.unwrap_or(page.date().year());
    let month = month.unwrap_or(page.date().month());
    if !page.go_to(year, month) {
        return Err(anyhow!(
            "{year}-{month:02} is outside the range of months that can be shown"
        ));
    }
    Ok(())
}

/// The failure the page is showing, as an error.
fn failure(page: &Page) -> crate::Error {
    match page.message() {
        Some((_, text)) => anyhow!("{text}"),
        None => anyhow!("The request failed"),
    }
}

/// Fails when the page is showing a failure.
fn check(page: &Page) -> Result<()> {
    match page.message() {
        Some(_) => Err(failure(page)),
        None => Ok(()),
    }
}
