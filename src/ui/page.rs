//! The top-level view model. It owns the displayed month, the events of that month, the modal
//! and the theme, and it is the one place where failures are shown to the user.

use crate::calendar::{first_of_month, group_by_day, shift_month, EventsByDay};
use crate::client::{AbortController, AbortSignal, Api, RequestError, Submitted};
use crate::model::{Event, FormData, FormDataRequest};
use crate::ui::{
    Form, Grid, Header, ModalHost, ModalKind, ModalRequest, Settings, Spinner, Stat, Telemetry,
    Theme,
};
use crate::ClientConfig;
use chrono::{Datelike, Local, NaiveDate};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const TIMEOUT_HEADER: &str = "Request timed out";
pub const TIMEOUT_TEXT: &str = "Please try again";
pub const EVENT_LIMIT_HEADER: &str = "event limit";

/// A month fetch that has been started but not applied. The result of `run` must be handed
/// back to `Page::apply_month_fetch`, which drops it if a newer fetch has begun since.
pub struct MonthFetch {
    seq: u64,
    year: i32,
    month: u32,
    signal: AbortSignal,
    api: Arc<dyn Api>,
}

impl MonthFetch {
    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub async fn run(&self) -> Result<Vec<Event>, RequestError> {
        self.api
            .events_by_month(self.year, self.month, &self.signal)
            .await
    }
}

/// A submission that has been posted but not applied. The page shows the spinner until the
/// result of `run` is handed to `Page::apply_submit`.
pub struct PendingSubmit {
    form_data: FormData,
    request: FormDataRequest,
    signal: AbortSignal,
    api: Arc<dyn Api>,
}

impl PendingSubmit {
    pub async fn run(&self) -> Result<Submitted, RequestError> {
        self.api.submit(&self.request, &self.signal).await
    }
}

pub struct Page {
    api: Arc<dyn Api>,
    settings: Arc<dyn Settings>,
    telemetry: Arc<dyn Telemetry>,
    config: ClientConfig,
    today: NaiveDate,
    date: NaiveDate,
    events_by_day: EventsByDay,
    modal: ModalHost,
    theme: Theme,
    fetch: Option<AbortController>,
    fetch_seq: u64,
}

impl Page {
    /// A page showing the month of `today`.
    pub fn new(
        api: Arc<dyn Api>,
        settings: Arc<dyn Settings>,
        telemetry: Arc<dyn Telemetry>,
        config: ClientConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            api,
            settings,
            telemetry,
            config,
            today,
            date: first_of_month(today),
            events_by_day: EventsByDay::new(),
            modal: ModalHost::new(),
            theme: Theme::default(),
            fetch: None,
            fetch_seq: 0,
        }
    }

    /// Reads the theme and fetches the displayed month.
    pub async fn load(&mut self) {
        self.load_theme().await;
        self.refresh().await;
    }

    /// Reads the theme. An unreadable setting falls back to the default.
    pub async fn load_theme(&mut self) {
        self.theme = match self.settings.theme().await {
            Ok(theme) => theme,
            Err(e) => {
                warn!("Unable to read the theme, using the default: {e:#}");
                Theme::default()
            }
        };
    }

    /// The first day of the displayed month.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn events_by_day(&self) -> &EventsByDay {
        &self.events_by_day
    }

    pub fn modal(&self) -> &ModalHost {
        &self.modal
    }

    pub fn modal_mut(&mut self) -> &mut ModalHost {
        &mut self.modal
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn header(&self) -> Header {
        Header::new(self.date, self.today, self.config.month_range(), self.theme)
    }

    pub fn grid(&self) -> Grid<'_> {
        Grid::new(
            self.date.year(),
            self.date.month(),
            &self.events_by_day,
            self.config.event_limit(),
        )
    }

    pub fn next_month(&mut self) -> bool {
        self.header().next_enabled() && self.move_by(1)
    }

    pub fn prev_month(&mut self) -> bool {
        self.header().prev_enabled() && self.move_by(-1)
    }

    /// Shows `year`/`month` if it lies within the navigable range.
    pub fn go_to(&mut self, year: i32, month: u32) -> bool {
        let Some(target) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return false;
        };
        let range = self.config.month_range();
        let within = match (range.min(self.today), range.max(self.today)) {
            (Some(min), Some(max)) => min <= target && target <= max,
            _ => false,
        };
        if within && target != self.date {
            self.abort_fetch();
            self.date = target;
        }
        within
    }

    fn move_by(&mut self, delta: i32) -> bool {
        let Some(date) = shift_month(self.date, delta) else {
            return false;
        };
        self.abort_fetch();
        self.date = date;
        true
    }

    fn abort_fetch(&mut self) {
        if let Some(controller) = self.fetch.take() {
            debug!("Aborting the month fetch in flight");
            controller.abort();
        }
    }

    /// Starts fetching the displayed month, cancelling the fetch in flight.
    pub fn begin_month_fetch(&mut self) -> MonthFetch {
        self.abort_fetch();
        let controller = AbortController::new();
        let signal = controller.signal(self.config.request_timeout());
        self.fetch = Some(controller);
        self.fetch_seq += 1;
        MonthFetch {
            seq: self.fetch_seq,
            year: self.date.year(),
            month: self.date.month(),
            signal,
            api: self.api.clone(),
        }
    }

    /// Stores the events of a finished fetch. Returns false, changing nothing, when the fetch
    /// was aborted or superseded.
    pub fn apply_month_fetch(
        &mut self,
        fetch: MonthFetch,
        result: Result<Vec<Event>, RequestError>,
    ) -> bool {
        if fetch.signal.is_aborted() || fetch.seq != self.fetch_seq {
            debug!(
                "Discarding the result for {}-{}, it is stale",
                fetch.year, fetch.month
            );
            return false;
        }
        self.fetch = None;
        match result {
            Ok(events) => {
                self.events_by_day = group_by_day(events, fetch.year, fetch.month, &Local)
            }
            Err(e) => self.report(&e),
        }
        true
    }

    /// Fetches the displayed month and applies the result.
    pub async fn refresh(&mut self) {
        let fetch = self.begin_month_fetch();
        let result = fetch.run().await;
        self.apply_month_fetch(fetch, result);
    }

    /// Opens the form for a new event on `day` of the displayed month. Nothing happens for a
    /// padding cell or a full day.
    pub fn open_create(&mut self, day: u32) -> bool {
        let request = self.grid().create(day);
        self.open(request)
    }

    pub fn open_edit(&mut self, id: &str, day: u32) -> bool {
        let request = self.grid().edit(id, day);
        self.open(request)
    }

    pub fn open_stats(&mut self) {
        self.modal.open(ModalRequest::Stat {
            year: self.date.year(),
            month: self.date.month(),
        });
    }

    fn open(&mut self, request: Option<ModalRequest>) -> bool {
        match request {
            Some(request) => {
                self.modal.open(request);
                true
            }
            None => false,
        }
    }

    /// The form for the open form modal.
    pub fn form_view(&self) -> Option<Form> {
        match self.modal.current()? {
            ModalRequest::Form { date, event_id, .. } => Some(Form::new(
                self.api.clone(),
                self.config.request_timeout(),
                self.modal.closable(),
                *date,
                event_id.clone(),
            )),
            _ => None,
        }
    }

    /// The statistics for the open stat modal.
    pub fn stat_view(&self) -> Option<Stat> {
        match self.modal.current()? {
            ModalRequest::Stat { year, month } => Some(Stat::new(
                self.api.clone(),
                self.config.request_timeout(),
                self.modal.closable(),
                *year,
                *month,
            )),
            _ => None,
        }
    }

    /// Replaces the form with the spinner and starts posting `form_data`. An invalid draft is
    /// reported and nothing is posted.
    pub fn begin_submit(&mut self, form_data: FormData) -> Option<PendingSubmit> {
        let request = match form_data.to_request(&Local) {
            Ok(request) => request,
            Err(e) => {
                self.notify(ModalKind::Error, "", &e.to_string());
                return None;
            }
        };
        self.modal.open(ModalRequest::Loading);
        Some(PendingSubmit {
            form_data,
            request,
            signal: AbortSignal::timeout(self.config.request_timeout()),
            api: self.api.clone(),
        })
    }

    /// Takes down the spinner. A saved event refreshes the month; a full day only warns.
    /// Returns `None` when the submission failed, after reporting it.
    pub async fn apply_submit(
        &mut self,
        pending: PendingSubmit,
        result: Result<Submitted, RequestError>,
    ) -> Option<Submitted> {
        match result {
            Ok(Submitted::Saved) => {
                self.modal.close();
                self.refresh().await;
                Some(Submitted::Saved)
            }
            Ok(Submitted::EventLimit(message)) => {
                let text = format!("No more events can be added on {}", pending.form_data.date);
                self.notify(ModalKind::Warning, EVENT_LIMIT_HEADER, &text);
                Some(Submitted::EventLimit(message))
            }
            Err(e) => {
                self.report(&e);
                None
            }
        }
    }

    /// Posts `form_data` and applies the outcome.
    pub async fn submit(&mut self, form_data: FormData) -> Option<Submitted> {
        let pending = self.begin_submit(form_data)?;
        let result = pending.run().await;
        self.apply_submit(pending, result).await
    }

    /// Switches between light and dark and saves the choice.
    pub async fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Err(e) = self.settings.set_theme(self.theme).await {
            self.notify(ModalKind::Error, "", &format!("{e:#}"));
        }
        self.theme
    }

    /// Shows a failed request: cancellations and timeouts as a warning inviting a retry,
    /// everything else as an error.
    pub fn report(&mut self, error: &RequestError) {
        if error.is_retryable() {
            self.notify(ModalKind::Warning, TIMEOUT_HEADER, TIMEOUT_TEXT);
        } else {
            self.notify(ModalKind::Error, "", &error.to_string());
        }
    }

    fn notify(&mut self, kind: ModalKind, header: &str, text: &str) {
        let line = if header.is_empty() {
            format!("{kind}: {text}")
        } else {
            format!("{kind}: {header}: {text}")
        };
        match kind {
            ModalKind::Error => error!("{line}"),
            _ => warn!("{line}"),
        }
        self.telemetry.record(&line);
        self.modal.open(ModalRequest::Message {
            kind,
            header: header.to_string(),
            text: text.to_string(),
        });
    }

    /// The message of the open message modal, if any.
    pub fn message(&self) -> Option<(ModalKind, &str)> {
        match self.modal.current()? {
            ModalRequest::Message { kind, text, .. } => Some((*kind, text.as_str())),
            _ => None,
        }
    }

    /// Header, grid and, when it shows a message or the spinner, the modal.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n\n{}", self.header().render(), self.grid().render());
        let body = match self.modal.current() {
            Some(ModalRequest::Message { text, .. }) => Some(text.clone()),
            Some(ModalRequest::Loading) => Some(Spinner.to_string()),
            _ => None,
        };
        if let Some(body) = body {
            out.push_str("\n\n");
            out.push_str(&self.modal.render(&body));
        }
        out
    }
}
