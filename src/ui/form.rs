//! The event form: a local draft plus the option lists that feed its selectors.
//!
//! Loading happens in a fixed order. The type list comes first and its first option is selected,
//! then the category list of that type. Only after both are in is an existing event fetched and
//! copied over the draft.

use crate::calendar::format_date_html;
use crate::client::{AbortController, AbortSignal, Api, RequestError};
use crate::model::{
    first_value, format_amount, strip_grouping, DropdownKind, DropdownOption, EventType, FormData,
};
use crate::ui::{Closable, Spinner};
use chrono::{Local, NaiveDate};
use std::fmt::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const NO_OPTIONS: &str = "No options available";

pub struct Form {
    api: Arc<dyn Api>,
    timeout: Duration,
    closable: Closable,
    controller: AbortController,
    event_id: Option<String>,
    draft: FormData,
    types: Vec<DropdownOption>,
    categories: Vec<DropdownOption>,
    loading: bool,
}

impl Form {
    /// A form for a new event on `date`, or for the event `event_id`.
    pub fn new(
        api: Arc<dyn Api>,
        timeout: Duration,
        closable: Closable,
        date: NaiveDate,
        event_id: Option<String>,
    ) -> Self {
        Self {
            api,
            timeout,
            closable,
            controller: AbortController::new(),
            event_id,
            draft: FormData::new(date),
            types: Vec::new(),
            categories: Vec::new(),
            loading: false,
        }
    }

    pub fn draft(&self) -> &FormData {
        &self.draft
    }

    pub fn types(&self) -> &[DropdownOption] {
        &self.types
    }

    pub fn categories(&self) -> &[DropdownOption] {
        &self.categories
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Cancels whatever the form is fetching.
    pub fn abort(&self) {
        self.controller.abort();
    }

    fn signal(&self) -> AbortSignal {
        self.controller.signal(self.timeout)
    }

    /// Fetches the option lists and, when editing, the event.
    pub async fn load(&mut self) -> Result<(), RequestError> {
        let _busy = self.closable.busy();
        self.loading = true;
        let result = self.load_inner().await;
        self.loading = false;
        result
    }

    async fn load_inner(&mut self) -> Result<(), RequestError> {
        self.types = self.api.dropdown(DropdownKind::Type, &self.signal()).await?;
        self.draft.kind = first_value(&self.types).and_then(|v| EventType::from_str(v).ok());
        if let Some(kind) = self.draft.kind {
            self.fetch_categories(kind, false).await?;
        }

        let Some(id) = self.event_id.clone() else {
            return Ok(());
        };
        let event = self
            .api
            .event_by_id(&id, &self.signal())
            .await?
            .ok_or_else(|| RequestError::Application(format!("event {id} not found")))?;
        let selected = self.draft.kind;
        self.draft.fill_from(&event, &Local);
        if selected != Some(event.kind) {
            debug!("Event {id} is {}, reloading its categories", event.kind);
            self.fetch_categories(event.kind, true).await?;
        }
        Ok(())
    }

    async fn fetch_categories(
        &mut self,
        kind: EventType,
        keep_selection: bool,
    ) -> Result<(), RequestError> {
        let list = DropdownKind::categories_of(kind);
        self.categories = self.api.dropdown(list, &self.signal()).await?;
        if !keep_selection {
            self.draft.category = first_value(&self.categories)
                .unwrap_or_default()
                .to_string();
        }
        Ok(())
    }

    /// Changes the type and reloads the categories, selecting the first. When the categories
    /// cannot be fetched the type, category and list stay as they were.
    pub async fn select_type(&mut self, kind: EventType) -> Result<(), RequestError> {
        if self.draft.kind == Some(kind) {
            return Ok(());
        }
        let _busy = self.closable.busy();
        self.loading = true;
        let result = self.fetch_categories(kind, false).await;
        if result.is_ok() {
            self.draft.kind = Some(kind);
        }
        self.loading = false;
        result
    }

    pub fn select_category(&mut self, category: impl Into<String>) {
        self.draft.category = category.into();
    }

    /// Stores the input reformatted with thousands separators.
    pub fn input_amount(&mut self, input: &str) {
        self.draft.amount = format_amount(input);
    }

    pub fn input_description(&mut self, description: impl Into<String>) {
        self.draft.description = description.into();
    }

    pub fn input_date(&mut self, date: NaiveDate) {
        self.draft.date = date;
    }

    /// Restores an empty draft on the same date.
    pub fn reset(&mut self) {
        self.draft = FormData::new(self.draft.date);
    }

    /// The draft as it is handed to the page, with the amount grouping removed.
    pub fn submit(&self) -> FormData {
        let mut data = self.draft.clone();
        data.amount = strip_grouping(&data.amount);
        data
    }

    pub fn render(&self) -> String {
        if self.loading {
            return Spinner.to_string();
        }
        let kind = self.draft.kind.map(|k| k.to_string()).unwrap_or_default();
        let mut out = String::new();
        let _ = writeln!(out, "Date:        {}", format_date_html(self.draft.date));
        let _ = writeln!(out, "Amount:      {}", self.draft.amount);
        let _ = writeln!(out, "Type:        {kind} [{}]", render_options(&self.types));
        let _ = writeln!(
            out,
            "Category:    {} [{}]",
            self.draft.category,
            render_options(&self.categories)
        );
        let _ = write!(out, "Description: {}", self.draft.description);
        out
    }
}

/// The option values joined for display, or the placeholder when there are none.
pub fn render_options(options: &[DropdownOption]) -> String {
    if options.is_empty() {
        return NO_OPTIONS.to_string();
    }
    options
        .iter()
        .map(|o| o.value.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{event, FakeApi};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn form(api: Arc<FakeApi>, event_id: Option<&str>) -> Form {
        Form::new(
            api,
            Duration::from_secs(5),
            Closable::default(),
            date(2024, 3, 5),
            event_id.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_load_selects_first_options() {
        let api = Arc::new(FakeApi::new());
        let mut form = form(api.clone(), None);
        form.load().await.unwrap();
        assert_eq!(form.draft().kind, Some(EventType::Income));
        assert_eq!(form.draft().category, "salary");
        assert_eq!(api.calls(), vec!["dropdown:type", "dropdown:income"]);
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn test_empty_lists_leave_fields_unset() {
        let api = Arc::new(FakeApi::new().with_dropdown(DropdownKind::Type, &[]));
        let mut form = form(api.clone(), None);
        form.load().await.unwrap();
        assert_eq!(form.draft().kind, None);
        assert_eq!(form.draft().category, "");
        assert_eq!(api.calls(), vec!["dropdown:type"]);
        let rendered = form.render();
        assert!(rendered.contains("Type:         [No options available]"));
        assert!(rendered.contains("Category:     [No options available]"));
    }

    #[tokio::test]
    async fn test_edit_fetches_event_after_dropdowns() {
        let api = Arc::new(FakeApi::new().with_events(vec![event(
            "e1",
            "2024-03-09",
            EventType::Expense,
            "transport",
            "1234.5",
        )]));
        let mut form = form(api.clone(), Some("e1"));
        form.load().await.unwrap();
        assert_eq!(
            api.calls(),
            vec!["dropdown:type", "dropdown:income", "event:e1", "dropdown:expense"]
        );
        let draft = form.draft();
        assert_eq!(draft.kind, Some(EventType::Expense));
        assert_eq!(draft.category, "transport");
        assert_eq!(draft.amount, "1,234.5");
        assert_eq!(draft.date, date(2024, 3, 9));
        assert_eq!(draft.id, "e1");
        assert_eq!(form.categories()[0].value, "food");
    }

    #[tokio::test]
    async fn test_edit_same_type_does_not_refetch() {
        let api = Arc::new(FakeApi::new().with_events(vec![event(
            "e1",
            "2024-03-09",
            EventType::Income,
            "allowance",
            "50",
        )]));
        let mut form = form(api.clone(), Some("e1"));
        form.load().await.unwrap();
        assert_eq!(api.calls(), vec!["dropdown:type", "dropdown:income", "event:e1"]);
        assert_eq!(form.draft().category, "allowance");
    }

    #[tokio::test]
    async fn test_edit_unknown_event() {
        let api = Arc::new(FakeApi::new());
        let mut form = form(api, Some("missing"));
        let err = form.load().await.unwrap_err();
        assert!(matches!(err, RequestError::Application(_)));
    }

    #[tokio::test]
    async fn test_select_type_reloads_categories() {
        let api = Arc::new(FakeApi::new());
        let mut form = form(api.clone(), None);
        form.load().await.unwrap();
        form.select_type(EventType::Expense).await.unwrap();
        assert_eq!(form.draft().category, "food");
        form.select_category("transport");
        assert_eq!(form.draft().category, "transport");
        form.select_type(EventType::Expense).await.unwrap();
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_amount_reset_and_submit() {
        let api = Arc::new(FakeApi::new());
        let mut form = form(api, None);
        form.load().await.unwrap();
        form.input_amount("1234567.891");
        assert_eq!(form.draft().amount, "1,234,567.891");
        form.input_description("rent");
        let submitted = form.submit();
        assert_eq!(submitted.amount, "1234567.891");
        assert_eq!(submitted.description, "rent");

        form.reset();
        assert_eq!(form.draft(), &FormData::new(date(2024, 3, 5)));
    }

    #[tokio::test]
    async fn test_select_type_failure_keeps_selection() {
        let api = Arc::new(FakeApi::new());
        let mut form = form(api.clone(), None);
        form.load().await.unwrap();

        api.set_failure(Some(RequestError::Transport("down".into())));
        let err = form.select_type(EventType::Expense).await.unwrap_err();
        assert_eq!(err, RequestError::Transport("down".into()));
        assert_eq!(form.draft().kind, Some(EventType::Income));
        assert_eq!(form.draft().category, "salary");
        assert_eq!(form.categories()[0].value, "salary");
        assert!(!form.is_loading());

        api.set_failure(None);
        form.select_type(EventType::Expense).await.unwrap();
        assert_eq!(form.draft().kind, Some(EventType::Expense));
        assert_eq!(form.draft().category, "food");
    }

    #[tokio::test]
    async fn test_not_closable_while_loading() {
        let api = Arc::new(FakeApi::new().with_delay(Duration::from_millis(100)));
        let closable = Closable::default();
        let mut form = Form::new(
            api,
            Duration::from_secs(5),
            closable.clone(),
            date(2024, 3, 5),
            None,
        );
        assert!(closable.is_closable());

        let running = tokio::spawn(async move {
            let result = form.load().await;
            (form, result)
        });
        tokio::task::yield_now().await;
        assert!(!closable.is_closable());

        let (form, result) = running.await.unwrap();
        result.unwrap();
        assert!(closable.is_closable());
        assert_eq!(form.draft().category, "salary");
    }

    #[tokio::test]
    async fn test_aborted_load() {
        let api = Arc::new(FakeApi::new());
        let mut form = form(api, None);
        form.abort();
        let err = form.load().await.unwrap_err();
        assert_eq!(err, RequestError::Aborted);
        assert!(!form.is_loading());
    }
}
