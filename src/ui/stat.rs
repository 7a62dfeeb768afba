use crate::client::{AbortController, Api, RequestError};
use crate::model::{format_amount, sort_stats, EventType, Stats};
use crate::ui::{Closable, Spinner};
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

pub const NO_DATA: &str = "No data available";

/// Monthly totals per type, with one type's categories expanded at a time.
pub struct Stat {
    api: Arc<dyn Api>,
    timeout: Duration,
    closable: Closable,
    controller: AbortController,
    year: i32,
    month: u32,
    data: Vec<Stats>,
    visible: Option<EventType>,
    loading: bool,
}

impl Stat {
    pub fn new(
        api: Arc<dyn Api>,
        timeout: Duration,
        closable: Closable,
        year: i32,
        month: u32,
    ) -> Self {
        Self {
            api,
            timeout,
            closable,
            controller: AbortController::new(),
            year,
            month,
            data: Vec::new(),
            visible: None,
            loading: false,
        }
    }

    pub async fn load(&mut self) -> Result<(), RequestError> {
        let _busy = self.closable.busy();
        self.loading = true;
        let signal = self.controller.signal(self.timeout);
        let result = self.api.stats(self.year, self.month, &signal).await;
        self.loading = false;
        let mut data = result?;
        sort_stats(&mut data);
        self.data = data;
        Ok(())
    }

    pub fn abort(&self) {
        self.controller.abort();
    }

    pub fn data(&self) -> &[Stats] {
        &self.data
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The type whose categories are shown.
    pub fn visible(&self) -> Option<EventType> {
        self.visible
    }

    /// Shows the categories of `kind`, or hides them when they are already shown.
    pub fn toggle(&mut self, kind: EventType) {
        self.visible = if self.visible == Some(kind) {
            None
        } else {
            Some(kind)
        };
    }

    pub fn render(&self) -> String {
        if self.loading {
            return Spinner.to_string();
        }
        if self.data.is_empty() {
            return NO_DATA.to_string();
        }
        let mut out = String::new();
        for stats in &self.data {
            let _ = writeln!(out, "{}", stats.kind);
            let _ = writeln!(out, "  {}", format_amount(&stats.sum));
            if self.visible == Some(stats.kind) {
                for c in &stats.categories {
                    let _ = writeln!(out, "    {:<12} {}", c.category, format_amount(&c.sum));
                }
            }
        }
        out.truncate(out.trim_end().len());
        out
    }
}
