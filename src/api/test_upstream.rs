//! Implements the `Upstream` trait with an in-memory backend.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the
//! whole app, top-to-bottom, without the ledger backend.

use crate::api::{Upstream, UpstreamError};
use crate::model::{
    Amount, CategorySum, DropdownKind, DropdownOption, Envelope, Event, EventType,
    FormDataRequest, Stats, EVENT_LIMIT_MESSAGE,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

type Res<T> = std::result::Result<T, UpstreamError>;

const TYPES: &[&str] = &["income", "expense"];
const INCOME_CATEGORIES: &[&str] = &["salary", "petty cash", "allowance", "other"];
const EXPENSE_CATEGORIES: &[&str] = &[
    "household",
    "food",
    "health",
    "beauty",
    "transport",
    "fashion",
    "social",
    "education",
    "other",
];

/// Holds events in memory and answers like the ledger backend does. Dates are read in the
/// local timezone of the process, which in test mode is shared with the client.
pub(crate) struct TestUpstream {
    events: Mutex<Vec<Event>>,
    event_limit: usize,
}

impl TestUpstream {
    pub(crate) fn new(event_limit: usize) -> Self {
        Self::with_events(Vec::new(), event_limit)
    }

    pub(crate) fn with_events(events: Vec<Event>, event_limit: usize) -> Self {
        Self {
            events: Mutex::new(events),
            event_limit,
        }
    }

    fn events(&self) -> MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn day_of(event: &Event) -> Option<NaiveDate> {
    event.date_in(&Local)
}

fn in_month(event: &Event, year: i32, month: u32) -> bool {
    day_of(event).is_some_and(|d| d.year() == year && d.month() == month)
}

fn options(values: &[&str]) -> Vec<DropdownOption> {
    values
        .iter()
        .enumerate()
        .map(|(ix, v)| DropdownOption::new((ix + 1).to_string(), *v))
        .collect()
}

fn ok<T: Serialize>(message: &str, data: T) -> Envelope {
    match serde_json::to_value(data) {
        Ok(value) => Envelope::ok(message, value),
        Err(e) => Envelope::error(e.to_string()),
    }
}

#[async_trait::async_trait]
impl Upstream for TestUpstream {
    async fn dropdown(&self, kind: DropdownKind) -> Res<Envelope> {
        let values = match kind {
            DropdownKind::Type => TYPES,
            DropdownKind::Income => INCOME_CATEGORIES,
            DropdownKind::Expense => EXPENSE_CATEGORIES,
        };
        Ok(ok("success", options(values)))
    }

    async fn filter(&self, id: &str) -> Res<Envelope> {
        let events = self.events();
        let found: Vec<&Event> = events.iter().filter(|e| e.id == id).collect();
        if found.is_empty() {
            return Ok(Envelope::error("event not found"));
        }
        Ok(ok("success", found))
    }

    async fn upsert(&self, request: &FormDataRequest) -> Res<Envelope> {
        let request = request.clone().normalized();
        if Amount::from_str(&request.amount).is_err() {
            return Ok(Envelope::error("invalid amount"));
        }
        let mut event = Event {
            id: request.id.clone(),
            description: request.description,
            kind: request.kind,
            category: request.category,
            date: request.date,
            amount: request.amount,
        };
        let Some(day) = day_of(&event) else {
            return Ok(Envelope::error("invalid date"));
        };

        let mut events = self.events();
        let same_day = events
            .iter()
            .filter(|e| e.id != event.id && day_of(e) == Some(day))
            .count();
        if same_day >= self.event_limit {
            debug!("Rejecting event on {day}, it already holds {same_day}");
            return Ok(Envelope::error(EVENT_LIMIT_MESSAGE));
        }

        if event.id.is_empty() {
            event.id = uuid::Uuid::new_v4().simple().to_string();
            events.push(event.clone());
            return Ok(ok("event created", event));
        }
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => {
                *existing = event.clone();
                Ok(ok("event updated", event))
            }
            None => Ok(Envelope::error("event not found")),
        }
    }

    // The process zone stands in for `timezone`, test mode runs the client in this process.
    async fn month(&self, year: i32, month: u32, _timezone: Option<&str>) -> Res<Envelope> {
        let mut found: Vec<(NaiveDate, Event)> = self
            .events()
            .iter()
            .filter(|e| in_month(e, year, month))
            .filter_map(|e| day_of(e).map(|d| (d, e.clone())))
            .collect();
        found.sort_by(|(da, a), (db, b)| {
            da.cmp(db)
                .then_with(|| b.kind.as_str().cmp(a.kind.as_str()))
        });
        let events: Vec<Event> = found.into_iter().map(|(_, e)| e).collect();
        Ok(ok("success", events))
    }

    async fn sum(&self, year: i32, month: u32, _timezone: Option<&str>) -> Res<Envelope> {
        let mut totals: BTreeMap<&'static str, (EventType, BTreeMap<String, Amount>)> =
            BTreeMap::new();
        for event in self.events().iter().filter(|e| in_month(e, year, month)) {
            let Ok(amount) = Amount::from_str(&event.amount) else {
                continue;
            };
            let (_, categories) = totals
                .entry(event.kind.as_str())
                .or_insert_with(|| (event.kind, BTreeMap::new()));
            let sum = categories.entry(event.category.clone()).or_default();
            *sum = *sum + amount;
        }

        // expense before income, callers sort for display
        let stats: Vec<Stats> = totals
            .into_values()
            .map(|(kind, categories)| Stats {
                kind,
                sum: categories.values().copied().sum::<Amount>().wire(),
                categories: categories
                    .into_iter()
                    .map(|(category, sum)| CategorySum {
                        category,
                        sum: sum.wire(),
                    })
                    .collect(),
            })
            .collect();
        Ok(ok("success", stats))
    }
}
