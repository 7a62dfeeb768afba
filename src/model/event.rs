use crate::model::{format_amount, strip_grouping, Amount};
use chrono::{
    DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Whether an event brings money in or takes it out.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(EventType);
serde_plain::derive_fromstr_from_deserialize!(EventType);

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Income => "income",
            EventType::Expense => "expense",
        }
    }

    /// The sign used when listing an event of this type.
    pub fn sign(&self) -> char {
        match self {
            EventType::Income => '+',
            EventType::Expense => '-',
        }
    }
}

/// A dated financial event as stored by the backend.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub category: String,
    /// ISO 8601, either a full timestamp or a plain date.
    pub date: String,
    /// Plain decimal string.
    pub amount: String,
}

impl Event {
    /// The calendar date of this event as seen from `tz`. Timestamps carrying an offset are
    /// converted into `tz`; timestamps without one and plain dates are taken as they are.
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.date) {
            return Some(dt.with_timezone(tz).date_naive());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(&self.date, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt.date());
        }
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }
}

/// The editable draft behind the event form.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FormData {
    pub description: String,
    /// Display form, with thousands separators.
    pub amount: String,
    /// Unset until the type dropdown has loaded.
    pub kind: Option<EventType>,
    /// Empty until the category dropdown has loaded.
    pub category: String,
    pub date: NaiveDate,
    /// Empty for a new event.
    pub id: String,
}

impl FormData {
    /// An empty draft for a new event on `date`.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            description: String::new(),
            amount: String::new(),
            kind: None,
            category: String::new(),
            date,
            id: String::new(),
        }
    }

    /// Overwrites the draft with a stored event.
    pub fn fill_from<Tz: TimeZone>(&mut self, event: &Event, tz: &Tz) {
        if let Some(date) = event.date_in(tz) {
            self.date = date;
        }
        self.amount = format_amount(&event.amount);
        self.kind = Some(event.kind);
        self.category = event.category.clone();
        self.description = event.description.clone();
        self.id = event.id.clone();
    }

    /// Converts the draft to its wire shape. The date becomes local midnight in `tz`, expressed
    /// in UTC, and the amount loses its grouping.
    pub fn to_request<Tz: TimeZone>(&self, tz: &Tz) -> Result<FormDataRequest, FormError> {
        let kind = self.kind.ok_or(FormError::MissingType)?;
        if self.category.is_empty() {
            return Err(FormError::MissingCategory);
        }
        let amount = Amount::from_str(&self.amount)
            .map_err(|_| FormError::InvalidAmount(self.amount.clone()))?;
        Ok(FormDataRequest {
            description: self.description.clone(),
            amount: amount.wire(),
            kind,
            category: self.category.clone(),
            date: to_wire_date(self.date, tz),
            id: self.id.clone(),
        })
    }
}

/// The body posted to the upsert route.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct FormDataRequest {
    #[serde(default)]
    pub description: String,
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub category: String,
    pub date: String,
    #[serde(rename = "_id", default)]
    pub id: String,
}

impl FormDataRequest {
    /// Returns a copy whose amount has no thousands separators.
    pub fn normalized(mut self) -> Self {
        self.amount = strip_grouping(&self.amount);
        self
    }
}

/// Why a draft could not be turned into a request.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("a type must be selected")]
    MissingType,
    #[error("a category must be selected")]
    MissingCategory,
    #[error("'{0}' is not a valid amount")]
    InvalidAmount(String),
}

/// Local midnight of `date` in `tz`, as a UTC RFC 3339 timestamp with milliseconds.
pub fn to_wire_date<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> String {
    let midnight = date.and_time(NaiveTime::MIN);
    let utc = match tz.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&midnight),
    };
    utc.to_rfc3339_opts(SecondsFormat::Millis, true)
}
