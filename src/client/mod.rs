//! The calendar client's view of the proxy routes.
//!
//! Every operation takes an [`AbortSignal`] and returns a concrete type for its endpoint; the
//! response envelope is decoded and checked here so that callers never see raw JSON.

mod abort;
mod proxy;

use crate::model::{DropdownKind, DropdownOption, Event, FormDataRequest, Stats};
use thiserror::Error;

pub use abort::{AbortController, AbortSignal};
pub use proxy::ProxyClient;

/// The outcome of posting the form.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Submitted {
    Saved,
    /// The day is full. Carries the backend's message.
    EventLimit(String),
}

/// Why a request produced no result.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum RequestError {
    #[error("The request was cancelled")]
    Aborted,
    #[error("The request timed out")]
    TimedOut,
    /// The backend answered with `is_error`.
    #[error("{0}")]
    Application(String),
    #[error("Unable to reach the server: {0}")]
    Transport(String),
    #[error("Unexpected response from the server: {0}")]
    Decode(String),
}

impl RequestError {
    /// Cancellation and timeouts can be retried, the rest cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RequestError::Aborted | RequestError::TimedOut)
    }
}

/// The same-origin API used by the view models.
#[async_trait::async_trait]
pub trait Api: Send + Sync {
    /// Options for one dropdown. A response without data yields an empty list.
    async fn dropdown(
        &self,
        kind: DropdownKind,
        signal: &AbortSignal,
    ) -> Result<Vec<DropdownOption>, RequestError>;

    /// The event with `id`, if the backend knows it.
    async fn event_by_id(&self, id: &str, signal: &AbortSignal)
        -> Result<Option<Event>, RequestError>;

    async fn submit(
        &self,
        request: &FormDataRequest,
        signal: &AbortSignal,
    ) -> Result<Submitted, RequestError>;

    /// Events of a month, `month` 1-based.
    async fn events_by_month(
        &self,
        year: i32,
        month: u32,
        signal: &AbortSignal,
    ) -> Result<Vec<Event>, RequestError>;

    /// Statistics of a month, `month` 1-based.
    async fn stats(
        &self,
        year: i32,
        month: u32,
        signal: &AbortSignal,
    ) -> Result<Vec<Stats>, RequestError>;
}
