//! View models for the calendar client. Each component keeps its own state and renders to plain
//! text; `Page` composes them and talks to the injected `Api`, `Settings` and `Telemetry`.

mod form;
mod grid;
mod header;
mod modal;
mod page;
mod settings;
mod spinner;
mod stat;
mod telemetry;

pub use form::{render_options, Form, NO_OPTIONS};
pub use grid::{Grid, CREATE_TITLE, EDIT_TITLE};
pub use header::Header;
pub use modal::{header_text, BusyGuard, Closable, ModalHost, ModalKind, ModalRequest};
pub use page::{MonthFetch, Page, PendingSubmit, EVENT_LIMIT_HEADER, TIMEOUT_HEADER, TIMEOUT_TEXT};
pub use settings::{FileSettings, MemorySettings, Settings, Theme, SETTINGS_FILE};
pub use spinner::Spinner;
pub use stat::{Stat, NO_DATA};
pub use telemetry::{LogEntry, SessionLog, Telemetry};
