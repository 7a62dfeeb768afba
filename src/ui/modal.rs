use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// The frame style of a modal. `None` draws no header and cannot be dismissed by clicking
/// outside.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalKind {
    Info,
    Warning,
    Error,
    None,
}

serde_plain::derive_display_from_serialize!(ModalKind);
serde_plain::derive_fromstr_from_deserialize!(ModalKind);

/// What the modal shows.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ModalRequest {
    /// The event form, for a new event when `event_id` is `None`.
    Form {
        title: String,
        date: NaiveDate,
        event_id: Option<String>,
    },
    /// Statistics for a month, `month` 1-based.
    Stat { year: i32, month: u32 },
    Message {
        kind: ModalKind,
        header: String,
        text: String,
    },
    Loading,
}

impl ModalRequest {
    pub fn kind(&self) -> ModalKind {
        match self {
            ModalRequest::Form { .. } | ModalRequest::Stat { .. } => ModalKind::Info,
            ModalRequest::Message { kind, .. } => *kind,
            ModalRequest::Loading => ModalKind::None,
        }
    }

    fn custom_header(&self) -> &str {
        match self {
            ModalRequest::Form { title, .. } => title,
            ModalRequest::Stat { .. } => "statistics",
            ModalRequest::Message { header, .. } => header,
            ModalRequest::Loading => "",
        }
    }

    pub fn header_text(&self) -> String {
        header_text(self.kind(), self.custom_header())
    }
}

/// The custom header in uppercase, else the uppercase kind name. Kind `None` has no default
/// header.
pub fn header_text(kind: ModalKind, custom: &str) -> String {
    if !custom.is_empty() {
        custom.to_uppercase()
    } else if kind == ModalKind::None {
        String::new()
    } else {
        kind.to_string().to_uppercase()
    }
}

/// Whether the modal may currently be dismissed. Content that is loading holds a `BusyGuard`;
/// the modal is closable again once every guard is dropped. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct Closable {
    busy: Arc<AtomicUsize>,
}

impl Closable {
    pub fn busy(&self) -> BusyGuard {
        self.busy.fetch_add(1, Ordering::SeqCst);
        BusyGuard {
            busy: self.busy.clone(),
        }
    }

    pub fn is_closable(&self) -> bool {
        self.busy.load(Ordering::SeqCst) == 0
    }
}

#[derive(Debug)]
pub struct BusyGuard {
    busy: Arc<AtomicUsize>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Shows at most one `ModalRequest` at a time.
#[derive(Debug, Default)]
pub struct ModalHost {
    current: Option<ModalRequest>,
    closable: Closable,
}

impl ModalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `request`, replacing whatever was shown.
    pub fn open(&mut self, request: ModalRequest) {
        self.current = Some(request);
    }

    /// The close button. Always closes.
    pub fn close(&mut self) {
        self.current = None;
    }

    /// A click outside the modal. Ignored for kind `None` and while the content is busy.
    /// Returns whether the modal closed.
    pub fn dismiss(&mut self) -> bool {
        let Some(current) = &self.current else {
            return false;
        };
        if current.kind() == ModalKind::None || !self.closable.is_closable() {
            return false;
        }
        self.current = None;
        true
    }

    pub fn current(&self) -> Option<&ModalRequest> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    /// The flag handed to the content of the modal.
    pub fn closable(&self) -> Closable {
        self.closable.clone()
    }

    /// Frames `body` with the header of the current request. Nothing when closed.
    pub fn render(&self, body: &str) -> String {
        let Some(current) = &self.current else {
            return String::new();
        };
        let header = current.header_text();
        if current.kind() == ModalKind::None || header.is_empty() {
            return body.to_string();
        }
        format!("[{}] {header}\n{body}", current.kind())
    }
}
