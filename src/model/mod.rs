//! Types that represent the data model, such as `Event`, `Stats` and the response `Envelope`.
mod amount;
mod dropdown;
mod envelope;
mod event;
mod stats;

pub use amount::{format_amount, strip_grouping, Amount, AmountError};
pub use dropdown::{first_value, DropdownKind, DropdownOption};
pub use envelope::{Envelope, EVENT_LIMIT_MESSAGE};
pub use event::{to_wire_date, Event, EventType, FormData, FormDataRequest, FormError};
pub use stats::{sort_stats, CategorySum, Stats};
