use crate::model::EventType;
use serde::{Deserialize, Serialize};

/// A key/value pair populating a select input.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub key: String,
    pub value: String,
}

impl DropdownOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Which option list to fetch: the list of event types, or the categories for one type.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropdownKind {
    Type,
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(DropdownKind);
serde_plain::derive_fromstr_from_deserialize!(DropdownKind);

impl DropdownKind {
    /// The category list that belongs to events of `kind`.
    pub fn categories_of(kind: EventType) -> Self {
        match kind {
            EventType::Income => DropdownKind::Income,
            EventType::Expense => DropdownKind::Expense,
        }
    }
}

/// The value of the first option, which becomes the selection when a list loads.
pub fn first_value(options: &[DropdownOption]) -> Option<&str> {
    options.first().map(|o| o.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_kind_round_trips_through_query_value() {
        assert_eq!(DropdownKind::Type.to_string(), "type");
        assert_eq!(DropdownKind::from_str("expense").unwrap(), DropdownKind::Expense);
        assert!(DropdownKind::from_str("").is_err());
    }

    #[test]
    fn test_categories_of() {
        assert_eq!(
            DropdownKind::categories_of(EventType::Income),
            DropdownKind::Income
        );
        assert_eq!(
            DropdownKind::categories_of(EventType::Expense),
            DropdownKind::Expense
        );
    }

    #[test]
    fn test_first_value() {
        let options = vec![DropdownOption::new("1", "food"), DropdownOption::new("2", "health")];
        assert_eq!(first_value(&options), Some("food"));
        assert_eq!(first_value(&[]), None);
    }
}
