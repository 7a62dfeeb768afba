use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The business message the backend uses when a day cannot take another event. It is a
/// warning, not a failure.
pub const EVENT_LIMIT_MESSAGE: &str = "event limit";

/// The uniform `{is_error, message, data}` wrapper around every backend response.
///
/// The proxy passes `Envelope<Value>` through untouched. The client decodes `data` into the
/// type each endpoint promises with [`Envelope::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub is_error: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            is_error: false,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            message: message.into(),
            data: None,
        }
    }

    /// True when this is the "event limit" rejection.
    pub fn is_event_limit(&self) -> bool {
        self.is_error && self.message == EVENT_LIMIT_MESSAGE
    }
}

impl Envelope<Value> {
    /// Decodes `data` into `T`. A missing or null `data` decodes to `None`.
    pub fn decode<T>(self) -> serde_json::Result<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        let data = match self.data {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value)?),
        };
        Ok(Envelope {
            is_error: self.is_error,
            message: self.message,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DropdownOption;
    use serde_json::json;

    #[test]
    fn test_decode_data() {
        let raw: Envelope = serde_json::from_value(json!({
            "is_error": false,
            "message": "ok",
            "data": [{"key": "1", "value": "income"}]
        }))
        .unwrap();
        let decoded: Envelope<Vec<DropdownOption>> = raw.decode().unwrap();
        assert_eq!(decoded.data.unwrap()[0].value, "income");
    }

    #[test]
    fn test_decode_missing_and_null_data() {
        let raw: Envelope = serde_json::from_value(json!({"is_error": true})).unwrap();
        assert_eq!(raw.message, "");
        let decoded: Envelope<Vec<DropdownOption>> = raw.decode().unwrap();
        assert!(decoded.data.is_none());

        let raw: Envelope =
            serde_json::from_value(json!({"is_error": false, "message": "", "data": null}))
                .unwrap();
        let decoded: Envelope<Vec<DropdownOption>> = raw.decode().unwrap();
        assert!(decoded.data.is_none());
    }

    #[test]
    fn test_decode_wrong_shape() {
        let raw: Envelope =
            serde_json::from_value(json!({"is_error": false, "data": {"key": 1}})).unwrap();
        assert!(raw.decode::<Vec<DropdownOption>>().is_err());
    }

    #[test]
    fn test_event_limit() {
        assert!(Envelope::<Value>::error(EVENT_LIMIT_MESSAGE).is_event_limit());
        assert!(!Envelope::<Value>::error("boom").is_event_limit());
        assert!(!Envelope::ok(EVENT_LIMIT_MESSAGE, Value::Null).is_event_limit());
    }

    #[test]
    fn test_error_serializes_null_data() {
        let value = serde_json::to_value(Envelope::<Value>::error("unable to load .env")).unwrap();
        assert_eq!(
            value,
            json!({"is_error": true, "message": "unable to load .env", "data": null})
        );
    }
}
