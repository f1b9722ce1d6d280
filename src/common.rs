use crate::error::ClientError;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize, PartialEq)]
pub struct FeedReading {
    #[serde(default, deserialize_with = "deserialize_field_value")]
    pub field1: Option<String>, // water level, percent
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Text(String),
    Number(serde_json::Number),
}

fn deserialize_field_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<FieldValue> = Deserialize::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        FieldValue::Text(s) => s,
        FieldValue::Number(n) => n.to_string(),
    }))
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct FeedResponse {
    pub feeds: Vec<FeedReading>, // index 0: most recent
}

impl FeedResponse {
    pub fn latest_level(&self) -> Option<&str> {
        self.feeds.first().and_then(|feed| feed.field1.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpAction {
    TurnOn,
    TurnOff,
}

impl PumpAction {
    pub fn field_value(self) -> u8 {
        match self {
            PumpAction::TurnOn => 1,
            PumpAction::TurnOff => 0,
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            PumpAction::TurnOn => "Bomba encendida!",
            PumpAction::TurnOff => "Bomba apagada!",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Completion delivered back to the UI loop.
#[derive(Debug)]
pub enum UiEvent {
    Reading(Result<String, ClientError>),
    Command {
        action: PumpAction,
        result: Result<(), ClientError>,
    },
}

#[cfg(test)]
mod test {
    use super::{FeedResponse, PumpAction};

    #[test]
    fn decodes_thingspeak_body() {
        let body = r#"{
            "channel": {"id": 2782709, "name": "Nivel", "field1": "Nivel"},
            "feeds": [{"created_at": "2024-12-10T14:02:11Z", "entry_id": 88, "field1": "42"}]
        }"#;
        let response: FeedResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.latest_level(), Some("42"));
    }

    #[test]
    fn latest_level_unavailable() {
        let empty: FeedResponse = serde_json::from_str(r#"{"feeds": []}"#).unwrap();
        let null_field: FeedResponse =
            serde_json::from_str(r#"{"feeds": [{"field1": null}]}"#).unwrap();
        let missing_field: FeedResponse =
            serde_json::from_str(r#"{"feeds": [{"entry_id": 3}]}"#).unwrap();

        assert_eq!(empty.latest_level(), None);
        assert_eq!(null_field.latest_level(), None);
        assert_eq!(missing_field.latest_level(), None);
    }

    #[test]
    fn numeric_field_accepted() {
        let integer: FeedResponse =
            serde_json::from_str(r#"{"feeds": [{"field1": 42}]}"#).unwrap();
        let decimal: FeedResponse =
            serde_json::from_str(r#"{"feeds": [{"field1": 7.5}]}"#).unwrap();

        assert_eq!(integer.latest_level(), Some("42"));
        assert_eq!(decimal.latest_level(), Some("7.5"));
        let boolean = serde_json::from_str::<FeedResponse>(r#"{"feeds": [{"field1": true}]}"#);

        assert!(boolean.is_err());
    }

    #[test]
    fn pump_action_field_values() {
        assert_eq!(PumpAction::TurnOn.field_value(), 1);
        assert_eq!(PumpAction::TurnOff.field_value(), 0);
    }
}
