//! WAQI `map/bounds` payload shape and response classification
//!
//! A response is `{"status": ..., "data": ...}`. On success `data` is a list
//! of station entries; on failure it is a message string such as
//! `"Over quota"` or `"Invalid key"`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATUS_OK: &str = "ok";
pub const STATUS_ERROR: &str = "error";

/// Error message WAQI returns once the request quota is exhausted
pub const MSG_OVER_QUOTA: &str = "Over quota";

/// Error message WAQI returns for an unknown token
pub const MSG_INVALID_KEY: &str = "Invalid key";

/// Decoded, unclassified API response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub status: String,
    #[serde(default)]
    pub data: Value,
}

/// One entry of the `data` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawStation {
    #[serde(default)]
    pub aqi: AqiValue,
    pub station: StationInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationInfo {
    pub name: String,
}

/// The `aqi` field, which WAQI sends as a string (`"23"`, `"-"`) or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AqiValue {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Default for AqiValue {
    fn default() -> Self {
        AqiValue::Other(Value::Null)
    }
}

impl AqiValue {
    /// Numeric reading, if the value is a finite non-negative number
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            AqiValue::Number(v) => *v,
            AqiValue::Text(s) => s.trim().parse::<f64>().ok()?,
            AqiValue::Other(_) => return None,
        };
        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

/// A response sorted into the cases a sample task has to handle
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Stations(Vec<RawStation>),
    OverQuota(String),
    InvalidKey(String),
    Malformed(String),
}

impl RawResponse {
    pub fn ok(stations: Vec<RawStation>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            data: serde_json::to_value(stations).unwrap_or(Value::Array(Vec::new())),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            data: Value::String(message.into()),
        }
    }

    pub fn classify(self) -> Classified {
        match (self.status.as_str(), self.data) {
            (STATUS_OK, data @ Value::Array(_)) => {
                match serde_json::from_value::<Vec<RawStation>>(data) {
                    Ok(stations) => Classified::Stations(stations),
                    Err(e) => Classified::Malformed(format!("invalid station entry: {}", e)),
                }
            }
            (STATUS_OK, other) => {
                Classified::Malformed(format!("expected a station list, got {}", other))
            }
            (STATUS_ERROR, Value::String(msg)) if msg == MSG_OVER_QUOTA => {
                Classified::OverQuota(msg)
            }
            (STATUS_ERROR, Value::String(msg)) if msg == MSG_INVALID_KEY => {
                Classified::InvalidKey(msg)
            }
            (STATUS_ERROR, data) => Classified::Malformed(format!("upstream error: {}", data)),
            (status, _) => Classified::Malformed(format!("unexpected status '{}'", status)),
        }
    }
}

impl RawStation {
    pub fn new(name: impl Into<String>, aqi: AqiValue) -> Self {
        Self {
            aqi,
            station: StationInfo { name: name.into() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_waqi_payload() {
        let json = r#"{
            "status": "ok",
            "data": [
                {
                    "lat": 49.3017,
                    "lon": -123.0203,
                    "uid": 4227,
                    "aqi": "20",
                    "station": {
                        "name": "North Vancouver Second Narrows, British Comlumbia, Canada",
                        "time": "2022-11-08T11:00:00+09:00"
                    }
                },
                {
                    "lat": 49.70516,
                    "lon": -123.15133,
                    "uid": 8838,
                    "aqi": "-",
                    "station": {"name": "Squamish Elementary, British Columbia, Canada"}
                }
            ]
        }"#;
        let response: RawResponse = serde_json::from_str(json).unwrap();
        let Classified::Stations(stations) = response.classify() else {
            panic!("expected stations");
        };
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].aqi.as_f64(), Some(20.0));
        assert_eq!(stations[1].aqi.as_f64(), None);
    }

    #[test]
    fn test_aqi_value_parsing() {
        assert_eq!(AqiValue::Number(42.0).as_f64(), Some(42.0));
        assert_eq!(AqiValue::Text(" 17 ".into()).as_f64(), Some(17.0));
        assert_eq!(AqiValue::Text("-".into()).as_f64(), None);
        assert_eq!(AqiValue::Text("NaN".into()).as_f64(), None);
        assert_eq!(AqiValue::Text("inf".into()).as_f64(), None);
        assert_eq!(AqiValue::Number(-999.0).as_f64(), None);
        assert_eq!(AqiValue::Other(Value::Null).as_f64(), None);
        assert_eq!(AqiValue::Other(Value::Bool(true)).as_f64(), None);
    }

    #[test]
    fn test_classify_upstream_errors() {
        assert_eq!(
            RawResponse::error("Over quota").classify(),
            Classified::OverQuota("Over quota".into())
        );
        assert_eq!(
            RawResponse::error("Invalid key").classify(),
            Classified::InvalidKey("Invalid key".into())
        );
        assert!(matches!(
            RawResponse::error("Unknown station").classify(),
            Classified::Malformed(_)
        ));
    }

    #[test]
    fn test_classify_malformed() {
        let not_a_list = RawResponse {
            status: "ok".into(),
            data: Value::String("nope".into()),
        };
        assert!(matches!(not_a_list.classify(), Classified::Malformed(_)));

        let nameless: RawResponse =
            serde_json::from_str(r#"{"status":"ok","data":[{"aqi":"3"}]}"#).unwrap();
        assert!(matches!(nameless.classify(), Classified::Malformed(_)));

        let odd_status: RawResponse =
            serde_json::from_str(r#"{"status":"nug","data":[]}"#).unwrap();
        assert!(matches!(odd_status.classify(), Classified::Malformed(_)));
    }
}
