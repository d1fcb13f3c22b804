//! Wire record for `POST /inappevent/{appId}`
//!
//! `EventBody` is exactly what goes over the network. It is built from an
//! [`Event`](super::Event) at send time and never stored.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// JSON body accepted by the in-app event endpoint
///
/// Field order matches the order AppsFlyer documents; unset optional fields
/// are omitted, `eventValue` and `af_events_api` are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBody {
    #[serde(
        rename = "advertising_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub advertising_id: Option<String>,

    #[serde(rename = "appsflyer_id")]
    pub appsflyer_id: String,

    #[serde(rename = "bundle_id", default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,

    #[serde(rename = "ip", default, skip_serializing_if = "Option::is_none")]
    pub device_ip: Option<String>,

    /// Reserved by the API; the builder never sets it
    #[serde(
        rename = "eventCurrency",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_currency: Option<String>,

    #[serde(rename = "eventName")]
    pub event_name: String,

    #[serde(rename = "eventTime", default, skip_serializing_if = "Option::is_none")]
    pub event_time: Option<String>,

    /// Parameters as a JSON-encoded string, `""` when there are none
    #[serde(rename = "eventValue", default)]
    pub event_value: String,

    #[serde(rename = "idfa", default, skip_serializing_if = "Option::is_none")]
    pub idfa: Option<String>,

    #[serde(rename = "af_events_api", with = "string_bool")]
    pub use_events_api: bool,
}

impl EventBody {
    /// Encode as compact JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// `af_events_api` travels as `"true"`/`"false"`, not a JSON boolean.
mod string_bool {
    use super::*;
    use serde::de::Error;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(D::Error::custom(format!(
                "expected \"true\" or \"false\", got {:?}",
                other
            ))),
        }
    }
}
