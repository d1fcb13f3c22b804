//! In-app event builder
//!
//! An [`Event`] is assembled with chained setters and handed to
//! [`Tracker::send`](crate::tracker::Tracker::send):
//!
//! ```rust
//! use appsflyer_core::event::{names, Event};
//! use appsflyer_core::Platform;
//!
//! let mut event = Event::new("1111111111111-1111111", Platform::Ios);
//! event
//!     .set_name(names::START_TRIAL)
//!     .set_advertising_id("AAAAAAAA-AAAA-AAAA-AAAA-AAAAAAAAAAAA")
//!     .set_revenue(59.99, "USD");
//! ```
//!
//! Parameters are kept in a sorted map so the encoded `eventValue` string is
//! reproducible.

mod wire;

pub use wire::EventBody;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone};

use crate::config::Platform;
use crate::error::Result;

/// `eventTime` layout, millisecond precision
const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Layout for date-valued parameters
const DATE_VALUE_FORMAT: &str = "%Y/%m/%d";

/// Predefined AppsFlyer event names
pub mod names {
    pub const START_TRIAL: &str = "af_start_trial";
    pub const SUBSCRIBE: &str = "af_subscribe";
    pub const PURCHASE: &str = "af_purchase";
}

/// Predefined AppsFlyer event parameter names
pub mod params {
    pub const REVENUE: &str = "af_revenue";
    pub const PRICE: &str = "af_price";
    pub const CURRENCY: &str = "af_currency";
}

/// A single in-app event for one device
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub(crate) appsflyer_id: String,
    pub(crate) platform: Platform,
    pub(crate) event_name: String,
    /// Owned by the tracker; overwritten from the app registry on send
    pub(crate) bundle_id: Option<String>,
    pub(crate) advertising_id: Option<String>,
    pub(crate) idfa: Option<String>,
    pub(crate) device_ip: Option<String>,
    pub(crate) event_time: Option<String>,
    pub(crate) use_events_api: bool,
    pub(crate) parameters: BTreeMap<String, String>,
}

impl Event {
    pub fn new(appsflyer_id: impl Into<String>, platform: Platform) -> Self {
        Self {
            appsflyer_id: appsflyer_id.into(),
            platform,
            event_name: String::new(),
            bundle_id: None,
            advertising_id: None,
            idfa: None,
            device_ip: None,
            event_time: None,
            use_events_api: true,
            parameters: BTreeMap::new(),
        }
    }

    /// Set the event name (see [`names`]); required before sending
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.event_name = name.into();
        self
    }

    /// Set `eventTime`, rendered in the timestamp's own time zone
    pub fn set_event_time<Tz>(&mut self, time: &DateTime<Tz>) -> &mut Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.event_time = Some(time.format(EVENT_TIME_FORMAT).to_string());
        self
    }

    /// Insert or overwrite a named parameter
    pub fn set_value(&mut self, param: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parameters.insert(param.into(), value.into());
        self
    }

    /// Store a date-only parameter as `YYYY/MM/DD`
    pub fn set_date_value<Tz>(&mut self, param: impl Into<String>, date: &DateTime<Tz>) -> &mut Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.set_value(param, date.format(DATE_VALUE_FORMAT).to_string())
    }

    /// Set `af_revenue` (two decimals) and `af_currency`
    pub fn set_revenue(&mut self, revenue: f64, currency: impl Into<String>) -> &mut Self {
        self.set_value(params::CURRENCY, currency)
            .set_value(params::REVENUE, format_amount(revenue))
    }

    /// Set `af_price` (two decimals) and `af_currency`
    pub fn set_price(&mut self, price: f64, currency: impl Into<String>) -> &mut Self {
        self.set_value(params::CURRENCY, currency)
            .set_value(params::PRICE, format_amount(price))
    }

    /// Set the device advertising identifier
    ///
    /// Android events carry it as `advertising_id`, iOS events as `idfa`.
    pub fn set_advertising_id(&mut self, advertising_id: impl Into<String>) -> &mut Self {
        let id = Some(advertising_id.into());
        match self.platform {
            Platform::Android => {
                self.advertising_id = id;
                self.idfa = None;
            }
            Platform::Ios => {
                self.idfa = id;
                self.advertising_id = None;
            }
        }
        self
    }

    pub fn set_device_ip(&mut self, device_ip: impl Into<String>) -> &mut Self {
        self.device_ip = Some(device_ip.into());
        self
    }

    pub(crate) fn set_bundle_id(&mut self, bundle_id: impl Into<String>) -> &mut Self {
        self.bundle_id = Some(bundle_id.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.event_name
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn appsflyer_id(&self) -> &str {
        &self.appsflyer_id
    }

    /// Bundle id injected by the last send, if any
    pub fn bundle_id(&self) -> Option<&str> {
        self.bundle_id.as_deref()
    }

    pub fn value(&self, param: &str) -> Option<&str> {
        self.parameters.get(param).map(String::as_str)
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Build the wire record, encoding parameters into `eventValue`
    pub fn to_wire(&self) -> Result<EventBody> {
        let event_value = if self.parameters.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&self.parameters)?
        };

        Ok(EventBody {
            advertising_id: non_empty(&self.advertising_id),
            appsflyer_id: self.appsflyer_id.clone(),
            bundle_id: non_empty(&self.bundle_id),
            device_ip: non_empty(&self.device_ip),
            event_currency: None,
            event_name: self.event_name.clone(),
            event_time: non_empty(&self.event_time),
            event_value,
            idfa: non_empty(&self.idfa),
            use_events_api: self.use_events_api,
        })
    }

    /// Serialize to the JSON request body
    pub fn to_json(&self) -> Result<String> {
        Ok(self.to_wire()?.to_json()?)
    }
}

/// Fixed-point, two decimals, `.` separator
fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Empty strings are dropped from the wire like unset fields.
fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
