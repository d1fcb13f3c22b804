//! # appsflyer-core
//!
//! Server-to-server client for the AppsFlyer in-app event API.
//!
//! This library provides:
//! - A fluent [`Event`] builder with platform-aware field placement
//! - The [`EventBody`] wire record sent to `/inappevent/{appId}`
//! - A [`Tracker`] that resolves per-platform app credentials and POSTs events
//! - Configuration and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use appsflyer_core::event::names;
//! use appsflyer_core::{Event, Platform, Tracker};
//!
//! # async fn run() -> appsflyer_core::Result<()> {
//! let tracker = Tracker::with_defaults()?;
//! tracker.set_config("/etc/appsflyer/apps.json")?;
//!
//! let mut event = Event::new("1111111111111-1111111", Platform::Android);
//! event
//!     .set_name(names::SUBSCRIBE)
//!     .set_advertising_id("AAAAAAAA-AAAA-AAAA-AAAA-AAAAAAAAAAAA")
//!     .set_revenue(59.99, "USD");
//!
//! tracker.send(&mut event).await?;
//! # Ok(())
//! # }
//! ```

// Re-export commonly used items at the crate root
pub use config::{AppConfig, AppRegistry, Config, Platform, TransportConfig};
pub use error::{Error, Result};
pub use event::{Event, EventBody};
pub use tracker::{SyncTracker, Tracker};

// Public modules
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod tracker;
