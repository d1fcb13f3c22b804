//! HTTP dispatcher for the AppsFlyer in-app event endpoint
//!
//! A [`Tracker`] owns a pooled `reqwest::Client` and the current
//! [`AppRegistry`]. Each call to [`Tracker::send`] issues exactly one
//! `POST {endpoint}/inappevent/{appId}`; there is no batching and no retry.
//! Retry and logging policy for failed sends belong to the caller.
//!
//! The registry is published through an [`ArcSwap`], so `set_config` can run
//! while sends are in flight. A send works against the snapshot it loaded
//! when it started.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::config::{AppConfig, AppRegistry, TransportConfig};
use crate::error::{Error, Result};
use crate::event::Event;

/// Header carrying the raw dev key
pub const AUTHENTICATION_HEADER: &str = "Authentication";

/// Async client for server-to-server in-app events
#[derive(Debug)]
pub struct Tracker {
    http_client: reqwest::Client,
    endpoint: String,
    apps: ArcSwap<AppRegistry>,
}

impl Tracker {
    /// Create a tracker with the given transport tuning
    ///
    /// Makes no network calls. The registry starts empty; load it with
    /// [`set_config`](Self::set_config) or [`set_apps`](Self::set_apps).
    pub fn new(transport: &TransportConfig) -> Result<Self> {
        transport.validate()?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(transport.connect_timeout())
            .tcp_keepalive(transport.tcp_keepalive())
            .pool_max_idle_per_host(transport.max_idle_connections)
            .pool_idle_timeout(transport.idle_timeout());

        if let Some(timeout) = transport.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: transport.endpoint.trim_end_matches('/').to_string(),
            apps: ArcSwap::from_pointee(AppRegistry::default()),
        })
    }

    /// Create a tracker against the production endpoint with default tuning
    pub fn with_defaults() -> Result<Self> {
        Self::new(&TransportConfig::default())
    }

    /// Load the app registry from a JSON file and publish it
    ///
    /// On failure the previously published registry stays in place.
    pub fn set_config(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let registry = AppRegistry::load(path)?;
        tracing::debug!(
            path = %path.display(),
            apps = registry.len(),
            "Loaded app registry"
        );
        self.set_registry(registry);
        Ok(())
    }

    /// Publish a registry built from in-memory app records
    pub fn set_apps(&self, apps: impl IntoIterator<Item = AppConfig>) {
        self.set_registry(AppRegistry::new(apps));
    }

    pub fn set_registry(&self, registry: AppRegistry) {
        self.apps.store(Arc::new(registry));
    }

    /// Current registry snapshot
    pub fn apps(&self) -> Arc<AppRegistry> {
        self.apps.load_full()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Target URL for an app
    pub fn event_url(&self, app: &AppConfig) -> String {
        format!(
            "{}/inappevent/{}",
            self.endpoint,
            urlencoding::encode(&app.app_id)
        )
    }

    /// Send one event
    ///
    /// Injects the registered bundle id into `event`, then POSTs it. Fails
    /// without touching the network if the event has no name or no app is
    /// registered for its platform. Any status other than 200 is an error.
    pub async fn send(&self, event: &mut Event) -> Result<()> {
        if event.name().is_empty() {
            return Err(Error::InvalidEvent(
                "AppsFlyer event should have an event name".to_string(),
            ));
        }

        let apps = self.apps.load_full();
        let app = apps
            .get(event.platform())
            .ok_or(Error::UnknownPlatform(event.platform()))?;

        event.set_bundle_id(app.bundle_id.as_str());

        let url = self.event_url(app);
        let body = event.to_json()?;
        let dev_key = HeaderValue::from_str(&app.dev_key).map_err(|e| {
            Error::Config(format!("invalid devKey for {}: {}", app.platform, e))
        })?;

        tracing::debug!(
            event_name = %event.name(),
            platform = %app.platform,
            app_id = %app.app_id,
            "Sending in-app event"
        );

        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(AUTHENTICATION_HEADER, dev_key)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Remote { status });
        }

        Ok(())
    }

    /// Send one event, giving up once `timeout` has elapsed
    ///
    /// The in-flight request is dropped on expiry. Dropping the returned
    /// future cancels the request the same way.
    pub async fn send_with_timeout(&self, event: &mut Event, timeout: Duration) -> Result<()> {
        tokio::time::timeout(timeout, self.send(event))
            .await
            .map_err(|_| Error::Timeout(timeout))?
    }
}

/// Blocking wrapper for Tracker
///
/// Owns a current-thread runtime. Must not be used from inside another
/// tokio runtime.
pub struct SyncTracker {
    inner: Tracker,
    runtime: tokio::runtime::Runtime,
}

impl SyncTracker {
    pub fn new(transport: &TransportConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            inner: Tracker::new(transport)?,
            runtime,
        })
    }

    pub fn set_config(&self, path: impl AsRef<Path>) -> Result<()> {
        self.inner.set_config(path)
    }

    pub fn set_apps(&self, apps: impl IntoIterator<Item = AppConfig>) {
        self.inner.set_apps(apps)
    }

    /// Send one event (blocking)
    pub fn send(&self, event: &mut Event) -> Result<()> {
        self.runtime.block_on(self.inner.send(event))
    }

    /// Send one event with a deadline (blocking)
    pub fn send_with_timeout(&self, event: &mut Event, timeout: Duration) -> Result<()> {
        self.runtime
            .block_on(self.inner.send_with_timeout(event, timeout))
    }

    pub fn tracker(&self) -> &Tracker {
        &self.inner
    }
}
