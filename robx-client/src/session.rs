//! Session ownership and execution-context rebinding
//!
//! A [`reqwest::Client`] drives its pooled connections through tasks
//! spawned on the runtime it is used under; once that runtime is torn
//! down, those connections are dead and further use of the client fails.
//! The session therefore pins a liveness probe to the runtime it was bound
//! under and is rebuilt, cookies and headers carried forward verbatim,
//! before the first call under a new context.

use std::sync::{Arc, Weak};

use reqwest::Client;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// One pooled connection client together with the state that must survive
/// a rebind
#[derive(Debug)]
pub(crate) struct Session {
    /// The connection client; replaced wholesale on rebind
    pub(crate) client: Client,
    /// Cookie store shared with every rebuilt client
    pub(crate) jar: Arc<Jar>,
    /// Default headers, including the anti-forgery token once learned
    pub(crate) headers: HeaderMap,
    /// Last 12 characters of the auth cookie, empty when unauthenticated
    pub(crate) auth_marker: String,
    /// Alive while the runtime this session was bound under still runs
    probe: Option<Weak<()>>,
}

impl Session {
    /// Build a fresh internally-owned session
    pub(crate) fn new(config: &ClientConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = build_client(config, &jar)?;
        Ok(Self {
            client,
            jar,
            headers: default_headers(config)?,
            auth_marker: String::new(),
            probe: None,
        })
    }

    /// Wrap an externally supplied connection client
    ///
    /// Cookie handling stays with the supplied client; the session's own
    /// jar only backs rebinds, which never happen for external sessions.
    pub(crate) fn external(config: &ClientConfig, client: Client) -> Result<Self> {
        Ok(Self {
            client,
            jar: Arc::new(Jar::default()),
            headers: default_headers(config)?,
            auth_marker: String::new(),
            probe: None,
        })
    }

    /// Whether the binding runtime is still alive
    pub(crate) fn is_bound(&self) -> bool {
        self.probe
            .as_ref()
            .is_some_and(|probe| probe.strong_count() > 0)
    }

    /// Whether the session must be (re)bound before use
    pub(crate) fn needs_bind(&self) -> bool {
        !self.is_bound()
    }

    /// Make the session valid for the calling context
    ///
    /// First use pins the probe without touching the client; a dead probe
    /// means the binding runtime is gone and the client is rebuilt with the
    /// same cookie jar and headers. Must be called from within a runtime.
    pub(crate) fn ensure_for_context(&mut self, config: &ClientConfig) -> Result<()> {
        if self.is_bound() {
            return Ok(());
        }
        if self.probe.is_some() {
            debug!("execution context torn down, rebuilding connection client");
            self.client = build_client(config, &self.jar)?;
        }
        self.bind();
        Ok(())
    }

    /// Pin the session to the current runtime
    ///
    /// The sentinel task holds the anchor until the runtime shuts down and
    /// drops its tasks, at which point the weak probe observes the death.
    fn bind(&mut self) {
        let anchor = Arc::new(());
        self.probe = Some(Arc::downgrade(&anchor));
        tokio::spawn(async move {
            let _anchor = anchor;
            std::future::pending::<()>().await;
        });
    }
}

/// Construct a pooled connection client from the configured limits
fn build_client(config: &ClientConfig, jar: &Arc<Jar>) -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.read_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.max_idle_per_host)
        .cookie_provider(Arc::clone(jar))
        .build()?)
}

/// Default headers sent on every request
fn default_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent)
            .map_err(|_| Error::invalid_header("User-Agent"))?,
    );
    headers.insert(
        REFERER,
        HeaderValue::from_str(&config.referer).map_err(|_| Error::invalid_header("Referer"))?,
    );
    Ok(headers)
}
