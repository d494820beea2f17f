//! Configuration for the Roblox HTTP dispatcher

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default header carrying the rotating anti-forgery token
const DEFAULT_CSRF_TOKEN_HEADER: &str = "X-CSRF-Token";

/// Default User-Agent sent on every request
const DEFAULT_USER_AGENT: &str = "Roblox/WinInet";

/// Default Referer sent on every request
const DEFAULT_REFERER: &str = "www.roblox.com";

/// Default domain the authentication cookie is scoped to
const DEFAULT_COOKIE_DOMAIN: &str = "roblox.com";

/// Default connection establishment timeout
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default total request timeout (covers reading the response body)
const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout for pooled connections
const DEFAULT_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Default keep-alive connections per host
const DEFAULT_MAX_IDLE_PER_HOST: usize = 20;

/// Default total attempts for transient transport failures
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default linear backoff base for connect/timeout/reset failures
const DEFAULT_CONNECT_BACKOFF_MS: u64 = 500;

/// Default linear backoff base for the pooled-connection race
const DEFAULT_RACE_BACKOFF_MS: u64 = 100;

/// Configuration for [`HttpClient`](crate::HttpClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Header name the upstream uses for the anti-forgery token
    pub csrf_token_header: String,
    /// User-Agent header sent on every request
    pub user_agent: String,
    /// Referer header sent on every request
    pub referer: String,
    /// Domain the `.ROBLOSECURITY` cookie is scoped to
    pub cookie_domain: String,
    /// Connection establishment timeout
    pub connect_timeout: Duration,
    /// Total request timeout
    pub read_timeout: Duration,
    /// How long idle pooled connections are kept alive
    pub pool_idle_timeout: Duration,
    /// Maximum idle pooled connections per host
    pub max_idle_per_host: usize,
    /// Total attempts for transient transport failures (first try included)
    pub max_attempts: u32,
    /// Linear backoff base for connect/timeout/reset failures
    pub connect_backoff: Duration,
    /// Linear backoff base for the pooled-connection race
    pub race_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            csrf_token_header: DEFAULT_CSRF_TOKEN_HEADER.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            cookie_domain: DEFAULT_COOKIE_DOMAIN.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT_SECS),
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            connect_backoff: Duration::from_millis(DEFAULT_CONNECT_BACKOFF_MS),
            race_backoff: Duration::from_millis(DEFAULT_RACE_BACKOFF_MS),
        }
    }
}

impl ClientConfig {
    /// Create a configuration with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the header name carrying the anti-forgery token
    pub fn with_csrf_token_header(mut self, name: impl Into<String>) -> Self {
        self.csrf_token_header = name.into();
        self
    }

    /// Set the User-Agent sent on every request
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the Referer sent on every request
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = referer.into();
        self
    }

    /// Set the domain the authentication cookie is scoped to
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = domain.into();
        self
    }

    /// Set the connection establishment timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the total request timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the pool idle timeout
    pub fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set the maximum idle pooled connections per host
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Set the total attempts for transient transport failures
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the linear backoff base for connect/timeout/reset failures
    pub fn with_connect_backoff(mut self, backoff: Duration) -> Self {
        self.connect_backoff = backoff;
        self
    }

    /// Set the linear backoff base for the pooled-connection race
    pub fn with_race_backoff(mut self, backoff: Duration) -> Self {
        self.race_backoff = backoff;
        self
    }

    /// Retry policy derived from the configured knobs
    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.connect_backoff, self.race_backoff)
    }
}
