//! HTTP access to Davis reporters.
//!
//! The [`Fetcher`] trait is the seam between the station logic and the
//! network, so poll cycles can be tested deterministically without devices.

use crate::conditions::ParseError;
use std::future::Future;
use std::net::Ipv6Addr;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Path of the current-conditions endpoint on WeatherLink Live and AirLink.
pub const CURRENT_CONDITIONS_PATH: &str = "/v1/current_conditions";

/// Port the devices serve their local API on.
pub const DEFAULT_PORT: u16 = 80;

/// Error type for fetching from one reporter.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Request did not complete within the configured timeout
    #[error("Timeout: {0}")]
    Timeout(String),
    /// Connection or transport failure
    #[error("HTTP error: {0}")]
    Http(String),
    /// Device answered with a non-success status
    #[error("HTTP status {0}")]
    Status(u16),
    /// Device answered, but the body could not be decoded
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

/// Build the current-conditions URL for a configured host.
///
/// A bare hostname or address gets `http://` and port 80; a host that
/// already carries a port or scheme is used as given. Bare IPv6 addresses
/// are bracketed; with a port they must be written as `[addr]:port`.
///
/// # Example
/// ```
/// use davis_www::fetch::current_conditions_url;
///
/// assert_eq!(
///     current_conditions_url("10.0.0.100"),
///     "http://10.0.0.100:80/v1/current_conditions"
/// );
/// assert_eq!(
///     current_conditions_url("wll.local:8080"),
///     "http://wll.local:8080/v1/current_conditions"
/// );
/// ```
pub fn current_conditions_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{host}{CURRENT_CONDITIONS_PATH}")
    } else if host.parse::<Ipv6Addr>().is_ok() {
        format!("http://[{host}]:{DEFAULT_PORT}{CURRENT_CONDITIONS_PATH}")
    } else if host.contains(':') {
        format!("http://{host}{CURRENT_CONDITIONS_PATH}")
    } else {
        format!("http://{host}:{DEFAULT_PORT}{CURRENT_CONDITIONS_PATH}")
    }
}

/// Fetcher abstraction to enable deterministic unit tests without devices.
pub trait Fetcher: Send + Sync {
    /// GET `url` and return the response body.
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send + 'a>>;
}

/// Real fetcher backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        // Reporters live on the local network
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(
        &'a self,
        url: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await?.error_for_status()?;
            Ok(response.text().await?)
        })
    }
}
