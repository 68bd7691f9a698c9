//! The outbound HTTP layer every registry and artifact request goes through.
//!
//! [`HttpClient`] wraps some [`Transport`] (a [`reqwest`] blocking client in
//! practice) with a bounded [`RetryPolicy`]. The transport only ever performs
//! a **single attempt**, all the retrying and backoff lives here.

use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

pub use reqwest::{Method, StatusCode};
use url::Url;

mod retry;
pub use retry::*;

/// A single outbound request, fully described up front so that it can be
/// re-sent verbatim on retry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub timeout: Duration,
}

impl Request {
    pub const fn get(url: Url, timeout: Duration) -> Self {
        Self {
            method: Method::GET,
            url,
            query: vec![],
            timeout,
        }
    }

    pub fn with_query<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// A response whose body can be streamed.
pub trait Exchange: Read {
    fn status(&self) -> StatusCode;
}

/// Something capable of performing a single HTTP attempt.
pub trait Transport {
    type Response: Exchange;

    /// Send `request` once.
    ///
    /// # Errors
    ///
    /// Returns an error if no response was received at all. A response with
    /// an error status is **not** an error at this level.
    fn send(&self, request: &Request) -> Result<Self::Response, TransportError>;
}

impl Transport for reqwest::blocking::Client {
    type Response = reqwest::blocking::Response;

    fn send(&self, request: &Request) -> Result<Self::Response, TransportError> {
        let response = self
            .request(request.method.clone(), request.url.clone())
            .query(&request.query)
            .timeout(request.timeout)
            .send()?;
        Ok(response)
    }
}

impl Exchange for reqwest::blocking::Response {
    fn status(&self) -> StatusCode {
        Self::status(self)
    }
}

/// Why a single attempt produced no usable response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("The request timed out")]
    Timeout,
    #[error("Failed to connect to the server")]
    Connect(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("The connection was dropped before a full response arrived")]
    Interrupted(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Failed to send the request")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Timeouts, failed connections (TLS handshakes included) and connections
    /// dropped mid-exchange are worth another try. A request that couldn't
    /// even be built, a redirect loop or an undecodable body will fail the
    /// same way again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connect(_) | Self::Interrupted(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(Box::new(error))
        } else if error.is_request() || error.is_body() {
            Self::Interrupted(Box::new(error))
        } else {
            Self::Other(Box::new(error))
        }
    }
}

/// The outcome of a single failed attempt.
#[derive(Debug, thiserror::Error)]
pub enum AttemptFailure {
    #[error("The server responded with {0}")]
    Status(StatusCode),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A request that ultimately failed.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The server gave a definitive answer that retrying won't change, like
    /// `404 Not Found`.
    #[error("{url} responded with {status}")]
    Status { url: Url, status: StatusCode },

    /// Every allowed attempt failed with a retryable error.
    #[error("Gave up on {url} after {attempts} attempts")]
    RetriesExhausted {
        url: Url,
        attempts: u32,
        #[source]
        last: AttemptFailure,
    },

    /// The request could not be sent, and trying again won't help.
    #[error("Request to {url} failed")]
    Transport {
        url: Url,
        #[source]
        source: TransportError,
    },
}

impl NetworkError {
    /// The terminal status code, if the server gave one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. }
            | Self::RetriesExhausted {
                last: AttemptFailure::Status(status),
                ..
            } => Some(*status),
            Self::RetriesExhausted { .. } | Self::Transport { .. } => None,
        }
    }
}

pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// An HTTP client with a retry policy attached.
#[derive(Clone)]
#[must_use]
pub struct HttpClient<T = reqwest::blocking::Client> {
    transport: T,
    policy: RetryPolicy,
    sleep: Sleeper,
}

impl<T: fmt::Debug> fmt::Debug for HttpClient<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpClient")
            .field("transport", &self.transport)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    pub const USER_AGENT: &str = concat!(
        env!("CARGO_PKG_REPOSITORY"),
        '/',
        env!("CARGO_PKG_VERSION"),
        ' ',
        '(',
        env!("CARGO_PKG_AUTHORS"),
        ')',
    );

    /// Build a client backed by [`reqwest`], identifying itself with
    /// [`Self::USER_AGENT`].
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(policy: RetryPolicy) -> Result<Self, TransportError> {
        let transport = reqwest::blocking::Client::builder()
            .user_agent(Self::USER_AGENT)
            .build()?;
        Ok(Self::with_transport(transport, policy))
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            sleep: Arc::new(std::thread::sleep),
        }
    }

    /// Replace the function used to wait between attempts.
    pub fn with_sleeper<F>(mut self, sleep: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.sleep = Arc::new(sleep);
        self
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Perform `request`, retrying it according to the [`RetryPolicy`].
    ///
    /// Only a response with a success status is returned as [`Ok`].
    ///
    /// # Errors
    ///
    /// - [`NetworkError::Status`] right away, on a status that retrying won't
    ///   fix (or on any error status, if the method is not safe to repeat).
    /// - [`NetworkError::RetriesExhausted`] once the policy runs out of
    ///   retries.
    /// - [`NetworkError::Transport`] if the request couldn't be sent for a
    ///   non-transient reason.
    pub fn execute(&self, request: &Request) -> Result<T::Response, NetworkError> {
        let repeatable = request.method.is_safe();
        let mut retries = 0;

        loop {
            let failure = match self.transport.send(request) {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => AttemptFailure::Status(response.status()),
                Err(error) => AttemptFailure::Transport(error),
            };

            match self.policy.decide(&failure, retries, repeatable) {
                RetryDecision::Retry(delay) => {
                    tracing::warn!(
                        url = %request.url,
                        %failure,
                        retry = retries + 1,
                        ?delay,
                        "Request failed, retrying"
                    );
                    (self.sleep)(delay);
                    retries += 1;
                }
                RetryDecision::Exhausted => {
                    return Err(NetworkError::RetriesExhausted {
                        url: request.url.clone(),
                        attempts: retries + 1,
                        last: failure,
                    });
                }
                RetryDecision::Terminal => {
                    let url = request.url.clone();
                    return Err(match failure {
                        AttemptFailure::Status(status) => NetworkError::Status { url, status },
                        AttemptFailure::Transport(source) => NetworkError::Transport { url, source },
                    });
                }
            }
        }
    }
}
