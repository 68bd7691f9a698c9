use std::time::Duration;

use modgrab_target::settings::Settings;
use reqwest::StatusCode;

use super::AttemptFailure;

/// Bounded exponential backoff: wait [`initial_backoff`], then twice that,
/// and so on, for at most [`max_retries`] retries.
///
/// [`initial_backoff`]: Self::initial_backoff
/// [`max_retries`]: Self::max_retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait this long, then try again.
    Retry(Duration),
    /// The failure was retryable, but the policy is out of retries.
    Exhausted,
    /// Trying again won't change the outcome.
    Terminal,
}

impl RetryPolicy {
    /// Statuses that usually mean "not right now" rather than "no".
    pub const RETRYABLE_STATUSES: [StatusCode; 5] = [
        StatusCode::TOO_MANY_REQUESTS,
        StatusCode::INTERNAL_SERVER_ERROR,
        StatusCode::BAD_GATEWAY,
        StatusCode::SERVICE_UNAVAILABLE,
        StatusCode::GATEWAY_TIMEOUT,
    ];

    pub const fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
        }
    }

    /// How long to wait before retry number `retry` (zero-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff.saturating_mul(2_u32.saturating_pow(retry))
    }

    #[must_use]
    pub fn is_retryable(failure: &AttemptFailure) -> bool {
        match failure {
            AttemptFailure::Status(status) => Self::RETRYABLE_STATUSES.contains(status),
            AttemptFailure::Transport(error) => error.is_retryable(),
        }
    }

    /// Decide what follows a `failure`, given that `retries` retries have
    /// already been made. Requests that aren't `repeatable` are never retried.
    #[must_use]
    pub fn decide(&self, failure: &AttemptFailure, retries: u32, repeatable: bool) -> RetryDecision {
        if !repeatable || !Self::is_retryable(failure) {
            RetryDecision::Terminal
        } else if retries >= self.max_retries {
            RetryDecision::Exhausted
        } else {
            RetryDecision::Retry(self.backoff(retries))
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Settings::DEFAULT_MAX_RETRIES, Settings::DEFAULT_INITIAL_BACKOFF)
    }
}

impl From<&Settings> for RetryPolicy {
    fn from(settings: &Settings) -> Self {
        Self::new(settings.max_retries, settings.initial_backoff)
    }
}
