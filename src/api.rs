//! Client for the dvmn.org long-polling review API.
//!
//! One blocking GET per iteration: the server holds the request open until
//! a review lands or the long-poll window expires, then answers with JSON.
//! Replies come in two shapes (new attempts, or a fresh timestamp to resume
//! from); [`classify`] turns a decoded reply into the [`PollEvent`] the
//! polling loop matches on.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DVMN_ORIGIN: &str = "https://dvmn.org";
const LONG_POLL_PATH: &str = "/api/long_polling/";

// Total request timeout covering the whole long-poll window; the server
// answers early only when a review lands, so hitting this is the idle case.
const LONG_POLL_TIMEOUT_SECS: u64 = 200;
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Timestamp checkpoint telling the server where to resume event delivery.
///
/// The server emits fractional epoch seconds (e.g. `1594920458.169247`).
/// The client never does arithmetic on the value; it only echoes it back as
/// the `timestamp` query parameter of the next request.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Cursor(pub f64);

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A graded homework submission reported by the platform.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewAttempt {
    pub lesson_title: String,
    /// Path fragment under dvmn.org, e.g. `/modules/1/lesson/2/`.
    pub lesson_url: String,
    pub is_negative: bool,
}

/// Outcome of one successfully classified long-poll reply.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// A review landed: notify about `attempt`, then resume from `cursor`.
    Review { attempt: ReviewAttempt, cursor: Cursor },
    /// The window closed with nothing to report; resume from `cursor`.
    Idle { cursor: Cursor },
}

/// Everything one polling iteration can fail with.
///
/// The loop treats `ReadTimeout` as the expected expiry of a long poll;
/// every other variant is a real failure and feeds the backoff counter.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Long-poll window expired with no reply")]
    ReadTimeout,
    #[error("Connection to dvmn.org failed: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("dvmn.org answered with HTTP {0}")]
    BadStatus(reqwest::StatusCode),
    #[error("Malformed long-poll reply: {0}")]
    Malformed(String),
    #[error("Long-poll request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PollError {
    /// Map a reqwest failure onto the taxonomy. Connect-phase timeouts also
    /// report `is_timeout`, so the connect class is checked first; only a
    /// timeout on an established request counts as the long-poll expiry.
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_connect() {
            PollError::Connection(Box::new(err))
        } else if err.is_timeout() {
            PollError::ReadTimeout
        } else if err.is_decode() {
            PollError::Malformed(err.to_string())
        } else {
            PollError::Transport(Box::new(err))
        }
    }
}

/// Raw long-poll reply before classification. Every field is optional;
/// which ones are present decides the reply's shape.
#[derive(Debug, Deserialize)]
struct PollReply {
    new_attempts: Option<Vec<ReviewAttempt>>,
    last_attempt_timestamp: Option<Cursor>,
    timestamp_to_request: Option<Cursor>,
}

/// Decide what a decoded reply means.
///
/// A present `new_attempts` wins over everything else, and only its first
/// entry is reported. An empty `new_attempts` is a malformed reply, not an
/// idle one.
fn classify(reply: PollReply) -> Result<PollEvent, PollError> {
    if let Some(attempts) = reply.new_attempts {
        let attempt = attempts
            .into_iter()
            .next()
            .ok_or_else(|| PollError::Malformed("`new_attempts` is present but empty".into()))?;
        let cursor = reply.last_attempt_timestamp.ok_or_else(|| {
            PollError::Malformed("`new_attempts` without `last_attempt_timestamp`".into())
        })?;
        return Ok(PollEvent::Review { attempt, cursor });
    }

    match reply.timestamp_to_request {
        Some(cursor) => Ok(PollEvent::Idle { cursor }),
        None => Err(PollError::Malformed(
            "reply carries neither `new_attempts` nor `timestamp_to_request`".into(),
        )),
    }
}

/// Source of review events, in production the live dvmn.org API. The
/// polling loop talks to this seam so tests can drive it with a scripted
/// source instead of a socket.
pub trait ReviewSource {
    /// Issue one blocking long-poll request resuming from `cursor` (`None`
    /// on the very first request) and classify the reply.
    fn poll(&self, cursor: Option<Cursor>) -> Result<PollEvent, PollError>;
}

/// Blocking client for the dvmn.org long-polling endpoint.
pub struct DevmanClient {
    origin: String,
    token: String,
    client: Client,
}

impl DevmanClient {
    /// Client against the production origin.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_origin(token, DVMN_ORIGIN)
    }

    /// Client against an alternate origin (local fixtures in tests).
    pub fn with_origin(token: impl Into<String>, origin: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(LONG_POLL_TIMEOUT_SECS))
            .user_agent(concat!("dvmn-notify/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build the long-polling HTTP client")?;

        Ok(Self {
            origin: origin.into(),
            token: token.into(),
            client,
        })
    }
}

impl ReviewSource for DevmanClient {
    fn poll(&self, cursor: Option<Cursor>) -> Result<PollEvent, PollError> {
        let url = format!("{}{}", self.origin, LONG_POLL_PATH);
        let mut request = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, format!("Token {}", self.token));
        if let Some(cursor) = cursor {
            // f64 Display gives the shortest round-tripping form, so whole
            // seconds go out as `1000`, not `1000.0`.
            request = request.query(&[("timestamp", cursor.to_string())]);
        }

        let response = request.send().map_err(PollError::from_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PollError::BadStatus(status));
        }

        let reply: PollReply = response.json().map_err(PollError::from_transport)?;
        classify(reply)
    }
}
