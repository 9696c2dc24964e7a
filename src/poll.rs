//! The polling loop: rolling cursor, consecutive-failure counter, and the
//! threshold backoff that keeps an unattended process from hammering a
//! broken remote.

use std::thread;
use std::time::Duration;

use crate::api::{Cursor, PollError, PollEvent, ReviewSource};
use crate::logging::{LogLevel, LogSink};
use crate::notify::{review_message, Notifier};

/// Knobs of the backoff policy.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Consecutive failures at which the loop enters backoff.
    pub failure_threshold: u32,
    /// Pause between iterations while backed off.
    pub backoff_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            backoff_delay: Duration::from_secs(600),
        }
    }
}

/// Where the loop currently stands. Derived from the failure counter; the
/// only way back from `Backoff` is a successful iteration, because only
/// success resets the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Backoff,
}

/// The long-polling loop. One [`step`](Poller::step) is a full iteration
/// minus the sleep, so tests can drive the loop without waiting.
pub struct Poller<S: ReviewSource, N: Notifier> {
    config: PollerConfig,
    source: S,
    notifier: N,
    log: Box<dyn LogSink>,
    cursor: Option<Cursor>,
    failures: u32,
}

impl<S: ReviewSource, N: Notifier> Poller<S, N> {
    /// Create a poller from config, event source, notifier, and log sink.
    pub fn new(config: PollerConfig, source: S, notifier: N, log: Box<dyn LogSink>) -> Self {
        Self {
            config,
            source,
            notifier,
            log,
            cursor: None,
            failures: 0,
        }
    }

    /// Cursor the next request will resume from.
    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn state(&self) -> PollState {
        if self.failures >= self.config.failure_threshold {
            PollState::Backoff
        } else {
            PollState::Polling
        }
    }

    /// Run until the process is terminated.
    pub fn run(&mut self) -> ! {
        self.log.record(LogLevel::Info, "long polling started");
        loop {
            let pause = self.step();
            if !pause.is_zero() {
                thread::sleep(pause);
            }
        }
    }

    /// One iteration: request, classify, deliver, update cursor and
    /// counter. Returns the pause to observe before the next request.
    pub fn step(&mut self) -> Duration {
        let state_before = self.state();

        match self.source.poll(self.cursor) {
            Ok(PollEvent::Review { attempt, cursor }) => {
                let text = review_message(&attempt);
                match self.notifier.notify(&text) {
                    Ok(()) => {
                        self.log.record(
                            LogLevel::Info,
                            &format!(
                                "delivered review notification for \"{}\"",
                                attempt.lesson_title
                            ),
                        );
                        self.advance(cursor);
                    }
                    Err(err) => {
                        // The cursor stays put, so the same attempt is
                        // fetched again on the next round.
                        self.log.record(
                            LogLevel::Error,
                            &format!("notification delivery failed: {err:#}"),
                        );
                        self.failures += 1;
                    }
                }
            }
            Ok(PollEvent::Idle { cursor }) => {
                self.advance(cursor);
            }
            // The expected expiry of a long poll: no record, no counter
            // change, same cursor next round.
            Err(PollError::ReadTimeout) => {}
            Err(err) => {
                self.log.record(LogLevel::Error, &err.to_string());
                self.failures += 1;
            }
        }

        self.note_transition(state_before);
        self.pause()
    }

    /// Successful iteration: advance the cursor, forgive past failures.
    fn advance(&mut self, cursor: Cursor) {
        self.cursor = Some(cursor);
        self.failures = 0;
    }

    fn note_transition(&mut self, before: PollState) {
        let after = self.state();
        if before == after {
            return;
        }
        match after {
            PollState::Backoff => self.log.record(
                LogLevel::Warning,
                &format!(
                    "{} consecutive failures, backing off {}s between requests",
                    self.failures,
                    self.config.backoff_delay.as_secs()
                ),
            ),
            PollState::Polling => self
                .log
                .record(LogLevel::Info, "connection recovered, resuming normal polling"),
        }
    }

    /// Pause dictated by the counter: zero below the threshold, the full
    /// backoff delay at or above it. Applies to every iteration,
    /// read-timeout ones included.
    fn pause(&self) -> Duration {
        match self.state() {
            PollState::Backoff => self.config.backoff_delay,
            PollState::Polling => Duration::ZERO,
        }
    }
}
