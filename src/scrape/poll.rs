//! Bounded polling with an explicit exit set

use crate::error::{Result, ScrapeError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// What a single probe observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Ready(T),
    Pending,
}

/// How a poll ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollExit<T> {
    Ready(T),
    TimedOut,
}

/// Repeats a probe every `interval` until it is ready or `timeout` has elapsed
#[derive(Debug, Clone, Copy)]
pub struct Poll {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Poll {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Run `probe` until it reports `Ready`.
    ///
    /// The elapsed time is checked before every probe, so a zero timeout never
    /// probes. Probe errors propagate; cancellation returns
    /// [`ScrapeError::Cancelled`].
    pub fn run<T>(&self, cancel: &CancellationToken, mut probe: impl FnMut() -> Result<Probe<T>>) -> Result<PollExit<T>> {
        let start = Instant::now();
        loop {
            if start.elapsed() >= self.timeout {
                return Ok(PollExit::TimedOut);
            }
            ensure_active(cancel)?;

            if let Probe::Ready(value) = probe()? {
                return Ok(PollExit::Ready(value));
            }

            std::thread::sleep(self.interval);
        }
    }
}

/// Fail fast once the caller has given up on this query
pub fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() { Err(ScrapeError::Cancelled) } else { Ok(()) }
}

/// Longest uninterrupted sleep inside [`settle`]
const SETTLE_SLICE: Duration = Duration::from_millis(50);

/// Sleep for `duration`, waking early with [`ScrapeError::Cancelled`]
pub fn settle(cancel: &CancellationToken, duration: Duration) -> Result<()> {
    let slices = Poll::new(duration.min(SETTLE_SLICE), duration);
    slices.run(cancel, || Ok(Probe::<()>::Pending)).map(|_| ())
}
