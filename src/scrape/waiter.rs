//! Waits for the search round-trip to finish

use crate::{
    browser::config::ScrapeConfig,
    error::Result,
    page::{Browsable, Link, PortalPage},
    scrape::{
        outcome::Attempt,
        poll::{Poll, PollExit, Probe, settle},
    },
    text::{is_case_number, normalize, signals_no_records},
};
use tokio_util::sync::CancellationToken;

/// Overlays and spinners the portal shows during AJAX requests
pub const LOADING_INDICATORS: &[&str] = &["[id*='status']", ".ui-widget-overlay", "img[src*='spinner']"];

/// Why the results wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitExit {
    ResultsFound,
    NoRecords,
    TimedOut,
}

impl WaitExit {
    pub fn found(self) -> bool {
        self == WaitExit::ResultsFound
    }
}

/// Poll until result links or a "no records" notice show up
pub fn await_results<P: PortalPage>(page: &P, config: &ScrapeConfig, cancel: &CancellationToken) -> Result<WaitExit> {
    let poll = Poll::new(config.results_poll_interval, config.results_timeout);

    let exit = poll.run(cancel, || {
        wait_for_indicators(&page.main_frame(), config, cancel)?;

        if !case_links(page)?.is_empty() {
            return Ok(Probe::Ready(WaitExit::ResultsFound));
        }
        if signals_no_records(&page.content()?) {
            return Ok(Probe::Ready(WaitExit::NoRecords));
        }
        Ok(Probe::Pending)
    })?;

    Ok(match exit {
        PollExit::Ready(exit) => exit,
        PollExit::TimedOut => WaitExit::TimedOut,
    })
}

/// Block on each visible loading indicator until it hides.
/// Returns one attempt per indicator that was showing; only cancellation is an error.
pub fn wait_for_indicators<F: Browsable>(
    frame: &F,
    config: &ScrapeConfig,
    cancel: &CancellationToken,
) -> Result<Vec<Attempt<()>>> {
    settle(cancel, config.indicator_delay)?;

    let mut attempts = Vec::new();
    for selector in LOADING_INDICATORS {
        if !frame.is_visible(selector).unwrap_or(false) {
            continue;
        }
        log::debug!("Loading indicator '{}' visible, waiting", selector);
        let attempt: Attempt<()> = match frame.wait_hidden(selector, config.indicator_timeout, cancel) {
            Err(e) if e.is_cancelled() => return Err(e),
            waited => waited.into(),
        };
        if let Attempt::Skipped(reason) = &attempt {
            log::debug!("Indicator '{}' still showing: {}", selector, reason);
        }
        attempts.push(attempt);
    }
    Ok(attempts)
}

/// Anchors whose visible text carries a case number, in document order
pub fn case_links<P: PortalPage>(page: &P) -> Result<Vec<Link>> {
    Ok(page
        .links()?
        .into_iter()
        .filter(|link| is_case_number(&normalize(&link.text)))
        .collect())
}
