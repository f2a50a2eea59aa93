//! One query, one browser session, start to finish

use crate::{
    browser::config::ScrapeConfig,
    error::{Result, ScrapeError},
    model::{DocumentQuery, NO_PROCESSES_MESSAGE, QueryResult},
    page::{Launcher, PortalPage},
    scrape::{
        extract::extract_processes,
        form::{fill_document, locate_document_input, select_document_kind, submit},
        poll::ensure_active,
        waiter::await_results,
    },
    text::truncate_chars,
};
use tokio_util::sync::CancellationToken;

/// Runs lookups against the portal, launching a fresh session for each
pub struct Scraper<L> {
    launcher: L,
    config: ScrapeConfig,
}

impl<L: Launcher> Scraper<L> {
    pub fn new(launcher: L, config: ScrapeConfig) -> Self {
        Self { launcher, config }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Look up `query` on the portal.
    ///
    /// Portal failures are recorded in the returned result. Only a launch
    /// failure or cancellation is returned as an error. The session is closed
    /// on every path.
    pub fn run_query(&self, query: &DocumentQuery, cancel: &CancellationToken) -> Result<QueryResult> {
        let mut result = QueryResult::new(query);

        let page = self.launcher.launch()?;
        log::info!("Browser session started for {} {}", query.kind(), query.digits());

        let outcome = self.drive(&page, query, cancel, &mut result);

        if let Err(e) = page.close() {
            log::warn!("Browser teardown reported an error: {}", e);
        }
        log::info!("Browser session closed");

        match outcome {
            Ok(()) => {}
            Err(ScrapeError::Cancelled) => return Err(ScrapeError::Cancelled),
            Err(e) => {
                log::warn!("Query for {} aborted: {}", query.digits(), e);
                result.internal_error = Some(e.to_string());
            }
        }

        Ok(result)
    }

    fn drive<P: PortalPage>(
        &self,
        page: &P,
        query: &DocumentQuery,
        cancel: &CancellationToken,
        result: &mut QueryResult,
    ) -> Result<()> {
        let config = &self.config;

        ensure_active(cancel)?;
        page.navigate(&config.portal_url, cancel)?;

        ensure_active(cancel)?;
        let frames = page.frames()?;
        select_document_kind(&frames, query.kind(), config, cancel)?.logged("Document kind selection");

        let input = locate_document_input(&frames).ok_or(ScrapeError::InputNotFound)?;
        fill_document(&input, query.digits(), config, cancel)?;

        ensure_active(cancel)?;
        let submission = submit(&input, config, cancel)?;
        log::debug!("Search submitted via {:?}", submission);

        let exit = await_results(page, config, cancel)?;
        if !exit.found() {
            log::info!("No result links ({:?})", exit);
            result.message = Some(NO_PROCESSES_MESSAGE.to_string());
            result.debug_snapshot = match page.content() {
                Ok(html) => Some(truncate_chars(&html, config.snapshot_limit)),
                Err(e) => {
                    log::debug!("Snapshot unavailable: {}", e);
                    None
                }
            };
            return Ok(());
        }

        extract_processes(page, config, cancel, &mut result.processes)
    }
}

