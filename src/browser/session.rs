use crate::{
    browser::{
        config::{LaunchOptions, NavigationWait, ScrapeConfig},
        frame::{ChromeFrame, ChromePopup, evaluate_json},
        scripts::{self, Target},
    },
    error::{Result, ScrapeError},
    page::{Launcher, Link, PortalPage},
    scrape::poll::{Poll, PollExit, Probe, settle},
};
use headless_chrome::{Browser, Tab};
use std::{collections::HashSet, ffi::OsStr, sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

const POPUP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Extra wait after the load event for late XHRs on server-rendered pages
const NETWORK_IDLE_SETTLE: Duration = Duration::from_millis(500);

/// Browser session that owns one Chrome/Chromium process and its search tab.
///
/// Dropping the session kills the browser process, so teardown also happens
/// when a query unwinds.
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Tab holding the portal's search form
    tab: Arc<Tab>,

    config: ScrapeConfig,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: &LaunchOptions, config: ScrapeConfig) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));
        launch_opts.args.push(OsStr::new("--disable-gpu"));

        // Must outlive the slowest query, the default is 30 seconds
        launch_opts.idle_browser_timeout = Duration::from_secs(10 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.sandbox = options.sandbox;

        if let Some(path) = &options.chrome_path {
            launch_opts.path = Some(path.clone());
        }

        if let Some(dir) = &options.user_data_dir {
            launch_opts.user_data_dir = Some(dir.clone());
        }

        let browser = Browser::new(launch_opts).map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        tab.set_user_agent(&options.user_agent, None, None)
            .map_err(|e| ScrapeError::LaunchFailed(format!("Failed to set user agent: {}", e)))?;

        Ok(Self { browser, tab, config })
    }

    /// Get the search tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    fn target_ids(&self) -> Result<HashSet<String>> {
        Ok(self.get_tabs()?.iter().map(|tab| tab.get_target_id().to_string()).collect())
    }

    fn wait_for_new_tab(
        &self,
        known: &HashSet<String>,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Option<Arc<Tab>>> {
        let exit = Poll::new(POPUP_POLL_INTERVAL, timeout).run(cancel, || {
            let opened = self
                .get_tabs()?
                .into_iter()
                .find(|tab| !known.contains(tab.get_target_id().as_str()));
            Ok(opened.map_or(Probe::Pending, Probe::Ready))
        })?;

        Ok(match exit {
            PollExit::Ready(tab) => Some(tab),
            PollExit::TimedOut => None,
        })
    }

    fn wait_for_dom(&self, timeout: Duration, cancel: &CancellationToken) -> Result<()> {
        let top = self.main_frame();
        let exit = Poll::new(POPUP_POLL_INTERVAL, timeout).run(cancel, || {
            Ok(match top.ready_state() {
                Ok(ready) if ready.url != "about:blank" && ready.is_interactive() => Probe::Ready(()),
                _ => Probe::Pending,
            })
        })?;

        match exit {
            PollExit::Ready(()) => Ok(()),
            PollExit::TimedOut => Err(ScrapeError::NavigationFailed(format!("DOM not ready after {:?}", timeout))),
        }
    }

    /// Ordinal of `link` in the current document, which may have re-rendered
    /// since the link was listed
    fn current_ordinal(&self, link: &Link) -> Result<usize> {
        let current = self.links()?;
        match link.relocate(&current) {
            Some(found) => {
                if found.ordinal != link.ordinal {
                    log::debug!("'{}' moved from link #{} to #{}", link.text, link.ordinal, found.ordinal);
                }
                Ok(found.ordinal)
            }
            None => Err(ScrapeError::ElementNotFound(format!("link '{}' is no longer on the page", link.text))),
        }
    }
}

impl PortalPage for BrowserSession {
    type Frame = ChromeFrame;
    type Popup = ChromePopup;

    fn navigate(&self, url: &str, cancel: &CancellationToken) -> Result<()> {
        self.tab.set_default_timeout(self.config.navigation_timeout);
        self.tab
            .navigate_to(url)
            .map_err(|e| ScrapeError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        match self.config.navigation_wait {
            NavigationWait::DomContentLoaded => self.wait_for_dom(self.config.navigation_timeout, cancel)?,
            NavigationWait::NetworkIdle => {
                self.tab
                    .wait_until_navigated()
                    .map_err(|e| ScrapeError::NavigationFailed(format!("Navigation timeout: {}", e)))?;
                settle(cancel, NETWORK_IDLE_SETTLE)?;
            }
        }
        log::debug!("Loaded {}", url);
        Ok(())
    }

    fn main_frame(&self) -> ChromeFrame {
        ChromeFrame::top(self.tab.clone())
    }

    fn frames(&self) -> Result<Vec<ChromeFrame>> {
        let paths: Vec<Vec<usize>> = evaluate_json(&self.tab, &scripts::frame_paths())?;
        log::debug!("Page has {} child frames", paths.len());

        let mut frames = vec![self.main_frame()];
        frames.extend(paths.into_iter().map(|path| ChromeFrame::new(self.tab.clone(), path)));
        Ok(frames)
    }

    fn links(&self) -> Result<Vec<Link>> {
        let texts: Vec<String> = evaluate_json(&self.tab, &scripts::links("document"))?;
        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| Link { ordinal, text })
            .collect())
    }

    fn row_text(&self, link: &Link) -> Result<String> {
        let target = Target::Link(self.current_ordinal(link)?);
        evaluate_json(&self.tab, &scripts::row_text("document", &target))
    }

    fn open_popup(&self, link: &Link, cancel: &CancellationToken) -> Result<Option<ChromePopup>> {
        let known = self.target_ids()?;
        let target = Target::Link(self.current_ordinal(link)?);
        let top = self.main_frame();

        match top.click_target(&target, self.config.popup_click_timeout, cancel) {
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                log::debug!("Click on {} failed ({}), using script click", target.describe(), e);
                top.script_click_target(&target)?;
            }
            Ok(()) => {}
        }

        Ok(self
            .wait_for_new_tab(&known, self.config.popup_timeout, cancel)?
            .map(|tab| ChromePopup::new(tab, &self.config)))
    }

    fn content(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| ScrapeError::EvaluationFailed(format!("Failed to read page content: {}", e)))
    }

    fn close(self) -> Result<()> {
        // headless_chrome has no explicit shutdown: close the tabs, then
        // dropping the Browser kills the process
        for tab in self.get_tabs()? {
            if let Err(e) = tab.close(false) {
                log::debug!("Failed to close tab {}: {}", tab.get_target_id(), e);
            }
        }
        Ok(())
    }
}

/// Launches a headless Chrome session per query
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    pub options: LaunchOptions,
    pub config: ScrapeConfig,
}

impl ChromeLauncher {
    pub fn new(options: LaunchOptions, config: ScrapeConfig) -> Self {
        Self { options, config }
    }
}

impl Launcher for ChromeLauncher {
    type Page = BrowserSession;

    fn launch(&self) -> Result<BrowserSession> {
        BrowserSession::launch(&self.options, self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launcher_carries_options() {
        let launcher = ChromeLauncher::new(LaunchOptions::new().headless(false), ScrapeConfig::default());
        assert!(!launcher.options.headless);
        assert_eq!(launcher.config.movement_limit, 15);
    }

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Ignore by default, run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = BrowserSession::launch(&LaunchOptions::new().headless(true), ScrapeConfig::default());
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_frames_lists_main_first() {
        let session =
            BrowserSession::launch(&LaunchOptions::new().headless(true), ScrapeConfig::default()).expect("launch");
        session
            .navigate("data:text/html,<p>hi</p>", &CancellationToken::new())
            .expect("navigate");

        let frames = session.frames().expect("frames");
        assert!(frames[0].path().is_empty());
        session.close().expect("close");
    }
}
