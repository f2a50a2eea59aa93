use std::{path::PathBuf, time::Duration};

/// Public search form of the PJe first-instance portal at TRF6
pub const PORTAL_URL: &str = "https://pje1g.trf6.jus.br/consultapublica/ConsultaPublica/listView.seam";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Options for launching a new browser instance
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run browser in headless mode
    pub headless: bool,

    /// Browser window width
    pub window_width: u32,

    /// Browser window height
    pub window_height: u32,

    /// Path to Chrome/Chromium executable
    pub chrome_path: Option<PathBuf>,

    /// User data directory for browser profile
    pub user_data_dir: Option<PathBuf>,

    /// Enable the Chrome sandbox
    pub sandbox: bool,

    /// User agent presented to the portal
    pub user_agent: String,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1366,
            window_height: 768,
            chrome_path: None,
            user_data_dir: None,
            sandbox: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn user_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_data_dir = Some(dir.into());
        self
    }

    pub fn sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// How long to wait after navigating to the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationWait {
    /// Return once `document.readyState` leaves `loading`
    #[default]
    DomContentLoaded,
    /// Wait for the load event, then let late requests settle
    NetworkIdle,
}

/// Portal address and every timing used while scraping
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub portal_url: String,
    pub navigation_wait: NavigationWait,
    pub navigation_timeout: Duration,

    /// Pause after activating the document-kind radio
    pub kind_settle: Duration,
    /// Pause after filling the document field
    pub fill_settle: Duration,
    /// Interactive click budget for the document field and search button
    pub click_timeout: Duration,

    pub results_poll_interval: Duration,
    pub results_timeout: Duration,
    /// Delay before each loading-indicator check
    pub indicator_delay: Duration,
    pub indicator_timeout: Duration,

    pub popup_timeout: Duration,
    pub popup_click_timeout: Duration,
    pub popup_load_timeout: Duration,
    pub movements_tab_timeout: Duration,
    pub movements_tab_settle: Duration,
    pub movement_limit: usize,

    /// Maximum characters kept in `debug_snapshot`
    pub snapshot_limit: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            portal_url: PORTAL_URL.to_string(),
            navigation_wait: NavigationWait::default(),
            navigation_timeout: Duration::from_secs(60),
            kind_settle: Duration::from_millis(500),
            fill_settle: Duration::from_millis(200),
            click_timeout: Duration::from_secs(5),
            results_poll_interval: Duration::from_secs(1),
            results_timeout: Duration::from_secs(10),
            indicator_delay: Duration::from_millis(500),
            indicator_timeout: Duration::from_secs(20),
            popup_timeout: Duration::from_secs(15),
            popup_click_timeout: Duration::from_secs(3),
            popup_load_timeout: Duration::from_secs(15),
            movements_tab_timeout: Duration::from_secs(2),
            movements_tab_settle: Duration::from_millis(500),
            movement_limit: 15,
            snapshot_limit: 20_000,
        }
    }
}

impl ScrapeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn portal_url(mut self, url: impl Into<String>) -> Self {
        self.portal_url = url.into();
        self
    }

    pub fn navigation_wait(mut self, wait: NavigationWait) -> Self {
        self.navigation_wait = wait;
        self
    }

    pub fn results_timeout(mut self, timeout: Duration) -> Self {
        self.results_timeout = timeout;
        self
    }

    /// Zero every settle delay and shrink waits to `budget`.
    /// Used for offline pages where nothing renders asynchronously.
    pub fn quick(mut self, budget: Duration) -> Self {
        self.kind_settle = Duration::ZERO;
        self.fill_settle = Duration::ZERO;
        self.indicator_delay = Duration::ZERO;
        self.movements_tab_settle = Duration::ZERO;
        self.results_poll_interval = budget / 10;
        self.click_timeout = budget;
        self.results_timeout = budget;
        self.indicator_timeout = budget;
        self.popup_timeout = budget;
        self.popup_click_timeout = budget;
        self.popup_load_timeout = budget;
        self.movements_tab_timeout = budget;
        self
    }
}

/// Boundary policy around the scraper
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub cache_ttl: Duration,
    /// Concurrent scrapes admitted process-wide
    pub max_concurrent: usize,
    /// Wall-clock budget for one scrape
    pub query_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            max_concurrent: 1,
            query_timeout: Duration::from_secs(180),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new().headless(false).window_size(800, 600).sandbox(true);

        assert!(!opts.headless);
        assert!(opts.sandbox);
        assert_eq!(opts.window_width, 800);
        assert_eq!(opts.window_height, 600);
        assert_eq!(opts.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_scrape_config_defaults() {
        let config = ScrapeConfig::default();

        assert_eq!(config.portal_url, PORTAL_URL);
        assert_eq!(config.navigation_wait, NavigationWait::DomContentLoaded);
        assert_eq!(config.results_timeout, Duration::from_secs(10));
        assert_eq!(config.movement_limit, 15);
        assert_eq!(config.snapshot_limit, 20_000);
    }

    #[test]
    fn test_quick_config_removes_settle_delays() {
        let config = ScrapeConfig::new().quick(Duration::from_millis(100));

        assert_eq!(config.kind_settle, Duration::ZERO);
        assert_eq!(config.indicator_delay, Duration::ZERO);
        assert_eq!(config.results_poll_interval, Duration::from_millis(10));
        assert_eq!(config.popup_timeout, Duration::from_millis(100));
    }
}
