use crate::{
    browser::{
        config::ScrapeConfig,
        scripts::{self, REVEAL_MARKER, Target},
    },
    error::{Result, ScrapeError},
    page::{Browsable, DetailPopup},
    scrape::poll::{Poll, PollExit, Probe},
};
use headless_chrome::{Tab, browser::tab::point::Point};
use serde::{Deserialize, de::DeserializeOwned};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Evaluate a script that returns a JSON string and parse it
pub(crate) fn evaluate_json<T: DeserializeOwned>(tab: &Tab, script: &str) -> Result<T> {
    let result = tab
        .evaluate(script, false)
        .map_err(|e| ScrapeError::EvaluationFailed(e.to_string()))?;

    let value = result
        .value
        .ok_or_else(|| ScrapeError::EvaluationFailed("No value returned from script".to_string()))?;

    let json: String = serde_json::from_value(value)
        .map_err(|e| ScrapeError::EvaluationFailed(format!("Expected a JSON string: {}", e)))?;

    serde_json::from_str(&json).map_err(|e| ScrapeError::EvaluationFailed(format!("Failed to parse script result: {}", e)))
}

#[derive(Debug, Deserialize)]
struct ClickProbe {
    state: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadyState {
    pub url: String,
    pub state: String,
    #[serde(default)]
    pub empty: bool,
}

impl ReadyState {
    /// Parsed, and not the placeholder blank document of a fresh tab
    pub fn is_interactive(&self) -> bool {
        self.state != "loading" && !(self.url == "about:blank" && self.empty)
    }
}

/// One document inside a tab: the top document or a frame addressed by its path
#[derive(Clone)]
pub struct ChromeFrame {
    tab: Arc<Tab>,
    path: Vec<usize>,
    scope: String,
}

impl ChromeFrame {
    pub fn new(tab: Arc<Tab>, path: Vec<usize>) -> Self {
        let scope = scripts::scope_expr(&path);
        Self { tab, path, scope }
    }

    pub fn top(tab: Arc<Tab>) -> Self {
        Self::new(tab, Vec::new())
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    pub fn path(&self) -> &[usize] {
        &self.path
    }

    pub(crate) fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        evaluate_json(&self.tab, script)
    }

    pub(crate) fn scope(&self) -> &str {
        &self.scope
    }

    /// Mouse click at the element's centre once it is visible and uncovered
    pub fn click_target(&self, target: &Target, timeout: Duration, cancel: &CancellationToken) -> Result<()> {
        let mut last_state = String::from("not probed");
        let exit = Poll::new(RETRY_INTERVAL, timeout).run(cancel, || {
            let probe: ClickProbe = self.eval(&scripts::click_probe(&self.scope, target))?;
            if probe.state == "ready" {
                return Ok(Probe::Ready(Point { x: probe.x, y: probe.y }));
            }
            last_state = probe.state;
            Ok(Probe::Pending)
        })?;

        match exit {
            PollExit::Ready(point) => {
                self.tab
                    .click_point(point)
                    .map_err(|e| ScrapeError::TabOperationFailed(format!("Mouse click failed: {}", e)))?;
                Ok(())
            }
            PollExit::TimedOut => {
                let target = target.describe();
                Err(if last_state == "intercepted" {
                    ScrapeError::ClickIntercepted { target }
                } else {
                    ScrapeError::ClickTimeout { target, state: last_state }
                })
            }
        }
    }

    pub fn script_click_target(&self, target: &Target) -> Result<()> {
        self.eval::<bool>(&scripts::script_click(&self.scope, target)).map(|_| ())
    }

    pub(crate) fn ready_state(&self) -> Result<ReadyState> {
        self.eval(&scripts::ready_state(&self.scope))
    }
}

impl Browsable for ChromeFrame {
    fn describe(&self) -> String {
        if self.path.is_empty() {
            "main frame".to_string()
        } else {
            let path: Vec<String> = self.path.iter().map(|i| i.to_string()).collect();
            format!("frame[{}]", path.join("/"))
        }
    }

    fn count(&self, selector: &str) -> Result<usize> {
        self.eval(&scripts::count(&self.scope, selector))
    }

    fn is_visible(&self, selector: &str) -> Result<bool> {
        self.eval(&scripts::is_visible(&self.scope, &Target::Css(selector.to_string())))
    }

    fn click(&self, selector: &str, timeout: Duration, cancel: &CancellationToken) -> Result<()> {
        self.click_target(&Target::Css(selector.to_string()), timeout, cancel)
    }

    fn script_click(&self, selector: &str) -> Result<()> {
        self.script_click_target(&Target::Css(selector.to_string()))
    }

    fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.eval::<bool>(&scripts::fill(&self.scope, &Target::Css(selector.to_string()), value))
            .map(|_| ())
    }

    fn press_enter(&self, selector: &str) -> Result<()> {
        self.eval::<bool>(&scripts::focus(&self.scope, &Target::Css(selector.to_string())))?;
        self.tab
            .press_key("Enter")
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to press Enter: {}", e)))?;
        Ok(())
    }

    fn wait_hidden(&self, selector: &str, timeout: Duration, cancel: &CancellationToken) -> Result<()> {
        let exit = Poll::new(RETRY_INTERVAL, timeout).run(cancel, || {
            Ok(if self.is_visible(selector)? { Probe::Pending } else { Probe::Ready(()) })
        })?;

        match exit {
            PollExit::Ready(()) => Ok(()),
            PollExit::TimedOut => Err(ScrapeError::wait_timeout(format!("'{}' to hide", selector), timeout)),
        }
    }
}

/// A process detail tab opened from a result link
pub struct ChromePopup {
    frame: ChromeFrame,
    load_timeout: Duration,
    tab_click_timeout: Duration,
}

impl ChromePopup {
    pub fn new(tab: Arc<Tab>, config: &ScrapeConfig) -> Self {
        Self {
            frame: ChromeFrame::top(tab),
            load_timeout: config.popup_load_timeout,
            tab_click_timeout: config.movements_tab_timeout,
        }
    }
}

impl DetailPopup for ChromePopup {
    fn wait_ready(&self, cancel: &CancellationToken) -> Result<()> {
        let exit = Poll::new(RETRY_INTERVAL, self.load_timeout).run(cancel, || {
            // A freshly opened tab may not have a document yet
            Ok(match self.frame.ready_state() {
                Ok(ready) if ready.is_interactive() => Probe::Ready(()),
                _ => Probe::Pending,
            })
        })?;

        match exit {
            PollExit::Ready(()) => Ok(()),
            PollExit::TimedOut => Err(ScrapeError::wait_timeout("popup document", self.load_timeout)),
        }
    }

    fn reveal_movements(&self, cancel: &CancellationToken) -> Result<bool> {
        let marked: bool = self.frame.eval(&scripts::mark_movements_tab(self.frame.scope()))?;
        if !marked {
            return Ok(false);
        }
        self.frame.click(REVEAL_MARKER, self.tab_click_timeout, cancel)?;
        Ok(true)
    }

    fn body_text(&self) -> Result<String> {
        self.frame.eval(&scripts::body_text(self.frame.scope()))
    }

    fn row_texts(&self, selector: &str, limit: usize) -> Result<Vec<String>> {
        self.frame.eval(&scripts::row_texts(self.frame.scope(), selector, limit))
    }

    fn close(self) -> Result<()> {
        self.frame
            .tab()
            .close(true)
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to close popup: {}", e)))?;
        Ok(())
    }
}
