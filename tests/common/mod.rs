//! In-memory portal used by the pipeline tests
#![allow(dead_code)]

use pje_consulta::{
    Browsable, DetailPopup, Launcher, Link, PortalPage, Result, ScrapeError,
    scrape::{
        Poll, PollExit, Probe,
        form::{DOCUMENT_INPUT, SUBMIT_BUTTON, kind_selector},
    },
};
use pje_consulta::model::DocumentKind;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;

/// How often the fakes re-check a condition while waiting
pub const FAKE_RETRY: Duration = Duration::from_millis(5);

/// Shared log of browser interactions, in call order
#[derive(Clone, Debug, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.all().iter().any(|e| e == event)
    }
}

#[derive(Clone, Debug)]
pub struct FakeElement {
    pub visible: bool,
    pub click_fails: bool,
    /// Polls of `is_visible` before the element reports hidden
    pub hide_after: Option<usize>,
}

impl FakeElement {
    pub fn visible() -> Self {
        Self { visible: true, click_fails: false, hide_after: None }
    }

    pub fn hidden() -> Self {
        Self { visible: false, ..Self::visible() }
    }

    pub fn unclickable() -> Self {
        Self { click_fails: true, ..Self::visible() }
    }
}

#[derive(Clone)]
pub struct FakeFrame {
    pub name: String,
    pub elements: HashMap<String, FakeElement>,
    /// Every lookup in this frame fails, like a cross-origin frame
    pub broken: bool,
    pub events: Events,
    visibility_checks: Arc<AtomicUsize>,
}

impl FakeFrame {
    pub fn new(name: &str, events: &Events) -> Self {
        Self {
            name: name.to_string(),
            elements: HashMap::new(),
            broken: false,
            events: events.clone(),
            visibility_checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn broken(name: &str, events: &Events) -> Self {
        Self { broken: true, ..Self::new(name, events) }
    }

    pub fn with(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements.insert(selector.to_string(), element);
        self
    }

    /// Kind radios, a visible document field and the search button
    pub fn search_form(name: &str, events: &Events) -> Self {
        Self::new(name, events)
            .with(&kind_selector(DocumentKind::Cpf), FakeElement::visible())
            .with(&kind_selector(DocumentKind::Cnpj), FakeElement::visible())
            .with(DOCUMENT_INPUT, FakeElement::visible())
            .with(SUBMIT_BUTTON, FakeElement::visible())
    }

    fn element(&self, selector: &str) -> Result<Option<&FakeElement>> {
        if self.broken {
            return Err(ScrapeError::EvaluationFailed(format!("{} is detached", self.name)));
        }
        Ok(self.elements.get(selector))
    }

    fn require(&self, selector: &str) -> Result<&FakeElement> {
        self.element(selector)?
            .ok_or_else(|| ScrapeError::ElementNotFound(selector.to_string()))
    }
}

impl Browsable for FakeFrame {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn count(&self, selector: &str) -> Result<usize> {
        Ok(usize::from(self.element(selector)?.is_some()))
    }

    fn is_visible(&self, selector: &str) -> Result<bool> {
        let Some(element) = self.element(selector)? else {
            return Ok(false);
        };
        let checks = self.visibility_checks.fetch_add(1, Ordering::SeqCst);
        Ok(match element.hide_after {
            Some(limit) => checks < limit,
            None => element.visible,
        })
    }

    fn click(&self, selector: &str, _timeout: Duration, _cancel: &CancellationToken) -> Result<()> {
        let element = self.require(selector)?;
        if element.click_fails || !element.visible {
            return Err(ScrapeError::ClickIntercepted { target: selector.to_string() });
        }
        self.events.push(format!("click:{}:{}", self.name, selector));
        Ok(())
    }

    fn script_click(&self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.events.push(format!("script_click:{}:{}", self.name, selector));
        Ok(())
    }

    fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.require(selector)?;
        self.events.push(format!("fill:{}:{}", self.name, value));
        Ok(())
    }

    fn press_enter(&self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.events.push(format!("enter:{}", self.name));
        Ok(())
    }

    fn wait_hidden(&self, selector: &str, timeout: Duration, cancel: &CancellationToken) -> Result<()> {
        self.events.push(format!("wait_hidden:{}", selector));
        let exit = Poll::new(FAKE_RETRY, timeout).run(cancel, || {
            Ok(if self.is_visible(selector)? { Probe::Pending } else { Probe::Ready(()) })
        })?;
        match exit {
            PollExit::Ready(()) => Ok(()),
            PollExit::TimedOut => Err(ScrapeError::WaitTimeout { what: selector.to_string(), waited: timeout }),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FakePopup {
    pub body: String,
    pub rows: HashMap<String, Vec<String>>,
    pub has_movements_tab: bool,
    pub never_ready: bool,
    /// `wait_ready` blocks until the query is cancelled
    pub stalls: bool,
    pub events: Events,
}

impl FakePopup {
    pub fn new(body: &str) -> Self {
        Self { body: body.to_string(), ..Default::default() }
    }

    pub fn rows(mut self, selector: &str, rows: &[&str]) -> Self {
        self.rows.insert(selector.to_string(), rows.iter().map(|r| r.to_string()).collect());
        self
    }
}

impl DetailPopup for FakePopup {
    fn wait_ready(&self, cancel: &CancellationToken) -> Result<()> {
        if self.stalls {
            Poll::new(FAKE_RETRY, Duration::from_secs(60)).run(cancel, || Ok(Probe::<()>::Pending))?;
        }
        if self.never_ready {
            return Err(ScrapeError::WaitTimeout { what: "popup".into(), waited: Duration::ZERO });
        }
        Ok(())
    }

    fn reveal_movements(&self, _cancel: &CancellationToken) -> Result<bool> {
        if self.has_movements_tab {
            self.events.push("reveal_movements");
        }
        Ok(self.has_movements_tab)
    }

    fn body_text(&self) -> Result<String> {
        Ok(self.body.clone())
    }

    fn row_texts(&self, selector: &str, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .rows
            .get(selector)
            .map(|rows| rows.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn close(self) -> Result<()> {
        self.events.push("popup_closed");
        Ok(())
    }
}

#[derive(Clone)]
pub struct FakeLink {
    pub text: String,
    pub row: Option<String>,
    pub popup: Option<FakePopup>,
}

impl FakeLink {
    pub fn new(text: &str, row: Option<&str>, popup: Option<FakePopup>) -> Self {
        Self { text: text.to_string(), row: row.map(str::to_string), popup }
    }
}

#[derive(Clone)]
pub struct FakePage {
    pub frames: Vec<FakeFrame>,
    pub links: Vec<FakeLink>,
    pub content: String,
    pub fail_navigation: bool,
    /// `links()` returns nothing until it has been called this many times
    pub links_after: usize,
    pub events: Events,
    pub closed: Arc<AtomicBool>,
    link_calls: Arc<AtomicUsize>,
}

impl FakePage {
    pub fn new(events: &Events) -> Self {
        Self {
            frames: vec![FakeFrame::search_form("main", events)],
            links: Vec::new(),
            content: "<html><body>carregando</body></html>".to_string(),
            fail_navigation: false,
            links_after: 0,
            events: events.clone(),
            closed: Arc::new(AtomicBool::new(false)),
            link_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_links(mut self, links: Vec<FakeLink>) -> Self {
        self.links = links;
        self
    }

    pub fn with_frames(mut self, frames: Vec<FakeFrame>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }
}

impl PortalPage for FakePage {
    type Frame = FakeFrame;
    type Popup = FakePopup;

    fn navigate(&self, url: &str, _cancel: &CancellationToken) -> Result<()> {
        if self.fail_navigation {
            return Err(ScrapeError::NavigationFailed(format!("{} unreachable", url)));
        }
        self.events.push(format!("navigate:{}", url));
        Ok(())
    }

    fn main_frame(&self) -> FakeFrame {
        self.frames[0].clone()
    }

    fn frames(&self) -> Result<Vec<FakeFrame>> {
        Ok(self.frames.clone())
    }

    fn links(&self) -> Result<Vec<Link>> {
        let calls = self.link_calls.fetch_add(1, Ordering::SeqCst);
        if calls < self.links_after {
            return Ok(Vec::new());
        }
        Ok(self
            .links
            .iter()
            .enumerate()
            .map(|(ordinal, link)| Link { ordinal, text: link.text.clone() })
            .collect())
    }

    fn row_text(&self, link: &Link) -> Result<String> {
        self.links[link.ordinal]
            .row
            .clone()
            .ok_or_else(|| ScrapeError::ElementNotFound("no enclosing row".into()))
    }

    fn open_popup(&self, link: &Link, _cancel: &CancellationToken) -> Result<Option<FakePopup>> {
        self.events.push(format!("open_popup:{}", link.ordinal));
        Ok(self.links[link.ordinal].popup.clone().map(|mut popup| {
            popup.events = self.events.clone();
            popup
        }))
    }

    fn content(&self) -> Result<String> {
        Ok(self.content.clone())
    }

    fn close(self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        self.events.push("browser_closed");
        Ok(())
    }
}

/// Hands out clones of one page and counts launches
pub struct FakeLauncher {
    pub page: FakePage,
    pub launches: Arc<AtomicUsize>,
    pub fail: bool,
}

impl FakeLauncher {
    pub fn new(page: FakePage) -> Self {
        Self { page, launches: Arc::new(AtomicUsize::new(0)), fail: false }
    }
}

impl Launcher for FakeLauncher {
    type Page = FakePage;

    fn launch(&self) -> Result<FakePage> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScrapeError::LaunchFailed("chrome not installed".into()));
        }
        Ok(self.page.clone())
    }
}

pub const CASE: &str = "1234567-89.2023.4.06.0001";
pub const OTHER_CASE: &str = "7654321-00.2022.4.06.3800";
