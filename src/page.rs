//! Capabilities the scraping pipeline needs from a browser
//!
//! The pipeline never talks to a browser engine directly. It walks a list of
//! [`Browsable`] scopes (the top document and every embedded frame), asks a
//! [`PortalPage`] for result links and popups, and reads a [`DetailPopup`].
//! The headless Chrome backend lives in [`crate::browser`].
//!
//! Every method that waits takes the query's [`CancellationToken`] and returns
//! [`crate::ScrapeError::Cancelled`] soon after it fires.

use crate::{
    error::Result,
    text::{find_case_number, normalize},
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A document that can resolve CSS selectors: the main page, a frame, or a popup
pub trait Browsable {
    /// Short name for logs
    fn describe(&self) -> String;

    /// Number of elements matching `selector`
    fn count(&self, selector: &str) -> Result<usize>;

    /// Whether the first match is rendered and visible
    fn is_visible(&self, selector: &str) -> Result<bool>;

    /// Physical click on the first match, waiting up to `timeout` for it to be clickable
    fn click(&self, selector: &str, timeout: Duration, cancel: &CancellationToken) -> Result<()>;

    /// `element.click()` from script, ignoring overlays
    fn script_click(&self, selector: &str) -> Result<()>;

    /// Replace the value of the first match and fire input/change events
    fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Focus the first match and press Enter
    fn press_enter(&self, selector: &str) -> Result<()>;

    /// Block until the first match is hidden or gone
    fn wait_hidden(&self, selector: &str, timeout: Duration, cancel: &CancellationToken) -> Result<()>;
}

/// An anchor on the results page, addressed by document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub ordinal: usize,
    pub text: String,
}

impl Link {
    /// Case number carried by the anchor text
    pub fn case_number(&self) -> Option<String> {
        find_case_number(&normalize(&self.text)).map(str::to_string)
    }

    /// Find this anchor again in a fresh listing of the same document.
    ///
    /// Anchors are matched on their case number, or on their text when they
    /// carry none. The old ordinal wins when it still matches, so repeated
    /// rows for one case keep their position.
    pub fn relocate<'a>(&self, current: &'a [Link]) -> Option<&'a Link> {
        let number = self.case_number();
        let text = normalize(&self.text);
        let same = |candidate: &Link| match &number {
            Some(number) => candidate.case_number().as_ref() == Some(number),
            None => normalize(&candidate.text) == text,
        };

        current
            .get(self.ordinal)
            .filter(|candidate| same(candidate))
            .or_else(|| current.iter().find(|candidate| same(candidate)))
    }
}

/// The portal's search page inside one browser session
pub trait PortalPage {
    type Frame: Browsable;
    type Popup: DetailPopup;

    fn navigate(&self, url: &str, cancel: &CancellationToken) -> Result<()>;

    /// The top-level document
    fn main_frame(&self) -> Self::Frame;

    /// The main frame followed by every child frame in browser order
    fn frames(&self) -> Result<Vec<Self::Frame>>;

    /// All anchors of the main document with their visible text
    fn links(&self) -> Result<Vec<Link>>;

    /// Visible text of the nearest table row enclosing `link`
    fn row_text(&self, link: &Link) -> Result<String>;

    /// Click `link` and return the tab it opens, or `None` if nothing opened in time
    fn open_popup(&self, link: &Link, cancel: &CancellationToken) -> Result<Option<Self::Popup>>;

    /// Serialized HTML of the main document
    fn content(&self) -> Result<String>;

    /// Release the browser session
    fn close(self) -> Result<()>;
}

/// A process detail window
pub trait DetailPopup {
    /// Wait for the popup's document to become interactive
    fn wait_ready(&self, cancel: &CancellationToken) -> Result<()>;

    /// Click the movements tab if one is shown. Returns whether a tab was clicked.
    fn reveal_movements(&self, cancel: &CancellationToken) -> Result<bool>;

    fn body_text(&self) -> Result<String>;

    /// Visible text of the first `limit` elements matching `selector`
    fn row_texts(&self, selector: &str, limit: usize) -> Result<Vec<String>>;

    fn close(self) -> Result<()>;
}

/// Starts a fresh browser session per query
pub trait Launcher {
    type Page: PortalPage;

    fn launch(&self) -> Result<Self::Page>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(ordinal: usize, text: &str) -> Link {
        Link { ordinal, text: text.to_string() }
    }

    #[test]
    fn test_relocate_keeps_matching_ordinal() {
        let wanted = link(1, "1234567-89.2023.4.06.0001");
        let current = vec![link(0, "Início"), link(1, " 1234567-89.2023.4.06.0001 ")];

        assert_eq!(wanted.relocate(&current), Some(&current[1]));
    }

    #[test]
    fn test_relocate_follows_rerendered_rows() {
        let wanted = link(1, "1234567-89.2023.4.06.0001");
        let current = vec![
            link(0, "Início"),
            link(1, "7654321-00.2022.4.06.3800"),
            link(2, "Processo 1234567-89.2023.4.06.0001"),
        ];

        assert_eq!(wanted.relocate(&current), Some(&current[2]));
    }

    #[test]
    fn test_relocate_misses_vanished_anchor() {
        let wanted = link(0, "1234567-89.2023.4.06.0001");
        let current = vec![link(0, "7654321-00.2022.4.06.3800")];

        assert_eq!(wanted.relocate(&current), None);
        assert_eq!(link(0, "Voltar").relocate(&[link(3, "voltar"), link(4, "Voltar")]), Some(&link(4, "Voltar")));
    }
}
