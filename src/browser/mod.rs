//! Headless Chrome backend for the page capabilities
//!
//! - [`BrowserSession`]: one Chrome process and the search tab, a [`crate::page::PortalPage`]
//! - [`ChromeFrame`]: a document scope inside a tab, a [`crate::page::Browsable`]
//! - [`ChromePopup`]: a process detail tab, a [`crate::page::DetailPopup`]
//! - [`config`]: launch options and scrape timings

pub mod config;
pub mod frame;
pub mod scripts;
pub mod session;

pub use config::{LaunchOptions, NavigationWait, ScrapeConfig, ServiceConfig};
pub use frame::{ChromeFrame, ChromePopup};
pub use session::{BrowserSession, ChromeLauncher};
