//! The scraping pipeline: form driving, result polling and extraction
//!
//! Every step is generic over the [`crate::page`] capability traits and runs
//! strictly in sequence on one page.

pub mod extract;
pub mod form;
pub mod locator;
pub mod orchestrator;
pub mod outcome;
pub mod poll;
pub mod waiter;

pub use form::Submission;
pub use locator::{Located, Visibility, locate};
pub use orchestrator::Scraper;
pub use outcome::Attempt;
pub use poll::{Poll, PollExit, Probe};
pub use waiter::WaitExit;
