//! # pje-consulta
//!
//! Looks up judicial processes on the PJe TRF6 public portal by CPF or CNPJ,
//! driving headless Chrome through the portal's frame-based JSF pages.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pje_consulta::{ChromeLauncher, DocumentKind, DocumentQuery, Scraper};
//! use tokio_util::sync::CancellationToken;
//!
//! # fn main() -> pje_consulta::Result<()> {
//! let scraper = Scraper::new(ChromeLauncher::default(), Default::default());
//! let query = DocumentQuery::parse("123.456.789-00", DocumentKind::Cpf).expect("digits");
//!
//! let result = scraper.run_query(&query, &CancellationToken::new())?;
//! for process in &result.processes {
//!     println!("{} {:?}", process.number, process.subject);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Callers that serve many requests should go through [`service::QueryService`],
//! which adds the result cache, the single-admission gate and the timeout.
//!
//! ## Module Overview
//!
//! - [`page`]: capability traits the pipeline runs against
//! - [`scrape`]: form driving, result polling, extraction and the orchestrator
//! - [`browser`]: headless Chrome implementation and configuration
//! - [`text`]: normalisation and the case-number / noise patterns
//! - [`model`]: queries and results
//! - [`service`]: cache, admission gate and timeout around the scraper
//! - [`error`]: error types and result aliases

pub mod browser;
pub mod error;
pub mod model;
pub mod page;
pub mod scrape;
pub mod service;
pub mod text;

pub use browser::{BrowserSession, ChromeLauncher, LaunchOptions, NavigationWait, ScrapeConfig, ServiceConfig};
pub use error::{Result, ScrapeError, ServiceError};
pub use model::{DocumentKind, DocumentQuery, ProcessRecord, QueryResult};
pub use page::{Browsable, DetailPopup, Launcher, Link, PortalPage};
pub use scrape::Scraper;
pub use service::QueryService;
