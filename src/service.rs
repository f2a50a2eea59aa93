//! Boundary around the scraper: result cache, admission gate and timeout
//!
//! The scraper itself is synchronous and stateless across queries. This layer
//! runs it on the blocking pool, admits one query at a time, caches results
//! per document and enforces the wall-clock budget.

use crate::{
    browser::config::ServiceConfig,
    error::ServiceError,
    model::{DocumentKind, DocumentQuery, QueryResult},
    page::Launcher,
    scrape::Scraper,
};
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// Static capability descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub ok: bool,
    pub target: &'static str,
}

pub fn health() -> Health {
    Health { ok: true, target: "TRF6" }
}

#[derive(Debug, Clone)]
pub struct CachedEntry<V> {
    pub value: V,
    pub stored_at: Instant,
}

/// Key/value store whose entries expire `ttl` after they were stored
#[derive(Debug)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// Fresh value for `key`. Expired entries are evicted on the way.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        let entry = CachedEntry { value, stored_at: Instant::now() };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bounds how many scrapes run at once
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    permits: Arc<Semaphore>,
}

impl AdmissionGate {
    pub fn new(permits: usize) -> Self {
        Self { permits: Arc::new(Semaphore::new(permits)) }
    }

    /// Wait for a slot. The slot is released when the permit drops.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, ServiceError> {
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ServiceError::Unavailable)
    }

    /// Refuse every waiting and future caller
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Entry point for callers: validates input and runs the scraper under the boundary policy
pub struct QueryService<L> {
    scraper: Arc<Scraper<L>>,
    cache: Arc<TtlCache<QueryResult>>,
    gate: AdmissionGate,
    query_timeout: Duration,
}

impl<L> QueryService<L>
where
    L: Launcher + Send + Sync + 'static,
{
    pub fn new(scraper: Scraper<L>, config: &ServiceConfig) -> Self {
        Self::with_parts(
            Arc::new(scraper),
            Arc::new(TtlCache::new(config.cache_ttl)),
            AdmissionGate::new(config.max_concurrent),
            config.query_timeout,
        )
    }

    /// Build from shared collaborators
    pub fn with_parts(
        scraper: Arc<Scraper<L>>,
        cache: Arc<TtlCache<QueryResult>>,
        gate: AdmissionGate,
        query_timeout: Duration,
    ) -> Self {
        Self { scraper, cache, gate, query_timeout }
    }

    pub fn cache(&self) -> &Arc<TtlCache<QueryResult>> {
        &self.cache
    }

    /// Look up a raw document string (`"123.456.789-00"`) of kind `"cpf"` or `"cnpj"`
    pub async fn consult(&self, raw_document: &str, kind: &str) -> Result<QueryResult, ServiceError> {
        let kind: DocumentKind = kind.parse().map_err(ServiceError::InvalidKind)?;
        let query = DocumentQuery::parse(raw_document, kind).ok_or(ServiceError::EmptyDocument)?;
        self.run(query).await
    }

    pub async fn run(&self, query: DocumentQuery) -> Result<QueryResult, ServiceError> {
        let key = query.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("Cache hit for {}", key);
            return Ok(hit);
        }

        let permit = self.gate.admit().await?;

        // Another caller may have filled the entry while we queued
        if let Some(hit) = self.cache.get(&key) {
            log::debug!("Cache filled while queued for {}", key);
            return Ok(hit);
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let scraper = self.scraper.clone();

        // The permit lives inside the task so the next scrape waits for this teardown
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            scraper.run_query(&query, &task_cancel)
        });

        match tokio::time::timeout(self.query_timeout, task).await {
            Err(_) => {
                log::warn!("Query {} exceeded {:?}, cancelling", key, self.query_timeout);
                cancel.cancel();
                Err(ServiceError::Timeout)
            }
            Ok(Err(e)) => Err(ServiceError::Join(e.to_string())),
            Ok(Ok(Err(e))) => Err(e.into()),
            Ok(Ok(Ok(result))) => {
                self.cache.insert(key, result.clone());
                Ok(result)
            }
        }
    }
}
