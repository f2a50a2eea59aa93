use crate::text::{body_lines, find_labeled_value, sanitize_document};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Warning attached to a record whose detail popup never opened
pub const POPUP_FAILED: &str = "popup_nao_abriu";

/// Message set when the search produced no usable result links
pub const NO_PROCESSES_MESSAGE: &str = "nenhum_processo_encontrado_no_tempo_limite";

/// Taxpayer document type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentKind {
    Cpf,
    Cnpj,
}

impl DocumentKind {
    /// Upper-case label used by the portal's radio controls and in results
    pub fn label(self) -> &'static str {
        match self {
            DocumentKind::Cpf => "CPF",
            DocumentKind::Cnpj => "CNPJ",
        }
    }

    /// Lower-case form used in cache keys
    pub fn key(self) -> &'static str {
        match self {
            DocumentKind::Cpf => "cpf",
            DocumentKind::Cnpj => "cnpj",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpf" => Ok(DocumentKind::Cpf),
            "cnpj" => Ok(DocumentKind::Cnpj),
            other => Err(other.to_string()),
        }
    }
}

/// A sanitized lookup request. `digits` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentQuery {
    digits: String,
    kind: DocumentKind,
}

impl DocumentQuery {
    /// Strip non-digits from `raw`. Returns `None` when nothing is left.
    pub fn parse(raw: &str, kind: DocumentKind) -> Option<Self> {
        let digits = sanitize_document(raw);
        (!digits.is_empty()).then_some(Self { digits, kind })
    }

    pub fn digits(&self) -> &str {
        &self.digits
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn cache_key(&self) -> String {
        format!("trf6:{}:{}", self.kind.key(), self.digits)
    }
}

/// Labelled fields scraped from a process detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessMetadata {
    pub subject: Option<String>,
    pub judicial_class: Option<String>,
    pub distribution_date: Option<String>,
    pub court: Option<String>,
    pub jurisdiction: Option<String>,
}

impl ProcessMetadata {
    /// Parse the detail page body text
    pub fn from_body_text(body: &str) -> Self {
        let lines = body_lines(body);
        Self {
            subject: find_labeled_value(&lines, &["assunto"]),
            judicial_class: find_labeled_value(&lines, &["classe judicial", "classe"]),
            distribution_date: find_labeled_value(&lines, &["distribuição"]),
            court: find_labeled_value(&lines, &["órgão julgador"]),
            jurisdiction: find_labeled_value(&lines, &["jurisdição", "comarca"]),
        }
    }
}

/// One legal process found for the queried document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecord {
    pub number: String,
    pub parties_summary: Option<String>,
    pub subject: Option<String>,
    pub judicial_class: Option<String>,
    pub distribution_date: Option<String>,
    pub court: Option<String>,
    pub jurisdiction: Option<String>,
    pub movements: Vec<String>,
    pub warning: Option<String>,
}

impl ProcessRecord {
    /// Record built from an opened detail popup
    pub fn detailed(
        number: impl Into<String>,
        parties_summary: Option<String>,
        metadata: ProcessMetadata,
        movements: Vec<String>,
    ) -> Self {
        Self {
            number: number.into(),
            parties_summary,
            subject: metadata.subject,
            judicial_class: metadata.judicial_class,
            distribution_date: metadata.distribution_date,
            court: metadata.court,
            jurisdiction: metadata.jurisdiction,
            movements,
            warning: None,
        }
    }

    /// Partial record for a result row whose popup could not be opened
    pub fn popup_failed(number: impl Into<String>, parties_summary: Option<String>) -> Self {
        Self {
            warning: Some(POPUP_FAILED.to_string()),
            ..Self::detailed(number, parties_summary, ProcessMetadata::default(), Vec::new())
        }
    }
}

/// Outcome of one lookup, always returned even when the portal misbehaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub document: String,
    pub kind: DocumentKind,
    pub timestamp: String,
    pub processes: Vec<ProcessRecord>,
    pub message: Option<String>,
    pub debug_snapshot: Option<String>,
    pub internal_error: Option<String>,
}

impl QueryResult {
    /// Empty result stamped with the current UTC time
    pub fn new(query: &DocumentQuery) -> Self {
        Self {
            document: query.digits().to_string(),
            kind: query.kind(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            processes: Vec::new(),
            message: None,
            debug_snapshot: None,
            internal_error: None,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.debug_snapshot.is_none() && self.internal_error.is_none()
    }
}
