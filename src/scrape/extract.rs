//! Turns result links into process records

use crate::{
    browser::config::ScrapeConfig,
    error::Result,
    model::{ProcessMetadata, ProcessRecord},
    page::{DetailPopup, Link, PortalPage},
    scrape::{
        outcome::Attempt,
        poll::{ensure_active, settle},
        waiter::case_links,
    },
    text::{find_case_number, is_noise, normalize},
};
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

/// Row selectors for the movements table, tried in order
pub const MOVEMENT_ROW_SELECTORS: &[&str] = &[
    "tbody[id*='tabelaMovimentacoes'] tr",
    "table[id*='movimentacao'] tr",
    ".rich-table-row",
    "tbody[id*='processoEvento'] tr",
];

/// Append one record per distinct case number to `records`, in link order.
/// Records pushed before an error are kept.
pub fn extract_processes<P: PortalPage>(
    page: &P,
    config: &ScrapeConfig,
    cancel: &CancellationToken,
    records: &mut Vec<ProcessRecord>,
) -> Result<()> {
    let links = case_links(page)?;
    let mut seen: HashSet<String> = records.iter().map(|r| r.number.clone()).collect();

    for link in &links {
        ensure_active(cancel)?;

        let text = normalize(&link.text);
        let Some(number) = find_case_number(&text) else {
            continue;
        };
        if !seen.insert(number.to_string()) {
            log::debug!("Duplicate row for {}", number);
            continue;
        }

        let parties = row_summary(page, link).logged("Row summary");
        records.push(extract_one(page, link, number, parties, config, cancel)?);
    }

    log::info!("Extracted {} processes from {} links", records.len(), links.len());
    Ok(())
}

/// Normalized text of the table row holding `link`
pub fn row_summary<P: PortalPage>(page: &P, link: &Link) -> Attempt<String> {
    match page.row_text(link) {
        Ok(text) => {
            let text = normalize(&text);
            if text.is_empty() { Attempt::skipped("empty row") } else { Attempt::Done(text) }
        }
        Err(e) => Attempt::skipped(e),
    }
}

fn extract_one<P: PortalPage>(
    page: &P,
    link: &Link,
    number: &str,
    parties: Option<String>,
    config: &ScrapeConfig,
    cancel: &CancellationToken,
) -> Result<ProcessRecord> {
    let popup = match page.open_popup(link, cancel) {
        Ok(Some(popup)) => popup,
        Err(e) if e.is_cancelled() => return Err(e),
        Ok(None) => {
            log::warn!("Popup for {} did not open", number);
            return Ok(ProcessRecord::popup_failed(number, parties));
        }
        Err(e) => {
            log::warn!("Popup for {} failed: {}", number, e);
            return Ok(ProcessRecord::popup_failed(number, parties));
        }
    };

    let details = read_popup(&popup, config, cancel);

    if let Err(e) = popup.close() {
        log::warn!("Failed to close popup for {}: {}", number, e);
    }

    Ok(match details? {
        Attempt::Done((metadata, movements)) => ProcessRecord::detailed(number, parties, metadata, movements),
        Attempt::Skipped(reason) => {
            log::warn!("Popup for {} never became ready: {}", number, reason);
            ProcessRecord::popup_failed(number, parties)
        }
    })
}

/// Metadata and movements from an opened popup.
/// Skipped only when the popup document never becomes ready; only cancellation is an error.
pub fn read_popup<D: DetailPopup>(
    popup: &D,
    config: &ScrapeConfig,
    cancel: &CancellationToken,
) -> Result<Attempt<(ProcessMetadata, Vec<String>)>> {
    match popup.wait_ready(cancel) {
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => return Ok(Attempt::skipped(e)),
        Ok(()) => {}
    }

    match popup.reveal_movements(cancel) {
        Ok(true) => settle(cancel, config.movements_tab_settle)?,
        Ok(false) => log::debug!("No movements tab shown"),
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => log::debug!("Movements tab click failed: {}", e),
    }

    let metadata = match popup.body_text() {
        Ok(body) => ProcessMetadata::from_body_text(&body),
        Err(e) => {
            log::warn!("Could not read popup body: {}", e);
            ProcessMetadata::default()
        }
    };

    Ok(Attempt::Done((metadata, extract_movements(popup, config.movement_limit))))
}

/// Rows from the first selector that matches anything
pub fn extract_movements<D: DetailPopup>(popup: &D, limit: usize) -> Vec<String> {
    for selector in MOVEMENT_ROW_SELECTORS {
        match popup.row_texts(selector, limit) {
            Ok(rows) if !rows.is_empty() => return clean_movements(rows),
            Ok(_) => {}
            Err(e) => log::debug!("Movement selector '{}' failed: {}", selector, e),
        }
    }
    Vec::new()
}

/// Normalize, drop blanks, duplicates and noise, keeping order
pub fn clean_movements(rows: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .map(|row| normalize(&row))
        .filter(|row| !row.is_empty() && !is_noise(row) && seen.insert(row.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_movements() {
        let rows = vec![
            "01/02/2023  Distribuído por sorteio".to_string(),
            "  ".to_string(),
            "01/02/2023 Distribuído por sorteio".to_string(),
            "Documentos juntados ao processo".to_string(),
            "02/02/2023 Conclusos para despacho".to_string(),
        ];

        assert_eq!(
            clean_movements(rows),
            vec!["01/02/2023 Distribuído por sorteio", "02/02/2023 Conclusos para despacho"]
        );
    }
}
