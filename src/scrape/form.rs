//! Drives the search form: document kind, document number, submission

use crate::{
    browser::config::ScrapeConfig,
    error::Result,
    model::DocumentKind,
    page::Browsable,
    scrape::{
        locator::{Located, Visibility, locate},
        outcome::Attempt,
        poll::settle,
    },
};
use tokio_util::sync::CancellationToken;

/// Document number field
pub const DOCUMENT_INPUT: &str = "[id='fPP:dpDec:documentoParte']";

/// Search button
pub const SUBMIT_BUTTON: &str = "[id='fPP:searchProcessos']";

/// Radio control for `kind`, matched on its onclick handler
pub fn kind_selector(kind: DocumentKind) -> String {
    format!("input[name='tipoMascaraDocumento'][onclick*='{}']", kind.label())
}

/// Activate the radio for `kind` in the first frame that has it.
///
/// Returns the frame it was clicked in. Missing radios are skipped because
/// the portal may already have the kind selected.
pub fn select_document_kind<F: Browsable>(
    frames: &[F],
    kind: DocumentKind,
    config: &ScrapeConfig,
    cancel: &CancellationToken,
) -> Result<Attempt<String>> {
    let selector = kind_selector(kind);

    let Some(radio) = locate(frames, &selector, Visibility::Any) else {
        return Ok(Attempt::skipped(format!("no {} radio in any frame", kind)));
    };

    if let Err(e) = radio.frame.script_click(&radio.selector) {
        return Ok(Attempt::skipped(format!("{} radio click failed in {}: {}", kind, radio.frame.describe(), e)));
    }
    settle(cancel, config.kind_settle)?;
    Ok(Attempt::Done(radio.frame.describe()))
}

/// Find the visible document field
pub fn locate_document_input<F: Browsable>(frames: &[F]) -> Option<Located<'_, F>> {
    locate(frames, DOCUMENT_INPUT, Visibility::Required)
}

/// Focus the field and set its value to `digits`
pub fn fill_document<F: Browsable>(
    input: &Located<'_, F>,
    digits: &str,
    config: &ScrapeConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    match input.frame.click(&input.selector, config.click_timeout, cancel) {
        Err(e) if e.is_cancelled() => return Err(e),
        Err(e) => {
            log::debug!("Focus click on document field failed ({}), using script click", e);
            input.frame.script_click(&input.selector)?;
        }
        Ok(()) => {}
    }
    input.frame.fill(&input.selector, digits)?;
    settle(cancel, config.fill_settle)
}

/// Which of the three submission paths ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Clicked,
    ScriptClicked,
    EnterKey,
}

/// Submit the search from the frame holding the document field
pub fn submit<F: Browsable>(
    input: &Located<'_, F>,
    config: &ScrapeConfig,
    cancel: &CancellationToken,
) -> Result<Submission> {
    let frame = input.frame;

    let has_button = frame.count(SUBMIT_BUTTON).unwrap_or_else(|e| {
        log::debug!("Search button lookup failed in {}: {}", frame.describe(), e);
        0
    }) > 0;

    if !has_button {
        log::info!("Search button not found, submitting with Enter");
        frame.press_enter(&input.selector)?;
        return Ok(Submission::EnterKey);
    }

    match frame.click(SUBMIT_BUTTON, config.click_timeout, cancel) {
        Ok(()) => Ok(Submission::Clicked),
        Err(e) if e.is_cancelled() => Err(e),
        Err(e) => {
            log::info!("Search button click failed ({}), using script click", e);
            frame.script_click(SUBMIT_BUTTON)?;
            Ok(Submission::ScriptClicked)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_selector() {
        assert_eq!(
            kind_selector(DocumentKind::Cnpj),
            "input[name='tipoMascaraDocumento'][onclick*='CNPJ']"
        );
        assert!(kind_selector(DocumentKind::Cpf).ends_with("[onclick*='CPF']"));
    }
}
