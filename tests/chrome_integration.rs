//! Runs the headless Chrome backend against local `data:` pages.
//!
//! These need a Chrome/Chromium install, run with: cargo test -- --ignored

use pje_consulta::{
    Browsable, BrowserSession, DetailPopup, DocumentKind, LaunchOptions, PortalPage, ScrapeConfig,
    scrape::{Visibility, form, locate},
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn data_url(html: &str) -> String {
    format!("data:text/html;charset=utf-8,{}", urlencoding::encode(html))
}

fn session() -> BrowserSession {
    BrowserSession::launch(&LaunchOptions::new().headless(true), session_config().clone())
        .expect("Failed to launch browser")
}

const SEARCH_FORM: &str = r#"<form>
<input type="radio" name="tipoMascaraDocumento" onclick="mascara('CPF')">
<input type="radio" name="tipoMascaraDocumento" onclick="mascara('CNPJ')">
<input id="fPP:dpDec:documentoParte" type="text">
<button id="fPP:searchProcessos" type="button">Pesquisar</button>
</form>"#;

#[test]
#[ignore]
fn test_input_is_located_inside_iframe() {
    let session = session();
    let frame = format!(r#"<p>topo</p><iframe srcdoc="{}"></iframe>"#, SEARCH_FORM.replace('"', "&quot;"));
    session.navigate(&data_url(&frame), &CancellationToken::new()).expect("Failed to navigate");
    std::thread::sleep(Duration::from_millis(300));

    let frames = session.frames().expect("Failed to list frames");
    assert_eq!(frames.len(), 2);

    let input = form::locate_document_input(&frames).expect("input not found");
    assert_eq!(input.frame.describe(), "frame[0]");

    let cancel = CancellationToken::new();
    let kind = form::select_document_kind(&frames, DocumentKind::Cnpj, session_config(), &cancel).expect("kind");
    assert!(kind.is_done());

    form::fill_document(&input, "12345678000190", session_config(), &cancel).expect("Failed to fill");
    assert!(locate(&frames, "[id='fPP:searchProcessos']", Visibility::Required).is_some());

    session.close().expect("Failed to close");
}

#[test]
#[ignore]
fn test_popup_tab_is_detected() {
    let session = session();
    let page = r##"<table><tr>
<td><a href="#" onclick="const w = window.open(''); w.document.write('<p>Assunto: Execução Fiscal</p>'); w.document.close(); return false;">1234567-89.2023.4.06.0001</a></td>
<td>João Silva</td>
</tr></table>"##;
    session.navigate(&data_url(page), &CancellationToken::new()).expect("Failed to navigate");

    let links = session.links().expect("Failed to list links");
    assert_eq!(links.len(), 1);
    assert!(session.row_text(&links[0]).expect("row").contains("João Silva"));

    let cancel = CancellationToken::new();
    let popup = session.open_popup(&links[0], &cancel).expect("Failed to open popup").expect("no popup tab");
    popup.wait_ready(&cancel).expect("popup never loaded");
    assert!(popup.body_text().expect("body").contains("Execução Fiscal"));
    popup.close().expect("Failed to close popup");

    session.close().expect("Failed to close");
}

fn session_config() -> &'static ScrapeConfig {
    static CONFIG: std::sync::LazyLock<ScrapeConfig> =
        std::sync::LazyLock::new(|| ScrapeConfig::new().quick(Duration::from_secs(3)));
    &CONFIG
}
