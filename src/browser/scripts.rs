//! JavaScript sent to the page
//!
//! headless_chrome hands objects back by reference, so every script returns
//! `JSON.stringify(...)` and the caller parses the string. Scripts run in the
//! top-level window and reach frames through `window.frames[..].document`.

/// Attribute used to tag the movements tab before clicking it
pub const REVEAL_MARKER: &str = "[data-pje-reveal='1']";

const VISIBLE_FN: &str = r#"function __visible(el) {
    if (!el) return false;
    const r = el.getBoundingClientRect();
    const s = el.ownerDocument.defaultView.getComputedStyle(el);
    return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
}"#;

/// An element inside a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Css(String),
    /// The n-th anchor of the document
    Link(usize),
}

impl Target {
    fn expr(&self) -> String {
        match self {
            Target::Css(selector) => format!("__doc.querySelector({})", literal(selector)),
            Target::Link(ordinal) => format!("__doc.querySelectorAll('a')[{}]", ordinal),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Target::Css(selector) => selector.clone(),
            Target::Link(ordinal) => format!("link #{}", ordinal),
        }
    }
}

/// JS string literal for `value`
fn literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Document expression for a frame path; empty is the top document
pub fn scope_expr(path: &[usize]) -> String {
    if path.is_empty() {
        return "document".to_string();
    }
    let frames: String = path.iter().map(|i| format!(".frames[{}]", i)).collect();
    format!("window{}.document", frames)
}

fn wrap(scope: &str, body: &str) -> String {
    format!("(function() {{\n{}\nconst __doc = {};\n{}\n}})()", VISIBLE_FN, scope, body)
}

fn with_element(scope: &str, target: &Target, body: &str) -> String {
    wrap(
        scope,
        &format!(
            "const el = {};\nif (!el) throw new Error('element not found');\n{}",
            target.expr(),
            body
        ),
    )
}

pub fn count(scope: &str, selector: &str) -> String {
    wrap(scope, &format!("return JSON.stringify(__doc.querySelectorAll({}).length);", literal(selector)))
}

pub fn is_visible(scope: &str, target: &Target) -> String {
    wrap(scope, &format!("return JSON.stringify(__visible({}));", target.expr()))
}

pub fn script_click(scope: &str, target: &Target) -> String {
    with_element(scope, target, "el.click();\nreturn JSON.stringify(true);")
}

pub fn focus(scope: &str, target: &Target) -> String {
    with_element(scope, target, "el.focus();\nreturn JSON.stringify(true);")
}

pub fn fill(scope: &str, target: &Target, value: &str) -> String {
    with_element(
        scope,
        target,
        &format!(
            r#"el.focus();
el.value = {};
el.dispatchEvent(new Event('input', {{ bubbles: true }}));
el.dispatchEvent(new Event('change', {{ bubbles: true }}));
return JSON.stringify(true);"#,
            literal(value)
        ),
    )
}

/// Scroll the element into view and report whether a click at its centre
/// would land on it, with the centre in top-level viewport coordinates
pub fn click_probe(scope: &str, target: &Target) -> String {
    wrap(
        scope,
        &format!(
            r#"const el = {};
if (!el) return JSON.stringify({{ state: 'missing' }});
el.scrollIntoView({{ block: 'center', inline: 'center' }});
if (!__visible(el)) return JSON.stringify({{ state: 'hidden' }});
const r = el.getBoundingClientRect();
const cx = r.left + r.width / 2;
const cy = r.top + r.height / 2;
const hit = el.ownerDocument.elementFromPoint(cx, cy);
if (hit && hit !== el && !el.contains(hit)) return JSON.stringify({{ state: 'intercepted' }});
let x = cx;
let y = cy;
let w = el.ownerDocument.defaultView;
while (w && w !== window && w.frameElement) {{
    const fr = w.frameElement.getBoundingClientRect();
    x += fr.left + w.frameElement.clientLeft;
    y += fr.top + w.frameElement.clientTop;
    w = w.parent;
}}
return JSON.stringify({{ state: 'ready', x: x, y: y }});"#,
            target.expr()
        ),
    )
}

pub fn links(scope: &str) -> String {
    wrap(
        scope,
        "return JSON.stringify(Array.from(__doc.querySelectorAll('a')).map(a => a.innerText || ''));",
    )
}

pub fn row_text(scope: &str, target: &Target) -> String {
    with_element(
        scope,
        target,
        "const tr = el.closest('tr');\nif (!tr) throw new Error('no enclosing row');\nreturn JSON.stringify(tr.innerText || '');",
    )
}

pub fn row_texts(scope: &str, selector: &str, limit: usize) -> String {
    wrap(
        scope,
        &format!(
            "return JSON.stringify(Array.from(__doc.querySelectorAll({})).slice(0, {}).map(r => r.innerText || ''));",
            literal(selector),
            limit
        ),
    )
}

pub fn body_text(scope: &str) -> String {
    wrap(scope, "return JSON.stringify(__doc.body ? __doc.body.innerText : '');")
}

pub fn ready_state(scope: &str) -> String {
    wrap(
        scope,
        "return JSON.stringify({ url: __doc.URL, state: __doc.readyState, empty: !__doc.body || __doc.body.childElementCount === 0 });",
    )
}

/// Tag the visible movements tab (or the shortest visible label naming it)
/// with the reveal marker. Returns whether anything was tagged.
pub fn mark_movements_tab(scope: &str) -> String {
    wrap(
        scope,
        r#"const pattern = /Movimenta(ç|c)(õ|o)es/i;
__doc.querySelectorAll('[data-pje-reveal]').forEach(e => e.removeAttribute('data-pje-reveal'));
let target = Array.from(__doc.querySelectorAll('[role=tab]'))
    .filter(e => /Movimenta/i.test(e.innerText || ''))
    .find(__visible);
if (!target) {
    const labels = Array.from(__doc.querySelectorAll('a, button, label, span, td, th, li'))
        .filter(e => pattern.test(e.innerText || '') && __visible(e));
    labels.sort((a, b) => (a.innerText || '').length - (b.innerText || '').length);
    target = labels[0];
}
if (!target) return JSON.stringify(false);
target.setAttribute('data-pje-reveal', '1');
return JSON.stringify(true);"#,
    )
}

/// Paths of every frame below the top window, depth first
pub fn frame_paths() -> String {
    r#"(function() {
    const paths = [];
    function walk(win, prefix) {
        for (let i = 0; i < win.frames.length; i++) {
            const path = prefix.concat([i]);
            paths.push(path);
            try { walk(win.frames[i], path); } catch (e) {}
        }
    }
    walk(window, []);
    return JSON.stringify(paths);
})()"#
        .to_string()
}
