use crate::{error::Result, page::Browsable};

/// Whether the first match must be visible to count as found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Any,
    Required,
}

/// A selector resolved inside a specific frame
#[derive(Debug)]
pub struct Located<'a, F> {
    pub frame: &'a F,
    pub selector: String,
}

/// Scan `frames` in order and return the first one where `selector` matches.
///
/// A frame whose lookup fails (detached, cross-origin) is skipped.
pub fn locate<'a, F: Browsable>(frames: &'a [F], selector: &str, visibility: Visibility) -> Option<Located<'a, F>> {
    frames.iter().find_map(|frame| match matches_in(frame, selector, visibility) {
        Ok(true) => {
            log::debug!("'{}' found in {}", selector, frame.describe());
            Some(Located { frame, selector: selector.to_string() })
        }
        Ok(false) => None,
        Err(e) => {
            log::debug!("Skipping {} while locating '{}': {}", frame.describe(), selector, e);
            None
        }
    })
}

fn matches_in<F: Browsable>(frame: &F, selector: &str, visibility: Visibility) -> Result<bool> {
    if frame.count(selector)? == 0 {
        return Ok(false);
    }
    match visibility {
        Visibility::Any => Ok(true),
        Visibility::Required => frame.is_visible(selector),
    }
}
