use std::fmt;

/// Result of a best-effort step: it either ran, or was skipped for a stated reason.
/// Skipping is never an error; callers decide whether to log it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Done(T),
    Skipped(String),
}

impl<T> Attempt<T> {
    pub fn skipped(reason: impl fmt::Display) -> Self {
        Attempt::Skipped(reason.to_string())
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Attempt::Done(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Attempt::Done(value) => Some(value),
            Attempt::Skipped(_) => None,
        }
    }

    /// Log a skip at warn level under `step` and convert to `Option`
    pub fn logged(self, step: &str) -> Option<T> {
        if let Attempt::Skipped(reason) = &self {
            log::warn!("{} skipped: {}", step, reason);
        }
        self.ok()
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Attempt<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Attempt::Done(value),
            Err(e) => Attempt::skipped(e),
        }
    }
}
