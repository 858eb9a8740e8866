//! Warnings collected while converting a document.

use std::fmt;
use std::sync::Arc;

use ecow::EcoString;
use log::warn;
use parking_lot::Mutex;

/// A recoverable problem met while converting one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// What the warning is about, e.g. an image reference or a node type.
    pub subject: EcoString,
    /// What went wrong.
    pub message: EcoString,
}

impl Warning {
    /// Creates a warning.
    pub fn new(subject: impl Into<EcoString>, message: impl Into<EcoString>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Shared collector for warnings emitted while converting one document.
///
/// Clones share the same storage, so the parser and both writers can report
/// into one list.
#[derive(Clone, Default)]
pub struct WarningCollector {
    inner: Arc<Mutex<Vec<Warning>>>,
}

impl WarningCollector {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning and forwards it to the log.
    pub fn push(&self, warning: Warning) {
        warn!("{warning}");
        self.inner.lock().push(warning);
    }

    /// The number of warnings recorded.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no warning was recorded.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Clone all collected warnings into a standalone vector.
    pub fn snapshot(&self) -> Vec<Warning> {
        self.inner.lock().clone()
    }
}

impl fmt::Debug for WarningCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.lock().iter()).finish()
    }
}
