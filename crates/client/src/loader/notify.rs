//! Optional UI notification sink.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Anything that can show a message to the user.
///
/// The loader works without one; when attached it is told about every
/// failure in addition to the in-container banner.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}
