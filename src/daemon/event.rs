use std::sync::Arc;

use chrono::{DateTime, Utc};

/// A page the user focused, already reduced to what the tracker stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageVisit {
    /// Normalized domain, e.g. `github.com`.
    pub domain: Arc<str>,
    pub title: Option<Arc<str>>,
}

/// Represents a resolved focus change at a certain point in time. `target`
/// is `None` when focus moved somewhere untrackable: an internal page, a
/// closed tab, or away from the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusEvent {
    pub target: Option<PageVisit>,
    pub timestamp: DateTime<Utc>,
}
