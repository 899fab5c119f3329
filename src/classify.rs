//! Static classification of website domains into a productive/unproductive/neutral
//! taxonomy. The tables are fixed at compile time; a domain in neither table is
//! neutral.

use std::{collections::HashMap, sync::Arc, sync::LazyLock};

use serde::{Deserialize, Serialize};

/// Broad direction of a category. Serialized in lowercase to match the stored
/// document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Productive,
    Unproductive,
    Neutral,
}

/// Classification of a single domain: the direction plus a display label such
/// as "Development" or "Social Media".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    pub label: Arc<str>,
}

impl Category {
    fn new(kind: CategoryKind, label: &str) -> Self {
        Self {
            kind,
            label: label.into(),
        }
    }
}

pub const NEUTRAL_LABEL: &str = "Other";

static PRODUCTIVE_DOMAINS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("github.com", "Development"),
        ("stackoverflow.com", "Development"),
        ("developer.mozilla.org", "Development"),
        ("codepen.io", "Development"),
        ("leetcode.com", "Development"),
        ("hackerrank.com", "Development"),
        ("docs.google.com", "Productivity"),
        ("notion.so", "Productivity"),
        ("trello.com", "Productivity"),
        ("asana.com", "Productivity"),
        ("slack.com", "Communication"),
        ("zoom.us", "Communication"),
        ("teams.microsoft.com", "Communication"),
        ("gmail.com", "Communication"),
        ("coursera.org", "Learning"),
        ("udemy.com", "Learning"),
        ("khanacademy.org", "Learning"),
        ("edx.org", "Learning"),
    ])
});

static UNPRODUCTIVE_DOMAINS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("facebook.com", "Social Media"),
        ("instagram.com", "Social Media"),
        ("twitter.com", "Social Media"),
        ("tiktok.com", "Social Media"),
        ("linkedin.com", "Social Media"),
        ("youtube.com", "Entertainment"),
        ("netflix.com", "Entertainment"),
        ("twitch.tv", "Entertainment"),
        ("reddit.com", "Entertainment"),
        ("buzzfeed.com", "Entertainment"),
    ])
});

/// Classifies a normalized domain. Pure lookup, no side effects; the result is
/// recomputed on every write so a future table change applies on the next
/// visit.
pub fn classify(domain: &str) -> Category {
    if let Some(label) = PRODUCTIVE_DOMAINS.get(domain) {
        Category::new(CategoryKind::Productive, label)
    } else if let Some(label) = UNPRODUCTIVE_DOMAINS.get(domain) {
        Category::new(CategoryKind::Unproductive, label)
    } else {
        Category::new(CategoryKind::Neutral, NEUTRAL_LABEL)
    }
}
