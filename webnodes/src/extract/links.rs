//! Link extraction from free text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

static URL_TOKEN: OnceLock<Option<Regex>> = OnceLock::new();

// A token runs from `http://` or `https://` up to whitespace, an angle
// bracket or a double quote.
fn url_token() -> Option<&'static Regex> {
    URL_TOKEN
        .get_or_init(|| Regex::new(r#"(?i)https?://[^\s<>"]*"#).ok())
        .as_ref()
}

/// Intent category of an extracted link.
///
/// Variants are declared in priority order: links are reported grouped by
/// the first category they fall into, then by position in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkCategory {
    /// Contains `unsubscribe`.
    Unsubscribe,
    /// Contains `optout`, `opt-out` or `opt_out`.
    OptOut,
    /// Contains `remove`.
    Remove,
    /// Contains `cancel`.
    Cancel,
    /// Contains `stop`.
    Stop,
    /// Contains `mail` followed somewhere later by `unsubscribe`.
    MailService,
}

impl LinkCategory {
    /// All categories in priority order.
    pub const ALL: [Self; 6] = [
        Self::Unsubscribe,
        Self::OptOut,
        Self::Remove,
        Self::Cancel,
        Self::Stop,
        Self::MailService,
    ];

    /// Tests a lowercased URL tail (the part after `://`).
    fn matches(self, tail: &str) -> bool {
        match self {
            Self::Unsubscribe => tail.contains("unsubscribe"),
            Self::OptOut => ["optout", "opt-out", "opt_out"]
                .iter()
                .any(|k| tail.contains(k)),
            Self::Remove => tail.contains("remove"),
            Self::Cancel => tail.contains("cancel"),
            Self::Stop => tail.contains("stop"),
            Self::MailService => tail
                .find("mail")
                .is_some_and(|pos| tail[pos + "mail".len()..].contains("unsubscribe")),
        }
    }
}

/// Returns every category a URL token falls into, in priority order.
///
/// Only the part after the scheme separator is inspected.
#[must_use]
pub fn categorize(token: &str) -> Vec<LinkCategory> {
    let tail = token
        .find("://")
        .map_or(token, |i| &token[i + 3..])
        .to_lowercase();

    LinkCategory::ALL
        .into_iter()
        .filter(|category| category.matches(&tail))
        .collect()
}

/// Links found in a block of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedLinks {
    /// Distinct links, grouped by first category then text position.
    pub links: Vec<String>,
    /// Number of links.
    pub total_found: usize,
}

impl ExtractedLinks {
    /// Returns true if no link was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Finds unsubscribe-like URLs in `text`.
///
/// A token that falls into several categories is reported once. The result
/// depends only on `text`.
#[must_use]
pub fn extract_links(text: &str) -> ExtractedLinks {
    let Some(re) = url_token() else {
        return ExtractedLinks::default();
    };

    let mut ranked: Vec<(LinkCategory, &str)> = re
        .find_iter(text)
        .filter_map(|m| {
            categorize(m.as_str())
                .first()
                .map(|category| (*category, m.as_str()))
        })
        .collect();

    // Stable: tokens of one category keep their text order.
    ranked.sort_by_key(|(category, _)| *category);

    let mut seen: HashSet<&str> = HashSet::new();
    let links: Vec<String> = ranked
        .into_iter()
        .filter(|(_, token)| seen.insert(*token))
        .map(|(_, token)| token.trim().to_string())
        .collect();

    ExtractedLinks {
        total_found: links.len(),
        links,
    }
}
