use std::collections::HashSet;
use std::time::Duration;

use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::Client;
use scraper::Html;
use tracing::{error, info, warn};

use crate::config::{Config, FeedConfig};
use crate::error::Result;
use crate::models::Candidate;

pub struct Fetcher {
    client: Client,
    entries_per_feed: usize,
    summary_max_chars: usize,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent("FabledNews/1.0 (RSS Chronicler)")
            .build()?;

        Ok(Self {
            client,
            entries_per_feed: config.entries_per_feed,
            summary_max_chars: config.summary_max_chars,
        })
    }

    /// Fetch every feed in order and return at most `limit` candidates,
    /// unique by headline. A feed that fails contributes nothing.
    pub async fn fetch_candidates(&self, feeds: &[FeedConfig], limit: usize) -> Vec<Candidate> {
        info!("Fetching news from {} feeds", feeds.len());

        let mut candidates = Vec::new();
        for feed in feeds {
            match self.fetch_feed(feed).await {
                Ok(entries) => candidates.extend(entries),
                Err(e) => error!("Failed to fetch feed '{}' ({}): {}", feed.name, feed.url, e),
            }
        }

        let mut unique = dedupe_by_headline(candidates);
        info!("Found {} unique items, keeping top {}", unique.len(), limit);
        unique.truncate(limit);
        unique
    }

    async fn fetch_feed(&self, feed: &FeedConfig) -> Result<Vec<Candidate>> {
        info!("Fetching feed: {} ({})", feed.name, feed.url);

        let response = self.client.get(&feed.url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        parse_candidates(&bytes, self.entries_per_feed, self.summary_max_chars)
    }
}

/// Parse a feed document and turn its first `entries` entries into candidates.
pub fn parse_candidates(
    bytes: &[u8],
    entries: usize,
    summary_max_chars: usize,
) -> Result<Vec<Candidate>> {
    let parsed = parser::parse(bytes)?;

    Ok(parsed
        .entries
        .iter()
        .take(entries)
        .filter_map(|entry| entry_to_candidate(entry, summary_max_chars))
        .collect())
}

pub fn entry_to_candidate(entry: &Entry, summary_max_chars: usize) -> Option<Candidate> {
    let Some(headline) = entry.title.as_ref().map(|t| t.content.trim().to_string()) else {
        warn!("Skipping entry with no title: {}", entry.id);
        return None;
    };

    let Some(id) = entry.links.first().map(|l| l.href.clone()) else {
        warn!("Skipping entry with no link: {}", headline);
        return None;
    };

    // RSS <description> and Atom <summary> both land in `summary`
    let raw = entry
        .summary
        .as_ref()
        .map(|s| s.content.as_str())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.as_deref()))
        .unwrap_or_default();

    Some(Candidate {
        id,
        headline,
        summary: truncate_chars(&clean_html(raw), summary_max_chars),
    })
}

/// Reduce an HTML fragment to its text content with entities decoded.
///
/// Leading and trailing whitespace is trimmed; whitespace inside the text is
/// left as the markup had it.
pub fn clean_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

/// Truncate to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Drop candidates whose headline was already seen, keeping encounter order.
pub fn dedupe_by_headline(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.headline.clone()))
        .collect()
}
