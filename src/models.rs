//! Records that flow through a single run: candidates pulled from feeds,
//! stories returned by the chronicler, and the published artifact.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Closed vocabulary the chronicler is asked to tag stories with.
pub const TAGS: [&str; 4] = ["magic", "kingdom", "merchants", "nature"];

pub const MAX_HEADLINE_WORDS: usize = 12;
pub const MAX_STORY_WORDS: usize = 80;

/// Format of `last_updated` in the published artifact.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A feed entry reduced to what the chronicler needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Entry URL, unique key for the story
    pub id: String,
    pub headline: String,
    /// Plain text, already bounded
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    Published,
    Skipped,
    /// Missing, null, or anything else the model answers with; never published
    Unrecognized,
}

fn unrecognized() -> StoryStatus {
    StoryStatus::Unrecognized
}

fn lenient_status<'de, D>(deserializer: D) -> Result<StoryStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value.as_str() {
        Some("published") => StoryStatus::Published,
        Some("skipped") => StoryStatus::Skipped,
        _ => StoryStatus::Unrecognized,
    })
}

/// A candidate rewritten (or declined) by the chronicler.
///
/// Only `status` is interpreted. Every other key is kept exactly as the
/// model returned it, whatever its JSON type, and written back out as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(default = "unrecognized", deserialize_with = "lenient_status")]
    pub status: StoryStatus,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Story {
    pub fn is_published(&self) -> bool {
        self.status == StoryStatus::Published
    }

    /// String value of `key`, if present and a string.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn id(&self) -> Option<&str> {
        self.text("id")
    }

    pub fn reason(&self) -> Option<&str> {
        self.text("reason")
    }

    pub fn tag(&self) -> Option<&str> {
        self.text("tag")
    }

    /// Schema constraints the model was asked to honour but which are not
    /// enforced here. An empty list means the story conforms.
    pub fn constraint_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        match self.tag() {
            Some(tag) if TAGS.contains(&tag) => {}
            Some(tag) => warnings.push(format!("tag '{}' is outside the vocabulary", tag)),
            None => warnings.push("tag is missing".to_string()),
        }

        let limits = [
            ("fantasy_headline", MAX_HEADLINE_WORDS),
            ("fantasy_story", MAX_STORY_WORDS),
        ];
        for (key, max) in limits {
            let words = self.text(key).unwrap_or_default().split_whitespace().count();
            if words > max {
                warnings.push(format!("{} has {} words (max {})", key, words, max));
            }
        }

        warnings
    }
}

/// The JSON document the chronicler is asked to produce. An answer without
/// a `stories` array is rejected rather than read as "nothing to publish".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryBatch {
    pub stories: Vec<Story>,
}

/// The artifact written to disk for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chronicle {
    pub last_updated: String,
    pub stories: Vec<Story>,
}

impl Chronicle {
    pub fn new<Tz>(stories: Vec<Story>, now: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        Self {
            last_updated: now.format(TIMESTAMP_FORMAT).to_string(),
            stories,
        }
    }
}
