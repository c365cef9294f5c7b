//! Rewrites candidates into fantasy stories through a generative-language API.
//!
//! The pipeline only depends on [`StoryGenerator`]; [`GeminiClient`] is the
//! production implementation talking to the Gemini `generateContent` REST
//! endpoint.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ApiKey, GeminiConfig};
use crate::error::{Error, Result};
use crate::models::{Candidate, StoryBatch};

/// Persona, style, safety policy and output schema handed to the model.
pub const CHRONICLER_INSTRUCTION: &str = r#"
You are the Grand Chronicler.
Task: Rewrite real news into medieval fantasy.
Safety: SKIP items about death, violence, hate, tragedy, or sensitive politics.
For every skipped item set "status" to "skipped" and explain why in "reason".

STYLE RULES FOR SAFE ITEMS:
- Tone: Accessible fantasy (like Harry Potter or Studio Ghibli), not Shakespearean.
- Language: Use simple, modern English but keep the fantasy concepts.
  - BAD: "Hark! The alchemists hath concocted a draught..."
  - GOOD: "The Alchemists' Guild has brewed a new potion..."
- Map concepts:
  - Scientists -> Alchemists, Wizards
  - Companies -> Guilds, Clans
  - Tech -> Magic, Artifacts, Enchantments
  - Money -> Gold Coins
- Constraints:
  - FANTASY_HEADLINE: max 12 words, catchy.
  - FANTASY_STORY: 2-4 sentences, max 80 words.

OUTPUT FORMAT:
- Valid JSON only. NO Markdown.
- Schema:
{
  "stories": [
    {
      "id": "...",
      "status": "published"|"skipped",
      "reason": "...",
      "original_headline": "...",
      "original_summary": "...",
      "fantasy_headline": "...",
      "fantasy_story": "...",
      "tag": "magic"|"kingdom"|"merchants"|"nature"
    }
  ]
}
"#;

/// Something that can turn candidates into a batch of stories.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, instruction: &str, items: &[Candidate]) -> Result<StoryBatch>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<Part>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate.
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[derive(Debug, Serialize)]
struct ItemsPayload<'a> {
    items: &'a [Candidate],
}

fn build_request(instruction: &str, items: &[Candidate]) -> Result<GenerateContentRequest> {
    let user_content = serde_json::to_string(&ItemsPayload { items })?;

    Ok(GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![
                Part {
                    text: Some(instruction.to_string()),
                },
                Part {
                    text: Some(format!(
                        "Here are the news items to process:\n{}",
                        user_content
                    )),
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
        },
    })
}

/// Unwrap the response envelope and parse the generated text as a story batch.
/// Generated text without a `stories` array is an error, never an empty batch.
fn parse_response(body: &str) -> Result<StoryBatch> {
    let envelope: GenerateContentResponse = serde_json::from_str(body)?;
    let text = envelope.into_text().ok_or(Error::EmptyResponse)?;
    Ok(serde_json::from_str(&text)?)
}

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: ApiKey,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig, api_key: ApiKey) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StoryGenerator for GeminiClient {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, instruction: &str, items: &[Candidate]) -> Result<StoryBatch> {
        info!("Sending {} items to Gemini", items.len());
        let payload = build_request(instruction, items)?;

        // The key travels in the query string, so URLs are scrubbed from errors
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        if status != StatusCode::OK {
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoryStatus;
    use serde_json::{json, Value};

    fn items() -> Vec<Candidate> {
        vec![Candidate {
            id: "https://example.com/1".to_string(),
            headline: "Crystal Grown in Lab".to_string(),
            summary: "Researchers grew a crystal.".to_string(),
        }]
    }

    fn envelope(text: &str) -> String {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    #[test]
    fn test_instruction_mentions_policy_and_vocabulary() {
        assert!(CHRONICLER_INSTRUCTION.contains("Grand Chronicler"));
        assert!(CHRONICLER_INSTRUCTION.contains("SKIP items about death"));
        for tag in crate::models::TAGS {
            assert!(CHRONICLER_INSTRUCTION.contains(&format!("\"{}\"", tag)));
        }
    }

    #[test]
    fn test_request_shape() {
        let request = build_request("be a chronicler", &items()).unwrap();
        let value = serde_json::to_value(&request).unwrap();

        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "be a chronicler");

        let second = parts[1]["text"].as_str().unwrap();
        let (prefix, payload) = second.split_once('\n').unwrap();
        assert_eq!(prefix, "Here are the news items to process:");

        let payload: Value = serde_json::from_str(payload).unwrap();
        assert_eq!(payload["items"][0]["id"], "https://example.com/1");
        assert_eq!(payload["items"][0]["headline"], "Crystal Grown in Lab");

        assert_eq!(
            value["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }

    #[test]
    fn test_parse_response_success() {
        let text = json!({
            "stories": [
                {"id": "1", "status": "published", "fantasy_headline": "A", "tag": "magic"},
                {"id": "2", "status": "skipped", "reason": "tragedy"}
            ]
        })
        .to_string();

        let batch = parse_response(&envelope(&text)).unwrap();
        assert_eq!(batch.stories.len(), 2);
        assert_eq!(batch.stories[0].status, StoryStatus::Published);
        assert_eq!(batch.stories[1].reason(), Some("tragedy"));
    }

    #[test]
    fn test_parse_response_invalid_inner_json() {
        let result = parse_response(&envelope("```json\nnot json\n```"));
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_parse_response_without_stories_is_error() {
        let result = parse_response(&envelope("{}"));
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_parse_response_no_candidates() {
        let result = parse_response(r#"{"candidates": []}"#);
        assert!(matches!(result, Err(Error::EmptyResponse)));
    }

    #[test]
    fn test_parse_response_missing_content() {
        let result = parse_response(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        assert!(matches!(result, Err(Error::EmptyResponse)));
    }

    #[test]
    fn test_parse_response_envelope_not_json() {
        let result = parse_response("<html>bad gateway</html>");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_endpoint_and_redacted_debug() {
        let config = GeminiConfig {
            model: "gemini-test".to_string(),
            base_url: "http://localhost:9999/".to_string(),
            timeout_secs: 5,
        };
        let client = GeminiClient::new(&config, ApiKey::new("secret-key").unwrap()).unwrap();

        assert_eq!(
            client.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-test:generateContent"
        );
        assert!(!format!("{:?}", client).contains("secret-key"));
    }
}
