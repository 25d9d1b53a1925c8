// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Sources of new card content.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

use crate::config::GeneratorConfig;
use crate::error::ErrorReport;
use crate::error::Fallible;

/// The question and answer of a freshly generated card.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct GeneratedContent {
    pub question: String,
    pub answer: String,
}

impl GeneratedContent {
    /// Reject content with a blank question or answer.
    pub fn validate(self) -> Fallible<Self> {
        if self.question.trim().is_empty() {
            return Err(ErrorReport::generation("generated card has no question"));
        }
        if self.answer.trim().is_empty() {
            return Err(ErrorReport::generation("generated card has no answer"));
        }
        Ok(self)
    }
}

/// Produces card content for a topic. Implementations may fail, and may
/// return content that does not pass [`GeneratedContent::validate`].
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn generate(&self, topic: &str) -> Fallible<GeneratedContent>;
}

/// Parse a model reply into card content. The reply should be a JSON object
/// with `question` and `answer` fields, possibly wrapped in a Markdown code
/// fence.
pub fn parse_reply(reply: &str) -> Fallible<GeneratedContent> {
    let body = strip_code_fence(reply.trim());
    serde_json::from_str(body).map_err(|e| {
        ErrorReport::generation(format!("content source returned malformed card: {e}"))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string, e.g. "json".
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Generates cards with the Gemini `generateContent` API.
pub struct GeminiSource {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiSource {
    pub fn new(config: &GeneratorConfig) -> Fallible<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let api_key = std::env::var(&config.api_key_env).ok();
        if api_key.is_none() {
            log::warn!(
                "{} is not set, card generation will fail",
                config.api_key_env
            );
        }
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn request_body(topic: &str) -> Value {
        let prompt = format!(
            "Generate a flashcard about {topic}. Respond with a JSON object with exactly two string fields, \"question\" and \"answer\"."
        );
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        })
    }
}

#[async_trait]
impl ContentSource for GeminiSource {
    async fn generate(&self, topic: &str) -> Fallible<GeneratedContent> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ErrorReport::generation("content source API key is not set"))?;
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        log::debug!("Requesting a {topic} card from {url}");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("content-type", "application/json")
            .body(Self::request_body(topic).to_string())
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ErrorReport::generation(format!(
                "content source returned {status}: {text}"
            )));
        }
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            ErrorReport::generation(format!("content source returned invalid JSON: {e}"))
        })?;
        let reply = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| ErrorReport::generation("content source reply has no text"))?;
        parse_reply(reply)
    }
}
