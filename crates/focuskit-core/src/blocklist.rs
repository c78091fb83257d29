//! AI blocklist generation.
//!
//! One stateless HTTPS JSON request to a text-generation API, expecting a
//! categorized blocklist back. No retry policy: the error split between
//! auth, network, and parse failures exists for display only.

use std::collections::BTreeMap;

use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::BlocklistError;
use crate::storage::Config;

/// Categories the prompt asks for. A response is accepted as long as at
/// least one of these keys holds an array.
pub const CATEGORIES: &[&str] = &[
    "social",
    "ott",
    "gaming",
    "news",
    "adult",
    "shopping",
    "messaging",
    "forums",
];

const ANTHROPIC_VERSION: &str = "2023-06-01";

const BLOCKLIST_PROMPT: &str = r#"You are a browser focus assistant. Generate a comprehensive, categorized blocklist of distracting websites for a productivity tool.

Return ONLY a valid JSON object (no markdown, no explanation) with this exact structure:
{
  "social":    ["domain1.com", "domain2.com", ...],
  "ott":       ["domain1.com", ...],
  "gaming":    ["domain1.com", ...],
  "news":      ["domain1.com", ...],
  "adult":     ["domain1.com", ...],
  "shopping":  ["domain1.com", ...],
  "messaging": ["domain1.com", ...],
  "forums":    ["domain1.com", ...]
}

Rules:
- Use base domains only (no www, no paths, no https://)
- Include 15-25 domains per category
- social: Facebook, Instagram, Twitter/X, TikTok, Snapchat, Pinterest, LinkedIn, Tumblr, BeReal, Threads, Mastodon, etc.
- ott: Netflix, Hulu, Disney+, Prime Video, HBO Max, Apple TV+, Peacock, Paramount+, Twitch, Crunchyroll, Mubi, etc.
- gaming: Steam, Epic, Roblox, Miniclip, Poki, CrazyGames, Kongregate, Armor Games, Itch.io, GameBanana, etc.
- news: Daily Mail, BuzzFeed, TMZ, HuffPost, Gawker, Vice, Digg, Flipboard, Bleacher Report, etc.
- adult: common adult content sites
- shopping: Amazon, eBay, Etsy, Shein, AliExpress, Wish, Wayfair, Zalando, ASOS, Depop, etc.
- messaging: WhatsApp Web, Telegram Web, Discord, Slack, Messenger, WeChat Web, Line, Kik, etc.
- forums: Reddit, Quora, 4chan, HackerNews (news.ycombinator.com), ProductHunt, Lemmy, etc.

Return ONLY the JSON object, nothing else."#;

#[derive(Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

/// Client for the text-generation endpoint.
pub struct BlocklistClient {
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl BlocklistClient {
    pub fn new(endpoint: &str, api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
        }
    }

    /// Build a client from the app config, reading the API key from the
    /// environment variable the config names.
    pub fn from_config(config: &Config) -> Result<Self, BlocklistError> {
        let api_key = std::env::var(&config.api.api_key_env)
            .map_err(|_| BlocklistError::MissingKey(config.api.api_key_env.clone()))?;
        Ok(Self::new(
            &config.api.endpoint,
            &api_key,
            &config.api.model,
            config.api.max_tokens,
        ))
    }

    /// Fetch a fresh categorized blocklist.
    pub async fn fetch(&self) -> Result<BTreeMap<String, Vec<String>>, BlocklistError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{ "role": "user", "content": BLOCKLIST_PROMPT }]
        });

        let client = Client::new();
        let resp = client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| BlocklistError::Network(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(BlocklistError::Auth {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(BlocklistError::Api {
                status: status.as_u16(),
            });
        }

        let api: ApiResponse = resp
            .json()
            .await
            .map_err(|e| BlocklistError::Parse(e.to_string()))?;

        let raw: String = api
            .content
            .iter()
            .filter(|b| b.kind == "text")
            .map(|b| b.text.as_str())
            .collect();
        debug!("blocklist response: {} chars", raw.len());

        parse_blocklist(&raw)
    }
}

/// Parse the model's reply into the category map. Tolerates accidental
/// markdown fences around the JSON object.
pub fn parse_blocklist(raw: &str) -> Result<BTreeMap<String, Vec<String>>, BlocklistError> {
    let clean = raw.replace("```json", "").replace("```", "");
    let clean = clean.trim();

    let value: serde_json::Value = serde_json::from_str(clean)
        .map_err(|e| BlocklistError::Parse(format!("invalid JSON: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| BlocklistError::Parse("expected a JSON object".to_string()))?;

    let mut blocklist = BTreeMap::new();
    for (category, domains) in obj {
        let Some(items) = domains.as_array() else {
            continue;
        };
        let domains: Vec<String> = items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        blocklist.insert(category.clone(), domains);
    }

    if !CATEGORIES.iter().any(|c| blocklist.contains_key(*c)) {
        return Err(BlocklistError::Parse(
            "unexpected response structure".to_string(),
        ));
    }
    Ok(blocklist)
}
