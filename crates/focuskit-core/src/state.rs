//! The single aggregate session/settings record.
//!
//! The whole record is read, modified, and written back wholesale on
//! every command -- there is no partial update and no partial delete.
//! `session_visits` and `distraction_count` are meaningful only while
//! `session_active` is set; they are reset on the next activation rather
//! than cleared on deactivation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::ScheduleEntry;

/// Static fallback blocklist, used until an AI-generated one is stored.
pub const FALLBACK_BLOCKLIST: &[&str] = &[
    // Social
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "tiktok.com",
    "snapchat.com",
    "pinterest.com",
    "tumblr.com",
    "linkedin.com",
    "threads.net",
    "bereal.com",
    "mastodon.social",
    // Streaming
    "netflix.com",
    "hulu.com",
    "primevideo.com",
    "disneyplus.com",
    "max.com",
    "twitch.tv",
    "crunchyroll.com",
    "peacocktv.com",
    "paramountplus.com",
    // Gaming
    "roblox.com",
    "miniclip.com",
    "poki.com",
    "crazygames.com",
    "itch.io",
    // News
    "buzzfeed.com",
    "tmz.com",
    "huffpost.com",
    "dailymail.co.uk",
    // Shopping
    "amazon.com",
    "ebay.com",
    "etsy.com",
    "shein.com",
    "aliexpress.com",
    // Messaging
    "web.whatsapp.com",
    "discord.com",
    "telegram.org",
    "web.telegram.org",
    // Forums
    "reddit.com",
    "quora.com",
    "4chan.org",
];

/// Focus mode. Exactly one mode is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Free,
    Study,
    Deepwork,
    Chill,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Mode::Free => "free",
            Mode::Study => "study",
            Mode::Deepwork => "deepwork",
            Mode::Chill => "chill",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
#[error("unknown mode '{0}' (expected free, study, deepwork or chill)")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Mode::Free),
            "study" => Ok(Mode::Study),
            "deepwork" | "deep-work" => Ok(Mode::Deepwork),
            "chill" => Ok(Mode::Chill),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

/// Per-mode open-tab caps. `None` means uncapped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabCaps {
    #[serde(default = "default_study_cap")]
    pub study: Option<u32>,
    #[serde(default = "default_deepwork_cap")]
    pub deepwork: Option<u32>,
    #[serde(default = "default_chill_cap")]
    pub chill: Option<u32>,
    #[serde(default)]
    pub free: Option<u32>,
}

fn default_study_cap() -> Option<u32> {
    Some(8)
}
fn default_deepwork_cap() -> Option<u32> {
    Some(5)
}
fn default_chill_cap() -> Option<u32> {
    Some(20)
}

impl Default for TabCaps {
    fn default() -> Self {
        Self {
            study: default_study_cap(),
            deepwork: default_deepwork_cap(),
            chill: default_chill_cap(),
            free: None,
        }
    }
}

impl TabCaps {
    pub fn cap(&self, mode: Mode) -> Option<u32> {
        match mode {
            Mode::Study => self.study,
            Mode::Deepwork => self.deepwork,
            Mode::Chill => self.chill,
            Mode::Free => self.free,
        }
    }

    pub fn set_cap(&mut self, mode: Mode, cap: Option<u32>) {
        match mode {
            Mode::Study => self.study = cap,
            Mode::Deepwork => self.deepwork = cap,
            Mode::Chill => self.chill = cap,
            Mode::Free => self.free = cap,
        }
    }
}

fn default_whitelist() -> Vec<String> {
    [
        "github.com",
        "stackoverflow.com",
        "google.com",
        "notion.so",
        "figma.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_session_duration() -> u32 {
    45
}

/// The aggregate settings/session record.
///
/// Created with defaults on first run, then mutated wholesale on every
/// command. Persisted as a JSON blob in the kv store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub session_active: bool,
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,
    /// Target duration in minutes; 0 means unbounded.
    #[serde(default = "default_session_duration")]
    pub session_duration_min: u32,
    /// Domain -> visit count for the current session.
    #[serde(default)]
    pub session_visits: BTreeMap<String, u32>,
    #[serde(default)]
    pub distraction_count: u32,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    /// Domain substrings exempt from blocking in deep-work mode.
    #[serde(default = "default_whitelist")]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub max_tabs: TabCaps,
    /// Category -> domains, replacing the static fallback when present.
    #[serde(default)]
    pub ai_blocklist: Option<BTreeMap<String, Vec<String>>>,
    /// High-water mark of the recurring scheduler. `None` arms the
    /// scheduler on the next tick without firing past entries.
    #[serde(default)]
    pub last_schedule_check: Option<DateTime<Utc>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            mode: Mode::Free,
            session_active: false,
            session_start: None,
            session_duration_min: default_session_duration(),
            session_visits: BTreeMap::new(),
            distraction_count: 0,
            schedule: Vec::new(),
            whitelist: default_whitelist(),
            max_tabs: TabCaps::default(),
            ai_blocklist: None,
            last_schedule_check: None,
        }
    }
}

impl SessionState {
    /// Whether the stored AI blocklist holds at least one usable domain.
    /// Whitespace-only entries don't count.
    pub fn ai_blocklist_active(&self) -> bool {
        self.ai_blocklist
            .as_ref()
            .is_some_and(|b| b.values().flatten().any(|d| !d.trim().is_empty()))
    }

    /// The flat list of blocked domains: the flattened AI blocklist when
    /// it holds at least one domain, otherwise the static fallback.
    pub fn blocked_domains(&self) -> Vec<String> {
        if self.ai_blocklist_active() {
            if let Some(blocklist) = &self.ai_blocklist {
                return blocklist
                    .values()
                    .flatten()
                    .filter(|d| !d.trim().is_empty())
                    .cloned()
                    .collect();
            }
        }
        FALLBACK_BLOCKLIST.iter().map(|s| s.to_string()).collect()
    }

    pub fn unique_sites(&self) -> u32 {
        self.session_visits.len() as u32
    }

    pub fn total_visits(&self) -> u32 {
        self.session_visits.values().sum()
    }
}

/// Normalize user input into a whitelist entry: lowercase, scheme and
/// path stripped. Returns `None` for input that is not a plausible domain.
pub fn normalize_domain_input(raw: &str) -> Option<String> {
    let mut value = raw.trim().to_ascii_lowercase();
    if let Some(rest) = value.strip_prefix("https://") {
        value = rest.to_string();
    } else if let Some(rest) = value.strip_prefix("http://") {
        value = rest.to_string();
    }
    if let Some(idx) = value.find('/') {
        value.truncate(idx);
    }
    if value.is_empty() || !value.contains('.') {
        return None;
    }
    Some(value)
}
