//! Per-page enforcement policy.
//!
//! Pure decisions only: given the session record and a page URL, what
//! effect should an enforcement agent apply to that page? Rendering the
//! effect (overlay, CSS filter) is the agent's concern.
//!
//! Matching is substring-based and case-preserving as stored: the
//! blocklist entry `reddit.com` matches the domain `old.reddit.com`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::state::{Mode, SessionState};

/// Domain of the video platform whose suggestion/feed regions get hidden
/// when the page is not blocked outright.
const VIDEO_PLATFORM: &str = "youtube.com";

/// Effect an enforcement agent should apply to the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "effect")]
pub enum PageEffect {
    /// No restriction.
    None,
    /// Full-page block overlay, attributed to the blocking mode.
    Block { mode: Mode },
    /// Hide suggestion/feed regions on the video platform.
    HideFeed,
    /// Apply the chill-mode desaturation filter.
    Desaturate,
}

/// Extract the tracked domain from a URL: http(s) only, host lowered by
/// the parser, leading `www.` stripped. Privileged and non-web schemes
/// yield `None`.
pub fn domain_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Whether `domain` matches any blocklist entry (entries are compared
/// with their own `www.` prefix stripped).
pub fn is_blocked(domain: &str, blocked: &[String]) -> bool {
    blocked.iter().any(|entry| {
        let entry = entry.trim();
        !entry.is_empty() && domain.contains(entry.strip_prefix("www.").unwrap_or(entry))
    })
}

/// Whether `domain` matches any whitelist substring.
pub fn is_whitelisted(domain: &str, whitelist: &[String]) -> bool {
    whitelist
        .iter()
        .any(|entry| !entry.is_empty() && domain.contains(entry.as_str()))
}

fn is_video_platform(domain: &str) -> bool {
    domain.contains(VIDEO_PLATFORM)
}

/// Decide the enforcement effect for a page.
pub fn page_effect(state: &SessionState, url: &str) -> PageEffect {
    if !state.session_active || state.mode == Mode::Free {
        return PageEffect::None;
    }
    let Some(domain) = domain_from_url(url) else {
        return PageEffect::None;
    };

    match state.mode {
        Mode::Free => PageEffect::None,
        Mode::Study => {
            if is_blocked(&domain, &state.blocked_domains()) {
                PageEffect::Block { mode: Mode::Study }
            } else if is_video_platform(&domain) {
                PageEffect::HideFeed
            } else {
                PageEffect::None
            }
        }
        Mode::Deepwork => {
            if !is_whitelisted(&domain, &state.whitelist) {
                PageEffect::Block {
                    mode: Mode::Deepwork,
                }
            } else if is_video_platform(&domain) {
                PageEffect::HideFeed
            } else {
                PageEffect::None
            }
        }
        Mode::Chill => PageEffect::Desaturate,
    }
}
