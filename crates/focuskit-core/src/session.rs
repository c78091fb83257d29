//! Mode/session coordinator.
//!
//! A wall-clock state machine over the aggregate record. No internal
//! threads and no armed timers: the caller invokes [`Coordinator::tick`]
//! periodically, and countdowns, idle sweeps, and scheduled activations
//! all fall out of comparing timestamps.
//!
//! Host mutations are best-effort: a tab may close between enumeration
//! and the call against it, so failures are logged and ignored, and every
//! corrective action is idempotent.

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};

use crate::events::Event;
use crate::host::{Tab, TabHost, TabId};
use crate::policy;
use crate::schedule;
use crate::scoring::{self, SessionSummary};
use crate::state::{Mode, SessionState};

/// Inactive tabs idle beyond this many minutes are closed by the
/// deep-work sweep.
pub const DEFAULT_IDLE_THRESHOLD_MIN: u32 = 10;

/// Owns the session record and a host adapter for the duration of a
/// command; single-writer by construction.
pub struct Coordinator<H: TabHost> {
    state: SessionState,
    host: H,
    idle_threshold_min: u32,
}

impl<H: TabHost> Coordinator<H> {
    pub fn new(state: SessionState, host: H) -> Self {
        Self {
            state,
            host,
            idle_threshold_min: DEFAULT_IDLE_THRESHOLD_MIN,
        }
    }

    pub fn with_idle_threshold(mut self, minutes: u32) -> Self {
        self.idle_threshold_min = minutes;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Give the record back for persistence.
    pub fn into_parts(self) -> (SessionState, H) {
        (self.state, self.host)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Activate a mode: stamp the start time, reset the per-session
    /// counters, apply tab effects. `duration` of `None` keeps the
    /// previously configured duration; 0 means unbounded.
    pub fn activate(&mut self, mode: Mode, duration: Option<u32>) -> Event {
        let now = Utc::now();
        self.state.mode = mode;
        self.state.session_active = true;
        self.state.session_start = Some(now);
        if let Some(minutes) = duration {
            self.state.session_duration_min = minutes;
        }
        self.state.session_visits.clear();
        self.state.distraction_count = 0;

        self.apply_tab_effects(mode);

        Event::ModeChanged { mode, at: now }
    }

    /// End the session: build the summary, fall back to free mode, and
    /// unmute everything the session muted.
    pub fn deactivate(&mut self) -> (Option<SessionSummary>, Vec<Event>) {
        let now = Utc::now();
        let summary = scoring::build_summary(&self.state, now);

        self.state.session_active = false;
        self.state.session_start = None;
        self.state.mode = Mode::Free;

        for tab in self.host.tabs() {
            if tab.muted {
                self.mute_quiet(tab.id, false);
            }
        }

        let mut events = vec![Event::ModeChanged {
            mode: Mode::Free,
            at: now,
        }];
        if let Some(summary) = &summary {
            events.push(Event::SessionEnded {
                summary: summary.clone(),
                at: now,
            });
        }
        (summary, events)
    }

    /// Store a freshly generated blocklist in the record.
    pub fn update_blocklist(
        &mut self,
        blocklist: std::collections::BTreeMap<String, Vec<String>>,
    ) -> Event {
        let total_domains = blocklist.values().map(Vec::len).sum();
        let categories = blocklist.len();
        self.state.ai_blocklist = Some(blocklist);
        Event::BlocklistUpdated {
            categories,
            total_domains,
            at: Utc::now(),
        }
    }

    /// Replace the schedule and re-arm the scheduler.
    pub fn update_schedule(&mut self, entries: Vec<schedule::ScheduleEntry>) {
        self.state.schedule = entries;
        self.state.last_schedule_check = None;
    }

    // ── Host event reactions ─────────────────────────────────────────

    /// A tab was created. Enforce the per-mode cap by closing the new tab
    /// when the total exceeds it.
    pub fn on_tab_created(&mut self, id: TabId) {
        if !self.state.session_active {
            return;
        }
        let Some(cap) = self.state.max_tabs.cap(self.state.mode) else {
            return;
        };
        if self.host.tabs().len() as u32 > cap {
            self.close_quiet(id);
        }
    }

    /// The active tab changed. In deep work, keep only the active tab
    /// audible.
    pub fn on_tab_activated(&mut self, id: TabId) {
        if !self.state.session_active || self.state.mode != Mode::Deepwork {
            return;
        }
        for tab in self.host.tabs() {
            self.mute_quiet(tab.id, tab.id != id);
        }
    }

    /// A navigation completed. Counts the visit exactly once and bumps
    /// the distraction counter when the domain is on the blocklist.
    /// Non-web schemes are ignored.
    pub fn on_navigation(&mut self, url: &str) {
        if !self.state.session_active {
            return;
        }
        let Some(domain) = policy::domain_from_url(url) else {
            return;
        };

        *self.state.session_visits.entry(domain.clone()).or_insert(0) += 1;

        if policy::is_blocked(&domain, &self.state.blocked_domains()) {
            self.state.distraction_count += 1;
            debug!("distraction recorded for {domain}");
        }
    }

    // ── Timers ───────────────────────────────────────────────────────

    /// Run everything that is due at `now`: the session countdown,
    /// scheduled activations, and the deep-work idle sweep. Returns the
    /// events produced, in order.
    ///
    /// Expiry is settled before the scheduler runs: a scheduled
    /// activation due in the same window re-stamps `session_start`, so
    /// the outgoing session must be summarized first or its end is lost.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();

        if self.session_expired(now) {
            let (summary, mut ended) = self.deactivate();
            if let Some(summary) = summary {
                self.notify_quiet(
                    "Focuskit session complete",
                    &format!(
                        "Focus score: {}% | Sites visited: {}",
                        summary.focus_score, summary.unique_sites
                    ),
                );
            }
            events.append(&mut ended);
        }

        events.extend(self.run_scheduler(now));

        if self.state.session_active && self.state.mode == Mode::Deepwork {
            self.sweep_idle_tabs(now);
        }

        events
    }

    fn session_expired(&self, now: DateTime<Utc>) -> bool {
        if !self.state.session_active || self.state.session_duration_min == 0 {
            return false;
        }
        let Some(start) = self.state.session_start else {
            return false;
        };
        now - start >= Duration::minutes(self.state.session_duration_min as i64)
    }

    fn run_scheduler(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let after = match self.state.last_schedule_check {
            Some(t) => t,
            None => {
                // First tick arms the scheduler; past entries don't fire.
                self.state.last_schedule_check = Some(now);
                return Vec::new();
            }
        };
        let due: Vec<(Mode, u32, String)> =
            schedule::due_between(&self.state.schedule, after, now)
                .into_iter()
                .map(|e| (e.mode, e.duration_min, e.id.clone()))
                .collect();
        self.state.last_schedule_check = Some(now);

        due.into_iter()
            .map(|(mode, duration, id)| {
                debug!("scheduled activation {id}: {mode} for {duration} min");
                self.activate(mode, Some(duration))
            })
            .collect()
    }

    fn sweep_idle_tabs(&mut self, now: DateTime<Utc>) {
        let threshold_ms = self.idle_threshold_min as u64 * 60_000;
        let now_ms = now.timestamp_millis().max(0) as u64;
        for tab in self.host.tabs() {
            if tab.active || tab.last_accessed_ms == 0 {
                continue;
            }
            if now_ms.saturating_sub(tab.last_accessed_ms) > threshold_ms {
                self.close_quiet(tab.id);
            }
        }
    }

    // ── Tab effects ──────────────────────────────────────────────────

    fn apply_tab_effects(&mut self, mode: Mode) {
        let tabs = self.host.tabs();

        if mode == Mode::Deepwork {
            for tab in &tabs {
                if !tab.active {
                    self.mute_quiet(tab.id, true);
                }
            }
        }

        if matches!(mode, Mode::Study | Mode::Deepwork) {
            if let Some(cap) = self.state.max_tabs.cap(mode) {
                self.trim_tabs(&tabs, cap);
            }
        }
    }

    /// Close least-recently-accessed non-active tabs until the total is
    /// back under the cap.
    fn trim_tabs(&mut self, tabs: &[Tab], cap: u32) {
        let excess = tabs.len().saturating_sub(cap as usize);
        if excess == 0 {
            return;
        }
        let mut candidates: Vec<&Tab> = tabs.iter().filter(|t| !t.active).collect();
        candidates.sort_by_key(|t| t.last_accessed_ms);
        for tab in candidates.into_iter().take(excess) {
            self.close_quiet(tab.id);
        }
    }

    // ── Best-effort host calls ───────────────────────────────────────

    fn close_quiet(&mut self, id: TabId) {
        if let Err(e) = self.host.close(id) {
            warn!("failed to close tab {id}: {e}");
        }
    }

    fn mute_quiet(&mut self, id: TabId, muted: bool) {
        if let Err(e) = self.host.set_muted(id, muted) {
            warn!("failed to set mute on tab {id}: {e}");
        }
    }

    fn notify_quiet(&mut self, title: &str, message: &str) {
        if let Err(e) = self.host.notify(title, message) {
            warn!("failed to show notification: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::schedule::ScheduleEntry;

    fn coordinator_with_tabs(tabs: &[(&str, bool, u64)]) -> Coordinator<MemoryHost> {
        let mut host = MemoryHost::new();
        for (url, active, accessed) in tabs {
            host.add_tab(url, *active, *accessed);
        }
        Coordinator::new(SessionState::default(), host)
    }

    #[test]
    fn activate_resets_counters_and_stamps_start() {
        let mut coord = coordinator_with_tabs(&[]);
        coord
            .state
            .session_visits
            .insert("leftover.com".to_string(), 3);
        coord.state.distraction_count = 7;

        let event = coord.activate(Mode::Study, Some(30));
        assert!(matches!(event, Event::ModeChanged { mode: Mode::Study, .. }));
        assert!(coord.state().session_active);
        assert!(coord.state().session_start.is_some());
        assert_eq!(coord.state().session_duration_min, 30);
        assert!(coord.state().session_visits.is_empty());
        assert_eq!(coord.state().distraction_count, 0);
    }

    #[test]
    fn activate_without_duration_keeps_previous() {
        let mut coord = coordinator_with_tabs(&[]);
        coord.activate(Mode::Study, Some(30));
        coord.activate(Mode::Chill, None);
        assert_eq!(coord.state().session_duration_min, 30);
    }

    #[test]
    fn deepwork_mutes_inactive_tabs_on_activation() {
        let mut coord = coordinator_with_tabs(&[
            ("https://a.com", false, 1),
            ("https://b.com", true, 2),
            ("https://c.com", false, 3),
        ]);
        coord.activate(Mode::Deepwork, Some(0));

        let tabs = coord.host().tabs();
        for tab in tabs {
            assert_eq!(tab.muted, !tab.active, "tab {} mute state", tab.url);
        }
    }

    #[test]
    fn activation_trims_least_recently_accessed_tabs() {
        let mut coord = coordinator_with_tabs(&[
            ("https://old.com", false, 10),
            ("https://older.com", false, 5),
            ("https://fresh.com", false, 100),
            ("https://active.com", true, 50),
        ]);
        coord.state.max_tabs.study = Some(2);
        coord.activate(Mode::Study, Some(25));

        // Two over cap: the two least-recently-accessed inactive tabs go.
        let urls: Vec<String> = coord.host().tabs().into_iter().map(|t| t.url).collect();
        assert_eq!(urls, vec!["https://fresh.com", "https://active.com"]);
    }

    #[test]
    fn free_mode_applies_no_tab_effects() {
        let mut coord = coordinator_with_tabs(&[
            ("https://a.com", false, 1),
            ("https://b.com", true, 2),
        ]);
        coord.activate(Mode::Free, None);
        assert_eq!(coord.host().tabs().len(), 2);
        assert!(coord.host().tabs().iter().all(|t| !t.muted));
    }

    #[test]
    fn deactivate_unmutes_and_reports_summary() {
        let mut coord = coordinator_with_tabs(&[
            ("https://a.com", false, 1),
            ("https://b.com", true, 2),
        ]);
        coord.activate(Mode::Deepwork, Some(0));
        assert!(coord.host().tabs().iter().any(|t| t.muted));

        let (summary, events) = coord.deactivate();
        let summary = summary.unwrap();
        assert_eq!(summary.mode, Mode::Deepwork);
        assert_eq!(summary.focus_score, 100);
        assert!(!coord.state().session_active);
        assert_eq!(coord.state().mode, Mode::Free);
        assert!(coord.host().tabs().iter().all(|t| !t.muted));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn deactivate_without_session_yields_no_summary() {
        let mut coord = coordinator_with_tabs(&[]);
        let (summary, events) = coord.deactivate();
        assert!(summary.is_none());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn navigation_counts_visits_and_distractions() {
        let mut coord = coordinator_with_tabs(&[]);
        coord.activate(Mode::Study, Some(25));

        coord.on_navigation("https://www.github.com/pulls");
        coord.on_navigation("https://github.com/issues");
        coord.on_navigation("https://old.reddit.com/r/rust");
        coord.on_navigation("chrome://extensions");

        let state = coord.state();
        assert_eq!(state.session_visits.get("github.com"), Some(&2));
        assert_eq!(state.session_visits.get("old.reddit.com"), Some(&1));
        assert_eq!(state.session_visits.len(), 2);
        // old.reddit.com matches the fallback entry reddit.com.
        assert_eq!(state.distraction_count, 1);
    }

    #[test]
    fn navigation_is_ignored_while_inactive() {
        let mut coord = coordinator_with_tabs(&[]);
        coord.on_navigation("https://github.com");
        assert!(coord.state().session_visits.is_empty());
    }

    #[test]
    fn tab_created_over_cap_closes_the_new_tab() {
        let mut host = MemoryHost::new();
        host.add_tab("https://a.com", false, 1);
        host.add_tab("https://b.com", true, 2);
        let new_id = host.add_tab("https://c.com", false, 3);

        let mut state = SessionState {
            mode: Mode::Study,
            session_active: true,
            session_start: Some(Utc::now()),
            ..SessionState::default()
        };
        state.max_tabs.study = Some(2);

        let mut coord = Coordinator::new(state, host);
        coord.on_tab_created(new_id);
        assert_eq!(coord.host().closed, vec![new_id]);
    }

    #[test]
    fn tab_created_under_cap_is_left_alone() {
        let mut host = MemoryHost::new();
        host.add_tab("https://a.com", true, 1);
        let new_id = host.add_tab("https://b.com", false, 2);

        let state = SessionState {
            mode: Mode::Study,
            session_active: true,
            session_start: Some(Utc::now()),
            ..SessionState::default()
        };
        let mut coord = Coordinator::new(state, host);
        coord.on_tab_created(new_id);
        assert!(coord.host().closed.is_empty());
    }

    #[test]
    fn tab_activated_in_deepwork_mutes_the_rest() {
        let mut coord = coordinator_with_tabs(&[
            ("https://a.com", false, 1),
            ("https://b.com", true, 2),
        ]);
        coord.activate(Mode::Deepwork, Some(0));

        let first = coord.host().tabs()[0].id;
        coord.on_tab_activated(first);
        for tab in coord.host().tabs() {
            assert_eq!(tab.muted, tab.id != first);
        }
    }

    #[test]
    fn tick_ends_an_expired_session_and_notifies() {
        let mut coord = coordinator_with_tabs(&[]);
        coord.activate(Mode::Study, Some(30));
        coord.state.session_start = Some(Utc::now() - Duration::minutes(31));

        let events = coord.tick(Utc::now());
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::SessionEnded { .. })));
        assert!(!coord.state().session_active);
        assert_eq!(coord.host().notifications.len(), 1);
        assert!(coord.host().notifications[0].1.contains("Focus score"));
    }

    #[test]
    fn expired_session_still_ends_when_a_scheduled_activation_is_due() {
        let mut coord = coordinator_with_tabs(&[]);
        let now = Utc::now();
        coord.activate(Mode::Study, Some(30));
        coord.state.session_start = Some(now - Duration::minutes(40));
        coord.state.schedule = vec![ScheduleEntry::new(
            &(now - Duration::minutes(5)).format("%H:%M").to_string(),
            Mode::Chill,
            20,
        )];
        coord.state.last_schedule_check = Some(now - Duration::minutes(10));

        // Expiry and the scheduled activation share one tick window; the
        // outgoing session must still be summarized and notified.
        let events = coord.tick(now);
        let ended = events.iter().find_map(|e| match e {
            Event::SessionEnded { summary, .. } => Some(summary.clone()),
            _ => None,
        });
        let ended = ended.expect("expired session was not summarized");
        assert_eq!(ended.mode, Mode::Study);
        assert_eq!(coord.host().notifications.len(), 1);

        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ModeChanged { mode: Mode::Chill, .. })));
        assert_eq!(coord.state().mode, Mode::Chill);
        assert!(coord.state().session_active);
        assert_eq!(coord.state().session_duration_min, 20);
    }

    #[test]
    fn tick_leaves_unbounded_sessions_running() {
        let mut coord = coordinator_with_tabs(&[]);
        coord.activate(Mode::Deepwork, Some(0));
        coord.state.session_start = Some(Utc::now() - Duration::hours(5));
        assert!(coord.tick(Utc::now()).is_empty());
        assert!(coord.state().session_active);
    }

    #[test]
    fn idle_sweep_closes_stale_tabs_in_deepwork_only() {
        let now = Utc::now();
        let now_ms = now.timestamp_millis() as u64;
        let stale = now_ms - 11 * 60_000;
        let fresh = now_ms - 60_000;

        let mut coord = coordinator_with_tabs(&[]);
        coord.host.add_tab("https://stale.com", false, stale);
        coord.host.add_tab("https://fresh.com", false, fresh);
        coord.host.add_tab("https://active.com", true, stale);

        coord.activate(Mode::Study, Some(0));
        coord.tick(now);
        assert_eq!(coord.host().tabs().len(), 3, "study mode never sweeps");

        coord.state.max_tabs.deepwork = None;
        coord.activate(Mode::Deepwork, Some(0));
        coord.tick(now);
        let urls: Vec<String> = coord.host().tabs().into_iter().map(|t| t.url).collect();
        assert_eq!(urls, vec!["https://fresh.com", "https://active.com"]);
    }

    #[test]
    fn first_tick_arms_the_scheduler_without_firing() {
        let mut coord = coordinator_with_tabs(&[]);
        let now = Utc::now();
        let passed = now - Duration::minutes(5);
        coord.state.schedule = vec![ScheduleEntry::new(
            &passed.format("%H:%M").to_string(),
            Mode::Study,
            45,
        )];

        assert!(coord.tick(now).is_empty());
        assert_eq!(coord.state().last_schedule_check, Some(now));
    }

    #[test]
    fn scheduler_activates_due_entries() {
        let mut coord = coordinator_with_tabs(&[]);
        let now = Utc::now();
        let due_at = now - Duration::minutes(1);
        coord.state.schedule = vec![ScheduleEntry::new(
            &due_at.format("%H:%M").to_string(),
            Mode::Deepwork,
            60,
        )];
        coord.state.last_schedule_check = Some(now - Duration::minutes(10));

        let events = coord.tick(now);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ModeChanged { mode: Mode::Deepwork, .. })));
        assert!(coord.state().session_active);
        assert_eq!(coord.state().session_duration_min, 60);
        assert_eq!(coord.state().last_schedule_check, Some(now));
    }

    #[test]
    fn update_schedule_rearms_the_scheduler() {
        let mut coord = coordinator_with_tabs(&[]);
        coord.state.last_schedule_check = Some(Utc::now());
        coord.update_schedule(vec![ScheduleEntry::new("09:00", Mode::Study, 45)]);
        assert!(coord.state().last_schedule_check.is_none());
        assert_eq!(coord.state().schedule.len(), 1);
    }

    #[test]
    fn update_blocklist_replaces_the_record_and_reports_counts() {
        let mut coord = coordinator_with_tabs(&[]);
        let mut map = std::collections::BTreeMap::new();
        map.insert(
            "social".to_string(),
            vec!["a.com".to_string(), "b.com".to_string()],
        );
        map.insert("gaming".to_string(), vec!["c.com".to_string()]);

        let event = coord.update_blocklist(map);
        match event {
            Event::BlocklistUpdated {
                categories,
                total_domains,
                ..
            } => {
                assert_eq!(categories, 2);
                assert_eq!(total_domains, 3);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(coord.state().ai_blocklist.is_some());
    }
}
