//! # Focuskit Core Library
//!
//! Core business logic for Focuskit, a focus/productivity engine that
//! restricts distracting sites during user-declared modes (free, study,
//! deep work, chill), tracks visited domains during a session, and
//! computes a post-session focus score.
//!
//! The library follows a CLI-first philosophy: every operation is
//! available through the `focuskit` binary, and any GUI or browser shell
//! is a thin layer over the same core.
//!
//! ## Architecture
//!
//! - **Coordinator**: a wall-clock state machine over the session record;
//!   the caller invokes `tick()` periodically for timed behavior (session
//!   countdown, idle-tab sweeps, scheduled activations)
//! - **Policy**: pure per-page enforcement decisions (block overlay, feed
//!   hiding, desaturation)
//! - **Host adapter**: the browser boundary (tab enumeration, muting,
//!   removal, notifications) as a trait, with an in-memory reference
//!   implementation
//! - **Storage**: SQLite session history plus a kv slot for the state
//!   record, and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Coordinator`]: mode/session state machine
//! - [`SessionState`]: the single aggregate record
//! - [`page_effect`]: per-page enforcement decision
//! - [`BlocklistClient`]: one-shot AI blocklist generation
//! - [`Database`] / [`Config`]: persistence

pub mod blocklist;
pub mod error;
pub mod events;
pub mod host;
pub mod policy;
pub mod schedule;
pub mod scoring;
pub mod session;
pub mod state;
pub mod storage;

pub use blocklist::BlocklistClient;
pub use error::{BlocklistError, ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use host::{MemoryHost, Tab, TabHost, TabId};
pub use policy::{page_effect, PageEffect};
pub use schedule::ScheduleEntry;
pub use scoring::{focus_score, SessionSummary};
pub use session::Coordinator;
pub use state::{Mode, SessionState, TabCaps};
pub use storage::{Config, Database};
