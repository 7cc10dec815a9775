//! Session lifecycle management
//!
//! This module provides:
//! - Session records and the analysis entries they accumulate
//! - Backing stores (in-memory map, one JSON file per session)
//! - `SessionStore`: write-through cache over a backing store, with
//!   per-session locking and time-based expiration
//! - A background cleanup scheduler that sweeps expired sessions

mod backend;
mod cleanup;
mod error;
mod file;
mod record;
mod stats;
mod store;

pub use backend::{is_valid_session_id, MemoryBackend, SessionBackend, MAX_SESSION_ID_LEN};
pub use cleanup::{
    CleanupHandle, CleanupScheduler, SessionJanitor, Sweeper, MIN_SWEEP_PERIOD,
};
pub use error::StoreError;
pub use file::FileBackend;
pub use record::{
    AnalysisEntry, AnalysisResult, Classification, History, ImageSource, SessionRecord,
};
pub use stats::{SessionStats, SessionSummary};
pub use store::{FileSessionStore, SessionStore};
