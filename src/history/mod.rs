//! Analysis history outside of sessions, and routing of new analyses
//!
//! - `LiveLedger`: the global, never-expiring history of the live feed
//! - `AnalysisRecorder`: appends analyses to a session or to the ledger

mod live;
mod recorder;

pub use live::{LiveLedger, LiveLedgerRecord};
pub use recorder::AnalysisRecorder;
