//! Sherpath consultation intake client.
//!
//! The centre of the crate is [`analysis::RealtimeAnalyzer`], which turns a
//! stream of edits and attachments into a completeness score with follow-up
//! suggestions. Everything else is thin typed access to the consultation
//! backend and the Teams hand-off.

pub mod analysis;
pub mod backend;
pub mod config;
pub mod documents;
pub mod draft;
pub mod error;
pub mod storage;
pub mod teams;

pub use analysis::{AnalysisResult, AnalysisSnapshot, AnalyzerOptions, RealtimeAnalyzer};
pub use backend::{HttpBackend, IntakeBackend};
pub use config::Config;
pub use error::{Error, Result};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
