//! Realtime completeness analysis.
//!
//! Edits are debounced, working texts are looked up in a bounded cache, and
//! misses go to the backend. Attachments are extracted server-side and merged
//! into the working text. The latest level is handed off to other views
//! through a [`KeyValueStore`](crate::storage::KeyValueStore).

pub mod cache;
pub mod controller;
pub mod debounce;
pub mod presentation;
pub mod types;

pub use cache::AnalysisCache;
pub use controller::{AnalysisSnapshot, AnalyzerOptions, RealtimeAnalyzer};
pub use debounce::Debouncer;
pub use presentation::{
    level_color, level_label, persist_completeness, read_completeness, CompletenessBadge,
};
pub use types::{normalize, working_text, AnalysisResult, AnalyzeRequest, RawAnalysis};
