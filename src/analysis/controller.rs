use super::cache::AnalysisCache;
use super::debounce::Debouncer;
use super::presentation::{persist_completeness, CompletenessBadge};
use super::types::{normalize, working_text, AnalysisResult, AnalyzeRequest};
use crate::backend::IntakeBackend;
use crate::config::AnalysisConfig;
use crate::documents::{partition_uploads, DocumentUpload, UploadOutcome, UploadedFile};
use crate::storage::KeyValueStore;
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::{Arc, Weak};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerOptions {
    pub debounce: Duration,
    pub cache_capacity: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self::from(&AnalysisConfig::default())
    }
}

impl From<&AnalysisConfig> for AnalyzerOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            debounce: Duration::from_millis(config.debounce_ms),
            cache_capacity: config.cache_capacity,
        }
    }
}

/// Point-in-time view of the controller, what a screen would render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSnapshot {
    pub input_text: String,
    pub doc_text: String,
    pub analysis: Option<AnalysisResult>,
    pub is_loading: bool,
    pub is_file_uploading: bool,
    pub uploaded_files: Vec<UploadedFile>,
}

struct State {
    input_text: String,
    doc_text: String,
    files: Vec<UploadedFile>,
    analysis: Option<AnalysisResult>,
    loading: bool,
    uploads_in_flight: usize,
    latest_seq: u64,
    next_batch: u64,
    persisted_level: Option<u8>,
    cache: AnalysisCache,
}

struct Inner {
    backend: Arc<dyn IntakeBackend>,
    store: Arc<dyn KeyValueStore>,
    state: Mutex<State>,
    debouncer: Debouncer,
}

/// Realtime completeness analysis for the consultation entry screen.
///
/// Cloning yields another handle to the same controller. None of the public
/// operations fail: analysis errors become [`AnalysisResult::fallback`] and
/// extraction errors are reported through [`UploadOutcome`].
#[derive(Clone)]
pub struct RealtimeAnalyzer {
    inner: Arc<Inner>,
}

impl RealtimeAnalyzer {
    pub fn new(
        backend: Arc<dyn IntakeBackend>,
        store: Arc<dyn KeyValueStore>,
        options: AnalyzerOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                store,
                state: Mutex::new(State {
                    input_text: String::new(),
                    doc_text: String::new(),
                    files: Vec::new(),
                    analysis: None,
                    loading: false,
                    uploads_in_flight: 0,
                    latest_seq: 0,
                    next_batch: 0,
                    persisted_level: None,
                    cache: AnalysisCache::new(options.cache_capacity),
                }),
                debouncer: Debouncer::new(options.debounce),
            }),
        }
    }

    /// Record an edit and arm the debounce timer.
    ///
    /// A cached result for the new working text is shown right away; the
    /// debounced analysis will then also be served from the cache.
    pub fn on_input(&self, text: &str) {
        let cached = {
            let mut st = self.inner.state.lock();
            st.input_text = text.to_string();
            let key = working_text(text, &st.doc_text);
            if key.is_empty() {
                None
            } else {
                st.cache.peek(&key).cloned()
            }
        };
        if let Some(result) = cached {
            let seq = self.inner.next_seq();
            self.inner.apply(seq, result);
            self.inner.finish(seq);
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.debouncer.schedule(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let analyzer = RealtimeAnalyzer { inner };
            tokio::spawn(async move {
                let (text, doc) = analyzer.current_texts();
                analyzer.analyze_now(&text, &doc).await;
            });
        });
    }

    /// Analyze `(text, doc_text)` immediately, bypassing the debounce.
    ///
    /// Returns this request's result. It is only shown if no newer request
    /// was issued in the meantime.
    pub async fn analyze_now(&self, text: &str, doc_text: &str) -> AnalysisResult {
        let key = working_text(text, doc_text);

        // Sequence, cache lookup and the loading flag share one critical
        // section so a newer request cannot finish in between.
        let (seq, cached) = {
            let mut st = self.inner.state.lock();
            st.latest_seq += 1;
            let seq = st.latest_seq;
            let cached = st.cache.get(&key);
            if cached.is_none() {
                st.loading = true;
            }
            (seq, cached)
        };
        if let Some(result) = cached {
            tracing::debug!(seq, "analysis served from cache");
            self.inner.apply(seq, result.clone());
            self.inner.finish(seq);
            return result;
        }

        let _loading = LoadingGuard {
            inner: &self.inner,
            seq,
        };

        let request = AnalyzeRequest::new(text, doc_text);
        let result = match self.inner.backend.analyze(&request).await {
            Ok(raw) => {
                let result = normalize(raw);
                self.inner.state.lock().cache.put(key, result.clone());
                result
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "analysis failed, showing fallback");
                AnalysisResult::fallback()
            }
        };
        self.inner.apply(seq, result.clone());
        result
    }

    /// Upload attachments for text extraction and re-analyze on success.
    ///
    /// Only `.docx`/`.xlsx` files are sent; the rest are listed in
    /// [`UploadOutcome::skipped`]. On failure the document text is left as it
    /// was and the batch's provisional entries are dropped.
    pub async fn upload_files(&self, files: Vec<DocumentUpload>) -> UploadOutcome {
        let (accepted, skipped) = partition_uploads(files);
        let mut outcome = UploadOutcome {
            accepted: accepted.iter().map(|f| f.name.clone()).collect(),
            skipped,
            error: None,
        };
        if !outcome.skipped.is_empty() {
            tracing::info!(skipped = ?outcome.skipped, "ignoring unsupported attachments");
        }
        if accepted.is_empty() {
            return outcome;
        }

        let batch = {
            let mut st = self.inner.state.lock();
            st.uploads_in_flight += 1;
            let batch = st.next_batch;
            st.next_batch += 1;
            let stamp = Utc::now().timestamp_millis();
            for file in &accepted {
                st.files.push(UploadedFile {
                    id: upload_id(&file.name, stamp),
                    name: file.name.clone(),
                    size: file.size(),
                    content: String::new(),
                    batch,
                });
            }
            batch
        };
        let _uploading = UploadGuard { inner: &self.inner };

        match self.inner.backend.extract_text(&accepted).await {
            Ok(response) => {
                let text = response.extracted_text.unwrap_or_default();
                let server_files = response.files.unwrap_or_default();
                let (input, doc) = {
                    let mut st = self.inner.state.lock();
                    let batch_files = st.files.iter_mut().filter(|f| f.batch == batch);
                    for (i, file) in batch_files.enumerate() {
                        if let Some(bytes) = server_files.get(i).and_then(|f| f.byte_count()) {
                            file.size = bytes;
                        }
                        file.content = text.clone();
                    }
                    let merged = merged_doc_text(&st.files);
                    st.doc_text = merged;
                    (st.input_text.clone(), st.doc_text.clone())
                };
                tracing::info!(
                    batch,
                    files = outcome.accepted.len(),
                    chars = text.chars().count(),
                    "extracted attachment text"
                );
                self.analyze_now(&input, &doc).await;
            }
            Err(e) => {
                tracing::warn!(batch, error = %e, "text extraction failed, keeping previous document text");
                self.inner.state.lock().files.retain(|f| f.batch != batch);
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }

    /// Remove an attachment and re-analyze without its text.
    /// Returns `false` if no file has that id.
    pub async fn remove_file(&self, id: &str) -> bool {
        let (input, doc) = {
            let mut st = self.inner.state.lock();
            let before = st.files.len();
            st.files.retain(|f| f.id != id);
            if st.files.len() == before {
                return false;
            }
            let merged = merged_doc_text(&st.files);
            st.doc_text = merged;
            (st.input_text.clone(), st.doc_text.clone())
        };
        self.analyze_now(&input, &doc).await;
        true
    }

    /// Disarm a pending debounced analysis.
    pub fn cancel_pending(&self) -> bool {
        self.inner.debouncer.cancel()
    }

    pub fn has_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    pub fn snapshot(&self) -> AnalysisSnapshot {
        let st = self.inner.state.lock();
        AnalysisSnapshot {
            input_text: st.input_text.clone(),
            doc_text: st.doc_text.clone(),
            analysis: st.analysis.clone(),
            is_loading: st.loading,
            is_file_uploading: st.uploads_in_flight > 0,
            uploaded_files: st.files.clone(),
        }
    }

    pub fn analysis(&self) -> Option<AnalysisResult> {
        self.inner.state.lock().analysis.clone()
    }

    /// Label and color for the current level (level 1 before any analysis).
    pub fn badge(&self) -> CompletenessBadge {
        let level = self
            .inner
            .state
            .lock()
            .analysis
            .as_ref()
            .map_or(1, |a| a.completeness);
        CompletenessBadge::for_level(level)
    }

    pub fn cached_entries(&self) -> usize {
        self.inner.state.lock().cache.len()
    }

    fn current_texts(&self) -> (String, String) {
        let st = self.inner.state.lock();
        (st.input_text.clone(), st.doc_text.clone())
    }
}

impl Inner {
    fn next_seq(&self) -> u64 {
        let mut st = self.state.lock();
        st.latest_seq += 1;
        st.latest_seq
    }

    /// Show `result` if `seq` is still the newest request.
    fn apply(&self, seq: u64, result: AnalysisResult) {
        let persist = {
            let mut st = self.state.lock();
            if seq != st.latest_seq {
                tracing::debug!(seq, latest = st.latest_seq, "discarding stale analysis");
                return;
            }
            let level = result.completeness;
            st.analysis = Some(result);
            if st.persisted_level == Some(level) {
                None
            } else {
                st.persisted_level = Some(level);
                Some(level)
            }
        };
        if let Some(level) = persist {
            if let Err(e) = persist_completeness(self.store.as_ref(), level) {
                tracing::warn!(level, error = %e, "failed to persist completeness level");
            }
        }
    }

    fn finish(&self, seq: u64) {
        let mut st = self.state.lock();
        if st.latest_seq == seq {
            st.loading = false;
        }
    }
}

/// Clears the loading flag however the request ends, including cancellation.
struct LoadingGuard<'a> {
    inner: &'a Inner,
    seq: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.inner.finish(self.seq);
    }
}

struct UploadGuard<'a> {
    inner: &'a Inner,
}

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        let mut st = self.inner.state.lock();
        st.uploads_in_flight = st.uploads_in_flight.saturating_sub(1);
    }
}

/// Document text from the uploaded files, one block per batch, in upload order.
fn merged_doc_text(files: &[UploadedFile]) -> String {
    let mut seen = Vec::new();
    let mut blocks = Vec::new();
    for file in files {
        if seen.contains(&file.batch) {
            continue;
        }
        seen.push(file.batch);
        if !file.content.is_empty() {
            blocks.push(file.content.as_str());
        }
    }
    blocks.join("\n\n")
}

fn upload_id(name: &str, stamp: i64) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{name}-{stamp}-{}", &suffix[..10])
}
