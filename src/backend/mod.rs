//! Consultation backend: the analysis/extraction seam used by the realtime
//! controller, plus typed pass-through calls for the remaining endpoints.

pub mod client;
pub mod types;

pub use client::{merge_consultation_detail, HttpBackend};
pub use types::{
    AlcoholType, CategoryMappings, ComparisonMetrics, ConsultationSearchResult, IndustryCategory,
    RagChunk, RagComparisonRequest, RagComparisonResponse, RagComparisonResult, RagKind,
    RagSearchType, RegulationRef, SearchParams, SearchResponse, SimilarCase, SimilarCasesQuery,
    SimilarCasesResponse, SortOrder, Submission, TraditionalRagChunk,
};

use crate::analysis::types::{AnalyzeRequest, RawAnalysis};
use crate::documents::{DocumentUpload, ExtractResponse};
use crate::error::Result;
use async_trait::async_trait;

/// The two calls the realtime controller depends on.
#[async_trait]
pub trait IntakeBackend: Send + Sync {
    /// `POST /api/analyze`.
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<RawAnalysis>;

    /// `POST /api/extract_text` with one `files[]` part per upload.
    async fn extract_text(&self, files: &[DocumentUpload]) -> Result<ExtractResponse>;
}
