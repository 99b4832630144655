use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A regulation chunk or detected term attached to a consultation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegulationRef {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default, rename = "prefLabel")]
    pub pref_label: String,
    #[serde(default)]
    pub section_label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarCase {
    pub consultation_id: String,
    pub title: String,
    #[serde(default)]
    pub summary_title: Option<String>,
    #[serde(default)]
    pub initial_content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub industry_category_id: Option<String>,
    #[serde(default)]
    pub alcohol_type_id: Option<String>,
    #[serde(default)]
    pub key_issues: Vec<String>,
    #[serde(default)]
    pub suggested_questions: Vec<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub relevant_regulations: Vec<RegulationRef>,
    #[serde(default)]
    pub detected_terms: Vec<RegulationRef>,
    #[serde(default)]
    pub similarity_score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarCasesResponse {
    #[serde(default)]
    pub similar_cases: Vec<SimilarCase>,
    #[serde(default)]
    pub total_candidates: u64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarCasesQuery {
    pub industry_category_id: Option<String>,
    pub summary_title: Option<String>,
    pub limit: Option<u32>,
}

impl SimilarCasesQuery {
    /// Query pairs; empty values are left out.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(id) = self.industry_category_id.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("industry_category_id", id.to_string()));
        }
        if let Some(title) = self.summary_title.as_deref().filter(|v| !v.is_empty()) {
            pairs.push(("summary_title", title.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub industry_categories: Vec<String>,
    pub alcohol_types: Vec<String>,
    pub sort_order: SortOrder,
    pub limit: u32,
    pub offset: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            industry_categories: Vec::new(),
            alcohol_types: Vec::new(),
            sort_order: SortOrder::Newest,
            limit: 50,
            offset: 0,
        }
    }
}

impl SearchParams {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let query = self.query.trim();
        if !query.is_empty() {
            pairs.push(("query", query.to_string()));
        }
        if !self.industry_categories.is_empty() {
            pairs.push(("industry_categories", self.industry_categories.join(",")));
        }
        if !self.alcohol_types.is_empty() {
            pairs.push(("alcohol_types", self.alcohol_types.join(",")));
        }
        pairs.push(("sort_order", self.sort_order.as_str().to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs.push(("offset", self.offset.to_string()));
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsultationSearchResult {
    pub consultation_id: String,
    pub title: String,
    #[serde(default)]
    pub summary_title: Option<String>,
    #[serde(default)]
    pub initial_content: String,
    #[serde(default)]
    pub information_sufficiency_level: i64,
    #[serde(default)]
    pub key_issues: Vec<String>,
    #[serde(default)]
    pub suggested_questions: Vec<String>,
    #[serde(default)]
    pub relevant_regulations: Vec<serde_json::Value>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub detected_terms: Vec<serde_json::Value>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub industry_category_name: Option<String>,
    #[serde(default)]
    pub alcohol_type_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryCategory {
    pub category_id: String,
    #[serde(default)]
    pub category_code: String,
    pub category_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlcoholType {
    pub type_id: String,
    #[serde(default)]
    pub type_code: String,
    pub type_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub sort_order: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub results: Vec<ConsultationSearchResult>,
    #[serde(default)]
    pub industry_categories: Vec<IndustryCategory>,
    #[serde(default)]
    pub alcohol_types: Vec<AlcoholType>,
}

/// id → display name lookups for the summary view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryMappings {
    pub industry: BTreeMap<String, String>,
    pub alcohol: BTreeMap<String, String>,
    /// True when the built-in table was used instead of the backend lists.
    pub fallback: bool,
}

impl CategoryMappings {
    pub fn builtin() -> Self {
        let industry = [
            ("cat0001", "マーケティング商品企画"),
            ("cat0002", "製造"),
            ("cat0003", "研究開発"),
            ("cat0004", "中身開発"),
            ("cat0005", "物流"),
        ];
        let alcohol = [
            ("alc0001", "ビールテイスト"),
            ("alc0002", "RTD/RTS"),
            ("alc0003", "ワイン"),
            ("alc0004", "和酒"),
            ("alc0005", "ノンアルコール"),
        ];
        Self {
            industry: industry
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            alcohol: alcohol
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            fallback: true,
        }
    }
}

/// Result of submitting a consultation. The full body is kept for the summary view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub consultation_id: String,
    pub payload: serde_json::Value,
}

/// Body of `POST /api/compare-rag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RagComparisonRequest {
    pub query: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RagSearchType {
    #[default]
    Vector,
    Graph,
    Keyword,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RagKind {
    #[default]
    Traditional,
    Hybrid,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagChunkMetadata {
    #[serde(default, rename = "prefLabel")]
    pub pref_label: String,
    #[serde(default)]
    pub section_label: String,
    #[serde(default)]
    pub chunk_id: String,
    #[serde(default)]
    pub graph_keywords: Vec<String>,
}

/// A chunk returned by the hybrid (vector + graph + keyword) retriever.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagChunk {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub metadata: RagChunkMetadata,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub search_type: RagSearchType,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub edge_info: Option<serde_json::Map<String, serde_json::Value>>,
}

/// A chunk returned by the vector-only retriever.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraditionalRagChunk {
    pub chunk_id: String,
    #[serde(default, rename = "prefLabel")]
    pub pref_label: String,
    #[serde(default)]
    pub section_label: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub search_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagSearchStats {
    pub search_type: RagSearchType,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub execution_time_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagSearchBreakdown {
    #[serde(default)]
    pub vector: Option<RagSearchStats>,
    #[serde(default)]
    pub graph: Option<RagSearchStats>,
    #[serde(default)]
    pub keyword: Option<RagSearchStats>,
}

/// One side of the comparison. Traditional runs fill `chunks`, hybrid runs
/// fill `final_chunks`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagComparisonResult {
    pub rag_type: RagKind,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub expanded_query: Option<String>,
    #[serde(default)]
    pub chunks: Vec<TraditionalRagChunk>,
    #[serde(default)]
    pub final_chunks: Vec<RagChunk>,
    #[serde(default)]
    pub search_results: Option<RagSearchBreakdown>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub execution_time_ms: f64,
    #[serde(default)]
    pub search_methods: Vec<String>,
    #[serde(default)]
    pub data_sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeComparison {
    pub traditional_time_ms: f64,
    pub hybrid_time_ms: f64,
    pub time_difference_ms: f64,
    pub faster_method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountComparison {
    pub traditional_count: i64,
    pub hybrid_count: i64,
    pub count_difference: i64,
    pub more_results_method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreStats {
    pub average_score: f64,
    pub max_score: f64,
    pub min_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreVerdict {
    pub higher_average: String,
    pub score_difference: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreComparison {
    pub traditional: ScoreStats,
    pub hybrid: ScoreStats,
    pub comparison: ScoreVerdict,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiversityComparison {
    pub traditional_unique_sources: u64,
    pub hybrid_unique_search_types: u64,
    pub traditional_sources: Vec<String>,
    pub hybrid_search_types: Vec<String>,
    pub diversity_winner: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvantageSummary {
    #[serde(default)]
    pub traditional_advantages: Vec<String>,
    #[serde(default)]
    pub hybrid_advantages: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonMetrics {
    pub time_comparison: TimeComparison,
    pub count_comparison: CountComparison,
    pub score_comparison: ScoreComparison,
    pub diversity_comparison: DiversityComparison,
    pub summary: AdvantageSummary,
}

/// Backend commentary on a comparison run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagAnalysis {
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub traditional_advantages: Vec<String>,
    #[serde(default)]
    pub hybrid_advantages: Vec<String>,
    #[serde(default)]
    pub recommendation: String,
}

/// Response of `POST /api/compare-rag`: the same query run through the
/// traditional and the hybrid retriever, with side-by-side metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagComparisonResponse {
    pub query: String,
    #[serde(default)]
    pub traditional_rag_labels: Vec<String>,
    #[serde(default)]
    pub hybrid_rag_labels: Vec<String>,
    pub traditional_rag: RagComparisonResult,
    pub hybrid_rag: RagComparisonResult,
    #[serde(default)]
    pub comparison_metrics: ComparisonMetrics,
    #[serde(default)]
    pub analysis: Option<RagAnalysis>,
    #[serde(default)]
    pub total_execution_time_ms: f64,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similar_query_omits_empty_values() {
        let query = SimilarCasesQuery {
            industry_category_id: Some(String::new()),
            summary_title: Some("ビール".into()),
            limit: Some(2),
        };
        assert_eq!(
            query.to_pairs(),
            [("summary_title", "ビール".to_string()), ("limit", "2".to_string())]
        );
        assert!(SimilarCasesQuery::default().to_pairs().is_empty());
    }

    #[test]
    fn search_pairs_join_filters() {
        let params = SearchParams {
            query: "  monitor  ".into(),
            industry_categories: vec!["cat0001".into(), "cat0002".into()],
            sort_order: SortOrder::Oldest,
            ..Default::default()
        };
        assert_eq!(
            params.to_pairs(),
            [
                ("query", "monitor".to_string()),
                ("industry_categories", "cat0001,cat0002".to_string()),
                ("sort_order", "oldest".to_string()),
                ("limit", "50".to_string()),
                ("offset", "0".to_string()),
            ]
        );
    }

    #[test]
    fn similar_case_tolerates_sparse_payload() {
        let case: SimilarCase = serde_json::from_value(serde_json::json!({
            "consultation_id": "c1",
            "title": "t",
            "relevant_regulations": [{ "text": "第1条", "score": 0.8, "prefLabel": "酒税法" }]
        }))
        .unwrap();
        assert_eq!(case.relevant_regulations[0].pref_label, "酒税法");
        assert!(case.key_issues.is_empty());
    }

    #[test]
    fn rag_comparison_parses_both_sides() {
        let response: RagComparisonResponse = serde_json::from_value(serde_json::json!({
            "query": "ノンアル表示",
            "traditional_rag_labels": ["酒税法"],
            "hybrid_rag_labels": ["酒税法", "景品表示法"],
            "traditional_rag": {
                "rag_type": "traditional",
                "chunks": [{
                    "chunk_id": "c1", "prefLabel": "酒税法", "section_label": "第2条",
                    "text": "定義", "score": 0.82, "search_type": "vector"
                }],
                "total_count": 1,
                "execution_time_ms": 120.5
            },
            "hybrid_rag": {
                "rag_type": "hybrid",
                "final_chunks": [{
                    "id": "h1", "content": "表示基準", "source": "graph",
                    "metadata": { "prefLabel": "景品表示法", "section_label": "第5条", "chunk_id": "k9" },
                    "score": 0.91, "search_type": "graph", "node_id": null, "edge_info": null
                }],
                "search_results": { "graph": { "search_type": "graph", "total_count": 3, "execution_time_ms": 40 } },
                "total_count": 1,
                "execution_time_ms": 210
            },
            "comparison_metrics": {
                "time_comparison": {
                    "traditional_time_ms": 120.5, "hybrid_time_ms": 210,
                    "time_difference_ms": 89.5, "faster_method": "traditional"
                }
            },
            "total_execution_time_ms": 330.5,
            "success": true
        }))
        .unwrap();

        assert_eq!(response.traditional_rag.rag_type, RagKind::Traditional);
        assert_eq!(response.traditional_rag.chunks[0].pref_label, "酒税法");
        assert_eq!(response.hybrid_rag.final_chunks[0].search_type, RagSearchType::Graph);
        assert_eq!(response.hybrid_rag.final_chunks[0].metadata.pref_label, "景品表示法");
        let graph = response.hybrid_rag.search_results.unwrap().graph.unwrap();
        assert_eq!(graph.total_count, 3);
        assert_eq!(
            response.comparison_metrics.time_comparison.faster_method,
            "traditional"
        );
        assert!(response.analysis.is_none());
    }
}
