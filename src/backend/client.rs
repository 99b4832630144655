use super::types::{
    AlcoholType, CategoryMappings, IndustryCategory, RagComparisonRequest, RagComparisonResponse,
    SearchParams, SearchResponse, SimilarCasesQuery, SimilarCasesResponse, Submission,
};
use super::IntakeBackend;
use crate::analysis::types::{AnalyzeRequest, RawAnalysis};
use crate::config::ApiConfig;
use crate::documents::{DocumentUpload, ExtractResponse};
use crate::draft;
use crate::error::{Error, Result};
use crate::storage::{KeyValueStore, ACCESS_TOKEN_KEY};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Fields that keep their previous value when a detail refresh returns them empty.
const STICKY_DETAIL_FIELDS: &[&str] = &[
    "key_issues",
    "suggested_questions",
    "action_items",
    "relevant_regulations",
];

/// reqwest-backed client for the consultation backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    tokens: Option<Arc<dyn KeyValueStore>>,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            tokens: None,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    /// Attach `Authorization: Bearer` from the store's access token when present.
    pub fn with_token_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.tokens = Some(store);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self
            .tokens
            .as_ref()
            .and_then(|store| store.get(ACCESS_TOKEN_KEY))
            .filter(|t| !t.trim().is_empty());
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Submit a consultation for full analysis (`generate-suggestions`).
    pub async fn submit_consultation(&self, text: &str) -> Result<Submission> {
        if text.trim().is_empty() {
            return Err(Error::Validation("consultation text is empty".into()));
        }
        let form = Form::new().text("text", text.to_string());
        let response = self
            .authorize(
                self.client
                    .post(self.url("/api/consultations/generate-suggestions")),
            )
            .multipart(form)
            .send()
            .await?;
        let payload: Value = Self::read_json(response).await?;
        let consultation_id = match payload.get("consultation_id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(Error::Validation(
                    "submission response has no consultation_id".into(),
                ))
            }
        };
        tracing::info!(%consultation_id, "consultation submitted");
        Ok(Submission {
            consultation_id,
            payload,
        })
    }

    /// Submit and record the draft plus the submission for the summary view.
    pub async fn submit_and_record(
        &self,
        store: &dyn KeyValueStore,
        text: &str,
        completeness: Option<u8>,
    ) -> Result<Submission> {
        draft::save_draft(store, text)?;
        if let Some(level) = completeness {
            crate::analysis::presentation::persist_completeness(store, level)?;
        }
        let submission = self.submit_consultation(text).await?;
        draft::record_submission(store, &submission.consultation_id, &submission.payload)?;
        Ok(submission)
    }

    pub async fn consultation_detail(&self, consultation_id: &str) -> Result<Value> {
        let response = self
            .authorize(
                self.client
                    .get(self.url(&format!("/api/consultations/{consultation_id}"))),
            )
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Re-fetch the last submitted consultation and merge it into the stored copy.
    ///
    /// Returns `None` when nothing has been submitted yet.
    pub async fn refresh_last_submission(&self, store: &dyn KeyValueStore) -> Result<Option<Value>> {
        let Some((id, previous)) = draft::last_submission(store) else {
            return Ok(None);
        };
        let fresh = self.consultation_detail(&id).await?;
        let merged = merge_consultation_detail(&previous, fresh);
        draft::record_submission(store, &id, &merged)?;
        Ok(Some(merged))
    }

    pub async fn similar_cases(&self, query: &SimilarCasesQuery) -> Result<SimilarCasesResponse> {
        let response = self
            .authorize(self.client.get(self.url("/api/similar-cases")))
            .query(&query.to_pairs())
            .send()
            .await?;
        Self::read_json(response).await.inspect_err(|e| {
            tracing::warn!(error = %e, "similar cases request failed");
        })
    }

    pub async fn similar_by_category_and_title(
        &self,
        industry_category_id: &str,
        summary_title: &str,
        limit: Option<u32>,
    ) -> Result<SimilarCasesResponse> {
        self.similar_cases(&SimilarCasesQuery {
            industry_category_id: Some(industry_category_id.to_string()),
            summary_title: Some(summary_title.to_string()),
            limit: Some(limit.unwrap_or(2)),
        })
        .await
    }

    pub async fn recent_cases(&self, limit: Option<u32>) -> Result<SimilarCasesResponse> {
        self.similar_cases(&SimilarCasesQuery {
            limit: Some(limit.unwrap_or(2)),
            ..Default::default()
        })
        .await
    }

    pub async fn search(&self, params: &SearchParams) -> Result<SearchResponse> {
        let response = self
            .authorize(self.client.get(self.url("/api/search")))
            .query(&params.to_pairs())
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Run `query` through the traditional and the hybrid retriever side by side.
    pub async fn compare_rag(&self, query: &str) -> Result<RagComparisonResponse> {
        if query.trim().is_empty() {
            return Err(Error::Validation("comparison query is empty".into()));
        }
        tracing::debug!(query, "comparing retrievers");
        let response = self
            .authorize(self.client.post(self.url("/api/compare-rag")))
            .json(&RagComparisonRequest {
                query: query.to_string(),
            })
            .send()
            .await?;
        Self::read_json(response).await.inspect_err(|e| {
            tracing::warn!(error = %e, "retriever comparison failed");
        })
    }

    async fn get_list(&self, path: &str) -> Result<Vec<Value>> {
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        match Self::read_json::<Value>(response).await? {
            Value::Array(items) => Ok(items),
            other => Err(Error::Validation(format!(
                "{path} returned {} instead of a list",
                json_kind(&other)
            ))),
        }
    }

    pub async fn industry_categories(&self) -> Result<Vec<IndustryCategory>> {
        let items = self.get_list("/api/consultations/industry-categories").await?;
        Ok(serde_json::from_value(Value::Array(items))?)
    }

    pub async fn alcohol_types(&self) -> Result<Vec<AlcoholType>> {
        let items = self.get_list("/api/consultations/alcohol-types").await?;
        Ok(serde_json::from_value(Value::Array(items))?)
    }

    /// Both lookups, or the built-in table if either one fails.
    pub async fn category_mappings(&self) -> CategoryMappings {
        let lists = async {
            let industry = self.industry_categories().await?;
            let alcohol = self.alcohol_types().await?;
            Ok::<_, Error>((industry, alcohol))
        };
        match lists.await {
            Ok((industry, alcohol)) => CategoryMappings {
                industry: industry
                    .into_iter()
                    .map(|c| (c.category_id, c.category_name))
                    .collect(),
                alcohol: alcohol.into_iter().map(|t| (t.type_id, t.type_name)).collect(),
                fallback: false,
            },
            Err(e) => {
                tracing::warn!(error = %e, "category lookup failed, using built-in table");
                CategoryMappings::builtin()
            }
        }
    }
}

#[async_trait]
impl IntakeBackend for HttpBackend {
    async fn analyze(&self, request: &AnalyzeRequest) -> Result<RawAnalysis> {
        let response = self
            .authorize(self.client.post(self.url("/api/analyze")))
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn extract_text(&self, files: &[DocumentUpload]) -> Result<ExtractResponse> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.data.clone())
                .file_name(file.name.clone())
                .mime_str(&file.mime_type)?;
            form = form.part("files[]", part);
        }
        let response = self
            .authorize(self.client.post(self.url("/api/extract_text")))
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response).await
    }
}

/// Shallow merge of a fresh detail over the stored one. The list fields keep
/// their stored value when the fresh copy has them null, empty or missing.
pub fn merge_consultation_detail(previous: &Value, fresh: Value) -> Value {
    let mut merged = match previous {
        Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    let Value::Object(fresh) = fresh else {
        return Value::Object(merged);
    };
    if fresh.is_empty() {
        return Value::Object(merged);
    }
    for (key, value) in fresh {
        let blank = matches!(&value, Value::Null) || value.as_str().is_some_and(str::is_empty);
        if blank && STICKY_DETAIL_FIELDS.contains(&key.as_str()) && merged.contains_key(&key) {
            continue;
        }
        merged.insert(key, value);
    }
    Value::Object(merged)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
