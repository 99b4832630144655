use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;

/// Suggestion shown when the analysis backend cannot be reached.
pub const FALLBACK_SUGGESTION: &str = "入力が少ない可能性があります。";

/// Normalized analysis outcome. `completeness` is always within 1..=5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub completeness: u8,
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AnalysisResult {
    pub fn fallback() -> Self {
        Self {
            completeness: MIN_LEVEL,
            suggestions: vec![FALLBACK_SUGGESTION.to_string()],
            confidence: Some(0.0),
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

/// Request body of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_text: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(text: &str, doc_text: &str) -> Self {
        Self {
            text: text.to_string(),
            doc_text: (!doc_text.is_empty()).then(|| doc_text.to_string()),
        }
    }
}

/// Raw analysis response. Backends disagree on field types, so everything
/// stays loosely typed until [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAnalysis {
    #[serde(default)]
    pub completeness: Value,
    #[serde(default)]
    pub suggestions: Value,
    #[serde(default)]
    pub confidence: Value,
}

/// Working text used both as the request payload and the cache key.
pub fn working_text(text: &str, doc_text: &str) -> String {
    format!("{text}\n\n{doc_text}").trim().to_string()
}

/// Round and clamp a loosely typed completeness value into 1..=5.
///
/// Numbers and numeric strings are accepted; anything else maps to 1.
pub fn normalize_level(value: &Value) -> u8 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => n.round().clamp(MIN_LEVEL as f64, MAX_LEVEL as f64) as u8,
        _ => MIN_LEVEL,
    }
}

pub fn normalize(raw: RawAnalysis) -> AnalysisResult {
    let suggestions = match raw.suggestions {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    let confidence = raw
        .confidence
        .as_f64()
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0));

    AnalysisResult {
        completeness: normalize_level(&raw.completeness),
        suggestions,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn level_boundaries() {
        assert_eq!(normalize_level(&json!(0)), 1);
        assert_eq!(normalize_level(&json!(1)), 1);
        assert_eq!(normalize_level(&json!(5)), 5);
        assert_eq!(normalize_level(&json!(6)), 5);
        assert_eq!(normalize_level(&json!(3.6)), 4);
        assert_eq!(normalize_level(&json!(-12)), 1);
        assert_eq!(normalize_level(&json!("not a number")), 1);
        assert_eq!(normalize_level(&json!("2")), 2);
        assert_eq!(normalize_level(&Value::Null), 1);
        assert_eq!(normalize_level(&json!([3])), 1);
    }

    #[test]
    fn missing_fields_normalize_to_defaults() {
        let raw: RawAnalysis = serde_json::from_value(json!({})).unwrap();
        let result = normalize(raw);
        assert_eq!(result.completeness, 1);
        assert!(result.suggestions.is_empty());
        assert_eq!(result.confidence, None);
    }

    #[test]
    fn suggestions_must_be_a_list_of_strings() {
        let raw: RawAnalysis = serde_json::from_value(json!({
            "completeness": 4,
            "suggestions": ["いつ開始しますか？", 7, null, "対象は？"],
            "confidence": "0.9"
        }))
        .unwrap();
        let result = normalize(raw);
        assert_eq!(result.completeness, 4);
        assert_eq!(result.suggestions, ["いつ開始しますか？", "対象は？"]);
        assert_eq!(result.confidence, None);

        let raw: RawAnalysis =
            serde_json::from_value(json!({ "completeness": 2, "suggestions": "oops" })).unwrap();
        assert!(normalize(raw).suggestions.is_empty());
    }

    #[test]
    fn confidence_is_clamped() {
        let raw: RawAnalysis =
            serde_json::from_value(json!({ "completeness": 3, "confidence": 1.7 })).unwrap();
        assert_eq!(normalize(raw).confidence, Some(1.0));
    }

    #[test]
    fn working_text_trims_and_joins() {
        assert_eq!(working_text("hello", ""), "hello");
        assert_eq!(working_text("", "doc"), "doc");
        assert_eq!(working_text(" a ", "b "), "a \n\nb");
    }

    #[test]
    fn request_omits_empty_doc_text() {
        let body = serde_json::to_value(AnalyzeRequest::new("t", "")).unwrap();
        assert_eq!(body, json!({ "text": "t" }));
        let body = serde_json::to_value(AnalyzeRequest::new("t", "d")).unwrap();
        assert_eq!(body, json!({ "text": "t", "docText": "d" }));
    }

    #[test]
    fn fallback_shape() {
        let fallback = AnalysisResult::fallback();
        assert_eq!(fallback.completeness, 1);
        assert_eq!(fallback.suggestions, [FALLBACK_SUGGESTION]);
        assert_eq!(fallback.confidence, Some(0.0));
    }
}
