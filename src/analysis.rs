//! The LLM response contract: contract risk/terms extraction and the TCO
//! pricing recommendation.
//!
//! Responses are accepted only after validation, immediately on receipt: a
//! single JSON object with exactly the expected top-level keys, risk levels
//! and pricing models restricted to their closed vocabularies. Anything else
//! is an error the caller reports; nothing is guessed at or repaired, and
//! nothing reaches persistence.

use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

use crate::types::{PricingModel, RiskLevel};

/// Term names the analysis prompt asks for. Terms absent from the source
/// text come back with the value `"Not Found"`.
pub const EXPECTED_KEY_TERMS: [&str; 4] = [
    "Renewal Term",
    "Notice Period for Non-Renewal",
    "Payment Terms",
    "Governing Law & Jurisdiction",
];

/// Why a response was rejected. Distinct from transport failure (`LlmError`):
/// the call succeeded but the text is unusable.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no JSON object found in response")]
    NoJsonObject,

    #[error("response is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("response does not match the expected shape: {0}")]
    InvalidShape(String),
}

/// One scored risk finding from the contract analysis response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RiskFinding {
    pub clause_category: String,
    pub risk_level: RiskLevel,
    pub summary: String,
}

/// Wire shape of the contract analysis response. Term values may arrive as
/// any JSON scalar; they are coerced to text before use.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawContractAnalysis {
    risk_analysis: Vec<RiskFinding>,
    key_terms: BTreeMap<String, serde_json::Value>,
}

/// Validated contract risk and key-term extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractAnalysis {
    /// May be empty; a clean contract is a valid outcome.
    pub risk_analysis: Vec<RiskFinding>,
    /// Term name → value, as text regardless of the source type.
    pub key_terms: BTreeMap<String, String>,
}

impl ContractAnalysis {
    /// Roll the findings up to a single display score: the most severe level
    /// present, `Low` when there are no findings.
    pub fn overall_risk(&self) -> RiskLevel {
        self.risk_analysis
            .iter()
            .map(|finding| finding.risk_level)
            .max()
            .unwrap_or(RiskLevel::Low)
    }
}

/// Validated TCO pricing recommendation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PricingRecommendation {
    pub tco_insight: String,
    pub recommended_model: PricingModel,
    pub pricing_strategy: String,
    /// Exactly three, per the response contract.
    pub value_propositions: Vec<String>,
}

/// Parse and validate a contract analysis response.
pub fn parse_contract_analysis(response: &str) -> Result<ContractAnalysis, AnalysisError> {
    let json = extract_json_object(response).ok_or(AnalysisError::NoJsonObject)?;
    let value: serde_json::Value = serde_json::from_str(json)?;
    let raw: RawContractAnalysis = serde_json::from_value(value)
        .map_err(|e| AnalysisError::InvalidShape(e.to_string()))?;

    let key_terms = raw
        .key_terms
        .into_iter()
        .map(|(name, value)| (name, coerce_to_text(value)))
        .collect();

    Ok(ContractAnalysis {
        risk_analysis: raw.risk_analysis,
        key_terms,
    })
}

/// Parse and validate a pricing recommendation response.
pub fn parse_pricing_recommendation(
    response: &str,
) -> Result<PricingRecommendation, AnalysisError> {
    let json = extract_json_object(response).ok_or(AnalysisError::NoJsonObject)?;
    let value: serde_json::Value = serde_json::from_str(json)?;
    let recommendation: PricingRecommendation = serde_json::from_value(value)
        .map_err(|e| AnalysisError::InvalidShape(e.to_string()))?;

    let count = recommendation.value_propositions.len();
    if count != 3 {
        return Err(AnalysisError::InvalidShape(format!(
            "expected exactly 3 value propositions, got {count}"
        )));
    }

    Ok(recommendation)
}

fn coerce_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Extract a JSON object from raw model output.
///
/// Handles a ```json fence, a generic fence, a bare object, and an object
/// embedded in surrounding prose (brace-matched, string-aware).
fn extract_json_object(response: &str) -> Option<&str> {
    if let Some(start) = response.find("```json") {
        let json_start = start + 7;
        if let Some(end) = response[json_start..].find("```") {
            return Some(response[json_start..json_start + end].trim());
        }
    }

    if let Some(start) = response.find("```") {
        let after_fence = start + 3;
        if let Some(nl) = response[after_fence..].find('\n') {
            let json_start = after_fence + nl + 1;
            if let Some(end) = response[json_start..].find("```") {
                let candidate = response[json_start..json_start + end].trim();
                if candidate.starts_with('{') {
                    return Some(candidate);
                }
            }
        }
    }

    let trimmed = response.trim();
    if trimmed.starts_with('{') {
        return Some(trimmed);
    }

    // Last resort: brace-match an object embedded in other text.
    if let Some(start) = response.find('{') {
        let candidate = &response[start..];
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escape = false;
        for (i, ch) in candidate.char_indices() {
            if escape {
                escape = false;
                continue;
            }
            if ch == '\\' && in_string {
                escape = true;
                continue;
            }
            if ch == '"' {
                in_string = !in_string;
                continue;
            }
            if in_string {
                continue;
            }
            if ch == '{' {
                depth += 1;
            } else if ch == '}' {
                depth -= 1;
                if depth == 0 {
                    return Some(&candidate[..=i]);
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_ANALYSIS: &str = r#"{
        "risk_analysis": [
            {"clause_category": "Liability Caps", "risk_level": "High", "summary": "Uncapped liability for data breaches."},
            {"clause_category": "Termination", "risk_level": "Medium", "summary": "180-day notice period."}
        ],
        "key_terms": {
            "Renewal Term": "Auto-renews for 1 year",
            "Notice Period for Non-Renewal": 90,
            "Payment Terms": "Net 30",
            "Governing Law & Jurisdiction": "Not Found"
        }
    }"#;

    const VALID_RECOMMENDATION: &str = r#"{
        "tco_insight": "Personnel costs dominate the five-year total.",
        "recommended_model": "Usage-Based Pricing",
        "pricing_strategy": "Start at €0.02 per session with committed-volume tiers.",
        "value_propositions": ["Lower entry cost", "Scales with traffic", "No idle capacity"]
    }"#;

    #[test]
    fn test_parse_valid_contract_analysis() {
        let analysis = parse_contract_analysis(VALID_ANALYSIS).expect("parse");
        assert_eq!(analysis.risk_analysis.len(), 2);
        assert_eq!(analysis.risk_analysis[0].risk_level, RiskLevel::High);
        assert_eq!(analysis.key_terms.len(), 4);
        // Numeric term values are coerced to text.
        assert_eq!(
            analysis.key_terms.get("Notice Period for Non-Renewal"),
            Some(&"90".to_string())
        );
    }

    #[test]
    fn test_parse_accepts_fenced_response() {
        let fenced = format!("Here is the analysis:\n```json\n{VALID_ANALYSIS}\n```\nLet me know!");
        let analysis = parse_contract_analysis(&fenced).expect("parse fenced");
        assert_eq!(analysis.risk_analysis.len(), 2);
    }

    #[test]
    fn test_parse_accepts_prose_wrapped_object() {
        let wrapped = format!("Sure — the report follows. {VALID_ANALYSIS} Anything else?");
        let analysis = parse_contract_analysis(&wrapped).expect("parse wrapped");
        assert_eq!(analysis.key_terms.len(), 4);
    }

    #[test]
    fn test_non_json_response_is_rejected() {
        let result = parse_contract_analysis("I could not analyze this contract.");
        assert!(matches!(result, Err(AnalysisError::NoJsonObject)));
    }

    #[test]
    fn test_truncated_json_is_rejected() {
        let result = parse_contract_analysis(r#"{"risk_analysis": [{"clause_category": "#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_key_terms_is_rejected() {
        let result = parse_contract_analysis(r#"{"risk_analysis": []}"#);
        assert!(matches!(result, Err(AnalysisError::InvalidShape(_))));
    }

    #[test]
    fn test_unexpected_top_level_key_is_rejected() {
        let result = parse_contract_analysis(
            r#"{"risk_analysis": [], "key_terms": {}, "confidence": 0.9}"#,
        );
        assert!(matches!(result, Err(AnalysisError::InvalidShape(_))));
    }

    #[test]
    fn test_unknown_risk_level_is_rejected_not_guessed() {
        let result = parse_contract_analysis(
            r#"{"risk_analysis": [{"clause_category": "SLA", "risk_level": "Severe", "summary": "x"}], "key_terms": {}}"#,
        );
        assert!(matches!(result, Err(AnalysisError::InvalidShape(_))));
    }

    #[test]
    fn test_empty_risk_list_rolls_up_to_low() {
        let analysis =
            parse_contract_analysis(r#"{"risk_analysis": [], "key_terms": {}}"#).expect("parse");
        assert_eq!(analysis.overall_risk(), RiskLevel::Low);
    }

    #[test]
    fn test_overall_risk_is_maximum() {
        let analysis = parse_contract_analysis(VALID_ANALYSIS).expect("parse");
        assert_eq!(analysis.overall_risk(), RiskLevel::High);
    }

    #[test]
    fn test_parse_valid_recommendation() {
        let rec = parse_pricing_recommendation(VALID_RECOMMENDATION).expect("parse");
        assert_eq!(rec.recommended_model, PricingModel::UsageBasedPricing);
        assert_eq!(rec.value_propositions.len(), 3);
    }

    #[test]
    fn test_unknown_pricing_model_is_rejected() {
        let bad = VALID_RECOMMENDATION.replace("Usage-Based Pricing", "Freemium");
        let result = parse_pricing_recommendation(&bad);
        assert!(matches!(result, Err(AnalysisError::InvalidShape(_))));
    }

    #[test]
    fn test_wrong_value_proposition_count_is_rejected() {
        let two = r#"{
            "tco_insight": "x",
            "recommended_model": "Hybrid Model",
            "pricing_strategy": "y",
            "value_propositions": ["a", "b"]
        }"#;
        let result = parse_pricing_recommendation(two);
        assert!(matches!(result, Err(AnalysisError::InvalidShape(_))));
    }

    #[test]
    fn test_missing_recommendation_key_is_rejected() {
        let missing = r#"{
            "tco_insight": "x",
            "pricing_strategy": "y",
            "value_propositions": ["a", "b", "c"]
        }"#;
        let result = parse_pricing_recommendation(missing);
        assert!(matches!(result, Err(AnalysisError::InvalidShape(_))));
    }

    #[test]
    fn test_extract_json_ignores_braces_inside_strings() {
        let tricky = r#"The summary: {"risk_analysis": [{"clause_category": "IP", "risk_level": "Low", "summary": "Uses { and } in text"}], "key_terms": {}} done."#;
        let analysis = parse_contract_analysis(tricky).expect("parse");
        assert_eq!(analysis.risk_analysis[0].summary, "Uses { and } in text");
    }
}
