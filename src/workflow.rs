//! Analysis workflows: the composition layer an embedding surface calls.
//!
//! Each workflow validates its input, runs the external calls, and commits
//! to persistence only after the response has parsed and validated. Errors
//! surface as [`AppError`]; nothing here retries, and a failed call is
//! re-triggered by explicit caller action.

use crate::analysis::{self, ContractAnalysis, PricingRecommendation};
use crate::db::PortfolioDb;
use crate::error::AppError;
use crate::extract;
use crate::llm::TextGenerator;
use crate::prompts;
use crate::tco::TcoInputs;
use crate::types::ContractType;

/// Token budget for the contract risk analysis call.
const CONTRACT_ANALYSIS_MAX_TOKENS: u32 = 2048;
/// Token budget for the pricing recommendation call.
const PRICING_MAX_TOKENS: u32 = 1024;

/// An uploaded contract plus the metadata the operator supplied.
#[derive(Debug, Clone)]
pub struct ContractSubmission {
    pub title: String,
    pub contract_type: ContractType,
    /// Original filename; the extension drives format detection.
    pub filename: String,
    pub content: Vec<u8>,
}

/// Result of a successful analyze-and-save run. The parsed analysis rides
/// along with the new contract id so the caller can render it without
/// re-reading the database.
#[derive(Debug)]
pub struct ContractOutcome {
    pub contract_id: i64,
    pub analysis: ContractAnalysis,
}

/// Run the full contract intake: validate, extract text, prompt the model,
/// validate the response, and persist atomically.
pub fn analyze_and_save_contract(
    db: &mut PortfolioDb,
    generator: &dyn TextGenerator,
    submission: &ContractSubmission,
) -> Result<ContractOutcome, AppError> {
    if submission.title.trim().is_empty() {
        return Err(AppError::Validation(
            "a contract title is required".to_string(),
        ));
    }
    if submission.content.is_empty() {
        return Err(AppError::Validation(
            "a contract document is required".to_string(),
        ));
    }

    let text = extract::extract_text(&submission.filename, &submission.content)?;
    let prompt = prompts::contract_analysis_prompt(&text, submission.contract_type);
    let response = generator.generate(&prompt, CONTRACT_ANALYSIS_MAX_TOKENS)?;
    let parsed = analysis::parse_contract_analysis(&response)?;

    let contract_id =
        db.save_contract_and_analysis(&submission.title, submission.contract_type, &parsed)?;
    log::info!(
        "contract '{}' analyzed and saved as id {contract_id}",
        submission.title
    );

    Ok(ContractOutcome {
        contract_id,
        analysis: parsed,
    })
}

/// Compute the five-year TCO, prompt for a commercial-model recommendation,
/// and validate the response. `historical_summary` may be empty when no
/// comparable deals exist.
pub fn recommend_pricing(
    generator: &dyn TextGenerator,
    segment: &str,
    costs: &TcoInputs,
    historical_summary: &str,
) -> Result<PricingRecommendation, AppError> {
    let prompt =
        prompts::tco_pricing_prompt(segment, &costs.components_summary(), historical_summary);
    let response = generator.generate(&prompt, PRICING_MAX_TOKENS)?;
    Ok(analysis::parse_pricing_recommendation(&response)?)
}
