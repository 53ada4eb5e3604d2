//! Prompt builders for the two analysis calls.
//!
//! Pure functions of their inputs, no hidden state. The response shapes they
//! request are the ones `analysis` validates on receipt.

use crate::analysis::EXPECTED_KEY_TERMS;
use crate::types::ContractType;

/// Example values shown for each expected key term, same order as
/// [`EXPECTED_KEY_TERMS`].
const KEY_TERM_EXAMPLES: [&str; 4] = [
    "Auto-renews for 1 year",
    "90 days",
    "Net 30",
    "State of New York, USA",
];

/// Build the contract risk and key-terms extraction prompt.
pub fn contract_analysis_prompt(contract_text: &str, contract_type: ContractType) -> String {
    let mut prompt = String::with_capacity(contract_text.len() + 2048);

    prompt.push_str(&format!(
        "You are a meticulous AI legal assistant specializing in telecommunications \
         contracts for a commercial manager. Analyze the following '{}' and provide \
         a structured risk and key terms report.\n\n",
        contract_type.label()
    ));

    prompt.push_str("Contract text:\n---\n");
    prompt.push_str(contract_text);
    prompt.push_str("\n---\n\n");

    prompt.push_str(
        "Perform the following analysis and respond with a single valid JSON object only.\n\n\
         1. Risk analysis: identify and score the critical risk factors. Focus on:\n\
         - Service Level Agreements: are the performance guarantees and penalty structures clear and reasonable?\n\
         - Liability caps and indemnification: is the limitation of damages clear? Are the indemnification clauses balanced?\n\
         - Intellectual property rights: how is ownership and licensing of software and technology handled?\n\
         - Data protection and privacy: does it comply with the relevant regulations (e.g. GDPR)?\n\
         - Termination provisions: are the notice periods and termination fees clearly defined and fair?\n\
         - Exclusivity clauses: are there any geographic or product-based exclusivity terms?\n\n\
         2. Key commercial terms: extract the following terms from the contract text. \
         Use \"Not Found\" when a term is absent:\n",
    );
    for (term, example) in EXPECTED_KEY_TERMS.iter().zip(KEY_TERM_EXAMPLES) {
        prompt.push_str(&format!("- {term} (e.g. \"{example}\")\n"));
    }

    prompt.push_str(
        "\nStructure the JSON with exactly these keys: \"risk_analysis\", \"key_terms\".\n\
         Each \"risk_analysis\" item must have \"clause_category\", \"risk_level\" \
         (one of \"Low\", \"Medium\", \"High\"), and \"summary\".\n\
         \"key_terms\" maps each term name to its extracted value.\n",
    );

    prompt
}

/// Build the TCO-based pricing recommendation prompt.
///
/// `tco_components` is the rendered cost summary line; `historical_summary`
/// may be empty when no comparable deals exist.
pub fn tco_pricing_prompt(
    segment: &str,
    tco_components: &str,
    historical_summary: &str,
) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(&format!(
        "You are a strategic commercial advisor. Provide a pricing and TCO strategy \
         for a software-based mobile network solution targeting the '{segment}' \
         customer segment.\n\n"
    ));

    prompt.push_str(&format!(
        "Input data:\n\
         - TCO components provided: {tco_components}\n\
         - Summary of historical deals for this segment: {historical_summary}\n\n"
    ));

    prompt.push_str(
        "Based on the provided data, respond with a strategic recommendation as a \
         single valid JSON object.\n\n\
         1. TCO analysis insight: one brief sentence on the likely key cost driver.\n\
         2. Recommended commercial model: exactly one of \"Tiered-Feature Subscription\", \
         \"Usage-Based Pricing\", or \"Hybrid Model\".\n\
         3. Suggested pricing strategy: a starting price point or structure for the \
         recommended model, with a brief justification.\n\
         4. Key value propositions: three value propositions to emphasize during \
         negotiation that justify the price.\n\n\
         Structure the JSON with exactly these keys: \"tco_insight\", \
         \"recommended_model\", \"pricing_strategy\", \"value_propositions\" \
         (a list of exactly three strings).\n",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_prompt_carries_text_and_type() {
        let prompt = contract_analysis_prompt(
            "The Supplier shall indemnify the Customer...",
            ContractType::ResellerAgreement,
        );
        assert!(prompt.contains("'Reseller Agreement'"));
        assert!(prompt.contains("The Supplier shall indemnify the Customer..."));
    }

    #[test]
    fn test_contract_prompt_requests_exact_contract_keys() {
        let prompt = contract_analysis_prompt("text", ContractType::Nda);
        assert!(prompt.contains("\"risk_analysis\""));
        assert!(prompt.contains("\"key_terms\""));
        assert!(prompt.contains("\"Low\", \"Medium\", \"High\""));
        for term in EXPECTED_KEY_TERMS {
            assert!(prompt.contains(term), "prompt should request term {term}");
        }
    }

    #[test]
    fn test_tco_prompt_carries_inputs_and_keys() {
        let prompt = tco_pricing_prompt(
            "Tier 1 Operator",
            "Acquisition: €195,000, Annual Ops: €170,000, 5-Year TCO: €1,045,000",
            "",
        );
        assert!(prompt.contains("'Tier 1 Operator'"));
        assert!(prompt.contains("5-Year TCO: €1,045,000"));
        assert!(prompt.contains("\"tco_insight\""));
        assert!(prompt.contains("\"recommended_model\""));
        assert!(prompt.contains("\"pricing_strategy\""));
        assert!(prompt.contains("\"value_propositions\""));
        assert!(prompt.contains("\"Tiered-Feature Subscription\""));
    }
}
