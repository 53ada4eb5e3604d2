//! Closed vocabularies shared by the persistence layer and the analysis
//! contract.
//!
//! Values arriving from outside the process (LLM responses, stored rows) are
//! restricted to these variants at the parse boundary; anything outside the
//! known set is rejected rather than passed through.

use std::fmt;

use serde::Deserialize;

/// Severity of a single contract risk finding.
///
/// Ordered `Low < Medium < High` so the roll-up score for a contract is the
/// maximum across its findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship a company has with the portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyType {
    Partner,
    Client,
    Prospect,
}

impl CompanyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyType::Partner => "Partner",
            CompanyType::Client => "Client",
            CompanyType::Prospect => "Prospect",
        }
    }
}

impl fmt::Display for CompanyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kinds of agreement the intake flow accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractType {
    ResellerAgreement,
    ServiceAgreement,
    Nda,
    PartnershipAgreement,
}

impl ContractType {
    /// Display label, also the value stored in the contracts table.
    pub fn label(&self) -> &'static str {
        match self {
            ContractType::ResellerAgreement => "Reseller Agreement",
            ContractType::ServiceAgreement => "Service Agreement (MSA)",
            ContractType::Nda => "NDA",
            ContractType::PartnershipAgreement => "Partnership Agreement",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Commercial models the pricing recommendation may choose from.
///
/// Serde names match the wire strings the recommendation response must use;
/// any other value fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PricingModel {
    #[serde(rename = "Tiered-Feature Subscription")]
    TieredFeatureSubscription,
    #[serde(rename = "Usage-Based Pricing")]
    UsageBasedPricing,
    #[serde(rename = "Hybrid Model")]
    HybridModel,
}

impl PricingModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingModel::TieredFeatureSubscription => "Tiered-Feature Subscription",
            PricingModel::UsageBasedPricing => "Usage-Based Pricing",
            PricingModel::HybridModel => "Hybrid Model",
        }
    }
}

impl fmt::Display for PricingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
