//! Commercial portfolio core: contract intelligence, TCO-based pricing
//! support, and partner/RFx data over a single SQLite session.
//!
//! The crate exposes the persistence operations ([`db::PortfolioDb`]), the
//! LLM analysis contract (prompt builders in [`prompts`], response
//! validation in [`analysis`]), deterministic TCO arithmetic ([`tco`]),
//! document text extraction ([`extract`]), and the workflows that compose
//! them ([`workflow`]). Rendering is the embedding application's concern:
//! it constructs one [`db::PortfolioDb`] and one [`llm::AnthropicClient`]
//! at startup and injects them into the workflow calls.

pub mod analysis;
pub mod db;
pub mod error;
pub mod extract;
pub mod llm;
pub mod prompts;
pub mod tco;
pub mod types;
pub mod workflow;

pub use error::AppError;
