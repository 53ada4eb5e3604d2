//! Crate-level error taxonomy.
//!
//! Every failure a workflow can hit maps to one variant here, so the
//! embedding surface shows one message per failure instead of crashing.
//! Only losing persistence at startup is fatal; everything else is
//! recoverable by correcting input and explicitly re-triggering the action.

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::db::DbError;
use crate::extract::ExtractError;
use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing required user input; short-circuits before any external call.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Db(#[from] DbError),

    /// Document text could not be obtained; the submission aborts.
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// The text-generation call itself failed.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// The call succeeded but the response failed validation. Nothing was
    /// written to persistence.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl AppError {
    /// True only when the process cannot usefully continue: persistence was
    /// unavailable at startup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AppError::Db(DbError::Open { .. }) | AppError::Db(DbError::CreateDir(_))
        )
    }

    /// One-line message for the caller's surface.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Db(e) => format!("Database error: {e}"),
            AppError::Extraction(e) => format!("Could not read the document: {e}"),
            AppError::Llm(e) => format!("AI analysis failed: {e}"),
            AppError::Analysis(e) => format!("AI response was not usable: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_startup_db_failures_are_fatal() {
        let open_failed = AppError::Db(DbError::Open {
            path: "/nonexistent/portfolio.db".into(),
            source: rusqlite::Error::InvalidQuery,
        });
        assert!(open_failed.is_fatal());

        let validation = AppError::Validation("a contract title is required".to_string());
        assert!(!validation.is_fatal());

        let analysis = AppError::Analysis(AnalysisError::NoJsonObject);
        assert!(!analysis.is_fatal());
    }

    #[test]
    fn test_user_message_carries_detail() {
        let err = AppError::Analysis(AnalysisError::NoJsonObject);
        assert_eq!(
            err.user_message(),
            "AI response was not usable: no JSON object found in response"
        );
    }
}
