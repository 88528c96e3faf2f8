use serde::Serialize;
use thiserror::Error;

/// Everything that can go wrong between a submitted loan form and a result.
///
/// Errors are data: the host shows the message inline next to the field
/// returned by [`LoanError::field`], the user corrects it and resubmits.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind")]
pub enum LoanError {
    #[error("Please enter a valid loan amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Please enter a valid interest rate: {reason}")]
    InvalidRate { reason: String },

    #[error("Please enter a valid loan term: {reason}")]
    InvalidTerm { reason: String },

    #[error("Please enter a valid payment frequency: {reason}")]
    InvalidFrequency { reason: String },

    #[error("Please enter a valid extra payment: {reason}")]
    InvalidExtraPayment { reason: String },

    #[error("Please enter a valid start date: {reason}")]
    InvalidStartDate { reason: String },

    #[error("Calculation is undefined for these inputs: {context}")]
    ComputationUndefined { context: String },
}

impl LoanError {
    pub(crate) fn amount(reason: impl Into<String>) -> Self {
        LoanError::InvalidAmount { reason: reason.into() }
    }

    pub(crate) fn rate(reason: impl Into<String>) -> Self {
        LoanError::InvalidRate { reason: reason.into() }
    }

    pub(crate) fn term(reason: impl Into<String>) -> Self {
        LoanError::InvalidTerm { reason: reason.into() }
    }

    pub(crate) fn frequency(reason: impl Into<String>) -> Self {
        LoanError::InvalidFrequency { reason: reason.into() }
    }

    pub(crate) fn extra_payment(reason: impl Into<String>) -> Self {
        LoanError::InvalidExtraPayment { reason: reason.into() }
    }

    pub(crate) fn start_date(reason: impl Into<String>) -> Self {
        LoanError::InvalidStartDate { reason: reason.into() }
    }

    pub(crate) fn undefined(context: impl Into<String>) -> Self {
        LoanError::ComputationUndefined { context: context.into() }
    }

    /// The form field the error belongs to, `None` for computation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            LoanError::InvalidAmount { .. } => Some("principal"),
            LoanError::InvalidRate { .. } => Some("annual_interest_rate_percent"),
            LoanError::InvalidTerm { .. } => Some("term_years"),
            LoanError::InvalidFrequency { .. } => Some("payments_per_year"),
            LoanError::InvalidExtraPayment { .. } => Some("extra_payment_per_period"),
            LoanError::InvalidStartDate { .. } => Some("start_date"),
            LoanError::ComputationUndefined { .. } => None,
        }
    }
}
