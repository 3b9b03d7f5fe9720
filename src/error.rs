use thiserror::Error;

/// Errors raised while allocating an expense batch.
///
/// Structural variants (missing columns, an unusable members sheet) abort the
/// batch immediately. Row-scoped variants are accumulated per expense row so a
/// single upload surfaces every problem in one pass.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    #[error("Sheet '{sheet}' is missing required column '{column}'")]
    MissingColumn { sheet: String, column: String },

    #[error("Members sheet contains no usable rows")]
    EmptyMemberSheet,

    #[error("Members row {row}: '{name}' has no usable integer id (got '{value}')")]
    InvalidMemberId {
        row: usize,
        name: String,
        value: String,
    },

    #[error("Member name '{0}' appears more than once in the members sheet")]
    AmbiguousMember(String),

    #[error("Member column '{0}' does not match any member")]
    UnknownMember(String),

    #[error("Payer '{0}' does not match any member")]
    UnknownPayer(String),

    #[error("Unrecognized split type '{0}'")]
    UnknownSplitType(String),

    #[error("Owed shares sum to {actual} but the expense amount is {expected}")]
    RoundingMismatch { expected: f64, actual: f64 },

    #[error("Amount '{0}' is missing or not a positive number")]
    InvalidAmount(String),

    #[error("Currency is missing")]
    MissingCurrency,

    #[error("Date is missing or not a valid ISO date")]
    MissingDate,

    #[error("Description is missing")]
    MissingDescription,

    #[error("No members are listed for this split")]
    EmptySplit,

    #[error("Cell for member '{member}' is not numeric (got '{value}')")]
    InvalidCell { member: String, value: String },

    #[error("Batch failed validation with {0} errors and cannot be pushed")]
    BatchNotCommittable(usize),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AllocationError {
    fn from(err: serde_json::Error) -> Self {
        AllocationError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AllocationError>;
