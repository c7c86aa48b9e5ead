// error.rs
// Typed error taxonomy for the bookkeeping core. Validation and state
// errors block the operation entirely; audit-write failures are handled
// out-of-band (see state::history) and never surface through here from a
// primary mutation.

use bson::oid::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Referenced entity did not exist at operation time.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Mutation attempted against a closed period, or a chain-breaking
    /// edit such as setting previous_balance on a non-first statement.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Bad input: negative amount, blank required text, out-of-range
    /// share percentage or month.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Advisory: a statement already exists for this partner and period.
    /// Callers may warn the operator and retry with an override.
    #[error("a statement already exists for partner {partner_id} in {month}/{year}")]
    DuplicatePeriod {
        partner_id: ObjectId,
        month: i32,
        year: i32,
    },

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("snapshot encoding error: {0}")]
    Bson(#[from] bson::ser::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
