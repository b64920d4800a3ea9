use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("expected exactly one comma in '{token}'")]
    MalformedPair { token: String },

    #[error("unable to find date in '{token}'")]
    NoDateInPair { token: String },

    #[error("invalid length: {token} ({len})")]
    InvalidDateLength { token: String, len: usize },

    #[error("invalid date: {token}")]
    InvalidDate { token: String },

    #[error("invalid amount: {token}")]
    InvalidAmount { token: String },

    #[error("invalid rate: {token}")]
    InvalidRate { token: String },

    #[error("invalid date pattern '{token}': {source}")]
    InvalidPattern {
        token: String,
        #[source]
        source: regex::Error,
    },

    #[error("unable to write ledger: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
