pub mod args;
pub mod errors;
pub mod events;
pub mod loan;

pub use args::parse_args;
pub use errors::{LedgerError, Result};
pub use events::{DateMatcher, Event, Payment, RateChange};
pub use loan::{simulate, LedgerRow, LoanConfig, Outcome, Summary, Verbosity};
