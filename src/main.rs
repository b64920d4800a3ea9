use chrono::Local;
use loan_ledger::{parse_args, simulate, Outcome};
use log::{error, info};
use simple_logger::SimpleLogger;
use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .without_timestamps()
        .init()
    {
        eprintln!("unable to start logger: {}", e);
    }

    let today = Local::now().date_naive();
    let config = match parse_args(std::env::args().skip(1), today) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut out = std::io::stdout().lock();
    match simulate(&config, &mut out) {
        Ok(summary) => {
            match summary.outcome {
                Outcome::PaidOff => info!(
                    "paid off on {} after {} days",
                    summary.last_row.date, summary.days
                ),
                Outcome::HorizonExceeded => info!(
                    "balance outstanding after {} days",
                    summary.days
                ),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

// verifies that types can implement the gated traits below
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<loan_ledger::LedgerRow>();
    is_normal::<loan_ledger::LoanConfig>();
    is_normal::<loan_ledger::LedgerError>();
}
