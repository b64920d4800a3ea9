use chrono::{Datelike, Days, NaiveDate};
use log::{debug, trace};
use std::{fmt, io::Write};

use crate::errors::Result;
use crate::events::{Payment, RateChange};

pub const DEFAULT_BALANCE: i64 = 40_000_000; // £400,000.00 in pence
pub const DEFAULT_RATE: f64 = 3.0;
pub const HORIZON_DAYS: u64 = 365 * 50;
const SEPARATOR_WIDTH: usize = 56;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verbosity {
    Daily,
    #[default]
    Monthly,
    Summary,
}

impl Verbosity {
    /// Maps the `--verbosity=` flag values `d`, `m` and `s`.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "d" => Some(Verbosity::Daily),
            "m" => Some(Verbosity::Monthly),
            "s" => Some(Verbosity::Summary),
            _ => None,
        }
    }
}

/// Everything a run needs, fixed once the arguments have been read.
#[derive(Clone, Debug)]
pub struct LoanConfig {
    pub initial_balance: i64, // minor units
    pub initial_rate: f64,    // percent per annum, 3.0 is 3%
    pub start_date: NaiveDate,
    pub verbosity: Verbosity,
    pub payments: Vec<Payment>,
    pub rate_changes: Vec<RateChange>,
}

impl LoanConfig {
    pub fn with_defaults(today: NaiveDate) -> Self {
        Self {
            initial_balance: DEFAULT_BALANCE,
            initial_rate: DEFAULT_RATE,
            start_date: today,
            verbosity: Verbosity::default(),
            payments: Vec::new(),
            rate_changes: Vec::new(),
        }
    }
}

/// One printed line of the ledger. Money is in minor units.
#[derive(PartialEq, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub balance: f64,
    pub interest: f64,
    pub payments: i64,
    pub rate: f64,
}

impl fmt::Display for LedgerRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8} {:>12.2} {:>12.2} {:>12.2} {:>7.2}%",
            self.date.format("%Y%m%d"),
            self.balance / 100.,
            self.interest / 100.,
            self.payments as f64 / 100.,
            self.rate
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Outcome {
    PaidOff,
    HorizonExceeded,
}

#[derive(PartialEq, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    pub outcome: Outcome,
    pub days: u64,
    pub last_row: LedgerRow,
}

/// Mutable state of a single run.
#[derive(Debug)]
pub struct SimulationState {
    pub balance: f64, // minor units, may carry fractional interest
    pub date: NaiveDate,
    pub rate: f64,
    pub interest: f64, // accrued since the last printed row
    pub paid: i64,     // paid since the last printed row
}

impl SimulationState {
    pub fn new(config: &LoanConfig) -> Self {
        Self {
            balance: config.initial_balance as f64,
            date: config.start_date,
            rate: config.initial_rate,
            interest: 0.,
            paid: 0,
        }
    }

    /// Applies rate changes, daily interest and payments for `self.date`.
    pub fn accrue_day(&mut self, config: &LoanConfig) {
        let rendered = self.date.format("%Y%m%d").to_string();

        // later entries override earlier ones on the same day
        for rc in &config.rate_changes {
            if rc.matcher.matches(&self.date, &rendered) {
                debug!("{} rate change to {:.2}%", rendered, rc.rate);
                self.rate = rc.rate;
            }
        }

        let delta = self.balance * self.rate / 36500.;
        self.balance += delta;
        self.interest += delta;

        for pmt in &config.payments {
            if pmt.matcher.matches(&self.date, &rendered) {
                debug!("{} payment of {}", rendered, pmt.amount);
                self.balance -= pmt.amount as f64;
                self.paid += pmt.amount;
            }
        }
        trace!(
            "{} rate {}, interest {}, balance {}",
            rendered,
            self.rate,
            delta,
            self.balance
        );
    }

    /// Snapshot for printing; clears the running interest and payment totals.
    pub fn take_row(&mut self) -> LedgerRow {
        let row = self.peek_row();
        self.interest = 0.;
        self.paid = 0;
        row
    }

    pub fn peek_row(&self) -> LedgerRow {
        LedgerRow {
            date: self.date,
            balance: self.balance,
            interest: self.interest,
            payments: self.paid,
            rate: self.rate,
        }
    }
}

/// Whether `date` gets a ledger row. In monthly mode the row lands on the
/// anchor day, or on the last day of a month too short to have it.
pub fn is_report_day(verbosity: Verbosity, date: &NaiveDate, anchor_day: u32) -> bool {
    match verbosity {
        Verbosity::Daily => true,
        Verbosity::Summary => false,
        Verbosity::Monthly => {
            date.day() == anchor_day || (date.day() < anchor_day && is_month_end(date))
        }
    }
}

fn is_month_end(date: &NaiveDate) -> bool {
    match date.succ_opt() {
        Some(next) => next.month() != date.month(),
        None => true,
    }
}

/// Column titles, aligned with the `LedgerRow` layout.
pub fn header() -> String {
    format!(
        "{:>8} {:>12} {:>12} {:>12} {:>8}",
        "Date", "Balance", "Interest", "Payments", "Rate"
    )
}

fn separator() -> String {
    "-".repeat(SEPARATOR_WIDTH)
}

/// Runs the loan day by day from the start date, writing the ledger to `out`,
/// until the balance is cleared or fifty years have passed.
pub fn simulate<W: Write>(config: &LoanConfig, out: &mut W) -> Result<Summary> {
    let mut state = SimulationState::new(config);
    let anchor_day = config.start_date.day();
    let horizon = config
        .start_date
        .checked_add_days(Days::new(HORIZON_DAYS))
        .unwrap_or(NaiveDate::MAX);
    let mut outcome = Outcome::PaidOff;
    let mut days = 0;

    writeln!(out, "{}", header())?;
    writeln!(out, "{}", separator())?;

    while state.balance > 0. {
        let next = state.date.succ_opt();
        if let Some(next) = next {
            state.date = next;
        }
        // the day past the horizon is shown but never accrued
        if next.map_or(true, |d| d > horizon) {
            writeln!(out, "50 year limit reached")?;
            outcome = Outcome::HorizonExceeded;
            break;
        }
        days += 1;

        state.accrue_day(config);

        if is_report_day(config.verbosity, &state.date, anchor_day) {
            writeln!(out, "{}", state.take_row())?;
        }
    }

    if config.verbosity != Verbosity::Summary {
        writeln!(out, "{}", separator())?;
    }
    let last_row = state.peek_row();
    writeln!(out, "{}", last_row)?;

    Ok(Summary {
        outcome,
        days,
        last_row,
    })
}
