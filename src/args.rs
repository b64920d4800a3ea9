//! Reads the command line. A token's role comes from its shape: options start
//! with `--`, events are `date,value` pairs, `£`/`$` marks the loan amount,
//! a trailing `%` the starting rate, and anything else is the start date.

use chrono::NaiveDate;
use log::warn;

use crate::errors::{LedgerError, Result};
use crate::events::{DateMatcher, Event, Payment, RateChange};
use crate::loan::{LoanConfig, Verbosity};

const CURRENCY_SYMBOLS: [char; 2] = ['£', '$'];

/// Two digit years below this land in the 2000s, the rest in the 1900s.
pub const CENTURY_PIVOT: u32 = 69;

/// Parses `YYMMDD` or `YYYYMMDD`.
pub fn parse_date(token: &str) -> Result<NaiveDate> {
    let len = token.chars().count();
    if len != 6 && len != 8 {
        return Err(LedgerError::InvalidDateLength {
            token: token.to_string(),
            len,
        });
    }
    let invalid = || LedgerError::InvalidDate {
        token: token.to_string(),
    };
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let full = if len == 6 {
        let yy: u32 = token[..2].parse().map_err(|_| invalid())?;
        let century = if yy < CENTURY_PIVOT { "20" } else { "19" };
        format!("{}{}", century, token)
    } else {
        token.to_string()
    };
    NaiveDate::parse_from_str(&full, "%Y%m%d").map_err(|_| invalid())
}

/// Parses a decimal amount such as `1250.50` into minor units, truncating
/// anything below a penny.
pub fn parse_money(body: &str, token: &str) -> Result<i64> {
    body.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| (v * 100.) as i64)
        .ok_or_else(|| LedgerError::InvalidAmount {
            token: token.to_string(),
        })
}

pub fn parse_rate(body: &str, token: &str) -> Result<f64> {
    body.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LedgerError::InvalidRate {
            token: token.to_string(),
        })
}

fn strip_currency(value: &str) -> &str {
    value.strip_prefix(CURRENCY_SYMBOLS).unwrap_or(value)
}

/// Parses a `date,value` pair. The date may come first or second; a leading
/// `/` marks a recurring pattern (`/15/,£500` pays on every 15th). A value
/// ending in `%` is a rate change, anything else a payment.
pub fn parse_event(token: &str) -> Result<Event> {
    let parts: Vec<&str> = token.split(',').collect();
    let &[p1, p2] = parts.as_slice() else {
        return Err(LedgerError::MalformedPair {
            token: token.to_string(),
        });
    };

    let (matcher, value) = if let Some(pattern) = p1.strip_prefix('/') {
        let pattern = pattern.strip_suffix('/').unwrap_or(pattern);
        let matcher =
            DateMatcher::pattern(pattern).map_err(|source| LedgerError::InvalidPattern {
                token: token.to_string(),
                source,
            })?;
        (matcher, p2)
    } else if let Ok(date) = parse_date(p1) {
        (DateMatcher::Exact(date), p2)
    } else if let Ok(date) = parse_date(p2) {
        (DateMatcher::Exact(date), p1)
    } else {
        return Err(LedgerError::NoDateInPair {
            token: token.to_string(),
        });
    };

    let event = match value.strip_suffix('%') {
        Some(rate) => Event::RateChange(RateChange {
            matcher,
            rate: parse_rate(rate, token)?,
        }),
        None => Event::Payment(Payment {
            matcher,
            amount: parse_money(strip_currency(value), token)?,
        }),
    };
    Ok(event)
}

fn apply_option(config: &mut LoanConfig, option: &str) {
    match option.strip_prefix("verbosity=") {
        Some(flag) => match Verbosity::from_flag(flag) {
            Some(verbosity) => config.verbosity = verbosity,
            None => warn!("Unknown verbosity '{}', expected d, m or s", flag),
        },
        None => warn!("Unknown option '--{}'", option),
    }
}

/// Builds the run configuration from the arguments (program name excluded).
/// `today` is the start date when none is given.
pub fn parse_args<I, S>(args: I, today: NaiveDate) -> Result<LoanConfig>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut config = LoanConfig::with_defaults(today);

    for arg in args {
        let token = arg.as_ref();
        if let Some(option) = token.strip_prefix("--") {
            apply_option(&mut config, option);
        } else if token.contains(',') {
            match parse_event(token)? {
                Event::Payment(pmt) => config.payments.push(pmt),
                Event::RateChange(rc) => config.rate_changes.push(rc),
            }
        } else if let Some(amount) = token.strip_prefix(CURRENCY_SYMBOLS) {
            config.initial_balance = parse_money(amount, token)?;
        } else if let Some(rate) = token.strip_suffix('%') {
            config.initial_rate = parse_rate(rate, token)?;
        } else {
            config.start_date = parse_date(token)?;
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{parse_args, parse_date, parse_event};
    use crate::errors::LedgerError;
    use crate::events::{DateMatcher, Event};
    use crate::loan::{simulate, Verbosity, DEFAULT_BALANCE, DEFAULT_RATE};
    use chrono::NaiveDate;
    use test_log::test;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2024, 2, 15)
    }

    fn ledger(args: &[&str]) -> String {
        let config = parse_args(args, today()).unwrap();
        let mut out = Vec::new();
        simulate(&config, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("20210101").unwrap(), ymd(2021, 1, 1));
        assert_eq!(parse_date("210315").unwrap(), ymd(2021, 3, 15));
        assert_eq!(parse_date("681231").unwrap(), ymd(2068, 12, 31));
        assert_eq!(parse_date("690101").unwrap(), ymd(1969, 1, 1));

        match parse_date("2021011") {
            Err(LedgerError::InvalidDateLength { token, len }) => {
                assert_eq!(token, "2021011");
                assert_eq!(len, 7);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_date("20210230"),
            Err(LedgerError::InvalidDate { .. })
        ));
        assert!(matches!(
            parse_date("2021-1-1"),
            Err(LedgerError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_defaults() {
        let config = parse_args(Vec::<String>::new(), today()).unwrap();
        assert_eq!(config.initial_balance, DEFAULT_BALANCE);
        assert_eq!(config.initial_rate, DEFAULT_RATE);
        assert_eq!(config.start_date, today());
        assert_eq!(config.verbosity, Verbosity::Monthly);
        assert!(config.payments.is_empty());
        assert!(config.rate_changes.is_empty());
    }

    #[test]
    fn test_loan_parameters_any_order() {
        let config = parse_args(["2.5%", "20210101", "£250000.00"], today()).unwrap();
        assert_eq!(config.initial_balance, 25_000_000);
        assert_eq!(config.initial_rate, 2.5);
        assert_eq!(config.start_date, ymd(2021, 1, 1));

        let config = parse_args(["$1234.567", "210601"], today()).unwrap();
        assert_eq!(config.initial_balance, 123_456);
        assert_eq!(config.start_date, ymd(2021, 6, 1));
    }

    #[test]
    fn test_verbosity_option() {
        let config = parse_args(["--verbosity=d"], today()).unwrap();
        assert_eq!(config.verbosity, Verbosity::Daily);

        // unknown values and options keep the previous setting
        let config = parse_args(["--verbosity=s", "--verbosity=x", "--colour"], today()).unwrap();
        assert_eq!(config.verbosity, Verbosity::Summary);
    }

    #[test]
    fn test_event_date_either_side() {
        let Event::Payment(first) = parse_event("20210201,£500").unwrap() else {
            panic!("expected payment");
        };
        let Event::Payment(second) = parse_event("500,20210201").unwrap() else {
            panic!("expected payment");
        };
        assert_eq!(first.amount, 50_000);
        assert_eq!(second.amount, 50_000);
        for pmt in [first, second] {
            let DateMatcher::Exact(day) = pmt.matcher else {
                panic!("expected exact date");
            };
            assert_eq!(day, ymd(2021, 2, 1));
        }
    }

    #[test]
    fn test_event_rate_change_pattern() {
        for token in ["/(05|11)15,3.00%", "/(05|11)15/,3.00%"] {
            let Event::RateChange(rc) = parse_event(token).unwrap() else {
                panic!("expected rate change for {}", token);
            };
            assert_eq!(rc.rate, 3.0);
            let may = ymd(2030, 5, 15);
            let nov = ymd(2030, 11, 15);
            let dec = ymd(2030, 12, 15);
            assert!(rc.matcher.matches(&may, "20300515"));
            assert!(rc.matcher.matches(&nov, "20301115"));
            assert!(!rc.matcher.matches(&dec, "20301215"));
        }
    }

    #[test]
    fn test_event_errors() {
        match parse_event("abc,def") {
            Err(LedgerError::NoDateInPair { token }) => assert_eq!(token, "abc,def"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_event("20210101,1,2"),
            Err(LedgerError::MalformedPair { .. })
        ));
        assert!(matches!(
            parse_event("20210101,£12x"),
            Err(LedgerError::InvalidAmount { .. })
        ));
        assert!(matches!(
            parse_event("20210101,x%"),
            Err(LedgerError::InvalidRate { .. })
        ));
        match parse_event("/[0-9/,100") {
            Err(err @ LedgerError::InvalidPattern { .. }) => {
                assert!(err.to_string().contains("'/[0-9/,100'"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fatal_errors_name_the_token() {
        let err = parse_args(["£40000", "2021011"], today()).unwrap_err();
        assert_eq!(err.to_string(), "invalid length: 2021011 (7)");

        let err = parse_args(["£4o000"], today()).unwrap_err();
        assert!(err.to_string().contains("£4o000"));

        let err = parse_args(["abc%"], today()).unwrap_err();
        assert!(err.to_string().contains("abc%"));

        let err = parse_args(["/[0-9,100"], today()).unwrap_err();
        assert!(err.to_string().contains("/[0-9,100"));

        let err = parse_args(["payday,£100"], today()).unwrap_err();
        assert_eq!(err.to_string(), "unable to find date in 'payday,£100'");
    }

    #[test]
    fn test_event_order_kept() {
        let config = parse_args(
            ["/01,£100", "20210101,4%", "£1000", "/15,£50", "/01,5%"],
            today(),
        )
        .unwrap();
        let amounts: Vec<i64> = config.payments.iter().map(|p| p.amount).collect();
        let rates: Vec<f64> = config.rate_changes.iter().map(|r| r.rate).collect();
        assert_eq!(amounts, vec![10_000, 5_000]);
        assert_eq!(rates, vec![4.0, 5.0]);
    }

    #[test]
    fn test_summary_scenario() {
        let text = ledger(&[
            "£1000",
            "0%",
            "20210101",
            "20210105,£1000",
            "--verbosity=s",
        ]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "-".repeat(56));
        assert_eq!(
            lines[2],
            "20210105         0.00         0.00      1000.00    0.00%"
        );
    }

    #[test]
    fn test_token_order_does_not_change_ledger() {
        let forward = ledger(&["£2000", "4%", "20210110", "/01,£600", "20210320,6%"]);
        let backward = ledger(&["20210320,6%", "/01,£600", "20210110", "4%", "£2000"]);
        assert_eq!(forward, backward);
        assert!(forward.contains("6.00%"));
    }
}
