use chrono::NaiveDate;
use regex::Regex;

/// Decides which simulated days an event fires on.
#[derive(Clone, Debug)]
pub enum DateMatcher {
    /// a single calendar day
    Exact(NaiveDate),
    /// a pattern anchored to the end of the `YYYYMMDD` rendering of a day
    Pattern(Regex),
}

impl DateMatcher {
    /// Compiles a recurring pattern. The whole pattern must end at the last
    /// digit of the rendered date, so `15` matches every 15th and `(05|11)15`
    /// every 15th of May and November.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("(?:{})$", pattern)).map(DateMatcher::Pattern)
    }

    /// `rendered` must be `date` formatted as `YYYYMMDD`.
    pub fn matches(&self, date: &NaiveDate, rendered: &str) -> bool {
        match self {
            DateMatcher::Exact(day) => day == date,
            DateMatcher::Pattern(re) => re.is_match(rendered),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Payment {
    pub matcher: DateMatcher,
    pub amount: i64, // minor units, positive reduces the balance
}

#[derive(Clone, Debug)]
pub struct RateChange {
    pub matcher: DateMatcher,
    pub rate: f64, // percent per annum
}

/// One `date,value` pair from the command line.
#[derive(Clone, Debug)]
pub enum Event {
    Payment(Payment),
    RateChange(RateChange),
}
