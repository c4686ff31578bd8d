//! Named lookback windows for selecting a simulation date range.

use crate::error::{Result, SimulationError};
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A date window relative to the end of the data, or a fixed market episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Lookback {
    OneWeek,
    MonthToDate,
    ThreeMonths,
    SixMonths,
    YearToDate,
    OneYear,
    ThreeYears,
    FiveYears,
    Max,
    /// 2020-02-20 to 2020-03-20.
    CovidCrash,
    /// 2022-02-28 to 2022-12-31.
    RateHikes2022,
}

impl Lookback {
    pub const ALL: [Lookback; 11] = [
        Lookback::OneWeek,
        Lookback::MonthToDate,
        Lookback::ThreeMonths,
        Lookback::SixMonths,
        Lookback::YearToDate,
        Lookback::OneYear,
        Lookback::ThreeYears,
        Lookback::FiveYears,
        Lookback::Max,
        Lookback::CovidCrash,
        Lookback::RateHikes2022,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lookback::OneWeek => "1w",
            Lookback::MonthToDate => "mtd",
            Lookback::ThreeMonths => "3m",
            Lookback::SixMonths => "6m",
            Lookback::YearToDate => "ytd",
            Lookback::OneYear => "1y",
            Lookback::ThreeYears => "3y",
            Lookback::FiveYears => "5y",
            Lookback::Max => "max",
            Lookback::CovidCrash => "covid crash",
            Lookback::RateHikes2022 => "2022 rate hikes",
        }
    }

    /// Resolve the window for data spanning `first..=last`.
    ///
    /// Relative windows end on `last`; month arithmetic clamps to the end of
    /// shorter months. Fixed episodes ignore the data span.
    pub fn resolve(&self, first: NaiveDate, last: NaiveDate) -> (NaiveDate, NaiveDate) {
        let months_back = |m: u32| last.checked_sub_months(Months::new(m)).unwrap_or(first);
        let ymd = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or(first);

        match self {
            Lookback::OneWeek => (last - Duration::weeks(1), last),
            Lookback::MonthToDate => (last.with_day(1).unwrap_or(last), last),
            Lookback::ThreeMonths => (months_back(3), last),
            Lookback::SixMonths => (months_back(6), last),
            Lookback::YearToDate => (ymd(last.year(), 1, 1), last),
            Lookback::OneYear => (months_back(12), last),
            Lookback::ThreeYears => (months_back(36), last),
            Lookback::FiveYears => (months_back(60), last),
            Lookback::Max => (first, last),
            Lookback::CovidCrash => (ymd(2020, 2, 20), ymd(2020, 3, 20)),
            Lookback::RateHikes2022 => (ymd(2022, 2, 28), ymd(2022, 12, 31)),
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lookback {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Lookback::ALL
            .into_iter()
            .find(|l| l.as_str() == wanted)
            .ok_or_else(|| {
                SimulationError::InvalidInput(format!(
                    "unknown lookback '{}', expected one of: {}",
                    s,
                    Lookback::ALL.map(|l| l.as_str()).join(", ")
                ))
            })
    }
}

impl TryFrom<String> for Lookback {
    type Error = SimulationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Lookback> for String {
    fn from(value: Lookback) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_relative_windows() {
        let first = date(2015, 6, 1);
        let last = date(2024, 5, 31);

        assert_eq!(Lookback::OneWeek.resolve(first, last), (date(2024, 5, 24), last));
        assert_eq!(Lookback::MonthToDate.resolve(first, last), (date(2024, 5, 1), last));
        assert_eq!(Lookback::ThreeMonths.resolve(first, last), (date(2024, 2, 29), last));
        assert_eq!(Lookback::YearToDate.resolve(first, last), (date(2024, 1, 1), last));
        assert_eq!(Lookback::OneYear.resolve(first, last), (date(2023, 5, 31), last));
        assert_eq!(Lookback::FiveYears.resolve(first, last), (date(2019, 5, 31), last));
        assert_eq!(Lookback::Max.resolve(first, last), (first, last));
    }

    #[test]
    fn test_fixed_episodes() {
        let first = date(2015, 1, 1);
        let last = date(2024, 1, 1);

        assert_eq!(
            Lookback::CovidCrash.resolve(first, last),
            (date(2020, 2, 20), date(2020, 3, 20))
        );
        assert_eq!(
            Lookback::RateHikes2022.resolve(first, last),
            (date(2022, 2, 28), date(2022, 12, 31))
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("1y".parse::<Lookback>().unwrap(), Lookback::OneYear);
        assert_eq!("YTD".parse::<Lookback>().unwrap(), Lookback::YearToDate);
        assert_eq!(
            " covid crash ".parse::<Lookback>().unwrap(),
            Lookback::CovidCrash
        );
        assert!(matches!(
            "2w".parse::<Lookback>(),
            Err(SimulationError::InvalidInput(_))
        ));

        for lookback in Lookback::ALL {
            assert_eq!(lookback.to_string().parse::<Lookback>().unwrap(), lookback);
        }
    }
}
