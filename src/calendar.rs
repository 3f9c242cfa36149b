//! Monthly planning horizon and the activity calculator.
//!
//! A class consumes its duration only in non-excluded (vacation-free) months.
//! The calculator never fails on a truncated horizon: it returns whatever
//! months fit, and callers decide whether a short result is acceptable.

use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeSet;

use crate::data::{HorizonInput, Period};
use crate::error::CalendarError;

/// Months during which a class starting at `start` is actually running.
///
/// Walks forward from `start`, skipping excluded months, until `duration`
/// months were emitted or `horizon_len` is reached. The result may be
/// shorter than `duration`.
pub fn active_periods(
    start: Period,
    duration: u32,
    excluded: &BTreeSet<Period>,
    horizon_len: u32,
) -> Vec<Period> {
    (start..horizon_len)
        .filter(|m| !excluded.contains(m))
        .take(duration as usize)
        .collect()
}

/// Month abbreviations used in period labels.
const MONTH_NAMES: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// One `"Jan/26"` style label per calendar month from `start` to `end`, inclusive.
pub fn month_labels(start: NaiveDate, end: NaiveDate) -> Result<Vec<String>, CalendarError> {
    let first = first_of_month(start);
    let last = first_of_month(end);
    if last < first {
        return Err(CalendarError::EndBeforeStart {
            start: start.to_string(),
            end: end.to_string(),
        });
    }

    let mut labels = Vec::new();
    let mut current = first;
    while current <= last {
        labels.push(month_label(current));
        current = match current.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(labels)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn month_label(date: NaiveDate) -> String {
    format!("{}/{:02}", MONTH_NAMES[date.month0() as usize], date.year().rem_euclid(100))
}

/// The discrete monthly horizon with its vacation months.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Horizon {
    labels: Vec<String>,
    excluded: BTreeSet<Period>,
}

impl Horizon {
    pub fn new(labels: Vec<String>, excluded: impl IntoIterator<Item = Period>) -> Result<Self, CalendarError> {
        if labels.is_empty() {
            return Err(CalendarError::EmptyHorizon);
        }
        let excluded: BTreeSet<Period> = excluded.into_iter().collect();
        if let Some(&period) = excluded.iter().find(|&&p| p as usize >= labels.len()) {
            return Err(CalendarError::ExcludedOutOfRange {
                period,
                len: labels.len(),
            });
        }
        Ok(Self { labels, excluded })
    }

    /// Horizon whose vacation months are given by label (e.g. `"Jul/26"`).
    pub fn from_labels(labels: Vec<String>, excluded_labels: &[String]) -> Result<Self, CalendarError> {
        let mut excluded = Vec::with_capacity(excluded_labels.len());
        for label in excluded_labels {
            match labels.iter().position(|l| l == label) {
                Some(idx) => excluded.push(idx as Period),
                None => return Err(CalendarError::UnknownLabel(label.clone())),
            }
        }
        Self::new(labels, excluded)
    }

    /// Horizon covering every month from `start` to `end`.
    pub fn between(start: NaiveDate, end: NaiveDate, excluded_labels: &[String]) -> Result<Self, CalendarError> {
        Self::from_labels(month_labels(start, end)?, excluded_labels)
    }

    pub fn len(&self) -> u32 {
        self.labels.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn label(&self, period: Period) -> Option<&str> {
        self.labels.get(period as usize).map(String::as_str)
    }

    pub fn excluded(&self) -> &BTreeSet<Period> {
        &self.excluded
    }

    pub fn is_excluded(&self, period: Period) -> bool {
        self.excluded.contains(&period)
    }

    pub fn active_periods(&self, start: Period, duration: u32) -> Vec<Period> {
        active_periods(start, duration, &self.excluded, self.len())
    }

    /// Index of the month containing `date`.
    pub fn period_of(&self, date: NaiveDate) -> Result<Period, CalendarError> {
        let label = month_label(date);
        self.labels
            .iter()
            .position(|l| *l == label)
            .map(|idx| idx as Period)
            .ok_or_else(|| CalendarError::DateOutsideHorizon(date.to_string()))
    }

    /// Earliest and latest start in `[first, last]` that completes all
    /// `duration` active months no later than `last`.
    pub fn start_window(&self, first: Period, last: Period, duration: u32) -> Result<(Period, Period), CalendarError> {
        let upper = (last + 1).min(self.len());
        let fits = |start: &Period| {
            let active = self.active_periods(*start, duration);
            active.len() == duration as usize && active.last().is_none_or(|&end| end <= last)
        };
        let earliest = (first..upper).find(fits);
        let latest = (first..upper).rev().find(fits);
        match (earliest, latest) {
            (Some(earliest), Some(latest)) => Ok((earliest, latest)),
            _ => Err(CalendarError::EmptyStartWindow { first, last, duration }),
        }
    }
}

impl TryFrom<&HorizonInput> for Horizon {
    type Error = CalendarError;

    fn try_from(input: &HorizonInput) -> Result<Self, Self::Error> {
        Horizon::new(input.labels.clone(), input.excluded.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("M{i}")).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn plain_window_without_vacations() {
        let none = BTreeSet::new();
        assert_eq!(active_periods(0, 2, &none, 3), vec![0, 1]);
        assert_eq!(active_periods(1, 2, &none, 3), vec![1, 2]);
    }

    #[test]
    fn vacation_shifts_the_end() {
        let excluded: BTreeSet<Period> = [2].into();
        assert_eq!(active_periods(0, 4, &excluded, 10), vec![0, 1, 3, 4]);
        let excluded: BTreeSet<Period> = [1, 2].into();
        assert_eq!(active_periods(0, 3, &excluded, 10), vec![0, 3, 4]);
    }

    #[test]
    fn starting_on_a_vacation_month_skips_it() {
        let excluded: BTreeSet<Period> = [0].into();
        assert_eq!(active_periods(0, 2, &excluded, 5), vec![1, 2]);
    }

    #[test]
    fn truncated_by_horizon() {
        let excluded: BTreeSet<Period> = [4].into();
        let active = active_periods(3, 4, &excluded, 6);
        assert_eq!(active, vec![3, 5]);
        assert!(active.len() < 4);
        assert!(active_periods(7, 2, &excluded, 6).is_empty());
    }

    #[test]
    fn zero_duration_is_empty() {
        assert!(active_periods(0, 0, &BTreeSet::new(), 5).is_empty());
    }

    #[test]
    fn requery_is_stable() {
        let horizon = Horizon::new(labels(12), [6, 11]).unwrap();
        for start in 0..12 {
            for duration in 0..8 {
                let first = horizon.active_periods(start, duration);
                assert_eq!(first, horizon.active_periods(start, duration));
                assert!(first.len() <= duration as usize);
                let available = (start..12).filter(|m| !horizon.is_excluded(*m)).count();
                assert_eq!(first.len() == duration as usize, available >= duration as usize);
            }
        }
    }

    #[test]
    fn horizon_rejects_bad_input() {
        assert_eq!(Horizon::new(vec![], Vec::new()), Err(CalendarError::EmptyHorizon));
        assert_eq!(
            Horizon::new(labels(3), [3]),
            Err(CalendarError::ExcludedOutOfRange { period: 3, len: 3 })
        );
        assert_eq!(
            Horizon::from_labels(labels(3), &["Dez/26".to_string()]),
            Err(CalendarError::UnknownLabel("Dez/26".to_string()))
        );
    }

    #[test]
    fn month_labels_span_years() {
        let labels = month_labels(date(2026, 11, 15), date(2027, 2, 1)).unwrap();
        assert_eq!(labels, vec!["Nov/26", "Dez/26", "Jan/27", "Fev/27"]);
        assert_eq!(month_labels(date(2026, 3, 31), date(2026, 3, 1)).unwrap(), vec!["Mar/26"]);
        assert!(month_labels(date(2026, 3, 1), date(2026, 2, 28)).is_err());
    }

    #[test]
    fn dates_map_to_periods() {
        let vacations = ["Jul/26".to_string(), "Dez/26".to_string()];
        let horizon = Horizon::between(date(2026, 1, 1), date(2026, 12, 31), &vacations).unwrap();
        assert_eq!(horizon.len(), 12);
        assert!(horizon.is_excluded(6));
        assert!(horizon.is_excluded(11));
        assert_eq!(horizon.label(1), Some("Fev/26"));
        assert_eq!(horizon.label(7), Some("Ago/26"));
        assert_eq!(horizon.period_of(date(2026, 3, 17)).unwrap(), 2);
        assert_eq!(horizon.label(11), Some("Dez/26"));
        assert!(horizon.period_of(date(2027, 1, 1)).is_err());
    }

    #[test]
    fn labels_stay_two_digit_years() {
        assert_eq!(month_label(date(2005, 4, 2)), "Abr/05");
        assert_eq!(month_label(date(2030, 10, 30)), "Out/30");
    }

    #[test]
    fn start_window_requires_full_duration_before_deadline() {
        // months 0..10, vacation at 6
        let horizon = Horizon::new(labels(10), [6]).unwrap();
        // 3-month course ending by month 7: a start at 4 runs 4,5,7 and still fits
        assert_eq!(horizon.start_window(0, 7, 3).unwrap(), (0, 4));
        assert_eq!(horizon.start_window(2, 5, 3).unwrap(), (2, 3));
        assert_eq!(
            horizon.start_window(8, 9, 3),
            Err(CalendarError::EmptyStartWindow { first: 8, last: 9, duration: 3 })
        );
    }
}
