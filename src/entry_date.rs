//! Entry date resolution.
//!
//! Statement lines carry their entry date as month and day only. Once the
//! statement date is known, [`adjust_entry_dates`] turns every month-day into
//! a full date using an [`EntryDateResolver`] policy.

use crate::error::{Error, Result};
use crate::types::{EntryDate, MonthDay, TransactionGroup};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Policy choosing the year of a month-day entry date.
pub trait EntryDateResolver {
    fn resolve(&self, month_day: MonthDay, reference: NaiveDate) -> Result<NaiveDate>;
}

impl<F> EntryDateResolver for F
where
    F: Fn(MonthDay, NaiveDate) -> Result<NaiveDate>,
{
    fn resolve(&self, month_day: MonthDay, reference: NaiveDate) -> Result<NaiveDate> {
        self(month_day, reference)
    }
}

/// Picks the candidate closest to the reference date among the reference
/// year, the year before and the year after. Ties keep the earlier candidate
/// in that order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestDelta;

impl EntryDateResolver for ShortestDelta {
    fn resolve(&self, month_day: MonthDay, reference: NaiveDate) -> Result<NaiveDate> {
        let year = reference.year();
        let mut best: Option<(NaiveDate, i64)> = None;
        for candidate in [year, year - 1, year + 1].into_iter().filter_map(|y| month_day.with_year(y)) {
            let delta = (candidate - reference).num_days().abs();
            if best.map_or(true, |(_, shortest)| delta < shortest) {
                best = Some((candidate, delta));
            }
        }
        best.map(|(date, _)| date).ok_or_else(|| Error::UnresolvableEntryDate {
            month_day: month_day.to_string(),
            reference: reference.to_string(),
        })
    }
}

/// Resolve the entry dates of `groups` against `statement_date`.
///
/// The input is left untouched. Entries without an entry date, or with one
/// already resolved, are copied as they are.
pub fn adjust_entry_dates(
    groups: &[TransactionGroup],
    statement_date: NaiveDate,
    resolver: &dyn EntryDateResolver,
) -> Result<Vec<TransactionGroup>> {
    let adjusted = groups
        .iter()
        .map(|group| -> Result<TransactionGroup> {
            let mut entry = group.entry().clone();
            if let Some(EntryDate::MonthDay(month_day)) = entry.entry_date {
                entry.entry_date = Some(EntryDate::Date(resolver.resolve(month_day, statement_date)?));
            }
            Ok(TransactionGroup::new(entry, group.narrative().cloned()))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(count = adjusted.len(), %statement_date, "entry dates adjusted");
    Ok(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement_line::decode_content;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case(5, 12, date(2016, 3, 31), date(2016, 5, 12))]
    #[case(1, 12, date(2015, 10, 31), date(2016, 1, 12))]
    #[case(11, 12, date(2016, 3, 31), date(2015, 11, 12))]
    #[case(12, 31, date(2017, 1, 1), date(2016, 12, 31))]
    fn test_shortest_delta(
        #[case] month: u32,
        #[case] day: u32,
        #[case] reference: NaiveDate,
        #[case] expected: NaiveDate,
    ) {
        let month_day = MonthDay::new(month, day).unwrap();
        assert_eq!(ShortestDelta.resolve(month_day, reference).unwrap(), expected);
    }

    #[test]
    fn test_leap_day_uses_nearby_leap_year() {
        let month_day = MonthDay::new(2, 29).unwrap();
        assert_eq!(ShortestDelta.resolve(month_day, date(2023, 12, 1)).unwrap(), date(2024, 2, 29));
    }

    #[test]
    fn test_leap_day_without_candidate() {
        let month_day = MonthDay::new(2, 29).unwrap();
        let err = ShortestDelta.resolve(month_day, date(2022, 6, 1)).unwrap_err();
        assert!(matches!(err, Error::UnresolvableEntryDate { .. }), "{err}");
    }

    #[test]
    fn test_adjust_leaves_input_unchanged() {
        let groups = vec![
            TransactionGroup::new(decode_content("1603310512D5,NTRFA").unwrap(), None),
            TransactionGroup::new(decode_content("160331D5,NTRFB").unwrap(), None),
        ];
        let original = groups.clone();

        let adjusted = adjust_entry_dates(&groups, date(2016, 3, 31), &ShortestDelta).unwrap();

        assert_eq!(groups, original);
        assert_eq!(adjusted[0].entry().entry_date, Some(EntryDate::Date(date(2016, 5, 12))));
        assert_eq!(adjusted[1].entry().entry_date, None);
    }

    #[test]
    fn test_closure_resolver() {
        let groups = vec![TransactionGroup::new(decode_content("1603310512D5,NTRFA").unwrap(), None)];
        let same_year = |md: MonthDay, reference: NaiveDate| -> Result<NaiveDate> {
            Ok(md.with_year(reference.year()).unwrap())
        };
        let adjusted = adjust_entry_dates(&groups, date(2020, 1, 1), &same_year).unwrap();
        assert_eq!(adjusted[0].entry().entry_date.and_then(|d| d.date()), Some(date(2020, 5, 12)));
    }
}
