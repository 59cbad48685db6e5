use crate::store::QuestionQuery;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// Change-list filter on `pub_text`, bounded by UTC calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilter {
    #[default]
    AnyDate,
    Today,
    PastSevenDays,
    ThisMonth,
    ThisYear,
}

impl DateFilter {
    pub const ALL: [DateFilter; 5] = [
        DateFilter::AnyDate,
        DateFilter::Today,
        DateFilter::PastSevenDays,
        DateFilter::ThisMonth,
        DateFilter::ThisYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DateFilter::AnyDate => "Any date",
            DateFilter::Today => "Today",
            DateFilter::PastSevenDays => "Past 7 days",
            DateFilter::ThisMonth => "This month",
            DateFilter::ThisYear => "This year",
        }
    }

    /// Query-string value; `None` for the unfiltered choice.
    pub fn param(self) -> Option<&'static str> {
        match self {
            DateFilter::AnyDate => None,
            DateFilter::Today => Some("today"),
            DateFilter::PastSevenDays => Some("past_7_days"),
            DateFilter::ThisMonth => Some("this_month"),
            DateFilter::ThisYear => Some("this_year"),
        }
    }

    /// Unknown values fall back to no filtering.
    pub fn from_param(value: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|f| f.param().is_some() && f.param() == value)
            .unwrap_or_default()
    }

    /// Half-open `[start, end)` window, or `None` when unfiltered.
    pub fn range(self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = now.date_naive();
        let tomorrow = today.succ_opt()?;
        let (start, end) = match self {
            DateFilter::AnyDate => return None,
            DateFilter::Today => (today, tomorrow),
            DateFilter::PastSevenDays => (today - Duration::days(7), tomorrow),
            DateFilter::ThisMonth => {
                let first = today.with_day(1)?;
                let next = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)?
                };
                (first, next)
            }
            DateFilter::ThisYear => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1)?,
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)?,
            ),
        };
        Some((midnight(start), midnight(end)))
    }

    pub fn apply(self, query: &mut QuestionQuery, now: DateTime<Utc>) {
        if let Some((start, end)) = self.range(now) {
            query.pub_text_gte = Some(start);
            query.pub_text_lt = Some(end);
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[rstest]
    #[case(None, DateFilter::AnyDate)]
    #[case(Some("today"), DateFilter::Today)]
    #[case(Some("past_7_days"), DateFilter::PastSevenDays)]
    #[case(Some("this_month"), DateFilter::ThisMonth)]
    #[case(Some("this_year"), DateFilter::ThisYear)]
    #[case(Some("yesterday"), DateFilter::AnyDate)]
    fn parses_query_values(#[case] value: Option<&str>, #[case] expected: DateFilter) {
        assert_eq!(DateFilter::from_param(value), expected);
    }

    #[test]
    fn today_spans_the_utc_day() {
        let range = DateFilter::Today.range(at(2026, 10, 19, 15, 30)).unwrap();
        assert_eq!(range, (at(2026, 10, 19, 0, 0), at(2026, 10, 20, 0, 0)));
    }

    #[test]
    fn past_seven_days_includes_today() {
        let range = DateFilter::PastSevenDays.range(at(2026, 10, 19, 15, 30)).unwrap();
        assert_eq!(range, (at(2026, 10, 12, 0, 0), at(2026, 10, 20, 0, 0)));
    }

    #[test]
    fn this_month_rolls_over_december() {
        let range = DateFilter::ThisMonth.range(at(2026, 12, 31, 23, 59)).unwrap();
        assert_eq!(range, (at(2026, 12, 1, 0, 0), at(2027, 1, 1, 0, 0)));
    }

    #[test]
    fn this_year_is_calendar_year() {
        let range = DateFilter::ThisYear.range(at(2026, 6, 1, 0, 0)).unwrap();
        assert_eq!(range, (at(2026, 1, 1, 0, 0), at(2027, 1, 1, 0, 0)));
    }

    #[test]
    fn any_date_leaves_query_alone() {
        let mut query = QuestionQuery::default();
        DateFilter::AnyDate.apply(&mut query, Utc::now());
        assert!(query.pub_text_gte.is_none() && query.pub_text_lt.is_none());
    }
}
