use std::fmt::{self, Debug, Display};

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::misc::{BetweenDate, parse_date};

/// A record that list pages can search.
pub trait Searchable {
    type Field: Copy + Eq + Debug + 'static;

    /// Fields the quick search looks into.
    const QUICK_FIELDS: &'static [Self::Field];

    fn text(&self, field: Self::Field) -> &str;

    /// The date used by date range conditions, if the record has one.
    fn date(&self) -> Option<NaiveDate> {
        None
    }
}

/// Quick search, per-field substring conditions and a date range,
/// combined with AND. Empty inputs impose no condition.
#[derive(Debug, Clone)]
pub struct Filter<R: Searchable> {
    quick: String,
    fields: Vec<(R::Field, String)>,
    dates: BetweenDate,
}

impl<R: Searchable> Default for Filter<R> {
    fn default() -> Self {
        Filter {
            quick: String::new(),
            fields: Vec::new(),
            dates: BetweenDate::Always,
        }
    }
}

impl<R: Searchable> Filter<R> {
    pub fn new() -> Filter<R> {
        Filter::default()
    }

    pub fn set_quick(&mut self, text: &str) {
        self.quick = text.trim().to_lowercase();
    }

    /// Sets the substring condition on `field`; blank text removes it.
    pub fn set_field(&mut self, field: R::Field, text: &str) {
        let text = text.trim().to_lowercase();
        self.fields.retain(|(f, _)| *f != field);
        if !text.is_empty() {
            self.fields.push((field, text));
        }
    }

    /// Sets the inclusive lower date bound from `YYYY-MM-DD` text.
    pub fn set_date_from(&mut self, input: &str) -> Result<()> {
        let from = parse_date(input)?;
        self.dates = BetweenDate::new(from, self.dates.to());
        Ok(())
    }

    /// Sets the inclusive upper date bound from `YYYY-MM-DD` text.
    pub fn set_date_to(&mut self, input: &str) -> Result<()> {
        let to = parse_date(input)?;
        self.dates = BetweenDate::new(self.dates.from(), to);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        !self.quick.is_empty() || !self.fields.is_empty() || self.dates != BetweenDate::Always
    }

    pub fn clear(&mut self) {
        *self = Filter::default();
    }

    pub fn matches(&self, r: &R) -> bool {
        let quick = self.quick.is_empty()
            || R::QUICK_FIELDS
                .iter()
                .any(|&f| r.text(f).to_lowercase().contains(&self.quick));

        let fields = self
            .fields
            .iter()
            .all(|(f, needle)| r.text(*f).to_lowercase().contains(needle));

        let dates = match self.dates {
            BetweenDate::Always => true,
            range => r.date().is_some_and(|d| range.check(d)),
        };

        quick && fields && dates
    }

    /// The matching records, in their original order.
    pub fn apply<'a>(&self, records: &'a [R]) -> Vec<&'a R> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Page sizes offered by list pages.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

/// The first page of a filtered list.
#[derive(Debug, Serialize)]
pub struct Page<'a, R> {
    pub rows: Vec<&'a R>,
    pub total: usize,
}

impl<'a, R> Page<'a, R> {
    pub fn first(mut rows: Vec<&'a R>, per_page: usize) -> Page<'a, R> {
        let total = rows.len();
        rows.truncate(per_page);
        Page { rows, total }
    }

    pub fn shown(&self) -> usize {
        self.rows.len()
    }
}

impl<R> Display for Page<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let start = if self.total == 0 { 0 } else { 1 };
        write!(
            f,
            "Showing {} to {} of {} entries",
            start,
            self.shown(),
            self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, PartialEq)]
    struct Doc {
        no: &'static str,
        inv: &'static str,
        date: NaiveDate,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum DocField {
        No,
        Inv,
    }

    impl Searchable for Doc {
        type Field = DocField;

        const QUICK_FIELDS: &'static [DocField] = &[DocField::No, DocField::Inv];

        fn text(&self, field: DocField) -> &str {
            match field {
                DocField::No => self.no,
                DocField::Inv => self.inv,
            }
        }

        fn date(&self) -> Option<NaiveDate> {
            Some(self.date)
        }
    }

    fn docs() -> Vec<Doc> {
        vec![
            Doc {
                no: "GRN001",
                inv: "INV1",
                date: NaiveDate::from_ymd_opt(2024, 12, 15).unwrap(),
            },
            Doc {
                no: "GRN002",
                inv: "INV2",
                date: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            },
        ]
    }

    #[test]
    fn conditions_are_conjunctive() {
        let docs = docs();
        let mut f = Filter::new();
        f.set_field(DocField::No, "GRN001");
        assert_eq!(f.apply(&docs), vec![&docs[0]]);

        f.set_date_from("2024-12-16").unwrap();
        assert!(f.apply(&docs).is_empty());
    }

    #[test]
    fn empty_filter_and_clear_keep_everything() {
        let docs = docs();
        let mut f = Filter::new();
        assert!(!f.is_active());
        assert_eq!(f.apply(&docs), docs.iter().collect::<Vec<_>>());

        f.set_quick("inv2");
        f.set_field(DocField::Inv, "2");
        f.set_date_to("2024-12-31").unwrap();
        assert!(f.is_active());
        assert_eq!(f.apply(&docs), vec![&docs[1]]);

        f.clear();
        assert!(!f.is_active());
        assert_eq!(f.apply(&docs), docs.iter().collect::<Vec<_>>());
    }

    #[test]
    fn quick_search_is_case_insensitive_over_quick_fields() {
        let docs = docs();
        let mut f = Filter::new();
        f.set_quick("grn00");
        assert_eq!(f.apply(&docs).len(), 2);
        f.set_quick("INV1");
        assert_eq!(f.apply(&docs), vec![&docs[0]]);
    }

    #[test]
    fn date_bounds_are_inclusive_and_clearable() {
        let docs = docs();
        let mut f = Filter::new();
        f.set_date_from("2024-12-15").unwrap();
        f.set_date_to("2024-12-15").unwrap();
        assert_eq!(f.apply(&docs), vec![&docs[0]]);

        f.set_date_from("").unwrap();
        f.set_date_to("").unwrap();
        assert!(!f.is_active());
        assert!(f.set_date_from("15/12/2024").is_err());
    }

    #[test]
    fn blank_field_text_removes_condition() {
        let docs = docs();
        let mut f = Filter::new();
        f.set_field(DocField::No, "nothing-like-this");
        assert!(f.apply(&docs).is_empty());
        f.set_field(DocField::No, "  ");
        assert_eq!(f.apply(&docs).len(), 2);
    }

    #[test]
    fn first_page_summary() {
        let nums: Vec<u32> = (1..=15).collect();
        let page = Page::first(nums.iter().collect(), 10);
        assert_eq!(page.shown(), 10);
        assert_eq!(page.to_string(), "Showing 1 to 10 of 15 entries");

        let page = Page::first(nums.iter().take(3).collect(), 25);
        assert_eq!(page.to_string(), "Showing 1 to 3 of 3 entries");

        let page: Page<u32> = Page::first(Vec::new(), 10);
        assert_eq!(page.to_string(), "Showing 0 to 0 of 0 entries");
    }
}
