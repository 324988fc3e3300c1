use chrono::{Datelike, NaiveDate, Weekday};
use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{BaseDataError, YmdDate};

fn ymd_to_date(ymd: YmdDate) -> Option<NaiveDate> {
    let year = (ymd / 10_000) as i32;
    let month = (ymd / 100) % 100;
    let day = ymd % 100;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn date_to_ymd(date: NaiveDate) -> YmdDate {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

/// A named holiday calendar: contracts reference one by template name,
/// and a template is just a set of `yyyymmdd` dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayTemplate {
    pub holidays: std::collections::BTreeSet<YmdDate>,
}

impl HolidayTemplate {
    pub fn is_holiday(&self, ymd: YmdDate) -> bool {
        self.holidays.contains(&ymd)
    }
}

/// Registry of named [`HolidayTemplate`]s plus the business-day
/// arithmetic (`nextBusinessDate`/`prevBusinessDate`) used by the
/// session ticker's date auto-rollover and trading-date calculation.
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    templates: IndexMap<SmolStr, HolidayTemplate>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_template(&mut self, name: impl Into<SmolStr>, template: HolidayTemplate) {
        self.templates.insert(name.into(), template);
    }

    fn template(&self, name: &str) -> Result<&HolidayTemplate, BaseDataError> {
        self.templates
            .get(name)
            .ok_or_else(|| BaseDataError::UnknownHolidayTemplate(SmolStr::new(name)))
    }

    pub fn is_business_day(&self, template: &str, ymd: YmdDate) -> Result<bool, BaseDataError> {
        let date = ymd_to_date(ymd).ok_or(BaseDataError::InvalidDate(ymd))?;
        let is_weekend = matches!(date.weekday(), Weekday::Sat | Weekday::Sun);
        Ok(!is_weekend && !self.template(template)?.is_holiday(ymd))
    }

    /// The next business day strictly after `ymd`.
    pub fn next_business_day(&self, template: &str, ymd: YmdDate) -> Result<YmdDate, BaseDataError> {
        let mut date = ymd_to_date(ymd).ok_or(BaseDataError::InvalidDate(ymd))?;
        loop {
            date = date.succ_opt().expect("date arithmetic within representable range");
            let candidate = date_to_ymd(date);
            if self.is_business_day(template, candidate)? {
                return Ok(candidate);
            }
        }
    }

    /// The previous business day strictly before `ymd`.
    pub fn prev_business_day(&self, template: &str, ymd: YmdDate) -> Result<YmdDate, BaseDataError> {
        let mut date = ymd_to_date(ymd).ok_or(BaseDataError::InvalidDate(ymd))?;
        loop {
            date = date.pred_opt().expect("date arithmetic within representable range");
            let candidate = date_to_ymd(date);
            if self.is_business_day(template, candidate)? {
                return Ok(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_weekend() {
        let mut cal = HolidayCalendar::new();
        cal.insert_template("CN", HolidayTemplate::default());
        // 2024-01-05 is a Friday.
        assert!(cal.is_business_day("CN", 20240105).unwrap());
        // 2024-01-06/07 weekend, next business day is the Monday.
        assert_eq!(cal.next_business_day("CN", 20240105).unwrap(), 20240108);
    }

    #[test]
    fn skips_named_holiday() {
        let mut cal = HolidayCalendar::new();
        let mut tpl = HolidayTemplate::default();
        tpl.holidays.insert(20240101);
        cal.insert_template("CN", tpl);
        assert!(!cal.is_business_day("CN", 20240101).unwrap());
        assert_eq!(cal.next_business_day("CN", 20231229).unwrap(), 20240102);
    }

    #[test]
    fn unknown_template_errors() {
        let cal = HolidayCalendar::new();
        assert_eq!(
            cal.is_business_day("CN", 20240101).unwrap_err(),
            BaseDataError::UnknownHolidayTemplate(SmolStr::new("CN"))
        );
    }
}
