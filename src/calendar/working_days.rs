use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use hourglass_rs::SafeTimeProvider;
use tracing::{error, info};

use crate::calendar::cache::HolidayCache;
use crate::calendar::holidays::HolidaySource;
use crate::errors::{DirectDebitError, Result};

/// longest run of consecutive non-working days tolerated before giving up
const MAX_NON_WORKING_RUN: u32 = 366;

/// working-day arithmetic over weekends and cached holidays
///
/// Every public operation first checks the cache's refresh sentinel and, when it has
/// expired, fetches holidays from the source before doing any arithmetic. A failed
/// fetch fails the operation.
pub struct Calendar {
    cache: Arc<HolidayCache>,
    source: Box<dyn HolidaySource + Send + Sync>,
}

impl Calendar {
    pub fn new(cache: Arc<HolidayCache>, source: Box<dyn HolidaySource + Send + Sync>) -> Self {
        Self { cache, source }
    }

    pub fn cache(&self) -> &Arc<HolidayCache> {
        &self.cache
    }

    /// refresh the holiday cache when its sentinel has expired
    ///
    /// Returns the number of holidays loaded, or `None` when the cache was fresh.
    pub fn refresh_if_stale(&self, time_provider: &SafeTimeProvider) -> Result<Option<usize>> {
        let now = time_provider.now();
        if !self.cache.should_refresh(now) {
            return Ok(None);
        }

        info!("refreshing holidays cache via API");
        let holidays = self.source.fetch_holidays().map_err(|err| {
            error!(error = %err, "error in refreshing holidays cache via API");
            err
        })?;

        let count = holidays.len();
        self.cache.update(holidays, now);
        Ok(Some(count))
    }

    /// saturday or sunday
    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, date: NaiveDate, time_provider: &SafeTimeProvider) -> Result<bool> {
        self.refresh_if_stale(time_provider)?;
        Ok(self.cache.is_holiday(date, time_provider.now()))
    }

    pub fn is_working_day(&self, date: NaiveDate, time_provider: &SafeTimeProvider) -> Result<bool> {
        self.refresh_if_stale(time_provider)?;
        Ok(self.working_day(date, time_provider))
    }

    /// advance `n` working days; `n == 0` returns `date` untouched even on a non-working day
    pub fn add_working_days(
        &self,
        date: NaiveDate,
        n: u32,
        time_provider: &SafeTimeProvider,
    ) -> Result<NaiveDate> {
        self.refresh_if_stale(time_provider)?;
        self.step_working_days(date, n, Direction::Forward, time_provider)
    }

    /// step back `n` working days; `n == 0` returns `date` untouched
    pub fn sub_working_days(
        &self,
        date: NaiveDate,
        n: u32,
        time_provider: &SafeTimeProvider,
    ) -> Result<NaiveDate> {
        self.refresh_if_stale(time_provider)?;
        self.step_working_days(date, n, Direction::Backward, time_provider)
    }

    /// day `day_of_month` of this month, or of next month once it has passed,
    /// rolled forward to the first working day on or after it
    ///
    /// A day beyond the end of the month overflows into the next month, so day 31
    /// of a 30-day month resolves to the 1st of the month after.
    pub fn next_working_day_on_or_after_x(
        &self,
        date: NaiveDate,
        day_of_month: u32,
        time_provider: &SafeTimeProvider,
    ) -> Result<NaiveDate> {
        if !(1..=31).contains(&day_of_month) {
            return Err(DirectDebitError::InvalidDate {
                message: format!("day of month must be between 1 and 31, got {}", day_of_month),
            });
        }

        self.refresh_if_stale(time_provider)?;

        let month_start = first_of_month(date)?;
        let month_start = if date.day() > day_of_month {
            next_month(month_start)?
        } else {
            month_start
        };

        let mut candidate = month_start
            .checked_add_days(Days::new(u64::from(day_of_month - 1)))
            .ok_or_else(|| out_of_range(month_start))?;

        let mut skipped = 0;
        while !self.working_day(candidate, time_provider) {
            candidate = step(candidate, Direction::Forward)?;
            skipped += 1;
            if skipped > MAX_NON_WORKING_RUN {
                return Err(no_working_day(date));
            }
        }
        Ok(candidate)
    }

    /// final day of `date`'s month, stepped back past holidays
    ///
    /// Only holidays are skipped here: a month ending on a weekend with no holiday
    /// resolves to that weekend day.
    pub fn last_working_day_of_month(
        &self,
        date: NaiveDate,
        time_provider: &SafeTimeProvider,
    ) -> Result<NaiveDate> {
        self.refresh_if_stale(time_provider)?;

        let month_start = first_of_month(date)?;
        let mut candidate = next_month(month_start)?
            .pred_opt()
            .ok_or_else(|| out_of_range(month_start))?;

        let now = time_provider.now();
        while self.cache.is_holiday(candidate, now) {
            candidate = step(candidate, Direction::Backward)?;
            if candidate.month() != date.month() {
                return Err(no_working_day(date));
            }
        }
        Ok(candidate)
    }

    fn working_day(&self, date: NaiveDate, time_provider: &SafeTimeProvider) -> bool {
        !self.cache.is_holiday(date, time_provider.now()) && !Self::is_weekend(date)
    }

    fn step_working_days(
        &self,
        mut date: NaiveDate,
        n: u32,
        direction: Direction,
        time_provider: &SafeTimeProvider,
    ) -> Result<NaiveDate> {
        for _ in 0..n {
            let mut skipped = 0;
            loop {
                date = step(date, direction)?;
                if self.working_day(date, time_provider) {
                    break;
                }
                skipped += 1;
                if skipped > MAX_NON_WORKING_RUN {
                    return Err(no_working_day(date));
                }
            }
        }
        Ok(date)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

fn step(date: NaiveDate, direction: Direction) -> Result<NaiveDate> {
    let next = match direction {
        Direction::Forward => date.succ_opt(),
        Direction::Backward => date.pred_opt(),
    };
    next.ok_or_else(|| out_of_range(date))
}

fn first_of_month(date: NaiveDate) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).ok_or_else(|| out_of_range(date))
}

fn next_month(month_start: NaiveDate) -> Result<NaiveDate> {
    let (year, month) = if month_start.month() == 12 {
        (month_start.year() + 1, 1)
    } else {
        (month_start.year(), month_start.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| out_of_range(month_start))
}

fn out_of_range(date: NaiveDate) -> DirectDebitError {
    DirectDebitError::InvalidDate {
        message: format!("date arithmetic out of range from {}", date),
    }
}

fn no_working_day(date: NaiveDate) -> DirectDebitError {
    DirectDebitError::InvalidDate {
        message: format!("no working day found near {}", date),
    }
}
