pub mod cache;
pub mod holidays;
pub mod working_days;

use std::sync::Arc;

use crate::config::HolidayConfig;

pub use cache::HolidayCache;
pub use holidays::{BankHolidaySource, HolidaySource, StaticHolidaySource};
pub use working_days::Calendar;

impl Calendar {
    /// calendar backed by the configured bank holidays feed
    ///
    /// The cache starts stale so the first operation loads holidays rather than
    /// running a full ttl with none known.
    pub fn from_config(config: &HolidayConfig) -> Self {
        Calendar::new(
            Arc::new(HolidayCache::stale(config.ttl())),
            Box::new(BankHolidaySource::new(config)),
        )
    }

    /// calendar sharing an existing process-wide cache
    pub fn with_shared_cache(cache: Arc<HolidayCache>, config: &HolidayConfig) -> Self {
        Calendar::new(cache, Box::new(BankHolidaySource::new(config)))
    }
}
