use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::error;

use crate::config::HolidayConfig;
use crate::errors::{DirectDebitError, Result};

/// division of the bank holidays feed that applies to collections
pub const DEFAULT_DIVISION: &str = "england-and-wales";

/// source of holiday dates for the calendar
pub trait HolidaySource {
    /// fetch every known holiday
    fn fetch_holidays(&self) -> Result<BTreeSet<NaiveDate>>;
}

#[derive(Debug, Deserialize)]
struct Division {
    events: Vec<HolidayEvent>,
}

#[derive(Debug, Deserialize)]
struct HolidayEvent {
    date: String,
}

/// bank holidays feed served as `{division: {events: [{date}]}}`
pub struct BankHolidaySource {
    agent: ureq::Agent,
    url: String,
    division: String,
}

impl BankHolidaySource {
    pub fn new(config: &HolidayConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .build();
        Self {
            agent,
            url: config.url.clone(),
            division: DEFAULT_DIVISION.to_string(),
        }
    }

    /// read a different division of the feed
    pub fn with_division(mut self, division: impl Into<String>) -> Self {
        self.division = division.into();
        self
    }
}

impl HolidaySource for BankHolidaySource {
    fn fetch_holidays(&self) -> Result<BTreeSet<NaiveDate>> {
        let response = match self.agent.get(&self.url).set("Accept", "application/json").call() {
            Ok(resp) if resp.status() == 200 => resp,
            Ok(resp) => {
                error!(status = resp.status(), "bank holidays request returned unexpected status code");
                return Err(unexpected_status(resp.status()));
            }
            Err(ureq::Error::Status(status, _)) => {
                error!(status, "bank holidays request returned unexpected status code");
                return Err(unexpected_status(status));
            }
            Err(ureq::Error::Transport(transport)) => {
                error!(error = %transport, "unable to send bank holidays request");
                return Err(DirectDebitError::HolidaySource {
                    message: format!("unable to send bank holidays request: {}", transport),
                });
            }
        };

        let mut divisions: HashMap<String, Division> = response.into_json().map_err(|err| {
            DirectDebitError::HolidaySource {
                message: format!("unable to parse bank holidays response: {}", err),
            }
        })?;

        let division = divisions.remove(&self.division).ok_or_else(|| {
            DirectDebitError::HolidaySource {
                message: format!("bank holidays response has no {} division", self.division),
            }
        })?;

        parse_events(&division.events)
    }
}

fn unexpected_status(status: u16) -> DirectDebitError {
    DirectDebitError::HolidaySource {
        message: format!("bank holidays api error: status {}", status),
    }
}

fn parse_events(events: &[HolidayEvent]) -> Result<BTreeSet<NaiveDate>> {
    events
        .iter()
        .map(|event| {
            NaiveDate::parse_from_str(&event.date, "%Y-%m-%d").map_err(|_| {
                DirectDebitError::HolidaySource {
                    message: format!("invalid holiday date: {}", event.date),
                }
            })
        })
        .collect()
}

/// fixed set of holidays, for hosts without a feed and for tests
#[derive(Debug, Clone, Default)]
pub struct StaticHolidaySource {
    holidays: BTreeSet<NaiveDate>,
}

impl StaticHolidaySource {
    pub fn new<I: IntoIterator<Item = NaiveDate>>(holidays: I) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }
}

impl HolidaySource for StaticHolidaySource {
    fn fetch_holidays(&self) -> Result<BTreeSet<NaiveDate>> {
        Ok(self.holidays.clone())
    }
}
