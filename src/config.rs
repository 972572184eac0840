use std::env;
use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::errors::{DirectDebitError, Result};
use crate::types::{PaymentMethod, TaskType};

/// default lifetime of cached holidays and of the refresh sentinel
pub const DEFAULT_HOLIDAY_TTL_HOURS: i64 = 12;

/// engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub provider: ProviderConfig,
    pub holidays: HolidayConfig,
    pub backend: BackendConfig,
    pub schedule: ScheduleConfig,
    pub tasks: TaskConfig,
}

/// payment provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub host: String,
    pub api_key: String,
    pub scheme_code: String,
    pub timeout_seconds: u64,
}

/// holiday source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayConfig {
    pub url: String,
    pub ttl_hours: i64,
    pub timeout_seconds: u64,
}

/// case record and ledger service locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub sirius_url: String,
    pub finance_url: String,
    pub timeout_seconds: u64,
}

/// collection scheduling policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// minimum working days between today and a collection
    pub lead_working_days: u32,
    /// working days BACS needs to process a collection
    pub bacs_working_days: u32,
    /// provider frequency code for a one-off collection
    pub frequency: String,
    pub total_payments: u32,
    /// method a client reverts to when their mandate is cancelled
    pub fallback_payment_method: PaymentMethod,
}

/// compensating task settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub schedule_failed: TaskType,
    pub cancellation_failed: TaskType,
    pub assignee: Option<i32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            lead_working_days: 14,
            bacs_working_days: 3,
            frequency: "1".to_string(),
            total_payments: 1,
            fallback_payment_method: PaymentMethod::Demanded,
        }
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            schedule_failed: TaskType::DirectDebitScheduleFailed,
            cancellation_failed: TaskType::DirectDebitCancellationFailed,
            assignee: None,
        }
    }
}

impl HolidayConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ttl_hours: DEFAULT_HOLIDAY_TTL_HOURS,
            timeout_seconds: 30,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::hours(self.ttl_hours)
    }

    pub fn timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.timeout_seconds)
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.timeout_seconds)
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.timeout_seconds)
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lead_working_days == 0 {
            return Err(DirectDebitError::InvalidConfiguration {
                message: "lead_working_days must be greater than zero".to_string(),
            });
        }
        if self.total_payments == 0 {
            return Err(DirectDebitError::InvalidConfiguration {
                message: "total_payments must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl EngineConfig {
    /// build configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| DirectDebitError::InvalidConfiguration {
                    message: format!("{} must be set", key),
                })
        };

        let timeout_seconds = match lookup("HTTP_TIMEOUT_SECONDS") {
            Some(raw) => raw.trim().parse::<u64>().ok().filter(|v| *v > 0).ok_or_else(|| {
                DirectDebitError::InvalidConfiguration {
                    message: format!("HTTP_TIMEOUT_SECONDS is not a positive integer: {}", raw),
                }
            })?,
            None => 30,
        };

        let assignee = match lookup("DIRECT_DEBIT_TASK_ASSIGNEE") {
            Some(raw) => Some(raw.trim().parse::<i32>().map_err(|_| {
                DirectDebitError::InvalidConfiguration {
                    message: format!("DIRECT_DEBIT_TASK_ASSIGNEE is not an id: {}", raw),
                }
            })?),
            None => None,
        };

        let config = Self {
            provider: ProviderConfig {
                host: required("ALLPAY_HOST")?,
                api_key: required("ALLPAY_API_KEY")?,
                scheme_code: required("ALLPAY_SCHEME_CODE")?,
                timeout_seconds,
            },
            holidays: HolidayConfig {
                timeout_seconds,
                ..HolidayConfig::new(required("HOLIDAY_API_URL")?)
            },
            backend: BackendConfig {
                sirius_url: required("SIRIUS_URL")?,
                finance_url: required("BACKEND_URL")?,
                timeout_seconds,
            },
            schedule: ScheduleConfig::default(),
            tasks: TaskConfig {
                assignee,
                ..TaskConfig::default()
            },
        };

        config.schedule.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_env() -> HashMap<String, String> {
        env_map(&[
            ("ALLPAY_HOST", "http://allpay.test"),
            ("ALLPAY_API_KEY", "secret"),
            ("ALLPAY_SCHEME_CODE", "OPGB"),
            ("HOLIDAY_API_URL", "http://holidays.test/bank-holidays.json"),
            ("SIRIUS_URL", "http://sirius.test"),
            ("BACKEND_URL", "http://finance.test"),
        ])
    }

    #[test]
    fn test_from_lookup_with_defaults() {
        let env = complete_env();
        let config = EngineConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.provider.scheme_code, "OPGB");
        assert_eq!(config.holidays.ttl(), Duration::hours(12));
        assert_eq!(config.schedule.lead_working_days, 14);
        assert_eq!(config.schedule.fallback_payment_method, PaymentMethod::Demanded);
        assert_eq!(config.tasks.schedule_failed.code(), "FDSC");
        assert_eq!(config.tasks.assignee, None);
        assert_eq!(config.provider.timeout(), StdDuration::from_secs(30));
    }

    #[test]
    fn test_missing_required_value() {
        let mut env = complete_env();
        env.remove("ALLPAY_API_KEY");

        let err = EngineConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert_eq!(
            err,
            DirectDebitError::InvalidConfiguration {
                message: "ALLPAY_API_KEY must be set".to_string(),
            }
        );
    }

    #[test]
    fn test_optional_overrides() {
        let mut env = complete_env();
        env.insert("HTTP_TIMEOUT_SECONDS".to_string(), "5".to_string());
        env.insert("DIRECT_DEBIT_TASK_ASSIGNEE".to_string(), "41".to_string());

        let config = EngineConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.backend.timeout(), StdDuration::from_secs(5));
        assert_eq!(config.holidays.timeout_seconds, 5);
        assert_eq!(config.tasks.assignee, Some(41));

        env.insert("HTTP_TIMEOUT_SECONDS".to_string(), "0".to_string());
        assert!(EngineConfig::from_lookup(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn test_schedule_validation() {
        let mut schedule = ScheduleConfig::default();
        assert!(schedule.validate().is_ok());

        schedule.lead_working_days = 0;
        assert!(schedule.validate().is_err());
    }
}
