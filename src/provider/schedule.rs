use chrono::NaiveDate;
use serde::Serialize;
use tracing::error;

use crate::decimal::Money;
use crate::provider::{ProviderClient, ProviderError};
use crate::types::ProviderCustomer;

/// a one-off collection to attach to a customer's mandate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateScheduleInput {
    pub customer: ProviderCustomer,
    pub date: NaiveDate,
    pub amount: Money,
    pub frequency: String,
    pub total_payments: u32,
}

/// a single scheduled collection to withdraw from a customer's mandate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveScheduledPaymentRequest {
    pub customer: ProviderCustomer,
    pub collection_date: NaiveDate,
    pub amount: Money,
}

#[derive(Serialize)]
struct ScheduleBody<'a> {
    #[serde(rename = "Schedules")]
    schedules: Vec<ScheduleEntry<'a>>,
}

#[derive(Serialize)]
struct ScheduleEntry<'a> {
    #[serde(rename = "ScheduleDate")]
    date: String,
    /// pence
    #[serde(rename = "Amount")]
    amount: i64,
    #[serde(rename = "Frequency")]
    frequency: &'a str,
    #[serde(rename = "TotalPayments")]
    total_payments: u32,
}

impl ProviderClient {
    pub fn create_schedule(&self, input: &CreateScheduleInput) -> Result<(), ProviderError> {
        let amount = input.amount.to_minor().ok_or_else(|| {
            error!(amount = %input.amount, "schedule amount cannot be expressed in pence");
            ProviderError::Api
        })?;

        let body = ScheduleBody {
            schedules: vec![ScheduleEntry {
                date: input.date.format("%Y-%m-%d").to_string(),
                amount,
                frequency: &input.frequency,
                total_payments: input.total_payments,
            }],
        };

        let path = format!("{}/VariableMandates", self.customer_path(&input.customer));
        self.send("create schedule", self.request("POST", &path), Some(&body))?;
        Ok(())
    }

    /// withdraw a scheduled collection, identified by its date and amount
    pub fn remove_scheduled_payment(
        &self,
        request: &RemoveScheduledPaymentRequest,
    ) -> Result<(), ProviderError> {
        let amount = request.amount.to_minor().ok_or_else(|| {
            error!(amount = %request.amount, "scheduled payment amount cannot be expressed in pence");
            ProviderError::Api
        })?;

        let path = format!(
            "{}/Mandates/Schedule/{}/{}",
            self.customer_path(&request.customer),
            request.collection_date.format("%Y-%m-%d"),
            amount
        );
        self.send::<()>("remove scheduled payment", self.request("DELETE", &path), None)?;
        Ok(())
    }
}
