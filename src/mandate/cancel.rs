use chrono::{Datelike, NaiveDate};
use hourglass_rs::SafeTimeProvider;
use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::errors::{DirectDebitError, Result};
use crate::events::Event;
use crate::mandate::compensation::{CANCELLATION_FAILED_NOTE, COLLECTION_REMOVAL_FAILED_NOTE};
use crate::mandate::{CancelMandateOutcome, MandateOrchestrator};
use crate::provider::{CancelMandateRequest, RemoveScheduledPaymentRequest};
use crate::state::{MandateLifecycle, MandateState};
use crate::types::{ClientId, PendingCollection, ProviderCustomer};

impl MandateOrchestrator {
    /// cancel a client's mandate and revert them to the fallback payment method
    pub fn cancel_mandate(
        &mut self,
        client_id: ClientId,
        time_provider: &SafeTimeProvider,
    ) -> Result<CancelMandateOutcome> {
        let mut lifecycle =
            MandateLifecycle::new(client_id, MandateState::MandateActive, time_provider.now());
        self.cancel_mandate_for(&mut lifecycle, time_provider)
    }

    /// cancel at the provider first; the payment method only changes once the
    /// provider has stopped collecting
    ///
    /// Pending collections dated after the closure date can no longer be taken, so
    /// they are withdrawn from the provider and the ledger once the payment method
    /// has been reverted.
    pub fn cancel_mandate_for(
        &mut self,
        lifecycle: &mut MandateLifecycle,
        time_provider: &SafeTimeProvider,
    ) -> Result<CancelMandateOutcome> {
        let operation_id = Uuid::new_v4();
        let client_id = lifecycle.client_id();
        let span = info_span!("cancel_mandate", %operation_id, client_id);
        let _enter = span.enter();

        lifecycle.require_mandate()?;

        let client = self.case_record.get_client(client_id).map_err(|err| {
            error!(step = "fetch client", error = %err, "unable to fetch client");
            err
        })?;

        let collections = self.fetch_pending_collections(client_id, time_provider)?;
        let closure_date = self.closure_date_for(&collections, time_provider)?;

        let customer = client.provider_customer();
        let request = CancelMandateRequest {
            customer: customer.clone(),
            closure_date,
        };
        self.provider.cancel_mandate(&request).map_err(|err| {
            error!(step = "cancel mandate", error = %err, "unable to cancel mandate, payment method left unchanged");
            err
        })?;

        let now = time_provider.now();
        lifecycle.transition(MandateState::Cancelled, now, &mut self.events)?;

        let payment_method = self.schedule.fallback_payment_method;
        if let Err(err) = self.ledger.update_payment_method(client_id, payment_method) {
            error!(
                step = "update payment method",
                error = %err,
                "failed to update payment method after mandate was cancelled with payment provider"
            );
            let task_type = self.tasks.cancellation_failed;
            self.raise_compensating_task(operation_id, client_id, task_type, CANCELLATION_FAILED_NOTE, time_provider);
            return Err(err);
        }

        let mut removed_collections = Vec::new();
        for collection in collections.into_iter().filter(|c| c.collection_date > closure_date) {
            if let Err(err) = self.remove_pending_collection(operation_id, client_id, &customer, &collection, time_provider) {
                let task_type = self.tasks.cancellation_failed;
                self.raise_compensating_task(operation_id, client_id, task_type, COLLECTION_REMOVAL_FAILED_NOTE, time_provider);
                return Err(err);
            }
            removed_collections.push(collection);
        }

        self.events.emit(Event::MandateCancelled {
            operation_id,
            client_id,
            closure_date,
            payment_method,
            timestamp: now,
        });
        info!(
            %closure_date,
            payment_method = payment_method.key(),
            removed = removed_collections.len(),
            "direct debit mandate cancelled"
        );

        Ok(CancelMandateOutcome {
            operation_id,
            client_id,
            closure_date,
            payment_method,
            removed_collections,
            state: lifecycle.state(),
        })
    }

    /// first working day after any collection BACS may already be processing
    ///
    /// Collections due within the BACS window from today may still be taken, so the
    /// mandate stays open until the day after the latest of them.
    pub fn closure_date(
        &mut self,
        client_id: ClientId,
        time_provider: &SafeTimeProvider,
    ) -> Result<NaiveDate> {
        let collections = self.fetch_pending_collections(client_id, time_provider)?;
        self.closure_date_for(&collections, time_provider)
    }

    fn fetch_pending_collections(
        &mut self,
        client_id: ClientId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Vec<PendingCollection>> {
        self.refresh_holidays(time_provider)?;

        self.ledger.pending_collections(client_id).map_err(|err| {
            error!(step = "pending collections", error = %err, "unable to fetch pending collections");
            err
        })
    }

    fn closure_date_for(
        &self,
        collections: &[PendingCollection],
        time_provider: &SafeTimeProvider,
    ) -> Result<NaiveDate> {
        let today = time_provider.now().date_naive();
        let bacs_date = self
            .calendar
            .add_working_days(today, self.schedule.bacs_working_days, time_provider)?;

        let closure = collections
            .iter()
            .map(|collection| collection.collection_date)
            .filter(|date| *date <= bacs_date)
            .max()
            .and_then(|date| date.succ_opt())
            .map_or(today, |date| date.max(today));

        self.calendar
            .next_working_day_on_or_after_x(closure, closure.day(), time_provider)
    }

    /// withdraw one collection from the provider, then from the ledger
    fn remove_pending_collection(
        &mut self,
        operation_id: Uuid,
        client_id: ClientId,
        customer: &ProviderCustomer,
        collection: &PendingCollection,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let collection_date = collection.collection_date;
        let request = RemoveScheduledPaymentRequest {
            customer: customer.clone(),
            collection_date,
            amount: collection.amount,
        };
        self.provider.remove_scheduled_payment(&request).map_err(|err| {
            error!(step = "remove scheduled payment", %collection_date, error = %err, "unable to remove scheduled payment after mandate was cancelled");
            DirectDebitError::from(err)
        })?;

        self.ledger
            .cancel_pending_collection(client_id, collection)
            .map_err(|err| {
                error!(step = "cancel pending collection", %collection_date, error = %err, "failed to cancel pending collection after scheduled payment was removed");
                err
            })?;

        self.events.emit(Event::PendingCollectionRemoved {
            operation_id,
            client_id,
            collection_date,
            amount: collection.amount,
            timestamp: time_provider.now(),
        });
        Ok(())
    }
}
