use hourglass_rs::SafeTimeProvider;
use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::errors::{DirectDebitError, Result, ValidationErrors};
use crate::events::Event;
use crate::mandate::validation::{validate_bank_details, validate_eligibility};
use crate::mandate::{CreateMandateOutcome, MandateOrchestrator};
use crate::provider::{CreateMandateRequest, ProviderError};
use crate::state::{MandateLifecycle, MandateState};
use crate::types::{BankDetails, ClientId};

impl MandateOrchestrator {
    /// set up a direct debit mandate for a client with no mandate
    pub fn create_mandate(
        &mut self,
        client_id: ClientId,
        bank_details: &BankDetails,
        time_provider: &SafeTimeProvider,
    ) -> Result<CreateMandateOutcome> {
        let mut lifecycle =
            MandateLifecycle::new(client_id, MandateState::NoMandate, time_provider.now());
        self.create_mandate_for(&mut lifecycle, bank_details, time_provider)
    }

    /// set up a mandate, moving a caller-tracked lifecycle through the request
    ///
    /// Steps: fetch the client, validate bank details then eligibility, modulus
    /// check, create the mandate. Payment method and ledger are left untouched.
    pub fn create_mandate_for(
        &mut self,
        lifecycle: &mut MandateLifecycle,
        bank_details: &BankDetails,
        time_provider: &SafeTimeProvider,
    ) -> Result<CreateMandateOutcome> {
        let operation_id = Uuid::new_v4();
        let client_id = lifecycle.client_id();
        let span = info_span!("create_mandate", %operation_id, client_id);
        let _enter = span.enter();

        if !lifecycle.state().can_transition_to(MandateState::MandateRequested) {
            return Err(DirectDebitError::InvalidState {
                current: format!("{:?}", lifecycle.state()),
                expected: "no mandate".to_string(),
            });
        }

        let client = self.case_record.get_client(client_id).map_err(|err| {
            error!(step = "fetch client", error = %err, "unable to fetch client");
            err
        })?;

        // form fields first, eligibility only once they are well formed
        validate_bank_details(bank_details).into_result()?;
        validate_eligibility(&client).into_result()?;

        match self
            .provider
            .modulus_check(&bank_details.sort_code, &bank_details.account_number)
        {
            Ok(()) => {}
            Err(ProviderError::ModulusCheckFailed) => {
                info!("bank details failed modulus check");
                let mut errors = ValidationErrors::new();
                errors.add("AccountDetails", "invalid");
                return Err(DirectDebitError::Validation(errors));
            }
            Err(err) => {
                error!(step = "modulus check", error = %err, "modulus check failed");
                return Err(err.into());
            }
        }

        let request = CreateMandateRequest {
            client_reference: client.court_ref.clone(),
            surname: client.surname.clone(),
            address: client.address(),
            bank_details: bank_details.clone(),
        };

        let now = time_provider.now();
        lifecycle.transition(MandateState::MandateRequested, now, &mut self.events)?;

        if let Err(err) = self.provider.create_mandate(&request) {
            match &err {
                ProviderError::Validation { messages } => {
                    // shapes are checked up front, so this points at a gap in those checks
                    error!(step = "create mandate", errors = ?messages, "validation errors returned from payment provider");
                }
                ProviderError::Api | ProviderError::ModulusCheckFailed => {
                    error!(step = "create mandate", error = %err, "unable to create mandate");
                }
            }
            lifecycle.transition(MandateState::NoMandate, now, &mut self.events)?;
            return Err(err.into());
        }

        lifecycle.transition(MandateState::MandateActive, now, &mut self.events)?;
        self.events.emit(Event::MandateCreated {
            operation_id,
            client_id,
            client_reference: request.client_reference.clone(),
            timestamp: now,
        });
        info!("direct debit mandate created");

        Ok(CreateMandateOutcome {
            operation_id,
            client_id,
            client_reference: request.client_reference,
            state: lifecycle.state(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Money;
    use crate::mandate::tests::{orchestrator, seeded_calendar, test_time};
    use crate::testing::{eligible_client, FakeCaseRecord, FakeLedger, FakeProvider, ProviderCall};
    use crate::types::FeePayer;

    fn bank_details() -> BankDetails {
        BankDetails {
            account_name: "S Holmes".to_string(),
            sort_code: "30-33-30".to_string(),
            account_number: "12345678".to_string(),
        }
    }

    #[test]
    fn test_create_mandate() {
        let time = test_time();
        let provider = FakeProvider::succeeding();
        let provider_calls = provider.calls.clone();
        let ledger = FakeLedger::with_balance(Money::ZERO);
        let ledger_calls = ledger.calls.clone();
        let mut orch = orchestrator(
            seeded_calendar(&[], &time),
            provider,
            FakeCaseRecord::serving(eligible_client()),
            ledger,
        );

        let outcome = orch.create_mandate(1, &bank_details(), &time).unwrap();

        assert_eq!(outcome.state, MandateState::MandateActive);
        assert_eq!(outcome.client_reference, "12345678");

        let calls = provider_calls.all();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0],
            ProviderCall::ModulusCheck {
                sort_code: "30-33-30".to_string(),
                account_number: "12345678".to_string(),
            }
        );
        match &calls[1] {
            ProviderCall::CreateMandate(request) => {
                assert_eq!(request.surname, "Holmes");
                assert_eq!(request.address.post_code, "NW1 6XE");
                assert_eq!(request.bank_details, bank_details());
            }
            other => panic!("unexpected call {:?}", other),
        }

        // mandate creation never touches the ledger
        assert_eq!(ledger_calls.len(), 0);
        assert_eq!(orch.events.count(|e| matches!(e, Event::MandateCreated { .. })), 1);
        assert_eq!(orch.events.count(|e| matches!(e, Event::StatusChanged { .. })), 2);
    }

    #[test]
    fn test_bank_details_checked_before_eligibility() {
        let time = test_time();
        let provider = FakeProvider::succeeding();
        let provider_calls = provider.calls.clone();
        let mut client = eligible_client();
        client.fee_payer = None;
        let mut orch = orchestrator(
            seeded_calendar(&[], &time),
            provider,
            FakeCaseRecord::serving(client),
            FakeLedger::with_balance(Money::ZERO),
        );
        let mut details = bank_details();
        details.sort_code = "00-00-00".to_string();

        let err = orch.create_mandate(1, &details, &time).unwrap_err();

        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["SortCode"]);
        assert_eq!(provider_calls.len(), 0);
    }

    #[test]
    fn test_ineligible_client() {
        let time = test_time();
        let provider = FakeProvider::succeeding();
        let provider_calls = provider.calls.clone();
        let mut client = eligible_client();
        client.fee_payer = Some(FeePayer {
            id: Some(2),
            status: "Inactive".to_string(),
        });
        client.active_case_type = None;
        let mut orch = orchestrator(
            seeded_calendar(&[], &time),
            provider,
            FakeCaseRecord::serving(client),
            FakeLedger::with_balance(Money::ZERO),
        );

        let err = orch.create_mandate(1, &bank_details(), &time).unwrap_err();

        let errors = err.validation_errors().unwrap();
        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["ActiveOrder", "FeePayer"]
        );
        assert_eq!(provider_calls.len(), 0);
    }

    #[test]
    fn test_modulus_check_failure_is_field_error() {
        let time = test_time();
        let mut provider = FakeProvider::succeeding();
        provider.modulus = Err(ProviderError::ModulusCheckFailed);
        let provider_calls = provider.calls.clone();
        let mut orch = orchestrator(
            seeded_calendar(&[], &time),
            provider,
            FakeCaseRecord::serving(eligible_client()),
            FakeLedger::with_balance(Money::ZERO),
        );

        let err = orch.create_mandate(1, &bank_details(), &time).unwrap_err();

        assert!(err.validation_errors().unwrap().has_rule("AccountDetails", "invalid"));
        assert_eq!(provider_calls.len(), 1);
    }

    #[test]
    fn test_modulus_check_api_error_is_opaque() {
        let time = test_time();
        let mut provider = FakeProvider::succeeding();
        provider.modulus = Err(ProviderError::Api);
        let mut orch = orchestrator(
            seeded_calendar(&[], &time),
            provider,
            FakeCaseRecord::serving(eligible_client()),
            FakeLedger::with_balance(Money::ZERO),
        );

        let err = orch.create_mandate(1, &bank_details(), &time).unwrap_err();
        assert_eq!(err, DirectDebitError::Provider(ProviderError::Api));
    }

    #[test]
    fn test_provider_validation_error_is_propagated() {
        let time = test_time();
        let mut provider = FakeProvider::succeeding();
        provider.mandate = Err(ProviderError::Validation {
            messages: vec!["Invalid postcode".to_string()],
        });
        let mut orch = orchestrator(
            seeded_calendar(&[], &time),
            provider,
            FakeCaseRecord::serving(eligible_client()),
            FakeLedger::with_balance(Money::ZERO),
        );
        let mut lifecycle = MandateLifecycle::new(1, MandateState::NoMandate, time.now());

        let err = orch
            .create_mandate_for(&mut lifecycle, &bank_details(), &time)
            .unwrap_err();

        assert!(matches!(
            err,
            DirectDebitError::Provider(ProviderError::Validation { .. })
        ));
        assert_eq!(lifecycle.state(), MandateState::NoMandate);
        assert_eq!(orch.events.count(|e| matches!(e, Event::MandateCreated { .. })), 0);
    }

    #[test]
    fn test_client_fetch_failure_aborts() {
        let time = test_time();
        let provider = FakeProvider::succeeding();
        let provider_calls = provider.calls.clone();
        let mut case_record = FakeCaseRecord::serving(eligible_client());
        case_record.client = Err(DirectDebitError::CaseRecord {
            message: "sirius returned status 500".to_string(),
        });
        let mut orch = orchestrator(
            seeded_calendar(&[], &time),
            provider,
            case_record,
            FakeLedger::with_balance(Money::ZERO),
        );

        let err = orch.create_mandate(1, &bank_details(), &time).unwrap_err();

        assert!(matches!(err, DirectDebitError::CaseRecord { .. }));
        assert_eq!(provider_calls.len(), 0);
    }

    #[test]
    fn test_existing_mandate_is_rejected() {
        let time = test_time();
        let case_record = FakeCaseRecord::serving(eligible_client());
        let fetches = case_record.fetches.clone();
        let mut orch = orchestrator(
            seeded_calendar(&[], &time),
            FakeProvider::succeeding(),
            case_record,
            FakeLedger::with_balance(Money::ZERO),
        );
        let mut lifecycle = MandateLifecycle::new(1, MandateState::MandateActive, time.now());

        let err = orch
            .create_mandate_for(&mut lifecycle, &bank_details(), &time)
            .unwrap_err();

        assert!(matches!(err, DirectDebitError::InvalidState { .. }));
        assert_eq!(fetches.len(), 0);
    }
}
