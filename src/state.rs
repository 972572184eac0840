use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{DirectDebitError, Result};
use crate::events::{Event, EventStore};
use crate::types::ClientId;

/// where a client's direct debit relationship stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MandateState {
    /// no mandate with the provider
    NoMandate,
    /// mandate submitted, provider has not yet confirmed
    MandateRequested,
    /// provider holds an active mandate
    MandateActive,
    /// a collection is scheduled against the mandate
    ScheduleActive,
    /// nothing owed, so no collection was scheduled
    ScheduleSkipped,
    /// mandate closed at the provider
    Cancelled,
}

impl MandateState {
    pub fn can_transition_to(&self, next: MandateState) -> bool {
        use MandateState::*;

        matches!(
            (self, next),
            (NoMandate, MandateRequested)
                | (Cancelled, MandateRequested)
                | (MandateRequested, MandateActive)
                | (MandateRequested, NoMandate)
                | (MandateActive, ScheduleActive)
                | (MandateActive, ScheduleSkipped)
                | (ScheduleActive, ScheduleActive)
                | (ScheduleActive, ScheduleSkipped)
                | (ScheduleSkipped, ScheduleActive)
                | (ScheduleSkipped, ScheduleSkipped)
                | (MandateActive, Cancelled)
                | (ScheduleActive, Cancelled)
                | (ScheduleSkipped, Cancelled)
        )
    }

    /// a mandate exists at the provider in this state
    pub fn has_mandate(&self) -> bool {
        matches!(
            self,
            MandateState::MandateActive | MandateState::ScheduleActive | MandateState::ScheduleSkipped
        )
    }
}

/// per-call lifecycle tracker that rejects illegal moves and records each change
#[derive(Debug, Clone)]
pub struct MandateLifecycle {
    client_id: ClientId,
    state: MandateState,
    history: Vec<(MandateState, DateTime<Utc>)>,
}

impl MandateLifecycle {
    pub fn new(client_id: ClientId, state: MandateState, now: DateTime<Utc>) -> Self {
        Self {
            client_id,
            state,
            history: vec![(state, now)],
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn state(&self) -> MandateState {
        self.state
    }

    pub fn history(&self) -> &[(MandateState, DateTime<Utc>)] {
        &self.history
    }

    /// fail unless a mandate exists at the provider
    pub fn require_mandate(&self) -> Result<()> {
        if self.state.has_mandate() {
            Ok(())
        } else {
            Err(DirectDebitError::InvalidState {
                current: format!("{:?}", self.state),
                expected: "an active mandate".to_string(),
            })
        }
    }

    pub fn transition(
        &mut self,
        next: MandateState,
        now: DateTime<Utc>,
        events: &mut EventStore,
    ) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(DirectDebitError::InvalidState {
                current: format!("{:?}", self.state),
                expected: format!("a state that can move to {:?}", next),
            });
        }

        events.emit(Event::StatusChanged {
            client_id: self.client_id,
            old_status: self.state,
            new_status: next,
            timestamp: now,
        });
        self.state = next;
        self.history.push((next, now));
        Ok(())
    }
}
