use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::state::MandateState;
use crate::types::{ClientId, PaymentMethod, TaskType};

/// all events that can be emitted during an orchestration call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // calendar events
    HolidaysRefreshed {
        holiday_count: usize,
        timestamp: DateTime<Utc>,
    },

    // mandate events
    MandateCreated {
        operation_id: Uuid,
        client_id: ClientId,
        client_reference: String,
        timestamp: DateTime<Utc>,
    },
    MandateCancelled {
        operation_id: Uuid,
        client_id: ClientId,
        closure_date: NaiveDate,
        payment_method: PaymentMethod,
        timestamp: DateTime<Utc>,
    },

    PendingCollectionRemoved {
        operation_id: Uuid,
        client_id: ClientId,
        collection_date: NaiveDate,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // schedule events
    ScheduleCreated {
        operation_id: Uuid,
        client_id: ClientId,
        collection_date: NaiveDate,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    ScheduleSkipped {
        operation_id: Uuid,
        client_id: ClientId,
        balance: Money,
        timestamp: DateTime<Utc>,
    },
    ScheduleAlreadyPending {
        operation_id: Uuid,
        client_id: ClientId,
        collection_date: NaiveDate,
        amount: Money,
        timestamp: DateTime<Utc>,
    },

    // divergence events
    CompensatingTaskRaised {
        operation_id: Uuid,
        client_id: ClientId,
        task_type: TaskType,
        timestamp: DateTime<Utc>,
    },
    CompensatingTaskFailed {
        operation_id: Uuid,
        client_id: ClientId,
        task_type: TaskType,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        client_id: ClientId,
        old_status: MandateState,
        new_status: MandateState,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// count events matching a predicate
    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}
