//! test doubles shared by the unit tests

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use chrono::NaiveDate;

use crate::backend::{CaseRecordClient, LedgerClient};
use crate::calendar::HolidaySource;
use crate::decimal::Money;
use crate::errors::{DirectDebitError, Result};
use crate::provider::{
    CancelMandateRequest, CreateMandateRequest, CreateScheduleInput, PaymentProvider, ProviderError,
    RemoveScheduledPaymentRequest,
};
use crate::types::{
    CaseType, ClientId, ClientSnapshot, ClientStatus, CompensatingTask, FeePayer, PaymentMethod,
    PendingCollection,
};

/// request captured by the mock server
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    /// path including any query string
    pub path: String,
    /// lowercased header names
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// throwaway http server answering one canned response per connection, in order
pub(crate) struct MockServer {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub fn start(responses: Vec<(u16, &str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responses: Vec<(u16, String)> = responses
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();

        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for (status, body) in responses {
                let Ok((stream, _)) = listener.accept() else {
                    return;
                };
                serve(stream, status, &body, &recorded);
            }
        });

        Self { url, requests }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve(stream: TcpStream, status: u16, body: &str, recorded: &Mutex<Vec<RecordedRequest>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.push((key.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let header = |name: &str| {
        headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };

    let request_body = if let Some(length) = header("content-length") {
        let mut buf = vec![0u8; length.parse().unwrap_or(0)];
        reader.read_exact(&mut buf).unwrap();
        String::from_utf8_lossy(&buf).into_owned()
    } else if header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked")) {
        read_chunked(&mut reader)
    } else {
        String::new()
    };

    recorded.lock().unwrap().push(RecordedRequest {
        method,
        path,
        headers,
        body: request_body,
    });

    let response = format!(
        "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        reason(status),
        body.len(),
        body
    );
    let mut stream = stream;
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn read_chunked(reader: &mut BufReader<TcpStream>) -> String {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).unwrap();
        let size = usize::from_str_radix(size_line.trim(), 16).unwrap_or(0);
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).unwrap();
        if size == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..size]);
    }
    String::from_utf8_lossy(&body).into_owned()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        401 => "Unauthorized",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        _ => "Status",
    }
}

/// ordered log of calls made to a double, shared with the test after boxing
#[derive(Debug)]
pub(crate) struct CallLog<T>(Arc<Mutex<Vec<T>>>);

impl<T> Clone for CallLog<T> {
    fn clone(&self) -> Self {
        CallLog(Arc::clone(&self.0))
    }
}

impl<T: Clone> CallLog<T> {
    pub fn new() -> Self {
        CallLog(Arc::new(Mutex::new(Vec::new())))
    }

    fn record(&self, call: T) {
        self.0.lock().unwrap().push(call);
    }

    pub fn all(&self) -> Vec<T> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// holiday source that always fails
pub(crate) struct FailingHolidaySource;

impl HolidaySource for FailingHolidaySource {
    fn fetch_holidays(&self) -> Result<BTreeSet<NaiveDate>> {
        Err(DirectDebitError::HolidaySource {
            message: "holiday source unavailable".to_string(),
        })
    }
}

/// fetch counter readable after the source is boxed
#[derive(Debug, Clone, Default)]
pub(crate) struct FetchCount(Arc<AtomicUsize>);

impl FetchCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// static holiday source that counts fetches
pub(crate) struct CountingHolidaySource {
    holidays: BTreeSet<NaiveDate>,
    calls: FetchCount,
}

impl CountingHolidaySource {
    pub fn new(holidays: Vec<NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
            calls: FetchCount::default(),
        }
    }

    pub fn calls(&self) -> FetchCount {
        self.calls.clone()
    }
}

impl HolidaySource for CountingHolidaySource {
    fn fetch_holidays(&self) -> Result<BTreeSet<NaiveDate>> {
        self.calls.0.fetch_add(1, Ordering::SeqCst);
        Ok(self.holidays.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ProviderCall {
    ModulusCheck {
        sort_code: String,
        account_number: String,
    },
    CreateMandate(CreateMandateRequest),
    CreateSchedule(CreateScheduleInput),
    CancelMandate(CancelMandateRequest),
    RemoveScheduledPayment(RemoveScheduledPaymentRequest),
}

/// payment provider double with per-operation outcomes
pub(crate) struct FakeProvider {
    pub modulus: std::result::Result<(), ProviderError>,
    pub mandate: std::result::Result<(), ProviderError>,
    pub schedule: std::result::Result<(), ProviderError>,
    pub cancel: std::result::Result<(), ProviderError>,
    pub remove: std::result::Result<(), ProviderError>,
    pub calls: CallLog<ProviderCall>,
}

impl FakeProvider {
    pub fn succeeding() -> Self {
        Self {
            modulus: Ok(()),
            mandate: Ok(()),
            schedule: Ok(()),
            cancel: Ok(()),
            remove: Ok(()),
            calls: CallLog::new(),
        }
    }
}

impl PaymentProvider for FakeProvider {
    fn modulus_check(
        &self,
        sort_code: &str,
        account_number: &str,
    ) -> std::result::Result<(), ProviderError> {
        self.calls.record(ProviderCall::ModulusCheck {
            sort_code: sort_code.to_string(),
            account_number: account_number.to_string(),
        });
        self.modulus.clone()
    }

    fn create_mandate(&self, request: &CreateMandateRequest) -> std::result::Result<(), ProviderError> {
        self.calls.record(ProviderCall::CreateMandate(request.clone()));
        self.mandate.clone()
    }

    fn create_schedule(&self, input: &CreateScheduleInput) -> std::result::Result<(), ProviderError> {
        self.calls.record(ProviderCall::CreateSchedule(input.clone()));
        self.schedule.clone()
    }

    fn cancel_mandate(&self, request: &CancelMandateRequest) -> std::result::Result<(), ProviderError> {
        self.calls.record(ProviderCall::CancelMandate(request.clone()));
        self.cancel.clone()
    }

    fn remove_scheduled_payment(
        &self,
        request: &RemoveScheduledPaymentRequest,
    ) -> std::result::Result<(), ProviderError> {
        self.calls.record(ProviderCall::RemoveScheduledPayment(request.clone()));
        self.remove.clone()
    }
}

/// case record double serving one client
pub(crate) struct FakeCaseRecord {
    pub client: Result<ClientSnapshot>,
    pub task_result: Result<()>,
    pub fetches: CallLog<ClientId>,
    pub tasks: CallLog<CompensatingTask>,
}

impl FakeCaseRecord {
    pub fn serving(client: ClientSnapshot) -> Self {
        Self {
            client: Ok(client),
            task_result: Ok(()),
            fetches: CallLog::new(),
            tasks: CallLog::new(),
        }
    }
}

impl CaseRecordClient for FakeCaseRecord {
    fn get_client(&self, client_id: ClientId) -> Result<ClientSnapshot> {
        self.fetches.record(client_id);
        self.client.clone()
    }

    fn create_task(&self, task: &CompensatingTask) -> Result<()> {
        self.tasks.record(task.clone());
        self.task_result.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LedgerCall {
    PendingBalance(ClientId),
    PendingCollections(ClientId),
    RecordPendingCollection(ClientId, PendingCollection),
    UpdatePaymentMethod(ClientId, PaymentMethod),
    CancelPendingCollection(ClientId, PendingCollection),
}

/// ledger double with fixed reads and configurable writes
pub(crate) struct FakeLedger {
    pub balance: Result<Money>,
    pub pending: Result<Vec<PendingCollection>>,
    pub record_result: Result<()>,
    pub update_result: Result<()>,
    pub cancel_result: Result<()>,
    pub calls: CallLog<LedgerCall>,
}

impl FakeLedger {
    pub fn with_balance(balance: Money) -> Self {
        Self {
            balance: Ok(balance),
            pending: Ok(Vec::new()),
            record_result: Ok(()),
            update_result: Ok(()),
            cancel_result: Ok(()),
            calls: CallLog::new(),
        }
    }
}

impl LedgerClient for FakeLedger {
    fn pending_outstanding_balance(&self, client_id: ClientId) -> Result<Money> {
        self.calls.record(LedgerCall::PendingBalance(client_id));
        self.balance.clone()
    }

    fn pending_collections(&self, client_id: ClientId) -> Result<Vec<PendingCollection>> {
        self.calls.record(LedgerCall::PendingCollections(client_id));
        self.pending.clone()
    }

    fn record_pending_collection(&self, client_id: ClientId, collection: &PendingCollection) -> Result<()> {
        self.calls
            .record(LedgerCall::RecordPendingCollection(client_id, collection.clone()));
        self.record_result.clone()
    }

    fn update_payment_method(&self, client_id: ClientId, method: PaymentMethod) -> Result<()> {
        self.calls.record(LedgerCall::UpdatePaymentMethod(client_id, method));
        self.update_result.clone()
    }

    fn cancel_pending_collection(&self, client_id: ClientId, collection: &PendingCollection) -> Result<()> {
        self.calls
            .record(LedgerCall::CancelPendingCollection(client_id, collection.clone()));
        self.cancel_result.clone()
    }
}

/// client that passes every eligibility and address rule
pub(crate) fn eligible_client() -> ClientSnapshot {
    ClientSnapshot {
        id: 1,
        court_ref: "12345678".to_string(),
        surname: "Holmes".to_string(),
        fee_payer: Some(FeePayer {
            id: Some(2),
            status: "Active".to_string(),
        }),
        active_case_type: Some(CaseType {
            handle: "HW".to_string(),
            label: None,
        }),
        client_status: Some(ClientStatus {
            handle: "ACTIVE".to_string(),
            label: None,
        }),
        address_line1: "221b Baker Street".to_string(),
        town: "London".to_string(),
        post_code: "NW1 6XE".to_string(),
    }
}
