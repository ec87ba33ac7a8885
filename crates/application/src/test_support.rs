//! In-memory port implementations shared by the unit tests.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::new_without_default
)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tollgate_domain::{
    ApiRequest, ApiResponse, Credentials, STATUS_UNAUTHORIZED, Session, TokenGrant,
};

use crate::ports::{
    Clock, HttpClient, HttpClientError, SessionStorage, StorageError, TokenEndpoint,
    TokenEndpointError,
};

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(DateTime::from_timestamp(1_800_000_000, 0).unwrap()),
        }
    }

    /// Instant `secs` seconds from the current manual time.
    pub fn in_secs(&self, secs: i64) -> DateTime<Utc> {
        *self.now.lock().unwrap() + chrono::Duration::seconds(secs)
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

enum Record {
    Session(Session),
    Corrupt,
}

/// Session storage kept in a map; can simulate corrupt records and write failures.
pub struct MemoryStorage {
    records: Mutex<HashMap<String, Record>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn record(&self, key: &str) -> Option<Session> {
        match self.records.lock().unwrap().get(key) {
            Some(Record::Session(session)) => Some(session.clone()),
            _ => None,
        }
    }

    pub fn insert(&self, key: &str, session: Session) {
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), Record::Session(session));
    }

    pub fn corrupt(&self, key: &str) {
        self.records
            .lock()
            .unwrap()
            .insert(key.to_string(), Record::Corrupt);
    }

    pub fn is_corrupt(&self, key: &str) -> bool {
        matches!(self.records.lock().unwrap().get(key), Some(Record::Corrupt))
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<Session>, StorageError> {
        match self.records.lock().unwrap().get(key) {
            Some(Record::Session(session)) => Ok(Some(session.clone())),
            Some(Record::Corrupt) => Err(StorageError::Serialization(
                "expected value at line 1 column 1".to_string(),
            )),
            None => Ok(None),
        }
    }

    async fn write(&self, key: &str, session: &Session) -> Result<(), StorageError> {
        self.check_writable()?;
        self.insert(key, session.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.records.lock().unwrap().remove(key);
        Ok(())
    }
}

type GrantResult = Result<TokenGrant, TokenEndpointError>;

/// Token endpoint answering from scripted queues.
///
/// A gated endpoint holds every refresh call until [`ScriptedEndpoint::open_gate`].
pub struct ScriptedEndpoint {
    refresh_results: Mutex<VecDeque<GrantResult>>,
    obtain_results: Mutex<VecDeque<GrantResult>>,
    refresh_tokens_seen: Mutex<Vec<String>>,
    credentials_seen: Mutex<Vec<Option<String>>>,
    refresh_calls: AtomicUsize,
    gate: Option<Semaphore>,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self {
            refresh_results: Mutex::new(VecDeque::new()),
            obtain_results: Mutex::new(VecDeque::new()),
            refresh_tokens_seen: Mutex::new(Vec::new()),
            credentials_seen: Mutex::new(Vec::new()),
            refresh_calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    pub fn push_refresh(&self, result: GrantResult) {
        self.refresh_results.lock().unwrap().push_back(result);
    }

    pub fn push_obtain(&self, result: GrantResult) {
        self.obtain_results.lock().unwrap().push_back(result);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_tokens_seen(&self) -> Vec<String> {
        self.refresh_tokens_seen.lock().unwrap().clone()
    }

    /// Usernames passed to `obtain`, `None` for a bootstrap call.
    pub fn usernames_seen(&self) -> Vec<Option<String>> {
        self.credentials_seen.lock().unwrap().clone()
    }

    fn unscripted() -> GrantResult {
        Err(TokenEndpointError::Rejected {
            status: 500,
            message: "no scripted response".to_string(),
        })
    }
}

#[async_trait]
impl TokenEndpoint for ScriptedEndpoint {
    async fn obtain(&self, credentials: Option<&Credentials>) -> GrantResult {
        self.credentials_seen
            .lock()
            .unwrap()
            .push(credentials.map(|c| c.username.clone()));
        self.obtain_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Self::unscripted)
    }

    async fn refresh(&self, refresh_token: &str) -> GrantResult {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refresh_tokens_seen
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        self.refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Self::unscripted)
    }
}

/// Backend accepting a set of bearer tokens and answering 401 to anything else.
pub struct MockBackend {
    accepted: Mutex<HashSet<String>>,
    reject_all: AtomicBool,
    status: Mutex<u16>,
    transport_error: Mutex<Option<HttpClientError>>,
    authorizations: Mutex<Vec<Option<String>>>,
}

impl MockBackend {
    pub fn accepting(tokens: &[&str]) -> Self {
        Self {
            accepted: Mutex::new(tokens.iter().map(ToString::to_string).collect()),
            reject_all: AtomicBool::new(false),
            status: Mutex::new(200),
            transport_error: Mutex::new(None),
            authorizations: Mutex::new(Vec::new()),
        }
    }

    pub fn accept(&self, token: &str) {
        self.accepted.lock().unwrap().insert(token.to_string());
    }

    /// Answers 401 to every request regardless of credential.
    pub fn reject_all(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    /// Status returned to authorized requests.
    pub fn respond_with(&self, status: u16) {
        *self.status.lock().unwrap() = status;
    }

    pub fn fail_transport(&self, error: HttpClientError) {
        *self.transport_error.lock().unwrap() = Some(error);
    }

    /// Authorization header of every dispatched request, in order.
    pub fn authorizations(&self) -> Vec<Option<String>> {
        self.authorizations.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.authorizations.lock().unwrap().len()
    }

    fn answer(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError> {
        let authorization = request.authorization().map(ToString::to_string);
        self.authorizations
            .lock()
            .unwrap()
            .push(authorization.clone());

        if let Some(error) = self.transport_error.lock().unwrap().clone() {
            return Err(error);
        }

        let authorized = !self.reject_all.load(Ordering::SeqCst)
            && authorization
                .as_deref()
                .and_then(|value| value.strip_prefix("Bearer "))
                .is_some_and(|token| self.accepted.lock().unwrap().contains(token));

        if authorized {
            let status = *self.status.lock().unwrap();
            Ok(ApiResponse::new(
                status,
                serde_json::json!({ "path": request.path }),
            ))
        } else {
            Ok(ApiResponse::new(
                STATUS_UNAUTHORIZED,
                serde_json::json!({ "error": "unauthorized" }),
            ))
        }
    }
}

impl HttpClient for MockBackend {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError> {
        tokio::task::yield_now().await;
        self.answer(request)
    }
}
