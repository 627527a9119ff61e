// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scripted transport and an in-memory journal API for unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use crate::api::transport::{ApiRequest, ApiResponse, Transport, TransportError};
use crate::models::{EntryId, JournalEntry};

pub(crate) type Reply = Result<ApiResponse, TransportError>;

/// Transport that records every call and answers through a closure.
pub(crate) struct MockTransport {
    handler: Box<dyn Fn(&ApiRequest) -> Reply + Send + Sync>,
    delay: Duration,
    calls: Mutex<Vec<ApiRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub(crate) fn new(handler: impl Fn(&ApiRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every response is held back for `delay` (tokio time).
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn count(&self, method: Method, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub(crate) fn count_method(&self, method: Method) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Reply {
        self.calls.lock().unwrap().push(request.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = (self.handler)(&request);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

pub(crate) fn json_reply(status: StatusCode, value: Value) -> Reply {
    Ok(ApiResponse::json_value(status, &value))
}

pub(crate) fn status_reply(status: StatusCode) -> Reply {
    Ok(ApiResponse::new(status, ""))
}

// =============================================================================
// FakeJournalApi
// =============================================================================

pub(crate) const TEST_USERNAME: &str = "alice";
pub(crate) const TEST_PASSWORD: &str = "Secret1!";

struct FakeState {
    entries: BTreeMap<i64, JournalEntry>,
    next_id: i64,
    valid_access: Option<String>,
    valid_refresh: String,
    issued: usize,
    accounts: BTreeMap<String, String>,
    failures: VecDeque<(Method, String, StatusCode)>,
}

/// Minimal in-memory rendition of the journal API.
///
/// Bearer checking is only enforced once a token has been issued (or set via
/// [`FakeJournalApi::require_access`]).
pub(crate) struct FakeJournalApi {
    state: Mutex<FakeState>,
}

impl FakeJournalApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                entries: BTreeMap::new(),
                next_id: 1,
                valid_access: None,
                valid_refresh: "refresh-0".to_string(),
                issued: 0,
                accounts: BTreeMap::from([(
                    TEST_USERNAME.to_string(),
                    TEST_PASSWORD.to_string(),
                )]),
                failures: VecDeque::new(),
            }),
        })
    }

    pub(crate) fn with_next_id(self: Arc<Self>, id: i64) -> Arc<Self> {
        self.state.lock().unwrap().next_id = id;
        self
    }

    pub(crate) fn insert(&self, id: i64, title: &str, content: &str, date: &str) {
        let mut state = self.state.lock().unwrap();
        state.entries.insert(
            id,
            JournalEntry {
                id: EntryId(id),
                title: title.to_string(),
                date: date.to_string(),
                content: content.to_string(),
                user: Some(1),
                mood_stats: None,
                insights: None,
            },
        );
        if state.next_id <= id {
            state.next_id = id + 1;
        }
    }

    pub(crate) fn entry(&self, id: i64) -> Option<JournalEntry> {
        self.state.lock().unwrap().entries.get(&id).cloned()
    }

    pub(crate) fn require_access(&self, token: &str) {
        self.state.lock().unwrap().valid_access = Some(token.to_string());
    }

    pub(crate) fn set_refresh(&self, token: &str) {
        self.state.lock().unwrap().valid_refresh = token.to_string();
    }

    /// Answer the next `method path` call with `status`.
    pub(crate) fn fail_next(&self, method: Method, path: &str, status: StatusCode) {
        self.state
            .lock()
            .unwrap()
            .failures
            .push_back((method, path.to_string(), status));
    }

    pub(crate) fn transport(self: &Arc<Self>) -> MockTransport {
        let api = Arc::clone(self);
        MockTransport::new(move |request| api.handle(request))
    }

    fn handle(&self, request: &ApiRequest) -> Reply {
        let mut state = self.state.lock().unwrap();

        if let Some(pos) = state
            .failures
            .iter()
            .position(|(m, p, _)| *m == request.method && *p == request.path)
        {
            if let Some((_, _, status)) = state.failures.remove(pos) {
                return json_reply(status, json!({"detail": "injected failure"}));
            }
        }

        let segments: Vec<&str> = request
            .path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let body = request.body.clone().unwrap_or(Value::Null);

        // Unauthenticated endpoints
        match (request.method.clone(), segments.as_slice()) {
            (Method::POST, ["token"]) => {
                let known = body["username"]
                    .as_str()
                    .and_then(|name| state.accounts.get(name))
                    .is_some_and(|password| body["password"] == password.as_str());
                if known {
                    state.issued += 1;
                    let access = format!("access-{}", state.issued);
                    let refresh = format!("refresh-{}", state.issued);
                    state.valid_access = Some(access.clone());
                    state.valid_refresh = refresh.clone();
                    return json_reply(StatusCode::OK, json!({"access": access, "refresh": refresh}));
                }
                return json_reply(
                    StatusCode::UNAUTHORIZED,
                    json!({"detail": "No active account found with the given credentials"}),
                );
            }
            (Method::POST, ["token", "refresh"]) => {
                if body["refresh"] == state.valid_refresh.as_str() {
                    state.issued += 1;
                    let access = format!("access-{}", state.issued);
                    state.valid_access = Some(access.clone());
                    return json_reply(StatusCode::OK, json!({"access": access}));
                }
                return json_reply(
                    StatusCode::UNAUTHORIZED,
                    json!({"detail": "Token is invalid or expired"}),
                );
            }
            (Method::POST, ["users"]) => {
                let username = body["username"].as_str().unwrap_or_default().to_string();
                if state.accounts.contains_key(&username) {
                    return json_reply(
                        StatusCode::BAD_REQUEST,
                        json!({"username": ["A user with that username already exists."]}),
                    );
                }
                let password = body["password"].as_str().unwrap_or_default().to_string();
                state.accounts.insert(username, password);
                return json_reply(
                    StatusCode::CREATED,
                    json!({"id": 2, "username": body["username"], "email": body["email"]}),
                );
            }
            _ => {}
        }

        if let Some(valid) = &state.valid_access {
            if request.bearer.as_deref() != Some(valid.as_str()) {
                return json_reply(
                    StatusCode::UNAUTHORIZED,
                    json!({"detail": "Given token not valid for any token type"}),
                );
            }
        }

        match (request.method.clone(), segments.as_slice()) {
            (Method::GET, ["users", "me"]) => json_reply(
                StatusCode::OK,
                json!({"id": 1, "username": TEST_USERNAME, "email": "alice@example.com"}),
            ),
            (Method::DELETE, ["users", _]) => status_reply(StatusCode::NO_CONTENT),
            (Method::GET, ["journals"]) => {
                let entries: Vec<&JournalEntry> = state.entries.values().collect();
                json_reply(StatusCode::OK, json!(entries))
            }
            (Method::POST, ["journals"]) => {
                if let Some(reply) = reject_blank(&body) {
                    return reply;
                }
                let id = state.next_id;
                state.next_id += 1;
                let entry = entry_from_body(id, &body);
                state.entries.insert(id, entry.clone());
                json_reply(StatusCode::CREATED, json!(entry))
            }
            (method, ["journals", id]) => {
                let Ok(id) = id.parse::<i64>() else {
                    return status_reply(StatusCode::NOT_FOUND);
                };
                match method {
                    Method::GET => match state.entries.get(&id) {
                        Some(entry) => json_reply(StatusCode::OK, json!(entry)),
                        None => json_reply(StatusCode::NOT_FOUND, json!({"detail": "Not found."})),
                    },
                    Method::PUT => {
                        if !state.entries.contains_key(&id) {
                            return json_reply(StatusCode::NOT_FOUND, json!({"detail": "Not found."}));
                        }
                        if let Some(reply) = reject_blank(&body) {
                            return reply;
                        }
                        let entry = entry_from_body(id, &body);
                        state.entries.insert(id, entry.clone());
                        json_reply(StatusCode::OK, json!(entry))
                    }
                    Method::DELETE => match state.entries.remove(&id) {
                        Some(_) => status_reply(StatusCode::NO_CONTENT),
                        None => json_reply(StatusCode::NOT_FOUND, json!({"detail": "Not found."})),
                    },
                    _ => status_reply(StatusCode::METHOD_NOT_ALLOWED),
                }
            }
            (Method::POST, ["journals", id, "process_emotions"]) => {
                let known = id
                    .parse::<i64>()
                    .map(|id| state.entries.contains_key(&id))
                    .unwrap_or(false);
                if !known {
                    return json_reply(StatusCode::NOT_FOUND, json!({"detail": "Not found."}));
                }
                json_reply(
                    StatusCode::OK,
                    json!({
                        "moodStats": {
                            "percentHappiness": 70,
                            "percentFear": 5,
                            "percentSadness": 10,
                            "percentDisgust": 5,
                            "percentAnger": 10,
                            "dominantMood": "Happy"
                        },
                        "insights": {"id": 1, "insightContent": "Keep writing."}
                    }),
                )
            }
            _ => status_reply(StatusCode::NOT_FOUND),
        }
    }
}

fn reject_blank(body: &Value) -> Option<Reply> {
    let title = body["title"].as_str().unwrap_or_default();
    let content = body["content"].as_str().unwrap_or_default();
    if title.is_empty() && content.is_empty() {
        return Some(json_reply(
            StatusCode::BAD_REQUEST,
            json!({"non_field_errors": ["Either title or content must be provided."]}),
        ));
    }
    None
}

fn entry_from_body(id: i64, body: &Value) -> JournalEntry {
    JournalEntry {
        id: EntryId(id),
        title: body["title"].as_str().unwrap_or_default().to_string(),
        date: body["date"].as_str().unwrap_or_default().to_string(),
        content: body["content"].as_str().unwrap_or_default().to_string(),
        user: Some(1),
        mood_stats: None,
        insights: None,
    }
}
