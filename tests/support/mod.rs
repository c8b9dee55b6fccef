#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use datocms_session::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use reqwest::StatusCode;
use serde_json::{json, Value};

pub enum Scripted {
    Respond(HttpResponse),
    Fail(TransportError),
    Hang,
}

/// Transport that replays scripted outcomes and records every request.
#[derive(Default)]
pub struct RecordingTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(status: u16, body: &Value) -> Arc<Self> {
        Self::new(vec![Scripted::Respond(json_response(status, body))])
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock_unpoisoned(&self.requests).clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock_unpoisoned(&self.requests).push(request);
        let next = lock_unpoisoned(&self.script).pop_front();
        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(error)) => Err(error),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(TransportError::Other("unexpected request".to_owned())),
        }
    }
}

pub fn json_response(status: u16, body: &Value) -> HttpResponse {
    HttpResponse::new(
        StatusCode::from_u16(status).expect("valid status code"),
        serde_json::to_vec(body).expect("serialize body"),
    )
}

pub fn session_document(token: &str) -> Value {
    json!({
        "data": {
            "type": "session",
            "id": token,
            "relationships": {
                "user": {
                    "data": { "type": "user", "id": "312" }
                }
            }
        },
        "included": [
            {
                "type": "user",
                "id": "312",
                "attributes": {
                    "email": "foo@bar.com",
                    "first_name": "Mark",
                    "last_name": "Smith",
                    "state": "INVITATION_PENDING",
                    "is_admin": true,
                    "password": "example"
                }
            }
        ]
    })
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
