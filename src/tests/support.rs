//! In-memory fakes for the platform seams.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;

use crate::identity::IdentitySource;
use crate::network::{
    ApiClient, ApiConfig, ClientConfig, HttpRequest, HttpResponse, HttpTransport, TransportError,
};
use crate::service_worker::{
    ClickedNotification, NotificationRequest, NotificationSink, PipelineError, WorkerClients,
};

pub const TEST_KEY: &str = "0b6f6c9e-3f1d-4a57-9a51-2d1c77e0f001";

/// Identity capability returning a fixed key and counting lookups.
#[derive(Default)]
pub struct FixedIdentity {
    pub lookups: Cell<usize>,
}

impl IdentitySource for FixedIdentity {
    fn identity(&self) -> String {
        self.lookups.set(self.lookups.get() + 1);
        TEST_KEY.to_string()
    }
}

/// Transport replaying queued outcomes and recording every request.
/// An empty queue answers `200` with an empty body.
#[derive(Default)]
pub struct RecordingTransport {
    pub requests: RefCell<Vec<HttpRequest>>,
    outcomes: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
}

impl RecordingTransport {
    pub fn respond(&self, status: u16, body: &str) {
        self.outcomes.borrow_mut().push_back(Ok(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, message: &str) {
        self.outcomes.borrow_mut().push_back(Err(TransportError(message.to_string())));
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.borrow().last().cloned().expect("no request was sent")
    }
}

#[async_trait(?Send)]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.borrow_mut().push(request);
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse::new(200, "")))
    }
}

pub fn client(base: &str) -> (ApiClient, Rc<RecordingTransport>, Rc<FixedIdentity>) {
    let transport = Rc::new(RecordingTransport::default());
    let identity = Rc::new(FixedIdentity::default());
    let client = ApiClient::new(
        ApiConfig::from_url(base),
        ClientConfig::default(),
        identity.clone(),
        transport.clone(),
    );
    (client, transport, identity)
}

/// Notification sink recording what would have been shown.
#[derive(Default)]
pub struct RecordingSink {
    pub shown: RefCell<Vec<NotificationRequest>>,
    pub fail_with: RefCell<Option<String>>,
}

#[async_trait(?Send)]
impl NotificationSink for RecordingSink {
    async fn show_notification(&self, notification: &NotificationRequest) -> Result<(), PipelineError> {
        if let Some(message) = self.fail_with.borrow().clone() {
            return Err(PipelineError::Display(message));
        }
        self.shown.borrow_mut().push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingClients {
    pub skipped_waiting: Cell<bool>,
    pub claimed: Cell<bool>,
    pub opened: RefCell<Vec<String>>,
}

#[async_trait(?Send)]
impl WorkerClients for RecordingClients {
    async fn skip_waiting(&self) -> Result<(), PipelineError> {
        self.skipped_waiting.set(true);
        Ok(())
    }

    async fn claim(&self) -> Result<(), PipelineError> {
        self.claimed.set(true);
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), PipelineError> {
        self.opened.borrow_mut().push(url.to_string());
        Ok(())
    }
}

/// Clicked notification that only remembers whether it was closed.
#[derive(Default)]
pub struct FakeClicked {
    pub closed: Rc<Cell<bool>>,
}

impl ClickedNotification for FakeClicked {
    fn tag(&self) -> String {
        "suggestion".to_string()
    }

    fn close(&self) {
        self.closed.set(true);
    }
}
