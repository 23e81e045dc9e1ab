//! Push notification pipeline run inside the service worker.
//!
//! Every event kind goes through [`NotificationPipeline::handle`], whose
//! future the platform glue hands to `ExtendableEvent.waitUntil` so the
//! worker stays alive until the work settles.  Platform calls sit behind
//! [`NotificationSink`] and [`WorkerClients`].

pub mod glue;

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::constants::{
    DEFAULT_NOTIFICATION_BODY, DEFAULT_NOTIFICATION_TITLE, NOTIFICATION_CLICK_URL,
    NOTIFICATION_ICON, NOTIFICATION_TAG, NOTIFICATION_VIBRATE_PATTERN,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to show notification: {0}")]
    Display(String),
    #[error("client control failed: {0}")]
    Clients(String),
}

/// Everything the pipeline puts on an OS notification.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub tag: String,
    pub icon: String,
    pub badge: String,
    pub require_interaction: bool,
    pub vibrate: Vec<u32>,
    pub click_url: String,
    pub default_title: String,
    pub default_body: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            tag: NOTIFICATION_TAG.to_string(),
            icon: NOTIFICATION_ICON.to_string(),
            badge: NOTIFICATION_ICON.to_string(),
            require_interaction: true,
            vibrate: NOTIFICATION_VIBRATE_PATTERN.to_vec(),
            click_url: NOTIFICATION_CLICK_URL.to_string(),
            default_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            default_body: DEFAULT_NOTIFICATION_BODY.to_string(),
        }
    }
}

/// `{title?, body?}` delivered by the push service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl PushPayload {
    /// Absent data, malformed JSON and non-object JSON all yield an empty
    /// payload.  Empty strings count as missing.
    pub fn parse(data: Option<&str>) -> Self {
        let value = match data.map(serde_json::from_str::<Value>) {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                log::warn!("ignoring malformed push payload: {}", e);
                return Self::default();
            }
            None => return Self::default(),
        };

        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self { title: field("title"), body: field("body") }
    }
}

/// Display request handed to the OS notification surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub vibrate: Vec<u32>,
}

impl NotificationRequest {
    pub fn from_payload(payload: PushPayload, config: &NotificationConfig) -> Self {
        Self {
            title: payload.title.unwrap_or_else(|| config.default_title.clone()),
            body: payload.body.unwrap_or_else(|| config.default_body.clone()),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            tag: config.tag.clone(),
            require_interaction: config.require_interaction,
            vibrate: config.vibrate.clone(),
        }
    }
}

#[async_trait(?Send)]
pub trait NotificationSink {
    async fn show_notification(&self, notification: &NotificationRequest) -> Result<(), PipelineError>;
}

/// Control over the worker's own lifecycle and the pages it serves.
#[async_trait(?Send)]
pub trait WorkerClients {
    async fn skip_waiting(&self) -> Result<(), PipelineError>;
    async fn claim(&self) -> Result<(), PipelineError>;
    /// Focus a window already showing `url`, or open a new one.
    async fn open_window(&self, url: &str) -> Result<(), PipelineError>;
}

/// The notification a user clicked on.
pub trait ClickedNotification {
    fn tag(&self) -> String;
    fn close(&self);
}

pub enum WorkerEvent {
    Install,
    Activate,
    /// Raw push data as text, `None` when the push carried no data.
    Push(Option<String>),
    NotificationClick(Box<dyn ClickedNotification>),
}

impl WorkerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerEvent::Install => "install",
            WorkerEvent::Activate => "activate",
            WorkerEvent::Push(_) => "push",
            WorkerEvent::NotificationClick(_) => "notificationclick",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    Idle,
    HandlingPush,
    HandlingClick,
}

pub struct NotificationPipeline {
    config: NotificationConfig,
    sink: Rc<dyn NotificationSink>,
    clients: Rc<dyn WorkerClients>,
    active: Cell<bool>,
    pushes_in_flight: Cell<usize>,
    clicks_in_flight: Cell<usize>,
}

impl NotificationPipeline {
    pub fn new(
        config: NotificationConfig,
        sink: Rc<dyn NotificationSink>,
        clients: Rc<dyn WorkerClients>,
    ) -> Self {
        Self {
            config,
            sink,
            clients,
            active: Cell::new(false),
            pushes_in_flight: Cell::new(0),
            clicks_in_flight: Cell::new(0),
        }
    }

    pub fn config(&self) -> &NotificationConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        if !self.active.get() {
            WorkerState::Installing
        } else if self.clicks_in_flight.get() > 0 {
            WorkerState::HandlingClick
        } else if self.pushes_in_flight.get() > 0 {
            WorkerState::HandlingPush
        } else {
            WorkerState::Idle
        }
    }

    /// Run the handler for one event.  The returned future completes when
    /// all asynchronous work of the handler has settled.
    pub async fn handle(&self, event: WorkerEvent) -> Result<(), PipelineError> {
        log::debug!("service worker event: {}", event.kind());
        let result = match event {
            WorkerEvent::Install => self.clients.skip_waiting().await,
            WorkerEvent::Activate => {
                let claimed = self.clients.claim().await;
                self.active.set(true);
                claimed
            }
            WorkerEvent::Push(data) => self.on_push(data.as_deref()).await,
            WorkerEvent::NotificationClick(notification) => self.on_click(notification.as_ref()).await,
        };
        if let Err(e) = &result {
            log::error!("{}", e);
        }
        result
    }

    async fn on_push(&self, data: Option<&str>) -> Result<(), PipelineError> {
        // Pushes only reach an active worker, including one the browser just
        // restarted without replaying install/activate.
        self.active.set(true);
        let _guard = InFlight::enter(&self.pushes_in_flight);

        let request = NotificationRequest::from_payload(PushPayload::parse(data), &self.config);
        self.sink.show_notification(&request).await
    }

    async fn on_click(&self, notification: &dyn ClickedNotification) -> Result<(), PipelineError> {
        self.active.set(true);
        let _guard = InFlight::enter(&self.clicks_in_flight);

        log::info!("notification '{}' clicked", notification.tag());
        notification.close();
        self.clients.open_window(&self.config.click_url).await
    }
}

/// Counts a handler as in flight until dropped.
struct InFlight<'a>(&'a Cell<usize>);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a Cell<usize>) -> Self {
        counter.set(counter.get() + 1);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}
