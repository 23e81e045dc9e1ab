//! Wiring between `ServiceWorkerGlobalScope` events and the pipeline.

use std::rc::Rc;

use async_trait::async_trait;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    ClientQueryOptions, ClientType, Event, ExtendableEvent, NotificationEvent, NotificationOptions,
    PushEvent, ServiceWorkerGlobalScope, WindowClient,
};

use super::{
    ClickedNotification, NotificationConfig, NotificationPipeline, NotificationRequest,
    NotificationSink, PipelineError, WorkerClients, WorkerEvent,
};
use crate::utils::{js_error_message, url_path};

impl From<PipelineError> for JsValue {
    fn from(err: PipelineError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

/// Shows notifications through the worker's registration.
struct RegistrationSink {
    scope: ServiceWorkerGlobalScope,
}

#[async_trait(?Send)]
impl NotificationSink for RegistrationSink {
    async fn show_notification(&self, notification: &NotificationRequest) -> Result<(), PipelineError> {
        let display_err = |e: JsValue| PipelineError::Display(js_error_message(&e));

        let options = NotificationOptions::new();
        options.set_body(&notification.body);
        options.set_icon(&notification.icon);
        options.set_badge(&notification.badge);
        options.set_tag(&notification.tag);
        options.set_require_interaction(notification.require_interaction);
        let vibrate = serde_wasm_bindgen::to_value(&notification.vibrate)
            .map_err(|e| PipelineError::Display(e.to_string()))?;
        options.set_vibrate(&vibrate);

        let promise = self
            .scope
            .registration()
            .show_notification_with_options(&notification.title, &options)
            .map_err(display_err)?;
        JsFuture::from(promise).await.map_err(display_err)?;
        Ok(())
    }
}

struct ScopeClients {
    scope: ServiceWorkerGlobalScope,
}

fn clients_err(e: JsValue) -> PipelineError {
    PipelineError::Clients(js_error_message(&e))
}

#[async_trait(?Send)]
impl WorkerClients for ScopeClients {
    async fn skip_waiting(&self) -> Result<(), PipelineError> {
        JsFuture::from(self.scope.skip_waiting().map_err(clients_err)?)
            .await
            .map_err(clients_err)?;
        Ok(())
    }

    async fn claim(&self) -> Result<(), PipelineError> {
        JsFuture::from(self.scope.clients().claim()).await.map_err(clients_err)?;
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<(), PipelineError> {
        let clients = self.scope.clients();

        let query = ClientQueryOptions::new();
        query.set_type(ClientType::Window);
        query.set_include_uncontrolled(true);
        let windows = JsFuture::from(clients.match_all_with_options(&query))
            .await
            .map_err(clients_err)?;

        for client in js_sys::Array::from(&windows).iter() {
            let Ok(window) = client.dyn_into::<WindowClient>() else {
                continue;
            };
            if url_path(&window.url()) == url_path(url) {
                JsFuture::from(window.focus().map_err(clients_err)?)
                    .await
                    .map_err(clients_err)?;
                return Ok(());
            }
        }

        JsFuture::from(clients.open_window(url)).await.map_err(clients_err)?;
        Ok(())
    }
}

struct WebNotification(web_sys::Notification);

impl ClickedNotification for WebNotification {
    fn tag(&self) -> String {
        self.0.tag().unwrap_or_default()
    }

    fn close(&self) {
        self.0.close();
    }
}

fn listen<F>(
    scope: &ServiceWorkerGlobalScope,
    kind: &str,
    pipeline: Rc<NotificationPipeline>,
    to_event: F,
) -> Result<(), JsValue>
where
    F: Fn(&Event) -> Result<WorkerEvent, JsValue> + 'static,
{
    let handler = Closure::wrap(Box::new(move |event: Event| {
        let worker_event = match to_event(&event) {
            Ok(e) => e,
            Err(e) => {
                log::error!("unexpected {} event: {}", event.type_(), js_error_message(&e));
                return;
            }
        };

        let pipeline = pipeline.clone();
        let promise = future_to_promise(async move {
            pipeline.handle(worker_event).await?;
            Ok(JsValue::UNDEFINED)
        });

        if let Err(e) = event.unchecked_ref::<ExtendableEvent>().wait_until(&promise) {
            log::warn!("waitUntil rejected: {}", js_error_message(&e));
        }
    }) as Box<dyn FnMut(Event)>);

    scope.add_event_listener_with_callback(kind, handler.as_ref().unchecked_ref())?;
    // Listeners live as long as the worker.
    handler.forget();
    Ok(())
}

/// Entry point for the service worker script: registers the install,
/// activate, push and notificationclick handlers on the global scope.
#[wasm_bindgen]
pub fn start_service_worker() -> Result<(), JsValue> {
    crate::logging::init_logging();

    let scope: ServiceWorkerGlobalScope = js_sys::global().dyn_into()?;
    let pipeline = Rc::new(NotificationPipeline::new(
        NotificationConfig::default(),
        Rc::new(RegistrationSink { scope: scope.clone() }),
        Rc::new(ScopeClients { scope: scope.clone() }),
    ));

    listen(&scope, "install", pipeline.clone(), |_| Ok(WorkerEvent::Install))?;
    listen(&scope, "activate", pipeline.clone(), |_| Ok(WorkerEvent::Activate))?;
    listen(&scope, "push", pipeline.clone(), |event| {
        let push = event.dyn_ref::<PushEvent>().ok_or("not a PushEvent")?;
        Ok(WorkerEvent::Push(push.data().map(|data| data.text())))
    })?;
    listen(&scope, "notificationclick", pipeline, |event| {
        let click = event.dyn_ref::<NotificationEvent>().ok_or("not a NotificationEvent")?;
        Ok(WorkerEvent::NotificationClick(Box::new(WebNotification(click.notification()))))
    })?;

    log::info!("service worker handlers registered");
    Ok(())
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn notification(tag: Option<&str>) -> Option<web_sys::Notification> {
        let options = NotificationOptions::new();
        if let Some(tag) = tag {
            options.set_tag(tag);
        }
        // Page-context constructor is unavailable on some platforms (Android).
        web_sys::Notification::new_with_options("t", &options).ok()
    }

    #[wasm_bindgen_test]
    fn clicked_notification_reports_its_tag() {
        let Some(tagged) = notification(Some("suggestion")) else { return };
        let clicked = WebNotification(tagged);
        assert_eq!(clicked.tag(), "suggestion");
        clicked.close();

        let Some(untagged) = notification(None) else { return };
        let clicked = WebNotification(untagged);
        assert_eq!(clicked.tag(), "");
        clicked.close();
    }
}
