use wasm_bindgen::prelude::*;

pub mod app;
pub mod components;
pub mod constants; // Storage keys, fallback texts and other fixed values
pub mod dom_utils;
pub mod identity;
pub mod logging;
pub mod models;
pub mod network;
pub mod service_worker;
pub mod storage;
pub mod toast;
pub mod utils;

#[cfg(test)]
mod tests;

pub use app::App;
pub use identity::{IdentityProvider, IdentitySource, RandomTokenSource};
pub use network::{ApiClient, ApiError, Payload, RequestOptions};
pub use service_worker::{NotificationPipeline, WorkerEvent};
pub use storage::KeyValueStore;

// Runs once per module instantiation, in the page and in the service worker
// alike, so it must not touch `window`.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Initialize better panic messages
    console_error_panic_hook::set_once();
    logging::init_logging();
    Ok(())
}
