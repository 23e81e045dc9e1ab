// Re-export network modules
pub mod api_client;
pub mod config;
pub mod response;
pub mod transport;

// Re-export commonly used items
pub use api_client::{ApiClient, RequestOptions};
pub use config::{ApiConfig, ClientConfig, EndpointResolver, PageLocation};
pub use response::{ApiError, ApiResult, Payload};
pub use transport::{FetchTransport, HttpRequest, HttpResponse, HttpTransport, Method, TransportError};

#[cfg(test)]
mod tests;
