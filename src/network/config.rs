use crate::constants::{
    API_BASE_OVERRIDE_STORAGE_KEY, BACKEND_DEV_PORT, DEV_API_BASE, IDENTITY_PATH_PREFIXES,
    LOOPBACK_HOSTS, SAME_ORIGIN_API_BASE, STUDENT_KEY_HEADER,
};
use crate::storage::KeyValueStore;

/// Resolved API base.  Built once per page load and never mutated; changing
/// the override only takes effect after a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    base_url: String,
}

impl Default for ApiConfig {
    /// Same-origin `/api`, which is what production pages resolve to.
    fn default() -> Self {
        Self::from_url(SAME_ORIGIN_API_BASE)
    }
}

impl ApiConfig {
    /// Create a new ApiConfig from a URL string
    pub fn from_url(url: &str) -> Self {
        Self { base_url: url.trim_end_matches('/').to_string() }
    }

    /// Get the base URL for all API calls
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a path.  Plain concatenation, `path` is expected to start
    /// with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Tunables for endpoint resolution and identity attachment.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub loopback_hosts: Vec<String>,
    /// Port the backend itself listens on during development.  Pages served
    /// from any other loopback port are treated as a frontend dev server.
    pub backend_dev_port: String,
    pub dev_api_base: String,
    pub same_origin_api_base: String,
    pub override_storage_key: String,
    pub identity_header: String,
    pub identity_path_prefixes: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            loopback_hosts: LOOPBACK_HOSTS.iter().map(|h| h.to_string()).collect(),
            backend_dev_port: BACKEND_DEV_PORT.to_string(),
            dev_api_base: DEV_API_BASE.to_string(),
            same_origin_api_base: SAME_ORIGIN_API_BASE.to_string(),
            override_storage_key: API_BASE_OVERRIDE_STORAGE_KEY.to_string(),
            identity_header: STUDENT_KEY_HEADER.to_string(),
            identity_path_prefixes: IDENTITY_PATH_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ClientConfig {
    /// Whether requests to `path` carry the student key.
    pub fn requires_identity(&self, path: &str) -> bool {
        self.identity_path_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

/// Hostname/port snapshot of the page that loaded the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLocation {
    pub hostname: String,
    /// Empty when the URL uses the scheme's default port.
    pub port: String,
}

impl PageLocation {
    pub fn new(hostname: &str, port: &str) -> Self {
        Self { hostname: hostname.to_string(), port: port.to_string() }
    }

    /// Read `window.location`.  `None` outside a window context.
    pub fn from_window() -> Option<Self> {
        let location = web_sys::window()?.location();
        Some(Self {
            hostname: location.hostname().ok()?,
            port: location.port().unwrap_or_default(),
        })
    }
}

pub struct EndpointResolver<'a> {
    config: &'a ClientConfig,
}

impl<'a> EndpointResolver<'a> {
    pub fn new(config: &'a ClientConfig) -> Self {
        Self { config }
    }

    /// Pick the API base: stored override first, then the dev-server
    /// convention, then same-origin.
    pub fn resolve(&self, location: &PageLocation, override_url: Option<&str>) -> ApiConfig {
        if let Some(url) = override_url.filter(|u| !u.is_empty()) {
            return ApiConfig::from_url(url);
        }

        if self.is_frontend_dev_server(location) {
            ApiConfig::from_url(&self.config.dev_api_base)
        } else {
            ApiConfig::from_url(&self.config.same_origin_api_base)
        }
    }

    /// Same as [`resolve`](Self::resolve), reading the override from storage.
    pub fn resolve_from_store(&self, location: &PageLocation, store: &dyn KeyValueStore) -> ApiConfig {
        let override_url = store.get(&self.config.override_storage_key);
        let config = self.resolve(location, override_url.as_deref());
        log::info!("API base resolved to '{}'", config.base_url());
        config
    }

    fn is_frontend_dev_server(&self, location: &PageLocation) -> bool {
        let is_local = self.config.loopback_hosts.iter().any(|h| *h == location.hostname);
        is_local && !location.port.is_empty() && location.port != self.config.backend_dev_port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;

    fn resolve(host: &str, port: &str, override_url: Option<&str>) -> String {
        let config = ClientConfig::default();
        EndpointResolver::new(&config)
            .resolve(&PageLocation::new(host, port), override_url)
            .base_url()
            .to_string()
    }

    #[test]
    fn override_wins_and_loses_trailing_slash() {
        assert_eq!(resolve("localhost", "5173", Some("https://api.example.com/")), "https://api.example.com");
        assert_eq!(resolve("school.example", "", Some("https://api.example.com/api")), "https://api.example.com/api");
    }

    #[test]
    fn empty_override_is_ignored() {
        assert_eq!(resolve("school.example", "", Some("")), "/api");
    }

    #[test]
    fn non_empty_override_is_taken_verbatim() {
        assert_eq!(resolve("school.example", "", Some(" ")), " ");
        assert_eq!(resolve("localhost", "5173", Some("/proxy/api//")), "/proxy/api");
    }

    #[test]
    fn loopback_dev_port_uses_local_backend() {
        assert_eq!(resolve("localhost", "5173", None), "http://localhost:8000/api");
        assert_eq!(resolve("127.0.0.1", "3000", None), "http://localhost:8000/api");
    }

    #[test]
    fn backend_port_or_default_port_is_same_origin() {
        assert_eq!(resolve("localhost", "8000", None), "/api");
        assert_eq!(resolve("localhost", "", None), "/api");
        assert_eq!(resolve("school.example", "5173", None), "/api");
    }

    #[test]
    fn reads_override_from_store() {
        let store = MemoryStore::with_item(API_BASE_OVERRIDE_STORAGE_KEY, "http://10.0.0.2:8000/api/");
        let config = ClientConfig::default();
        let api = EndpointResolver::new(&config)
            .resolve_from_store(&PageLocation::new("localhost", "5173"), &store);
        assert_eq!(api.base_url(), "http://10.0.0.2:8000/api");
        assert_eq!(api.url("/health"), "http://10.0.0.2:8000/api/health");
    }

    #[test]
    fn identity_prefixes() {
        let config = ClientConfig::default();
        assert!(config.requires_identity("/suggestions"));
        assert!(config.requires_identity("/suggestions?page=2"));
        assert!(config.requires_identity("/me/suggestions"));
        assert!(config.requires_identity("/push/subscribe"));
        assert!(!config.requires_identity("/me"));
        assert!(!config.requires_identity("/health"));
        assert!(!config.requires_identity("/admin/suggestions"));
    }

    proptest! {
        #[test]
        fn resolution_is_deterministic_and_slash_free(
            host in prop_oneof![Just("localhost".to_string()), Just("127.0.0.1".to_string()), "[a-z]{1,10}\\.example"],
            port in prop_oneof![Just(String::new()), Just("8000".to_string()), "[1-9][0-9]{0,4}"],
            override_url in proptest::option::of("https?://[a-z]{1,8}(:[0-9]{2,4})?(/[a-z]{1,5}){0,2}/{0,3}"),
        ) {
            let first = resolve(&host, &port, override_url.as_deref());
            let second = resolve(&host, &port, override_url.as_deref());
            prop_assert_eq!(&first, &second);
            prop_assert!(!first.ends_with('/'));
        }
    }
}
