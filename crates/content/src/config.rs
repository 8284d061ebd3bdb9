//! Connection settings for the content backend.

/// Default dataset name.
pub const DEFAULT_DATASET: &str = "production";

/// Default API version (date-based).
pub const DEFAULT_API_VERSION: &str = "2023-05-03";

/// Where the content lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub project_id: String,
    pub dataset: String,
    /// Date-based API version, with or without a leading `v`.
    pub api_version: String,
    /// Read token; anonymous access when absent.
    pub token: Option<String>,
    /// Base URL override (e.g. a local proxy). Defaults to the
    /// project's API host.
    pub api_host: Option<String>,
}

impl ContentConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            dataset: DEFAULT_DATASET.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: None,
            api_host: None,
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> String {
        match self.api_host.as_deref() {
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.sanity.io", self.project_id),
        }
    }

    fn versioned(&self, endpoint: &str) -> String {
        let version = self.api_version.trim_start_matches('v');
        format!(
            "{}/v{version}/data/{endpoint}/{}",
            self.base_url(),
            self.dataset
        )
    }

    /// Endpoint for GROQ queries.
    pub fn query_url(&self) -> String {
        self.versioned("query")
    }

    /// Endpoint for the change-notification event stream.
    pub fn listen_url(&self) -> String {
        self.versioned("listen")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls_use_project_host() {
        let config = ContentConfig::new("abc123");
        assert_eq!(
            config.query_url(),
            "https://abc123.api.sanity.io/v2023-05-03/data/query/production"
        );
        assert_eq!(
            config.listen_url(),
            "https://abc123.api.sanity.io/v2023-05-03/data/listen/production"
        );
    }

    #[test]
    fn host_override_and_prefixed_version() {
        let config = ContentConfig {
            api_version: "v2024-01-01".into(),
            dataset: "staging".into(),
            api_host: Some("http://127.0.0.1:9000/".into()),
            ..ContentConfig::new("abc123")
        };
        assert_eq!(
            config.query_url(),
            "http://127.0.0.1:9000/v2024-01-01/data/query/staging"
        );
    }
}
