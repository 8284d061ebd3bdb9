//! Query API client for the content backend.
//!
//! Wraps the HTTP query endpoint using [`reqwest`]. Only published
//! documents are requested.

use menuboard_core::model::MenuDocuments;
use serde::Deserialize;

use crate::config::ContentConfig;
use crate::error::ContentError;
use crate::queries;

/// Envelope returned by the query endpoint.
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// HTTP client for one project/dataset.
#[derive(Clone)]
pub struct ContentApi {
    client: reqwest::Client,
    config: ContentConfig,
    menu_query: String,
}

impl ContentApi {
    pub fn new(config: ContentConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: ContentConfig) -> Self {
        Self {
            client,
            config,
            menu_query: queries::menu_query(),
        }
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Fetch settings, the active board and every secondary screen in
    /// one round trip.
    pub async fn fetch_menu(&self) -> Result<MenuDocuments, ContentError> {
        self.query(&self.menu_query).await
    }

    /// Run a GROQ query against the published perspective.
    pub async fn query<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
    ) -> Result<T, ContentError> {
        let mut request = self
            .client
            .get(self.config.query_url())
            .query(&[("query", query), ("perspective", "published")]);
        if let Some(token) = self.config.token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let envelope: QueryResponse<T> = Self::parse_response(response).await?;
        Ok(envelope.result)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`ContentError::Api`]
    /// containing the status and body text on failure.
    pub(crate) async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ContentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ContentError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ContentError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_envelope_unwraps_result() {
        let body = json!({
            "ms": 12,
            "query": "...",
            "result": {
                "settings": { "ignoreStockLevels": true, "activeBoard": null },
                "secondaryScreens": [{ "_id": "promo", "triggerKey": "p" }]
            }
        });

        let envelope: QueryResponse<MenuDocuments> = serde_json::from_value(body).unwrap();
        let docs = envelope.result;
        assert!(docs.settings.as_ref().unwrap().ignore_stock_levels);
        assert!(docs.settings.unwrap().active_board.is_none());
        assert_eq!(docs.secondary_screens[0].id, "promo");
    }

    #[test]
    fn null_settings_is_accepted() {
        let envelope: QueryResponse<MenuDocuments> =
            serde_json::from_value(json!({ "result": { "settings": null, "secondaryScreens": null } }))
                .unwrap();
        assert!(envelope.result.settings.is_none());
        assert!(envelope.result.secondary_screens.is_empty());
    }
}
