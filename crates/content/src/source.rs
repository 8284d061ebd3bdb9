//! The seam between the synchronizer and the content backend.

use async_trait::async_trait;
use menuboard_core::model::MenuDocuments;

use crate::api::ContentApi;
use crate::config::ContentConfig;
use crate::error::ContentError;
use crate::listener::{self, ChangeStream};

/// Something that can load the menu and notify about changes to it.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Fetch the complete set of menu documents.
    async fn fetch_menu(&self) -> Result<MenuDocuments, ContentError>;

    /// Open one change-notification subscription.
    async fn listen(&self) -> Result<ChangeStream, ContentError>;
}

/// Production source backed by the HTTP query and listen endpoints.
#[derive(Clone)]
pub struct HttpContentSource {
    api: ContentApi,
}

impl HttpContentSource {
    pub fn new(config: ContentConfig) -> Self {
        Self {
            api: ContentApi::new(config),
        }
    }

    pub fn api(&self) -> &ContentApi {
        &self.api
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn fetch_menu(&self) -> Result<MenuDocuments, ContentError> {
        self.api.fetch_menu().await
    }

    async fn listen(&self) -> Result<ChangeStream, ContentError> {
        listener::open(&self.api).await
    }
}
