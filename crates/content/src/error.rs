/// Errors from talking to the content backend.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Content API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A response or event payload did not match the expected shape.
    #[error("Malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The listener reported an error on its channel.
    #[error("Listener channel error: {0}")]
    Channel(String),

    /// The change stream ended.
    #[error("Listener disconnected: {0}")]
    Disconnected(String),

    /// A listener line grew past the decoder's limit.
    #[error("Listener line too long ({0} bytes)")]
    LineTooLong(usize),
}
