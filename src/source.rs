//! Where exposition text comes from.
//!
//! The dashboard normally issues a plain HTTP GET against the metrics
//! endpoint. A local file can stand in for the endpoint, which is handy for
//! offline use and for tests.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A source of exposition text.
#[derive(Debug, Clone)]
pub enum MetricsSource {
    Http {
        client: reqwest::Client,
        url: String,
    },
    File(PathBuf),
}

impl MetricsSource {
    /// HTTP source with an optional request timeout.
    pub fn http(url: &str, timeout: Option<Duration>) -> Result<Self, SourceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(SourceError::Client)?;
        Ok(Self::Http {
            client,
            url: url.to_string(),
        })
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Picks the file source when configured, the HTTP endpoint otherwise.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        match &config.source_file {
            Some(path) => Ok(Self::file(path.clone())),
            None => Self::http(config.endpoint(), config.fetch_timeout()),
        }
    }

    /// Human readable location, used in logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Http { url, .. } => url.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Fetches the raw exposition text.
    #[instrument(skip(self), fields(source = %self.describe()))]
    pub async fn fetch(&self) -> Result<String, SourceError> {
        match self {
            Self::Http { client, url } => {
                let response = client
                    .get(url.as_str())
                    .send()
                    .await
                    .map_err(|source| SourceError::Request {
                        url: url.clone(),
                        source,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }

                let text = response.text().await.map_err(|source| SourceError::Body {
                    url: url.clone(),
                    source,
                })?;
                debug!("Fetched {} bytes", text.len());
                Ok(text)
            }
            Self::File(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| SourceError::File {
                        path: path.clone(),
                        source,
                    })?;
                debug!("Read {} bytes", text.len());
                Ok(text)
            }
        }
    }
}
