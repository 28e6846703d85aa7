//! Error types.
//!
//! `FetchError` is the only runtime error: every failure of a remote call
//! maps to it and is recoverable by a later successful call.
//! `ConfigError` reports invalid page geometry at construction time.

use thiserror::Error;

/// A remote call failed or returned an unusable payload.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source refused the request.
    #[error("data source rejected the request: {message}")]
    Rejected { message: String },

    /// The source answered with a payload that could not be used.
    #[error("data source returned a malformed payload: {reason}")]
    Malformed { reason: String },

    /// The transport underneath the source failed.
    #[error("data source transport failed")]
    Transport {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FetchError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub fn transport(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Transport {
            source: source.into(),
        }
    }

    /// Message suitable for an error banner above the table.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message } => format!("Could not load data: {}", message),
            Self::Malformed { .. } => {
                "Could not load data: the server sent an unexpected response.".to_string()
            }
            Self::Transport { source } => format!("Could not reach the server: {}", source),
        }
    }
}

/// Invalid pager configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("page_size must be greater than zero")]
    ZeroPageSize,

    #[error("fetch_size must be greater than zero")]
    ZeroFetchSize,

    #[error("fetch_size ({fetch_size}) must be at least page_size ({page_size})")]
    FetchSmallerThanPage { page_size: usize, fetch_size: usize },

    #[error("fetch_size ({fetch_size}) must be a multiple of page_size ({page_size})")]
    FetchNotMultiple { page_size: usize, fetch_size: usize },

    #[error("initial_page must be at least 1")]
    ZeroInitialPage,

    #[error("failed to parse pager configuration: {source}")]
    Toml {
        #[source]
        source: toml::de::Error,
    },
}
