//! Error types for loading, searching and detail navigation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of characters a search query needs after trimming.
pub const MIN_QUERY_LEN: usize = 3;

/// Failure of a single catalog or detail request.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("unexpected response from {url}: {source}")]
    MalformedResponse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LoaderError {
    /// Transport failures and non-success statuses both count as network errors.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            LoaderError::Network { .. } | LoaderError::HttpStatus { .. }
        )
    }

    pub fn url(&self) -> &str {
        match self {
            LoaderError::Network { url, .. }
            | LoaderError::HttpStatus { url, .. }
            | LoaderError::MalformedResponse { url, .. } => url,
        }
    }
}

/// A search query refused before any filtering happens.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchRejection {
    #[error("Please enter a search term.")]
    Empty,

    #[error("At least {min} letters are required for the search.")]
    TooShort { min: usize },
}

/// Detail cursor could not move.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailBoundary {
    #[error("This is the first Pokémon!")]
    AtStart,

    #[error("This is the last Pokémon!")]
    AtEnd,
}

/// Trim, validate and lowercase a raw search input.
pub fn validate_query(raw: &str) -> Result<String, SearchRejection> {
    let query = raw.trim();
    if query.is_empty() {
        return Err(SearchRejection::Empty);
    }
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(SearchRejection::TooShort {
            min: MIN_QUERY_LEN,
        });
    }
    Ok(query.to_lowercase())
}
