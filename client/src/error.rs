// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use thiserror::Error;

/// Transport failures surfaced to callers of store mutations.
///
/// Validation problems are not errors: a mutation with a blank required
/// field is silently refused.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-2xx status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("expected a response body but the server sent none")]
    EmptyBody,

    /// The identifier is not one the service could have issued.
    #[error("invalid identifier {0:?}")]
    InvalidId(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
