//! Typed errors for management-plane operations.
//!
//! Service HTTP failures surface as [`ManagementError::Api`] with the
//! service's error code, the HTTP status, and the request id when the
//! service echoed one; classification helpers cover the statuses callers
//! branch on.

use crate::common::HttpError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManagementError {
    /// The service answered with an error payload.
    #[error("{operation} failed: {code} (HTTP {status_code}) - {message}")]
    Api {
        /// Service error code, e.g. `SubscriptionNotFound`.
        code: String,
        status_code: u16,
        message: String,
        /// Service-side request id for support tickets.
        request_id: Option<String>,
        /// The operation that failed, e.g. `list_subscriptions`.
        operation: &'static str,
    },

    /// The service throttled the request (HTTP 429).
    #[error("request throttled by the service, retry after {retry_after:?}")]
    Throttled { retry_after: Duration },

    /// The request never produced a service response.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The response body could not be decoded into the expected model.
    #[error("failed to decode {operation} response: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },
}

impl ManagementError {
    /// The HTTP status of a service-level failure, if there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ManagementError::Api { status_code, .. } => Some(*status_code),
            ManagementError::Throttled { .. } => Some(429),
            _ => None,
        }
    }

    /// Whether the failure was a missing resource (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Whether the failure was an authentication or authorization
    /// rejection (HTTP 401/403).
    pub fn is_authentication_error(&self) -> bool {
        matches!(self.status_code(), Some(401) | Some(403))
    }

    /// The service-side request id, when the service echoed one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ManagementError::Api { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status_code: u16) -> ManagementError {
        ManagementError::Api {
            code: "SomeCode".to_string(),
            status_code,
            message: "something went wrong".to_string(),
            request_id: Some("req-1".to_string()),
            operation: "list_subscriptions",
        }
    }

    #[test]
    fn test_status_classification() {
        assert!(api_error(404).is_not_found());
        assert!(api_error(401).is_authentication_error());
        assert!(api_error(403).is_authentication_error());
        assert!(!api_error(500).is_not_found());

        let throttled = ManagementError::Throttled {
            retry_after: Duration::from_secs(5),
        };
        assert_eq!(throttled.status_code(), Some(429));
    }

    #[test]
    fn test_api_error_message_format() {
        assert_eq!(
            api_error(404).to_string(),
            "list_subscriptions failed: SomeCode (HTTP 404) - something went wrong"
        );
        assert_eq!(api_error(404).request_id(), Some("req-1"));
    }
}
