//! Shared handler utilities
//!
//! Request-field parsing and metrics helpers used across handlers, so
//! validation happens in one place.

use std::time::Instant;

use careerpro_types::{Service, UserId};

use crate::error::ApiError;

/// Parse a user ID field
pub fn parse_user_id(value: &str) -> Result<UserId, ApiError> {
    UserId::parse(value).map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))
}

/// Parse a service field against the closed service set
pub fn parse_service(value: &str) -> Result<Service, ApiError> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid service: {value}")))
}

/// Record operation duration with a result label.
///
/// One helper so every handler emits the same metric shape.
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "careerpro_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_user_id_accepts_uuids_only() {
        assert!(parse_user_id("6b8f4a2e-1a9b-4a53-9df1-5be6fcb0a1cd").is_ok());
        assert!(parse_user_id("not-a-uuid").is_err());
        assert!(parse_user_id("").is_err());
    }

    #[test]
    fn parse_service_is_closed() {
        assert_eq!(parse_service("cv").unwrap(), Service::Cv);
        assert_eq!(parse_service("cover_letter").unwrap(), Service::CoverLetter);
        assert!(parse_service("resume").is_err());
        assert!(parse_service("").is_err());
    }
}
