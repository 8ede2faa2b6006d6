//! Caller resolution for forwarded requests
//!
//! Every mutating request names its caller in `x-caller-address`. When that
//! caller is the trusted forwarder, the original sender it relays for is
//! taken from `x-forwarded-sender` instead. Forwarded-sender headers from any
//! other caller are ignored.

use axum::http::HeaderMap;
use cosmo_core::Address;
use thiserror::Error;

pub const CALLER_HEADER: &str = "x-caller-address";
pub const FORWARDED_SENDER_HEADER: &str = "x-forwarded-sender";

#[derive(Debug, Error)]
pub enum CallerError {
    #[error("Missing {0} header")]
    Missing(&'static str),

    #[error("Invalid {header} header: {reason}")]
    Invalid {
        header: &'static str,
        reason: String,
    },
}

fn header_address(headers: &HeaderMap, name: &'static str) -> Result<Option<Address>, CallerError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let text = value.to_str().map_err(|e| CallerError::Invalid {
        header: name,
        reason: e.to_string(),
    })?;
    Address::parse(text.trim())
        .map(Some)
        .map_err(|e| CallerError::Invalid {
            header: name,
            reason: e.to_string(),
        })
}

/// Resolve the identity an operation acts for
pub fn resolve_caller(
    headers: &HeaderMap,
    trusted_forwarder: Option<&Address>,
) -> Result<Address, CallerError> {
    let caller = header_address(headers, CALLER_HEADER)?.ok_or(CallerError::Missing(CALLER_HEADER))?;

    if trusted_forwarder == Some(&caller) {
        if let Some(sender) = header_address(headers, FORWARDED_SENDER_HEADER)? {
            tracing::debug!("Forwarded call from {} for {}", caller.short(), sender.short());
            return Ok(sender);
        }
    }
    Ok(caller)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const FORWARDER: &str = "0x61f2976610970afedc1d83229e1e21bdc3d5cbe4";
    const USER: &str = "0x1111111111111111111111111111111111111111";
    const OTHER: &str = "0x2222222222222222222222222222222222222222";

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_direct_caller() {
        let forwarder = Address::parse(FORWARDER).unwrap();
        let resolved = resolve_caller(&headers(&[(CALLER_HEADER, USER)]), Some(&forwarder)).unwrap();
        assert_eq!(resolved.to_string(), USER);
    }

    #[test]
    fn test_forwarder_unwraps_sender() {
        let forwarder = Address::parse(FORWARDER).unwrap();
        let map = headers(&[(CALLER_HEADER, FORWARDER), (FORWARDED_SENDER_HEADER, USER)]);
        let resolved = resolve_caller(&map, Some(&forwarder)).unwrap();
        assert_eq!(resolved.to_string(), USER);

        // without a forwarded sender the forwarder acts for itself
        let map = headers(&[(CALLER_HEADER, FORWARDER)]);
        assert_eq!(resolve_caller(&map, Some(&forwarder)).unwrap(), forwarder);
    }

    #[test]
    fn test_untrusted_forwarded_header_ignored() {
        let forwarder = Address::parse(FORWARDER).unwrap();
        let map = headers(&[(CALLER_HEADER, OTHER), (FORWARDED_SENDER_HEADER, USER)]);
        let resolved = resolve_caller(&map, Some(&forwarder)).unwrap();
        assert_eq!(resolved.to_string(), OTHER);

        // no forwarder configured
        let resolved = resolve_caller(&map, None).unwrap();
        assert_eq!(resolved.to_string(), OTHER);
    }

    #[test]
    fn test_missing_and_malformed_caller() {
        assert!(matches!(
            resolve_caller(&HeaderMap::new(), None),
            Err(CallerError::Missing(CALLER_HEADER))
        ));
        assert!(matches!(
            resolve_caller(&headers(&[(CALLER_HEADER, "0x1234")]), None),
            Err(CallerError::Invalid { .. })
        ));
    }
}
