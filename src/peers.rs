//! Peer address normalization
//!
//! Peer identity is the normalized `host[:port][/path]` form, not the raw
//! string a caller registered. Normalization is its own function so that
//! "which URLs count as the same peer" is an explicit, tested rule instead
//! of a side effect of whatever a generic URL parser happens to keep.

use crate::error::{ChainError, Result};
use url::Url;

/// Reduce a peer location string to its canonical `host[:port][/path]` form.
///
/// Scheme and trailing slashes are dropped, so `http://host:5000/` and
/// `http://host:5000` collapse to the same entry. A bare `host:port` without
/// a scheme is accepted. No reachability check happens here; a bad peer only
/// surfaces when it is contacted.
pub fn normalize_peer(address: &str) -> Result<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ChainError::InvalidPeerAddress(
            "empty peer address".to_string(),
        ));
    }

    // Url::parse treats "host:5000" as scheme "host"; give schemeless input
    // an explicit one before parsing.
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| ChainError::InvalidPeerAddress(format!("{}: {}", address, e)))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| ChainError::InvalidPeerAddress(format!("{}: missing host", address)))?;

    let mut normalized = host.to_string();
    if let Some(port) = parsed.port() {
        normalized.push_str(&format!(":{}", port));
    }

    let path = parsed.path().trim_end_matches('/');
    if !path.is_empty() {
        normalized.push_str(path);
    }

    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_does_not_matter() {
        assert_eq!(
            normalize_peer("http://host:5000/").unwrap(),
            normalize_peer("http://host:5000").unwrap()
        );
    }

    #[test]
    fn scheme_is_dropped() {
        assert_eq!(normalize_peer("http://host:5000").unwrap(), "host:5000");
        assert_eq!(normalize_peer("https://host:5000").unwrap(), "host:5000");
    }

    #[test]
    fn schemeless_host_port_is_accepted() {
        assert_eq!(normalize_peer("host:5000").unwrap(), "host:5000");
        assert_eq!(normalize_peer("192.168.0.7:5000").unwrap(), "192.168.0.7:5000");
    }

    #[test]
    fn non_root_path_is_kept() {
        assert_eq!(
            normalize_peer("http://example.com/node/").unwrap(),
            "example.com/node"
        );
    }

    #[test]
    fn host_without_port_is_just_the_host() {
        assert_eq!(normalize_peer("http://example.com").unwrap(), "example.com");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(normalize_peer("").is_err());
        assert!(normalize_peer("   ").is_err());
        assert!(normalize_peer("http://").is_err());
    }
}
