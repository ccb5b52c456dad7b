//! Shared-secret access guard
//!
//! Every data endpoint presents the secret in the `X-API-KEY` header. The
//! guard compares it against the configured secret in constant time over the
//! content, so response timing does not reveal how many leading bytes matched.

use subtle::ConstantTimeEq;

use crate::{Error, Result};

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared-secret credential check gating fetch and acknowledge
#[derive(Clone)]
pub struct AccessGuard {
    secret: Vec<u8>,
}

// Keep the secret out of logs
impl std::fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGuard")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl AccessGuard {
    /// Create a guard for the given secret.
    ///
    /// An empty secret is refused: a request without the header would
    /// otherwise match it.
    pub fn new(secret: impl Into<String>) -> Result<Self> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(Error::Config("API key must not be empty".to_string()));
        }
        Ok(Self {
            secret: secret.into_bytes(),
        })
    }

    /// Returns true if the presented credential matches exactly
    pub fn is_allowed(&self, presented: Option<&str>) -> bool {
        match presented {
            Some(key) => key.as_bytes().ct_eq(&self.secret).into(),
            None => false,
        }
    }

    /// Check the presented credential
    ///
    /// # Examples
    ///
    /// ```
    /// use fpsync_common::AccessGuard;
    ///
    /// let guard = AccessGuard::new("s3cret").unwrap();
    /// assert!(guard.check(Some("s3cret")).is_ok());
    /// assert!(guard.check(Some("S3CRET")).is_err());
    /// assert!(guard.check(None).is_err());
    /// ```
    pub fn check(&self, presented: Option<&str>) -> Result<()> {
        if self.is_allowed(presented) {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_allowed() {
        let guard = AccessGuard::new("abc123").unwrap();
        assert!(guard.is_allowed(Some("abc123")));
    }

    #[test]
    fn test_wrong_key_denied() {
        let guard = AccessGuard::new("abc123").unwrap();

        assert!(!guard.is_allowed(Some("abc124")));
        assert!(!guard.is_allowed(Some("abc12")));
        assert!(!guard.is_allowed(Some("abc1234")));
        assert!(!guard.is_allowed(Some(" abc123")));
        assert!(!guard.is_allowed(Some("")));
    }

    #[test]
    fn test_missing_key_denied() {
        let guard = AccessGuard::new("abc123").unwrap();
        assert!(matches!(guard.check(None), Err(Error::Unauthorized)));
    }

    #[test]
    fn test_empty_secret_rejected() {
        let result = AccessGuard::new("");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let guard = AccessGuard::new("topsecret").unwrap();
        let debug = format!("{:?}", guard);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("REDACTED"));
    }
}
