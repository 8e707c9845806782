//! Identity and id issuance adapters

use crate::domain::TwinId;
use crate::error::{TwinError, TwinResult};
use crate::ports::{IdProvider, IdentityVerifier};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// Verifier backed by a fixed token-to-principal table.
///
/// Suited to single-tenant deployments and tests. Tokens are compared
/// verbatim.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityVerifier {
    principals: HashMap<String, String>,
}

impl StaticIdentityVerifier {
    pub fn new<I, T, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (T, P)>,
        T: Into<String>,
        P: Into<String>,
    {
        Self {
            principals: entries
                .into_iter()
                .map(|(token, principal)| (token.into(), principal.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn identify(&self, token: &str) -> TwinResult<String> {
        if token.is_empty() {
            return Err(TwinError::Unauthorized);
        }
        self.principals
            .get(token)
            .cloned()
            .ok_or(TwinError::Unauthorized)
    }
}

/// Random v4 UUID ids
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdProvider;

impl IdProvider for UuidIdProvider {
    fn id(&self) -> TwinResult<TwinId> {
        Ok(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_token_resolves() {
        let verifier = StaticIdentityVerifier::new([("secret", "alice@example.com")]);
        assert_eq!(verifier.identify("secret").await.unwrap(), "alice@example.com");
    }

    #[tokio::test]
    async fn test_unknown_or_empty_token_rejected() {
        let verifier = StaticIdentityVerifier::new([("secret", "alice@example.com")]);
        assert!(matches!(verifier.identify("guess").await, Err(TwinError::Unauthorized)));
        assert!(matches!(verifier.identify("").await, Err(TwinError::Unauthorized)));
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let provider = UuidIdProvider;
        let a = provider.id().unwrap();
        let b = provider.id().unwrap();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
