use async_trait::async_trait;
use clad_types::{Result, RewardError, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Validated identity handed to the engine. Raw credential strings never
/// cross this boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous(UserId),
    Authenticated(UserId),
}

impl Identity {
    pub fn user_id(&self) -> &UserId {
        match self {
            Identity::Anonymous(id) | Identity::Authenticated(id) => id,
        }
    }
}

/// Resolution of a non-anonymous bearer token to a subject id; backed by the
/// deployment's identity provider.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserId>;
}

/// Default verifier: no identity provider configured, every authenticated
/// token is rejected. Anonymous access still works through the anon key.
pub struct DenyAllVerifier;

#[async_trait]
impl TokenVerifier for DenyAllVerifier {
    async fn verify(&self, _token: &str) -> Result<UserId> {
        Err(RewardError::Unauthorized)
    }
}

/// Fixed token table, mainly for tests and single-tenant deployments.
pub struct StaticTokenVerifier {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, UserId>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserId> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(RewardError::Unauthorized)
    }
}

/// Maps inbound credentials to a stable `Identity`.
///
/// Two accepted shapes: the shared anon key plus an `anon_`-prefixed
/// `X-User-ID` header resolves anonymous, any other bearer token goes
/// through the `TokenVerifier`.
pub struct AuthResolver {
    anon_key: String,
    verifier: Arc<dyn TokenVerifier>,
}

impl AuthResolver {
    pub fn new(anon_key: String, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { anon_key, verifier }
    }

    pub async fn resolve(
        &self,
        auth_header: Option<&str>,
        user_id_header: Option<&str>,
    ) -> Result<Identity> {
        let header = auth_header.ok_or(RewardError::Unauthorized)?;
        // Only the Bearer scheme is accepted; a raw token is malformed.
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(RewardError::Unauthorized)?
            .trim();
        if token.is_empty() {
            return Err(RewardError::Unauthorized);
        }

        if !self.anon_key.is_empty() && token == self.anon_key {
            return match user_id_header {
                Some(device_id) if device_id.starts_with("anon_") => {
                    let id = UserId::new(device_id)?;
                    debug!(user = %id, "Resolved anonymous identity");
                    Ok(Identity::Anonymous(id))
                }
                _ => Err(RewardError::Unauthorized),
            };
        }

        let id = self.verifier.verify(token).await?;
        debug!(user = %id, "Resolved authenticated identity");
        Ok(Identity::Authenticated(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> AuthResolver {
        let mut tokens = HashMap::new();
        tokens.insert(
            "valid_token".to_string(),
            UserId::new("7f9c2ba4-e88f").unwrap(),
        );
        AuthResolver::new(
            "anon_key_123".to_string(),
            Arc::new(StaticTokenVerifier::new(tokens)),
        )
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let err = resolver().resolve(None, None).await.unwrap_err();
        assert_eq!(err, RewardError::Unauthorized);
    }

    #[tokio::test]
    async fn test_token_without_bearer_scheme_is_rejected() {
        let r = resolver();

        // A bare anon key or token must not bypass the scheme check.
        assert_eq!(
            r.resolve(Some("anon_key_123"), Some("anon_device9"))
                .await
                .unwrap_err(),
            RewardError::Unauthorized
        );
        assert_eq!(
            r.resolve(Some("valid_token"), None).await.unwrap_err(),
            RewardError::Unauthorized
        );
        assert_eq!(
            r.resolve(Some("Basic dXNlcjpwdw=="), None).await.unwrap_err(),
            RewardError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_anon_key_requires_anon_prefixed_device_id() {
        let r = resolver();

        let identity = r
            .resolve(Some("Bearer anon_key_123"), Some("anon_device9"))
            .await
            .unwrap();
        assert_eq!(
            identity,
            Identity::Anonymous(UserId::new("anon_device9").unwrap())
        );

        // Anon key with a non-anon id must not mint an identity.
        assert_eq!(
            r.resolve(Some("Bearer anon_key_123"), Some("admin"))
                .await
                .unwrap_err(),
            RewardError::Unauthorized
        );
        assert_eq!(
            r.resolve(Some("Bearer anon_key_123"), None)
                .await
                .unwrap_err(),
            RewardError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_bearer_token_resolves_authenticated() {
        let identity = resolver()
            .resolve(Some("Bearer valid_token"), None)
            .await
            .unwrap();
        assert_eq!(
            identity,
            Identity::Authenticated(UserId::new("7f9c2ba4-e88f").unwrap())
        );

        assert_eq!(
            resolver()
                .resolve(Some("Bearer forged"), None)
                .await
                .unwrap_err(),
            RewardError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_deny_all_verifier_rejects_tokens() {
        let r = AuthResolver::new("anon_key_123".to_string(), Arc::new(DenyAllVerifier));
        assert_eq!(
            r.resolve(Some("Bearer something"), None).await.unwrap_err(),
            RewardError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_empty_anon_key_never_matches() {
        let r = AuthResolver::new(String::new(), Arc::new(DenyAllVerifier));
        // An empty configured key must not let an empty token through.
        assert_eq!(
            r.resolve(Some("Bearer "), Some("anon_x")).await.unwrap_err(),
            RewardError::Unauthorized
        );
    }
}
