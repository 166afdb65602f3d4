//! Grafana client authentication
//!
//! Grafana accepts several credential forms on the management API. The
//! secret string passed on the command line (or env) selects the form by
//! prefix:
//!
//! - `glsa_...` - service account token, sent as `Authorization: Bearer`
//! - `ey...` - JWT (api key), sent as `Authorization: Bearer`
//! - `grafana_session=...` - browser session cookie, sent as `Cookie`
//!
//! Anything else is treated as a bearer token: plain Grafana API keys carry
//! no reserved prefix, and a wrong guess fails the connectivity check with
//! the same error the user would get for a bad token.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// How the secret is attached to outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum CredentialKind {
    /// `Authorization: Bearer <token>`
    BearerToken,
    /// raw `Cookie: grafana_session=...` header
    SessionCookie,
}

/// An authentication secret for a Grafana instance.
///
/// The inner value is zeroized on drop and never appears in Debug output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    #[zeroize(skip)]
    kind: CredentialKind,
    secret: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .field("secret", &"***")
            .finish()
    }
}

impl Credential {
    /// Classifies a secret string by its prefix.
    pub fn parse(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        let kind = if secret.starts_with("grafana_session=") {
            CredentialKind::SessionCookie
        } else {
            // glsa_ service account tokens, ey.. JWTs, and plain api keys
            CredentialKind::BearerToken
        };
        Self { kind, secret }
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    /// Applies the credential to a request builder.
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.kind {
            CredentialKind::BearerToken => builder.bearer_auth(&self.secret),
            CredentialKind::SessionCookie => builder.header(reqwest::header::COOKIE, &self.secret),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_account_token_is_bearer() {
        let cred = Credential::parse("glsa_abc123");
        assert_eq!(cred.kind(), CredentialKind::BearerToken);
    }

    #[test]
    fn test_jwt_is_bearer() {
        let cred = Credential::parse("eyJhbGciOiJIUzI1NiJ9.x.y");
        assert_eq!(cred.kind(), CredentialKind::BearerToken);
    }

    #[test]
    fn test_session_cookie() {
        let cred = Credential::parse("grafana_session=deadbeef");
        assert_eq!(cred.kind(), CredentialKind::SessionCookie);
    }

    #[test]
    fn test_unknown_prefix_falls_back_to_bearer() {
        let cred = Credential::parse("some-plain-api-key");
        assert_eq!(cred.kind(), CredentialKind::BearerToken);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let cred = Credential::parse("glsa_super_secret");
        let debug = format!("{cred:?}");
        assert!(!debug.contains("super_secret"));
    }
}
