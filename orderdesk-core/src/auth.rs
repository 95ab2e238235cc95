use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::error::OrderError;

/// Source of the bearer token attached to every authenticated request.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Claims carried inside the session JWT.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - the username.
    pub sub: String,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default, alias = "authorities")]
    pub roles: Vec<String>,
}

/// Credentials posted to the login endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
}

/// An authenticated session: the raw token and its decoded claims.
#[derive(Debug, Clone)]
pub struct Session {
    token: String,
    claims: Claims,
}

impl Session {
    /// Decodes the claims of a token issued by the backend.
    ///
    /// The client does not hold the signing secret, so the signature is not
    /// verified here; the backend verifies it on every request. Claims are
    /// only used to drive the UI.
    pub fn from_token(token: impl Into<String>) -> Result<Self, OrderError> {
        let token = token.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let claims = decode::<Claims>(&token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| OrderError::Decode(format!("invalid session token: {}", e)))?
            .claims;

        Ok(Self { token, claims })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Whether the `exp` claim has passed. Tokens without `exp` never expire.
    pub fn is_expired(&self) -> bool {
        self.claims
            .exp
            .map_or(false, |exp| exp <= Utc::now().timestamp())
    }

    /// Whether the session carries `role`. Matching ignores case and a
    /// leading `ROLE_` prefix on either side.
    pub fn has_role(&self, role: &str) -> bool {
        let wanted = normalize_role(role);
        self.claims
            .roles
            .iter()
            .any(|granted| normalize_role(granted) == wanted)
    }

    /// Whether the session carries at least one of `roles`.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}

fn normalize_role(role: &str) -> String {
    let role = role.trim();
    let stripped = role
        .get(..5)
        .filter(|prefix| prefix.eq_ignore_ascii_case("ROLE_"))
        .map_or(role, |_| &role[5..]);
    stripped.to_ascii_uppercase()
}

/// Holds the current session, if any. Expired sessions yield no token.
#[derive(Debug, Default)]
pub struct SessionStore {
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current session, e.g. after login.
    pub fn set(&self, session: Session) {
        if let Ok(mut guard) = self.current.write() {
            *guard = Some(session);
        }
    }

    /// Forgets the session on logout.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.current.write() {
            *guard = None;
        }
    }

    /// A copy of the current session, if any.
    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|guard| guard.clone())
    }
}

impl TokenSource for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        self.current()
            .filter(|session| !session.is_expired())
            .map(|session| session.token)
    }
}
