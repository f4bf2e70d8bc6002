use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of roles carried in a token. No hierarchy: gates list every
/// role they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Member,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "MEMBER",
            Role::Admin => "ADMIN",
        }
    }
}

/// Verified token claims.
///
/// Only ever produced by `CredentialVerifier` after signature and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(rename = "sub")]
    pub subject_id: String,
    pub role: Role,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerificationFailure {
    #[error("malformed token")]
    Malformed,
    #[error("token expired")]
    Expired,
    #[error("token signature mismatch")]
    SignatureMismatch,
}

impl VerificationFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::Expired => "expired",
            Self::SignatureMismatch => "signature_mismatch",
        }
    }
}

fn classify(err: &jsonwebtoken::errors::Error) -> VerificationFailure {
    match err.kind() {
        ErrorKind::InvalidSignature => VerificationFailure::SignatureMismatch,
        ErrorKind::ExpiredSignature => VerificationFailure::Expired,
        _ => VerificationFailure::Malformed,
    }
}

/// HS256 bearer-token verifier bound to the process-wide secret.
///
/// Pure: no I/O, the only inputs are the token, the secret and the clock.
#[derive(Clone)]
pub struct CredentialVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
    leeway_seconds: i64,
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("CredentialVerifier")
            .field("validation", &self.validation)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl CredentialVerifier {
    pub fn new(secret: &str, leeway_seconds: u64) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared against the caller's clock in `verify_at`
        validation.validate_exp = false;
        validation.required_spec_claims = ["sub", "iat", "exp"]
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            decoding_key,
            validation,
            leeway_seconds: i64::try_from(leeway_seconds).unwrap_or(i64::MAX),
        }
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, VerificationFailure> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, VerificationFailure> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(&e))?;
        let claims = data.claims;

        if claims.subject_id.trim().is_empty() {
            return Err(VerificationFailure::Malformed);
        }
        if claims.expires_at.saturating_add(self.leeway_seconds) <= now.timestamp() {
            return Err(VerificationFailure::Expired);
        }

        Ok(claims)
    }
}
