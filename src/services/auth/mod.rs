pub mod credentials;

pub use credentials::{CredentialVerifier, Role, TokenClaims, VerificationFailure};
