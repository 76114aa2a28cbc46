use std::fmt::{Debug, Formatter};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Fixed marker that replaces secret credential fields on observable surfaces.
pub const REDACTION_MARKER: &str = "****";

/// Full temporary credentials returned by the role assumption backend.
///
/// Secrets are only reachable through the `expose_*` accessors and never
/// appear in `Debug` output. Anything that leaves the process should use
/// [`Credentials::masked`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: String,
    expiration: DateTime<Utc>,
}

impl Credentials {
    /// Creates a full credential set.
    #[must_use]
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: session_token.into(),
            expiration,
        }
    }

    /// Returns the public access key identifier.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        self.access_key_id.as_str()
    }

    /// Returns the secret access key.
    #[must_use]
    pub fn expose_secret_access_key(&self) -> &str {
        self.secret_access_key.as_str()
    }

    /// Returns the session token.
    #[must_use]
    pub fn expose_session_token(&self) -> &str {
        self.session_token.as_str()
    }

    /// Returns the expiration timestamp.
    #[must_use]
    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }

    /// Returns the redacted view.
    #[must_use]
    pub fn masked(&self) -> MaskedCredentials {
        MaskedCredentials {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: REDACTION_MARKER.to_owned(),
            session_token: REDACTION_MARKER.to_owned(),
            expiration: self.expiration.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &REDACTION_MARKER)
            .field("session_token", &REDACTION_MARKER)
            .field("expiration", &self.expiration)
            .finish()
    }
}

/// Redacted credential view safe for responses and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MaskedCredentials {
    /// Public access key identifier.
    pub access_key_id: String,
    /// Always [`REDACTION_MARKER`].
    pub secret_access_key: String,
    /// Always [`REDACTION_MARKER`].
    pub session_token: String,
    /// ISO-8601 expiration timestamp.
    pub expiration: String,
}

/// Both credential views produced for one issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredentials {
    /// Full view, only for trusted in-process propagation.
    pub full: Credentials,
    /// Redacted view for every observable surface.
    pub masked: MaskedCredentials,
}

impl From<Credentials> for IssuedCredentials {
    fn from(full: Credentials) -> Self {
        let masked = full.masked();
        Self { full, masked }
    }
}
