use thiserror::Error;

/// Top-level error type for the `tuyaweb-api` crate.
///
/// Covers every failure mode of the cloud surface: authentication,
/// transport, the skill-envelope API, and response decoding.
/// `tuyaweb-core` wraps these without losing the source chain.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed (wrong credentials, unknown region, account locked).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A request was made before `login` or after the session expired.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Skill API ───────────────────────────────────────────────────
    /// The cloud answered with a non-`SUCCESS` envelope code
    /// (e.g. `FrequentlyInvoke`, `TargetOffline`).
    #[error("Tuya API error: {message}")]
    Api {
        message: String,
        /// The envelope code reported by the cloud, if any.
        code: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error indicates the session is gone
    /// and re-authentication might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. } | Self::SessionExpired)
    }

    /// Returns `true` if this is a transient error worth retrying
    /// at a higher layer (this crate never retries on its own).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { code, .. } => code.as_deref() == Some("FrequentlyInvoke"),
            _ => false,
        }
    }

    /// Extract the envelope error code, if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
