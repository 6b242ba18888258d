// ── Core error types ──
//
// Two failure families exist in this layer: bad configuration (detected
// eagerly, never retried, never silently defaulted) and remote call
// failures (surfaced verbatim with their source chain intact -- by the
// time the caller sees one, the failing device's cache has already been
// invalidated, so the next operation re-fetches ground truth).

use thiserror::Error;

/// Error type shared across the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed accessory or pipeline configuration: an unknown
    /// transformation operation, a missing operand, an unrecognized
    /// option key.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A remote fetch or control command failed. No retry or backoff
    /// happens here; that policy belongs to the caller.
    #[error("Remote call failed: {0}")]
    Remote(#[from] tuyaweb_api::Error),
}

impl CoreError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
