//! Panic payload classification
//!
//! `catch_unwind` hands back an opaque `Box<dyn Any + Send>`. Instead of
//! probing it at every use site, the payload is reduced once to a
//! [`PanicPayload`]: either a structured `Kind: message` pair or an opaque
//! displayable value.

use std::any::Any;
use std::error::Error;
use std::fmt;

/// Reserved panic payload meaning "the transport already abandoned this
/// request; write nothing".
///
/// The recover middleware re-raises it untouched and the capture hook
/// ignores it. Raise it with [`AbortResponse::raise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AbortResponse;

impl AbortResponse {
    /// Unwind the current request without producing a diagnostic.
    pub fn raise() -> ! {
        std::panic::panic_any(AbortResponse)
    }
}

impl fmt::Display for AbortResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("response aborted")
    }
}

impl Error for AbortResponse {}

/// Returns true when `payload` is the [`AbortResponse`] sentinel.
#[must_use]
pub fn is_abort(payload: &(dyn Any + Send)) -> bool {
    payload.is::<AbortResponse>()
}

/// A classified panic payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanicPayload {
    /// The payload rendered as `Kind: message`.
    Structured { kind: String, message: String },
    /// Anything else; carries the payload's plain string form.
    Opaque(String),
}

impl PanicPayload {
    /// Classify a payload caught by `catch_unwind`.
    ///
    /// Payload types without a textual form (including `()`) classify as
    /// an empty opaque message instead of failing.
    #[must_use]
    pub fn from_any(payload: &(dyn Any + Send)) -> Self {
        Self::from_text(payload_text(payload).unwrap_or_default())
    }

    /// Classify already-extracted payload text, splitting on the first `:`.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match text.split_once(':') {
            Some((kind, message)) if !kind.trim().is_empty() => PanicPayload::Structured {
                kind: kind.trim().to_string(),
                message: message.trim().to_string(),
            },
            _ => PanicPayload::Opaque(text),
        }
    }

    /// The `Kind` half, empty for opaque payloads.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            PanicPayload::Structured { kind, .. } => kind,
            PanicPayload::Opaque(_) => "",
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            PanicPayload::Structured { message, .. } | PanicPayload::Opaque(message) => message,
        }
    }
}

/// Extract the textual form of the payload types panics commonly carry.
fn payload_text(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return Some((*s).to_string());
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return Some(s.clone());
    }
    if let Some(s) = payload.downcast_ref::<Box<str>>() {
        return Some(s.to_string());
    }
    if let Some(err) = payload.downcast_ref::<Box<dyn Error + Send + Sync>>() {
        return Some(err.to_string());
    }
    if let Some(err) = payload.downcast_ref::<anyhow::Error>() {
        // Alternate form joins the context chain as `outer: inner`
        return Some(format!("{err:#}"));
    }
    if let Some(err) = payload.downcast_ref::<std::io::Error>() {
        return Some(err.to_string());
    }
    None
}
