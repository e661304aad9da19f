//! Guest lifecycle state machine.
//!
//! Conservative transitions: signals that do not apply to the current phase
//! leave it unchanged, so a stray completion can never un-ready the guest.

/// Where the guest is in the embedding handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPhase {
    Uninitialized,
    AwaitingHostReply,
    Authenticating,
    Ready,
}

impl EmbedPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbedPhase::Uninitialized => "uninitialized",
            EmbedPhase::AwaitingHostReply => "awaiting_host_reply",
            EmbedPhase::Authenticating => "authenticating",
            EmbedPhase::Ready => "ready",
        }
    }
}

/// Transition signals produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseSignal {
    /// URL-parameter path chosen with a token to exchange.
    UrlInitStarted,
    /// `CLIENT_INIT` posted; waiting for `VENDOR_INIT`.
    SdkHelloSent,
    /// A `VENDOR_INIT` with a usable token arrived.
    VendorInitAccepted,
    /// Session persisted and flags applied.
    SessionEstablished,
    /// Token exchange failed; the SDK path may be re-initiated by the host,
    /// the URL path stalls.
    ExchangeFailed { sdk_path: bool },
}

pub fn next_phase(current: EmbedPhase, signal: PhaseSignal) -> EmbedPhase {
    match signal {
        PhaseSignal::UrlInitStarted if current == EmbedPhase::Uninitialized => {
            EmbedPhase::Authenticating
        }
        PhaseSignal::UrlInitStarted => current,
        PhaseSignal::SdkHelloSent if current == EmbedPhase::Uninitialized => {
            EmbedPhase::AwaitingHostReply
        }
        PhaseSignal::SdkHelloSent => current,
        // The init listener lives for the page lifetime, so a re-init is
        // accepted from any phase after the hello.
        PhaseSignal::VendorInitAccepted if current != EmbedPhase::Uninitialized => {
            EmbedPhase::Authenticating
        }
        PhaseSignal::VendorInitAccepted => current,
        PhaseSignal::SessionEstablished if current == EmbedPhase::Authenticating => {
            EmbedPhase::Ready
        }
        PhaseSignal::SessionEstablished => current,
        PhaseSignal::ExchangeFailed { sdk_path } if current == EmbedPhase::Authenticating => {
            if sdk_path {
                EmbedPhase::AwaitingHostReply
            } else {
                EmbedPhase::Uninitialized
            }
        }
        PhaseSignal::ExchangeFailed { .. } => current,
    }
}
