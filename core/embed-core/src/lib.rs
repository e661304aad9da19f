//! # embed-core
//!
//! Core library for the Flowdeck embedding handshake: the guest-side engine
//! a vendor's Host page talks to when the app runs inside an iframe.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. The embedding runtime
//!   wraps with async if needed.
//! - **Sans-IO**: The engine emits [`engine::Action`]s; transports, storage,
//!   and the router live in the runtime. Tests drive the full handshake
//!   without mocks of the browser.
//! - **Not thread-safe**: Callers provide their own synchronization.
//! - **Graceful degradation**: A corrupt session file loads as `None`, a bad
//!   theme color is skipped with a warning, unknown messages are no-ops.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use embed_core::EmbedEngine;
//!
//! let mut engine = EmbedEngine::new();
//! for action in engine.start(window_search) {
//!     runtime.execute(action)?;
//! }
//! ```

pub mod engine;
pub mod error;
pub mod flags;
pub mod lifecycle;
pub mod query;
pub mod routes;
pub mod session;
pub mod theme;

pub use engine::{Action, EmbedEngine};
pub use error::{EmbedError, Result};
pub use flags::{EmbedState, EmbedStateStore};
pub use lifecycle::{EmbedPhase, PhaseSignal};
pub use query::{parse_bool, QueryInit};
pub use routes::ScopedRoute;
pub use session::{
    ExchangeError, FileSessionStore, MemorySessionStore, Session, SessionStore, TokenExchanger,
};
pub use theme::{hex_to_hsl, CssVarWrite, Hsl, ThemeError};
