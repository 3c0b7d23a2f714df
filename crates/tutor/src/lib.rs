//! Streaming AI tutor: chat runtime, relay contract and line-oriented front end.
//!
//! ## Relay bootstrap
//!
//! The reply source is chosen by the `relay` config field or `TUTOR_RELAY`:
//!
//! - `http` streams from a hosted chat-completion endpoint through
//!   [`tutor_api`]. Requires an API key (`api_key` or `TUTOR_API_KEY`).
//! - `mock` replays a canned reply offline.
//!
//! Without an explicit choice the HTTP relay is used when a key is
//! configured and the mock relay otherwise.
//!
//! ## Configuration file
//!
//! Read from `TUTOR_CONFIG_PATH`, else `<config dir>/tutor/config.json`:
//!
//! ```json
//! {
//!   "api_key": "<bearer token>",
//!   "model": "llama3.1-8b",
//!   "timeout_sec": 120,
//!   "data_dir": "/home/me/.local/share/tutor"
//! }
//! ```
//!
//! Every field is optional and unknown fields are rejected. A missing file
//! means defaults.
//!
//! ## Conversation contract
//!
//! Each send replays the whole stored log behind one system message, and the
//! reply is merged into the log fragment by fragment as it streams in. See
//! [`assembler`] for the merge rules.

pub mod app;
pub mod assembler;
pub mod commands;
pub mod config;
pub mod logging;
pub mod persona;
pub mod relay;
pub mod relays;
pub mod runtime;

pub use assembler::{SessionReport, SessionState, StreamAssembler, FALLBACK_REPLY};
pub use config::{ConfigError, RelayKind, TutorConfig};
pub use relay::{build_outbound_messages, ChunkStream, OutboundMessage, Relay, RelayError};
pub use runtime::{ChatRuntime, SendError};
