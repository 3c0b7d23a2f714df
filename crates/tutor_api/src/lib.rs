//! Transport-only client primitives for a hosted chat-completion endpoint.
//!
//! This crate owns request building, header construction, retry policy and
//! the two incremental decoding stages of a streamed reply:
//!
//! - [`FrameDecoder`] turns raw response bytes into `data:` payload frames.
//! - [`DeltaParser`] turns one payload frame into a text fragment.
//!
//! It contains no conversation state and no persistence; the `tutor` crate
//! assembles fragments into stored messages.

pub mod client;
pub mod config;
pub mod delta;
pub mod error;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod sse;
pub mod url;

pub use client::{await_or_cancel, is_cancelled, CancellationSignal, TutorApiClient};
pub use config::TutorApiConfig;
pub use delta::{parse_delta, DeltaParser};
pub use error::TutorApiError;
pub use payload::{ChatCompletionRequest, ChatRole, RequestMessage};
pub use sse::{Frame, FrameDecoder, DATA_PREFIX, DONE_MARKER};
pub use url::normalize_chat_url;
