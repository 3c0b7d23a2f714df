//! Incremental assembly of one streamed assistant reply.
//!
//! A [`StreamAssembler`] is one Stream Session. It is created by
//! [`StreamAssembler::begin`], holds the exclusive write handle on the
//! conversation store for its lifetime, and is consumed by exactly one of
//! [`finish`](StreamAssembler::finish), [`fail`](StreamAssembler::fail) or
//! [`cancel`](StreamAssembler::cancel).
//!
//! Every decoded fragment is appended to the session buffer and the buffer
//! is then published to the store: the first publication appends a new
//! assistant message after the learner's turn, later ones replace that
//! message's text. The log therefore never holds two consecutive assistant
//! messages, and the trailing message always equals the concatenation of
//! the fragments seen so far.

use std::fmt;

use tutor_api::{DeltaParser, Frame, FrameDecoder};
use tutor_store::{AssistantUpdate, ConversationStore};

/// Assistant text stored when a session fails before any fragment arrived.
pub const FALLBACK_REPLY: &str = "I'm sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session has run, or the runtime is between sessions.
    Idle,
    Streaming,
    /// The stream ended or sent `[DONE]`.
    Finalized,
    /// Transport failure; partial text is kept, otherwise the fallback is stored.
    Errored,
    /// The view was closed mid-stream; partial text is kept as-is.
    Cancelled,
}

impl SessionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finalized | Self::Errored | Self::Cancelled)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Streaming => "streaming",
            Self::Finalized => "finalized",
            Self::Errored => "errored",
            Self::Cancelled => "cancelled",
        })
    }
}

/// What one session did, returned when it ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub state: SessionState,
    /// Final reply text as stored. Empty when nothing was stored.
    pub text: String,
    pub fragments: usize,
    pub malformed_frames: usize,
    /// A new assistant message was added to the log by this session.
    pub appended_message: bool,
    /// True when the stored text is [`FALLBACK_REPLY`].
    pub used_fallback: bool,
    /// Snapshot writes that failed during the session.
    pub persist_failures: usize,
}

pub struct StreamAssembler<'s> {
    store: &'s mut ConversationStore,
    state: SessionState,
    decoder: FrameDecoder,
    parser: DeltaParser,
    buffer: String,
    fragments: usize,
    appended_message: bool,
    persist_failures: usize,
}

impl<'s> StreamAssembler<'s> {
    /// Idle to Streaming. Nothing is written to the log until the first
    /// fragment arrives.
    pub fn begin(store: &'s mut ConversationStore) -> Self {
        Self {
            store,
            state: SessionState::Streaming,
            decoder: FrameDecoder::default(),
            parser: DeltaParser::default(),
            buffer: String::new(),
            fragments: 0,
            appended_message: false,
            persist_failures: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Accumulated reply text.
    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &*self.store
    }

    /// Decode one raw chunk and publish each fragment in frame order,
    /// calling `on_fragment` after the store has been updated.
    ///
    /// Returns `true` once `[DONE]` was seen; the session is then Finalized
    /// and the rest of the chunk is ignored.
    pub fn feed<F>(&mut self, chunk: &[u8], on_fragment: &mut F) -> bool
    where
        F: FnMut(&str),
    {
        if self.state.is_terminal() {
            return true;
        }
        let frames = self.decoder.feed(chunk);
        self.apply_frames(frames, on_fragment)
    }

    /// End of stream. Flushes an unterminated final line, then Finalized.
    pub fn finish<F>(mut self, on_fragment: &mut F) -> SessionReport
    where
        F: FnMut(&str),
    {
        if !self.state.is_terminal() {
            let frames = self.decoder.finish();
            self.apply_frames(frames, on_fragment);
            self.state = SessionState::Finalized;
        }
        tracing::debug!(
            fragments = self.fragments,
            malformed = self.parser.malformed_frames(),
            "reply stream finalized"
        );
        self.into_report(false)
    }

    /// Transport failure. Stores the fallback reply only when this session
    /// has not published any text yet.
    pub fn fail(mut self, reason: &dyn fmt::Display) -> SessionReport {
        tracing::error!(
            error = %reason,
            fragments = self.fragments,
            "reply stream failed"
        );
        self.state = SessionState::Errored;

        let used_fallback = !self.appended_message;
        if used_fallback {
            self.buffer = FALLBACK_REPLY.to_owned();
            self.publish();
        }
        self.into_report(used_fallback)
    }

    /// The consumer went away. Partial text stays; no fallback is stored.
    pub fn cancel(mut self) -> SessionReport {
        tracing::debug!(fragments = self.fragments, "reply stream cancelled");
        self.state = SessionState::Cancelled;
        self.into_report(false)
    }

    fn apply_frames<F>(&mut self, frames: Vec<Frame>, on_fragment: &mut F) -> bool
    where
        F: FnMut(&str),
    {
        for frame in frames {
            match frame {
                Frame::Done => {
                    self.state = SessionState::Finalized;
                    return true;
                }
                Frame::Payload(payload) => {
                    let Some(fragment) = self.parser.parse(&payload) else {
                        continue;
                    };
                    self.fragments += 1;
                    self.buffer.push_str(&fragment);
                    self.publish();
                    on_fragment(&fragment);
                }
            }
        }
        false
    }

    fn publish(&mut self) {
        match self
            .store
            .append_or_extend_assistant_message(self.buffer.as_str())
        {
            Ok(AssistantUpdate::Appended) => self.appended_message = true,
            Ok(AssistantUpdate::Extended) => {}
            Err(error) => {
                // The in-memory log is already updated; only the snapshot lags.
                self.appended_message = true;
                self.persist_failures += 1;
                tracing::warn!(%error, "failed to persist assistant reply");
            }
        }
    }

    fn into_report(self, used_fallback: bool) -> SessionReport {
        let text = if self.appended_message {
            self.buffer
        } else {
            String::new()
        };
        SessionReport {
            state: self.state,
            text,
            fragments: self.fragments,
            malformed_frames: self.parser.malformed_frames(),
            appended_message: self.appended_message,
            used_fallback,
            persist_failures: self.persist_failures,
        }
    }
}
