use futures_util::StreamExt;
use thiserror::Error;
use tutor_api::{await_or_cancel, CancellationSignal};
use tutor_store::ConversationStore;

use crate::assembler::{SessionReport, SessionState, StreamAssembler};
use crate::relay::{build_outbound_messages, Relay};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("message is empty")]
    EmptyMessage,
}

/// Drives one Stream Session per send against a relay and the store.
///
/// `send` takes `&mut self`, so a second session cannot start while one is
/// streaming.
pub struct ChatRuntime<R> {
    store: ConversationStore,
    relay: R,
    instructions: String,
    state: SessionState,
}

impl<R: Relay> ChatRuntime<R> {
    pub fn new(store: ConversationStore, relay: R, instructions: impl Into<String>) -> Self {
        Self {
            store,
            relay,
            instructions: instructions.into(),
            state: SessionState::Idle,
        }
    }

    #[must_use]
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }

    #[must_use]
    pub fn relay(&self) -> &R {
        &self.relay
    }

    #[must_use]
    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Terminal state of the most recent session, or `Idle` before the first.
    #[must_use]
    pub fn last_state(&self) -> SessionState {
        self.state
    }

    /// Store the learner's turn, stream the reply into the log and report
    /// how the session ended.
    ///
    /// Transport failures do not surface as `Err`; they end the session as
    /// [`SessionState::Errored`]. Raising `cancellation` releases the stream
    /// and ends the session as [`SessionState::Cancelled`].
    pub async fn send<F>(
        &mut self,
        text: &str,
        cancellation: &CancellationSignal,
        mut on_fragment: F,
    ) -> Result<SessionReport, SendError>
    where
        F: FnMut(&str),
    {
        // Only the blank check sees trimmed text; the turn is stored as typed.
        if text.trim().is_empty() {
            return Err(SendError::EmptyMessage);
        }

        let outbound = build_outbound_messages(&self.instructions, self.store.messages(), text);
        if let Err(error) = self.store.append_user_message(text) {
            tracing::warn!(%error, "failed to persist learner message");
        }

        let cancellation = Some(cancellation);
        let mut session = StreamAssembler::begin(&mut self.store);
        self.state = SessionState::Streaming;

        let report = match self.relay.open(&outbound, cancellation).await {
            Err(error) if error.is_cancelled() => session.cancel(),
            Err(error) => session.fail(&error),
            Ok(mut stream) => loop {
                match await_or_cancel(stream.next(), cancellation).await {
                    Err(_) => break session.cancel(),
                    Ok(None) => break session.finish(&mut on_fragment),
                    Ok(Some(Err(error))) if error.is_cancelled() => break session.cancel(),
                    Ok(Some(Err(error))) => break session.fail(&error),
                    Ok(Some(Ok(chunk))) => {
                        if session.feed(&chunk, &mut on_fragment) {
                            break session.finish(&mut on_fragment);
                        }
                    }
                }
            },
        };

        self.state = report.state;
        tracing::debug!(
            relay = self.relay.name(),
            state = %report.state,
            fragments = report.fragments,
            malformed = report.malformed_frames,
            "session ended"
        );
        Ok(report)
    }
}
