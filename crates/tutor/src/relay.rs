use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use thiserror::Error;
use tutor_api::{CancellationSignal, ChatRole, RequestMessage, TutorApiError};
use tutor_store::Message;

/// Role-tagged entry of an outbound request.
pub type OutboundMessage = RequestMessage;

/// Raw reply bytes in arrival order. Dropping the stream releases it.
pub type ChunkStream = BoxStream<'static, Result<Vec<u8>, RelayError>>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Api(#[from] TutorApiError),

    #[error("scripted relay failure: {0}")]
    Scripted(String),

    #[error("relay stream cancelled")]
    Cancelled,
}

impl RelayError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Api(TutorApiError::Cancelled))
    }
}

/// Forwards a request to the model provider and returns the live byte stream
/// of its server-sent-event reply.
///
/// Implementations may retry before the stream opens but must not reorder or
/// retry bytes once it has.
pub trait Relay: Send + Sync {
    /// Short identifier shown in the front end.
    fn name(&self) -> &'static str;

    fn open<'a>(
        &'a self,
        messages: &'a [OutboundMessage],
        cancellation: Option<&'a CancellationSignal>,
    ) -> BoxFuture<'a, Result<ChunkStream, RelayError>>;
}

impl<R: Relay + ?Sized> Relay for Box<R> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn open<'a>(
        &'a self,
        messages: &'a [OutboundMessage],
        cancellation: Option<&'a CancellationSignal>,
    ) -> BoxFuture<'a, Result<ChunkStream, RelayError>> {
        (**self).open(messages, cancellation)
    }
}

/// Request context for one send: the system instructions, the whole stored
/// log re-tagged by speaker, then the new learner turn.
#[must_use]
pub fn build_outbound_messages(
    instructions: &str,
    log: &[Message],
    new_user_text: &str,
) -> Vec<OutboundMessage> {
    let mut messages = Vec::with_capacity(log.len() + 2);
    messages.push(OutboundMessage::new(ChatRole::System, instructions));
    messages.extend(log.iter().map(|message| {
        let role = if message.is_user {
            ChatRole::User
        } else {
            ChatRole::Assistant
        };
        OutboundMessage::new(role, message.text.as_str())
    }));
    messages.push(OutboundMessage::new(ChatRole::User, new_user_text));
    messages
}
