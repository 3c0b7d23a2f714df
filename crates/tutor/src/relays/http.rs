use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use tutor_api::{CancellationSignal, TutorApiClient, TutorApiConfig};

use crate::relay::{ChunkStream, OutboundMessage, Relay, RelayError};

/// Streams replies from the hosted chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: TutorApiClient,
}

impl HttpRelay {
    pub fn new(config: TutorApiConfig) -> Result<Self, RelayError> {
        Ok(Self {
            client: TutorApiClient::new(config)?,
        })
    }

    #[must_use]
    pub fn from_client(client: TutorApiClient) -> Self {
        Self { client }
    }

    #[must_use]
    pub fn client(&self) -> &TutorApiClient {
        &self.client
    }
}

impl Relay for HttpRelay {
    fn name(&self) -> &'static str {
        "http"
    }

    fn open<'a>(
        &'a self,
        messages: &'a [OutboundMessage],
        cancellation: Option<&'a CancellationSignal>,
    ) -> BoxFuture<'a, Result<ChunkStream, RelayError>> {
        Box::pin(async move {
            let request = self.client.chat_request(messages.to_vec());
            tracing::debug!(
                endpoint = %self.client.normalized_endpoint(),
                model = %request.model,
                messages = request.messages.len(),
                "opening reply stream"
            );
            let bytes = self.client.open_stream(&request, cancellation).await?;
            Ok(bytes
                .map(|chunk| chunk.map_err(RelayError::from))
                .boxed())
        })
    }
}
