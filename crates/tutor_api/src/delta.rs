//! Delta Parser: one payload frame to one incremental text fragment.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the first choice's incremental content from a payload.
///
/// Returns `Ok(None)` when the payload parses but carries no text (role-only
/// deltas, finish markers, empty content) and `Err` when it is not a
/// well-formed chunk record.
pub fn parse_delta(payload: &str) -> Result<Option<String>, serde_json::Error> {
    let chunk = serde_json::from_str::<ChunkPayload>(payload)?;
    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .filter(|content| !content.is_empty());
    Ok(content)
}

/// Stateful wrapper over [`parse_delta`] that never fails a stream.
///
/// Malformed payloads contribute nothing and are counted, so callers can
/// report how many frames a session lost.
#[derive(Debug, Default)]
pub struct DeltaParser {
    malformed: usize,
}

impl DeltaParser {
    pub fn parse(&mut self, payload: &str) -> Option<String> {
        match parse_delta(payload) {
            Ok(fragment) => fragment,
            Err(error) => {
                self.malformed += 1;
                tracing::debug!(%error, payload, "dropping malformed stream frame");
                None
            }
        }
    }

    /// Frames dropped because they failed to decode.
    pub fn malformed_frames(&self) -> usize {
        self.malformed
    }
}
